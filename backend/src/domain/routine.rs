//! Routine aggregate: a named, user-owned list of medicines, each with its
//! own weekly schedule, plus the taken history recorded against it.

use std::fmt;

use chrono::{DateTime, Utc};

use super::ids::define_uuid_id;
use super::medicine::{MedicineName, MedicineRef};
use super::schedule::WeeklySchedule;
use super::taken::{TakenId, TakenRecord};
use super::user::UserId;

define_uuid_id! {
    /// Identifier of a routine.
    pub struct RoutineId;
}

define_uuid_id! {
    /// Stable identifier of one medicine entry within a routine.
    ///
    /// Taken records point at it directly; entries are never renumbered.
    pub struct RoutineMedicineId;
}

/// Validation errors raised while building a routine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutineValidationError {
    EmptyName,
    NoMedicines,
}

impl fmt::Display for RoutineValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "routine name must not be empty"),
            Self::NoMedicines => write!(f, "routine must contain at least one medicine"),
        }
    }
}

impl std::error::Error for RoutineValidationError {}

fn validated_name(name: &str) -> Result<String, RoutineValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(RoutineValidationError::EmptyName);
    }
    Ok(trimmed.to_owned())
}

/// One medicine requested for a new routine, before ids are assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineEntryRequest {
    pub medicine: MedicineRef,
    pub schedule: WeeklySchedule,
}

/// Validated request to create a routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineRequest {
    name: String,
    entries: Vec<RoutineEntryRequest>,
}

impl RoutineRequest {
    pub fn new(
        name: impl AsRef<str>,
        entries: Vec<RoutineEntryRequest>,
    ) -> Result<Self, RoutineValidationError> {
        let name = validated_name(name.as_ref())?;
        if entries.is_empty() {
            return Err(RoutineValidationError::NoMedicines);
        }
        Ok(Self { name, entries })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entries in submission order.
    pub fn entries(&self) -> &[RoutineEntryRequest] {
        &self.entries
    }

    /// Distinct medicine references, first occurrence first.
    pub fn medicine_refs(&self) -> Vec<MedicineRef> {
        let mut refs: Vec<MedicineRef> = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            if !refs.contains(&entry.medicine) {
                refs.push(entry.medicine);
            }
        }
        refs
    }
}

/// A medicine within a routine together with its schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineMedicineEntry {
    pub id: RoutineMedicineId,
    pub medicine: MedicineRef,
    pub medicine_name: MedicineName,
    pub schedule: WeeklySchedule,
}

/// Input for [`Routine::new`].
#[derive(Debug, Clone)]
pub struct RoutineDraft {
    pub id: RoutineId,
    pub owner: UserId,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<RoutineMedicineEntry>,
    pub taken: Vec<TakenRecord>,
}

/// A user's routine.
///
/// ## Invariants
/// - `name` is non-empty once trimmed.
/// - `entries` is non-empty and keeps insertion order.
/// - every record in `taken` belongs to this routine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routine {
    id: RoutineId,
    owner: UserId,
    name: String,
    created_at: DateTime<Utc>,
    entries: Vec<RoutineMedicineEntry>,
    taken: Vec<TakenRecord>,
}

impl Routine {
    pub fn new(draft: RoutineDraft) -> Result<Self, RoutineValidationError> {
        let RoutineDraft {
            id,
            owner,
            name,
            created_at,
            entries,
            taken,
        } = draft;
        let name = validated_name(&name)?;
        if entries.is_empty() {
            return Err(RoutineValidationError::NoMedicines);
        }
        let taken = taken
            .into_iter()
            .filter(|record| record.routine_id == id)
            .collect();
        Ok(Self {
            id,
            owner,
            name,
            created_at,
            entries,
            taken,
        })
    }

    pub fn id(&self) -> RoutineId {
        self.id
    }

    pub fn owner(&self) -> &UserId {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn entries(&self) -> &[RoutineMedicineEntry] {
        &self.entries
    }

    /// Look up an entry by id.
    pub fn entry(&self, id: RoutineMedicineId) -> Option<&RoutineMedicineEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Taken history in recording order.
    pub fn taken(&self) -> &[TakenRecord] {
        &self.taken
    }

    /// Back-reference list of taken record ids.
    pub fn taken_ids(&self) -> Vec<TakenId> {
        self.taken.iter().map(|record| record.id).collect()
    }

    /// Whether the routine references the given medicine.
    pub fn references(&self, medicine: &MedicineRef) -> bool {
        self.entries.iter().any(|entry| &entry.medicine == medicine)
    }
}
