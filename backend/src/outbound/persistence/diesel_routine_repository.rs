//! PostgreSQL-backed `RoutineRepository`.
//!
//! Creating a routine writes the routine row and every entry row in one
//! transaction. Recording taken doses locks the routine row, rejects any
//! (entry, date, slot) already present, then inserts the records and extends
//! `routines.taken_ids` before committing. The `taken_records_once_per_slot`
//! unique index backs the check for writers that bypass the lock.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::AsyncConnection as _;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{RoutineRepository, RoutineRepositoryError};
use crate::domain::{
    DoseSlot, LocalDate, MedicineId, MedicineKind, MedicineName, MedicineRef, Routine,
    RoutineDraft, RoutineId, RoutineMedicineEntry, RoutineMedicineId, TakenId, TakenRecord,
    UserId, WeeklySchedule, Weekday,
};

use super::error_mapping::{DieselFailure, TAKEN_ONCE_PER_SLOT, classify, collect_rows};
use super::models::{
    NewRoutineMedicineRow, NewRoutineRow, RoutineMedicineRow, RoutineRow, TakenRecordRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{
    predefined_medicines, routine_medicines, routines, taken_records, user_defined_medicines,
};

/// Diesel-backed routine store.
#[derive(Clone)]
pub struct DieselRoutineRepository {
    pool: DbPool,
}

impl DieselRoutineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Error raised inside a transaction closure.
#[derive(Debug)]
enum TxError {
    Diesel(diesel::result::Error),
    Rejected(RoutineRepositoryError),
}

impl From<diesel::result::Error> for TxError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_pool_error(error: PoolError) -> RoutineRepositoryError {
    RoutineRepositoryError::connection(error.into_message())
}

fn map_failure(failure: DieselFailure) -> RoutineRepositoryError {
    if failure.is_connection() {
        RoutineRepositoryError::connection(failure.into_message())
    } else {
        RoutineRepositoryError::query(failure.into_message())
    }
}

fn map_diesel_error(
    operation: &'static str,
) -> impl Fn(diesel::result::Error) -> RoutineRepositoryError {
    move |error| map_failure(classify(error, operation))
}

fn map_create_error(error: TxError) -> RoutineRepositoryError {
    match error {
        TxError::Rejected(error) => error,
        TxError::Diesel(error) => {
            let failure = classify(error, "create routine");
            if failure.violates_foreign_key("medicine_id") {
                RoutineRepositoryError::missing_medicine(failure.into_message())
            } else {
                map_failure(failure)
            }
        }
    }
}

fn map_record_error(error: TxError, records: &[TakenRecord]) -> RoutineRepositoryError {
    match error {
        TxError::Rejected(error) => error,
        TxError::Diesel(error) => {
            let failure = classify(error, "record taken");
            if failure.violates_unique(TAKEN_ONCE_PER_SLOT) {
                let entry = records
                    .first()
                    .map(|record| record.routine_medicine_id.to_string())
                    .unwrap_or_default();
                RoutineRepositoryError::duplicate_taken(entry)
            } else {
                map_failure(failure)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Domain-to-row converters
// ---------------------------------------------------------------------------

fn entry_rows(routine: &Routine) -> Result<Vec<NewRoutineMedicineRow<'static>>, String> {
    routine
        .entries()
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            let schedule = serde_json::to_value(&entry.schedule)
                .map_err(|err| format!("serialise schedule: {err}"))?;
            let position =
                i32::try_from(position).map_err(|_| "too many routine entries".to_owned())?;
            let medicine_id = *entry.medicine.id.as_uuid();
            let (predefined, user_defined) = match entry.medicine.kind {
                MedicineKind::Predefined => (Some(medicine_id), None),
                MedicineKind::UserDefined => (None, Some(medicine_id)),
            };
            Ok(NewRoutineMedicineRow {
                id: *entry.id.as_uuid(),
                routine_id: *routine.id().as_uuid(),
                position,
                medicine_kind: entry.medicine.kind.as_str(),
                predefined_medicine_id: predefined,
                user_defined_medicine_id: user_defined,
                schedule,
            })
        })
        .collect()
}

fn taken_row(record: &TakenRecord) -> TakenRecordRow {
    TakenRecordRow {
        id: *record.id.as_uuid(),
        routine_id: *record.routine_id.as_uuid(),
        routine_medicine_id: *record.routine_medicine_id.as_uuid(),
        local_date: record.date.as_naive(),
        weekday: record.day.as_str().to_owned(),
        slot: record.slot.as_str().to_owned(),
        recorded_at: record.recorded_at,
    }
}

// ---------------------------------------------------------------------------
// Row-to-domain converters
// ---------------------------------------------------------------------------

fn row_to_entry(row: RoutineMedicineRow) -> Result<RoutineMedicineEntry, String> {
    let kind = MedicineKind::from_str(&row.medicine_kind).map_err(|err| err.to_string())?;
    let (medicine_id, name) = match kind {
        MedicineKind::Predefined => (row.predefined_medicine_id, row.predefined_name),
        MedicineKind::UserDefined => (row.user_defined_medicine_id, row.user_defined_name),
    };
    let (Some(medicine_id), Some(name)) = (medicine_id, name) else {
        return Err(format!("routine entry {} has no {kind} medicine", row.id));
    };
    let medicine_name = MedicineName::new(name).map_err(|err| err.to_string())?;
    let schedule: WeeklySchedule = serde_json::from_value(row.schedule)
        .map_err(|err| format!("corrupted schedule for entry {}: {err}", row.id))?;
    Ok(RoutineMedicineEntry {
        id: RoutineMedicineId::from_uuid(row.id),
        medicine: MedicineRef {
            kind,
            id: MedicineId::from_uuid(medicine_id),
        },
        medicine_name,
        schedule,
    })
}

fn row_to_taken(row: TakenRecordRow) -> Result<TakenRecord, String> {
    let day = Weekday::from_str(&row.weekday).map_err(|err| err.to_string())?;
    let slot = DoseSlot::from_str(&row.slot).map_err(|err| err.to_string())?;
    Ok(TakenRecord {
        id: TakenId::from_uuid(row.id),
        routine_id: RoutineId::from_uuid(row.routine_id),
        routine_medicine_id: RoutineMedicineId::from_uuid(row.routine_medicine_id),
        date: LocalDate::from_naive(row.local_date),
        day,
        slot,
        recorded_at: row.recorded_at,
    })
}

fn assemble(
    rows: Vec<RoutineRow>,
    mut entries: BTreeMap<Uuid, Vec<RoutineMedicineEntry>>,
    mut taken: BTreeMap<Uuid, Vec<TakenRecord>>,
) -> Result<Vec<Routine>, RoutineRepositoryError> {
    collect_rows(
        rows.into_iter().map(|row| {
            Routine::new(RoutineDraft {
                id: RoutineId::from_uuid(row.id),
                owner: UserId::from_uuid(row.owner_id),
                name: row.name,
                created_at: row.created_at,
                entries: entries.remove(&row.id).unwrap_or_default(),
                taken: taken.remove(&row.id).unwrap_or_default(),
            })
            .map_err(|err| format!("corrupted routine {}: {err}", row.id))
        }),
        RoutineRepositoryError::query,
    )
}

impl DieselRoutineRepository {
    /// Load entries and taken history for the given routine rows.
    async fn hydrate(
        conn: &mut AsyncPgConnection,
        rows: Vec<RoutineRow>,
    ) -> Result<Vec<Routine>, RoutineRepositoryError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

        let entry_rows: Vec<RoutineMedicineRow> = routine_medicines::table
            .left_join(predefined_medicines::table)
            .left_join(user_defined_medicines::table)
            .filter(routine_medicines::routine_id.eq_any(&ids))
            .order_by((routine_medicines::routine_id, routine_medicines::position))
            .select((
                routine_medicines::id,
                routine_medicines::routine_id,
                routine_medicines::medicine_kind,
                routine_medicines::predefined_medicine_id,
                routine_medicines::user_defined_medicine_id,
                routine_medicines::schedule,
                predefined_medicines::name.nullable(),
                user_defined_medicines::name.nullable(),
            ))
            .load(conn)
            .await
            .map_err(map_diesel_error("load routine entries"))?;

        let taken_rows: Vec<TakenRecordRow> = taken_records::table
            .filter(taken_records::routine_id.eq_any(&ids))
            .order_by((taken_records::recorded_at, taken_records::id))
            .select(TakenRecordRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error("load taken records"))?;

        let mut entries: BTreeMap<Uuid, Vec<RoutineMedicineEntry>> = BTreeMap::new();
        for row in entry_rows {
            let routine_id = row.routine_id;
            let entry = row_to_entry(row).map_err(RoutineRepositoryError::query)?;
            entries.entry(routine_id).or_default().push(entry);
        }
        let mut taken: BTreeMap<Uuid, Vec<TakenRecord>> = BTreeMap::new();
        for row in taken_rows {
            let routine_id = row.routine_id;
            let record = row_to_taken(row).map_err(RoutineRepositoryError::query)?;
            taken.entry(routine_id).or_default().push(record);
        }

        assemble(rows, entries, taken)
    }
}

/// Lock the routine row and return its current back-references.
async fn lock_routine(
    conn: &mut AsyncPgConnection,
    routine_id: Uuid,
) -> Result<Vec<Uuid>, TxError> {
    routines::table
        .filter(routines::id.eq(routine_id))
        .select(routines::taken_ids)
        .for_update()
        .first::<Vec<Uuid>>(conn)
        .await
        .optional()?
        .ok_or_else(|| {
            TxError::Rejected(RoutineRepositoryError::routine_missing(routine_id.to_string()))
        })
}

/// Reject the batch when any record repeats an existing (entry, date, slot).
async fn reject_duplicates(
    conn: &mut AsyncPgConnection,
    routine_id: Uuid,
    rows: &[TakenRecordRow],
) -> Result<(), TxError> {
    let entry_ids: Vec<Uuid> = rows.iter().map(|row| row.routine_medicine_id).collect();
    let existing: Vec<(Uuid, chrono::NaiveDate, String)> = taken_records::table
        .filter(taken_records::routine_id.eq(routine_id))
        .filter(taken_records::routine_medicine_id.eq_any(entry_ids))
        .select((
            taken_records::routine_medicine_id,
            taken_records::local_date,
            taken_records::slot,
        ))
        .load(conn)
        .await?;
    let existing: HashSet<_> = existing.into_iter().collect();
    let mut pending = HashSet::new();
    for row in rows {
        let key = (row.routine_medicine_id, row.local_date, row.slot.clone());
        if existing.contains(&key) || !pending.insert(key) {
            return Err(TxError::Rejected(RoutineRepositoryError::duplicate_taken(
                row.routine_medicine_id.to_string(),
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl RoutineRepository for DieselRoutineRepository {
    async fn create(&self, routine: &Routine) -> Result<(), RoutineRepositoryError> {
        let entries = entry_rows(routine).map_err(RoutineRepositoryError::query)?;
        let routine_row = NewRoutineRow {
            id: *routine.id().as_uuid(),
            owner_id: *routine.owner().as_uuid(),
            name: routine.name(),
            taken_ids: Vec::new(),
            created_at: routine.created_at(),
        };
        let owner = *routine.owner().as_uuid();
        let user_defined: Vec<Uuid> = entries
            .iter()
            .filter_map(|row| row.user_defined_medicine_id)
            .collect();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                if !user_defined.is_empty() {
                    let owned: Vec<Uuid> = user_defined_medicines::table
                        .filter(user_defined_medicines::owner_id.eq(owner))
                        .filter(user_defined_medicines::id.eq_any(&user_defined))
                        .select(user_defined_medicines::id)
                        .for_share()
                        .load(conn)
                        .await?;
                    if let Some(missing) = user_defined.iter().find(|id| !owned.contains(*id)) {
                        return Err(TxError::Rejected(RoutineRepositoryError::missing_medicine(
                            missing.to_string(),
                        )));
                    }
                }
                diesel::insert_into(routines::table)
                    .values(&routine_row)
                    .execute(conn)
                    .await?;
                diesel::insert_into(routine_medicines::table)
                    .values(&entries)
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_create_error)
    }

    async fn list_for_user(&self, owner: &UserId) -> Result<Vec<Routine>, RoutineRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<RoutineRow> = routines::table
            .filter(routines::owner_id.eq(owner.as_uuid()))
            .order_by((routines::created_at, routines::id))
            .select(RoutineRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error("list routines"))?;
        Self::hydrate(&mut conn, rows).await
    }

    async fn find_for_user(
        &self,
        owner: &UserId,
        id: &RoutineId,
    ) -> Result<Option<Routine>, RoutineRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<RoutineRow> = routines::table
            .filter(routines::owner_id.eq(owner.as_uuid()))
            .filter(routines::id.eq(id.as_uuid()))
            .select(RoutineRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error("find routine"))?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Self::hydrate(&mut conn, vec![row]).await?.into_iter().next())
    }

    async fn record_taken(
        &self,
        routine_id: &RoutineId,
        records: &[TakenRecord],
    ) -> Result<(), RoutineRepositoryError> {
        if records.is_empty() {
            return Ok(());
        }
        let routine_id = *routine_id.as_uuid();
        let rows: Vec<TakenRecordRow> = records.iter().map(taken_row).collect();

        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction::<_, TxError, _>(|conn| {
            async move {
                let mut taken_ids = lock_routine(conn, routine_id).await?;
                reject_duplicates(conn, routine_id, &rows).await?;
                diesel::insert_into(taken_records::table)
                    .values(&rows)
                    .execute(conn)
                    .await?;
                taken_ids.extend(rows.iter().map(|row| row.id));
                diesel::update(routines::table.filter(routines::id.eq(routine_id)))
                    .set(routines::taken_ids.eq(taken_ids))
                    .execute(conn)
                    .await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(|error| map_record_error(error, records))
    }
}

#[cfg(test)]
mod tests {
    //! Row conversion coverage. Locking, constraint mapping, and atomic
    //! creation run against embedded PostgreSQL in
    //! `tests/diesel_repositories.rs`.
    use super::*;
    use crate::domain::DoseSlot;
    use crate::test_support::{every_day, sample_entry, sample_routine};
    use rstest::rstest;

    fn entry_row(
        kind: &str,
        predefined: Option<&str>,
        user_defined: Option<&str>,
    ) -> RoutineMedicineRow {
        RoutineMedicineRow {
            id: Uuid::from_u128(10),
            routine_id: Uuid::from_u128(1),
            medicine_kind: kind.to_owned(),
            predefined_medicine_id: predefined.map(|_| Uuid::from_u128(20)),
            user_defined_medicine_id: user_defined.map(|_| Uuid::from_u128(30)),
            schedule: serde_json::json!([{ "day": "Monday", "slots": ["Morning", "Night"] }]),
            predefined_name: predefined.map(str::to_owned),
            user_defined_name: user_defined.map(str::to_owned),
        }
    }

    #[rstest]
    fn predefined_entry_reads_the_catalogue_name() {
        let entry = row_to_entry(entry_row("PredefinedMedicine", Some("Ibuprofen"), None))
            .expect("entry");

        assert_eq!(entry.medicine.kind, MedicineKind::Predefined);
        assert_eq!(entry.medicine_name.as_ref(), "Ibuprofen");
        assert_eq!(
            entry.schedule.slots_on(Weekday::Monday),
            vec![DoseSlot::Morning, DoseSlot::Night]
        );
    }

    #[rstest]
    fn entry_without_its_medicine_is_corruption() {
        let err = row_to_entry(entry_row("UserDefinedMedicine", Some("Ibuprofen"), None))
            .expect_err("mismatched kind");

        assert!(err.contains("has no UserDefinedMedicine medicine"));
    }

    #[rstest]
    fn entry_rows_keep_positions_and_foreign_keys() {
        let owner = UserId::random();
        let routine = sample_routine(
            &owner,
            "Morning",
            vec![
                sample_entry("Paracetamol", every_day(&[DoseSlot::Morning])),
                sample_entry("Ibuprofen", every_day(&[DoseSlot::Evening])),
            ],
        );

        let rows = entry_rows(&routine).expect("rows");

        assert_eq!(rows.iter().map(|row| row.position).collect::<Vec<_>>(), [0, 1]);
        assert!(rows.iter().all(|row| row.predefined_medicine_id.is_some()));
        assert!(rows.iter().all(|row| row.user_defined_medicine_id.is_none()));
    }

    #[rstest]
    fn taken_rows_round_trip_through_text_columns() {
        let row = TakenRecordRow {
            id: Uuid::from_u128(1),
            routine_id: Uuid::from_u128(2),
            routine_medicine_id: Uuid::from_u128(3),
            local_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"),
            weekday: "Monday".to_owned(),
            slot: "Evening".to_owned(),
            recorded_at: crate::test_support::utc_instant(2026, 10, 19, 18, 0),
        };

        let record = row_to_taken(row.clone()).expect("record");

        assert_eq!(record.slot, DoseSlot::Evening);
        assert_eq!(taken_row(&record).weekday, row.weekday);
    }

    #[rstest]
    fn unknown_slot_text_is_corruption() {
        let row = TakenRecordRow {
            id: Uuid::from_u128(1),
            routine_id: Uuid::from_u128(2),
            routine_medicine_id: Uuid::from_u128(3),
            local_date: chrono::NaiveDate::from_ymd_opt(2026, 10, 19).expect("date"),
            weekday: "Monday".to_owned(),
            slot: "Brunch".to_owned(),
            recorded_at: crate::test_support::utc_instant(2026, 10, 19, 18, 0),
        };

        assert!(row_to_taken(row).is_err());
    }
}
