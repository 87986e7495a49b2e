//! Medicine catalogue model.
//!
//! Medicines come from two catalogues with the same shape: a shared
//! predefined catalogue and per-user user-defined medicines. Routines refer
//! to them through a [`MedicineRef`] (catalogue tag plus id), never by
//! embedding.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ids::define_uuid_id;
use super::user::UserId;

define_uuid_id! {
    /// Identifier of a medicine in either catalogue.
    pub struct MedicineId;
}

/// Which catalogue a medicine reference points into.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
pub enum MedicineKind {
    #[serde(rename = "PredefinedMedicine")]
    Predefined,
    #[serde(rename = "UserDefinedMedicine")]
    UserDefined,
}

impl MedicineKind {
    /// Wire name of the catalogue tag.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Predefined => "PredefinedMedicine",
            Self::UserDefined => "UserDefinedMedicine",
        }
    }
}

impl fmt::Display for MedicineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a catalogue tag is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown medicine type: {value}")]
pub struct UnknownMedicineKind {
    pub value: String,
}

impl FromStr for MedicineKind {
    type Err = UnknownMedicineKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PredefinedMedicine" => Ok(Self::Predefined),
            "UserDefinedMedicine" => Ok(Self::UserDefined),
            other => Err(UnknownMedicineKind {
                value: other.to_owned(),
            }),
        }
    }
}

/// Typed reference to a medicine in one of the catalogues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineRef {
    pub kind: MedicineKind,
    pub id: MedicineId,
}

impl MedicineRef {
    pub const fn predefined(id: MedicineId) -> Self {
        Self {
            kind: MedicineKind::Predefined,
            id,
        }
    }

    pub const fn user_defined(id: MedicineId) -> Self {
        Self {
            kind: MedicineKind::UserDefined,
            id,
        }
    }
}

/// Raised when a medicine name is blank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("medicine name must not be empty")]
pub struct EmptyMedicineName;

/// Non-blank medicine name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MedicineName(String);

impl MedicineName {
    pub fn new(name: impl AsRef<str>) -> Result<Self, EmptyMedicineName> {
        let trimmed = name.as_ref().trim();
        if trimmed.is_empty() {
            return Err(EmptyMedicineName);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for MedicineName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MedicineName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MedicineName {
    type Error = EmptyMedicineName;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<MedicineName> for String {
    fn from(value: MedicineName) -> Self {
        value.0
    }
}

/// A medicine from either catalogue.
///
/// `owner` is set only for user-defined medicines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Medicine {
    id: MedicineId,
    kind: MedicineKind,
    name: MedicineName,
    owner: Option<UserId>,
}

impl Medicine {
    pub fn predefined(id: MedicineId, name: MedicineName) -> Self {
        Self {
            id,
            kind: MedicineKind::Predefined,
            name,
            owner: None,
        }
    }

    pub fn user_defined(id: MedicineId, name: MedicineName, owner: UserId) -> Self {
        Self {
            id,
            kind: MedicineKind::UserDefined,
            name,
            owner: Some(owner),
        }
    }

    pub fn id(&self) -> MedicineId {
        self.id
    }

    pub fn kind(&self) -> MedicineKind {
        self.kind
    }

    pub fn name(&self) -> &MedicineName {
        &self.name
    }

    pub fn owner(&self) -> Option<&UserId> {
        self.owner.as_ref()
    }

    /// Reference that resolves back to this medicine.
    pub fn reference(&self) -> MedicineRef {
        MedicineRef {
            kind: self.kind,
            id: self.id,
        }
    }
}
