//! In-process store implementing every repository port.
//!
//! Used when no database URL is configured and by integration tests. All
//! state sits behind one mutex, so each port call is a single critical
//! section: a routine is stored with all of its entries or not at all, and a
//! batch of taken records is checked for duplicates and appended under the
//! same lock that concurrent callers must take.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::{Uuid, uuid};

use crate::domain::ports::{
    MedicineRepository, MedicineRepositoryError, RoutineRepository, RoutineRepositoryError,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    DeliveryToken, LocalDate, Medicine, MedicineId, MedicineKind, MedicineName, Routine,
    RoutineDraft, RoutineId, TakenRecord, User, UserDraft, UserId,
};

/// Predefined medicines shipped with the service.
///
/// The initial migration seeds the same rows.
pub const PREDEFINED_CATALOGUE: [(Uuid, &str); 8] = [
    (uuid!("6a1c3f0e-0001-4c6e-9a51-6d1f2b7c0a01"), "Amoxicillin"),
    (uuid!("6a1c3f0e-0002-4c6e-9a51-6d1f2b7c0a02"), "Cetirizine"),
    (uuid!("6a1c3f0e-0003-4c6e-9a51-6d1f2b7c0a03"), "Ibuprofen"),
    (uuid!("6a1c3f0e-0004-4c6e-9a51-6d1f2b7c0a04"), "Metformin"),
    (uuid!("6a1c3f0e-0005-4c6e-9a51-6d1f2b7c0a05"), "Omeprazole"),
    (uuid!("6a1c3f0e-0006-4c6e-9a51-6d1f2b7c0a06"), "Paracetamol"),
    (uuid!("6a1c3f0e-0007-4c6e-9a51-6d1f2b7c0a07"), "Salbutamol"),
    (uuid!("6a1c3f0e-0008-4c6e-9a51-6d1f2b7c0a08"), "Vitamin D"),
];

#[derive(Default)]
struct State {
    users: Vec<User>,
    predefined: Vec<Medicine>,
    user_defined: Vec<Medicine>,
    routines: Vec<Routine>,
}

/// Mutex-guarded store for users, medicines, routines, and taken records.
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store holding only the predefined catalogue.
    pub fn new() -> Self {
        let predefined = PREDEFINED_CATALOGUE
            .iter()
            .filter_map(|(id, name)| {
                MedicineName::new(name)
                    .ok()
                    .map(|name| Medicine::predefined(MedicineId::from_uuid(*id), name))
            })
            .collect();
        Self {
            state: Mutex::new(State {
                predefined,
                ..State::default()
            }),
        }
    }

    fn lock<E>(&self, poisoned: impl FnOnce(String) -> E) -> Result<MutexGuard<'_, State>, E> {
        self.state
            .lock()
            .map_err(|_| poisoned("in-memory store lock poisoned".to_owned()))
    }
}

fn rebuild_user(
    user: &User,
    delivery_tokens: Vec<DeliveryToken>,
    last_reminded_on: Option<LocalDate>,
) -> Result<User, UserPersistenceError> {
    User::new(UserDraft {
        id: user.id().clone(),
        name: user.name().to_owned(),
        email: user.email().to_owned(),
        time_zone: user.time_zone().to_owned(),
        delivery_tokens,
        last_reminded_on,
    })
    .map_err(|err| UserPersistenceError::query(err.to_string()))
}

fn position_of(users: &[User], id: &UserId) -> Option<usize> {
    users.iter().position(|user| user.id() == id)
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn upsert(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut state = self.lock(UserPersistenceError::query)?;
        match position_of(&state.users, user.id()) {
            Some(index) => {
                let existing = &state.users[index];
                let merged = User::new(UserDraft {
                    id: user.id().clone(),
                    name: user.name().to_owned(),
                    email: user.email().to_owned(),
                    time_zone: user.time_zone().to_owned(),
                    delivery_tokens: existing.delivery_tokens().to_vec(),
                    last_reminded_on: existing.last_reminded_on(),
                })
                .map_err(|err| UserPersistenceError::query(err.to_string()))?;
                state.users[index] = merged;
            }
            None => state.users.push(rebuild_user(user, Vec::new(), None)?),
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.lock(UserPersistenceError::query)?;
        Ok(state.users.iter().find(|user| user.id() == id).cloned())
    }

    async fn list_with_delivery_tokens(&self) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.lock(UserPersistenceError::query)?;
        Ok(state
            .users
            .iter()
            .filter(|user| !user.delivery_tokens().is_empty())
            .cloned()
            .collect())
    }

    async fn add_delivery_token(
        &self,
        id: &UserId,
        token: &DeliveryToken,
    ) -> Result<bool, UserPersistenceError> {
        let mut state = self.lock(UserPersistenceError::query)?;
        let Some(index) = position_of(&state.users, id) else {
            return Err(UserPersistenceError::query(format!("user {id} does not exist")));
        };
        let user = &state.users[index];
        if user.delivery_tokens().contains(token) {
            return Ok(false);
        }
        let mut tokens = user.delivery_tokens().to_vec();
        tokens.push(token.clone());
        let updated = rebuild_user(user, tokens, user.last_reminded_on())?;
        state.users[index] = updated;
        Ok(true)
    }

    async fn remove_delivery_tokens(
        &self,
        id: &UserId,
        tokens: &[DeliveryToken],
    ) -> Result<(), UserPersistenceError> {
        let mut state = self.lock(UserPersistenceError::query)?;
        if let Some(index) = position_of(&state.users, id) {
            let user = &state.users[index];
            let kept = user
                .delivery_tokens()
                .iter()
                .filter(|held| !tokens.contains(held))
                .cloned()
                .collect();
            let updated = rebuild_user(user, kept, user.last_reminded_on())?;
            state.users[index] = updated;
        }
        Ok(())
    }

    async fn mark_reminded(&self, id: &UserId, on: LocalDate) -> Result<(), UserPersistenceError> {
        let mut state = self.lock(UserPersistenceError::query)?;
        if let Some(index) = position_of(&state.users, id) {
            let user = &state.users[index];
            let updated = rebuild_user(user, user.delivery_tokens().to_vec(), Some(on))?;
            state.users[index] = updated;
        }
        Ok(())
    }
}

#[async_trait]
impl MedicineRepository for InMemoryStore {
    async fn list_predefined(&self) -> Result<Vec<Medicine>, MedicineRepositoryError> {
        let state = self.lock(MedicineRepositoryError::query)?;
        let mut medicines = state.predefined.clone();
        medicines.sort_by(|a, b| a.name().as_ref().cmp(b.name().as_ref()));
        Ok(medicines)
    }

    async fn find_predefined(
        &self,
        ids: &[MedicineId],
    ) -> Result<Vec<Medicine>, MedicineRepositoryError> {
        let state = self.lock(MedicineRepositoryError::query)?;
        Ok(state
            .predefined
            .iter()
            .filter(|medicine| ids.contains(&medicine.id()))
            .cloned()
            .collect())
    }

    async fn find_user_defined(
        &self,
        owner: &UserId,
        ids: &[MedicineId],
    ) -> Result<Vec<Medicine>, MedicineRepositoryError> {
        let state = self.lock(MedicineRepositoryError::query)?;
        Ok(state
            .user_defined
            .iter()
            .filter(|medicine| medicine.owner() == Some(owner) && ids.contains(&medicine.id()))
            .cloned()
            .collect())
    }

    async fn list_user_defined(
        &self,
        owner: &UserId,
    ) -> Result<Vec<Medicine>, MedicineRepositoryError> {
        let state = self.lock(MedicineRepositoryError::query)?;
        Ok(state
            .user_defined
            .iter()
            .filter(|medicine| medicine.owner() == Some(owner))
            .cloned()
            .collect())
    }

    async fn insert_user_defined(
        &self,
        medicine: &Medicine,
    ) -> Result<(), MedicineRepositoryError> {
        let mut state = self.lock(MedicineRepositoryError::query)?;
        let Some(owner) = medicine.owner() else {
            return Err(MedicineRepositoryError::query(
                "user-defined medicine requires an owner",
            ));
        };
        if position_of(&state.users, owner).is_none() {
            return Err(MedicineRepositoryError::query(format!(
                "user {owner} does not exist"
            )));
        }
        state.user_defined.push(medicine.clone());
        Ok(())
    }

    async fn delete_user_defined(
        &self,
        owner: &UserId,
        id: &MedicineId,
    ) -> Result<bool, MedicineRepositoryError> {
        let mut state = self.lock(MedicineRepositoryError::query)?;
        let Some(index) = state
            .user_defined
            .iter()
            .position(|medicine| medicine.owner() == Some(owner) && &medicine.id() == id)
        else {
            return Ok(false);
        };
        let reference = state.user_defined[index].reference();
        if state
            .routines
            .iter()
            .any(|routine| routine.references(&reference))
        {
            return Err(MedicineRepositoryError::in_use(id.to_string()));
        }
        state.user_defined.remove(index);
        Ok(true)
    }
}

fn medicine_exists(state: &State, routine: &Routine) -> Result<(), RoutineRepositoryError> {
    for entry in routine.entries() {
        let exists = match entry.medicine.kind {
            MedicineKind::Predefined => state
                .predefined
                .iter()
                .any(|medicine| medicine.id() == entry.medicine.id),
            MedicineKind::UserDefined => state.user_defined.iter().any(|medicine| {
                medicine.reference() == entry.medicine && medicine.owner() == Some(routine.owner())
            }),
        };
        if !exists {
            return Err(RoutineRepositoryError::missing_medicine(
                entry.medicine.id.to_string(),
            ));
        }
    }
    Ok(())
}

#[async_trait]
impl RoutineRepository for InMemoryStore {
    async fn create(&self, routine: &Routine) -> Result<(), RoutineRepositoryError> {
        let mut state = self.lock(RoutineRepositoryError::query)?;
        medicine_exists(&state, routine)?;
        if state.routines.iter().any(|r| r.id() == routine.id()) {
            return Err(RoutineRepositoryError::query(format!(
                "routine {} already exists",
                routine.id()
            )));
        }
        state.routines.push(routine.clone());
        Ok(())
    }

    async fn list_for_user(&self, owner: &UserId) -> Result<Vec<Routine>, RoutineRepositoryError> {
        let state = self.lock(RoutineRepositoryError::query)?;
        Ok(state
            .routines
            .iter()
            .filter(|routine| routine.owner() == owner)
            .cloned()
            .collect())
    }

    async fn find_for_user(
        &self,
        owner: &UserId,
        id: &RoutineId,
    ) -> Result<Option<Routine>, RoutineRepositoryError> {
        let state = self.lock(RoutineRepositoryError::query)?;
        Ok(state
            .routines
            .iter()
            .find(|routine| routine.owner() == owner && &routine.id() == id)
            .cloned())
    }

    async fn record_taken(
        &self,
        routine_id: &RoutineId,
        records: &[TakenRecord],
    ) -> Result<(), RoutineRepositoryError> {
        let mut state = self.lock(RoutineRepositoryError::query)?;
        let Some(index) = state.routines.iter().position(|r| &r.id() == routine_id) else {
            return Err(RoutineRepositoryError::routine_missing(routine_id.to_string()));
        };
        let routine = &state.routines[index];

        let mut taken = routine.taken().to_vec();
        for record in records {
            if &record.routine_id != routine_id || routine.entry(record.routine_medicine_id).is_none()
            {
                return Err(RoutineRepositoryError::query(format!(
                    "taken record {} does not belong to routine {routine_id}",
                    record.id
                )));
            }
            let key = record.uniqueness_key();
            if taken.iter().any(|existing| existing.uniqueness_key() == key) {
                return Err(RoutineRepositoryError::duplicate_taken(
                    record.routine_medicine_id.to_string(),
                ));
            }
            taken.push(record.clone());
        }

        let updated = Routine::new(RoutineDraft {
            id: routine.id(),
            owner: routine.owner().clone(),
            name: routine.name().to_owned(),
            created_at: routine.created_at(),
            entries: routine.entries().to_vec(),
            taken,
        })
        .map_err(|err| RoutineRepositoryError::query(err.to_string()))?;
        state.routines[index] = updated;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
