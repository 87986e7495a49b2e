//! Regression coverage for the in-memory store.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::{DoseOccasion, DoseSlot, MedicineRef, RoutineMedicineEntry, Weekday};
use crate::test_support::{every_day, sample_entry, sample_routine, sample_user, utc_instant};

const MIGRATION: &str = include_str!(
    "../../../migrations/2026-10-01-000000_create_medication_schema/up.sql"
);

#[fixture]
fn owner() -> UserId {
    UserId::random()
}

async fn store_with_user(owner: &UserId) -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .upsert(&sample_user(owner.clone(), "Europe/London"))
        .await
        .expect("seed user");
    store
}

fn paracetamol() -> MedicineRef {
    MedicineRef::predefined(MedicineId::from_uuid(PREDEFINED_CATALOGUE[5].0))
}

fn catalogue_entry() -> RoutineMedicineEntry {
    let mut entry = sample_entry("Paracetamol", every_day(&[DoseSlot::Morning]));
    entry.medicine = paracetamol();
    entry
}

fn monday_morning() -> DoseOccasion {
    let date = "19/10/2026".parse().expect("date");
    DoseOccasion::new(date, Weekday::Monday, DoseSlot::Morning).expect("occasion")
}

#[test]
fn catalogue_matches_the_migration_seed() {
    for (id, name) in PREDEFINED_CATALOGUE {
        let row = format!("('{id}', '{name}')");
        assert!(MIGRATION.contains(&row), "missing seed row {row}");
    }
}

#[tokio::test]
async fn predefined_medicines_are_sorted_by_name() {
    let store = InMemoryStore::new();
    let names: Vec<String> = store
        .list_predefined()
        .await
        .expect("list")
        .iter()
        .map(|medicine| medicine.name().to_string())
        .collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert_eq!(names.len(), PREDEFINED_CATALOGUE.len());
}

#[rstest]
#[tokio::test]
async fn delivery_tokens_are_added_once(owner: UserId) {
    let store = store_with_user(&owner).await;
    let token = DeliveryToken::new("device-1").expect("token");

    assert!(store.add_delivery_token(&owner, &token).await.expect("add"));
    assert!(!store.add_delivery_token(&owner, &token).await.expect("re-add"));

    let user = store.find_by_id(&owner).await.expect("find").expect("user");
    assert_eq!(user.delivery_tokens(), &[token]);
}

#[rstest]
#[tokio::test]
async fn only_users_with_tokens_are_listed_for_reminders(owner: UserId) {
    let store = store_with_user(&owner).await;
    let silent = UserId::random();
    store
        .upsert(&sample_user(silent.clone(), "Asia/Tokyo"))
        .await
        .expect("seed");
    let token = DeliveryToken::new("device-1").expect("token");
    store.add_delivery_token(&owner, &token).await.expect("add");

    let listed = store.list_with_delivery_tokens().await.expect("list");

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id(), &owner);
}

#[rstest]
#[tokio::test]
async fn pruning_and_marking_preserve_other_fields(owner: UserId) {
    let store = store_with_user(&owner).await;
    let keep = DeliveryToken::new("keep").expect("token");
    let drop = DeliveryToken::new("drop").expect("token");
    store.add_delivery_token(&owner, &keep).await.expect("add");
    store.add_delivery_token(&owner, &drop).await.expect("add");
    let today: LocalDate = "19/10/2026".parse().expect("date");

    store
        .remove_delivery_tokens(&owner, std::slice::from_ref(&drop))
        .await
        .expect("prune");
    store.mark_reminded(&owner, today).await.expect("mark");

    let user = store.find_by_id(&owner).await.expect("find").expect("user");
    assert_eq!(user.delivery_tokens(), &[keep]);
    assert_eq!(user.last_reminded_on(), Some(today));
    assert_eq!(user.time_zone(), "Europe/London");
}

#[rstest]
#[tokio::test]
async fn upsert_keeps_tokens_of_an_existing_user(owner: UserId) {
    let store = store_with_user(&owner).await;
    let token = DeliveryToken::new("device-1").expect("token");
    store.add_delivery_token(&owner, &token).await.expect("add");

    store
        .upsert(&sample_user(owner.clone(), "America/New_York"))
        .await
        .expect("upsert");

    let user = store.find_by_id(&owner).await.expect("find").expect("user");
    assert_eq!(user.time_zone(), "America/New_York");
    assert_eq!(user.delivery_tokens(), &[token]);
}

#[rstest]
#[tokio::test]
async fn routine_with_unknown_medicine_is_rejected(owner: UserId) {
    let store = store_with_user(&owner).await;
    let routine = sample_routine(
        &owner,
        "Morning",
        vec![sample_entry("Ghost", every_day(&[DoseSlot::Morning]))],
    );

    let err = store.create(&routine).await.expect_err("missing medicine");

    assert!(matches!(err, RoutineRepositoryError::MissingMedicine { .. }));
    assert!(store.list_for_user(&owner).await.expect("list").is_empty());
}

#[rstest]
#[tokio::test]
async fn user_defined_medicine_of_another_user_is_missing(owner: UserId) {
    let store = store_with_user(&owner).await;
    let other = UserId::random();
    store
        .upsert(&sample_user(other.clone(), "Europe/London"))
        .await
        .expect("seed");
    let name = MedicineName::new("Secret tonic").expect("name");
    let foreign = Medicine::user_defined(MedicineId::random(), name, other);
    store.insert_user_defined(&foreign).await.expect("insert");
    let mut entry = sample_entry("Secret tonic", every_day(&[DoseSlot::Night]));
    entry.medicine = foreign.reference();

    let err = store
        .create(&sample_routine(&owner, "Night", vec![entry]))
        .await
        .expect_err("foreign medicine");

    assert!(matches!(err, RoutineRepositoryError::MissingMedicine { .. }));
}

#[rstest]
#[tokio::test]
async fn routines_are_scoped_to_their_owner(owner: UserId) {
    let store = store_with_user(&owner).await;
    let routine = sample_routine(&owner, "Morning", vec![catalogue_entry()]);
    store.create(&routine).await.expect("create");

    let stranger = UserId::random();
    assert!(
        store
            .find_for_user(&stranger, &routine.id())
            .await
            .expect("find")
            .is_none()
    );
    assert_eq!(
        store.find_for_user(&owner, &routine.id()).await.expect("find"),
        Some(routine)
    );
}

#[rstest]
#[tokio::test]
async fn duplicate_batch_leaves_history_untouched(owner: UserId) {
    let store = store_with_user(&owner).await;
    let first = catalogue_entry();
    let second = catalogue_entry();
    let routine = sample_routine(&owner, "Morning", vec![first.clone(), second.clone()]);
    store.create(&routine).await.expect("create");
    let at = utc_instant(2026, 10, 19, 8, 0);
    let earlier = TakenRecord::new(routine.id(), second.id, monday_morning(), at);
    store
        .record_taken(&routine.id(), std::slice::from_ref(&earlier))
        .await
        .expect("first record");

    let batch = [
        TakenRecord::new(routine.id(), first.id, monday_morning(), at),
        TakenRecord::new(routine.id(), second.id, monday_morning(), at),
    ];
    let err = store
        .record_taken(&routine.id(), &batch)
        .await
        .expect_err("duplicate");

    assert!(matches!(err, RoutineRepositoryError::DuplicateTaken { .. }));
    let stored = store
        .find_for_user(&owner, &routine.id())
        .await
        .expect("find")
        .expect("routine");
    assert_eq!(stored.taken(), &[earlier.clone()]);
    assert_eq!(stored.taken_ids(), vec![earlier.id]);
}

#[rstest]
#[tokio::test]
async fn recording_against_an_unknown_routine_fails(owner: UserId) {
    let store = store_with_user(&owner).await;
    let entry = catalogue_entry();
    let missing = RoutineId::random();
    let record = TakenRecord::new(
        missing,
        entry.id,
        monday_morning(),
        utc_instant(2026, 10, 19, 8, 0),
    );

    let err = store
        .record_taken(&missing, &[record])
        .await
        .expect_err("missing routine");

    assert!(matches!(err, RoutineRepositoryError::RoutineMissing { .. }));
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_marks_store_exactly_one_record(owner: UserId) {
    let store = Arc::new(store_with_user(&owner).await);
    let entry = catalogue_entry();
    let routine = sample_routine(&owner, "Morning", vec![entry.clone()]);
    store.create(&routine).await.expect("create");

    let attempts: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            let record = TakenRecord::new(
                routine.id(),
                entry.id,
                monday_morning(),
                utc_instant(2026, 10, 19, 8, 0),
            );
            let routine_id = record.routine_id;
            tokio::spawn(async move { store.record_taken(&routine_id, &[record]).await })
        })
        .collect();

    let mut successes = 0;
    for attempt in attempts {
        if attempt.await.expect("join").is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    let stored = store
        .find_for_user(&owner, &routine.id())
        .await
        .expect("find")
        .expect("routine");
    assert_eq!(stored.taken().len(), 1);
}

#[rstest]
#[tokio::test]
async fn medicine_in_use_cannot_be_deleted(owner: UserId) {
    let store = store_with_user(&owner).await;
    let name = MedicineName::new("Fish oil").expect("name");
    let medicine = Medicine::user_defined(MedicineId::random(), name, owner.clone());
    store.insert_user_defined(&medicine).await.expect("insert");
    let mut entry = sample_entry("Fish oil", every_day(&[DoseSlot::Evening]));
    entry.medicine = medicine.reference();
    store
        .create(&sample_routine(&owner, "Evening", vec![entry]))
        .await
        .expect("create");

    let err = store
        .delete_user_defined(&owner, &medicine.id())
        .await
        .expect_err("in use");

    assert!(matches!(err, MedicineRepositoryError::InUse { .. }));
    assert_eq!(store.list_user_defined(&owner).await.expect("list").len(), 1);
}

#[rstest]
#[tokio::test]
async fn unused_medicine_is_deleted_once(owner: UserId) {
    let store = store_with_user(&owner).await;
    let name = MedicineName::new("Fish oil").expect("name");
    let medicine = Medicine::user_defined(MedicineId::random(), name, owner.clone());
    store.insert_user_defined(&medicine).await.expect("insert");

    assert!(store.delete_user_defined(&owner, &medicine.id()).await.expect("delete"));
    assert!(!store.delete_user_defined(&owner, &medicine.id()).await.expect("again"));
}
