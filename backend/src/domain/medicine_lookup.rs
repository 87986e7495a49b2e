//! Resolution of typed medicine references against their catalogues.
//!
//! Each [`MedicineKind`] maps to one lookup function in a small dispatch
//! table. References are grouped by kind so each catalogue is queried once.

use std::collections::{BTreeMap, HashMap};

use futures_util::future::BoxFuture;

use super::medicine::{Medicine, MedicineId, MedicineKind, MedicineRef};
use super::ports::{MedicineRepository, MedicineRepositoryError};
use super::user::UserId;

type LookupFuture<'a> = BoxFuture<'a, Result<Vec<Medicine>, MedicineRepositoryError>>;
type Lookup =
    for<'a> fn(&'a dyn MedicineRepository, &'a UserId, &'a [MedicineId]) -> LookupFuture<'a>;

fn lookup_predefined<'a>(
    repo: &'a dyn MedicineRepository,
    _owner: &'a UserId,
    ids: &'a [MedicineId],
) -> LookupFuture<'a> {
    repo.find_predefined(ids)
}

fn lookup_user_defined<'a>(
    repo: &'a dyn MedicineRepository,
    owner: &'a UserId,
    ids: &'a [MedicineId],
) -> LookupFuture<'a> {
    repo.find_user_defined(owner, ids)
}

fn lookup_for(kind: MedicineKind) -> Lookup {
    match kind {
        MedicineKind::Predefined => lookup_predefined,
        MedicineKind::UserDefined => lookup_user_defined,
    }
}

/// Result of resolving a batch of references.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMedicines {
    found: HashMap<MedicineRef, Medicine>,
    missing: Vec<MedicineRef>,
}

impl ResolvedMedicines {
    pub fn get(&self, reference: &MedicineRef) -> Option<&Medicine> {
        self.found.get(reference)
    }

    /// References with no matching medicine, in request order.
    pub fn missing(&self) -> &[MedicineRef] {
        &self.missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Resolve `refs` against the catalogues visible to `owner`.
///
/// User-defined references only resolve to medicines `owner` created.
pub async fn resolve_medicines(
    repo: &dyn MedicineRepository,
    owner: &UserId,
    refs: &[MedicineRef],
) -> Result<ResolvedMedicines, MedicineRepositoryError> {
    let mut by_kind: BTreeMap<MedicineKind, Vec<MedicineId>> = BTreeMap::new();
    for reference in refs {
        let ids = by_kind.entry(reference.kind).or_default();
        if !ids.contains(&reference.id) {
            ids.push(reference.id);
        }
    }

    let mut found = HashMap::new();
    for (kind, ids) in &by_kind {
        let lookup = lookup_for(*kind);
        for medicine in lookup(repo, owner, ids).await? {
            found.insert(medicine.reference(), medicine);
        }
    }

    let missing = refs
        .iter()
        .filter(|reference| !found.contains_key(*reference))
        .copied()
        .collect();
    Ok(ResolvedMedicines { found, missing })
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::MedicineName;
    use crate::domain::ports::MockMedicineRepository;
    use mockall::predicate::always;
    use rstest::rstest;

    fn named(name: &str) -> MedicineName {
        MedicineName::new(name).expect("name")
    }

    #[rstest]
    #[tokio::test]
    async fn dispatches_each_kind_to_its_catalogue() {
        let owner = UserId::random();
        let predefined = Medicine::predefined(MedicineId::random(), named("Paracetamol"));
        let own = Medicine::user_defined(MedicineId::random(), named("Tonic"), owner.clone());
        let absent = MedicineRef::user_defined(MedicineId::random());

        let mut repo = MockMedicineRepository::new();
        let predefined_clone = predefined.clone();
        repo.expect_find_predefined()
            .times(1)
            .returning(move |_| Ok(vec![predefined_clone.clone()]));
        let own_clone = own.clone();
        let expected_owner = owner.clone();
        repo.expect_find_user_defined()
            .times(1)
            .withf(move |o, ids| o == &expected_owner && ids.len() == 2)
            .returning(move |_, _| Ok(vec![own_clone.clone()]));

        let refs = [predefined.reference(), own.reference(), absent];
        let resolved = resolve_medicines(&repo, &owner, &refs)
            .await
            .expect("lookup succeeds");

        assert_eq!(
            resolved.get(&predefined.reference()).map(Medicine::id),
            Some(predefined.id())
        );
        assert!(resolved.get(&own.reference()).is_some());
        assert_eq!(resolved.missing(), &[absent]);
        assert!(!resolved.is_complete());
    }

    #[rstest]
    #[tokio::test]
    async fn same_id_under_wrong_kind_is_missing() {
        let owner = UserId::random();
        let predefined = Medicine::predefined(MedicineId::random(), named("Aspirin"));
        let mislabelled = MedicineRef::user_defined(predefined.id());

        let mut repo = MockMedicineRepository::new();
        repo.expect_find_predefined().never();
        repo.expect_find_user_defined()
            .with(always(), always())
            .returning(|_, _| Ok(Vec::new()));

        let resolved = resolve_medicines(&repo, &owner, &[mislabelled])
            .await
            .expect("lookup succeeds");
        assert_eq!(resolved.missing(), &[mislabelled]);
    }

    #[rstest]
    #[tokio::test]
    async fn propagates_repository_errors() {
        let mut repo = MockMedicineRepository::new();
        repo.expect_find_predefined()
            .returning(|_| Err(MedicineRepositoryError::connection("down")));

        let err = resolve_medicines(
            &repo,
            &UserId::random(),
            &[MedicineRef::predefined(MedicineId::random())],
        )
        .await
        .expect_err("error propagates");
        assert_eq!(err, MedicineRepositoryError::connection("down"));
    }
}
