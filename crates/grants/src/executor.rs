//! Reconciliation engine - applies permission sets against a store

use crate::context::{NoProgress, ProgressCallback};
use crate::diff::all_revocations;
use crate::merge::merge_grantees;
use crate::planner::RevocationPlan;
use crate::store::PermissionStore;
use crate::types::{GranteeCapability, ReconcileSummary, RevokeOutcome};
use anyhow::{Context, Result};

/// Create a permission set with a single bulk write
pub fn create<S, P>(store: &S, planned: &[GranteeCapability], progress: &mut P) -> Result<ReconcileSummary>
where
    S: PermissionStore + ?Sized,
    P: ProgressCallback,
{
    progress.on_write(planned.len());
    store
        .write(planned)
        .with_context(|| format!("Failed to write permissions for {}", store.describe()))?;

    Ok(ReconcileSummary {
        written: planned.len(),
        ..Default::default()
    })
}

/// Re-read the permission set and merge it into `state`
pub fn refresh<S>(store: &S, state: Vec<GranteeCapability>) -> Result<Vec<GranteeCapability>>
where
    S: PermissionStore + ?Sized,
{
    let remote = store.fetch()?;
    log::debug!(
        "Read {} grantee(s) from {}",
        remote.len(),
        store.describe()
    );
    Ok(merge_grantees(state, &remote))
}

/// Two-phase update
///
/// 1. One bulk write of the planned grants.
/// 2. One re-fetch, then one revoke per remote grant the plan does not name.
///
/// The first failure aborts the run. Grants already written or revoked stay
/// that way.
pub fn update<S, P>(store: &S, planned: &[GranteeCapability], progress: &mut P) -> Result<ReconcileSummary>
where
    S: PermissionStore + ?Sized,
    P: ProgressCallback,
{
    let mut summary = create(store, planned, progress)?;

    let current = store
        .fetch()
        .with_context(|| format!("Failed to re-read permissions for {}", store.describe()))?;
    let plan = RevocationPlan::against(planned, &current);

    progress.on_revoke_start(plan.len());
    for revocation in &plan.revocations {
        if let Err(e) = store.revoke(&revocation.grantee, &revocation.capability) {
            let outcome = RevokeOutcome::Failed {
                error: format!("{e:#}"),
            };
            progress.on_revoke_complete(revocation, &outcome);
            return Err(e).with_context(|| {
                format!("Failed to revoke {revocation} on {}", store.describe())
            });
        }
        let outcome = RevokeOutcome::Revoked;
        progress.on_revoke_complete(revocation, &outcome);
        summary.add_outcome(revocation, &outcome);
    }

    Ok(summary)
}

/// Revoke every grant held in local state
///
/// Works from `state` alone, without a re-fetch. Failures are recorded and
/// the loop moves on; inspect [`ReconcileSummary::failed`] afterwards.
pub fn destroy<S, P>(store: &S, state: &[GranteeCapability], progress: &mut P) -> ReconcileSummary
where
    S: PermissionStore + ?Sized,
    P: ProgressCallback,
{
    let revocations = all_revocations(state);
    let mut summary = ReconcileSummary::default();

    progress.on_revoke_start(revocations.len());
    for revocation in &revocations {
        let outcome = match store.revoke(&revocation.grantee, &revocation.capability) {
            Ok(()) => RevokeOutcome::Revoked,
            Err(e) => {
                log::warn!(
                    "Could not revoke {revocation} on {}: {e:#}",
                    store.describe()
                );
                RevokeOutcome::Failed {
                    error: format!("{e:#}"),
                }
            }
        };
        progress.on_revoke_complete(revocation, &outcome);
        summary.add_outcome(revocation, &outcome);
    }

    summary
}

/// Update without a progress callback
pub fn update_simple<S: PermissionStore + ?Sized>(
    store: &S,
    planned: &[GranteeCapability],
) -> Result<ReconcileSummary> {
    update(store, planned, &mut NoProgress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::capability_map;
    use crate::types::{Capability, Grantee};
    use std::cell::RefCell;

    /// In-memory permission store that logs every call
    #[derive(Default)]
    struct MockStore {
        remote: RefCell<Vec<GranteeCapability>>,
        calls: RefCell<Vec<String>>,
        fail_revoke: Option<String>,
    }

    impl MockStore {
        fn with_remote(remote: Vec<GranteeCapability>) -> Self {
            Self {
                remote: RefCell::new(remote),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl PermissionStore for MockStore {
        fn describe(&self) -> String {
            "mock".into()
        }

        fn fetch(&self) -> Result<Vec<GranteeCapability>> {
            self.calls.borrow_mut().push("fetch".into());
            Ok(self.remote.borrow().clone())
        }

        fn write(&self, grants: &[GranteeCapability]) -> Result<()> {
            self.calls.borrow_mut().push(format!("write {}", grants.len()));
            let mut remote = self.remote.borrow_mut();
            for grant in grants {
                match remote.iter_mut().find(|g| g.grantee == grant.grantee) {
                    Some(existing) => {
                        for cap in &grant.capabilities {
                            existing.capabilities.retain(|c| c.name != cap.name);
                            existing.capabilities.push(cap.clone());
                        }
                    }
                    None => remote.push(grant.clone()),
                }
            }
            Ok(())
        }

        fn revoke(&self, grantee: &Grantee, capability: &Capability) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("revoke {} {capability}", grantee.key()));
            if self.fail_revoke.as_deref() == Some(capability.name.as_str()) {
                anyhow::bail!("status: 500, body: boom");
            }
            let mut remote = self.remote.borrow_mut();
            for grant in remote.iter_mut().filter(|g| &g.grantee == grantee) {
                grant.capabilities.retain(|c| c != capability);
            }
            remote.retain(|g| !g.capabilities.is_empty());
            Ok(())
        }
    }

    fn user(id: &str, caps: Vec<Capability>) -> GranteeCapability {
        GranteeCapability::new(Grantee::User(id.into()), caps)
    }

    #[test]
    fn test_create_single_write() {
        let store = MockStore::default();
        let planned = vec![user("u", vec![Capability::allow("Read")])];
        let summary = create(&store, &planned, &mut NoProgress).unwrap();
        assert_eq!(summary.written, 1);
        assert_eq!(store.calls(), vec!["write 1"]);
    }

    #[test]
    fn test_update_with_removal_issues_one_write_and_one_revoke() {
        let store = MockStore::with_remote(vec![user(
            "u",
            vec![Capability::allow("Read"), Capability::allow("Write")],
        )]);
        let planned = vec![user("u", vec![Capability::allow("Read")])];

        let summary = update_simple(&store, &planned).unwrap();

        assert_eq!(
            store.calls(),
            vec!["write 1", "fetch", "revoke u| Write:Allow"]
        );
        assert_eq!(summary.revoked, 1);
        assert_eq!(
            capability_map(&store.remote.borrow()),
            capability_map(&planned)
        );
    }

    #[test]
    fn test_update_no_revocations_when_converged() {
        let planned = vec![user("u", vec![Capability::allow("Read")])];
        let store = MockStore::with_remote(planned.clone());
        let summary = update_simple(&store, &planned).unwrap();
        assert_eq!(summary.revoked, 0);
        assert_eq!(store.calls(), vec!["write 1", "fetch"]);
    }

    #[test]
    fn test_update_aborts_on_first_revoke_failure() {
        let mut store = MockStore::with_remote(vec![
            user("u", vec![Capability::allow("Read")]),
            user("x", vec![Capability::allow("Delete"), Capability::allow("Write")]),
        ]);
        store.fail_revoke = Some("Delete".into());
        let planned = vec![user("u", vec![Capability::allow("Read")])];

        let err = update_simple(&store, &planned).unwrap_err();

        assert!(format!("{err:#}").contains("status: 500"));
        // Nothing runs after the failed revoke
        assert_eq!(
            store.calls(),
            vec!["write 1", "fetch", "revoke x| Delete:Allow"]
        );
    }

    #[test]
    fn test_refresh_merges_state() {
        let store = MockStore::with_remote(vec![user(
            "u",
            vec![Capability::deny("Read"), Capability::allow("Write")],
        )]);
        let state = vec![user("u", vec![Capability::allow("Read")])];
        let merged = refresh(&store, state).unwrap();
        assert_eq!(
            merged,
            vec![user(
                "u",
                vec![Capability::deny("Read"), Capability::allow("Write")],
            )]
        );
    }

    #[test]
    fn test_destroy_is_best_effort() {
        let mut store = MockStore::default();
        store.fail_revoke = Some("Read".into());
        let state = vec![user(
            "u",
            vec![Capability::allow("Read"), Capability::allow("Write")],
        )];

        let summary = destroy(&store, &state, &mut NoProgress);

        assert_eq!(summary.revoked, 1);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(
            store.calls(),
            vec!["revoke u| Read:Allow", "revoke u| Write:Allow"]
        );
    }

    #[test]
    fn test_destroy_does_not_fetch() {
        let store = MockStore::default();
        let state = vec![user("u", vec![Capability::allow("Read")])];
        let summary = destroy(&store, &state, &mut NoProgress);
        assert!(summary.is_success());
        assert!(!store.calls().contains(&"fetch".to_string()));
    }
}
