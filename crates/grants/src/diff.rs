//! Capability maps and revocation diffs

use crate::types::{Capability, CapabilityMode, Grantee, GranteeCapability, Revocation};
use indexmap::IndexMap;

/// `granteeKey -> capabilityName -> mode`, in first-seen order
pub type CapabilityMap = IndexMap<String, IndexMap<String, CapabilityMode>>;

/// Build a [`CapabilityMap`] from a grant list
///
/// A grantee listed twice has its capabilities folded into one entry; a
/// repeated capability name keeps the last mode seen.
pub fn capability_map(grants: &[GranteeCapability]) -> CapabilityMap {
    let mut map = CapabilityMap::new();
    for grant in grants {
        let entry = map.entry(grant.grantee.key()).or_default();
        for capability in &grant.capabilities {
            entry.insert(capability.name.clone(), capability.mode);
        }
    }
    map
}

/// Grants present in `current` but absent from `planned`
///
/// A grant is absent when its grantee is missing from the plan or the plan
/// does not name the capability. Modes are not compared: a capability the
/// plan holds with another mode stays, and the next read reports its mode.
/// Each revocation carries the mode the server reported, since the delete
/// call addresses the full triple. Output order follows `current`.
pub fn revocations(planned: &[GranteeCapability], current: &[GranteeCapability]) -> Vec<Revocation> {
    let planned = capability_map(planned);
    let mut out = Vec::new();

    for (key, capabilities) in capability_map(current) {
        let Ok(grantee) = Grantee::from_key(&key) else {
            continue;
        };
        let planned_caps = planned.get(&key);
        for (name, mode) in capabilities {
            let kept = planned_caps.is_some_and(|caps| caps.contains_key(&name));
            if !kept {
                out.push(Revocation {
                    grantee: grantee.clone(),
                    capability: Capability::new(name, mode),
                });
            }
        }
    }

    out
}

/// Flatten a grant list into one revocation per `(grantee, capability)`
pub fn all_revocations(grants: &[GranteeCapability]) -> Vec<Revocation> {
    grants
        .iter()
        .flat_map(|grant| {
            grant.capabilities.iter().map(|capability| Revocation {
                grantee: grant.grantee.clone(),
                capability: capability.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, caps: Vec<Capability>) -> GranteeCapability {
        GranteeCapability::new(Grantee::User(id.into()), caps)
    }

    fn group(id: &str, caps: Vec<Capability>) -> GranteeCapability {
        GranteeCapability::new(Grantee::Group(id.into()), caps)
    }

    #[test]
    fn test_capability_map_preserves_order() {
        let grants = vec![
            group("g", vec![Capability::allow("Write"), Capability::deny("Read")]),
            user("u", vec![Capability::allow("Read")]),
        ];
        let map = capability_map(&grants);
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, vec!["|g", "u|"]);
        let names: Vec<_> = map["|g"].keys().cloned().collect();
        assert_eq!(names, vec!["Write", "Read"]);
        assert_eq!(map["|g"]["Read"], CapabilityMode::Deny);
    }

    #[test]
    fn test_revocations_none_when_equal() {
        let grants = vec![user("u", vec![Capability::allow("Read")])];
        assert!(revocations(&grants, &grants).is_empty());
    }

    #[test]
    fn test_revocations_missing_capability() {
        let planned = vec![user("u", vec![Capability::allow("Read")])];
        let current = vec![user(
            "u",
            vec![Capability::allow("Read"), Capability::allow("Write")],
        )];
        let out = revocations(&planned, &current);
        assert_eq!(
            out,
            vec![Revocation {
                grantee: Grantee::User("u".into()),
                capability: Capability::allow("Write"),
            }]
        );
    }

    #[test]
    fn test_revocations_missing_grantee() {
        let planned = vec![user("u", vec![Capability::allow("Read")])];
        let current = vec![
            user("u", vec![Capability::allow("Read")]),
            group("g", vec![Capability::allow("Read"), Capability::deny("Delete")]),
        ];
        let out = revocations(&planned, &current);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|r| r.grantee == Grantee::Group("g".into())));
        assert_eq!(out[1].capability, Capability::deny("Delete"));
    }

    #[test]
    fn test_revocations_keep_planned_name_with_other_mode() {
        let planned = vec![user("u", vec![Capability::allow("Read")])];
        let current = vec![user("u", vec![Capability::deny("Read"), Capability::deny("Write")])];
        let out = revocations(&planned, &current);
        assert_eq!(
            out,
            vec![Revocation {
                grantee: Grantee::User("u".into()),
                capability: Capability::deny("Write"),
            }]
        );
    }

    #[test]
    fn test_revocations_ignore_reordering() {
        let planned = vec![
            group("g", vec![Capability::allow("Read")]),
            user("u", vec![Capability::allow("Write"), Capability::allow("Read")]),
        ];
        let current = vec![
            user("u", vec![Capability::allow("Read"), Capability::allow("Write")]),
            group("g", vec![Capability::allow("Read")]),
        ];
        assert!(revocations(&planned, &current).is_empty());
    }

    #[test]
    fn test_all_revocations() {
        let grants = vec![
            user("u", vec![Capability::allow("Read"), Capability::deny("Write")]),
            group("g", vec![]),
        ];
        let out = all_revocations(&grants);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].capability, Capability::deny("Write"));
    }
}
