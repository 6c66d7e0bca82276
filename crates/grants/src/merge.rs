//! Order-preserving merge of local grant state with the remote permission set
//!
//! The host treats list order as significant, so a read that returns the same
//! grants in a different order must not surface as a change. The merge keeps
//! the local ordering and only edits what the server disagrees with:
//!
//! - grantees and capabilities the server no longer reports are dropped
//! - modes the server reports differently are overwritten in place
//! - anything new on the server is appended, in the server's order

use crate::diff::{CapabilityMap, capability_map};
use crate::types::{Capability, Grantee, GranteeCapability};

/// Merge `state` against the grants the server reported
pub fn merge_grantees(state: Vec<GranteeCapability>, remote: &[GranteeCapability]) -> Vec<GranteeCapability> {
    merge_into(state, capability_map(remote))
}

/// Merge against an already built remote map
///
/// Entries are consumed from `remote` as they are matched.
pub fn merge_into(mut state: Vec<GranteeCapability>, mut remote: CapabilityMap) -> Vec<GranteeCapability> {
    let mut gidx = 0;
    while gidx < state.len() {
        let key = state[gidx].grantee.key();
        let Some(mut remote_caps) = remote.shift_remove(&key) else {
            state.remove(gidx);
            continue;
        };

        let capabilities = &mut state[gidx].capabilities;
        let mut cidx = 0;
        while cidx < capabilities.len() {
            match remote_caps.shift_remove(&capabilities[cidx].name) {
                Some(mode) => {
                    if capabilities[cidx].mode != mode {
                        capabilities[cidx].mode = mode;
                    }
                    cidx += 1;
                }
                None => {
                    capabilities.remove(cidx);
                }
            }
        }

        capabilities.extend(
            remote_caps
                .into_iter()
                .map(|(name, mode)| Capability::new(name, mode)),
        );
        gidx += 1;
    }

    for (key, capabilities) in remote {
        let Ok(grantee) = Grantee::from_key(&key) else {
            log::warn!("Skipping remote grantee with malformed key '{key}'");
            continue;
        };
        state.push(GranteeCapability::new(
            grantee,
            capabilities
                .into_iter()
                .map(|(name, mode)| Capability::new(name, mode))
                .collect(),
        ));
    }

    state
}
