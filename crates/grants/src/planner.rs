//! Update planner - decides what a two-phase update must revoke

use crate::diff::revocations;
use crate::types::{GranteeCapability, Revocation};

/// The revocation phase of an update, computed after the bulk write
#[derive(Debug, Clone, Default)]
pub struct RevocationPlan {
    pub revocations: Vec<Revocation>,
}

impl RevocationPlan {
    /// Diff what the server holds after the write against the plan
    ///
    /// The prior local state plays no part: anything remote that the plan
    /// does not name is revoked.
    pub fn against(planned: &[GranteeCapability], current: &[GranteeCapability]) -> Self {
        Self {
            revocations: revocations(planned, current),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.revocations.is_empty()
    }

    pub fn len(&self) -> usize {
        self.revocations.len()
    }
}
