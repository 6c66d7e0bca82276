//! Progress callbacks for reconciliation runs
//!
//! These traits let callers report progress without the grants crate
//! depending on a particular UI.

use crate::types::{Revocation, RevokeOutcome};

/// Progress callback for reconciliation operations
pub trait ProgressCallback {
    /// Called before the bulk write of `grantees` grantees
    fn on_write(&mut self, grantees: usize);

    /// Called when the revocation phase starts
    fn on_revoke_start(&mut self, count: usize);

    /// Called after each revoke call
    fn on_revoke_complete(&mut self, revocation: &Revocation, outcome: &RevokeOutcome);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_write(&mut self, _grantees: usize) {}
    fn on_revoke_start(&mut self, _count: usize) {}
    fn on_revoke_complete(&mut self, _revocation: &Revocation, _outcome: &RevokeOutcome) {}
}

/// Progress callback that writes to the `log` facade
pub struct LogProgress;

impl ProgressCallback for LogProgress {
    fn on_write(&mut self, grantees: usize) {
        log::debug!("Writing permissions for {grantees} grantee(s)");
    }

    fn on_revoke_start(&mut self, count: usize) {
        if count > 0 {
            log::debug!("Revoking {count} grant(s)");
        }
    }

    fn on_revoke_complete(&mut self, revocation: &Revocation, outcome: &RevokeOutcome) {
        match outcome {
            RevokeOutcome::Revoked => log::info!("Revoked {revocation}"),
            RevokeOutcome::Failed { error } => log::warn!("Failed to revoke {revocation}: {error}"),
        }
    }
}
