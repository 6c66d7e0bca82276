//! # Grants
//!
//! Reconciliation of declared permission grants against a remote permission
//! set.
//!
//! ## Core Concepts
//!
//! - **Grantee**: a user or a group, never both
//! - **GranteeCapability**: a grantee and its ordered `(name, mode)` capabilities
//! - **PermissionStore**: the remote side, able to fetch, bulk-write and revoke
//! - **merge_grantees**: folds a fresh read into local state without reordering it
//!
//! ## Lifecycle
//!
//! | Operation | Remote calls |
//! |-----------|--------------|
//! | [`create`] | one bulk write |
//! | [`refresh`] | one fetch, then a merge |
//! | [`update`] | bulk write, fetch, one revoke per grant the plan drops |
//! | [`destroy`] | one revoke per local grant, failures logged and skipped |
//!
//! ## Example
//!
//! ```ignore
//! use grants::{Capability, Grantee, GranteeCapability, update_simple};
//!
//! let planned = vec![GranteeCapability::new(
//!     Grantee::Group("g1".into()),
//!     vec![Capability::allow("Read")],
//! )];
//! let summary = update_simple(&store, &planned)?;
//! println!("revoked {}", summary.revoked);
//! ```

pub mod context;
pub mod diff;
pub mod executor;
pub mod merge;
pub mod planner;
pub mod store;
pub mod types;

// Re-export main types at crate root
pub use context::{LogProgress, NoProgress, ProgressCallback};
pub use diff::{CapabilityMap, all_revocations, capability_map, revocations};
pub use executor::{create, destroy, refresh, update, update_simple};
pub use merge::{merge_grantees, merge_into};
pub use planner::RevocationPlan;
pub use store::PermissionStore;
pub use types::{
    Capability, CapabilityMode, GrantError, Grantee, GranteeCapability, ReconcileSummary,
    Revocation, RevokeOutcome,
};
