//! The permission store trait

use crate::types::{Capability, Grantee, GranteeCapability};
use anyhow::Result;

/// A remote permission set that can be read, bulk-written and revoked from
///
/// One store is scoped to one target: a project, a workbook, a project's
/// default permissions for one content type, and so on.
pub trait PermissionStore {
    /// Human-readable description for logs (e.g. "project p1")
    fn describe(&self) -> String;

    /// Read the permission set as the server reports it
    fn fetch(&self) -> Result<Vec<GranteeCapability>>;

    /// Add or overwrite the given grants in one call
    ///
    /// Grants not named here are left untouched by the server.
    fn write(&self, grants: &[GranteeCapability]) -> Result<()>;

    /// Remove one `(grantee, capability, mode)` grant
    fn revoke(&self, grantee: &Grantee, capability: &Capability) -> Result<()>;
}
