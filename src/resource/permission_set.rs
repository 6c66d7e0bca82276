//! Whole permission sets: a project's permissions, or one of its default
//! permission sets
//!
//! Reads merge the server's view into state without reordering it. Updates
//! are two-phase (bulk write, then revoke what the plan drops). Deletes
//! revoke every grant in state, keep going past failures, and report them at
//! the end.

use super::{Resource, non_empty};
use anyhow::{Context, Result, bail};
use grants::{Capability, CapabilityMode, Grantee, GranteeCapability, LogProgress};
use serde::{Deserialize, Serialize};
use tableau::{Client, DefaultTarget, PermissionSetId, PermissionTarget, PermissionsStore};

// ============================================================================
// Shared model
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityModel {
    pub name: String,
    pub mode: String,
}

/// One grantee and its capabilities; exactly one of the IDs is set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GranteeModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<CapabilityModel>,
}

impl GranteeModel {
    fn to_grant(&self) -> Result<GranteeCapability> {
        let grantee = Grantee::from_pair(
            non_empty(&self.user_id).as_deref(),
            non_empty(&self.group_id).as_deref(),
        )?;
        let capabilities = self
            .capabilities
            .iter()
            .map(|c| -> Result<Capability> { Ok(Capability::new(&c.name, c.mode.parse::<CapabilityMode>()?)) })
            .collect::<Result<Vec<_>>>()?;
        Ok(GranteeCapability::new(grantee, capabilities))
    }

    pub(crate) fn from_grant(grant: GranteeCapability) -> Self {
        Self {
            user_id: grant.grantee.user_id().map(str::to_string),
            group_id: grant.grantee.group_id().map(str::to_string),
            capabilities: grant
                .capabilities
                .into_iter()
                .map(|c| CapabilityModel {
                    name: c.name,
                    mode: c.mode.as_str().to_string(),
                })
                .collect(),
        }
    }
}

fn to_grants(models: &[GranteeModel]) -> Result<Vec<GranteeCapability>> {
    models.iter().map(GranteeModel::to_grant).collect()
}

/// Planned grants, checked against what `target` supports
fn planned_grants(target: &PermissionTarget, models: &[GranteeModel]) -> Result<Vec<GranteeCapability>> {
    let grants = to_grants(models)?;
    target.validate_grants(&grants)?;
    Ok(grants)
}

fn from_grants(grants: Vec<GranteeCapability>) -> Vec<GranteeModel> {
    grants.into_iter().map(GranteeModel::from_grant).collect()
}

// ============================================================================
// Lifecycle against one target
// ============================================================================

fn create_set(client: &Client, target: PermissionTarget, planned: &[GranteeModel]) -> Result<()> {
    let grants = planned_grants(&target, planned)?;
    let store = PermissionsStore::new(client, target);
    let summary = grants::create(&store, &grants, &mut LogProgress)?;
    log::info!("Wrote {} grantee(s) to {}", summary.written, store.target());
    Ok(())
}

fn read_set(client: &Client, target: PermissionTarget, state: &[GranteeModel]) -> Result<Option<Vec<GranteeModel>>> {
    let local = to_grants(state)?;
    let store = PermissionsStore::new(client, target);
    match grants::refresh(&store, local) {
        Ok(merged) => Ok(Some(from_grants(merged))),
        Err(e) if tableau::is_not_found(&e) => {
            log::info!("{} no longer exists, removing from state", store.target());
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read permissions for {}", store.target())),
    }
}

fn update_set(client: &Client, target: PermissionTarget, planned: &[GranteeModel]) -> Result<()> {
    let grants = planned_grants(&target, planned)?;
    let store = PermissionsStore::new(client, target);
    let summary = grants::update(&store, &grants, &mut LogProgress)?;
    log::info!(
        "Updated {}: {} grantee(s) written, {} grant(s) revoked",
        store.target(),
        summary.written,
        summary.revoked
    );
    Ok(())
}

fn delete_set(client: &Client, target: PermissionTarget, state: &[GranteeModel]) -> Result<()> {
    let grants = to_grants(state)?;
    let store = PermissionsStore::new(client, target);
    let summary = grants::destroy(&store, &grants, &mut LogProgress);
    if !summary.is_success() {
        let failures: Vec<String> = summary
            .failed
            .iter()
            .map(|(revocation, error)| format!("  {revocation}: {error}"))
            .collect();
        bail!(
            "Could not revoke {} grant(s) on {}:\n{}",
            failures.len(),
            store.target(),
            failures.join("\n")
        );
    }
    log::info!("Revoked {} grant(s) on {}", summary.revoked, store.target());
    Ok(())
}

// ============================================================================
// Project permissions
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectPermissionsModel {
    /// `projects/<projectID>/permissions`
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub grantee_capabilities: Vec<GranteeModel>,
}

impl ProjectPermissionsModel {
    fn set_id(&self) -> Result<PermissionSetId> {
        if !self.project_id.is_empty() {
            return Ok(PermissionSetId::project(&self.project_id));
        }
        let id: PermissionSetId = self.id.parse()?;
        match id.target {
            PermissionTarget::Project(_) => Ok(id),
            _ => bail!("'{}' is not a project permission set ID", self.id),
        }
    }

    fn with_grants(&self, set_id: &PermissionSetId, grantees: Vec<GranteeModel>) -> Self {
        Self {
            id: set_id.to_string(),
            project_id: set_id.target.object_id().to_string(),
            grantee_capabilities: grantees,
        }
    }
}

pub struct ProjectPermissions;

impl Resource for ProjectPermissions {
    type Model = ProjectPermissionsModel;

    fn create(client: &Client, plan: &Self::Model) -> Result<Self::Model> {
        let set_id = plan.set_id()?;
        create_set(client, set_id.target.clone(), &plan.grantee_capabilities)?;
        Ok(plan.with_grants(&set_id, plan.grantee_capabilities.clone()))
    }

    fn read(client: &Client, state: &Self::Model) -> Result<Option<Self::Model>> {
        let set_id = state.set_id()?;
        Ok(read_set(client, set_id.target.clone(), &state.grantee_capabilities)?
            .map(|grantees| state.with_grants(&set_id, grantees)))
    }

    fn update(client: &Client, state: &Self::Model, plan: &Self::Model) -> Result<Self::Model> {
        let set_id = state.set_id()?;
        if plan.set_id()? != set_id {
            bail!("Project permissions cannot move to another project; replace the resource instead");
        }
        update_set(client, set_id.target.clone(), &plan.grantee_capabilities)?;
        Ok(plan.with_grants(&set_id, plan.grantee_capabilities.clone()))
    }

    fn delete(client: &Client, state: &Self::Model) -> Result<()> {
        delete_set(client, state.set_id()?.target, &state.grantee_capabilities)
    }

    fn import(id: &str) -> Result<Self::Model> {
        let model = ProjectPermissionsModel {
            id: id.to_string(),
            ..Default::default()
        };
        let set_id = model.set_id()?;
        Ok(model.with_grants(&set_id, Vec::new()))
    }
}

// ============================================================================
// Default permissions
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultPermissionsModel {
    /// `projects/<projectID>/default-permissions/<targetType>`
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub target_type: String,
    #[serde(default)]
    pub grantee_capabilities: Vec<GranteeModel>,
}

impl DefaultPermissionsModel {
    fn set_id(&self) -> Result<PermissionSetId> {
        if !self.project_id.is_empty() && !self.target_type.is_empty() {
            let target: DefaultTarget = self.target_type.parse()?;
            return Ok(PermissionSetId::project_default(&self.project_id, target));
        }
        let id: PermissionSetId = self.id.parse()?;
        match id.target {
            PermissionTarget::ProjectDefault { .. } => Ok(id),
            _ => bail!("'{}' is not a default permission set ID", self.id),
        }
    }

    fn with_grants(&self, set_id: &PermissionSetId, grantees: Vec<GranteeModel>) -> Self {
        let target_type = match &set_id.target {
            PermissionTarget::ProjectDefault { target, .. } => target.to_string(),
            _ => self.target_type.clone(),
        };
        Self {
            id: set_id.to_string(),
            project_id: set_id.target.object_id().to_string(),
            target_type,
            grantee_capabilities: grantees,
        }
    }
}

pub struct DefaultPermissions;

impl Resource for DefaultPermissions {
    type Model = DefaultPermissionsModel;

    fn create(client: &Client, plan: &Self::Model) -> Result<Self::Model> {
        let set_id = plan.set_id()?;
        create_set(client, set_id.target.clone(), &plan.grantee_capabilities)?;
        Ok(plan.with_grants(&set_id, plan.grantee_capabilities.clone()))
    }

    fn read(client: &Client, state: &Self::Model) -> Result<Option<Self::Model>> {
        let set_id = state.set_id()?;
        Ok(read_set(client, set_id.target.clone(), &state.grantee_capabilities)?
            .map(|grantees| state.with_grants(&set_id, grantees)))
    }

    fn update(client: &Client, state: &Self::Model, plan: &Self::Model) -> Result<Self::Model> {
        let set_id = state.set_id()?;
        if plan.set_id()? != set_id {
            bail!("Default permissions cannot change project or target type; replace the resource instead");
        }
        update_set(client, set_id.target.clone(), &plan.grantee_capabilities)?;
        Ok(plan.with_grants(&set_id, plan.grantee_capabilities.clone()))
    }

    fn delete(client: &Client, state: &Self::Model) -> Result<()> {
        delete_set(client, state.set_id()?.target, &state.grantee_capabilities)
    }

    fn import(id: &str) -> Result<Self::Model> {
        let model = DefaultPermissionsModel {
            id: id.to_string(),
            ..Default::default()
        };
        let set_id = model.set_id()?;
        Ok(model.with_grants(&set_id, Vec::new()))
    }
}
