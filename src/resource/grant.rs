//! Single `(grantee, capability, mode)` grants
//!
//! Each grant is its own resource, identified by a slash-delimited
//! [`GrantId`]. There is no update: changing any field means revoking the
//! grant and creating a new one.

use super::{Resource, absent_if_not_found, non_empty};
use anyhow::{Context, Result, bail};
use grants::{Capability, CapabilityMode, Grantee, GranteeCapability};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use tableau::{Client, DefaultTarget, GrantId, PermissionTarget};

/// Content type whose permissions a [`ContentGrant`] manages
pub trait GrantKind {
    /// Leading ID segment, e.g. `workbooks`
    const SEGMENT: &'static str;
}

pub struct ProjectGrant;
pub struct WorkbookGrant;
pub struct DatasourceGrant;
pub struct ViewGrant;
pub struct VirtualConnectionGrant;

impl GrantKind for ProjectGrant {
    const SEGMENT: &'static str = "projects";
}

impl GrantKind for WorkbookGrant {
    const SEGMENT: &'static str = "workbooks";
}

impl GrantKind for DatasourceGrant {
    const SEGMENT: &'static str = "datasources";
}

impl GrantKind for ViewGrant {
    const SEGMENT: &'static str = "views";
}

impl GrantKind for VirtualConnectionGrant {
    const SEGMENT: &'static str = "virtualConnections";
}

fn grantee(user_id: &Option<String>, group_id: &Option<String>) -> Result<Grantee> {
    Ok(Grantee::from_pair(
        non_empty(user_id).as_deref(),
        non_empty(group_id).as_deref(),
    )?)
}

fn capability(name: &str, mode: &str) -> Result<Capability> {
    Ok(Capability::new(name, mode.parse::<CapabilityMode>()?))
}

/// Write a planned grant; its capability must suit the target
fn create_grant(client: &Client, id: &GrantId) -> Result<()> {
    id.target.validate_capability(&id.capability)?;
    let grant = GranteeCapability::new(id.grantee.clone(), vec![id.capability.clone()]);
    client
        .put_permissions(&id.target, &[grant])
        .with_context(|| format!("Could not grant {} {} on {}", id.grantee, id.capability, id.target))?;
    log::info!("Granted {} {} on {}", id.grantee, id.capability, id.target);
    Ok(())
}

fn grant_exists(client: &Client, id: &GrantId) -> Result<bool> {
    let present = absent_if_not_found(
        client.has_permission(&id.target, &id.grantee, &id.capability),
        &id.target.to_string(),
    )?;
    if present == Some(false) {
        log::info!("Grant {id} no longer exists, removing from state");
    }
    Ok(present.unwrap_or(false))
}

fn delete_grant(client: &Client, id: &GrantId) -> Result<()> {
    client
        .delete_permission(&id.target, &id.grantee, &id.capability)
        .with_context(|| format!("Could not revoke {} {} on {}", id.grantee, id.capability, id.target))?;
    log::info!("Revoked {} {} on {}", id.grantee, id.capability, id.target);
    Ok(())
}

fn refuse_update<T>(id: &str) -> Result<T> {
    bail!("Grant {id} cannot be updated in place; every field forces replacement")
}

// ============================================================================
// Content grants
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantModel {
    #[serde(default)]
    pub id: String,
    /// ID of the project, workbook, datasource, view or virtual connection
    #[serde(
        default,
        alias = "project_id",
        alias = "workbook_id",
        alias = "datasource_id",
        alias = "view_id",
        alias = "virtual_connection_id"
    )]
    pub target_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub capability_name: String,
    #[serde(default)]
    pub capability_mode: String,
}

impl GrantModel {
    fn grant_id<K: GrantKind>(&self) -> Result<GrantId> {
        let target = PermissionTarget::from_segment(K::SEGMENT, self.target_id.clone())
            .with_context(|| format!("unknown content type '{}'", K::SEGMENT))?;
        Ok(GrantId {
            target,
            grantee: grantee(&self.user_id, &self.group_id)?,
            capability: capability(&self.capability_name, &self.capability_mode)?,
        })
    }

    fn from_id(id: &GrantId) -> Self {
        Self {
            id: id.to_string(),
            target_id: id.target.object_id().to_string(),
            user_id: id.grantee.user_id().map(str::to_string),
            group_id: id.grantee.group_id().map(str::to_string),
            capability_name: id.capability.name.clone(),
            capability_mode: id.capability.mode.to_string(),
        }
    }
}

/// One grant on a project, workbook, datasource, view or virtual connection
pub struct ContentGrant<K>(PhantomData<K>);

impl<K: GrantKind> Resource for ContentGrant<K> {
    type Model = GrantModel;

    fn create(client: &Client, plan: &GrantModel) -> Result<GrantModel> {
        let id = plan.grant_id::<K>()?;
        create_grant(client, &id)?;
        Ok(GrantModel::from_id(&id))
    }

    fn read(client: &Client, state: &GrantModel) -> Result<Option<GrantModel>> {
        let id = if state.target_id.is_empty() {
            state.id.parse::<GrantId>()?
        } else {
            state.grant_id::<K>()?
        };
        Ok(grant_exists(client, &id)?.then(|| GrantModel::from_id(&id)))
    }

    fn update(_client: &Client, state: &GrantModel, _plan: &GrantModel) -> Result<GrantModel> {
        refuse_update(&state.id)
    }

    fn delete(client: &Client, state: &GrantModel) -> Result<()> {
        delete_grant(client, &state.id.parse::<GrantId>()?)
    }

    fn import(id: &str) -> Result<GrantModel> {
        let parsed: GrantId = id.parse()?;
        if parsed.target.id_segment() != K::SEGMENT || matches!(parsed.target, PermissionTarget::ProjectDefault { .. }) {
            bail!("'{id}' is not a {} permission ID", K::SEGMENT);
        }
        Ok(GrantModel::from_id(&parsed))
    }
}

// ============================================================================
// Default grants
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultGrantModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default)]
    pub target_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(default)]
    pub capability_name: String,
    #[serde(default)]
    pub capability_mode: String,
}

impl DefaultGrantModel {
    fn grant_id(&self) -> Result<GrantId> {
        let target: DefaultTarget = self.target_type.parse()?;
        Ok(GrantId {
            target: PermissionTarget::ProjectDefault {
                project_id: self.project_id.clone(),
                target,
            },
            grantee: grantee(&self.user_id, &self.group_id)?,
            capability: capability(&self.capability_name, &self.capability_mode)?,
        })
    }

    fn from_id(id: &GrantId) -> Self {
        let target_type = match &id.target {
            PermissionTarget::ProjectDefault { target, .. } => target.to_string(),
            _ => String::new(),
        };
        Self {
            id: id.to_string(),
            project_id: id.target.object_id().to_string(),
            target_type,
            user_id: id.grantee.user_id().map(str::to_string),
            group_id: id.grantee.group_id().map(str::to_string),
            capability_name: id.capability.name.clone(),
            capability_mode: id.capability.mode.to_string(),
        }
    }
}

/// One grant in a project's default permissions for a content type
pub struct DefaultGrant;

impl Resource for DefaultGrant {
    type Model = DefaultGrantModel;

    fn create(client: &Client, plan: &DefaultGrantModel) -> Result<DefaultGrantModel> {
        let id = plan.grant_id()?;
        create_grant(client, &id)?;
        Ok(DefaultGrantModel::from_id(&id))
    }

    fn read(client: &Client, state: &DefaultGrantModel) -> Result<Option<DefaultGrantModel>> {
        let id = if state.project_id.is_empty() {
            state.id.parse::<GrantId>()?
        } else {
            state.grant_id()?
        };
        Ok(grant_exists(client, &id)?.then(|| DefaultGrantModel::from_id(&id)))
    }

    fn update(
        _client: &Client,
        state: &DefaultGrantModel,
        _plan: &DefaultGrantModel,
    ) -> Result<DefaultGrantModel> {
        refuse_update(&state.id)
    }

    fn delete(client: &Client, state: &DefaultGrantModel) -> Result<()> {
        delete_grant(client, &state.id.parse::<GrantId>()?)
    }

    fn import(id: &str) -> Result<DefaultGrantModel> {
        let parsed: GrantId = id.parse()?;
        if !matches!(parsed.target, PermissionTarget::ProjectDefault { .. }) {
            bail!("'{id}' is not a default permission ID");
        }
        Ok(DefaultGrantModel::from_id(&parsed))
    }
}
