//! Resource lifecycle adapters
//!
//! Every managed Tableau object is a [`Resource`]: a typed state model plus
//! create, read, update, delete and import. The command layer works on JSON
//! documents and goes through [`ResourceKind::apply`], which deserializes
//! into the adapter's model and back.
//!
//! Reads return `None` when the object is gone, so the caller can drop it
//! from state instead of failing.

mod grant;
mod group;
mod group_user;
mod permission_set;
mod project;
mod site;
mod user;
mod workbook;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use tableau::Client;

use grant::{
    ContentGrant, DatasourceGrant, DefaultGrant, ProjectGrant, ViewGrant, VirtualConnectionGrant,
    WorkbookGrant,
};
use group::GroupResource;
use group_user::GroupUserResource;
use permission_set::{DefaultPermissions, ProjectPermissions};
use project::ProjectResource;
use site::SiteResource;
use user::UserResource;
use workbook::WorkbookResource;

pub(crate) use group::GroupModel;
pub(crate) use permission_set::GranteeModel;
pub(crate) use project::ProjectModel;
pub(crate) use site::SiteModel;
pub(crate) use user::UserModel;

/// Core trait for all managed resources
pub trait Resource {
    /// State attributes as persisted in the state document
    type Model: Serialize + DeserializeOwned;

    /// Create the object and return its full state
    fn create(client: &Client, plan: &Self::Model) -> Result<Self::Model>;

    /// Re-fetch the object; `None` when it no longer exists
    fn read(client: &Client, state: &Self::Model) -> Result<Option<Self::Model>>;

    /// Apply `plan` to the object described by `state`
    fn update(client: &Client, state: &Self::Model, plan: &Self::Model) -> Result<Self::Model>;

    fn delete(client: &Client, state: &Self::Model) -> Result<()>;

    /// State skeleton built from an ID alone, completed by a read
    fn import(id: &str) -> Result<Self::Model>;
}

/// A lifecycle call with JSON payloads
#[derive(Debug, Clone)]
pub enum Operation {
    Create { plan: Value },
    Read { state: Value },
    Update { state: Value, plan: Value },
    Delete { state: Value },
    Import { id: String },
}

/// Resource types known to the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ResourceKind {
    User,
    Group,
    GroupUser,
    Project,
    Site,
    Workbook,
    ProjectPermissions,
    DefaultPermissions,
    ProjectPermission,
    WorkbookPermission,
    DatasourcePermission,
    ViewPermission,
    VirtualConnectionPermission,
    ProjectDefaultPermission,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::GroupUser => "group_user",
            Self::Project => "project",
            Self::Site => "site",
            Self::Workbook => "workbook",
            Self::ProjectPermissions => "project_permissions",
            Self::DefaultPermissions => "default_permissions",
            Self::ProjectPermission => "project_permission",
            Self::WorkbookPermission => "workbook_permission",
            Self::DatasourcePermission => "datasource_permission",
            Self::ViewPermission => "view_permission",
            Self::VirtualConnectionPermission => "virtual_connection_permission",
            Self::ProjectDefaultPermission => "project_default_permission",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::User => "Site user",
            Self::Group => "Local or directory-backed group",
            Self::GroupUser => "Membership of a user in a group (groupID:userID)",
            Self::Project => "Project",
            Self::Site => "Site (server-level)",
            Self::Workbook => "Published workbook",
            Self::ProjectPermissions => "Full permission set of a project",
            Self::DefaultPermissions => "Default permission set of a project for one content type",
            Self::ProjectPermission => "One grant on a project",
            Self::WorkbookPermission => "One grant on a workbook",
            Self::DatasourcePermission => "One grant on a datasource",
            Self::ViewPermission => "One grant on a view",
            Self::VirtualConnectionPermission => "One grant on a virtual connection",
            Self::ProjectDefaultPermission => "One default grant of a project",
        }
    }

    /// Run one lifecycle call. `Ok(None)` means the object is gone (read) or
    /// was deleted.
    pub fn apply(self, client: &Client, operation: Operation) -> Result<Option<Value>> {
        match self {
            Self::User => apply::<UserResource>(client, operation),
            Self::Group => apply::<GroupResource>(client, operation),
            Self::GroupUser => apply::<GroupUserResource>(client, operation),
            Self::Project => apply::<ProjectResource>(client, operation),
            Self::Site => apply::<SiteResource>(client, operation),
            Self::Workbook => apply::<WorkbookResource>(client, operation),
            Self::ProjectPermissions => apply::<ProjectPermissions>(client, operation),
            Self::DefaultPermissions => apply::<DefaultPermissions>(client, operation),
            Self::ProjectPermission => apply::<ContentGrant<ProjectGrant>>(client, operation),
            Self::WorkbookPermission => apply::<ContentGrant<WorkbookGrant>>(client, operation),
            Self::DatasourcePermission => apply::<ContentGrant<DatasourceGrant>>(client, operation),
            Self::ViewPermission => apply::<ContentGrant<ViewGrant>>(client, operation),
            Self::VirtualConnectionPermission => {
                apply::<ContentGrant<VirtualConnectionGrant>>(client, operation)
            }
            Self::ProjectDefaultPermission => apply::<DefaultGrant>(client, operation),
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value).with_context(|| format!("Invalid {what}"))
}

fn encode<T: Serialize>(model: &T) -> Result<Value> {
    serde_json::to_value(model).context("Failed to serialize resource state")
}

/// Drive one lifecycle call through a typed adapter
pub fn apply<R: Resource>(client: &Client, operation: Operation) -> Result<Option<Value>> {
    match operation {
        Operation::Create { plan } => {
            let plan: R::Model = decode(plan, "plan")?;
            encode(&R::create(client, &plan)?).map(Some)
        }
        Operation::Read { state } => {
            let state: R::Model = decode(state, "state")?;
            R::read(client, &state)?.as_ref().map(encode).transpose()
        }
        Operation::Update { state, plan } => {
            let state: R::Model = decode(state, "state")?;
            let plan: R::Model = decode(plan, "plan")?;
            encode(&R::update(client, &state, &plan)?).map(Some)
        }
        Operation::Delete { state } => {
            let state: R::Model = decode(state, "state")?;
            R::delete(client, &state)?;
            Ok(None)
        }
        Operation::Import { id } => {
            let skeleton = R::import(&id)?;
            let state = R::read(client, &skeleton)?
                .with_context(|| format!("Cannot import '{id}': object not found"))?;
            encode(&state).map(Some)
        }
    }
}

/// Map a not-found lookup to `None`
pub(crate) fn absent_if_not_found<T>(result: tableau::Result<T>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => {
            log::info!("{what} no longer exists, removing from state");
            Ok(None)
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {what}")),
    }
}

/// Treat empty strings as unset
pub(crate) fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|v| !v.is_empty()).map(str::to_string)
}

/// Turn an empty string into `None`
pub(crate) fn optional(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

#[cfg(test)]
pub(crate) mod testing {
    use tableau::{Client, MockTransport};

    /// Client over a fresh scripted transport, plus a handle to script it
    pub fn mock_client() -> (Client, MockTransport) {
        let mock = MockTransport::new();
        (Client::with_transport(mock.clone()), mock)
    }
}
