//! Permission sets and the [`PermissionStore`] that drives reconciliation.
//!
//! Every permission-bearing object exposes the same three calls under its own
//! base path:
//!
//! | Call | Request |
//! |------|---------|
//! | read | `GET {base}` |
//! | bulk write | `PUT {base}` with `{"permissions": {"granteeCapabilities": [...]}}` |
//! | revoke | `DELETE {base}/{users\|groups}/{id}/{capability}/{mode}` |
//!
//! A bulk write adds or overwrites; it never removes grants it does not name.

use crate::client::{Client, wrap_entity};
use crate::error::{Error, Result};
use crate::transport::Request;
use grants::{Capability, CapabilityMode, Grantee, GranteeCapability, PermissionStore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Capabilities of a project's own permission set.
pub const PROJECT_CAPABILITIES: &[&str] = &["ProjectLeader", "Read", "Write"];

pub const WORKBOOK_CAPABILITIES: &[&str] = &[
    "AddComment",
    "ChangeHierarchy",
    "ChangePermissions",
    "CreateRefreshMetrics",
    "Delete",
    "ExportData",
    "ExportImage",
    "ExportXml",
    "Filter",
    "Read",
    "RunExplainData",
    "ShareView",
    "ViewComments",
    "ViewUnderlyingData",
    "WebAuthoring",
    "Write",
];

pub const VIEW_CAPABILITIES: &[&str] = &[
    "AddComment",
    "ChangePermissions",
    "Delete",
    "ExportData",
    "ExportImage",
    "ExportXml",
    "Filter",
    "Read",
    "ShareView",
    "ViewComments",
    "ViewUnderlyingData",
    "WebAuthoring",
    "Write",
];

pub const DATASOURCE_CAPABILITIES: &[&str] =
    &["ChangePermissions", "Connect", "Delete", "ExportXml", "Read", "Write", "SaveAs"];

pub const VIRTUAL_CONNECTION_CAPABILITIES: &[&str] =
    &["Read", "Connect", "Overwrite", "ChangeHierarchy", "Delete", "ChangePermissions"];

/// Capabilities a project can set by default for its content, across all
/// content types.
pub const DEFAULT_CAPABILITIES: &[&str] = &[
    "AddComment",
    "ChangeHierarchy",
    "ChangePermissions",
    "Connect",
    "CreateRefreshMetrics",
    "Delete",
    "Execute",
    "ExportData",
    "ExportImage",
    "ExportXml",
    "Filter",
    "PulseMetricDefine",
    "Read",
    "RunExplainData",
    "SaveAs",
    "ShareView",
    "ViewComments",
    "ViewUnderlyingData",
    "VizqlDataApiAccess",
    "WebAuthoring",
    "WebAuthoringForFlows",
    "Write",
];

// ============================================================================
// Targets
// ============================================================================

/// Content types a project can hold default permissions for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefaultTarget {
    Databases,
    Dataroles,
    Datasources,
    Flows,
    Lenses,
    Metrics,
    Tables,
    VirtualConnections,
    Workbooks,
}

impl DefaultTarget {
    pub const ALL: [DefaultTarget; 9] = [
        Self::Databases,
        Self::Dataroles,
        Self::Datasources,
        Self::Flows,
        Self::Lenses,
        Self::Metrics,
        Self::Tables,
        Self::VirtualConnections,
        Self::Workbooks,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Databases => "databases",
            Self::Dataroles => "dataroles",
            Self::Datasources => "datasources",
            Self::Flows => "flows",
            Self::Lenses => "lenses",
            Self::Metrics => "metrics",
            Self::Tables => "tables",
            Self::VirtualConnections => "virtualconnections",
            Self::Workbooks => "workbooks",
        }
    }
}

impl FromStr for DefaultTarget {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or_else(|| {
            let names: Vec<_> = Self::ALL.iter().map(DefaultTarget::as_str).collect();
            Error::Validation(format!(
                "invalid default permission target '{s}', expected one of: {}",
                names.join(", ")
            ))
        })
    }
}

impl fmt::Display for DefaultTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An object whose permissions can be read and written.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PermissionTarget {
    Project(String),
    /// A project's default permissions for one content type.
    ProjectDefault {
        project_id: String,
        target: DefaultTarget,
    },
    Workbook(String),
    Datasource(String),
    View(String),
    VirtualConnection(String),
}

impl PermissionTarget {
    /// Build a content target from its ID segment (`projects`, `workbooks`, ...).
    pub fn from_segment(segment: &str, id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        Some(match segment {
            "projects" => Self::Project(id),
            "workbooks" => Self::Workbook(id),
            "datasources" => Self::Datasource(id),
            "views" => Self::View(id),
            "virtualConnections" => Self::VirtualConnection(id),
            _ => return None,
        })
    }

    /// Leading segment of single-grant resource IDs.
    pub fn id_segment(&self) -> &'static str {
        match self {
            Self::Project(_) | Self::ProjectDefault { .. } => "projects",
            Self::Workbook(_) => "workbooks",
            Self::Datasource(_) => "datasources",
            Self::View(_) => "views",
            Self::VirtualConnection(_) => "virtualConnections",
        }
    }

    /// ID of the object that owns the permissions.
    pub fn object_id(&self) -> &str {
        match self {
            Self::Project(id)
            | Self::Workbook(id)
            | Self::Datasource(id)
            | Self::View(id)
            | Self::VirtualConnection(id) => id,
            Self::ProjectDefault { project_id, .. } => project_id,
        }
    }

    /// Capability names a plan may grant on this target.
    pub fn capability_names(&self) -> &'static [&'static str] {
        match self {
            Self::Project(_) => PROJECT_CAPABILITIES,
            Self::ProjectDefault { .. } => DEFAULT_CAPABILITIES,
            Self::Workbook(_) => WORKBOOK_CAPABILITIES,
            Self::Datasource(_) => DATASOURCE_CAPABILITIES,
            Self::View(_) => VIEW_CAPABILITIES,
            Self::VirtualConnection(_) => VIRTUAL_CONNECTION_CAPABILITIES,
        }
    }

    /// Reject a planned capability this target does not support.
    ///
    /// Only planned input goes through here. Grants reported by the server
    /// are taken as they are.
    pub fn validate_capability(&self, capability: &Capability) -> Result<()> {
        let names = self.capability_names();
        if names.contains(&capability.name.as_str()) {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "unknown capability '{}' for {}, expected one of: {}",
                capability.name,
                self.kind_name(),
                names.join(", ")
            )))
        }
    }

    /// Validate every capability of a planned permission set.
    pub fn validate_grants(&self, grants: &[GranteeCapability]) -> Result<()> {
        grants
            .iter()
            .flat_map(|g| &g.capabilities)
            .try_for_each(|c| self.validate_capability(c))
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Project(_) => "project permissions",
            Self::ProjectDefault { .. } => "default permissions",
            Self::Workbook(_) => "workbook permissions",
            Self::Datasource(_) => "datasource permissions",
            Self::View(_) => "view permissions",
            Self::VirtualConnection(_) => "virtual connection permissions",
        }
    }

    /// Base path of the permission set, relative to the site.
    pub fn path(&self) -> String {
        match self {
            Self::Project(id) => format!("/projects/{id}/permissions"),
            Self::ProjectDefault { project_id, target } => {
                format!("/projects/{project_id}/default-permissions/{target}")
            }
            Self::Workbook(id) => format!("/workbooks/{id}/permissions"),
            Self::Datasource(id) => format!("/datasources/{id}/permissions"),
            Self::View(id) => format!("/views/{id}/permissions"),
            Self::VirtualConnection(id) => format!("/virtualconnections/{id}/permissions"),
        }
    }
}

impl fmt::Display for PermissionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project(id) => write!(f, "project {id}"),
            Self::ProjectDefault { project_id, target } => {
                write!(f, "default {target} permissions of project {project_id}")
            }
            Self::Workbook(id) => write!(f, "workbook {id}"),
            Self::Datasource(id) => write!(f, "datasource {id}"),
            Self::View(id) => write!(f, "view {id}"),
            Self::VirtualConnection(id) => write!(f, "virtual connection {id}"),
        }
    }
}

// ============================================================================
// Wire format
// ============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePermissions {
    #[serde(default)]
    grantee_capabilities: Vec<WireGranteeCapability>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireGranteeCapability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<IdOnly>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    group: Option<IdOnly>,
    #[serde(default)]
    capabilities: WireCapabilities,
}

#[derive(Debug, Serialize, Deserialize)]
struct IdOnly {
    id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct WireCapabilities {
    #[serde(default)]
    capability: Vec<WireCapability>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireCapability {
    name: String,
    mode: String,
}

fn to_wire(grants: &[GranteeCapability]) -> WirePermissions {
    let grantee_capabilities = grants
        .iter()
        .map(|g| WireGranteeCapability {
            user: g.grantee.user_id().map(|id| IdOnly { id: id.to_string() }),
            group: g.grantee.group_id().map(|id| IdOnly { id: id.to_string() }),
            capabilities: WireCapabilities {
                capability: g
                    .capabilities
                    .iter()
                    .map(|c| WireCapability {
                        name: c.name.clone(),
                        mode: c.mode.as_str().to_string(),
                    })
                    .collect(),
            },
        })
        .collect();
    WirePermissions {
        grantee_capabilities,
    }
}

fn from_wire(wire: WirePermissions) -> Result<Vec<GranteeCapability>> {
    wire.grantee_capabilities
        .into_iter()
        .map(|g| -> Result<GranteeCapability> {
            let grantee = Grantee::from_pair(
                g.user.as_ref().map(|u| u.id.as_str()),
                g.group.as_ref().map(|u| u.id.as_str()),
            )?;
            let capabilities = g
                .capabilities
                .capability
                .into_iter()
                .map(|c| -> Result<Capability> {
                    Ok(Capability::new(c.name, c.mode.parse::<CapabilityMode>()?))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(GranteeCapability::new(grantee, capabilities))
        })
        .collect()
}

// ============================================================================
// Client calls
// ============================================================================

impl Client {
    /// Read a permission set in server order.
    pub fn get_permissions(&self, target: &PermissionTarget) -> Result<Vec<GranteeCapability>> {
        let wire: WirePermissions = self.send_unwrap(&Request::get(target.path()), "permissions")?;
        from_wire(wire)
    }

    /// Add or overwrite grants in one call.
    pub fn put_permissions(&self, target: &PermissionTarget, grants: &[GranteeCapability]) -> Result<()> {
        let request = Request::put(target.path()).json(&wrap_entity("permissions", &to_wire(grants))?)?;
        self.send_empty(&request)
    }

    /// Remove one `(grantee, capability, mode)` grant.
    pub fn delete_permission(
        &self,
        target: &PermissionTarget,
        grantee: &Grantee,
        capability: &Capability,
    ) -> Result<()> {
        let path = format!(
            "{}/{}/{}/{}/{}",
            target.path(),
            grantee.entity_type(),
            grantee.id(),
            capability.name,
            capability.mode
        );
        self.send_empty(&Request::delete(path))
    }

    /// Whether the exact `(grantee, capability, mode)` grant is present.
    pub fn has_permission(
        &self,
        target: &PermissionTarget,
        grantee: &Grantee,
        capability: &Capability,
    ) -> Result<bool> {
        let grants = self.get_permissions(target)?;
        Ok(grants
            .iter()
            .filter(|g| &g.grantee == grantee)
            .flat_map(|g| &g.capabilities)
            .any(|c| c == capability))
    }
}

/// One target's permission set, as seen by the reconciliation engine.
pub struct PermissionsStore<'a> {
    client: &'a Client,
    target: PermissionTarget,
}

impl<'a> PermissionsStore<'a> {
    pub fn new(client: &'a Client, target: PermissionTarget) -> Self {
        Self { client, target }
    }

    pub fn target(&self) -> &PermissionTarget {
        &self.target
    }
}

impl PermissionStore for PermissionsStore<'_> {
    fn describe(&self) -> String {
        self.target.to_string()
    }

    fn fetch(&self) -> anyhow::Result<Vec<GranteeCapability>> {
        Ok(self.client.get_permissions(&self.target)?)
    }

    fn write(&self, grants: &[GranteeCapability]) -> anyhow::Result<()> {
        Ok(self.client.put_permissions(&self.target, grants)?)
    }

    fn revoke(&self, grantee: &Grantee, capability: &Capability) -> anyhow::Result<()> {
        Ok(self.client.delete_permission(&self.target, grantee, capability)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockTransport};
    use serde_json::json;

    fn project_permissions(grantees: serde_json::Value) -> serde_json::Value {
        json!({"permissions": {"project": {"id": "P1", "name": "Finance"}, "granteeCapabilities": grantees}})
    }

    #[test]
    fn test_target_paths() {
        assert_eq!(PermissionTarget::Project("P1".into()).path(), "/projects/P1/permissions");
        assert_eq!(
            PermissionTarget::ProjectDefault {
                project_id: "P1".into(),
                target: DefaultTarget::VirtualConnections
            }
            .path(),
            "/projects/P1/default-permissions/virtualconnections"
        );
        assert_eq!(
            PermissionTarget::VirtualConnection("V1".into()).path(),
            "/virtualconnections/V1/permissions"
        );
        assert_eq!(PermissionTarget::VirtualConnection("V1".into()).id_segment(), "virtualConnections");
        assert_eq!(PermissionTarget::View("X".into()).path(), "/views/X/permissions");
    }

    #[test]
    fn test_from_segment() {
        assert_eq!(
            PermissionTarget::from_segment("datasources", "D1"),
            Some(PermissionTarget::Datasource("D1".into()))
        );
        assert_eq!(PermissionTarget::from_segment("flows", "F1"), None);
    }

    #[test]
    fn test_default_target_parse() {
        for target in DefaultTarget::ALL {
            assert_eq!(target.as_str().parse::<DefaultTarget>().unwrap(), target);
        }
        let err = "cubes".parse::<DefaultTarget>().unwrap_err();
        assert!(err.to_string().contains("invalid default permission target 'cubes'"));
    }

    #[test]
    fn test_validate_capability_per_target() {
        let project = PermissionTarget::Project("P1".into());
        assert!(project.validate_capability(&Capability::allow("ProjectLeader")).is_ok());
        let err = project.validate_capability(&Capability::allow("Connect")).unwrap_err();
        assert!(err.to_string().starts_with("unknown capability 'Connect' for project permissions"));

        let vconn = PermissionTarget::VirtualConnection("V1".into());
        assert!(vconn.validate_capability(&Capability::deny("Overwrite")).is_ok());
        assert!(vconn.validate_capability(&Capability::allow("WebAuthoring")).is_err());

        let defaults = PermissionTarget::ProjectDefault {
            project_id: "P1".into(),
            target: DefaultTarget::Flows,
        };
        assert!(defaults.validate_capability(&Capability::allow("Execute")).is_ok());

        let grants = vec![GranteeCapability::new(
            Grantee::User("U1".into()),
            vec![Capability::allow("Read"), Capability::deny("Teleport")],
        )];
        assert!(PermissionTarget::Workbook("W1".into()).validate_grants(&grants).is_err());
    }

    #[test]
    fn test_get_permissions_preserves_order() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Get,
            "/projects/P1/permissions",
            200,
            &project_permissions(json!([
                {"group": {"id": "G1"}, "capabilities": {"capability": [{"name": "Write", "mode": "Deny"}, {"name": "Read", "mode": "Allow"}]}},
                {"user": {"id": "U1"}, "capabilities": {"capability": [{"name": "Read", "mode": "Allow"}]}}
            ])),
        );
        let client = Client::with_transport(mock);

        let grants = client.get_permissions(&PermissionTarget::Project("P1".into())).unwrap();

        assert_eq!(
            grants,
            vec![
                GranteeCapability::new(
                    Grantee::Group("G1".into()),
                    vec![Capability::deny("Write"), Capability::allow("Read")]
                ),
                GranteeCapability::new(Grantee::User("U1".into()), vec![Capability::allow("Read")]),
            ]
        );
    }

    #[test]
    fn test_get_permissions_empty_set() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Get, "/workbooks/W1/permissions", 200, &json!({"permissions": {"workbook": {"id": "W1"}}}));
        let client = Client::with_transport(mock);
        assert!(client.get_permissions(&PermissionTarget::Workbook("W1".into())).unwrap().is_empty());
    }

    #[test]
    fn test_get_permissions_rejects_bad_mode() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Get,
            "/projects/P1/permissions",
            200,
            &project_permissions(json!([{"user": {"id": "U1"}, "capabilities": {"capability": [{"name": "Read", "mode": "Maybe"}]}}])),
        );
        let client = Client::with_transport(mock);
        let err = client.get_permissions(&PermissionTarget::Project("P1".into())).unwrap_err();
        assert!(matches!(err, Error::Grant(_)));
    }

    #[test]
    fn test_put_permissions_body() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Put, "/projects/P1/default-permissions/workbooks", 200, &json!({"permissions": {}}));
        let client = Client::with_transport(mock.clone());
        let target = PermissionTarget::ProjectDefault {
            project_id: "P1".into(),
            target: DefaultTarget::Workbooks,
        };

        client
            .put_permissions(
                &target,
                &[GranteeCapability::new(
                    Grantee::Group("G1".into()),
                    vec![Capability::allow("Read"), Capability::deny("ExportData")],
                )],
            )
            .unwrap();

        let body: serde_json::Value = serde_json::from_str(&mock.requests()[0].body_text()).unwrap();
        assert_eq!(
            body,
            json!({"permissions": {"granteeCapabilities": [
                {"group": {"id": "G1"}, "capabilities": {"capability": [{"name": "Read", "mode": "Allow"}, {"name": "ExportData", "mode": "Deny"}]}}
            ]}})
        );
    }

    #[test]
    fn test_delete_permission_path() {
        let mock = MockTransport::new();
        mock.respond(Method::Delete, "/datasources/D1/permissions/users/U1/Connect/Deny", 204, "");
        let client = Client::with_transport(mock.clone());

        client
            .delete_permission(
                &PermissionTarget::Datasource("D1".into()),
                &Grantee::User("U1".into()),
                &Capability::deny("Connect"),
            )
            .unwrap();

        assert_eq!(mock.calls(), vec!["DELETE /datasources/D1/permissions/users/U1/Connect/Deny"]);
    }

    #[test]
    fn test_has_permission_matches_exact_triple() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Get,
            "/projects/P1/permissions",
            200,
            &project_permissions(json!([{"user": {"id": "U1"}, "capabilities": {"capability": [{"name": "Read", "mode": "Allow"}]}}])),
        );
        let client = Client::with_transport(mock);
        let target = PermissionTarget::Project("P1".into());
        let user = Grantee::User("U1".into());

        assert!(client.has_permission(&target, &user, &Capability::allow("Read")).unwrap());
        assert!(!client.has_permission(&target, &user, &Capability::deny("Read")).unwrap());
        assert!(!client.has_permission(&target, &Grantee::Group("U1".into()), &Capability::allow("Read")).unwrap());
    }

    #[test]
    fn test_store_drives_two_phase_update() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Put, "/projects/P1/permissions", 200, &json!({"permissions": {}}))
            .respond_json(
                Method::Get,
                "/projects/P1/permissions",
                200,
                &project_permissions(json!([
                    {"user": {"id": "U1"}, "capabilities": {"capability": [{"name": "Read", "mode": "Allow"}, {"name": "Write", "mode": "Allow"}]}}
                ])),
            )
            .respond(Method::Delete, "/projects/P1/permissions/users/U1/Write/Allow", 204, "");
        let client = Client::with_transport(mock.clone());
        let store = PermissionsStore::new(&client, PermissionTarget::Project("P1".into()));

        let planned = vec![GranteeCapability::new(Grantee::User("U1".into()), vec![Capability::allow("Read")])];
        let summary = grants::update_simple(&store, &planned).unwrap();

        assert_eq!(summary.written, 1);
        assert_eq!(summary.revoked, 1);
        assert_eq!(
            mock.calls(),
            vec![
                "PUT /projects/P1/permissions",
                "GET /projects/P1/permissions",
                "DELETE /projects/P1/permissions/users/U1/Write/Allow",
            ]
        );
    }
}
