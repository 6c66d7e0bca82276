//! Read-only lookups
//!
//! Each [`DataKind`] takes a few `key=value` arguments and returns a JSON
//! document with snake_case keys. Nothing is written to state.

use crate::resource::{GranteeModel, GroupModel, ProjectModel, SiteModel, UserModel};
use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;
use tableau::{Client, Datasource, DefaultTarget, PermissionSetId, Workbook};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum DataKind {
    User,
    Users,
    Group,
    Groups,
    Project,
    Projects,
    Site,
    Sites,
    Datasource,
    Datasources,
    Workbooks,
    WorkbookConnections,
    WorkbookRevisions,
    VirtualConnection,
    VirtualConnections,
    VirtualConnectionConnections,
    VirtualConnectionRevisions,
    VirtualConnectionRevision,
    ProjectPermissions,
    DefaultPermissions,
}

impl DataKind {
    /// Accepted argument keys; the first `required` of them are mandatory
    fn arguments(&self) -> (&'static [&'static str], usize) {
        match self {
            Self::User | Self::Group | Self::Project | Self::Site | Self::VirtualConnection => (&["id"], 1),
            Self::Datasource => (&["id", "name"], 0),
            Self::WorkbookConnections | Self::WorkbookRevisions => (&["workbook_id"], 1),
            Self::VirtualConnectionConnections | Self::VirtualConnectionRevisions => (&["id"], 1),
            Self::VirtualConnectionRevision => (&["id", "revision"], 2),
            Self::ProjectPermissions => (&["id"], 1),
            Self::DefaultPermissions => (&["project_id", "target_type"], 2),
            Self::Users
            | Self::Groups
            | Self::Projects
            | Self::Sites
            | Self::Datasources
            | Self::Workbooks
            | Self::VirtualConnections => (&[], 0),
        }
    }

    pub fn usage(&self) -> String {
        let (keys, required) = self.arguments();
        keys.iter()
            .enumerate()
            .map(|(i, key)| {
                if i < required {
                    format!("{key}=...")
                } else {
                    format!("[{key}=...]")
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

// ============================================================================
// Arguments
// ============================================================================

/// Validated lookup arguments
#[derive(Debug, Default)]
pub struct LookupArgs(BTreeMap<String, String>);

impl LookupArgs {
    pub fn parse(kind: DataKind, pairs: Vec<(String, String)>) -> Result<Self> {
        let (keys, required) = kind.arguments();
        let mut args = BTreeMap::new();
        for (key, value) in pairs {
            if !keys.contains(&key.as_str()) {
                let accepted = if keys.is_empty() { "none".to_string() } else { keys.join(", ") };
                bail!("Unknown argument '{key}' for {kind:?}; accepted: {accepted}");
            }
            args.insert(key, value);
        }
        for key in &keys[..required] {
            if args.get(*key).is_none_or(String::is_empty) {
                bail!("Missing required argument '{key}'");
            }
        }
        Ok(Self(args))
    }

    fn get(&self, key: &str) -> &str {
        self.0.get(key).map_or("", String::as_str)
    }
}

// ============================================================================
// Output shapes
// ============================================================================

#[derive(Debug, Serialize)]
struct WorkbookView {
    id: String,
    name: String,
    description: String,
    encrypt_extracts: String,
    show_tabs: String,
    size: String,
    default_view_id: String,
    location_id: String,
    owner_id: String,
    project_id: String,
    content_url: String,
    web_page_url: String,
    created_at: String,
    updated_at: String,
}

impl From<Workbook> for WorkbookView {
    fn from(w: Workbook) -> Self {
        Self {
            id: w.id,
            name: w.name,
            description: w.description.unwrap_or_default(),
            encrypt_extracts: w.encrypt_extracts.unwrap_or_default(),
            show_tabs: w.show_tabs.unwrap_or_default(),
            size: w.size.unwrap_or_default(),
            default_view_id: w.default_view_id.unwrap_or_default(),
            location_id: w.location.map(|l| l.id).unwrap_or_default(),
            owner_id: w.owner.map(|o| o.id).unwrap_or_default(),
            project_id: w.project.map(|p| p.id).unwrap_or_default(),
            content_url: w.content_url.unwrap_or_default(),
            web_page_url: w.webpage_url.unwrap_or_default(),
            created_at: w.created_at.unwrap_or_default(),
            updated_at: w.updated_at.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DatasourceView {
    id: String,
    name: String,
    description: String,
    certification_note: String,
    #[serde(rename = "type")]
    kind: String,
    content_url: String,
    encrypt_extracts: String,
    has_extracts: bool,
    is_certified: bool,
    use_remote_query_agent: bool,
    web_page_url: String,
    owner_id: String,
    project_id: String,
    tags: Vec<String>,
}

impl From<Datasource> for DatasourceView {
    fn from(d: Datasource) -> Self {
        Self {
            tags: d.tags.as_ref().map(tableau::Tags::labels).unwrap_or_default(),
            id: d.id,
            name: d.name,
            description: d.description.unwrap_or_default(),
            certification_note: d.certification_note.unwrap_or_default(),
            kind: d.kind.unwrap_or_default(),
            content_url: d.content_url.unwrap_or_default(),
            encrypt_extracts: d.encrypt_extracts.unwrap_or_default(),
            has_extracts: d.has_extracts.unwrap_or_default(),
            is_certified: d.is_certified.unwrap_or_default(),
            use_remote_query_agent: d.use_remote_query_agent.unwrap_or_default(),
            web_page_url: d.webpage_url.unwrap_or_default(),
            owner_id: d.owner.map(|o| o.id).unwrap_or_default(),
            project_id: d.project.map(|p| p.id).unwrap_or_default(),
        }
    }
}

fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Rewrite every object key from camelCase to snake_case
fn snake_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (camel_to_snake(&k), snake_keys(v)))
                .collect::<Map<_, _>>(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(snake_keys).collect()),
        other => other,
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).context("Failed to serialize lookup result")
}

fn listing<T: Serialize>(key: &str, items: &[T]) -> Result<Value> {
    Ok(json!({ key: to_json(&items)? }))
}

fn permission_set(id: &PermissionSetId, client: &Client) -> Result<Value> {
    let grants = client
        .get_permissions(&id.target)
        .with_context(|| format!("Failed to read permissions for {}", id.target))?;
    let grantees: Vec<GranteeModel> = grants.into_iter().map(GranteeModel::from_grant).collect();
    Ok(json!({
        "id": id.to_string(),
        "project_id": id.target.object_id(),
        "grantee_capabilities": to_json(&grantees)?,
    }))
}

// ============================================================================
// Lookup
// ============================================================================

/// Run one lookup
pub fn lookup(kind: DataKind, client: &Client, args: &LookupArgs) -> Result<Value> {
    log::debug!("Looking up {kind:?} with {:?}", args.0);
    match kind {
        DataKind::User => to_json(&UserModel::from_user(client.get_user(args.get("id"))?)),
        DataKind::Users => {
            let users: Vec<UserModel> = client.list_users()?.into_iter().map(UserModel::from_user).collect();
            listing("users", &users)
        }
        DataKind::Group => to_json(&GroupModel::from_group(client.get_group(args.get("id"))?)),
        DataKind::Groups => {
            let groups: Vec<GroupModel> = client.list_groups()?.into_iter().map(GroupModel::from_group).collect();
            listing("groups", &groups)
        }
        DataKind::Project => to_json(&ProjectModel::from_project(client.get_project(args.get("id"))?)),
        DataKind::Projects => {
            let projects: Vec<ProjectModel> =
                client.list_projects()?.into_iter().map(ProjectModel::from_project).collect();
            listing("projects", &projects)
        }
        DataKind::Site => to_json(&SiteModel::from(client.get_site(args.get("id"))?)),
        DataKind::Sites => {
            let sites: Vec<SiteModel> = client.list_sites()?.into_iter().map(SiteModel::from).collect();
            listing("sites", &sites)
        }
        DataKind::Datasource => {
            let (id, name) = (args.get("id"), args.get("name"));
            if id.is_empty() && name.is_empty() {
                bail!("datasource lookup needs id=... or name=...");
            }
            to_json(&DatasourceView::from(client.get_datasource(id, name)?))
        }
        DataKind::Datasources => {
            let datasources: Vec<DatasourceView> =
                client.list_datasources()?.into_iter().map(DatasourceView::from).collect();
            listing("datasources", &datasources)
        }
        DataKind::Workbooks => {
            let workbooks: Vec<WorkbookView> = client.list_workbooks()?.into_iter().map(WorkbookView::from).collect();
            listing("workbooks", &workbooks)
        }
        DataKind::WorkbookConnections => {
            let connections = client.list_workbook_connections(args.get("workbook_id"))?;
            Ok(snake_keys(listing("connections", &connections)?))
        }
        DataKind::WorkbookRevisions => {
            let revisions = client.list_workbook_revisions(args.get("workbook_id"))?;
            Ok(snake_keys(listing("revisions", &revisions)?))
        }
        DataKind::VirtualConnection => Ok(snake_keys(to_json(&client.get_virtual_connection(args.get("id"))?)?)),
        DataKind::VirtualConnections => {
            let connections = client.list_virtual_connections()?;
            Ok(snake_keys(listing("virtual_connections", &connections)?))
        }
        DataKind::VirtualConnectionConnections => {
            let connections = client.list_virtual_connection_connections(args.get("id"))?;
            Ok(snake_keys(listing("connections", &connections)?))
        }
        DataKind::VirtualConnectionRevisions => {
            let revisions = client.list_virtual_connection_revisions(args.get("id"))?;
            Ok(snake_keys(listing("revisions", &revisions)?))
        }
        DataKind::VirtualConnectionRevision => {
            let number: u32 = args
                .get("revision")
                .parse()
                .with_context(|| format!("revision must be a number, got '{}'", args.get("revision")))?;
            let revision = client.get_virtual_connection_revision(args.get("id"), number)?;
            Ok(snake_keys(to_json(&revision)?))
        }
        DataKind::ProjectPermissions => {
            let id = args.get("id");
            let set_id = if id.contains('/') {
                id.parse()?
            } else {
                PermissionSetId::project(id)
            };
            permission_set(&set_id, client)
        }
        DataKind::DefaultPermissions => {
            let target: DefaultTarget = args.get("target_type").parse()?;
            let set_id = PermissionSetId::project_default(args.get("project_id"), target);
            let mut value = permission_set(&set_id, client)?;
            value["target_type"] = json!(target.as_str());
            Ok(value)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::mock_client;
    use tableau::Method;

    fn args(kind: DataKind, pairs: &[(&str, &str)]) -> LookupArgs {
        LookupArgs::parse(
            kind,
            pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect(),
        )
        .unwrap()
    }

    fn page(plural: &str, singular: &str, items: Value) -> Value {
        let total = items.as_array().map_or(0, Vec::len).to_string();
        json!({
            "pagination": {"pageNumber": "1", "pageSize": "100", "totalAvailable": total},
            plural: {singular: items}
        })
    }

    #[test]
    fn test_args_validation() {
        let missing = LookupArgs::parse(DataKind::User, Vec::new()).unwrap_err();
        assert!(missing.to_string().contains("Missing required argument 'id'"));

        let unknown = LookupArgs::parse(DataKind::Users, vec![("id".into(), "x".into())]).unwrap_err();
        assert!(unknown.to_string().contains("Unknown argument 'id'"));

        assert!(LookupArgs::parse(DataKind::Datasource, vec![("name".into(), "orders".into())]).is_ok());
        assert_eq!(DataKind::VirtualConnectionRevision.usage(), "id=... revision=...");
        assert_eq!(DataKind::Datasource.usage(), "[id=...] [name=...]");
    }

    #[test]
    fn test_camel_to_snake() {
        assert_eq!(camel_to_snake("webpageUrl"), "webpage_url");
        assert_eq!(camel_to_snake("connectionId"), "connection_id");
        assert_eq!(camel_to_snake("query_tagging_enabled"), "query_tagging_enabled");
    }

    #[test]
    fn test_users_listing() {
        let (client, mock) = mock_client();
        mock.respond_json(
            Method::Get,
            "/users",
            200,
            &page("users", "user", json!([{"id": "U1", "name": "ann", "siteRole": "Viewer"}])),
        );
        let value = lookup(DataKind::Users, &client, &LookupArgs::default()).unwrap();
        assert_eq!(value["users"][0]["site_role"], "Viewer");
    }

    #[test]
    fn test_datasource_by_name() {
        let (client, mock) = mock_client();
        mock.respond_json(
            Method::Get,
            "/datasources",
            200,
            &page(
                "datasources",
                "datasource",
                json!([
                    {"id": "D1", "name": "orders", "type": "postgres", "isCertified": "true", "project": {"id": "P1"},
                     "tags": {"tag": [{"label": "gold"}]}}
                ]),
            ),
        );
        let value = lookup(DataKind::Datasource, &client, &args(DataKind::Datasource, &[("name", "orders")])).unwrap();
        assert_eq!(value["id"], "D1");
        assert_eq!(value["type"], "postgres");
        assert_eq!(value["is_certified"], true);
        assert_eq!(value["project_id"], "P1");
        assert_eq!(value["tags"], json!(["gold"]));
    }

    #[test]
    fn test_workbooks_expose_read_only_fields() {
        let (client, mock) = mock_client();
        mock.respond_json(
            Method::Get,
            "/workbooks",
            200,
            &page(
                "workbooks",
                "workbook",
                json!([{"id": "W1", "name": "Sales", "size": "3", "defaultViewId": "V1", "owner": {"id": "U1"}}]),
            ),
        );
        let value = lookup(DataKind::Workbooks, &client, &LookupArgs::default()).unwrap();
        let workbook = &value["workbooks"][0];
        assert_eq!(workbook["size"], "3");
        assert_eq!(workbook["default_view_id"], "V1");
        assert_eq!(workbook["owner_id"], "U1");
    }

    #[test]
    fn test_default_permissions() {
        let (client, mock) = mock_client();
        mock.respond_json(
            Method::Get,
            "/projects/P1/default-permissions/workbooks",
            200,
            &json!({"permissions": {"granteeCapabilities": [
                {"group": {"id": "G1"}, "capabilities": {"capability": [{"name": "Read", "mode": "Allow"}]}}
            ]}}),
        );
        let value = lookup(
            DataKind::DefaultPermissions,
            &client,
            &args(DataKind::DefaultPermissions, &[("project_id", "P1"), ("target_type", "workbooks")]),
        )
        .unwrap();
        assert_eq!(value["id"], "projects/P1/default-permissions/workbooks");
        assert_eq!(value["target_type"], "workbooks");
        assert_eq!(value["grantee_capabilities"][0]["group_id"], "G1");
    }

    #[test]
    fn test_revision_number_must_parse() {
        let (client, _) = mock_client();
        let err = lookup(
            DataKind::VirtualConnectionRevision,
            &client,
            &args(DataKind::VirtualConnectionRevision, &[("id", "V1"), ("revision", "latest")]),
        )
        .unwrap_err();
        assert!(err.to_string().contains("revision must be a number"));
    }
}
