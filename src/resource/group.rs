//! Groups, local or synced from Active Directory

use super::{Resource, absent_if_not_found, non_empty};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tableau::{Client, Group, GroupImport};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupModel {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_site_role: Option<String>,
    /// Directory domain; set for AD-backed groups only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import_site_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_license_mode: Option<String>,
}

impl GroupModel {
    fn to_group(&self) -> Group {
        let import = GroupImport {
            domain_name: non_empty(&self.domain_name),
            site_role: non_empty(&self.import_site_role),
            grant_license_mode: non_empty(&self.grant_license_mode),
        };
        let has_import = import != GroupImport::default();
        Group {
            id: String::new(),
            name: self.name.clone(),
            minimum_site_role: non_empty(&self.minimum_site_role),
            import: has_import.then_some(import),
        }
    }

    pub(crate) fn from_group(group: Group) -> Self {
        let import = group.import.unwrap_or_default();
        Self {
            id: group.id,
            name: group.name,
            minimum_site_role: group.minimum_site_role,
            domain_name: import.domain_name,
            import_site_role: import.site_role,
            grant_license_mode: import.grant_license_mode,
        }
    }
}

pub struct GroupResource;

impl Resource for GroupResource {
    type Model = GroupModel;

    fn create(client: &Client, plan: &GroupModel) -> Result<GroupModel> {
        let created = client
            .create_group(&plan.to_group())
            .with_context(|| format!("Could not create group '{}'", plan.name))?;
        log::info!("Created group {} ({})", plan.name, created.id);
        Ok(GroupModel {
            id: created.id,
            ..plan.clone()
        })
    }

    fn read(client: &Client, state: &GroupModel) -> Result<Option<GroupModel>> {
        let group = absent_if_not_found(client.get_group(&state.id), &format!("group {}", state.id))?;
        Ok(group.map(GroupModel::from_group))
    }

    fn update(client: &Client, state: &GroupModel, plan: &GroupModel) -> Result<GroupModel> {
        client
            .update_group(&state.id, &plan.to_group())
            .with_context(|| format!("Could not update group {}", state.id))?;
        Self::read(client, state)?
            .with_context(|| format!("Group {} disappeared after update", state.id))
    }

    fn delete(client: &Client, state: &GroupModel) -> Result<()> {
        client
            .delete_group(&state.id)
            .with_context(|| format!("Could not delete group {}", state.id))?;
        log::info!("Deleted group {}", state.id);
        Ok(())
    }

    fn import(id: &str) -> Result<GroupModel> {
        Ok(GroupModel {
            id: id.to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::testing::mock_client;
    use serde_json::json;
    use tableau::Method;

    fn listing(groups: serde_json::Value) -> serde_json::Value {
        json!({
            "pagination": {"pageNumber": "1", "pageSize": "100", "totalAvailable": "1"},
            "groups": {"group": groups}
        })
    }

    /// Create, read, change the site role, delete, then read the void
    #[test]
    fn test_group_lifecycle() {
        let (client, mock) = mock_client();
        mock.respond_json(
            Method::Post,
            "/groups",
            201,
            &json!({"group": {"id": "G1", "name": "Analysts", "minimumSiteRole": "Viewer"}}),
        )
        .respond_json(
            Method::Put,
            "/groups/G1",
            200,
            &json!({"group": {"name": "Analysts", "minimumSiteRole": "Explorer"}}),
        )
        .respond(Method::Delete, "/groups/G1", 204, "");
        mock.respond_json(
            Method::Get,
            "/groups",
            200,
            &listing(json!([{"id": "G1", "name": "Analysts", "minimumSiteRole": "Viewer"}])),
        )
        .respond_json(
            Method::Get,
            "/groups",
            200,
            &listing(json!([{"id": "G1", "name": "Analysts", "minimumSiteRole": "Explorer"}])),
        )
        .respond_json(Method::Get, "/groups", 200, &listing(json!([])));

        let plan = GroupModel {
            name: "Analysts".into(),
            minimum_site_role: Some("Viewer".into()),
            ..Default::default()
        };
        let state = GroupResource::create(&client, &plan).unwrap();
        assert_eq!(state.id, "G1");

        let read = GroupResource::read(&client, &state).unwrap().unwrap();
        assert_eq!(read, state);
        assert_eq!(read.minimum_site_role.as_deref(), Some("Viewer"));

        let promoted = GroupModel {
            minimum_site_role: Some("Explorer".into()),
            ..state.clone()
        };
        let updated = GroupResource::update(&client, &state, &promoted).unwrap();
        assert_eq!(updated.minimum_site_role.as_deref(), Some("Explorer"));

        let body: serde_json::Value = serde_json::from_str(&mock.requests()[2].body_text()).unwrap();
        assert_eq!(body["group"]["minimumSiteRole"], "Explorer");

        GroupResource::delete(&client, &updated).unwrap();
        assert_eq!(GroupResource::read(&client, &updated).unwrap(), None);
        let err = client.get_group("G1").unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(
            mock.calls(),
            vec![
                "POST /groups",
                "GET /groups",
                "PUT /groups/G1",
                "GET /groups",
                "DELETE /groups/G1",
                "GET /groups",
                "GET /groups",
            ]
        );
    }

    #[test]
    fn test_import_settings_sent_only_when_set() {
        let local = GroupModel {
            name: "Local".into(),
            ..Default::default()
        };
        assert!(local.to_group().import.is_none());

        let synced = GroupModel {
            name: "Sales".into(),
            domain_name: Some("corp.example.com".into()),
            import_site_role: Some("Explorer".into()),
            grant_license_mode: Some("onLogin".into()),
            ..Default::default()
        };
        let body = serde_json::to_value(synced.to_group()).unwrap();
        assert_eq!(
            body["import"],
            json!({"domainName": "corp.example.com", "siteRole": "Explorer", "grantLicenseMode": "onLogin"})
        );
    }

    #[test]
    fn test_read_missing_group_is_removed() {
        let (client, mock) = mock_client();
        mock.respond_json(Method::Get, "/groups", 200, &listing(json!([{"id": "G2", "name": "Other"}])));
        let state = GroupModel {
            id: "G1".into(),
            name: "Analysts".into(),
            ..Default::default()
        };
        assert!(GroupResource::read(&client, &state).unwrap().is_none());
    }
}
