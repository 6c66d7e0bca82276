//! Groups and group membership.

use crate::client::{Client, wrap_entity};
use crate::error::{Error, Result};
use crate::pagination::Collection;
use crate::transport::Request;
use crate::users::{USERS, User};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub(crate) const GROUPS: Collection = Collection {
    plural: "groups",
    singular: "group",
    entity: "group",
};

/// A local or directory-backed group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_site_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<GroupImport>,
}

/// Directory import settings for groups synced from Active Directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupImport {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grant_license_mode: Option<String>,
}

/// Identifier of a membership, `groupID:userID`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupUserId {
    pub group_id: String,
    pub user_id: String,
}

impl GroupUserId {
    pub fn new(group_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            user_id: user_id.into(),
        }
    }
}

impl fmt::Display for GroupUserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group_id, self.user_id)
    }
}

impl FromStr for GroupUserId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group, user] if !group.is_empty() && !user.is_empty() => Ok(Self::new(*group, *user)),
            _ => Err(Error::invalid_id(s, "expected groupID:userID")),
        }
    }
}

impl Client {
    /// Look a group up by ID, scanning every page of `/groups`.
    pub fn get_group(&self, id: &str) -> Result<Group> {
        self.find_across_pages(&Request::get("/groups"), &GROUPS, id, |g: &Group| g.id == id)
    }

    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.collect_pages(&Request::get("/groups"), &GROUPS)
    }

    pub fn create_group(&self, group: &Group) -> Result<Group> {
        let request = Request::post("/groups").json(&wrap_entity("group", group)?)?;
        self.send_unwrap(&request, "group")
    }

    pub fn update_group(&self, id: &str, group: &Group) -> Result<Group> {
        let body = Group {
            id: String::new(),
            ..group.clone()
        };
        let request = Request::put(format!("/groups/{id}")).json(&wrap_entity("group", &body)?)?;
        let mut updated: Group = self.send_unwrap(&request, "group")?;
        if updated.id.is_empty() {
            updated.id = id.to_string();
        }
        Ok(updated)
    }

    pub fn delete_group(&self, id: &str) -> Result<()> {
        self.send_empty(&Request::delete(format!("/groups/{id}")))
    }

    /// All members of a group.
    pub fn list_group_users(&self, group_id: &str) -> Result<Vec<User>> {
        self.collect_pages(&Request::get(format!("/groups/{group_id}/users")), &USERS)
    }

    /// Find one member by scanning the group's user listing.
    pub fn get_group_user(&self, id: &GroupUserId) -> Result<User> {
        let request = Request::get(format!("/groups/{}/users", id.group_id));
        self.find_across_pages(&request, &USERS, &id.user_id, |u: &User| u.id == id.user_id)
            .map_err(|e| match e {
                Error::NotFound { .. } => Error::NotFound {
                    entity: "user".into(),
                    id: format!("{} in group ID {}", id.user_id, id.group_id),
                },
                other => other,
            })
    }

    pub fn add_user_to_group(&self, id: &GroupUserId) -> Result<User> {
        let body = serde_json::json!({"user": {"id": id.user_id}});
        let request = Request::post(format!("/groups/{}/users", id.group_id)).json(&body)?;
        self.send_unwrap(&request, "user")
    }

    pub fn remove_user_from_group(&self, id: &GroupUserId) -> Result<()> {
        self.send_empty(&Request::delete(format!(
            "/groups/{}/users/{}",
            id.group_id, id.user_id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockTransport};
    use proptest::prelude::*;
    use serde_json::json;

    fn listing(groups: serde_json::Value, page: u32, total: u32) -> serde_json::Value {
        json!({
            "pagination": {"pageNumber": page.to_string(), "pageSize": "1", "totalAvailable": total.to_string()},
            "groups": {"group": groups}
        })
    }

    #[test]
    fn test_group_crud_scenario() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Post,
            "/groups",
            201,
            &json!({"group": {"id": "G1", "name": "Engineering", "minimumSiteRole": "Viewer"}}),
        )
        .respond_json(
            Method::Get,
            "/groups",
            200,
            &listing(json!([{"id": "G0", "name": "All Users"}]), 1, 2),
        )
        .respond_json(
            Method::Get,
            "/groups?pageNumber=2",
            200,
            &listing(json!([{"id": "G1", "name": "Engineering", "minimumSiteRole": "Viewer"}]), 2, 2),
        )
        .respond_json(
            Method::Get,
            "/groups?pageNumber=2",
            200,
            &listing(json!([{"id": "G1", "name": "Engineering", "minimumSiteRole": "Explorer"}]), 2, 2),
        )
        .respond_json(Method::Get, "/groups?pageNumber=2", 200, &listing(json!([]), 2, 2))
        .respond_json(
            Method::Put,
            "/groups/G1",
            200,
            &json!({"group": {"id": "G1", "name": "Engineering", "minimumSiteRole": "Explorer"}}),
        )
        .respond(Method::Delete, "/groups/G1", 204, "");
        let client = Client::with_transport(mock.clone());

        let created = client
            .create_group(&Group {
                name: "Engineering".into(),
                minimum_site_role: Some("Viewer".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(created.id, "G1");

        let read = client.get_group("G1").unwrap();
        assert_eq!(read.minimum_site_role.as_deref(), Some("Viewer"));

        let updated = client
            .update_group(
                "G1",
                &Group {
                    minimum_site_role: Some("Explorer".into()),
                    ..read
                },
            )
            .unwrap();
        assert_eq!(updated.minimum_site_role.as_deref(), Some("Explorer"));
        let reread = client.get_group("G1").unwrap();
        assert_eq!(reread.minimum_site_role.as_deref(), Some("Explorer"));

        client.delete_group("G1").unwrap();
        let err = client.get_group("G1").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Did not find group ID G1");

        let requests = mock.requests();
        assert_eq!(
            mock.calls(),
            vec![
                "POST /groups",
                "GET /groups",
                "GET /groups?pageNumber=2",
                "PUT /groups/G1",
                "GET /groups",
                "GET /groups?pageNumber=2",
                "DELETE /groups/G1",
                "GET /groups",
                "GET /groups?pageNumber=2",
            ]
        );
        let create_body: serde_json::Value = serde_json::from_str(&requests[0].body_text()).unwrap();
        assert_eq!(
            create_body,
            json!({"group": {"name": "Engineering", "minimumSiteRole": "Viewer"}})
        );
        let update_body: serde_json::Value = serde_json::from_str(&requests[3].body_text()).unwrap();
        assert!(update_body["group"].get("id").is_none());
    }

    #[test]
    fn test_get_group_not_found_after_all_pages() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Get, "/groups", 200, &listing(json!([{"id": "A", "name": "a"}]), 1, 1));
        let client = Client::with_transport(mock);
        let err = client.get_group("Z").unwrap_err();
        assert_eq!(err.to_string(), "Did not find group ID Z");
    }

    #[test]
    fn test_group_import_fields_round_trip_on_wire() {
        let group: Group = serde_json::from_value(json!({
            "id": "G", "name": "AD group",
            "import": {"domainName": "corp.example.com", "siteRole": "Explorer", "grantLicenseMode": "onLogin"}
        }))
        .unwrap();
        let import = group.import.unwrap();
        assert_eq!(import.domain_name.as_deref(), Some("corp.example.com"));
        assert_eq!(import.grant_license_mode.as_deref(), Some("onLogin"));
    }

    #[test]
    fn test_group_membership() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Post, "/groups/G/users", 200, &json!({"user": {"id": "U", "name": "ann"}}))
            .respond_json(
                Method::Get,
                "/groups/G/users",
                200,
                &json!({"pagination": {"pageNumber": "1", "pageSize": "100", "totalAvailable": "1"}, "users": {"user": [{"id": "U", "name": "ann"}]}}),
            )
            .respond(Method::Delete, "/groups/G/users/U", 204, "");
        let client = Client::with_transport(mock.clone());
        let id = GroupUserId::new("G", "U");

        assert_eq!(client.add_user_to_group(&id).unwrap().name, "ann");
        assert_eq!(client.get_group_user(&id).unwrap().id, "U");
        client.remove_user_from_group(&id).unwrap();

        let body: serde_json::Value = serde_json::from_str(&mock.requests()[0].body_text()).unwrap();
        assert_eq!(body, json!({"user": {"id": "U"}}));
    }

    #[test]
    fn test_group_user_not_found_message() {
        let mock = MockTransport::new();
        mock.respond_json(Method::Get, "/groups/G/users", 200, &json!({"users": {}}));
        let client = Client::with_transport(mock);
        let err = client.get_group_user(&GroupUserId::new("G", "U")).unwrap_err();
        assert_eq!(err.to_string(), "Did not find user ID U in group ID G");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_group_user_id_parse() {
        let id: GroupUserId = "g-1:u-2".parse().unwrap();
        assert_eq!(id, GroupUserId::new("g-1", "u-2"));
        assert!("g-1".parse::<GroupUserId>().is_err());
        assert!("a:b:c".parse::<GroupUserId>().is_err());
        assert!(":u".parse::<GroupUserId>().is_err());
    }

    proptest! {
        #[test]
        fn prop_group_user_id_round_trip(group in "[A-Za-z0-9-]{1,36}", user in "[A-Za-z0-9-]{1,36}") {
            let id = GroupUserId::new(group, user);
            prop_assert_eq!(id.to_string().parse::<GroupUserId>().unwrap(), id);
        }
    }
}
