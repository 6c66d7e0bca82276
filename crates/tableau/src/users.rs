//! Site users.

use crate::client::{Client, wrap_entity};
use crate::error::Result;
use crate::pagination::Collection;
use crate::transport::Request;
use serde::{Deserialize, Serialize};

pub(crate) const USERS: Collection = Collection {
    plural: "users",
    singular: "user",
    entity: "user",
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_setting: Option<String>,
}

impl Client {
    pub fn get_user(&self, id: &str) -> Result<User> {
        self.send_unwrap(&Request::get(format!("/users/{id}")), "user")
    }

    pub fn list_users(&self) -> Result<Vec<User>> {
        self.collect_pages(&Request::get("/users"), &USERS)
    }

    /// Add a user to the site.
    ///
    /// The endpoint only takes the name, site role and auth setting; anything
    /// else in `user` has to be applied with [`Client::update_user`] afterwards.
    pub fn create_user(&self, user: &User) -> Result<User> {
        let body = User {
            name: user.name.clone(),
            site_role: user.site_role.clone(),
            auth_setting: user.auth_setting.clone(),
            ..Default::default()
        };
        let request = Request::post("/users").json(&wrap_entity("user", &body)?)?;
        self.send_unwrap(&request, "user")
    }

    /// Update the mutable fields of a user.
    pub fn update_user(&self, id: &str, user: &User) -> Result<User> {
        let body = User {
            id: String::new(),
            name: String::new(),
            ..user.clone()
        };
        let request = Request::put(format!("/users/{id}")).json(&wrap_entity("user", &body)?)?;
        let mut updated: User = self.send_unwrap(&request, "user")?;
        if updated.id.is_empty() {
            updated.id = id.to_string();
        }
        Ok(updated)
    }

    pub fn delete_user(&self, id: &str) -> Result<()> {
        self.send_empty(&Request::delete(format!("/users/{id}")))
    }
}
