//! Site users

use super::{Resource, absent_if_not_found, optional};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tableau::{Client, User};

/// Site roles accepted by the server
const SITE_ROLES: &[&str] = &[
    "Creator",
    "Explorer",
    "Interactor",
    "Publisher",
    "ExplorerCanPublish",
    "ServerAdministrator",
    "SiteAdministratorExplorer",
    "SiteAdministratorCreator",
    "Unlicensed",
    "Viewer",
];

const AUTH_SETTINGS: &[&str] = &["SAML", "ServerDefault", "OpenID", "TableauIDWithMFA"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub site_role: String,
    #[serde(default)]
    pub auth_setting: String,
}

impl UserModel {
    fn validate(&self) -> Result<()> {
        check_one_of("site_role", &self.site_role, SITE_ROLES)?;
        check_one_of("auth_setting", &self.auth_setting, AUTH_SETTINGS)
    }

    fn to_user(&self) -> User {
        User {
            id: String::new(),
            email: optional(self.email.clone()),
            name: self.name.clone(),
            full_name: optional(self.full_name.clone()),
            site_role: optional(self.site_role.clone()),
            auth_setting: optional(self.auth_setting.clone()),
        }
    }

    pub(crate) fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email.unwrap_or_default(),
            name: user.name,
            full_name: user.full_name.unwrap_or_default(),
            site_role: user.site_role.unwrap_or_default(),
            auth_setting: user.auth_setting.unwrap_or_default(),
        }
    }
}

fn check_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if value.is_empty() || allowed.contains(&value) {
        Ok(())
    } else {
        anyhow::bail!("invalid {field} '{value}', expected one of: {}", allowed.join(", "))
    }
}

pub struct UserResource;

impl Resource for UserResource {
    type Model = UserModel;

    fn create(client: &Client, plan: &UserModel) -> Result<UserModel> {
        plan.validate()?;
        let user = plan.to_user();
        let created = client
            .create_user(&user)
            .with_context(|| format!("Could not create user '{}'", plan.name))?;
        log::info!("Created user {} ({})", plan.name, created.id);

        // The create endpoint drops email and full name
        client
            .update_user(&created.id, &user)
            .with_context(|| format!("Could not update user {} during create", created.id))?;

        Ok(UserModel {
            id: created.id,
            ..plan.clone()
        })
    }

    fn read(client: &Client, state: &UserModel) -> Result<Option<UserModel>> {
        let user = absent_if_not_found(client.get_user(&state.id), &format!("user {}", state.id))?;
        Ok(user.map(|user| {
            let mut model = UserModel::from_user(user);
            // Some servers omit email from the single-user view
            if model.email.is_empty() {
                model.email = state.email.clone();
            }
            model
        }))
    }

    fn update(client: &Client, state: &UserModel, plan: &UserModel) -> Result<UserModel> {
        plan.validate()?;
        client
            .update_user(&state.id, &plan.to_user())
            .with_context(|| format!("Could not update user {}", state.id))?;
        Self::read(client, state)?
            .with_context(|| format!("User {} disappeared after update", state.id))
    }

    fn delete(client: &Client, state: &UserModel) -> Result<()> {
        client
            .delete_user(&state.id)
            .with_context(|| format!("Could not delete user {}", state.id))?;
        log::info!("Deleted user {}", state.id);
        Ok(())
    }

    fn import(id: &str) -> Result<UserModel> {
        Ok(UserModel {
            id: id.to_string(),
            ..Default::default()
        })
    }
}
