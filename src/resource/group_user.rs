//! Group membership, identified as `groupID:userID`

use super::{Resource, absent_if_not_found};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tableau::{Client, GroupUserId};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupUserModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub user_id: String,
}

impl GroupUserModel {
    /// Membership key from the two fields, or from the combined ID when
    /// either field is missing
    fn key(&self) -> Result<GroupUserId> {
        if !self.group_id.is_empty() && !self.user_id.is_empty() {
            return Ok(GroupUserId::new(&self.group_id, &self.user_id));
        }
        Ok(self.id.parse::<GroupUserId>()?)
    }

    fn from_key(key: &GroupUserId) -> Self {
        Self {
            id: key.to_string(),
            group_id: key.group_id.clone(),
            user_id: key.user_id.clone(),
        }
    }
}

pub struct GroupUserResource;

impl Resource for GroupUserResource {
    type Model = GroupUserModel;

    fn create(client: &Client, plan: &GroupUserModel) -> Result<GroupUserModel> {
        if plan.group_id.is_empty() || plan.user_id.is_empty() {
            bail!("group_user needs both group_id and user_id");
        }
        let key = GroupUserId::new(&plan.group_id, &plan.user_id);
        client
            .add_user_to_group(&key)
            .with_context(|| format!("Could not add user {} to group {}", key.user_id, key.group_id))?;
        log::info!("Added user {} to group {}", key.user_id, key.group_id);
        Ok(GroupUserModel::from_key(&key))
    }

    fn read(client: &Client, state: &GroupUserModel) -> Result<Option<GroupUserModel>> {
        let key = state.key()?;
        let member = absent_if_not_found(client.get_group_user(&key), &format!("membership {key}"))?;
        Ok(member.map(|_| GroupUserModel::from_key(&key)))
    }

    fn update(_client: &Client, state: &GroupUserModel, _plan: &GroupUserModel) -> Result<GroupUserModel> {
        bail!(
            "Membership {} cannot be updated in place; delete it and create a new one",
            state.id
        )
    }

    fn delete(client: &Client, state: &GroupUserModel) -> Result<()> {
        let key = state.key()?;
        client
            .remove_user_from_group(&key)
            .with_context(|| format!("Could not remove user {} from group {}", key.user_id, key.group_id))?;
        log::info!("Removed user {} from group {}", key.user_id, key.group_id);
        Ok(())
    }

    fn import(id: &str) -> Result<GroupUserModel> {
        let key: GroupUserId = id.parse()?;
        Ok(GroupUserModel::from_key(&key))
    }
}
