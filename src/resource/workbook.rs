//! Published workbooks
//!
//! The packaged workbook travels inline in the plan as `workbook_content`
//! and is only sent on create. Changing it means replacing the workbook.

use super::{Resource, absent_if_not_found, non_empty};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tableau::{Client, Workbook, WorkbookPublish, WorkbookUpdate};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookModel {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt_extracts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub project_id: String,
    /// `"true"` or `"false"`
    #[serde(default)]
    pub show_tabs: String,
    #[serde(default)]
    pub thumbnails_user_id: String,
    #[serde(default)]
    pub workbook_filename: String,
    #[serde(default)]
    pub workbook_content: String,
}

fn parse_flag(field: &str, value: &str) -> Result<Option<bool>> {
    match value {
        "" => Ok(None),
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        other => bail!("invalid {field} '{other}', expected true or false"),
    }
}

impl WorkbookModel {
    fn to_publish(&self) -> Result<WorkbookPublish> {
        if self.project_id.is_empty() {
            bail!("workbook '{}' needs a project_id", self.name);
        }
        if self.workbook_filename.is_empty() {
            bail!("workbook '{}' needs a workbook_filename", self.name);
        }
        Ok(WorkbookPublish {
            name: self.name.clone(),
            project_id: self.project_id.clone(),
            show_tabs: parse_flag("show_tabs", &self.show_tabs)?,
            thumbnails_user_id: non_empty(&Some(self.thumbnails_user_id.clone())),
            filename: self.workbook_filename.clone(),
            content: self.workbook_content.as_bytes().to_vec(),
        })
    }

    fn to_update(&self) -> Result<WorkbookUpdate> {
        let encrypt_extracts = match self.encrypt_extracts.as_deref() {
            Some(value) => parse_flag("encrypt_extracts", value)?,
            None => None,
        };
        Ok(WorkbookUpdate {
            name: Some(self.name.clone()),
            project_id: non_empty(&Some(self.project_id.clone())),
            show_tabs: parse_flag("show_tabs", &self.show_tabs)?,
            description: self.description.clone(),
            encrypt_extracts,
            owner_id: non_empty(&self.owner_id),
        })
    }

    /// Overwrite the fields the server reports, keeping create-only inputs
    fn refreshed(&self, workbook: Workbook) -> Self {
        Self {
            id: workbook.id,
            name: workbook.name,
            description: workbook.description.or_else(|| self.description.clone()),
            encrypt_extracts: workbook
                .encrypt_extracts
                .or_else(|| self.encrypt_extracts.clone()),
            owner_id: workbook
                .owner
                .map(|o| o.id)
                .filter(|id| !id.is_empty())
                .or_else(|| self.owner_id.clone()),
            project_id: workbook.project.map(|p| p.id).unwrap_or_default(),
            show_tabs: workbook.show_tabs.unwrap_or_default(),
            ..self.clone()
        }
    }
}

pub struct WorkbookResource;

impl Resource for WorkbookResource {
    type Model = WorkbookModel;

    fn create(client: &Client, plan: &WorkbookModel) -> Result<WorkbookModel> {
        let id = client
            .publish_workbook(&plan.to_publish()?)
            .with_context(|| format!("Could not create workbook '{}'", plan.name))?;
        log::info!("Published workbook {} ({id})", plan.name);
        Ok(WorkbookModel {
            id,
            ..plan.clone()
        })
    }

    fn read(client: &Client, state: &WorkbookModel) -> Result<Option<WorkbookModel>> {
        let workbook = absent_if_not_found(client.get_workbook(&state.id), &format!("workbook {}", state.id))?;
        Ok(workbook.map(|w| state.refreshed(w)))
    }

    fn update(client: &Client, state: &WorkbookModel, plan: &WorkbookModel) -> Result<WorkbookModel> {
        if plan.workbook_content != state.workbook_content || plan.workbook_filename != state.workbook_filename {
            bail!(
                "Workbook {} content cannot be updated in place; delete it and publish again",
                state.id
            );
        }
        client
            .update_workbook(&state.id, &plan.to_update()?)
            .with_context(|| format!("Could not update workbook {}", state.id))?;
        let current = WorkbookModel {
            id: state.id.clone(),
            ..plan.clone()
        };
        Self::read(client, &current)?
            .with_context(|| format!("Workbook {} disappeared after update", state.id))
    }

    fn delete(client: &Client, state: &WorkbookModel) -> Result<()> {
        client
            .delete_workbook(&state.id)
            .with_context(|| format!("Could not delete workbook {}", state.id))?;
        log::info!("Deleted workbook {}", state.id);
        Ok(())
    }

    fn import(id: &str) -> Result<WorkbookModel> {
        Ok(WorkbookModel {
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

    fn plan() -> WorkbookModel {
        WorkbookModel {
            name: "Sales".into(),
            project_id: "P1".into(),
            show_tabs: "true".into(),
            thumbnails_user_id: "U1".into(),
            workbook_filename: "sales.twb".into(),
            workbook_content: "<workbook/>".into(),
            ..Default::default()
        }
    }

    fn listing(workbook: serde_json::Value) -> serde_json::Value {
        json!({
            "pagination": {"pageNumber": "1", "pageSize": "100", "totalAvailable": "1"},
            "workbooks": {"workbook": [workbook]}
        })
    }

    #[test]
    fn test_create_publishes_inline_content() {
        let (client, mock) = mock_client();
        mock.respond_json(Method::Post, "/workbooks", 201, &json!({"workbook": {"id": "W1"}}));

        let state = WorkbookResource::create(&client, &plan()).unwrap();
        assert_eq!(state.id, "W1");
        assert_eq!(state.workbook_content, "<workbook/>");

        let body = mock.requests()[0].body_text();
        assert!(body.contains(r#"thumbnailsUserId="U1""#));
        assert!(body.contains("<workbook/>"));
    }

    #[test]
    fn test_create_rejects_bad_show_tabs() {
        let (client, mock) = mock_client();
        let bad = WorkbookModel {
            show_tabs: "yes".into(),
            ..plan()
        };
        assert!(WorkbookResource::create(&client, &bad).is_err());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_read_keeps_create_only_inputs() {
        let (client, mock) = mock_client();
        mock.respond_json(
            Method::Get,
            "/workbooks",
            200,
            &listing(json!({"id": "W1", "name": "Sales", "showTabs": "false", "project": {"id": "P9"}})),
        );
        let state = WorkbookModel {
            id: "W1".into(),
            ..plan()
        };
        let read = WorkbookResource::read(&client, &state).unwrap().unwrap();
        assert_eq!(read.project_id, "P9");
        assert_eq!(read.show_tabs, "false");
        assert_eq!(read.workbook_filename, "sales.twb");
        assert_eq!(read.thumbnails_user_id, "U1");
    }

    #[test]
    fn test_update_refuses_new_content() {
        let (client, mock) = mock_client();
        let state = WorkbookModel {
            id: "W1".into(),
            ..plan()
        };
        let planned = WorkbookModel {
            workbook_content: "<workbook v2/>".into(),
            ..state.clone()
        };
        assert!(WorkbookResource::update(&client, &state, &planned).is_err());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_update_moves_project() {
        let (client, mock) = mock_client();
        mock.respond_json(Method::Put, "/workbooks/W1", 200, &json!({"workbook": {"id": "W1"}}))
            .respond_json(
                Method::Get,
                "/workbooks",
                200,
                &listing(json!({"id": "W1", "name": "Sales", "showTabs": "true", "project": {"id": "P2"}})),
            );
        let state = WorkbookModel {
            id: "W1".into(),
            ..plan()
        };
        let planned = WorkbookModel {
            project_id: "P2".into(),
            ..state.clone()
        };
        let updated = WorkbookResource::update(&client, &state, &planned).unwrap();
        assert_eq!(updated.project_id, "P2");

        let body: serde_json::Value = serde_json::from_str(&mock.requests()[0].body_text()).unwrap();
        assert_eq!(body["workbook"]["project"]["id"], "P2");
    }
}
