//! Projects

use super::{Resource, absent_if_not_found, non_empty};
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use tableau::{Client, Project};

const CONTENT_PERMISSIONS: &[&str] = &["LockedToProject", "ManagedByOwner", "LockedToProjectWithoutNested"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectModel {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub content_permissions: String,
}

impl ProjectModel {
    fn validate(&self) -> Result<()> {
        if !CONTENT_PERMISSIONS.contains(&self.content_permissions.as_str()) {
            bail!(
                "invalid content_permissions '{}', expected one of: {}",
                self.content_permissions,
                CONTENT_PERMISSIONS.join(", ")
            );
        }
        Ok(())
    }

    fn to_project(&self) -> Project {
        Project {
            id: String::new(),
            name: self.name.clone(),
            parent_project_id: non_empty(&self.parent_project_id),
            description: self.description.clone(),
            content_permissions: Some(self.content_permissions.clone()),
            owner: None,
        }
    }

    pub(crate) fn from_project(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            parent_project_id: non_empty(&project.parent_project_id),
            description: project.description,
            content_permissions: project.content_permissions.unwrap_or_default(),
        }
    }
}

pub struct ProjectResource;

impl Resource for ProjectResource {
    type Model = ProjectModel;

    fn create(client: &Client, plan: &ProjectModel) -> Result<ProjectModel> {
        plan.validate()?;
        let created = client
            .create_project(&plan.to_project())
            .with_context(|| format!("Could not create project '{}'", plan.name))?;
        log::info!("Created project {} ({})", plan.name, created.id);
        Ok(ProjectModel {
            id: created.id,
            ..plan.clone()
        })
    }

    fn read(client: &Client, state: &ProjectModel) -> Result<Option<ProjectModel>> {
        let project = absent_if_not_found(client.get_project(&state.id), &format!("project {}", state.id))?;
        Ok(project.map(ProjectModel::from_project))
    }

    fn update(client: &Client, state: &ProjectModel, plan: &ProjectModel) -> Result<ProjectModel> {
        plan.validate()?;
        client
            .update_project(&state.id, &plan.to_project())
            .with_context(|| format!("Could not update project {}", state.id))?;
        Self::read(client, state)?
            .with_context(|| format!("Project {} disappeared after update", state.id))
    }

    fn delete(client: &Client, state: &ProjectModel) -> Result<()> {
        client
            .delete_project(&state.id)
            .with_context(|| format!("Could not delete project {}", state.id))?;
        log::info!("Deleted project {}", state.id);
        Ok(())
    }

    fn import(id: &str) -> Result<ProjectModel> {
        Ok(ProjectModel {
            id: id.to_string(),
            ..Default::default()
        })
    }
}
