//! Projects.

use crate::client::{Client, wrap_entity};
use crate::error::Result;
use crate::pagination::Collection;
use crate::transport::Request;
use crate::types::Reference;
use serde::{Deserialize, Serialize};

pub(crate) const PROJECTS: Collection = Collection {
    plural: "projects",
    singular: "project",
    entity: "project",
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_project_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// `ManagedByOwner`, `LockedToProject` or `LockedToProjectWithoutNested`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_permissions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Reference>,
}

impl Client {
    /// Look a project up by ID, scanning every page of `/projects`.
    pub fn get_project(&self, id: &str) -> Result<Project> {
        self.find_across_pages(&Request::get("/projects"), &PROJECTS, id, |p: &Project| p.id == id)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        self.collect_pages(&Request::get("/projects"), &PROJECTS)
    }

    pub fn create_project(&self, project: &Project) -> Result<Project> {
        let body = Project {
            owner: None,
            ..project.clone()
        };
        let request = Request::post("/projects").json(&wrap_entity("project", &body)?)?;
        self.send_unwrap(&request, "project")
    }

    pub fn update_project(&self, id: &str, project: &Project) -> Result<Project> {
        let body = Project {
            id: String::new(),
            owner: None,
            ..project.clone()
        };
        let request = Request::put(format!("/projects/{id}")).json(&wrap_entity("project", &body)?)?;
        let mut updated: Project = self.send_unwrap(&request, "project")?;
        if updated.id.is_empty() {
            updated.id = id.to_string();
        }
        Ok(updated)
    }

    pub fn delete_project(&self, id: &str) -> Result<()> {
        self.send_empty(&Request::delete(format!("/projects/{id}")))
    }
}
