//! Workbooks, their connections and revisions.

use crate::client::{Client, wrap_entity};
use crate::error::Result;
use crate::pagination::Collection;
use crate::publish::{Multipart, XmlElement};
use crate::transport::Request;
use crate::types::{Location, Reference, Tags, flexible_bool};
use serde::{Deserialize, Serialize};

pub(crate) const WORKBOOKS: Collection = Collection {
    plural: "workbooks",
    singular: "workbook",
    entity: "workbook",
};

const CONNECTIONS: Collection = Collection {
    plural: "connections",
    singular: "connection",
    entity: "connection",
};

const REVISIONS: Collection = Collection {
    plural: "revisions",
    singular: "revision",
    entity: "revision",
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt_extracts: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_tabs: Option<String>,
    /// Size in megabytes.
    #[serde(default, skip_serializing)]
    pub size: Option<String>,
    #[serde(default, skip_serializing)]
    pub default_view_id: Option<String>,
    #[serde(default, skip_serializing)]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub webpage_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Reference>,
    #[serde(default, skip_serializing)]
    pub tags: Option<Tags>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
}

/// Fields for publishing a new workbook.
#[derive(Debug, Clone, Default)]
pub struct WorkbookPublish {
    pub name: String,
    pub project_id: String,
    pub show_tabs: Option<bool>,
    pub thumbnails_user_id: Option<String>,
    /// File name sent with the content, e.g. `sales.twbx`.
    pub filename: String,
    pub content: Vec<u8>,
}

/// Mutable workbook fields.
#[derive(Debug, Clone, Default)]
pub struct WorkbookUpdate {
    pub name: Option<String>,
    pub project_id: Option<String>,
    pub show_tabs: Option<bool>,
    pub description: Option<String>,
    pub encrypt_extracts: Option<bool>,
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookConnection {
    #[serde(default)]
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub server_address: String,
    #[serde(default)]
    pub server_port: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub authentication_type: String,
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub embed_password: Option<bool>,
    #[serde(default, rename = "query_tagging_enabled", deserialize_with = "flexible_bool::deserialize")]
    pub query_tagging_enabled: Option<bool>,
    #[serde(default, rename = "useOauthManagedKeychain", deserialize_with = "flexible_bool::deserialize")]
    pub use_oauth_managed_keychain: Option<bool>,
    #[serde(default)]
    pub datasource: Reference,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Revision {
    #[serde(default)]
    pub revision_number: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub current: Option<bool>,
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub publisher: Reference,
}

impl Client {
    /// Look a workbook up by ID, scanning every page of `/workbooks`.
    pub fn get_workbook(&self, id: &str) -> Result<Workbook> {
        self.find_across_pages(&Request::get("/workbooks"), &WORKBOOKS, id, |w: &Workbook| w.id == id)
    }

    pub fn list_workbooks(&self) -> Result<Vec<Workbook>> {
        self.collect_pages(&Request::get("/workbooks"), &WORKBOOKS)
    }

    /// Publish a workbook; returns the new workbook's ID.
    pub fn publish_workbook(&self, publish: &WorkbookPublish) -> Result<String> {
        let document = XmlElement::new("tsRequest").child(
            XmlElement::new("workbook")
                .attr("name", publish.name.as_str())
                .attr_opt("showTabs", publish.show_tabs.map(bool_str))
                .attr_opt("thumbnailsUserId", publish.thumbnails_user_id.as_deref())
                .child(XmlElement::new("project").attr("id", publish.project_id.as_str())),
        );
        let (body, content_type) = Multipart::new()
            .payload(&document)
            .file("tableau_workbook", &publish.filename, publish.content.clone())
            .build();

        log::debug!(
            "Publishing workbook '{}' ({} bytes)",
            publish.name,
            publish.content.len()
        );
        let request = Request::post("/workbooks").with_body(body, content_type);
        let workbook: Workbook = self.send_unwrap(&request, "workbook")?;
        Ok(workbook.id)
    }

    pub fn update_workbook(&self, id: &str, update: &WorkbookUpdate) -> Result<Workbook> {
        let body = Workbook {
            name: update.name.clone().unwrap_or_default(),
            description: update.description.clone(),
            show_tabs: update.show_tabs.map(|b| bool_str(b).to_string()),
            encrypt_extracts: update.encrypt_extracts.map(|b| bool_str(b).to_string()),
            project: update.project_id.as_deref().map(Reference::id),
            owner: update.owner_id.as_deref().map(Reference::id),
            ..Default::default()
        };
        let request = Request::put(format!("/workbooks/{id}")).json(&wrap_entity("workbook", &body)?)?;
        self.send_unwrap(&request, "workbook")
    }

    pub fn delete_workbook(&self, id: &str) -> Result<()> {
        self.send_empty(&Request::delete(format!("/workbooks/{id}")))
    }

    /// Data connections of a workbook (not paginated).
    pub fn list_workbook_connections(&self, workbook_id: &str) -> Result<Vec<WorkbookConnection>> {
        self.collect_pages(
            &Request::get(format!("/workbooks/{workbook_id}/connections")),
            &CONNECTIONS,
        )
    }

    pub fn list_workbook_revisions(&self, workbook_id: &str) -> Result<Vec<Revision>> {
        self.collect_pages(
            &Request::get(format!("/workbooks/{workbook_id}/revisions")),
            &REVISIONS,
        )
    }
}

pub(crate) fn bool_str(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
