//! Published datasources.

use crate::client::{Client, wrap_entity};
use crate::error::Result;
use crate::pagination::Collection;
use crate::publish::{Multipart, XmlElement};
use crate::transport::Request;
use crate::types::{Reference, Tags, flexible_bool};
use serde::{Deserialize, Serialize};

pub(crate) const DATASOURCES: Collection = Collection {
    plural: "datasources",
    singular: "datasource",
    entity: "datasource",
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Datasource {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certification_note: Option<String>,
    #[serde(default, rename = "type", skip_serializing)]
    pub kind: Option<String>,
    #[serde(default, skip_serializing)]
    pub content_url: Option<String>,
    #[serde(default, skip_serializing)]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing)]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypt_extracts: Option<String>,
    #[serde(default, skip_serializing, deserialize_with = "flexible_bool::deserialize")]
    pub has_extracts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "flexible_bool::deserialize")]
    pub is_certified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "flexible_bool::deserialize")]
    pub use_remote_query_agent: Option<bool>,
    #[serde(default, skip_serializing)]
    pub webpage_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<Reference>,
    #[serde(default, skip_serializing)]
    pub tags: Option<Tags>,
}

/// Fields for publishing a new datasource.
#[derive(Debug, Clone, Default)]
pub struct DatasourcePublish {
    pub name: String,
    pub description: Option<String>,
    pub project_id: String,
    /// File name sent with the content, e.g. `orders.tdsx`.
    pub filename: String,
    pub content: Vec<u8>,
}

impl Client {
    /// Find a datasource whose ID equals `id` or whose name equals `name`.
    ///
    /// Empty arguments never match.
    pub fn get_datasource(&self, id: &str, name: &str) -> Result<Datasource> {
        self.find_across_pages(
            &Request::get("/datasources"),
            &DATASOURCES,
            if id.is_empty() { name } else { id },
            |d: &Datasource| (!id.is_empty() && d.id == id) || (!name.is_empty() && d.name == name),
        )
    }

    pub fn list_datasources(&self) -> Result<Vec<Datasource>> {
        self.collect_pages(&Request::get("/datasources"), &DATASOURCES)
    }

    /// Publish a datasource; returns the new datasource.
    pub fn publish_datasource(&self, publish: &DatasourcePublish) -> Result<Datasource> {
        let document = XmlElement::new("tsRequest").child(
            XmlElement::new("datasource")
                .attr("name", publish.name.as_str())
                .attr_opt("description", publish.description.as_deref())
                .child(XmlElement::new("project").attr("id", publish.project_id.as_str())),
        );
        let (body, content_type) = Multipart::new()
            .payload(&document)
            .file("tableau_datasource", &publish.filename, publish.content.clone())
            .build();

        log::debug!("Publishing datasource '{}'", publish.name);
        let request = Request::post("/datasources").with_body(body, content_type);
        self.send_unwrap(&request, "datasource")
    }

    /// Update project, owner and certification fields.
    pub fn update_datasource(&self, id: &str, datasource: &Datasource) -> Result<Datasource> {
        let body = Datasource {
            id: String::new(),
            ..datasource.clone()
        };
        let request = Request::put(format!("/datasources/{id}")).json(&wrap_entity("datasource", &body)?)?;
        self.send_unwrap(&request, "datasource")
    }

    pub fn delete_datasource(&self, id: &str) -> Result<()> {
        self.send_empty(&Request::delete(format!("/datasources/{id}")))
    }
}
