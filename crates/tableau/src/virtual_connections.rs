//! Virtual connections. Read-only; only their permissions are managed.

use crate::client::Client;
use crate::error::Result;
use crate::pagination::Collection;
use crate::transport::Request;
use crate::types::{Reference, flexible_bool};
use serde::{Deserialize, Serialize};

pub(crate) const VIRTUAL_CONNECTIONS: Collection = Collection {
    plural: "virtualConnections",
    singular: "virtualConnection",
    entity: "virtual connection",
};

const VC_CONNECTIONS: Collection = Collection {
    plural: "virtualConnectionConnections",
    singular: "connection",
    entity: "connection",
};

const VC_REVISIONS: Collection = Collection {
    plural: "revisions",
    singular: "revision",
    entity: "revision",
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualConnection {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub has_extracts: Option<bool>,
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub is_certified: Option<bool>,
    #[serde(default)]
    pub webpage_url: String,
}

/// A database connection inside a virtual connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualConnectionConnection {
    #[serde(default, rename = "connectionId")]
    pub id: String,
    #[serde(default, rename = "dbClass")]
    pub db_class: String,
    #[serde(default)]
    pub server: String,
    #[serde(default)]
    pub port: String,
    #[serde(default)]
    pub username: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualConnectionRevision {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub project: Reference,
    #[serde(default)]
    pub owner: Reference,
    #[serde(default)]
    pub publisher: Reference,
    /// Serialized connection definition for this revision.
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub current: Option<bool>,
    #[serde(default, deserialize_with = "flexible_bool::deserialize")]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub revision_number: String,
}

impl Client {
    pub fn list_virtual_connections(&self) -> Result<Vec<VirtualConnection>> {
        self.collect_pages(&Request::get("/virtualconnections"), &VIRTUAL_CONNECTIONS)
    }

    pub fn get_virtual_connection(&self, id: &str) -> Result<VirtualConnection> {
        self.find_across_pages(
            &Request::get("/virtualconnections"),
            &VIRTUAL_CONNECTIONS,
            id,
            |vc: &VirtualConnection| vc.id == id,
        )
    }

    pub fn list_virtual_connection_connections(&self, id: &str) -> Result<Vec<VirtualConnectionConnection>> {
        self.collect_pages(
            &Request::get(format!("/virtualconnections/{id}/connections")),
            &VC_CONNECTIONS,
        )
    }

    pub fn list_virtual_connection_revisions(&self, id: &str) -> Result<Vec<VirtualConnectionRevision>> {
        self.collect_pages(
            &Request::get(format!("/virtualconnections/{id}/revisions")),
            &VC_REVISIONS,
        )
    }

    /// One revision by number, including its `content`.
    pub fn get_virtual_connection_revision(&self, id: &str, revision: u32) -> Result<VirtualConnectionRevision> {
        let request = Request::get(format!("/virtualconnections/{id}/revisions/{revision}"));
        self.send_unwrap(&request, "virtualConnection")
    }
}
