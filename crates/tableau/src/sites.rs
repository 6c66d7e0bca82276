//! Sites.
//!
//! Site endpoints hang off the server root, not the signed-in site.

use crate::client::{Client, wrap_entity};
use crate::error::Result;
use crate::pagination::Collection;
use crate::transport::Request;
use serde::{Deserialize, Serialize};

pub(crate) const SITES: Collection = Collection {
    plural: "sites",
    singular: "site",
    entity: "site",
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub content_url: String,
}

impl Client {
    /// Look a site up by ID, scanning every page of `/sites`.
    pub fn get_site(&self, id: &str) -> Result<Site> {
        let request = Request::get("/sites").server_scoped();
        self.find_across_pages(&request, &SITES, id, |s: &Site| s.id == id)
    }

    pub fn list_sites(&self) -> Result<Vec<Site>> {
        self.collect_pages(&Request::get("/sites").server_scoped(), &SITES)
    }

    pub fn create_site(&self, site: &Site) -> Result<Site> {
        let request = Request::post("/sites")
            .server_scoped()
            .json(&wrap_entity("site", site)?)?;
        self.send_unwrap(&request, "site")
    }

    pub fn update_site(&self, id: &str, site: &Site) -> Result<Site> {
        let body = Site {
            id: String::new(),
            ..site.clone()
        };
        let request = Request::put(format!("/sites/{id}"))
            .server_scoped()
            .json(&wrap_entity("site", &body)?)?;
        self.send_unwrap(&request, "site")
    }

    pub fn delete_site(&self, id: &str) -> Result<()> {
        self.send_empty(&Request::delete(format!("/sites/{id}")).server_scoped())
    }
}
