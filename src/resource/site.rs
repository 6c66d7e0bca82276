//! Sites, managed through the server-level API

use super::{Resource, absent_if_not_found};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tableau::{Client, Site};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteModel {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub content_url: String,
}

impl SiteModel {
    fn to_site(&self) -> Site {
        Site {
            id: String::new(),
            name: self.name.clone(),
            content_url: self.content_url.clone(),
        }
    }
}

impl From<Site> for SiteModel {
    fn from(site: Site) -> Self {
        Self {
            id: site.id,
            name: site.name,
            content_url: site.content_url,
        }
    }
}

pub struct SiteResource;

impl Resource for SiteResource {
    type Model = SiteModel;

    fn create(client: &Client, plan: &SiteModel) -> Result<SiteModel> {
        let created = client
            .create_site(&plan.to_site())
            .with_context(|| format!("Could not create site '{}'", plan.name))?;
        log::info!("Created site {} ({})", plan.name, created.id);
        Ok(SiteModel {
            id: created.id,
            content_url: if created.content_url.is_empty() {
                plan.content_url.clone()
            } else {
                created.content_url
            },
            ..plan.clone()
        })
    }

    fn read(client: &Client, state: &SiteModel) -> Result<Option<SiteModel>> {
        let site = absent_if_not_found(client.get_site(&state.id), &format!("site {}", state.id))?;
        Ok(site.map(SiteModel::from))
    }

    fn update(client: &Client, state: &SiteModel, plan: &SiteModel) -> Result<SiteModel> {
        client
            .update_site(&state.id, &plan.to_site())
            .with_context(|| format!("Could not update site {}", state.id))?;
        Self::read(client, state)?.with_context(|| format!("Site {} disappeared after update", state.id))
    }

    fn delete(client: &Client, state: &SiteModel) -> Result<()> {
        client
            .delete_site(&state.id)
            .with_context(|| format!("Could not delete site {}", state.id))?;
        log::info!("Deleted site {}", state.id);
        Ok(())
    }

    fn import(id: &str) -> Result<SiteModel> {
        Ok(SiteModel {
            id: id.to_string(),
            ..Default::default()
        })
    }
}
