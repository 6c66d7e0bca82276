//! Pagination resolver and page walkers.
//!
//! Listings carry a `pagination` block with string-typed numbers. The first
//! page is fetched without a page parameter; the remaining pages are fetched
//! with `pageNumber=N` until `ceil(totalAvailable / pageSize)` is reached.

use crate::client::Client;
use crate::error::{Error, Result};
use crate::transport::Request;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::ops::RangeInclusive;

/// Pagination block as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDetails {
    pub page_number: String,
    pub page_size: String,
    pub total_available: String,
}

/// Parsed pagination numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_available: u64,
}

impl PageInfo {
    /// Pages still to fetch after the current one.
    pub fn remaining_pages(&self) -> RangeInclusive<u64> {
        self.current_page.saturating_add(1)..=self.total_pages
    }
}

fn parse_field(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Pagination(format!("{name} '{value}' is not a number")))
}

/// Parse a pagination block into page numbers.
///
/// A page size of zero is rejected; zero available items means zero pages.
pub fn resolve(details: &PaginationDetails) -> Result<PageInfo> {
    let current_page = parse_field("pageNumber", &details.page_number)?;
    let page_size = parse_field("pageSize", &details.page_size)?;
    let total_available = parse_field("totalAvailable", &details.total_available)?;

    if page_size == 0 {
        return Err(Error::Pagination("pageSize is 0".into()));
    }
    if current_page.checked_add(1).is_none() {
        return Err(Error::Pagination(format!("pageNumber {current_page} is out of range")));
    }

    Ok(PageInfo {
        current_page,
        total_pages: total_available.div_ceil(page_size),
        total_available,
    })
}

/// Append `pageNumber=N` to a path that may already carry a query.
pub fn page_path(path: &str, page: u64) -> String {
    let sep = if path.contains('?') { '&' } else { '?' };
    format!("{path}{sep}pageNumber={page}")
}

/// Where a listing keeps its items: `{plural: {singular: [...]}}`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Collection {
    pub plural: &'static str,
    pub singular: &'static str,
    /// Entity name used in not-found messages.
    pub entity: &'static str,
}

pub(crate) struct Page<T> {
    pub items: Vec<T>,
    pub pagination: Option<PaginationDetails>,
}

pub(crate) fn parse_page<T: DeserializeOwned>(body: &[u8], collection: &Collection) -> Result<Page<T>> {
    let mut value: Value = serde_json::from_slice(body)?;

    let container = value.get_mut(collection.plural).ok_or_else(|| {
        Error::InvalidResponse(format!("missing '{}' in listing", collection.plural))
    })?;
    // An empty listing comes back as `{plural: {}}`
    let items = match container.get_mut(collection.singular).map(Value::take) {
        Some(list) => serde_json::from_value(list)?,
        None => Vec::new(),
    };

    let pagination = match value.get_mut("pagination").map(Value::take) {
        Some(p) => Some(serde_json::from_value(p)?),
        None => None,
    };

    Ok(Page { items, pagination })
}

impl Client {
    fn fetch_page<T: DeserializeOwned>(&self, request: &Request, page: Option<u64>, collection: &Collection) -> Result<Page<T>> {
        let request = match page {
            None => request.clone(),
            Some(n) => {
                log::debug!("Fetching {} page {}", collection.plural, n);
                Request {
                    path: page_path(&request.path, n),
                    ..request.clone()
                }
            }
        };
        let body = self.send(&request)?;
        parse_page(&body, collection)
    }

    /// Fetch every page of a listing, concatenated in server order.
    pub(crate) fn collect_pages<T: DeserializeOwned>(&self, request: &Request, collection: &Collection) -> Result<Vec<T>> {
        let first = self.fetch_page::<T>(request, None, collection)?;
        let mut items = first.items;

        let Some(details) = first.pagination else {
            return Ok(items);
        };
        let info = resolve(&details)?;
        for page in info.remaining_pages() {
            items.extend(self.fetch_page::<T>(request, Some(page), collection)?.items);
        }

        Ok(items)
    }

    /// Walk pages until `predicate` matches, without fetching further pages.
    ///
    /// Returns [`Error::NotFound`] for `id` when the walk is exhausted.
    pub(crate) fn find_across_pages<T, F>(
        &self,
        request: &Request,
        collection: &Collection,
        id: &str,
        predicate: F,
    ) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> bool,
    {
        let first = self.fetch_page::<T>(request, None, collection)?;
        let pagination = first.pagination;
        if let Some(found) = first.items.into_iter().find(&predicate) {
            return Ok(found);
        }

        if let Some(details) = pagination {
            let info = resolve(&details)?;
            for page in info.remaining_pages() {
                let items = self.fetch_page::<T>(request, Some(page), collection)?.items;
                if let Some(found) = items.into_iter().find(&predicate) {
                    return Ok(found);
                }
            }
        }

        Err(Error::not_found(collection.entity, id))
    }
}
