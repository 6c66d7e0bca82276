//! The client and its JSON envelope helpers.
//!
//! Tableau wraps every object in a key named after its kind: a single group
//! travels as `{"group": {...}}`, a listing as
//! `{"groups": {"group": [...]}, "pagination": {...}}`. Entity modules add
//! their methods to [`Client`] on top of these helpers.

use crate::error::{Error, Result};
use crate::session::{Credentials, sign_in};
use crate::transport::{HttpTransport, Request, Transport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Blocking Tableau REST client.
///
/// # Example
///
/// ```no_run
/// use tableau::{Client, Credentials, SiteRef};
///
/// let client = Client::connect(
///     "https://tableau.example.com",
///     "3.19",
///     &Credentials {
///         name: Some("admin".into()),
///         password: Some("secret".into()),
///         site: SiteRef { content_url: "marketing".into() },
///         ..Default::default()
///     },
/// )
/// .unwrap();
/// let groups = client.list_groups().unwrap();
/// println!("{} groups", groups.len());
/// ```
pub struct Client {
    transport: Box<dyn Transport>,
}

impl Client {
    /// Sign in and return a client scoped to the signed-in site.
    pub fn connect(server_url: &str, server_version: &str, credentials: &Credentials) -> Result<Self> {
        let api_base = format!(
            "{}/api/{}",
            server_url.trim_end_matches('/'),
            server_version
        );
        let transport = HttpTransport::new(api_base);
        let session = sign_in(&transport, credentials)?;
        log::info!("Signed in to site {}", session.site_id);
        Ok(Self::with_transport(transport.with_session(session)))
    }

    /// Create a client over any transport (e.g. [`crate::MockTransport`]).
    pub fn with_transport(transport: impl Transport + 'static) -> Self {
        Self {
            transport: Box::new(transport),
        }
    }

    /// Send a request and return the raw response body.
    pub fn send(&self, request: &Request) -> Result<Vec<u8>> {
        self.transport.send(request)
    }

    /// Send a request and unwrap `{key: T}` from the response.
    pub(crate) fn send_unwrap<T: DeserializeOwned>(&self, request: &Request, key: &str) -> Result<T> {
        let body = self.send(request)?;
        unwrap_entity(&body, key)
    }

    /// Send a request whose response body is ignored.
    pub(crate) fn send_empty(&self, request: &Request) -> Result<()> {
        self.send(request).map(|_| ())
    }
}

/// `{key: value}` request envelope.
pub(crate) fn wrap_entity<T: Serialize>(key: &str, value: &T) -> Result<Value> {
    let mut map = serde_json::Map::new();
    map.insert(key.to_string(), serde_json::to_value(value)?);
    Ok(Value::Object(map))
}

/// Pull `T` out of a `{key: T}` response.
pub(crate) fn unwrap_entity<T: DeserializeOwned>(body: &[u8], key: &str) -> Result<T> {
    let mut value: Value = serde_json::from_slice(body)?;
    let inner = value
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| Error::InvalidResponse(format!("missing '{key}' in response")))?;
    Ok(serde_json::from_value(inner)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Thing {
        id: String,
    }

    #[test]
    fn test_wrap_entity() {
        let value = wrap_entity("thing", &Thing { id: "1".into() }).unwrap();
        assert_eq!(value, serde_json::json!({"thing": {"id": "1"}}));
    }

    #[test]
    fn test_unwrap_entity() {
        let thing: Thing = unwrap_entity(br#"{"thing":{"id":"7"}}"#, "thing").unwrap();
        assert_eq!(thing, Thing { id: "7".into() });
    }

    #[test]
    fn test_unwrap_entity_missing_key() {
        let err = unwrap_entity::<Thing>(br#"{"other":{}}"#, "thing").unwrap_err();
        assert!(err.to_string().contains("missing 'thing'"));
    }

    #[test]
    fn test_unwrap_entity_malformed() {
        assert!(unwrap_entity::<Thing>(b"not json", "thing").is_err());
    }
}
