//! Sign-in and the authenticated session.

use crate::error::{Error, Result};
use crate::transport::{Request, Transport};
use serde::{Deserialize, Serialize};

/// Result of a successful sign-in.
///
/// Created once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// LUID of the signed-in site.
    pub site_id: String,
    /// Value for the `X-Tableau-Auth` header.
    pub token: String,
}

/// Sign-in credentials: a username/password pair, a personal access token,
/// or whatever mix the caller was configured with.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(
        rename = "personalAccessTokenName",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_name: Option<String>,
    #[serde(
        rename = "personalAccessTokenSecret",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_secret: Option<String>,
    pub site: SiteRef,
}

/// Site selector sent with the credentials. Empty content URL is the default site.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SiteRef {
    #[serde(rename = "contentUrl")]
    pub content_url: String,
}

#[derive(Serialize)]
struct SignInRequest<'a> {
    credentials: &'a Credentials,
}

#[derive(Deserialize)]
struct SignInResponse {
    credentials: SignInCredentials,
}

#[derive(Deserialize)]
struct SignInCredentials {
    site: SignInSite,
    token: String,
}

#[derive(Deserialize)]
struct SignInSite {
    id: Option<String>,
}

/// `POST /auth/signin` on the server root.
pub fn sign_in(transport: &dyn Transport, credentials: &Credentials) -> Result<Session> {
    log::debug!(
        "Signing in to site '{}'",
        credentials.site.content_url
    );
    let request = Request::post("/auth/signin")
        .server_scoped()
        .json(&SignInRequest { credentials })?;
    let body = transport.send(&request)?;
    let response: SignInResponse = serde_json::from_slice(&body)?;

    let site_id = response
        .credentials
        .site
        .id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::InvalidResponse("sign-in response has no site ID".into()))?;

    Ok(Session {
        site_id,
        token: response.credentials.token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Method, MockTransport, Scope};
    use serde_json::json;

    #[test]
    fn test_sign_in_with_token() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Post,
            "/auth/signin",
            200,
            &json!({"credentials": {"site": {"id": "site-1", "contentUrl": "marketing"}, "user": {"id": "u"}, "token": "tok"}}),
        );
        let credentials = Credentials {
            token_name: Some("ci".into()),
            token_secret: Some("secret".into()),
            site: SiteRef {
                content_url: "marketing".into(),
            },
            ..Default::default()
        };

        let session = sign_in(&mock, &credentials).unwrap();

        assert_eq!(session.site_id, "site-1");
        assert_eq!(session.token, "tok");
        let request = &mock.requests()[0];
        assert_eq!(request.scope, Scope::Server);
        let sent: serde_json::Value = serde_json::from_str(&request.body_text()).unwrap();
        assert_eq!(
            sent,
            json!({"credentials": {
                "personalAccessTokenName": "ci",
                "personalAccessTokenSecret": "secret",
                "site": {"contentUrl": "marketing"}
            }})
        );
    }

    #[test]
    fn test_sign_in_rejected() {
        let mock = MockTransport::new();
        mock.respond(Method::Post, "/auth/signin", 401, "Signin Error");
        let err = sign_in(&mock, &Credentials::default()).unwrap_err();
        assert_eq!(err.to_string(), "status: 401, body: Signin Error");
    }

    #[test]
    fn test_sign_in_missing_site_id() {
        let mock = MockTransport::new();
        mock.respond_json(
            Method::Post,
            "/auth/signin",
            200,
            &json!({"credentials": {"site": {}, "token": "tok"}}),
        );
        assert!(sign_in(&mock, &Credentials::default()).is_err());
    }
}
