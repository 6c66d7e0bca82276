//! # Tableau
//!
//! Blocking client for the Tableau Server/Cloud REST API.
//!
//! ## Core Concepts
//!
//! - **Transport**: sends a [`Request`] and returns the body of a 200/201/204
//!   response. [`HttpTransport`] talks to a server, [`MockTransport`] replays
//!   scripted responses in tests.
//! - **Session**: sign-in yields a site ID and token; site-scoped paths are
//!   resolved under `/sites/{siteID}`, server-scoped ones (sites) are not.
//! - **Pagination**: listings are walked page by page; lookups stop at the
//!   first page holding a match.
//! - **Permissions**: [`PermissionsStore`] adapts one [`PermissionTarget`] to
//!   the `grants` reconciliation engine.
//!
//! ## Example
//!
//! ```no_run
//! use tableau::{Client, Credentials, PermissionTarget, SiteRef};
//!
//! let client = Client::connect(
//!     "https://tableau.example.com",
//!     "3.19",
//!     &Credentials {
//!         token_name: Some("ci".into()),
//!         token_secret: Some("secret".into()),
//!         site: SiteRef { content_url: "marketing".into() },
//!         ..Default::default()
//!     },
//! )?;
//! for grant in client.get_permissions(&PermissionTarget::Project("p1".into()))? {
//!     println!("{} has {} capabilities", grant.grantee, grant.capabilities.len());
//! }
//! # Ok::<(), tableau::Error>(())
//! ```

pub mod client;
pub mod datasources;
pub mod error;
pub mod groups;
pub mod ids;
pub mod pagination;
pub mod permissions;
pub mod projects;
pub mod publish;
pub mod session;
pub mod sites;
pub mod transport;
pub mod types;
pub mod users;
pub mod virtual_connections;
pub mod workbooks;

// Re-export main types at crate root
pub use client::Client;
pub use datasources::{Datasource, DatasourcePublish};
pub use error::{Error, ErrorCategory, Result, is_not_found};
pub use groups::{Group, GroupImport, GroupUserId};
pub use ids::{GrantId, PermissionSetId};
pub use pagination::{PageInfo, PaginationDetails};
pub use permissions::{
    DATASOURCE_CAPABILITIES, DEFAULT_CAPABILITIES, DefaultTarget, PROJECT_CAPABILITIES,
    PermissionTarget, PermissionsStore, VIEW_CAPABILITIES, VIRTUAL_CONNECTION_CAPABILITIES,
    WORKBOOK_CAPABILITIES,
};
pub use projects::Project;
pub use session::{Credentials, Session, SiteRef, sign_in};
pub use sites::Site;
pub use transport::{HttpTransport, Method, MockTransport, Request, Scope, Transport};
pub use types::{Location, Reference, Tag, Tags};
pub use users::User;
pub use virtual_connections::{
    VirtualConnection, VirtualConnectionConnection, VirtualConnectionRevision,
};
pub use workbooks::{Revision, Workbook, WorkbookConnection, WorkbookPublish, WorkbookUpdate};
