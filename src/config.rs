//! Provider configuration
//!
//! Settings are layered: command-line flag, then `TABLEAU_*` environment
//! variable (both resolved by clap), then the TOML provider file. The file is
//! `--config <FILE>` when given, otherwise `~/.config/tableau-provider/config.toml`
//! if it exists.

use crate::cli::ProviderArgs;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tableau::{Client, Credentials, SiteRef};

/// Default provider file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tableau-provider").join("config.toml"))
}

// ============================================================================
// Provider Config
// ============================================================================

/// Raw provider settings; every field is optional until validated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub server_url: Option<String>,
    pub server_version: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub personal_access_token_name: Option<String>,
    pub personal_access_token_secret: Option<String>,
    /// Site content URL; empty means the default site
    pub site: Option<String>,
}

/// Validated settings, ready to sign in with
#[derive(Debug, Clone)]
pub struct Settings {
    pub server_url: String,
    pub server_version: String,
    pub credentials: Credentials,
}

impl ProviderConfig {
    /// Settings given as flags or environment variables
    pub fn from_args(args: &ProviderArgs) -> Self {
        Self {
            server_url: args.server_url.clone(),
            server_version: args.server_version.clone(),
            username: args.username.clone(),
            password: args.password.clone(),
            personal_access_token_name: args.token_name.clone(),
            personal_access_token_secret: args.token_secret.clone(),
            site: args.site.clone(),
        }
    }

    /// Load a TOML provider file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Invalid provider config: {}", path.display()))
    }

    /// Fill unset (or empty) fields from `fallback`
    pub fn or(self, fallback: Self) -> Self {
        fn pick(value: Option<String>, fallback: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty()).or(fallback)
        }
        Self {
            server_url: pick(self.server_url, fallback.server_url),
            server_version: pick(self.server_version, fallback.server_version),
            username: pick(self.username, fallback.username),
            password: pick(self.password, fallback.password),
            personal_access_token_name: pick(
                self.personal_access_token_name,
                fallback.personal_access_token_name,
            ),
            personal_access_token_secret: pick(
                self.personal_access_token_secret,
                fallback.personal_access_token_secret,
            ),
            site: pick(self.site, fallback.site),
        }
    }

    /// Layer flags/env over the provider file
    pub fn resolve(args: &ProviderArgs) -> Result<Self> {
        let from_args = Self::from_args(args);
        let file = match &args.config {
            Some(path) => Self::load(path)?,
            None => match default_config_path().filter(|p| p.exists()) {
                Some(path) => {
                    log::debug!("Using provider config {}", path.display());
                    Self::load(&path)?
                }
                None => Self::default(),
            },
        };
        Ok(from_args.or(file))
    }

    /// Check required settings, reporting every problem at once
    pub fn validate(self) -> Result<Settings> {
        fn set(value: &Option<String>) -> bool {
            value.as_deref().is_some_and(|v| !v.is_empty())
        }

        let mut problems = Vec::new();
        if !set(&self.server_url) {
            problems.push(
                "Missing Tableau Server URL: Tableau Server URL must be provided in order to establish a connection",
            );
        }
        if !set(&self.server_version) {
            problems.push(
                "Missing Tableau Server version: Tableau Server Version must be provided in order to establish a connection, currently no default is set",
            );
        }
        if !set(&self.username) && !set(&self.personal_access_token_name) {
            problems.push(
                "Missing Tableau Username: Tableau Username or Personal Access Token Name must be provided in order to establish a connection",
            );
        }
        if !set(&self.password) && !set(&self.personal_access_token_secret) {
            problems.push(
                "Missing Tableau Password: Tableau Password or Personal Access Token Secret must be provided in order to establish a connection",
            );
        }
        if !problems.is_empty() {
            bail!("{}", problems.join("\n"));
        }

        let non_empty = |v: Option<String>| v.filter(|v| !v.is_empty());
        Ok(Settings {
            server_url: self.server_url.unwrap_or_default(),
            server_version: self.server_version.unwrap_or_default(),
            credentials: Credentials {
                name: non_empty(self.username),
                password: non_empty(self.password),
                token_name: non_empty(self.personal_access_token_name),
                token_secret: non_empty(self.personal_access_token_secret),
                site: SiteRef {
                    content_url: self.site.unwrap_or_default(),
                },
            },
        })
    }
}

impl Settings {
    /// Sign in and return a site-scoped client
    pub fn connect(&self) -> Result<Client> {
        log::info!("Configuring Tableau client for {}", self.server_url);
        Client::connect(&self.server_url, &self.server_version, &self.credentials)
            .context("Unable to Create Tableau API Client")
    }
}

// ============================================================================
// Tests
// ============================================================================
