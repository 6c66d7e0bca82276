//! Command implementations

pub mod data;
pub mod lifecycle;

use crate::cli::ProviderArgs;
use crate::config::ProviderConfig;
use anyhow::{Context as _, Result};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;
use tableau::Client;

/// Resolve provider settings and sign in
pub fn connect(args: &ProviderArgs) -> Result<Client> {
    ProviderConfig::resolve(args)?.validate()?.connect()
}

/// Read a JSON document from a file, or from stdin when `path` is `-`
pub fn read_json(path: &Path) -> Result<Value> {
    let content = if path.as_os_str() == "-" {
        let mut buf = String::new();
        io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read plan from stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?
    };
    serde_json::from_str(&content).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Print a JSON document on stdout
pub fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to serialize output")?
    );
    Ok(())
}
