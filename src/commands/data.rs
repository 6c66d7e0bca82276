//! Data source lookups and the resource catalog

use super::print_json;
use crate::Context;
use crate::data_source::{self, DataKind, LookupArgs};
use crate::resource::ResourceKind;
use crate::ui;
use anyhow::Result;
use clap::ValueEnum;
use tableau::Client;

pub fn data(ctx: &Context, client: &Client, kind: DataKind, args: Vec<(String, String)>) -> Result<()> {
    let args = LookupArgs::parse(kind, args)?;
    let value = data_source::lookup(kind, client, &args)?;
    if ctx.verbose > 0 {
        ui::info(&format!("Looked up {}", kind_name(kind)));
    }
    print_json(&value)
}

fn kind_name(kind: DataKind) -> String {
    kind.to_possible_value()
        .map(|v| v.get_name().to_string())
        .unwrap_or_default()
}

/// Print every resource type and data source
pub fn resources(ctx: &Context) -> Result<()> {
    if ctx.quiet {
        return Ok(());
    }

    ui::header("Resources");
    for kind in ResourceKind::value_variants() {
        ui::kv(kind.as_str(), kind.description());
    }

    ui::header("Data sources");
    for kind in DataKind::value_variants() {
        let usage = kind.usage();
        let usage = if usage.is_empty() { "(no arguments)".to_string() } else { usage };
        ui::kv(&kind_name(*kind), &usage);
    }
    Ok(())
}
