//! create / read / update / delete / import against a state file

use super::{print_json, read_json};
use crate::Context;
use crate::resource::{Operation, ResourceKind};
use crate::state::StateDocument;
use crate::ui;
use anyhow::{Context as _, Result};
use serde_json::Value;
use std::path::Path;
use tableau::Client;

fn expect_state(kind: ResourceKind, result: Option<Value>) -> Result<Value> {
    result.with_context(|| format!("{kind} returned no state"))
}

pub fn create(ctx: &Context, client: &Client, kind: ResourceKind, input: &Path, state_path: &Path) -> Result<()> {
    let plan = read_json(input)?;
    let attributes = expect_state(kind, kind.apply(client, Operation::Create { plan })?)?;

    let mut state = StateDocument::new(kind, attributes)?;
    state.touch();
    state.save(state_path)?;

    if !ctx.quiet {
        ui::success(&format!("Created {kind} {}", state.id));
    }
    print_json(&state)
}

pub fn read(ctx: &Context, client: &Client, state_path: &Path) -> Result<()> {
    let state = StateDocument::load(state_path)?;
    let kind = state.kind;
    let id = state.id.clone();

    match kind.apply(client, Operation::Read { state: state.attributes.clone() })? {
        Some(attributes) => {
            let state = state.with_attributes(attributes)?;
            state.save(state_path)?;
            if ctx.verbose > 0 {
                ui::info(&format!("Refreshed {kind} {id}"));
            }
            print_json(&state)
        }
        None => {
            StateDocument::remove(state_path)?;
            if !ctx.quiet {
                ui::warn(&format!(
                    "{kind} {id} no longer exists; removed {}",
                    state_path.display()
                ));
            }
            Ok(())
        }
    }
}

pub fn update(ctx: &Context, client: &Client, input: &Path, state_path: &Path) -> Result<()> {
    let state = StateDocument::load(state_path)?;
    let kind = state.kind;
    let plan = read_json(input)?;

    let operation = Operation::Update {
        state: state.attributes.clone(),
        plan,
    };
    let attributes = expect_state(kind, kind.apply(client, operation)?)?;

    let mut state = state.with_attributes(attributes)?;
    state.touch();
    state.save(state_path)?;

    if !ctx.quiet {
        ui::success(&format!("Updated {kind} {}", state.id));
    }
    print_json(&state)
}

pub fn delete(ctx: &Context, client: &Client, state_path: &Path) -> Result<()> {
    let state = StateDocument::load(state_path)?;
    let kind = state.kind;

    kind.apply(client, Operation::Delete { state: state.attributes })?;
    StateDocument::remove(state_path)?;

    if !ctx.quiet {
        ui::success(&format!("Deleted {kind} {}", state.id));
    }
    Ok(())
}

pub fn import(ctx: &Context, client: &Client, kind: ResourceKind, id: &str, state_path: &Path) -> Result<()> {
    let attributes = expect_state(kind, kind.apply(client, Operation::Import { id: id.to_string() })?)?;
    let state = StateDocument::new(kind, attributes)?;
    state.save(state_path)?;

    if !ctx.quiet {
        ui::success(&format!("Imported {kind} {}", state.id));
    }
    print_json(&state)
}
