mod cli;
mod commands;
mod config;
mod data_source;
mod resource;
mod state;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

fn run(ctx: &Context, cli: Cli) -> Result<()> {
    let provider = cli.provider;
    match cli.command {
        Command::Create { kind, input, state } => {
            let client = commands::connect(&provider)?;
            commands::lifecycle::create(ctx, &client, kind, &input, &state)
        }
        Command::Read { state } => {
            let client = commands::connect(&provider)?;
            commands::lifecycle::read(ctx, &client, &state)
        }
        Command::Update { input, state } => {
            let client = commands::connect(&provider)?;
            commands::lifecycle::update(ctx, &client, &input, &state)
        }
        Command::Delete { state } => {
            let client = commands::connect(&provider)?;
            commands::lifecycle::delete(ctx, &client, &state)
        }
        Command::Import { kind, id, state } => {
            let client = commands::connect(&provider)?;
            commands::lifecycle::import(ctx, &client, kind, &id, &state)
        }
        Command::Data { kind, args } => {
            let client = commands::connect(&provider)?;
            commands::data::data(ctx, &client, kind, args)
        }
        Command::Resources => commands::data::resources(ctx),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "tableau-provider", &mut io::stdout());
            Ok(())
        }
    }
}

/// Print the error chain, plus advice when a Tableau error sits in it
fn report(err: &anyhow::Error) {
    ui::error(&format!("{err:#}"));
    if let Some(cause) = err.chain().find_map(|c| c.downcast_ref::<tableau::Error>()) {
        let category = cause.category();
        ui::dim(&format!("{category}: {}", category.advice()));
    }
}
