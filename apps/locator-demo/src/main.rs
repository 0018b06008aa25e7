#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod overrides;
mod services;

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use service_locator::{BootstrapMode, LocatorConfig, ServiceLocator, ServiceRegistry};
use tracing_subscriber::EnvFilter;

use crate::services::{Greeter, Journal};

/// Service locator demo - resolves capabilities discovered at link time
#[derive(Parser)]
#[command(name = "locator-demo")]
#[command(about = "Service locator demo - resolves capabilities discovered at link time")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Abort on the first bootstrap failure (overrides config)
    #[arg(long)]
    strict: bool,

    /// Print effective configuration (JSON) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Greet someone and record it in the journal
    Greet {
        #[arg(default_value = "world")]
        name: String,
    },
    /// Print recorded journal entries
    Journal,
    /// List capability bindings
    Bindings,
    /// Bootstrap and report isolated failures
    Check,
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // defaults -> YAML (if provided) -> env (LOCATOR__*) -> CLI overrides
    let mut config = LocatorConfig::load(cli.config.as_deref())?;
    if cli.strict {
        config = config.with_mode(BootstrapMode::Strict);
    }

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(ExitCode::SUCCESS);
    }

    let locator = service_locator::install(ServiceLocator::from_inventory(config))
        .map_err(|_| anyhow::anyhow!("a process-wide locator is already installed"))?;
    tracing::info!(mode = ?locator.config().mode, "locator installed");

    let registry = service_locator::warm_up()?;

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Greet { name } => greet(&name)?,
        Commands::Journal => print_journal()?,
        Commands::Bindings => print_bindings(registry),
        Commands::Check => return Ok(check(registry)),
    }
    Ok(ExitCode::SUCCESS)
}

fn greet(name: &str) -> Result<()> {
    let greeter = service_locator::get::<dyn Greeter>()?.context("no Greeter is bound")?;
    let greeting = greeter.greet(name);
    println!("{greeting}");

    match service_locator::get::<dyn Journal>()? {
        Some(journal) => journal.append(&greeting)?,
        None => tracing::warn!("no Journal is bound, greeting not recorded"),
    }
    Ok(())
}

fn print_journal() -> Result<()> {
    let journal = service_locator::get::<dyn Journal>()?.context("no Journal is bound")?;
    for entry in journal.entries()? {
        println!("{entry}");
    }
    Ok(())
}

fn print_bindings(registry: &ServiceRegistry) {
    let mut bound = HashSet::new();
    for (capability, implementation) in registry.bindings() {
        bound.insert(*capability);
        println!("{:<16} -> {implementation}", capability.short_name());
    }
    for capability in registry.capabilities().filter(|capability| !bound.contains(*capability)) {
        println!("{:<16} -> (unbound)", capability.short_name());
    }
}

fn check(registry: &ServiceRegistry) -> ExitCode {
    let report = registry.report();
    if report.is_clean() {
        println!("bootstrap clean: {} capabilities bound", registry.len());
        return ExitCode::SUCCESS;
    }
    println!("bootstrap isolated {} failure(s):", report.failures().len());
    for failure in report.failures() {
        println!("  {failure}");
    }
    ExitCode::FAILURE
}
