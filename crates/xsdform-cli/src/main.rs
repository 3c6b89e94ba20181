use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;
mod util;

#[derive(Parser)]
#[command(
    name = "xsdform",
    version,
    about = "Compile XSD to JSON Schema and build form instance models"
)]
struct Cli {
    /// Path to Xsdform.toml (searched upward from the working directory when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile an XSD file to a JSON Schema document
    Compile(commands::compile::Args),
    /// Build the instance model of an XSD or JSON Schema file
    InstanceModel(commands::instance_model::Args),
    /// Compile and generate every file of the targets in Xsdform.toml
    Check(commands::check::Args),
}

fn init_logging(verbose: u8) {
    let level = if verbose > 0 {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("xsdform={level}"))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match util::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => util::fail(format!("{e:#}")),
    };

    match cli.command {
        Commands::Compile(args) => commands::compile::run(args, &config),
        Commands::InstanceModel(args) => commands::instance_model::run(args, &config),
        Commands::Check(args) => commands::check::run(args, &config),
    }
}
