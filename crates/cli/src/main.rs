use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    CompleteProfileArgs, DistrictsArgs, FieldArgs, GeocodeArgs, LocateArgs, MatchArgs,
};
use output::Response;

mod commands;
mod config;
mod interactive;
mod output;

#[derive(Parser)]
#[command(name = "bloodbridge")]
#[command(about = "Donor location resolution and profile completion", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: <config dir>/bloodbridge/bloodbridge.toml)
    #[arg(long, global = true, env = "BLOODBRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List states and union territories
    States,

    /// List or search the districts of a state
    Districts(DistrictsArgs),

    /// Match free-text address fields against the gazetteer
    Match(MatchArgs),

    /// Resolve the current position (or --lat/--lon) to state and district
    Locate(LocateArgs),

    /// Forward-geocode a free-text place
    Geocode(GeocodeArgs),

    /// Check profile fields without submitting
    Validate(FieldArgs),

    /// Complete (or with --update, edit) the donor profile
    #[command(name = "complete-profile")]
    CompleteProfile(CompleteProfileArgs),

    /// Fetch the stored donor profile
    Profile,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let started = Instant::now();
    let (mut response, config_path) = match config::load(cli.config.as_deref()) {
        Ok(loaded) => {
            let path = loaded.path.map(|p| p.display().to_string());
            let response = run(cli.command, &loaded.config)
                .await
                .unwrap_or_else(|err| Response::from_error(&err));
            (response, path)
        }
        Err(err) => (Response::from_error(&err), None),
    };
    response.meta.config_path = config_path;
    response.meta.duration_ms = Some(started.elapsed().as_millis() as u64);

    if let Some(error) = &response.error {
        log::error!("{}: {}", error.code, error.message);
    }
    println!("{}", serde_json::to_string_pretty(&response)?);
    if response.is_error() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Commands, config: &config::AppConfig) -> Result<Response> {
    match command {
        Commands::States => commands::states(),
        Commands::Districts(args) => commands::districts(args, config),
        Commands::Match(args) => commands::match_address(args, config),
        Commands::Locate(args) => commands::locate(args, config).await,
        Commands::Geocode(args) => commands::geocode(args, config).await,
        Commands::Validate(args) => commands::validate(args),
        Commands::CompleteProfile(args) => commands::complete_profile(args, config).await,
        Commands::Profile => commands::profile(config).await,
    }
}
