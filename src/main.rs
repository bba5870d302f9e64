//! Dashboards CLI
//!
//! - `dashboards serve` - Load the snapshot and serve the dashboard
//! - `dashboards summary` - Load the snapshot and print its summary as JSON
//! - `dashboards config` - Print or write the default config file
//!
//! # Configuration
//!
//! Settings come from `--config` (or the default search paths), then
//! environment variables, then command-line flags:
//! - `DATA_BUCKET`: Bucket holding the snapshots (required)
//! - `DASHBOARD`: customer, financial or sales
//! - `HOST` / `PORT`: Bind address (default: 0.0.0.0:8050)
//! - `STORAGE_EMULATOR_HOST`: Storage emulator to read from
//! - `DASHBOARDS_STORE_TOKEN`: Static bearer token (default: metadata server)
//! - `GCE_METADATA_HOST`: Metadata server to request tokens from
//! - `DASHBOARDS_LOCAL_ROOT`: Read snapshots from a local directory
//! - `RUST_LOG`: Log filter (default: configured level)

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashboards::app;
use dashboards::config::{generate_default_config, Config, LoggingConfig};
use dashboards::DashboardKind;

#[derive(Parser)]
#[command(name = "dashboards")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Read-only analytics dashboards over bucket snapshots")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Overrides shared by commands that load a snapshot
#[derive(clap::Args)]
pub struct DashboardArgs {
    /// Dashboard to serve
    #[arg(short, long, value_enum)]
    pub dashboard: Option<DashboardKind>,

    /// Bucket holding the snapshots
    #[arg(short, long)]
    pub bucket: Option<String>,

    /// Read snapshots from this directory instead of the object store
    #[arg(long)]
    pub local_root: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the snapshot and serve the dashboard
    Serve {
        #[command(flatten)]
        dashboard: DashboardArgs,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load the snapshot and print the computed summary as JSON
    Summary {
        #[command(flatten)]
        dashboard: DashboardArgs,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { dashboard, port } => {
            let (mut config, source) = load_config(cli.config.as_ref())?;
            apply_args(&mut config, dashboard);
            if let Some(port) = port {
                config.api.port = port;
            }
            init_tracing(&config.logging)?;
            log_config_source(source.as_deref());

            tracing::info!("Starting dashboards v{}", env!("CARGO_PKG_VERSION"));
            app::run(config).await?;
        }

        Commands::Summary { dashboard } => {
            let (mut config, source) = load_config(cli.config.as_ref())?;
            apply_args(&mut config, dashboard);
            init_tracing(&config.logging)?;
            log_config_source(source.as_deref());

            let ready = app::bootstrap(&config).await?;
            let json = serde_json::to_string_pretty(&ready.snapshot.summary)?;
            println!("{}", json);
        }

        Commands::Config { output } => {
            let content = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)
                        .with_context(|| format!("writing {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", content);
                }
            }
        }
    }

    Ok(())
}

/// Load the config and report which file it came from, if any
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<(Config, Option<PathBuf>)> {
    if let Some(path) = path {
        return Ok((Config::load_with_env(path)?, Some(path.clone())));
    }

    match Config::load_first(&Config::default_paths())? {
        Some((config, path)) => Ok((config, Some(path))),
        None => Ok((Config::from_env()?, None)),
    }
}

fn log_config_source(source: Option<&Path>) {
    match source {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }
}

fn apply_args(config: &mut Config, args: DashboardArgs) {
    if let Some(kind) = args.dashboard {
        config.dashboard.kind = kind;
    }
    if let Some(bucket) = args.bucket {
        config.store.bucket = Some(bucket);
    }
    if let Some(root) = args.local_root {
        config.store.local_root = Some(root);
    }
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("dashboards={},tower_http=info", logging.level).into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    let result = if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()
    };

    result.context("installing tracing subscriber")
}
