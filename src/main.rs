/// Version injected at compile time via KONNECT_SYNC_VERSION env var (set by CI/CD),
/// or "dev" for local builds.
pub const VERSION: &str = match option_env!("KONNECT_SYNC_VERSION") {
    Some(v) => v,
    None => "dev",
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use konnect_sync::config::Config;
use konnect_sync::konnect::auth::KonnectCredentials;
use konnect_sync::konnect::client::{format_konnect_error, region_base_url, KonnectClient};
use konnect_sync::resource::{dispatch, registry, CrudEngine, ResourceKind};
use konnect_sync::sync::{self, Manifest, State};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;

/// Keep declared Kong Konnect resources in sync
#[derive(Parser, Debug)]
#[command(name = "konnect-sync", version, about, long_about = None)]
struct Args {
    /// Manifest declaring the resources
    #[arg(short, long, default_value = "konnect.yaml")]
    manifest: PathBuf,

    /// State file (defaults to the configured path)
    #[arg(short, long)]
    state: Option<PathBuf>,

    /// Access token (defaults to KONNECT_TOKEN)
    #[arg(long)]
    token: Option<String>,

    /// Konnect region
    #[arg(long)]
    region: Option<String>,

    /// API base URL, overrides the region
    #[arg(long)]
    base_url: Option<String>,

    /// Default runtime group id
    #[arg(short = 'g', long)]
    runtime_group: Option<String>,

    /// Log level for debugging
    #[arg(long, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create, update and delete remote entities to match the manifest
    Apply,
    /// Re-read every tracked entity and drop those deleted remotely
    Refresh,
    /// Delete every tracked entity
    Destroy,
    /// Track an existing entity by its `runtime_group::id` identifier
    Import {
        kind: ResourceKind,
        name: String,
        id: String,
    },
    /// List remote entities of a kind in the runtime group
    List { kind: ResourceKind },
    /// Show the supported resource kinds
    Kinds,
    /// Persist defaults to the config file
    Configure {
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        runtime_group: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_tracing_level(self) -> Option<Level> {
        match self {
            LogLevel::Off => None,
            LogLevel::Error => Some(Level::ERROR),
            LogLevel::Warn => Some(Level::WARN),
            LogLevel::Info => Some(Level::INFO),
            LogLevel::Debug => Some(Level::DEBUG),
            LogLevel::Trace => Some(Level::TRACE),
        }
    }
}

fn setup_logging(level: LogLevel) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let tracing_level = level.to_tracing_level()?;

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Cannot open log file {:?}: {}", log_path, e);
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("konnect-sync {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Some(guard)
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("konnect-sync").join("konnect-sync.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".konnect-sync").join("konnect-sync.log");
    }
    PathBuf::from("konnect-sync.log")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level);

    if let Err(err) = run(args).await {
        tracing::error!("{:?}", err);
        eprintln!("Error: {:#}", err);
        eprintln!("{}", format_konnect_error(&err));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let mut config = Config::load();

    match &args.command {
        Command::Kinds => {
            for key in registry::get_all_resource_keys() {
                if let Some(def) = registry::get_resource(key) {
                    println!("{:<10} {}", def.kind, def.display_name);
                }
            }
            return Ok(());
        }
        Command::Configure {
            region,
            runtime_group,
        } => {
            if let Some(region) = region {
                config.set_region(region)?;
            }
            if let Some(rg) = runtime_group {
                config.set_runtime_group(rg)?;
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
            return Ok(());
        }
        _ => {}
    }

    let base_url = args
        .base_url
        .clone()
        .or_else(|| args.region.as_deref().map(region_base_url))
        .unwrap_or_else(|| config.effective_base_url());
    let runtime_group = args
        .runtime_group
        .clone()
        .or_else(|| config.effective_runtime_group());
    let state_path = args
        .state
        .clone()
        .unwrap_or_else(|| config.effective_state_path());

    tracing::info!("Using {} (state: {:?})", base_url, state_path);

    let credentials = KonnectCredentials::resolve(args.token.as_deref());
    if credentials.is_none() {
        tracing::warn!("No access token configured, requests will fail");
    }
    let client = KonnectClient::new(&base_url, credentials, Some(config.timeout()))
        .context("Failed to create Konnect client")?;
    let engine = CrudEngine::new(client);

    match args.command {
        Command::Apply => {
            let manifest = Manifest::load(&args.manifest)?;
            let mut state = State::load(&state_path)?;
            let result = sync::apply(&engine, &manifest, &mut state, runtime_group.as_deref()).await;
            state.save(&state_path)?;
            println!("Apply complete: {}", result?);
        }
        Command::Refresh => {
            let mut state = State::load(&state_path)?;
            let result = sync::refresh(&engine, &mut state).await;
            state.save(&state_path)?;
            println!("Refresh complete: {}", result?);
        }
        Command::Destroy => {
            let mut state = State::load(&state_path)?;
            let result = sync::destroy(&engine, &mut state).await;
            state.save(&state_path)?;
            println!("Destroy complete: {}", result?);
        }
        Command::Import { kind, name, id } => {
            let mut state = State::load(&state_path)?;
            sync::import(&engine, &mut state, kind, &name, &id).await?;
            state.save(&state_path)?;
            println!("Imported {} as {}/{}", id, kind, name);
        }
        Command::List { kind } => {
            let rg = runtime_group
                .context("No runtime group configured. Use --runtime-group or KONNECT_RUNTIME_GROUP_ID")?;
            let items = dispatch::list_values(&engine, kind, &rg).await?;
            let def = registry::resource_for_kind(kind)
                .with_context(|| format!("No display definition for {}", kind))?;
            print!("{}", registry::render_table(def, &items));
        }
        Command::Kinds | Command::Configure { .. } => {}
    }

    Ok(())
}
