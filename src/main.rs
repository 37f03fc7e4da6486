use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use futures::stream::{self, StreamExt};
use pinecone_provider::config::{Config, EnvCredentials, Overrides};
use pinecone_provider::pinecone::{format_api_error, ControlPlane};
use pinecone_provider::resource::{
    index_data_source_schema, index_resource_schema, provider_schema, Diagnostics,
    IndexDataSourceState, Severity,
};
use pinecone_provider::{driver, statefile, Provider, ProviderConfig, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// How many indexes `list --describe` looks up at once
const DESCRIBE_CONCURRENCY: usize = 4;

/// Manage Pinecone indexes declaratively
#[derive(Parser, Debug)]
#[command(name = "pinecone-provider", version = VERSION, about, long_about = None)]
struct Args {
    /// Pinecone environment (e.g. us-west1-gcp)
    #[arg(long, global = true)]
    environment: Option<String>,

    /// Pinecone API key
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Override the controller URL
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Seconds between readiness polls
    #[arg(long, global = true, default_value_t = 5)]
    poll_interval_secs: u64,

    /// Give up waiting for an index after this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Log level for debugging
    #[arg(long, global = true, value_enum, default_value = "off")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List index names
    List {
        /// Also look up every index
        #[arg(long)]
        describe: bool,
    },
    /// Look up a single index
    Describe { name: String },
    /// Converge an index towards a desired-state file
    Apply {
        /// Desired state (YAML or JSON)
        file: PathBuf,
        /// Tracked state file
        #[arg(long)]
        state: PathBuf,
    },
    /// Delete the tracked index
    Destroy {
        #[arg(long)]
        state: PathBuf,
    },
    /// Start tracking an existing index
    Import {
        name: String,
        #[arg(long)]
        state: PathBuf,
    },
    /// Print provider, resource and data source schemas
    Schema,
    /// Remember a default environment
    UseEnvironment { environment: String },
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

fn setup_logging(level: LogLevel) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let Some(tracing_level) = level.to_tracing_level() else {
        return Ok(None);
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {:?}", log_path))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    // RUST_LOG narrows per-module levels; --log-level caps the output
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(tracing_level.as_str().to_lowercase()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.with_max_level(tracing_level))
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("pinecone-provider {} started with log level: {:?}", VERSION, level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("pinecone-provider").join("pinecone-provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".pinecone-provider").join("pinecone-provider.log");
    }
    PathBuf::from("pinecone-provider.log")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    match &args.command {
        Command::Schema => {
            let schemas = serde_json::json!({
                "provider": provider_schema(),
                "resources": [index_resource_schema()],
                "data_sources": [index_data_source_schema()],
            });
            println!("{}", serde_json::to_string_pretty(&schemas)?);
            return Ok(ExitCode::SUCCESS);
        }
        Command::UseEnvironment { environment } => {
            Config::load().set_environment(environment)?;
            println!("Default environment set to {}", environment);
            return Ok(ExitCode::SUCCESS);
        }
        _ => {}
    }

    let overrides = Overrides {
        environment: args.environment.clone(),
        api_key: args.api_key.clone(),
        endpoint: args.endpoint.clone(),
        poll_interval: Some(Duration::from_secs(args.poll_interval_secs)),
        timeout: args.timeout_secs.map(Duration::from_secs),
    };
    let config = ProviderConfig::resolve(&overrides, &Config::load(), &EnvCredentials::from_process());

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl-C received; cancelling in-flight wait");
                cancel.cancel();
            }
        });
    }

    let mut provider = Provider::new(VERSION).with_cancellation(cancel);
    let mut diags = Diagnostics::new();
    provider.configure(&config, &mut diags);

    let result = if diags.has_error() {
        Ok(())
    } else {
        run(&provider, args.command, &mut diags).await
    };

    report(&diags);
    result?;

    // return rather than exit so the log guard flushes
    if diags.has_error() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn report(diags: &Diagnostics) {
    for diag in diags.iter() {
        match diag.severity {
            Severity::Error => tracing::error!("{}", diag),
            Severity::Warning => tracing::warn!("{}", diag),
        }
        eprintln!("{}", diag);
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(provider: &Provider, command: Command, diags: &mut Diagnostics) -> Result<()> {
    match command {
        Command::List { describe } => list(provider, describe, diags).await,
        Command::Describe { name } => {
            let Some(data_source) = provider.index_data_source(diags) else {
                return Ok(());
            };
            if let Some(found) = data_source.read(&name, diags).await {
                print_json(&found)?;
            }
            Ok(())
        }
        Command::Apply { file, state } => {
            let desired = statefile::load_desired(&file)?;
            let Some(resource) = provider.index_resource(diags) else {
                return Ok(());
            };
            let applied = driver::apply(&resource, &desired, &state, diags).await?;
            if let (Some(applied), false) = (applied, diags.has_error()) {
                print_json(&applied)?;
            }
            Ok(())
        }
        Command::Destroy { state } => {
            let Some(resource) = provider.index_resource(diags) else {
                return Ok(());
            };
            if let Some(destroyed) = driver::destroy(&resource, &state, diags).await? {
                println!("Index {} destroyed", destroyed.name);
            }
            Ok(())
        }
        Command::Import { name, state } => {
            let Some(resource) = provider.index_resource(diags) else {
                return Ok(());
            };
            if let Some(imported) = driver::import(&resource, &name, &state, diags).await? {
                print_json(&imported)?;
            }
            Ok(())
        }
        Command::Schema | Command::UseEnvironment { .. } => Ok(()),
    }
}

async fn list(provider: &Provider, describe: bool, diags: &mut Diagnostics) -> Result<()> {
    let Some(client) = provider.client(diags) else {
        return Ok(());
    };

    let names = match client.list_indexes().await {
        Ok(names) => names,
        Err(e) => {
            diags.add_error("Error listing indexes", format_api_error(&e));
            return Ok(());
        }
    };

    if !describe {
        for name in names {
            println!("{}", name);
        }
        return Ok(());
    }

    let Some(data_source) = provider.index_data_source(diags) else {
        return Ok(());
    };

    let results: Vec<(Option<IndexDataSourceState>, Diagnostics)> = stream::iter(names)
        .map(|name| {
            let data_source = &data_source;
            async move {
                let mut local = Diagnostics::new();
                let found = data_source.read(&name, &mut local).await;
                (found, local)
            }
        })
        .buffered(DESCRIBE_CONCURRENCY)
        .collect()
        .await;

    let mut found = Vec::with_capacity(results.len());
    for (state, local) in results {
        diags.extend(local);
        found.extend(state);
    }
    print_json(&found)
}
