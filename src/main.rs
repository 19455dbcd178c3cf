use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hwcloud_provider::service::{get_all_service_keys, get_service, render_endpoint};
use hwcloud_provider::{Provider, ProviderConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Environment variable the host runtime uses for its log level
const ENV_TF_LOG: &str = "TF_LOG";

/// Configure the HuaweiCloud provider and inspect its service endpoints
#[derive(Parser, Debug)]
#[command(name = "hwcloud-provider", version, about, long_about = None)]
struct Args {
    /// Provider configuration file (JSON); environment variables fill unset fields
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Region to use instead of the configured one
    #[arg(short, long)]
    region: Option<String>,

    /// Log level for debugging (defaults to TF_LOG, or off)
    #[arg(long, value_enum)]
    log_level: Option<LogLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List catalog services and their endpoints in the configured region
    Services,
    /// Authenticate and print the resource base of each service
    Endpoint {
        /// Logical service names, e.g. `ecs` or `vpc`
        #[arg(required = true)]
        services: Vec<String>,
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
    fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

fn setup_logging(
    level: Option<LogLevel>,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = match level {
        Some(LogLevel::Off) => return Ok(None),
        Some(level) => EnvFilter::new(level.as_directive()),
        None => match std::env::var(ENV_TF_LOG) {
            Ok(value) if !value.is_empty() => EnvFilter::new(value.to_ascii_lowercase()),
            _ => return Ok(None),
        },
    };

    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!("hwcloud-provider {} started", env!("CARGO_PKG_VERSION"));
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

fn get_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("hwcloud-provider").join("provider.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".hwcloud-provider").join("provider.log");
    }
    PathBuf::from("hwcloud-provider.log")
}

fn load_config(args: &Args) -> Result<ProviderConfig> {
    let mut config = match &args.config {
        Some(path) => ProviderConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ProviderConfig::from_env(),
    };
    if let Some(region) = &args.region {
        config.region = region.clone();
    }
    Ok(config)
}

fn print_services(config: &ProviderConfig) {
    for key in get_all_service_keys() {
        let Some(entry) = get_service(key) else {
            continue;
        };
        let endpoint = render_endpoint(entry, &config.region, &config.cloud, config.region_client);
        let marker = if entry.admin { " (admin)" } else { "" };
        println!("{:<16} {}{}{}", key, endpoint, entry.version, marker);
    }
}

async fn print_endpoints(config: ProviderConfig, services: &[String]) -> Result<()> {
    let provider = Provider::configure(config)
        .await
        .context("Failed to configure provider")?;
    let region = provider.region().to_string();

    let results = futures::future::join_all(
        services
            .iter()
            .map(|service| provider.new_service_client(service, &region)),
    )
    .await;

    let mut failed = 0;
    for (service, result) in services.iter().zip(results) {
        match result {
            Ok(client) => println!("{:<16} {}", service, client.resource_base),
            Err(e) => {
                failed += 1;
                tracing::error!("Failed to build client for {}: {}", service, e);
                eprintln!("{:<16} error: {}", service, e);
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} services failed", failed, services.len());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let _log_guard = setup_logging(args.log_level)?;

    let config = load_config(&args)?;

    match &args.command {
        Command::Services => {
            if config.region.is_empty() {
                anyhow::bail!("No region configured. Set OS_REGION_NAME or use --region flag");
            }
            print_services(&config);
            Ok(())
        }
        Command::Endpoint { services } => print_endpoints(config, services).await,
    }
}
