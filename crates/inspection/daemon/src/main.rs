//! Inspection Daemon - container inspection record keeping service
//!
//! The daemon provides:
//! - REST API for inspections, evidence, catalogs and users
//! - Dashboards, summaries and CSV export
//! - Notifications and an SSE event stream

use anyhow::Context;
use clap::Parser;
use inspection_daemon::config::{BootstrapConfig, DaemonConfig, StorageConfig};
use inspection_daemon::Server;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Inspection Daemon CLI
#[derive(Parser)]
#[command(name = "inspectiond")]
#[command(about = "Inspection Daemon - container inspection records", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "INSPECTION_CONFIG")]
    config: Option<String>,

    /// Listen address
    #[arg(short, long, env = "INSPECTION_LISTEN_ADDR")]
    listen: Option<String>,

    /// PostgreSQL URL; in-memory storage when absent
    #[arg(long, env = "INSPECTION_DATABASE_URL")]
    database_url: Option<String>,

    /// Evidence root directory
    #[arg(long, env = "INSPECTION_EVIDENCE_DIR")]
    evidence_dir: Option<String>,

    /// Email of the first admin, created when no users exist
    #[arg(long, env = "INSPECTION_ADMIN_EMAIL")]
    admin_email: Option<String>,

    /// Name of the first admin
    #[arg(long, env = "INSPECTION_ADMIN_NAME", default_value = "Administrador")]
    admin_name: String,

    /// Log level
    #[arg(long, env = "INSPECTION_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "INSPECTION_LOG_JSON")]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config =
        DaemonConfig::load(cli.config.as_deref()).context("failed to load configuration")?;

    // Override with CLI args
    if let Some(listen) = &cli.listen {
        config.server.listen_addr = listen
            .parse()
            .with_context(|| format!("invalid listen address '{listen}'"))?;
    }
    if let Some(url) = cli.database_url {
        config.storage = StorageConfig::Postgres {
            url,
            max_connections: 10,
            connect_timeout_secs: 5,
        };
    }
    if let Some(dir) = cli.evidence_dir {
        config.evidence.root_dir = dir.into();
    }
    if let Some(email) = cli.admin_email {
        config.bootstrap = Some(BootstrapConfig {
            name: cli.admin_name,
            email,
        });
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;

    // Initialize tracing
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    let storage = match &config.storage {
        StorageConfig::Memory => "memory",
        StorageConfig::Postgres { .. } => "postgres",
    };

    // Print startup banner
    println!(
        r#"
  Container Inspection Service
  Version: {}
  Storage: {}
  Evidence: {}
  Listening: {}
"#,
        env!("CARGO_PKG_VERSION"),
        storage,
        config.evidence.root_dir.display(),
        config.server.listen_addr
    );

    // Create and run server
    let server = Server::new(config)
        .await
        .context("failed to start inspection daemon")?;
    server.run().await?;
    Ok(())
}
