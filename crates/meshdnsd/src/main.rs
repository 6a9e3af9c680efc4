//! meshdnsd — the meshdns daemon.
//!
//! Single binary that hosts the service directory:
//! - Service directory (registry store + derived records)
//! - Startup seeding from `[[services]]`
//! - REST admin and query API
//!
//! # Usage
//!
//! ```text
//! meshdnsd init-config meshdns.toml
//! meshdnsd serve --config meshdns.toml --port 8053
//! ```

mod config;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use meshdns_resolver::ServiceDirectory;

use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "meshdnsd", about = "meshdns service directory daemon")]
struct Cli {
    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Run the directory and serve the API.
    Serve {
        /// Path to meshdns.toml.
        #[arg(long, default_value = "meshdns.toml")]
        config: PathBuf,

        /// Port to listen on (overrides `[api] port`).
        #[arg(long)]
        port: Option<u16>,

        /// Zone suffix (overrides `[directory] zone_suffix`).
        #[arg(long)]
        zone: Option<String>,
    },
    /// Write a starter config file.
    InitConfig {
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match cli.command {
        Command::Serve { config, port, zone } => {
            let config = DaemonConfig::load(&config)?.with_port(port).with_zone(zone);
            run_serve(config).await
        }
        Command::InitConfig { path } => init_config(&path),
    }
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,meshdnsd=debug,meshdns_resolver=debug")
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, DaemonConfig::scaffold().to_toml_string()?)?;
    info!(path = %path.display(), "config written");
    Ok(())
}

/// Build the directory and register every seeded service. Any invalid
/// seed aborts startup.
fn build_directory(config: &DaemonConfig) -> anyhow::Result<ServiceDirectory> {
    config.validate()?;
    let directory = ServiceDirectory::new(config.directory.clone())?;

    for seed in &config.services {
        let record = directory
            .register_stateful_service(seed.clone())
            .with_context(|| format!("seeding service {}.{}", seed.name, seed.namespace))?;
        info!(service_id = %record.id, cluster = %record.cluster_name, "seeded");
    }
    Ok(directory)
}

async fn run_serve(config: DaemonConfig) -> anyhow::Result<()> {
    info!(zone = %config.directory.zone_suffix, "meshdns daemon starting");

    let directory = build_directory(&config)?;
    info!(services = config.services.len(), "service directory initialized");

    // ── Start API server ───────────────────────────────────────

    let router = meshdns_api::build_router(directory);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.api.port));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install CTRL+C handler");
            info!("shutdown signal received");
        })
        .await?;

    info!("meshdns daemon stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaffold_seeds_resolvable_service() {
        let directory = build_directory(&DaemonConfig::scaffold()).unwrap();
        let leader = directory.resolve_leader("db", "default").unwrap();
        assert_eq!(leader.ordinal, 0);
        assert_eq!(
            directory.resolve_address("leader.db.default.internal.mesh.local"),
            vec!["10.0.0.1".to_string()]
        );
    }

    #[test]
    fn invalid_seed_aborts() {
        let mut config = DaemonConfig::scaffold();
        config.services[0].namespace = "bad.ns".to_string();
        let err = build_directory(&config).unwrap_err();
        assert!(err.to_string().contains("seeding service db.bad.ns"));
    }

    #[test]
    fn zone_override_reaches_names() {
        let config = DaemonConfig::scaffold().with_zone(Some("corp.local.".to_string()));
        let directory = build_directory(&config).unwrap();
        assert_eq!(directory.resolve_address("db.default.svc.corp.local").len(), 2);
    }

    #[test]
    fn cli_parses_serve_flags() {
        let cli = Cli::parse_from([
            "meshdnsd",
            "serve",
            "--config",
            "/etc/meshdns.toml",
            "--port",
            "9000",
            "--log-format",
            "json",
        ]);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Command::Serve { config, port, zone } => {
                assert_eq!(config, PathBuf::from("/etc/meshdns.toml"));
                assert_eq!(port, Some(9000));
                assert!(zone.is_none());
            }
            Command::InitConfig { .. } => panic!("expected serve"),
        }
    }

    #[test]
    fn init_config_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meshdns.toml");
        init_config(&path).unwrap();
        assert!(DaemonConfig::from_file(&path).is_ok());
        assert!(init_config(&path).is_err());
    }
}
