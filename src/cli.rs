//! CLI helper functions

use crate::{
    connectors::Registry,
    error::Error,
    etl::{Engine, PipelineStore, RunResult},
    server::{self, DEFAULT_PORT, ServerConfig},
    storage::PipelinesManifest,
};
use eyre::{Context, Result};
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Load server configuration from the environment, letting flags override it
///
/// Environment variables:
/// - PORT: Listening port (optional, defaults to 8080)
/// - ELFLOW_RUN_TIMEOUT_SECS: Per-run timeout in seconds (optional, no timeout if unset)
/// - ELFLOW_PIPELINES: Manifest to seed pipelines from (optional)
pub fn load_server_config(
    port: Option<u16>,
    run_timeout_secs: Option<u64>,
    pipelines: Option<PathBuf>,
) -> Result<ServerConfig> {
    let port = match port {
        Some(port) => port,
        None => match std::env::var("PORT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("Invalid PORT: {}", value))?,
            Err(_) => DEFAULT_PORT,
        },
    };

    let run_timeout_secs = match run_timeout_secs {
        Some(secs) => Some(secs),
        None => match std::env::var("ELFLOW_RUN_TIMEOUT_SECS") {
            Ok(value) => Some(
                value
                    .parse()
                    .with_context(|| format!("Invalid ELFLOW_RUN_TIMEOUT_SECS: {}", value))?,
            ),
            Err(_) => None,
        },
    };

    let pipelines = pipelines.or_else(|| std::env::var_os("ELFLOW_PIPELINES").map(PathBuf::from));

    Ok(ServerConfig {
        port,
        run_timeout: run_timeout_secs.map(Duration::from_secs),
        pipelines,
    })
}

/// Engine over the built-in registry and an empty store
pub fn build_engine() -> Engine {
    Engine::new(Arc::new(Registry::builtin()), Arc::new(PipelineStore::new()))
}

/// Outcome of creating every pipeline in a manifest
#[derive(Debug, Default)]
pub struct SeedReport {
    pub created: Vec<String>,
    pub rejected: Vec<(String, Error)>,
}

/// Create every pipeline listed in a manifest
///
/// Rejected definitions are collected, not fatal.
pub fn seed_pipelines(engine: &Engine, path: impl AsRef<Path>) -> Result<SeedReport> {
    let path = path.as_ref();
    let manifest = PipelinesManifest::read(path)?;
    log::info!(
        "Seeding {} pipeline(s) from {}",
        manifest.count(),
        path.display()
    );

    let mut report = SeedReport::default();
    for definition in manifest.pipelines {
        let name = definition.name.clone();
        match engine.create(definition) {
            Ok(()) => report.created.push(name),
            Err(err) => report.rejected.push((name, err)),
        }
    }
    Ok(report)
}

/// Start the HTTP server
pub async fn serve(config: ServerConfig) -> Result<()> {
    let engine = build_engine();

    if let Some(path) = &config.pipelines {
        let report = seed_pipelines(&engine, path)?;
        log::info!(
            "Seeded {} pipeline(s), rejected {}",
            report.created.len(),
            report.rejected.len()
        );
    }

    server::serve(Arc::new(engine), &config).await
}

/// Print every built-in connector
pub fn print_connectors() {
    let registry = Registry::builtin();
    for descriptor in registry.available() {
        println!(
            "{:<12} {:<10} parallel={} ddl={}  {}",
            descriptor.name.green(),
            descriptor.kind.cyan(),
            descriptor.max_parallelism,
            descriptor.supports_schema_change,
            descriptor.description.bright_black()
        );
    }
}

/// Create every pipeline in a manifest and report each outcome
///
/// Returns the number of rejected pipelines.
pub fn validate_manifest(path: impl AsRef<Path>) -> Result<usize> {
    let engine = build_engine();
    let report = seed_pipelines(&engine, path)?;

    for name in &report.created {
        println!("{} {}", "✓".green(), name);
    }
    for (name, err) in &report.rejected {
        println!("{} {}: {}", "✗".red(), name, err);
    }

    Ok(report.rejected.len())
}

/// Run one pipeline from a manifest in-process
///
/// Ctrl-C and the optional timeout both cancel the run; the result is
/// returned either way.
pub async fn run_from_manifest(
    path: impl AsRef<Path>,
    name: &str,
    timeout: Option<Duration>,
) -> Result<RunResult> {
    let path = path.as_ref();
    let engine = build_engine();
    let report = seed_pipelines(&engine, path)?;
    if let Some((_, err)) = report.rejected.iter().find(|(rejected, _)| rejected == name) {
        eyre::bail!("Pipeline '{}' in {} is invalid: {}", name, path.display(), err);
    }

    let cancel = CancellationToken::new();
    let _done = cancel.clone().drop_guard();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            let deadline = async {
                match timeout {
                    Some(timeout) => tokio::time::sleep(timeout).await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::signal::ctrl_c() => {
                    log::warn!("Interrupted, cancelling run");
                    cancel.cancel();
                }
                _ = deadline => {
                    log::warn!("Run timed out");
                    cancel.cancel();
                }
            }
        });
    }

    Ok(engine.run(&cancel, name).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        // SAFETY: tests touching the environment are serialized
        unsafe {
            std::env::remove_var("PORT");
            std::env::remove_var("ELFLOW_RUN_TIMEOUT_SECS");
            std::env::remove_var("ELFLOW_PIPELINES");
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let config = load_server_config(None, None, None).unwrap();
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    #[serial]
    fn test_env_values_used() {
        clear_env();
        unsafe {
            std::env::set_var("PORT", "9090");
            std::env::set_var("ELFLOW_RUN_TIMEOUT_SECS", "30");
            std::env::set_var("ELFLOW_PIPELINES", "pipelines.yml");
        }
        let config = load_server_config(None, None, None).unwrap();
        clear_env();

        assert_eq!(config.port, 9090);
        assert_eq!(config.run_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.pipelines, Some(PathBuf::from("pipelines.yml")));
    }

    #[test]
    #[serial]
    fn test_flags_override_env() {
        clear_env();
        unsafe {
            std::env::set_var("PORT", "9090");
        }
        let config = load_server_config(Some(7000), Some(5), None).unwrap();
        clear_env();

        assert_eq!(config.port, 7000);
        assert_eq!(config.run_timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_an_error() {
        clear_env();
        unsafe {
            std::env::set_var("PORT", "not-a-port");
        }
        let result = load_server_config(None, None, None);
        clear_env();

        assert!(result.is_err());
    }
}
