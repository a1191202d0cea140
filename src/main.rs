use clap::{Parser, Subcommand, builder::styling};
use elflow::cli;
use eyre::Result;
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::time::Duration;

// CLI Styling
const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::BrightWhite.on_default())
    .usage(styling::AnsiColor::BrightWhite.on_default())
    .literal(styling::AnsiColor::Green.on_default())
    .placeholder(styling::AnsiColor::Cyan.on_default());

/// elflow: pair a source with a destination and stream records between them
#[derive(Parser)]
#[command(name = "elflow", version, styles = STYLES)]
struct Cli {
    /// The dotenv file to source settings from
    #[arg(short, long, global = true, default_value = ".env")]
    env: String,

    /// More verbose logging
    #[arg(long, global = true)]
    debug: bool,

    /// Command to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on [env: PORT, default: 8080]
        #[arg(short, long)]
        port: Option<u16>,

        /// YAML manifest of pipelines to create at start-up [env: ELFLOW_PIPELINES]
        #[arg(long)]
        pipelines: Option<PathBuf>,

        /// Cancel runs that take longer than this many seconds [env: ELFLOW_RUN_TIMEOUT_SECS]
        #[arg(long)]
        run_timeout: Option<u64>,
    },

    /// List the available connectors
    Connectors,

    /// Run one pipeline from a manifest and print the result
    Run {
        /// YAML manifest containing the pipeline
        manifest: PathBuf,

        /// Name of the pipeline to run
        name: String,

        /// Cancel the run after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Check every pipeline in a manifest against the connector registry
    Validate {
        /// YAML manifest to check
        #[arg(default_value = "pipelines.yml")]
        manifest: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = dotenvy::from_filename(&cli.env) {
        if !e.not_found() {
            return Err(e.into());
        }
    }

    let log_level = match cli.debug {
        true => "debug",
        false => "info",
    };
    let env = env_logger::Env::default().filter_or("LOG_LEVEL", log_level);
    env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .init();

    match cli.command {
        Commands::Serve {
            port,
            pipelines,
            run_timeout,
        } => {
            let config = cli::load_server_config(port, run_timeout, pipelines)?;
            cli::serve(config).await?;
        }
        Commands::Connectors => {
            cli::print_connectors();
        }
        Commands::Run {
            manifest,
            name,
            timeout,
        } => {
            log::info!(
                "Running {} from {}",
                name.cyan(),
                manifest.display().bright_black()
            );
            let result =
                cli::run_from_manifest(&manifest, &name, timeout.map(Duration::from_secs)).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_success() {
                eyre::bail!("Pipeline '{}' failed: {}", name, result.error);
            }
            log::info!("✓ Loaded {} record(s)", result.records);
        }
        Commands::Validate { manifest } => {
            let rejected = cli::validate_manifest(&manifest)?;
            if rejected > 0 {
                eyre::bail!("{} pipeline(s) in {} are invalid", rejected, manifest.display());
            }
        }
    }

    Ok(())
}
