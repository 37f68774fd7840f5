/// solscan-cli: run the analysis pipeline locally, without the HTTP service
///
/// Commands:
/// - analyze: analyze local contract files and print JSON or Markdown
/// - detectors: list the engine's detectors
/// - health: show engine and compiler versions
/// - detect-version: print the compiler version a file's pragma asks for
use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::debug;

use solscan::health::HealthChecker;
use solscan::logging::env_filter;
use solscan::report::markdown;
use solscan::toolchain::detect_version;
use solscan::{AnalysisRequest, Orchestrator, ServiceConfig, SourceFile};

#[derive(Parser)]
#[command(name = "solscan-cli")]
#[command(about = "Static analysis of Solidity contracts", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze contract files
    Analyze {
        /// Contract files (paths inside --base-dir keep their relative layout)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory file paths are made relative to
        #[arg(short, long, default_value = ".")]
        base_dir: PathBuf,

        /// Main contract file (defaults to the first .sol file)
        #[arg(short, long)]
        main: Option<String>,

        /// Compiler version (defaults to the main file's pragma)
        #[arg(short, long)]
        solc_version: Option<String>,

        /// Engine timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// List available detectors
    Detectors,

    /// Show tool versions
    Health,

    /// Print the compiler version a file's pragma requests
    DetectVersion {
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // warn+ to stderr unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .init();

    let config = ServiceConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Analyze {
            files,
            base_dir,
            main,
            solc_version,
            timeout,
            format,
        } => {
            let request = AnalysisRequest {
                files: read_sources(&base_dir, &files)?,
                main_file: main,
                compiler_version: solc_version,
            };
            analyze(&config, request, timeout, format).await
        }
        Commands::Detectors => {
            let orchestrator = Orchestrator::from_config(&config)?;
            let detectors = orchestrator.runner().list_detectors().await?;
            println!("{}", serde_json::to_string_pretty(&detectors)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Health => {
            let orchestrator = Orchestrator::from_config(&config)?;
            let report = HealthChecker::check(&orchestrator).await;
            eprintln!("{}", HealthChecker::status_message(&report));
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::DetectVersion { file } => {
            let source = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            println!("{}", detect_version(&source));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn analyze(
    config: &ServiceConfig,
    request: AnalysisRequest,
    timeout: Option<u64>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let orchestrator = Orchestrator::from_config(config)?;
    let timeout = timeout
        .map(Duration::from_secs)
        .unwrap_or_else(|| orchestrator.runner().default_timeout());

    let result = orchestrator.analyze_with_timeout(request, timeout).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Markdown => {
            print!("{}", markdown::render(&result));
            println!(
                "\n*Generated {}*",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S %Z")
            );
        }
    }

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

/// Read files into request sources, keyed by their path relative to `base_dir`
fn read_sources(base_dir: &Path, files: &[PathBuf]) -> Result<Vec<SourceFile>> {
    let base = base_dir
        .canonicalize()
        .with_context(|| format!("Base directory not found: {}", base_dir.display()))?;

    files
        .iter()
        .map(|file| {
            let absolute = if file.is_absolute() {
                file.clone()
            } else {
                base.join(file)
            };
            let absolute = absolute
                .canonicalize()
                .with_context(|| format!("File not found: {}", file.display()))?;
            let relative = absolute.strip_prefix(&base).with_context(|| {
                format!("{} is outside {}", file.display(), base.display())
            })?;

            let content = std::fs::read_to_string(&absolute)
                .with_context(|| format!("Failed to read {}", absolute.display()))?;
            let relative_path = relative.to_string_lossy().replace('\\', "/");
            debug!("Loaded {} ({} bytes)", relative_path, content.len());
            Ok(SourceFile::new(relative_path, content))
        })
        .collect()
}
