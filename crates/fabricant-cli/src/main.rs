//! Fabricant CLI
//!
//! Validate transactions against a guard configuration and query the risk
//! oracle from the command line.

mod config;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use config::FabricantConfig;
use fabricant_core::Transaction;
use fabricant_guard::{Executor, ExecutionOutcome, Guard, BUILTIN_PATTERNS};
use fabricant_pulsar::{RiskMetrics, RiskOracleConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "fabricant")]
#[command(version)]
#[command(about = "Fabricant - transaction guard for token-program operations", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a transaction and report the verdict
    Check {
        /// Transaction file (JSON)
        #[arg(short, long)]
        tx: PathBuf,

        /// Configuration file path
        #[arg(short, long, default_value = "fabricant.toml")]
        config: PathBuf,

        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },

    /// List built-in patterns
    Patterns,

    /// Look up risk metrics for one or more assets
    Risk {
        /// Asset addresses
        #[arg(required = true)]
        assets: Vec<String>,

        /// Risk oracle base URL
        #[arg(long, env = "FABRICANT_ORACLE_ENDPOINT")]
        endpoint: Option<String>,

        /// Configuration file path
        #[arg(short, long, default_value = "fabricant.toml")]
        config: PathBuf,
    },
}

fn init_logging(verbose: bool, format: LogFormat) {
    let env_filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    match format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    match cli.command {
        Commands::Check { tx, config, json } => check(tx, config, json).await,
        Commands::Patterns => {
            print_patterns();
            Ok(ExitCode::SUCCESS)
        }
        Commands::Risk {
            assets,
            endpoint,
            config,
        } => risk(assets, endpoint, config).await,
    }
}

async fn check(tx_path: PathBuf, config_path: PathBuf, json: bool) -> anyhow::Result<ExitCode> {
    let config = FabricantConfig::load_or_default(&config_path)?;
    let network = config.network()?;
    let guard_config = config.guard_config()?;

    let content = std::fs::read_to_string(&tx_path)
        .with_context(|| format!("reading transaction {}", tx_path.display()))?;
    let transaction = Transaction::from_json(&content)?;

    tracing::info!(
        tx = %transaction.id,
        %network,
        mode = %guard_config.mode,
        tolerance = %guard_config.risk_tolerance,
        "checking transaction"
    );

    let risk = guard_config.active_risk().cloned();
    let mut executor = Executor::new(Arc::new(Guard::try_new(guard_config)?));
    if let Some(risk) = risk {
        executor = executor.with_oracle(Arc::new(config.oracle.build(&risk)));
    }

    let outcome = executor.execute(&transaction).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }

    Ok(if outcome.is_executed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(2)
    })
}

fn print_outcome(outcome: &ExecutionOutcome) {
    println!("Transaction: {}", outcome.transaction.id);
    println!("Status:      {}", outcome.transaction.status);
    println!("Verdict:     {}", outcome.validation.summary());

    if !outcome.validation.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for warning in &outcome.validation.warnings {
            println!("  {}", warning);
        }
    }

    if let Some(risk) = &outcome.risk {
        println!();
        println!("Risk ({} assets checked):", risk.assets_checked);
        for finding in &risk.findings {
            let tag = if finding.is_blocking() { "block" } else { "note" };
            println!("  [{}] {}", tag, finding);
        }
    }

    if let Some(reason) = &outcome.failure {
        println!();
        println!("Failed: {}", reason);
    }
}

fn print_patterns() {
    println!("{:<7} {:<16} {:<9} DESCRIPTION", "CODE", "PATTERN", "SEVERITY");
    for pattern in BUILTIN_PATTERNS.iter() {
        println!(
            "{:<7} {:<16} {:<9} {}",
            pattern.code(),
            pattern.title(),
            pattern.default_severity().to_string(),
            pattern.description()
        );
    }
}

async fn risk(
    assets: Vec<String>,
    endpoint: Option<String>,
    config_path: PathBuf,
) -> anyhow::Result<ExitCode> {
    let mut config = FabricantConfig::load_or_default(&config_path)?;
    if endpoint.is_some() {
        config.oracle.endpoint = endpoint;
    }

    let risk_config = config.guard.risk.clone().unwrap_or_else(|| RiskOracleConfig {
        enabled: true,
        ..RiskOracleConfig::default()
    });
    let oracle = config.oracle.build(&risk_config);

    let metrics = oracle.get_batch_risk_metrics(&assets).await?;
    for asset in &assets {
        if let Some(m) = metrics.get(asset) {
            print_metrics(m);
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_metrics(metrics: &RiskMetrics) {
    fn show(value: Option<f64>) -> String {
        value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
    }

    println!("{}", metrics.asset);
    println!("  risk score:        {}", show(metrics.risk_score));
    println!(
        "  compliance:        {}",
        metrics
            .compliance_status
            .map_or_else(|| "-".to_string(), |c| c.to_string())
    );
    println!("  counterparty risk: {}", show(metrics.counterparty_risk));
    println!("  oracle integrity:  {}", show(metrics.oracle_integrity));
}
