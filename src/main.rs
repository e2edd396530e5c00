//! TradePulse command line entry point.
//!
//! # Usage
//! ```sh
//! tradepulse run --tickers AAPL,MSFT
//! tradepulse set-key sk-...
//! MODE=mock tradepulse run --sse
//! ```

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tradepulse::application::orchestrator::RunRequest;
use tradepulse::config::{Config, Mode, parse_tickers};
use tradepulse::domain::errors::RunError;
use tradepulse::domain::progress::ProgressReporter;
use tradepulse::infrastructure::ServiceFactory;
use tracing::{Level, info, warn};
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(author, version, about = "Daily market news summaries with Buy/Sell signals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch news and indicators, ask the model, save the report
    Run {
        /// Comma-separated tickers; overrides previous signals and defaults
        #[arg(short, long)]
        tickers: Option<String>,

        /// Print progress as server-sent-event frames
        #[arg(long)]
        sse: bool,
    },
    /// Validate and store the model API key
    SetKey {
        key: String,

        /// Store without calling the provider
        #[arg(long)]
        skip_validation: bool,
    },
    /// Check a key (or the configured one) against the provider
    ValidateKey { key: Option<String> },
    /// Print the last saved report
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    info!(
        "TradePulse {} (mode={:?}, data_dir={:?})",
        env!("CARGO_PKG_VERSION"),
        config.mode,
        config.pipeline.data_dir
    );

    match cli.command {
        Commands::Run { tickers, sse } => run(&config, tickers, sse).await,
        Commands::SetKey {
            key,
            skip_validation,
        } => set_key(&config, &key, skip_validation).await,
        Commands::ValidateKey { key } => validate_key(&config, key).await,
        Commands::Show => show(&config),
    }
}

async fn run(config: &Config, tickers: Option<String>, sse: bool) -> Result<()> {
    let api_key = ServiceFactory::credential_store(config, None).resolve();
    let orchestrator = ServiceFactory::create_orchestrator(config, api_key);

    let request = match tickers {
        Some(raw) => RunRequest::with_tickers(parse_tickers(&raw)),
        None => RunRequest::default(),
    };

    let (reporter, mut events) = ProgressReporter::channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if sse {
                print!("{}", event.sse_frame());
            } else {
                println!("[{:>3}%] {}", event.pct, event.message);
            }
        }
    });

    let outcome = orchestrator.run(request, &reporter).await;
    drop(reporter);
    if let Err(e) = printer.await {
        warn!("Progress printer stopped: {}", e);
    }

    match outcome {
        Ok(report) => {
            if !sse {
                println!("\n{}", report.markdown);
            }
            Ok(())
        }
        Err(RunError::Credential(e)) => {
            bail!("{}. Store one with `tradepulse set-key <KEY>` or set OPENAI_API_KEY.", e)
        }
        Err(e) => Err(e.into()),
    }
}

async fn set_key(config: &Config, key: &str, skip_validation: bool) -> Result<()> {
    if !skip_validation && config.mode == Mode::Live {
        ServiceFactory::create_chat_client(config, None)
            .validate_key(key)
            .await?;
    }

    let mut store = ServiceFactory::credential_store(config, None);
    store.save(key)?;
    println!("API key saved to {}", store.key_file().display());
    Ok(())
}

async fn validate_key(config: &Config, key: Option<String>) -> Result<()> {
    let key = match key {
        Some(key) => key,
        None => ServiceFactory::credential_store(config, None)
            .resolve()
            .context("No API key configured")?,
    };

    ServiceFactory::create_chat_client(config, None)
        .validate_key(&key)
        .await?;
    println!("OK");
    Ok(())
}

fn show(config: &Config) -> Result<()> {
    let store = ServiceFactory::report_store(config);
    let Some(report) = store.load()? else {
        println!("No report yet. Run `tradepulse run` first.");
        return Ok(());
    };

    println!("Generated at {}\n", report.timestamp);
    println!("{}\n", report.markdown);
    for signal in &report.signals.signals {
        println!("{:<6} {:<4} {}", signal.ticker, signal.action, signal.reason);
    }
    Ok(())
}
