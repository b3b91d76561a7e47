//! Companion simulation harness.
//!
//! Runs a scripted list of `{emotion?, text}` steps through the personality
//! pipeline against an in-memory store and prints the resulting trait table.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Tracing filter (default: "info")
//! - `COMPANION_DIAGNOSTICS`, `COMPANION_CHARACTER`, `COMPANION_LANGUAGE`:
//!   configuration overrides
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin simulate -- steps.yaml
//! cargo run --bin simulate -- steps.json --config companion.yaml
//! ```

use anyhow::{bail, Context, Result};

use companion::events::PERSONALITY_UPDATED;
use companion::simulation::{load_steps, render_table, Simulation};
use companion::utilities::config::CompanionConfig;

const USAGE: &str = "usage: simulate <steps.(json|yaml)> [--config <file>]";

struct Args {
    steps: String,
    config: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut steps = None;
    let mut config = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                config = Some(args.next().context("--config needs a file argument")?);
            }
            "--help" | "-h" => {
                println!("{}", USAGE);
                std::process::exit(0);
            }
            other if other.starts_with('-') => bail!("unknown option '{}'\n{}", other, USAGE),
            other => {
                if steps.replace(other.to_string()).is_some() {
                    bail!("only one steps file may be given\n{}", USAGE);
                }
            }
        }
    }
    Ok(Args {
        steps: steps.context(USAGE)?,
        config,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;

    let config = match &args.config {
        Some(path) => CompanionConfig::from_path(path)
            .with_context(|| format!("failed to load config '{}'", path))?,
        None => CompanionConfig::default(),
    }
    .with_env_overrides();
    config.validate()?;

    let steps = load_steps(&args.steps)
        .with_context(|| format!("failed to load steps '{}'", args.steps))?;
    tracing::info!(
        "Running {} steps for '{}' (language: {})",
        steps.len(),
        config.default_character_id,
        config.language_hint
    );

    let bus = config.build_bus();
    let _updates = bus.subscribe(PERSONALITY_UPDATED, |payload| {
        tracing::debug!("personality:updated {}", payload);
    });
    let pipeline = config.build_pipeline(bus.clone())?;

    let rows = Simulation::new()
        .with_hint(config.language_hint)
        .run(&pipeline, &steps)
        .await;

    print!("{}", render_table(&rows));

    if bus.diagnostics_enabled() {
        tracing::info!("Recorded {} events", bus.diagnostics().len());
    }
    Ok(())
}
