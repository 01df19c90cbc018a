//! mailscrub: scrubs the header block of `.eml` files.
//!
//! Reads one or more messages (or stdin with `-`), rewrites their headers
//! under the configured field policy and prints the result or writes it
//! to an output directory.

mod batch;

use std::{path::PathBuf, sync::Arc};

use anyhow::{bail, Context};
use clap::Parser;
use mailscrub_utils::{load_config, Config, HeaderScrubber, Preset, RemovableField};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::batch::{scrub_content, scrub_files, FileOutcome};

/// Command line arguments.
#[derive(Debug, Parser)]
#[command(name = "mailscrub", version, about = "Scrub email headers from .eml files")]
struct Args {
    /// Input `.eml` files, use `-` to read a single message from stdin.
    #[arg(required_unless_present = "list_fields")]
    inputs: Vec<PathBuf>,

    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Field policy preset (standard, minimal or custom).
    #[arg(short, long)]
    preset: Option<Preset>,

    /// Flag a field prefix for removal (e.g. "Cc:"), may be repeated.
    #[arg(long = "remove", value_name = "FIELD")]
    remove: Vec<String>,

    /// Clear the removal flag of a field prefix, may be repeated.
    #[arg(long = "keep", value_name = "FIELD")]
    keep: Vec<String>,

    /// Directory receiving `processed-<name>.eml` files, prints to stdout
    /// when omitted (messages separated by a blank line).
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Maximum number of files scrubbed concurrently.
    #[arg(long)]
    max_batch: Option<usize>,

    /// Print the known policy fields and exit.
    #[arg(long)]
    list_fields: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mailscrub=info,mailscrub_utils=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    if args.list_fields {
        for field in RemovableField::ALL {
            println!("{field}");
        }
        println!();
        for preset in Preset::ALL {
            println!(
                "{:<10}{} ({} fields)",
                preset.name().to_lowercase(),
                preset.description(),
                preset.policy().removed_fields().count()
            );
        }
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => {
            info!(path = %path.display(), "Loading configuration");
            load_config(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };
    if let Some(preset) = args.preset {
        config.scrub.preset = preset;
    }
    for key in &args.remove {
        config.scrub.fields.insert(key.clone(), true);
    }
    for key in &args.keep {
        config.scrub.fields.insert(key.clone(), false);
    }
    let limit = args.max_batch.unwrap_or(config.scrub.max_batch);

    info!(
        preset = config.scrub.preset.name(),
        overrides = config.scrub.fields.len(),
        "Using field policy"
    );
    let scrubber = Arc::new(HeaderScrubber::from_config(&config.scrub));

    if args.inputs.iter().any(|input| input.as_os_str() == "-") {
        if args.inputs.len() > 1 {
            bail!("stdin (-) cannot be combined with other inputs");
        }
        return scrub_stdin(scrubber).await;
    }

    let outcomes = scrub_files(scrubber, args.inputs, args.output_dir.clone(), limit).await;
    let failed = outcomes
        .iter()
        .filter(|outcome| outcome.result.is_err())
        .count();

    if args.output_dir.is_none() {
        let mut stdout = tokio::io::stdout();
        stdout
            .write_all(render_outputs(&outcomes).as_bytes())
            .await?;
        stdout.flush().await?;
    }

    if failed > 0 {
        warn!(failed, total = outcomes.len(), "Some emails were not scrubbed");
        bail!("{failed} of {} inputs failed", outcomes.len());
    }
    Ok(())
}

/// Joins the scrubbed messages for stdout, each exactly as scrubbed and
/// separated by a single newline.
fn render_outputs(outcomes: &[FileOutcome]) -> String {
    outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().ok())
        .map(|file| file.report.output.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

async fn scrub_stdin(scrubber: Arc<HeaderScrubber>) -> anyhow::Result<()> {
    let mut content = String::new();
    tokio::io::stdin()
        .read_to_string(&mut content)
        .await
        .context("reading stdin")?;
    let report = scrub_content(scrubber, &PathBuf::from("-"), content).await?;
    info!(stats = %report, "Scrubbed email");

    let mut stdout = tokio::io::stdout();
    stdout.write_all(report.output.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
