//! Evaluates a launch payload against a governance configuration and prints
//! the decision as JSON.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use launch_gate::config::GateConfig;
use launch_gate::telemetry::{init_tracing, record_decision};
use launch_gate::{LaunchContext, LaunchRequest};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "launch-check", about = "Check a job launch against governance rules")]
struct Args {
    /// Governance configuration (JSON).
    #[arg(short, long)]
    config: PathBuf,

    /// Launch payload (JSON); read from stdin when omitted.
    #[arg(short = 'x', long)]
    context: Option<PathBuf>,

    /// Job template name, used for log correlation.
    #[arg(short, long)]
    template: Option<String>,

    /// Pretty-print the decision.
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let config = GateConfig::load(&args.config)?;
    init_tracing(&config.telemetry)?;

    let engine = config.build_engine()?;
    info!(config = %args.config.display(), mode = ?config.engine.mode, "engine ready");

    let payload = match &args.context {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read launch payload {}", path.display()))?,
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("failed to read launch payload from stdin")?;
            buffer
        }
    };
    let context = LaunchContext::from_json_str(&payload).context("invalid launch payload")?;

    let mut request = LaunchRequest::new(context);
    if let Some(template) = args.template {
        request = request.with_template(template);
    }

    let decision = engine.decide(&request).await?;
    record_decision(request.id(), &decision);

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&decision)?
    } else {
        serde_json::to_string(&decision)?
    };
    println!("{rendered}");

    Ok(if decision.is_allowed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
