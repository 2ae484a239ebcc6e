//! `posedrive-cli` – PoseDrive Command Line Interface
//!
//! Replays recorded pose samples through the translator and runs the
//! resulting commands:
//!
//! 1. Loads `~/.posedrive/config.toml`, writing the defaults on first run.
//! 2. Reads newline-delimited JSON samples from the path given as the first
//!    argument, the configured `source_path`, or stdin (`-` forces stdin).
//! 3. Writes one `forward();`-style line per command to stdout (or only logs
//!    them with `output = "log"`).
//! 4. Intercepts **Ctrl-C** to stop intake, lets in-flight commands finish,
//!    and prints a summary.
//!
//! Banner, summary and logs go to stderr so stdout carries only commands.

mod config;

use std::collections::BTreeMap;
use std::process::ExitCode;

use colored::Colorize;
use posedrive_middleware::{
    ActionExecutor, BusExecutor, CommandBus, JsonLinesSource, LogExecutor, PoseSource,
    ScriptExecutor,
};
use posedrive_runtime::{PipelineReport, PosePipeline};
use posedrive_types::{Command, PoseError};
use tokio::io::BufReader;
use tokio::sync::watch;
use tracing::warn;

use crate::config::{Config, OutputMode};

fn main() -> ExitCode {
    let _telemetry = posedrive_runtime::init_tracing("posedrive");

    print_banner();

    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            eprintln!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => first_run(),
        Err(e) => {
            eprintln!("{}: {}", "Config error".red(), e);
            eprintln!("  Using default configuration.");
            config::defaults()
        }
    };

    let source_arg = std::env::args().nth(1).or_else(|| cfg.source_path.clone());

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {}", "Failed to start runtime".red(), e);
            return ExitCode::FAILURE;
        }
    };

    match block_on_detached(runtime, run(cfg, source_arg)) {
        Ok((report, tally)) => {
            print_summary(&report, &tally);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Run `future` to completion, then shut the runtime down without waiting on
/// blocking tasks. A pending stdin read would otherwise keep the process alive
/// after Ctrl-C until stdin closes.
fn block_on_detached<F: Future>(runtime: tokio::runtime::Runtime, future: F) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    output
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline
// ─────────────────────────────────────────────────────────────────────────────

async fn run(
    cfg: Config,
    source_arg: Option<String>,
) -> Result<(PipelineReport, BTreeMap<Command, u64>), PoseError> {
    let source = open_source(source_arg.as_deref()).await?;

    // ── Command bus tally ─────────────────────────────────────────────────
    let bus = CommandBus::default();
    let mut subscriber = bus.subscribe();
    let tally_task = tokio::spawn(async move {
        let mut tally: BTreeMap<Command, u64> = BTreeMap::new();
        while let Some(event) = subscriber.recv().await {
            *tally.entry(event.command).or_default() += 1;
        }
        tally
    });

    let mut executors: Vec<Box<dyn ActionExecutor>> = Vec::new();
    match cfg.output {
        OutputMode::Script => executors.push(Box::new(ScriptExecutor::new(tokio::io::stdout()))),
        OutputMode::Log => executors.push(Box::new(LogExecutor)),
    }
    executors.push(Box::new(BusExecutor::new(bus, "posedrive-cli")));

    // ── Ctrl-C handler ────────────────────────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let handler_tx = shutdown_tx.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("{}", "⚠  Ctrl-C received – stopping pose intake …".yellow().bold());
        let _ = handler_tx.send(true);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; stop the source to exit");
    }
    let shutdown = async move {
        let _ = shutdown_rx.wait_for(|stop| *stop).await;
    };

    eprintln!(
        "  Translating with thresholds {} / {}°, angle wrap {}, output {}\n",
        cfg.translation_threshold.to_string().bold(),
        cfg.rotation_threshold.to_string().bold(),
        format!("{:?}", cfg.angle_wrap).to_lowercase().bold(),
        cfg.output.to_string().bold()
    );

    let report = PosePipeline::new(cfg.pipeline_config(), executors)
        .run(source.as_ref(), shutdown)
        .await?;
    drop(shutdown_tx);

    let tally = tally_task
        .await
        .map_err(|e| PoseError::Channel(format!("command tally failed: {e}")))?;
    Ok((report, tally))
}

async fn open_source(path: Option<&str>) -> Result<Box<dyn PoseSource>, PoseError> {
    match path {
        None | Some("-") => {
            eprintln!("  Reading pose samples from {}", "stdin".bold());
            Ok(Box::new(JsonLinesSource::new(BufReader::new(tokio::io::stdin()))))
        }
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|e| PoseError::Source(format!("cannot open {path}: {e}")))?;
            eprintln!("  Reading pose samples from {}", path.bold());
            Ok(Box::new(JsonLinesSource::new(BufReader::new(file))))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// First run
// ─────────────────────────────────────────────────────────────────────────────

fn first_run() -> Config {
    eprintln!("  No configuration found.  Writing defaults.");
    match config::save(&Config::default()) {
        Ok(()) => eprintln!(
            "  {} Config saved to {}",
            "✓".green().bold(),
            config::config_path().display().to_string().bold()
        ),
        Err(e) => eprintln!("{}: {}", "Error saving config".red(), e),
    }
    // Environment overrides apply to this run only; the file keeps defaults.
    config::defaults()
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner & summary
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    eprintln!();
    eprintln!(
        "  {} {}",
        "PoseDrive".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    eprintln!("  6-DoF pose → directional commands");
    eprintln!();
}

fn print_summary(report: &PipelineReport, tally: &BTreeMap<Command, u64>) {
    let t = report.translator;
    eprintln!();
    eprintln!("{}", "  Summary".bold());
    eprintln!(
        "    samples  {} admitted, {} dropped",
        t.admitted.to_string().green(),
        t.dropped.to_string().yellow()
    );
    eprintln!(
        "    commands {} emitted, {} executed, {} failed",
        t.emitted,
        report.sink.executed.to_string().green(),
        report.sink.failed.to_string().red()
    );
    for (command, count) in tally {
        eprintln!("      {:<9} {}", command.action_name(), count);
    }
}
