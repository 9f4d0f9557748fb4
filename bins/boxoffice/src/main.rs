mod dashboard;
mod prompt;

use anyhow::Context;
use boxoffice_config::{BoxOfficeConfig, ConfigError};
use boxoffice_engine::{RunSummary, SimulationController, SimulationError};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use turnstile_sinks::{
    FanoutSink, JsonFileLedger, MemoryLedger, StatusBroadcaster, StatusSink, TracingStatusSink,
};

const DEFAULT_CONFIG_PATH: &str = "boxoffice.toml";

const HELP: &str = "Commands: start | stop | status | wait | exit";

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let path = PathBuf::from(
        std::env::args()
            .nth(1)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.into()),
    );
    let loaded = match BoxOfficeConfig::load(&path) {
        Ok(cfg) => Some(cfg),
        Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(e).with_context(|| format!("loading {}", path.display())),
    };
    init_tracing(loaded.as_ref().map_or("info", |cfg| cfg.log_level.as_str()));

    let mut input = io::stdin().lock();
    let mut out = io::stdout();
    writeln!(out, "Welcome to the Real Time Ticketing System")?;

    let config = settle_configuration(loaded, &path, &mut input, &mut out)?;

    let broadcaster = Arc::new(StatusBroadcaster::new());
    let dashboard = dashboard::spawn(broadcaster.subscribe(), io::stdout())?;
    let status: Arc<dyn StatusSink> = Arc::new(
        FanoutSink::new()
            .with(Arc::clone(&broadcaster) as Arc<dyn StatusSink>)
            .with(Arc::new(TracingStatusSink)),
    );
    let controller = SimulationController::new(Arc::new(MemoryLedger::new()), status)
        .with_sample_interval(Duration::from_millis(config.status_interval_ms))
        .with_seed(config.seed);

    writeln!(out, "\n{HELP}")?;
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = prompt::read_line(&mut input)? else {
            break;
        };
        let command = line.to_ascii_lowercase();
        let result = match command.as_str() {
            "" => Ok(()),
            "start" => start(&controller, &config, &mut out),
            "stop" => match controller.stop() {
                Some(summary) => print_summary(&mut out, &summary),
                None => writeln!(out, "No simulation is running.").map_err(Into::into),
            },
            "status" => print_status(&controller, &mut out),
            "wait" => {
                writeln!(out, "Waiting for the simulation to finish...")?;
                match controller.wait() {
                    Some(summary) => print_summary(&mut out, &summary),
                    None => writeln!(out, "No simulation is running.").map_err(Into::into),
                }
            }
            "exit" | "quit" => break,
            "help" => writeln!(out, "{HELP}").map_err(Into::into),
            _ => writeln!(out, "Invalid command. {HELP}").map_err(Into::into),
        };
        if let Err(e) = result {
            error!("{command} failed: {e:#}");
        }
    }

    if let Some(summary) = controller.stop() {
        print_summary(&mut out, &summary)?;
    }
    drop(controller);
    drop(broadcaster);
    if dashboard.join().is_err() {
        warn!("dashboard thread panicked");
    }
    Ok(())
}

/// Confirms loaded settings, or prompts for new ones and saves them.
fn settle_configuration(
    loaded: Option<BoxOfficeConfig>,
    path: &Path,
    input: &mut impl io::BufRead,
    out: &mut impl Write,
) -> anyhow::Result<BoxOfficeConfig> {
    let mut config = match loaded {
        Some(cfg) => {
            info!(path = %path.display(), "configuration loaded");
            prompt::display_configuration(out, &cfg.simulation)?;
            if prompt::confirm_keep(input, out)? {
                info!("continuing with existing configuration");
                return Ok(cfg);
            }
            info!("entering new configuration settings");
            cfg
        }
        None => {
            warn!(path = %path.display(), "configuration not found, prompting for settings");
            BoxOfficeConfig::default()
        }
    };

    config.simulation = prompt::prompt_configuration(input, out)?;
    config
        .save(path)
        .with_context(|| format!("saving {}", path.display()))?;
    info!(path = %path.display(), "configuration saved");
    Ok(config)
}

fn start(
    controller: &SimulationController,
    config: &BoxOfficeConfig,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if controller.is_running() {
        writeln!(out, "Simulation is already running.")?;
        return Ok(());
    }

    let result = match &config.ledger_dir {
        Some(dir) => {
            let ledger = JsonFileLedger::create(dir)
                .with_context(|| format!("creating ledger in {}", dir.display()))?;
            info!(path = %ledger.path().display(), "recording run ledger");
            controller.start_with_ledger(&config.simulation, Arc::new(ledger))
        }
        None => controller.start(&config.simulation),
    };

    match result {
        Ok(()) => writeln!(out, "Starting the simulation...")?,
        Err(SimulationError::AlreadyRunning) => writeln!(out, "Simulation is already running.")?,
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn print_status(controller: &SimulationController, out: &mut impl Write) -> anyhow::Result<()> {
    let Some(snap) = controller.snapshot() else {
        writeln!(out, "No simulation has been started yet.")?;
        return Ok(());
    };
    let state = if controller.is_running() { "running" } else { "idle" };
    writeln!(
        out,
        "Simulation {state}: {:?}, released {}/{}, sold {}, available {}",
        snap.phase, snap.released, snap.capacity, snap.sold, snap.available
    )?;
    Ok(())
}

fn print_summary(out: &mut impl Write, summary: &RunSummary) -> anyhow::Result<()> {
    let snap = &summary.snapshot;
    let how = if summary.stopped { "stopped" } else { "completed" };
    writeln!(
        out,
        "Simulation {how} after {:.1}s: released {}/{}, sold {}, remaining {}, withdrawn {}",
        summary.elapsed.as_secs_f64(),
        snap.released,
        snap.capacity,
        snap.sold,
        snap.available,
        snap.retired
    )?;
    for report in &summary.workers {
        writeln!(
            out,
            "  {:<4} {:>3} batches {:>6} tickets  ({})",
            report.worker.to_string(),
            report.batches,
            report.tickets,
            report.exit
        )?;
    }
    Ok(())
}
