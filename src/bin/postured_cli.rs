use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use postured::config::MonitorConfig;
use postured::managers::CalibrationManager;
use postured::monitor::{MonitorEvent, MonitorHandle, Observation};
use postured::settings::{Settings, SettingsStore, DEFAULT_SETTINGS_PATH};
use postured::source::SyntheticSource;
use postured::trace::Trace;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;

#[derive(Parser, Debug)]
#[command(
    name = "postured_cli",
    about = "Replay, simulation, and calibration tooling for the posture monitor"
)]
struct Cli {
    /// Override the settings file (defaults to postured_settings.json)
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Override the config file (defaults to postured_config.json)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Replay a recorded trace through the pipeline and print events as JSON lines
    Replay {
        #[arg(long)]
        trace: PathBuf,
        /// Replay at the trace's recorded cadence instead of full speed
        #[arg(long, default_value_t = false)]
        realtime: bool,
        /// Treat the stored thresholds as calibrated for this run only
        #[arg(long, default_value_t = false)]
        assume_calibrated: bool,
        /// Also print heartbeat observations
        #[arg(long, default_value_t = false)]
        observations: bool,
    },
    /// Drive the pipeline from the synthetic drift source for a fixed duration
    Simulate {
        #[arg(long, default_value_t = 10)]
        seconds: u64,
        #[arg(long, default_value_t = 42)]
        seed: u64,
        /// Treat the stored thresholds as calibrated for this run only
        #[arg(long, default_value_t = false)]
        assume_calibrated: bool,
        /// Also print heartbeat observations
        #[arg(long, default_value_t = false)]
        observations: bool,
    },
    /// Validate a pair of averaged posture samples and persist them as thresholds
    Calibrate {
        /// Averaged head height captured while upright
        #[arg(long)]
        good: f64,
        /// Averaged head height captured while slouched
        #[arg(long)]
        bad: f64,
    },
    /// Print the default settings as JSON
    Defaults,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = cli
        .config
        .as_ref()
        .map(MonitorConfig::load_from_file)
        .unwrap_or_else(MonitorConfig::load);
    let settings_path = cli
        .settings
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

    match cli.command {
        Commands::Replay {
            trace,
            realtime,
            assume_calibrated,
            observations,
        } => run_replay(
            config,
            settings_path,
            &trace,
            realtime,
            assume_calibrated,
            observations,
        ),
        Commands::Simulate {
            seconds,
            seed,
            assume_calibrated,
            observations,
        } => run_simulate(
            config,
            settings_path,
            seconds,
            seed,
            assume_calibrated,
            observations,
        ),
        Commands::Calibrate { good, bad } => run_calibrate(config, settings_path, good, bad),
        Commands::Defaults => run_defaults(),
    }
}

fn run_replay(
    mut config: MonitorConfig,
    settings_path: PathBuf,
    trace_path: &PathBuf,
    realtime: bool,
    assume_calibrated: bool,
    print_observations: bool,
) -> Result<ExitCode> {
    let trace =
        Trace::load(trace_path).with_context(|| format!("loading trace {:?}", trace_path))?;
    let tick_count = trace.len() as u64;

    config.sampling.tick_interval_ms = if realtime {
        trace
            .tick_interval_ms
            .unwrap_or(config.sampling.tick_interval_ms)
    } else {
        1
    };

    let store = open_store(settings_path, assume_calibrated)?;
    let source = Arc::new(trace.into_source());
    let handle = MonitorHandle::with_settings(source, store, config.clone());

    let mut events_rx = subscribe_events(&handle)?;
    let mut observations_rx = subscribe_observations(&handle)?;

    handle
        .start()
        .context("starting the monitor for trace replay")?;

    // The script raises a terminal source error once the last frame has
    // been consumed, which halts the loop and marks the end of the replay.
    let deadline = replay_deadline(tick_count, config.sampling.tick_interval_ms);
    if !wait_for_halt(&handle, deadline) {
        handle.stop().ok();
        bail!("replay did not finish within {:?}", deadline);
    }
    handle.stop().context("stopping the monitor after replay")?;

    for event in drain(&mut events_rx, "events") {
        println!("{}", serde_json::to_string(&event)?);
    }
    if print_observations {
        for observation in drain(&mut observations_rx, "observations") {
            println!("{}", serde_json::to_string(&observation)?);
        }
    }

    Ok(ExitCode::from(0))
}

fn run_simulate(
    config: MonitorConfig,
    settings_path: PathBuf,
    seconds: u64,
    seed: u64,
    assume_calibrated: bool,
    print_observations: bool,
) -> Result<ExitCode> {
    let store = open_store(settings_path, assume_calibrated)?;
    let source = Arc::new(SyntheticSource::new(seed));
    let handle = MonitorHandle::with_settings(source, store, config);

    let mut events_rx = subscribe_events(&handle)?;
    let mut observations_rx = subscribe_observations(&handle)?;

    handle.start().context("starting the synthetic monitor")?;
    std::thread::sleep(Duration::from_secs(seconds));
    handle
        .stop()
        .context("stopping the monitor after simulation")?;

    for event in drain(&mut events_rx, "events") {
        println!("{}", serde_json::to_string(&event)?);
    }
    if print_observations {
        for observation in drain(&mut observations_rx, "observations") {
            println!("{}", serde_json::to_string(&observation)?);
        }
    }

    Ok(ExitCode::from(0))
}

fn run_calibrate(
    config: MonitorConfig,
    settings_path: PathBuf,
    good: f64,
    bad: f64,
) -> Result<ExitCode> {
    let store = Arc::new(SettingsStore::open(settings_path));
    let manager = CalibrationManager::new(Arc::clone(&store), config.calibration);
    let thresholds = manager
        .apply_samples(good, bad)
        .context("applying calibration samples")?;
    println!("{}", serde_json::to_string(&thresholds)?);
    Ok(ExitCode::from(0))
}

fn run_defaults() -> Result<ExitCode> {
    let json = serde_json::to_string_pretty(&Settings::default())?;
    println!("{json}");
    Ok(ExitCode::from(0))
}

fn open_store(settings_path: PathBuf, assume_calibrated: bool) -> Result<Arc<SettingsStore>> {
    let store = Arc::new(SettingsStore::open(settings_path));
    if assume_calibrated {
        // Memory-only override; the file keeps its real calibration flag.
        store
            .update(|settings| settings.is_calibrated = true)
            .context("marking stored thresholds as calibrated")?;
    }
    Ok(store)
}

fn subscribe_events(handle: &MonitorHandle) -> Result<broadcast::Receiver<MonitorEvent>> {
    handle
        .events_receiver()
        .context("event channel not initialized")
}

fn subscribe_observations(handle: &MonitorHandle) -> Result<broadcast::Receiver<Observation>> {
    handle
        .observations_receiver()
        .context("observation channel not initialized")
}

fn replay_deadline(tick_count: u64, tick_interval_ms: u64) -> Duration {
    // One extra tick surfaces the exhaustion error, plus generous margin
    // for scheduler jitter.
    Duration::from_millis((tick_count + 1).saturating_mul(tick_interval_ms) + 2_000)
}

fn wait_for_halt(handle: &MonitorHandle, deadline: Duration) -> bool {
    let end = Instant::now() + deadline;
    while Instant::now() < end {
        if !handle.is_running() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    !handle.is_running()
}

fn drain<T: Clone>(rx: &mut broadcast::Receiver<T>, label: &str) -> Vec<T> {
    let mut items = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(item) => items.push(item),
            Err(TryRecvError::Lagged(skipped)) => {
                eprintln!("Warning: dropped {skipped} {label} from a lagged subscriber");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
    items
}
