//! lpdm-replay entry point: CLI wiring and headless playback.

use std::path::PathBuf;
use std::process;
use std::thread;

use clap::Parser;
use lpdm_replay::config::ReplayConfig;
use lpdm_replay::io::export::{TraceRow, export_trace_csv};
use lpdm_replay::sim::render::NullRenderer;
use lpdm_replay::sim::scheduler::{EventScheduler, Tick};
use lpdm_replay::sim::session::SimulationSession;

#[derive(Debug, Parser)]
#[command(
    name = "lpdm-replay",
    about = "Replay a recorded LPDM simulation log against its system topology"
)]
struct Args {
    /// System description (JSON)
    #[arg(long)]
    system: PathBuf,
    /// Simulation log: stored JSON simulation or plain text, one event per line
    #[arg(long)]
    log: PathBuf,
    /// Load playback settings from a TOML file
    #[arg(long, conflicts_with = "preset")]
    config: Option<PathBuf>,
    /// Built-in playback preset (baseline, hourly, detailed)
    #[arg(long)]
    preset: Option<String>,
    /// Override the clock step in seconds
    #[arg(long)]
    seconds_per_step: Option<u64>,
    /// Stop at this fraction of the log (0.0 to 1.0) instead of the end
    #[arg(long)]
    seek: Option<f64>,
    /// Write one CSV row per dispatched event
    #[arg(long)]
    trace_out: Option<PathBuf>,
    /// Honour step delays and print events as they are dispatched
    #[arg(long)]
    realtime: bool,
    /// Open the interactive terminal player
    #[cfg(feature = "tui")]
    #[arg(long)]
    tui: bool,
    /// Start REST API server after the replay
    #[cfg(feature = "api")]
    #[arg(long)]
    serve: bool,
    /// API server port
    #[cfg(feature = "api")]
    #[arg(long, default_value_t = 3000)]
    port: u16,
}

/// Installs the tracing subscriber; `quiet` discards all output.
fn init_tracing(quiet: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(true)
        .with_line_number(true)
        .with_target(true);
    if quiet {
        builder.with_writer(std::io::sink).init();
    } else {
        builder.with_writer(std::io::stderr).init();
    }
}

fn load_config(args: &Args) -> ReplayConfig {
    let loaded = if let Some(ref path) = args.config {
        ReplayConfig::from_toml_file(path)
    } else if let Some(ref name) = args.preset {
        ReplayConfig::from_preset(name)
    } else {
        Ok(ReplayConfig::baseline())
    };
    let mut config = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    if let Some(seconds) = args.seconds_per_step {
        config.playback.seconds_per_step = seconds;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn main() {
    let args = Args::parse();

    #[cfg(feature = "tui")]
    let quiet = args.tui;
    #[cfg(not(feature = "tui"))]
    let quiet = false;
    init_tracing(quiet);

    let config = load_config(&args);
    let mut session = SimulationSession::load(&args.system, &args.log).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });

    #[cfg(feature = "tui")]
    if args.tui {
        if let Err(e) = lpdm_replay::tui::run(session, &config.playback) {
            eprintln!("error: TUI crashed: {e}");
            process::exit(1);
        }
        return;
    }

    // Headless replay: to the end, or to the requested fraction
    let mut scheduler = EventScheduler::new(&config.playback);
    let mut renderer = NullRenderer;
    match args.seek {
        Some(fraction) => {
            scheduler.scrub(fraction, &mut session);
        }
        None => scheduler.start(&mut session),
    }

    let mut trace = Vec::new();
    loop {
        let report = scheduler.tick(&mut session, &mut renderer);
        if let Some(row) = TraceRow::from_tick(&report.tick, &session.clock) {
            if args.realtime {
                println!("{:>12}  {}", row.clock, row.outcome);
            }
            trace.push(row);
        }
        if args.realtime && matches!(report.tick, Tick::Advanced { .. }) {
            println!("{:>12}", session.clock.to_string());
        }
        match report.next {
            Some(delay) if args.realtime => thread::sleep(delay),
            Some(_) => {}
            None => break,
        }
    }

    // Print final state
    println!(
        "clock {} │ event {}/{} │ {:.1}% of timeline",
        session.clock,
        session.cursor.next_event_index,
        session.total_events(),
        session.scrub_position() * 100.0
    );
    for device in session.model.devices() {
        println!("{device}");
    }
    for link in session.model.links() {
        println!("{link}");
    }

    // Export CSV if requested
    if let Some(ref path) = args.trace_out {
        if let Err(e) = export_trace_csv(&trace, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Trace written to {}", path.display());
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if args.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(lpdm_replay::api::AppState::from_session(&session));
        let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(lpdm_replay::api::serve(state, addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
