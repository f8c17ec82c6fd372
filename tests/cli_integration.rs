//! End-to-end tests of the headless binary.

mod common;

use std::fs;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lpdm-replay"))
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("lpdm-replay process should run")
}

/// Writes the fixtures under names unique to `tag`; tests run in parallel.
fn fixture_paths(tag: &str) -> (String, String) {
    let system = common::temp_file(&format!("{tag}-system.json"), common::SYSTEM_JSON);
    let log = common::temp_file(&format!("{tag}-morning.json"), &common::log_json());
    (
        system.to_string_lossy().into_owned(),
        log.to_string_lossy().into_owned(),
    )
}

#[test]
fn headless_replay_prints_final_state() {
    let (system, log) = fixture_paths("final");
    let out = run(&["--system", &system, "--log", &log]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("clock 0 02:00:00"), "{stdout}");
    assert!(stdout.contains("event 13/13"), "{stdout}");
    assert!(stdout.contains("gc_1 [grid controller] soc=0.750 price=0.100"), "{stdout}");
    assert!(stdout.contains("pv_1 -> gc_1: power=-1440W"), "{stdout}");
}

#[test]
fn seek_and_trace_export() {
    let (system, log) = fixture_paths("seek");
    let trace = std::env::temp_dir().join(format!("lpdm-replay-trace-{}.csv", std::process::id()));
    let trace_arg = trace.to_string_lossy().into_owned();
    let out = run(&[
        "--system", &system, "--log", &log, "--seek", "0.5", "--trace-out", &trace_arg,
    ]);
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("event 7/13"), "{stdout}");

    let csv = fs::read_to_string(&trace).expect("trace should be written");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("index,second,clock,device,event_type,value,outcome")
    );
    assert_eq!(lines.count(), 7);
    let _ = fs::remove_file(trace);
}

#[test]
fn invalid_config_exits_with_error() {
    let (system, log) = fixture_paths("badcfg");
    let cfg = common::temp_file("bad.toml", "[playback]\nseconds_per_step = 0\n");
    let cfg = cfg.to_string_lossy().into_owned();
    let out = run(&["--system", &system, "--log", &log, "--config", &cfg]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("playback.seconds_per_step"), "{stderr}");
}

#[test]
fn unknown_preset_exits_with_error() {
    let (system, log) = fixture_paths("preset");
    let out = run(&["--system", &system, "--log", &log, "--preset", "turbo"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("unknown preset"));
}

#[test]
fn missing_log_exits_with_error() {
    let (system, _) = fixture_paths("missing");
    let out = run(&["--system", &system, "--log", "/nonexistent/run.log"]);
    assert_eq!(out.status.code(), Some(1));
}
