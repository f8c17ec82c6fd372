//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use lpdm_replay::sim::log::SimulationLog;
use lpdm_replay::sim::session::SimulationSession;
use lpdm_replay::sim::state::DeviceState;
use lpdm_replay::topology::System;

/// One controller with a PV array, a utility meter and three end uses.
pub const SYSTEM_JSON: &str = r#"{
    "id": 1,
    "name": "house",
    "config": { "devices": {
        "pvs": [ { "device_id": "pv_1", "grid_controller_id": "gc_1", "capacity": 2000 } ],
        "utility_meters": [ { "device_id": "utm_1", "grid_controller_id": "gc_1" } ],
        "grid_controllers": [
            { "device_id": "gc_1", "connected_devices": ["eud_1", "eud_2", "eud_3"] }
        ],
        "euds": [
            { "device_id": "eud_1", "eud_type": "air_conditioner" },
            { "device_id": "eud_2", "eud_type": "light" },
            { "device_id": "eud_3", "eud_type": "fixed_consumption" }
        ]
    } },
    "layout": {
        "gc_1": { "x": 300, "y": 200 },
        "pv_1": { "x": 100, "y": 40, "links": { "gc_1": { "vertices": [ { "x": 200, "y": 40 } ] } } }
    }
}"#;

/// A two-hour morning, including a corrupted line.
pub const LOG_LINES: &[&str] = &[
    "0 00:00:00; 0; gc_1; price; 0.1; price changed to 0.1",
    "0 00:00:00; 0; utm_1; price message; sell 0.1, buy 0; price msg to gc_1",
    "0 00:00:01; 1; gc_1; price_msg_in; 0.1; PRICE message from utm_1",
    "0 00:00:02; 2; eud_1; request_out; 500.0; REQUEST to gc_1",
    "0 00:00:02; 2; eud_1; set_point; 21.5; setpoint changed to 21.5",
    "0 00:00:03; 3; gc_1; allocate_msg; 450.0; ALLOCATE to eud_1",
    "0 00:00:03; 3; eud_1; compressor_on_off; 1; compressor_on",
    "0 00:15:00; 900; gc_1; battery_soc; 0.75; current soc",
    "0 00:15:00; 900; eud_2; brightness; 0.6; brightness changed to 0.6",
    "0 01:00:00; 3600; pv_1; power_msg; -1440.4; POWER to gc_1",
    "0 01:00:00; 3600; utm_1; power_out; 60.5; POWER to gc_1",
    "garbled line",
    "0 02:00:00; 7200; gc_1; price_msg_out; 0.05; PRICE to utm_1",
];

pub fn system() -> System {
    System::from_json_str(SYSTEM_JSON).expect("fixture system should parse")
}

pub fn log() -> SimulationLog {
    SimulationLog::from_lines(
        "1.1",
        "1",
        "morning",
        LOG_LINES.iter().map(|l| l.to_string()),
    )
}

pub fn session() -> SimulationSession {
    SimulationSession::new(system(), log()).expect("fixture topology is valid")
}

/// `n` price events on `gc_1`, two per second, each carrying its index.
pub fn price_session(n: usize) -> SimulationSession {
    let lines = (0..n).map(|i| {
        let s = i / 2;
        format!("0 00:00:00; {s}; gc_1; price; {i}; price changed to {i}")
    });
    let log = SimulationLog::from_lines("1.2", "1", "prices", lines);
    SimulationSession::new(system(), log).expect("fixture topology is valid")
}

/// `(state_of_charge, price)` of a controller, NaN if absent.
pub fn controller(session: &SimulationSession, id: &str) -> (f64, f64) {
    match session.model.device(id) {
        Some(device) => match device.state {
            DeviceState::Controller { state_of_charge } => (state_of_charge, device.price),
            _ => (f64::NAN, f64::NAN),
        },
        None => (f64::NAN, f64::NAN),
    }
}

/// Writes `contents` to a per-process temporary file and returns its path.
pub fn temp_file(name: &str, contents: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lpdm-replay-tests-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir should be writable");
    let path = dir.join(name);
    fs::write(&path, contents).expect("temp file should be writable");
    path
}

/// The fixture log as a stored simulation JSON document.
pub fn log_json() -> String {
    serde_json::json!({
        "id": "1.1",
        "systemId": 1,
        "name": "morning",
        "events": LOG_LINES,
    })
    .to_string()
}
