//! Integration tests for replaying a full log.

mod common;

use lpdm_replay::config::ReplayConfig;
use lpdm_replay::sim::dispatch::DispatchOutcome;
use lpdm_replay::sim::log::SimulationLog;
use lpdm_replay::sim::render::{Notification, NullRenderer, RecordingRenderer};
use lpdm_replay::sim::scheduler::{EventScheduler, PlaybackState, Tick};
use lpdm_replay::sim::session::SimulationSession;
use lpdm_replay::sim::state::DeviceState;
use lpdm_replay::sim::timeline::EventDensity;

fn replay(session: &mut SimulationSession) -> Vec<Tick> {
    let mut scheduler = EventScheduler::default();
    let mut ticks = Vec::new();
    scheduler.start(session);
    scheduler.drive(session, &mut NullRenderer, |_| {}, |t| ticks.push(t.clone()));
    assert_eq!(scheduler.state(), PlaybackState::Paused);
    ticks
}

fn link_power(session: &SimulationSession, a: &str, b: &str) -> (f64, Option<String>) {
    let link = session
        .model
        .link_between(a, b)
        .and_then(|id| session.model.link(id))
        .expect("devices should be wired");
    (link.state.power, link.power_source.clone())
}

#[test]
fn full_replay_reconstructs_final_state() {
    let mut s = common::session();
    let ticks = replay(&mut s);

    assert!(s.is_finished());
    assert_eq!(s.clock.to_string(), "0 02:00:00");
    assert_eq!(s.scrub_position(), 1.0);
    assert_eq!(common::controller(&s, "gc_1"), (0.75, 0.1));
    assert_eq!(
        s.model.device("eud_1").map(|d| &d.state),
        Some(&DeviceState::AirConditioner {
            compressor_on: true,
            set_point: 21.5
        })
    );
    assert_eq!(
        s.model.device("eud_2").map(|d| &d.state),
        Some(&DeviceState::Light { brightness: 0.6 })
    );

    assert_eq!(link_power(&s, "gc_1", "pv_1"), (-1440.0, Some("pv_1".into())));
    assert_eq!(link_power(&s, "utm_1", "gc_1"), (61.0, Some("gc_1".into())));
    let ac = s
        .model
        .link_between("gc_1", "eud_1")
        .and_then(|id| s.model.link(id))
        .map(|l| l.state);
    assert_eq!(ac.map(|l| (l.requested_power, l.allocated_power)), Some((500.0, 450.0)));

    let dispatched = ticks
        .iter()
        .filter(|t| matches!(t, Tick::Dispatched { .. }))
        .count();
    assert_eq!(dispatched, common::LOG_LINES.len());
    assert!(ticks.iter().all(|t| !matches!(
        t,
        Tick::Dispatched { result: Err(_), .. }
    )));
    assert_eq!(ticks.last(), Some(&Tick::Finished));
}

#[test]
fn events_dispatch_in_log_order_and_clock_never_rewinds() {
    let mut s = common::session();
    let mut scheduler = EventScheduler::default();
    scheduler.start(&mut s);
    let mut indices = Vec::new();
    let mut last_clock = s.clock.elapsed;
    loop {
        let report = scheduler.tick(&mut s, &mut NullRenderer);
        assert!(s.clock.elapsed >= last_clock);
        last_clock = s.clock.elapsed;
        if let Tick::Dispatched { index, event, .. } = &report.tick {
            assert!(event.second <= s.cursor.current_second);
            indices.push(*index);
        }
        if report.next.is_none() {
            break;
        }
    }
    assert_eq!(indices, (0..common::LOG_LINES.len()).collect::<Vec<_>>());
}

#[test]
fn corrupted_line_is_consumed_as_a_no_op() {
    let mut s = common::session();
    let ticks = replay(&mut s);
    let garbled = ticks.iter().find_map(|t| match t {
        Tick::Dispatched { index: 11, result, .. } => Some(result.clone()),
        _ => None,
    });
    assert_eq!(garbled, Some(Ok(DispatchOutcome::Ignored)));
}

#[test]
fn two_price_events_apply_in_order() {
    let log = SimulationLog::from_text(
        "1.3",
        "1",
        "two",
        "0 00:00:00;0;gc_1;price;0.1;x\n0 00:00:01;1;gc_1;price;0.2;y",
    );
    let mut s = SimulationSession::new(common::system(), log).expect("valid topology");
    let mut scheduler = EventScheduler::default();
    scheduler.start(&mut s);

    let mut prices = Vec::new();
    loop {
        let report = scheduler.tick(&mut s, &mut NullRenderer);
        if matches!(report.tick, Tick::Dispatched { .. }) {
            prices.push(common::controller(&s, "gc_1").1);
        }
        if report.next.is_none() {
            break;
        }
    }
    assert_eq!(prices, vec![0.1, 0.2]);
    assert_eq!(s.cursor.next_event_index, 2);
    assert_eq!(scheduler.tick(&mut s, &mut NullRenderer).tick, Tick::Inactive);
}

#[test]
fn seeking_matches_straight_playback() {
    let mut seeker = common::session();
    let mut scheduler = EventScheduler::default();
    let mut r = NullRenderer;

    for fraction in [0.8, 0.3, 1.0, 0.0, 0.5] {
        scheduler.seek(fraction, &mut seeker, &mut r);
        let target = seeker.cursor.next_event_index;

        let mut straight = common::session();
        let mut plain = EventScheduler::default();
        plain.start(&mut straight);
        while straight.cursor.next_event_index < target {
            plain.tick(&mut straight, &mut r);
        }

        assert_eq!(seeker.model, straight.model, "fraction {fraction}");
        assert_eq!(seeker.clock, straight.clock, "fraction {fraction}");
    }
}

#[test]
fn seeking_twice_to_the_same_point_is_idempotent() {
    let mut s = common::price_session(300);
    let mut scheduler = EventScheduler::default();
    let mut r = NullRenderer;

    scheduler.seek(0.6, &mut s, &mut r);
    let first = (s.model.clone(), s.clock, s.cursor);
    scheduler.seek(0.6, &mut s, &mut r);
    assert_eq!((s.model.clone(), s.clock, s.cursor), first);

    scheduler.seek(0.2, &mut s, &mut r);
    scheduler.seek(0.6, &mut s, &mut r);
    assert_eq!((s.model.clone(), s.clock, s.cursor), first);
}

#[test]
fn fast_seek_notifies_every_hundredth_event_then_refreshes_once() {
    let mut s = common::price_session(1000);
    let mut scheduler = EventScheduler::default();
    let mut r = RecordingRenderer::default();

    scheduler.seek(1.0, &mut s, &mut r);
    let notes = r.take();
    let forced = notes
        .iter()
        .filter(|n| matches!(n, Notification::Device(_)))
        .count();
    assert_eq!(forced, 10);
    assert_eq!(notes.last(), Some(&Notification::RefreshAll));
    assert_eq!(
        notes
            .iter()
            .filter(|n| matches!(n, Notification::RefreshAll))
            .count(),
        1
    );
    assert_eq!(common::controller(&s, "gc_1").1, 999.0);
}

#[test]
fn stop_returns_to_first_event() {
    let mut s = common::session();
    let mut scheduler = EventScheduler::default();
    let pristine = common::session();
    scheduler.seek(0.7, &mut s, &mut NullRenderer);
    scheduler.stop(&mut s, &mut NullRenderer);

    assert_eq!(scheduler.state(), PlaybackState::Stopped);
    assert_eq!(s.model, pristine.model);
    assert_eq!(s.clock, pristine.clock);
    assert_eq!(s.cursor, pristine.cursor);
}

#[test]
fn pacing_follows_config() {
    let cfg = ReplayConfig::hourly();
    let mut s = common::session();
    let mut scheduler = EventScheduler::new(&cfg.playback);
    scheduler.start(&mut s);
    let mut delays = Vec::new();
    let mut advances = Vec::new();
    scheduler.drive(
        &mut s,
        &mut NullRenderer,
        |d| delays.push(d),
        |t| {
            if let Tick::Advanced { seconds } = t {
                advances.push(*seconds);
            }
        },
    );
    // event gaps: 1, 1, 1, 897, 2700, 3600 seconds; none exceeds one hour
    assert_eq!(advances, vec![1, 1, 1, 897, 2700, 3600]);
    assert!(delays.contains(&cfg.playback.step_delay()));
}

#[test]
fn density_counts_fixture_events() {
    let density = EventDensity::from_log(&common::log());
    assert_eq!(density.slots(), 3);
    assert_eq!(density.power_per_slot, vec![0, 2, 0]);
    assert_eq!(density.price_per_slot, vec![2, 0, 1]);
}

#[test]
fn logs_load_from_text_and_json_files() {
    let text = common::temp_file("morning.log", &common::LOG_LINES.join("\n"));
    let json = common::temp_file("morning.json", &common::log_json());

    let from_text = SimulationLog::from_path(&text).expect("text log should load");
    let from_json = SimulationLog::from_path(&json).expect("json log should load");
    assert_eq!(from_text.len(), common::LOG_LINES.len());
    assert_eq!(from_json.len(), common::LOG_LINES.len());
    assert_eq!(from_json.system_id, "1");
    assert_eq!(from_json.name, "morning");
    assert_eq!(from_text.last_second(), 7200);

    let mut a = SimulationSession::new(common::system(), from_text).expect("valid topology");
    let mut b = SimulationSession::new(common::system(), from_json).expect("valid topology");
    replay(&mut a);
    replay(&mut b);
    assert_eq!(a.model, b.model);
}

#[test]
fn layout_is_carried_onto_devices_and_links() {
    let s = common::session();
    let gc = s.model.device("gc_1").and_then(|d| d.position);
    assert_eq!(gc.map(|p| (p.x, p.y)), Some((300.0, 200.0)));
    let waypoints = s
        .model
        .link_between("pv_1", "gc_1")
        .and_then(|id| s.model.link(id))
        .map(|l| l.waypoints.len());
    assert_eq!(waypoints, Some(1));
    assert_eq!(s.model.link_count(), 5);
}
