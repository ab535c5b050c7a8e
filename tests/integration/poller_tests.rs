//! Poll scheduling, backlog draining and cursor handling as seen through
//! `AppService::tick`.

use linealarm::app::events::AppEvent;
use linealarm::poller::PollReport;

use super::mock_hw::{Rig, test_config};

fn reports(rig: &Rig) -> Vec<PollReport> {
    rig.sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Polled(r) => Some(*r),
            _ => None,
        })
        .collect()
}

#[test]
fn first_poll_waits_one_interval() {
    let mut rig = Rig::new(&test_config());
    rig.tick_at(1_000, 0.0);
    assert!(rig.bot.offsets.is_empty());
    rig.tick_at(1_001, 0.0);
    assert_eq!(rig.bot.offsets, [0]);
}

#[test]
fn idle_polls_back_off_to_the_cap() {
    let mut rig = Rig::new(&test_config());
    for t in (0..=26_000).step_by(10) {
        rig.tick_at(t, 0.0);
    }
    let intervals: Vec<u32> = reports(&rig).iter().map(|r| r.interval_ms).collect();
    assert_eq!(intervals, [2_000, 4_000, 8_000, 10_000, 10_000]);
    assert_eq!(rig.app.poll_interval_ms(), 10_000);
}

#[test]
fn a_message_snaps_the_interval_back() {
    let mut rig = Rig::new(&test_config());
    for _ in 0..4 {
        rig.deliver();
    }
    assert_eq!(rig.app.poll_interval_ms(), 10_000);

    rig.bot.receive("42", "/start");
    rig.deliver();
    let last = *reports(&rig).last().unwrap();
    assert_eq!(last.messages, 1);
    assert_eq!(last.interval_ms, 1_000);
}

#[test]
fn cursor_moves_past_the_highest_update() {
    let mut rig = Rig::new(&test_config());
    rig.bot.receive("42", "/start");
    rig.bot.receive("7", "/start");
    rig.deliver();

    assert_eq!(rig.bot.offsets, [0, 502]);
    let r = reports(&rig)[0];
    assert_eq!((r.messages, r.batches, r.capped), (2, 2, false));

    // Nothing is handed over twice.
    rig.deliver();
    assert_eq!(rig.bot.sent.len(), 2);
    assert_eq!(rig.bot.offsets, [0, 502, 502]);
}

#[test]
fn drain_stops_at_the_batch_cap() {
    let mut config = test_config();
    config.max_drain_batches = 3;
    let mut rig = Rig::new(&config);
    rig.bot.batch_limit = 1;
    for chat in ["1", "2", "3", "4", "5"] {
        rig.bot.receive(chat, "/start");
    }

    rig.deliver();
    let first = reports(&rig)[0];
    assert_eq!((first.messages, first.batches, first.capped), (3, 3, true));
    assert_eq!(first.interval_ms, 1_000);
    assert_eq!(rig.bot.sent.len(), 3);

    rig.deliver();
    let second = reports(&rig)[1];
    assert_eq!((second.messages, second.batches, second.capped), (2, 3, false));
    assert_eq!(rig.bot.sent.len(), 5);
}

#[test]
fn failed_poll_counts_as_idle() {
    let mut rig = Rig::new(&test_config());
    rig.bot.failing_polls = 1;
    rig.bot.receive("42", "/start");

    rig.deliver();
    let r = reports(&rig)[0];
    assert_eq!((r.messages, r.batches), (0, 1));
    assert_eq!(r.interval_ms, 2_000);
    assert!(rig.bot.sent.is_empty());

    rig.deliver();
    assert_eq!(rig.bot.sent.len(), 1);
}

#[test]
fn telemetry_follows_every_poll() {
    let mut rig = Rig::new(&test_config());
    for t in (0..=8_000).step_by(10) {
        rig.tick_at(t, 0.7);
    }
    let polls = rig.sink.count(|e| matches!(e, AppEvent::Polled(_)));
    let telemetry: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(*t),
            _ => None,
        })
        .collect();
    assert!(polls > 0);
    assert_eq!(telemetry.len(), polls);
    assert!((telemetry[0].line_voltage - 0.7).abs() < 1e-6);
    assert!(!telemetry[0].tone_on);
}
