//! Alarm detection through `AppService::tick`: tone, single-fire
//! notification, re-arm and lamp patterns.

use linealarm::alarm::AlarmState;
use linealarm::app::events::AppEvent;
use linealarm::app::interpreter::{ALARM_MESSAGE, SUBSCRIBED};
use linealarm::app::ports::{ClockPort, Watched, WatchdogPort};
use std::cell::Cell;

use super::mock_hw::{Rig, test_config};

const HIGH: f32 = 2.0;
const LOW: f32 = 0.2;

fn rig_with_subscribers(chats: &[&str]) -> Rig {
    let mut rig = Rig::new(&test_config());
    for chat in chats {
        SUBSCRIBED.add(&mut rig.store, chat).unwrap();
    }
    rig
}

fn notified(rig: &Rig) -> usize {
    rig.sink
        .count(|e| matches!(e, AppEvent::AlarmNotified { .. }))
}

#[test]
fn full_excursion_notifies_once_and_rearms() {
    let mut rig = rig_with_subscribers(&["42", "7"]);

    rig.tick_at(0, LOW);
    assert_eq!(rig.app.alarm_state(), AlarmState::Quiescent);
    assert_eq!(rig.hw.lamps(), Some((false, false, true)));

    rig.tick_at(100, HIGH);
    assert_eq!(rig.app.alarm_state(), AlarmState::Triggering);
    assert_eq!(rig.hw.lamps(), Some((true, false, true)));

    rig.tick_at(1_099, HIGH);
    assert!(rig.hw.tone.is_empty());
    rig.tick_at(1_100, HIGH);
    assert_eq!(rig.hw.tone, [true]);

    rig.tick_at(5_099, HIGH);
    assert!(rig.bot.sent_to("42").is_empty());
    rig.tick_at(5_100, HIGH);
    assert_eq!(rig.app.alarm_state(), AlarmState::Alarmed);
    assert_eq!(rig.bot.sent_to("42"), [ALARM_MESSAGE]);
    assert_eq!(rig.bot.sent_to("7"), [ALARM_MESSAGE]);

    for t in (6_000..=20_000).step_by(1_000) {
        rig.tick_at(t, HIGH);
    }
    assert_eq!(rig.bot.sent_to("42").len(), 1);

    rig.tick_at(21_000, LOW);
    assert_eq!(rig.app.alarm_state(), AlarmState::Resetting);
    assert_eq!(rig.hw.lamps(), Some((false, false, true)));
    assert!(rig.hw.tone_on());

    rig.tick_at(50_999, LOW);
    assert_eq!(rig.app.alarm_state(), AlarmState::Resetting);
    rig.tick_at(51_000, LOW);
    assert_eq!(rig.app.alarm_state(), AlarmState::Quiescent);
    assert_eq!(rig.hw.tone, [true, false]);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::AlarmReset)), 1);

    // Re-armed: a second excursion notifies again.
    rig.tick_at(52_000, HIGH);
    rig.tick_at(57_000, HIGH);
    assert_eq!(rig.bot.sent_to("42").len(), 2);
    assert_eq!(notified(&rig), 2);
}

#[test]
fn short_excursion_never_notifies() {
    let mut rig = rig_with_subscribers(&["42"]);

    for t in (0..=4_000).step_by(100) {
        rig.tick_at(t, HIGH);
    }
    rig.tick_at(4_100, LOW);
    rig.tick_at(60_000, LOW);

    assert_eq!(rig.app.alarm_state(), AlarmState::Quiescent);
    assert!(rig.bot.sent.is_empty());
    assert_eq!(notified(&rig), 0);
    // Only a full reset clears the tone.
    assert_eq!(rig.hw.tone, [true]);
}

#[test]
fn a_dip_restarts_the_alert_timer() {
    let mut rig = rig_with_subscribers(&["42"]);

    rig.tick_at(0, HIGH);
    rig.tick_at(4_000, HIGH);
    rig.tick_at(4_010, LOW);
    rig.tick_at(4_020, HIGH);
    rig.tick_at(9_000, HIGH);
    assert!(rig.bot.sent.is_empty());
    rig.tick_at(9_020, HIGH);
    assert_eq!(rig.bot.sent_to("42").len(), 1);
}

#[test]
fn flapping_during_reset_does_not_renotify() {
    let mut rig = rig_with_subscribers(&["42"]);

    rig.tick_at(0, HIGH);
    rig.tick_at(5_000, HIGH);
    assert_eq!(rig.bot.sent_to("42").len(), 1);

    // Below for 20 s, back above: still handled.
    rig.tick_at(6_000, LOW);
    rig.tick_at(26_000, LOW);
    rig.tick_at(26_010, HIGH);
    assert_eq!(rig.app.alarm_state(), AlarmState::Alarmed);
    rig.tick_at(40_000, HIGH);
    assert_eq!(rig.bot.sent_to("42").len(), 1);

    // The reset timer starts over from the latest drop.
    rig.tick_at(41_000, LOW);
    rig.tick_at(70_999, LOW);
    assert!(rig.app.alarm_handled());
    rig.tick_at(71_000, LOW);
    assert!(!rig.app.alarm_handled());
}

#[test]
fn failed_send_does_not_stop_the_fan_out() {
    let mut rig = rig_with_subscribers(&["7", "42"]);
    rig.bot.unreachable.push("7".into());

    rig.tick_at(0, HIGH);
    rig.tick_at(5_000, HIGH);

    assert_eq!(rig.bot.sent_to("42"), [ALARM_MESSAGE]);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::AlarmNotified {
            recipients: 2,
            failed: 1,
            ..
        }
    )));
    assert!(rig.app.alarm_handled());
}

#[test]
fn alarm_without_subscribers_still_latches() {
    let mut rig = rig_with_subscribers(&[]);

    rig.tick_at(0, HIGH);
    rig.tick_at(5_000, HIGH);

    assert!(rig.bot.sent.is_empty());
    assert_eq!(rig.app.alarm_state(), AlarmState::Alarmed);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::AlarmNotified { recipients: 0, .. }
    )));
}

#[test]
fn state_changes_are_reported() {
    let mut rig = rig_with_subscribers(&[]);

    rig.tick_at(0, HIGH);
    rig.tick_at(5_000, HIGH);
    rig.tick_at(6_000, LOW);
    rig.tick_at(36_000, LOW);

    let transitions: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::AlarmStateChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        transitions,
        [
            (AlarmState::Quiescent, AlarmState::Triggering),
            (AlarmState::Triggering, AlarmState::Alarmed),
            (AlarmState::Alarmed, AlarmState::Resetting),
            (AlarmState::Resetting, AlarmState::Quiescent),
        ]
    );
}

#[test]
fn start_shows_the_boot_pattern() {
    let mut rig = rig_with_subscribers(&[]);
    rig.app.start(&mut rig.hw, &mut rig.sink);
    assert_eq!(rig.hw.lamps(), Some((false, true, false)));
    assert_eq!(rig.hw.tone, [false]);

    rig.tick_at(0, LOW);
    assert_eq!(rig.hw.lamps(), Some((false, false, true)));
}

#[test]
fn login_subscribe_and_alarm_end_to_end() {
    let mut config = test_config();
    config.alarm_voltage_v = 4.5;
    let mut rig = Rig::new(&config);

    rig.login("42");
    rig.command("42", "/subscribe");
    assert_eq!(SUBSCRIBED.to_vec(&rig.store), ["42"]);

    let t0 = rig.clock.now_ms();
    for t in (t0..=t0 + 6_000).step_by(10) {
        rig.tick_at(t, 5.0);
    }
    let alarms = |rig: &Rig| {
        rig.bot
            .sent_to("42")
            .iter()
            .filter(|m| **m == ALARM_MESSAGE)
            .count()
    };
    assert_eq!(alarms(&rig), 1);
    assert!(rig.hw.tone_on());

    let t1 = rig.clock.now_ms();
    for t in (t1..=t1 + 31_000).step_by(10) {
        rig.tick_at(t, 0.0);
    }
    assert_eq!(alarms(&rig), 1);
    assert!(!rig.hw.tone_on());
    assert!(!rig.app.alarm_handled());
}

#[derive(Default)]
struct CountingWatchdog(Cell<usize>);

impl WatchdogPort for CountingWatchdog {
    fn feed(&self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn fan_out_feeds_the_watchdog_around_every_request() {
    let mut rig = rig_with_subscribers(&["1", "2", "3", "4"]);
    rig.bot.unreachable.push("2".into());
    let dog = CountingWatchdog::default();

    for t in [0, 5_000] {
        rig.clock.set(t);
        rig.hw.volts = HIGH;
        let mut bot = Watched::new(&mut rig.bot, &dog);
        rig.app
            .tick(&rig.clock, &mut rig.hw, &mut bot, &mut rig.store, &mut rig.sink);
    }

    assert_eq!(notified(&rig), 1);
    assert_eq!(rig.bot.sent.len(), 3);
    // Four sends, one of them failing, plus one idle poll at 5 s.
    assert_eq!(rig.bot.offsets.len(), 1);
    assert_eq!(dog.0.get(), 2 * (4 + 1));
}
