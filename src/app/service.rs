//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the alarm monitor, the command poller, and the
//! command interpreter.  All I/O flows through port traits injected at
//! call sites, so the whole service runs on the host with mock adapters.
//!
//! ```text
//!  VoltagePort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!  MessagePort ◀──▶│       AppService       │ ──▶ IndicatorPort
//!  StoragePort ◀──▶│ Alarm · Poller · Cmds  │ ──▶ TonePort
//!                  └────────────────────────┘
//! ```

use log::{info, warn};

use crate::alarm::{AlarmMonitor, AlarmState, AlarmTiming, IndicatorPattern};
use crate::config::SystemConfig;
use crate::poller::CommandPoller;

use super::events::{AppEvent, TelemetryData};
use super::interpreter::{ALARM_MESSAGE, CommandInterpreter, SUBSCRIBED};
use super::ports::{
    ClockPort, EventSink, IndicatorPort, MessagePort, ParseMode, StoragePort, TonePort,
    VoltagePort,
};

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    alarm: AlarmMonitor,
    poller: CommandPoller,
    interpreter: CommandInterpreter,
    line_voltage: f32,
    indicator: IndicatorPattern,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch any output; call [`start`](Self::start) next.
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            alarm: AlarmMonitor::new(AlarmTiming::from(config)),
            poller: CommandPoller::new(config),
            interpreter: CommandInterpreter::new(&config.bot_password),
            line_voltage: 0.0,
            indicator: IndicatorPattern::Booting,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Show the boot pattern and silence the tone.
    pub fn start(&mut self, hw: &mut (impl IndicatorPort + TonePort), sink: &mut impl EventSink) {
        let (e, w, o) = IndicatorPattern::Booting.lights();
        hw.set_indicator(e, w, o);
        hw.set_tone(false);
        sink.emit(&AppEvent::Started);
        info!("AppService started");
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: poll commands if due, read the line, run
    /// the alarm machine, then apply its side effects.
    ///
    /// `hw` satisfies all three hardware ports, which avoids a triple
    /// mutable borrow while keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        clock: &impl ClockPort,
        hw: &mut (impl VoltagePort + IndicatorPort + TonePort),
        bot: &mut impl MessagePort,
        store: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;

        // 1. Commands, answered with the previous reading
        let interpreter = &self.interpreter;
        let voltage = self.line_voltage;
        let report = self.poller.poll_if_due(clock, bot, store, |store, bot, batch| {
            for msg in batch {
                if let Some(command) = interpreter.handle(msg, voltage, bot, store) {
                    sink.emit(&AppEvent::CommandHandled {
                        chat_id: msg.chat_id.clone(),
                        command,
                    });
                }
            }
        });

        // 2. Sample
        self.line_voltage = hw.read_volts();

        // 3. Alarm machine
        let prev = self.alarm.state();
        let step = self.alarm.update(self.line_voltage, clock.now_ms());
        let state = self.alarm.state();
        if state != prev {
            sink.emit(&AppEvent::AlarmStateChanged { from: prev, to: state });
        }

        // 4. Side effects
        if let Some(on) = step.tone {
            hw.set_tone(on);
            sink.emit(&AppEvent::ToneChanged(on));
        }
        if step.indicator != self.indicator {
            let (e, w, o) = step.indicator.lights();
            hw.set_indicator(e, w, o);
            self.indicator = step.indicator;
        }
        if step.notify {
            self.notify_subscribers(bot, store, sink);
        }
        if step.reset {
            sink.emit(&AppEvent::AlarmReset);
        }

        if let Some(report) = report {
            sink.emit(&AppEvent::Polled(report));
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    /// Send the alarm message to every subscriber.  A failed send is
    /// counted and skipped; the rest still go out.
    fn notify_subscribers(
        &self,
        bot: &mut impl MessagePort,
        store: &impl StoragePort,
        sink: &mut impl EventSink,
    ) {
        let recipients = SUBSCRIBED.to_vec(store);
        let mut failed = 0;
        for chat in &recipients {
            if let Err(e) = bot.send(chat, ALARM_MESSAGE, ParseMode::Markdown) {
                warn!("Alarm notification to {} failed: {}", chat, e);
                failed += 1;
            }
        }
        if recipients.is_empty() {
            warn!("Alarm tripped with no subscribers");
        }
        sink.emit(&AppEvent::AlarmNotified {
            volts: self.line_voltage,
            recipients: recipients.len(),
            failed,
        });
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self) -> TelemetryData {
        TelemetryData {
            state: self.alarm.state(),
            line_voltage: self.line_voltage,
            poll_interval_ms: self.poller.interval_ms(),
            tone_on: self.alarm.tone_on(),
        }
    }

    pub fn alarm_state(&self) -> AlarmState {
        self.alarm.state()
    }

    /// Whether the notification has fired for the current excursion.
    pub fn alarm_handled(&self) -> bool {
        self.alarm.is_handled()
    }

    /// Last sampled line voltage.
    pub fn line_voltage(&self) -> f32 {
        self.line_voltage
    }

    pub fn poll_interval_ms(&self) -> u32 {
        self.poller.interval_ms()
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
