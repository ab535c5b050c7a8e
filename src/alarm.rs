//! Alarm detection: debounce, single-fire notification, and re-arm.
//!
//! [`AlarmMonitor`] is fed one voltage reading per control tick together
//! with a millisecond timestamp.  It keeps only three timing fields; the
//! four conceptual states are derived from them by [`AlarmMonitor::state`].
//!
//! ```text
//!             v >= thr                    elapsed >= alert
//!  Quiescent ─────────▶ Triggering ───────────────────────▶ Alarmed
//!      ▲                    │ v < thr                          │ v < thr
//!      │◀───────────────────┘                                  ▼
//!      │          below for reset_duration               Resetting
//!      └──────────────────────────────────────────────────────┘
//!                       (v >= thr again ──▶ back to Alarmed)
//! ```
//!
//! Timestamps are compared with `saturating_sub`, so irregular or even
//! repeated tick times are harmless.

use crate::config::SystemConfig;

/// Conceptual alarm state, derived from the timing fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmState {
    /// Below threshold with no pending alarm.
    Quiescent,
    /// Above threshold, notification not yet sent.
    Triggering,
    /// Above threshold, notification sent for this excursion.
    Alarmed,
    /// Below threshold after a notification, waiting to re-arm.
    Resetting,
}

/// Lamp pattern requested by the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndicatorPattern {
    /// Warn lamp only; shown until the first control tick.
    Booting,
    /// Ok lamp only.
    Normal,
    /// Error and ok lamps.
    Alarm,
}

impl IndicatorPattern {
    /// `(error, warn, ok)` lamp levels.
    pub fn lights(self) -> (bool, bool, bool) {
        match self {
            Self::Booting => (false, true, false),
            Self::Normal => (false, false, true),
            Self::Alarm => (true, false, true),
        }
    }
}

/// Threshold and debounce durations, copied out of [`SystemConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlarmTiming {
    pub threshold_v: f32,
    pub dialtone_delay_ms: u64,
    pub alert_duration_ms: u64,
    pub reset_duration_ms: u64,
}

impl From<&SystemConfig> for AlarmTiming {
    fn from(c: &SystemConfig) -> Self {
        Self {
            threshold_v: c.alarm_voltage_v,
            dialtone_delay_ms: u64::from(c.dialtone_delay_ms),
            alert_duration_ms: u64::from(c.alert_duration_ms),
            reset_duration_ms: u64::from(c.reset_duration_ms),
        }
    }
}

/// Side effects requested by one [`AlarmMonitor::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmStep {
    /// `Some(level)` when the tone output must change.
    pub tone: Option<bool>,
    /// Fan the alarm message out to every subscriber.
    pub notify: bool,
    /// The handled alarm re-armed on this tick.
    pub reset: bool,
    pub indicator: IndicatorPattern,
}

/// The alarm debounce machine.
#[derive(Debug, Clone)]
pub struct AlarmMonitor {
    timing: AlarmTiming,
    trigger_start: Option<u64>,
    reset_start: Option<u64>,
    handled: bool,
    above: bool,
    tone_on: bool,
}

impl AlarmMonitor {
    pub fn new(timing: AlarmTiming) -> Self {
        Self {
            timing,
            trigger_start: None,
            reset_start: None,
            handled: false,
            above: false,
            tone_on: false,
        }
    }

    /// Evaluate one reading taken at `now_ms`.
    ///
    /// A NaN reading compares below the threshold.
    pub fn update(&mut self, volts: f32, now_ms: u64) -> AlarmStep {
        let mut step = AlarmStep {
            tone: None,
            notify: false,
            reset: false,
            indicator: IndicatorPattern::Normal,
        };

        self.above = volts >= self.timing.threshold_v;

        if self.above {
            let start = *self.trigger_start.get_or_insert(now_ms);
            let elapsed = now_ms.saturating_sub(start);

            if elapsed >= self.timing.dialtone_delay_ms && !self.tone_on {
                self.tone_on = true;
                step.tone = Some(true);
            }
            if elapsed >= self.timing.alert_duration_ms && !self.handled {
                self.handled = true;
                step.notify = true;
            }
            self.reset_start = None;
            step.indicator = IndicatorPattern::Alarm;
        } else {
            if self.handled {
                let start = *self.reset_start.get_or_insert(now_ms);
                if now_ms.saturating_sub(start) >= self.timing.reset_duration_ms {
                    self.reset_start = None;
                    self.handled = false;
                    step.reset = true;
                    if self.tone_on {
                        self.tone_on = false;
                        step.tone = Some(false);
                    }
                }
            }
            self.trigger_start = None;
        }

        step
    }

    pub fn state(&self) -> AlarmState {
        match (self.above, self.handled) {
            (false, false) => AlarmState::Quiescent,
            (true, false) => AlarmState::Triggering,
            (true, true) => AlarmState::Alarmed,
            (false, true) => AlarmState::Resetting,
        }
    }

    /// Whether the notification has fired for the current excursion.
    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn tone_on(&self) -> bool {
        self.tone_on
    }

    pub fn timing(&self) -> &AlarmTiming {
        &self.timing
    }
}
