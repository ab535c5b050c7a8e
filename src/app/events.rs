//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; on target they go to the serial log.

use crate::alarm::AlarmState;
use crate::poller::PollReport;

/// Structured events emitted by the application core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The service has started and the indicator shows the boot pattern.
    Started,

    /// The derived alarm state moved.
    AlarmStateChanged { from: AlarmState, to: AlarmState },

    /// The dialtone was switched on or off.
    ToneChanged(bool),

    /// The alarm message was fanned out.
    AlarmNotified {
        volts: f32,
        recipients: usize,
        /// Sends that the transport reported as failed.
        failed: usize,
    },

    /// A handled alarm re-armed after a full reset period.
    AlarmReset,

    /// A poll cycle completed.
    Polled(PollReport),

    /// One inbound command was acted on.
    CommandHandled { chat_id: String, command: &'static str },

    /// Snapshot taken after each poll cycle.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub state: AlarmState,
    pub line_voltage: f32,
    pub poll_interval_ms: u32,
    pub tone_on: bool,
}
