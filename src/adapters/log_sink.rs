//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Each line starts with a fixed tag so serial captures can be grepped.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | state={:?} | line={:.2}V | tone={} | poll={}ms",
                    t.state,
                    t.line_voltage,
                    if t.tone_on { "on" } else { "off" },
                    t.poll_interval_ms,
                );
            }
            AppEvent::AlarmStateChanged { from, to } => {
                info!("ALARM | {:?} -> {:?}", from, to);
            }
            AppEvent::ToneChanged(on) => {
                info!("TONE | {}", if *on { "on" } else { "off" });
            }
            AppEvent::AlarmNotified {
                volts,
                recipients,
                failed,
            } => {
                if *failed > 0 {
                    warn!(
                        "NOTIFY | line={:.2}V | {}/{} sends failed",
                        volts, failed, recipients
                    );
                } else {
                    info!("NOTIFY | line={:.2}V | recipients={}", volts, recipients);
                }
            }
            AppEvent::AlarmReset => {
                info!("ALARM | re-armed");
            }
            AppEvent::Polled(r) => {
                info!(
                    "POLL | messages={} batches={}{} | next in {}ms",
                    r.messages,
                    r.batches,
                    if r.capped { " (capped)" } else { "" },
                    r.interval_ms,
                );
            }
            AppEvent::CommandHandled { chat_id, command } => {
                info!("CMD | {} from {}", command, chat_id);
            }
            AppEvent::Started => {
                info!("START | monitoring line");
            }
        }
    }
}
