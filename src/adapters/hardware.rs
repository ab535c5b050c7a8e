//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the line sampler, the status lamps and the tone driver, exposing
//! them through [`VoltagePort`], [`IndicatorPort`] and [`TonePort`].
//! This is the only module in the system that touches actual hardware.
//! On non-espidf targets, the underlying drivers use cfg-gated simulation
//! stubs.

use log::warn;

use crate::app::ports::{IndicatorPort, TonePort, VoltagePort};
use crate::drivers::status_led::StatusLamps;
use crate::drivers::tone::ToneDriver;
use crate::sensors::line_voltage::LineVoltageSensor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter {
    line: LineVoltageSensor,
    lamps: StatusLamps,
    tone: ToneDriver,
    last_volts: f32,
}

impl HardwareAdapter {
    pub fn new(line: LineVoltageSensor, lamps: StatusLamps, tone: ToneDriver) -> Self {
        Self {
            line,
            lamps,
            tone,
            last_volts: 0.0,
        }
    }
}

// ── VoltagePort implementation ────────────────────────────────

impl VoltagePort for HardwareAdapter {
    /// A failed conversion repeats the previous good reading.
    fn read_volts(&mut self) -> f32 {
        match self.line.read() {
            Ok(reading) => self.last_volts = reading.volts,
            Err(e) => warn!("Line sample failed: {}", e),
        }
        self.last_volts
    }
}

// ── Output ports ──────────────────────────────────────────────

impl IndicatorPort for HardwareAdapter {
    fn set_indicator(&mut self, error: bool, warn: bool, ok: bool) {
        self.lamps.set(error, warn, ok);
    }
}

impl TonePort for HardwareAdapter {
    fn set_tone(&mut self, enabled: bool) {
        if let Err(e) = self.tone.set(enabled) {
            warn!("Failed to {} dialtone: {}", if enabled { "enable" } else { "disable" }, e);
        }
    }
}
