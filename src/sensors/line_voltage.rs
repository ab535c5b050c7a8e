//! Line-receive voltage sampler.
//!
//! Reads the divided line voltage on ADC1 and converts the raw 12-bit
//! count to volts using the full-scale input at 12 dB attenuation.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH6 via the oneshot API (initialised by hw_init).
//! On host/test: reads millivolts from a static `AtomicU32` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU32, Ordering};

use crate::error::SensorError;
use crate::pins;

#[cfg(not(target_os = "espidf"))]
static SIM_LINE_MV: AtomicU32 = AtomicU32::new(0);

/// Inject the line voltage seen by every simulated sampler, in mV.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_line_mv(mv: u32) {
    SIM_LINE_MV.store(mv, Ordering::Relaxed);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineReading {
    pub raw: u16,
    pub millivolts: u32,
    pub volts: f32,
}

pub struct LineVoltageSensor;

impl Default for LineVoltageSensor {
    fn default() -> Self {
        Self::new()
    }
}

impl LineVoltageSensor {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&mut self) -> Result<LineReading, SensorError> {
        let raw = self.read_adc()?;
        let millivolts = raw_to_millivolts(raw);
        Ok(LineReading {
            raw,
            millivolts,
            volts: millivolts as f32 / 1000.0,
        })
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        crate::drivers::hw_init::adc1_read(pins::LINE_RECEIVE_ADC1_CHANNEL)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        Ok(millivolts_to_raw(SIM_LINE_MV.load(Ordering::Relaxed)))
    }
}

/// Linear raw-count to millivolt conversion, clamped to full scale.
pub fn raw_to_millivolts(raw: u16) -> u32 {
    let raw = u32::from(raw).min(pins::LINE_RECEIVE_MAX_RAW);
    raw * pins::LINE_RECEIVE_FULL_SCALE_MV / pins::LINE_RECEIVE_MAX_RAW
}

#[cfg(not(target_os = "espidf"))]
fn millivolts_to_raw(mv: u32) -> u16 {
    let mv = mv.min(pins::LINE_RECEIVE_FULL_SCALE_MV);
    // Round up so the round trip through raw_to_millivolts is lossless.
    mv.saturating_mul(pins::LINE_RECEIVE_MAX_RAW)
        .div_ceil(pins::LINE_RECEIVE_FULL_SCALE_MV) as u16
}
