//! GPIO / peripheral pin assignments for the line alarm board (ESP32).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Status lamps (discrete LEDs, active HIGH)
// ---------------------------------------------------------------------------

pub const ERROR_LED_GPIO: i32 = 21;
pub const WARN_LED_GPIO: i32 = 22;
pub const OK_LED_GPIO: i32 = 23;

// ---------------------------------------------------------------------------
// Line receive: analog (ADC1)
// ---------------------------------------------------------------------------

/// Sensed line voltage through the input divider.
/// ADC1 channel 6 (GPIO 34 on ESP32).
pub const LINE_RECEIVE_GPIO: i32 = 34;
pub const LINE_RECEIVE_ADC1_CHANNEL: u32 = 6;
/// Full-scale input at 12 dB attenuation, in millivolts.
pub const LINE_RECEIVE_FULL_SCALE_MV: u32 = 3_100;
/// 12-bit oneshot reads.
pub const LINE_RECEIVE_MAX_RAW: u32 = 4_095;

// ---------------------------------------------------------------------------
// Line transmit: DAC cosine generator
// ---------------------------------------------------------------------------

/// DAC channel 1 (GPIO 25 on ESP32).
pub const LINE_TRANSMIT_GPIO: i32 = 25;
pub const LINE_TRANSMIT_DAC_CHANNEL: u32 = 0;
