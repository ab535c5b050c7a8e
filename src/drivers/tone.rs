//! Dialtone output on the line-transmit DAC.
//!
//! Uses the ESP-IDF DAC cosine-wave generator, so the tone runs in
//! hardware with no CPU involvement once started.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: owns a `dac_cosine_handle_t` on DAC channel 1 (GPIO 25).
//! On host/test: tracks state in-memory only.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

use crate::error::ActuatorError;

pub struct ToneDriver {
    #[cfg(target_os = "espidf")]
    handle: dac_cosine_handle_t,
    frequency_hz: u32,
    on: bool,
}

impl ToneDriver {
    #[cfg(target_os = "espidf")]
    pub fn new(frequency_hz: u32) -> Result<Self, ActuatorError> {
        let cfg = dac_cosine_config_t {
            chan_id: crate::pins::LINE_TRANSMIT_DAC_CHANNEL,
            freq_hz: frequency_hz,
            clk_src: soc_periph_dac_cosine_clk_src_t_DAC_COSINE_CLK_SRC_DEFAULT,
            atten: dac_cosine_atten_t_DAC_COSINE_ATTEN_DB_6,
            phase: dac_cosine_phase_t_DAC_COSINE_PHASE_0,
            offset: 32,
            ..Default::default()
        };
        let mut handle: dac_cosine_handle_t = core::ptr::null_mut();
        // SAFETY: cfg outlives the call; handle is written on success only.
        let ret = unsafe { dac_cosine_new_channel(&cfg, &mut handle) };
        if ret != ESP_OK {
            return Err(ActuatorError::DacFailed(ret));
        }
        info!(
            "Tone: DAC cosine generator ready ({} Hz, GPIO {})",
            frequency_hz,
            crate::pins::LINE_TRANSMIT_GPIO
        );
        Ok(Self {
            handle,
            frequency_hz,
            on: false,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(frequency_hz: u32) -> Result<Self, ActuatorError> {
        info!("Tone(sim): {} Hz", frequency_hz);
        Ok(Self {
            frequency_hz,
            on: false,
        })
    }

    /// Start or stop the tone.  Repeating the current level is a no-op.
    pub fn set(&mut self, enabled: bool) -> Result<(), ActuatorError> {
        if enabled == self.on {
            return Ok(());
        }
        self.apply(enabled)?;
        self.on = enabled;
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn apply(&mut self, enabled: bool) -> Result<(), ActuatorError> {
        // SAFETY: handle came from dac_cosine_new_channel and is never freed.
        let ret = unsafe {
            if enabled {
                dac_cosine_start(self.handle)
            } else {
                dac_cosine_stop(self.handle)
            }
        };
        if ret != ESP_OK {
            return Err(ActuatorError::DacFailed(ret));
        }
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn apply(&mut self, _enabled: bool) -> Result<(), ActuatorError> {
        Ok(())
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn frequency_hz(&self) -> u32 {
        self.frequency_hz
    }
}
