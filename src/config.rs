//! System configuration parameters
//!
//! All tunable parameters for the line alarm.  Defaults for secrets and
//! WiFi credentials are baked in from the build environment
//! (`EFA_TELEGRAM_TOKEN`, `EFA_BOT_PASSWORD`, `EFA_WIFI_SSID`,
//! `EFA_WIFI_PASSWORD`); everything can be overridden by a config blob
//! stored in NVS.

use serde::{Deserialize, Serialize};

/// Maximum number of WiFi networks tried at boot.
pub const MAX_WIFI_NETWORKS: usize = 4;

/// One station-mode network the firmware may join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub ssid: heapless::String<32>,
    pub password: heapless::String<64>,
}

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Alarm detection ---
    /// Line voltage (V) at or above which the line counts as tripped
    pub alarm_voltage_v: f32,
    /// Time above threshold before the dialtone is switched on (ms)
    pub dialtone_delay_ms: u32,
    /// Time above threshold before subscribers are notified (ms)
    pub alert_duration_ms: u32,
    /// Time below threshold before a handled alarm re-arms (ms)
    pub reset_duration_ms: u32,

    // --- Bot polling ---
    /// Fastest poll interval, used while commands are arriving (ms)
    pub min_poll_interval_ms: u32,
    /// Slowest poll interval reached by idle backoff (ms)
    pub max_poll_interval_ms: u32,
    /// Interval growth factor applied after every idle poll
    pub poll_backoff_factor: f32,
    /// Upper bound on back-to-back polls in one drain cycle
    pub max_drain_batches: u16,

    // --- Timing ---
    /// Control loop period (ms)
    pub control_loop_interval_ms: u32,
    /// Task watchdog timeout (ms)
    pub watchdog_timeout_ms: u32,

    // --- Tone output ---
    /// Dialtone frequency emitted on the line (Hz)
    pub dialtone_frequency_hz: u32,

    // --- Network / bot ---
    pub hostname: heapless::String<32>,
    pub wifi_networks: heapless::Vec<WifiNetwork, MAX_WIFI_NETWORKS>,
    pub bot_token: heapless::String<64>,
    pub bot_password: heapless::String<64>,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut wifi_networks = heapless::Vec::new();
        if let Some(ssid) = option_env!("EFA_WIFI_SSID") {
            let _ = wifi_networks.push(WifiNetwork {
                ssid: bounded(ssid),
                password: bounded(option_env!("EFA_WIFI_PASSWORD").unwrap_or("")),
            });
        }

        Self {
            // Alarm detection
            alarm_voltage_v: 1.5,
            dialtone_delay_ms: 1_000,
            alert_duration_ms: 5_000,
            reset_duration_ms: 30_000,

            // Bot polling
            min_poll_interval_ms: 1_000,
            max_poll_interval_ms: 10_000,
            poll_backoff_factor: 1.001,
            max_drain_batches: 16,

            // Timing
            control_loop_interval_ms: 10, // 100 Hz
            watchdog_timeout_ms: 60_000,

            // Tone
            dialtone_frequency_hz: 425,

            // Network / bot
            hostname: bounded("efa-alarm"),
            wifi_networks,
            bot_token: bounded(option_env!("EFA_TELEGRAM_TOKEN").unwrap_or("")),
            bot_password: bounded(option_env!("EFA_BOT_PASSWORD").unwrap_or("")),
        }
    }
}

/// Copy `s` into a fixed-capacity string, truncating on a char boundary.
pub fn bounded<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}
