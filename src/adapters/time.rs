//! ESP32 time adapter.
//!
//! - [`Esp32Clock`] implements [`ClockPort`]: monotonic milliseconds since
//!   boot, used for alarm debounce and poll scheduling.
//! - [`sync_wall_clock`] runs SNTP against `pool.ntp.org` so TLS
//!   certificate validity checks see the real date.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` for
//!   host-side testing and simulation.

use log::{info, warn};

use crate::app::ports::ClockPort;

/// Wall-clock seconds below this (2020-01-01) mean "not yet synced".
pub const EPOCH_2020: i64 = 1_577_836_800;

/// Monotonic clock for the ESP32 platform.
pub struct Esp32Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Esp32Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl ClockPort for Esp32Clock {
    fn now_ms(&self) -> u64 {
        self.uptime_us() / 1_000
    }
}

/// Seconds since the Unix epoch, or `None` before the first sync.
pub fn wall_clock_secs() -> Option<i64> {
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_secs() as i64;
    (secs >= EPOCH_2020).then_some(secs)
}

/// Block until SNTP has set the wall clock or `timeout_ms` passes.
///
/// The returned handle must be kept alive for periodic resync.
#[cfg(target_os = "espidf")]
pub fn sync_wall_clock(
    timeout_ms: u32,
) -> Result<esp_idf_svc::sntp::EspSntp<'static>, esp_idf_svc::sys::EspError> {
    use esp_idf_svc::hal::delay::FreeRtos;
    use esp_idf_svc::sntp::{EspSntp, SyncStatus};

    const STEP_MS: u32 = 100;

    info!("Time: syncing with pool.ntp.org");
    let sntp = EspSntp::new_default()?;
    let mut waited = 0;
    while sntp.get_sync_status() != SyncStatus::Completed && waited < timeout_ms {
        FreeRtos::delay_ms(STEP_MS);
        waited += STEP_MS;
    }
    match wall_clock_secs() {
        Some(secs) => info!("Time: wall clock synced ({} s since epoch)", secs),
        None => warn!("Time: SNTP not synced after {} ms; TLS may fail", timeout_ms),
    }
    Ok(sntp)
}

/// Simulation: the host clock is already correct.
#[cfg(not(target_os = "espidf"))]
pub fn sync_wall_clock(_timeout_ms: u32) -> Result<(), core::convert::Infallible> {
    match wall_clock_secs() {
        Some(secs) => info!("Time(sim): host clock at {} s since epoch", secs),
        None => warn!("Time(sim): host clock before 2020"),
    }
    Ok(())
}
