//! Line Alarm Firmware: Main Entry Point
//!
//! Hexagonal architecture driven by a fixed-period control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        LogEventSink   NvsAdapter  Esp32Clock  │
//! │  (Voltage+Indicator     (EventSink)    (Config+    (ClockPort) │
//! │   +Tone)                               Storage)                │
//! │  TelegramAdapter        WifiAdapter                            │
//! │  (MessagePort)          (link upkeep)                          │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  AlarmMonitor · CommandPoller · CommandInterpreter     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::{Result, anyhow};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use log::{error, info, warn};

use linealarm::adapters::hardware::HardwareAdapter;
use linealarm::adapters::log_sink::LogEventSink;
use linealarm::adapters::nvs::NvsAdapter;
use linealarm::adapters::telegram::TelegramAdapter;
use linealarm::adapters::time::{Esp32Clock, sync_wall_clock};
use linealarm::adapters::wifi::WifiAdapter;
use linealarm::app::ports::{ClockPort, ConfigPort, Watched};
use linealarm::app::service::AppService;
use linealarm::config::SystemConfig;
use linealarm::drivers::{hw_init, status_led::StatusLamps, tone::ToneDriver, watchdog::Watchdog};
use linealarm::error::Error;
use linealarm::sensors::line_voltage::LineVoltageSensor;

const SNTP_TIMEOUT_MS: u32 = 15_000;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Line alarm v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    log_clocks();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let mut nvs = NvsAdapter::new().map_err(|e| anyhow!("NVS init failed: {e}"))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Peripherals and hardware adapter ───────────────────
    if let Err(e) = hw_init::init_peripherals() {
        error!("HAL init failed: {}", e);
        return Err(e.into());
    }
    let tone = ToneDriver::new(config.dialtone_frequency_hz).map_err(Error::from)?;
    let mut hw = HardwareAdapter::new(LineVoltageSensor::new(), StatusLamps::new(), tone);

    let mut sink = LogEventSink::new();
    let mut app = AppService::new(&config);
    app.start(&mut hw, &mut sink);

    // ── 4. Network bring-up ───────────────────────────────────
    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, &config)?;
    match wifi.connect() {
        Ok(()) => {
            if let Some(net) = wifi.network_info() {
                info!(
                    "Network: ssid='{}' host={} ip={} gw={} dns={}",
                    net.ssid,
                    wifi.hostname(),
                    net.ip,
                    net.gateway,
                    net.dns.as_deref().unwrap_or("-"),
                );
            }
            wifi.ping_gateway();
        }
        Err(e) => warn!("WiFi: {} (retrying in the background)", e),
    }

    // Keeps SNTP resyncing for the lifetime of the firmware.
    let _sntp = match sync_wall_clock(SNTP_TIMEOUT_MS) {
        Ok(sntp) => Some(sntp),
        Err(e) => {
            warn!("SNTP start failed: {}", e);
            None
        }
    };

    let clock = Esp32Clock::new();
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);
    let mut bot = Watched::new(TelegramAdapter::new(&config.bot_token), &watchdog);

    info!("System ready. Entering control loop.");

    // ── 5. Control loop ───────────────────────────────────────
    loop {
        wifi.maintain(clock.now_ms());
        app.tick(&clock, &mut hw, &mut bot, &mut nvs, &mut sink);
        watchdog.feed();
        FreeRtos::delay_ms(config.control_loop_interval_ms);
    }
}

/// Core id and CPU/XTAL/APB clock frequencies.
fn log_clocks() {
    use esp_idf_svc::sys::{
        rtc_clk_apb_freq_get, rtc_clk_cpu_freq_get_config, rtc_clk_xtal_freq_get,
        rtc_cpu_freq_config_t,
    };

    let mut cpu = rtc_cpu_freq_config_t::default();
    let (xtal_mhz, apb_hz) = unsafe {
        rtc_clk_cpu_freq_get_config(&mut cpu);
        (rtc_clk_xtal_freq_get(), rtc_clk_apb_freq_get())
    };
    info!(
        "Core {:?}, CPU {} MHz, XTAL {} MHz, APB {} MHz",
        esp_idf_svc::hal::cpu::core(),
        cpu.freq_mhz,
        xtal_mhz,
        apb_hz / 1_000_000,
    );
}
