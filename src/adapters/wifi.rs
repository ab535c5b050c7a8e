//! WiFi station-mode adapter.
//!
//! Joins the first reachable network from `SystemConfig::wifi_networks`,
//! sets the DHCP hostname, and keeps the link up for the bot transport.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver via
//!   `esp_idf_svc::wifi::BlockingWifi`.
//! - **all other targets**: simulation stubs for host-side tests.
//!
//! ## Reconnection policy
//!
//! When the link drops the adapter retries through the whole network
//! list, waiting an exponential backoff (2 s → 4 s → 8 s … capped at
//! 60 s) between rounds.  [`WifiAdapter::maintain`] is cheap to call
//! every control tick; it only blocks while an attempt is running.

use core::fmt;
use log::{error, info, warn};

use crate::config::{MAX_WIFI_NETWORKS, SystemConfig, WifiNetwork};

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    ipv4::Ipv4Addr,
    wifi::{AuthMethod, BlockingWifi, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Errors
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityError {
    NoCredentials,
    InvalidSsid,
    InvalidPassword,
    ConnectionFailed,
}

impl fmt::Display for ConnectivityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCredentials => write!(f, "no WiFi networks configured"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::ConnectionFailed => write!(f, "no configured WiFi network could be joined"),
        }
    }
}

impl core::error::Error for ConnectivityError {}

impl From<ConnectivityError> for crate::error::Error {
    fn from(_: ConnectivityError) -> Self {
        Self::Comms(crate::error::CommsError::WifiConnectFailed)
    }
}

// ───────────────────────────────────────────────────────────────
// Connection state
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WifiState {
    Disconnected,
    /// Joined `networks[index]`.
    Connected { index: usize },
    Reconnecting { attempt: u32 },
}

const INITIAL_BACKOFF_MS: u32 = 2_000;
const MAX_BACKOFF_MS: u32 = 60_000;

/// Exponential retry schedule for reconnect rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectBackoff {
    delay_ms: u32,
    next_attempt_ms: Option<u64>,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new()
    }
}

impl ReconnectBackoff {
    pub const fn new() -> Self {
        Self {
            delay_ms: INITIAL_BACKOFF_MS,
            next_attempt_ms: None,
        }
    }

    /// Whether an attempt may start at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        self.next_attempt_ms.is_none_or(|t| now_ms >= t)
    }

    /// Record a failed round at `now_ms` and schedule the next one.
    pub fn failed(&mut self, now_ms: u64) {
        self.next_attempt_ms = Some(now_ms + u64::from(self.delay_ms));
        self.delay_ms = self.delay_ms.saturating_mul(2).min(MAX_BACKOFF_MS);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Wait applied after the next failure.
    pub fn delay_ms(&self) -> u32 {
        self.delay_ms
    }
}

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

/// Space through tilde only.
fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

fn validate_ssid(ssid: &str) -> Result<(), ConnectivityError> {
    if ssid.is_empty() || ssid.len() > 32 || !is_printable_ascii(ssid) {
        return Err(ConnectivityError::InvalidSsid);
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), ConnectivityError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(ConnectivityError::InvalidPassword);
    }
    Ok(())
}

/// Network details logged after the link comes up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub ssid: heapless::String<32>,
    pub ip: String,
    pub gateway: String,
    pub dns: Option<String>,
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

pub struct WifiAdapter {
    networks: heapless::Vec<WifiNetwork, MAX_WIFI_NETWORKS>,
    hostname: heapless::String<32>,
    state: WifiState,
    backoff: ReconnectBackoff,
    #[cfg(target_os = "espidf")]
    wifi: BlockingWifi<EspWifi<'static>>,
    /// Simulation: whether the fake access point is reachable.
    #[cfg(not(target_os = "espidf"))]
    sim_link_up: bool,
}

impl WifiAdapter {
    /// Keep only networks with valid credentials, in configured order.
    fn usable_networks(config: &SystemConfig) -> heapless::Vec<WifiNetwork, MAX_WIFI_NETWORKS> {
        config
            .wifi_networks
            .iter()
            .filter(|n| match validate_ssid(&n.ssid).and(validate_password(&n.password)) {
                Ok(()) => true,
                Err(e) => {
                    warn!("WiFi: skipping network '{}': {}", n.ssid, e);
                    false
                }
            })
            .cloned()
            .collect()
    }

    #[cfg(target_os = "espidf")]
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        config: &SystemConfig,
    ) -> Result<Self, esp_idf_svc::sys::EspError> {
        let wifi = BlockingWifi::wrap(EspWifi::new(modem, sysloop.clone(), None)?, sysloop)?;
        Ok(Self {
            networks: Self::usable_networks(config),
            hostname: config.hostname.clone(),
            state: WifiState::Disconnected,
            backoff: ReconnectBackoff::new(),
            wifi,
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            networks: Self::usable_networks(config),
            hostname: config.hostname.clone(),
            state: WifiState::Disconnected,
            backoff: ReconnectBackoff::new(),
            sim_link_up: true,
        }
    }

    pub fn state(&self) -> WifiState {
        self.state
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Try every configured network in order until one connects.
    pub fn connect(&mut self) -> Result<(), ConnectivityError> {
        if self.networks.is_empty() {
            return Err(ConnectivityError::NoCredentials);
        }

        for index in 0..self.networks.len() {
            info!("WiFi: connecting to '{}'", self.networks[index].ssid);
            match self.platform_connect(index) {
                Ok(()) => {
                    self.state = WifiState::Connected { index };
                    self.backoff.reset();
                    info!("WiFi: connected to '{}'", self.networks[index].ssid);
                    return Ok(());
                }
                Err(e) => warn!("WiFi: '{}' failed: {}", self.networks[index].ssid, e),
            }
        }

        error!("WiFi: no configured network reachable");
        if self.state == WifiState::Disconnected {
            self.state = WifiState::Reconnecting { attempt: 0 };
        }
        Err(ConnectivityError::ConnectionFailed)
    }

    /// Detect link loss and run reconnect rounds on the backoff schedule.
    pub fn maintain(&mut self, now_ms: u64) {
        match self.state {
            WifiState::Connected { .. } => {
                if !self.platform_is_connected() {
                    warn!("WiFi: connection lost, entering reconnect");
                    self.state = WifiState::Reconnecting { attempt: 0 };
                }
            }
            WifiState::Reconnecting { attempt } if self.backoff.is_due(now_ms) => {
                info!("WiFi: reconnect attempt {} (next backoff {} ms)", attempt, self.backoff.delay_ms());
                if self.connect().is_err() {
                    self.backoff.failed(now_ms);
                    self.state = WifiState::Reconnecting { attempt: attempt + 1 };
                }
            }
            _ => {}
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, WifiState::Connected { .. }) && self.platform_is_connected()
    }

    // ── Platform-specific ─────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn platform_connect(&mut self, index: usize) -> Result<(), esp_idf_svc::sys::EspError> {
        let net = &self.networks[index];
        let auth_method = if net.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        if self.wifi.is_started()? {
            let _ = self.wifi.disconnect();
            self.wifi.stop()?;
        }
        self.wifi.set_configuration(&Configuration::Client(ClientConfiguration {
            ssid: net.ssid.clone(),
            password: net.password.clone(),
            auth_method,
            ..Default::default()
        }))?;
        self.wifi.wifi_mut().sta_netif_mut().set_hostname(&self.hostname)?;
        self.wifi.start()?;
        self.wifi.connect()?;
        self.wifi.wait_netif_up()?;
        Ok(())
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_connect(&mut self, index: usize) -> Result<(), ConnectivityError> {
        if self.sim_link_up {
            info!("WiFi(sim): joined '{}'", self.networks[index].ssid);
            Ok(())
        } else {
            Err(ConnectivityError::ConnectionFailed)
        }
    }

    #[cfg(target_os = "espidf")]
    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn platform_is_connected(&self) -> bool {
        self.sim_link_up
    }

    /// Simulation: make the fake access point reachable or not.
    #[cfg(not(target_os = "espidf"))]
    pub fn sim_set_link(&mut self, up: bool) {
        self.sim_link_up = up;
    }

    // ── Diagnostics ───────────────────────────────────────────

    #[cfg(target_os = "espidf")]
    fn gateway(&self) -> Option<Ipv4Addr> {
        self.wifi
            .wifi()
            .sta_netif()
            .get_ip_info()
            .ok()
            .map(|ip| ip.subnet.gateway)
    }

    #[cfg(target_os = "espidf")]
    pub fn network_info(&self) -> Option<NetworkInfo> {
        let WifiState::Connected { index } = self.state else {
            return None;
        };
        let ip = self.wifi.wifi().sta_netif().get_ip_info().ok()?;
        Some(NetworkInfo {
            ssid: self.networks[index].ssid.clone(),
            ip: ip.ip.to_string(),
            gateway: ip.subnet.gateway.to_string(),
            dns: ip.dns.map(|d| d.to_string()),
        })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn network_info(&self) -> Option<NetworkInfo> {
        let WifiState::Connected { index } = self.state else {
            return None;
        };
        Some(NetworkInfo {
            ssid: self.networks[index].ssid.clone(),
            ip: "10.0.0.2".into(),
            gateway: "10.0.0.1".into(),
            dns: Some("10.0.0.1".into()),
        })
    }

    /// Send one echo request to the default gateway.
    #[cfg(target_os = "espidf")]
    pub fn ping_gateway(&self) -> bool {
        use esp_idf_svc::ping::{Configuration as PingConfiguration, EspPing};

        let Some(gw) = self.gateway() else {
            return false;
        };
        let cfg = PingConfiguration {
            count: 1,
            ..Default::default()
        };
        match EspPing::default().ping(gw, &cfg) {
            Ok(summary) if summary.received > 0 => {
                info!("Ping: gateway {} answered in {:?}", gw, summary.time);
                true
            }
            Ok(_) => {
                warn!("Ping: gateway {} did not answer", gw);
                false
            }
            Err(e) => {
                warn!("Ping: gateway {} failed: {}", gw, e);
                false
            }
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn ping_gateway(&self) -> bool {
        self.is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
