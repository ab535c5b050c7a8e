//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (line sampler, lamps, tone, bot API, storage) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware or the
//! network directly.
//!
//! ## Security notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - Identities are stored in plaintext; only the NVS partition's own
//!   encryption (if enabled) protects them.

use crate::config::SystemConfig;
use crate::error::CommsError;

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source in milliseconds since boot.
pub trait ClockPort {
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Sampler and output ports (driven adapters: hardware ↔ domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the sensed line voltage.
pub trait VoltagePort {
    /// Read the line voltage in volts.  Called once per control tick.
    fn read_volts(&mut self) -> f32;
}

/// Three-lamp status indicator.
pub trait IndicatorPort {
    fn set_indicator(&mut self, error: bool, warn: bool, ok: bool);
}

/// On/off dialtone output on the line.
pub trait TonePort {
    fn set_tone(&mut self, enabled: bool);
}

// ───────────────────────────────────────────────────────────────
// Message port (driven adapter: domain ↔ bot API)
// ───────────────────────────────────────────────────────────────

/// Formatting hint passed along with outbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Plain,
    Markdown,
}

impl ParseMode {
    /// Value of the bot API `parse_mode` field, if any.
    pub fn as_api_str(self) -> Option<&'static str> {
        match self {
            Self::Plain => None,
            Self::Markdown => Some("Markdown"),
        }
    }
}

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Monotonic transport-assigned id; the poller resumes after the
    /// highest id it has seen.
    pub update_id: i64,
    /// Sender identity (chat id).
    pub chat_id: String,
    /// Sender display name; empty when the transport supplies none.
    pub from_name: String,
    pub text: String,
}

/// Text messaging channel used for both notifications and commands.
pub trait MessagePort {
    /// Send `text` to `chat_id`.
    fn send(&mut self, chat_id: &str, text: &str, mode: ParseMode) -> Result<(), CommsError>;

    /// Fetch messages with `update_id >= offset`, oldest first.
    /// Returns an empty batch when nothing is pending.
    fn poll(&mut self, offset: i64) -> Result<Vec<InboundMessage>, CommsError>;
}

impl<P: MessagePort + ?Sized> MessagePort for &mut P {
    fn send(&mut self, chat_id: &str, text: &str, mode: ParseMode) -> Result<(), CommsError> {
        (**self).send(chat_id, text, mode)
    }

    fn poll(&mut self, offset: i64) -> Result<Vec<InboundMessage>, CommsError> {
        (**self).poll(offset)
    }
}

// ───────────────────────────────────────────────────────────────
// Watchdog port
// ───────────────────────────────────────────────────────────────

/// Liveness signal for the task watchdog.
pub trait WatchdogPort {
    fn feed(&self);
}

/// [`MessagePort`] that feeds a watchdog before and after every request.
///
/// One control tick may run a full poll drain plus an alarm fan-out, each
/// request bounded only by the HTTP timeout.  Wrapping the transport keeps
/// the gap between feeds at one request.
pub struct Watched<'a, P, W: ?Sized> {
    inner: P,
    watchdog: &'a W,
}

impl<'a, P, W: WatchdogPort + ?Sized> Watched<'a, P, W> {
    pub fn new(inner: P, watchdog: &'a W) -> Self {
        Self { inner, watchdog }
    }
}

impl<P: MessagePort, W: WatchdogPort + ?Sized> MessagePort for Watched<'_, P, W> {
    fn send(&mut self, chat_id: &str, text: &str, mode: ParseMode) -> Result<(), CommsError> {
        self.watchdog.feed();
        let result = self.inner.send(chat_id, text, mode);
        self.watchdog.feed();
        result
    }

    fn poll(&mut self, offset: i64) -> Result<Vec<InboundMessage>, CommsError> {
        self.watchdog.feed();
        let result = self.inner.poll(offset);
        self.watchdog.feed();
        result
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists system configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`SystemConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<SystemConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage.
///
/// Keys are namespaced to prevent collisions between subsystems.  Every
/// write is committed before it returns; there is no atomicity across
/// several keys.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value and commit it.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

/// Longest string value [`KeyValueStore::get_string`] will return.
pub const MAX_STRING_VALUE_LEN: usize = 64;

/// Typed int/string accessors on top of any [`StoragePort`].
///
/// Reads never fail: a missing key and a failed read both yield the
/// default, so callers cannot tell "never written" from "write lost".
pub trait KeyValueStore: StoragePort {
    fn get_int(&self, namespace: &str, key: &str, default: i32) -> i32 {
        let mut buf = [0u8; 4];
        match self.read(namespace, key, &mut buf) {
            Ok(4) => i32::from_le_bytes(buf),
            _ => default,
        }
    }

    fn put_int(&mut self, namespace: &str, key: &str, value: i32) -> Result<(), StorageError> {
        self.write(namespace, key, &value.to_le_bytes())
    }

    fn get_string(&self, namespace: &str, key: &str) -> String {
        let mut buf = [0u8; MAX_STRING_VALUE_LEN];
        match self.read(namespace, key, &mut buf) {
            Ok(len) => core::str::from_utf8(&buf[..len])
                .map(str::to_owned)
                .unwrap_or_default(),
            Err(_) => String::new(),
        }
    }

    fn put_string(&mut self, namespace: &str, key: &str, value: &str) -> Result<(), StorageError> {
        if value.len() > MAX_STRING_VALUE_LEN {
            return Err(StorageError::ValueTooLong);
        }
        self.write(namespace, key, value.as_bytes())
    }
}

impl<T: StoragePort + ?Sized> KeyValueStore for T {}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed integrity / deserialization check.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Value exceeds what the store accepts for one key.
    ValueTooLong,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::ValueTooLong => write!(f, "value too long"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
