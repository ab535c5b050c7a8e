//! Recording mocks for integration tests.
//!
//! Every port call is recorded so tests can assert on the full history
//! without touching real ADC/DAC/GPIO registers or the network.

use std::cell::Cell;
use std::collections::{HashMap, VecDeque};

use linealarm::app::events::AppEvent;
use linealarm::app::ports::{
    ClockPort, EventSink, InboundMessage, IndicatorPort, MessagePort, ParseMode, StorageError,
    StoragePort, TonePort, VoltagePort,
};
use linealarm::config::SystemConfig;
use linealarm::error::CommsError;

/// Default config with the timings the tests reason about.
pub fn test_config() -> SystemConfig {
    let mut c = SystemConfig::default();
    c.alarm_voltage_v = 1.5;
    c.dialtone_delay_ms = 1_000;
    c.alert_duration_ms = 5_000;
    c.reset_duration_ms = 30_000;
    c.min_poll_interval_ms = 1_000;
    c.max_poll_interval_ms = 10_000;
    c.poll_backoff_factor = 2.0;
    c.max_drain_batches = 16;
    c.bot_password = linealarm::config::bounded("secret123");
    c
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub volts: f32,
    pub indicator: Vec<(bool, bool, bool)>,
    pub tone: Vec<bool>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            volts: 0.0,
            indicator: Vec::new(),
            tone: Vec::new(),
        }
    }

    pub fn tone_on(&self) -> bool {
        self.tone.last().copied().unwrap_or(false)
    }

    pub fn lamps(&self) -> Option<(bool, bool, bool)> {
        self.indicator.last().copied()
    }
}

impl VoltagePort for MockHardware {
    fn read_volts(&mut self) -> f32 {
        self.volts
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, error: bool, warn: bool, ok: bool) {
        self.indicator.push((error, warn, ok));
    }
}

impl TonePort for MockHardware {
    fn set_tone(&mut self, enabled: bool) {
        self.tone.push(enabled);
    }
}

// ── MockBot ───────────────────────────────────────────────────

/// Bot transport with a queued inbox and a recorded outbox.
pub struct MockBot {
    inbox: VecDeque<InboundMessage>,
    next_update_id: i64,
    pub batch_limit: usize,
    pub sent: Vec<(String, String)>,
    /// Offsets passed to every `poll`.
    pub offsets: Vec<i64>,
    /// Remaining polls that fail before the transport recovers.
    pub failing_polls: u32,
    /// Chats whose sends fail.
    pub unreachable: Vec<String>,
}

#[allow(dead_code)]
impl MockBot {
    pub fn new() -> Self {
        Self {
            inbox: VecDeque::new(),
            next_update_id: 500,
            batch_limit: 10,
            sent: Vec::new(),
            offsets: Vec::new(),
            failing_polls: 0,
            unreachable: Vec::new(),
        }
    }

    pub fn receive(&mut self, chat_id: &str, text: &str) {
        self.receive_from(chat_id, "", text);
    }

    pub fn receive_from(&mut self, chat_id: &str, from_name: &str, text: &str) {
        self.inbox.push_back(InboundMessage {
            update_id: self.next_update_id,
            chat_id: chat_id.into(),
            from_name: from_name.into(),
            text: text.into(),
        });
        self.next_update_id += 1;
    }

    /// Texts sent to `chat_id`, oldest first.
    pub fn sent_to(&self, chat_id: &str) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|(c, _)| c == chat_id)
            .map(|(_, t)| t.as_str())
            .collect()
    }

    pub fn last_to(&self, chat_id: &str) -> Option<&str> {
        self.sent_to(chat_id).last().copied()
    }

    pub fn pending(&self) -> usize {
        self.inbox.len()
    }
}

impl MessagePort for MockBot {
    fn send(&mut self, chat_id: &str, text: &str, _mode: ParseMode) -> Result<(), CommsError> {
        if self.unreachable.iter().any(|c| c == chat_id) {
            return Err(CommsError::HttpStatus(403));
        }
        self.sent.push((chat_id.into(), text.into()));
        Ok(())
    }

    fn poll(&mut self, offset: i64) -> Result<Vec<InboundMessage>, CommsError> {
        self.offsets.push(offset);
        if self.failing_polls > 0 {
            self.failing_polls -= 1;
            return Err(CommsError::HttpRequestFailed);
        }
        self.inbox.retain(|m| m.update_id >= offset);
        Ok(self.inbox.iter().take(self.batch_limit).cloned().collect())
    }
}

// ── MemStore ──────────────────────────────────────────────────

#[derive(Default)]
pub struct MemStore {
    data: HashMap<(String, String), Vec<u8>>,
    /// Reject every write with `StorageError::Full`.
    pub full: bool,
}

#[allow(dead_code)]
impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> usize {
        self.data.len()
    }
}

impl StoragePort for MemStore {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        let value = self
            .data
            .get(&(namespace.into(), key.into()))
            .ok_or(StorageError::NotFound)?;
        if value.len() > buf.len() {
            return Err(StorageError::ValueTooLong);
        }
        buf[..value.len()].copy_from_slice(value);
        Ok(value.len())
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.full {
            return Err(StorageError::Full);
        }
        self.data.insert((namespace.into(), key.into()), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&(namespace.into(), key.into()));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.data.contains_key(&(namespace.into(), key.into()))
    }
}

// ── ManualClock ───────────────────────────────────────────────

#[derive(Default)]
pub struct ManualClock(Cell<u64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, ms: u64) {
        self.0.set(ms);
    }

    pub fn advance(&self, ms: u64) {
        self.0.set(self.0.get() + ms);
    }
}

impl ClockPort for ManualClock {
    fn now_ms(&self) -> u64 {
        self.0.get()
    }
}

// ── LogSink ───────────────────────────────────────────────────

#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// An [`AppService`] wired to one of each mock.
///
/// [`AppService`]: linealarm::app::service::AppService
pub struct Rig {
    pub app: linealarm::app::service::AppService,
    pub clock: ManualClock,
    pub hw: MockHardware,
    pub bot: MockBot,
    pub store: MemStore,
    pub sink: LogSink,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            app: linealarm::app::service::AppService::new(config),
            clock: ManualClock::new(),
            hw: MockHardware::new(),
            bot: MockBot::new(),
            store: MemStore::new(),
            sink: LogSink::new(),
        }
    }

    /// Run one control tick at `ms` with the line at `volts`.
    pub fn tick_at(&mut self, ms: u64, volts: f32) {
        self.clock.set(ms);
        self.hw.volts = volts;
        self.tick();
    }

    pub fn tick(&mut self) {
        self.app.tick(
            &self.clock,
            &mut self.hw,
            &mut self.bot,
            &mut self.store,
            &mut self.sink,
        );
    }

    /// Advance past the longest poll interval and tick, so any queued
    /// messages are fetched and handled.
    pub fn deliver(&mut self) {
        self.clock.advance(10_001);
        self.tick();
    }

    /// Queue `text` from `chat_id`, deliver it, and return the reply.
    pub fn command(&mut self, chat_id: &str, text: &str) -> Option<String> {
        let before = self.bot.sent_to(chat_id).len();
        self.bot.receive(chat_id, text);
        self.deliver();
        let sent = self.bot.sent_to(chat_id);
        (sent.len() > before).then(|| sent[sent.len() - 1].to_owned())
    }

    /// Log `chat_id` in with the test password.
    pub fn login(&mut self, chat_id: &str) {
        self.command(chat_id, "/login secret123");
    }
}
