//! Inbound command poller with adaptive backoff.
//!
//! Polls the [`MessagePort`] when the current interval has elapsed.  An
//! idle poll stretches the interval by `poll_backoff_factor` up to
//! `max_poll_interval_ms`; any message snaps it back to
//! `min_poll_interval_ms` and the poller keeps fetching until the backlog
//! is empty or `max_drain_batches` polls have been made in this cycle.
//!
//! The poller also owns the transport cursor: after each non-empty batch
//! the next offset is one past the highest `update_id` seen, so messages
//! are never handed to the interpreter twice.

use log::{debug, warn};

use crate::app::ports::{ClockPort, InboundMessage, MessagePort};
use crate::config::SystemConfig;

/// Outcome of one completed poll cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollReport {
    /// Messages dispatched across all batches.
    pub messages: usize,
    /// Polls made, including the final empty one.
    pub batches: u16,
    /// Interval in force after the cycle.
    pub interval_ms: u32,
    /// The drain stopped at the batch cap with messages possibly pending.
    pub capped: bool,
}

pub struct CommandPoller {
    min_interval_ms: f64,
    max_interval_ms: f64,
    factor: f64,
    max_batches: u16,
    interval_ms: f64,
    last_poll_ms: u64,
    next_offset: i64,
}

impl CommandPoller {
    pub fn new(config: &SystemConfig) -> Self {
        let min = f64::from(config.min_poll_interval_ms);
        Self {
            min_interval_ms: min,
            max_interval_ms: f64::from(config.max_poll_interval_ms),
            factor: f64::from(config.poll_backoff_factor),
            max_batches: config.max_drain_batches.max(1),
            interval_ms: min,
            last_poll_ms: 0,
            next_offset: 0,
        }
    }

    /// Whether a poll cycle is due at `now_ms`.
    pub fn is_due(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.last_poll_ms) as f64 > self.interval_ms
    }

    /// Run one poll cycle if due.
    ///
    /// `dispatch` is called once per non-empty batch with the caller's
    /// context `ctx`.  A failed poll counts as idle.
    pub fn poll_if_due<B, C, T, F>(
        &mut self,
        clock: &C,
        bot: &mut B,
        ctx: &mut T,
        mut dispatch: F,
    ) -> Option<PollReport>
    where
        B: MessagePort,
        C: ClockPort,
        F: FnMut(&mut T, &mut B, &[InboundMessage]),
    {
        if !self.is_due(clock.now_ms()) {
            return None;
        }

        let mut report = PollReport {
            messages: 0,
            batches: 0,
            interval_ms: 0,
            capped: false,
        };

        loop {
            let batch = match bot.poll(self.next_offset) {
                Ok(batch) => batch,
                Err(e) => {
                    warn!("Poll failed: {}", e);
                    Vec::new()
                }
            };
            report.batches += 1;

            if batch.is_empty() {
                if report.messages == 0 {
                    self.back_off();
                }
                break;
            }

            self.interval_ms = self.min_interval_ms;
            if let Some(max_id) = batch.iter().map(|m| m.update_id).max() {
                self.next_offset = self.next_offset.max(max_id.saturating_add(1));
            }
            report.messages += batch.len();
            dispatch(ctx, bot, &batch);

            if report.batches >= self.max_batches {
                warn!(
                    "Drain stopped after {} batches; remaining messages wait for the next cycle",
                    report.batches
                );
                report.capped = true;
                break;
            }
        }

        self.last_poll_ms = clock.now_ms();
        report.interval_ms = self.interval_ms();
        debug!(
            "Poll cycle: {} message(s) in {} batch(es), next in {} ms",
            report.messages, report.batches, report.interval_ms
        );
        Some(report)
    }

    fn back_off(&mut self) {
        self.interval_ms = (self.interval_ms * self.factor).min(self.max_interval_ms);
    }

    /// Current interval, rounded down to whole milliseconds.
    pub fn interval_ms(&self) -> u32 {
        self.interval_ms as u32
    }

    /// Offset passed to the next [`MessagePort::poll`].
    pub fn next_offset(&self) -> i64 {
        self.next_offset
    }

    pub fn last_poll_ms(&self) -> u64 {
        self.last_poll_ms
    }
}
