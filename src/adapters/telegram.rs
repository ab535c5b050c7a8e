//! Telegram Bot API adapter.
//!
//! Implements [`MessagePort`] over HTTPS:
//!
//! | Port call      | Bot API request                                  |
//! |----------------|--------------------------------------------------|
//! | `poll(offset)` | `GET  /bot<token>/getUpdates?offset=N&timeout=0` |
//! | `send(..)`     | `POST /bot<token>/sendMessage` (JSON body)        |
//!
//! The JSON encode/decode halves are plain functions so they can be
//! tested (and fuzzed) on the host.  The token is part of every URL and
//! is never logged.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspHttpConnection` with the ESP-IDF
//!   certificate bundle.
//! - **all other targets**: an in-memory inbox/outbox for tests.

use serde::{Deserialize, Serialize};

use crate::app::ports::{InboundMessage, MessagePort, ParseMode};
use crate::error::CommsError;

#[cfg(target_os = "espidf")]
use log::{debug, warn};

pub const API_HOST: &str = "https://api.telegram.org";
/// Updates fetched per `getUpdates` call.
pub const UPDATE_BATCH_LIMIT: u8 = 10;
/// Upper bound on one bot API request, connect to last byte.
pub const HTTP_TIMEOUT_MS: u64 = 15_000;
#[cfg(target_os = "espidf")]
const MAX_RESPONSE_LEN: usize = 16 * 1024;

// ───────────────────────────────────────────────────────────────
// Wire format
// ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
}

#[derive(Deserialize)]
struct Message {
    chat: Chat,
    #[serde(default)]
    from: Option<User>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Deserialize)]
struct User {
    #[serde(default)]
    first_name: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
}

fn decode_response<'de, T: Deserialize<'de>>(body: &'de [u8]) -> Result<Option<T>, CommsError> {
    let resp: ApiResponse<T> =
        serde_json::from_slice(body).map_err(|_| CommsError::MalformedResponse)?;
    if !resp.ok {
        #[cfg(target_os = "espidf")]
        warn!(
            "Bot API error: {}",
            resp.description.as_deref().unwrap_or("(no description)")
        );
        #[cfg(not(target_os = "espidf"))]
        let _ = resp.description;
        return Err(CommsError::ApiRejected);
    }
    Ok(resp.result)
}

/// Decode a `getUpdates` response body.
///
/// Updates that carry no text message (edits, joins, ...) are kept with
/// empty text so the caller still advances its offset past them.
pub fn decode_updates(body: &[u8]) -> Result<Vec<InboundMessage>, CommsError> {
    let updates: Vec<Update> = decode_response(body)?.unwrap_or_default();
    Ok(updates
        .into_iter()
        .map(|u| {
            let (chat_id, from_name, text) = match u.message {
                Some(m) => (
                    m.chat.id.to_string(),
                    m.from.map(|f| f.first_name).unwrap_or_default(),
                    m.text.unwrap_or_default(),
                ),
                None => (String::new(), String::new(), String::new()),
            };
            InboundMessage {
                update_id: u.update_id,
                chat_id,
                from_name,
                text,
            }
        })
        .collect())
}

/// Decode a `sendMessage` response body; only `ok` matters.
pub fn decode_send_ack(body: &[u8]) -> Result<(), CommsError> {
    decode_response::<serde::de::IgnoredAny>(body).map(|_| ())
}

/// JSON body for `sendMessage`.
pub fn encode_send_message(chat_id: &str, text: &str, mode: ParseMode) -> Vec<u8> {
    let msg = SendMessage {
        chat_id,
        text,
        parse_mode: mode.as_api_str(),
    };
    // Serialising plain strings into a Vec cannot fail.
    serde_json::to_vec(&msg).unwrap_or_default()
}

pub fn updates_url(token: &str, offset: i64) -> String {
    format!(
        "{API_HOST}/bot{token}/getUpdates?offset={offset}&limit={UPDATE_BATCH_LIMIT}&timeout=0"
    )
}

pub fn send_url(token: &str) -> String {
    format!("{API_HOST}/bot{token}/sendMessage")
}

// ───────────────────────────────────────────────────────────────
// Adapter (ESP-IDF)
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct TelegramAdapter {
    token: heapless::String<64>,
    conn: Option<esp_idf_svc::http::client::EspHttpConnection>,
}

#[cfg(target_os = "espidf")]
impl TelegramAdapter {
    pub fn new(token: &str) -> Self {
        if token.is_empty() {
            warn!("Telegram: bot token is empty; every request will fail");
        }
        Self {
            token: crate::config::bounded(token),
            conn: None,
        }
    }

    fn connection(
        &mut self,
    ) -> Result<&mut esp_idf_svc::http::client::EspHttpConnection, CommsError> {
        use esp_idf_svc::http::client::{Configuration, EspHttpConnection};

        if self.conn.is_none() {
            let conn = EspHttpConnection::new(&Configuration {
                crt_bundle_attach: Some(esp_idf_svc::sys::esp_crt_bundle_attach),
                timeout: Some(core::time::Duration::from_millis(HTTP_TIMEOUT_MS)),
                ..Default::default()
            })
            .map_err(|e| {
                warn!("Telegram: HTTP client init failed: {}", e);
                CommsError::HttpRequestFailed
            })?;
            self.conn = Some(conn);
        }
        self.conn.as_mut().ok_or(CommsError::HttpRequestFailed)
    }

    /// Run one request and return the response body.  The connection is
    /// dropped on any failure and rebuilt on the next call.
    fn request(
        &mut self,
        method: esp_idf_svc::http::Method,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, CommsError> {
        let result = self.exchange(method, url, body);
        if result.is_err() {
            self.conn = None;
        }
        result
    }

    fn exchange(
        &mut self,
        method: esp_idf_svc::http::Method,
        url: &str,
        body: Option<&[u8]>,
    ) -> Result<Vec<u8>, CommsError> {
        let conn = self.connection()?;
        let failed = |e: esp_idf_svc::sys::EspError| {
            warn!("Telegram: request failed: {}", e);
            CommsError::HttpRequestFailed
        };

        let len = body.map_or(0, <[u8]>::len).to_string();
        let json_headers = [
            ("Content-Type", "application/json"),
            ("Content-Length", len.as_str()),
        ];
        let headers: &[(&str, &str)] = if body.is_some() { &json_headers } else { &[] };
        conn.initiate_request(method, url, headers).map_err(failed)?;
        if let Some(body) = body {
            let mut rest = body;
            while !rest.is_empty() {
                let n = conn.write(rest).map_err(failed)?;
                rest = &rest[n..];
            }
        }
        conn.initiate_response().map_err(failed)?;

        let status = conn.status();
        let mut out = Vec::new();
        let mut buf = [0u8; 512];
        loop {
            let n = conn.read(&mut buf).map_err(failed)?;
            if n == 0 {
                break;
            }
            if out.len() + n > MAX_RESPONSE_LEN {
                warn!("Telegram: response larger than {} bytes", MAX_RESPONSE_LEN);
                return Err(CommsError::MalformedResponse);
            }
            out.extend_from_slice(&buf[..n]);
        }
        debug!("Telegram: HTTP {} ({} bytes)", status, out.len());

        // The API reports errors as JSON with a 4xx status; let the body
        // decoder surface those as ApiRejected.
        if status >= 500 {
            return Err(CommsError::HttpStatus(status));
        }
        Ok(out)
    }
}

#[cfg(target_os = "espidf")]
impl MessagePort for TelegramAdapter {
    fn send(&mut self, chat_id: &str, text: &str, mode: ParseMode) -> Result<(), CommsError> {
        let url = send_url(&self.token);
        let body = encode_send_message(chat_id, text, mode);
        let resp = self.request(esp_idf_svc::http::Method::Post, &url, Some(&body))?;
        decode_send_ack(&resp)
    }

    fn poll(&mut self, offset: i64) -> Result<Vec<InboundMessage>, CommsError> {
        let url = updates_url(&self.token, offset);
        let resp = self.request(esp_idf_svc::http::Method::Get, &url, None)?;
        decode_updates(&resp)
    }
}

// ───────────────────────────────────────────────────────────────
// Adapter (simulation)
// ───────────────────────────────────────────────────────────────

/// In-memory bot: tests push inbound messages and read back replies.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct TelegramAdapter {
    inbox: std::collections::VecDeque<InboundMessage>,
    outbox: Vec<(String, String)>,
    next_update_id: i64,
}

#[cfg(not(target_os = "espidf"))]
impl TelegramAdapter {
    pub fn new(_token: &str) -> Self {
        Self::default()
    }

    /// Queue an inbound text message from `chat_id`.
    pub fn sim_receive(&mut self, chat_id: &str, from_name: &str, text: &str) {
        self.inbox.push_back(InboundMessage {
            update_id: self.next_update_id,
            chat_id: chat_id.into(),
            from_name: from_name.into(),
            text: text.into(),
        });
        self.next_update_id += 1;
    }

    /// Every message sent so far as `(chat_id, text)`.
    pub fn sim_sent(&self) -> &[(String, String)] {
        &self.outbox
    }
}

#[cfg(not(target_os = "espidf"))]
impl MessagePort for TelegramAdapter {
    fn send(&mut self, chat_id: &str, text: &str, _mode: ParseMode) -> Result<(), CommsError> {
        self.outbox.push((chat_id.into(), text.into()));
        Ok(())
    }

    /// Like the real API: confirms everything below `offset` and returns
    /// at most one batch.
    fn poll(&mut self, offset: i64) -> Result<Vec<InboundMessage>, CommsError> {
        self.inbox.retain(|m| m.update_id >= offset);
        Ok(self
            .inbox
            .iter()
            .take(usize::from(UPDATE_BATCH_LIMIT))
            .cloned()
            .collect())
    }
}
