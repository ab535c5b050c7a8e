//! Command interpreter: maps bot commands onto the identity sets.
//!
//! Two [`DurableSet`]s hold the state: identities that have logged in and
//! identities that want alarm notifications.  Every message is handled on
//! its own; there is no conversation state beyond those sets.
//!
//! | Command        | Gate          | Effect                                  |
//! |----------------|---------------|-----------------------------------------|
//! | `/start`       | none          | help text                               |
//! | `/login <pw>`  | none          | add sender to authenticated on match    |
//! | `/subscribe`   | authenticated | add sender to subscribed                |
//! | `/unsubscribe` | authenticated | remove sender from subscribed           |
//! | `/list`        | authenticated | list subscribed identities              |
//! | `/clear`       | authenticated | empty both sets                         |
//! | `/debug`       | authenticated | report line voltage                     |
//!
//! Storage failures are logged and the reply is still sent.

use log::{debug, info, warn};

use crate::identity_set::DurableSet;

use super::commands::BotCommand;
use super::ports::{InboundMessage, MessagePort, ParseMode, StorageError, StoragePort};

/// NVS namespace shared by both identity sets.
pub const IDENTITY_NAMESPACE: &str = "efa-v1";
/// Identities that supplied the bot password.
pub const AUTHENTICATED: DurableSet = DurableSet::new(IDENTITY_NAMESPACE, "aids");
/// Identities that receive alarm notifications.
pub const SUBSCRIBED: DurableSet = DurableSet::new(IDENTITY_NAMESPACE, "cids");

/// Text sent to every subscriber when the alarm trips.
pub const ALARM_MESSAGE: &str = "The Bihuset alarm was tripped!";

const DEFAULT_NAME: &str = "Guest";
const PASSWORD_KEY: &[u8] = b"efa-login";

pub const MSG_AUTH_OK: &str = "Successfully authenticated";
pub const MSG_AUTH_FAILED: &str = "Incorrect password";
pub const MSG_SUBSCRIBED: &str = "Ok, I'll notify you if the alarm trips";
pub const MSG_UNSUBSCRIBED: &str = "I've unsubscribed you from alarms";
pub const MSG_CLEARED: &str = "I've removed all authenticated or subscribed users";
pub const MSG_LOGIN_FIRST: &str = "Please `/login <password>` before sending commands";
const LIST_HEADER: &str = "I'm alerting these users in case of an alarm: ";

pub fn help_text(name: &str) -> String {
    format!(
        "Welcome to Bihusets larm {name}.\n\n\
         /login <password> : authenticate before sending commands\n\
         /subscribe : to notify me if the alarm triggers\n\
         /unsubscribe : to stop receiving alarms\n\
         /list : to list subscribed users\n\n\
         /clear : to clear subscribed users\n\
         /debug : show debug information\n"
    )
}

pub struct CommandInterpreter {
    /// HMAC of the configured password; `None` disables `/login`.
    password_tag: Option<[u8; 32]>,
}

impl CommandInterpreter {
    pub fn new(password: &str) -> Self {
        let password_tag = if password.is_empty() {
            warn!("Bot password is empty; /login is disabled");
            None
        } else {
            Some(hmac_sha256::HMAC::mac(password, PASSWORD_KEY))
        };
        Self { password_tag }
    }

    fn password_matches(&self, secret: &str) -> bool {
        self.password_tag
            .as_ref()
            .is_some_and(|tag| hmac_sha256::HMAC::verify(secret, PASSWORD_KEY, tag))
    }

    /// Act on one inbound message.  Returns the command name when the
    /// message was a command, whether or not the gate let it through.
    pub fn handle(
        &self,
        msg: &InboundMessage,
        line_voltage: f32,
        bot: &mut impl MessagePort,
        store: &mut impl StoragePort,
    ) -> Option<&'static str> {
        let Some(cmd) = BotCommand::parse(&msg.text) else {
            debug!("Ignoring non-command message from {}", msg.chat_id);
            return None;
        };
        let chat = msg.chat_id.as_str();

        if cmd.is_gated() && !AUTHENTICATED.exists(store, chat) {
            info!("Rejected /{} from unauthenticated {}", cmd.name(), chat);
            reply(bot, chat, MSG_LOGIN_FIRST);
            return Some(cmd.name());
        }

        match &cmd {
            BotCommand::Start => {
                let name = if msg.from_name.is_empty() {
                    DEFAULT_NAME
                } else {
                    msg.from_name.as_str()
                };
                reply(bot, chat, &help_text(name));
            }
            BotCommand::Login(secret) => {
                if self.password_matches(secret) {
                    logged(AUTHENTICATED.add(store, chat), "authenticate", chat);
                    reply(bot, chat, MSG_AUTH_OK);
                } else {
                    warn!("Wrong password from {}", chat);
                    reply(bot, chat, MSG_AUTH_FAILED);
                }
            }
            BotCommand::Subscribe => {
                logged(SUBSCRIBED.add(store, chat), "subscribe", chat);
                reply(bot, chat, MSG_SUBSCRIBED);
            }
            BotCommand::Unsubscribe => {
                logged(SUBSCRIBED.remove(store, chat), "unsubscribe", chat);
                reply(bot, chat, MSG_UNSUBSCRIBED);
            }
            BotCommand::List => {
                let ids = SUBSCRIBED.to_vec(store).join(", ");
                reply(bot, chat, &format!("{LIST_HEADER}{ids}"));
            }
            BotCommand::Clear => {
                logged(SUBSCRIBED.clear(store), "clear subscribers", chat);
                logged(AUTHENTICATED.clear(store), "clear logins", chat);
                reply(bot, chat, MSG_CLEARED);
            }
            BotCommand::Debug => {
                reply(bot, chat, &format!("Line voltage: {line_voltage:.2}\n"));
            }
        }
        Some(cmd.name())
    }
}

fn logged(result: Result<(), StorageError>, what: &str, chat: &str) {
    if let Err(e) = result {
        warn!("Failed to {} for {}: {}", what, chat, e);
    }
}

fn reply(bot: &mut impl MessagePort, chat: &str, text: &str) {
    if let Err(e) = bot.send(chat, text, ParseMode::Markdown) {
        warn!("Reply to {} failed: {}", chat, e);
    }
}
