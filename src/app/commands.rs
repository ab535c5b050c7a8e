//! Bot command vocabulary.
//!
//! Inbound chat text is matched exactly against a fixed set of commands.
//! Anything that does not match, including a bare `/login` with no
//! secret, parses to `None` and is ignored.

const LOGIN_PREFIX: &str = "/login ";

/// Commands an operator can send to the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    /// Show the help text.
    Start,
    /// Authenticate with the bot password.
    Login(String),
    Subscribe,
    Unsubscribe,
    /// List subscribed identities.
    List,
    /// Forget every authenticated and subscribed identity.
    Clear,
    /// Report the last line voltage reading.
    Debug,
}

impl BotCommand {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/start" => Some(Self::Start),
            "/subscribe" => Some(Self::Subscribe),
            "/unsubscribe" => Some(Self::Unsubscribe),
            "/list" => Some(Self::List),
            "/clear" => Some(Self::Clear),
            "/debug" => Some(Self::Debug),
            _ => text
                .strip_prefix(LOGIN_PREFIX)
                .filter(|secret| !secret.is_empty())
                .map(|secret| Self::Login(secret.to_owned())),
        }
    }

    /// Short name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Login(_) => "login",
            Self::Subscribe => "subscribe",
            Self::Unsubscribe => "unsubscribe",
            Self::List => "list",
            Self::Clear => "clear",
            Self::Debug => "debug",
        }
    }

    /// Whether the sender must be authenticated first.
    pub fn is_gated(&self) -> bool {
        !matches!(self, Self::Start | Self::Login(_))
    }
}
