//! Fuzz target: `BotCommand::parse`
//!
//! Chat text comes straight from any Telegram user.
//!
//! Invariants checked:
//! - No panics under any UTF-8 input
//! - Only `/login <secret>` yields `Login`, and the secret is the exact tail
//! - Every other recognised command is an exact match of its name
//!
//! cargo fuzz run fuzz_command_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use linealarm::app::commands::BotCommand;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    match BotCommand::parse(text) {
        Some(BotCommand::Login(secret)) => {
            assert!(!secret.is_empty());
            assert_eq!(text.strip_prefix("/login "), Some(secret.as_str()));
        }
        Some(cmd) => assert_eq!(text, format!("/{}", cmd.name())),
        None => {}
    }
});
