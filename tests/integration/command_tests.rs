//! Bot commands delivered through the poller and answered by the
//! interpreter, with identities kept in the durable sets.

use linealarm::app::events::AppEvent;
use linealarm::app::interpreter::{
    AUTHENTICATED, MSG_AUTH_FAILED, MSG_AUTH_OK, MSG_CLEARED, MSG_LOGIN_FIRST, MSG_SUBSCRIBED,
    MSG_UNSUBSCRIBED, SUBSCRIBED, help_text,
};
use linealarm::app::service::AppService;

use super::mock_hw::{Rig, test_config};

fn rig() -> Rig {
    Rig::new(&test_config())
}

#[test]
fn gated_commands_ask_for_login() {
    let mut rig = rig();
    for cmd in ["/subscribe", "/unsubscribe", "/list", "/clear", "/debug"] {
        assert_eq!(rig.command("42", cmd).as_deref(), Some(MSG_LOGIN_FIRST), "{cmd}");
    }
    assert_eq!(SUBSCRIBED.size(&rig.store), 0);
    assert_eq!(AUTHENTICATED.size(&rig.store), 0);
}

#[test]
fn login_checks_the_password() {
    let mut rig = rig();

    assert_eq!(rig.command("42", "/login hunter2").as_deref(), Some(MSG_AUTH_FAILED));
    assert!(!AUTHENTICATED.exists(&rig.store, "42"));

    assert_eq!(rig.command("42", "/login secret123").as_deref(), Some(MSG_AUTH_OK));
    assert!(AUTHENTICATED.exists(&rig.store, "42"));

    // Logging in twice keeps a single entry.
    rig.login("42");
    assert_eq!(AUTHENTICATED.to_vec(&rig.store), ["42"]);
}

#[test]
fn empty_password_disables_login() {
    let mut config = test_config();
    config.bot_password.clear();
    let mut rig = Rig::new(&config);

    assert_eq!(rig.command("42", "/login secret123").as_deref(), Some(MSG_AUTH_FAILED));
    assert_eq!(AUTHENTICATED.size(&rig.store), 0);
}

#[test]
fn start_greets_by_name() {
    let mut rig = rig();

    rig.bot.receive_from("42", "Ada", "/start");
    rig.deliver();
    assert_eq!(rig.bot.last_to("42"), Some(help_text("Ada").as_str()));

    assert_eq!(rig.command("7", "/start"), Some(help_text("Guest")));
}

#[test]
fn subscribe_list_unsubscribe() {
    let mut rig = rig();
    rig.login("42");
    rig.login("7");

    assert_eq!(rig.command("42", "/subscribe").as_deref(), Some(MSG_SUBSCRIBED));
    assert_eq!(rig.command("7", "/subscribe").as_deref(), Some(MSG_SUBSCRIBED));
    assert_eq!(rig.command("42", "/subscribe").as_deref(), Some(MSG_SUBSCRIBED));
    assert_eq!(
        rig.command("7", "/list").as_deref(),
        Some("I'm alerting these users in case of an alarm: 42, 7")
    );

    assert_eq!(rig.command("42", "/unsubscribe").as_deref(), Some(MSG_UNSUBSCRIBED));
    assert_eq!(SUBSCRIBED.to_vec(&rig.store), ["7"]);
    // Unsubscribing again is harmless.
    assert_eq!(rig.command("42", "/unsubscribe").as_deref(), Some(MSG_UNSUBSCRIBED));
    assert_eq!(SUBSCRIBED.to_vec(&rig.store), ["7"]);
}

#[test]
fn clear_forgets_everyone() {
    let mut rig = rig();
    rig.login("42");
    rig.command("42", "/subscribe");

    assert_eq!(rig.command("42", "/clear").as_deref(), Some(MSG_CLEARED));
    assert_eq!(SUBSCRIBED.size(&rig.store), 0);
    assert_eq!(AUTHENTICATED.size(&rig.store), 0);
    assert_eq!(rig.command("42", "/list").as_deref(), Some(MSG_LOGIN_FIRST));
}

#[test]
fn debug_reports_the_previous_reading() {
    let mut rig = rig();
    rig.login("42");

    rig.hw.volts = 1.234;
    rig.tick();
    assert_eq!(rig.command("42", "/debug").as_deref(), Some("Line voltage: 1.23\n"));
}

#[test]
fn non_commands_get_no_reply() {
    let mut rig = rig();
    rig.login("42");
    let before = rig.bot.sent.len();

    for text in ["hello", "/login", "/login ", "/subscribe please", ""] {
        assert_eq!(rig.command("42", text), None, "{text:?}");
    }
    assert_eq!(rig.bot.sent.len(), before);
    assert_eq!(SUBSCRIBED.size(&rig.store), 0);
}

#[test]
fn handled_commands_are_reported() {
    let mut rig = rig();
    rig.command("42", "/list");
    rig.command("42", "chit-chat");
    rig.login("42");

    let handled: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::CommandHandled { chat_id, command } => Some((chat_id.as_str(), *command)),
            _ => None,
        })
        .collect();
    assert_eq!(handled, [("42", "list"), ("42", "login")]);
}

#[test]
fn identities_survive_a_restart() {
    let mut rig = rig();
    rig.login("42");
    rig.command("42", "/subscribe");

    rig.app = AppService::new(&test_config());
    assert_eq!(
        rig.command("42", "/list").as_deref(),
        Some("I'm alerting these users in case of an alarm: 42")
    );
}

#[test]
fn storage_failure_still_replies() {
    let mut rig = rig();
    rig.store.full = true;

    assert_eq!(rig.command("42", "/login secret123").as_deref(), Some(MSG_AUTH_OK));
    assert!(!AUTHENTICATED.exists(&rig.store, "42"));
    assert_eq!(rig.store.keys(), 0);
}
