// Session workflow tests
//
// These drive the state machine through the transcript and SMS entry points
// with a recording CallControl double, so no telephony platform is needed.

use async_trait::async_trait;
use call_concierge::{
    CallControl, CommandParser, MemberState, RosterEntry, SendError, Session, SessionRegistry,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Action {
    Say(String),
    Sms { to: String, text: String },
}

#[derive(Default)]
struct MockControl {
    actions: Mutex<Vec<Action>>,
    fail_sms: AtomicBool,
}

impl MockControl {
    fn actions(&self) -> Vec<Action> {
        self.actions.lock().unwrap().clone()
    }

    fn fail_sms(&self) {
        self.fail_sms.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl CallControl for MockControl {
    async fn say(&self, _call_id: &str, text: &str) -> Result<(), SendError> {
        self.actions
            .lock()
            .unwrap()
            .push(Action::Say(text.to_string()));
        Ok(())
    }

    async fn send_sms(&self, to: &str, text: &str) -> Result<(), SendError> {
        if self.fail_sms.load(Ordering::SeqCst) {
            return Err(SendError::Status(reqwest::StatusCode::BAD_GATEWAY));
        }
        self.actions.lock().unwrap().push(Action::Sms {
            to: to.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}

fn roster() -> Vec<RosterEntry> {
    serde_json::from_value(serde_json::json!([
        {"name": "Dave", "aliases": ["dave"], "phone_number": "15551230000"},
        {"name": "Priya", "aliases": ["priya", "pri"], "phone_number": "15551231111"}
    ]))
    .unwrap()
}

fn session() -> (Arc<Session>, Arc<MockControl>) {
    let control = Arc::new(MockControl::default());
    let session = Arc::new(Session::new(
        "CALL-1",
        &roster(),
        Arc::new(CommandParser::new("Xfinity")),
        control.clone(),
    ));
    (session, control)
}

#[tokio::test]
async fn test_join_command_sends_sms_and_sets_state() {
    let (session, control) = session();

    session
        .handle_transcript("Xfinity can you ask Dave to join")
        .await;

    let actions = control.actions();
    assert_eq!(actions.len(), 2);
    assert_eq!(
        actions[0],
        Action::Say("Sure, I will check to see if Dave can join the call".to_string())
    );
    match &actions[1] {
        Action::Sms { to, text } => {
            assert_eq!(to, "15551230000");
            assert!(text.starts_with("Hey Dave, the folks asked if you could join the call"));
        }
        other => panic!("expected SMS, got {:?}", other),
    }

    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::AwaitingJoinResponse)
    );
}

#[tokio::test]
async fn test_join_unknown_name_apologizes_without_state_change() {
    let (session, control) = session();

    session.handle_transcript("Xfinity ask Zeke to join").await;

    let actions = control.actions();
    assert_eq!(
        actions,
        vec![Action::Say(
            "I'm sorry, I don't know anyone named Zeke".to_string()
        )]
    );
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::Idle)
    );
    assert_eq!(
        session.member_state("15551231111").await,
        Some(MemberState::Idle)
    );
}

#[tokio::test]
async fn test_join_sms_failure_reverts_member_state() {
    let (session, control) = session();
    control.fail_sms();

    session.handle_transcript("Xfinity ask Dave to join").await;

    // The ack was spoken, but the member must not be left awaiting a reply
    // that can never come
    assert_eq!(control.actions().len(), 1);
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::Idle)
    );
}

#[tokio::test]
async fn test_join_reply_yes_connects_and_resets() {
    let (session, control) = session();

    session.handle_transcript("Xfinity ask Dave to join").await;
    session.handle_incoming_sms("+15551230000", "yes").await;

    let actions = control.actions();
    assert_eq!(
        actions.last().unwrap(),
        &Action::Say("OK, I am connecting Dave to the call now".to_string())
    );
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::Idle)
    );
}

#[tokio::test]
async fn test_join_reply_no_declines_and_resets() {
    let (session, control) = session();

    session.handle_transcript("Xfinity ask Dave to join").await;
    session.handle_incoming_sms("15551230000", "N").await;

    assert_eq!(
        control.actions().last().unwrap(),
        &Action::Say("Sorry, Dave can't join the call right now".to_string())
    );
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::Idle)
    );
}

#[tokio::test]
async fn test_join_reply_free_text_is_relayed() {
    let (session, control) = session();

    session.handle_transcript("Xfinity ask Dave to join").await;
    session
        .handle_incoming_sms("15551230000", "in another meeting until 3")
        .await;

    assert_eq!(
        control.actions().last().unwrap(),
        &Action::Say(
            "So Dave can't join the call right now. They said: in another meeting until 3"
                .to_string()
        )
    );
}

#[tokio::test]
async fn test_relay_tell_roundtrip() {
    let (session, control) = session();

    session
        .handle_transcript("Xfinity tell Dave we moved to room four")
        .await;

    let actions = control.actions();
    assert_eq!(
        actions[0],
        Action::Say("Sure, I will tell Dave: we moved to room four".to_string())
    );
    assert_eq!(
        actions[1],
        Action::Sms {
            to: "15551230000".to_string(),
            text: "Hey Dave, the folks said: we moved to room four".to_string(),
        }
    );
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::AwaitingAnswer)
    );

    session.handle_incoming_sms("15551230000", "got it").await;
    assert_eq!(
        control.actions().last().unwrap(),
        &Action::Say("So Dave said: got it".to_string())
    );
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::Idle)
    );
}

#[tokio::test]
async fn test_unsolicited_sms_is_spoken_as_message() {
    let (session, control) = session();

    // No outstanding workflow: the reply is still surfaced, as a plain message
    session.handle_incoming_sms("15551231111", "hello folks").await;

    assert_eq!(
        control.actions(),
        vec![Action::Say("So Priya said: hello folks".to_string())]
    );
}

#[tokio::test]
async fn test_sms_from_unknown_number_is_discarded() {
    let (session, control) = session();

    session.handle_incoming_sms("+15559990000", "who dis").await;

    assert!(control.actions().is_empty());
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::Idle)
    );
}

#[tokio::test]
async fn test_capabilities_speaks_once_without_state_change() {
    let (session, control) = session();

    session.handle_transcript("Xfinity what can you do").await;

    let actions = control.actions();
    assert_eq!(actions.len(), 1);
    assert!(matches!(actions[0], Action::Say(_)));
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::Idle)
    );
}

#[tokio::test]
async fn test_repeat_is_a_silent_no_op() {
    let (session, control) = session();

    session.handle_transcript("Xfinity repeat that").await;

    assert!(control.actions().is_empty());
}

#[tokio::test]
async fn test_transcript_without_wake_word_has_no_effect() {
    let (session, control) = session();

    session
        .handle_transcript("let's circle back after the demo")
        .await;

    assert!(control.actions().is_empty());
}

#[tokio::test]
async fn test_alias_lookup_is_case_insensitive() {
    let (session, control) = session();

    session.handle_transcript("Xfinity ask PRI to join").await;

    assert_eq!(
        session.member_state("15551231111").await,
        Some(MemberState::AwaitingJoinResponse)
    );
    match control.actions().last().unwrap() {
        Action::Sms { to, .. } => assert_eq!(to, "15551231111"),
        other => panic!("expected SMS, got {:?}", other),
    }
}

#[tokio::test]
async fn test_new_ask_overwrites_pending_workflow() {
    let (session, _control) = session();

    session.handle_transcript("Xfinity ask Dave to join").await;
    session
        .handle_transcript("Xfinity tell Dave the meeting is cancelled")
        .await;

    // Only one workflow outstanding per member, the latest one
    assert_eq!(
        session.member_state("15551230000").await,
        Some(MemberState::AwaitingAnswer)
    );
}

#[tokio::test]
async fn test_registry_routes_reply_to_owning_session() {
    let registry = SessionRegistry::new();
    let (session, control) = session();
    registry.register(session).await.unwrap();

    let found = registry
        .find_by_phone_number("+15551230000")
        .await
        .expect("session should be found");
    found.handle_incoming_sms("+15551230000", "yes").await;

    assert_eq!(
        control.actions(),
        vec![Action::Say("So Dave said: yes".to_string())]
    );
}
