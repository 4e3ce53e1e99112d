use super::member::{Member, MemberState};
use crate::command::{Command, CommandParser, RelayVerb};
use crate::config::{AssistantConfig, TranscriptionConfig};
use crate::roster::{normalize_phone, RosterEntry};
use crate::telephony::CallControl;
use crate::transcribe::{ConnectError, LinkEvent, TranscriptionLink};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

const GREETING: &str =
    "Hello everyone, this is your meeting concierge. If you need me, just say my name.";

const ABILITIES: &str = "I can bring someone into this call over SMS, or pass them a message. \
    Try saying: ask Dave to join. Or: tell Dave we are running late.";

/// One active call: its member table, its transcription link, and the
/// workflow state machine that turns spoken commands into SMS round trips.
///
/// The member table and link handle are each behind a mutex; link events,
/// audio ingest and SMS replies all serialize on them, so a member-state
/// flip can never race a concurrent reply handler.
pub struct Session {
    call_id: String,
    parser: Arc<CommandParser>,
    control: Arc<dyn CallControl>,
    members: Mutex<HashMap<String, Member>>,
    link: Mutex<Option<TranscriptionLink>>,
}

impl Session {
    /// Build a session with its own copy of the roster. Nothing here is
    /// shared with other sessions.
    pub fn new(
        call_id: impl Into<String>,
        roster: &[RosterEntry],
        parser: Arc<CommandParser>,
        control: Arc<dyn CallControl>,
    ) -> Self {
        let members: HashMap<String, Member> = roster
            .iter()
            .map(|entry| {
                let member = Member::from_roster(entry);
                (member.phone_number.clone(), member)
            })
            .collect();

        Self {
            call_id: call_id.into(),
            parser,
            control,
            members: Mutex::new(members),
            link: Mutex::new(None),
        }
    }

    pub fn call_id(&self) -> &str {
        &self.call_id
    }

    /// Whether this session tracks `tn` (already normalized) as a member
    pub async fn has_member(&self, tn: &str) -> bool {
        self.members.lock().await.contains_key(tn)
    }

    /// Current workflow state for a tracked number, if any
    pub async fn member_state(&self, tel: &str) -> Option<MemberState> {
        self.members
            .lock()
            .await
            .get(normalize_phone(tel))
            .map(|m| m.state)
    }

    /// Announce the assistant into the call
    pub async fn greet(&self) {
        self.say(GREETING).await;
    }

    /// Open the transcription link for this call. Calling it on an already
    /// connected session is an error; connect failures are reported and the
    /// call proceeds without transcription.
    pub async fn connect_transcription(
        &self,
        transcription: &TranscriptionConfig,
        assistant: &AssistantConfig,
        vocabulary: Vec<String>,
    ) -> Result<mpsc::Receiver<LinkEvent>, ConnectError> {
        let mut link = self.link.lock().await;
        if link.is_some() {
            return Err(ConnectError::AlreadyConnected);
        }

        let (events_tx, events_rx) = mpsc::channel(64);
        let connected = TranscriptionLink::connect(
            transcription,
            assistant,
            &self.call_id,
            vocabulary,
            events_tx,
        )
        .await?;
        *link = Some(connected);
        Ok(events_rx)
    }

    /// Forward a raw audio frame to the link; dropped until one is connected.
    pub async fn send_audio(&self, frame: &[u8]) {
        if let Some(link) = self.link.lock().await.as_ref() {
            link.send_audio(frame).await;
        }
    }

    /// Drive the session off its link events until the link closes.
    pub async fn process_link_events(self: Arc<Self>, mut events: mpsc::Receiver<LinkEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                LinkEvent::Connected => {
                    info!("Transcription running for call {}", self.call_id);
                }
                LinkEvent::ConnectFailed => {
                    warn!(
                        "Transcription connect failed for call {}, continuing without it",
                        self.call_id
                    );
                }
                LinkEvent::FinalTranscript(transcript) => {
                    self.handle_transcript(&transcript).await;
                }
                LinkEvent::Closed => {
                    info!("Transcription link closed for call {}", self.call_id);
                    break;
                }
            }
        }
    }

    /// Parse a final transcript and execute whatever command it carries.
    pub async fn handle_transcript(&self, transcript: &str) {
        info!("Final transcript on call {}: {}", self.call_id, transcript);

        let Some(command) = self.parser.parse(transcript) else {
            return;
        };

        match command {
            Command::Join { name } => self.do_join(&name).await,
            Command::Relay { verb, name, text } => self.do_relay(verb, &name, &text).await,
            // Recognized but deliberately silent: there is no utterance
            // history to replay
            Command::Repeat => debug!("Repeat requested on call {}", self.call_id),
            Command::Capabilities => self.say(ABILITIES).await,
        }
    }

    async fn do_join(&self, name: &str) {
        let mut members = self.members.lock().await;
        let Some(member) = members.values_mut().find(|m| m.matches_alias(name)) else {
            drop(members);
            self.say(&format!("I'm sorry, I don't know anyone named {name}"))
                .await;
            return;
        };

        let member_name = member.name.clone();
        let to = member.phone_number.clone();
        self.say(&format!(
            "Sure, I will check to see if {member_name} can join the call"
        ))
        .await;

        member.state = MemberState::AwaitingJoinResponse;
        let text = format!(
            "Hey {member_name}, the folks asked if you could join the call. \
             Text Y to join or N to decline. Or tap out a response and I will \
             relay it to the group."
        );
        if let Err(e) = self.control.send_sms(&to, &text).await {
            member.state = MemberState::Idle;
            error!("Failed to send join SMS to {}: {}", to, e);
        }
    }

    async fn do_relay(&self, verb: RelayVerb, name: &str, message: &str) {
        let mut members = self.members.lock().await;
        let Some(member) = members.values_mut().find(|m| m.matches_alias(name)) else {
            drop(members);
            self.say(&format!("I'm sorry, I don't know anyone named {name}"))
                .await;
            return;
        };

        let member_name = member.name.clone();
        let to = member.phone_number.clone();
        let (ack_verb, framing) = match verb {
            RelayVerb::Ask => ("ask", "asked"),
            RelayVerb::Tell => ("tell", "said"),
        };
        self.say(&format!("Sure, I will {ack_verb} {member_name}: {message}"))
            .await;

        member.state = MemberState::AwaitingAnswer;
        let text = format!("Hey {member_name}, the folks {framing}: {message}");
        if let Err(e) = self.control.send_sms(&to, &text).await {
            member.state = MemberState::Idle;
            error!("Failed to send relay SMS to {}: {}", to, e);
        }
    }

    /// Correlate an SMS reply back into the call. Workflows are single-shot:
    /// whatever the reply was, the member goes back to `Idle`, and a second
    /// reply before a new ask is treated as an unsolicited message.
    pub async fn handle_incoming_sms(&self, from: &str, text: &str) {
        let tn = normalize_phone(from);
        let mut members = self.members.lock().await;
        let Some(member) = members.get_mut(tn) else {
            info!("Discarding incoming SMS from unknown number {}", from);
            return;
        };

        let name = member.name.clone();
        let reply = match member.state {
            MemberState::AwaitingJoinResponse => {
                info!("Join response from {}: {}", name, text);
                match text.trim().to_lowercase().as_str() {
                    "y" | "yes" => format!("OK, I am connecting {name} to the call now"),
                    "n" | "no" => format!("Sorry, {name} can't join the call right now"),
                    _ => format!("So {name} can't join the call right now. They said: {text}"),
                }
            }
            _ => format!("So {name} said: {text}"),
        };
        member.state = MemberState::Idle;
        drop(members);

        self.say(&reply).await;
    }

    /// Tear the transcription link down. The caller unregisters the session
    /// afterwards; both must happen before the session is considered gone.
    pub async fn close(&self) {
        if let Some(link) = self.link.lock().await.take() {
            link.close().await;
        }
    }

    async fn say(&self, text: &str) {
        if let Err(e) = self.control.say(&self.call_id, text).await {
            error!("Failed to speak into call {}: {}", self.call_id, e);
        }
    }
}
