use super::state::AppState;
use crate::session::Session;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// One-time metadata frame, first thing on the audio stream
#[derive(Debug, Deserialize)]
pub struct StreamMetadata {
    #[serde(rename = "callSid")]
    pub call_sid: String,
}

/// Inbound SMS delivery from the gateway webhook
#[derive(Debug, Deserialize)]
pub struct InboundSms {
    pub from: String,
    pub text: String,
}

/// GET /listen
/// Per-call audio stream: a JSON metadata frame, then binary audio frames,
/// until the telephony platform closes the socket.
pub async fn listen(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_listen_socket(socket, state))
}

async fn handle_listen_socket(mut socket: WebSocket, state: AppState) {
    info!("Audio stream connected");
    let mut session: Option<Arc<Session>> = None;

    while let Some(result) = socket.recv().await {
        let msg = match result {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Audio socket error: {}", e);
                break;
            }
        };

        match msg {
            Message::Text(text) => {
                if session.is_none() {
                    match serde_json::from_str::<StreamMetadata>(&text) {
                        Ok(metadata) => {
                            session = Some(start_session(metadata.call_sid, &state).await);
                        }
                        Err(e) => warn!("Invalid metadata frame: {}", e),
                    }
                } else {
                    debug!("Got metadata over listen socket: {}", text);
                }
            }
            Message::Binary(frame) => {
                if let Some(session) = &session {
                    session.send_audio(&frame).await;
                }
            }
            Message::Close(_) => {
                info!("Listen socket closed by telephony platform");
                break;
            }
            _ => {}
        }
    }

    // Teardown order matters: close the link, then unregister, so the
    // registry can never hand out a dead session
    if let Some(session) = session {
        session.close().await;
        state.registry.unregister(session.call_id()).await;
        info!("Session for call {} destroyed", session.call_id());
    }
}

async fn start_session(call_id: String, state: &AppState) -> Arc<Session> {
    info!("Starting session for call {}", call_id);

    let session = Arc::new(Session::new(
        call_id,
        &state.roster,
        Arc::clone(&state.parser),
        Arc::clone(&state.control),
    ));
    session.greet().await;

    let vocabulary: Vec<String> = state.roster.iter().flat_map(|entry| entry.hints()).collect();
    match session
        .connect_transcription(&state.transcription, &state.assistant, vocabulary)
        .await
    {
        Ok(events) => {
            if let Err(e) = state.registry.register(Arc::clone(&session)).await {
                error!("Registration rejected: {}", e);
            }
            tokio::spawn(Arc::clone(&session).process_link_events(events));
        }
        Err(e) => warn!(
            "Transcription unavailable for call {}: {}",
            session.call_id(),
            e
        ),
    }

    session
}

/// POST /sms
/// SMS replies arrive minutes after the ask; the registry is consulted fresh
/// on every delivery. Unknown senders are logged and dropped.
pub async fn inbound_sms(
    State(state): State<AppState>,
    Json(sms): Json<InboundSms>,
) -> impl IntoResponse {
    debug!("POST /sms from {}", sms.from);

    match state.registry.find_by_phone_number(&sms.from).await {
        Some(session) => session.handle_incoming_sms(&sms.from, &sms.text).await,
        None => info!("No active session tracks {}, dropping SMS", sms.from),
    }

    StatusCode::OK
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
