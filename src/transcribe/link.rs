use super::auth::{self, TokenError};
use super::messages::{classify, ControlRequest, ProviderEvent};
use crate::config::{AssistantConfig, TranscriptionConfig};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("token exchange failed: {0}")]
    Token(#[from] TokenError),

    #[error("access token is not a valid header value")]
    TokenHeader,

    #[error("websocket handshake failed: {0}")]
    Handshake(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("failed to encode start request: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("transcription link already connected")]
    AlreadyConnected,
}

/// Connection lifecycle. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
}

/// Notifications delivered to the owning session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Connected,
    ConnectFailed,
    Closed,
    FinalTranscript(String),
}

enum Outbound {
    Audio(Vec<u8>),
    Control(String),
}

type WsSource = futures::stream::SplitStream<
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>,
>;

/// Streaming connection to the transcription provider for one call.
///
/// The socket halves live in spawned reader/writer tasks; the link itself
/// only holds the shared state flag and the channels into those tasks.
pub struct TranscriptionLink {
    state: Arc<Mutex<LinkState>>,
    outbound: mpsc::Sender<Outbound>,
    events: mpsc::Sender<LinkEvent>,
}

impl TranscriptionLink {
    /// Obtain a token, open the provider websocket, and send the
    /// `start_request` declaring insight types and the roster vocabulary.
    ///
    /// Connect failures are reported (`ConnectFailed` event + error) and not
    /// retried; the call simply proceeds without transcription.
    pub async fn connect(
        transcription: &TranscriptionConfig,
        assistant: &AssistantConfig,
        call_id: &str,
        vocabulary: Vec<String>,
        events: mpsc::Sender<LinkEvent>,
    ) -> Result<Self, ConnectError> {
        let state = Arc::new(Mutex::new(LinkState::Connecting));

        match Self::establish(transcription, assistant, call_id, vocabulary).await {
            Ok((outbound, source)) => {
                *state.lock().await = LinkState::Connected;
                let _ = events.try_send(LinkEvent::Connected);
                info!("Transcription link connected for call {}", call_id);
                let link = Self {
                    state,
                    outbound,
                    events,
                };
                link.spawn_reader(source);
                Ok(link)
            }
            Err(e) => {
                *state.lock().await = LinkState::Disconnected;
                let _ = events.try_send(LinkEvent::ConnectFailed);
                Err(e)
            }
        }
    }

    async fn establish(
        transcription: &TranscriptionConfig,
        assistant: &AssistantConfig,
        call_id: &str,
        vocabulary: Vec<String>,
    ) -> Result<(mpsc::Sender<Outbound>, WsSource), ConnectError> {
        let http = reqwest::Client::new();
        let token = auth::fetch_access_token(&http, transcription).await?;

        let host = transcription
            .base_url
            .trim_end_matches('/')
            .trim_start_matches("https://")
            .trim_start_matches("http://");
        let ws_url = format!("wss://{}/v1/realtime/insights/{}", host, call_id);
        debug!("Connecting to {}", ws_url);

        let mut request = ws_url.into_client_request()?;
        request.headers_mut().insert(
            "X-API-KEY",
            token.parse().map_err(|_| ConnectError::TokenHeader)?,
        );

        let (stream, _) = connect_async(request).await?;
        let (mut sink, source) = stream.split();

        // Declare the conversation before any audio flows
        let start = ControlRequest::start(transcription, assistant, vocabulary);
        sink.send(Message::Text(serde_json::to_string(&start)?))
            .await?;

        let (outbound_tx, mut outbound_rx) = mpsc::channel::<Outbound>(64);

        // Writer task: owns the sink, drains audio and control messages
        tokio::spawn(async move {
            while let Some(command) = outbound_rx.recv().await {
                let message = match command {
                    Outbound::Audio(frame) => Message::Binary(frame),
                    Outbound::Control(text) => Message::Text(text),
                };
                if sink.send(message).await.is_err() {
                    debug!("Provider socket send failed, writer stopping");
                    break;
                }
            }
        });

        Ok((outbound_tx, source))
    }

    /// Spawn the reader loop. Separate from `establish` so the state flag the
    /// reader shares is the one stored on the link.
    fn spawn_reader(&self, mut source: WsSource) {
        let state = Arc::clone(&self.state);
        let events = self.events.clone();

        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => match classify(&text) {
                        Ok(ProviderEvent::FinalTranscript(transcript)) => {
                            let _ = events.send(LinkEvent::FinalTranscript(transcript)).await;
                        }
                        Ok(ProviderEvent::Insight(text)) => {
                            info!("Conversation insight: {}", text);
                        }
                        Ok(ProviderEvent::Ignored) => {}
                        Err(e) => warn!("Dropping unparseable provider payload: {}", e),
                    },
                    Ok(Message::Close(_)) => {
                        info!("Provider closed the transcription socket");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Transcription socket error: {}", e);
                        break;
                    }
                }
            }

            // Remote close: same guarded transition close() makes, so the
            // session sees exactly one Closed either way
            let mut state = state.lock().await;
            if *state == LinkState::Connected {
                *state = LinkState::Closed;
                let _ = events.try_send(LinkEvent::Closed);
            }
        });
    }

    /// Forward a raw audio frame. Dropped unless the link is `Connected` —
    /// audio arriving early must not crash the pipeline, and stale real-time
    /// frames are worthless, so a full outbound queue also drops.
    pub async fn send_audio(&self, frame: &[u8]) {
        if *self.state.lock().await != LinkState::Connected {
            return;
        }
        let _ = self.outbound.try_send(Outbound::Audio(frame.to_vec()));
    }

    /// Stop the conversation and tear the link down. Idempotent: only the
    /// `Connected -> Closed` transition emits `Closed` and sends the
    /// `stop_request`.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if *state == LinkState::Connected {
            *state = LinkState::Closed;
            match serde_json::to_string(&ControlRequest::Stop) {
                Ok(json) => {
                    let _ = self.outbound.try_send(Outbound::Control(json));
                }
                Err(e) => error!("Failed to serialize stop request: {}", e),
            }
            let _ = self.events.try_send(LinkEvent::Closed);
        } else {
            *state = LinkState::Closed;
        }
    }

    pub async fn state(&self) -> LinkState {
        *self.state.lock().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_link(
        state: LinkState,
    ) -> (
        TranscriptionLink,
        mpsc::Receiver<Outbound>,
        mpsc::Receiver<LinkEvent>,
    ) {
        let (outbound_tx, outbound_rx) = mpsc::channel(8);
        let (events_tx, events_rx) = mpsc::channel(8);
        let link = TranscriptionLink {
            state: Arc::new(Mutex::new(state)),
            outbound: outbound_tx,
            events: events_tx,
        };
        (link, outbound_rx, events_rx)
    }

    #[tokio::test]
    async fn close_is_idempotent_and_emits_once() {
        let (link, mut outbound, mut events) = test_link(LinkState::Connected);

        link.close().await;
        link.close().await;

        assert_eq!(link.state().await, LinkState::Closed);

        // one stop_request
        let stop = outbound.recv().await.expect("stop request sent");
        match stop {
            Outbound::Control(json) => assert!(json.contains("stop_request")),
            Outbound::Audio(_) => panic!("expected control message"),
        }
        assert!(outbound.try_recv().is_err(), "second close sent nothing");

        // one Closed event
        assert_eq!(events.try_recv().unwrap(), LinkEvent::Closed);
        assert!(events.try_recv().is_err(), "second close emitted nothing");
    }

    #[tokio::test]
    async fn close_before_connect_emits_nothing() {
        let (link, mut outbound, mut events) = test_link(LinkState::Connecting);

        link.close().await;

        assert_eq!(link.state().await, LinkState::Closed);
        assert!(outbound.try_recv().is_err());
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn audio_is_dropped_unless_connected() {
        for state in [
            LinkState::Disconnected,
            LinkState::Connecting,
            LinkState::Closed,
        ] {
            let (link, mut outbound, _events) = test_link(state);
            link.send_audio(&[1, 2, 3]).await;
            assert!(outbound.try_recv().is_err(), "audio leaked in {:?}", state);
        }

        let (link, mut outbound, _events) = test_link(LinkState::Connected);
        link.send_audio(&[1, 2, 3]).await;
        match outbound.try_recv().unwrap() {
            Outbound::Audio(frame) => assert_eq!(frame, vec![1, 2, 3]),
            Outbound::Control(_) => panic!("expected audio frame"),
        }
    }
}
