use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::tungstenite::Error as WsError;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{info, warn};

use super::messages::{RealtimeInput, RealtimeInputMessage, ServerMessage, SetupMessage};
use super::session::{
    DuplexSession, SessionError, SessionEvent, SessionService, SessionSettings, SessionSink,
};

const DEFAULT_ENDPOINT: &str =
    "wss://generativelanguage.googleapis.com/ws/google.ai.generativelanguage.v1beta.GenerativeService.BidiGenerateContent";

const EVENT_CHANNEL_CAPACITY: usize = 64;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsStream = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// WebSocket client for the Gemini Live API
pub struct GeminiLive {
    api_key: String,
    endpoint: String,
}

impl GeminiLive {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait::async_trait]
impl SessionService for GeminiLive {
    async fn open(&self, settings: &SessionSettings) -> Result<DuplexSession, SessionError> {
        let url = format!("{}?key={}", self.endpoint, self.api_key);

        let (ws, _response) = connect_async(url.as_str())
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        info!("Live session transport connected (model: {})", settings.model);

        let (mut ws_sink, ws_stream) = ws.split();

        let setup = SetupMessage::new(&settings.model, &settings.voice);
        let payload =
            serde_json::to_string(&setup).map_err(|e| SessionError::Connect(e.to_string()))?;
        ws_sink
            .send(Message::Text(payload))
            .await
            .map_err(|e| SessionError::Connect(e.to_string()))?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tokio::spawn(read_loop(ws_stream, event_tx));

        Ok(DuplexSession {
            sink: Box::new(GeminiSink { sink: ws_sink }),
            events: event_rx,
        })
    }
}

/// Translate inbound transport frames into session events, in arrival order
async fn read_loop(mut stream: WsStream, events: mpsc::Sender<SessionEvent>) {
    while let Some(item) = stream.next().await {
        let payload = match item {
            Ok(Message::Text(text)) => text.into_bytes(),
            Ok(Message::Binary(bytes)) => bytes,
            Ok(Message::Close(_)) => {
                let _ = events.send(SessionEvent::Closed).await;
                return;
            }
            // Ping/pong are answered by the transport layer
            Ok(_) => continue,
            Err(e) => {
                let _ = events.send(SessionEvent::Error(e.to_string())).await;
                return;
            }
        };

        let message: ServerMessage = match serde_json::from_slice(&payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("Ignoring unparseable session payload: {}", e);
                continue;
            }
        };

        let event = if message.setup_complete.is_some() {
            SessionEvent::Opened
        } else {
            SessionEvent::Message(message)
        };

        if events.send(event).await.is_err() {
            // Receiver side tore down; stop reading
            return;
        }
    }

    let _ = events.send(SessionEvent::Closed).await;
}

struct GeminiSink {
    sink: WsSink,
}

#[async_trait::async_trait]
impl SessionSink for GeminiSink {
    async fn send(&mut self, input: RealtimeInput) -> Result<(), SessionError> {
        let message = RealtimeInputMessage {
            realtime_input: input,
        };
        let payload =
            serde_json::to_string(&message).map_err(|e| SessionError::Send(e.to_string()))?;

        self.sink
            .send(Message::Text(payload))
            .await
            .map_err(|e| SessionError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        match self.sink.close().await {
            Ok(()) | Err(WsError::ConnectionClosed) | Err(WsError::AlreadyClosed) => Ok(()),
            Err(e) => Err(SessionError::Send(e.to_string())),
        }
    }
}
