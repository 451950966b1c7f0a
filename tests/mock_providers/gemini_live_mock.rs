//! WebSocket mock of the Gemini Live BidiGenerateContent endpoint.
//!
//! Accepts one connection at a time, records every client frame as JSON,
//! answers the setup frame with `setupComplete`, and forwards frames pushed by
//! the test.

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;

/// How the mock answers the upgrade request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockBehavior {
    /// Complete the handshake and acknowledge setup
    Accept,
    /// Reject the upgrade with 401
    Unauthorized,
    /// Complete the handshake but never acknowledge setup
    Silent,
}

/// Frames the test can make the server send.
pub enum ServerAction {
    Json(Value),
    /// Send the JSON in a binary frame
    BinaryJson(Value),
    Close,
}

#[derive(Default)]
pub struct MockState {
    /// Client frames, parsed as JSON, in arrival order
    pub received: Mutex<Vec<Value>>,
    /// Query string of each upgrade request
    pub queries: Mutex<Vec<String>>,
    pub connections: Mutex<usize>,
}

pub struct MockGeminiServer {
    pub url: String,
    pub state: Arc<MockState>,
    actions: mpsc::UnboundedSender<ServerAction>,
}

impl MockGeminiServer {
    pub async fn start(behavior: MockBehavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock server");
        let addr = listener.local_addr().expect("local addr");
        let state = Arc::new(MockState::default());
        let (actions_tx, actions_rx) = mpsc::unbounded_channel();
        let actions_rx = Arc::new(tokio::sync::Mutex::new(actions_rx));

        let server_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = server_state.clone();
                let actions = actions_rx.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, behavior, state, actions).await;
                });
            }
        });

        Self {
            url: format!("ws://{addr}/ws/BidiGenerateContent"),
            state,
            actions: actions_tx,
        }
    }

    pub fn send_json(&self, value: Value) {
        let _ = self.actions.send(ServerAction::Json(value));
    }

    pub fn send_binary_json(&self, value: Value) {
        let _ = self.actions.send(ServerAction::BinaryJson(value));
    }

    pub fn close(&self) {
        let _ = self.actions.send(ServerAction::Close);
    }

    pub fn received(&self) -> Vec<Value> {
        self.state.received.lock().clone()
    }

    /// Received frames whose top-level key is `key`.
    pub fn received_of(&self, key: &str) -> Vec<Value> {
        self.received()
            .into_iter()
            .filter_map(|v| v.get(key).cloned())
            .collect()
    }
}

async fn handle_connection(
    stream: TcpStream,
    behavior: MockBehavior,
    state: Arc<MockState>,
    actions: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<ServerAction>>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let query_state = state.clone();
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        query_state
            .queries
            .lock()
            .push(request.uri().query().unwrap_or_default().to_string());
        if behavior == MockBehavior::Unauthorized {
            let mut error = ErrorResponse::new(Some("API key not valid".to_string()));
            *error.status_mut() = StatusCode::UNAUTHORIZED;
            return Err(error);
        }
        Ok(response)
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    *state.connections.lock() += 1;
    let (mut write, mut read) = ws_stream.split();
    let mut actions = actions.lock().await;

    loop {
        tokio::select! {
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let value: Value = serde_json::from_str(&text)?;
                    let is_setup = value.get("setup").is_some();
                    state.received.lock().push(value);
                    if is_setup && behavior == MockBehavior::Accept {
                        write
                            .send(Message::Text(json!({"setupComplete": {}}).to_string().into()))
                            .await?;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
            action = actions.recv() => match action {
                Some(ServerAction::Json(value)) => {
                    write.send(Message::Text(value.to_string().into())).await?;
                }
                Some(ServerAction::BinaryJson(value)) => {
                    write.send(Message::Binary(value.to_string().into_bytes().into())).await?;
                }
                Some(ServerAction::Close) | None => {
                    write.send(Message::Close(None)).await?;
                    break;
                }
            },
        }
    }

    Ok(())
}
