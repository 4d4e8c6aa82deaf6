/*!
WebSocket server implementation.
*/

use async_trait::async_trait;
use axum::{
  extract::{
    ws::{Message, WebSocket, WebSocketUpgrade},
    State,
  },
  response::Response,
  routing::get,
  Router,
};
use log::{debug, error, info, warn};
use narrator::output::{Job, OutputSink};
use narrator::{NarratorError, NarratorResult};
use std::sync::Arc;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

/// Default WebSocket server port.
pub const DEFAULT_WS_PORT: u16 = 3030;
const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Output sink that broadcasts every job as JSON to connected clients.
///
/// Jobs submitted while no client is connected are dropped.
#[derive(Clone)]
pub struct WsOutput {
  sender: Arc<broadcast::Sender<String>>,
}

impl std::fmt::Debug for WsOutput {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WsOutput")
      .field("clients", &self.sender.receiver_count())
      .finish()
  }
}

impl WsOutput {
  fn with_capacity(capacity: usize) -> Self {
    let (tx, _) = broadcast::channel::<String>(capacity);
    Self {
      sender: Arc::new(tx),
    }
  }

  fn subscribe(&self) -> broadcast::Receiver<String> {
    self.sender.subscribe()
  }
}

#[async_trait]
impl OutputSink for WsOutput {
  fn name(&self) -> &'static str {
    "websocket"
  }

  async fn submit(&self, job: &Job) -> NarratorResult<()> {
    let json = serde_json::to_string(job).map_err(|e| NarratorError::Sink {
      sink: self.name().to_owned(),
      reason: e.to_string(),
    })?;
    if self.sender.send(json).is_err() {
      debug!("[ws] no clients for {}", job.identifier);
    }
    Ok(())
  }
}

/// WebSocket state.
#[derive(Clone)]
pub struct WebSocketState {
  output: WsOutput,
  port: u16,
}

impl std::fmt::Debug for WebSocketState {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WebSocketState")
      .field("port", &self.port)
      .finish_non_exhaustive()
  }
}

impl Default for WebSocketState {
  fn default() -> Self {
    Self::new()
  }
}

impl WebSocketState {
  /// Create with default port.
  pub fn new() -> Self {
    Self::with_port(DEFAULT_WS_PORT)
  }

  /// Create with custom port.
  pub fn with_port(port: u16) -> Self {
    Self {
      output: WsOutput::with_capacity(DEFAULT_CHANNEL_CAPACITY),
      port,
    }
  }

  /// The sink to hand to the screen reader.
  pub fn output(&self) -> WsOutput {
    self.output.clone()
  }

  /// Port the server listens on.
  pub const fn port(&self) -> u16 {
    self.port
  }
}

/// Start the WebSocket server. Runs until the listener fails.
pub async fn start_server(ws_state: WebSocketState) -> std::io::Result<()> {
  let cors = CorsLayer::new()
    .allow_origin(Any)
    .allow_methods(Any)
    .allow_headers(Any);

  let addr = format!("127.0.0.1:{}", ws_state.port);
  let app = Router::new()
    .route("/ws", get(websocket_handler))
    .layer(cors)
    .with_state(ws_state);

  let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
    error!("Failed to bind WebSocket server to {addr}: {e}");
    e
  })?;

  info!("WebSocket server: ws://{addr}/ws");

  axum::serve(listener, app).await.map_err(|e| {
    error!("WebSocket server failed: {e}");
    e
  })
}

async fn websocket_handler(
  ws: WebSocketUpgrade,
  State(ws_state): State<WebSocketState>,
) -> Response {
  ws.on_upgrade(|socket| handle_websocket(socket, ws_state))
}

async fn handle_websocket(mut socket: WebSocket, ws_state: WebSocketState) {
  let mut rx = ws_state.output.subscribe();
  debug!("[client] connected");

  loop {
    tokio::select! {
      msg = socket.recv() => {
        match msg {
          Some(Ok(Message::Close(_))) => {
            debug!("[client] closed connection");
            break;
          }
          Some(Ok(Message::Text(_) | Message::Binary(_) | Message::Ping(_) | Message::Pong(_))) => {}
          Some(Err(e)) => {
            warn!("WebSocket error: {e}");
            break;
          }
          None => {
            debug!("[client] disconnected");
            break;
          }
        }
      }

      broadcast = rx.recv() => {
        match broadcast {
          Ok(job_json) => {
            if socket.send(Message::Text(job_json)).await.is_err() {
              break;
            }
          }
          Err(broadcast::error::RecvError::Lagged(n)) => {
            warn!("[ws] Client lagged, dropped {n} jobs");
          }
          Err(broadcast::error::RecvError::Closed) => break,
        }
      }
    }
  }
}
