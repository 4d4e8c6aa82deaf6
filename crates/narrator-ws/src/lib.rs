/*! Narration over WebSocket: every job is broadcast as JSON to `/ws` clients. */

mod server;

pub use server::{start_server, WebSocketState, WsOutput, DEFAULT_WS_PORT};
