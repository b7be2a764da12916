//! Adapter crate - external control via TCP socket with a JSON line protocol
//!
//! External agents (bots, test harnesses, remote UIs) play the game through
//! the same [`PlayerAction`](triple_tray_types::PlayerAction)s a local player
//! uses. The game loop stays synchronous; the server runs on its own tokio
//! runtime and hands commands over a bounded channel.
//!
//! # Protocol Overview
//!
//! 1. **Connection**: client connects (default `127.0.0.1:7878`)
//! 2. **Handshake**: client sends `hello`, server answers `welcome`
//! 3. **Controller**: the first client to hello becomes the controller;
//!    others observe until they `claim` a released controller slot
//! 4. **Commands**: the controller sends `command` with up to 32 action
//!    strings; the game loop applies them and answers `ack`
//! 5. **Observations**: clients that asked for a stream receive an
//!    `observation` whenever the game changes
//!
//! Sequence numbers must strictly increase per client. A full command
//! queue is reported as a `backpressure` error instead of blocking.
//!
//! # Actions
//!
//! `start`, `pick:<tile id>`, `release:<tile id>`, `remove`, `undo`,
//! `shuffle`, `claim:<item>`, `retry`, `home`, `settle`.
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":0,"client":{"name":"bot","version":"0.1"},"protocol_version":"1.0.0","requested":{"stream_observations":true,"command_mode":"action"}}
//! Server -> Client: {"type":"welcome","seq":1,"ts":...,"protocol_version":"1.0.0","client_id":1,"role":"controller",...}
//! Client -> Server: {"type":"command","seq":2,"ts":0,"mode":"action","actions":["start","pick:17"]}
//! Server -> Client: {"type":"ack","seq":2,"ts":...,"status":"ok","applied":2}
//! Server -> Client: {"type":"observation","seq":3,...,"tray":{"capacity":7,"busy":false,"tiles":[{"id":17,"kind":4}]},...}
//! ```
//!
//! # Environment Variables
//!
//! - `TRIPLE_TRAY_AI_HOST`: bind address (default `127.0.0.1`)
//! - `TRIPLE_TRAY_AI_PORT`: port (default 7878)
//! - `TRIPLE_TRAY_AI_MAX_PENDING`: command queue depth (default 10)
//! - `TRIPLE_TRAY_AI_LOG_PATH`: append every wire line to this file
//! - `TRIPLE_TRAY_AI_DISABLED`: `1` or `true` disables the adapter

pub mod protocol;
pub mod runtime;
pub mod server;

pub use triple_tray_core as core;
pub use triple_tray_types as types;

pub use protocol::*;
pub use runtime::{
    apply_command, handle_inbound, Adapter, ClientCommand, InboundCommand, InboundPayload,
    OutboundMessage,
};
pub use server::{build_observation, run_server, state_hash, ServerConfig, ServerState};
