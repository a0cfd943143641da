//! Adapter module - guide events streamed to renderers over TCP
//!
//! Renderers that live outside the process (a web view, a second terminal, a
//! test harness) connect here and receive every [`GridEvent`] the controller
//! fires. They can also drive the guide with a small set of commands.
//!
//! # Protocol Overview
//!
//! **Line-delimited JSON** over TCP:
//!
//! 1. **Connection**: client connects (default: 127.0.0.1:7878)
//! 2. **Handshake**: client sends `hello`, server responds with `welcome`
//! 3. **Catch-up**: the host replays the current guide to the new client,
//!    starting with a `reset` event
//! 4. **Streaming**: every grid event is broadcast as an `event` message
//! 5. **Commanding**: clients send `command` messages; the host replies with
//!    `ack` once applied, or `error`
//!
//! # Message Types
//!
//! ## Client → Server
//!
//! - **hello**: client info, protocol version, `requested.stream_events`
//! - **command**: `fetch {start, duration}`, `switchChannel {index}`, `rescan`
//!
//! ## Server → Client
//!
//! - **welcome**: response to hello with the assigned client id
//! - **event**: one grid event (`event` name plus `payload`)
//! - **ack**: command applied
//! - **error**: error code and message
//!
//! # Environment Variables
//!
//! - `EPG_ADAPTER_HOST`: bind address (default: "127.0.0.1")
//! - `EPG_ADAPTER_PORT`: port number (default: 7878)
//! - `EPG_ADAPTER_MAX_PENDING`: command queue depth (default: 16)
//! - `EPG_ADAPTER_DISABLED`: set to "1" or "true" to disable the adapter
//!
//! # Example Protocol Flow
//!
//! ```text
//! Client -> Server: {"type":"hello","seq":1,"ts":1,"client":{"name":"viewer","version":"0.1.0"},"protocol_version":"1.0.0"}
//! Server -> Client: {"type":"welcome","seq":1,"ts":2,"protocol_version":"1.0.0","client_id":1,...}
//! Server -> Client: {"type":"event","seq":1,"ts":2,"event":"reset","payload":{"generation":1}}
//! Client -> Server: {"type":"command","seq":2,"ts":3,"command":"fetch","start":0,"duration":8}
//! Server -> Client: {"type":"event","seq":9,"ts":3,"event":"addTimeline","payload":{"column":0,"time":0}}
//! Server -> Client: {"type":"ack","seq":2,"ts":4,"status":"ok"}
//! ```
//!
//! [`GridEvent`]: crate::core::GridEvent

pub mod protocol;
pub mod runtime;
pub mod server;

pub use tv_epg_core as core;
pub use tv_epg_engine as engine;
pub use tv_epg_types as types;

pub use protocol::*;
pub use runtime::{
    execute, reply, Adapter, EventForwarder, GuideCommand, InboundCommand, InboundPayload,
    OutboundMessage,
};
pub use server::*;
