//! Adapter runtime integration.
//!
//! Bridges the guide controller with the async TCP server: commands flow in
//! through a bounded queue, events and replies flow out through an unbounded
//! one.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use tokio::runtime::Runtime;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::core::GridEvent;
use crate::engine::{ChannelSource, EngineError, EpgController};
use crate::protocol::{create_ack, create_error, create_event, AckMessage, ErrorCode, ErrorMessage};
use crate::server::{run_server, ServerConfig, ServerState};
use crate::types::Slot;

/// Command delivered to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundCommand {
    pub client_id: u64,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundPayload {
    /// A client finished its handshake and wants the current guide.
    SyncRequest,
    Command(GuideCommand),
}

/// Command payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideCommand {
    Fetch { start: Slot, duration: i64 },
    SwitchChannel { index: usize },
    Rescan,
}

/// Outbound message to be delivered by the server.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClient { client_id: u64, line: String },
    Broadcast { line: String },
    ToClientAck { client_id: u64, ack: AckMessage },
    ToClientError { client_id: u64, err: ErrorMessage },
}

/// Run one command against the controller.
pub async fn execute<S: ChannelSource>(
    controller: &EpgController<S>,
    command: GuideCommand,
) -> Result<(), EngineError> {
    match command {
        GuideCommand::Fetch { start, duration } => {
            controller.fetch_programs(start, duration).await?;
        }
        GuideCommand::SwitchChannel { index } => {
            controller.switch_channel(index).await?;
        }
        GuideCommand::Rescan => controller.start().await?,
    }
    Ok(())
}

/// The reply owed to the client that sent `seq`.
pub fn reply(client_id: u64, seq: u64, result: &Result<(), EngineError>) -> OutboundMessage {
    match result {
        Ok(()) => OutboundMessage::ToClientAck {
            client_id,
            ack: create_ack(seq),
        },
        Err(e) => OutboundMessage::ToClientError {
            client_id,
            err: create_error(seq, ErrorCode::CommandFailed, &e.to_string()),
        },
    }
}

/// Serializes grid events and hands them to the server.
///
/// All lines share one sequence counter, so a client sees `seq` strictly
/// increasing across broadcasts and its own catch-up replay.
#[derive(Debug, Clone)]
pub struct EventForwarder {
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
    seq: Arc<AtomicU64>,
}

impl EventForwarder {
    pub fn new(out_tx: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        Self {
            out_tx,
            seq: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Broadcast one event to every streaming client.
    pub fn forward(&self, event: &GridEvent) -> bool {
        match self.encode(event) {
            Some(line) => self.out_tx.send(OutboundMessage::Broadcast { line }).is_ok(),
            None => false,
        }
    }

    /// Send `events` to one client only.
    pub fn replay_to(&self, client_id: u64, events: &[GridEvent]) -> bool {
        events.iter().all(|event| match self.encode(event) {
            Some(line) => self
                .out_tx
                .send(OutboundMessage::ToClient { client_id, line })
                .is_ok(),
            None => false,
        })
    }

    /// Subscribe to every event of `controller`.
    pub fn attach<S: ChannelSource>(&self, controller: &EpgController<S>) {
        let forwarder = self.clone();
        controller.on_any(move |event| {
            forwarder.forward(event);
        });
    }

    fn encode(&self, event: &GridEvent) -> Option<String> {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed) + 1;
        match serde_json::to_string(&create_event(seq, event.clone())) {
            Ok(line) => Some(line),
            Err(e) => {
                warn!(seq, error = %e, "failed to encode grid event");
                None
            }
        }
    }
}

/// Running adapter instance.
pub struct Adapter {
    _rt: Runtime,
    addr: SocketAddr,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Adapter {
    /// Start the adapter from environment variables.
    ///
    /// Returns `Ok(None)` if `EPG_ADAPTER_DISABLED` is set.
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        if ServerState::is_disabled() {
            info!("event adapter disabled via EPG_ADAPTER_DISABLED");
            return Ok(None);
        }
        Self::start(ServerConfig::from_env()).map(Some)
    }

    /// Start the server on its own runtime and wait until it is listening.
    ///
    /// Must be called outside of an async context.
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();
        let (ready_tx, ready_rx) = oneshot::channel();

        let rt = Runtime::new().context("failed to create adapter runtime")?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, Some(ready_tx)).await {
                error!(error = %e, "event adapter stopped");
            }
        });

        let addr = ready_rx
            .blocking_recv()
            .context("event adapter failed to start")?;

        Ok(Self {
            _rt: rt,
            addr,
            cmd_rx,
            out_tx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }

    pub fn forwarder(&self) -> EventForwarder {
        EventForwarder::new(self.out_tx.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ChannelInfo;

    #[test]
    fn forwarder_numbers_lines_across_broadcast_and_replay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let forwarder = EventForwarder::new(tx);

        assert!(forwarder.forward(&GridEvent::AllChannelFetched));
        assert!(forwarder.replay_to(
            9,
            &[
                GridEvent::Reset { generation: 1 },
                GridEvent::AppendChannel {
                    channel: ChannelInfo {
                        number: "1".into(),
                        name: "One".into(),
                    },
                    index: 0,
                },
            ],
        ));

        let mut seqs = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            let (target, line) = match msg {
                OutboundMessage::Broadcast { line } => (None, line),
                OutboundMessage::ToClient { client_id, line } => (Some(client_id), line),
                other => panic!("unexpected {other:?}"),
            };
            let v: serde_json::Value = serde_json::from_str(&line).unwrap();
            assert_eq!(v["type"], "event");
            seqs.push((target, v["seq"].as_u64().unwrap()));
        }
        assert_eq!(seqs, vec![(None, 1), (Some(9), 2), (Some(9), 3)]);
    }

    #[test]
    fn forwarder_reports_closed_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let forwarder = EventForwarder::new(tx);
        assert!(!forwarder.forward(&GridEvent::AllTimelineAdded));
    }

    #[test]
    fn reply_maps_result_to_ack_or_error() {
        match reply(3, 7, &Ok(())) {
            OutboundMessage::ToClientAck { client_id, ack } => {
                assert_eq!(client_id, 3);
                assert_eq!(ack.seq, 7);
            }
            other => panic!("unexpected {other:?}"),
        }

        let failed = Err(EngineError::ChannelOutOfRange { index: 4, count: 2 });
        match reply(3, 8, &failed) {
            OutboundMessage::ToClientError { err, .. } => {
                assert_eq!(err.code, ErrorCode::CommandFailed);
                assert_eq!(err.seq, 8);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
