//! Adapter runtime integration
//!
//! Bridges the synchronous game loop with the async TCP server: the server
//! runs on an owned tokio runtime, commands arrive through a bounded channel
//! and replies go back through an unbounded one.

use anyhow::Context;
use arrayvec::ArrayVec;
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::protocol::{
    create_ack, AckMessage, ErrorMessage, ObservationMessage, MAX_ACTIONS,
};
use crate::server::{build_observation, run_server, ServerConfig};
use triple_tray_core::GameState;
use triple_tray_types::{CoreEvent, PlayerAction};

/// Command delivered to the game loop
#[derive(Debug, Clone)]
pub struct InboundCommand {
    pub client_id: usize,
    pub seq: u64,
    pub payload: InboundPayload,
}

#[derive(Debug, Clone)]
pub enum InboundPayload {
    Command(ClientCommand),
    /// A client asked for an immediate observation
    SnapshotRequest,
}

/// Command payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    Actions(ArrayVec<PlayerAction, MAX_ACTIONS>),
}

/// Outbound message to be delivered by the server
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    ToClientAck { client_id: usize, ack: AckMessage },
    ToClientError { client_id: usize, err: ErrorMessage },
    ToClientObservation { client_id: usize, obs: ObservationMessage },
    BroadcastObservation { obs: ObservationMessage },
}

/// Apply a command to the game; returns how many actions were accepted
pub fn apply_command(game: &mut GameState, command: &ClientCommand) -> u32 {
    match command {
        ClientCommand::Actions(actions) => actions
            .iter()
            .filter(|&&action| {
                let applied = game.apply_action(action);
                if !applied {
                    log::debug!("action {} refused in phase {}", action, game.phase().as_str());
                }
                applied
            })
            .count() as u32,
    }
}

/// Apply an inbound command and build the replies for it
///
/// `events` is the game's event history since the last observation; it is
/// extended with whatever the command produced.
pub fn handle_inbound(
    game: &mut GameState,
    inbound: &InboundCommand,
    obs_seq: u64,
    events: &mut Vec<CoreEvent>,
) -> Vec<OutboundMessage> {
    match &inbound.payload {
        InboundPayload::SnapshotRequest => vec![OutboundMessage::ToClientObservation {
            client_id: inbound.client_id,
            obs: build_observation(obs_seq, &game.snapshot(), &[]),
        }],
        InboundPayload::Command(command) => {
            let ClientCommand::Actions(actions) = command;
            let applied = apply_command(game, command);
            events.extend(game.take_events());
            vec![OutboundMessage::ToClientAck {
                client_id: inbound.client_id,
                ack: create_ack(inbound.seq, applied, actions.len() as u32),
            }]
        }
    }
}

/// Running adapter instance
pub struct Adapter {
    _rt: Runtime,
    cmd_rx: mpsc::Receiver<InboundCommand>,
    out_tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Adapter {
    /// Start the server on its own runtime
    pub fn start(config: ServerConfig) -> anyhow::Result<Self> {
        let max_pending = config.max_pending_commands.max(1);
        let (cmd_tx, cmd_rx) = mpsc::channel::<InboundCommand>(max_pending);
        let (out_tx, out_rx) = mpsc::unbounded_channel::<OutboundMessage>();

        let rt = Runtime::new().context("failed to create tokio runtime")?;
        rt.spawn(async move {
            if let Err(e) = run_server(config, cmd_tx, out_rx, None).await {
                log::error!("adapter server stopped: {:#}", e);
            }
        });

        Ok(Self {
            _rt: rt,
            cmd_rx,
            out_tx,
        })
    }

    /// Start from `TRIPLE_TRAY_AI_*` variables; `None` when disabled
    pub fn start_from_env() -> anyhow::Result<Option<Self>> {
        let config = ServerConfig::from_env()?;
        if config.disabled {
            log::info!("adapter disabled via TRIPLE_TRAY_AI_DISABLED");
            return Ok(None);
        }
        Self::start(config).map(Some)
    }

    pub fn try_recv(&mut self) -> Option<InboundCommand> {
        self.cmd_rx.try_recv().ok()
    }

    pub fn send(&self, msg: OutboundMessage) {
        let _ = self.out_tx.send(msg);
    }
}
