//! TCP server for the control socket
//!
//! Accepts connections, performs the hello/welcome handshake, enforces the
//! controller role and per-client sequencing, and forwards validated
//! commands to the game loop through a bounded channel.

use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, RwLock};

use crate::protocol::*;
use crate::runtime::{ClientCommand, InboundCommand, InboundPayload, OutboundMessage};
use triple_tray_core::GameSnapshot;

/// Stable 64-bit FNV-1a hasher for `state_hash`
///
/// `DefaultHasher` output is not guaranteed stable across Rust versions.
#[derive(Debug, Clone)]
pub struct Fnv1aHasher {
    state: u64,
}

impl Fnv1aHasher {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;

    pub fn new() -> Self {
        Self {
            state: Self::OFFSET_BASIS,
        }
    }
}

impl Default for Fnv1aHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for Fnv1aHasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.state ^= b as u64;
            self.state = self.state.wrapping_mul(Self::PRIME);
        }
    }
}

/// Hash everything an observer can see in a snapshot
pub fn state_hash(snapshot: &GameSnapshot) -> StateHash {
    let mut hasher = Fnv1aHasher::new();
    snapshot.phase.hash(&mut hasher);
    snapshot.transitioning.hash(&mut hasher);
    snapshot.level.hash(&mut hasher);
    snapshot.levels_won.hash(&mut hasher);
    snapshot.seed.hash(&mut hasher);
    for tile in &snapshot.board {
        tile.id.hash(&mut hasher);
        tile.kind.hash(&mut hasher);
        tile.layer.hash(&mut hasher);
        tile.x.to_bits().hash(&mut hasher);
        tile.y.to_bits().hash(&mut hasher);
        tile.blocked.hash(&mut hasher);
    }
    snapshot.tray.hash(&mut hasher);
    snapshot.holding.hash(&mut hasher);
    snapshot.tray_busy.hash(&mut hasher);
    snapshot.board_shuffling.hash(&mut hasher);
    snapshot.items.hash(&mut hasher);
    StateHash(hasher.finish())
}

/// Build an observation message for the current game snapshot
pub fn build_observation(
    seq: u64,
    snapshot: &GameSnapshot,
    events: &[triple_tray_types::CoreEvent],
) -> ObservationMessage {
    create_observation(seq, snapshot, events, state_hash(snapshot))
}

fn extract_seq_best_effort(s: &str) -> Option<u64> {
    let start = s.find("\"seq\"")?;
    let after_key = &s[start + 5..];
    let colon = after_key.find(':')?;
    let rest = after_key[colon + 1..].trim_start();
    let end = rest.bytes().take_while(u8::is_ascii_digit).count();
    if end == 0 {
        return None;
    }
    rest[..end].parse::<u64>().ok()
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub protocol_version: String,
    pub max_pending_commands: usize,
    pub log_path: Option<String>,
    pub disabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7878,
            protocol_version: PROTOCOL_VERSION.to_string(),
            max_pending_commands: 10,
            log_path: None,
            disabled: false,
        }
    }
}

impl ServerConfig {
    /// Read `TRIPLE_TRAY_AI_*` variables over the defaults
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(host) = lookup("TRIPLE_TRAY_AI_HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("TRIPLE_TRAY_AI_PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid TRIPLE_TRAY_AI_PORT: {port}"))?;
        }
        if let Some(pending) = lookup("TRIPLE_TRAY_AI_MAX_PENDING") {
            config.max_pending_commands = pending
                .trim()
                .parse()
                .with_context(|| format!("invalid TRIPLE_TRAY_AI_MAX_PENDING: {pending}"))?;
        }
        config.log_path = lookup("TRIPLE_TRAY_AI_LOG_PATH")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        config.disabled = lookup("TRIPLE_TRAY_AI_DISABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Handle to a connected client
pub struct ClientHandle {
    pub id: usize,
    pub addr: SocketAddr,
    pub is_controller: bool,
    pub stream_observations: bool,
    pub handshaken: bool,
    pub last_seq: Option<u64>,
    tx: mpsc::UnboundedSender<ClientOutbound>,
}

#[derive(Debug, Clone)]
enum ClientOutbound {
    Welcome(WelcomeMessage),
    Ack(AckMessage),
    Error(ErrorMessage),
    Observation(ObservationMessage),
}

impl ClientOutbound {
    fn to_line(&self) -> serde_json::Result<String> {
        match self {
            ClientOutbound::Welcome(m) => serde_json::to_string(m),
            ClientOutbound::Ack(m) => serde_json::to_string(m),
            ClientOutbound::Error(m) => serde_json::to_string(m),
            ClientOutbound::Observation(m) => serde_json::to_string(m),
        }
    }
}

/// Shared server state
pub struct ServerState {
    config: ServerConfig,
    clients: RwLock<Vec<ClientHandle>>,
    controller: RwLock<Option<usize>>,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            clients: RwLock::new(Vec::new()),
            controller: RwLock::new(None),
        }
    }

    async fn is_handshaken(&self, client_id: usize) -> bool {
        let clients = self.clients.read().await;
        clients
            .iter()
            .find(|c| c.id == client_id)
            .is_some_and(|c| c.handshaken)
    }

    async fn is_controller(&self, client_id: usize) -> bool {
        *self.controller.read().await == Some(client_id)
    }

    /// Record `seq`; false when it does not strictly increase
    async fn check_and_update_seq(&self, client_id: usize, seq: u64) -> bool {
        let mut clients = self.clients.write().await;
        let Some(client) = clients.iter_mut().find(|c| c.id == client_id) else {
            return true;
        };
        match client.last_seq {
            Some(prev) if seq <= prev => false,
            _ => {
                client.last_seq = Some(seq);
                true
            }
        }
    }

    async fn send_to(&self, client_id: usize, msg: ClientOutbound) {
        let clients = self.clients.read().await;
        if let Some(c) = clients.iter().find(|c| c.id == client_id) {
            let _ = c.tx.send(msg);
        }
    }

    async fn broadcast(&self, obs: ObservationMessage) {
        let clients = self.clients.read().await;
        for c in clients.iter().filter(|c| c.stream_observations) {
            let _ = c.tx.send(ClientOutbound::Observation(obs.clone()));
        }
    }
}

/// Run the TCP server until the listener fails
///
/// `ready_tx` receives the bound address once listening (useful with port 0).
pub async fn run_server(
    config: ServerConfig,
    command_tx: mpsc::Sender<InboundCommand>,
    mut out_rx: mpsc::UnboundedReceiver<OutboundMessage>,
    ready_tx: Option<oneshot::Sender<SocketAddr>>,
) -> anyhow::Result<()> {
    let wire_log_tx = match config.log_path.clone() {
        Some(path) => Some(spawn_wire_log(path).await?),
        None => None,
    };

    let listener = TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;
    let bound = listener.local_addr()?;
    log::info!("adapter listening on {}", bound);
    if let Some(tx) = ready_tx {
        let _ = tx.send(bound);
    }

    let state = Arc::new(ServerState::new(config));

    // Outbound dispatcher.
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutboundMessage::ToClientAck { client_id, ack } => {
                        state.send_to(client_id, ClientOutbound::Ack(ack)).await
                    }
                    OutboundMessage::ToClientError { client_id, err } => {
                        state.send_to(client_id, ClientOutbound::Error(err)).await
                    }
                    OutboundMessage::ToClientObservation { client_id, obs } => {
                        state
                            .send_to(client_id, ClientOutbound::Observation(obs))
                            .await
                    }
                    OutboundMessage::BroadcastObservation { obs } => state.broadcast(obs).await,
                }
            }
        });
    }

    let mut client_id_counter = 0usize;
    loop {
        let (socket, addr) = listener.accept().await?;
        client_id_counter += 1;
        let client_id = client_id_counter;
        log::info!("client {} connected from {}", client_id, addr);

        let state = Arc::clone(&state);
        let command_tx = command_tx.clone();
        let wire_log_tx = wire_log_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_client(socket, addr, client_id, state, command_tx, wire_log_tx).await
            {
                log::warn!("client {} error: {:#}", client_id, e);
            }
            log::info!("client {} disconnected", client_id);
        });
    }
}

/// Append every wire line to `path`
async fn spawn_wire_log(path: String) -> anyhow::Result<mpsc::UnboundedSender<String>> {
    use tokio::fs::OpenOptions;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .with_context(|| format!("failed to open wire log {path}"))?;
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        while let Some(line) = rx.recv().await {
            if file.write_all(line.as_bytes()).await.is_err() || file.write_all(b"\n").await.is_err()
            {
                break;
            }
        }
        let _ = file.flush().await;
    });
    Ok(tx)
}

async fn handle_client(
    socket: TcpStream,
    addr: SocketAddr,
    client_id: usize,
    state: Arc<ServerState>,
    command_tx: mpsc::Sender<InboundCommand>,
    wire_log_tx: Option<mpsc::UnboundedSender<String>>,
) -> anyhow::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut reader = BufReader::new(reader);
    let (tx, mut rx) = mpsc::unbounded_channel::<ClientOutbound>();

    state.clients.write().await.push(ClientHandle {
        id: client_id,
        addr,
        is_controller: false,
        stream_observations: false,
        handshaken: false,
        last_seq: None,
        tx: tx.clone(),
    });

    let out_log = wire_log_tx.clone();
    let write_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let line = match msg.to_line() {
                Ok(line) => line,
                Err(e) => {
                    log::error!("failed to encode outbound message: {}", e);
                    continue;
                }
            };
            if writer.write_all(line.as_bytes()).await.is_err()
                || writer.write_all(b"\n").await.is_err()
                || writer.flush().await.is_err()
            {
                break;
            }
            if let Some(log_tx) = out_log.as_ref() {
                let _ = log_tx.send(line);
            }
        }
    });

    let reply = |msg: ClientOutbound| {
        let _ = tx.send(msg);
    };
    let reject = |seq: u64, code: ErrorCode, message: &str| {
        log::warn!("client {} rejected: {}", client_id, message);
        let _ = tx.send(ClientOutbound::Error(create_error(seq, code, message)));
    };

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            break;
        }
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(log_tx) = wire_log_tx.as_ref() {
            let _ = log_tx.send(trimmed.to_string());
        }

        match parse_message(trimmed) {
            Ok(ParsedMessage::Hello(hello)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, hello.seq).await
                {
                    reject(hello.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                if !is_compatible_version(&hello.protocol_version) {
                    reject(
                        hello.seq,
                        ErrorCode::ProtocolMismatch,
                        &format!("Protocol version {} not supported", hello.protocol_version),
                    );
                    break;
                }

                let wants_control = hello.requested.role != Some(RequestedRole::Observer);
                let role = {
                    let mut controller = state.controller.write().await;
                    let mut clients = state.clients.write().await;
                    let take_control = wants_control && controller.is_none();
                    if take_control {
                        *controller = Some(client_id);
                        log::info!("client {} is now controller", client_id);
                    }
                    if let Some(client) = clients.iter_mut().find(|c| c.id == client_id) {
                        client.handshaken = true;
                        client.last_seq = Some(hello.seq);
                        client.stream_observations = hello.requested.stream_observations;
                        client.is_controller |= take_control;
                    }
                    if *controller == Some(client_id) {
                        AssignedRole::Controller
                    } else {
                        AssignedRole::Observer
                    }
                };
                let controller_id = state.controller.read().await.map(|id| id as u64);
                reply(ClientOutbound::Welcome(create_welcome(
                    hello.seq,
                    &state.config.protocol_version,
                    client_id as u64,
                    role,
                    controller_id,
                )));

                if hello.requested.stream_observations {
                    let _ = command_tx.try_send(InboundCommand {
                        client_id,
                        seq: hello.seq,
                        payload: InboundPayload::SnapshotRequest,
                    });
                }
            }

            Ok(ParsedMessage::Command(cmd)) => {
                if !state.is_handshaken(client_id).await {
                    reject(cmd.seq, ErrorCode::HandshakeRequired, "Send hello before command");
                    continue;
                }
                if !state.check_and_update_seq(client_id, cmd.seq).await {
                    reject(cmd.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                if !state.is_controller(client_id).await {
                    reject(cmd.seq, ErrorCode::NotController, "Only controller may send commands");
                    continue;
                }
                let command = match map_command(&cmd) {
                    Ok(c) => c,
                    Err(message) => {
                        reject(cmd.seq, ErrorCode::InvalidCommand, &message);
                        continue;
                    }
                };
                // The ack is sent by the game loop once the command is applied.
                if command_tx
                    .try_send(InboundCommand {
                        client_id,
                        seq: cmd.seq,
                        payload: InboundPayload::Command(command),
                    })
                    .is_err()
                {
                    reject(cmd.seq, ErrorCode::Backpressure, "Command queue is full");
                }
            }

            Ok(ParsedMessage::Control(ctrl)) => {
                if !state.is_handshaken(client_id).await {
                    reject(ctrl.seq, ErrorCode::HandshakeRequired, "Send hello before control");
                    continue;
                }
                if !state.check_and_update_seq(client_id, ctrl.seq).await {
                    reject(ctrl.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                let mut controller = state.controller.write().await;
                let mut clients = state.clients.write().await;
                match ctrl.action {
                    ControlAction::Claim => match *controller {
                        None => {
                            *controller = Some(client_id);
                            if let Some(c) = clients.iter_mut().find(|c| c.id == client_id) {
                                c.is_controller = true;
                            }
                            log::info!("client {} claimed control", client_id);
                            reply(ClientOutbound::Ack(create_ack(ctrl.seq, 1, 1)));
                        }
                        Some(id) if id == client_id => {
                            reply(ClientOutbound::Ack(create_ack(ctrl.seq, 1, 1)));
                        }
                        Some(_) => reject(
                            ctrl.seq,
                            ErrorCode::ControllerActive,
                            "Controller already assigned",
                        ),
                    },
                    ControlAction::Release => {
                        if *controller == Some(client_id) {
                            *controller = None;
                            if let Some(c) = clients.iter_mut().find(|c| c.id == client_id) {
                                c.is_controller = false;
                            }
                            log::info!("client {} released control", client_id);
                            reply(ClientOutbound::Ack(create_ack(ctrl.seq, 1, 1)));
                        } else {
                            reject(ctrl.seq, ErrorCode::NotController, "Only controller may release");
                        }
                    }
                }
            }

            Ok(ParsedMessage::Unknown(unknown)) => {
                if state.is_handshaken(client_id).await
                    && !state.check_and_update_seq(client_id, unknown.seq).await
                {
                    reject(unknown.seq, ErrorCode::InvalidCommand, "seq must be strictly increasing");
                    continue;
                }
                reject(unknown.seq, ErrorCode::InvalidCommand, "Unknown message type");
            }

            Err(e) => {
                let seq = extract_seq_best_effort(trimmed).unwrap_or(0);
                reject(seq, ErrorCode::InvalidCommand, &format!("JSON parse error: {}", e));
            }
        }
    }

    // Remove the client and promote the next one if it held control.
    {
        let mut controller = state.controller.write().await;
        let mut clients = state.clients.write().await;
        clients.retain(|c| c.id != client_id);

        if *controller == Some(client_id) {
            let next_id = clients.iter().filter(|c| c.handshaken).map(|c| c.id).min();
            *controller = next_id;
            match next_id {
                Some(new_id) => {
                    if let Some(c) = clients.iter_mut().find(|c| c.id == new_id) {
                        c.is_controller = true;
                    }
                    log::info!("client {} promoted to controller", new_id);
                }
                None => log::info!("controller {} released", client_id),
            }
        }
    }

    drop(reply);
    drop(reject);
    drop(tx);
    let _ = write_task.await;
    Ok(())
}

/// Map a protocol command into a game command
fn map_command(cmd: &CommandMessage) -> Result<ClientCommand, String> {
    match cmd.mode {
        CommandMode::Action => {
            let Some(actions) = cmd.actions.as_ref() else {
                return Err("Missing actions".to_string());
            };
            if actions.0.is_empty() {
                return Err("Empty actions".to_string());
            }
            Ok(ClientCommand::Actions(actions.0.clone()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triple_tray_core::{GameConfig, GameState, TimingConfig};
    use triple_tray_types::{PlayerAction, RoundPhase};

    fn game() -> GameState {
        GameState::new(GameConfig {
            timing: TimingConfig::instant(),
            ..GameConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_server_config_from_lookup() {
        let config = ServerConfig::from_lookup(|key| match key {
            "TRIPLE_TRAY_AI_PORT" => Some("9001".to_string()),
            "TRIPLE_TRAY_AI_DISABLED" => Some("TRUE".to_string()),
            "TRIPLE_TRAY_AI_LOG_PATH" => Some("  ".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.host, "127.0.0.1");
        assert!(config.disabled);
        assert!(config.log_path.is_none());
        assert_eq!(config.bind_addr(), "127.0.0.1:9001");
    }

    #[test]
    fn test_server_config_rejects_bad_port() {
        let err = ServerConfig::from_lookup(|key| {
            (key == "TRIPLE_TRAY_AI_PORT").then(|| "seventy".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("TRIPLE_TRAY_AI_PORT"));
    }

    #[test]
    fn test_extract_seq_best_effort() {
        assert_eq!(extract_seq_best_effort(r#"{"seq": 42, "type":"#), Some(42));
        assert_eq!(extract_seq_best_effort(r#"{"type":"x"}"#), None);
    }

    #[test]
    fn test_state_hash_changes_with_pick() {
        let mut gs = game();
        gs.start();
        assert_eq!(gs.phase(), RoundPhase::Playing);
        let before = state_hash(&gs.snapshot());
        assert_eq!(before, state_hash(&gs.snapshot()));

        let id = gs.round().unwrap().board().clickable().next().unwrap().id;
        assert!(gs.apply_action(PlayerAction::Pick(id)));
        assert_ne!(before, state_hash(&gs.snapshot()));
    }

    #[test]
    fn test_build_observation_lists_events() {
        let mut gs = game();
        gs.start();
        let events = gs.take_events();
        let obs = build_observation(3, &gs.snapshot(), &events);
        assert_eq!(obs.seq, 3);
        assert_eq!(obs.phase, PhaseLower::Playing);
        assert!(obs.playable);
        assert!(!obs.events.is_empty());
        assert_eq!(obs.tray.capacity, 7);
        assert_eq!(obs.items.len(), 3);
    }

    #[test]
    fn test_map_command_requires_actions() {
        let msg = r#"{"type":"command","seq":1,"ts":0,"mode":"action"}"#;
        let ParsedMessage::Command(cmd) = parse_message(msg).unwrap() else {
            panic!("expected command");
        };
        assert!(map_command(&cmd).is_err());
    }
}
