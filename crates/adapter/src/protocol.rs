//! Protocol module - JSON message types for the control socket
//!
//! Every message is one JSON object per line carrying `type`, `seq`
//! (sender sequence number) and `ts` (milliseconds since the epoch).

use serde::{Deserialize, Serialize};

use arrayvec::ArrayVec;

use triple_tray_core::{GameSnapshot, SlotSnapshot};
use triple_tray_types::{CoreEvent, ItemKind, PlayerAction, RoundPhase};

/// Protocol version spoken by this server
pub const PROTOCOL_VERSION: &str = "1.0.0";

/// Actions accepted in a single command
pub const MAX_ACTIONS: usize = 32;

/// Keyword enum read case-insensitively and written in lowercase
macro_rules! wire_keyword {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal { $($variant:ident => $word:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $word),+
                }
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                [$(Self::$variant),+]
                    .into_iter()
                    .find(|v| s.eq_ignore_ascii_case(v.as_str()))
                    .ok_or_else(|| {
                        serde::de::Error::custom(format!(concat!("invalid ", $what, ": {}"), s))
                    })
            }
        }

        impl Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }
    };
}

// ============== Client -> Game Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HelloType {
    #[default]
    #[serde(rename = "hello")]
    Hello,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CommandType {
    #[default]
    #[serde(rename = "command")]
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ControlType {
    #[default]
    #[serde(rename = "control")]
    Control,
}

/// Client hello message (first message on a connection)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelloMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: HelloType,
    pub seq: u64,
    pub ts: u64,
    pub client: ClientInfo,
    pub protocol_version: String,
    #[serde(default)]
    pub requested: RequestedCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RequestedCapabilities {
    #[serde(default)]
    pub stream_observations: bool,
    #[serde(default)]
    pub command_mode: CommandMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<RequestedRole>,
}

wire_keyword! {
    /// Role a client asks for in its hello
    RequestedRole, "requested role" {
        Auto => "auto",
        Controller => "controller",
        Observer => "observer",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignedRole {
    #[serde(rename = "controller")]
    Controller,
    #[serde(rename = "observer")]
    Observer,
}

/// Command message (controller only)
#[derive(Debug, Clone, Deserialize)]
pub struct CommandMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: CommandType,
    pub seq: u64,
    pub ts: u64,
    pub mode: CommandMode,
    #[serde(default)]
    pub actions: Option<ActionList>,
}

wire_keyword! {
    /// How a command encodes its payload
    CommandMode, "command mode" {
        Action => "action",
    }
}

impl Default for CommandMode {
    fn default() -> Self {
        CommandMode::Action
    }
}

/// Player actions parsed from strings such as `"pick:12"` or `"undo"`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ActionList(pub ArrayVec<PlayerAction, MAX_ACTIONS>);

impl<'de> Deserialize<'de> for ActionList {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;
        impl<'de> serde::de::Visitor<'de> for V {
            type Value = ActionList;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(f, "an array of action strings")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: serde::de::SeqAccess<'de>,
            {
                let mut out = ArrayVec::<PlayerAction, MAX_ACTIONS>::new();
                while let Some(s) = seq.next_element::<&str>()? {
                    let action = PlayerAction::from_str(s).ok_or_else(|| {
                        serde::de::Error::custom(format!("unknown action: {s}"))
                    })?;
                    out.try_push(action)
                        .map_err(|_| serde::de::Error::custom("too many actions"))?;
                }
                Ok(ActionList(out))
            }
        }

        deserializer.deserialize_seq(V)
    }
}

impl Serialize for ActionList {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.0.iter().map(|a| a.to_string()))
    }
}

/// Control message (claim/release controller status)
#[derive(Debug, Clone, Deserialize)]
pub struct ControlMessage {
    #[serde(rename = "type")]
    #[serde(default)]
    pub msg_type: ControlType,
    pub seq: u64,
    pub ts: u64,
    pub action: ControlAction,
}

wire_keyword! {
    ControlAction, "control action" {
        Claim => "claim",
        Release => "release",
    }
}

// ============== Game -> Client Messages ==============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WelcomeType {
    #[serde(rename = "welcome")]
    Welcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckType {
    #[serde(rename = "ack")]
    Ack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AckStatus {
    /// Every action in the command was accepted
    #[serde(rename = "ok")]
    Ok,
    /// At least one action was refused by the game rules
    #[serde(rename = "partial")]
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorType {
    #[serde(rename = "error")]
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "handshake_required")]
    HandshakeRequired,
    #[serde(rename = "protocol_mismatch")]
    ProtocolMismatch,
    #[serde(rename = "not_controller")]
    NotController,
    #[serde(rename = "controller_active")]
    ControllerActive,
    #[serde(rename = "invalid_command")]
    InvalidCommand,
    #[serde(rename = "backpressure")]
    Backpressure,
}

/// Welcome message (response to hello)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WelcomeMessage {
    #[serde(rename = "type")]
    pub msg_type: WelcomeType,
    pub seq: u64,
    pub ts: u64,
    pub protocol_version: String,
    pub client_id: u64,
    pub role: AssignedRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub controller_id: Option<u64>,
    pub game_id: String,
    pub capabilities: ServerCapabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    pub formats: [CapabilityFormat; 1],
    pub command_modes: [CommandMode; 1],
    pub actions: Vec<String>,
    pub features: Vec<CapabilityFeature>,
    pub max_actions: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityFormat {
    #[serde(rename = "json")]
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CapabilityFeature {
    #[serde(rename = "holding")]
    Holding,
    #[serde(rename = "items")]
    Items,
    #[serde(rename = "events")]
    Events,
    #[serde(rename = "state_hash")]
    StateHash,
}

/// Acknowledgment sent once a command has been applied
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AckMessage {
    #[serde(rename = "type")]
    pub msg_type: AckType,
    pub seq: u64,
    pub ts: u64,
    pub status: AckStatus,
    /// Number of actions the game accepted
    pub applied: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "type")]
    pub msg_type: ErrorType,
    pub seq: u64,
    pub ts: u64,
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObservationType {
    #[serde(rename = "observation")]
    Observation,
}

/// Game state observation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservationMessage {
    #[serde(rename = "type")]
    pub msg_type: ObservationType,
    pub seq: u64,
    pub ts: u64,
    pub phase: PhaseLower,
    pub transitioning: bool,
    /// Picks and items are accepted right now
    pub playable: bool,
    pub level: u32,
    pub levels_won: u32,
    pub seed: u32,
    pub board: BoardObservation,
    pub tray: SlotsObservation,
    pub holding: SlotsObservation,
    pub items: Vec<ItemObservation>,
    /// Events since the previous observation
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventLower>,
    pub state_hash: StateHash,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardObservation {
    pub shuffling: bool,
    pub tiles: Vec<BoardTile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardTile {
    pub id: u32,
    pub kind: u16,
    pub layer: u8,
    pub x: f32,
    pub y: f32,
    pub blocked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotsObservation {
    pub capacity: u32,
    #[serde(default)]
    pub busy: bool,
    pub tiles: Vec<SlotTile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotTile {
    pub id: u32,
    pub kind: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemObservation {
    pub kind: ItemKindLower,
    pub claimed: bool,
    pub uses: u32,
    pub usable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhaseLower {
    #[serde(rename = "home")]
    Home,
    #[serde(rename = "loading")]
    Loading,
    #[serde(rename = "playing")]
    Playing,
    #[serde(rename = "lost")]
    Lost,
}

impl From<RoundPhase> for PhaseLower {
    fn from(value: RoundPhase) -> Self {
        match value {
            RoundPhase::Home => Self::Home,
            RoundPhase::Loading => Self::Loading,
            RoundPhase::Playing => Self::Playing,
            RoundPhase::Lost => Self::Lost,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKindLower {
    #[serde(rename = "remove")]
    Remove,
    #[serde(rename = "undo")]
    Undo,
    #[serde(rename = "shuffle")]
    Shuffle,
}

impl From<ItemKind> for ItemKindLower {
    fn from(value: ItemKind) -> Self {
        match value {
            ItemKind::Remove => Self::Remove,
            ItemKind::Undo => Self::Undo,
            ItemKind::Shuffle => Self::Shuffle,
        }
    }
}

/// Wire form of a [`CoreEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventLower {
    BoardChanged,
    TrayChanged,
    HoldingChanged,
    TrayFull,
    TilesCleared { count: u32 },
    ItemUsed { item: ItemKindLower },
    PhaseChanged { from: PhaseLower, to: PhaseLower },
    RoundWon { level: u32 },
    RoundLost { level: u32 },
}

impl From<CoreEvent> for EventLower {
    fn from(value: CoreEvent) -> Self {
        match value {
            CoreEvent::BoardChanged => Self::BoardChanged,
            CoreEvent::TrayChanged => Self::TrayChanged,
            CoreEvent::HoldingChanged => Self::HoldingChanged,
            CoreEvent::TrayFull => Self::TrayFull,
            CoreEvent::TilesCleared { count } => Self::TilesCleared { count },
            CoreEvent::ItemUsed { kind } => Self::ItemUsed { item: kind.into() },
            CoreEvent::PhaseChanged { from, to } => Self::PhaseChanged {
                from: from.into(),
                to: to.into(),
            },
            CoreEvent::RoundWon { level } => Self::RoundWon { level },
            CoreEvent::RoundLost { level } => Self::RoundLost { level },
        }
    }
}

/// Deterministic state hash serialized as 16 lowercase hex digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateHash(pub u64);

impl Serialize for StateHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&format!("{:016x}", self.0))
    }
}

impl<'de> Deserialize<'de> for StateHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = <&str>::deserialize(deserializer)?;
        u64::from_str_radix(s.trim(), 16)
            .map(StateHash)
            .map_err(|_| serde::de::Error::custom("invalid hex"))
    }
}

// ============== Message Parsing ==============

/// Parse one inbound line
///
/// A well-formed object with an unrecognized `type` is reported as
/// [`ParsedMessage::Unknown`] rather than a parse error.
pub fn parse_message(json: &str) -> Result<ParsedMessage, serde_json::Error> {
    #[derive(Debug, Deserialize)]
    #[serde(tag = "type")]
    enum InboundMessage {
        #[serde(rename = "hello")]
        Hello(HelloMessage),
        #[serde(rename = "command")]
        Command(CommandMessage),
        #[serde(rename = "control")]
        Control(ControlMessage),
    }

    match serde_json::from_str::<InboundMessage>(json) {
        Ok(InboundMessage::Hello(m)) => Ok(ParsedMessage::Hello(m)),
        Ok(InboundMessage::Command(m)) => Ok(ParsedMessage::Command(m)),
        Ok(InboundMessage::Control(m)) => Ok(ParsedMessage::Control(m)),
        Err(e) => {
            #[derive(Debug, Deserialize)]
            struct Envelope<'a> {
                #[serde(rename = "type", borrow)]
                msg_type: Option<&'a str>,
                seq: Option<u64>,
            }
            let envelope = serde_json::from_str::<Envelope>(json)?;
            match envelope.msg_type {
                Some("hello" | "command" | "control") => Err(e),
                _ => Ok(ParsedMessage::Unknown(UnknownMessage {
                    seq: envelope.seq.unwrap_or(0),
                })),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub enum ParsedMessage {
    Hello(HelloMessage),
    Command(CommandMessage),
    Control(ControlMessage),
    Unknown(UnknownMessage),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownMessage {
    pub seq: u64,
}

/// Same major version as this server
pub fn is_compatible_version(version: &str) -> bool {
    let major = |v: &str| v.split('.').next().map(str::to_owned);
    major(version).is_some_and(|m| Some(m) == major(PROTOCOL_VERSION))
}

// ============== Utility Functions ==============

/// Create a hello message
pub fn create_hello(seq: u64, client_name: &str, protocol_version: &str) -> HelloMessage {
    HelloMessage {
        msg_type: HelloType::Hello,
        seq,
        ts: current_timestamp_ms(),
        client: ClientInfo {
            name: client_name.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        },
        protocol_version: protocol_version.to_string(),
        requested: RequestedCapabilities {
            stream_observations: true,
            command_mode: CommandMode::Action,
            role: Some(RequestedRole::Auto),
        },
    }
}

/// Create a welcome message
pub fn create_welcome(
    seq: u64,
    protocol_version: &str,
    client_id: u64,
    role: AssignedRole,
    controller_id: Option<u64>,
) -> WelcomeMessage {
    WelcomeMessage {
        msg_type: WelcomeType::Welcome,
        seq,
        ts: current_timestamp_ms(),
        protocol_version: protocol_version.to_string(),
        client_id,
        role,
        controller_id,
        game_id: "triple-tray".to_string(),
        capabilities: ServerCapabilities {
            formats: [CapabilityFormat::Json],
            command_modes: [CommandMode::Action],
            actions: [
                "start", "pick:<id>", "release:<id>", "remove", "undo", "shuffle",
                "claim:<item>", "retry", "home", "settle",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            features: vec![
                CapabilityFeature::Holding,
                CapabilityFeature::Items,
                CapabilityFeature::Events,
                CapabilityFeature::StateHash,
            ],
            max_actions: MAX_ACTIONS as u32,
        },
    }
}

/// Create an acknowledgment for `applied` of `requested` actions
pub fn create_ack(seq: u64, applied: u32, requested: u32) -> AckMessage {
    AckMessage {
        msg_type: AckType::Ack,
        seq,
        ts: current_timestamp_ms(),
        status: if applied >= requested {
            AckStatus::Ok
        } else {
            AckStatus::Partial
        },
        applied,
    }
}

/// Create an error message
pub fn create_error(seq: u64, code: ErrorCode, message: &str) -> ErrorMessage {
    ErrorMessage {
        msg_type: ErrorType::Error,
        seq,
        ts: current_timestamp_ms(),
        code,
        message: message.to_string(),
    }
}

/// Build an observation from a snapshot
pub fn create_observation(
    seq: u64,
    snapshot: &GameSnapshot,
    events: &[CoreEvent],
    state_hash: StateHash,
) -> ObservationMessage {
    let slots = |tiles: &[SlotSnapshot]| -> Vec<SlotTile> {
        tiles
            .iter()
            .map(|t| SlotTile {
                id: t.id.0,
                kind: t.kind.0,
            })
            .collect()
    };

    ObservationMessage {
        msg_type: ObservationType::Observation,
        seq,
        ts: current_timestamp_ms(),
        phase: snapshot.phase.into(),
        transitioning: snapshot.transitioning,
        playable: snapshot.phase == RoundPhase::Playing
            && !snapshot.transitioning
            && !snapshot.tray_busy
            && !snapshot.board_shuffling,
        level: snapshot.level,
        levels_won: snapshot.levels_won,
        seed: snapshot.seed,
        board: BoardObservation {
            shuffling: snapshot.board_shuffling,
            tiles: snapshot
                .board
                .iter()
                .map(|t| BoardTile {
                    id: t.id.0,
                    kind: t.kind.0,
                    layer: t.layer,
                    x: t.x,
                    y: t.y,
                    blocked: t.blocked,
                })
                .collect(),
        },
        tray: SlotsObservation {
            capacity: snapshot.tray_capacity,
            busy: snapshot.tray_busy,
            tiles: slots(&snapshot.tray),
        },
        holding: SlotsObservation {
            capacity: snapshot.holding_capacity,
            busy: false,
            tiles: slots(&snapshot.holding),
        },
        items: snapshot
            .items
            .iter()
            .map(|i| ItemObservation {
                kind: i.kind.into(),
                claimed: i.claimed,
                uses: i.uses,
                usable: i.usable,
            })
            .collect(),
        events: events.iter().copied().map(EventLower::from).collect(),
        state_hash,
    }
}

/// Current timestamp in milliseconds
pub(crate) fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
