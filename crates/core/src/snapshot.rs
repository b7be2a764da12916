//! Read-only views of the game for observers (AI adapter, tooling)

use triple_tray_types::{ItemKind, RoundPhase, TileId, TileTypeId};

/// A board tile as observers see it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSnapshot {
    pub id: TileId,
    pub kind: TileTypeId,
    pub layer: u8,
    pub x: f32,
    pub y: f32,
    pub blocked: bool,
}

/// A tray or holding slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotSnapshot {
    pub id: TileId,
    pub kind: TileTypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ItemSnapshot {
    pub kind: ItemKind,
    pub claimed: bool,
    pub uses: u32,
    /// Claimed, has uses, and its board/tray precondition holds
    pub usable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameSnapshot {
    pub phase: RoundPhase,
    pub transitioning: bool,
    pub level: u32,
    pub levels_won: u32,
    pub seed: u32,
    pub board: Vec<TileSnapshot>,
    pub tray: Vec<SlotSnapshot>,
    pub holding: Vec<SlotSnapshot>,
    pub tray_capacity: u32,
    pub holding_capacity: u32,
    pub tray_busy: bool,
    pub board_shuffling: bool,
    pub items: Vec<ItemSnapshot>,
}

impl GameSnapshot {
    /// Snapshot with no round loaded
    pub fn empty(phase: RoundPhase) -> Self {
        Self {
            phase,
            transitioning: false,
            level: 0,
            levels_won: 0,
            seed: 0,
            board: Vec::new(),
            tray: Vec::new(),
            holding: Vec::new(),
            tray_capacity: 0,
            holding_capacity: 0,
            tray_busy: false,
            board_shuffling: false,
            items: Vec::new(),
        }
    }

    /// Unblocked board tiles
    pub fn clickable(&self) -> impl Iterator<Item = &TileSnapshot> + '_ {
        self.board.iter().filter(|t| !t.blocked)
    }
}
