//! Holding area - where the Remove item parks tray tiles
//!
//! Holding tiles are always clickable. Releasing one sends it back through
//! the normal tray insertion path; if the tray refuses it, the tile returns
//! to the same holding slot.

use arrayvec::ArrayVec;

use crate::tile::Tile;
use triple_tray_types::{TileId, MAX_HOLDING_SLOTS};

#[derive(Debug, Clone)]
pub struct Holding {
    tiles: ArrayVec<Tile, MAX_HOLDING_SLOTS>,
    capacity: usize,
}

impl Holding {
    /// Create a new empty holding area (capacity clamped to fixed storage)
    pub fn new(capacity: usize) -> Self {
        Self {
            tiles: ArrayVec::new(),
            capacity: capacity.min(MAX_HOLDING_SLOTS),
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.tiles.len())
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.tiles.iter().any(|t| t.id == id)
    }

    /// Append a tile, handing it back when holding is full
    pub fn push(&mut self, tile: Tile) -> Result<(), Tile> {
        if self.free_slots() == 0 {
            return Err(tile);
        }
        self.tiles.try_push(tile).map_err(|e| e.element())
    }

    /// Take a tile out, returning its slot index with it
    pub fn take(&mut self, id: TileId) -> Option<(usize, Tile)> {
        let index = self.tiles.iter().position(|t| t.id == id)?;
        Some((index, self.tiles.remove(index)))
    }

    /// Put a tile back at `index` after a refused release
    pub fn reinsert(&mut self, index: usize, tile: Tile) -> Result<(), Tile> {
        if self.free_slots() == 0 {
            return Err(tile);
        }
        let index = index.min(self.tiles.len());
        self.tiles.try_insert(index, tile).map_err(|e| e.element())
    }
}
