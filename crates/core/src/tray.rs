//! Tray module - ordered collection slots with match and chain clearing
//!
//! # State machine
//!
//! ```text
//! Idle --try_insert--> (match?) --yes--> Clearing --complete_clear--> (chain?) --yes--> Clearing
//!                          |                                              |
//!                          no                                             no
//!                          v                                              v
//!                        Idle                                           Idle
//! ```
//!
//! Insertion and match evaluation happen together in [`Tray::try_insert`].
//! A match puts the tray into [`TrayPhase::Clearing`], during which every
//! mutation is rejected. The clear is finished either by the timing driver
//! ([`Tray::advance`]) or synchronously ([`Tray::complete_clear`]), after
//! which the tray is rescanned for a chain clear.

use arrayvec::ArrayVec;

use crate::config::TrayConfig;
use crate::tile::Tile;
use triple_tray_types::{TileId, TileTypeId, MAX_TRAY_SLOTS};

/// Tray phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayPhase {
    Idle,
    /// Tiles marked for clearing, and the time left before they go
    Clearing {
        marked: ArrayVec<TileId, MAX_TRAY_SLOTS>,
        remaining_ms: u32,
    },
}

/// The collection tray
#[derive(Debug, Clone)]
pub struct Tray {
    tiles: ArrayVec<Tile, MAX_TRAY_SLOTS>,
    capacity: usize,
    match_count: usize,
    smart_insert: bool,
    clear_ms: u32,
    phase: TrayPhase,
    cleared_total: u32,
}

impl Tray {
    /// Create a new empty tray
    ///
    /// `clear_ms` is how long a matched group stays visible before it is
    /// consumed. Capacity is clamped to the fixed storage size.
    pub fn new(config: &TrayConfig, clear_ms: u32) -> Self {
        Self {
            tiles: ArrayVec::new(),
            capacity: config.slot_count.clamp(1, MAX_TRAY_SLOTS),
            match_count: config.match_count.max(1),
            smart_insert: config.smart_insert,
            clear_ms,
            phase: TrayPhase::Idle,
            cleared_total: 0,
        }
    }

    /// Rebuild a tray from saved contents, kept in the given order
    ///
    /// A group that already qualifies is marked at once, so clearing it may
    /// chain into the next one. Hands back the first tile that does not fit.
    pub fn with_tiles(
        config: &TrayConfig,
        clear_ms: u32,
        tiles: impl IntoIterator<Item = Tile>,
    ) -> Result<Self, Tile> {
        let mut tray = Self::new(config, clear_ms);
        for tile in tiles {
            if tray.tiles.len() >= tray.capacity {
                return Err(tile);
            }
            tray.tiles.push(tile);
        }
        if let Some(kind) = tray.first_matching_kind() {
            tray.mark(kind);
        }
        Ok(tray)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn match_count(&self) -> usize {
        self.match_count
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn phase(&self) -> &TrayPhase {
        &self.phase
    }

    /// Tiles consumed by matches since the tray was created
    pub fn cleared_total(&self) -> u32 {
        self.cleared_total
    }

    pub fn is_full(&self) -> bool {
        self.tiles.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn free_slots(&self) -> usize {
        self.capacity.saturating_sub(self.tiles.len())
    }

    /// True while a clear or chain clear is in flight
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, TrayPhase::Clearing { .. })
    }

    /// Whether `try_insert` would currently accept a tile
    pub fn can_accept(&self) -> bool {
        !self.is_busy() && !self.is_full()
    }

    /// Number of tray tiles of `kind`
    pub fn count_of(&self, kind: TileTypeId) -> usize {
        self.tiles.iter().filter(|t| t.kind == kind).count()
    }

    /// Some type in the tray has reached the match threshold
    pub fn has_any_match_possible(&self) -> bool {
        self.first_matching_kind().is_some()
    }

    /// First type, in tray order, with at least `match_count` copies
    fn first_matching_kind(&self) -> Option<TileTypeId> {
        self.tiles
            .iter()
            .map(|t| t.kind)
            .find(|&kind| self.count_of(kind) >= self.match_count)
    }

    /// Where a tile of `kind` would be inserted
    pub fn insert_index_for(&self, kind: TileTypeId) -> usize {
        if self.smart_insert {
            if let Some(last) = self.tiles.iter().rposition(|t| t.kind == kind) {
                return last + 1;
            }
        }
        self.tiles.len()
    }

    /// Insert a tile and evaluate matches
    ///
    /// Returns the insert index, or hands the tile back when the tray is full
    /// or busy.
    pub fn try_insert(&mut self, tile: Tile) -> Result<usize, Tile> {
        if !self.can_accept() {
            return Err(tile);
        }
        let kind = tile.kind;
        let index = self.insert_index_for(kind);
        self.tiles.insert(index, tile);

        if self.count_of(kind) >= self.match_count {
            self.mark(kind);
        }
        Ok(index)
    }

    fn mark(&mut self, kind: TileTypeId) {
        let marked: ArrayVec<TileId, MAX_TRAY_SLOTS> = self
            .tiles
            .iter()
            .filter(|t| t.kind == kind)
            .take(self.match_count)
            .map(|t| t.id)
            .collect();
        log::debug!("tray match: {} tiles of type {}", marked.len(), kind.0);
        self.phase = TrayPhase::Clearing {
            marked,
            remaining_ms: self.clear_ms,
        };
    }

    /// Consume the marked tiles, close the gaps and look for a chain clear
    ///
    /// Returns the number of tiles consumed, or `None` when nothing was
    /// being cleared.
    pub fn complete_clear(&mut self) -> Option<u32> {
        let TrayPhase::Clearing { marked, .. } =
            std::mem::replace(&mut self.phase, TrayPhase::Idle)
        else {
            return None;
        };

        let before = self.tiles.len();
        self.tiles.retain(|t| !marked.contains(&t.id));
        let cleared = (before - self.tiles.len()) as u32;
        self.cleared_total += cleared;

        if let Some(kind) = self.first_matching_kind() {
            log::debug!("tray chain clear");
            self.mark(kind);
        }
        Some(cleared)
    }

    /// Advance the clear timer; returns the cleared count when a clear
    /// finished during this step
    pub fn advance(&mut self, elapsed_ms: u32) -> Option<u32> {
        let TrayPhase::Clearing { remaining_ms, .. } = &mut self.phase else {
            return None;
        };
        if *remaining_ms > elapsed_ms {
            *remaining_ms -= elapsed_ms;
            return None;
        }
        self.complete_clear()
    }

    /// Take the last tile in tray order (rejected while busy)
    pub fn pop_last(&mut self) -> Option<Tile> {
        if self.is_busy() {
            return None;
        }
        self.tiles.pop()
    }

    /// Put a tile back at the end without evaluating matches
    ///
    /// Only used to undo a `pop_last` whose follow-up failed.
    pub(crate) fn restore_last(&mut self, tile: Tile) -> Result<(), Tile> {
        self.tiles.try_push(tile).map_err(|e| e.element())
    }

    /// Take up to `count` tiles from the front, preserving order (rejected
    /// while busy)
    pub fn take_front(&mut self, count: usize) -> Vec<Tile> {
        if self.is_busy() {
            return Vec::new();
        }
        let count = count.min(self.tiles.len());
        self.tiles.drain(..count).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rect;

    fn tray(slots: usize) -> Tray {
        Tray::new(
            &TrayConfig {
                slot_count: slots,
                ..TrayConfig::default()
            },
            1000,
        )
    }

    fn tile(id: u32, kind: u16) -> Tile {
        Tile::new(TileId(id), TileTypeId(kind), 0, Rect::default(), 0)
    }

    fn kinds(tray: &Tray) -> Vec<u16> {
        tray.tiles().iter().map(|t| t.kind.0).collect()
    }

    #[test]
    fn test_smart_insert_after_last_same_type() {
        let mut t = tray(7);
        t.try_insert(tile(0, 0)).unwrap();
        t.try_insert(tile(1, 1)).unwrap();
        assert_eq!(t.try_insert(tile(2, 0)), Ok(1));
        assert_eq!(kinds(&t), vec![0, 0, 1]);
    }

    #[test]
    fn test_plain_insert_appends() {
        let mut t = Tray::new(
            &TrayConfig {
                smart_insert: false,
                ..TrayConfig::default()
            },
            0,
        );
        t.try_insert(tile(0, 0)).unwrap();
        t.try_insert(tile(1, 1)).unwrap();
        assert_eq!(t.try_insert(tile(2, 0)), Ok(2));
        assert_eq!(kinds(&t), vec![0, 1, 0]);
    }

    #[test]
    fn test_match_marks_and_blocks() {
        let mut t = tray(7);
        for id in 0..3 {
            t.try_insert(tile(id, 4)).unwrap();
        }
        assert!(t.is_busy());
        let rejected = t.try_insert(tile(9, 1)).unwrap_err();
        assert_eq!(rejected.id, TileId(9));
        assert!(t.pop_last().is_none());
        assert!(t.take_front(2).is_empty());

        assert_eq!(t.complete_clear(), Some(3));
        assert!(t.is_empty());
        assert!(!t.is_busy());
        assert_eq!(t.cleared_total(), 3);
    }

    #[test]
    fn test_advance_counts_down() {
        let mut t = tray(7);
        for id in 0..3 {
            t.try_insert(tile(id, 2)).unwrap();
        }
        assert_eq!(t.advance(999), None);
        assert!(t.is_busy());
        assert_eq!(t.advance(1), Some(3));
        assert!(!t.is_busy());
    }

    #[test]
    fn test_full_without_match() {
        let mut t = tray(3);
        for (id, kind) in [(0, 0), (1, 1), (2, 0)] {
            t.try_insert(tile(id, kind)).unwrap();
        }
        assert!(t.is_full());
        assert!(!t.has_any_match_possible());
        assert!(t.try_insert(tile(3, 0)).is_err());
    }

    #[test]
    fn test_chain_clear_rescans_after_clear() {
        // Match count 2 with a pre-existing pair of 7s: clearing the 5s
        // leaves the 7s qualifying for a chain clear.
        let mut t = Tray::new(
            &TrayConfig {
                slot_count: 7,
                match_count: 2,
                smart_insert: false,
                holding_slots: 0,
            },
            0,
        );
        t.tiles.push(tile(0, 7));
        t.tiles.push(tile(1, 7));
        t.tiles.push(tile(2, 5));
        t.try_insert(tile(3, 5)).unwrap();
        assert!(t.is_busy());
        assert!(t.try_insert(tile(4, 1)).is_err());

        assert_eq!(t.complete_clear(), Some(2));
        assert_eq!(kinds(&t), vec![7, 7]);
        assert!(t.is_busy());
        assert_eq!(t.complete_clear(), Some(2));
        assert!(t.is_empty());
        assert!(!t.is_busy());
        assert_eq!(t.complete_clear(), None);
    }

    #[test]
    fn test_first_occurrences_are_marked() {
        let mut t = Tray::new(
            &TrayConfig {
                smart_insert: false,
                ..TrayConfig::default()
            },
            0,
        );
        t.tiles.push(tile(0, 1));
        t.tiles.push(tile(1, 1));
        t.tiles.push(tile(2, 1));
        t.tiles.push(tile(3, 2));
        t.try_insert(tile(4, 1)).unwrap();

        let TrayPhase::Clearing { marked, .. } = t.phase() else {
            panic!("expected clearing");
        };
        assert_eq!(marked.as_slice(), &[TileId(0), TileId(1), TileId(2)]);
        assert_eq!(t.complete_clear(), Some(3));
        assert_eq!(kinds(&t), vec![2, 1]);
    }

    #[test]
    fn test_take_front_preserves_order() {
        let mut t = tray(7);
        for (id, kind) in [(0, 0), (1, 1), (2, 2), (3, 3)] {
            t.try_insert(tile(id, kind)).unwrap();
        }
        let front: Vec<u16> = t.take_front(3).iter().map(|t| t.kind.0).collect();
        assert_eq!(front, vec![0, 1, 2]);
        assert_eq!(kinds(&t), vec![3]);
        assert_eq!(t.take_front(5).len(), 1);
    }
}
