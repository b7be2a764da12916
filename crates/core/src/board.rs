//! Board module - layered piles of tiles with occlusion
//!
//! Tiles are dealt layer by layer through a shuffled set of pile positions, so
//! two tiles on the same layer never share a pile and overlap only happens
//! between layers. A tile is blocked while any tile on a strictly higher layer
//! overlaps its footprint. The blocked flags are a cache rebuilt by
//! [`Board::recompute_blocking`] after every structural change.

use crate::config::BoardConfig;
use crate::error::ConfigError;
use crate::geometry::{Point, Rect};
use crate::layout::{layer_jitter, pile_count, pile_positions};
use crate::rng::{SimpleRng, TileBag};
use crate::tile::Tile;
use triple_tray_types::TileId;

/// The tiles still in play
#[derive(Debug, Clone)]
pub struct Board {
    tiles: Vec<Tile>,
    blocked: Vec<bool>,
    /// Pile position cache shared by the initial deal and reshuffles
    piles: Vec<Point>,
    layer_count: u8,
    tile_size: f32,
    max_jitter: f32,
    shuffle_remaining_ms: Option<u32>,
}

impl Board {
    /// Create an empty board over the given pile positions
    pub fn new(piles: Vec<Point>, layer_count: u8, tile_size: f32, max_jitter: f32) -> Self {
        Self {
            tiles: Vec::new(),
            blocked: Vec::new(),
            piles,
            layer_count,
            tile_size,
            max_jitter,
            shuffle_remaining_ms: None,
        }
    }

    /// Deal every tile of `bag` onto a fresh board
    ///
    /// Layer 0 is filled first; within a layer each pile receives at most one
    /// tile. Tile ids are assigned in deal order.
    pub fn build(
        bag: &mut TileBag,
        layer_count: u8,
        config: &BoardConfig,
        rng: &mut SimpleRng,
    ) -> Result<Self, ConfigError> {
        if layer_count == 0 {
            return Err(ConfigError::ZeroLayers);
        }
        if bag.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        let count = pile_count(bag.len(), layer_count);
        let center = Point::new(config.center_x, config.center_y);
        let piles = pile_positions(
            count,
            config.preferred_cols,
            center,
            config.pile_spacing,
            rng,
        );
        let mut board = Self::new(piles, layer_count, config.tile_size, config.layer_jitter);

        let mut tiles = Vec::with_capacity(bag.len());
        let mut next_id = 0u32;
        'deal: for layer in 0..layer_count {
            for pile in 0..count {
                let Some(kind) = bag.pop() else {
                    break 'deal;
                };
                let footprint = board.footprint_for(pile, layer, rng);
                tiles.push(Tile::new(TileId(next_id), kind, layer, footprint, pile));
                next_id += 1;
            }
        }

        board.place(tiles);
        log::debug!(
            "board dealt: {} tiles, {} piles, {} layers",
            board.len(),
            count,
            layer_count
        );
        Ok(board)
    }

    /// Replace the board contents with `tiles` as placed
    pub fn place(&mut self, tiles: Vec<Tile>) {
        self.tiles = tiles;
        self.recompute_blocking();
    }

    fn footprint_for(&self, pile: usize, layer: u8, rng: &mut SimpleRng) -> Rect {
        let base = self.piles.get(pile).copied().unwrap_or_default();
        let jitter = layer_jitter(layer, self.layer_count, self.max_jitter, rng);
        Rect::square(base.offset(jitter.x, jitter.y), self.tile_size)
    }

    /// Number of tiles on the board
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn piles(&self) -> &[Point] {
        &self.piles
    }

    pub fn layer_count(&self) -> u8 {
        self.layer_count
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: TileId) -> bool {
        self.index_of(id).is_some()
    }

    fn index_of(&self, id: TileId) -> Option<usize> {
        self.tiles.iter().position(|t| t.id == id)
    }

    /// Whether any board tile on a strictly higher layer overlaps `tile`
    pub fn covered_from_above(&self, tile: &Tile) -> bool {
        self.tiles
            .iter()
            .any(|other| other.layer > tile.layer && other.footprint.overlaps(&tile.footprint))
    }

    /// Rebuild the blocked cache from geometry
    pub fn recompute_blocking(&mut self) {
        let blocked: Vec<bool> = self
            .tiles
            .iter()
            .map(|tile| self.covered_from_above(tile))
            .collect();
        self.blocked = blocked;
    }

    /// Blocked state of a board tile (tiles not on the board count as blocked)
    pub fn is_blocked(&self, id: TileId) -> bool {
        match self.index_of(id) {
            Some(i) => self.blocked.get(i).copied().unwrap_or(true),
            None => true,
        }
    }

    /// A tile accepts clicks when it is on the board, unblocked, and no
    /// reshuffle is in flight
    pub fn is_clickable(&self, id: TileId) -> bool {
        !self.is_shuffling() && !self.is_blocked(id)
    }

    /// Unblocked tiles in board order
    pub fn clickable(&self) -> impl Iterator<Item = &Tile> + '_ {
        self.tiles
            .iter()
            .zip(self.blocked.iter())
            .filter(|(_, blocked)| !**blocked)
            .map(|(tile, _)| tile)
    }

    /// Take a tile off the board, saving its origin on first departure
    pub fn remove(&mut self, id: TileId) -> Option<Tile> {
        let index = self.index_of(id)?;
        let mut tile = self.tiles.remove(index);
        tile.save_origin(index);
        self.recompute_blocking();
        Some(tile)
    }

    /// Put a previously removed tile back exactly where it came from
    ///
    /// A tile without an origin record is handed back untouched.
    pub fn add(&mut self, mut tile: Tile) -> Result<(), Tile> {
        let Some(order) = tile.restore_origin() else {
            return Err(tile);
        };
        let index = order.min(self.tiles.len());
        self.tiles.insert(index, tile);
        self.recompute_blocking();
        Ok(())
    }

    pub fn is_shuffling(&self) -> bool {
        self.shuffle_remaining_ms.is_some()
    }

    /// Redistribute every tile over freshly shuffled (layer, pile) slots
    ///
    /// The new placement is committed immediately; the board then stays in
    /// the shuffling phase for `duration_ms` (or until
    /// [`Board::complete_reshuffle`]). No-op with fewer than two tiles or
    /// while another reshuffle is in flight.
    pub fn begin_reshuffle(&mut self, rng: &mut SimpleRng, duration_ms: u32) -> bool {
        if self.tiles.len() < 2 || self.is_shuffling() || self.piles.is_empty() {
            return false;
        }

        let pile_total = self.piles.len();
        let mut pile_order: Vec<usize> = (0..pile_total).collect();
        rng.shuffle(&mut pile_order);
        rng.shuffle(&mut self.tiles);

        for k in 0..self.tiles.len() {
            let layer = u8::try_from(k / pile_total).unwrap_or(u8::MAX);
            let pile = pile_order[k % pile_total];
            let footprint = self.footprint_for(pile, layer, rng);
            let tile = &mut self.tiles[k];
            tile.layer = layer;
            tile.pile = pile;
            tile.footprint = footprint;
        }

        self.recompute_blocking();
        self.shuffle_remaining_ms = Some(duration_ms);
        log::debug!("board reshuffle started: {} tiles", self.tiles.len());
        true
    }

    /// End the shuffling phase
    pub fn complete_reshuffle(&mut self) -> bool {
        self.shuffle_remaining_ms.take().is_some()
    }

    /// Reshuffle and complete in one step
    pub fn reshuffle(&mut self, rng: &mut SimpleRng) -> bool {
        let started = self.begin_reshuffle(rng, 0);
        self.complete_reshuffle();
        started
    }

    /// Advance the shuffle timer; returns true when the phase completed
    pub fn advance(&mut self, elapsed_ms: u32) -> bool {
        match self.shuffle_remaining_ms {
            Some(remaining) if remaining <= elapsed_ms => self.complete_reshuffle(),
            Some(remaining) => {
                self.shuffle_remaining_ms = Some(remaining - elapsed_ms);
                false
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use triple_tray_types::TileTypeId;

    fn tile(id: u32, layer: u8, x: f32, y: f32) -> Tile {
        Tile::new(
            TileId(id),
            TileTypeId(0),
            layer,
            Rect::square(Point::new(x, y), 10.0),
            id as usize,
        )
    }

    fn manual_board(tiles: Vec<Tile>) -> Board {
        let mut board = Board::new(vec![Point::default(); 4], 3, 10.0, 0.0);
        board.place(tiles);
        board
    }

    fn dealt_board(seed: u32) -> Board {
        let mut rng = SimpleRng::new(seed);
        let kinds: Vec<TileTypeId> = (0..14).map(TileTypeId).collect();
        let mut bag = TileBag::build(&kinds, 3, 3, &mut rng).unwrap();
        Board::build(&mut bag, 6, &BoardConfig::default(), &mut rng).unwrap()
    }

    #[test]
    fn test_higher_layer_blocks_lower() {
        let board = manual_board(vec![tile(0, 0, 0.0, 0.0), tile(1, 1, 5.0, 5.0)]);
        assert!(board.is_blocked(TileId(0)));
        assert!(!board.is_blocked(TileId(1)));
    }

    #[test]
    fn test_same_layer_never_blocks() {
        let board = manual_board(vec![tile(0, 1, 0.0, 0.0), tile(1, 1, 5.0, 5.0)]);
        assert!(!board.is_blocked(TileId(0)));
        assert!(!board.is_blocked(TileId(1)));
    }

    #[test]
    fn test_remove_unblocks_and_saves_origin() {
        let mut board = manual_board(vec![tile(0, 0, 0.0, 0.0), tile(1, 2, 3.0, 0.0)]);
        assert!(board.is_blocked(TileId(0)));

        let top = board.remove(TileId(1)).unwrap();
        assert!(!board.is_blocked(TileId(0)));
        let origin = top.origin().copied().unwrap();
        assert_eq!(origin.layer, 2);
        assert_eq!(origin.order, 1);

        board.add(top).unwrap();
        assert!(board.is_blocked(TileId(0)));
        assert_eq!(board.tiles()[1].id, TileId(1));
    }

    #[test]
    fn test_add_without_origin_is_rejected() {
        let mut board = manual_board(vec![tile(0, 0, 0.0, 0.0)]);
        let loose = tile(9, 0, 50.0, 50.0);
        let back = board.add(loose).unwrap_err();
        assert_eq!(back.id, TileId(9));
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn test_build_deals_everything_without_same_layer_overlap() {
        let board = dealt_board(5);
        assert_eq!(board.len(), 126);
        assert_eq!(board.piles().len(), 21);

        for (i, a) in board.tiles().iter().enumerate() {
            for b in &board.tiles()[i + 1..] {
                if a.layer == b.layer {
                    assert_ne!(a.pile, b.pile);
                    assert!(!a.footprint.overlaps(&b.footprint));
                }
            }
        }
    }

    #[test]
    fn test_blocked_cache_matches_geometry() {
        let board = dealt_board(8);
        for t in board.tiles() {
            assert_eq!(board.is_blocked(t.id), board.covered_from_above(t));
        }
        // Only the top layer is clickable on a full deal.
        assert!(board.clickable().all(|t| t.layer == 5));
        assert_eq!(board.clickable().count(), 21);
    }

    #[test]
    fn test_reshuffle_is_exclusive_and_timed() {
        let mut board = dealt_board(2);
        let mut rng = SimpleRng::new(4);
        assert!(board.begin_reshuffle(&mut rng, 400));
        assert!(board.is_shuffling());
        assert!(!board.begin_reshuffle(&mut rng, 400));
        let top = board.clickable().next().map(|t| t.id).unwrap();
        assert!(!board.is_clickable(top));

        assert!(!board.advance(399));
        assert!(board.advance(1));
        assert!(!board.is_shuffling());
        assert!(board.is_clickable(top));
    }

    #[test]
    fn test_reshuffle_needs_two_tiles() {
        let mut board = manual_board(vec![tile(0, 0, 0.0, 0.0)]);
        assert!(!board.reshuffle(&mut SimpleRng::new(1)));
    }
}
