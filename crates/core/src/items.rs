//! Item rules - Remove, Undo and Shuffle
//!
//! Each item is gated twice: the inventory must hold a claimed use, and the
//! board/tray/holding must be in a state where the item does something.
//! [`ItemRules::can_use`] is a pure check; [`ItemRules::use_item`] re-checks
//! before mutating and only spends a use when the item actually executed.
//! Items never bypass the tray busy state or board occlusion.

use crate::board::Board;
use crate::config::ItemConfig;
use crate::holding::Holding;
use crate::inventory::Inventory;
use crate::rng::SimpleRng;
use crate::tray::Tray;
use triple_tray_types::ItemKind;

/// Mutable view of the pieces of a round an item may touch
pub struct ItemTargets<'a> {
    pub board: &'a mut Board,
    pub tray: &'a mut Tray,
    pub holding: &'a mut Holding,
    pub rng: &'a mut SimpleRng,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemRules {
    remove_move_count: usize,
    undo_count: usize,
    shuffle_ms: u32,
}

impl ItemRules {
    pub fn new(config: &ItemConfig, shuffle_ms: u32) -> Self {
        Self {
            remove_move_count: config.remove_move_count.max(1),
            undo_count: config.undo_count.max(1),
            shuffle_ms,
        }
    }

    /// Structural precondition for `kind`, ignoring the inventory
    pub fn precondition(kind: ItemKind, board: &Board, tray: &Tray, holding: &Holding) -> bool {
        match kind {
            ItemKind::Remove => !tray.is_empty() && holding.free_slots() > 0 && !tray.is_busy(),
            ItemKind::Undo => !tray.is_empty() && !tray.is_busy() && !board.is_shuffling(),
            ItemKind::Shuffle => board.len() >= 2 && !board.is_shuffling(),
        }
    }

    /// Whether `kind` could be used right now
    pub fn can_use(
        &self,
        kind: ItemKind,
        inventory: &Inventory,
        board: &Board,
        tray: &Tray,
        holding: &Holding,
    ) -> bool {
        inventory.can_spend(kind) && Self::precondition(kind, board, tray, holding)
    }

    /// Execute `kind` and spend a use; false when nothing happened
    pub fn use_item(
        &self,
        kind: ItemKind,
        inventory: &mut Inventory,
        targets: ItemTargets<'_>,
    ) -> bool {
        if !self.can_use(kind, inventory, targets.board, targets.tray, targets.holding) {
            return false;
        }

        let executed = match kind {
            ItemKind::Remove => self.remove(targets.tray, targets.holding),
            ItemKind::Undo => self.undo(targets.board, targets.tray),
            ItemKind::Shuffle => targets.board.begin_reshuffle(targets.rng, self.shuffle_ms),
        };
        if executed {
            inventory.consume(kind);
            log::debug!("item used: {}", kind.as_str());
        }
        executed
    }

    /// Move the first tiles of the tray into holding
    fn remove(&self, tray: &mut Tray, holding: &mut Holding) -> bool {
        let count = self
            .remove_move_count
            .min(tray.len())
            .min(holding.free_slots());
        let moved = tray.take_front(count);
        if moved.is_empty() {
            return false;
        }
        for tile in moved {
            if let Err(tile) = holding.push(tile) {
                log::error!("holding refused tile {} after capacity check", tile.id);
            }
        }
        true
    }

    /// Return the last tray tiles to their board origins
    fn undo(&self, board: &mut Board, tray: &mut Tray) -> bool {
        let mut returned = 0;
        for _ in 0..self.undo_count {
            let Some(tile) = tray.pop_last() else {
                break;
            };
            if let Err(tile) = board.add(tile) {
                log::error!("undo aborted: tile {} has no origin record", tile.id);
                if let Err(tile) = tray.restore_last(tile) {
                    log::error!("tile {} lost while aborting undo", tile.id);
                }
                break;
            }
            returned += 1;
        }
        returned > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BoardConfig, TrayConfig};
    use crate::geometry::{Point, Rect};
    use crate::rng::TileBag;
    use crate::tile::Tile;
    use triple_tray_types::{TileId, TileTypeId};

    struct Fixture {
        board: Board,
        tray: Tray,
        holding: Holding,
        rng: SimpleRng,
        inventory: Inventory,
    }

    impl Fixture {
        fn new() -> Self {
            let mut rng = SimpleRng::new(21);
            let kinds: Vec<TileTypeId> = (0..6).map(TileTypeId).collect();
            let mut bag = TileBag::build(&kinds, 1, 3, &mut rng).unwrap();
            let board = Board::build(&mut bag, 3, &BoardConfig::default(), &mut rng).unwrap();
            let inventory = Inventory::new(&ItemConfig {
                start_claimed: true,
                default_uses: 1,
                ..ItemConfig::default()
            });
            Self {
                board,
                tray: Tray::new(&TrayConfig::default(), 0),
                holding: Holding::new(3),
                rng,
                inventory,
            }
        }

        fn use_item(&mut self, rules: &ItemRules, kind: ItemKind) -> bool {
            rules.use_item(
                kind,
                &mut self.inventory,
                ItemTargets {
                    board: &mut self.board,
                    tray: &mut self.tray,
                    holding: &mut self.holding,
                    rng: &mut self.rng,
                },
            )
        }

        fn pick_any(&mut self) -> TileId {
            let id = self.board.clickable().next().map(|t| t.id).unwrap();
            let tile = self.board.remove(id).unwrap();
            self.tray.try_insert(tile).unwrap();
            id
        }
    }

    fn rules() -> ItemRules {
        ItemRules::new(&ItemConfig::default(), 0)
    }

    #[test]
    fn test_nothing_to_remove_or_undo_on_empty_tray() {
        let mut fx = Fixture::new();
        let rules = rules();
        assert!(!fx.use_item(&rules, ItemKind::Remove));
        assert!(!fx.use_item(&rules, ItemKind::Undo));
        assert_eq!(fx.inventory.uses(ItemKind::Remove), 1);
    }

    #[test]
    fn test_undo_restores_origin() {
        let mut fx = Fixture::new();
        let before = fx.board.tiles().to_vec();
        let id = fx.pick_any();
        let original = before.iter().find(|t| t.id == id).unwrap();

        assert!(fx.use_item(&rules(), ItemKind::Undo));
        assert!(fx.tray.is_empty());
        let restored = fx.board.get(id).unwrap();
        assert_eq!(restored.layer, original.layer);
        assert_eq!(restored.footprint, original.footprint);
        let ids = |tiles: &[Tile]| tiles.iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(fx.board.tiles()), ids(&before));
        assert_eq!(fx.inventory.uses(ItemKind::Undo), 0);
        assert!(!fx.use_item(&rules(), ItemKind::Undo));
    }

    #[test]
    fn test_undo_without_origin_aborts() {
        let mut fx = Fixture::new();
        let loose = Tile::new(
            TileId(500),
            TileTypeId(0),
            0,
            Rect::square(Point::default(), 1.0),
            0,
        );
        fx.tray.try_insert(loose).unwrap();
        assert!(!fx.use_item(&rules(), ItemKind::Undo));
        assert_eq!(fx.tray.len(), 1);
        assert_eq!(fx.inventory.uses(ItemKind::Undo), 1);
    }

    #[test]
    fn test_remove_respects_holding_space() {
        let mut fx = Fixture::new();
        fx.holding = Holding::new(2);
        let mut picked = Vec::new();
        while picked.len() < 4 {
            let match_count = fx.tray.match_count();
            let next = fx
                .board
                .clickable()
                .find(|t| fx.tray.count_of(t.kind) + 1 < match_count)
                .map(|t| t.id);
            let Some(id) = next else {
                fx.board.reshuffle(&mut fx.rng);
                continue;
            };
            let tile = fx.board.remove(id).unwrap();
            fx.tray.try_insert(tile).unwrap();
            picked.push(id);
        }
        let front: Vec<TileId> = fx.tray.tiles()[..2].iter().map(|t| t.id).collect();

        assert!(fx.use_item(&rules(), ItemKind::Remove));
        let held: Vec<TileId> = fx.holding.tiles().iter().map(|t| t.id).collect();
        assert_eq!(held, front);
        assert_eq!(fx.tray.len(), 2);
    }

    #[test]
    fn test_shuffle_preserves_multiset() {
        let mut fx = Fixture::new();
        let mut before: Vec<u16> = fx.board.tiles().iter().map(|t| t.kind.0).collect();
        let shuffle_rules = ItemRules::new(&ItemConfig::default(), 400);
        assert!(fx.use_item(&shuffle_rules, ItemKind::Shuffle));
        assert!(fx.board.is_shuffling());

        let mut after: Vec<u16> = fx.board.tiles().iter().map(|t| t.kind.0).collect();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);

        fx.inventory.claim(ItemKind::Shuffle, 1);
        assert!(!fx.use_item(&shuffle_rules, ItemKind::Shuffle));
    }

    #[test]
    fn test_unclaimed_item_is_unusable() {
        let mut fx = Fixture::new();
        fx.inventory = Inventory::new(&ItemConfig::default());
        assert!(!rules().can_use(
            ItemKind::Shuffle,
            &fx.inventory,
            &fx.board,
            &fx.tray,
            &fx.holding
        ));
        assert!(!fx.use_item(&rules(), ItemKind::Shuffle));
    }
}
