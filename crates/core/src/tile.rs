//! Tile instances and the origin record used by Undo

use crate::geometry::Rect;
use triple_tray_types::{TileId, TileTypeId};

/// Where a tile sat on the board before it first left
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OriginRecord {
    pub layer: u8,
    pub footprint: Rect,
    pub pile: usize,
    /// Index in the board list at departure
    pub order: usize,
}

/// One tile instance
///
/// Tiles are owned values: a tile lives in exactly one of board, tray or
/// holding, and moves between them by value.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub id: TileId,
    pub kind: TileTypeId,
    pub layer: u8,
    pub footprint: Rect,
    pub pile: usize,
    origin: Option<OriginRecord>,
}

impl Tile {
    /// Create a new tile with no origin record
    pub fn new(id: TileId, kind: TileTypeId, layer: u8, footprint: Rect, pile: usize) -> Self {
        Self {
            id,
            kind,
            layer,
            footprint,
            pile,
            origin: None,
        }
    }

    pub fn origin(&self) -> Option<&OriginRecord> {
        self.origin.as_ref()
    }

    /// Record the current placement; only the first call has any effect
    pub(crate) fn save_origin(&mut self, order: usize) {
        if self.origin.is_none() {
            self.origin = Some(OriginRecord {
                layer: self.layer,
                footprint: self.footprint,
                pile: self.pile,
                order,
            });
        }
    }

    /// Move the tile back to its recorded placement, returning the saved order
    pub(crate) fn restore_origin(&mut self) -> Option<usize> {
        let origin = self.origin?;
        self.layer = origin.layer;
        self.footprint = origin.footprint;
        self.pile = origin.pile;
        Some(origin.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_origin_is_captured_once() {
        let mut tile = Tile::new(
            TileId(1),
            TileTypeId(0),
            2,
            Rect::square(Point::new(0.0, 0.0), 10.0),
            4,
        );
        tile.save_origin(7);
        tile.layer = 5;
        tile.save_origin(1);

        let origin = tile.origin().copied().unwrap();
        assert_eq!(origin.layer, 2);
        assert_eq!(origin.order, 7);

        assert_eq!(tile.restore_origin(), Some(7));
        assert_eq!(tile.layer, 2);
    }
}
