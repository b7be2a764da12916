//! Move hints
//!
//! Every tile the player could send to the tray right now is a candidate:
//! clickable board tiles and everything in the holding area. Candidates are
//! scored and the best one is suggested. Blocked tiles are never suggested.

use triple_tray_core::Round;
use triple_tray_types::{PlayerAction, TileId, TileTypeId};

/// Where a suggested tile currently sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HintSource {
    Board,
    Holding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub id: TileId,
    pub kind: TileTypeId,
    pub source: HintSource,
    /// Inserting this tile reaches the match threshold
    pub completes_match: bool,
    /// Inserting this tile fills the tray without a match
    pub fills_tray: bool,
    pub score: i64,
}

impl Hint {
    /// The action that carries out this hint
    pub fn action(&self) -> PlayerAction {
        match self.source {
            HintSource::Board => PlayerAction::Pick(self.id),
            HintSource::Holding => PlayerAction::Release(self.id),
        }
    }
}

/// All tiles that could be moved into the tray, scored
///
/// Empty while the tray cannot accept a tile or the board is reshuffling.
pub fn enumerate_candidates(round: &Round) -> Vec<Hint> {
    let tray = round.tray();
    if !tray.can_accept() || round.board().is_shuffling() {
        return Vec::new();
    }
    let board = round.board();
    let holding = round.holding();

    let reachable = |kind: TileTypeId| {
        board.clickable().filter(|t| t.kind == kind).count()
            + holding.tiles().iter().filter(|t| t.kind == kind).count()
    };

    let board_tiles = board
        .clickable()
        .map(|t| (t.id, t.kind, t.layer, HintSource::Board));
    let held_tiles = holding
        .tiles()
        .iter()
        .map(|t| (t.id, t.kind, 0, HintSource::Holding));

    board_tiles
        .chain(held_tiles)
        .map(|(id, kind, layer, source)| {
            let in_tray = tray.count_of(kind);
            let completes_match = in_tray + 1 >= tray.match_count();
            let fills_tray = !completes_match && tray.free_slots() <= 1;
            let score = score_candidate(
                in_tray,
                reachable(kind).saturating_sub(1),
                layer,
                completes_match,
                fills_tray,
            );
            Hint {
                id,
                kind,
                source,
                completes_match,
                fills_tray,
                score,
            }
        })
        .collect()
}

fn score_candidate(
    in_tray: usize,
    reachable_copies: usize,
    layer: u8,
    completes_match: bool,
    fills_tray: bool,
) -> i64 {
    let mut score = in_tray as i64 * 120 + reachable_copies as i64 * 40 + layer as i64 * 5;
    if completes_match {
        score += 1000;
    }
    if fills_tray {
        score -= 2000;
    }
    score
}

/// Best candidate; earlier candidates win ties
pub fn suggest(round: &Round) -> Option<Hint> {
    enumerate_candidates(round)
        .into_iter()
        .fold(None, |best: Option<Hint>, hint| match best {
            Some(b) if b.score >= hint.score => Some(b),
            _ => Some(hint),
        })
}
