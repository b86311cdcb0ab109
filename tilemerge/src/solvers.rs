use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Advisor, GameState, Spawner, TerminalState};

/// Outcome of one game played to the end (or to the move cap).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub score: u32,
    pub max_tile: u32,
    pub moves: u32,
    pub terminal: TerminalState,
    /// Search nodes summed over every recommendation.
    pub nodes: u64,
}

/// Follows the advisor's recommendation until the game is over, no move is
/// left, or `max_moves` moves have been played.
pub fn solver_expectimax<S: Spawner + Clone>(
    gs: &mut GameState<S>,
    advisor: &mut Advisor,
    depth: u32,
    max_moves: Option<u32>,
) -> GameSummary {
    let mut moves = 0;
    let mut nodes = 0;
    while !gs.terminal().is_over() && max_moves.map_or(true, |cap| moves < cap) {
        let Some(dir) = advisor.recommend(gs, depth) else {
            break;
        };
        nodes += advisor.last_stats().nodes;
        if !gs.apply_move(dir) {
            debug!("recommended {dir:?} was rejected");
            break;
        }
        moves += 1;
    }

    GameSummary {
        score: gs.score(),
        max_tile: gs.max_tile(),
        moves,
        terminal: gs.terminal(),
        nodes,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{FixedSpawner, Tile};

    #[test]
    fn stops_at_move_cap() {
        let mut gs = GameState::new_from_seed(5);
        let summary = solver_expectimax(&mut gs, &mut Advisor::new(), 2, Some(10));
        assert_eq!(summary.moves, 10);
        assert_eq!(summary.terminal, TerminalState::InProgress);
        assert_eq!(summary.score, gs.score());
        assert!(summary.nodes > 0);
    }

    #[test]
    fn frozen_board_plays_nothing() {
        let mut gs = GameState::from_rows(
            [[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]],
            0,
            FixedSpawner::new(0, Tile::TWO),
        )
        .unwrap();
        let summary = solver_expectimax(&mut gs, &mut Advisor::new(), 2, None);
        assert_eq!(summary.moves, 0);
        assert_eq!(summary.terminal, TerminalState::Stalemated);
    }

    #[test]
    fn finishes_a_game() {
        let mut gs = GameState::new_from_seed(1234);
        let summary = solver_expectimax(&mut gs, &mut Advisor::new(), 1, None);
        assert!(summary.terminal.is_over());
        assert!(summary.max_tile >= 64);
        assert!(summary.moves > 20);
    }
}
