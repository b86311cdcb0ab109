//! Expectimax move advisor.
//!
//! The search plays hypothetical moves directly on the caller's
//! [`GameState`] and puts it back with [`GameState::restore`] after every
//! branch. The checkpoint carries the spawner too, so asking for advice
//! does not change the tiles a seeded game spawns afterwards.
//!
//! Two behaviours are configurable through [`AdvisorConfig`]:
//! - `spawn_at_max_nodes`: when set (the default) a max node plays each
//!   direction as a full move, random spawn included, and recurses even
//!   when the move was rejected. When unset a max node only slides and
//!   merges and ignores rejected directions.
//! - `chance_weighting`: how the 2 and 4 branches of a chance node combine.
//!
//! ```
//! use tilemerge::{Advisor, GameState};
//!
//! let mut gs = GameState::new_from_seed(42);
//! let before = gs.snapshot();
//! let mut advisor = Advisor::new();
//! let hint = advisor.recommend(&mut gs, 2);
//! assert!(hint.is_some());
//! assert_eq!(gs.snapshot(), before);
//! ```

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::{heuristic, spawn::SPAWN_ODDS, terminal, Direction, GameState, Spawner, TerminalState};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ChanceWeighting {
    /// Both tile values count fully; the sum is divided by the number of
    /// empty cells.
    #[default]
    PerCell,
    /// Each tile value weighted by its spawn odds, averaged over cells.
    SpawnOdds,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdvisorConfig {
    pub spawn_at_max_nodes: bool,
    pub chance_weighting: ChanceWeighting,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            spawn_at_max_nodes: true,
            chance_weighting: ChanceWeighting::PerCell,
        }
    }
}

impl AdvisorConfig {
    /// Randomness only at chance nodes, weighted by the real spawn odds.
    pub fn canonical() -> Self {
        Self {
            spawn_at_max_nodes: false,
            chance_weighting: ChanceWeighting::SpawnOdds,
        }
    }
}

/// Root value of one direction. `ev` is 0 when the move is not `legal`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BranchEval {
    pub dir: Direction,
    pub ev: f64,
    pub legal: bool,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct Advisor {
    config: AdvisorConfig,
    stats: SearchStats,
}

impl Advisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AdvisorConfig) -> Self {
        Self {
            config,
            stats: SearchStats::default(),
        }
    }

    pub fn config(&self) -> AdvisorConfig {
        self.config
    }

    /// Stats of the most recent [`Advisor::evaluate_moves`] or
    /// [`Advisor::recommend`] call.
    pub fn last_stats(&self) -> SearchStats {
        self.stats
    }

    /// Best direction by root value, the first in [`Direction::ALL`] order
    /// on ties. `None` when no direction changes the board.
    pub fn recommend<S: Spawner + Clone>(&mut self, state: &mut GameState<S>, max_depth: u32) -> Option<Direction> {
        let evals = self.evaluate_moves(state, max_depth);
        let mut best: Option<BranchEval> = None;
        for eval in evals.into_iter().filter(|e| e.legal) {
            if best.map_or(true, |b| eval.ev > b.ev) {
                best = Some(eval);
            }
        }

        let dir = best.map(|b| b.dir);
        debug!("recommend depth={max_depth} -> {dir:?} ({} nodes)", self.stats.nodes);
        dir
    }

    /// Plays each direction once and scores the result with a search of
    /// `max_depth - 1` further layers (depth 0 and 1 both score the
    /// position right after the move).
    pub fn evaluate_moves<S: Spawner + Clone>(&mut self, state: &mut GameState<S>, max_depth: u32) -> [BranchEval; 4] {
        self.stats = SearchStats::default();
        let depth = max_depth.saturating_sub(1);
        // with spawns at max nodes the root move already placed a tile
        let next_is_max = self.config.spawn_at_max_nodes;

        Direction::ALL.map(|dir| {
            let checkpoint = state.checkpoint();
            let legal = self.step(state, dir);
            let ev = if legal {
                self.expectimax(state, depth, next_is_max)
            } else {
                0.0
            };
            state.restore(checkpoint);
            trace!("{dir:?}: legal={legal} ev={ev}");
            BranchEval { dir, ev, legal }
        })
    }

    fn step<S: Spawner + Clone>(&self, state: &mut GameState<S>, dir: Direction) -> bool {
        if self.config.spawn_at_max_nodes {
            state.apply_move(dir)
        } else {
            state.shift(dir)
        }
    }

    fn expectimax<S: Spawner + Clone>(&mut self, state: &mut GameState<S>, depth: u32, maximizing: bool) -> f64 {
        self.stats.nodes += 1;
        if depth == 0
            || state.terminal() == TerminalState::Won
            || terminal::evaluate(&state.rows()).is_over()
        {
            return heuristic::evaluate(state);
        }
        if maximizing {
            self.max_node(state, depth)
        } else {
            self.chance_node(state, depth)
        }
    }

    fn max_node<S: Spawner + Clone>(&mut self, state: &mut GameState<S>, depth: u32) -> f64 {
        let mut best: Option<f64> = None;
        for dir in Direction::ALL {
            let checkpoint = state.checkpoint();
            let moved = self.step(state, dir);
            if moved || self.config.spawn_at_max_nodes {
                let value = self.expectimax(state, depth - 1, false);
                best = Some(best.map_or(value, |b| b.max(value)));
            }
            state.restore(checkpoint);
        }
        match best {
            Some(value) => value,
            None => heuristic::evaluate(state),
        }
    }

    fn chance_node<S: Spawner + Clone>(&mut self, state: &mut GameState<S>, depth: u32) -> f64 {
        let open = state.empty_cells();
        if open.is_empty() {
            return 0.0;
        }

        let mut total = 0.0;
        for &(r, c) in &open {
            for (tile, odds) in SPAWN_ODDS {
                state.set_cell(r, c, Some(tile));
                let value = self.expectimax(state, depth - 1, true);
                state.set_cell(r, c, None);
                total += match self.config.chance_weighting {
                    ChanceWeighting::PerCell => value,
                    ChanceWeighting::SpawnOdds => value * odds,
                };
            }
        }
        total / open.len() as f64
    }
}

#[cfg(test)]
mod test {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;
    use crate::{FixedSpawner, RandomSpawner, Tile};

    fn fixed(rows: [[u32; 4]; 4]) -> GameState<FixedSpawner> {
        GameState::from_rows(rows, 0, FixedSpawner::new(0, Tile::TWO)).unwrap()
    }

    fn heuristic_of(rows: [[u32; 4]; 4], score: u32) -> f64 {
        let gs = GameState::from_rows(rows, score, FixedSpawner::new(0, Tile::TWO)).unwrap();
        heuristic::evaluate(&gs)
    }

    #[test]
    fn depth_zero_scores_each_first_move() {
        let mut gs = fixed([[2, 2, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        let evals = Advisor::new().evaluate_moves(&mut gs, 0);

        // spawns land on the first open cell
        assert_eq!(evals[0], BranchEval { dir: Direction::Left, ev: 1446.0, legal: true });
        assert_eq!(evals[1], BranchEval { dir: Direction::Right, ev: 1436.0, legal: true });
        assert_eq!(evals[2], BranchEval { dir: Direction::Up, ev: 0.0, legal: false });
        assert_eq!(evals[3], BranchEval { dir: Direction::Down, ev: 1331.0, legal: true });

        assert_eq!(Advisor::new().recommend(&mut gs, 0), Some(Direction::Left));
    }

    #[test]
    fn ties_go_to_first_direction() {
        let mut gs = fixed([[2, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        let mut advisor = Advisor::new();
        let evals = advisor.evaluate_moves(&mut gs, 1);
        assert!(!evals[0].legal && !evals[2].legal);
        assert_eq!(evals[1].ev, 1431.0);
        assert_eq!(evals[3].ev, 1431.0);
        assert_eq!(advisor.recommend(&mut gs, 1), Some(Direction::Right));
    }

    #[test]
    fn frozen_board_has_no_recommendation() {
        let mut gs = fixed([[2, 4, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 2]]);
        let mut advisor = Advisor::new();
        assert_eq!(advisor.recommend(&mut gs, 3), None);
        assert!(advisor.evaluate_moves(&mut gs, 3).iter().all(|e| !e.legal));
    }

    #[test]
    fn max_layer_plays_full_moves() {
        let rows = [[2, 2, 0, 0], [4, 0, 0, 0], [0, 0, 0, 0], [0, 0, 8, 0]];
        let mut gs = fixed(rows);
        let evals = Advisor::new().evaluate_moves(&mut gs, 2);

        for eval in evals {
            let mut first = fixed(rows);
            assert_eq!(first.apply_move(eval.dir), eval.legal);
            if !eval.legal {
                continue;
            }
            let expected = Direction::ALL
                .iter()
                .map(|&d| {
                    let mut second = first.clone();
                    second.apply_move(d);
                    heuristic::evaluate(&second)
                })
                .fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(eval.ev, expected, "{:?}", eval.dir);
        }
        assert_eq!(gs.values(), rows);
    }

    // Left and Right each leave exactly one empty cell.
    const ONE_PAIR: [[u32; 4]; 4] = [[2, 2, 8, 16], [4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]];

    #[test]
    fn chance_layer_sums_both_tiles_per_cell() {
        let mut gs = fixed(ONE_PAIR);
        let config = AdvisorConfig {
            spawn_at_max_nodes: false,
            chance_weighting: ChanceWeighting::PerCell,
        };
        let evals = Advisor::with_config(config).evaluate_moves(&mut gs, 2);

        let rest = [[4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]];
        let left = |v| heuristic_of([[4, 8, 16, v], rest[0], rest[1], rest[2]], 4);
        let right = |v| heuristic_of([[v, 4, 8, 16], rest[0], rest[1], rest[2]], 4);
        assert_eq!(evals[0].ev, left(2) + left(4));
        assert_eq!(evals[1].ev, right(2) + right(4));
        assert!(!evals[2].legal && !evals[3].legal);
    }

    #[test]
    fn chance_layer_can_weight_by_spawn_odds() {
        let mut gs = fixed(ONE_PAIR);
        let evals = Advisor::with_config(AdvisorConfig::canonical()).evaluate_moves(&mut gs, 2);

        let rest = [[4, 8, 16, 32], [8, 16, 32, 64], [16, 32, 64, 128]];
        let left = |v| heuristic_of([[4, 8, 16, v], rest[0], rest[1], rest[2]], 4);
        assert_eq!(evals[0].ev, 0.8 * left(2) + 0.2 * left(4));
    }

    #[test]
    fn canonical_max_layer_skips_rejected_moves() {
        // after the root move only Left/Right can change the board
        let mut gs = fixed([[2, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        let mut advisor = Advisor::with_config(AdvisorConfig::canonical());
        let dir = advisor.recommend(&mut gs, 3);
        assert!(matches!(dir, Some(Direction::Right | Direction::Down)));
        assert!(advisor.last_stats().nodes > 0);
    }

    #[test]
    fn search_restores_the_state() {
        let mut gs = GameState::new_from_seed(9);
        for dir in [Direction::Left, Direction::Up, Direction::Right, Direction::Down, Direction::Left] {
            gs.apply_move(dir);
        }
        let before = gs.snapshot();
        let mut advisor = Advisor::new();
        advisor.recommend(&mut gs, 3);
        assert_eq!(gs.snapshot(), before);

        let mut gs = GameState::from_rows(
            [[1024, 1024, 2, 4], [4, 2, 4, 2], [2, 4, 2, 4], [4, 2, 4, 0]],
            10_000,
            RandomSpawner::new(StdRng::seed_from_u64(1)),
        )
        .unwrap();
        let before = gs.snapshot();
        let dir = advisor.recommend(&mut gs, 3);
        assert_eq!(gs.snapshot(), before);
        assert!(dir.is_some());
    }

    #[test]
    fn advice_does_not_change_later_spawns() {
        let moves = [Direction::Left, Direction::Down, Direction::Right, Direction::Up, Direction::Down];
        let mut plain = GameState::new_from_seed(33);
        let mut advised = GameState::new_from_seed(33);
        let mut advisor = Advisor::new();
        for _ in 0..4 {
            for dir in moves {
                advisor.recommend(&mut advised, 2);
                assert_eq!(plain.apply_move(dir), advised.apply_move(dir));
                assert_eq!(advised.snapshot(), plain.snapshot());
            }
        }
    }

    #[test]
    fn won_game_is_scored_without_searching() {
        let mut gs = fixed([[2048, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0], [0, 0, 0, 2]]);
        let mut advisor = Advisor::new();
        let evals = advisor.evaluate_moves(&mut gs, 3);
        // one node per legal root move
        let legal = evals.iter().filter(|e| e.legal).count() as u64;
        assert_eq!(advisor.last_stats().nodes, legal);
        assert_eq!(gs.terminal(), TerminalState::Won);
    }

    #[test]
    fn node_count_grows_with_depth() {
        let mut gs = fixed([[2, 2, 0, 0], [0, 4, 0, 0], [0, 0, 0, 0], [0, 0, 0, 0]]);
        let mut advisor = Advisor::new();
        advisor.evaluate_moves(&mut gs, 1);
        let shallow = advisor.last_stats().nodes;
        advisor.evaluate_moves(&mut gs, 3);
        assert!(advisor.last_stats().nodes > shallow);
    }
}
