//! Static board evaluation used at the leaves of the search.

use crate::{GameState, SIZE};

const EMPTY_WEIGHT: f64 = 100.0;
const MONOTONICITY_WEIGHT: f64 = 10.0;
const CORNER_WEIGHT: f64 = 0.5;

const CORNERS: [(usize, usize); 4] = [(0, 0), (0, SIZE - 1), (SIZE - 1, 0), (SIZE - 1, SIZE - 1)];

/// score + 100 per empty cell + 10 per decreasing neighbour pair
/// + half the largest tile when it sits in a corner
pub fn evaluate<S>(state: &GameState<S>) -> f64 {
    let board = state.values();
    f64::from(state.score())
        + calc_empty(&board)
        + calc_monotonicity(&board)
        + calc_corner(&board)
}

fn calc_empty(board: &[[u32; SIZE]; SIZE]) -> f64 {
    let empty = board.iter().flatten().filter(|&&v| v == 0).count();
    empty as f64 * EMPTY_WEIGHT
}

// Only counts pairs decreasing left to right and top to bottom.
fn calc_monotonicity(board: &[[u32; SIZE]; SIZE]) -> f64 {
    let mut pairs = 0u32;
    for i in 0..SIZE {
        for j in 0..SIZE - 1 {
            if board[i][j] > board[i][j + 1] {
                pairs += 1;
            }
            if board[j][i] > board[j + 1][i] {
                pairs += 1;
            }
        }
    }
    f64::from(pairs) * MONOTONICITY_WEIGHT
}

fn calc_corner(board: &[[u32; SIZE]; SIZE]) -> f64 {
    let max = board.iter().flatten().copied().max().unwrap_or(0);
    if CORNERS.iter().any(|&(r, c)| board[r][c] == max) {
        f64::from(max) * CORNER_WEIGHT
    } else {
        0.0
    }
}
