use serde::{Deserialize, Serialize};

use crate::{Grid, SIZE};

/// Tile value that wins the game.
pub const TARGET: u32 = 2048;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TerminalState {
    #[default]
    InProgress,
    Won,
    Stalemated,
}

impl TerminalState {
    /// `(over, won)`
    pub fn flags(self) -> (bool, bool) {
        match self {
            TerminalState::InProgress => (false, false),
            TerminalState::Won => (true, true),
            TerminalState::Stalemated => (true, false),
        }
    }

    pub fn is_over(self) -> bool {
        self != TerminalState::InProgress
    }
}

/// Won beats stalemate when both hold.
pub fn evaluate(cells: &Grid) -> TerminalState {
    if cells.iter().flatten().flatten().any(|t| t.as_u32() == TARGET) {
        return TerminalState::Won;
    }
    if has_empty(cells) || horizontal_pair(cells) || vertical_pair(cells) {
        TerminalState::InProgress
    } else {
        TerminalState::Stalemated
    }
}

fn has_empty(cells: &Grid) -> bool {
    cells.iter().flatten().any(Option::is_none)
}

fn horizontal_pair(cells: &Grid) -> bool {
    cells
        .iter()
        .any(|row| row.windows(2).any(|w| w[0].is_some() && w[0] == w[1]))
}

fn vertical_pair(cells: &Grid) -> bool {
    (0..SIZE - 1).any(|r| (0..SIZE).any(|c| cells[r][c].is_some() && cells[r][c] == cells[r + 1][c]))
}
