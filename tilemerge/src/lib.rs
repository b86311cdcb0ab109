pub mod advisor;
pub mod error;
pub mod heuristic;
pub mod moves;
pub mod solvers;
pub mod spawn;
pub mod terminal;

use std::{
    fmt::{self, Display},
    num::NonZeroU32,
};

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

pub use advisor::{Advisor, AdvisorConfig, BranchEval, ChanceWeighting, SearchStats};
pub use error::GridError;
pub use spawn::{FixedSpawner, RandomSpawner, Spawner};
pub use terminal::{TerminalState, TARGET};

/// Side length of the board. Fixed for every game.
pub const SIZE: usize = 4;

/// Rows of optional tiles, `None` being an empty cell.
pub type Grid = [[Option<Tile>; SIZE]; SIZE];

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Every direction, in the order the advisor breaks ties.
    pub const ALL: [Direction; 4] = [
        Direction::Left,
        Direction::Right,
        Direction::Up,
        Direction::Down,
    ];
}

/// The board, the running score and the outcome of the last accepted move.
#[derive(Clone, Debug)]
pub struct GameState<S = RandomSpawner> {
    cells: Grid,
    score: u32,
    terminal: TerminalState,
    spawner: S,
}

/// Copy of everything a move can change, spawner included. Restoring one
/// puts the state back exactly as it was, so later spawns replay too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint<S = RandomSpawner> {
    cells: Grid,
    score: u32,
    terminal: TerminalState,
    spawner: S,
}

/// Read-only view handed to whatever draws the game.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: [[u32; SIZE]; SIZE],
    pub score: u32,
    pub terminal: TerminalState,
    pub max_tile: u32,
}

impl Snapshot {
    pub fn is_over(&self) -> bool {
        self.terminal.flags().0
    }

    pub fn is_won(&self) -> bool {
        self.terminal.flags().1
    }
}

impl GameState<RandomSpawner> {
    pub fn new_from_seed(seed: u64) -> Self {
        Self::new(RandomSpawner::new(StdRng::seed_from_u64(seed)))
    }

    pub fn new_from_entropy() -> Self {
        Self::new(RandomSpawner::new(StdRng::from_os_rng()))
    }
}

impl<S: Spawner> GameState<S> {
    /// Fresh game: a single 2 in a uniformly chosen cell.
    pub fn new(spawner: S) -> Self {
        let mut s = GameState {
            cells: [[None; SIZE]; SIZE],
            score: 0,
            terminal: TerminalState::InProgress,
            spawner,
        };
        s.place_start_tile();
        s
    }

    /// Builds a state from tile values, 0 meaning empty. The terminal state
    /// is classified from the given board.
    pub fn from_rows(rows: [[u32; SIZE]; SIZE], score: u32, spawner: S) -> Result<Self, GridError> {
        let mut cells = [[None; SIZE]; SIZE];
        for (r, row) in rows.iter().enumerate() {
            for (c, &value) in row.iter().enumerate() {
                if value != 0 {
                    cells[r][c] = Some(Tile::from_value(value).ok_or(GridError::InvalidTile {
                        row: r,
                        col: c,
                        value,
                    })?);
                }
            }
        }

        Ok(GameState {
            terminal: terminal::evaluate(&cells),
            cells,
            score,
            spawner,
        })
    }

    pub fn reset(&mut self) {
        self.cells = [[None; SIZE]; SIZE];
        self.score = 0;
        self.terminal = TerminalState::InProgress;
        self.place_start_tile();
    }

    fn place_start_tile(&mut self) {
        let idx = self.spawner.choose_cell(SIZE * SIZE);
        self.cells[idx / SIZE][idx % SIZE] = Some(Tile::TWO);
    }

    /// Plays one move. Returns `false` and leaves everything untouched if the
    /// board would not change; otherwise spawns a tile and re-classifies the
    /// board. A won game stays won until [`GameState::reset`].
    pub fn apply_move(&mut self, direction: Direction) -> bool {
        if !self.shift(direction) {
            return false;
        }
        self.spawn_tile();
        if self.terminal != TerminalState::Won {
            self.terminal = terminal::evaluate(&self.cells);
        }
        true
    }

    /// Slide and merge only: no spawn, no terminal update.
    pub fn shift(&mut self, direction: Direction) -> bool {
        let mut next = self.cells;
        let gained = moves::resolve(&mut next, direction);
        if next == self.cells {
            return false;
        }
        self.cells = next;
        self.score = self.score.saturating_add(gained);
        true
    }

    /// Puts a new tile in a random empty cell, returning its position.
    /// A full board is left as is.
    pub fn spawn_tile(&mut self) -> Option<(usize, usize)> {
        let open = self.empty_cells();
        if open.is_empty() {
            return None;
        }
        let (r, c) = open[self.spawner.choose_cell(open.len())];
        self.cells[r][c] = Some(self.spawner.choose_tile());
        Some((r, c))
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        let mut next = self.cells;
        moves::resolve(&mut next, direction);
        next != self.cells
    }
}

impl<S> GameState<S> {
    pub fn rows(&self) -> Grid {
        self.cells
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<Tile> {
        self.cells[row][col]
    }

    pub(crate) fn set_cell(&mut self, row: usize, col: usize, tile: Option<Tile>) {
        self.cells[row][col] = tile;
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn terminal(&self) -> TerminalState {
        self.terminal
    }

    /// Empty cells in row-major order.
    pub fn empty_cells(&self) -> Vec<(usize, usize)> {
        (0..SIZE)
            .flat_map(|r| (0..SIZE).map(move |c| (r, c)))
            .filter(|&(r, c)| self.cells[r][c].is_none())
            .collect()
    }

    pub fn values(&self) -> [[u32; SIZE]; SIZE] {
        self.cells
            .map(|row| row.map(|t| t.map_or(0, |t| t.as_u32())))
    }

    /// Largest tile value, 0 on an empty board.
    pub fn max_tile(&self) -> u32 {
        self.cells
            .iter()
            .flatten()
            .filter_map(|t| t.map(|t| t.as_u32()))
            .max()
            .unwrap_or(0)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.values(),
            score: self.score,
            terminal: self.terminal,
            max_tile: self.max_tile(),
        }
    }

    pub fn print(&self) {
        println!("{self}");
    }

    fn print_row(f: &mut impl fmt::Write, row: &[Option<Tile>]) -> fmt::Result {
        for tile in row.iter() {
            match tile {
                Some(tile) => write!(f, "|{: ^6}", tile.as_u32())?,
                None => write!(f, "|{: ^6}", " ")?,
            }
        }
        Ok(())
    }
}

impl<S: Clone> GameState<S> {
    pub fn checkpoint(&self) -> Checkpoint<S> {
        Checkpoint {
            cells: self.cells,
            score: self.score,
            terminal: self.terminal,
            spawner: self.spawner.clone(),
        }
    }

    pub fn restore(&mut self, checkpoint: Checkpoint<S>) {
        self.cells = checkpoint.cells;
        self.score = checkpoint.score;
        self.terminal = checkpoint.terminal;
        self.spawner = checkpoint.spawner;
    }
}

impl<S> Display for GameState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.iter() {
            Self::print_row(f, row)?;
            writeln!(f, "|")?;
        }
        write!(f, "score: {}", self.score)
    }
}

// which power of two. NonZero because two is the lowest
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Tile(NonZeroU32);

impl Tile {
    pub const TWO: Tile = Tile(NonZeroU32::MIN);
    pub const FOUR: Tile = Tile::TWO.double();

    pub const fn double(&self) -> Tile {
        Tile(self.0.saturating_add(1))
    }

    /// `None` unless `value` is a power of two of at least 2.
    pub fn from_value(value: u32) -> Option<Tile> {
        if value < 2 || !value.is_power_of_two() {
            return None;
        }
        NonZeroU32::new(value.trailing_zeros()).map(Tile)
    }

    pub fn as_u32(&self) -> u32 {
        2_u32.pow(self.0.get())
    }

    pub fn exponent(&self) -> u32 {
        self.0.get()
    }
}
