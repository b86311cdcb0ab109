//! Where new tiles come from.

use rand::{rngs::StdRng, Rng};
use rand_distr::{Distribution, StandardUniform};

use crate::Tile;

/// Each spawnable tile with the odds [`RandomSpawner`] gives it.
pub const SPAWN_ODDS: [(Tile, f64); 2] = [(Tile::TWO, 0.8), (Tile::FOUR, 0.2)];

/// Source of spawn decisions. Swapping it out makes games reproducible.
pub trait Spawner {
    /// Index into the `open` empty cells (row-major), `open > 0`.
    fn choose_cell(&mut self, open: usize) -> usize;

    fn choose_tile(&mut self) -> Tile;
}

/// Uniform cell, 2 four times out of five, otherwise 4.
#[derive(Clone, Debug)]
pub struct RandomSpawner<R = StdRng> {
    rng: R,
}

impl<R: Rng> RandomSpawner<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Spawner for RandomSpawner<R> {
    fn choose_cell(&mut self, open: usize) -> usize {
        self.rng.random_range(0..open)
    }

    fn choose_tile(&mut self) -> Tile {
        self.rng.random()
    }
}

impl Distribution<Tile> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Tile {
        if rng.random_ratio(4, 5) {
            Tile::TWO
        } else {
            Tile::FOUR
        }
    }
}

/// Always the `index`-th empty cell (clamped to the last one) and always
/// the same tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedSpawner {
    index: usize,
    tile: Tile,
}

impl FixedSpawner {
    pub fn new(index: usize, tile: Tile) -> Self {
        Self { index, tile }
    }
}

impl Spawner for FixedSpawner {
    fn choose_cell(&mut self, open: usize) -> usize {
        self.index.min(open.saturating_sub(1))
    }

    fn choose_tile(&mut self) -> Tile {
        self.tile
    }
}
