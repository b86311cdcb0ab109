//! Slide and merge. Only [`resolve_row`] knows how tiles combine; the other
//! three directions reflect and/or transpose the grid around it.

use crate::{Direction, Grid, Tile, SIZE};

/// Moves every row/column of `grid` in `direction`, returning the sum of the
/// tiles created by merges.
pub fn resolve(grid: &mut Grid, direction: Direction) -> u32 {
    match direction {
        Direction::Left => resolve_left(grid),
        Direction::Right => {
            reverse(grid);
            let gained = resolve_left(grid);
            reverse(grid);
            gained
        }
        Direction::Up => {
            transpose(grid);
            let gained = resolve_left(grid);
            transpose(grid);
            gained
        }
        Direction::Down => {
            transpose(grid);
            reverse(grid);
            let gained = resolve_left(grid);
            reverse(grid);
            transpose(grid);
            gained
        }
    }
}

fn resolve_left(grid: &mut Grid) -> u32 {
    grid.iter_mut().map(resolve_row).sum()
}

/// slide, merge each equal pair once, slide again
pub fn resolve_row(row: &mut [Option<Tile>; SIZE]) -> u32 {
    slide(row);
    let mut gained = 0;
    for j in 0..SIZE - 1 {
        if let (Some(a), Some(b)) = (row[j], row[j + 1]) {
            if a == b {
                let merged = a.double();
                row[j] = Some(merged);
                row[j + 1] = None;
                gained += merged.as_u32();
            }
        }
    }
    slide(row);
    gained
}

fn slide(row: &mut [Option<Tile>; SIZE]) {
    let mut packed = [None; SIZE];
    for (slot, tile) in packed.iter_mut().zip(row.iter().flatten()) {
        *slot = Some(*tile);
    }
    *row = packed;
}

pub fn reverse(grid: &mut Grid) {
    for row in grid.iter_mut() {
        row.reverse();
    }
}

pub fn transpose(grid: &mut Grid) {
    for i in 0..SIZE {
        for j in i + 1..SIZE {
            let tmp = grid[i][j];
            grid[i][j] = grid[j][i];
            grid[j][i] = tmp;
        }
    }
}
