use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("cell ({row}, {col}) holds {value}, which is not empty (0) or a power of two of at least 2")]
    InvalidTile { row: usize, col: usize, value: u32 },
}
