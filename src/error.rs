use thiserror::Error;

/// Fatal maze configuration problems. A session is never built from a maze
/// that fails these checks.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MazeError {
    #[error("maze has no rows")]
    Empty,
    #[error("maze row {row} has {actual} columns, expected {expected}")]
    NotRectangular {
        row: usize,
        expected: usize,
        actual: usize,
    },
    #[error("unknown tile {tile:?} at row {row}, column {col}")]
    UnknownTile { row: usize, col: usize, tile: char },
    #[error("maze has no player spawn marker")]
    MissingPlayerSpawn,
    #[error("maze has no pursuer spawn marker")]
    MissingPursuerSpawn,
}
