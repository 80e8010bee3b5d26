use thiserror::Error;

use crate::TileValue;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Tile value {0} is not a power of two of at least 2")]
    InvalidTileValue(TileValue),
    #[error("Cell is already occupied")]
    CellOccupied,
    #[error("Tile id is used more than once")]
    DuplicateTileId,
}

pub type Result<T> = core::result::Result<T, GameError>;
