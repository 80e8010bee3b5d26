use alloc::vec::Vec;
use core::fmt;
use core::ops::Index;
use hashbrown::HashSet;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// Tiles adjacent to a cell, at most one per orthogonal side.
pub type Neighbors = SmallVec<[(Coord2, Tile); 4]>;

/// Settled grid of tiles indexed by `(x, y)`, holding at most one tile per cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Option<Tile>>,
}

impl Board {
    pub fn new(size: Coord2) -> Self {
        Self {
            cells: Array2::default(size.to_nd_index()),
        }
    }

    /// Builds a board from row-major values where `0` marks an empty cell.
    pub fn from_rows<R: AsRef<[TileValue]>>(rows: &[R], ids: &mut TileIds) -> Result<Self> {
        let height = rows.len();
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        if width == 0 || rows.iter().any(|row| row.as_ref().len() != width) {
            return Err(GameError::InvalidBoardShape);
        }
        let size: Coord2 = (
            width.try_into().map_err(|_| GameError::InvalidBoardShape)?,
            height.try_into().map_err(|_| GameError::InvalidBoardShape)?,
        );

        let mut board = Self::new(size);
        for (y, row) in (0..size.1).zip(rows) {
            for (x, &value) in (0..size.0).zip(row.as_ref()) {
                if value != 0 {
                    let value = Tile::validate_value(value)?;
                    board.place((x, y), ids.tile(value))?;
                }
            }
        }
        Ok(board)
    }

    /// Builds a board from positioned tiles, rejecting anything that breaks the board invariants.
    pub fn from_tiles<I>(size: Coord2, tiles: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Coord2, Tile)>,
    {
        if size.0 == 0 || size.1 == 0 {
            return Err(GameError::InvalidBoardShape);
        }

        let mut board = Self::new(size);
        let mut seen = HashSet::new();
        for (coords, tile) in tiles {
            Tile::validate_value(tile.value)?;
            if !seen.insert(tile.id) {
                return Err(GameError::DuplicateTileId);
            }
            board.place(coords, tile)?;
        }
        Ok(board)
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.cells.dim();
        (
            dim.0.try_into().unwrap_or(Coord::MAX),
            dim.1.try_into().unwrap_or(Coord::MAX),
        )
    }

    pub fn total_cells(&self) -> CellCount {
        let (width, height) = self.size();
        mult(width, height)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn get(&self, coords: Coord2) -> Option<Tile> {
        self.cells.get(coords.to_nd_index()).copied().flatten()
    }

    pub fn place(&mut self, coords: Coord2, tile: Tile) -> Result<()> {
        let coords = self.validate_coords(coords)?;
        let cell = &mut self.cells[coords.to_nd_index()];
        if cell.is_some() {
            return Err(GameError::CellOccupied);
        }
        *cell = Some(tile);
        Ok(())
    }

    /// Overwrites a cell the caller already knows to be in bounds.
    pub(crate) fn put(&mut self, coords: Coord2, tile: Tile) {
        self.cells[coords.to_nd_index()] = Some(tile);
    }

    pub fn remove(&mut self, coords: Coord2) -> Option<Tile> {
        self.cells.get_mut(coords.to_nd_index())?.take()
    }

    /// Exchanges the contents of two cells.
    pub fn swap(&mut self, a: Coord2, b: Coord2) -> Result<()> {
        let a = self.validate_coords(a)?;
        let b = self.validate_coords(b)?;
        self.cells.swap(a.to_nd_index(), b.to_nd_index());
        Ok(())
    }

    /// Removes every tile showing `value` and returns how many were removed.
    pub fn remove_value(&mut self, value: TileValue) -> CellCount {
        let mut removed = 0;
        for cell in self.cells.iter_mut() {
            if cell.is_some_and(|tile| tile.value == value) {
                *cell = None;
                removed += 1;
            }
        }
        removed
    }

    pub fn position_of(&self, id: TileId) -> Option<Coord2> {
        self.tiles()
            .find(|(_, tile)| tile.id == id)
            .map(|(coords, _)| coords)
    }

    /// Occupied cells in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = (Coord2, Tile)> + '_ {
        let (width, height) = self.size();
        (0..height)
            .flat_map(move |y| (0..width).map(move |x| (x, y)))
            .filter_map(move |coords| self.get(coords).map(|tile| (coords, tile)))
    }

    /// Unoccupied cells in row-major order.
    pub fn empty_cells(&self) -> Vec<Coord2> {
        let (width, height) = self.size();
        (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .filter(|&coords| self.get(coords).is_none())
            .collect()
    }

    pub fn neighbors_of(&self, coords: Coord2) -> Neighbors {
        self.cells
            .iter_neighbors(coords)
            .filter_map(|pos| self.get(pos).map(|tile| (pos, tile)))
            .collect()
    }

    pub fn tile_count(&self) -> CellCount {
        self.cells
            .iter()
            .filter(|cell| cell.is_some())
            .count()
            .try_into()
            .unwrap_or(CellCount::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    pub fn value_sum(&self) -> Score {
        self.tiles().map(|(_, tile)| Score::from(tile.value)).sum()
    }

    pub fn max_value(&self) -> Option<TileValue> {
        self.tiles().map(|(_, tile)| tile.value).max()
    }

    /// Whether two orthogonally adjacent tiles could still merge.
    pub fn has_adjacent_pair(&self) -> bool {
        self.tiles().any(|(coords, tile)| {
            self.neighbors_of(coords)
                .iter()
                .any(|&(_, neighbor)| tile.merged_value(neighbor).is_some())
        })
    }

    /// Full board with no merge left in any direction.
    pub fn is_game_over(&self) -> bool {
        self.is_full() && !self.has_adjacent_pair()
    }

    pub fn can_move(&self, direction: Direction) -> bool {
        transition(self, direction).moved
    }

    pub fn has_any_move(&self) -> bool {
        Direction::ALL
            .into_iter()
            .any(|direction| self.can_move(direction))
    }

    /// Copy of the board with every animation hint cleared.
    pub fn settled(&self) -> Self {
        Self {
            cells: self.cells.map(|cell| cell.map(Tile::settled)),
        }
    }

    /// Row-major values with `0` for empty cells.
    pub fn to_rows(&self) -> Vec<Vec<TileValue>> {
        let (width, height) = self.size();
        (0..height)
            .map(|y| {
                (0..width)
                    .map(|x| self.get((x, y)).map_or(0, |tile| tile.value))
                    .collect()
            })
            .collect()
    }
}

impl Index<Coord2> for Board {
    type Output = Option<Tile>;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.to_rows() {
            for (i, &value) in row.iter().enumerate() {
                if i > 0 {
                    f.write_str(" ")?;
                }
                match value {
                    0 => write!(f, "{:>5}", ".")?,
                    value => write!(f, "{:>5}", value)?,
                }
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}
