use alloc::vec::Vec;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// A tile on its way from one cell to another during the slide phase.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlidingTile {
    pub tile: Tile,
    pub from: Coord2,
    pub to: Coord2,
}

impl SlidingTile {
    pub fn has_moved(&self) -> bool {
        self.from != self.to
    }
}

/// Board shown while tiles slide: values are unchanged and merge ghosts share a cell with their partner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideState {
    size: Coord2,
    tiles: Vec<SlidingTile>,
}

impl SlideState {
    pub fn size(&self) -> Coord2 {
        self.size
    }

    pub fn tiles(&self) -> &[SlidingTile] {
        &self.tiles
    }

    pub fn ghosts(&self) -> impl Iterator<Item = &SlidingTile> {
        self.tiles.iter().filter(|sliding| sliding.tile.is_ghost())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub direction: Direction,
    /// Whether any tile changed cell or merged; a move that did neither is not a legal move.
    pub moved: bool,
    pub slide: SlideState,
    pub settled: Board,
    pub score_delta: Score,
    pub merges: CellCount,
}

/// Cell `index` of line `line`, where index 0 sits on the destination edge.
fn line_cell(direction: Direction, size: Coord2, line: Coord, index: Coord) -> Coord2 {
    use Direction::*;

    let (width, height) = size;
    match direction {
        Left => (index, line),
        Right => (width - 1 - index, line),
        Up => (line, index),
        Down => (line, height - 1 - index),
    }
}

/// Pushes every tile of `board` towards `direction`, merging equal neighbours once.
///
/// Each row or column is read from the destination edge inwards, so a single front-to-back compaction serves all
/// four directions. Equal pairs merge greedily from the destination side: `2 2 2` becomes `4 2`, never `2 4` and
/// never `8`. Tiles already at [`MAX_TILE_VALUE`] do not merge. The input board is left untouched and no tile is
/// spawned.
pub fn transition(board: &Board, direction: Direction) -> Transition {
    let size = board.size();
    let (line_count, line_len) = if direction.is_horizontal() {
        (size.1, size.0)
    } else {
        (size.0, size.1)
    };

    let mut slide = Vec::with_capacity(board.tile_count().into());
    let mut settled = Board::new(size);
    let mut moved = false;
    let mut score_delta: Score = 0;
    let mut merges: CellCount = 0;

    for line in 0..line_count {
        let compacted: SmallVec<[(Coord2, Tile); 8]> = (0..line_len)
            .map(|index| line_cell(direction, size, line, index))
            .filter_map(|coords| board.get(coords).map(|tile| (coords, tile.settled())))
            .collect();

        let mut source = 0;
        let mut dest: Coord = 0;
        while source < compacted.len() {
            let target = line_cell(direction, size, line, dest);
            let (from, tile) = compacted[source];

            let merge = compacted
                .get(source + 1)
                .and_then(|&(ghost_from, ghost)| {
                    tile.merged_value(ghost)
                        .map(|value| (ghost_from, ghost, value))
                });

            match merge {
                Some((ghost_from, ghost, value)) => {
                    slide.push(SlidingTile {
                        tile: tile.with_flags(TileFlags::MERGING),
                        from,
                        to: target,
                    });
                    slide.push(SlidingTile {
                        tile: ghost.with_flags(TileFlags::MERGING | TileFlags::DELETED),
                        from: ghost_from,
                        to: target,
                    });
                    settled.put(
                        target,
                        Tile {
                            id: tile.id,
                            value,
                            flags: TileFlags::MERGED,
                        },
                    );
                    score_delta += Score::from(value);
                    merges += 1;
                    moved = true;
                    source += 2;
                }
                _ => {
                    moved |= from != target;
                    slide.push(SlidingTile {
                        tile,
                        from,
                        to: target,
                    });
                    settled.put(target, tile);
                    source += 1;
                }
            }
            dest += 1;
        }
    }

    log::trace!(
        "transition {:?}: moved={} merges={} score_delta={}",
        direction,
        moved,
        merges,
        score_delta
    );

    Transition {
        direction,
        moved,
        slide: SlideState { size, tiles: slide },
        settled,
        score_delta,
        merges,
    }
}
