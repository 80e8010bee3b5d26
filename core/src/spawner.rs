use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::*;

/// Value of a freshly spawned tile unless the four roll succeeds.
pub const SPAWN_VALUE: TileValue = 2;

/// Value of the rarer spawned tile.
pub const SPAWN_VALUE_RARE: TileValue = 4;

/// Default chance that a spawned tile is a four.
pub const DEFAULT_FOUR_PROBABILITY: f64 = 0.1;

/// Number of tiles placed on a new board.
pub const INITIAL_TILES: usize = 2;

/// Places new tiles on empty cells, picking cells uniformly at random.
///
/// The random source is passed to every call so that callers can drive it with a seeded generator.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "SpawnerFields")]
pub struct TileSpawner {
    four_probability: f64,
}

/// Stored form of [`TileSpawner`], clamped through [`TileSpawner::new`] on the way in.
#[derive(Deserialize)]
struct SpawnerFields {
    four_probability: f64,
}

impl From<SpawnerFields> for TileSpawner {
    fn from(fields: SpawnerFields) -> Self {
        Self::new(fields.four_probability)
    }
}

impl TileSpawner {
    pub fn new(four_probability: f64) -> Self {
        let four_probability = if four_probability.is_nan() {
            DEFAULT_FOUR_PROBABILITY
        } else {
            four_probability.clamp(0.0, 1.0)
        };
        Self { four_probability }
    }

    pub fn four_probability(&self) -> f64 {
        self.four_probability
    }

    /// Returns a copy of `board` with one new tile, or an unchanged copy when the board is full.
    pub fn spawn<R: Rng + ?Sized>(&self, board: &Board, ids: &mut TileIds, rng: &mut R) -> Board {
        let mut board = board.clone();
        self.spawn_into(&mut board, ids, rng);
        board
    }

    /// Adds one new tile to `board` in place, returning where it landed.
    ///
    /// A full board is left alone without drawing from `rng`.
    pub fn spawn_into<R: Rng + ?Sized>(
        &self,
        board: &mut Board,
        ids: &mut TileIds,
        rng: &mut R,
    ) -> Option<Coord2> {
        if board.is_full() {
            log::warn!("Board already full, no tile spawned");
            return None;
        }
        let value = if rng.random_bool(self.four_probability) {
            SPAWN_VALUE_RARE
        } else {
            SPAWN_VALUE
        };
        place_random(board, value, ids, rng)
    }

    /// Fresh board for a new game: two tiles of the base value on distinct cells.
    pub fn initial_board<R: Rng + ?Sized>(&self, size: Coord2, ids: &mut TileIds, rng: &mut R) -> Board {
        let mut board = Board::new(size);
        for _ in 0..INITIAL_TILES {
            place_random(&mut board, SPAWN_VALUE, ids, rng);
        }
        board
    }
}

impl Default for TileSpawner {
    fn default() -> Self {
        Self::new(DEFAULT_FOUR_PROBABILITY)
    }
}

fn place_random<R: Rng + ?Sized>(
    board: &mut Board,
    value: TileValue,
    ids: &mut TileIds,
    rng: &mut R,
) -> Option<Coord2> {
    let empty = board.empty_cells();
    if empty.is_empty() {
        log::warn!("Board already full, no tile spawned");
        return None;
    }

    let coords = empty[rng.random_range(0..empty.len())];
    let tile = ids.tile(value).with_flags(TileFlags::NEW);
    board.put(coords, tile);
    log::trace!("spawned {} at {:?} (id {})", value, coords, tile.id);
    Some(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{RngCore, SeedableRng};

    #[test]
    fn spawn_marks_tile_as_new() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut ids = TileIds::new();
        let board = Board::new((4, 4));

        let board = TileSpawner::default().spawn(&board, &mut ids, &mut rng);

        let tiles: alloc::vec::Vec<_> = board.tiles().collect();
        assert_eq!(tiles.len(), 1);
        let (_, tile) = tiles[0];
        assert!(tile.flags.contains(TileFlags::NEW));
        assert!(tile.value == 2 || tile.value == 4);
    }

    #[test]
    fn spawn_on_full_board_is_unchanged() {
        let mut rng = SmallRng::seed_from_u64(7);
        let mut ids = TileIds::new();
        let full = Board::from_rows(&[[2, 4], [4, 2]], &mut ids).unwrap();

        let after = TileSpawner::default().spawn(&full, &mut ids, &mut rng);

        assert_eq!(after, full);
    }

    #[test]
    fn spawn_on_full_board_leaves_rng_untouched() {
        let mut rng = SmallRng::seed_from_u64(11);
        let mut untouched = rng.clone();
        let mut ids = TileIds::new();
        let mut full = Board::from_rows(&[[2, 4], [4, 2]], &mut ids).unwrap();

        assert_eq!(TileSpawner::default().spawn_into(&mut full, &mut ids, &mut rng), None);
        assert_eq!(rng.next_u64(), untouched.next_u64());
    }

    #[test]
    fn deserialized_probability_is_clamped() {
        let spawner: TileSpawner = serde_json::from_str(r#"{"four_probability":2.0}"#).unwrap();
        assert_eq!(spawner.four_probability(), 1.0);

        let spawner: TileSpawner = serde_json::from_str(r#"{"four_probability":-0.5}"#).unwrap();
        assert_eq!(spawner.four_probability(), 0.0);

        let json = serde_json::to_string(&TileSpawner::new(0.25)).unwrap();
        assert_eq!(serde_json::from_str::<TileSpawner>(&json).unwrap(), TileSpawner::new(0.25));
    }

    #[test]
    fn probability_extremes_are_respected() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut ids = TileIds::new();

        let mut board = Board::new((4, 4));
        for _ in 0..16 {
            TileSpawner::new(1.0).spawn_into(&mut board, &mut ids, &mut rng);
        }
        assert!(board.tiles().all(|(_, tile)| tile.value == 4));

        let mut board = Board::new((4, 4));
        for _ in 0..16 {
            TileSpawner::new(0.0).spawn_into(&mut board, &mut ids, &mut rng);
        }
        assert!(board.tiles().all(|(_, tile)| tile.value == 2));
    }

    #[test]
    fn out_of_range_probability_is_clamped() {
        assert_eq!(TileSpawner::new(3.0).four_probability(), 1.0);
        assert_eq!(TileSpawner::new(-1.0).four_probability(), 0.0);
        assert_eq!(
            TileSpawner::new(f64::NAN).four_probability(),
            DEFAULT_FOUR_PROBABILITY
        );
    }

    #[test]
    fn initial_board_has_two_distinct_twos() {
        for seed in 0..32 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let board = TileSpawner::default().initial_board((4, 4), &mut TileIds::new(), &mut rng);

            assert_eq!(board.tile_count(), 2);
            assert!(board.tiles().all(|(_, tile)| tile.value == 2));
        }
    }
}
