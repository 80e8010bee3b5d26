#![no_std]

extern crate alloc;

use serde::{Deserialize, Serialize};

pub use board::*;
pub use error::*;
pub use history::*;
pub use session::*;
pub use spawner::*;
pub use tile::*;
pub use transition::*;
pub use types::*;

mod board;
mod error;
mod history;
mod session;
mod spawner;
mod tile;
mod transition;
mod types;

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub size: Coord2,
    /// Tile value that counts as winning the game.
    pub win_value: TileValue,
    /// Number of undo steps kept.
    pub history_limit: usize,
    /// Chance that a spawned tile is a four instead of a two.
    pub four_probability: f64,
}

impl GameConfig {
    pub const DEFAULT_SIZE: Coord2 = (4, 4);
    pub const DEFAULT_WIN_VALUE: TileValue = 2048;

    pub const fn new_unchecked(
        size: Coord2,
        win_value: TileValue,
        history_limit: usize,
        four_probability: f64,
    ) -> Self {
        Self {
            size,
            win_value,
            history_limit,
            four_probability,
        }
    }

    pub fn new(
        (size_x, size_y): Coord2,
        win_value: TileValue,
        history_limit: usize,
        four_probability: f64,
    ) -> Self {
        let size_x = size_x.clamp(2, Coord::MAX);
        let size_y = size_y.clamp(2, Coord::MAX);
        let win_value = win_value
            .max(SPAWN_VALUE_RARE * 2)
            .checked_next_power_of_two()
            .unwrap_or(MAX_TILE_VALUE);
        let four_probability = TileSpawner::new(four_probability).four_probability();
        Self::new_unchecked((size_x, size_y), win_value, history_limit, four_probability)
    }

    /// Square board of `size` with every other setting at its default.
    pub fn square(size: Coord) -> Self {
        Self {
            size: (size, size),
            ..Self::default()
        }
        .clamped()
    }

    pub const fn total_cells(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub fn spawner(&self) -> TileSpawner {
        TileSpawner::new(self.four_probability)
    }

    fn clamped(self) -> Self {
        Self::new(
            self.size,
            self.win_value,
            self.history_limit,
            self.four_probability,
        )
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new_unchecked(
            Self::DEFAULT_SIZE,
            Self::DEFAULT_WIN_VALUE,
            DEFAULT_HISTORY_LIMIT,
            DEFAULT_FOUR_PROBABILITY,
        )
    }
}

/// Something the presentation layer has to run later and hand back through [`GameSession::complete`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Scheduled {
    /// Finish a move once the slide animation is over.
    Settle(SettleTicket),
    /// Put a tile back on a board that a clear emptied.
    Respawn(SettleTicket),
}

impl Scheduled {
    pub const fn delay_ms(self) -> u32 {
        match self {
            Self::Settle(_) => SETTLE_DELAY_MS,
            Self::Respawn(_) => RESPAWN_DELAY_MS,
        }
    }

    pub const fn ticket(self) -> SettleTicket {
        match self {
            Self::Settle(ticket) | Self::Respawn(ticket) => ticket,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionOutcome {
    NoChange,
    Changed,
    Scheduled(Scheduled),
}

impl ActionOutcome {
    pub const fn has_update(self) -> bool {
        use ActionOutcome::*;
        match self {
            NoChange => false,
            Changed => true,
            Scheduled(_) => true,
        }
    }

    pub const fn scheduled(self) -> Option<Scheduled> {
        match self {
            Self::Scheduled(scheduled) => Some(scheduled),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_new_clamps_values() {
        let config = GameConfig::new((0, 1), 1000, 5, 2.0);
        assert_eq!(config.size, (2, 2));
        assert_eq!(config.win_value, 1024);
        assert_eq!(config.history_limit, 5);
        assert_eq!(config.four_probability, 1.0);

        assert_eq!(GameConfig::new((4, 4), 2, 20, 0.1).win_value, 8);
    }

    #[test]
    fn default_config_is_classic() {
        let config = GameConfig::default();
        assert_eq!(config.size, (4, 4));
        assert_eq!(config.total_cells(), 16);
        assert_eq!(config.win_value, 2048);
        assert_eq!(config.history_limit, 20);
        assert_eq!(GameConfig::square(5).size, (5, 5));
    }

    #[test]
    fn scheduled_delays() {
        let ticket = SettleTicket::from_raw(3);
        assert_eq!(Scheduled::Settle(ticket).delay_ms(), SETTLE_DELAY_MS);
        assert_eq!(Scheduled::Respawn(ticket).delay_ms(), RESPAWN_DELAY_MS);
        assert_eq!(Scheduled::Respawn(ticket).ticket(), ticket);
    }

    #[test]
    fn outcome_update_flags() {
        assert!(!ActionOutcome::NoChange.has_update());
        assert!(ActionOutcome::Changed.has_update());
        assert_eq!(ActionOutcome::Changed.scheduled(), None);
    }
}
