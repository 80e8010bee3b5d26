use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::*;

/// Largest representable tile value; two of these never merge.
pub const MAX_TILE_VALUE: TileValue = 1 << (TileValue::BITS - 1);

/// Identity of a tile, stable while it slides and survives merges as the destination-side tile.
pub type TileId = u32;

bitflags! {
    /// Animation hints attached for a single slide/settle cycle.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct TileFlags: u8 {
        /// Just spawned.
        const NEW     = 1;
        /// Produced by a merge, only found in settled boards.
        const MERGED  = 1 << 1;
        /// Sliding towards a merge, only found in slide states.
        const MERGING = 1 << 2;
        /// Ghost that disappears once the slide settles.
        const DELETED = 1 << 3;
    }
}

impl Default for TileFlags {
    fn default() -> Self {
        Self::empty()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub value: TileValue,
    #[serde(default)]
    pub flags: TileFlags,
}

impl Tile {
    pub const fn new(id: TileId, value: TileValue) -> Self {
        Self {
            id,
            value,
            flags: TileFlags::empty(),
        }
    }

    pub fn validate_value(value: TileValue) -> Result<TileValue> {
        if value >= 2 && value.is_power_of_two() {
            Ok(value)
        } else {
            Err(GameError::InvalidTileValue(value))
        }
    }

    pub const fn with_flags(self, flags: TileFlags) -> Self {
        Self {
            id: self.id,
            value: self.value,
            flags,
        }
    }

    /// Same tile with every animation hint dropped.
    pub const fn settled(self) -> Self {
        self.with_flags(TileFlags::empty())
    }

    pub const fn is_ghost(self) -> bool {
        self.flags.contains(TileFlags::DELETED)
    }

    /// Value of the tile `self` and `other` would merge into, if they can merge at all.
    pub const fn merged_value(self, other: Self) -> Option<TileValue> {
        if self.value == other.value && self.value < MAX_TILE_VALUE {
            Some(self.value * 2)
        } else {
            None
        }
    }
}

/// Hands out tile ids, never repeating one for the lifetime of the allocator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileIds {
    next: TileId,
}

impl TileIds {
    pub const fn new() -> Self {
        Self { next: 1 }
    }

    /// Allocator continuing after ids already handed out elsewhere.
    pub const fn after(last: TileId) -> Self {
        Self {
            next: last.saturating_add(1),
        }
    }

    pub fn next_id(&mut self) -> TileId {
        let id = self.next;
        self.next = self.next.wrapping_add(1).max(1);
        id
    }

    /// Creates a fresh tile with the next id.
    pub fn tile(&mut self, value: TileValue) -> Tile {
        Tile::new(self.next_id(), value)
    }
}

impl Default for TileIds {
    fn default() -> Self {
        Self::new()
    }
}
