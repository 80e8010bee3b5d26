use infinito_core::Coord;

pub(crate) const MAX_BOARD_WIDTH: f64 = 500.0;
pub(crate) const MIN_GAP: f64 = 8.0;
pub(crate) const GAP_RATIO: f64 = 0.025;

/// Pixel layout of the board, derived from the width available to it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct BoardGeometry {
    pub gap: f64,
    pub cell: f64,
}

impl BoardGeometry {
    pub(crate) fn from_width(width: f64, columns: Coord) -> Self {
        let width = width.clamp(0.0, MAX_BOARD_WIDTH);
        let columns = f64::from(columns.max(1));
        let gap = (width * GAP_RATIO).max(MIN_GAP);
        let cell = ((width - gap * (columns + 1.0)) / columns).max(0.0);
        Self { gap, cell }
    }

    /// Distance from the board edge to the start of cell `index`.
    pub(crate) fn offset(&self, index: Coord) -> f64 {
        f64::from(index) * (self.cell + self.gap) + self.gap
    }

    /// Outer size of `count` cells including every gap.
    pub(crate) fn extent(&self, count: Coord) -> f64 {
        let count = f64::from(count);
        self.cell * count + self.gap * (count + 1.0)
    }
}

impl Default for BoardGeometry {
    fn default() -> Self {
        Self { gap: 12.0, cell: 70.0 }
    }
}
