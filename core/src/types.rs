use core::fmt;

use serde::{Deserialize, Serialize};

/// Single coordinate axis used for rows and columns.
pub type Coord = u8;

/// Count type used for peg counts.
pub type PegCount = u8;

/// Width and height of the square grid the cross is drawn on.
pub const BOARD_SIZE: Coord = 7;

/// Number of playable (non-corner) cells.
pub const PLAYABLE_CELLS: PegCount = 33;

/// Cell addressed by `(row, col)`, both 0-indexed from the top-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: Coord,
    pub col: Coord,
}

impl Position {
    pub const CENTER: Position = Position::new(3, 3);

    pub const fn new(row: Coord, col: Coord) -> Self {
        Self { row, col }
    }

    pub const fn in_bounds(self) -> bool {
        self.row < BOARD_SIZE && self.col < BOARD_SIZE
    }

    /// Whether the position lies on the cross, corners excluded.
    pub const fn is_playable(self) -> bool {
        if !self.in_bounds() {
            return false;
        }
        let row_in_band = self.row >= 2 && self.row <= 4;
        let col_in_band = self.col >= 2 && self.col <= 4;
        row_in_band || col_in_band
    }

    /// Moves `steps` cells towards `direction`, `None` when leaving the grid.
    pub fn step(self, direction: Direction, steps: u8) -> Option<Position> {
        let (dr, dc) = direction.delta();
        let steps: i8 = steps.try_into().ok()?;
        let row = self.row.checked_add_signed(dr.checked_mul(steps)?)?;
        let col = self.col.checked_add_signed(dc.checked_mul(steps)?)?;
        let next = Position::new(row, col);
        next.in_bounds().then_some(next)
    }

    /// Bit index in a packed 7x7 mask.
    pub(crate) const fn bit(self) -> u64 {
        1u64 << (self.row as u32 * BOARD_SIZE as u32 + self.col as u32)
    }

    /// Every position of the 7x7 grid in row-major order.
    pub fn iter_grid() -> impl Iterator<Item = Position> {
        (0..BOARD_SIZE).flat_map(|row| (0..BOARD_SIZE).map(move |col| Position::new(row, col)))
    }

    /// Every playable position in row-major order.
    pub fn iter_playable() -> impl Iterator<Item = Position> {
        Self::iter_grid().filter(|pos| pos.is_playable())
    }
}

impl From<(Coord, Coord)> for Position {
    fn from((row, col): (Coord, Coord)) -> Self {
        Self::new(row, col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Position {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.row.into(), self.col.into()]
    }
}

/// Axis-aligned jump direction, listed in enumeration order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// `(row, col)` displacement of a single step.
    pub const fn delta(self) -> (i8, i8) {
        match self {
            Self::Up => (-1, 0),
            Self::Down => (1, 0),
            Self::Left => (0, -1),
            Self::Right => (0, 1),
        }
    }
}
