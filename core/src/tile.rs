use serde::{Deserialize, Serialize};

/// State of a single cell of the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    /// Corner cells outside of the cross, never change.
    Invalid,
    Empty,
    Peg,
}

impl CellState {
    pub const fn is_peg(self) -> bool {
        matches!(self, Self::Peg)
    }

    pub const fn is_empty(self) -> bool {
        matches!(self, Self::Empty)
    }

    pub const fn is_playable(self) -> bool {
        !matches!(self, Self::Invalid)
    }

    /// Symbol used in the text form of a board.
    pub const fn to_char(self) -> char {
        match self {
            Self::Invalid => ' ',
            Self::Empty => '.',
            Self::Peg => 'o',
        }
    }

    pub(crate) const fn from_char(c: char) -> Option<Self> {
        match c {
            ' ' | '#' => Some(Self::Invalid),
            '.' => Some(Self::Empty),
            'o' => Some(Self::Peg),
            _ => None,
        }
    }
}
