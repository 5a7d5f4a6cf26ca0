use core::fmt;
use core::ops::Index;

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Snapshot of the 7x7 grid.
///
/// The corner cells are always [`CellState::Invalid`], every constructor
/// checks this, and moves never touch them. A board is never shared mutably:
/// [`Board::apply_move`] hands back a new snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "Array2<CellState>", try_from = "Array2<CellState>")]
pub struct Board {
    cells: Array2<CellState>,
}

impl Board {
    /// Standard starting layout: every playable cell holds a peg except the center.
    pub fn new() -> Self {
        let mut board = Self::with_pegs_everywhere();
        board.set(Position::CENTER, CellState::Empty);
        board
    }

    /// Board holding pegs exactly at `pegs`, every other playable cell empty.
    pub fn from_pegs(pegs: &[Position]) -> Result<Self> {
        let mut board = Self::cleared();
        for &pos in pegs {
            match board.classify_cell(pos)? {
                CellState::Invalid => return Err(GameError::InvalidBoardShape),
                _ => board.set(pos, CellState::Peg),
            }
        }
        Ok(board)
    }

    /// Parses seven text rows of seven cells each: `o` peg, `.` empty, and a
    /// space or `#` for the corners.
    pub fn from_rows(rows: &[&str]) -> Result<Self> {
        if rows.len() != BOARD_SIZE as usize {
            return Err(GameError::InvalidBoardShape);
        }

        let mut board = Self::cleared();
        for (row, line) in (0..BOARD_SIZE).zip(rows) {
            if line.chars().count() != BOARD_SIZE as usize {
                return Err(GameError::InvalidBoardShape);
            }
            for (col, c) in (0..BOARD_SIZE).zip(line.chars()) {
                let state = CellState::from_char(c).ok_or(GameError::InvalidBoardShape)?;
                board.set(Position::new(row, col), state);
            }
        }

        board.validate_layout()?;
        Ok(board)
    }

    fn with_pegs_everywhere() -> Self {
        Self::with_playable(CellState::Peg)
    }

    fn cleared() -> Self {
        Self::with_playable(CellState::Empty)
    }

    fn with_playable(fill: CellState) -> Self {
        let size = BOARD_SIZE as usize;
        let cells = Array2::from_shape_fn((size, size), |(row, col)| {
            // both fit in a Coord since size is BOARD_SIZE
            if Position::new(row as Coord, col as Coord).is_playable() {
                fill
            } else {
                CellState::Invalid
            }
        });
        Self { cells }
    }

    fn validate_layout(&self) -> Result<()> {
        let size = BOARD_SIZE as usize;
        if self.cells.dim() != (size, size) {
            return Err(GameError::InvalidBoardShape);
        }

        let corners_match = Position::iter_grid()
            .all(|pos| self[pos].is_playable() == pos.is_playable());
        if corners_match {
            Ok(())
        } else {
            Err(GameError::InvalidBoardShape)
        }
    }

    /// Bounds-checked lookup of a single cell.
    pub fn classify_cell(&self, pos: Position) -> Result<CellState> {
        if pos.in_bounds() {
            Ok(self[pos])
        } else {
            Err(GameError::OutOfRange)
        }
    }

    pub fn count_pegs(&self) -> PegCount {
        self.cells
            .iter()
            .filter(|cell| cell.is_peg())
            .count()
            .try_into()
            .unwrap_or(PegCount::MAX)
    }

    /// Positions holding a peg, row-major.
    pub fn pegs(&self) -> impl Iterator<Item = Position> + '_ {
        Position::iter_playable().filter(|&pos| self[pos].is_peg())
    }

    /// Pegs packed as bits `row * 7 + col`, used as a compact hash key.
    pub fn peg_mask(&self) -> u64 {
        self.pegs().fold(0, |mask, pos| mask | pos.bit())
    }

    pub(crate) fn set(&mut self, pos: Position, state: CellState) {
        self.cells[pos.to_nd_index()] = state;
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<Position> for Board {
    type Output = CellState;

    fn index(&self, pos: Position) -> &Self::Output {
        &self.cells[pos.to_nd_index()]
    }
}

impl From<Board> for Array2<CellState> {
    fn from(board: Board) -> Self {
        board.cells
    }
}

impl TryFrom<Array2<CellState>> for Board {
    type Error = GameError;

    fn try_from(cells: Array2<CellState>) -> Result<Self> {
        let board = Self { cells };
        board.validate_layout()?;
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use fmt::Write;

        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                f.write_char(self[Position::new(row, col)].to_char())?;
            }
            if row + 1 < BOARD_SIZE {
                f.write_char('\n')?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    const START: [&str; 7] = [
        "  ooo  ",
        "  ooo  ",
        "ooooooo",
        "ooo.ooo",
        "ooooooo",
        "  ooo  ",
        "  ooo  ",
    ];

    #[test]
    fn initial_layout_matches_cross() {
        let board = Board::new();

        assert_eq!(board.count_pegs(), 32);
        assert_eq!(board[Position::CENTER], CellState::Empty);
        assert_eq!(board[Position::new(0, 0)], CellState::Invalid);
        assert_eq!(board[Position::new(6, 5)], CellState::Invalid);
        assert_eq!(board[Position::new(0, 2)], CellState::Peg);
        assert_eq!(board, Board::from_rows(&START).unwrap());
    }

    #[test]
    fn classify_rejects_out_of_range() {
        let board = Board::new();

        assert_eq!(board.classify_cell(Position::new(7, 0)), Err(GameError::OutOfRange));
        assert_eq!(board.classify_cell(Position::new(0, 200)), Err(GameError::OutOfRange));
        assert_eq!(board.classify_cell(Position::new(1, 0)), Ok(CellState::Invalid));
    }

    #[test]
    fn from_pegs_rejects_corner_cells() {
        assert_eq!(
            Board::from_pegs(&[Position::new(0, 0)]),
            Err(GameError::InvalidBoardShape)
        );
        assert_eq!(
            Board::from_pegs(&[Position::new(9, 3)]),
            Err(GameError::OutOfRange)
        );

        let board = Board::from_pegs(&[Position::new(0, 3), Position::new(6, 3)]).unwrap();
        assert_eq!(board.count_pegs(), 2);
    }

    #[test]
    fn from_rows_rejects_peg_in_corner() {
        let mut rows = START;
        rows[0] = "o ooo  ";
        assert_eq!(Board::from_rows(&rows), Err(GameError::InvalidBoardShape));

        rows[0] = "  ooo";
        assert_eq!(Board::from_rows(&rows), Err(GameError::InvalidBoardShape));

        rows[0] = "  oxo  ";
        assert_eq!(Board::from_rows(&rows), Err(GameError::InvalidBoardShape));
    }

    #[test]
    fn display_renders_rows() {
        let rendered = Board::new().to_string();
        let lines: alloc::vec::Vec<&str> = rendered.lines().collect();
        assert_eq!(lines, START);
    }

    #[test]
    fn peg_mask_tracks_pegs() {
        let board = Board::from_pegs(&[Position::new(0, 2), Position::new(3, 3)]).unwrap();
        assert_eq!(board.peg_mask(), (1 << 2) | (1 << 24));
    }

    #[test]
    fn deserialize_validates_layout() {
        let json = serde_json::to_string(&Board::new()).unwrap();
        let board: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(board, Board::new());

        let mut cells: Array2<CellState> = Board::new().into();
        cells[[0, 0]] = CellState::Peg;
        let json = serde_json::to_string(&cells).unwrap();
        assert!(serde_json::from_str::<Board>(&json).is_err());
    }
}
