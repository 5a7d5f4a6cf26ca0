use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

/// A jump of the peg at `origin` over `midpoint` onto `destination`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    pub origin: Position,
    pub midpoint: Position,
    pub destination: Position,
}

impl Move {
    /// Geometric jump from `origin` two cells towards `direction`, if it stays on the grid.
    pub fn jump(origin: Position, direction: Direction) -> Option<Self> {
        Some(Self {
            origin,
            midpoint: origin.step(direction, 1)?,
            destination: origin.step(direction, 2)?,
        })
    }

    /// Geometric jump between two cells exactly two apart along one axis.
    pub fn between(origin: Position, destination: Position) -> Option<Self> {
        Direction::ALL
            .into_iter()
            .filter_map(|direction| Self::jump(origin, direction))
            .find(|mv| mv.destination == destination)
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin, self.destination)
    }
}

/// Legal moves of a single peg, at most one per direction.
pub type Moves = SmallVec<[Move; 4]>;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminalState {
    Ongoing,
    Won,
    Lost,
}

impl TerminalState {
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

impl Default for TerminalState {
    fn default() -> Self {
        Self::Ongoing
    }
}

impl Board {
    /// Moves available to the peg at `origin`, in up, down, left, right order.
    ///
    /// Empty when `origin` holds no peg, which includes positions off the grid.
    pub fn legal_moves_from(&self, origin: Position) -> Moves {
        if !matches!(self.classify_cell(origin), Ok(CellState::Peg)) {
            return Moves::new();
        }

        Direction::ALL
            .into_iter()
            .filter_map(|direction| Move::jump(origin, direction))
            .filter(|mv| self[mv.midpoint].is_peg() && self[mv.destination].is_empty())
            .collect()
    }

    /// Every legal move on the board, origins in row-major order.
    pub fn legal_moves(&self) -> Vec<Move> {
        self.pegs()
            .flat_map(|origin| self.legal_moves_from(origin))
            .collect()
    }

    /// The legal move of the peg at `origin` that lands on `destination`.
    pub fn move_between(&self, origin: Position, destination: Position) -> Option<Move> {
        self.legal_moves_from(origin)
            .into_iter()
            .find(|mv| mv.destination == destination)
    }

    pub fn has_any_legal_move(&self) -> bool {
        self.pegs()
            .any(|origin| !self.legal_moves_from(origin).is_empty())
    }

    /// Applies a legal move, returning the resulting snapshot.
    ///
    /// `mv` must be one of [`Board::legal_moves_from`] for its origin.
    pub fn apply_move(&self, mv: Move) -> Result<Board> {
        for pos in [mv.origin, mv.midpoint, mv.destination] {
            self.classify_cell(pos)?;
        }

        if !self.legal_moves_from(mv.origin).contains(&mv) {
            log::debug!("Rejected illegal move {mv}");
            return Err(GameError::IllegalMove);
        }

        let mut next = self.clone();
        next.set(mv.origin, CellState::Empty);
        next.set(mv.midpoint, CellState::Empty);
        next.set(mv.destination, CellState::Peg);
        Ok(next)
    }

    /// Won on a single peg wherever it sits, lost when several pegs remain
    /// and none of them can move.
    pub fn evaluate_terminal(&self) -> TerminalState {
        match self.count_pegs() {
            1 => TerminalState::Won,
            // zero pegs cannot come out of legal play, vacuously stuck
            _ if !self.has_any_legal_move() => TerminalState::Lost,
            _ => TerminalState::Ongoing,
        }
    }
}
