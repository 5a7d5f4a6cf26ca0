use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::*;

/// What a click on the board did to the session.
#[derive(Clone, Debug, PartialEq)]
pub enum ClickOutcome {
    /// A peg got selected, `moves` are its jumps (possibly none).
    Selected { origin: Position, moves: Moves },
    Moved { mv: Move, state: TerminalState },
    Deselected,
    /// The game is over, clicks are no longer processed.
    Ignored,
}

/// Result of a finished game, ready to be submitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameResult {
    pub state: TerminalState,
    pub elapsed_secs: u32,
    pub pegs_remaining: PegCount,
    pub move_count: u32,
}

/// Mutable state of one game: the engine itself never holds any.
///
/// The clock starts on the first move and stops on the move that ends the
/// game. The finished game's [`GameResult`] is handed out once.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSession {
    board: Board,
    selected: Option<Position>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    move_count: u32,
    state: TerminalState,
    result_taken: bool,
}

impl GameSession {
    pub fn new() -> Self {
        Self::from_board(Board::new())
    }

    /// Session starting from an arbitrary position, mostly for puzzles and tests.
    ///
    /// A board that is already over yields no result: nothing was played.
    pub fn from_board(board: Board) -> Self {
        let state = board.evaluate_terminal();
        Self {
            board,
            selected: None,
            started_at: None,
            ended_at: None,
            move_count: 0,
            state,
            result_taken: state.is_finished(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn selected(&self) -> Option<Position> {
        self.selected
    }

    /// Jumps available to the selected peg.
    pub fn selected_moves(&self) -> Moves {
        self.selected
            .map(|origin| self.board.legal_moves_from(origin))
            .unwrap_or_default()
    }

    pub fn state(&self) -> TerminalState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn move_count(&self) -> u32 {
        self.move_count
    }

    pub fn pegs_remaining(&self) -> PegCount {
        self.board.count_pegs()
    }

    /// Whole seconds between the first move and the end of the game, or `now`
    /// while it is still running.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u32 {
        if let Some(started_at) = self.started_at {
            (self.ended_at.unwrap_or(now) - started_at)
                .num_seconds()
                .clamp(0, u32::MAX.into()) as u32
        } else {
            0
        }
    }

    /// Handles a click on `pos`: select a peg, jump the selected peg onto
    /// `pos`, or clear the selection.
    pub fn click(&mut self, pos: Position, now: DateTime<Utc>) -> Result<ClickOutcome> {
        if self.is_finished() {
            return Ok(ClickOutcome::Ignored);
        }

        if self.board.classify_cell(pos)?.is_peg() {
            self.selected = Some(pos);
            return Ok(ClickOutcome::Selected {
                origin: pos,
                moves: self.board.legal_moves_from(pos),
            });
        }

        let chosen = self
            .selected
            .and_then(|origin| self.board.move_between(origin, pos));
        self.selected = None;

        match chosen {
            Some(mv) => {
                let state = self.play(mv, now)?;
                Ok(ClickOutcome::Moved { mv, state })
            }
            None => Ok(ClickOutcome::Deselected),
        }
    }

    /// Plays `mv` directly, bypassing selection.
    pub fn play(&mut self, mv: Move, now: DateTime<Utc>) -> Result<TerminalState> {
        if self.is_finished() {
            return Err(GameError::AlreadyEnded);
        }

        self.board = self.board.apply_move(mv)?;
        self.selected = None;
        self.move_count += 1;
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }

        self.state = self.board.evaluate_terminal();
        if self.state.is_finished() {
            self.ended_at = Some(now);
            log::debug!(
                "Game ended {:?} after {} moves with {} pegs",
                self.state,
                self.move_count,
                self.board.count_pegs()
            );
        }
        Ok(self.state)
    }

    /// The finished game's result, `Some` on the first call after the game
    /// ended and `None` otherwise.
    pub fn take_result(&mut self, now: DateTime<Utc>) -> Option<GameResult> {
        if !self.is_finished() || self.result_taken {
            return None;
        }

        self.result_taken = true;
        Some(GameResult {
            state: self.state,
            elapsed_secs: self.elapsed_secs(now),
            pegs_remaining: self.board.count_pegs(),
            move_count: self.move_count,
        })
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
