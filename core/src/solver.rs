use alloc::vec::Vec;

use hashbrown::HashSet;

use crate::*;

/// Depth-first search for a sequence of moves leaving a single peg.
///
/// Moves are tried in [`Board::legal_moves`] order. Peg masks that were fully
/// explored without reaching a win are memoized, which keeps the search from
/// the standard start to a few tens of thousands of positions.
pub fn solve(board: &Board) -> Option<Vec<Move>> {
    let mut search = Search::default();
    let mut path = Vec::with_capacity(board.count_pegs().into());
    if search.visit(board, &mut path) {
        log::debug!(
            "Found a {}-move solution after {} positions",
            path.len(),
            search.visited
        );
        Some(path)
    } else {
        log::debug!("No solution after {} positions", search.visited);
        None
    }
}

/// First move of a winning line from `board`, if there is one.
pub fn hint(board: &Board) -> Option<Move> {
    solve(board)?.first().copied()
}

#[derive(Default)]
struct Search {
    dead_ends: HashSet<u64>,
    visited: usize,
}

impl Search {
    fn visit(&mut self, board: &Board, path: &mut Vec<Move>) -> bool {
        self.visited += 1;
        if board.count_pegs() == 1 {
            return true;
        }

        let key = board.peg_mask();
        if self.dead_ends.contains(&key) {
            return false;
        }

        for mv in board.legal_moves() {
            let Ok(next) = board.apply_move(mv) else {
                continue;
            };
            path.push(mv);
            if self.visit(&next, path) {
                return true;
            }
            path.pop();
        }

        self.dead_ends.insert(key);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_the_standard_board() {
        let start = Board::new();
        let solution = solve(&start).unwrap();

        assert_eq!(solution.len(), 31);

        let mut board = start;
        for mv in solution {
            assert!(board.has_any_legal_move());
            board = board.apply_move(mv).unwrap();
        }
        assert_eq!(board.count_pegs(), 1);
        assert_eq!(board.evaluate_terminal(), TerminalState::Won);
    }

    #[test]
    fn solved_board_needs_no_moves() {
        let board = Board::from_pegs(&[Position::CENTER]).unwrap();

        assert_eq!(solve(&board), Some(Vec::new()));
        assert_eq!(hint(&board), None);
    }

    #[test]
    fn stuck_board_has_no_solution() {
        let board = Board::from_pegs(&[Position::new(0, 2), Position::new(6, 4)]).unwrap();

        assert_eq!(solve(&board), None);
        assert_eq!(hint(&board), None);
    }

    #[test]
    fn hint_avoids_dead_ends() {
        // the first move in search order strands two pegs, the second one wins
        let board = Board::from_rows(&[
            "  ...  ",
            "  ...  ",
            "...oo..",
            "..o....",
            ".......",
            "  ...  ",
            "  ...  ",
        ])
        .unwrap();
        assert_eq!(board.legal_moves()[0].destination, Position::new(2, 5));

        let mv = hint(&board).unwrap();
        assert_eq!(mv.destination, Position::new(2, 2));

        let next = board.apply_move(mv).unwrap();
        assert_eq!(solve(&next).map(|moves| moves.len()), Some(1));
    }
}
