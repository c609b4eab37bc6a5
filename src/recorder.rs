use crate::components::{Dir, Pos};
use crate::maze::Maze;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Accepted(Pos),
    /// Wall or out of bounds. Routine, not an error.
    Rejected,
}

/// Append-only log of every tile the player has stepped onto during a run.
#[derive(Debug, Clone, Default)]
pub struct MoveRecorder {
    history: Vec<Pos>,
}

impl MoveRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Steps from `current` toward `dir` if the target is an open tile, recording it.
    pub fn try_move(&mut self, maze: &Maze, current: Pos, dir: Dir) -> MoveOutcome {
        match current.step(dir) {
            Some(next) if maze.is_open(next) => {
                self.history.push(next);
                MoveOutcome::Accepted(next)
            }
            _ => MoveOutcome::Rejected,
        }
    }

    pub fn history(&self) -> &[Pos] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Maze {
        Maze::from_ascii(&["#####", "#...#", "#.###", "#####"]).unwrap()
    }

    #[test]
    fn accepted_moves_are_appended_in_order() {
        let maze = corridor();
        let mut rec = MoveRecorder::new();
        let mut at = Pos::new(1, 1);
        for dir in [Dir::Right, Dir::Right, Dir::Left, Dir::Left, Dir::Down] {
            match rec.try_move(&maze, at, dir) {
                MoveOutcome::Accepted(next) => at = next,
                MoveOutcome::Rejected => panic!("{dir:?} from {at:?} should be open"),
            }
        }
        assert_eq!(
            rec.history(),
            &[
                Pos::new(2, 1),
                Pos::new(3, 1),
                Pos::new(2, 1),
                Pos::new(1, 1),
                Pos::new(1, 2)
            ]
        );
    }

    #[test]
    fn rejected_moves_leave_history_untouched() {
        let maze = corridor();
        let mut rec = MoveRecorder::new();
        let at = Pos::new(1, 1);
        for _ in 0..10 {
            assert_eq!(rec.try_move(&maze, at, Dir::Up), MoveOutcome::Rejected);
            assert_eq!(rec.try_move(&maze, at, Dir::Left), MoveOutcome::Rejected);
        }
        assert!(rec.is_empty());
    }

    #[test]
    fn edge_of_grid_is_rejected_without_panicking() {
        let maze = Maze::from_ascii(&["...", "...", "..."]).unwrap();
        let mut rec = MoveRecorder::new();
        assert_eq!(rec.try_move(&maze, Pos::new(0, 0), Dir::Up), MoveOutcome::Rejected);
        assert_eq!(rec.try_move(&maze, Pos::new(2, 2), Dir::Right), MoveOutcome::Rejected);
        assert_eq!(rec.len(), 0);
    }
}
