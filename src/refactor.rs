//! Gravity refactorer: the compaction state machine that closes gaps left
//! by removed tiles.
//!
//! One refactor is two sequenced shift phases (vertical then horizontal,
//! per the current gravity), each a batch of per-tile move animations. The
//! board is synchronized exactly once after each phase, only when every
//! animation in the batch has finished, so logical state never interleaves
//! with a half-moved board.

use crate::animation::{Animation, Batch};
use crate::board::Board;
use crate::tile::Gravity;

/// Named speed presets (cells per tick). Which preset a refactor runs at
/// depends on what triggered it: normal cascades, piece/tile drops, or a
/// gravity-item shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefactorSpeed {
    Normal,
    Drop,
    Shift,
}

/// Preset values, injected from config.
#[derive(Debug, Clone, Copy)]
pub struct RefactorSpeeds {
    pub normal: f32,
    pub drop: f32,
    pub shift: f32,
}

impl Default for RefactorSpeeds {
    fn default() -> Self {
        Self {
            normal: 0.4,
            drop: 0.55,
            shift: 0.8,
        }
    }
}

impl RefactorSpeeds {
    fn cells_per_tick(&self, speed: RefactorSpeed) -> f32 {
        match speed {
            RefactorSpeed::Normal => self.normal,
            RefactorSpeed::Drop => self.drop,
            RefactorSpeed::Shift => self.shift,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefactorState {
    Idle,
    ActivatePending,
    VerticalShift,
    HorizontalShift,
    /// Held for exactly one tick so dependents can observe the completion
    /// edge, then back to Idle.
    Finished,
}

#[derive(Debug)]
pub struct GravityRefactorer {
    state: RefactorState,
    speed: RefactorSpeed,
    speeds: RefactorSpeeds,
    batch: Batch,
}

impl GravityRefactorer {
    pub fn new(speeds: RefactorSpeeds) -> Self {
        Self {
            state: RefactorState::Idle,
            speed: RefactorSpeed::Normal,
            speeds,
            batch: Batch::default(),
        }
    }

    /// Arm a refactor; the first shift starts on the next logic tick.
    pub fn start_refactor(&mut self, speed: RefactorSpeed) {
        assert!(
            matches!(self.state, RefactorState::Idle | RefactorState::Finished),
            "start_refactor while a refactor is in progress"
        );
        self.speed = speed;
        self.state = RefactorState::ActivatePending;
    }

    /// True while any phase is active (including the finished edge tick).
    pub fn is_refactoring(&self) -> bool {
        self.state != RefactorState::Idle
    }

    /// Edge-triggered: true only during the single tick after the
    /// secondary shift completed. Poll every tick or miss it.
    pub fn is_finished(&self) -> bool {
        self.state == RefactorState::Finished
    }

    pub fn reset(&mut self) {
        self.state = RefactorState::Idle;
        self.batch.clear();
    }

    fn issue_vertical(&mut self, board: &mut Board, gravity: Gravity) {
        let speed = self.speeds.cells_per_tick(self.speed);
        self.batch.clear();
        for (index, target_row) in board.vertical_moves(gravity) {
            let to_x = board.col_of(index) as f32;
            let tile = board.tile_mut(index).expect("vertical move on empty cell");
            tile.start(Animation::Move {
                to_x,
                to_y: target_row as f32,
                speed,
            });
            self.batch.push(index);
        }
    }

    fn issue_horizontal(&mut self, board: &mut Board, gravity: Gravity) {
        let speed = self.speeds.cells_per_tick(self.speed);
        self.batch.clear();
        for (index, target_col) in board.horizontal_moves(gravity) {
            let to_y = board.row_of(index) as f32;
            let tile = board.tile_mut(index).expect("horizontal move on empty cell");
            tile.start(Animation::Move {
                to_x: target_col as f32,
                to_y,
                speed,
            });
            self.batch.push(index);
        }
    }

    /// One state transition per tick, at most.
    pub fn tick(&mut self, board: &mut Board, gravity: Gravity) {
        match self.state {
            RefactorState::Idle => {}
            RefactorState::ActivatePending => {
                self.issue_vertical(board, gravity);
                self.state = RefactorState::VerticalShift;
            }
            RefactorState::VerticalShift => {
                if self.batch.all_finished(board) {
                    board.synchronize();
                    self.issue_horizontal(board, gravity);
                    self.state = RefactorState::HorizontalShift;
                }
            }
            RefactorState::HorizontalShift => {
                if self.batch.all_finished(board) {
                    board.synchronize();
                    self.batch.clear();
                    self.state = RefactorState::Finished;
                }
            }
            RefactorState::Finished => {
                self.state = RefactorState::Idle;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{TileColor, TileKind};

    fn run_to_finish(r: &mut GravityRefactorer, board: &mut Board, gravity: Gravity) -> u32 {
        let mut ticks = 0;
        loop {
            board.tick_animations();
            r.tick(board, gravity);
            ticks += 1;
            assert!(ticks < 1000, "refactor did not terminate");
            if r.is_finished() {
                return ticks;
            }
        }
    }

    #[test]
    fn lone_tile_falls_to_the_bottom() {
        let mut board = Board::new(5, 5);
        board.create_tile(board.index(2, 0), TileColor::Blue, TileKind::Normal);
        let mut r = GravityRefactorer::new(RefactorSpeeds::default());
        r.start_refactor(RefactorSpeed::Drop);
        run_to_finish(&mut r, &mut board, Gravity::DOWN_LEFT);
        // Down-left gravity: lands at the bottom, then slides to column 0.
        assert!(board.tile(board.index(0, 4)).is_some());
        assert_eq!(board.occupied_count(), 1);
    }

    #[test]
    fn finished_is_a_single_tick_edge() {
        let mut board = Board::new(4, 4);
        board.create_tile(board.index(1, 0), TileColor::Red, TileKind::Normal);
        let mut r = GravityRefactorer::new(RefactorSpeeds::default());
        r.start_refactor(RefactorSpeed::Normal);
        run_to_finish(&mut r, &mut board, Gravity::DOWN_LEFT);
        assert!(r.is_finished());
        board.tick_animations();
        r.tick(&mut board, Gravity::DOWN_LEFT);
        assert!(!r.is_finished());
        assert!(!r.is_refactoring());
    }

    #[test]
    fn stacked_tiles_keep_their_order() {
        let mut board = Board::new(3, 6);
        board.create_tile(board.index(0, 1), TileColor::Red, TileKind::Normal);
        board.create_tile(board.index(0, 3), TileColor::Blue, TileKind::Normal);
        let mut r = GravityRefactorer::new(RefactorSpeeds::default());
        r.start_refactor(RefactorSpeed::Normal);
        run_to_finish(&mut r, &mut board, Gravity::DOWN_LEFT);
        assert_eq!(board.tile(board.index(0, 5)).unwrap().color, TileColor::Blue);
        assert_eq!(board.tile(board.index(0, 4)).unwrap().color, TileColor::Red);
    }

    #[test]
    #[should_panic(expected = "in progress")]
    fn restart_mid_refactor_is_fatal() {
        let mut board = Board::new(3, 3);
        board.create_tile(board.index(1, 0), TileColor::Red, TileKind::Normal);
        let mut r = GravityRefactorer::new(RefactorSpeeds::default());
        r.start_refactor(RefactorSpeed::Normal);
        r.tick(&mut board, Gravity::DOWN_LEFT);
        r.start_refactor(RefactorSpeed::Normal);
    }
}
