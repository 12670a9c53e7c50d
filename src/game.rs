//! Game state: board, the three managers, piece, move timer, events.
//!
//! One `tick` per logic frame advances every state machine a single step.
//! All waiting is cooperative: animation completion is polled, and control
//! returns to the player only when the board is quiescent (no matches, no
//! refactor, no drop in flight).

use crate::board::Board;
use crate::chain::MoveRecord;
use crate::dropper::{DropOutcome, Lcg, TileDropper};
use crate::events::{GameEvent, SoundCue};
use crate::piece::{Piece, PieceShape};
use crate::refactor::{GravityRefactorer, RefactorSpeed};
use crate::remover::TileRemover;
use crate::score::ScoreBoard;
use crate::theme::Theme;
use crate::tile::{Gravity, TileColor, TileKind};
use ratatui::style::Color;

/// Floating "+N" indicator over the board.
#[derive(Debug, Clone)]
pub struct ScorePopup {
    pub col: usize,
    pub row: usize,
    pub amount: u32,
    pub cascade: u32,
    pub age_ms: u32,
    pub color: Color,
}

#[derive(Debug)]
pub struct Game {
    pub theme: Theme,
    pub board: Board,
    refactorer: GravityRefactorer,
    dropper: TileDropper,
    remover: TileRemover,
    pub scorer: ScoreBoard,
    pub gravity: Gravity,
    pub piece: Option<Piece>,
    pub next_shapes: Vec<PieceShape>,
    rng: Lcg,
    /// Move-timer ticks remaining; counts down only while the player is in
    /// control.
    pub move_timer_ticks: u32,
    timer_max_ticks: u32,
    pub game_over: bool,
    pub moves_played: u32,
    pub last_move: Option<MoveRecord>,
    pub difficulty: crate::Difficulty,
    pub popups: Vec<ScorePopup>,
    events: Vec<GameEvent>,
    /// A cascade (commit or fill, through quiescence) is running.
    settling: bool,
    /// The running cascade started from a piece commit, so finalisation
    /// owes a MoveCompleted.
    move_committed: bool,
    pending_level_up: bool,
}

impl Game {
    pub fn new(theme: Theme, columns: usize, rows: usize, config: &crate::GameConfig) -> Self {
        let mut rng = Lcg::new(config.seed);
        let dropper_rng = Lcg::new(config.seed.wrapping_mul(747_796_405).wrapping_add(1));
        let mut dropper = TileDropper::new(config.drop, dropper_rng);
        let next_shapes = (0..3)
            .map(|_| PieceShape::ALL[rng.next_range(PieceShape::ALL.len())])
            .collect();
        // Seed the board through the normal drop machinery; the first piece
        // spawns once the fill settles.
        dropper.queue(config.initial_fill);
        Self {
            theme,
            board: Board::new(columns, rows),
            refactorer: GravityRefactorer::new(config.refactor),
            dropper,
            remover: TileRemover::new(),
            scorer: ScoreBoard::new(config.initial_level),
            gravity: Gravity::DOWN_LEFT,
            piece: None,
            next_shapes,
            rng,
            move_timer_ticks: config.move_timer_ticks,
            timer_max_ticks: config.move_timer_ticks,
            game_over: false,
            moves_played: 0,
            last_move: None,
            difficulty: config.difficulty,
            popups: Vec::new(),
            events: Vec::new(),
            settling: true,
            move_committed: false,
            pending_level_up: false,
        }
    }

    /// True when input steers the piece: a piece is in hand and no cascade
    /// phase is running.
    pub fn is_player_turn(&self) -> bool {
        self.piece.is_some() && !self.settling && !self.game_over
    }

    pub fn is_settling(&self) -> bool {
        self.settling
    }

    /// Drain events accumulated since the last call.
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    fn random_piece(&mut self) -> Piece {
        let shape = self.next_shapes.remove(0);
        self.next_shapes
            .push(PieceShape::ALL[self.rng.next_range(PieceShape::ALL.len())]);
        let colors = (0..shape.size())
            .map(|_| TileColor::ALL[self.rng.next_range(TileColor::ALL.len())])
            .collect();
        let col = (self.board.columns() / 2).saturating_sub(1) as i32;
        let row = (self.board.rows() / 2).saturating_sub(1) as i32;
        Piece::new(shape, colors, col, row)
    }

    pub fn move_piece(&mut self, dc: i32, dr: i32) {
        if !self.is_player_turn() {
            return;
        }
        let board = &self.board;
        if let Some(ref mut piece) = self.piece {
            piece.shift(dc, dr, board);
        }
    }

    pub fn rotate_piece(&mut self) {
        if !self.is_player_turn() {
            return;
        }
        let board = &self.board;
        if let Some(ref mut piece) = self.piece {
            piece.rotate(board);
        }
    }

    /// Commit the in-hand piece onto the board. Rejected (returning false,
    /// with no mutation) if any covered cell is occupied, restricted or out
    /// of range.
    pub fn commit_piece(&mut self) -> bool {
        if !self.is_player_turn() {
            return false;
        }
        let Some(piece) = self.piece.take() else {
            return false;
        };
        if !piece.can_commit(&self.board) {
            self.piece = Some(piece);
            return false;
        }
        let size = piece.size() as u32;
        for ((c, r), &color) in piece.cell_positions().into_iter().zip(piece.colors.iter()) {
            let index = self.board.index(c as usize, r as usize);
            self.board.create_tile(index, color, TileKind::Normal);
        }
        self.remover.begin_move();
        self.dropper
            .update_drop_amount(size, &self.board, self.scorer.level);
        self.refactorer.start_refactor(RefactorSpeed::Drop);
        self.settling = true;
        self.move_committed = true;
        self.moves_played += 1;
        self.events.push(GameEvent::Cue(SoundCue::PieceCommit));
        true
    }

    /// One logic tick: advance animations, step each state machine once,
    /// then the move timer.
    pub fn tick(&mut self) {
        if self.game_over {
            return;
        }
        self.board.tick_animations();
        self.refactorer.tick(&mut self.board, self.gravity);

        let mut step_events = Vec::new();
        let settled = self.remover.tick(
            &mut self.board,
            &mut self.refactorer,
            &self.dropper,
            &mut self.gravity,
            &mut self.scorer,
            &mut step_events,
        );
        for event in &step_events {
            match event {
                GameEvent::ScoreChanged { delta, cascade, at } => {
                    self.popups.push(ScorePopup {
                        col: at.0,
                        row: at.1,
                        amount: *delta,
                        cascade: *cascade,
                        age_ms: 0,
                        color: self.theme.title,
                    });
                }
                GameEvent::LevelUp { .. } => self.pending_level_up = true,
                _ => {}
            }
        }
        self.events.extend(step_events);

        if settled && self.settling {
            self.finalize_move();
            // The timer starts counting on the next tick, not on the one
            // that handed control back.
            return;
        }

        if self.settling
            && self.remover.is_idle()
            && !self.refactorer.is_refactoring()
            && self.dropper.is_dropping()
        {
            match self.dropper.update_logic(&mut self.board, self.gravity) {
                DropOutcome::Spawned => {
                    self.events.push(GameEvent::Cue(SoundCue::TileDrop));
                }
                DropOutcome::BatchLanded => {
                    self.refactorer.start_refactor(RefactorSpeed::Drop);
                }
                DropOutcome::GameOver => {
                    self.game_over = true;
                    self.events.push(GameEvent::GameOver);
                }
                DropOutcome::Idle | DropOutcome::Waiting => {}
            }
        }

        if self.is_player_turn() {
            self.move_timer_ticks = self.move_timer_ticks.saturating_sub(1);
            if self.move_timer_ticks == 0 {
                // Expiry force-commits when the placement is legal;
                // otherwise the timer refills and the player keeps steering.
                if !self.commit_piece() {
                    self.move_timer_ticks = self.timer_max_ticks;
                }
            }
        }
    }

    /// The board just reached quiescence. Run a pending level-up clear
    /// first; otherwise close out the move and hand control back.
    fn finalize_move(&mut self) {
        if self.pending_level_up {
            self.pending_level_up = false;
            self.remover.start_level_up_clear(&self.board, self.gravity);
            if !self.remover.is_idle() {
                // Still settling; finalisation re-runs after the clear.
                return;
            }
        }
        if self.move_committed {
            let record = self.remover.take_move_record();
            self.events.push(GameEvent::MoveCompleted {
                record: record.clone(),
            });
            self.last_move = Some(record);
        }
        self.move_committed = false;
        self.settling = false;
        self.move_timer_ticks = self.timer_max_ticks;
        if self.piece.is_none() {
            self.piece = Some(self.random_piece());
        }
    }

    pub fn tick_popups(&mut self, delta_ms: u32) {
        self.popups.retain_mut(|p| {
            let old_steps = p.age_ms / 150;
            p.age_ms += delta_ms;
            let new_steps = p.age_ms / 150;
            if new_steps > old_steps && p.row > 0 {
                p.row -= 1; // float up
            }
            p.age_ms < 1500
        });
    }

    /// Colour a piece cell renders with.
    pub fn piece_color(&self, color: TileColor) -> Color {
        self.theme.tile_color(color.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropper::DropConfig;
    use crate::refactor::RefactorSpeeds;

    fn config() -> crate::GameConfig {
        crate::GameConfig {
            initial_level: 1,
            initial_fill: 6,
            move_timer_ticks: 600,
            seed: 0xBEEF,
            refactor: RefactorSpeeds::default(),
            drop: DropConfig::default(),
            difficulty: crate::Difficulty::Easy,
        }
    }

    fn settled_game() -> Game {
        let mut game = Game::new(Theme::default(), 8, 10, &config());
        for _ in 0..5_000 {
            game.tick();
            if game.is_player_turn() {
                return game;
            }
        }
        panic!("initial fill never settled");
    }

    #[test]
    fn initial_fill_settles_and_hands_out_a_piece() {
        let mut game = settled_game();
        assert!(game.piece.is_some());
        assert_eq!(game.board.occupied_count(), 6);
        // The fill is not a move.
        assert!(
            !game
                .take_events()
                .iter()
                .any(|e| matches!(e, GameEvent::MoveCompleted { .. }))
        );
    }

    #[test]
    fn commit_runs_to_quiescence_and_spawns_next_piece() {
        let mut game = settled_game();
        game.take_events();
        let before = game.moves_played;
        assert!(game.commit_piece());
        assert!(!game.is_player_turn());
        for _ in 0..10_000 {
            game.tick();
            if game.is_player_turn() {
                break;
            }
        }
        assert!(game.is_player_turn(), "move never settled");
        assert_eq!(game.moves_played, before + 1);
        assert!(
            game.take_events()
                .iter()
                .any(|e| matches!(e, GameEvent::MoveCompleted { .. }))
        );
        assert_eq!(game.move_timer_ticks, 600);
        assert!(game.last_move.is_some());
    }

    #[test]
    fn timer_is_full_on_the_tick_control_returns() {
        let mut game = settled_game();
        assert_eq!(game.move_timer_ticks, 600);
        game.tick();
        assert_eq!(game.move_timer_ticks, 599);
    }

    #[test]
    fn input_is_ignored_while_settling() {
        let mut game = settled_game();
        assert!(game.commit_piece());
        assert!(game.piece.is_none());
        game.move_piece(1, 0);
        game.rotate_piece();
        assert!(!game.commit_piece());
    }

    #[test]
    fn timer_expiry_commits_the_piece() {
        let mut game = settled_game();
        game.move_timer_ticks = 1;
        let before = game.moves_played;
        game.tick();
        assert_eq!(game.moves_played, before + 1);
        assert!(game.is_settling());
    }
}
