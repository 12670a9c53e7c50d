//! App: terminal init, main loop, tick and key handling.

use crate::game::Game;
use crate::events::GameEvent;
use crate::input::{key_to_action, Action};
use crate::theme::Theme;
use crate::{Args, GameConfig};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tachyonfx::Effect;

/// DAS (Delayed Auto-Shift): delay before movement starts repeating when you hold a key.
const REPEAT_DELAY_MS: u64 = 170;
/// ARR (Auto-Repeat Rate): time between repeated moves while holding. 50 ms ≈ 20 moves/sec.
const REPEAT_INTERVAL_MS: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Menu,
    Playing,
    GameOver,
    QuitMenu,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuitOption {
    Resume,
    MainMenu,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOverReason {
    BoardFull,
    TimeUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTab {
    Difficulty,
    Mode,
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuState {
    pub current_tab: MenuTab,
    pub selected_difficulty: crate::Difficulty,
    pub selected_mode: crate::GameMode,
    pub animation_start: Instant,
}

impl Default for MenuState {
    fn default() -> Self {
        Self {
            current_tab: MenuTab::Difficulty,
            selected_difficulty: crate::Difficulty::Easy,
            selected_mode: crate::GameMode::Endless,
            animation_start: Instant::now(),
        }
    }
}

pub struct App {
    args: Args,
    config: GameConfig,
    theme: Theme,
    /// Board size clamped to terminal so board + border fit on screen.
    effective_columns: u16,
    effective_rows: u16,
    game: Game,
    screen: Screen,
    paused: bool,
    game_start: Instant,
    game_over_reason: Option<GameOverReason>,
    last_tick: Instant,
    repeat_state: Option<(Action, Instant)>,
    last_repeat_fire: Option<Instant>,
    /// TachyonFX flash over the board when the level goes up.
    level_up_effect: Option<Effect>,
    level_up_effect_process_time: Option<Instant>,
    menu_state: MenuState,
    quit_selected: QuitOption,
    high_score_endless: u32,
    high_score_timed: u32,
    new_high_score: bool,
}

impl App {
    pub fn new(args: Args, config: GameConfig, theme: Theme) -> Result<Self> {
        let columns = args.columns;
        let rows = args.rows;
        let game = Game::new(theme.clone(), columns as usize, rows as usize, &config);
        let screen = if args.no_menu {
            Screen::Playing
        } else {
            Screen::Menu
        };
        let (high_score_endless, high_score_timed) = crate::highscores::load_high_scores();
        let now = Instant::now();
        Ok(Self {
            args,
            config,
            theme,
            effective_columns: columns,
            effective_rows: rows,
            game,
            screen,
            paused: false,
            game_start: now,
            game_over_reason: None,
            last_tick: now,
            repeat_state: None,
            last_repeat_fire: None,
            level_up_effect: None,
            level_up_effect_process_time: None,
            menu_state: MenuState::default(),
            quit_selected: QuitOption::Resume,
            high_score_endless,
            high_score_timed,
            new_high_score: false,
        })
    }

    fn reset_game(&mut self) {
        self.args.difficulty = self.menu_state.selected_difficulty;
        self.args.mode = self.menu_state.selected_mode;
        self.config = crate::build_config(&self.args);
        self.game = Game::new(
            self.theme.clone(),
            self.effective_columns as usize,
            self.effective_rows as usize,
            &self.config,
        );
        let now = Instant::now();
        self.screen = Screen::Playing;
        self.paused = false;
        self.game_start = now;
        self.game_over_reason = None;
        self.last_tick = now;
        self.repeat_state = None;
        self.last_repeat_fire = None;
        self.level_up_effect = None;
        self.level_up_effect_process_time = None;
        self.new_high_score = false;
    }

    fn apply_action(&mut self, action: Action) {
        match action {
            Action::Quit | Action::Pause | Action::None => {}
            Action::MoveLeft => self.game.move_piece(-1, 0),
            Action::MoveRight => self.game.move_piece(1, 0),
            Action::MoveUp => self.game.move_piece(0, -1),
            Action::MoveDown => self.game.move_piece(0, 1),
            Action::Rotate => self.game.rotate_piece(),
            Action::Commit => {
                self.game.commit_piece();
                self.repeat_state = None;
            }
        }
    }

    fn tick_repeat(&mut self) {
        let now = Instant::now();
        let (action, first) = match self.repeat_state {
            Some(s) => s,
            None => return,
        };
        if !matches!(
            action,
            Action::MoveLeft | Action::MoveRight | Action::MoveUp | Action::MoveDown
        ) {
            return;
        }
        if first.elapsed() < Duration::from_millis(REPEAT_DELAY_MS) {
            return;
        }
        let next =
            self.last_repeat_fire.unwrap_or(first) + Duration::from_millis(REPEAT_INTERVAL_MS);
        if now >= next {
            self.apply_action(action);
            self.last_repeat_fire = Some(now);
        }
    }

    fn best_for_mode(&self) -> u32 {
        match self.args.mode {
            crate::GameMode::Endless => self.high_score_endless,
            crate::GameMode::Timed => self.high_score_timed,
        }
    }

    fn record_score(&mut self) {
        let score = self.game.scorer.score;
        let best = match self.args.mode {
            crate::GameMode::Endless => &mut self.high_score_endless,
            crate::GameMode::Timed => &mut self.high_score_timed,
        };
        if score > *best {
            *best = score;
            self.new_high_score = true;
        }
        let _ = crate::highscores::save_high_scores(self.high_score_endless, self.high_score_timed);
    }

    fn end_game(&mut self, reason: GameOverReason) {
        self.game_over_reason = Some(reason);
        self.screen = Screen::GameOver;
        self.repeat_state = None;
        self.record_score();
    }

    pub fn run(&mut self) -> Result<()> {
        use crossterm::{
            event::{KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::{disable_raw_mode, enable_raw_mode, size, EnterAlternateScreen, LeaveAlternateScreen},
        };

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen)?;

        // Attempt to enable enhanced keyboard for Release events
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        );

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;

        // Size board to fit terminal; respect --columns/--rows when they fit
        let (term_cols, term_rows) = size()?;
        let (fit_cols, fit_rows) = crate::ui::board_size_for_terminal_clamped(term_cols, term_rows);
        self.effective_columns = self.args.columns.min(fit_cols).max(3);
        self.effective_rows = self.args.rows.min(fit_rows).max(3);
        if self.game.board.columns() != self.effective_columns as usize
            || self.game.board.rows() != self.effective_rows as usize
        {
            self.game = Game::new(
                self.theme.clone(),
                self.effective_columns as usize,
                self.effective_rows as usize,
                &self.config,
            );
        }

        let result = self.run_loop(&mut terminal);

        // Restore
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
        execute!(std::io::stdout(), LeaveAlternateScreen)?;
        disable_raw_mode()?;

        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    self.screen,
                    &self.game,
                    &self.config,
                    self.paused,
                    self.game_over_reason,
                    self.args.mode,
                    self.args.time_limit,
                    self.game_start,
                    f.area(),
                    &mut self.level_up_effect,
                    &mut self.level_up_effect_process_time,
                    &self.menu_state,
                    now,
                    if self.screen == Screen::QuitMenu {
                        Some(self.quit_selected)
                    } else {
                        None
                    },
                    (self.high_score_endless, self.high_score_timed),
                    self.new_high_score,
                )
            })?;

            if self.level_up_effect.as_ref().is_some_and(|e| e.done()) {
                self.level_up_effect = None;
                self.level_up_effect_process_time = None;
            }

            let tick_interval = Duration::from_secs_f64(1.0 / self.args.tick_rate.max(1.0));

            // Limit event polling to hit ~60 FPS rendering (16ms)
            let frame_duration = Duration::from_millis(16);
            let loop_elapsed = now.elapsed();
            let timeout = frame_duration.saturating_sub(loop_elapsed);

            self.game.tick_popups(16);

            // Timed mode check
            if self.screen == Screen::Playing
                && self.args.mode == crate::GameMode::Timed
                && now.duration_since(self.game_start).as_secs() >= self.args.time_limit as u64
            {
                self.end_game(GameOverReason::TimeUp);
            }

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    if let Event::Key(key) = event::read()? {
                        let action = key_to_action(key);

                        // Ignore OS repeats; run our own DAS/ARR off Press/Release.
                        if key.kind != KeyEventKind::Press {
                            if key.kind == KeyEventKind::Release
                                && self.repeat_state.map(|(a, _)| a) == Some(action)
                            {
                                self.repeat_state = None;
                                self.last_repeat_fire = None;
                            }
                            continue;
                        }
                        if self.repeat_state.map(|(a, _)| a) == Some(action) {
                            continue;
                        }

                        match self.screen {
                            Screen::Menu => match action {
                                Action::Quit => return Ok(()),
                                Action::MoveLeft => match self.menu_state.current_tab {
                                    MenuTab::Difficulty => {
                                        self.menu_state.selected_difficulty =
                                            match self.menu_state.selected_difficulty {
                                                crate::Difficulty::Easy => crate::Difficulty::Hard,
                                                crate::Difficulty::Medium => crate::Difficulty::Easy,
                                                crate::Difficulty::Hard => crate::Difficulty::Medium,
                                            };
                                    }
                                    MenuTab::Mode => {
                                        self.menu_state.selected_mode =
                                            match self.menu_state.selected_mode {
                                                crate::GameMode::Endless => crate::GameMode::Timed,
                                                crate::GameMode::Timed => crate::GameMode::Endless,
                                            };
                                    }
                                    MenuTab::Start => {}
                                },
                                Action::MoveRight => match self.menu_state.current_tab {
                                    MenuTab::Difficulty => {
                                        self.menu_state.selected_difficulty =
                                            match self.menu_state.selected_difficulty {
                                                crate::Difficulty::Easy => crate::Difficulty::Medium,
                                                crate::Difficulty::Medium => crate::Difficulty::Hard,
                                                crate::Difficulty::Hard => crate::Difficulty::Easy,
                                            };
                                    }
                                    MenuTab::Mode => {
                                        self.menu_state.selected_mode =
                                            match self.menu_state.selected_mode {
                                                crate::GameMode::Endless => crate::GameMode::Timed,
                                                crate::GameMode::Timed => crate::GameMode::Endless,
                                            };
                                    }
                                    MenuTab::Start => {}
                                },
                                Action::MoveDown => {
                                    self.menu_state.current_tab = match self.menu_state.current_tab {
                                        MenuTab::Difficulty => MenuTab::Mode,
                                        MenuTab::Mode => MenuTab::Start,
                                        MenuTab::Start => MenuTab::Difficulty,
                                    };
                                }
                                Action::MoveUp | Action::Rotate => {
                                    self.menu_state.current_tab = match self.menu_state.current_tab {
                                        MenuTab::Difficulty => MenuTab::Start,
                                        MenuTab::Mode => MenuTab::Difficulty,
                                        MenuTab::Start => MenuTab::Mode,
                                    };
                                }
                                Action::Commit => {
                                    if self.menu_state.current_tab == MenuTab::Start {
                                        self.reset_game();
                                    } else {
                                        self.menu_state.current_tab = MenuTab::Start;
                                    }
                                }
                                _ => {}
                            },
                            Screen::Playing => {
                                if self.paused {
                                    if action == Action::Pause {
                                        self.paused = false;
                                    } else if action == Action::Quit {
                                        self.screen = Screen::QuitMenu;
                                        self.quit_selected = QuitOption::Resume;
                                    }
                                } else if action == Action::Pause {
                                    self.paused = true;
                                } else if action == Action::Quit {
                                    self.screen = Screen::QuitMenu;
                                    self.quit_selected = QuitOption::Resume;
                                } else {
                                    self.apply_action(action);
                                    let repeatable = matches!(
                                        action,
                                        Action::MoveLeft
                                            | Action::MoveRight
                                            | Action::MoveUp
                                            | Action::MoveDown
                                    );
                                    if repeatable {
                                        self.repeat_state = Some((action, Instant::now()));
                                        self.last_repeat_fire = None;
                                    }
                                    // A commit takes the piece away; drop held-key state.
                                    if self.game.piece.is_none() {
                                        self.repeat_state = None;
                                    }
                                }
                            }
                            Screen::QuitMenu => match action {
                                Action::MoveDown | Action::MoveRight => {
                                    self.quit_selected = match self.quit_selected {
                                        QuitOption::Resume => QuitOption::MainMenu,
                                        QuitOption::MainMenu => QuitOption::Exit,
                                        QuitOption::Exit => QuitOption::Resume,
                                    };
                                }
                                Action::MoveUp | Action::MoveLeft | Action::Rotate => {
                                    self.quit_selected = match self.quit_selected {
                                        QuitOption::Resume => QuitOption::Exit,
                                        QuitOption::MainMenu => QuitOption::Resume,
                                        QuitOption::Exit => QuitOption::MainMenu,
                                    };
                                }
                                Action::Commit => match self.quit_selected {
                                    QuitOption::Resume => self.screen = Screen::Playing,
                                    QuitOption::MainMenu => self.screen = Screen::Menu,
                                    QuitOption::Exit => return Ok(()),
                                },
                                Action::Pause | Action::Quit => {
                                    self.screen = Screen::Playing;
                                }
                                _ => {}
                            },
                            Screen::GameOver => {
                                if action == Action::Quit {
                                    return Ok(());
                                }
                                if key.code == KeyCode::Char('r') || key.code == KeyCode::Char('R') {
                                    self.menu_state.selected_difficulty = self.args.difficulty;
                                    self.menu_state.selected_mode = self.args.mode;
                                    self.reset_game();
                                }
                            }
                        }
                    }
                }
            }

            if self.screen == Screen::Playing && !self.paused {
                self.tick_repeat();
                if self.last_tick.elapsed() >= tick_interval {
                    self.last_tick = Instant::now();
                    self.game.tick();
                }
                for ev in self.game.take_events() {
                    match ev {
                        GameEvent::GameOver => self.end_game(GameOverReason::BoardFull),
                        GameEvent::LevelUp { .. } => {
                            // Recreated by the draw path over the board rect.
                            self.level_up_effect = None;
                            self.level_up_effect_process_time = Some(Instant::now());
                        }
                        _ => {}
                    }
                }
                // Live best-score readout in the sidebar.
                if self.game.scorer.score > self.best_for_mode() {
                    match self.args.mode {
                        crate::GameMode::Endless => {
                            self.high_score_endless = self.game.scorer.score;
                        }
                        crate::GameMode::Timed => self.high_score_timed = self.game.scorer.score,
                    }
                }
            }
        }
    }
}
