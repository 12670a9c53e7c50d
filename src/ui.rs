//! Layout and drawing: menu, board, sidebar, pause, game over, score popups.

use crate::GameMode;
use crate::app::{GameOverReason, MenuState, MenuTab, Screen};
use crate::animation::Animation;
use crate::game::Game;
use crate::piece::PieceShape;
use crate::tile::{HorizontalGravity, MultiplierFactor, RocketDirection, Tile, TileKind};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph, Widget};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each board cell renders as 4x2 terminal cells.
const CELL_WIDTH: u16 = 4;
const CELL_HEIGHT: u16 = 2;

const SIDEBAR_WIDTH: u16 = 24;

/// Duration of the level-up flash (TachyonFX) in ms.
const LEVEL_UP_FLASH_MS: u32 = 600;

/// Board size in terminal cells (border + grid) for given grid dimensions.
fn board_pixel_size(columns: u16, rows: u16) -> (u16, u16) {
    (columns * CELL_WIDTH + 2, rows * CELL_HEIGHT + 2)
}

/// Max board size (columns, rows) that fits in the given terminal size.
pub fn max_board_cells_for_terminal(term_cols: u16, term_rows: u16) -> (u16, u16) {
    let max_w = term_cols.saturating_sub(2).saturating_sub(SIDEBAR_WIDTH);
    let max_h = term_rows.saturating_sub(2);
    (max_w / CELL_WIDTH, max_h / CELL_HEIGHT)
}

pub const MAX_COLUMNS: u16 = 12;
pub const MAX_ROWS: u16 = 14;

/// Board size that fits the terminal: at most MAX, at least 3.
pub fn board_size_for_terminal_clamped(term_cols: u16, term_rows: u16) -> (u16, u16) {
    let (max_c, max_r) = max_board_cells_for_terminal(term_cols, term_rows);
    (max_c.min(MAX_COLUMNS).max(3), max_r.min(MAX_ROWS).max(3))
}

/// High scores per mode: (endless, timed).
pub type HighScores = (u32, u32);

/// Board inner rect (grid only, no border) for given area; matches draw_game layout.
fn board_inner_rect(area: Rect, game: &Game) -> Rect {
    let (pw, ph) = board_pixel_size(game.board.columns() as u16, game.board.rows() as u16);
    let total_w = pw + SIDEBAR_WIDTH;
    let x = area.x + area.width.saturating_sub(total_w) / 2;
    let y = area.y + area.height.saturating_sub(ph) / 2;
    Rect {
        x: x + 1,
        y: y + 1,
        width: (game.board.columns() as u16 * CELL_WIDTH).min(area.width.saturating_sub(2)),
        height: (game.board.rows() as u16 * CELL_HEIGHT).min(area.height.saturating_sub(2)),
    }
}

/// Draw current screen (menu, game, game over), with optional pause overlay
/// and game-over reason. `level_up_process_time` being Some arms the
/// level-up flash; the effect is created lazily over the board rect.
pub fn draw(
    frame: &mut Frame,
    screen: Screen,
    game: &Game,
    config: &crate::GameConfig,
    paused: bool,
    game_over_reason: Option<GameOverReason>,
    mode: GameMode,
    time_limit: u32,
    game_start: Instant,
    area: Rect,
    level_up_effect: &mut Option<Effect>,
    level_up_process_time: &mut Option<Instant>,
    menu_state: &MenuState,
    now: Instant,
    quit_selected: Option<crate::app::QuitOption>,
    high_scores: HighScores,
    new_high_score: bool,
) {
    match screen {
        Screen::Menu => draw_menu(frame, game, menu_state, area, now),
        Screen::Playing => {
            draw_game(
                frame, game, config, area, mode, time_limit, game_start, now, high_scores,
            );
            if paused {
                draw_pause_overlay(frame, game, area);
            }
            if level_up_process_time.is_some() {
                apply_level_up_flash(frame, game, area, level_up_effect, level_up_process_time, now);
            }
        }
        Screen::QuitMenu => {
            draw_game(
                frame, game, config, area, mode, time_limit, game_start, now, high_scores,
            );
            if let Some(opt) = quit_selected {
                draw_quit_menu(frame, game, opt);
            }
        }
        Screen::GameOver => draw_game_over(
            frame,
            game,
            game_over_reason,
            mode,
            time_limit,
            game_start,
            area,
            high_scores,
            new_high_score,
        ),
    }
}

/// Create or advance the level-up flash (TachyonFX: sweep the board from the title colour back to normal).
fn apply_level_up_flash(
    frame: &mut Frame,
    game: &Game,
    area: Rect,
    level_up_effect: &mut Option<Effect>,
    level_up_process_time: &mut Option<Instant>,
    now: Instant,
) {
    let board_rect = board_inner_rect(area, game);
    let delta = level_up_process_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or(std::time::Duration::ZERO);
    let delta_ms = delta.as_millis().min(u32::MAX as u128) as u32;
    *level_up_process_time = Some(now);

    if level_up_effect.is_none() {
        let effect = fx::fade_from(
            game.theme.title,
            game.theme.title,
            (LEVEL_UP_FLASH_MS, Interpolation::Linear),
        )
        .with_area(board_rect);
        *level_up_effect = Some(effect);
    }
    if let Some(effect) = level_up_effect {
        frame.render_effect(effect, board_rect, TfxDuration::from_millis(delta_ms));
    }
}

fn draw_menu(frame: &mut Frame, game: &Game, menu_state: &MenuState, area: Rect, now: Instant) {
    let popup_w = 48u16;
    let popup_h = 20u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };

    let title = Line::from(vec![
        Span::styled(
            " Wezzle ",
            Style::default().fg(Color::Rgb(255, 120, 120)).bold(),
        ),
        Span::styled(" tui ", Style::default().fg(game.theme.main_fg).bold()),
    ]);

    let highlight_style = Style::default()
        .fg(Color::Black)
        .bg(game.theme.tile_color(1))
        .bold();
    let selected_style = Style::default().fg(game.theme.tile_color(1)).bold();
    let normal_style = Style::default().fg(game.theme.main_fg);

    fn tab_style(
        current: bool,
        selected: bool,
        highlight: Style,
        select: Style,
        normal: Style,
    ) -> Style {
        if current {
            highlight
        } else if selected {
            select
        } else {
            normal
        }
    }

    let diff_tab = |d: crate::Difficulty, label: &'static str| {
        Span::styled(
            label,
            tab_style(
                menu_state.current_tab == MenuTab::Difficulty
                    && menu_state.selected_difficulty == d,
                menu_state.selected_difficulty == d,
                highlight_style,
                selected_style,
                normal_style,
            ),
        )
    };
    let mode_tab = |m: crate::GameMode, label: &'static str| {
        Span::styled(
            label,
            tab_style(
                menu_state.current_tab == MenuTab::Mode && menu_state.selected_mode == m,
                menu_state.selected_mode == m,
                highlight_style,
                selected_style,
                normal_style,
            ),
        )
    };

    let start_btn = if menu_state.current_tab == MenuTab::Start {
        Span::styled(" [ START GAME ] ", highlight_style)
    } else {
        Span::styled(" [ START GAME ] ", normal_style)
    };

    let lines = vec![
        Line::from(""),
        title,
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            " ─ DIFFICULTY ─ ",
            Style::default().fg(game.theme.div_line),
        )),
        Line::from(vec![
            diff_tab(crate::Difficulty::Easy, " EASY "),
            Span::from("  "),
            diff_tab(crate::Difficulty::Medium, " MEDIUM "),
            Span::from("  "),
            diff_tab(crate::Difficulty::Hard, " HARD "),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " ─ MODE ─ ",
            Style::default().fg(game.theme.div_line),
        )),
        Line::from(vec![
            mode_tab(crate::GameMode::Endless, " ENDLESS "),
            Span::from("  "),
            mode_tab(crate::GameMode::Timed, " TIMED "),
        ]),
        Line::from(""),
        Line::from(""),
        Line::from(start_btn),
        Line::from(""),
        Line::from(""),
        Line::from(vec![
            Span::styled(" ↕ ", Style::default().fg(game.theme.tile_color(3))),
            Span::from("NAVIGATE   "),
            Span::styled(" ↔ ", Style::default().fg(game.theme.tile_color(3))),
            Span::from("CHANGE   "),
            Span::styled(" ENTER ", Style::default().fg(game.theme.tile_color(3))),
            Span::from("START"),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            " [Q] QUIT ",
            Style::default().fg(Color::Rgb(255, 80, 80)),
        )),
    ];

    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(game.theme.div_line).bg(game.theme.bg)),
    );

    // Startup animation: slide in from bottom
    let elapsed = now.duration_since(menu_state.animation_start).as_millis() as u32;
    let anim_duration = 500u32;
    let t = (elapsed as f32 / anim_duration as f32).min(1.0);
    let offset_t = 1.0 - (1.0 - t).powi(3);
    let anim_y_offset = ((1.0 - offset_t) * 10.0) as u16;
    let mut anim_popup = popup;
    anim_popup.y += anim_y_offset;

    p.render(anim_popup, frame.buffer_mut());
}

fn draw_pause_overlay(frame: &mut Frame, game: &Game, area: Rect) {
    let popup_w = 28u16;
    let popup_h = 5u16;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(popup_w) / 2,
        y: area.y + area.height.saturating_sub(popup_h) / 2,
        width: popup_w.min(area.width),
        height: popup_h.min(area.height),
    };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(Color::Yellow),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " P — Resume    Q — Quit ",
            Style::default().fg(game.theme.main_fg),
        )),
    ];
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(game.theme.div_line).bg(game.theme.bg)),
    );
    p.render(popup, frame.buffer_mut());
}

fn draw_game_over(
    frame: &mut Frame,
    game: &Game,
    reason: Option<GameOverReason>,
    mode: GameMode,
    time_limit: u32,
    game_start: Instant,
    area: Rect,
    high_scores: HighScores,
    new_high_score: bool,
) {
    let (pw, ph) = board_pixel_size(game.board.columns() as u16, game.board.rows() as u16);
    let total_w = pw + SIDEBAR_WIDTH;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(total_w) / 2,
        y: area.y + area.height.saturating_sub(ph) / 2,
        width: total_w.min(area.width),
        height: ph.min(area.height),
    };
    let title = match reason {
        Some(GameOverReason::TimeUp) => " Time's up! ",
        _ => " Game Over ",
    };
    let (best_endless, best_timed) = high_scores;
    let high_score = match mode {
        GameMode::Endless => best_endless,
        GameMode::Timed => best_timed,
    };
    let mut lines: Vec<Line> = vec![
        Line::from(""),
        Line::from(Span::styled(
            title,
            Style::default().fg(Color::White).bg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!(" Score: {} ", game.scorer.score),
            Style::default().fg(game.theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Best: {} ", high_score),
            Style::default().fg(game.theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Lines: {}   Level: {} ", game.scorer.lines_matched, game.scorer.level),
            Style::default().fg(game.theme.main_fg),
        )),
        Line::from(Span::styled(
            format!(" Moves: {} ", game.moves_played),
            Style::default().fg(game.theme.main_fg),
        )),
    ];
    if new_high_score {
        lines.push(Line::from(Span::styled(
            " New record! ",
            Style::default().fg(Color::Yellow).bold(),
        )));
    }
    if reason == Some(GameOverReason::TimeUp) {
        let elapsed = game_start.elapsed().as_secs();
        lines.push(Line::from(Span::styled(
            format!(" Time: {} / {} sec ", elapsed.min(time_limit as u64), time_limit),
            Style::default().fg(game.theme.main_fg),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        " R — Restart    Q — Quit ",
        Style::default().fg(game.theme.main_fg),
    )));
    lines.push(Line::from(""));
    let p = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(game.theme.div_line).bg(game.theme.bg))
            .title(Span::styled(" Wezzletui ", game.theme.title)),
    );
    p.render(popup, frame.buffer_mut());
}

/// Draw game: board + sidebar; use full area and center the board.
fn draw_game(
    frame: &mut Frame,
    game: &Game,
    config: &crate::GameConfig,
    area: Rect,
    mode: GameMode,
    time_limit: u32,
    game_start: Instant,
    now: Instant,
    high_scores: HighScores,
) {
    let (pw, ph) = board_pixel_size(game.board.columns() as u16, game.board.rows() as u16);
    let total_w = pw + SIDEBAR_WIDTH;

    let horiz_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(total_w),
            Constraint::Fill(1),
        ])
        .split(area);

    let vert_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Fill(1),
            Constraint::Length(ph),
            Constraint::Fill(1),
        ])
        .split(horiz_chunks[1]);

    let active_area = vert_chunks[1];

    let (board_area, sidebar_area) = {
        let inner = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(pw), Constraint::Length(SIDEBAR_WIDTH)])
            .split(active_area);
        (inner[0], inner[1])
    };

    draw_board(frame, game, board_area, mode, time_limit, game_start, now);
    draw_sidebar(frame, game, config, sidebar_area, mode, high_scores);
}

/// Item glyph overlaid on the tile cell, if any.
fn item_glyph(kind: TileKind) -> Option<&'static str> {
    match kind {
        TileKind::Normal => None,
        TileKind::Bomb => Some("◉"),
        TileKind::Rocket(RocketDirection::Up) => Some("▲"),
        TileKind::Rocket(RocketDirection::Down) => Some("▼"),
        TileKind::Rocket(RocketDirection::Left) => Some("◀"),
        TileKind::Rocket(RocketDirection::Right) => Some("▶"),
        TileKind::Star => Some("★"),
        TileKind::Multiplier(MultiplierFactor::X2) => Some("x2"),
        TileKind::Multiplier(MultiplierFactor::X3) => Some("x3"),
        TileKind::Multiplier(MultiplierFactor::X4) => Some("x4"),
        TileKind::Gravity => Some("⇄"),
    }
}

/// Tile colour with removal fade / drop-in zoom applied.
fn tile_render_color(game: &Game, tile: &Tile) -> Color {
    let base = game.theme.tile_color(tile.color.index());
    let factor = match &tile.animation {
        Some(a @ Animation::Fade { .. }) => 1.0 - a.progress(),
        Some(a @ Animation::Zoom { .. }) => 0.3 + 0.7 * a.progress(),
        _ => 1.0,
    };
    scale_color(base, factor)
}

fn scale_color(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        _ => (128, 128, 128),
    };
    Color::Rgb(
        (r as f32 * factor).min(255.0) as u8,
        (g as f32 * factor).min(255.0) as u8,
        (b as f32 * factor).min(255.0) as u8,
    )
}

fn draw_board(
    frame: &mut Frame,
    game: &Game,
    area: Rect,
    mode: GameMode,
    time_limit: u32,
    game_start: Instant,
    now: Instant,
) {
    let title = if mode == GameMode::Timed {
        let elapsed = now.duration_since(game_start).as_secs();
        let remaining = (time_limit as u64).saturating_sub(elapsed);
        format!(
            " Wezzletui  Time: {:02}:{:02} ",
            remaining / 60,
            remaining % 60
        )
    } else {
        " Wezzletui ".to_string()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(game.theme.div_line).bg(game.theme.bg))
        .title(Span::styled(title, game.theme.title));
    let inner = block.inner(area);
    block.render(area, frame.buffer_mut());

    // Background grid
    let buf = frame.buffer_mut();
    for y in inner.y..inner.y + inner.height {
        for x in inner.x..inner.x + inner.width {
            buf[(x, y)]
                .set_symbol(" ")
                .set_style(Style::default().bg(game.theme.bg));
        }
    }

    // Tiles at their fractional animated positions.
    for index in 0..game.board.cell_count() {
        let Some(tile) = game.board.tile(index) else {
            continue;
        };
        let color = tile_render_color(game, tile);
        draw_tile_cell(buf, inner, tile.x, tile.y, color, item_glyph(tile.kind), false);
    }

    // The hovering piece, drawn hollow over its cells.
    if game.is_player_turn() {
        if let Some(ref piece) = game.piece {
            for ((c, r), &pc) in piece.cell_positions().into_iter().zip(piece.colors.iter()) {
                let color = game.piece_color(pc);
                draw_tile_cell(buf, inner, c as f32, r as f32, color, None, true);
            }
        }
    }

    // Floating score popups.
    for popup in &game.popups {
        let rx = inner.x + popup.col as u16 * CELL_WIDTH;
        let ry = inner.y + popup.row as u16 * CELL_HEIGHT;
        if rx < inner.x + inner.width && ry < inner.y + inner.height {
            let label = if popup.cascade > 1 {
                format!("+{} (x{})", popup.amount, popup.cascade)
            } else {
                format!("+{}", popup.amount)
            };
            let style = Style::default().fg(popup.color).bg(game.theme.bg).bold();
            frame.buffer_mut().set_string(rx, ry, label, style);
        }
    }
}

/// One tile cell: 4x2 block at a fractional board position. Hollow cells
/// (the hovering piece) render as an outline instead of a fill.
fn draw_tile_cell(
    buf: &mut ratatui::buffer::Buffer,
    inner: Rect,
    x: f32,
    y: f32,
    color: Color,
    glyph: Option<&str>,
    hollow: bool,
) {
    let px = inner.x as i32 + (x * CELL_WIDTH as f32).round() as i32;
    let py = inner.y as i32 + (y * CELL_HEIGHT as f32).round() as i32;
    for dy in 0..CELL_HEIGHT as i32 {
        for dx in 0..CELL_WIDTH as i32 {
            let (bx, by) = (px + dx, py + dy);
            if bx < inner.x as i32
                || by < inner.y as i32
                || bx >= (inner.x + inner.width) as i32
                || by >= (inner.y + inner.height) as i32
            {
                continue;
            }
            let cell = &mut buf[(bx as u16, by as u16)];
            if hollow {
                cell.set_symbol("░").set_style(Style::default().fg(color));
            } else {
                cell.set_symbol(" ").set_style(Style::default().bg(color));
            }
        }
    }
    if let Some(g) = glyph {
        let gx = px + (CELL_WIDTH as i32 - g.chars().count() as i32) / 2;
        let gy = py + (CELL_HEIGHT as i32 - 1) / 2;
        if gx >= inner.x as i32
            && gy >= inner.y as i32
            && gx < (inner.x + inner.width) as i32
            && gy < (inner.y + inner.height) as i32
        {
            buf.set_string(
                gx as u16,
                gy as u16,
                g,
                Style::default().fg(Color::Black).bg(color).bold(),
            );
        }
    }
}

fn sidebar_block_style(game: &Game) -> Style {
    Style::default().fg(game.theme.div_line).bg(game.theme.bg)
}

fn draw_sidebar(
    frame: &mut Frame,
    game: &Game,
    config: &crate::GameConfig,
    area: Rect,
    mode: GameMode,
    high_scores: HighScores,
) {
    let title_style = Style::default().fg(game.theme.title);
    let fg_style = Style::default().fg(game.theme.main_fg);
    let border_style = sidebar_block_style(game);
    let (best_endless, best_timed) = high_scores;
    let best = match mode {
        GameMode::Endless => best_endless,
        GameMode::Timed => best_timed,
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Piece (border + title + preview)
            Constraint::Length(1), // gap
            Constraint::Length(8), // Stats
            Constraint::Length(1), // gap
            Constraint::Length(4), // Move timer
            Constraint::Length(1), // gap
            Constraint::Length(4), // Level progress
        ])
        .split(area);

    // --- Piece (own border): in-hand colours and next shapes ---
    let piece_outer = chunks[0];
    let piece_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let piece_inner = piece_block.inner(piece_outer);
    piece_block.render(piece_outer, frame.buffer_mut());
    let piece_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(3)])
        .split(piece_inner);
    Paragraph::new(Line::from(Span::styled("Piece", title_style)))
        .render(piece_layout[0], frame.buffer_mut());
    draw_piece_preview(frame, game, piece_layout[1]);

    // --- Stats ---
    let stats_outer = chunks[2];
    let stats_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let stats_inner = stats_block.inner(stats_outer);
    stats_block.render(stats_outer, frame.buffer_mut());
    let gravity_arrow = match game.gravity.horizontal {
        HorizontalGravity::Left => "◀ left",
        HorizontalGravity::Right => "right ▶",
    };
    let stats_lines = vec![
        Line::from(vec![
            Span::styled("Score: ", title_style),
            Span::styled(game.scorer.score.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Best: ", title_style),
            Span::styled(best.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Level: ", title_style),
            Span::styled(game.scorer.level.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Lines: ", title_style),
            Span::styled(game.scorer.lines_matched.to_string(), fg_style),
        ]),
        Line::from(vec![
            Span::styled("Gravity: ", title_style),
            Span::styled(gravity_arrow, fg_style),
        ]),
    ];
    Paragraph::new(ratatui::text::Text::from(stats_lines)).render(stats_inner, frame.buffer_mut());

    // --- Move timer ---
    let timer_outer = chunks[4];
    let timer_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let timer_inner = timer_block.inner(timer_outer);
    timer_block.render(timer_outer, frame.buffer_mut());
    let timer_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(timer_inner);
    let label = if game.is_settling() {
        "Timer (cascading)".to_string()
    } else {
        "Timer".to_string()
    };
    Paragraph::new(Line::from(Span::styled(label, title_style)))
        .render(timer_layout[0], frame.buffer_mut());
    let timer_ratio = if config.move_timer_ticks > 0 {
        (game.move_timer_ticks as f64 / config.move_timer_ticks as f64).min(1.0)
    } else {
        0.0
    };
    let bar_color = if timer_ratio > 0.6 {
        Color::Green
    } else if timer_ratio > 0.3 {
        Color::Yellow
    } else {
        Color::Red
    };
    Gauge::default()
        .ratio(timer_ratio)
        .gauge_style(Style::default().fg(bar_color))
        .render(timer_layout[1], frame.buffer_mut());

    // --- Level progress ---
    let level_outer = chunks[6];
    let level_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style);
    let level_inner = level_block.inner(level_outer);
    level_block.render(level_outer, frame.buffer_mut());
    let level_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(level_inner);
    Paragraph::new(Line::from(Span::styled("Next level", title_style)))
        .render(level_layout[0], frame.buffer_mut());
    Gauge::default()
        .ratio(game.scorer.level_progress().clamp(0.0, 1.0))
        .gauge_style(Style::default().fg(game.theme.title))
        .render(level_layout[1], frame.buffer_mut());
}

/// In-hand piece cells plus the upcoming shapes as mini previews.
fn draw_piece_preview(frame: &mut Frame, game: &Game, area: Rect) {
    let buf = frame.buffer_mut();
    if let Some(ref piece) = game.piece {
        let cells = piece.shape.cells(piece.rotation);
        for (&(dc, dr), &color) in cells.iter().zip(piece.colors.iter()) {
            let rx = area.x + (dc as u16) * 2;
            let ry = area.y + dr as u16;
            if rx + 1 < area.x + area.width && ry < area.y + area.height {
                let c = game.piece_color(color);
                buf.set_string(rx, ry, "██", Style::default().fg(c));
            }
        }
    }
    // Upcoming shapes, uncoloured outlines.
    let base_x = area.x + 8;
    for (i, shape) in game.next_shapes.iter().take(3).enumerate() {
        let ox = base_x + i as u16 * 5;
        for &(dc, dr) in shape_cells_upright(*shape) {
            let rx = ox + (dc as u16) * 2;
            let ry = area.y + dr as u16;
            if rx + 1 < area.x + area.width && ry < area.y + area.height {
                buf.set_string(rx, ry, "░░", Style::default().fg(game.theme.inactive_fg));
            }
        }
    }
}

fn shape_cells_upright(shape: PieceShape) -> &'static [(i32, i32)] {
    shape.cells(0)
}

pub fn draw_quit_menu(frame: &mut Frame, game: &Game, selected: crate::app::QuitOption) {
    let area = frame.area();
    let qw = 24;
    let qh = 8;
    let quit_rect = Rect {
        x: area.x + area.width.saturating_sub(qw) / 2,
        y: area.y + area.height.saturating_sub(qh) / 2,
        width: qw,
        height: qh,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(game.theme.title))
        .title(" Quit? ");

    for y in quit_rect.y..quit_rect.y + quit_rect.height {
        for x in quit_rect.x..quit_rect.x + quit_rect.width {
            frame.buffer_mut()[(x, y)].set_style(Style::default().bg(game.theme.bg));
        }
    }

    let inner = block.inner(quit_rect);
    block.render(quit_rect, frame.buffer_mut());

    let options = [
        (crate::app::QuitOption::Resume, " Resume "),
        (crate::app::QuitOption::MainMenu, " Main Menu "),
        (crate::app::QuitOption::Exit, " Exit "),
    ];

    for (i, (opt, label)) in options.iter().enumerate() {
        let style = if *opt == selected {
            Style::default()
                .fg(game.theme.bg)
                .bg(game.theme.title)
                .bold()
        } else {
            Style::default().fg(game.theme.title)
        };
        let rx = inner.x + (inner.width.saturating_sub(label.len() as u16)) / 2;
        let ry = inner.y + 1 + i as u16 * 2;
        frame.buffer_mut().set_string(rx, ry, label, style);
    }
}
