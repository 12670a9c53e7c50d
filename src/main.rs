//! Wezzletui — Wezzle-style tile-matching puzzle game in the terminal.

mod animation;
mod app;
mod board;
mod chain;
mod dropper;
mod events;
mod game;
mod highscores;
mod input;
mod piece;
mod refactor;
mod remover;
mod score;
mod theme;
mod tile;
mod ui;

use anyhow::Result;
use app::App;
use clap::{Parser, ValueEnum};
use dropper::DropConfig;
use refactor::RefactorSpeeds;

/// Options derived from CLI that affect game behaviour.
#[derive(Debug, Clone)]
pub struct GameConfig {
    pub initial_level: u32,
    /// Tiles seeded onto the board before the first move.
    pub initial_fill: u32,
    /// Move timer, in logic ticks.
    pub move_timer_ticks: u32,
    pub seed: u32,
    pub refactor: RefactorSpeeds,
    pub drop: DropConfig,
    pub difficulty: Difficulty,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_default();
    let config = build_config(&args);
    let mut app = App::new(args, config, theme)?;
    app.run()?;
    Ok(())
}

/// Seed from the CLI, or from the clock when not given.
fn pick_seed(args: &Args) -> u32 {
    args.seed.unwrap_or_else(|| {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.subsec_nanos() ^ d.as_secs() as u32)
            .unwrap_or(0x2F6E_2B1)
    })
}

pub fn build_config(args: &Args) -> GameConfig {
    let timer_secs = args.move_timer.unwrap_or(match args.difficulty {
        Difficulty::Easy => 30,
        Difficulty::Medium => 20,
        Difficulty::Hard => 12,
    });
    let mut drop = DropConfig::default();
    if args.difficulty == Difficulty::Hard {
        drop.minimum_drop += 1;
    }
    GameConfig {
        initial_level: args.initial_level,
        initial_fill: (args.columns as u32 * args.rows as u32) * 2 / 5,
        move_timer_ticks: (timer_secs as f64 * args.tick_rate).max(1.0) as u32,
        seed: pick_seed(args),
        refactor: RefactorSpeeds::default(),
        drop,
        difficulty: args.difficulty,
    }
}

/// Wezzle-style tile-matching puzzle game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "wezzletui",
    version,
    about = "Wezzle-style tile-matching puzzle in the terminal. Place tile pieces, match 3+ of a colour, chain cascades and item tiles for big scores.",
    long_about = "Wezzletui is a terminal puzzle game in the Wezzle/Collapse family.\n\n\
        Steer a small piece of coloured tiles anywhere over the board and commit it onto open \
        cells before the move timer runs out. Tiles fall and pack under gravity; rows or columns \
        of three or more same-coloured tiles are removed, and survivors re-pack, possibly \
        cascading. Bombs, rockets, stars, multipliers and gravity tiles appear as you level up.\n\n\
        CONTROLS (normal):\n  Arrows      Move piece   R          Rotate     Enter/Space  Commit\n  P           Pause        Q / Esc    Quit\n\n\
        CONTROLS (vim):\n  h/j/k/l     Move piece   r or x     Rotate     Enter/Space  Commit\n\n\
        Hold a movement key to keep the piece moving. Use --theme to load a btop-style theme (e.g. onedark.theme)."
)]
pub struct Args {
    /// Game mode: endless (play until the board overflows) or timed (best score in the time limit).
    #[arg(short, long, default_value = "endless")]
    pub mode: GameMode,

    /// Difficulty: easy, medium, hard. Affects the move timer and drop pressure.
    #[arg(short, long, default_value = "easy")]
    pub difficulty: Difficulty,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<std::path::PathBuf>,

    /// Board width in columns.
    #[arg(long, default_value = "8", value_name = "COLS")]
    pub columns: u16,

    /// Board height in rows.
    #[arg(long, default_value = "10", value_name = "ROWS")]
    pub rows: u16,

    /// In mode 'timed': time limit in seconds.
    #[arg(long, default_value = "180", value_name = "SECS")]
    pub time_limit: u32,

    /// Game logic ticks per second (animations, cascade pacing).
    #[arg(long, default_value = "30.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Move timer in seconds (defaults per difficulty).
    #[arg(long, value_name = "SECS")]
    pub move_timer: Option<u32>,

    /// Skip main menu and start game immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Initial level (e.g. for practice). Higher levels drop more tiles per move.
    #[arg(long, default_value = "1", value_name = "N")]
    pub initial_level: u32,

    /// RNG seed for reproducible games.
    #[arg(long, value_name = "N")]
    pub seed: Option<u32>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum GameMode {
    #[default]
    Endless,
    Timed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}
