//! Scoring: pure line-score calculation plus level progression.

use crate::chain::{LineType, TileSnapshot};
use crate::tile::TileKind;

/// Base points per tile for a plain horizontal/vertical line.
pub const LINE_BASE: u32 = 50;
/// Base points per tile removed by a bomb blast.
pub const BOMB_BASE: u32 = 100;
/// Base points per tile removed by a rocket.
pub const ROCKET_BASE: u32 = 100;
/// Base points per tile removed by a star burst.
pub const STAR_BASE: u32 = 150;

fn base_for(line_type: LineType) -> u32 {
    match line_type {
        LineType::Horizontal | LineType::Vertical => LINE_BASE,
        LineType::Bomb => BOMB_BASE,
        LineType::Rocket => ROCKET_BASE,
        LineType::Star => STAR_BASE,
    }
}

/// Score for one line (or item-effect wave).
///
/// Up to 4 tiles each tile is worth `base`; every tile past the 4th is
/// worth an escalating `(extra_index + 2) * base`. Multiplier tiles in the
/// set multiply the result by their factor each, bombs by 3/2 each, and
/// the whole thing scales linearly with the cascade count: chains and
/// multiplier tiles compound rather than add.
pub fn calculate_line_score(tiles: &[TileSnapshot], line_type: LineType, cascade: u32) -> u32 {
    let base = base_for(line_type);
    let count = tiles.len() as u32;
    let mut score = if count <= 4 {
        count * base
    } else {
        let mut s = 4 * base;
        for extra in 0..count - 4 {
            s += (extra + 2) * base;
        }
        s
    };
    for tile in tiles {
        match tile.kind {
            TileKind::Multiplier(factor) => score *= factor.value(),
            TileKind::Bomb => score = score * 3 / 2,
            _ => {}
        }
    }
    score * cascade
}

/// Running score, level and line totals for one game.
#[derive(Debug, Clone)]
pub struct ScoreBoard {
    pub score: u32,
    pub level: u32,
    pub lines_matched: u32,
    next_level_at: u32,
}

impl ScoreBoard {
    pub fn new(initial_level: u32) -> Self {
        let level = initial_level.max(1);
        Self {
            score: 0,
            level,
            lines_matched: 0,
            next_level_at: Self::level_step(level),
        }
    }

    fn level_step(level: u32) -> u32 {
        level * 1200
    }

    /// Add points; returns true if this crossed the level threshold.
    pub fn add(&mut self, delta: u32) -> bool {
        self.score += delta;
        if self.score >= self.next_level_at {
            self.level += 1;
            self.next_level_at += Self::level_step(self.level);
            true
        } else {
            false
        }
    }

    pub fn add_lines(&mut self, count: u32) {
        self.lines_matched += count;
    }

    /// Progress toward the next level, 0.0..=1.0. Renderer only.
    pub fn level_progress(&self) -> f64 {
        let step = f64::from(Self::level_step(self.level));
        let into = f64::from(self.score) - (f64::from(self.next_level_at) - step);
        (into / step).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{MultiplierFactor, TileColor};

    fn plain(n: usize) -> Vec<TileSnapshot> {
        (0..n)
            .map(|i| TileSnapshot {
                index: i,
                color: TileColor::Blue,
                kind: TileKind::Normal,
            })
            .collect()
    }

    #[test]
    fn four_tile_line_scores_flat() {
        assert_eq!(
            calculate_line_score(&plain(4), LineType::Horizontal, 1),
            4 * LINE_BASE
        );
        assert_eq!(
            calculate_line_score(&plain(3), LineType::Vertical, 1),
            3 * LINE_BASE
        );
    }

    #[test]
    fn extra_tiles_earn_escalating_bonus() {
        // 5 tiles: 4*50 + 2*50 = 300; 6 tiles: 300 + 3*50 = 450.
        assert_eq!(calculate_line_score(&plain(5), LineType::Horizontal, 1), 300);
        assert_eq!(calculate_line_score(&plain(6), LineType::Horizontal, 1), 450);
    }

    #[test]
    fn five_tiles_beat_any_four() {
        let four = calculate_line_score(&plain(4), LineType::Horizontal, 1);
        let five = calculate_line_score(&plain(5), LineType::Horizontal, 1);
        assert!(five > four);
    }

    #[test]
    fn cascade_scales_linearly() {
        let once = calculate_line_score(&plain(4), LineType::Horizontal, 1);
        let twice = calculate_line_score(&plain(4), LineType::Horizontal, 2);
        assert_eq!(twice, once * 2);
    }

    #[test]
    fn multiplier_tiles_compound() {
        let mut tiles = plain(3);
        tiles.push(TileSnapshot {
            index: 3,
            color: TileColor::Blue,
            kind: TileKind::Multiplier(MultiplierFactor::X2),
        });
        // 4 tiles * 50, doubled by the x2 tile.
        assert_eq!(calculate_line_score(&tiles, LineType::Horizontal, 1), 400);
        tiles.push(TileSnapshot {
            index: 4,
            color: TileColor::Blue,
            kind: TileKind::Multiplier(MultiplierFactor::X3),
        });
        // 5 tiles: 300 base, x2 then x3.
        assert_eq!(calculate_line_score(&tiles, LineType::Horizontal, 1), 1800);
    }

    #[test]
    fn bombs_in_line_scale_by_three_halves() {
        let mut tiles = plain(3);
        tiles.push(TileSnapshot {
            index: 3,
            color: TileColor::Blue,
            kind: TileKind::Bomb,
        });
        assert_eq!(calculate_line_score(&tiles, LineType::Horizontal, 1), 300);
    }

    #[test]
    fn score_board_levels_on_threshold() {
        let mut sb = ScoreBoard::new(1);
        assert!(!sb.add(1199));
        assert!(sb.add(1));
        assert_eq!(sb.level, 2);
    }
}
