//! Cooperative per-tick animations and animation batches.
//!
//! Nothing here blocks: every animation is advanced once per logic tick and
//! polled for completion. A `Batch` groups the animations issued in one
//! phase (one refactor shift, one removal wave, one drop) so the state
//! machines can ask a single "is everything finished" question.

use crate::board::Board;

/// One tile animation. Movement mutates the tile's fractional cell
/// position; fades and zooms only count ticks (the renderer reads
/// `progress` for the visual).
#[derive(Debug, Clone)]
pub enum Animation {
    /// Straight-line move to a target cell at `speed` cells per tick.
    Move { to_x: f32, to_y: f32, speed: f32 },
    /// Removal fade, fixed duration.
    Fade { ticks_left: u16, ticks_total: u16 },
    /// Drop-in reveal, fixed duration.
    Zoom { ticks_left: u16, ticks_total: u16 },
}

impl Animation {
    pub fn fade(ticks: u16) -> Self {
        Self::Fade {
            ticks_left: ticks,
            ticks_total: ticks,
        }
    }

    pub fn zoom(ticks: u16) -> Self {
        Self::Zoom {
            ticks_left: ticks,
            ticks_total: ticks,
        }
    }

    /// Advance one tick, mutating the owning tile's position for moves.
    /// Returns true when the animation has finished.
    pub fn tick(&mut self, x: &mut f32, y: &mut f32) -> bool {
        match self {
            Self::Move { to_x, to_y, speed } => {
                let dx = *to_x - *x;
                let dy = *to_y - *y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist <= *speed {
                    *x = *to_x;
                    *y = *to_y;
                    true
                } else {
                    *x += dx / dist * *speed;
                    *y += dy / dist * *speed;
                    false
                }
            }
            Self::Fade { ticks_left, .. } | Self::Zoom { ticks_left, .. } => {
                *ticks_left = ticks_left.saturating_sub(1);
                *ticks_left == 0
            }
        }
    }

    /// 0.0 at start, 1.0 at completion. Used by the renderer only.
    pub fn progress(&self) -> f32 {
        match self {
            Self::Move { .. } => 0.0,
            Self::Fade {
                ticks_left,
                ticks_total,
            }
            | Self::Zoom {
                ticks_left,
                ticks_total,
            } => {
                if *ticks_total == 0 {
                    1.0
                } else {
                    1.0 - f32::from(*ticks_left) / f32::from(*ticks_total)
                }
            }
        }
    }
}

/// The set of grid indices animated in one phase. Indices are valid from
/// when the batch is issued until the next `Board::synchronize`, which is
/// only ever called after `all_finished` reports true.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    indices: Vec<usize>,
}

impl Batch {
    pub fn push(&mut self, index: usize) {
        self.indices.push(index);
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn clear(&mut self) {
        self.indices.clear();
    }

    /// All-of aggregation: every tile in the batch must have finished (or
    /// been removed) before the phase may advance. A single straggler holds
    /// the whole phase.
    pub fn all_finished(&self, board: &Board) -> bool {
        self.indices
            .iter()
            .all(|&i| board.tile(i).is_none_or(|t| !t.is_animating()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_animation_reaches_target_and_finishes() {
        let mut anim = Animation::Move {
            to_x: 0.0,
            to_y: 4.0,
            speed: 1.5,
        };
        let (mut x, mut y) = (0.0f32, 0.0f32);
        let mut ticks = 0;
        while !anim.tick(&mut x, &mut y) {
            ticks += 1;
            assert!(ticks < 100, "move animation did not terminate");
        }
        assert_eq!((x, y), (0.0, 4.0));
        assert_eq!(ticks, 2); // 1.5 + 1.5 + final snap
    }

    #[test]
    fn fade_progress_runs_zero_to_one() {
        let mut anim = Animation::fade(4);
        assert_eq!(anim.progress(), 0.0);
        let (mut x, mut y) = (0.0, 0.0);
        assert!(!anim.tick(&mut x, &mut y));
        assert!(anim.progress() > 0.0 && anim.progress() < 1.0);
        assert!(!anim.tick(&mut x, &mut y));
        assert!(!anim.tick(&mut x, &mut y));
        assert!(anim.tick(&mut x, &mut y));
        assert_eq!(anim.progress(), 1.0);
    }
}
