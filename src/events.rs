//! Value events emitted by the core and drained by the app each frame.
//!
//! The core never reads UI state back; sound cues are fire-and-forget.

use crate::chain::MoveRecord;

/// Sound cues. The terminal front end maps most of these to nothing; the
/// contract is the narrow fire-and-forget interface, not the audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    LineClear,
    BombExplode,
    RocketLaunch,
    StarBurst,
    TileDrop,
    GravityShift,
    PieceCommit,
    LevelUp,
}

#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Points were awarded; `at` is a board cell for the floating popup.
    ScoreChanged {
        delta: u32,
        cascade: u32,
        at: (usize, usize),
    },
    /// Lines consumed in one cascade step.
    LineConsumed { count: u32 },
    /// A full move (commit through quiescence) finished.
    MoveCompleted { record: MoveRecord },
    LevelUp { level: u32 },
    GameOver,
    Cue(SoundCue),
}
