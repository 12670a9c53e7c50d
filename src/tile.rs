//! Tile entities: colour, tile kind (plain + item variants), gravity.

use crate::animation::Animation;

/// Tile colours (index 0..6 maps into theme.tile_color()).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileColor {
    Green,
    Yellow,
    Red,
    Blue,
    Magenta,
    Cyan,
}

impl TileColor {
    pub const ALL: [Self; 6] = [
        Self::Green,
        Self::Yellow,
        Self::Red,
        Self::Blue,
        Self::Magenta,
        Self::Cyan,
    ];

    /// Theme colour index 0..6.
    pub fn index(self) -> u8 {
        match self {
            Self::Green => 0,
            Self::Yellow => 1,
            Self::Red => 2,
            Self::Blue => 3,
            Self::Magenta => 4,
            Self::Cyan => 5,
        }
    }

    pub fn from_index(i: u8) -> Self {
        Self::ALL[(i as usize) % Self::ALL.len()]
    }
}

/// Direction a rocket travels when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RocketDirection {
    Up,
    Down,
    Left,
    Right,
}

impl RocketDirection {
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];
}

/// Score factor carried by a multiplier tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiplierFactor {
    X2,
    X3,
    X4,
}

impl MultiplierFactor {
    pub fn value(self) -> u32 {
        match self {
            Self::X2 => 2,
            Self::X3 => 3,
            Self::X4 => 4,
        }
    }
}

/// Closed set of tile kinds. Item payloads (rocket direction, multiplier
/// factor) live on the variant so dispatch is an exhaustive match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Normal,
    Bomb,
    Rocket(RocketDirection),
    Star,
    Multiplier(MultiplierFactor),
    Gravity,
}

/// Payload-free class of a tile kind, used for scanning and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileClass {
    Normal,
    Bomb,
    Rocket,
    Star,
    Multiplier,
    Gravity,
}

impl TileKind {
    pub fn class(self) -> TileClass {
        match self {
            Self::Normal => TileClass::Normal,
            Self::Bomb => TileClass::Bomb,
            Self::Rocket(_) => TileClass::Rocket,
            Self::Star => TileClass::Star,
            Self::Multiplier(_) => TileClass::Multiplier,
            Self::Gravity => TileClass::Gravity,
        }
    }
}

/// Vertical gravity component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalGravity {
    Up,
    Down,
}

/// Horizontal gravity component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalGravity {
    Left,
    Right,
}

/// Board gravity: one vertical and one horizontal component. Mutated only
/// by a gravity-item effect, which toggles the horizontal component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gravity {
    pub vertical: VerticalGravity,
    pub horizontal: HorizontalGravity,
}

impl Gravity {
    pub const DOWN_LEFT: Self = Self {
        vertical: VerticalGravity::Down,
        horizontal: HorizontalGravity::Left,
    };

    /// Gravity-item effect: left <-> right, vertical component retained.
    pub fn flip_horizontal(&mut self) {
        self.horizontal = match self.horizontal {
            HorizontalGravity::Left => HorizontalGravity::Right,
            HorizontalGravity::Right => HorizontalGravity::Left,
        };
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::DOWN_LEFT
    }
}

/// A tile on the board. Colour and kind are fixed at creation; the position
/// is in fractional cell units and is what animations move. The logical
/// grid slot is re-derived from the position by `Board::synchronize`.
#[derive(Debug, Clone)]
pub struct Tile {
    pub color: TileColor,
    pub kind: TileKind,
    /// Animated position, cell units (x = column, y = row).
    pub x: f32,
    pub y: f32,
    /// In-flight animation; cleared when it finishes.
    pub animation: Option<Animation>,
}

impl Tile {
    pub fn new(color: TileColor, kind: TileKind, col: usize, row: usize) -> Self {
        Self {
            color,
            kind,
            x: col as f32,
            y: row as f32,
            animation: None,
        }
    }

    pub fn start(&mut self, animation: Animation) {
        self.animation = Some(animation);
    }

    /// Advance the in-flight animation one tick; drops it once finished.
    pub fn tick_animation(&mut self) {
        if let Some(ref mut anim) = self.animation {
            let done = anim.tick(&mut self.x, &mut self.y);
            if done {
                self.animation = None;
            }
        }
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_flip_toggles_horizontal_only() {
        let mut g = Gravity::DOWN_LEFT;
        g.flip_horizontal();
        assert_eq!(g.horizontal, HorizontalGravity::Right);
        assert_eq!(g.vertical, VerticalGravity::Down);
        g.flip_horizontal();
        assert_eq!(g, Gravity::DOWN_LEFT);
    }

    #[test]
    fn kind_class_strips_payload() {
        assert_eq!(TileKind::Rocket(RocketDirection::Up).class(), TileClass::Rocket);
        assert_eq!(TileKind::Multiplier(MultiplierFactor::X3).class(), TileClass::Multiplier);
        assert_eq!(TileKind::Normal.class(), TileClass::Normal);
    }
}
