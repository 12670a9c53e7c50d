//! Immutable match records: Line -> Chain -> Move.
//!
//! These are pure value records built while a move plays out and consumed
//! for scoring and statistics. Once built they are never mutated.

use crate::tile::{TileColor, TileKind};

/// Context a set of tiles was consumed in; selects the per-tile base score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Horizontal,
    Vertical,
    Bomb,
    Rocket,
    Star,
}

/// Snapshot of one tile at the moment it matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileSnapshot {
    pub index: usize,
    pub color: TileColor,
    pub kind: TileKind,
}

/// One straight run of matched tiles (or one item-effect wave).
#[derive(Debug, Clone)]
pub struct LineRecord {
    pub line_type: LineType,
    pub tiles: Vec<TileSnapshot>,
}

impl LineRecord {
    pub fn builder(line_type: LineType) -> LineBuilder {
        LineBuilder {
            line_type,
            tiles: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

#[derive(Debug)]
pub struct LineBuilder {
    line_type: LineType,
    tiles: Vec<TileSnapshot>,
}

impl LineBuilder {
    pub fn push(&mut self, snapshot: TileSnapshot) -> &mut Self {
        self.tiles.push(snapshot);
        self
    }

    pub fn build(self) -> LineRecord {
        LineRecord {
            line_type: self.line_type,
            tiles: self.tiles,
        }
    }
}

/// All lines found in one simultaneous scan (one cascade step).
#[derive(Debug, Clone)]
pub struct ChainRecord {
    pub cascade: u32,
    pub lines: Vec<LineRecord>,
}

impl ChainRecord {
    pub fn builder(cascade: u32) -> ChainBuilder {
        ChainBuilder {
            cascade,
            lines: Vec::new(),
        }
    }

    pub fn tile_count(&self) -> usize {
        self.lines.iter().map(LineRecord::len).sum()
    }
}

#[derive(Debug)]
pub struct ChainBuilder {
    cascade: u32,
    lines: Vec<LineRecord>,
}

impl ChainBuilder {
    pub fn push(&mut self, line: LineRecord) -> &mut Self {
        self.lines.push(line);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn build(self) -> ChainRecord {
        ChainRecord {
            cascade: self.cascade,
            lines: self.lines,
        }
    }
}

/// The full ordered sequence of chains one player action produced, from
/// piece commit through to board quiescence.
#[derive(Debug, Clone, Default)]
pub struct MoveRecord {
    pub chains: Vec<ChainRecord>,
}

impl MoveRecord {
    pub fn builder() -> MoveBuilder {
        MoveBuilder { chains: Vec::new() }
    }

    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    pub fn tile_count(&self) -> usize {
        self.chains.iter().map(ChainRecord::tile_count).sum()
    }
}

#[derive(Debug, Default)]
pub struct MoveBuilder {
    chains: Vec<ChainRecord>,
}

impl MoveBuilder {
    pub fn push(&mut self, chain: ChainRecord) -> &mut Self {
        self.chains.push(chain);
        self
    }

    pub fn build(self) -> MoveRecord {
        MoveRecord {
            chains: self.chains,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileColor;

    fn snap(index: usize) -> TileSnapshot {
        TileSnapshot {
            index,
            color: TileColor::Blue,
            kind: TileKind::Normal,
        }
    }

    #[test]
    fn builders_nest_into_move_record() {
        let mut line = LineRecord::builder(LineType::Horizontal);
        line.push(snap(0)).push(snap(1)).push(snap(2));
        let mut chain = ChainRecord::builder(1);
        chain.push(line.build());
        let mut mv = MoveRecord::builder();
        mv.push(chain.build());
        let record = mv.build();
        assert_eq!(record.chain_count(), 1);
        assert_eq!(record.tile_count(), 3);
        assert_eq!(record.chains[0].cascade, 1);
    }
}
