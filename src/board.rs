//! Board: flat tile grid, match scanning, synchronize, item geometry.
//!
//! The grid is the single source of truth for tile state. Index layout is
//! `row * columns + col`, row 0 at the top. Other components never write
//! cells directly; they go through create/remove/synchronize here.

use crate::chain::{LineRecord, LineType, TileSnapshot};
use crate::tile::{
    Gravity, HorizontalGravity, RocketDirection, Tile, TileClass, TileColor, TileKind,
    VerticalGravity,
};
use std::collections::{HashMap, HashSet};

/// Minimum run length that counts as a match.
pub const MINIMUM_MATCH: usize = 3;

#[derive(Debug, Clone)]
pub struct Board {
    columns: usize,
    rows: usize,
    /// cells[row * columns + col]
    cells: Vec<Option<Tile>>,
    /// Cells a piece may not commit onto (tutorial/scripted boards).
    restricted: Vec<bool>,
}

impl Board {
    pub fn new(columns: usize, rows: usize) -> Self {
        assert!(columns > 0 && rows > 0, "board dimensions must be non-zero");
        Self {
            columns,
            rows,
            cells: vec![None; columns * rows],
            restricted: vec![false; columns * rows],
        }
    }

    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn index(&self, col: usize, row: usize) -> usize {
        row * self.columns + col
    }

    #[inline]
    pub fn col_of(&self, index: usize) -> usize {
        index % self.columns
    }

    #[inline]
    pub fn row_of(&self, index: usize) -> usize {
        index / self.columns
    }

    #[inline]
    pub fn in_range(&self, index: usize) -> bool {
        index < self.cells.len()
    }

    pub fn tile(&self, index: usize) -> Option<&Tile> {
        self.cells.get(index).and_then(Option::as_ref)
    }

    pub fn tile_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.cells.get_mut(index).and_then(Option::as_mut)
    }

    /// Create a tile at `index`. Creating over an occupied or out-of-range
    /// cell is an internal-consistency violation; callers validate first.
    pub fn create_tile(&mut self, index: usize, color: TileColor, kind: TileKind) {
        assert!(self.in_range(index), "create_tile: index {index} out of range");
        assert!(
            self.cells[index].is_none(),
            "create_tile: cell {index} already occupied"
        );
        let (col, row) = (self.col_of(index), self.row_of(index));
        self.cells[index] = Some(Tile::new(color, kind, col, row));
    }

    /// Detach a tile from the grid. Does not animate; the caller
    /// orchestrates removal animations before calling this.
    pub fn remove_tile(&mut self, index: usize) -> Option<Tile> {
        self.cells.get_mut(index).and_then(Option::take)
    }

    pub fn remove_tiles(&mut self, indices: &HashSet<usize>) {
        for &i in indices {
            self.remove_tile(i);
        }
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    pub fn occupied_indices(&self) -> Vec<usize> {
        (0..self.cells.len())
            .filter(|&i| self.cells[i].is_some())
            .collect()
    }

    /// Tiles of a given class currently on the board.
    pub fn count_class(&self, class: TileClass) -> usize {
        self.cells
            .iter()
            .flatten()
            .filter(|t| t.kind.class() == class)
            .count()
    }

    pub fn is_restricted(&self, index: usize) -> bool {
        self.restricted.get(index).copied().unwrap_or(true)
    }

    pub fn set_restricted(&mut self, index: usize, restricted: bool) {
        if self.in_range(index) {
            self.restricted[index] = restricted;
        }
    }

    /// True if the cell exists, is unoccupied and unrestricted.
    pub fn is_open(&self, index: usize) -> bool {
        self.in_range(index) && self.cells[index].is_none() && !self.restricted[index]
    }

    /// Advance every in-flight tile animation one tick.
    pub fn tick_animations(&mut self) {
        for cell in self.cells.iter_mut().flatten() {
            cell.tick_animation();
        }
    }

    /// Re-derive every tile's logical grid slot from its animated position
    /// and rebuild the cell array. Must only be called once all tiles in
    /// the current batch have finished moving; two tiles resolving to the
    /// same cell means a phase mutated the grid mid-animation, which is
    /// fatal. Idempotent when nothing has moved.
    pub fn synchronize(&mut self) {
        let mut fresh: Vec<Option<Tile>> = vec![None; self.cells.len()];
        for cell in self.cells.iter_mut() {
            if let Some(tile) = cell.take() {
                let col = tile.x.round() as i64;
                let row = tile.y.round() as i64;
                assert!(
                    col >= 0 && (col as usize) < self.columns && row >= 0 && (row as usize) < self.rows,
                    "synchronize: tile position ({}, {}) outside the grid",
                    tile.x,
                    tile.y,
                );
                let index = row as usize * self.columns + col as usize;
                assert!(
                    fresh[index].is_none(),
                    "synchronize: two tiles resolve to cell {index}"
                );
                fresh[index] = Some(tile);
            }
        }
        self.cells = fresh;
    }

    /// Value snapshot of an occupied cell, for match/score records.
    pub fn snapshot(&self, index: usize) -> TileSnapshot {
        let tile = self.tile(index).expect("snapshot of empty cell");
        TileSnapshot {
            index,
            color: tile.color,
            kind: tile.kind,
        }
    }

    /// Scan rows left-to-right for runs of >= MINIMUM_MATCH same-coloured
    /// tiles. The cursor jumps past each maximal run, so a run of 6 yields
    /// one line, never two overlapping ones. Matched indices are appended
    /// to `out`, one `LineRecord` per run to `lines`. Returns lines found.
    pub fn find_x_match(&self, out: &mut HashSet<usize>, lines: &mut Vec<LineRecord>) -> usize {
        self.find_runs(out, lines, LineType::Horizontal)
    }

    /// Column scan, top-to-bottom; same policy as `find_x_match`.
    pub fn find_y_match(&self, out: &mut HashSet<usize>, lines: &mut Vec<LineRecord>) -> usize {
        self.find_runs(out, lines, LineType::Vertical)
    }

    fn find_runs(
        &self,
        out: &mut HashSet<usize>,
        lines: &mut Vec<LineRecord>,
        line_type: LineType,
    ) -> usize {
        let (lanes, lane_len) = match line_type {
            LineType::Horizontal => (self.rows, self.columns),
            LineType::Vertical => (self.columns, self.rows),
            _ => unreachable!("find_runs only scans rows and columns"),
        };
        let index_at = |lane: usize, pos: usize| match line_type {
            LineType::Horizontal => self.index(pos, lane),
            _ => self.index(lane, pos),
        };
        let mut found = 0;
        for lane in 0..lanes {
            let mut pos = 0;
            while pos < lane_len {
                let Some(tile) = self.tile(index_at(lane, pos)) else {
                    pos += 1;
                    continue;
                };
                let color = tile.color;
                let mut end = pos + 1;
                while end < lane_len
                    && self
                        .tile(index_at(lane, end))
                        .is_some_and(|t| t.color == color)
                {
                    end += 1;
                }
                if end - pos >= MINIMUM_MATCH {
                    let mut line = LineRecord::builder(line_type);
                    for p in pos..end {
                        let index = index_at(lane, p);
                        out.insert(index);
                        line.push(self.snapshot(index));
                    }
                    lines.push(line.build());
                    found += 1;
                }
                // Jump past the whole run either way; it is maximal.
                pos = end;
            }
        }
        found
    }

    /// Collect indices within `within` whose tile is of `class`. Returns
    /// how many were found.
    pub fn scan_for(
        &self,
        class: TileClass,
        within: &HashSet<usize>,
        out: &mut HashSet<usize>,
    ) -> usize {
        let mut found = 0;
        for &i in within {
            if self.tile(i).is_some_and(|t| t.kind.class() == class) {
                out.insert(i);
                found += 1;
            }
        }
        found
    }

    /// The row new tiles enter from under the current gravity.
    pub fn entry_row(&self, gravity: Gravity) -> usize {
        match gravity.vertical {
            VerticalGravity::Down => 0,
            VerticalGravity::Up => self.rows - 1,
        }
    }

    /// Per-tile vertical compaction targets: for each tile that is not yet
    /// resting, (index, target row). Fall distance counts occupied cells
    /// between the tile and the gravity wall along its column.
    pub fn vertical_moves(&self, gravity: Gravity) -> Vec<(usize, usize)> {
        let mut moves = Vec::new();
        for col in 0..self.columns {
            for row in 0..self.rows {
                let index = self.index(col, row);
                if self.cells[index].is_none() {
                    continue;
                }
                let target = match gravity.vertical {
                    VerticalGravity::Down => {
                        let below = (row + 1..self.rows)
                            .filter(|&r| self.cells[self.index(col, r)].is_some())
                            .count();
                        self.rows - 1 - below
                    }
                    VerticalGravity::Up => (0..row)
                        .filter(|&r| self.cells[self.index(col, r)].is_some())
                        .count(),
                };
                if target != row {
                    moves.push((index, target));
                }
            }
        }
        moves
    }

    /// Per-tile horizontal compaction targets: count occupied cells between
    /// the tile and the horizontal gravity wall along its row.
    pub fn horizontal_moves(&self, gravity: Gravity) -> Vec<(usize, usize)> {
        let mut moves = Vec::new();
        for row in 0..self.rows {
            for col in 0..self.columns {
                let index = self.index(col, row);
                if self.cells[index].is_none() {
                    continue;
                }
                let target = match gravity.horizontal {
                    HorizontalGravity::Left => (0..col)
                        .filter(|&c| self.cells[self.index(c, row)].is_some())
                        .count(),
                    HorizontalGravity::Right => {
                        let beyond = (col + 1..self.columns)
                            .filter(|&c| self.cells[self.index(c, row)].is_some())
                            .count();
                        self.columns - 1 - beyond
                    }
                };
                if target != col {
                    moves.push((index, target));
                }
            }
        }
        moves
    }

    /// Non-animated compaction: vertical then horizontal phase, applied in
    /// place. Returns the pre-compaction index of every tile mapped to its
    /// final index. Used by the tile dropper to test a board for accidental
    /// matches before any real drop animation starts.
    pub fn instant_compact(&mut self, gravity: Gravity) -> HashMap<usize, usize> {
        let mut mapping: HashMap<usize, usize> = self
            .occupied_indices()
            .into_iter()
            .map(|i| (i, i))
            .collect();
        for phase in 0..2 {
            let moves = if phase == 0 {
                self.vertical_moves(gravity)
            } else {
                self.horizontal_moves(gravity)
            };
            let mut phase_map: HashMap<usize, usize> = HashMap::new();
            for &(from, target) in &moves {
                let to = if phase == 0 {
                    self.index(self.col_of(from), target)
                } else {
                    self.index(target, self.row_of(from))
                };
                phase_map.insert(from, to);
                let tile = self.cells[from].as_mut().expect("move source empty");
                if phase == 0 {
                    tile.y = target as f32;
                } else {
                    tile.x = target as f32;
                }
            }
            self.synchronize();
            for final_index in mapping.values_mut() {
                if let Some(&to) = phase_map.get(final_index) {
                    *final_index = to;
                }
            }
        }
        mapping
    }

    /// Blast geometry for a set of bomb tiles: every occupied cell in the
    /// 3x3 neighbourhood of each bomb, bombs included. Every index passed
    /// in must actually hold a bomb.
    pub fn process_bombs(&self, bombs: &HashSet<usize>) -> HashSet<usize> {
        let mut affected = HashSet::new();
        for &i in bombs {
            let tile = self.tile(i).expect("process_bombs: empty cell");
            assert!(
                tile.kind.class() == TileClass::Bomb,
                "process_bombs: tile at {i} is not a bomb"
            );
            let (col, row) = (self.col_of(i) as i64, self.row_of(i) as i64);
            for dr in -1..=1 {
                for dc in -1..=1 {
                    let (c, r) = (col + dc, row + dr);
                    if c < 0 || r < 0 || c as usize >= self.columns || r as usize >= self.rows {
                        continue;
                    }
                    let n = self.index(c as usize, r as usize);
                    if self.cells[n].is_some() {
                        affected.insert(n);
                    }
                }
            }
        }
        affected
    }

    /// Travel geometry for a set of rocket tiles: every occupied cell on
    /// each rocket's path from its cell to the board edge, rockets
    /// included. Every index passed in must actually hold a rocket.
    pub fn process_rockets(&self, rockets: &HashSet<usize>) -> HashSet<usize> {
        let mut affected = HashSet::new();
        for &i in rockets {
            let tile = self.tile(i).expect("process_rockets: empty cell");
            let TileKind::Rocket(direction) = tile.kind else {
                panic!("process_rockets: tile at {i} is not a rocket");
            };
            affected.insert(i);
            let (mut col, mut row) = (self.col_of(i) as i64, self.row_of(i) as i64);
            let (dc, dr) = match direction {
                RocketDirection::Up => (0, -1),
                RocketDirection::Down => (0, 1),
                RocketDirection::Left => (-1, 0),
                RocketDirection::Right => (1, 0),
            };
            loop {
                col += dc;
                row += dr;
                if col < 0 || row < 0 || col as usize >= self.columns || row as usize >= self.rows {
                    break;
                }
                let n = self.index(col as usize, row as usize);
                if self.cells[n].is_some() {
                    affected.insert(n);
                }
            }
        }
        affected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_with(columns: usize, rows: usize, tiles: &[(usize, usize, TileColor)]) -> Board {
        let mut b = Board::new(columns, rows);
        for &(col, row, color) in tiles {
            let i = b.index(col, row);
            b.create_tile(i, color, TileKind::Normal);
        }
        b
    }

    #[test]
    fn find_x_match_detects_exact_run() {
        use TileColor::{Blue, Red};
        // Run of 4 blue at row 0 cols 0-3, bounded by a red tile.
        let b = board_with(
            8,
            10,
            &[
                (0, 0, Blue),
                (1, 0, Blue),
                (2, 0, Blue),
                (3, 0, Blue),
                (4, 0, Red),
            ],
        );
        let mut set = HashSet::new();
        let mut lines = Vec::new();
        assert_eq!(b.find_x_match(&mut set, &mut lines), 1);
        assert_eq!(lines[0].len(), 4);
        let expected: HashSet<usize> = (0..4).map(|c| b.index(c, 0)).collect();
        assert_eq!(set, expected);
    }

    #[test]
    fn runs_shorter_than_three_are_not_matches() {
        use TileColor::{Blue, Red};
        let b = board_with(8, 10, &[(0, 0, Blue), (1, 0, Blue), (2, 0, Red), (3, 0, Red)]);
        let mut set = HashSet::new();
        let mut lines = Vec::new();
        assert_eq!(b.find_x_match(&mut set, &mut lines), 0);
        assert!(set.is_empty());
    }

    #[test]
    fn run_of_six_yields_single_line() {
        use TileColor::Green;
        let tiles: Vec<_> = (0..6).map(|c| (c, 2, Green)).collect();
        let b = board_with(8, 10, &tiles);
        let mut set = HashSet::new();
        let mut lines = Vec::new();
        assert_eq!(b.find_x_match(&mut set, &mut lines), 1);
        assert_eq!(lines[0].len(), 6);
        assert_eq!(set.len(), 6);
    }

    #[test]
    fn find_y_match_scans_columns() {
        use TileColor::Cyan;
        let b = board_with(8, 10, &[(3, 4, Cyan), (3, 5, Cyan), (3, 6, Cyan)]);
        let mut set = HashSet::new();
        let mut lines = Vec::new();
        assert_eq!(b.find_y_match(&mut set, &mut lines), 1);
        assert_eq!(lines[0].line_type, LineType::Vertical);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn empty_cell_breaks_a_run() {
        use TileColor::Red;
        let b = board_with(8, 10, &[(0, 0, Red), (1, 0, Red), (3, 0, Red), (4, 0, Red)]);
        let mut set = HashSet::new();
        let mut lines = Vec::new();
        assert_eq!(b.find_x_match(&mut set, &mut lines), 0);
    }

    #[test]
    fn synchronize_is_idempotent() {
        use TileColor::Blue;
        let mut b = board_with(5, 5, &[(1, 2, Blue), (4, 4, Blue)]);
        b.synchronize();
        let first: Vec<bool> = (0..b.cell_count()).map(|i| b.tile(i).is_some()).collect();
        b.synchronize();
        let second: Vec<bool> = (0..b.cell_count()).map(|i| b.tile(i).is_some()).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn instant_compact_packs_toward_gravity_corner() {
        use TileColor::{Blue, Red};
        let mut b = board_with(5, 5, &[(2, 0, Blue), (4, 1, Red)]);
        let from_blue = b.index(2, 0);
        let from_red = b.index(4, 1);
        let mapping = b.instant_compact(Gravity::DOWN_LEFT);
        // Both tiles end on the bottom row, packed to the left wall.
        assert_eq!(mapping[&from_blue], b.index(0, 4));
        assert_eq!(mapping[&from_red], b.index(1, 4));
        assert!(b.tile(b.index(0, 4)).is_some());
        assert!(b.tile(b.index(1, 4)).is_some());
        assert_eq!(b.occupied_count(), 2);
    }

    #[test]
    fn bomb_blast_covers_occupied_neighbourhood() {
        use TileColor::Red;
        let mut b = board_with(5, 5, &[(1, 1, Red), (3, 3, Red)]);
        let bomb = b.index(2, 2);
        b.create_tile(bomb, Red, TileKind::Bomb);
        let bombs: HashSet<usize> = [bomb].into();
        let affected = b.process_bombs(&bombs);
        assert!(affected.contains(&bomb));
        assert!(affected.contains(&b.index(1, 1)));
        assert!(affected.contains(&b.index(3, 3)));
        assert_eq!(affected.len(), 3);
    }

    #[test]
    fn rocket_path_runs_to_board_edge() {
        use TileColor::{Green, Red};
        let mut b = board_with(6, 6, &[(2, 0, Red), (2, 3, Green)]);
        let rocket = b.index(2, 5);
        b.create_tile(rocket, Red, TileKind::Rocket(RocketDirection::Up));
        let rockets: HashSet<usize> = [rocket].into();
        let affected = b.process_rockets(&rockets);
        assert_eq!(affected.len(), 3);
        assert!(affected.contains(&rocket));
        assert!(affected.contains(&b.index(2, 3)));
        assert!(affected.contains(&b.index(2, 0)));
    }

    #[test]
    fn scan_for_separates_item_tiles() {
        use TileColor::Red;
        let mut b = Board::new(4, 4);
        b.create_tile(0, Red, TileKind::Normal);
        b.create_tile(1, Red, TileKind::Bomb);
        b.create_tile(2, Red, TileKind::Star);
        let within: HashSet<usize> = [0, 1, 2].into();
        let mut bombs = HashSet::new();
        assert_eq!(b.scan_for(TileClass::Bomb, &within, &mut bombs), 1);
        assert!(bombs.contains(&1));
    }

    #[test]
    #[should_panic(expected = "already occupied")]
    fn create_over_occupied_cell_is_fatal() {
        let mut b = Board::new(3, 3);
        b.create_tile(0, TileColor::Red, TileKind::Normal);
        b.create_tile(0, TileColor::Blue, TileKind::Normal);
    }
}
