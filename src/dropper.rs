//! Tile dropper: injects new tiles after a move.
//!
//! Decides how many tiles a move owes the board, spawns them in capped
//! parallel batches along the gravity entry edge, and recolours any tile
//! that would land into an accidental pre-formed match before the real
//! drop animation ever starts.

use crate::animation::{Animation, Batch};
use crate::board::Board;
use crate::tile::{Gravity, MultiplierFactor, RocketDirection, TileClass, TileColor, TileKind};
use std::collections::HashSet;

/// Small LCG, the same flavour the piece bag uses. Seedable for tests.
#[derive(Debug, Clone)]
pub struct Lcg {
    state: u32,
}

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self {
            state: seed | 1,
        }
    }

    pub fn next(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(1103515245).wrapping_add(12345);
        self.state >> 16
    }

    pub fn next_range(&mut self, n: usize) -> usize {
        assert!(n > 0, "next_range over empty range");
        self.next() as usize % n
    }
}

/// Drop tuning, injected from config.
#[derive(Debug, Clone, Copy)]
pub struct DropConfig {
    pub minimum_drop: u32,
    pub maximum_total_drop: u32,
    pub maximum_parallel_drop: u32,
    /// Level after which extra tiles are owed per move.
    pub level_threshold: u32,
    /// Cap on those extra tiles.
    pub level_ramp_cap: u32,
    /// Chance per dropped tile of being an item, in permille.
    pub item_chance_permille: u32,
    pub max_bombs: usize,
    pub max_rockets: usize,
    pub max_stars: usize,
    pub max_multipliers: usize,
    pub max_gravity: usize,
    pub zoom_ticks: u16,
}

impl Default for DropConfig {
    fn default() -> Self {
        Self {
            minimum_drop: 4,
            maximum_total_drop: 8,
            maximum_parallel_drop: 4,
            level_threshold: 5,
            level_ramp_cap: 3,
            item_chance_permille: 60,
            max_bombs: 1,
            max_rockets: 2,
            max_stars: 1,
            max_multipliers: 3,
            max_gravity: 1,
            zoom_ticks: 10,
        }
    }
}

/// What one dropper tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropOutcome {
    /// Nothing owed.
    Idle,
    /// A batch is animating (or just spawned).
    Waiting,
    /// A fresh batch was placed this tick (play the drop cue).
    Spawned,
    /// The previous batch finished animating; refactor now.
    BatchLanded,
    /// Tiles remain owed but there is nowhere to drop them.
    GameOver,
}

#[derive(Debug)]
pub struct TileDropper {
    config: DropConfig,
    rng: Lcg,
    /// Tiles still owed to the board this move.
    remaining: u32,
    batch: Batch,
}

impl TileDropper {
    pub fn new(config: DropConfig, rng: Lcg) -> Self {
        Self {
            config,
            rng,
            remaining: 0,
            batch: Batch::default(),
        }
    }

    pub fn is_dropping(&self) -> bool {
        self.remaining > 0 || !self.batch.is_empty()
    }

    pub fn reset(&mut self) {
        self.remaining = 0;
        self.batch.clear();
    }

    /// Queue tiles directly (initial board fill).
    pub fn queue(&mut self, amount: u32) {
        self.remaining += amount;
    }

    /// How many tiles the consumed piece owes the board. Pure in its
    /// inputs: piece size, board density vs the 80% target, and a capped
    /// per-level ramp past the threshold; clamped to
    /// `[minimum_drop, maximum_total_drop + piece_size]`.
    pub fn drop_amount(&self, piece_size: u32, board: &Board, level: u32) -> u32 {
        let c = &self.config;
        let mut amount = piece_size;
        if board.occupied_count() * 5 < board.cell_count() * 4 {
            amount += c.minimum_drop;
        }
        if level > c.level_threshold {
            amount += (level - c.level_threshold).min(c.level_ramp_cap);
        }
        amount.clamp(c.minimum_drop, c.maximum_total_drop + piece_size)
    }

    /// Arm the dropper for the move that just consumed a piece.
    pub fn update_drop_amount(&mut self, piece_size: u32, board: &Board, level: u32) {
        self.remaining = self.drop_amount(piece_size, board, level);
    }

    fn random_color(&mut self) -> TileColor {
        TileColor::ALL[self.rng.next_range(TileColor::ALL.len())]
    }

    fn random_kind(&mut self, board: &Board) -> TileKind {
        if self.rng.next_range(1000) as u32 >= self.config.item_chance_permille {
            return TileKind::Normal;
        }
        let mut eligible: Vec<TileClass> = Vec::new();
        if board.count_class(TileClass::Bomb) < self.config.max_bombs {
            eligible.push(TileClass::Bomb);
        }
        if board.count_class(TileClass::Rocket) < self.config.max_rockets {
            eligible.push(TileClass::Rocket);
        }
        if board.count_class(TileClass::Star) < self.config.max_stars {
            eligible.push(TileClass::Star);
        }
        if board.count_class(TileClass::Multiplier) < self.config.max_multipliers {
            eligible.push(TileClass::Multiplier);
        }
        if board.count_class(TileClass::Gravity) < self.config.max_gravity {
            eligible.push(TileClass::Gravity);
        }
        if eligible.is_empty() {
            return TileKind::Normal;
        }
        match eligible[self.rng.next_range(eligible.len())] {
            TileClass::Bomb => TileKind::Bomb,
            TileClass::Rocket => {
                TileKind::Rocket(RocketDirection::ALL[self.rng.next_range(4)])
            }
            TileClass::Star => TileKind::Star,
            TileClass::Multiplier => {
                let factors = [
                    MultiplierFactor::X2,
                    MultiplierFactor::X3,
                    MultiplierFactor::X4,
                ];
                TileKind::Multiplier(factors[self.rng.next_range(3)])
            }
            TileClass::Gravity => TileKind::Gravity,
            TileClass::Normal => TileKind::Normal,
        }
    }

    /// Recolour candidates until an instant compaction of the whole board
    /// produces no match involving a freshly dropped tile. Only colours
    /// are reassigned, never kinds or counts. A tile that keeps failing
    /// while every other placement holds its colour walks the finite
    /// palette through its exclusion set; a round that recolours more
    /// than one tile drops all exclusions, since they were learned
    /// against colours that no longer exist.
    fn avoid_accidental_matches(
        &mut self,
        board: &Board,
        gravity: Gravity,
        placements: &mut [(usize, TileColor, TileKind)],
    ) {
        let mut excluded: Vec<HashSet<TileColor>> =
            vec![HashSet::new(); placements.len()];
        loop {
            let mut sim = board.clone();
            for &(index, color, kind) in placements.iter() {
                sim.create_tile(index, color, kind);
            }
            let mapping = sim.instant_compact(gravity);
            let mut matched = HashSet::new();
            let mut lines = Vec::new();
            sim.find_x_match(&mut matched, &mut lines);
            sim.find_y_match(&mut matched, &mut lines);
            let mut recoloured = 0;
            for (slot, placement) in placements.iter_mut().enumerate() {
                let final_index = mapping[&placement.0];
                if matched.contains(&final_index) {
                    recoloured += 1;
                    excluded[slot].insert(placement.1);
                    let options: Vec<TileColor> = TileColor::ALL
                        .iter()
                        .copied()
                        .filter(|c| !excluded[slot].contains(c))
                        .collect();
                    assert!(!options.is_empty(), "colour palette exhausted during drop");
                    placement.1 = options[self.rng.next_range(options.len())];
                }
            }
            if recoloured == 0 {
                return;
            }
            if recoloured > 1 {
                for set in &mut excluded {
                    set.clear();
                }
            }
        }
    }

    /// Dropper logic tick. Only called while no refactor or removal is in
    /// progress; spawns the next batch or reports the previous one landed.
    pub fn update_logic(&mut self, board: &mut Board, gravity: Gravity) -> DropOutcome {
        if !self.batch.is_empty() {
            if self.batch.all_finished(board) {
                self.batch.clear();
                return DropOutcome::BatchLanded;
            }
            return DropOutcome::Waiting;
        }
        if self.remaining == 0 {
            return DropOutcome::Idle;
        }

        let entry_row = board.entry_row(gravity);
        let mut open: Vec<usize> = (0..board.columns())
            .map(|col| board.index(col, entry_row))
            .filter(|&i| board.is_open(i))
            .collect();
        if open.is_empty() {
            // Tiles still owed, nowhere to put them. Not an error: the
            // defined terminal condition.
            return DropOutcome::GameOver;
        }

        let count = (self.config.maximum_parallel_drop as usize)
            .min(self.remaining as usize)
            .min(open.len());
        let mut placements: Vec<(usize, TileColor, TileKind)> = Vec::with_capacity(count);
        for _ in 0..count {
            let slot = self.rng.next_range(open.len());
            let index = open.swap_remove(slot);
            let color = self.random_color();
            let kind = self.random_kind(board);
            placements.push((index, color, kind));
        }

        self.avoid_accidental_matches(board, gravity, &mut placements);

        for &(index, color, kind) in &placements {
            board.create_tile(index, color, kind);
            let tile = board.tile_mut(index).expect("tile just created");
            tile.start(Animation::zoom(self.config.zoom_ticks));
            self.batch.push(index);
        }
        self.remaining -= count as u32;
        DropOutcome::Spawned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::TileKind;

    fn dropper() -> TileDropper {
        TileDropper::new(DropConfig::default(), Lcg::new(0x1234_5678))
    }

    #[test]
    fn drop_amount_is_clamped_and_monotonic_in_level() {
        let board = Board::new(8, 10); // empty: density bonus applies
        let d = dropper();
        let base = d.drop_amount(2, &board, 1);
        assert_eq!(base, 2 + 4);
        let mut prev = 0;
        for level in 1..12 {
            let a = d.drop_amount(2, &board, level);
            assert!(a >= prev);
            assert!(a >= DropConfig::default().minimum_drop);
            assert!(a <= DropConfig::default().maximum_total_drop + 2);
            prev = a;
        }
        // Ramp caps out.
        assert_eq!(d.drop_amount(2, &board, 20), d.drop_amount(2, &board, 9));
    }

    #[test]
    fn dense_board_owes_fewer_tiles() {
        let mut board = Board::new(4, 4);
        for i in 0..13 {
            board.create_tile(i, TileColor::from_index(i as u8 % 2), TileKind::Normal);
        }
        let d = dropper();
        // 13/16 > 80%: no density bonus, just the piece size clamped up.
        assert_eq!(d.drop_amount(2, &board, 1), DropConfig::default().minimum_drop);
    }

    #[test]
    fn spawned_batch_never_forms_an_accidental_match() {
        // Two blue tiles already rest on the bottom row; any blue drop
        // sliding in next to them would complete a run of 3.
        let mut board = Board::new(6, 6);
        board.create_tile(board.index(0, 5), TileColor::Blue, TileKind::Normal);
        board.create_tile(board.index(1, 5), TileColor::Blue, TileKind::Normal);
        let mut d = dropper();
        d.queue(4);
        let outcome = d.update_logic(&mut board, Gravity::DOWN_LEFT);
        assert_eq!(outcome, DropOutcome::Spawned);

        // Replay the dropper's own verification: compact a copy and scan.
        let mut sim = board.clone();
        sim.instant_compact(Gravity::DOWN_LEFT);
        let mut matched = std::collections::HashSet::new();
        let mut lines = Vec::new();
        sim.find_x_match(&mut matched, &mut lines);
        sim.find_y_match(&mut matched, &mut lines);
        assert!(matched.is_empty(), "drop created an accidental match");
    }

    #[test]
    fn adjacent_drops_recolour_without_exhausting_the_palette() {
        // Three tiles dropped side by side constrain each other, so an
        // exclusion learned against a neighbour's old colour is stale the
        // moment that neighbour is recoloured. Across seeds this must
        // neither leave a match nor report the palette exhausted.
        for seed in 0..64 {
            let mut board = Board::new(3, 6);
            board.create_tile(board.index(0, 5), TileColor::Blue, TileKind::Normal);
            board.create_tile(board.index(1, 5), TileColor::Blue, TileKind::Normal);
            board.create_tile(board.index(2, 5), TileColor::Red, TileKind::Normal);
            board.create_tile(board.index(0, 4), TileColor::Red, TileKind::Normal);
            let mut d = TileDropper::new(DropConfig::default(), Lcg::new(seed));
            d.queue(3);
            assert_eq!(
                d.update_logic(&mut board, Gravity::DOWN_LEFT),
                DropOutcome::Spawned
            );
            let mut sim = board.clone();
            sim.instant_compact(Gravity::DOWN_LEFT);
            let mut matched = std::collections::HashSet::new();
            let mut lines = Vec::new();
            sim.find_x_match(&mut matched, &mut lines);
            sim.find_y_match(&mut matched, &mut lines);
            assert!(matched.is_empty(), "seed {seed} left an accidental match");
        }
    }

    #[test]
    fn full_entry_row_with_tiles_owed_is_game_over() {
        let mut board = Board::new(3, 3);
        for i in 0..board.cell_count() {
            board.create_tile(i, TileColor::from_index(i as u8 % 3), TileKind::Normal);
        }
        let mut d = dropper();
        d.queue(2);
        assert_eq!(
            d.update_logic(&mut board, Gravity::DOWN_LEFT),
            DropOutcome::GameOver
        );
    }

    #[test]
    fn batch_lands_after_zoom_finishes() {
        let mut board = Board::new(6, 6);
        let mut d = dropper();
        d.queue(2);
        assert_eq!(d.update_logic(&mut board, Gravity::DOWN_LEFT), DropOutcome::Spawned);
        assert!(d.is_dropping());
        for _ in 0..DropConfig::default().zoom_ticks {
            assert_eq!(d.update_logic(&mut board, Gravity::DOWN_LEFT), DropOutcome::Waiting);
            board.tick_animations();
        }
        assert_eq!(d.update_logic(&mut board, Gravity::DOWN_LEFT), DropOutcome::BatchLanded);
        assert!(!d.is_dropping());
    }

    #[test]
    fn item_caps_suppress_item_spawns() {
        let config = DropConfig {
            item_chance_permille: 1000,
            max_bombs: 0,
            max_rockets: 0,
            max_stars: 0,
            max_multipliers: 0,
            max_gravity: 0,
            ..DropConfig::default()
        };
        let mut board = Board::new(8, 8);
        let mut d = TileDropper::new(config, Lcg::new(7));
        d.queue(4);
        d.update_logic(&mut board, Gravity::DOWN_LEFT);
        for i in 0..board.cell_count() {
            if let Some(t) = board.tile(i) {
                assert_eq!(t.kind, TileKind::Normal);
            }
        }
    }
}
