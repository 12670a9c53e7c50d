//! Tile remover: the cascade controller.
//!
//! Sequences line removal, item-effect waves (rocket > star > bomb >
//! gravity, one category per cascade step), scoring, and the hand-off
//! back to the gravity refactorer, until the board reaches quiescence.
//! One phase transition per tick; illegal combinations of "active removal
//! kinds" are unrepresentable in `RemovalPhase`.

use crate::animation::{Animation, Batch};
use crate::board::Board;
use crate::chain::{ChainBuilder, ChainRecord, LineRecord, LineType, MoveRecord, TileSnapshot};
use crate::dropper::TileDropper;
use crate::events::{GameEvent, SoundCue};
use crate::refactor::{GravityRefactorer, RefactorSpeed};
use crate::score::{calculate_line_score, ScoreBoard};
use crate::tile::{Gravity, RocketDirection, TileClass, TileKind, VerticalGravity};
use std::collections::HashSet;

/// Removal fade length in ticks.
const FADE_TICKS: u16 = 12;
/// Rocket travel speed, cells per tick.
const ROCKET_SPEED: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalKind {
    Line,
    Rocket,
    Star,
    Bomb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemovalPhase {
    Idle,
    /// Matches found; build the line-removal wave next tick.
    StartLine,
    StartRocket,
    StartStar,
    StartBomb,
    /// A removal wave of the given kind is animating.
    Animating(RemovalKind),
}

#[derive(Debug)]
pub struct TileRemover {
    phase: RemovalPhase,
    /// Tiles in the wave currently fading/travelling.
    tile_removal_set: HashSet<usize>,
    /// Item tiles awaiting their own effect step.
    bomb_set: HashSet<usize>,
    rocket_set: HashSet<usize>,
    star_set: HashSet<usize>,
    gravity_set: HashSet<usize>,
    /// The full index set of the most recent match scan. Overwritten on
    /// every scan; stars only ever detonate against this.
    last_match_set: HashSet<usize>,
    /// Lines found by the most recent scan, pending removal.
    pending_lines: Vec<LineRecord>,
    batch: Batch,
    cascade: u32,
    current_chain: Option<ChainBuilder>,
    chains: Vec<ChainRecord>,
    /// Level-up clears reuse the line path with these set.
    no_score: bool,
    no_items: bool,
}

impl TileRemover {
    pub fn new() -> Self {
        Self {
            phase: RemovalPhase::Idle,
            tile_removal_set: HashSet::new(),
            bomb_set: HashSet::new(),
            rocket_set: HashSet::new(),
            star_set: HashSet::new(),
            gravity_set: HashSet::new(),
            last_match_set: HashSet::new(),
            pending_lines: Vec::new(),
            batch: Batch::default(),
            cascade: 0,
            current_chain: None,
            chains: Vec::new(),
            no_score: false,
            no_items: false,
        }
    }

    /// Full reset, used when abandoning a game.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Called when a piece commits: fresh cascade counters and move record.
    pub fn begin_move(&mut self) {
        self.cascade = 0;
        self.chains.clear();
        self.current_chain = None;
        self.no_score = false;
        self.no_items = false;
    }

    /// The completed move's record; call once at move finalisation.
    pub fn take_move_record(&mut self) -> MoveRecord {
        self.close_chain();
        let mut builder = MoveRecord::builder();
        for chain in self.chains.drain(..) {
            builder.push(chain);
        }
        builder.build()
    }

    pub fn is_idle(&self) -> bool {
        self.phase == RemovalPhase::Idle && self.item_sets_empty()
    }

    pub fn cascade_count(&self) -> u32 {
        self.cascade
    }

    fn item_sets_empty(&self) -> bool {
        self.bomb_set.is_empty()
            && self.rocket_set.is_empty()
            && self.star_set.is_empty()
            && self.gravity_set.is_empty()
    }

    /// Cosmetic clear of the resting row on level-up: reuses the line
    /// removal path with score and item effects suppressed.
    pub fn start_level_up_clear(&mut self, board: &Board, gravity: Gravity) {
        if self.phase != RemovalPhase::Idle {
            return;
        }
        let row = match gravity.vertical {
            VerticalGravity::Down => board.rows() - 1,
            VerticalGravity::Up => 0,
        };
        let mut set = HashSet::new();
        let mut line = LineRecord::builder(LineType::Horizontal);
        for col in 0..board.columns() {
            let index = board.index(col, row);
            if board.tile(index).is_some() {
                set.insert(index);
                line.push(board.snapshot(index));
            }
        }
        if set.is_empty() {
            return;
        }
        self.no_score = true;
        self.no_items = true;
        self.cascade += 1;
        self.tile_removal_set = set;
        self.pending_lines = vec![line.build()];
        self.phase = RemovalPhase::StartLine;
    }

    /// One controller step per logic tick. Returns true when the board
    /// just settled (no matches, no items, no dropping): the terminal
    /// "move complete" transition.
    pub fn tick(
        &mut self,
        board: &mut Board,
        refactorer: &mut GravityRefactorer,
        dropper: &TileDropper,
        gravity: &mut Gravity,
        scorer: &mut ScoreBoard,
        events: &mut Vec<GameEvent>,
    ) -> bool {
        match self.phase {
            RemovalPhase::Idle => {
                if refactorer.is_finished() && self.item_sets_empty() {
                    if self.find_matches(board) > 0 {
                        self.phase = RemovalPhase::StartLine;
                    } else if !dropper.is_dropping() {
                        return true;
                    }
                }
                false
            }
            RemovalPhase::StartLine => {
                self.remove_lines(board, scorer, events);
                false
            }
            RemovalPhase::StartRocket => {
                self.remove_rockets(board, scorer, events);
                false
            }
            RemovalPhase::StartStar => {
                self.remove_stars(board, scorer, events);
                false
            }
            RemovalPhase::StartBomb => {
                self.remove_bombs(board, scorer, events);
                false
            }
            RemovalPhase::Animating(_) => {
                self.process_removal(board, refactorer, gravity, events);
                false
            }
        }
    }

    /// Scan both axes; stores the match set and pending lines. Returns the
    /// number of lines found.
    fn find_matches(&mut self, board: &Board) -> usize {
        let mut set = HashSet::new();
        let mut lines = Vec::new();
        let mut found = board.find_x_match(&mut set, &mut lines);
        found += board.find_y_match(&mut set, &mut lines);
        if found == 0 {
            return 0;
        }
        self.cascade += 1;
        self.last_match_set = set.clone();
        self.tile_removal_set = set;
        self.pending_lines = lines;
        found
    }

    fn chain(&mut self) -> &mut ChainBuilder {
        let cascade = self.cascade;
        self.current_chain
            .get_or_insert_with(|| ChainRecord::builder(cascade))
    }

    fn close_chain(&mut self) {
        if let Some(chain) = self.current_chain.take() {
            if !chain.is_empty() {
                self.chains.push(chain.build());
            }
        }
    }

    fn award(
        &mut self,
        snaps: &[TileSnapshot],
        line_type: LineType,
        board: &Board,
        scorer: &mut ScoreBoard,
        events: &mut Vec<GameEvent>,
    ) {
        if self.no_score || snaps.is_empty() {
            return;
        }
        let delta = calculate_line_score(snaps, line_type, self.cascade);
        let leveled = scorer.add(delta);
        let at = snaps[0].index;
        events.push(GameEvent::ScoreChanged {
            delta,
            cascade: self.cascade,
            at: (board.col_of(at), board.row_of(at)),
        });
        if leveled {
            events.push(GameEvent::LevelUp {
                level: scorer.level,
            });
            events.push(GameEvent::Cue(SoundCue::LevelUp));
        }
    }

    /// Start the line-removal wave: score the found lines, pull item tiles
    /// out for their own effect steps, and fade the plain tiles.
    fn remove_lines(
        &mut self,
        board: &mut Board,
        scorer: &mut ScoreBoard,
        events: &mut Vec<GameEvent>,
    ) {
        let lines = std::mem::take(&mut self.pending_lines);
        if !self.no_score {
            let mut delta = 0;
            for line in &lines {
                delta += calculate_line_score(&line.tiles, line.line_type, self.cascade);
            }
            let leveled = scorer.add(delta);
            scorer.add_lines(lines.len() as u32);
            let at = lines[0].tiles[0].index;
            events.push(GameEvent::ScoreChanged {
                delta,
                cascade: self.cascade,
                at: (board.col_of(at), board.row_of(at)),
            });
            events.push(GameEvent::LineConsumed {
                count: lines.len() as u32,
            });
            if leveled {
                events.push(GameEvent::LevelUp {
                    level: scorer.level,
                });
                events.push(GameEvent::Cue(SoundCue::LevelUp));
            }
        }
        for line in lines {
            self.chain().push(line);
        }

        if !self.no_items {
            // Item tiles leave the immediate removal and wait for their
            // own cascade step. Multipliers stay: their effect is the
            // score factor already applied above.
            for (class, set) in [
                (TileClass::Bomb, &mut self.bomb_set),
                (TileClass::Rocket, &mut self.rocket_set),
                (TileClass::Star, &mut self.star_set),
                (TileClass::Gravity, &mut self.gravity_set),
            ] {
                let mut found = HashSet::new();
                board.scan_for(class, &self.tile_removal_set, &mut found);
                for i in &found {
                    self.tile_removal_set.remove(i);
                }
                set.extend(found);
            }
        }

        for &i in &self.tile_removal_set {
            if let Some(tile) = board.tile_mut(i) {
                tile.start(Animation::fade(FADE_TICKS));
            }
            self.batch.push(i);
        }
        events.push(GameEvent::Cue(SoundCue::LineClear));
        self.phase = RemovalPhase::Animating(RemovalKind::Line);
    }

    /// Item tiles in `removal` (other than the ones firing right now) are
    /// pulled out into their per-class sets for a future cascade step. A
    /// tile already queued is pulled out too; it must stay on the grid
    /// until its own wave fires.
    fn extract_new_items(
        &mut self,
        board: &Board,
        removal: &mut HashSet<usize>,
        firing: &HashSet<usize>,
    ) {
        for (class, set) in [
            (TileClass::Bomb, &mut self.bomb_set),
            (TileClass::Rocket, &mut self.rocket_set),
            (TileClass::Star, &mut self.star_set),
            (TileClass::Gravity, &mut self.gravity_set),
        ] {
            let mut found = HashSet::new();
            board.scan_for(class, removal, &mut found);
            for i in found {
                if firing.contains(&i) {
                    continue;
                }
                removal.remove(&i);
                set.insert(i);
            }
        }
    }

    fn remove_rockets(
        &mut self,
        board: &mut Board,
        scorer: &mut ScoreBoard,
        events: &mut Vec<GameEvent>,
    ) {
        let rockets = std::mem::take(&mut self.rocket_set);
        assert!(!rockets.is_empty(), "rocket removal with no rockets queued");
        let mut removal = board.process_rockets(&rockets);
        self.extract_new_items(board, &mut removal, &rockets);

        let snaps: Vec<TileSnapshot> = removal.iter().map(|&i| board.snapshot(i)).collect();
        self.award(&snaps, LineType::Rocket, board, scorer, events);
        let mut line = LineRecord::builder(LineType::Rocket);
        for snap in &snaps {
            line.push(*snap);
        }
        let line = line.build();
        self.chain().push(line);

        let columns = board.columns();
        let rows = board.rows();
        for &i in &removal {
            let (col, row) = (board.col_of(i), board.row_of(i));
            let tile = board.tile_mut(i).expect("rocket removal of empty cell");
            if rockets.contains(&i) {
                let (to_x, to_y) = match tile.kind {
                    TileKind::Rocket(RocketDirection::Up) => (col as f32, 0.0),
                    TileKind::Rocket(RocketDirection::Down) => (col as f32, (rows - 1) as f32),
                    TileKind::Rocket(RocketDirection::Left) => (0.0, row as f32),
                    TileKind::Rocket(RocketDirection::Right) => ((columns - 1) as f32, row as f32),
                    _ => unreachable!("non-rocket in rocket set"),
                };
                tile.start(Animation::Move {
                    to_x,
                    to_y,
                    speed: ROCKET_SPEED,
                });
            } else {
                tile.start(Animation::fade(FADE_TICKS));
            }
            self.batch.push(i);
        }
        self.tile_removal_set = removal;
        events.push(GameEvent::Cue(SoundCue::RocketLaunch));
        self.phase = RemovalPhase::Animating(RemovalKind::Rocket);
    }

    fn remove_stars(
        &mut self,
        board: &mut Board,
        scorer: &mut ScoreBoard,
        events: &mut Vec<GameEvent>,
    ) {
        let stars = std::mem::take(&mut self.star_set);
        assert!(!stars.is_empty(), "star removal with no stars queued");
        // A star only detonates tiles of the immediately preceding match;
        // the match set is overwritten on every scan, so earlier cascade
        // steps are out of its reach.
        let mut removal: HashSet<usize> = stars.clone();
        for &i in &self.last_match_set {
            if board.tile(i).is_some() {
                removal.insert(i);
            }
        }
        self.extract_new_items(board, &mut removal, &stars);

        let snaps: Vec<TileSnapshot> = removal.iter().map(|&i| board.snapshot(i)).collect();
        self.award(&snaps, LineType::Star, board, scorer, events);
        let mut line = LineRecord::builder(LineType::Star);
        for snap in &snaps {
            line.push(*snap);
        }
        let line = line.build();
        self.chain().push(line);

        for &i in &removal {
            if let Some(tile) = board.tile_mut(i) {
                tile.start(Animation::fade(FADE_TICKS));
            }
            self.batch.push(i);
        }
        self.tile_removal_set = removal;
        events.push(GameEvent::Cue(SoundCue::StarBurst));
        self.phase = RemovalPhase::Animating(RemovalKind::Star);
    }

    fn remove_bombs(
        &mut self,
        board: &mut Board,
        scorer: &mut ScoreBoard,
        events: &mut Vec<GameEvent>,
    ) {
        let bombs = std::mem::take(&mut self.bomb_set);
        assert!(!bombs.is_empty(), "bomb removal with no bombs queued");
        let mut removal = board.process_bombs(&bombs);
        // If the blast set contains no bomb, the match finder and the item
        // scanner disagree; the board state can no longer be trusted.
        let mut check = HashSet::new();
        let found = board.scan_for(TileClass::Bomb, &removal, &mut check);
        assert!(found > 0, "bomb removal set contains no bomb tile");
        self.extract_new_items(board, &mut removal, &bombs);

        let snaps: Vec<TileSnapshot> = removal.iter().map(|&i| board.snapshot(i)).collect();
        self.award(&snaps, LineType::Bomb, board, scorer, events);
        let mut line = LineRecord::builder(LineType::Bomb);
        for snap in &snaps {
            line.push(*snap);
        }
        let line = line.build();
        self.chain().push(line);

        for &i in &removal {
            if let Some(tile) = board.tile_mut(i) {
                tile.start(Animation::fade(FADE_TICKS));
            }
            self.batch.push(i);
        }
        self.tile_removal_set = removal;
        events.push(GameEvent::Cue(SoundCue::BombExplode));
        self.phase = RemovalPhase::Animating(RemovalKind::Bomb);
    }

    /// Poll the current wave; once every animation reports finished,
    /// delete the tiles and dispatch exactly one follow-up: the highest
    /// priority non-empty item set, or the gravity shift, or a plain
    /// refactor. Other pending item categories wait for subsequent steps.
    fn process_removal(
        &mut self,
        board: &mut Board,
        refactorer: &mut GravityRefactorer,
        gravity: &mut Gravity,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.batch.all_finished(board) {
            return;
        }
        board.remove_tiles(&self.tile_removal_set);
        self.tile_removal_set.clear();
        self.batch.clear();

        if !self.rocket_set.is_empty() {
            self.phase = RemovalPhase::StartRocket;
        } else if !self.star_set.is_empty() {
            self.phase = RemovalPhase::StartStar;
        } else if !self.bomb_set.is_empty() {
            self.phase = RemovalPhase::StartBomb;
        } else if !self.gravity_set.is_empty() {
            board.remove_tiles(&self.gravity_set);
            self.gravity_set.clear();
            gravity.flip_horizontal();
            events.push(GameEvent::Cue(SoundCue::GravityShift));
            self.close_chain();
            refactorer.start_refactor(RefactorSpeed::Shift);
            self.phase = RemovalPhase::Idle;
        } else {
            self.close_chain();
            refactorer.start_refactor(RefactorSpeed::Normal);
            self.phase = RemovalPhase::Idle;
        }
    }
}

impl Default for TileRemover {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dropper::{DropConfig, Lcg, TileDropper};
    use crate::refactor::RefactorSpeeds;
    use crate::tile::{HorizontalGravity, TileColor};

    struct Rig {
        board: Board,
        refactorer: GravityRefactorer,
        dropper: TileDropper,
        remover: TileRemover,
        scorer: ScoreBoard,
        gravity: Gravity,
        events: Vec<GameEvent>,
    }

    impl Rig {
        fn new(columns: usize, rows: usize) -> Self {
            Self {
                board: Board::new(columns, rows),
                refactorer: GravityRefactorer::new(RefactorSpeeds::default()),
                dropper: TileDropper::new(DropConfig::default(), Lcg::new(1)),
                remover: TileRemover::new(),
                scorer: ScoreBoard::new(1),
                gravity: Gravity::DOWN_LEFT,
                events: Vec::new(),
            }
        }

        fn tick(&mut self) -> bool {
            self.board.tick_animations();
            self.refactorer.tick(&mut self.board, self.gravity);
            self.remover.tick(
                &mut self.board,
                &mut self.refactorer,
                &self.dropper,
                &mut self.gravity,
                &mut self.scorer,
                &mut self.events,
            )
        }

        /// Kick a refactor (as a piece commit would) and run until the
        /// move settles.
        fn run_move(&mut self) -> u32 {
            self.remover.begin_move();
            self.refactorer.start_refactor(RefactorSpeed::Drop);
            let mut ticks = 0;
            loop {
                ticks += 1;
                assert!(ticks < 10_000, "cascade did not terminate");
                if self.tick() {
                    return ticks;
                }
            }
        }
    }

    fn place(board: &mut Board, cells: &[(usize, usize, TileColor, TileKind)]) {
        for &(col, row, color, kind) in cells {
            board.create_tile(board.index(col, row), color, kind);
        }
    }

    #[test]
    fn plain_match_scores_and_clears() {
        use TileColor::Blue;
        let mut rig = Rig::new(8, 10);
        place(
            &mut rig.board,
            &[
                (0, 9, Blue, TileKind::Normal),
                (1, 9, Blue, TileKind::Normal),
                (2, 9, Blue, TileKind::Normal),
            ],
        );
        rig.run_move();
        assert_eq!(rig.board.occupied_count(), 0);
        assert_eq!(rig.scorer.score, 150);
        let record = rig.remover.take_move_record();
        assert_eq!(record.chain_count(), 1);
        assert_eq!(record.tile_count(), 3);
    }

    #[test]
    fn bomb_in_match_gets_its_own_cascade_step() {
        use TileColor::Blue;
        let mut rig = Rig::new(8, 10);
        // Bottom row: blue blue blue(bomb), plus a red bystander in blast range.
        place(
            &mut rig.board,
            &[
                (0, 9, Blue, TileKind::Normal),
                (1, 9, Blue, TileKind::Normal),
                (2, 9, Blue, TileKind::Bomb),
                (3, 9, TileColor::Red, TileKind::Normal),
            ],
        );
        rig.run_move();
        // The bomb's blast consumed the bystander too.
        assert_eq!(rig.board.occupied_count(), 0);
        let record = rig.remover.take_move_record();
        // One chain holding the line wave and the bomb wave.
        assert_eq!(record.chain_count(), 1);
        assert!(record.chains[0]
            .lines
            .iter()
            .any(|l| l.line_type == LineType::Bomb));
        assert!(rig
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::Cue(SoundCue::BombExplode))));
    }

    #[test]
    fn rocket_fires_before_bomb() {
        use TileColor::{Blue, Green};
        let mut rig = Rig::new(8, 10);
        // One match containing both a rocket and a bomb tile.
        place(
            &mut rig.board,
            &[
                (0, 9, Blue, TileKind::Rocket(RocketDirection::Up)),
                (1, 9, Blue, TileKind::Normal),
                (2, 9, Blue, TileKind::Bomb),
                (0, 5, Green, TileKind::Normal), // on the rocket's path
            ],
        );
        rig.run_move();
        assert_eq!(rig.board.occupied_count(), 0);
        let cues: Vec<&GameEvent> = rig
            .events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::Cue(SoundCue::RocketLaunch) | GameEvent::Cue(SoundCue::BombExplode)
                )
            })
            .collect();
        assert!(matches!(
            cues[0],
            GameEvent::Cue(SoundCue::RocketLaunch)
        ));
        assert!(matches!(cues[1], GameEvent::Cue(SoundCue::BombExplode)));
    }

    #[test]
    fn gravity_item_flips_direction() {
        use TileColor::Red;
        let mut rig = Rig::new(8, 10);
        place(
            &mut rig.board,
            &[
                (0, 9, Red, TileKind::Normal),
                (1, 9, Red, TileKind::Gravity),
                (2, 9, Red, TileKind::Normal),
                (7, 0, TileColor::Blue, TileKind::Normal),
            ],
        );
        rig.run_move();
        assert_eq!(rig.gravity.horizontal, HorizontalGravity::Right);
        // The bystander compacted to the bottom-right corner.
        let corner = rig.board.index(7, 9);
        assert!(rig.board.tile(corner).is_some());
        assert_eq!(rig.board.occupied_count(), 1);
    }

    #[test]
    fn cascades_chain_until_quiescent() {
        use TileColor::{Blue, Red};
        let mut rig = Rig::new(8, 10);
        // Clearing the red run drops the blue at (2,8) next to the two
        // resting blues, completing a second match one cascade later.
        use TileColor::Green;
        place(
            &mut rig.board,
            &[
                (0, 9, Blue, TileKind::Normal),
                (1, 9, Blue, TileKind::Normal),
                (2, 9, Red, TileKind::Normal),
                (3, 9, Red, TileKind::Normal),
                (4, 9, Red, TileKind::Normal),
                (0, 8, Green, TileKind::Normal),
                (1, 8, Green, TileKind::Normal),
                (2, 8, Blue, TileKind::Normal),
            ],
        );
        rig.run_move();
        // Only the two greens survive.
        assert_eq!(rig.board.occupied_count(), 2);
        let record = rig.remover.take_move_record();
        assert_eq!(record.chain_count(), 2);
        assert_eq!(record.chains[1].cascade, 2);
        // Second chain scored double via the cascade multiplier.
        let deltas: Vec<u32> = rig
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::ScoreChanged { delta, .. } => Some(*delta),
                _ => None,
            })
            .collect();
        assert_eq!(deltas, vec![150, 300]);
    }

    #[test]
    fn settles_without_matches() {
        let mut rig = Rig::new(4, 4);
        let ticks = rig.run_move();
        assert!(ticks > 0);
        assert!(rig.remover.is_idle());
    }

    #[test]
    fn level_up_clear_awards_no_score() {
        use TileColor::{Blue, Green, Red};
        let mut rig = Rig::new(8, 10);
        place(
            &mut rig.board,
            &[
                (0, 9, Red, TileKind::Normal),
                (1, 9, Blue, TileKind::Bomb),
                (2, 9, Green, TileKind::Normal),
            ],
        );
        rig.remover.start_level_up_clear(&rig.board, rig.gravity);
        let mut ticks = 0;
        loop {
            ticks += 1;
            assert!(ticks < 1000);
            if rig.tick() {
                break;
            }
        }
        assert_eq!(rig.board.occupied_count(), 0);
        assert_eq!(rig.scorer.score, 0);
        // Suppressed item effects: the bomb was cleared, never detonated.
        assert!(!rig
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::Cue(SoundCue::BombExplode))));
    }

    #[test]
    fn star_and_bomb_in_one_match_each_get_their_own_wave() {
        use TileColor::Red;
        let mut rig = Rig::new(8, 10);
        // The star's burst covers the match set, which still holds the
        // queued bomb; the bomb must survive that wave and detonate later.
        place(
            &mut rig.board,
            &[
                (0, 9, Red, TileKind::Normal),
                (1, 9, Red, TileKind::Star),
                (2, 9, Red, TileKind::Bomb),
            ],
        );
        rig.run_move();
        assert_eq!(rig.board.occupied_count(), 0);
        let cues: Vec<&GameEvent> = rig
            .events
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    GameEvent::Cue(SoundCue::StarBurst) | GameEvent::Cue(SoundCue::BombExplode)
                )
            })
            .collect();
        assert!(matches!(cues[0], GameEvent::Cue(SoundCue::StarBurst)));
        assert!(matches!(cues[1], GameEvent::Cue(SoundCue::BombExplode)));
        let record = rig.remover.take_move_record();
        let types: Vec<LineType> = record.chains[0].lines.iter().map(|l| l.line_type).collect();
        assert!(types.contains(&LineType::Star));
        assert!(types.contains(&LineType::Bomb));
    }

    #[test]
    fn star_only_detonates_the_preceding_match() {
        use TileColor::{Blue, Red};
        let mut rig = Rig::new(8, 10);
        // A red match containing a star; an unrelated blue pair far away
        // must survive the star burst.
        place(
            &mut rig.board,
            &[
                (0, 9, Red, TileKind::Normal),
                (1, 9, Red, TileKind::Star),
                (2, 9, Red, TileKind::Normal),
                (6, 9, Blue, TileKind::Normal),
                (7, 9, Blue, TileKind::Normal),
            ],
        );
        rig.run_move();
        assert_eq!(rig.board.occupied_count(), 2);
        assert!(rig
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::Cue(SoundCue::StarBurst))));
    }
}
