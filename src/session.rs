//! Core session state and turn logic.
//!
//! The session owns the grid, tray, bag, score and animation state; nothing
//! else mutates them. Input arrives as three intents (begin drag, move
//! pointer, release) in grid-cell coordinates, and one `tick` call advances
//! all timers at a fixed step. Cell removal after a clear is deferred until
//! the flash expires, and the flash is the only thing that blocks drops.

use crate::bag::WeightedBag;
use crate::config::SessionConfig;
use crate::effects::AnimationState;
use crate::grid::{ClearMask, Grid};
use crate::score::ScoreState;
use crate::tray::Tray;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

/// How the grid starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Empty,
    /// A random handful of pre-filled cells.
    Scramble,
}

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Playing,
    GameOver,
}

/// Sounds the session asks for; the shell drains these each frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEvent {
    Selected,
    Placed,
    LinesBroken,
    Returned,
}

/// A piece being dragged out of the tray.
#[derive(Debug, Clone, Copy)]
pub struct DragState {
    pub slot: usize,
    /// Shape cell the pointer grabbed; stays under the pointer while
    /// dragging and anchors the snap on release.
    pub grab: (usize, usize),
}

/// Ghost preview of the pending drop, recomputed on every pointer move.
#[derive(Debug, Clone, Default)]
pub struct Preview {
    /// Snapped origin cell; None while the pointer is off the grid.
    pub cell: Option<(i32, i32)>,
    pub can_drop: bool,
    /// Rows and columns that would complete if dropped here.
    pub predicted: Option<(Vec<bool>, Vec<bool>)>,
}

/// One play session from first deal to game over.
pub struct Session {
    pub config: SessionConfig,
    pub grid: Grid,
    pub tray: Tray,
    pub stats: ScoreState,
    pub anim: AnimationState,
    pub state: SessionState,
    bag: WeightedBag,
    rng: ChaCha8Rng,
    drag: Option<DragState>,
    preview: Preview,
    /// Mask awaiting the end of the clear flash.
    pending_clear: Option<ClearMask>,
    /// Last pointer position in grid-cell coordinates.
    pointer: (f32, f32),
    sounds: Vec<SoundEvent>,
}

impl Session {
    pub fn new(config: SessionConfig, start: StartMode, high_score: u64) -> Result<Self, String> {
        Self::with_seed(config, start, high_score, rand::random())
    }

    /// Create a session with a fixed seed for reproducible deals.
    pub fn with_seed(
        config: SessionConfig,
        start: StartMode,
        high_score: u64,
        seed: u64,
    ) -> Result<Self, String> {
        config.validate()?;

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut bag = WeightedBag::with_seed(config.bag, rng.r#gen());
        let mut grid = Grid::new(config.grid_size);

        if start == StartMode::Scramble {
            let (lo, hi) = config.scramble_fill;
            grid.random_fill(rng.gen_range(lo..=hi), &mut rng);
            // A lucky scramble may complete lines; wipe them before play
            // with no flash and no points.
            let mask = grid.build_clear_mask();
            if !mask.is_empty() {
                grid.apply_clear(&mask);
            }
        }

        let mut tray = Tray::new(config.tray_count);
        tray.refill(&mut bag, 0, &mut rng);

        let mut session = Self {
            config,
            anim: AnimationState::new(config.grid_size, config.effects),
            grid,
            tray,
            stats: ScoreState::with_high_score(high_score),
            state: SessionState::Playing,
            bag,
            rng,
            drag: None,
            preview: Preview::default(),
            pending_clear: None,
            pointer: (0.0, 0.0),
            sounds: Vec::new(),
        };

        // A scramble can open unsolvable; check before the first input.
        if session.tray.none_placeable(&session.grid) {
            session.game_over();
        }
        Ok(session)
    }

    pub fn drag(&self) -> Option<DragState> {
        self.drag
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    pub fn pending_clear(&self) -> Option<&ClearMask> {
        self.pending_clear.as_ref()
    }

    pub fn pointer(&self) -> (f32, f32) {
        self.pointer
    }

    /// Sounds requested since the last drain.
    pub fn take_sounds(&mut self) -> Vec<SoundEvent> {
        std::mem::take(&mut self.sounds)
    }

    /// Pick up an unused tray piece. Allowed even while a clear flash runs;
    /// only the drop is gated on it.
    pub fn begin_drag(&mut self, slot: usize, grab: (usize, usize)) {
        if self.state != SessionState::Playing {
            return;
        }
        let Some(piece) = self.tray.slot(slot) else {
            return;
        };
        if piece.used {
            return;
        }
        self.sounds.push(SoundEvent::Selected);
        self.drag = Some(DragState { slot, grab });
        self.update_preview();
    }

    /// Track the pointer in grid-cell coordinates.
    pub fn update_pointer(&mut self, x: f32, y: f32) {
        self.pointer = (x, y);
        if self.drag.is_some() {
            self.update_preview();
        }
    }

    /// Drop the dragged piece. Invalid positions send it flying back to its
    /// tray slot; valid ones stamp the grid, score the move and start the
    /// clear flash when lines complete.
    pub fn release_drag(&mut self) {
        if self.state != SessionState::Playing {
            return;
        }
        // The drag survives a release during the flash; the piece stays on
        // the pointer until a drop is allowed again.
        if self.anim.is_clearing() {
            return;
        }
        let Some(drag) = self.drag.take() else {
            return;
        };

        let old_mult = self.stats.last_move_mult;
        let Some(piece) = self.tray.slot(drag.slot).copied() else {
            return;
        };
        if piece.used {
            self.sounds.push(SoundEvent::Returned);
            self.clear_preview();
            return;
        }

        let target = if self.preview.can_drop {
            self.preview.cell
        } else {
            None
        };
        let Some((gx, gy)) = target else {
            self.sounds.push(SoundEvent::Returned);
            self.anim.begin_return(drag.slot, self.pointer);
            self.clear_preview();
            return;
        };

        self.sounds.push(SoundEvent::Placed);
        let shape = piece.shape();
        self.grid.place(shape, gx, gy, piece.theme);

        let mut placed_cells = 0;
        for (sx, sy) in shape.filled_cells() {
            placed_cells += 1;
            let (x, y) = (gx + sx as i32, gy + sy as i32);
            if x >= 0 && y >= 0 {
                self.anim.start_pop(x as usize, y as usize);
            }
        }

        let mask = self.grid.build_clear_mask();
        let lines = mask.lines;
        let cleared_cells = if lines > 0 {
            self.sounds.push(SoundEvent::LinesBroken);
            self.grid.count_cells_in(&mask)
        } else {
            0
        };

        let outcome =
            self.stats
                .apply_move(&self.config.score, placed_cells, lines, cleared_cells);
        debug!(
            gain = outcome.total_gain,
            lines,
            combo = self.stats.combo,
            "piece dropped"
        );

        if lines > 0 && outcome.multiplier > old_mult + 0.001 {
            self.anim
                .start_combo_popup(self.stats.combo, outcome.multiplier, piece.theme);
        }

        if lines > 0 {
            self.spawn_clear_bursts(&mask, piece.theme);
            if outcome.clear_gain > 0 {
                let (bx, by) = (self.grid.size() as f32, self.grid.size() as f32 + 0.125);
                self.anim.spawn_bonus_popup(
                    bx,
                    by,
                    outcome.clear_gain,
                    outcome.multiplier,
                    piece.theme,
                );
                self.anim
                    .spawn_burst(bx, by, piece.theme, self.config.effects.bonus_particles);
            }
            self.pending_clear = Some(mask);
            self.anim.begin_clear_flash();
            self.anim.begin_shake(lines);
        }

        self.tray.mark_used(drag.slot);
        if self.tray.all_used() {
            self.tray
                .refill(&mut self.bag, self.stats.score, &mut self.rng);
        }

        if !self.anim.is_clearing() && self.tray.none_placeable(&self.grid) {
            self.game_over();
        }
        self.clear_preview();
    }

    /// Advance one fixed simulation tick.
    pub fn tick(&mut self, dt: f32) {
        let signals = self.anim.advance(dt);
        if signals.clear_finished {
            self.finish_clear();
        }
        if self.drag.is_some() {
            self.update_preview();
        }
    }

    /// Host suspend: abort any drag or return animation mid-flight. The
    /// grid is never left half-mutated because placement and clear start
    /// are atomic within one call.
    pub fn cancel_transient(&mut self) {
        self.drag = None;
        self.anim.cancel_return();
        self.clear_preview();
    }

    /// The flash ended: actually remove the flagged cells, then see whether
    /// anything on offer still fits.
    fn finish_clear(&mut self) {
        if let Some(mask) = self.pending_clear.take() {
            self.grid.apply_clear(&mask);
        }
        if self.state == SessionState::Playing && self.tray.none_placeable(&self.grid) {
            self.game_over();
        }
    }

    fn game_over(&mut self) {
        info!(
            score = self.stats.score,
            highest_combo = self.stats.highest_combo,
            "game over: none of the offered pieces can be placed"
        );
        self.state = SessionState::GameOver;
        self.drag = None;
        self.clear_preview();
    }

    /// Per-cell particle bursts over the flagged cells, capped per clear.
    fn spawn_clear_bursts(&mut self, mask: &ClearMask, theme: crate::theme::Theme) {
        let rules = self.config.effects;
        let size = self.grid.size();
        let mut spawned = 0;
        'grid: for y in 0..size {
            for x in 0..size {
                if !mask.contains(x, y) {
                    continue;
                }
                let n = rules
                    .particles_per_cleared_cell
                    .min(rules.particles_cap_per_clear - spawned);
                if n == 0 {
                    break 'grid;
                }
                self.anim
                    .spawn_burst(x as f32 + 0.5, y as f32 + 0.5, theme, n);
                spawned += n;
            }
        }
    }

    /// Recompute the snapped cell, validity and predicted-clear overlay for
    /// the current pointer position.
    fn update_preview(&mut self) {
        self.preview = Preview::default();
        let Some(drag) = self.drag else {
            return;
        };
        let Some(piece) = self.tray.slot(drag.slot) else {
            return;
        };
        if piece.used {
            return;
        }

        let (px, py) = self.pointer;
        let span = self.grid.size() as f32;
        if px < 0.0 || px >= span || py < 0.0 || py >= span {
            return;
        }

        let gx = px.floor() as i32 - drag.grab.0 as i32;
        let gy = py.floor() as i32 - drag.grab.1 as i32;
        self.preview.cell = Some((gx, gy));
        self.preview.can_drop = self.grid.can_place(piece.shape(), gx, gy);
        if self.preview.can_drop {
            self.preview.predicted = Some(self.grid.predicted_full_lines(piece.shape(), gx, gy));
        }
    }

    fn clear_preview(&mut self) {
        self.preview = Preview::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::shape::catalog;
    use crate::theme::PALETTE;
    use crate::tray::PieceSlot;

    const DT: f32 = 1.0 / 30.0;

    fn session() -> Session {
        Session::with_seed(SessionConfig::default(), StartMode::Empty, 0, 1).unwrap()
    }

    fn shape_index(name: &str) -> usize {
        catalog().iter().position(|s| s.name == name).unwrap()
    }

    fn slot(name: &str) -> PieceSlot {
        PieceSlot {
            shape_index: shape_index(name),
            theme: PALETTE[0],
            used: false,
        }
    }

    fn fill_all_except(grid: &mut Grid, holes: &[(i32, i32)]) {
        let n = grid.size() as i32;
        for y in 0..n {
            for x in 0..n {
                if !holes.contains(&(x, y)) {
                    grid.set(x, y, Cell::Filled(PALETTE[3]));
                }
            }
        }
    }

    /// Drag `slot_index` and release it with the grab cell over (x, y).
    fn drop_at(session: &mut Session, slot_index: usize, x: i32, y: i32) {
        session.begin_drag(slot_index, (0, 0));
        session.update_pointer(x as f32 + 0.5, y as f32 + 0.5);
        session.release_drag();
    }

    #[test]
    fn test_rejects_invalid_config() {
        let cfg = SessionConfig::new(12, 4);
        assert!(Session::with_seed(cfg, StartMode::Empty, 0, 1).is_err());
    }

    #[test]
    fn test_drop_stamps_scores_and_marks_used() {
        let mut session = session();
        let shape = session.tray.slots()[0].shape();
        let cells = shape.cell_count();

        drop_at(&mut session, 0, 0, 0);

        assert_eq!(session.grid.occupied_count(), cells);
        assert_eq!(session.stats.score, cells as u64);
        assert!(session.tray.slots()[0].used);
        assert!(session.drag().is_none());

        let (sx, sy) = shape.filled_cells().next().unwrap();
        assert!(session.anim.pop_timer(sx, sy) > 0.0);

        let sounds = session.take_sounds();
        assert_eq!(sounds, vec![SoundEvent::Selected, SoundEvent::Placed]);
    }

    #[test]
    fn test_grab_offset_shifts_the_snap() {
        let mut session = session();
        session.tray = Tray::from_slots(vec![slot("O2")]);

        session.begin_drag(0, (1, 1));
        session.update_pointer(4.5, 4.5);
        assert_eq!(session.preview().cell, Some((3, 3)));
        assert!(session.preview().can_drop);
    }

    #[test]
    fn test_pointer_off_grid_kills_the_preview() {
        let mut session = session();
        session.begin_drag(0, (0, 0));

        session.update_pointer(-1.0, 4.0);
        assert_eq!(session.preview().cell, None);
        assert!(!session.preview().can_drop);

        session.update_pointer(4.5, 10.0);
        assert_eq!(session.preview().cell, None);
    }

    #[test]
    fn test_invalid_drop_returns_to_tray() {
        let mut session = session();
        fill_all_except(&mut session.grid, &[]);

        drop_at(&mut session, 0, 4, 4);

        assert!(!session.tray.slots()[0].used);
        assert!(session.anim.is_returning(0));
        assert_eq!(session.stats.score, 0);
        assert!(session.take_sounds().contains(&SoundEvent::Returned));
    }

    #[test]
    fn test_used_slot_cannot_be_dragged() {
        let mut session = session();
        drop_at(&mut session, 0, 0, 0);

        session.begin_drag(0, (0, 0));
        assert!(session.drag().is_none());
    }

    #[test]
    fn test_clear_is_deferred_until_flash_ends() {
        let mut session = session();
        session.tray = Tray::from_slots(vec![slot("1"), slot("1")]);
        // Row 7 complete except the drop target.
        for x in 0..10 {
            if x != 4 {
                session.grid.set(x, 7, Cell::Filled(PALETTE[2]));
            }
        }

        drop_at(&mut session, 0, 4, 7);

        // Scored immediately: 1 placed + (10*10 + 25) * 2 = 251.
        assert_eq!(session.stats.score, 251);
        assert_eq!(session.stats.combo, 1);
        assert!(session.take_sounds().contains(&SoundEvent::LinesBroken));

        // Cells stay on the grid while the flash runs.
        assert!(session.anim.is_clearing());
        assert!(session.pending_clear().is_some());
        assert_eq!(session.grid.occupied_count(), 10);

        // Drops are blocked mid-flash: the drag survives the release.
        session.begin_drag(1, (0, 0));
        session.update_pointer(2.5, 2.5);
        session.release_drag();
        assert!(session.drag().is_some());
        assert_eq!(session.grid.occupied_count(), 10);

        // Flash is 0.22s; eight ticks push past it and apply the mask.
        for _ in 0..8 {
            session.tick(DT);
        }
        assert!(!session.anim.is_clearing());
        assert_eq!(session.grid.occupied_count(), 0);

        // The held piece can drop now.
        session.release_drag();
        assert_eq!(session.grid.occupied_count(), 1);
    }

    #[test]
    fn test_cross_clear_counts_two_lines() {
        let mut session = session();
        session.tray = Tray::from_slots(vec![slot("1")]);
        for i in 0..10 {
            if i != 4 {
                session.grid.set(i, 4, Cell::Filled(PALETTE[2]));
                session.grid.set(4, i, Cell::Filled(PALETTE[2]));
            }
        }

        drop_at(&mut session, 0, 4, 4);
        assert_eq!(session.stats.combo, 2);

        // 19 cells once the shared cell is deduplicated:
        // 1 + (19*10 + 2*25 + 50) * 3 = 1 + 870.
        assert_eq!(session.stats.score, 871);

        for _ in 0..8 {
            session.tick(DT);
        }
        assert_eq!(session.grid.occupied_count(), 0);
    }

    #[test]
    fn test_direct_game_over_fires_once() {
        let mut session = session();
        session.tray = Tray::from_slots(vec![slot("1"), slot("O3")]);
        // Scattered single holes: the 1x1 fits, the 3x3 never will.
        fill_all_except(&mut session.grid, &[(0, 0), (3, 0), (0, 5), (5, 5)]);

        drop_at(&mut session, 0, 0, 0);

        assert_eq!(session.state, SessionState::GameOver);

        // Once over, the session ignores further input and stays over.
        session.begin_drag(1, (0, 0));
        assert!(session.drag().is_none());
        for _ in 0..10 {
            session.tick(DT);
        }
        assert_eq!(session.state, SessionState::GameOver);
    }

    #[test]
    fn test_game_over_waits_for_the_flash() {
        let mut session = session();
        session.tray = Tray::from_slots(vec![slot("1"), slot("O3")]);
        // Full grid except: row 5 entirely empty, plus the drop target at
        // (0, 0). Dropping completes only row 0; afterwards the empty space
        // is two separate 10x1 strips, so the 3x3 has nowhere to go.
        let mut holes: Vec<(i32, i32)> = (0..10).map(|x| (x, 5)).collect();
        holes.push((0, 0));
        fill_all_except(&mut session.grid, &holes);

        drop_at(&mut session, 0, 0, 0);

        // Still flashing: the verdict is deferred.
        assert!(session.anim.is_clearing());
        assert_eq!(session.state, SessionState::Playing);

        for _ in 0..8 {
            session.tick(DT);
        }
        assert_eq!(session.state, SessionState::GameOver);
    }

    #[test]
    fn test_tray_refills_after_last_piece() {
        let mut session = session();
        session.tray = Tray::from_slots(vec![slot("1"), slot("1")]);

        drop_at(&mut session, 0, 0, 0);
        drop_at(&mut session, 1, 5, 5);

        assert_eq!(session.tray.slots().len(), 2);
        assert!(session.tray.slots().iter().all(|s| !s.used));
        assert_eq!(session.state, SessionState::Playing);
    }

    #[test]
    fn test_scramble_start_never_leaves_full_lines() {
        let cfg = SessionConfig::default();
        let session = Session::with_seed(cfg, StartMode::Scramble, 0, 9).unwrap();

        let filled = session.grid.occupied_count();
        assert!(filled > 0 && filled <= cfg.scramble_fill.1);
        assert_eq!(session.grid.build_clear_mask().lines, 0);
    }

    #[test]
    fn test_suspend_cancels_drag_and_return() {
        let mut session = session();
        session.begin_drag(0, (0, 0));
        session.update_pointer(4.5, 4.5);

        session.cancel_transient();
        assert!(session.drag().is_none());
        assert_eq!(session.preview().cell, None);

        // A rejected piece mid-flight home is snapped back too.
        fill_all_except(&mut session.grid, &[]);
        drop_at(&mut session, 0, 4, 4);
        assert!(session.anim.is_returning(0));
        session.cancel_transient();
        assert!(!session.anim.is_returning(0));
    }

    #[test]
    fn test_high_score_seed_survives_low_scores() {
        let cfg = SessionConfig::default();
        let mut session = Session::with_seed(cfg, StartMode::Empty, 5000, 1).unwrap();
        drop_at(&mut session, 0, 0, 0);
        assert_eq!(session.stats.high_score, 5000);
        assert!(session.stats.score > 0);
    }

    #[test]
    fn test_seeded_sessions_deal_identically() {
        let a = Session::with_seed(SessionConfig::default(), StartMode::Empty, 0, 42).unwrap();
        let b = Session::with_seed(SessionConfig::default(), StartMode::Empty, 0, 42).unwrap();
        let deal = |s: &Session| -> Vec<usize> {
            s.tray.slots().iter().map(|p| p.shape_index).collect()
        };
        assert_eq!(deal(&a), deal(&b));
    }
}
