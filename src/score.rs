//! Scoring and combo engine.
//!
//! Every completed placement is scored in one call: placement points always,
//! clear points when lines completed. The combo climbs by the number of
//! lines cleared per move and survives a short streak of non-clearing moves
//! before it resets.

use crate::config::ScoreRules;

/// What one scored move produced. Drives popups and logging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveScore {
    /// Placement points plus clear points.
    pub total_gain: u64,
    /// Clear portion only; zero on a non-clearing move.
    pub clear_gain: u64,
    /// Multiplier applied this move.
    pub multiplier: f32,
}

/// Running score and combo state for one session.
#[derive(Debug, Clone)]
pub struct ScoreState {
    /// Current score
    pub score: u64,
    /// Best score seen, seeded from the persisted table at session start
    pub high_score: u64,
    /// Current combo (0 = none)
    pub combo: u32,
    /// Peak combo this session
    pub highest_combo: u32,
    /// Non-clearing moves since the last clear
    pub miss_streak: u32,
    /// Multiplier applied on the previous move
    pub last_move_mult: f32,
}

impl ScoreState {
    pub fn new() -> Self {
        Self::with_high_score(0)
    }

    pub fn with_high_score(high_score: u64) -> Self {
        Self {
            score: 0,
            high_score,
            combo: 0,
            highest_combo: 0,
            miss_streak: 0,
            last_move_mult: 1.0,
        }
    }

    /// Score one completed placement.
    ///
    /// A clearing move grows the combo by `lines` and multiplies the clear
    /// points. A miss while a combo is alive carries the previous multiplier
    /// forward until the streak exceeds the limit, at which point combo and
    /// multiplier fall back to their ground state.
    pub fn apply_move(
        &mut self,
        rules: &ScoreRules,
        placed_cells: usize,
        lines: usize,
        cleared_cells: usize,
    ) -> MoveScore {
        let mut total = placed_cells as u64 * rules.per_placed_cell;
        let mut clear_gain = 0u64;
        let mut mult = 1.0f32;

        if lines > 0 {
            self.combo += lines as u32;
            self.highest_combo = self.highest_combo.max(self.combo);
            self.miss_streak = 0;

            mult = (1.0 + self.combo as f32).min(rules.multiplier_cap);

            let subtotal = cleared_cells as u64 * rules.per_cleared_cell
                + lines as u64 * rules.line_bonus
                + if lines > 1 {
                    (lines as u64 - 1) * rules.multi_line_bonus
                } else {
                    0
                };
            clear_gain = (subtotal as f32 * mult).round() as u64;
            total += clear_gain;
        } else if self.combo > 0 {
            self.miss_streak += 1;
            if self.miss_streak > rules.miss_streak_limit {
                self.combo = 0;
                self.miss_streak = 0;
            } else {
                mult = self.last_move_mult;
            }
        }

        self.last_move_mult = mult;
        self.score += total;
        self.high_score = self.high_score.max(self.score);

        MoveScore {
            total_gain: total,
            clear_gain,
            multiplier: mult,
        }
    }
}

impl Default for ScoreState {
    fn default() -> Self {
        Self::new()
    }
}
