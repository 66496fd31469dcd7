//! Per-session configuration.
//!
//! Every tunable the engine reads lives here: grid size and tray count come
//! from persisted settings, the rest are balance numbers. A `SessionConfig`
//! is built once at session start, validated, and never mutated afterwards.

/// Grid sides the game supports.
pub const GRID_SIZES: [usize; 3] = [10, 15, 20];

/// Maximum number of tray slots.
pub const TRAY_MAX: usize = 4;

/// Scoring and combo balance.
#[derive(Debug, Clone, Copy)]
pub struct ScoreRules {
    pub per_placed_cell: u64,
    pub per_cleared_cell: u64,
    pub line_bonus: u64,
    pub multi_line_bonus: u64,
    pub multiplier_cap: f32,
    /// Consecutive non-clearing moves tolerated before the combo resets.
    pub miss_streak_limit: u32,
}

impl Default for ScoreRules {
    fn default() -> Self {
        Self {
            per_placed_cell: 1,
            per_cleared_cell: 10,
            line_bonus: 25,
            multi_line_bonus: 50,
            multiplier_cap: 20.0,
            miss_streak_limit: 3,
        }
    }
}

/// Weighted-draw behaviour of the piece bag.
#[derive(Debug, Clone, Copy)]
pub struct BagRules {
    /// Entries drawn per refill, independent of catalog size.
    pub bag_size: usize,
    /// Score at which the difficulty ramp tops out.
    pub ramp_ceiling: u64,
    /// Positive weight floor so every shape stays reachable.
    pub min_weight: f32,
}

impl Default for BagRules {
    fn default() -> Self {
        Self {
            bag_size: 24,
            ramp_ceiling: 75_000,
            min_weight: 0.01,
        }
    }
}

/// Durations (seconds) and magnitudes (grid-cell units) for visual effects.
///
/// The renderer maps one grid cell to a 2x1 block of terminal cells, so
/// speeds and distances here are tuned for that scale.
#[derive(Debug, Clone, Copy)]
pub struct EffectRules {
    pub clear_flash_time: f32,
    pub place_pop_time: f32,
    pub return_time: f32,
    pub shake_time: f32,
    pub shake_strength: f32,
    pub shake_multiline_boost: f32,
    pub particle_life: (f32, f32),
    pub particle_speed: (f32, f32),
    pub particle_gravity: f32,
    pub particles_per_cleared_cell: usize,
    pub particles_cap_per_clear: usize,
    pub max_particles: usize,
    pub bonus_life: f32,
    pub bonus_rise_speed: f32,
    pub bonus_particles: usize,
    pub max_bonus_popups: usize,
    pub combo_pop_life: f32,
    pub combo_pop_particles_base: usize,
}

impl Default for EffectRules {
    fn default() -> Self {
        Self {
            clear_flash_time: 0.22,
            place_pop_time: 0.18,
            return_time: 0.22,
            shake_time: 0.22,
            shake_strength: 1.5,
            shake_multiline_boost: 1.6,
            particle_life: (0.30, 0.60),
            particle_speed: (2.2, 5.5),
            particle_gravity: 13.0,
            particles_per_cleared_cell: 15,
            particles_cap_per_clear: 500,
            max_particles: 1000,
            bonus_life: 1.75,
            bonus_rise_speed: 1.4,
            bonus_particles: 50,
            max_bonus_popups: 24,
            combo_pop_life: 1.75,
            combo_pop_particles_base: 50,
        }
    }
}

/// Immutable configuration for one play session.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub grid_size: usize,
    pub tray_count: usize,
    pub score: ScoreRules,
    pub bag: BagRules,
    pub effects: EffectRules,
    /// Cell count range for the scramble start mode (inclusive).
    pub scramble_fill: (usize, usize),
}

impl SessionConfig {
    pub fn new(grid_size: usize, tray_count: usize) -> Self {
        Self {
            grid_size,
            tray_count,
            score: ScoreRules::default(),
            bag: BagRules::default(),
            effects: EffectRules::default(),
            scramble_fill: (16, 28),
        }
    }

    /// Startup precondition check. A session must refuse to start on a bad
    /// configuration rather than run with undefined behaviour.
    pub fn validate(&self) -> Result<(), String> {
        if !GRID_SIZES.contains(&self.grid_size) {
            return Err(format!("unsupported grid size {}", self.grid_size));
        }
        if self.tray_count == 0 || self.tray_count > TRAY_MAX {
            return Err(format!("tray count {} out of range", self.tray_count));
        }
        if self.bag.bag_size == 0 {
            return Err("bag size must be positive".to_string());
        }
        if self.bag.min_weight <= 0.0 || self.bag.min_weight >= 1.0 {
            return Err(format!("min weight {} out of (0, 1)", self.bag.min_weight));
        }
        if self.bag.ramp_ceiling == 0 {
            return Err("ramp ceiling must be positive".to_string());
        }
        if self.scramble_fill.0 > self.scramble_fill.1 {
            return Err("scramble fill range is inverted".to_string());
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(10, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_unsupported_grid_size() {
        let cfg = SessionConfig::new(12, 4);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_tray() {
        let cfg = SessionConfig::new(10, 0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_degenerate_bag() {
        let mut cfg = SessionConfig::default();
        cfg.bag.bag_size = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = SessionConfig::default();
        cfg.bag.min_weight = 0.0;
        assert!(cfg.validate().is_err());
    }
}
