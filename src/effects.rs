//! Animation timers, particles and popups.
//!
//! Every live visual effect is one tagged variant in a single list, advanced
//! uniformly by `advance` once per simulation tick. The clear-flash effect is
//! the only one the turn logic waits on; everything else is cosmetic and may
//! be dropped when a pool is full.
//!
//! Positions and speeds are in grid-cell units with the grid's top-left
//! corner at (0, 0). The renderer maps those to terminal cells.

use crate::config::EffectRules;
use crate::theme::Theme;
use rand::Rng;
use ratatui::style::Color;
use std::f32::consts::TAU;

/// One live effect. Durations count down to zero, then the effect is removed.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Cleared cells flash before removal; blocks drops while alive.
    ClearFlash { t: f32 },
    /// A rejected piece flying from the release point back to its tray slot.
    Return {
        slot: usize,
        from: (f32, f32),
        t: f32,
    },
    /// Screen shake; amplitude decays linearly with remaining time.
    Shake { t: f32, strength: f32 },
    Particle {
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        life: f32,
        life0: f32,
        size: f32,
        color: Color,
    },
    /// "+N" score popup drifting upward while it fades.
    BonusPopup {
        x: f32,
        y: f32,
        vy: f32,
        life: f32,
        life0: f32,
        points: u64,
        mult: f32,
        theme: Theme,
    },
    /// The single "COMBO xN" banner; scales up with an ease-out curve while
    /// drifting across the grid.
    ComboPopup {
        x: f32,
        y: f32,
        vx: f32,
        vy: f32,
        life: f32,
        life0: f32,
        scale: f32,
        text: String,
        theme: Theme,
    },
}

/// What one tick of effect advancement produced.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickSignals {
    /// The clear flash just expired; the pending mask must be applied now.
    pub clear_finished: bool,
}

/// All animation state for one session.
#[derive(Debug, Clone)]
pub struct AnimationState {
    rules: EffectRules,
    grid_size: usize,
    effects: Vec<Effect>,
    /// Per-cell place-pop countdowns, row-major.
    pop: Vec<f32>,
    /// Shake offset sampled this tick, applied by the renderer.
    camera: (f32, f32),
}

impl AnimationState {
    pub fn new(grid_size: usize, rules: EffectRules) -> Self {
        Self {
            rules,
            grid_size,
            effects: Vec::new(),
            pop: vec![0.0; grid_size * grid_size],
            camera: (0.0, 0.0),
        }
    }

    pub fn effects(&self) -> &[Effect] {
        &self.effects
    }

    pub fn camera(&self) -> (f32, f32) {
        self.camera
    }

    pub fn is_clearing(&self) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, Effect::ClearFlash { .. }))
    }

    /// Remaining flash time, while a clear flash runs.
    pub fn clear_flash_remaining(&self) -> Option<f32> {
        self.effects.iter().find_map(|e| match e {
            Effect::ClearFlash { t } => Some(*t),
            _ => None,
        })
    }

    pub fn is_returning(&self, slot: usize) -> bool {
        self.effects
            .iter()
            .any(|e| matches!(e, Effect::Return { slot: s, .. } if *s == slot))
    }

    pub fn pop_timer(&self, x: usize, y: usize) -> f32 {
        self.pop
            .get(y * self.grid_size + x)
            .copied()
            .unwrap_or(0.0)
    }

    /// Arm the place-pop flash on one cell.
    pub fn start_pop(&mut self, x: usize, y: usize) {
        if let Some(t) = self.pop.get_mut(y * self.grid_size + x) {
            *t = self.rules.place_pop_time;
        }
    }

    pub fn begin_clear_flash(&mut self) {
        self.effects.push(Effect::ClearFlash {
            t: self.rules.clear_flash_time,
        });
    }

    /// Start flying a rejected piece home. A second rejection replaces the
    /// first, snapping the earlier piece straight back to its slot.
    pub fn begin_return(&mut self, slot: usize, from: (f32, f32)) {
        self.effects
            .retain(|e| !matches!(e, Effect::Return { .. }));
        self.effects.push(Effect::Return {
            slot,
            from,
            t: self.rules.return_time,
        });
    }

    /// Kick off screen shake sized by how many lines just cleared.
    pub fn begin_shake(&mut self, lines: usize) {
        let r = &self.rules;
        let (t, strength) = if lines >= 2 {
            (
                r.shake_time,
                r.shake_strength * (1.0 + (lines as f32 - 2.0) * 0.35) * r.shake_multiline_boost,
            )
        } else {
            (r.shake_time * 0.7, r.shake_strength * 0.6)
        };
        self.effects.retain(|e| !matches!(e, Effect::Shake { .. }));
        self.effects.push(Effect::Shake { t, strength });
    }

    /// Burst of particles with the default size and speed ranges.
    pub fn spawn_burst(&mut self, x: f32, y: f32, theme: Theme, count: usize) {
        let speed = self.rules.particle_speed;
        self.spawn_burst_scaled(x, y, theme, count, (0.09, 0.18), speed);
    }

    /// Burst with explicit size and speed ranges. Each particle gets a random
    /// launch angle, a small positional jitter and an extra upward kick.
    /// Requests beyond the pool capacity are dropped silently.
    fn spawn_burst_scaled(
        &mut self,
        x: f32,
        y: f32,
        theme: Theme,
        count: usize,
        size: (f32, f32),
        speed: (f32, f32),
    ) {
        let mut alive = self
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::Particle { .. }))
            .count();
        let mut rng = rand::thread_rng();
        let (life_min, life_max) = self.rules.particle_life;

        for _ in 0..count {
            if alive >= self.rules.max_particles {
                return;
            }
            let ang = rng.gen_range(0.0..TAU);
            let spd = rng.gen_range(speed.0..speed.1);
            let life = rng.gen_range(life_min..life_max);
            self.effects.push(Effect::Particle {
                x: x + rng.gen_range(-0.15..0.15),
                y: y + rng.gen_range(-0.15..0.15),
                vx: ang.cos() * spd,
                vy: ang.sin() * spd - rng.gen_range(0.25..2.25),
                life,
                life0: life,
                size: rng.gen_range(size.0..size.1),
                color: theme.fill,
            });
            alive += 1;
        }
    }

    /// Show a "+N" popup. Silently ignored when the popup pool is full.
    pub fn spawn_bonus_popup(&mut self, x: f32, y: f32, points: u64, mult: f32, theme: Theme) {
        let popups = self
            .effects
            .iter()
            .filter(|e| matches!(e, Effect::BonusPopup { .. }))
            .count();
        if popups >= self.rules.max_bonus_popups {
            return;
        }
        self.effects.push(Effect::BonusPopup {
            x,
            y,
            vy: -self.rules.bonus_rise_speed,
            life: self.rules.bonus_life,
            life0: self.rules.bonus_life,
            points,
            mult,
            theme,
        });
    }

    /// Show the "COMBO xN" banner and its particle burst. There is only ever
    /// one banner; a new one replaces whatever is still on screen.
    pub fn start_combo_popup(&mut self, combo: u32, mult: f32, theme: Theme) {
        let life = self.rules.combo_pop_life;
        let span = self.grid_size as f32;
        self.effects
            .retain(|e| !matches!(e, Effect::ComboPopup { .. }));
        self.effects.push(Effect::ComboPopup {
            x: 0.0,
            y: 0.0,
            vx: span / life,
            vy: span / life,
            life,
            life0: life,
            scale: 0.35,
            text: format!("COMBO x{combo}"),
            theme,
        });

        let m = mult.clamp(1.0, 20.0);
        let count = (self.rules.combo_pop_particles_base + (m * 10.0) as usize).min(220);
        let size = (0.09 + 0.007 * m, 0.18 + 0.014 * m);
        let speed = (2.0 + 0.35 * m, 4.5 + 0.65 * m);
        self.spawn_burst_scaled(0.0, 0.0, theme, count, size, speed);
    }

    /// Abort the return animation (host suspend). Clearing, particles and
    /// popups keep running; they never gate input.
    pub fn cancel_return(&mut self) {
        self.effects
            .retain(|e| !matches!(e, Effect::Return { .. }));
    }

    /// Advance every live effect by one tick.
    pub fn advance(&mut self, dt: f32) -> TickSignals {
        let mut signals = TickSignals::default();
        let mut camera = (0.0f32, 0.0f32);
        let shake_time = self.rules.shake_time;
        let gravity = self.rules.particle_gravity;
        let mut rng = rand::thread_rng();

        self.effects.retain_mut(|effect| match effect {
            Effect::ClearFlash { t } => {
                *t -= dt;
                if *t <= 0.0 {
                    signals.clear_finished = true;
                    return false;
                }
                true
            }
            Effect::Return { t, .. } => {
                *t -= dt;
                *t > 0.0
            }
            Effect::Shake { t, strength } => {
                *t = (*t - dt).max(0.0);
                if *t <= 0.0 {
                    return false;
                }
                let s = *strength * (*t / shake_time);
                camera = (rng.gen_range(-s..s), rng.gen_range(-s..s));
                true
            }
            Effect::Particle {
                x, y, vx, vy, life, ..
            } => {
                *life -= dt;
                if *life <= 0.0 {
                    return false;
                }
                *vy += gravity * dt;
                *vx *= 1.0 - 0.9 * dt;
                *vy *= 1.0 - 0.2 * dt;
                *x += *vx * dt;
                *y += *vy * dt;
                true
            }
            Effect::BonusPopup { y, vy, life, .. } => {
                *life -= dt;
                if *life <= 0.0 {
                    return false;
                }
                *y += *vy * dt;
                true
            }
            Effect::ComboPopup {
                x,
                y,
                vx,
                vy,
                life,
                life0,
                scale,
                ..
            } => {
                *life -= dt;
                if *life <= 0.0 {
                    return false;
                }
                *x += *vx * dt;
                *y += *vy * dt;
                let p = 1.0 - *life / *life0;
                let ease = 1.0 - (1.0 - p) * (1.0 - p);
                *scale = 0.35 + 0.95 * ease;
                true
            }
        });

        for t in &mut self.pop {
            if *t > 0.0 {
                *t = (*t - dt).max(0.0);
            }
        }

        self.camera = camera;
        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::PALETTE;

    const DT: f32 = 1.0 / 30.0;

    fn anim() -> AnimationState {
        AnimationState::new(10, EffectRules::default())
    }

    fn particle_count(anim: &AnimationState) -> usize {
        anim.effects()
            .iter()
            .filter(|e| matches!(e, Effect::Particle { .. }))
            .count()
    }

    #[test]
    fn test_clear_flash_expires_once() {
        let mut anim = anim();
        anim.begin_clear_flash();
        assert!(anim.is_clearing());

        assert!(!anim.advance(0.1).clear_finished);
        assert!(anim.is_clearing());

        assert!(anim.advance(0.2).clear_finished);
        assert!(!anim.is_clearing());

        // Expiry fires exactly once.
        assert!(!anim.advance(0.1).clear_finished);
    }

    #[test]
    fn test_pop_timers_clamp_at_zero() {
        let mut anim = anim();
        anim.start_pop(2, 3);
        assert!(anim.pop_timer(2, 3) > 0.0);

        anim.advance(1.0);
        assert_eq!(anim.pop_timer(2, 3), 0.0);
        assert_eq!(anim.pop_timer(9, 9), 0.0);
    }

    #[test]
    fn test_particle_pool_is_capped() {
        let mut anim = anim();
        anim.spawn_burst(5.0, 5.0, PALETTE[0], 700);
        anim.spawn_burst(5.0, 5.0, PALETTE[0], 700);
        assert_eq!(particle_count(&anim), EffectRules::default().max_particles);
    }

    #[test]
    fn test_particles_die_after_lifetime() {
        let mut anim = anim();
        anim.spawn_burst(5.0, 5.0, PALETTE[0], 40);
        assert_eq!(particle_count(&anim), 40);

        // Longest possible particle life is 0.60 seconds.
        anim.advance(0.7);
        assert_eq!(particle_count(&anim), 0);
    }

    #[test]
    fn test_bonus_popup_pool_is_capped() {
        let mut anim = anim();
        for i in 0..30 {
            anim.spawn_bonus_popup(1.0, 1.0, i, 2.0, PALETTE[1]);
        }
        let popups = anim
            .effects()
            .iter()
            .filter(|e| matches!(e, Effect::BonusPopup { .. }))
            .count();
        assert_eq!(popups, EffectRules::default().max_bonus_popups);
    }

    #[test]
    fn test_bonus_popup_rises() {
        let mut anim = anim();
        anim.spawn_bonus_popup(1.0, 8.0, 100, 2.0, PALETTE[1]);
        anim.advance(DT);
        let y = anim.effects().iter().find_map(|e| match e {
            Effect::BonusPopup { y, .. } => Some(*y),
            _ => None,
        });
        assert!(y.unwrap() < 8.0);
    }

    #[test]
    fn test_combo_popup_is_a_singleton() {
        let mut anim = anim();
        anim.start_combo_popup(1, 2.0, PALETTE[2]);
        anim.start_combo_popup(3, 4.0, PALETTE[2]);

        let banners: Vec<&String> = anim
            .effects()
            .iter()
            .filter_map(|e| match e {
                Effect::ComboPopup { text, .. } => Some(text),
                _ => None,
            })
            .collect();
        assert_eq!(banners.len(), 1);
        assert_eq!(banners[0], "COMBO x3");
    }

    #[test]
    fn test_combo_scale_eases_up() {
        let mut anim = anim();
        anim.start_combo_popup(2, 3.0, PALETTE[2]);

        let scale_of = |a: &AnimationState| {
            a.effects().iter().find_map(|e| match e {
                Effect::ComboPopup { scale, .. } => Some(*scale),
                _ => None,
            })
        };

        let mut prev = scale_of(&anim).unwrap();
        assert_eq!(prev, 0.35);
        for _ in 0..20 {
            anim.advance(DT);
            let s = scale_of(&anim).unwrap();
            assert!(s > prev);
            prev = s;
        }
        assert!(prev < 1.3);
    }

    #[test]
    fn test_shake_decays_and_stops() {
        let mut anim = anim();
        anim.begin_shake(2);
        anim.advance(DT);
        let (cx, cy) = anim.camera();
        let bound = EffectRules::default().shake_strength * 1.6;
        assert!(cx.abs() <= bound && cy.abs() <= bound);

        // Shake time is 0.22 seconds; run well past it.
        for _ in 0..10 {
            anim.advance(DT);
        }
        assert_eq!(anim.camera(), (0.0, 0.0));
        assert!(!anim.effects().iter().any(|e| matches!(e, Effect::Shake { .. })));
    }

    #[test]
    fn test_return_expires_and_cancels() {
        let mut anim = anim();
        anim.begin_return(1, (3.0, 4.0));
        assert!(anim.is_returning(1));
        assert!(!anim.is_returning(0));

        anim.advance(0.3);
        assert!(!anim.is_returning(1));

        anim.begin_return(2, (1.0, 1.0));
        anim.cancel_return();
        assert!(!anim.is_returning(2));
    }
}
