// The target field: spawning, lifecycle, hit-testing.
// Visual expectation: stars pop in at random spots, swell to full size, and
// either sit there glowing or, once swiped through or clicked, flare up in
// a short burst and vanish.

use std::time::Duration;

use rand::{Rng, RngCore};

use crate::engine::EngineConfig;
use crate::score::ScoreTracker;
use crate::types::MotionMask;

/// One collectible target.
///
/// Lifecycle is deliberately thin: `collected == false` covers both the
/// fade-in ramp (`scale` < 1.0) and the steady phase; a star is hit-testable
/// from its first frame, the ramp is cosmetic. `collected == true` is the
/// burst: `scale` keeps growing until it crosses the expiry ceiling and the
/// star is removed for good.
pub struct Star {
    /// Milliseconds since session start at spawn time. Spawns are at least a
    /// cooldown apart, so this doubles as a unique id.
    pub id: u64,
    /// Position in fractional `[0,1]` coordinates, resolution independent.
    pub x: f32,
    pub y: f32,
    /// Base radius in pixels at scale 1.0.
    pub size: f32,
    /// Cosmetic tint in degrees, fixed at spawn.
    pub hue: f32,
    pub collected: bool,
    /// Animation scalar: fade/grow-in toward 1.0, then burst past it.
    pub scale: f32,
}

/// Owns the star collection and every rule about it.
pub struct TargetField {
    cfg: EngineConfig,
    stars: Vec<Star>,
    last_spawn: Option<Duration>,
}

impl TargetField {
    pub fn new(cfg: EngineConfig) -> Self {
        Self { cfg, stars: Vec::new(), last_spawn: None }
    }

    pub fn stars(&self) -> &[Star] {
        &self.stars
    }

    /// Stars still waiting to be caught (bursting ones don't count; they no
    /// longer occupy a spawn slot).
    pub fn alive(&self) -> usize {
        self.stars.iter().filter(|s| !s.collected).count()
    }

    /// Remove everything (session reset).
    pub fn clear(&mut self) {
        self.stars.clear();
        self.last_spawn = None;
    }

    /// One spawn attempt, made once per frame. Succeeds only when the
    /// cooldown has elapsed since the last successful spawn AND there is a
    /// free slot under the cap. Placement avoids the screen edges by keeping
    /// to a centered sub-rectangle.
    pub fn try_spawn(&mut self, now: Duration, rng: &mut dyn RngCore) {
        if self.alive() >= self.cfg.spawn_cap {
            return;
        }
        if let Some(last) = self.last_spawn {
            if now.saturating_sub(last) < self.cfg.spawn_interval {
                return;
            }
        }

        let m = self.cfg.spawn_margin;
        let (lo, hi) = self.cfg.size_range;
        self.stars.push(Star {
            id: now.as_millis() as u64,
            x: rng.random_range(m..=1.0 - m),
            y: rng.random_range(m..=1.0 - m),
            size: rng.random_range(lo..=hi),
            hue: rng.random_range(0.0..360.0),
            collected: false,
            scale: 0.0,
        });
        self.last_spawn = Some(now);
    }

    /// Advance every star by `dt` seconds and run the hit policy. Returns
    /// how many stars were collected this frame (the host plays one chime
    /// per hit).
    ///
    /// Hit policy per uncollected star, first match wins:
    /// 1. pending pointer within `hit_radius` (Euclidean, fractional space)
    ///    (the pointer is consumed by the hit);
    /// 2. otherwise, with motion data present, more than `motion_hit_cells`
    ///    flagged cells in the square neighborhood around the star's grid
    ///    cell.
    pub fn advance(
        &mut self,
        dt: f32,
        mask: &MotionMask,
        pointer: &mut Option<(f32, f32)>,
        score: &mut ScoreTracker,
    ) -> u32 {
        let mut hits = 0;
        let mut i = 0;
        while i < self.stars.len() {
            let star = &mut self.stars[i];

            if star.collected {
                star.scale += self.cfg.burst_rate * dt;
                if star.scale > self.cfg.expiry_scale {
                    // Burst finished: gone for good. swap_remove, so don't
                    // advance past the element that just moved into slot i.
                    self.stars.swap_remove(i);
                } else {
                    i += 1;
                }
                continue;
            }

            star.scale = (star.scale + self.cfg.spawn_rate * dt).min(1.0);

            let mut hit = false;
            if let Some((px, py)) = *pointer {
                let dx = star.x - px;
                let dy = star.y - py;
                if dx * dx + dy * dy < self.cfg.hit_radius * self.cfg.hit_radius {
                    hit = true;
                    *pointer = None; // one-shot: this hit consumes the signal
                }
            }
            if !hit && !mask.is_empty() {
                let gx = ((star.x * mask.width() as f32) as usize).min(mask.width() - 1);
                let gy = ((star.y * mask.height() as f32) as usize).min(mask.height() - 1);
                let flagged = mask.neighborhood_flagged(gx, gy, self.cfg.motion_radius);
                hit = flagged > self.cfg.motion_hit_cells;
            }

            if hit {
                // The one and only award site; a collected star never comes
                // back through the hit tests above.
                star.collected = true;
                score.award(self.cfg.reward);
                hits += 1;
            }
            i += 1;
        }
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    const DT: f32 = 1.0 / 60.0;

    fn cfg() -> EngineConfig {
        EngineConfig::default()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn star_at(x: f32, y: f32) -> Star {
        Star { id: 1, x, y, size: 20.0, hue: 120.0, collected: false, scale: 1.0 }
    }

    /// A full-size mask with a saturated blob of flagged cells around one
    /// grid coordinate.
    fn mask_with_blob(cx: usize, cy: usize, radius: usize) -> MotionMask {
        use crate::motion::{GRID_H, GRID_W};
        let mut cells = vec![false; GRID_W * GRID_H];
        for y in cy.saturating_sub(radius)..=(cy + radius).min(GRID_H - 1) {
            for x in cx.saturating_sub(radius)..=(cx + radius).min(GRID_W - 1) {
                cells[y * GRID_W + x] = true;
            }
        }
        MotionMask::new(GRID_W, GRID_H, cells)
    }

    #[test]
    fn alive_count_never_exceeds_cap() {
        let mut field = TargetField::new(cfg());
        let cap = cfg().spawn_cap;
        let mut rng = rng();
        for frame in 0..2_000u64 {
            field.try_spawn(Duration::from_millis(frame * 100), &mut rng);
            assert!(field.alive() <= cap);
        }
        assert_eq!(field.alive(), cap); // and the field does fill up
    }

    #[test]
    fn second_spawn_attempt_within_cooldown_produces_nothing() {
        let mut field = TargetField::new(EngineConfig {
            spawn_interval: Duration::from_millis(1000),
            ..cfg()
        });
        let mut rng = rng();
        field.try_spawn(Duration::from_millis(0), &mut rng);
        assert_eq!(field.stars().len(), 1);

        field.try_spawn(Duration::from_millis(500), &mut rng);
        assert_eq!(field.stars().len(), 1);

        field.try_spawn(Duration::from_millis(1000), &mut rng);
        assert_eq!(field.stars().len(), 2);
    }

    #[test]
    fn pointer_hit_awards_and_collects() {
        let mut field = TargetField::new(cfg());
        field.stars.push(star_at(0.52, 0.51));
        let mut score = ScoreTracker::new();
        let mut pointer = Some((0.5f32, 0.5f32)); // distance ≈ 0.022 < 0.15

        let hits = field.advance(DT, &MotionMask::empty(), &mut pointer, &mut score);

        assert_eq!(hits, 1);
        assert_eq!(score.value(), 10);
        assert!(field.stars()[0].collected);
        assert!(pointer.is_none(), "the hit must consume the pointer");
    }

    #[test]
    fn pointer_out_of_reach_stays_pending() {
        let mut field = TargetField::new(cfg());
        field.stars.push(star_at(0.9, 0.9));
        let mut score = ScoreTracker::new();
        let mut pointer = Some((0.1f32, 0.1f32));

        let hits = field.advance(DT, &MotionMask::empty(), &mut pointer, &mut score);

        assert_eq!(hits, 0);
        assert_eq!(pointer, Some((0.1, 0.1)));
    }

    #[test]
    fn collected_star_never_awards_twice() {
        let mut field = TargetField::new(cfg());
        field.stars.push(star_at(0.5, 0.5));
        let mut score = ScoreTracker::new();

        let mut pointer = Some((0.5f32, 0.5f32));
        field.advance(DT, &MotionMask::empty(), &mut pointer, &mut score);
        assert_eq!(score.value(), 10);

        // Keep hammering the same spot with fresh pointer signals and a hot
        // motion mask while the star bursts.
        for _ in 0..20 {
            let mut pointer = Some((0.5f32, 0.5f32));
            let mask = mask_with_blob(16, 12, 3);
            let hits = field.advance(DT, &mask, &mut pointer, &mut score);
            assert_eq!(hits, 0);
        }
        assert_eq!(score.value(), 10);
    }

    #[test]
    fn motion_blob_collects_a_star() {
        use crate::motion::{GRID_H, GRID_W};
        let mut field = TargetField::new(cfg());
        field.stars.push(star_at(0.5, 0.5));
        let mut score = ScoreTracker::new();

        let gx = (0.5 * GRID_W as f32) as usize;
        let gy = (0.5 * GRID_H as f32) as usize;
        let mask = mask_with_blob(gx, gy, 3);

        let hits = field.advance(DT, &mask, &mut None, &mut score);
        assert_eq!(hits, 1);
        assert_eq!(score.value(), 10);
    }

    #[test]
    fn motion_count_at_threshold_is_not_a_hit() {
        use crate::motion::{GRID_H, GRID_W};
        // Exactly `motion_hit_cells` flagged cells in reach: the comparison
        // is strict, so nothing happens.
        let threshold = cfg().motion_hit_cells;
        let mut field = TargetField::new(cfg());
        field.stars.push(star_at(0.5, 0.5));
        let mut score = ScoreTracker::new();

        let gx = (0.5 * GRID_W as f32) as usize;
        let gy = (0.5 * GRID_H as f32) as usize;
        // Flag exactly `threshold` cells inside the star's 5x5 neighborhood.
        let mut cells = vec![false; GRID_W * GRID_H];
        let mut placed = 0;
        'outer: for dy in 0..5 {
            for dx in 0..5 {
                if placed == threshold {
                    break 'outer;
                }
                cells[(gy - 2 + dy) * GRID_W + (gx - 2 + dx)] = true;
                placed += 1;
            }
        }
        let mask = MotionMask::new(GRID_W, GRID_H, cells);
        assert_eq!(mask.neighborhood_flagged(gx, gy, cfg().motion_radius), threshold);

        let hits = field.advance(DT, &mask, &mut None, &mut score);
        assert_eq!(hits, 0);
        assert_eq!(score.value(), 0);
    }

    #[test]
    fn empty_mask_means_no_motion_hits() {
        let mut field = TargetField::new(cfg());
        field.stars.push(star_at(0.5, 0.5));
        let mut score = ScoreTracker::new();

        let hits = field.advance(DT, &MotionMask::empty(), &mut None, &mut score);
        assert_eq!(hits, 0);
    }

    #[test]
    fn burst_crossing_ceiling_removes_the_star() {
        let mut field = TargetField::new(cfg());
        let mut star = star_at(0.5, 0.5);
        star.collected = true;
        star.scale = cfg().expiry_scale - 0.01;
        field.stars.push(star);
        let mut score = ScoreTracker::new();

        // One generous step pushes scale past the ceiling.
        field.advance(0.5, &MotionMask::empty(), &mut None, &mut score);
        assert!(field.stars().is_empty());
        assert_eq!(score.value(), 0);
    }

    #[test]
    fn scale_ramps_in_and_caps_at_one() {
        let mut field = TargetField::new(cfg());
        field.stars.push(Star { scale: 0.0, ..star_at(0.5, 0.5) });
        let mut score = ScoreTracker::new();

        for _ in 0..600 {
            field.advance(DT, &MotionMask::empty(), &mut None, &mut score);
        }
        let star = &field.stars()[0];
        assert!(!star.collected);
        assert_eq!(star.scale, 1.0);
    }

    #[test]
    fn pointer_beats_motion_and_is_consumed_first() {
        use crate::motion::{GRID_H, GRID_W};
        let mut field = TargetField::new(cfg());
        field.stars.push(star_at(0.5, 0.5));
        let mut score = ScoreTracker::new();
        let mut pointer = Some((0.5f32, 0.5f32));
        let gx = (0.5 * GRID_W as f32) as usize;
        let gy = (0.5 * GRID_H as f32) as usize;
        let mask = mask_with_blob(gx, gy, 3);

        let hits = field.advance(DT, &mask, &mut pointer, &mut score);
        assert_eq!(hits, 1);
        assert!(pointer.is_none());
        assert_eq!(score.value(), 10);
    }
}
