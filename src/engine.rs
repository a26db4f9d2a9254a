// The game engine: one owned object with an explicit init/start/stop
// lifecycle, driving the whole per-frame sequence. The window shell calls
// `step()` once per display refresh and renders what comes back; everything
// else in the crate is passive and called from here.

use std::time::{Duration, Instant};

use rand::RngCore;

use crate::field::{Star, TargetField};
use crate::input::{InputArbiter, InputMode};
use crate::motion::MotionDetector;
use crate::score::ScoreTracker;
use crate::types::FrameBuffer;

/// Every tunable in one place. The camera-only and pointer-fallback builds
/// of this game used to be separate near-copies; they are the same engine
/// with the same defaults now, differing only in which input mode init
/// settles on.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Per-cell frame-difference threshold (sum of |ΔR|+|ΔG|+|ΔB|, 0..=765).
    /// Lower = more sensitive.
    pub sensitivity: u32,
    /// Most stars allowed to be waiting on screen at once.
    pub spawn_cap: usize,
    /// Cooldown between successful spawns.
    pub spawn_interval: Duration,
    /// Stars keep this fractional distance away from the screen edges.
    pub spawn_margin: f32,
    /// Base radius band in pixels, sampled uniformly at spawn.
    pub size_range: (f32, f32),
    /// Pointer hit distance in fractional coordinates.
    pub hit_radius: f32,
    /// Square motion neighborhood radius, in grid cells.
    pub motion_radius: usize,
    /// A motion hit needs strictly more flagged neighborhood cells than
    /// this. Tuned empirically, kept configurable on purpose.
    pub motion_hit_cells: usize,
    /// Fade/grow-in speed, scale units per second.
    pub spawn_rate: f32,
    /// Post-collection burst speed, scale units per second.
    pub burst_rate: f32,
    /// A bursting star past this scale is removed.
    pub expiry_scale: f32,
    /// Points per collected star.
    pub reward: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sensitivity: 38,
            spawn_cap: 5,
            spawn_interval: Duration::from_millis(1200),
            spawn_margin: 0.12,
            size_range: (16.0, 28.0),
            hit_radius: 0.15,
            motion_radius: 2,
            motion_hit_cells: 9, // 10+ of the 25 neighborhood cells
            spawn_rate: 3.2,
            burst_rate: 5.0,
            expiry_scale: 3.0,
            reward: 10,
        }
    }
}

/// What one iteration produced: the frame to draw under the stars (if the
/// camera delivered one) and how many collections happened.
pub struct StepReport {
    pub frame: Option<FrameBuffer>,
    pub hits: u32,
}

pub struct Engine {
    cfg: EngineConfig,
    arbiter: InputArbiter,
    detector: MotionDetector,
    field: TargetField,
    score: ScoreTracker,
    rng: Box<dyn RngCore>,
    started: Instant,
    last_step: Option<Instant>,
    running: bool,
}

impl Engine {
    /// Probe the camera and build the engine around whichever input mode the
    /// probe settles on. Construction never fails; a camera-less machine
    /// just gets a pointer-mode engine.
    pub fn new(cfg: EngineConfig, force_fallback: bool) -> Self {
        let arbiter = InputArbiter::init(0, 640, 480, force_fallback);
        Self::with_arbiter(cfg, arbiter)
    }

    /// A pointer-only engine, no camera probe. Used by tests.
    pub fn pointer_only(cfg: EngineConfig, reason: &str) -> Self {
        Self::with_arbiter(cfg, InputArbiter::fallback(reason))
    }

    fn with_arbiter(cfg: EngineConfig, arbiter: InputArbiter) -> Self {
        Self {
            detector: MotionDetector::new(cfg.sensitivity),
            field: TargetField::new(cfg.clone()),
            score: ScoreTracker::new(),
            rng: Box::new(rand::rng()),
            started: Instant::now(),
            last_step: None,
            running: false,
            cfg,
            arbiter,
        }
    }

    /// Swap in a different random source (a seeded one in tests).
    pub fn with_rng(mut self, rng: Box<dyn RngCore>) -> Self {
        self.rng = rng;
        self
    }

    /// Begin the session: score at zero, empty field, clock restarted.
    pub fn start(&mut self) {
        self.reset();
        self.started = Instant::now();
        self.last_step = None;
        self.running = true;
    }

    /// End the session: no further iterations do work, the capture device is
    /// released, and the final score stays readable for a summary display.
    pub fn stop(&mut self) {
        self.running = false;
        self.arbiter.release();
    }

    /// Zero the score and clear the field without ending the session.
    pub fn reset(&mut self) {
        self.score.reset();
        self.field.clear();
        self.detector.reset();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One full iteration: grab frame → motion mask → spawn attempt →
    /// advance + hit-test. Runs to completion; `&mut self` keeps it from
    /// ever overlapping itself. Rendering and audio stay with the host.
    pub fn step(&mut self) -> StepReport {
        if !self.running {
            return StepReport { frame: None, hits: 0 };
        }

        let now_instant = Instant::now();
        let dt = self
            .last_step
            .map(|t| now_instant.duration_since(t).as_secs_f32())
            .unwrap_or(0.0);
        self.last_step = Some(now_instant);
        let now = now_instant.duration_since(self.started);

        let frame = self.arbiter.grab_frame();
        let mask = self.detector.sample(frame.as_ref());

        self.field.try_spawn(now, &mut self.rng);
        let hits = self.field.advance(dt, &mask, self.arbiter.pointer_mut(), &mut self.score);

        StepReport { frame, hits }
    }

    /// Pointer/touch activity in fractional screen coordinates.
    pub fn record_pointer(&mut self, x: f32, y: f32) {
        self.arbiter.record_pointer(x, y);
    }

    /// Window dimensions to use: the camera's delivered resolution, or a
    /// fixed default when there is no video to show.
    pub fn display_size(&self) -> (usize, usize) {
        match self.arbiter.camera_resolution() {
            Some((w, h)) => (w as usize, h as usize),
            None => (640, 480),
        }
    }

    pub fn mode(&self) -> InputMode {
        self.arbiter.mode()
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.arbiter.fallback_reason()
    }

    pub fn score(&self) -> u32 {
        self.score.value()
    }

    pub fn stars(&self) -> &[Star] {
        self.field.stars()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn engine() -> Engine {
        Engine::pointer_only(EngineConfig::default(), "test")
            .with_rng(Box::new(ChaCha8Rng::seed_from_u64(42)))
    }

    #[test]
    fn step_before_start_is_inert() {
        let mut eng = engine();
        let report = eng.step();
        assert_eq!(report.hits, 0);
        assert!(report.frame.is_none());
        assert!(eng.stars().is_empty());
    }

    #[test]
    fn first_step_spawns_one_star() {
        let mut eng = engine();
        eng.start();
        eng.step();
        assert_eq!(eng.stars().len(), 1);

        // Immediately after, the cooldown blocks a second spawn.
        eng.step();
        assert_eq!(eng.stars().len(), 1);
    }

    #[test]
    fn pointer_hit_through_the_engine() {
        let mut eng = engine();
        eng.start();
        eng.step();

        let (x, y) = {
            let star = &eng.stars()[0];
            (star.x, star.y)
        };
        eng.record_pointer(x, y);
        let report = eng.step();

        assert_eq!(report.hits, 1);
        assert_eq!(eng.score(), 10);
        assert!(eng.stars()[0].collected);
    }

    #[test]
    fn stop_keeps_the_final_score_readable() {
        let mut eng = engine();
        eng.start();
        eng.step();
        let (x, y) = (eng.stars()[0].x, eng.stars()[0].y);
        eng.record_pointer(x, y);
        eng.step();

        eng.stop();
        assert!(!eng.is_running());
        assert_eq!(eng.score(), 10);

        // A stray step after stop does nothing.
        let report = eng.step();
        assert_eq!(report.hits, 0);
        assert_eq!(eng.score(), 10);
    }

    #[test]
    fn reset_clears_score_and_field() {
        let mut eng = engine();
        eng.start();
        eng.step();
        let (x, y) = (eng.stars()[0].x, eng.stars()[0].y);
        eng.record_pointer(x, y);
        eng.step();
        assert_eq!(eng.score(), 10);

        eng.reset();
        assert_eq!(eng.score(), 0);
        assert!(eng.stars().is_empty());
        assert!(eng.is_running());
    }

    #[test]
    fn fallback_reports_mode_and_reason() {
        let eng = engine();
        assert_eq!(eng.mode(), InputMode::Fallback);
        assert_eq!(eng.fallback_reason(), Some("test"));
        assert_eq!(eng.display_size(), (640, 480));
    }
}
