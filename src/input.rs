// Input arbitration: one component decides, once per session, whether the
// game is driven by camera motion or by the pointer, and carries the
// transient pointer signal either way.
//
// The mode is fixed at init. Camera probing failure is an expected outcome
// (no device, no permission), not an error: it is logged, surfaced as a
// human-readable reason for the HUD, and the session runs in pointer mode.

use crate::camera::CameraFeed;
use crate::types::FrameBuffer;

/// How the player interacts this session. Decided once; never re-probed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputMode {
    /// Camera acquired; hits come from the motion mask (pointer still works).
    Camera,
    /// No camera; hits come from the pointer only.
    Fallback,
}

pub struct InputArbiter {
    mode: InputMode,
    /// Why we fell back, for the UI. `None` in camera mode.
    fallback_reason: Option<String>,
    feed: Option<CameraFeed>,
    /// Latest pointer position in fractional coordinates, last-write-wins.
    /// Consumed (cleared) by the first hit it produces.
    pointer: Option<(f32, f32)>,
}

impl InputArbiter {
    /// Probe the camera and settle the session's input mode. Never fails:
    /// any probing error flips to fallback with the error text as reason.
    pub fn init(camera_index: u32, width: u32, height: u32, force_fallback: bool) -> Self {
        if force_fallback {
            log::info!("pointer mode requested, skipping camera probe");
            return Self::fallback("pointer mode requested");
        }

        match CameraFeed::open(camera_index, width, height) {
            Ok(feed) => {
                let (w, h) = feed.resolution();
                log::info!("camera mode: {w}x{h}");
                Self {
                    mode: InputMode::Camera,
                    fallback_reason: None,
                    feed: Some(feed),
                    pointer: None,
                }
            }
            Err(e) => {
                log::warn!("camera unavailable, falling back to pointer: {e}");
                Self::fallback(&e.to_string())
            }
        }
    }

    /// A pointer-only arbiter. Also the deterministic path used in tests.
    pub fn fallback(reason: &str) -> Self {
        Self {
            mode: InputMode::Fallback,
            fallback_reason: Some(reason.to_string()),
            feed: None,
            pointer: None,
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn fallback_reason(&self) -> Option<&str> {
        self.fallback_reason.as_deref()
    }

    /// Resolution the camera settled on, for sizing the window.
    pub fn camera_resolution(&self) -> Option<(u32, u32)> {
        self.feed.as_ref().map(|f| f.resolution())
    }

    /// The current camera frame, or `None` in fallback mode / when the
    /// stream has no frame ready. A transient frame error is one skipped
    /// frame of motion data, never a stopped game.
    pub fn grab_frame(&mut self) -> Option<FrameBuffer> {
        let feed = self.feed.as_mut()?;
        match feed.frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("dropping frame: {e}");
                None
            }
        }
    }

    /// Record pointer/touch activity. Overwrites any pending position; only
    /// the latest matters for the next hit-test pass.
    pub fn record_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Some((x, y));
    }

    /// Take the pending pointer position, clearing it. One-shot: without new
    /// pointer activity the next call returns `None`, so a star parked under
    /// a stationary cursor is hit at most once.
    pub fn consume_pointer(&mut self) -> Option<(f32, f32)> {
        self.pointer.take()
    }

    /// The pending pointer slot itself; the hit test takes from it only when
    /// a star is actually within reach.
    pub fn pointer_mut(&mut self) -> &mut Option<(f32, f32)> {
        &mut self.pointer
    }

    /// Drop the capture handle (part of engine stop). The mode stays what it
    /// was; a stopped session is not a fallback session.
    pub fn release(&mut self) {
        self.feed = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_mode_is_sticky() {
        let mut arb = InputArbiter::fallback("no camera device");
        assert_eq!(arb.mode(), InputMode::Fallback);
        assert_eq!(arb.fallback_reason(), Some("no camera device"));

        // Nothing that happens during a session changes the mode.
        arb.record_pointer(0.5, 0.5);
        arb.consume_pointer();
        arb.release();
        assert_eq!(arb.mode(), InputMode::Fallback);
    }

    #[test]
    fn pointer_is_one_shot() {
        let mut arb = InputArbiter::fallback("test");
        arb.record_pointer(0.25, 0.75);
        assert_eq!(arb.consume_pointer(), Some((0.25, 0.75)));
        assert_eq!(arb.consume_pointer(), None);
    }

    #[test]
    fn pointer_is_last_write_wins() {
        let mut arb = InputArbiter::fallback("test");
        arb.record_pointer(0.1, 0.1);
        arb.record_pointer(0.9, 0.2);
        assert_eq!(arb.consume_pointer(), Some((0.9, 0.2)));
    }

    #[test]
    fn fallback_never_yields_frames() {
        let mut arb = InputArbiter::fallback("test");
        assert!(arb.grab_frame().is_none());
        assert!(arb.camera_resolution().is_none());
    }
}
