// The collection chime: a short synthesized ping, played fire-and-forget.
// Visual/audible expectation: every caught star gives one bright "ding" that
// decays in about a third of a second; overlapping catches overlap freely.
//
// Audio is strictly an effect. If no output device exists, the game plays on
// silently: construction fails soft and `play` becomes a no-op by absence.

use std::time::Duration;

use rodio::{OutputStream, OutputStreamHandle, Source};

const SAMPLE_RATE: u32 = 44_100;
const CHIME_SECS: f32 = 0.35;

/// A finite mono source: two sine partials a fifth-ish apart under an
/// exponential decay envelope.
pub struct Chime {
    num_sample: usize,
}

impl Chime {
    pub fn new() -> Self {
        Self { num_sample: 0 }
    }
}

impl Default for Chime {
    fn default() -> Self {
        Self::new()
    }
}

impl Iterator for Chime {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        let t = self.num_sample as f32 / SAMPLE_RATE as f32;
        if t >= CHIME_SECS {
            return None;
        }
        self.num_sample += 1;

        let envelope = (-t * 9.0).exp();
        let tone = (2.0 * std::f32::consts::PI * 880.0 * t).sin() * 0.6
            + (2.0 * std::f32::consts::PI * 1318.5 * t).sin() * 0.4;

        Some(tone * envelope * 0.25) // headroom so overlapping dings don't clip
    }
}

impl Source for Chime {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::from_secs_f32(CHIME_SECS))
    }
}

/// Holds the output stream open for the session and fires chimes into it.
pub struct ChimePlayer {
    // Kept alive for the handle to stay valid; rodio plays on its own thread.
    _stream: OutputStream,
    handle: OutputStreamHandle,
}

impl ChimePlayer {
    /// `None` when there is no usable audio output (logged once, never
    /// fatal).
    pub fn new() -> Option<Self> {
        match OutputStream::try_default() {
            Ok((stream, handle)) => Some(Self { _stream: stream, handle }),
            Err(e) => {
                log::warn!("audio unavailable, playing silently: {e}");
                None
            }
        }
    }

    /// Queue one chime and return immediately; playback must never block the
    /// frame loop.
    pub fn play(&self) {
        if let Err(e) = self.handle.play_raw(Chime::new()) {
            log::warn!("chime failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chime_is_finite_and_bounded() {
        let samples: Vec<f32> = Chime::new().collect();
        let expected = (SAMPLE_RATE as f32 * CHIME_SECS) as usize;
        assert!(samples.len() >= expected - 1 && samples.len() <= expected + 1);
        assert!(samples.iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn chime_decays() {
        let samples: Vec<f32> = Chime::new().collect();
        let head: f32 = samples[..2000].iter().map(|s| s.abs()).sum();
        let tail: f32 = samples[samples.len() - 2000..].iter().map(|s| s.abs()).sum();
        assert!(head > tail * 4.0);
    }
}
