// What you SEE:
// • Your mirrored webcam feed, with glowing stars popping in at random spots.
// • Wave a hand through a star to catch it: it flares, chimes, and scores.
// • No camera (or `--pointer`): dark backdrop, click stars with the mouse.
// • R restarts the round. ESC or closing the window quits.

use std::time::{Duration, Instant};

use starcatch::chime::ChimePlayer;
use starcatch::draw::{Drawer, draw_crosshair, draw_text_5x7};
use starcatch::gamma::GammaLut;
use starcatch::render;
use starcatch::{Engine, EngineConfig, Error, FrameBuffer, InputMode};

fn main() -> Result<(), Error> {
    env_logger::init();

    /* --- Engine + window setup ---
       The camera probe inside Engine::new decides the input mode; the
       window is sized to whatever the camera delivers (fixed size in
       pointer mode). */
    let force_pointer = std::env::args().any(|a| a == "--pointer");
    let mut engine = Engine::new(EngineConfig::default(), force_pointer);
    let (w, h) = engine.display_size();
    let mut drawer = Drawer::new("Catch the Star", w, h)?;

    /* --- Reusable screen buffer + gamma tables ---
       Visual: `screen` is the image you actually see each frame. */
    let mut screen = FrameBuffer::black(w, h);
    let lut = GammaLut::new();

    // Chime output; None just means a silent game.
    let chime = ChimePlayer::new();

    engine.start();

    /* --- HUD / FPS bookkeeping --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;
    let mut hud_fps_text = String::from("FPS: 0.0");

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Inputs: R restarts; a held left button feeds the engine pointer
           positions in fractional coordinates. */
        if drawer.r_pressed_once() {
            engine.reset();
        }
        if drawer.left_mouse_down() {
            if let Some((mx, my)) = drawer.mouse_pos() {
                engine.record_pointer(mx as f32 / w as f32, my as f32 / h as f32);
            }
        }

        /* 2) One engine iteration: frame grab, motion mask, spawn, hit-test.
           Visual: stars may appear, swell, or start bursting right here. */
        let report = engine.step();

        /* 3) Compose the screen: mirrored video or backdrop, then stars. */
        render::compose(
            &mut screen,
            report.frame.as_ref(),
            engine.stars(),
            &lut,
            engine.config().expiry_scale,
        );

        /* 4) Sonify: one ding per star caught this frame, fire-and-forget. */
        if let Some(player) = &chime {
            for _ in 0..report.hits {
                player.play();
            }
        }

        /* 5) Pointer-mode aiming aid + HUD text on top. */
        if engine.mode() == InputMode::Fallback {
            if let Some((mx, my)) = drawer.mouse_pos() {
                draw_crosshair(&mut screen, mx as i32, my as i32, 12, 0x00FFCC33);
            }
        }

        let mode_tag = match engine.mode() {
            InputMode::Camera => "CAMERA",
            InputMode::Fallback => "POINTER",
        };
        let hud = format!("SCORE: {} | {} | {}", engine.score(), mode_tag, hud_fps_text);
        draw_text_5x7(&mut screen, 8, 8, &hud, 0x00FFFFFF);
        if let Some(reason) = engine.fallback_reason() {
            draw_text_5x7(&mut screen, 8, 20, reason, 0x009FB4C8);
        }

        /* 6) Present to the window. */
        drawer.present(&screen)?;

        /* 7) FPS once per second (log + HUD). */
        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            log::info!("fps: {fps:.1}");
            hud_fps_text = format!("FPS: {fps:.1}");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    /* --- Session end: stop rescheduling, release the camera, report. --- */
    engine.stop();
    log::info!("final score: {}", engine.score());
    Ok(())
}
