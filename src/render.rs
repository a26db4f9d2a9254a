// Screen composition: the mirrored live frame (or the fallback backdrop)
// with every star drawn on top.
// Visual expectation: each star is a soft additive glow in its own hue with
// a solid bright core; it fades/grows in, and after a catch the whole thing
// flares outward while thinning to nothing.

use crate::field::Star;
use crate::gamma::GammaLut;
use crate::types::FrameBuffer;

/// Backdrop for pointer mode, dark enough that stars and HUD carry the
/// scene when there is no video behind them.
const BACKDROP: u32 = 0x000B0B14;

/// Compose one frame: video (mirrored) or backdrop, then the stars.
/// `expiry_scale` is the burst ceiling, used to fade bursting stars out over
/// exactly the scale range they have left.
pub fn compose(
    screen: &mut FrameBuffer,
    frame: Option<&FrameBuffer>,
    stars: &[Star],
    lut: &GammaLut,
    expiry_scale: f32,
) {
    match frame {
        Some(f) if f.width == screen.width && f.height == screen.height => {
            mirror_into(screen, f);
        }
        // No frame this iteration (pointer mode, stream warming up) or a
        // mid-session resolution surprise: flat backdrop instead of stale
        // or scrambled video.
        _ => screen.pixels.fill(BACKDROP),
    }

    for star in stars {
        draw_star(screen, star, lut, expiry_scale);
    }
}

/// Copy `frame` into `screen` flipped left-to-right, so the player sees
/// themself as in a mirror. Must match the motion grid's mirror (motion.rs)
/// or hits would land on the wrong side.
fn mirror_into(screen: &mut FrameBuffer, frame: &FrameBuffer) {
    let w = frame.width;
    for y in 0..frame.height {
        let row = y * w;
        for x in 0..w {
            screen.pixels[row + x] = frame.pixels[row + (w - 1 - x)];
        }
    }
}

/// One star: additive Gaussian halo + gamma-blended solid core + a hot
/// center spark.
fn draw_star(screen: &mut FrameBuffer, star: &Star, lut: &GammaLut, expiry_scale: f32) {
    let cx = (star.x * screen.width as f32) as i32;
    let cy = (star.y * screen.height as f32) as i32;

    // Fade-in is driven by the grow-in ramp; the burst fades back out over
    // the remaining scale headroom.
    let alpha = if star.collected {
        let span = (expiry_scale - 1.0).max(0.01);
        (1.0 - (star.scale - 1.0) / span).clamp(0.0, 1.0)
    } else {
        star.scale.clamp(0.0, 1.0)
    };
    if alpha <= 0.0 {
        return;
    }

    let radius = star.size * star.scale;
    let color = hue_to_rgb(star.hue, 0.75, 1.0);

    draw_additive_disc(screen, cx, cy, (radius * 2.0) as i32 + 2, color, 0.8 * alpha);
    draw_core(screen, cx, cy, radius * 0.55, color, alpha, lut);
    // Spark: a near-white pinpoint that sells the "star" read.
    draw_additive_disc(screen, cx, cy, (radius * 0.3) as i32 + 1, 0xFFFFF0, alpha);
}

/// Solid filled circle, alpha-blended in linear light with a feathered rim.
fn draw_core(
    screen: &mut FrameBuffer,
    cx: i32,
    cy: i32,
    radius: f32,
    color: u32,
    alpha: f32,
    lut: &GammaLut,
) {
    let r = radius.ceil() as i32;
    if r <= 0 {
        return;
    }
    let r2 = radius * radius;
    for y in (cy - r)..=(cy + r) {
        if y < 0 || y >= screen.height as i32 {
            continue;
        }
        for x in (cx - r)..=(cx + r) {
            if x < 0 || x >= screen.width as i32 {
                continue;
            }
            let dx = (x - cx) as f32;
            let dy = (y - cy) as f32;
            let d2 = dx * dx + dy * dy;
            if d2 > r2 {
                continue;
            }
            // Feather only the outer rim; the middle stays solid.
            let t = d2 / r2;
            let a = alpha * (1.0 - t * t);
            let idx = y as usize * screen.width + x as usize;
            screen.pixels[idx] = lut.blend(screen.pixels[idx], color, a);
        }
    }
}

/// Soft round glow with additive blending and Gaussian falloff.
fn draw_additive_disc(fb: &mut FrameBuffer, cx: i32, cy: i32, radius: i32, color: u32, strength: f32) {
    if radius <= 0 || strength <= 0.0 {
        return;
    }
    let base_r = ((color >> 16) & 0xFF) as f32;
    let base_g = ((color >> 8) & 0xFF) as f32;
    let base_b = (color & 0xFF) as f32;

    let r2 = (radius * radius) as f32;
    let sigma = radius as f32 * 0.5;
    let denom = 2.0 * sigma * sigma;

    for y in (cy - radius)..=(cy + radius) {
        for x in (cx - radius)..=(cx + radius) {
            let dx = (x - cx) as f32;
            let dy = (y - cy) as f32;
            let d2 = dx * dx + dy * dy;
            if d2 > r2 {
                continue;
            }
            let w = (-d2 / denom).exp() * strength;
            add_rgb_saturating(
                fb,
                x,
                y,
                (base_r * w).round().clamp(0.0, 255.0) as u8,
                (base_g * w).round().clamp(0.0, 255.0) as u8,
                (base_b * w).round().clamp(0.0, 255.0) as u8,
            );
        }
    }
}

/// Additive blend one RGB triplet at (x,y), saturating at 255 per channel.
#[inline]
fn add_rgb_saturating(fb: &mut FrameBuffer, x: i32, y: i32, r: u8, g: u8, b: u8) {
    if x < 0 || y < 0 {
        return;
    }
    let (x, y) = (x as usize, y as usize);
    if x >= fb.width || y >= fb.height {
        return;
    }

    let idx = y * fb.width + x;
    let old = fb.pixels[idx];

    let nr = (((old >> 16) & 0xFF) as u16 + r as u16).min(255) as u32;
    let ng = (((old >> 8) & 0xFF) as u16 + g as u16).min(255) as u32;
    let nb = ((old & 0xFF) as u16 + b as u16).min(255) as u32;

    fb.pixels[idx] = (nr << 16) | (ng << 8) | nb;
}

/// HSV → packed RGB. `hue` in degrees, `sat`/`val` in [0,1].
fn hue_to_rgb(hue: f32, sat: f32, val: f32) -> u32 {
    let h = hue.rem_euclid(360.0) / 60.0;
    let c = val * sat;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = val - c;
    let to8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u32;
    (to8(r) << 16) | (to8(g) << 8) | to8(b)
}
