// Opens the default camera and converts frames into a buffer suitable for
// both the window and the motion detector.
// Visual expectation: each `frame()` call yields a Vec<u32> of 0x00RRGGBB
// pixels: the un-mirrored view. Mirroring happens at sampling/render time.

use crate::error::Error;
use crate::types::FrameBuffer;

use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{
        CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution,
    },
};

/// A small wrapper around `nokhwa::Camera` so the engine never touches the
/// backend directly. Dropping it closes the stream, which is how the engine
/// releases the capture device on `stop()`.
pub struct CameraFeed {
    cam: Camera,
    width: u32,
    height: u32,
}

impl CameraFeed {
    /// Probe and open camera `index` near the requested resolution.
    /// Failure here is *expected* on machines without a camera or without
    /// permission; the caller turns it into pointer-fallback mode, never
    /// into a crash.
    pub fn open(index: u32, width: u32, height: u32) -> Result<Self, Error> {
        let idx = CameraIndex::Index(index);

        // YUYV is uncompressed and cheap to convert to RGB; 30 FPS target.
        let fmt = CameraFormat::new(Resolution::new(width, height), FrameFormat::YUYV, 30);
        let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

        let mut cam =
            Camera::new(idx, req).map_err(|e| Error::CameraInit(format!("create camera: {e}")))?;

        cam.open_stream()
            .map_err(|e| Error::CameraInit(format!("open stream: {e}")))?;

        // The stream may have settled on a slightly different resolution;
        // report what it actually delivers so the window matches.
        let actual = cam.resolution();
        Ok(Self { cam, width: actual.width(), height: actual.height() })
    }

    /// Grab the current frame and repack it as 0x00RRGGBB.
    /// Errors here are transient (stream warming up, USB hiccup); the caller
    /// treats them as "no frame this iteration".
    pub fn frame(&mut self) -> Result<FrameBuffer, Error> {
        let frame = self
            .cam
            .frame()
            .map_err(|e| Error::CameraFrame(format!("fetch frame: {e}")))?;

        let rgb_img = frame
            .decode_image::<RgbFormat>()
            .map_err(|e| Error::CameraFrame(format!("decode rgb: {e}")))?;

        let (w, h) = rgb_img.dimensions();
        let mut out = Vec::with_capacity((w as usize) * (h as usize));
        for (_x, _y, pixel) in rgb_img.enumerate_pixels() {
            let r = pixel[0] as u32;
            let g = pixel[1] as u32;
            let b = pixel[2] as u32;
            out.push((r << 16) | (g << 8) | b);
        }

        Ok(FrameBuffer { width: w as usize, height: h as usize, pixels: out })
    }

    /// The resolution the camera is actually delivering.
    pub fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
