// Crate-wide error type. Every variant states *where* things went wrong.
// Camera trouble never reaches this enum at game time; the engine degrades
// to pointer mode or an empty motion mask instead (see input.rs / motion.rs);
// these variants surface only at the window boundary and during probing.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Creating the window failed.
    #[error("window init error: {0}")]
    WindowInit(String),

    /// Pushing a frame to the window failed.
    #[error("window update error: {0}")]
    WindowUpdate(String),

    /// Opening/starting the camera failed.
    #[error("camera init error: {0}")]
    CameraInit(String),

    /// Grabbing/decoding a frame failed.
    #[error("camera frame error: {0}")]
    CameraFrame(String),
}
