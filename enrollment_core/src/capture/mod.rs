//! Photo capture lifecycle.
//!
//! A camera stream is acquired through [`CameraDevice`], one frame is frozen
//! into a bitmap and encoded as a JPEG data URI, and the stream is released.
//! Uploading an image file produces the same data-URI result without a stream.
//!
//! - [`device`]: device and stream traits, plus a file-backed still camera
//! - [`lifecycle`]: the Idle / Streaming / Captured state machine
//! - [`data_uri`]: data URI parsing and encoding

pub mod data_uri;
pub mod device;
pub mod lifecycle;

use thiserror::Error;

pub use data_uri::DataUri;
pub use device::{CameraDevice, FacingMode, Frame, StillImageCamera, StreamConstraints, VideoStream};
pub use lifecycle::{CaptureState, PhotoCapture, JPEG_QUALITY};

#[derive(Error, Debug)]
pub enum CaptureError {
    /// The host refused camera access. Upload remains available.
    #[error("Camera access denied: {0}")]
    PermissionDenied(String),

    #[error("Camera device error: {0}")]
    Device(String),

    #[error("No active camera stream")]
    NotStreaming,

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("Malformed data URI: {0}")]
    MalformedDataUri(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
