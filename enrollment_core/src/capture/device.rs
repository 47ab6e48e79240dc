//! Camera device seam.

use std::io;
use std::path::{Path, PathBuf};

use image::imageops::FilterType;
use image::RgbImage;

use super::CaptureError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    User,
    Environment,
}

/// Ideal stream parameters requested from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConstraints {
    pub width: u32,
    pub height: u32,
    pub facing: FacingMode,
    pub audio: bool,
}

impl Default for StreamConstraints {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            facing: FacingMode::Environment,
            audio: false,
        }
    }
}

/// One raw video frame, packed RGB8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// A live stream handed out by a [`CameraDevice`].
pub trait VideoStream {
    /// Native frame size of the stream.
    fn dimensions(&self) -> (u32, u32);

    fn grab_frame(&mut self) -> Result<Frame, CaptureError>;

    /// Release every track. Must be idempotent.
    fn stop(&mut self);
}

pub trait CameraDevice {
    type Stream: VideoStream;

    /// Request a stream. A refusal is reported as `PermissionDenied`.
    fn open(&mut self, constraints: &StreamConstraints) -> Result<Self::Stream, CaptureError>;
}

// ---------------------------------------------------------------------------
// Still-image camera
// ---------------------------------------------------------------------------

/// A camera whose every frame is the same image file, scaled down to fit the
/// requested constraints.
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    path: PathBuf,
}

impl StillImageCamera {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl CameraDevice for StillImageCamera {
    type Stream = StillImageStream;

    fn open(&mut self, constraints: &StreamConstraints) -> Result<StillImageStream, CaptureError> {
        let img = image::open(&self.path).map_err(|e| match e {
            image::ImageError::IoError(io) if io.kind() == io::ErrorKind::PermissionDenied => {
                CaptureError::PermissionDenied(format!("{}: {}", self.path.display(), io))
            }
            image::ImageError::IoError(io) => {
                CaptureError::Device(format!("{}: {}", self.path.display(), io))
            }
            other => CaptureError::Image(other),
        })?;

        let img = if img.width() > constraints.width || img.height() > constraints.height {
            img.resize(constraints.width, constraints.height, FilterType::Triangle)
        } else {
            img
        };

        Ok(StillImageStream {
            frame: img.to_rgb8(),
            live: true,
        })
    }
}

pub struct StillImageStream {
    frame: RgbImage,
    live: bool,
}

impl StillImageStream {
    pub fn is_live(&self) -> bool {
        self.live
    }
}

impl VideoStream for StillImageStream {
    fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }

    fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
        if !self.live {
            return Err(CaptureError::Device("stream already stopped".to_string()));
        }
        let (width, height) = self.frame.dimensions();
        Ok(Frame {
            width,
            height,
            rgb: self.frame.as_raw().clone(),
        })
    }

    fn stop(&mut self) {
        self.live = false;
    }
}
