//! Idle / Streaming / Captured state machine.
//!
//! The captured photo is held apart from the stream state. `stop` returns to
//! Idle from any state but keeps the last photo for the form; only `retake`,
//! `reset` or a newer capture/upload replace it.

use std::fs;
use std::io::Cursor;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::{debug, warn};

use super::data_uri::{is_image_mime, DataUri};
use super::device::{CameraDevice, StreamConstraints, VideoStream};
use super::CaptureError;

/// Lossy quality used for captured frames (0-100).
pub const JPEG_QUALITY: u8 = 70;

/// Default upload ceiling: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 5 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Streaming,
    Captured,
}

pub struct PhotoCapture<D: CameraDevice> {
    device: D,
    constraints: StreamConstraints,
    max_upload_bytes: u64,
    state: CaptureState,
    stream: Option<D::Stream>,
    photo: Option<String>,
}

impl<D: CameraDevice> PhotoCapture<D> {
    pub fn new(device: D) -> Self {
        Self::with_limits(device, StreamConstraints::default(), DEFAULT_MAX_UPLOAD_BYTES)
    }

    pub fn with_limits(device: D, constraints: StreamConstraints, max_upload_bytes: u64) -> Self {
        Self {
            device,
            constraints,
            max_upload_bytes,
            state: CaptureState::Idle,
            stream: None,
            photo: None,
        }
    }

    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// The current photo as a data URI, if one was captured or uploaded.
    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    /// Hand the photo to the caller, leaving the lifecycle reset.
    pub fn take_photo(&mut self) -> Option<String> {
        let photo = self.photo.take();
        self.reset();
        photo
    }

    /// Request a stream. On denial the state stays Idle and the error is
    /// returned so the caller can offer upload instead.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.state == CaptureState::Streaming {
            return Ok(());
        }
        match self.device.open(&self.constraints) {
            Ok(stream) => {
                debug!(dimensions = ?stream.dimensions(), "camera stream started");
                self.stream = Some(stream);
                self.state = CaptureState::Streaming;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "camera unavailable, upload a photo instead");
                self.state = CaptureState::Idle;
                Err(e)
            }
        }
    }

    /// Freeze the current frame, encode it, and release the stream.
    pub fn capture(&mut self) -> Result<&str, CaptureError> {
        if self.state != CaptureState::Streaming {
            return Err(CaptureError::NotStreaming);
        }
        let stream = self.stream.as_mut().ok_or(CaptureError::NotStreaming)?;
        let dimensions = stream.dimensions();

        let encoded = stream
            .grab_frame()
            .and_then(|frame| {
                let bitmap = RgbImage::from_raw(frame.width, frame.height, frame.rgb)
                    .ok_or_else(|| CaptureError::Device("frame buffer size mismatch".to_string()))?;
                encode_jpeg(&fit_bitmap(bitmap, dimensions), JPEG_QUALITY)
            });

        self.stop();
        let jpeg = encoded?;

        debug!(bytes = jpeg.len(), "photo captured");
        self.state = CaptureState::Captured;
        Ok(self.photo.insert(DataUri::new("image/jpeg", jpeg).to_string()).as_str())
    }

    /// Release the stream. Safe from any state, idempotent.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("camera stream stopped");
        }
        self.state = CaptureState::Idle;
    }

    /// Discard the photo and start the camera again.
    pub fn retake(&mut self) -> Result<(), CaptureError> {
        self.reset();
        self.start()
    }

    /// Stop the stream and forget the photo.
    pub fn reset(&mut self) {
        self.stop();
        self.photo = None;
    }

    /// Use an image file instead of the camera.
    pub fn upload_file(&mut self, path: &Path) -> Result<&str, CaptureError> {
        let mime = ImageFormat::from_path(path)
            .map(|f| f.to_mime_type().to_string())
            .map_err(|_| CaptureError::UnsupportedType(path.display().to_string()))?;
        self.check_size(fs::metadata(path)?.len())?;
        let bytes = fs::read(path)?;
        self.upload_bytes(&mime, bytes)
    }

    /// Use raw image bytes of the given media type instead of the camera.
    pub fn upload_bytes(&mut self, mime: &str, bytes: Vec<u8>) -> Result<&str, CaptureError> {
        if !is_image_mime(mime) {
            return Err(CaptureError::UnsupportedType(mime.to_string()));
        }
        self.check_size(bytes.len() as u64)?;

        self.stop();
        self.state = CaptureState::Captured;
        debug!(mime, bytes = bytes.len(), "photo uploaded");
        Ok(self.photo.insert(DataUri::new(mime, bytes).to_string()).as_str())
    }

    fn check_size(&self, size: u64) -> Result<(), CaptureError> {
        if size > self.max_upload_bytes {
            return Err(CaptureError::TooLarge {
                size,
                limit: self.max_upload_bytes,
            });
        }
        Ok(())
    }
}

impl<D: CameraDevice> Drop for PhotoCapture<D> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Scale a frame onto a bitmap of the stream's size.
fn fit_bitmap(bitmap: RgbImage, (width, height): (u32, u32)) -> RgbImage {
    if bitmap.dimensions() == (width, height) || width == 0 || height == 0 {
        return bitmap;
    }
    DynamicImage::ImageRgb8(bitmap)
        .resize_exact(width, height, FilterType::Triangle)
        .to_rgb8()
}

pub fn encode_jpeg(bitmap: &RgbImage, quality: u8) -> Result<Vec<u8>, CaptureError> {
    let mut buf = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(bitmap)?;
    Ok(buf.into_inner())
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::capture::device::Frame;

    struct MockCamera {
        deny: bool,
        broken: bool,
        opened: Rc<Cell<u32>>,
        stopped: Rc<Cell<u32>>,
    }

    impl MockCamera {
        fn new() -> Self {
            Self {
                deny: false,
                broken: false,
                opened: Rc::new(Cell::new(0)),
                stopped: Rc::new(Cell::new(0)),
            }
        }
    }

    struct MockStream {
        broken: bool,
        stopped: Rc<Cell<u32>>,
    }

    impl VideoStream for MockStream {
        fn dimensions(&self) -> (u32, u32) {
            (32, 24)
        }

        fn grab_frame(&mut self) -> Result<Frame, CaptureError> {
            if self.broken {
                return Err(CaptureError::Device("sensor unplugged".to_string()));
            }
            Ok(Frame {
                width: 16,
                height: 12,
                rgb: vec![128; 16 * 12 * 3],
            })
        }

        fn stop(&mut self) {
            self.stopped.set(self.stopped.get() + 1);
        }
    }

    impl CameraDevice for MockCamera {
        type Stream = MockStream;

        fn open(&mut self, _c: &StreamConstraints) -> Result<MockStream, CaptureError> {
            if self.deny {
                return Err(CaptureError::PermissionDenied("NotAllowedError".to_string()));
            }
            self.opened.set(self.opened.get() + 1);
            Ok(MockStream {
                broken: self.broken,
                stopped: Rc::clone(&self.stopped),
            })
        }
    }

    #[test]
    fn test_start_capture_releases_stream() {
        let cam = MockCamera::new();
        let stopped = Rc::clone(&cam.stopped);
        let mut capture = PhotoCapture::new(cam);

        capture.start().unwrap();
        assert_eq!(capture.state(), CaptureState::Streaming);

        let uri = capture.capture().unwrap().to_string();
        assert!(uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!(capture.state(), CaptureState::Captured);
        assert_eq!(stopped.get(), 1);

        let decoded = DataUri::parse(&uri).unwrap();
        let img = image::load_from_memory(&decoded.data).unwrap();
        assert_eq!((img.width(), img.height()), (32, 24));
    }

    #[test]
    fn test_denied_start_stays_idle() {
        let mut cam = MockCamera::new();
        cam.deny = true;
        let mut capture = PhotoCapture::new(cam);
        assert!(matches!(capture.start(), Err(CaptureError::PermissionDenied(_))));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.photo().is_none());
    }

    #[test]
    fn test_capture_requires_stream() {
        let mut capture = PhotoCapture::new(MockCamera::new());
        assert!(matches!(capture.capture(), Err(CaptureError::NotStreaming)));
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let cam = MockCamera::new();
        let stopped = Rc::clone(&cam.stopped);
        let mut capture = PhotoCapture::new(cam);
        capture.stop();
        capture.start().unwrap();
        capture.stop();
        capture.stop();
        assert_eq!(stopped.get(), 1);
        assert_eq!(capture.state(), CaptureState::Idle);
    }

    #[test]
    fn test_stop_keeps_captured_photo() {
        let mut capture = PhotoCapture::new(MockCamera::new());
        capture.start().unwrap();
        capture.capture().unwrap();
        assert_eq!(capture.state(), CaptureState::Captured);
        capture.stop();
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.photo().is_some());
    }

    #[test]
    fn test_retake_clears_and_restarts() {
        let cam = MockCamera::new();
        let opened = Rc::clone(&cam.opened);
        let mut capture = PhotoCapture::new(cam);
        capture.start().unwrap();
        capture.capture().unwrap();

        capture.retake().unwrap();
        assert!(capture.photo().is_none());
        assert_eq!(capture.state(), CaptureState::Streaming);
        assert_eq!(opened.get(), 2);
    }

    #[test]
    fn test_device_failure_releases_stream() {
        let mut cam = MockCamera::new();
        cam.broken = true;
        let stopped = Rc::clone(&cam.stopped);
        let mut capture = PhotoCapture::new(cam);
        capture.start().unwrap();
        assert!(matches!(capture.capture(), Err(CaptureError::Device(_))));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert_eq!(stopped.get(), 1);
        assert!(capture.photo().is_none());
    }

    #[test]
    fn test_upload_stops_stream() {
        let cam = MockCamera::new();
        let stopped = Rc::clone(&cam.stopped);
        let mut capture = PhotoCapture::new(cam);
        capture.start().unwrap();

        let uri = capture.upload_bytes("image/png", vec![1, 2, 3]).unwrap();
        assert_eq!(uri, "data:image/png;base64,AQID");
        assert_eq!(capture.state(), CaptureState::Captured);
        assert_eq!(stopped.get(), 1);
    }

    #[test]
    fn test_upload_rejects_type_and_size() {
        let mut capture =
            PhotoCapture::with_limits(MockCamera::new(), StreamConstraints::default(), 4);
        assert!(matches!(
            capture.upload_bytes("application/pdf", vec![1]),
            Err(CaptureError::UnsupportedType(_))
        ));
        assert!(matches!(
            capture.upload_bytes("image/png", vec![0; 5]),
            Err(CaptureError::TooLarge { size: 5, limit: 4 })
        ));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.photo().is_none());
    }

    #[test]
    fn test_upload_file_uses_extension_mime() {
        let dir = std::env::temp_dir().join("enrollment_core_lifecycle_tests");
        fs::create_dir_all(&dir).unwrap();
        let png = dir.join("upload.png");
        RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3])).save(&png).unwrap();
        let txt = dir.join("notes.txt");
        fs::write(&txt, b"hello").unwrap();

        let mut capture = PhotoCapture::new(MockCamera::new());
        assert!(capture.upload_file(&png).unwrap().starts_with("data:image/png;base64,"));
        assert!(matches!(
            capture.upload_file(&txt),
            Err(CaptureError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_upload_file_checks_type_before_size() {
        let dir = std::env::temp_dir().join("enrollment_core_lifecycle_tests");
        fs::create_dir_all(&dir).unwrap();
        let big_txt = dir.join("big.txt");
        fs::write(&big_txt, vec![b'x'; 64]).unwrap();

        let mut capture =
            PhotoCapture::with_limits(MockCamera::new(), StreamConstraints::default(), 8);
        assert!(matches!(
            capture.upload_file(&big_txt),
            Err(CaptureError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_start_while_streaming_is_noop() {
        let cam = MockCamera::new();
        let opened = Rc::clone(&cam.opened);
        let stopped = Rc::clone(&cam.stopped);
        let mut capture = PhotoCapture::new(cam);

        capture.start().unwrap();
        capture.start().unwrap();
        assert_eq!(capture.state(), CaptureState::Streaming);
        assert_eq!(opened.get(), 1);
        assert_eq!(stopped.get(), 0);
    }

    #[test]
    fn test_start_from_captured_keeps_photo() {
        let cam = MockCamera::new();
        let opened = Rc::clone(&cam.opened);
        let mut capture = PhotoCapture::new(cam);
        capture.start().unwrap();
        let first = capture.capture().unwrap().to_string();

        capture.start().unwrap();
        assert_eq!(capture.state(), CaptureState::Streaming);
        assert_eq!(capture.photo(), Some(first.as_str()));
        assert_eq!(opened.get(), 2);
    }

    #[test]
    fn test_rejected_upload_keeps_stream_live() {
        let cam = MockCamera::new();
        let stopped = Rc::clone(&cam.stopped);
        let mut capture =
            PhotoCapture::with_limits(cam, StreamConstraints::default(), 4);
        capture.start().unwrap();

        assert!(capture.upload_bytes("text/plain", vec![1]).is_err());
        assert!(capture.upload_bytes("image/png", vec![0; 5]).is_err());
        assert_eq!(capture.state(), CaptureState::Streaming);
        assert_eq!(stopped.get(), 0);
        assert!(capture.photo().is_none());

        capture.capture().unwrap();
        assert_eq!(capture.state(), CaptureState::Captured);
    }

    #[test]
    fn test_take_photo_resets() {
        let mut capture = PhotoCapture::new(MockCamera::new());
        capture.upload_bytes("image/gif", vec![7]).unwrap();
        assert_eq!(capture.take_photo().as_deref(), Some("data:image/gif;base64,Bw=="));
        assert_eq!(capture.state(), CaptureState::Idle);
        assert!(capture.photo().is_none());
    }
}
