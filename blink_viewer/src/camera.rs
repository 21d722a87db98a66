use blink_vision::{ColorBlobDetector, Detection, DetectionSource, PositionHistory, SourceError};
use opencv::{
    core::{self, Mat, Point, Scalar},
    imgproc,
    prelude::*,
    videoio::{self, VideoCapture},
};
use std::path::{Path, PathBuf};

/// Captures frames with OpenCV and reduces each one to a `Detection`.
/// The most recent frame stays available so the caller can draw on it.
pub struct CameraSource {
    capture: VideoCapture,
    video: Option<PathBuf>,
    detector: ColorBlobDetector,
    width: u32,
    frame: Mat,
}

impl CameraSource {
    /// Opens `video`, or the default camera when no path is given.
    pub fn open(video: Option<&Path>, detector: ColorBlobDetector, width: u32) -> opencv::Result<Self> {
        let capture = match video {
            Some(path) => VideoCapture::from_file(&path.to_string_lossy(), videoio::CAP_ANY)?,
            None => VideoCapture::new(0, videoio::CAP_ANY)?,
        };
        if !capture.is_opened()? {
            return Err(opencv::Error::new(
                core::StsError,
                format!("unable to open {}", describe(video)),
            ));
        }
        Ok(Self {
            capture,
            video: video.map(Path::to_path_buf),
            detector,
            width,
            frame: Mat::default(),
        })
    }

    pub fn frame(&self) -> &Mat {
        &self.frame
    }

    pub fn frame_mut(&mut self) -> &mut Mat {
        &mut self.frame
    }

    fn grab(&mut self) -> opencv::Result<Option<Detection>> {
        let mut raw = Mat::default();
        if !self.capture.read(&mut raw)? || raw.empty() {
            if self.video.is_some() {
                return Ok(None);
            }
            return Err(opencv::Error::new(core::StsError, "camera returned no frame".to_string()));
        }

        // Resize to the working width, keeping the aspect ratio.
        let scale = self.width as f64 / raw.cols().max(1) as f64;
        let size = core::Size::new(self.width as i32, (raw.rows() as f64 * scale).round().max(1.0) as i32);
        imgproc::resize(&raw, &mut self.frame, size, 0.0, 0.0, imgproc::INTER_AREA)?;

        // Convert the OpenCV Mat (BGR) to an RGBA buffer for the detector.
        let mut rgba = Mat::default();
        imgproc::cvt_color(&self.frame, &mut rgba, imgproc::COLOR_BGR2RGBA, 0)?;
        let detection = self
            .detector
            .detect(rgba.data_bytes()?, rgba.cols() as u32, rgba.rows() as u32)
            .map_err(|e| opencv::Error::new(core::StsError, e.to_string()))?;
        Ok(Some(detection))
    }
}

impl DetectionSource for CameraSource {
    fn next_detection(&mut self) -> Result<Option<Detection>, SourceError> {
        self.grab().map_err(|e| SourceError::Capture(e.to_string()))
    }

    fn label(&self) -> String {
        describe(self.video.as_deref())
    }
}

fn describe(video: Option<&Path>) -> String {
    match video {
        Some(path) => path.display().to_string(),
        None => String::from("camera 0"),
    }
}

/// Draws the fading trail and marks the newest position.
pub fn draw_trail(frame: &mut Mat, history: &PositionHistory) -> opencv::Result<()> {
    let red = Scalar::new(0.0, 0.0, 255.0, 0.0);
    for segment in history.segments() {
        let newer = Point::new(segment.newer.x, segment.newer.y);
        let older = Point::new(segment.older.x, segment.older.y);
        imgproc::line(frame, newer, older, red, segment.thickness.max(1), imgproc::LINE_8, 0)?;
    }
    if let Some(head) = history.latest() {
        imgproc::circle(frame, Point::new(head.x, head.y), 5, red, -1, imgproc::LINE_8, 0)?;
    }
    Ok(())
}
