// THEORY:
// `FrameSequenceSource` is the recorded-stream counterpart of a camera. It walks
// a directory of still frames in file-name order, decodes each one with the
// `image` crate and hands the RGBA pixels to a `ColorBlobDetector`.
//
// It exists so the whole tracking loop can run headless and without a native
// vision library: exported video frames, test fixtures and captured datasets
// all look like a directory of images.

use crate::core_modules::blob_detector::blob_detector::ColorBlobDetector;
use crate::core_modules::detection::{Detection, DetectionSource};
use crate::error::SourceError;
use image::imageops::FilterType;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::debug;

const FRAME_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "bmp"];

pub struct FrameSequenceSource {
    dir: PathBuf,
    frames: VecDeque<PathBuf>,
    detector: ColorBlobDetector,
    target_width: Option<u32>,
}

impl FrameSequenceSource {
    /// Lists the frames in `dir`. Files with other extensions are skipped.
    pub fn open(dir: impl AsRef<Path>, detector: ColorBlobDetector) -> Result<Self, SourceError> {
        let dir = dir.as_ref().to_path_buf();
        let entries = std::fs::read_dir(&dir).map_err(|source| SourceError::Io {
            path: dir.clone(),
            source,
        })?;

        let mut frames = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|source| SourceError::Io {
                    path: dir.clone(),
                    source,
                })?
                .path();
            if is_frame(&path) {
                frames.push(path);
            }
        }
        frames.sort();

        debug!(dir = %dir.display(), frames = frames.len(), "opened frame sequence");
        Ok(Self {
            dir,
            frames: frames.into(),
            detector,
            target_width: None,
        })
    }

    /// Scales every frame to this width before detection, keeping the aspect ratio.
    pub fn with_target_width(mut self, width: u32) -> Self {
        self.target_width = Some(width);
        self
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

fn is_frame(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FRAME_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known)))
}

impl DetectionSource for FrameSequenceSource {
    fn next_detection(&mut self) -> Result<Option<Detection>, SourceError> {
        let Some(path) = self.frames.pop_front() else {
            return Ok(None);
        };

        let mut frame = image::open(&path)
            .map_err(|source| SourceError::Decode {
                path: path.clone(),
                source,
            })?
            .to_rgba8();

        if let Some(width) = self.target_width {
            if width > 0 && width != frame.width() {
                let height = ((frame.height() as u64 * width as u64) / frame.width().max(1) as u64).max(1) as u32;
                frame = image::imageops::resize(&frame, width, height, FilterType::Triangle);
            }
        }

        let detection = self.detector.detect(frame.as_raw(), frame.width(), frame.height())?;
        debug!(frame = %path.display(), presence = ?detection.presence, "decoded frame");
        Ok(Some(detection))
    }

    fn label(&self) -> String {
        self.dir.display().to_string()
    }
}
