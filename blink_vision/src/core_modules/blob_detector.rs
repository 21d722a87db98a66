// THEORY:
// The `BlobDetector` turns a raw RGBA frame into the single `Detection` the
// recognizer consumes. It is the classic color-tracking recipe, implemented on
// plain byte buffers so it runs without a native vision library:
//
// 1.  **Color Mask**: Every pixel is converted to HSV and kept if it falls inside
//     an inclusive lower/upper range.
// 2.  **Morphological Cleanup**: The mask is eroded, then dilated, with a 3x3
//     structuring element. Erosion deletes specks smaller than the element;
//     dilation restores the surviving blobs to roughly their original size.
// 3.  **Connected Components**: A depth-first flood fill groups mask pixels into
//     8-connected regions.
// 4.  **Dominant Blob**: Only the largest region counts. Its centroid (the mean of
//     its pixel coordinates) becomes the detection's position.
//
// The detector is stateless. One frame in, one `Detection` out. Smoothing across
// frames, if wanted, belongs in a wrapper, never in the matcher.

use crate::core_modules::detection::{Detection, Point};
use crate::core_modules::pixel::pixel::{CHANNELS, Hsv, Pixel};
use crate::error::DetectError;
use serde::Deserialize;

pub mod blob_detector {
    use super::*; // Make structs from parent module available.

    /// Tunable parameters of the color blob detector.
    #[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
    #[serde(default)]
    pub struct DetectorConfig {
        /// Inclusive lower HSV bound, OpenCV scale (H 0-180, S and V 0-255).
        pub lower: [u8; 3],
        /// Inclusive upper HSV bound.
        pub upper: [u8; 3],
        /// Erosion passes followed by the same number of dilation passes.
        pub morph_iterations: usize,
        /// Smallest blob, in pixels, that still counts as a detection.
        pub min_area: usize,
    }

    impl Default for DetectorConfig {
        fn default() -> Self {
            // Bright, nearly unsaturated light: a white LED or a lamp.
            Self {
                lower: [0, 0, 240],
                upper: [255, 50, 255],
                morph_iterations: 2,
                min_area: 1,
            }
        }
    }

    /// The dominant blob found in a frame.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Blob {
        pub centroid: Point,
        /// Size in pixels after morphological cleanup.
        pub area: usize,
    }

    #[derive(Debug, Clone, Default)]
    pub struct ColorBlobDetector {
        config: DetectorConfig,
    }

    impl ColorBlobDetector {
        pub fn new(config: DetectorConfig) -> Self {
            Self { config }
        }

        pub fn config(&self) -> &DetectorConfig {
            &self.config
        }

        /// Runs the full pipeline and reduces the result to a presence sample.
        pub fn detect(&self, frame: &[u8], width: u32, height: u32) -> Result<Detection, DetectError> {
            Ok(match self.find_blob(frame, width, height)? {
                Some(blob) => Detection::found(blob.centroid),
                None => Detection::missing(),
            })
        }

        pub fn find_blob(&self, frame: &[u8], width: u32, height: u32) -> Result<Option<Blob>, DetectError> {
            let expected = width as usize * height as usize * CHANNELS;
            if frame.len() != expected {
                return Err(DetectError::BufferSize {
                    width,
                    height,
                    expected,
                    actual: frame.len(),
                });
            }

            let (w, h) = (width as usize, height as usize);
            let mut mask = self.color_mask(frame);
            for _ in 0..self.config.morph_iterations {
                mask = erode(&mask, w, h);
            }
            for _ in 0..self.config.morph_iterations {
                mask = dilate(&mask, w, h);
            }

            Ok(largest_component(&mask, w, h).filter(|blob| blob.area >= self.config.min_area))
        }

        fn color_mask(&self, frame: &[u8]) -> Vec<bool> {
            let [lh, ls, lv] = self.config.lower;
            let [uh, us, uv] = self.config.upper;
            let lower = Hsv::new(lh, ls, lv);
            let upper = Hsv::new(uh, us, uv);

            frame
                .chunks_exact(CHANNELS)
                .map(|bytes| {
                    let pixel = Pixel::from([bytes[0], bytes[1], bytes[2], bytes[3]]);
                    pixel.hsv().within(&lower, &upper)
                })
                .collect()
        }
    }

    /// Iterates the in-frame members of the 3x3 neighborhood around (x, y), center included.
    fn neighborhood(x: usize, y: usize, w: usize, h: usize) -> impl Iterator<Item = usize> {
        let xs = x.saturating_sub(1)..=(x + 1).min(w - 1);
        let ys = y.saturating_sub(1)..=(y + 1).min(h - 1);
        ys.flat_map(move |ny| xs.clone().map(move |nx| ny * w + nx))
    }

    /// A pixel survives only if every neighbor inside the frame is set.
    pub fn erode(mask: &[bool], w: usize, h: usize) -> Vec<bool> {
        (0..mask.len())
            .map(|i| mask[i] && neighborhood(i % w, i / w, w, h).all(|n| mask[n]))
            .collect()
    }

    /// A pixel is set if any neighbor inside the frame is set.
    pub fn dilate(mask: &[bool], w: usize, h: usize) -> Vec<bool> {
        (0..mask.len())
            .map(|i| mask[i] || neighborhood(i % w, i / w, w, h).any(|n| mask[n]))
            .collect()
    }

    /// Finds the largest 8-connected region of set pixels.
    /// Ties go to the region reached first in row-major order.
    pub fn largest_component(mask: &[bool], w: usize, h: usize) -> Option<Blob> {
        let mut visited = vec![false; mask.len()];
        let mut best: Option<Blob> = None;

        for start in 0..mask.len() {
            if !mask[start] || visited[start] {
                continue;
            }

            // Flood fill from this seed.
            let mut stack = vec![start];
            visited[start] = true;
            let (mut area, mut sum_x, mut sum_y) = (0usize, 0usize, 0usize);

            while let Some(current) = stack.pop() {
                let (x, y) = (current % w, current / w);
                area += 1;
                sum_x += x;
                sum_y += y;

                for n in neighborhood(x, y, w, h) {
                    if mask[n] && !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }

            if best.is_none_or(|b| area > b.area) {
                best = Some(Blob {
                    centroid: Point::new((sum_x / area) as i32, (sum_y / area) as i32),
                    area,
                });
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::blob_detector::*;
    use crate::core_modules::presence::PresenceFlag;

    const W: u32 = 40;
    const H: u32 = 30;

    fn dark_frame() -> Vec<u8> {
        let mut frame = vec![0u8; (W * H * 4) as usize];
        frame.chunks_exact_mut(4).for_each(|px| px[3] = 255);
        frame
    }

    fn paint_square(frame: &mut [u8], x0: u32, y0: u32, side: u32, rgb: [u8; 3]) {
        for y in y0..y0 + side {
            for x in x0..x0 + side {
                let i = ((y * W + x) * 4) as usize;
                frame[i..i + 3].copy_from_slice(&rgb);
            }
        }
    }

    #[test]
    fn finds_centroid_of_bright_square() {
        let mut frame = dark_frame();
        paint_square(&mut frame, 10, 5, 9, [255, 255, 255]);

        let blob = ColorBlobDetector::default().find_blob(&frame, W, H).unwrap().unwrap();
        assert_eq!(blob.centroid.x, 14);
        assert_eq!(blob.centroid.y, 9);
        assert_eq!(blob.area, 81);
    }

    #[test]
    fn dark_frame_is_absent() {
        let detection = ColorBlobDetector::default().detect(&dark_frame(), W, H).unwrap();
        assert_eq!(detection.presence, PresenceFlag::Absent);
        assert!(detection.position.is_none());
    }

    #[test]
    fn saturated_color_outside_range_is_ignored() {
        let mut frame = dark_frame();
        paint_square(&mut frame, 10, 10, 9, [255, 0, 0]);
        let detection = ColorBlobDetector::default().detect(&frame, W, H).unwrap();
        assert_eq!(detection.presence, PresenceFlag::Absent);
    }

    #[test]
    fn specks_are_removed_by_erosion() {
        let mut frame = dark_frame();
        paint_square(&mut frame, 5, 5, 2, [255, 255, 255]);
        let detection = ColorBlobDetector::default().detect(&frame, W, H).unwrap();
        assert_eq!(detection.presence, PresenceFlag::Absent);
    }

    #[test]
    fn largest_blob_wins() {
        let mut frame = dark_frame();
        paint_square(&mut frame, 2, 2, 7, [255, 255, 255]);
        paint_square(&mut frame, 20, 10, 11, [255, 255, 255]);

        let detection = ColorBlobDetector::default().detect(&frame, W, H).unwrap();
        assert_eq!(detection.presence, PresenceFlag::Present);
        let position = detection.position.unwrap();
        assert_eq!((position.x, position.y), (25, 15));
    }

    #[test]
    fn min_area_filters_small_blobs() {
        let mut frame = dark_frame();
        paint_square(&mut frame, 10, 10, 9, [255, 255, 255]);
        let detector = ColorBlobDetector::new(DetectorConfig {
            min_area: 100,
            ..DetectorConfig::default()
        });
        assert!(detector.find_blob(&frame, W, H).unwrap().is_none());
    }

    #[test]
    fn rejects_mismatched_buffer() {
        let err = ColorBlobDetector::default().detect(&[0u8; 10], W, H).unwrap_err();
        assert!(matches!(err, crate::error::DetectError::BufferSize { actual: 10, .. }));
    }

    #[test]
    fn morphology_on_small_mask() {
        // A plus shape vanishes; a 3x3 block erodes to its center and dilates back.
        let mut mask = vec![false; 25];
        for i in [7, 11, 12, 13, 17] {
            mask[i] = true;
        }
        let eroded = erode(&mask, 5, 5);
        assert_eq!(eroded.iter().filter(|&&m| m).count(), 0);

        let mut block = vec![false; 25];
        for i in [6, 7, 8, 11, 12, 13, 16, 17, 18] {
            block[i] = true;
        }
        let eroded = erode(&block, 5, 5);
        assert_eq!(eroded.iter().filter(|&&m| m).count(), 1);
        assert!(eroded[12]);
        assert_eq!(dilate(&eroded, 5, 5), block);
    }

    #[test]
    fn components_use_eight_connectivity() {
        // Two diagonal pixels form one region.
        let mut mask = vec![false; 9];
        mask[0] = true;
        mask[4] = true;
        let blob = largest_component(&mask, 3, 3).unwrap();
        assert_eq!(blob.area, 2);
    }
}
