// THEORY (Single-Pixel Color Heuristics):
// The `Pixel` module is the most fundamental unit of the detection stage. It is a
// "dumb" data container for a single RGBA pixel plus the heuristics that can be
// computed from that pixel alone, with no knowledge of neighbors in space or time.
//
// The blob detector thresholds in HSV, so the central heuristic here is the
// conversion to OpenCV's 8-bit HSV convention:
//   • Hue in 0..=180 (degrees halved so it fits a byte; hues just under 360°
//     round up to 180, as OpenCV's own conversion does)
//   • Saturation in 0..=255 (chroma relative to value)
//   • Value in 0..=255 (the largest RGB channel)
// Using the same scale as OpenCV means color ranges tuned with OpenCV tools can be
// pasted into the configuration unchanged.
//
// Anything that needs another pixel (morphology, connectivity, centroids) lives in
// `blob_detector`.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;

    pub const CHANNELS: usize = 4;

    /// A "dumb" data container representing a single RGBA pixel.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
        /// The alpha (transparency) channel value (0-255). Ignored by HSV.
        pub alpha: Channel,
    }

    /// A color in OpenCV's 8-bit HSV space.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Hsv {
        pub hue: u8,
        pub saturation: u8,
        pub value: u8,
    }

    impl Hsv {
        pub const fn new(hue: u8, saturation: u8, value: u8) -> Self {
            Self { hue, saturation, value }
        }

        /// Inclusive per-channel range check.
        pub fn within(&self, lower: &Hsv, upper: &Hsv) -> bool {
            (lower.hue..=upper.hue).contains(&self.hue)
                && (lower.saturation..=upper.saturation).contains(&self.saturation)
                && (lower.value..=upper.value).contains(&self.value)
        }
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel { red, green, blue, alpha }
        }

        /// Converts to OpenCV-scaled HSV (H 0..=180, S and V 0..=255).
        pub fn hsv(&self) -> Hsv {
            let r = self.red as f32;
            let g = self.green as f32;
            let b = self.blue as f32;

            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let chroma = max - min;

            let saturation = if max > 0.0 { chroma * 255.0 / max } else { 0.0 };

            let mut hue = if chroma == 0.0 {
                0.0
            } else if max == r {
                60.0 * (g - b) / chroma
            } else if max == g {
                120.0 + 60.0 * (b - r) / chroma
            } else {
                240.0 + 60.0 * (r - g) / chroma
            };
            if hue < 0.0 {
                hue += 360.0;
            }

            Hsv {
                hue: (hue / 2.0).round() as u8,
                saturation: saturation.round() as u8,
                value: max as u8,
            }
        }
    }

    impl From<[Byte; CHANNELS]> for Pixel {
        fn from(bytes: [Byte; CHANNELS]) -> Self {
            Pixel::new(bytes[0], bytes[1], bytes[2], bytes[3])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn primaries_map_to_opencv_hues() {
        assert_eq!(Pixel::new(255, 0, 0, 255).hsv(), Hsv::new(0, 255, 255));
        assert_eq!(Pixel::new(0, 255, 0, 255).hsv(), Hsv::new(60, 255, 255));
        assert_eq!(Pixel::new(0, 0, 255, 255).hsv(), Hsv::new(120, 255, 255));
    }

    #[test]
    fn grays_have_no_hue_or_saturation() {
        assert_eq!(Pixel::new(0, 0, 0, 255).hsv(), Hsv::new(0, 0, 0));
        assert_eq!(Pixel::new(250, 250, 250, 255).hsv(), Hsv::new(0, 0, 250));
    }

    #[test]
    fn magenta_wraps_to_upper_hues() {
        // 300 degrees -> 150 on the halved scale.
        assert_eq!(Pixel::new(255, 0, 255, 255).hsv().hue, 150);
    }

    #[test]
    fn hues_just_below_full_circle_round_to_180() {
        // 359.76 degrees halves to 179.88, which OpenCV rounds to 180.
        assert_eq!(Pixel::new(255, 0, 1, 255).hsv().hue, 180);
    }

    #[test]
    fn range_check_is_inclusive() {
        let lower = Hsv::new(0, 0, 240);
        let upper = Hsv::new(255, 50, 255);
        assert!(Hsv::new(10, 50, 240).within(&lower, &upper));
        assert!(!Hsv::new(10, 51, 240).within(&lower, &upper));
        assert!(!Hsv::new(10, 0, 239).within(&lower, &upper));
    }

    #[test]
    fn builds_from_rgba_bytes() {
        let pixel = Pixel::from([1, 2, 3, 4]);
        assert_eq!((pixel.red, pixel.green, pixel.blue, pixel.alpha), (1, 2, 3, 4));
    }
}
