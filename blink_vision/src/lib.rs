// THEORY:
// This file is the main entry point for the `blink_vision` library crate.
// It exposes the `TrackingPipeline` (one stream, one stepping loop) and the
// `StreamPool` (many independent streams at once) as the high-level API.
//
// The recognizer itself lives in `core_modules`: a bounded window of
// presence flags, a registry of named blink signatures and a stateless
// matcher that compares the trailing entries of the window against every
// signature once per frame. Everything that turns pixels into a presence
// flag (the color blob detector, the frame sources) sits beside it as a
// collaborator and can be swapped without touching the matcher.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::blob_detector::blob_detector::{Blob, ColorBlobDetector, DetectorConfig};
pub use core_modules::detection::{Detection, DetectionSource, EventSink, LogSink, Point, ReplaySource};
pub use core_modules::frame_source::FrameSequenceSource;
pub use core_modules::pattern_matcher::{MatchEvent, PatternMatcher};
pub use core_modules::position_history::{PositionHistory, TrailSegment};
pub use core_modules::presence::{PresenceFlag, PresenceWindow};
pub use core_modules::signature::{Signature, SignatureRegistry};
pub use error::{ConfigError, DetectError, SourceError};
pub use parallel_pipeline::{BoxedSource, StreamOutcome, StreamPool};
pub use pipeline::{PipelineConfig, RunSummary, SignatureConfig, StepReport, TrackingPipeline};
