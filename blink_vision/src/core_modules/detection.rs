// THEORY:
// This module defines the seams between the recognizer and the outside world.
//
// - A `Detection` is the per-frame summary the core consumes. Presence drives
//   the matcher; the optional position only feeds the trail. They are separate
//   fields so neither has to be inferred from the other.
// - A `DetectionSource` is anything that can produce one `Detection` per frame:
//   a camera behind OpenCV, a directory of still frames, a scripted replay.
//   Returning `Ok(None)` ends the stream between steps.
// - An `EventSink` receives every `MatchEvent` the loop emits.

use crate::core_modules::pattern_matcher::MatchEvent;
use crate::core_modules::presence::{PresenceFlag, parse_flags};
use crate::error::{ConfigError, SourceError};
use std::collections::VecDeque;
use tracing::info;

/// A pixel coordinate in the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// What the detection stage saw in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub presence: PresenceFlag,
    pub position: Option<Point>,
}

impl Detection {
    pub fn found(position: Point) -> Self {
        Self {
            presence: PresenceFlag::Present,
            position: Some(position),
        }
    }

    pub fn missing() -> Self {
        Self {
            presence: PresenceFlag::Absent,
            position: None,
        }
    }

    /// A detection carrying only a presence flag, with no known position.
    pub fn from_flag(presence: PresenceFlag) -> Self {
        Self { presence, position: None }
    }
}

/// Produces one detection per frame. `Ok(None)` means the stream is over.
pub trait DetectionSource {
    fn next_detection(&mut self) -> Result<Option<Detection>, SourceError>;

    /// Human-readable name used in logs and stream summaries.
    fn label(&self) -> String {
        String::from("stream")
    }
}

impl<S: DetectionSource + ?Sized> DetectionSource for Box<S> {
    fn next_detection(&mut self) -> Result<Option<Detection>, SourceError> {
        (**self).next_detection()
    }

    fn label(&self) -> String {
        (**self).label()
    }
}

/// Receives match events from the stepping loop.
pub trait EventSink {
    fn on_match(&mut self, event: &MatchEvent);
}

impl EventSink for Vec<MatchEvent> {
    fn on_match(&mut self, event: &MatchEvent) {
        self.push(event.clone());
    }
}

/// Reports each match as a `tracing` event.
#[derive(Debug, Clone, Default)]
pub struct LogSink {
    pub stream: String,
}

impl LogSink {
    pub fn new(stream: impl Into<String>) -> Self {
        Self { stream: stream.into() }
    }
}

impl EventSink for LogSink {
    fn on_match(&mut self, event: &MatchEvent) {
        info!(stream = %self.stream, step = event.step, "{}", event.name);
    }
}

/// Replays a fixed list of detections, then ends.
#[derive(Debug, Clone, Default)]
pub struct ReplaySource {
    label: String,
    detections: VecDeque<Detection>,
}

impl ReplaySource {
    pub fn new(label: impl Into<String>, detections: impl IntoIterator<Item = Detection>) -> Self {
        Self {
            label: label.into(),
            detections: detections.into_iter().collect(),
        }
    }

    /// Builds a replay from a flag string such as `"PAAPAA"`.
    pub fn from_presence_str(label: impl Into<String>, flags: &str) -> Result<Self, ConfigError> {
        let detections = parse_flags(flags)?.into_iter().map(Detection::from_flag);
        Ok(Self::new(label, detections))
    }

    pub fn remaining(&self) -> usize {
        self.detections.len()
    }
}

impl DetectionSource for ReplaySource {
    fn next_detection(&mut self) -> Result<Option<Detection>, SourceError> {
        Ok(self.detections.pop_front())
    }

    fn label(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_and_position_are_independent() {
        let found = Detection::found(Point::new(3, 4));
        assert_eq!(found.presence, PresenceFlag::Present);
        assert_eq!(found.position, Some(Point::new(3, 4)));

        let flagged = Detection::from_flag(PresenceFlag::Present);
        assert!(flagged.presence.is_present());
        assert!(flagged.position.is_none());

        assert_eq!(Detection::missing().presence, PresenceFlag::Absent);
    }

    #[test]
    fn replay_yields_in_order_then_ends() {
        let mut source = ReplaySource::from_presence_str("demo", "PA").unwrap();
        assert_eq!(source.label(), "demo");
        assert_eq!(source.next_detection().unwrap().unwrap().presence, PresenceFlag::Present);
        assert_eq!(source.next_detection().unwrap().unwrap().presence, PresenceFlag::Absent);
        assert!(source.next_detection().unwrap().is_none());
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn collecting_sink_keeps_events() {
        let mut sink: Vec<MatchEvent> = Vec::new();
        sink.on_match(&MatchEvent { name: "ALELUYA".into(), step: 9 });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].step, 9);
    }
}
