// THEORY:
// `PositionHistory` remembers where the blob was over the last few frames so a
// viewer can draw a fading trail behind it. It plays no part in recognition.
//
// Frames without a detection are stored as `None` so the trail breaks where the
// blob vanished instead of bridging the gap with a straight line.

use crate::core_modules::detection::Point;
use crate::error::ConfigError;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// A line between two consecutive recorded positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailSegment {
    pub newer: Point,
    pub older: Point,
    /// Stroke width in pixels; largest at the head of the trail.
    pub thickness: i32,
}

/// Bounded record of recent positions, newest first.
#[derive(Debug, Clone)]
pub struct PositionHistory {
    points: VecDeque<Option<Point>>,
    capacity: usize,
}

impl Default for PositionHistory {
    fn default() -> Self {
        Self {
            points: VecDeque::with_capacity(DEFAULT_HISTORY_CAPACITY),
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl PositionHistory {
    pub fn with_capacity(capacity: usize) -> Result<Self, ConfigError> {
        if capacity == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        Ok(Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn record(&mut self, position: Option<Point>) {
        self.points.push_front(position);
        self.points.truncate(self.capacity);
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = Option<Point>> + '_ {
        self.points.iter().copied()
    }

    pub fn latest(&self) -> Option<Point> {
        self.points.front().copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Segments between adjacent recorded positions, skipping any pair that
    /// touches a frame without a detection.
    pub fn segments(&self) -> impl Iterator<Item = TrailSegment> + '_ {
        let capacity = self.capacity as f64;
        (1..self.points.len()).filter_map(move |i| {
            let newer = self.points[i - 1]?;
            let older = self.points[i]?;
            let thickness = ((capacity / (i as f64 + 1.0)).sqrt() * 2.5) as i32;
            Some(TrailSegment { newer, older, thickness })
        })
    }
}
