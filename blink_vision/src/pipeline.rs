// THEORY:
// The `pipeline` module is the top-level API for a single stream. It wires the
// recognizer's parts into one stepping loop:
//
//     DetectionSource ──► PositionHistory (trail only)
//                     └─► PresenceWindow ──► PatternMatcher ──► EventSink
//
// One call to `step` is one frame. The pipeline owns every piece of mutable
// state, so two pipelines never interfere and a finished stream is simply
// dropped.

use crate::core_modules::blob_detector::blob_detector::DetectorConfig;
use crate::core_modules::detection::{Detection, DetectionSource, EventSink};
use crate::core_modules::pattern_matcher::{MatchEvent, PatternMatcher};
use crate::core_modules::position_history::{DEFAULT_HISTORY_CAPACITY, PositionHistory};
use crate::core_modules::presence::{DEFAULT_WINDOW_CAPACITY, PresenceWindow};
use crate::core_modules::signature::{Signature, SignatureRegistry};
use crate::error::{ConfigError, SourceError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

/// An extra named pattern supplied through configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignatureConfig {
    pub name: String,
    /// Six flags, oldest first, written as `P`/`A` or `1`/`0`.
    pub pattern: String,
}

/// Configuration for the TrackingPipeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Eviction threshold of the presence window. Must be at least 6.
    pub window_capacity: usize,
    /// Number of positions kept for the trail. Must be at least 1.
    pub history_capacity: usize,
    /// Patterns registered after the built-in ones.
    pub signatures: Vec<SignatureConfig>,
    pub detector: DetectorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            signatures: Vec::new(),
            detector: DetectorConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Loads a TOML file. Missing keys keep their defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.build_registry()?;
        PresenceWindow::with_capacity(self.window_capacity)?;
        PositionHistory::with_capacity(self.history_capacity)?;
        Ok(())
    }

    /// The built-in signatures followed by the configured ones.
    pub fn build_registry(&self) -> Result<SignatureRegistry, ConfigError> {
        let mut registry = SignatureRegistry::default();
        for signature in &self.signatures {
            registry.register(Signature::parse(signature.name.clone(), &signature.pattern)?)?;
        }
        Ok(registry)
    }
}

/// The result of processing a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: u64,
    pub detection: Detection,
    pub matches: Vec<MatchEvent>,
}

/// Totals for a stream that has run to completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub label: String,
    pub steps: u64,
    /// Match count per signature name.
    pub matches: BTreeMap<String, u64>,
}

impl RunSummary {
    pub fn total_matches(&self) -> u64 {
        self.matches.values().sum()
    }
}

/// The stepping loop for one stream.
pub struct TrackingPipeline {
    window: PresenceWindow,
    history: PositionHistory,
    matcher: PatternMatcher,
    steps: u64,
}

impl TrackingPipeline {
    pub fn new(config: &PipelineConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            window: PresenceWindow::with_capacity(config.window_capacity)?,
            history: PositionHistory::with_capacity(config.history_capacity)?,
            matcher: PatternMatcher::new(config.build_registry()?),
            steps: 0,
        })
    }

    /// Builds a pipeline around an explicit registry, e.g. one assembled in code.
    pub fn with_registry(config: &PipelineConfig, registry: SignatureRegistry) -> Result<Self, ConfigError> {
        Ok(Self {
            matcher: PatternMatcher::new(registry),
            ..Self::new(&PipelineConfig {
                signatures: Vec::new(),
                ..config.clone()
            })?
        })
    }

    /// Consumes one frame's detection and reports any signatures it completed.
    pub fn step(&mut self, detection: Detection) -> StepReport {
        self.steps += 1;
        self.history.record(detection.position);
        let matches = self.window.observe(detection.presence, &self.matcher, self.steps);
        debug!(step = self.steps, window = %self.window, "presence window");

        StepReport {
            step: self.steps,
            detection,
            matches,
        }
    }

    /// Pulls detections until the source is exhausted, forwarding every match to `sink`.
    /// A source error stops the loop and is returned as-is.
    pub fn run<S, K>(&mut self, source: &mut S, sink: &mut K) -> Result<RunSummary, SourceError>
    where
        S: DetectionSource + ?Sized,
        K: EventSink + ?Sized,
    {
        let mut summary = RunSummary {
            label: source.label(),
            ..RunSummary::default()
        };

        while let Some(detection) = source.next_detection()? {
            let report = self.step(detection);
            summary.steps += 1;
            for event in &report.matches {
                *summary.matches.entry(event.name.clone()).or_default() += 1;
                sink.on_match(event);
            }
        }

        info!(stream = %summary.label, steps = summary.steps, matches = summary.total_matches(), "stream ended");
        Ok(summary)
    }

    pub fn window(&self) -> &PresenceWindow {
        &self.window
    }

    pub fn history(&self) -> &PositionHistory {
        &self.history
    }

    pub fn registry(&self) -> &SignatureRegistry {
        self.matcher.registry()
    }

    /// Number of frames processed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }
}
