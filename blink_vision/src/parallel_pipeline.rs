// THEORY:
// The `StreamPool` runs many independent streams at once. Each stream gets its own
// `TrackingPipeline`, so no window is ever shared and the single-threaded stepping
// model of one stream is untouched. Parallelism exists only *between* streams.
//
// Sources block while they decode or capture, so every stream runs on tokio's
// blocking thread pool. A semaphore caps how many run simultaneously (one per core
// by default) and results come back in the order the sources were given.

use crate::core_modules::detection::{DetectionSource, LogSink};
use crate::error::ConfigError;
use crate::pipeline::{PipelineConfig, RunSummary, TrackingPipeline};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::warn;

pub type BoxedSource = Box<dyn DetectionSource + Send>;

/// How a single stream ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamOutcome {
    pub label: String,
    /// The run summary, or the error text that stopped the stream.
    pub result: Result<RunSummary, String>,
}

pub struct StreamPool {
    config: PipelineConfig,
    max_concurrent: usize,
}

impl StreamPool {
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            max_concurrent: num_cpus::get().max(1),
        })
    }

    /// Caps how many streams are processed at the same time.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Runs every source to completion. Match events are logged per stream.
    pub async fn run_all(&self, sources: Vec<BoxedSource>) -> Vec<StreamOutcome> {
        let permits = Arc::new(Semaphore::new(self.max_concurrent));

        let tasks = sources.into_iter().map(|mut source| {
            let permits = Arc::clone(&permits);
            let config = self.config.clone();
            let label = source.label();

            async move {
                let Ok(_permit) = permits.acquire_owned().await else {
                    return StreamOutcome {
                        label,
                        result: Err(String::from("stream pool closed")),
                    };
                };

                let task_label = label.clone();
                let joined = tokio::task::spawn_blocking(move || {
                    let mut pipeline = TrackingPipeline::new(&config).map_err(|e| e.to_string())?;
                    let mut sink = LogSink::new(task_label);
                    pipeline.run(&mut source, &mut sink).map_err(|e| e.to_string())
                })
                .await;

                let result = joined.unwrap_or_else(|e| Err(format!("stream task failed: {e}")));
                if let Err(reason) = &result {
                    warn!(stream = %label, %reason, "stream stopped early");
                }
                StreamOutcome { label, result }
            }
        });

        join_all(tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::detection::{Detection, ReplaySource};
    use crate::error::SourceError;

    struct FailingSource;

    impl DetectionSource for FailingSource {
        fn next_detection(&mut self) -> Result<Option<Detection>, SourceError> {
            Err(SourceError::Capture(String::from("camera unplugged")))
        }

        fn label(&self) -> String {
            String::from("broken")
        }
    }

    fn replay(label: &str, flags: &str) -> BoxedSource {
        Box::new(ReplaySource::from_presence_str(label, flags).unwrap())
    }

    #[tokio::test]
    async fn results_keep_input_order() {
        let pool = StreamPool::new(PipelineConfig::default()).unwrap().with_max_concurrent(2);
        let outcomes = pool
            .run_all(vec![
                replay("first", "PAAPAA"),
                replay("second", "PPAPPA"),
                replay("third", "AAAAAAAA"),
            ])
            .await;

        let labels: Vec<_> = outcomes.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);

        let first = outcomes[0].result.as_ref().unwrap();
        assert_eq!(first.matches.get("ALELUYA"), Some(&1));
        let second = outcomes[1].result.as_ref().unwrap();
        assert_eq!(second.matches.get("GERONIMO"), Some(&1));
        let third = outcomes[2].result.as_ref().unwrap();
        assert_eq!(third.steps, 8);
        assert_eq!(third.total_matches(), 0);
    }

    #[tokio::test]
    async fn one_failing_stream_does_not_stop_the_others() {
        let pool = StreamPool::new(PipelineConfig::default()).unwrap();
        let outcomes = pool
            .run_all(vec![Box::new(FailingSource) as BoxedSource, replay("ok", "PAAPAA")])
            .await;

        assert_eq!(outcomes[0].label, "broken");
        assert!(outcomes[0].result.as_ref().unwrap_err().contains("camera unplugged"));
        assert_eq!(outcomes[1].result.as_ref().unwrap().total_matches(), 1);
    }

    #[test]
    fn concurrency_is_at_least_one() {
        let pool = StreamPool::new(PipelineConfig::default()).unwrap().with_max_concurrent(0);
        assert_eq!(pool.max_concurrent(), 1);
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PipelineConfig {
            history_capacity: 0,
            ..PipelineConfig::default()
        };
        assert!(StreamPool::new(config).is_err());
    }
}
