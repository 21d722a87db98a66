// Command-line front end for `blink_vision`.
//
// `watch` mirrors a classic ball-tracking loop: grab a frame, find the blob,
// feed the recognizer, draw the trail, repeat until `q` or end of video.
// `scan` runs recorded frame directories through the `StreamPool`.

mod camera;
mod cli;

use anyhow::{Context, Result, bail};
use blink_vision::{
    BoxedSource, ColorBlobDetector, DetectionSource, EventSink, FrameSequenceSource, MatchEvent, StreamPool,
    TrackingPipeline,
};
use camera::{CameraSource, draw_trail};
use clap::Parser;
use cli::{Cli, Command, ScanArgs, WatchArgs};
use opencv::highgui;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const WINDOW_NAME: &str = "Frame";

/// Prints each recognized pattern on its own line.
struct ConsoleSink;

impl EventSink for ConsoleSink {
    fn on_match(&mut self, event: &MatchEvent) {
        println!("{}", event.name);
        info!(step = event.step, pattern = %event.name, "pattern recognized");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Watch(args) => watch(args),
        Command::Scan(args) => scan(args),
    }
}

fn watch(args: WatchArgs) -> Result<()> {
    let config = args.tuning.pipeline_config()?;
    let detector = ColorBlobDetector::new(config.detector.clone());
    let mut source = CameraSource::open(args.video.as_deref(), detector, args.tuning.width)
        .context("opening video source")?;
    let mut pipeline = TrackingPipeline::new(&config)?;
    let mut sink = ConsoleSink;
    info!(source = %source.label(), window = config.window_capacity, "watching");

    while let Some(detection) = source.next_detection()? {
        let report = pipeline.step(detection);
        for event in &report.matches {
            sink.on_match(event);
        }

        if args.headless {
            continue;
        }
        draw_trail(source.frame_mut(), pipeline.history())?;
        highgui::imshow(WINDOW_NAME, source.frame())?;
        if (highgui::wait_key(1)? & 0xFF) == 'q' as i32 {
            info!(steps = pipeline.steps(), "quit requested");
            break;
        }
    }

    if !args.headless {
        highgui::destroy_all_windows()?;
    }
    Ok(())
}

fn scan(args: ScanArgs) -> Result<()> {
    let config = args.tuning.pipeline_config()?;

    let mut sources: Vec<BoxedSource> = Vec::with_capacity(args.dirs.len());
    for dir in &args.dirs {
        let detector = ColorBlobDetector::new(config.detector.clone());
        let source = FrameSequenceSource::open(dir, detector)
            .with_context(|| format!("opening {}", dir.display()))?
            .with_target_width(args.tuning.width);
        sources.push(Box::new(source));
    }

    let mut pool = StreamPool::new(config)?;
    if let Some(jobs) = args.jobs {
        pool = pool.with_max_concurrent(jobs);
    }

    let runtime = tokio::runtime::Runtime::new().context("starting runtime")?;
    let outcomes = runtime.block_on(pool.run_all(sources));

    let mut failed = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(summary) => {
                let counts: Vec<String> = summary.matches.iter().map(|(name, n)| format!("{name} x{n}")).collect();
                let patterns = if counts.is_empty() { String::from("no patterns") } else { counts.join(", ") };
                println!("{}: {} frames, {}", outcome.label, summary.steps, patterns);
            }
            Err(reason) => {
                warn!(stream = %outcome.label, %reason, "scan failed");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} streams failed", outcomes.len());
    }
    Ok(())
}
