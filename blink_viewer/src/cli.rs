use anyhow::{Context, Result};
use blink_vision::PipelineConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Track a bright blob in video and recognize blink patterns.
#[derive(Debug, Parser)]
#[command(name = "blink_viewer", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Watch a camera or a video file, drawing the blob's trail.
    Watch(WatchArgs),
    /// Run directories of still frames through the recognizer concurrently.
    Scan(ScanArgs),
}

/// Settings shared by every subcommand. Flags override the config file.
#[derive(Debug, Args)]
pub struct TuningArgs {
    /// TOML file with pipeline and detector settings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Presence window capacity (at least 6).
    #[arg(short, long)]
    pub window: Option<usize>,

    /// Trail length in frames.
    #[arg(short, long)]
    pub buffer: Option<usize>,

    /// Frames are resized to this width before detection.
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u32).range(1..))]
    pub width: u32,
}

impl TuningArgs {
    pub fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = match &self.config {
            Some(path) => PipelineConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        if let Some(window) = self.window {
            config.window_capacity = window;
        }
        if let Some(buffer) = self.buffer {
            config.history_capacity = buffer;
        }
        config.validate().context("invalid pipeline settings")?;
        Ok(config)
    }
}

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Video file to read. Without it, the default camera is used.
    #[arg(short = 'v', long)]
    pub video: Option<PathBuf>,

    /// Process frames without opening a window.
    #[arg(long)]
    pub headless: bool,

    #[command(flatten)]
    pub tuning: TuningArgs,
}

#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directories of frames, one stream per directory.
    #[arg(required = true)]
    pub dirs: Vec<PathBuf>,

    /// Maximum number of streams processed at once.
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    #[command(flatten)]
    pub tuning: TuningArgs,
}
