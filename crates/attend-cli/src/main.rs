use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use attend_core::locator::locate_face;
use attend_core::{EngineConfig, Frame, RotationStatus, SessionReport};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod config;
mod engine;
mod frames;

/// Frames between progress log lines during `analyze`.
const STATUS_EVERY: usize = 100;

#[derive(Parser)]
#[command(name = "attend", version, about = "Score focus across a sequence of camera frames")]
struct Cli {
    /// TOML file with engine settings
    #[arg(long = "config", global = true)]
    config_file: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct Overrides {
    /// Initial focus threshold
    #[arg(long, global = true)]
    threshold: Option<f32>,

    /// Smoothing window length
    #[arg(long, global = true)]
    window: Option<usize>,

    /// Frame rate used with --realtime
    #[arg(long, global = true)]
    fps: Option<f32>,

    /// Keep the focus threshold fixed for the whole session
    #[arg(long, global = true)]
    fixed_threshold: bool,
}

impl Overrides {
    fn apply(&self, config: &mut EngineConfig) {
        if let Some(threshold) = self.threshold {
            config.focus_threshold = threshold;
        }
        if let Some(window) = self.window {
            config.smoothing_window = window;
        }
        if let Some(fps) = self.fps {
            config.processing_fps = fps;
        }
        if self.fixed_threshold {
            config.adaptive.enabled = false;
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run a session over image files or directories of images
    Analyze {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Pace frames at the configured fps instead of as fast as possible
        #[arg(long)]
        realtime: bool,
        /// Print the session report as JSON
        #[arg(long)]
        json: bool,
        /// Reset detector state between path arguments (session counters continue)
        #[arg(long)]
        split: bool,
    },
    /// Run the face locator on a single image
    Probe { image: PathBuf },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut engine_config = config::load(cli.config_file.as_deref())?;
    cli.overrides.apply(&mut engine_config);
    engine_config
        .validate()
        .context("invalid engine configuration")?;

    match cli.command {
        Command::Analyze {
            paths,
            realtime,
            json,
            split,
        } => analyze(engine_config, &paths, realtime, json, split).await,
        Command::Probe { image } => probe(&engine_config, image),
        Command::Config => {
            let text = toml::to_string_pretty(&engine_config)
                .context("failed to serialize configuration")?;
            print!("{text}");
            Ok(())
        }
    }
}

async fn analyze(
    engine_config: EngineConfig,
    paths: &[PathBuf],
    realtime: bool,
    json: bool,
    split: bool,
) -> Result<()> {
    let clips = paths
        .iter()
        .map(|path| frames::collect(std::slice::from_ref(path)))
        .collect::<Result<Vec<_>>>()?;
    let period = Duration::from_secs_f32(1.0 / engine_config.processing_fps);
    let handle = engine::spawn_engine(engine_config)?;
    tracing::info!(
        frames = clips.iter().map(Vec::len).sum::<usize>(),
        realtime,
        "session starting"
    );

    let mut ticker = realtime.then(|| tokio::time::interval(period));
    let mut processed = 0usize;
    let mut skipped = 0usize;

    for (i, clip) in clips.into_iter().enumerate() {
        if split && i > 0 {
            handle.reset().await?;
        }

        for path in clip {
            if let Some(ticker) = ticker.as_mut() {
                ticker.tick().await;
            }

            let decode_path = path.clone();
            let image =
                match tokio::task::spawn_blocking(move || frames::load(&decode_path)).await? {
                    Ok(image) => image,
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "frame skipped");
                        skipped += 1;
                        continue;
                    }
                };

            match handle.process(image).await {
                Ok(outcome) => {
                    processed += 1;
                    tracing::debug!(
                        path = %path.display(),
                        class = outcome.class.as_str(),
                        score = outcome.smoothed.score,
                        "frame processed"
                    );
                }
                Err(engine::EngineError::Attend(e)) => {
                    tracing::warn!(path = %path.display(), error = %e, "frame skipped");
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            }

            if processed % STATUS_EVERY == 0 {
                let metrics = handle.metrics().await?;
                tracing::info!(
                    processed,
                    threshold = metrics.current_threshold,
                    quality = metrics.session_quality_score,
                    avg_ms = metrics.avg_processing_time_ms,
                    "session progress"
                );
            }
        }
    }

    let report = handle.report().await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print_report(&report, skipped);
    }
    Ok(())
}

fn print_report(report: &SessionReport, skipped: usize) {
    let pct = |p: Option<f32>| p.map_or_else(|| "-".to_string(), |p| format!("{p:.1}%"));

    println!("{}", report.assessment_label);
    println!("  duration:        {:.2} min", report.duration_minutes);
    println!("  frames:          {}", report.total_frames);
    if skipped > 0 {
        println!("  skipped:         {skipped}");
    }
    println!("  focused:         {}", pct(report.focus_percent));
    println!("  distracted:      {}", pct(report.distracted_percent));
    println!("  no face:         {}", pct(report.no_face_percent));
    println!(
        "  focus periods:   {} (longest {:.1}s)",
        report.focus_periods.count, report.focus_periods.longest_secs
    );
    println!(
        "  distractions:    {} (longest {:.1}s)",
        report.distraction_periods.count, report.distraction_periods.longest_secs
    );
    println!("  quality:         {:.1}%", report.session_quality_percent);
    println!(
        "  threshold:       {:.2}",
        report.metrics.current_threshold
    );
    println!(
        "  avg processing:  {:.1} ms",
        report.metrics.avg_processing_time_ms
    );
    if report.face_detection_issues {
        println!("  warning: face detection issues (check lighting and camera position)");
    }
}

fn probe(engine_config: &EngineConfig, path: PathBuf) -> Result<()> {
    let image = frames::load(&path)?;
    let frame = Frame::rgba(image.as_raw(), image.width(), image.height())
        .with_context(|| format!("unusable frame {}", path.display()))?;

    match locate_face(&frame, engine_config) {
        Some(candidate) => {
            let status = RotationStatus::describe(candidate.rotation, engine_config);
            println!("face candidate in {}", path.display());
            println!(
                "  center:     ({:.3}, {:.3})",
                candidate.center_x, candidate.center_y
            );
            println!("  confidence: {:.3}", candidate.confidence);
            println!(
                "  rotation:   yaw {:.1}°, pitch {:.1}°",
                candidate.rotation.yaw, candidate.rotation.pitch
            );
            println!("  status:     {status}");
        }
        None => println!("no candidate in {}", path.display()),
    }
    Ok(())
}
