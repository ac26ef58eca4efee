//! Command-line driver for the lock-screen backdrop pipeline.
//!
//! Runs the library against file-backed collaborators: an image file stands
//! in for the screen and rendered backgrounds are written as PNG.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{ArgAction, Parser, Subcommand};
use tracing::{Level, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use lockscreen_backdrop::config::Configuration;
use lockscreen_backdrop::events::{
    CaptureOutcome, DisplayRotation, PowerFlags, PowerRequest, RequestId, ScreenState, SurfaceSize,
    TriggerDecision,
};
use lockscreen_backdrop::platform::file_host::{FixedKeyguard, ImageFileScreen, PngFileSink};
use lockscreen_backdrop::storage::Storage;
use lockscreen_backdrop::{HostCollaborators, Pipeline};

const CAPTURE_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "lockscreen-backdrop", about = "Lock-screen background capture and compositing")]
struct Cli {
    /// Path to YAML config file (defaults apply when absent)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the storage directory and clear the capture slot
    Init,
    /// Simulate the screen turning off while unlocked
    Capture {
        /// Image file used as the current screen content
        #[arg(long, value_name = "IMAGE")]
        screen: PathBuf,
    },
    /// Run the lock-screen render hook and save the result
    Render {
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
        /// Display rotation in degrees (0, 90, 180 or 270)
        #[arg(long, default_value_t = 0)]
        rotation: u32,
        #[arg(long, value_name = "PNG")]
        out: PathBuf,
    },
    /// Install a static background image
    ImportImage {
        image: PathBuf,
        /// Centre-crop to this aspect ratio, e.g. 9x16
        #[arg(long, value_name = "WxH", value_parser = parse_aspect)]
        aspect: Option<(u32, u32)>,
    },
}

fn parse_aspect(raw: &str) -> Result<(u32, u32), String> {
    let (w, h) = raw
        .split_once(['x', 'X', ':'])
        .ok_or_else(|| format!("expected WxH, got {raw:?}"))?;
    let w: u32 = w.trim().parse().map_err(|_| format!("bad width in {raw:?}"))?;
    let h: u32 = h.trim().parse().map_err(|_| format!("bad height in {raw:?}"))?;
    if w == 0 || h == 0 {
        return Err("aspect components must be positive".into());
    }
    Ok((w, h))
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // RUST_LOG controls the baseline, -v raises this crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("lockscreen_backdrop={level}").parse()?);
    fmt().with_env_filter(filter).with_target(true).compact().init();
    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<Configuration> {
    let cfg = match path {
        Some(path) => Configuration::from_yaml_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Configuration::default(),
    };
    cfg.validated().context("validating configuration")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;
    let cfg = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Init => {
            let host = offline_host(PathBuf::new(), PathBuf::new(), DisplayRotation::Deg0);
            Pipeline::from_config(cfg, host).init()?;
        }
        Command::Capture { screen } => {
            let host = offline_host(screen, PathBuf::new(), DisplayRotation::Deg0);
            let pipeline = Pipeline::from_config(cfg, host);
            let outcomes = pipeline.capture_outcomes();
            let request = PowerRequest::new(ScreenState::Off, RequestId(1));
            match pipeline.on_display_request_evaluated(request, PowerFlags::default()) {
                TriggerDecision::NoOp => {
                    warn!("no capture started; is the background mode live-capture?");
                }
                TriggerDecision::StartCapture => {
                    let outcome = outcomes
                        .recv_timeout(CAPTURE_WAIT)
                        .context("capture worker did not report back")?;
                    if let CaptureOutcome::Failed(reason) = &outcome {
                        bail!("capture failed: {reason}");
                    }
                    info!(?outcome, "capture finished");
                }
            }
        }
        Command::Render { width, height, rotation, out } => {
            let rotation = DisplayRotation::from_degrees(rotation)
                .with_context(|| format!("unsupported rotation {rotation}"))?;
            let host = offline_host(PathBuf::new(), out.clone(), rotation);
            let pipeline = Pipeline::from_config(cfg, host);
            match pipeline.on_lock_screen_about_to_render(SurfaceSize::new(width, height)) {
                Some(img) => info!(
                    out = %out.display(),
                    width = img.width(),
                    height = img.height(),
                    "rendered"
                ),
                None => warn!(out = %out.display(), "no background written; host background stays"),
            }
        }
        Command::ImportImage { image, aspect } => {
            let storage = Storage::new(&cfg.storage_dir);
            let (w, h) = storage.import_static_image(&image, aspect)?;
            info!(width = w, height = h, "static background imported");
        }
    }
    Ok(())
}

fn offline_host(screen: PathBuf, out: PathBuf, rotation: DisplayRotation) -> HostCollaborators {
    HostCollaborators {
        screen: Arc::new(ImageFileScreen::new(screen)),
        keyguard: Arc::new(FixedKeyguard(Some(false))),
        sink: Arc::new(PngFileSink::new(out, rotation)),
    }
}
