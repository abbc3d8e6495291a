//! airkey — overlay entry point.

use std::time::Duration;

use clap::Parser;

use airkey::app::{run, AppConfig, SourceMode};
use dwell_core::DwellThresholds;
use key_layout::{KeyId, Layout};

/// Hand-tracked dwell keyboard overlay.
#[derive(Parser, Debug)]
#[command(name = "airkey", version, about)]
struct Cli {
    /// Use the webcam tracking helper instead of mouse simulation
    /// (requires building with `--features camera`).
    #[arg(long)]
    camera: bool,

    /// Path to the MediaPipe tracking helper script.
    #[arg(long, default_value = "hand_helper.py")]
    helper: std::path::PathBuf,

    /// Camera device index for the tracking helper.
    #[arg(long, default_value_t = 0)]
    camera_index: u32,

    /// Standard dwell threshold in milliseconds.
    #[arg(long, default_value_t = 500)]
    threshold_ms: u64,

    /// Dwell threshold for ClearAll in milliseconds.
    #[arg(long, default_value_t = 2000)]
    clearall_ms: u64,

    /// Type only into the overlay's text bar, never into the OS.
    #[arg(long)]
    no_inject: bool,

    /// Disable the audible click on commit.
    #[arg(long)]
    mute: bool,

    /// Print the key grid geometry and exit.
    #[arg(long)]
    list_keys: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let layout = Layout::default();

    if cli.list_keys {
        for rect in layout.rects() {
            println!(
                "{:<9}  x={:>6.1}  y={:>6.1}  w={:>6.1}  h={:>6.1}",
                rect.key.label(),
                rect.x,
                rect.y,
                rect.w,
                rect.h
            );
        }
        return Ok(());
    }

    println!();
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║          AirKey — Dwell Keyboard Overlay             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();
    #[cfg(feature = "camera")]
    println!("  Mode: {}", if cli.camera { "camera tracking" } else { "mouse simulation" });
    #[cfg(not(feature = "camera"))]
    println!("  Mode: mouse simulation  (build with --features camera for hardware)");
    println!("  Hold a fingertip over a key to type; EXIT button quits.");
    println!();

    let source = pick_source(&cli)?;

    let thresholds = DwellThresholds::new(Duration::from_millis(cli.threshold_ms))
        .with_override(KeyId::ClearAll, Duration::from_millis(cli.clearall_ms));

    let cfg = AppConfig {
        layout,
        thresholds,
        source,
        inject: !cli.no_inject,
        mute: cli.mute,
    };

    if let Err(e) = run(cfg) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "camera")]
fn pick_source(cli: &Cli) -> anyhow::Result<SourceMode> {
    if cli.camera {
        Ok(SourceMode::Camera {
            helper: cli.helper.clone(),
            index: cli.camera_index,
        })
    } else {
        Ok(SourceMode::Sim)
    }
}

#[cfg(not(feature = "camera"))]
fn pick_source(cli: &Cli) -> anyhow::Result<SourceMode> {
    if cli.camera {
        anyhow::bail!("camera tracking requires building with --features camera");
    }
    Ok(SourceMode::Sim)
}
