//! Fingertip tracking — either a MediaPipe helper subprocess or mouse
//! simulation.
//!
//! The public interface is [`FrameUpdate`] delivered over a `mpsc`
//! channel.  Consumers don't need to know whether detections came from
//! a real camera or the simulator.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use dwell_core::Hand;
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// FrameUpdate
// ════════════════════════════════════════════════════════════════════════════

/// One tracked fingertip, in display-space pixels (already mirrored to
/// match the user-facing view).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrackedHand {
    pub hand: Hand,
    pub x:    f32,
    pub y:    f32,
}

/// Message from a tracking source to the app loop.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameUpdate {
    /// Detections for one camera frame.  Zero hands is a valid frame —
    /// every absent hand samples "no key" that tick.  A frame the
    /// source failed to read produces *no* update at all, so the tick
    /// is a no-op.
    Hands(Vec<TrackedHand>),
    /// The source is gone (helper exited, sim window closed).
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// TrackingError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum TrackingError {
    #[error("tracking helper not found at {0}")]
    HelperMissing(String),
    #[error("failed to start tracking helper: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
}

// ════════════════════════════════════════════════════════════════════════════
// TrackingSource trait — unified interface for camera and sim
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`FrameUpdate`]s over a channel.
pub trait TrackingSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<FrameUpdate>);
}

/// Spawn a tracking source on its own thread and return the receiving end.
pub fn spawn_tracking_source<T: TrackingSource>(source: T) -> Receiver<FrameUpdate> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimTrackingSource — mouse as fingertip (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw input event from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Cursor position this frame.
    Pointer { x: f32, y: f32 },
    /// Swap which hand the cursor stands in for.
    SwapHand,
    /// Cursor left the window; report an empty frame.
    NoPointer,
    Quit,
}

/// Tracking source driven by [`SimInput`] events from the visualizer's
/// window.  The cursor plays the fingertip of one hand at a time;
/// `Tab` swaps hands.  Decouples the window event loop from the dwell
/// logic, and exercises the exact same app path as the camera source.
pub struct SimTrackingSource {
    pub rx: Receiver<SimInput>,
}

impl TrackingSource for SimTrackingSource {
    fn run(self: Box<Self>, tx: Sender<FrameUpdate>) {
        let mut active = Hand::Right;
        for input in self.rx {
            let update = match input {
                SimInput::Pointer { x, y } => {
                    FrameUpdate::Hands(vec![TrackedHand { hand: active, x, y }])
                }
                SimInput::NoPointer => FrameUpdate::Hands(Vec::new()),
                SimInput::SwapHand => {
                    active = match active {
                        Hand::Left  => Hand::Right,
                        Hand::Right => Hand::Left,
                    };
                    tracing::debug!(hand = active.label(), "sim fingertip now plays");
                    continue;
                }
                SimInput::Quit => {
                    let _ = tx.send(FrameUpdate::Quit);
                    return;
                }
            };
            if tx.send(update).is_err() {
                return;
            }
        }
        let _ = tx.send(FrameUpdate::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CameraTrackingSource — MediaPipe helper subprocess (feature = "camera")
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "camera")]
pub use camera::CameraTrackingSource;

#[cfg(feature = "camera")]
mod camera {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::path::Path;
    use std::process::{Child, ChildStdout, Command, Stdio};

    use serde::Deserialize;

    /// One detection line from the helper:
    /// `{"hands":[{"label":"left","x":412.0,"y":233.5}, ...]}`.
    /// The helper owns the camera, runs MediaPipe hand landmarking, and
    /// reports the index-fingertip of each detected hand in mirrored
    /// frame-pixel coordinates.
    #[derive(Debug, Deserialize)]
    struct HelperFrame {
        hands: Vec<HelperHand>,
    }

    #[derive(Debug, Deserialize)]
    struct HelperHand {
        label: String,
        x:     f32,
        y:     f32,
    }

    /// Tracking source backed by the Python MediaPipe helper.
    ///
    /// The helper prints `READY` once the camera is open, then one JSON
    /// line per frame.  A camera that cannot be opened is fatal at
    /// startup; a single unreadable frame line is skipped silently so
    /// the corresponding tick is a no-op.
    pub struct CameraTrackingSource {
        child:  Child,
        reader: BufReader<ChildStdout>,
    }

    impl CameraTrackingSource {
        pub fn spawn(helper: &Path, camera_index: u32) -> Result<Self, TrackingError> {
            if !helper.exists() {
                return Err(TrackingError::HelperMissing(helper.display().to_string()));
            }

            tracing::info!(helper = %helper.display(), camera_index, "starting tracking helper");

            let mut child = Command::new("python3")
                .arg(helper)
                .arg("--camera")
                .arg(camera_index.to_string())
                .stdout(Stdio::piped())
                .stderr(Stdio::inherit())
                .spawn()?;

            let stdout = child.stdout.take().ok_or_else(|| {
                TrackingError::CameraUnavailable("helper produced no stdout".to_string())
            })?;
            let mut reader = BufReader::new(stdout);

            // The helper replies READY once the camera is open, or an
            // error line and exits.  No camera at startup is fatal.
            let mut ready = String::new();
            reader.read_line(&mut ready)?;
            if ready.trim() != "READY" {
                let _ = child.kill();
                return Err(TrackingError::CameraUnavailable(ready.trim().to_string()));
            }

            tracing::info!("tracking helper ready");
            Ok(CameraTrackingSource { child, reader })
        }
    }

    impl TrackingSource for CameraTrackingSource {
        fn run(mut self: Box<Self>, tx: Sender<FrameUpdate>) {
            let mut line = String::new();
            loop {
                line.clear();
                match self.reader.read_line(&mut line) {
                    Ok(0) => break, // helper exited
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("tracking helper read failed: {e}");
                        break;
                    }
                }

                let frame: HelperFrame = match serde_json::from_str(&line) {
                    Ok(f) => f,
                    Err(e) => {
                        // Transient bad frame: skip, the tick is a no-op.
                        tracing::debug!("unparseable helper frame: {e}");
                        continue;
                    }
                };

                let hands = frame
                    .hands
                    .iter()
                    .filter_map(|h| {
                        Hand::from_label(&h.label)
                            .map(|hand| TrackedHand { hand, x: h.x, y: h.y })
                    })
                    .collect();

                if tx.send(FrameUpdate::Hands(hands)).is_err() {
                    return;
                }
            }
            let _ = tx.send(FrameUpdate::Quit);
        }
    }

    impl Drop for CameraTrackingSource {
        fn drop(&mut self) {
            let _ = self.child.kill();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
