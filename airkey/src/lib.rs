//! # airkey
//!
//! A virtual on-screen keyboard driven by fingertip tracking.  Each
//! frame, the position of every tracked fingertip is hit-tested against
//! a static keyboard grid; holding a fingertip over a key for its dwell
//! threshold commits exactly one keystroke, which is appended to an
//! on-screen text buffer and injected into the OS input stream.
//!
//! The overlay window sits above everything else and is click-through
//! on platforms that support it, except for the red **Exit** button.
//!
//! ## Dwell behaviour
//!
//! | Situation | Result |
//! |---|---|
//! | Fingertip enters a key | Hold timer starts (cyan highlight) |
//! | Fingertip switches keys | Timer restarts from zero |
//! | Hold exceeds the key's threshold | One commit (green flash), then latched |
//! | Fingertip leaves all keys | Partial hold discarded |
//! | `ClearAll` | Needs a 2 s hold; everything else 0.5 s |
//!
//! ## Feature flags
//!
//! * (default) — **Simulation mode**: the window's mouse cursor is the
//!   fingertip.  No camera needed.
//! * `camera` — **Tracking mode**: a MediaPipe helper subprocess owns
//!   the webcam and streams per-frame fingertip detections.
//!
//! ### Simulation shortcuts
//!
//! | Key | Effect |
//! |---|---|
//! | mouse move | Fingertip position of the active hand |
//! | `Tab` | Swap which hand the cursor stands in for |
//! | click on Exit | Quit |

pub mod app;
pub mod feedback;
pub mod overlay;
pub mod tracking;
pub mod visualizer;
