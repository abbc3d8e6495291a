//! Top-level application state and the frame loop.
//!
//! `AppState` owns the layout, the `DwellTracker`, the `Composer`, the
//! keystroke sink, and the per-frame `HighlightState`; `run` wires it
//! to a tracking source and the visualizer.  All dwell logic runs on
//! this one thread, one tick per rendered frame, so ticks never overlap
//! and the dwell slots need no locking.

use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use dwell_core::{Composer, DwellThresholds, DwellTracker, Hand, HighlightState};
use key_inject::{dispatch, EnigoOut, KeyOut, NullOut};
use key_layout::{KeyId, Layout};

use crate::feedback::ClickTone;
use crate::overlay::OverlayHost;
use crate::tracking::{spawn_tracking_source, FrameUpdate, SimTrackingSource, TrackedHand};
use crate::visualizer::Visualizer;

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where fingertip detections come from.
pub enum SourceMode {
    /// The window's mouse cursor plays the fingertip.
    Sim,
    /// MediaPipe helper subprocess owning the webcam.
    #[cfg(feature = "camera")]
    Camera { helper: std::path::PathBuf, index: u32 },
}

/// Configuration for the full application.
pub struct AppConfig {
    pub layout:     Layout,
    pub thresholds: DwellThresholds,
    pub source:     SourceMode,
    /// Mirror commits into the OS input stream (off = buffer only).
    pub inject:     bool,
    pub mute:       bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            layout:     Layout::default(),
            thresholds: DwellThresholds::default(),
            source:     SourceMode::Sim,
            inject:     true,
            mute:       false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    layout:     Layout,
    tracker:    DwellTracker,
    composer:   Composer,
    out:        Box<dyn KeyOut>,
    click:      Option<ClickTone>,
    highlights: HighlightState,
    pub status: String,
}

impl AppState {
    pub fn new(
        layout: Layout,
        thresholds: DwellThresholds,
        out: Box<dyn KeyOut>,
        click: Option<ClickTone>,
    ) -> Self {
        AppState {
            layout,
            tracker: DwellTracker::new(thresholds),
            composer: Composer::new(),
            out,
            click,
            highlights: HighlightState::default(),
            status: "Ready - hold a fingertip over a key".to_string(),
        }
    }

    // ── Per-frame tick ────────────────────────────────────────────────────

    /// Process one tracking frame.  Every hand samples exactly once:
    /// absent hands sample "no key", so their holds are discarded.
    /// `now` is passed in so tests control time.
    pub fn handle_frame(&mut self, hands: &[TrackedHand], now: Instant) {
        self.highlights.clear();
        for hand in Hand::ALL {
            let key = hands
                .iter()
                .find(|t| t.hand == hand)
                .and_then(|t| self.layout.resolve(t.x, t.y));
            let outcome = self.tracker.on_sample(hand, key, now);
            self.highlights.note(outcome);
            if let Some(k) = outcome.committed() {
                self.commit(hand, k);
            }
        }
    }

    fn commit(&mut self, hand: Hand, key: KeyId) {
        let action = self.composer.apply(key);
        tracing::debug!(hand = hand.label(), key = %key.label(), ?action, "commit");

        if let Err(e) = dispatch(self.out.as_mut(), action) {
            // The buffer already changed; an injection hiccup should
            // not kill the session.
            tracing::warn!("keystroke injection failed: {e}");
        }
        if let Some(click) = &self.click {
            click.play();
        }

        self.status = format!("{} hand: {}", hand.label(), key.label());
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn layout(&self)      -> &Layout         { &self.layout }
    pub fn highlights(&self)  -> &HighlightState { &self.highlights }
    pub fn text(&self)        -> &str            { self.composer.text() }
    pub fn shift_armed(&self) -> bool            { self.composer.shift_armed() }
}

// ════════════════════════════════════════════════════════════════════════════
// run() — the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Click-through strips the window of its own mouse messages, which is
/// exactly what an external tracker wants and exactly what simulation
/// mode cannot survive: the cursor *is* the fingertip there.
fn wants_clickthrough(source: &SourceMode) -> bool {
    !matches!(source, SourceMode::Sim)
}

/// Apply the newest tracking update, if one arrived this tick, and
/// return the fingertips to draw.  A dropout mutates nothing and draws
/// no markers.
fn apply_latest(
    app: &mut AppState,
    latest: Option<Vec<TrackedHand>>,
    now: Instant,
) -> Vec<TrackedHand> {
    match latest {
        Some(h) => {
            app.handle_frame(&h, now);
            h
        }
        None => Vec::new(),
    }
}

/// Run the full application.
///
/// Creates the tracking source (simulation by default, camera with
/// `--features camera`), the visualizer window, and the overlay host,
/// then drives the tick/render loop at ~30 fps.  The next tick is only
/// taken after the current one's rendering completes.
pub fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let clickthrough = wants_clickthrough(&cfg.source);

    // ── Tracking source ───────────────────────────────────────────────────
    let (sim_tx, sim_rx) = mpsc::channel();
    let update_rx = match cfg.source {
        SourceMode::Sim => spawn_tracking_source(SimTrackingSource { rx: sim_rx }),
        #[cfg(feature = "camera")]
        SourceMode::Camera { ref helper, index } => {
            let source = crate::tracking::CameraTrackingSource::spawn(helper, index)?;
            spawn_tracking_source(source)
        }
    };

    // ── Visualizer (owns the window and the sim input sender) ────────────
    let mut vis = Visualizer::new(sim_tx)?;

    // ── Overlay capability, selected once ─────────────────────────────────
    let host = OverlayHost::detect();
    if clickthrough {
        match host.enable_clickthrough(vis.window_handle()) {
            Ok(()) => tracing::info!("overlay is click-through; only EXIT takes clicks"),
            // Capability downgrade: the window stays a normal clickable overlay.
            Err(e) => tracing::warn!("overlay stays clickable: {e}"),
        }
    } else {
        tracing::info!("simulation mode: overlay stays clickable for mouse input");
    }

    // ── Keystroke sink + feedback ─────────────────────────────────────────
    let out: Box<dyn KeyOut> = if cfg.inject {
        Box::new(EnigoOut::new()?)
    } else {
        Box::new(NullOut::default())
    };
    let click = if cfg.mute {
        None
    } else {
        match ClickTone::new() {
            Ok(c) => Some(c),
            Err(e) => {
                tracing::warn!("no audio device, clicks disabled: {e}");
                None
            }
        }
    };

    let mut app = AppState::new(cfg.layout, cfg.thresholds, out, click);

    // ── Main loop ─────────────────────────────────────────────────────────
    while vis.is_open() {
        if !vis.poll_input() {
            break;
        }

        // Drain tracking updates; only the newest frame matters.  No
        // update means the source produced no frame — the tick is a
        // no-op, no state mutates.
        let mut latest = None;
        loop {
            match update_rx.try_recv() {
                Ok(FrameUpdate::Hands(h))       => latest = Some(h),
                Ok(FrameUpdate::Quit)           => return Ok(()),
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Ok(()),
            }
        }

        let hands = apply_latest(&mut app, latest, Instant::now());

        if clickthrough {
            host.service_exit_carve(vis.window_handle(), vis.exit_screen_rect());
        }

        vis.render(
            app.layout(),
            app.highlights(),
            app.text(),
            app.shift_armed(),
            &hands,
            &app.status,
        );
    }

    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use dwell_core::HighlightPhase;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(33);

    fn make_app() -> AppState {
        AppState::new(
            Layout::default(),
            DwellThresholds::default(),
            Box::new(NullOut::default()),
            None,
        )
    }

    fn center_of(app: &AppState, key: KeyId) -> (f32, f32) {
        let rect = app
            .layout()
            .rects()
            .into_iter()
            .find(|r| r.key == key)
            .expect("key in layout");
        (rect.x + rect.w / 2.0, rect.y + rect.h / 2.0)
    }

    /// Hold one hand over a key's centre for `ticks` frames.
    fn hold(app: &mut AppState, hand: Hand, key: KeyId, start: Instant, ticks: u32) {
        let (x, y) = center_of(app, key);
        for i in 0..ticks {
            app.handle_frame(&[TrackedHand { hand, x, y }], start + TICK * i);
        }
    }

    #[test]
    fn dwelling_on_letters_types_into_the_buffer() {
        let mut app = make_app();
        let start = Instant::now();
        hold(&mut app, Hand::Right, KeyId::Char('H'), start, 20);
        hold(&mut app, Hand::Right, KeyId::Char('I'), start + TICK * 20, 20);
        assert_eq!(app.text(), "hi");
        assert_eq!(app.status, "right hand: I");
    }

    #[test]
    fn shift_dwell_capitalizes_exactly_one_letter() {
        let mut app = make_app();
        let start = Instant::now();
        hold(&mut app, Hand::Left, KeyId::Shift, start, 20);
        assert!(app.shift_armed());
        hold(&mut app, Hand::Left, KeyId::Char('A'), start + TICK * 20, 20);
        hold(&mut app, Hand::Left, KeyId::Char('B'), start + TICK * 40, 20);
        assert_eq!(app.text(), "Ab");
    }

    #[test]
    fn continuous_hold_types_exactly_once() {
        let mut app = make_app();
        // 60 ticks ≈ 2 s ≫ the 0.5 s threshold: still exactly one 'q'.
        hold(&mut app, Hand::Right, KeyId::Char('Q'), Instant::now(), 60);
        assert_eq!(app.text(), "q");
    }

    #[test]
    fn empty_frames_discard_partial_holds() {
        let mut app = make_app();
        let start = Instant::now();
        // 10 ticks ≈ 330 ms: under threshold, then the hand disappears.
        hold(&mut app, Hand::Right, KeyId::Char('Z'), start, 10);
        app.handle_frame(&[], start + TICK * 10);
        assert!(app.highlights().is_empty());
        // Coming back still needs a full hold.
        hold(&mut app, Hand::Right, KeyId::Char('Z'), start + TICK * 11, 10);
        assert_eq!(app.text(), "");
    }

    #[test]
    fn both_hands_commit_the_same_key_independently() {
        let mut app = make_app();
        let start = Instant::now();
        let (x, y) = center_of(&app, KeyId::Char('X'));
        let both = [
            TrackedHand { hand: Hand::Left, x, y },
            TrackedHand { hand: Hand::Right, x, y },
        ];
        for i in 0..20 {
            app.handle_frame(&both, start + TICK * i);
        }
        assert_eq!(app.text(), "xx");
    }

    #[test]
    fn grazing_clearall_never_wipes_the_buffer() {
        let mut app = make_app();
        let start = Instant::now();
        hold(&mut app, Hand::Right, KeyId::Char('A'), start, 20);
        assert_eq!(app.text(), "a");
        // 30 ticks ≈ 1 s: past the standard threshold, well short of 2 s.
        hold(&mut app, Hand::Right, KeyId::ClearAll, start + TICK * 20, 30);
        assert_eq!(app.text(), "a");
    }

    #[test]
    fn deliberate_clearall_hold_wipes_the_buffer() {
        let mut app = make_app();
        let start = Instant::now();
        hold(&mut app, Hand::Right, KeyId::Char('A'), start, 20);
        // 70 ticks ≈ 2.3 s: past the ClearAll threshold.
        hold(&mut app, Hand::Right, KeyId::ClearAll, start + TICK * 20, 70);
        assert_eq!(app.text(), "");
    }

    #[test]
    fn hover_and_commit_phases_show_in_the_highlight_snapshot() {
        let mut app = make_app();
        let start = Instant::now();
        let key = KeyId::Char('E');

        hold(&mut app, Hand::Left, key, start, 5);
        assert!(matches!(
            app.highlights().phase(key),
            Some(HighlightPhase::Hovering { .. })
        ));

        hold(&mut app, Hand::Left, key, start + TICK * 5, 15);
        assert_eq!(app.highlights().phase(key), Some(HighlightPhase::PastThreshold));
        assert_eq!(app.text(), "e");

        // Away from all keys: snapshot fully recomputed, nothing lingers.
        app.handle_frame(&[], start + TICK * 21);
        assert!(app.highlights().is_empty());
    }

    #[test]
    fn sim_mode_keeps_the_window_clickable() {
        assert!(!wants_clickthrough(&SourceMode::Sim));
        #[cfg(feature = "camera")]
        assert!(wants_clickthrough(&SourceMode::Camera {
            helper: "hand_helper.py".into(),
            index:  0,
        }));
    }

    #[test]
    fn tracking_dropout_draws_no_fingertip_markers() {
        let mut app = make_app();
        let start = Instant::now();
        let (x, y) = center_of(&app, KeyId::Char('K'));
        let sample = vec![TrackedHand { hand: Hand::Right, x, y }];
        for i in 0..10 {
            let drawn = apply_latest(&mut app, Some(sample.clone()), start + TICK * i);
            assert_eq!(drawn, sample);
        }
        // A tick without an update leaves the dwell state alone but
        // must not redraw last frame's fingertips.
        let drawn = apply_latest(&mut app, None, start + TICK * 10);
        assert!(drawn.is_empty());
        assert!(matches!(
            app.highlights().phase(KeyId::Char('K')),
            Some(HighlightPhase::Hovering { .. })
        ));
    }

    #[test]
    fn fingertip_between_keys_resolves_to_no_key() {
        let mut app = make_app();
        let start = Instant::now();
        // The origin corner is outside every key rect.
        for i in 0..30 {
            let sample = [TrackedHand { hand: Hand::Right, x: 0.0, y: 0.0 }];
            app.handle_frame(&sample, start + TICK * i);
        }
        assert_eq!(app.text(), "");
        assert!(app.highlights().is_empty());
    }
}
