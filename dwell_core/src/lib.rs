//! # dwell_core
//!
//! The dwell-gesture key-selection engine.
//!
//! A *dwell* triggers a key not by clicking but by holding a fingertip
//! over it for a minimum duration.  This crate owns everything with
//! timing discipline in AirKey:
//!
//! * [`DwellTracker`] — one independent state slot per tracked hand,
//!   consuming `(hand, key-or-none, now)` samples and emitting a commit
//!   exactly once at the instant a hold crosses its threshold.
//! * [`DwellThresholds`] — per-key hold durations.  `ClearAll` carries a
//!   deliberately long threshold so a fingertip grazing it on the way to
//!   another key cannot wipe the buffer; ordinary keys stay responsive.
//! * [`Composer`] — classifies a committed key into its effect
//!   (literal insert, space, delete-last, clear-all, one-shot shift) and
//!   applies it to the on-screen text buffer.
//! * [`HighlightState`] — the per-frame render snapshot, recomputed each
//!   tick from the tracker; it carries no commit authority.
//!
//! All state lives in explicit objects handed to the tick loop; there
//! are no module-level globals.  The tracker is pure state transition
//! over already-available inputs and never blocks.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use key_layout::KeyId;

// ════════════════════════════════════════════════════════════════════════════
// Hand — one independently tracked input source
// ════════════════════════════════════════════════════════════════════════════

/// One tracked pointing source.  Each hand owns its own dwell slot;
/// the two never share threshold state and may hold the same key
/// concurrently without arbitration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub const ALL: [Hand; 2] = [Hand::Left, Hand::Right];

    pub fn index(self) -> usize {
        match self {
            Hand::Left  => 0,
            Hand::Right => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Hand::Left  => "left",
            Hand::Right => "right",
        }
    }

    /// Parse a tracker handedness label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Hand> {
        match label.to_ascii_lowercase().as_str() {
            "left"  => Some(Hand::Left),
            "right" => Some(Hand::Right),
            _       => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DwellThresholds — per-key hold durations
// ════════════════════════════════════════════════════════════════════════════

/// Per-key dwell durations: a standard threshold for ordinary keys plus
/// explicit overrides for keys that need more deliberation.
#[derive(Clone, Debug)]
pub struct DwellThresholds {
    default:   Duration,
    overrides: Vec<(KeyId, Duration)>,
}

impl Default for DwellThresholds {
    /// 0.5 s standard, 2.0 s for `ClearAll`.
    fn default() -> Self {
        DwellThresholds {
            default:   Duration::from_millis(500),
            overrides: vec![(KeyId::ClearAll, Duration::from_millis(2000))],
        }
    }
}

impl DwellThresholds {
    pub fn new(default: Duration) -> Self {
        DwellThresholds { default, overrides: Vec::new() }
    }

    /// Add or replace the threshold for one key.
    pub fn with_override(mut self, key: KeyId, threshold: Duration) -> Self {
        self.overrides.retain(|(k, _)| *k != key);
        self.overrides.push((key, threshold));
        self
    }

    pub fn threshold(&self, key: KeyId) -> Duration {
        self.overrides
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, d)| *d)
            .unwrap_or(self.default)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SampleOutcome
// ════════════════════════════════════════════════════════════════════════════

/// Result of feeding one sample for one hand into the tracker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SampleOutcome {
    /// No key under the fingertip (or hand not hovering anything).
    Idle,
    /// Holding `key` since `since`; threshold not yet crossed.
    Hovering { key: KeyId, since: Instant },
    /// The hold just crossed its threshold.  Emitted exactly once per
    /// dwell; the fingertip must leave the key (or switch keys) before
    /// the same key can commit again.
    Committed { key: KeyId },
    /// Still resting on a key that already committed this dwell.  No
    /// further keystroke until the hold ends.
    Latched { key: KeyId },
}

impl SampleOutcome {
    /// The committed key, if this sample produced one.
    pub fn committed(self) -> Option<KeyId> {
        match self {
            SampleOutcome::Committed { key } => Some(key),
            _                                => None,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DwellTracker
// ════════════════════════════════════════════════════════════════════════════

/// One hand's dwell slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    Idle,
    /// Holding a key, threshold not yet crossed.
    Hovering(KeyId, Instant),
    /// Key already committed this dwell; suppress repeats until the
    /// fingertip leaves it.
    Latched(KeyId),
}

/// Per-hand dwell state machine.
///
/// Transitions per sample:
///
/// * idle → hovering when a key appears (or a *different* key — the
///   timer restarts from zero, no partial credit for the old key);
/// * hovering → hovering while the hold is under threshold;
/// * hovering → committed → latched at the instant the hold exceeds the
///   key's threshold (edge-triggered: one keystroke per dwell, never a
///   flood while the finger stays put);
/// * latched → hovering only via a different key, so a fresh hold must
///   begin before the same key can fire again;
/// * any → idle when the fingertip leaves all keys; a partial hold is
///   discarded without commit.
#[derive(Clone, Debug)]
pub struct DwellTracker {
    thresholds: DwellThresholds,
    slots:      [Slot; 2],
}

impl DwellTracker {
    pub fn new(thresholds: DwellThresholds) -> Self {
        DwellTracker { thresholds, slots: [Slot::Idle, Slot::Idle] }
    }

    pub fn thresholds(&self) -> &DwellThresholds {
        &self.thresholds
    }

    /// Current pre-commit hover of one hand, if any.
    pub fn hover(&self, hand: Hand) -> Option<(KeyId, Instant)> {
        match self.slots[hand.index()] {
            Slot::Hovering(key, since) => Some((key, since)),
            _                          => None,
        }
    }

    /// Feed one sample for one hand.  `now` is passed in rather than
    /// read from the clock so ticks stay deterministic and testable.
    pub fn on_sample(&mut self, hand: Hand, key: Option<KeyId>, now: Instant) -> SampleOutcome {
        let slot = &mut self.slots[hand.index()];
        match (key, *slot) {
            (None, _) => {
                *slot = Slot::Idle;
                SampleOutcome::Idle
            }
            (Some(k), Slot::Hovering(held, since)) if held == k => {
                if now.duration_since(since) > self.thresholds.threshold(k) {
                    *slot = Slot::Latched(k);
                    SampleOutcome::Committed { key: k }
                } else {
                    SampleOutcome::Hovering { key: k, since }
                }
            }
            (Some(k), Slot::Latched(held)) if held == k => SampleOutcome::Latched { key: k },
            (Some(k), _) => {
                // New key, or switch from a different key: restart the timer.
                *slot = Slot::Hovering(k, now);
                SampleOutcome::Hovering { key: k, since: now }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HighlightState — per-frame render snapshot
// ════════════════════════════════════════════════════════════════════════════

/// Visual phase of a highlighted key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighlightPhase {
    /// Held, threshold not yet reached.
    Hovering { since: Instant },
    /// Threshold crossed this frame (the commit flash).
    PastThreshold,
}

/// Render-only `key → phase` map, fully rebuilt every frame from the
/// tracker's sample outcomes.  The tracker alone decides commits.
#[derive(Clone, Debug, Default)]
pub struct HighlightState {
    entries: HashMap<KeyId, HighlightPhase>,
}

impl HighlightState {
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record one hand's sample outcome.  A commit flash wins over an
    /// in-progress hover from the other hand on the same key.
    pub fn note(&mut self, outcome: SampleOutcome) {
        match outcome {
            SampleOutcome::Idle => {}
            SampleOutcome::Hovering { key, since } => {
                self.entries
                    .entry(key)
                    .or_insert(HighlightPhase::Hovering { since });
            }
            SampleOutcome::Committed { key } | SampleOutcome::Latched { key } => {
                self.entries.insert(key, HighlightPhase::PastThreshold);
            }
        }
    }

    pub fn phase(&self, key: KeyId) -> Option<HighlightPhase> {
        self.entries.get(&key).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// KeyAction — what a committed key means
// ════════════════════════════════════════════════════════════════════════════

/// Effect of a committed key, classified purely from the key identifier
/// and the current one-shot shift flag.  No timing component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    /// Insert a literal character (already cased per the shift flag).
    InsertChar(char),
    InsertSpace,
    DeleteLast,
    ClearAll,
    /// Arm the one-shot shift for the next literal character.
    ArmShift,
}

impl KeyAction {
    /// Pure classification of a committed key.
    pub fn classify(key: KeyId, shift_armed: bool) -> KeyAction {
        match key {
            KeyId::Space     => KeyAction::InsertSpace,
            KeyId::Backspace => KeyAction::DeleteLast,
            KeyId::ClearAll  => KeyAction::ClearAll,
            KeyId::Shift     => KeyAction::ArmShift,
            KeyId::Char(c)   => {
                let c = if shift_armed {
                    c.to_ascii_uppercase()
                } else {
                    c.to_ascii_lowercase()
                };
                KeyAction::InsertChar(c)
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Composer — text buffer + one-shot shift
// ════════════════════════════════════════════════════════════════════════════

/// Owns the on-screen text buffer and the one-shot shift modifier.
///
/// `apply` classifies the committed key against the *current* shift
/// flag, mutates the buffer, and returns the action so the caller can
/// mirror it into the OS input stream.  Shift affects exactly one
/// following literal character and is consumed by it.
#[derive(Clone, Debug, Default)]
pub struct Composer {
    text:  String,
    shift: bool,
}

impl Composer {
    pub fn new() -> Self {
        Composer::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn shift_armed(&self) -> bool {
        self.shift
    }

    pub fn apply(&mut self, key: KeyId) -> KeyAction {
        let action = KeyAction::classify(key, self.shift);
        match action {
            KeyAction::InsertChar(c) => {
                self.text.push(c);
                self.shift = false;
            }
            KeyAction::InsertSpace => self.text.push(' '),
            KeyAction::DeleteLast  => {
                self.text.pop();
            }
            KeyAction::ClearAll    => self.text.clear(),
            KeyAction::ArmShift    => self.shift = true,
        }
        action
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const TICK: Duration = Duration::from_millis(33);

    fn key(c: char) -> Option<KeyId> {
        Some(KeyId::Char(c))
    }

    /// Drive one hand over a fixed key for `ticks` samples at TICK rate,
    /// returning every commit and the tick index it fired on.
    fn drive(
        tracker: &mut DwellTracker,
        hand: Hand,
        k: Option<KeyId>,
        start: Instant,
        ticks: u32,
    ) -> Vec<(u32, KeyId)> {
        let mut commits = Vec::new();
        for i in 0..ticks {
            let now = start + TICK * i;
            if let Some(c) = tracker.on_sample(hand, k, now).committed() {
                commits.push((i, c));
            }
        }
        commits
    }

    #[test]
    fn hover_below_threshold_never_commits() {
        let mut tracker = DwellTracker::new(DwellThresholds::default());
        let start = Instant::now();
        // 0.5 s threshold = ~15 ticks; stay under it.
        let commits = drive(&mut tracker, Hand::Left, key('A'), start, 15);
        assert!(commits.is_empty());
        assert!(matches!(
            tracker.hover(Hand::Left),
            Some((KeyId::Char('A'), _))
        ));
    }

    #[test]
    fn exactly_one_commit_over_three_thresholds_of_holding() {
        let thresholds = DwellThresholds::default();
        let th = thresholds.threshold(KeyId::Char('A'));
        let mut tracker = DwellTracker::new(thresholds);
        let start = Instant::now();

        // Hold for 3× the threshold at a fixed sample rate.
        let ticks = (3 * th.as_millis() / TICK.as_millis()) as u32 + 1;
        let commits = drive(&mut tracker, Hand::Left, key('A'), start, ticks);

        assert_eq!(commits.len(), 1, "one keystroke per dwell, not a flood");
        let (fired_at, k) = commits[0];
        assert_eq!(k, KeyId::Char('A'));
        // Fired on the first tick whose elapsed time exceeds the threshold.
        assert!(TICK * fired_at > th);
        assert!(TICK * (fired_at - 1) <= th);
    }

    #[test]
    fn latched_key_reports_latched_and_rearms_only_after_leaving() {
        let thresholds = DwellThresholds::default();
        let th = thresholds.threshold(KeyId::Char('A'));
        let mut tracker = DwellTracker::new(thresholds);
        let start = Instant::now();

        tracker.on_sample(Hand::Left, key('A'), start);
        let out = tracker.on_sample(Hand::Left, key('A'), start + th + TICK);
        assert_eq!(out, SampleOutcome::Committed { key: KeyId::Char('A') });

        // Finger stays put: latched, no further keystrokes.
        let out = tracker.on_sample(Hand::Left, key('A'), start + th * 10);
        assert_eq!(out, SampleOutcome::Latched { key: KeyId::Char('A') });

        // Leave, return, and hold a full threshold again: fires once more.
        tracker.on_sample(Hand::Left, None, start + th * 10 + TICK);
        let back = start + th * 10 + TICK * 2;
        tracker.on_sample(Hand::Left, key('A'), back);
        let out = tracker.on_sample(Hand::Left, key('A'), back + th + TICK);
        assert_eq!(out, SampleOutcome::Committed { key: KeyId::Char('A') });
    }

    #[test]
    fn switching_keys_restarts_the_timer() {
        let thresholds = DwellThresholds::default();
        let th = thresholds.threshold(KeyId::Char('A'));
        let mut tracker = DwellTracker::new(thresholds);
        let start = Instant::now();

        // 90% of the threshold on A, then 90% on B: neither commits.
        let ticks = (th.as_millis() * 9 / 10 / TICK.as_millis()) as u32;
        let a = drive(&mut tracker, Hand::Left, key('A'), start, ticks);
        let b = drive(&mut tracker, Hand::Left, key('B'), start + TICK * ticks, ticks);
        assert!(a.is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn leaving_all_keys_discards_the_partial_hold() {
        let mut tracker = DwellTracker::new(DwellThresholds::default());
        let start = Instant::now();

        drive(&mut tracker, Hand::Left, key('A'), start, 10);
        let out = tracker.on_sample(Hand::Left, None, start + TICK * 10);
        assert_eq!(out, SampleOutcome::Idle);
        assert_eq!(tracker.hover(Hand::Left), None);

        // Coming back needs a full new hold: one tick past the old
        // hold-start must not commit.
        let out = tracker.on_sample(Hand::Left, key('A'), start + TICK * 11);
        assert!(matches!(out, SampleOutcome::Hovering { .. }));
    }

    #[test]
    fn hands_are_tracked_independently() {
        let thresholds = DwellThresholds::default();
        let th = thresholds.threshold(KeyId::Char('X'));
        let mut tracker = DwellTracker::new(thresholds);
        let start = Instant::now();

        // Right starts holding X halfway into Left's hold.
        let half = (th.as_millis() / 2 / TICK.as_millis()) as u32;
        drive(&mut tracker, Hand::Left, key('X'), start, half);

        let mut left_commit = None;
        let mut right_commit = None;
        for i in 0..60u32 {
            let now = start + TICK * (half + i);
            if let Some(k) = tracker.on_sample(Hand::Left, key('X'), now).committed() {
                left_commit.get_or_insert((half + i, k));
            }
            if let Some(k) = tracker.on_sample(Hand::Right, key('X'), now).committed() {
                right_commit.get_or_insert((half + i, k));
            }
        }

        // Both commit the same key; Left's commit does not reset Right.
        let (lt, _) = left_commit.expect("left commits");
        let (rt, _) = right_commit.expect("right commits");
        assert!(rt > lt, "right started later, so commits later");
        assert_eq!(rt - lt, half, "right's timer ran undisturbed");
    }

    #[rstest]
    #[case(KeyId::Char('A'), 500)]
    #[case(KeyId::Space, 500)]
    #[case(KeyId::Backspace, 500)]
    #[case(KeyId::Shift, 500)]
    #[case(KeyId::ClearAll, 2000)]
    fn threshold_table_defaults_and_overrides(#[case] key: KeyId, #[case] ms: u64) {
        let thresholds = DwellThresholds::default();
        assert_eq!(thresholds.threshold(key), Duration::from_millis(ms));
    }

    #[test]
    fn with_override_replaces_existing_entry() {
        let thresholds = DwellThresholds::default()
            .with_override(KeyId::ClearAll, Duration::from_secs(5));
        assert_eq!(thresholds.threshold(KeyId::ClearAll), Duration::from_secs(5));
    }

    #[test]
    fn clearall_needs_its_long_threshold() {
        let thresholds = DwellThresholds::default();
        let standard = thresholds.threshold(KeyId::Char('A'));
        let long = thresholds.threshold(KeyId::ClearAll);
        let mut tracker = DwellTracker::new(thresholds);
        let start = Instant::now();

        // Held past the standard threshold but short of its own: no commit.
        let mid = standard + (long - standard) / 2;
        let ticks = (mid.as_millis() / TICK.as_millis()) as u32;
        let commits = drive(&mut tracker, Hand::Right, Some(KeyId::ClearAll), start, ticks);
        assert!(commits.is_empty());

        // Held past the long threshold: exactly one commit.
        let more = (long.as_millis() / TICK.as_millis()) as u32 + 2;
        let commits = drive(
            &mut tracker,
            Hand::Right,
            Some(KeyId::ClearAll),
            start + TICK * ticks,
            more,
        );
        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].1, KeyId::ClearAll);
    }

    // ── Composer ─────────────────────────────────────────────────────────

    #[test]
    fn shift_is_one_shot() {
        let mut composer = Composer::new();
        assert_eq!(composer.apply(KeyId::Shift), KeyAction::ArmShift);
        assert!(composer.shift_armed());
        assert_eq!(composer.apply(KeyId::Char('A')), KeyAction::InsertChar('A'));
        assert!(!composer.shift_armed(), "shift consumed by one use");
        assert_eq!(composer.apply(KeyId::Char('B')), KeyAction::InsertChar('b'));
        assert_eq!(composer.text(), "Ab");
    }

    #[test]
    fn space_backspace_and_clear_mutate_the_buffer() {
        let mut composer = Composer::new();
        composer.apply(KeyId::Char('H'));
        composer.apply(KeyId::Char('I'));
        composer.apply(KeyId::Space);
        composer.apply(KeyId::Char('X'));
        assert_eq!(composer.text(), "hi x");

        assert_eq!(composer.apply(KeyId::Backspace), KeyAction::DeleteLast);
        assert_eq!(composer.text(), "hi ");

        assert_eq!(composer.apply(KeyId::ClearAll), KeyAction::ClearAll);
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn backspace_on_empty_buffer_is_a_no_op() {
        let mut composer = Composer::new();
        composer.apply(KeyId::Backspace);
        assert_eq!(composer.text(), "");
    }

    #[test]
    fn shift_survives_non_literal_keys_until_a_literal_consumes_it() {
        let mut composer = Composer::new();
        composer.apply(KeyId::Shift);
        composer.apply(KeyId::Space);
        assert!(composer.shift_armed());
        composer.apply(KeyId::Char('C'));
        assert_eq!(composer.text(), " C");
        assert!(!composer.shift_armed());
    }

    #[test]
    fn classify_is_pure_and_case_aware() {
        assert_eq!(
            KeyAction::classify(KeyId::Char('Q'), false),
            KeyAction::InsertChar('q')
        );
        assert_eq!(
            KeyAction::classify(KeyId::Char('Q'), true),
            KeyAction::InsertChar('Q')
        );
        assert_eq!(KeyAction::classify(KeyId::Space, true), KeyAction::InsertSpace);
        assert_eq!(KeyAction::classify(KeyId::ClearAll, false), KeyAction::ClearAll);
    }

    // ── HighlightState ───────────────────────────────────────────────────

    #[test]
    fn highlight_snapshot_reflects_sample_outcomes() {
        let mut highlights = HighlightState::default();
        let since = Instant::now();

        highlights.note(SampleOutcome::Idle);
        assert!(highlights.is_empty());

        highlights.note(SampleOutcome::Hovering { key: KeyId::Char('A'), since });
        assert_eq!(
            highlights.phase(KeyId::Char('A')),
            Some(HighlightPhase::Hovering { since })
        );

        // Commit flash wins over a concurrent hover on the same key.
        highlights.note(SampleOutcome::Committed { key: KeyId::Char('A') });
        assert_eq!(
            highlights.phase(KeyId::Char('A')),
            Some(HighlightPhase::PastThreshold)
        );

        highlights.clear();
        assert!(highlights.is_empty());
    }
}
