//! # key_inject
//!
//! Mirrors committed dwell keys into the OS input stream.
//!
//! [`KeyOut`] abstracts the backend so the rest of the application never
//! touches `enigo` directly: [`EnigoOut`] drives the real synthetic-input
//! API, [`NullOut`] swallows everything for tests and `--no-inject` runs.
//! `ClearAll` and the shift toggle only affect the local text buffer and
//! are never injected.

use dwell_core::KeyAction;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// InjectError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum InjectError {
    #[error("failed to initialise synthetic input: {0}")]
    Init(String),
    #[error("failed to send keystroke: {0}")]
    Send(String),
}

// ════════════════════════════════════════════════════════════════════════════
// KeyOut — abstraction over enigo / null
// ════════════════════════════════════════════════════════════════════════════

/// A sink for synthetic keystrokes.
pub trait KeyOut: Send {
    fn tap_char(&mut self, c: char) -> Result<(), InjectError>;
    fn tap_space(&mut self) -> Result<(), InjectError>;
    fn tap_backspace(&mut self) -> Result<(), InjectError>;
}

/// Send one committed action to a sink.  Buffer-only actions
/// (`ClearAll`, `ArmShift`) are deliberately not injected.
pub fn dispatch(out: &mut dyn KeyOut, action: KeyAction) -> Result<(), InjectError> {
    match action {
        KeyAction::InsertChar(c) => out.tap_char(c),
        KeyAction::InsertSpace   => out.tap_space(),
        KeyAction::DeleteLast    => out.tap_backspace(),
        KeyAction::ClearAll | KeyAction::ArmShift => Ok(()),
    }
}

// ── enigo backend ─────────────────────────────────────────────────────────

/// Real OS injection via `enigo`.
pub struct EnigoOut {
    enigo: Enigo,
}

impl EnigoOut {
    pub fn new() -> Result<Self, InjectError> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| InjectError::Init(format!("{e:?}")))?;
        Ok(EnigoOut { enigo })
    }

    fn click(&mut self, key: Key) -> Result<(), InjectError> {
        tracing::trace!(?key, "injecting keystroke");
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| InjectError::Send(format!("{e:?}")))
    }
}

impl KeyOut for EnigoOut {
    fn tap_char(&mut self, c: char) -> Result<(), InjectError> {
        self.click(Key::Unicode(c))
    }

    fn tap_space(&mut self) -> Result<(), InjectError> {
        self.click(Key::Unicode(' '))
    }

    fn tap_backspace(&mut self) -> Result<(), InjectError> {
        self.click(Key::Backspace)
    }
}

// ── null backend (tests / --no-inject) ────────────────────────────────────

/// Discards keystrokes, optionally recording them for assertions.
#[derive(Default)]
pub struct NullOut {
    pub taps: Vec<String>,
}

impl KeyOut for NullOut {
    fn tap_char(&mut self, c: char) -> Result<(), InjectError> {
        self.taps.push(c.to_string());
        Ok(())
    }

    fn tap_space(&mut self) -> Result<(), InjectError> {
        self.taps.push("space".to_string());
        Ok(())
    }

    fn tap_backspace(&mut self) -> Result<(), InjectError> {
        self.taps.push("backspace".to_string());
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_routes_literal_keys() {
        let mut out = NullOut::default();
        dispatch(&mut out, KeyAction::InsertChar('A')).unwrap();
        dispatch(&mut out, KeyAction::InsertSpace).unwrap();
        dispatch(&mut out, KeyAction::DeleteLast).unwrap();
        assert_eq!(out.taps, vec!["A", "space", "backspace"]);
    }

    #[test]
    fn buffer_only_actions_are_not_injected() {
        let mut out = NullOut::default();
        dispatch(&mut out, KeyAction::ClearAll).unwrap();
        dispatch(&mut out, KeyAction::ArmShift).unwrap();
        assert!(out.taps.is_empty());
    }
}
