//! Overlay window capability: topmost + click-through, selected once at
//! startup.
//!
//! The keyboard overlay should let every pointer event fall through to
//! whatever application is underneath — except over the Exit button,
//! which must stay clickable.  On Windows this is done with the layered
//! `WS_EX_TRANSPARENT` window style, re-evaluated each frame against
//! the cursor position so the Exit region is carved out of the
//! click-through area.  Platforms without a backend degrade to a
//! normal, clickable overlay with a diagnostic — a capability
//! downgrade, not a failure.

use std::ffi::c_void;

use thiserror::Error;

// ════════════════════════════════════════════════════════════════════════════
// ScreenRect
// ════════════════════════════════════════════════════════════════════════════

/// Axis-aligned rectangle in pixels.  Whether the coordinates are
/// window- or screen-relative is up to the caller; `translated` maps
/// between the two spaces given the window's position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScreenRect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl ScreenRect {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    /// The same rectangle shifted by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> ScreenRect {
        ScreenRect { x: self.x + dx, y: self.y + dy, ..*self }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// CapabilityError
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("native click-through not implemented for {0}")]
    Unsupported(&'static str),
    #[error("native window call failed: {0}")]
    Native(String),
}

// ════════════════════════════════════════════════════════════════════════════
// OverlayHost
// ════════════════════════════════════════════════════════════════════════════

/// The platform backend for overlay window styling.  Detected once at
/// startup; never consulted from per-frame dwell logic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayHost {
    Windows,
    Unsupported(&'static str),
}

impl OverlayHost {
    pub fn detect() -> Self {
        if cfg!(windows) {
            OverlayHost::Windows
        } else {
            OverlayHost::Unsupported(std::env::consts::OS)
        }
    }

    /// Make the window topmost and click-through.  `handle` is the
    /// native handle from the windowing library.
    pub fn enable_clickthrough(&self, handle: *mut c_void) -> Result<(), CapabilityError> {
        match self {
            #[cfg(windows)]
            OverlayHost::Windows => {
                platform::enable(handle).map_err(|e| CapabilityError::Native(e.to_string()))
            }
            #[cfg(not(windows))]
            OverlayHost::Windows => {
                let _ = handle;
                Err(CapabilityError::Unsupported("windows backend not compiled"))
            }
            OverlayHost::Unsupported(os) => {
                let _ = handle;
                Err(CapabilityError::Unsupported(os))
            }
        }
    }

    /// Per-frame carve-out: drop click-through while the cursor is over
    /// the Exit region so its click lands on us instead of the desktop.
    /// No-op on platforms without the capability.
    pub fn service_exit_carve(&self, handle: *mut c_void, exit: ScreenRect) {
        match self {
            #[cfg(windows)]
            OverlayHost::Windows => platform::carve_exit(handle, exit),
            _ => {
                let _ = (handle, exit);
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Windows backend
// ════════════════════════════════════════════════════════════════════════════

#[cfg(windows)]
mod platform {
    use super::ScreenRect;
    use std::ffi::c_void;

    use windows::Win32::Foundation::{COLORREF, HWND, POINT};
    use windows::Win32::UI::WindowsAndMessaging::{
        GetCursorPos, GetWindowLongPtrW, SetLayeredWindowAttributes, SetWindowLongPtrW,
        SetWindowPos, GWL_EXSTYLE, HWND_TOPMOST, LWA_ALPHA, SWP_NOACTIVATE, SWP_NOMOVE,
        SWP_NOSIZE, WINDOW_EX_STYLE, WS_EX_LAYERED, WS_EX_TOOLWINDOW, WS_EX_TRANSPARENT,
    };

    pub fn overlay_ex_style() -> WINDOW_EX_STYLE {
        WS_EX_LAYERED | WS_EX_TRANSPARENT | WS_EX_TOOLWINDOW
    }

    pub fn enable(handle: *mut c_void) -> windows::core::Result<()> {
        let hwnd = HWND(handle);
        unsafe {
            let ex = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
            SetWindowLongPtrW(hwnd, GWL_EXSTYLE, ex | overlay_ex_style().0 as isize);
            // Fully opaque; the painted buffer controls the visuals.
            SetLayeredWindowAttributes(hwnd, COLORREF(0), 255, LWA_ALPHA)?;
            SetWindowPos(
                hwnd,
                HWND_TOPMOST,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )?;
        }
        Ok(())
    }

    pub fn carve_exit(handle: *mut c_void, exit: ScreenRect) {
        let hwnd = HWND(handle);
        let mut cursor = POINT::default();
        unsafe {
            if GetCursorPos(&mut cursor).is_err() {
                return;
            }
            let over_exit = exit.contains(cursor.x, cursor.y);
            let ex = GetWindowLongPtrW(hwnd, GWL_EXSTYLE);
            let transparent = WS_EX_TRANSPARENT.0 as isize;
            let want = if over_exit { ex & !transparent } else { ex | transparent };
            if want != ex {
                SetWindowLongPtrW(hwnd, GWL_EXSTYLE, want);
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn overlay_style_is_layered_transparent_toolwindow() {
            let style = overlay_ex_style();
            assert_ne!(style.0 & WS_EX_LAYERED.0, 0);
            assert_ne!(style.0 & WS_EX_TRANSPARENT.0, 0);
            assert_ne!(style.0 & WS_EX_TOOLWINDOW.0, 0);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
