//! Software-rendered overlay using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌────────────────────────────────────────────────┬──────────┐
//! │  [typed text bar]                              │  [EXIT]  │
//! │                                                           │
//! │  [Q][W][E][R][T][Y][U][I][O][P]                           │
//! │  [A][S][D][F][G][H][J][K][L]                              │
//! │  [Z][X][C][V][B][N][M]                                    │
//! │  [Shift][  Space  ][Backspace][ClearAll]                  │
//! │                                                           │
//! │  status line                                              │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Key caps are grey when idle, cyan while a fingertip is dwelling on
//! them, and flash green when the dwell commits.  In simulation mode
//! the window's own mouse events are forwarded as [`SimInput`].

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use dwell_core::{HighlightPhase, HighlightState};
use key_layout::{KeyId, Layout};

use crate::overlay::ScreenRect;
use crate::tracking::{SimInput, TrackedHand};

use std::ffi::c_void;
use std::sync::mpsc::Sender;

// ════════════════════════════════════════════════════════════════════════════
// Layout constants
// ════════════════════════════════════════════════════════════════════════════

pub const WIN_W: usize = 1280;
pub const WIN_H: usize = 720;

const TEXT_BAR_X: usize = 50;
const TEXT_BAR_Y: usize = 30;
const TEXT_BAR_W: usize = 1000;
const TEXT_BAR_H: usize = 50;

/// The one region of the overlay that is never click-through, in
/// window coordinates.  [`Visualizer::exit_screen_rect`] maps it into
/// screen space for the carve.
pub const EXIT_RECT: ScreenRect = ScreenRect { x: 1100, y: 30, w: 150, h: 50 };

const STATUS_Y: usize = WIN_H - 36;

const BG_COLOR:     u32 = 0xFF1A1A2E;
const TEXT_BAR_BG:  u32 = 0xFF323232;
const KEY_IDLE:     u32 = 0xFFC8C8C8;
const KEY_HOVER:    u32 = 0xFF00FFFF;
const KEY_COMMIT:   u32 = 0xFF00FF00;
const KEY_BORDER:   u32 = 0xFF000000;
const SHIFT_ARMED:  u32 = 0xFFFFB000;
const EXIT_BG:      u32 = 0xFFC80000;
const TEXT_COLOR:   u32 = 0xFFFFFFFF;
const LABEL_DARK:   u32 = 0xFF202020;
const STATUS_BG:    u32 = 0xFF0F3460;
const MARKER_LEFT:  u32 = 0xFFFF66AA;
const MARKER_RIGHT: u32 = 0xFF66AAFF;

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window: Window,
    buf:    Vec<u32>,
    sim_tx: Sender<SimInput>,
}

impl Visualizer {
    pub fn new(sim_tx: Sender<SimInput>) -> anyhow::Result<Self> {
        let mut window = Window::new(
            "AirKey Overlay",
            WIN_W,
            WIN_H,
            WindowOptions {
                resize:     false,
                borderless: true,
                topmost:    true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| anyhow::anyhow!("failed to open overlay window: {e}"))?;

        // Pin to the origin so the fixed key geometry sits where the
        // rendered grid claims it does.
        window.set_position(0, 0);
        window.limit_update_rate(Some(std::time::Duration::from_millis(33))); // ~30fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; WIN_W * WIN_H],
            sim_tx,
        })
    }

    /// Native handle for the overlay host.
    pub fn window_handle(&self) -> *mut c_void {
        self.window.get_window_handle()
    }

    /// The Exit region in *screen* coordinates, offset by wherever the
    /// window manager actually put the window.  The click-through carve
    /// compares against the global cursor, which uses screen space.
    pub fn exit_screen_rect(&self) -> ScreenRect {
        let (wx, wy) = self.window.get_position();
        EXIT_RECT.translated(wx as i32, wy as i32)
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Poll window input.  Forwards the cursor as the simulated
    /// fingertip and watches for an Exit click.  Returns false when the
    /// app should shut down.
    pub fn poll_input(&mut self) -> bool {
        if !self.window.is_open() {
            return false;
        }

        if self.window.is_key_pressed(Key::Tab, KeyRepeat::No) {
            let _ = self.sim_tx.send(SimInput::SwapHand);
        }

        let mouse = self.window.get_mouse_pos(MouseMode::Discard);
        match mouse {
            Some((x, y)) => {
                let _ = self.sim_tx.send(SimInput::Pointer { x, y });
            }
            None => {
                let _ = self.sim_tx.send(SimInput::NoPointer);
            }
        }

        // Exit is a literal pointer click, never a dwell.
        if self.window.get_mouse_down(MouseButton::Left) {
            if let Some((x, y)) = mouse {
                if EXIT_RECT.contains(x as i32, y as i32) {
                    let _ = self.sim_tx.send(SimInput::Quit);
                    return false;
                }
            }
        }

        true
    }

    /// Render one frame.
    pub fn render(
        &mut self,
        layout:      &Layout,
        highlights:  &HighlightState,
        text:        &str,
        shift_armed: bool,
        hands:       &[TrackedHand],
        status:      &str,
    ) {
        self.buf.fill(BG_COLOR);

        // ── Typed text bar ────────────────────────────────────────────────
        self.fill_rect(TEXT_BAR_X, TEXT_BAR_Y, TEXT_BAR_W, TEXT_BAR_H, TEXT_BAR_BG);
        self.draw_text(text, TEXT_BAR_X + 12, TEXT_BAR_Y + 15, 4, TEXT_COLOR);

        // ── Exit button ───────────────────────────────────────────────────
        self.fill_rect(
            EXIT_RECT.x as usize,
            EXIT_RECT.y as usize,
            EXIT_RECT.w as usize,
            EXIT_RECT.h as usize,
            EXIT_BG,
        );
        self.draw_text("EXIT", EXIT_RECT.x as usize + 48, EXIT_RECT.y as usize + 18, 3, TEXT_COLOR);

        // ── Keyboard grid ─────────────────────────────────────────────────
        for rect in layout.rects() {
            let color = match highlights.phase(rect.key) {
                Some(HighlightPhase::Hovering { .. }) => KEY_HOVER,
                Some(HighlightPhase::PastThreshold)   => KEY_COMMIT,
                None                                  => KEY_IDLE,
            };
            let (x, y) = (rect.x as usize, rect.y as usize);
            let (w, h) = (rect.w as usize, rect.h as usize);
            self.fill_rect(x, y, w, h, color);
            let border = if rect.key == KeyId::Shift && shift_armed {
                SHIFT_ARMED
            } else {
                KEY_BORDER
            };
            self.draw_border(x, y, w, h, border);

            let label = rect.key.label();
            let scale = if label.len() > 1 { 2 } else { 4 };
            let tw = label.len() * 4 * scale;
            let tx = x + w.saturating_sub(tw) / 2;
            let ty = y + h.saturating_sub(5 * scale) / 2;
            self.draw_text(&label, tx, ty, scale, LABEL_DARK);
        }

        // ── Fingertip markers ─────────────────────────────────────────────
        for tracked in hands {
            let color = match tracked.hand {
                dwell_core::Hand::Left  => MARKER_LEFT,
                dwell_core::Hand::Right => MARKER_RIGHT,
            };
            self.draw_crosshair(tracked.x as usize, tracked.y as usize, 10, color);
        }

        // ── Status bar ────────────────────────────────────────────────────
        self.fill_rect(0, STATUS_Y, WIN_W, WIN_H - STATUS_Y, STATUS_BG);
        self.draw_text(status, 10, STATUS_Y + 8, 2, TEXT_COLOR);

        self.window.update_with_buffer(&self.buf, WIN_W, WIN_H).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for row in y..(y + h).min(WIN_H) {
            for col in x..(x + w).min(WIN_W) {
                self.buf[row * WIN_W + col] = color;
            }
        }
    }

    fn draw_border(&mut self, x: usize, y: usize, w: usize, h: usize, color: u32) {
        for col in x..(x + w).min(WIN_W) {
            if y < WIN_H             { self.buf[y * WIN_W + col] = color; }
            if y + h - 1 < WIN_H     { self.buf[(y + h - 1) * WIN_W + col] = color; }
        }
        for row in y..(y + h).min(WIN_H) {
            if x < WIN_W             { self.buf[row * WIN_W + x] = color; }
            if x + w - 1 < WIN_W     { self.buf[row * WIN_W + x + w - 1] = color; }
        }
    }

    fn set_pixel(&mut self, x: usize, y: usize, color: u32) {
        if x < WIN_W && y < WIN_H {
            self.buf[y * WIN_W + x] = color;
        }
    }

    fn draw_crosshair(&mut self, cx: usize, cy: usize, r: usize, color: u32) {
        for d in 0..=r {
            self.set_pixel(cx + d, cy, color);
            self.set_pixel(cx.wrapping_sub(d), cy, color);
            self.set_pixel(cx, cy + d, color);
            self.set_pixel(cx, cy.wrapping_sub(d), color);
        }
    }

    /// Scaled 3×5 bitmap font.  Each glyph is 5 rows × 3 bits; scale
    /// multiplies every bit into a `scale × scale` block.
    fn draw_text(&mut self, text: &str, x: usize, y: usize, scale: usize, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3usize {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx + 4 * scale > WIN_W {
                break;
            }
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

fn char_glyph(c: char) -> [u8; 5] {
    match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'a' | 'A' => [0b111, 0b101, 0b111, 0b101, 0b101],
        'b' | 'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'c' | 'C' => [0b111, 0b100, 0b100, 0b100, 0b111],
        'd' | 'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'e' | 'E' => [0b111, 0b100, 0b111, 0b100, 0b111],
        'f' | 'F' => [0b111, 0b100, 0b111, 0b100, 0b100],
        'g' | 'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'h' | 'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'i' | 'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'j' | 'J' => [0b001, 0b001, 0b001, 0b101, 0b111],
        'k' | 'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'l' | 'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'm' | 'M' => [0b101, 0b111, 0b101, 0b101, 0b101],
        'n' | 'N' => [0b111, 0b101, 0b101, 0b101, 0b101],
        'o' | 'O' => [0b111, 0b101, 0b101, 0b101, 0b111],
        'p' | 'P' => [0b111, 0b101, 0b111, 0b100, 0b100],
        'q' | 'Q' => [0b111, 0b101, 0b101, 0b111, 0b001],
        'r' | 'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        's' | 'S' => [0b111, 0b100, 0b111, 0b001, 0b111],
        't' | 'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'u' | 'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'v' | 'V' => [0b101, 0b101, 0b101, 0b010, 0b010],
        'w' | 'W' => [0b101, 0b101, 0b101, 0b111, 0b101],
        'x' | 'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'y' | 'Y' => [0b101, 0b101, 0b111, 0b010, 0b010],
        'z' | 'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '/' => [0b001, 0b001, 0b010, 0b100, 0b100],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '=' => [0b000, 0b111, 0b000, 0b111, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        ' ' => [0b000, 0b000, 0b000, 0b000, 0b000],
        _   => [0b000, 0b000, 0b010, 0b000, 0b000], // fallback dot
    }
}
