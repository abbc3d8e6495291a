//! # key_layout
//!
//! Static keyboard layout grid for the AirKey overlay, with on-demand
//! rectangle geometry and pixel-coordinate → key resolution.
//!
//! The layout is an ordered sequence of rows of [`KeyId`]s, fixed at
//! startup and never mutated.  Key rectangles are *derived*: they are
//! recomputed from the geometry constants on every query rather than
//! cached, which is fine because a full scan touches ~40 rectangles and
//! runs at most twice per frame (once per tracked hand).
//!
//! ## Resolution contract
//!
//! [`Layout::resolve`] walks rows top-to-bottom and keys left-to-right,
//! returning the first rectangle that contains the point (edges
//! inclusive).  With a positive spacing the rectangles never touch; with
//! zero spacing a point on a shared edge resolves to the earlier key in
//! row-major scan order.  Every `(x, y)` is a legal query — a miss is
//! `None`, never an error.

// ════════════════════════════════════════════════════════════════════════════
// KeyId
// ════════════════════════════════════════════════════════════════════════════

/// Identifier for one key on the virtual keyboard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyId {
    /// A literal character key, stored as its uppercase letter.
    Char(char),
    /// One-shot shift: upper-cases only the next literal character.
    Shift,
    /// Triple-width space bar.
    Space,
    /// Delete the last character of the text buffer.
    Backspace,
    /// Wipe the whole text buffer.  Carries a long dwell threshold so a
    /// fingertip grazing it on the way to another key cannot trigger it.
    ClearAll,
}

impl KeyId {
    /// Display label drawn on the key cap.
    pub fn label(&self) -> String {
        match self {
            KeyId::Char(c)   => c.to_string(),
            KeyId::Shift     => "Shift".to_string(),
            KeyId::Space     => "Space".to_string(),
            KeyId::Backspace => "Backspace".to_string(),
            KeyId::ClearAll  => "ClearAll".to_string(),
        }
    }

    /// Width of this key in standard key-width units.
    pub fn width_units(&self) -> f32 {
        match self {
            KeyId::Space => 3.0,
            _            => 1.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Geometry
// ════════════════════════════════════════════════════════════════════════════

/// Fixed grid geometry: key size, inter-key spacing, and the top-left
/// origin of the grid in display-space pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Geometry {
    pub key_w:    f32,
    pub key_h:    f32,
    pub spacing:  f32,
    pub origin_x: f32,
    pub origin_y: f32,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            key_w:    80.0,
            key_h:    80.0,
            spacing:  15.0,
            origin_x: 50.0,
            origin_y: 100.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// KeyRect
// ════════════════════════════════════════════════════════════════════════════

/// A key together with its display rectangle.  Produced on demand by
/// [`Layout::rects`]; never stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KeyRect {
    pub key: KeyId,
    pub x:   f32,
    pub y:   f32,
    pub w:   f32,
    pub h:   f32,
}

impl KeyRect {
    /// Containment test, inclusive on all four edges.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.w && y >= self.y && y <= self.y + self.h
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Layout
// ════════════════════════════════════════════════════════════════════════════

/// The keyboard grid: rows of keys plus the geometry used to place them.
#[derive(Clone, Debug)]
pub struct Layout {
    rows:     Vec<Vec<KeyId>>,
    geometry: Geometry,
}

impl Default for Layout {
    /// The stock QWERTY grid: three letter rows plus a control row.
    fn default() -> Self {
        let letters = |s: &str| s.chars().map(KeyId::Char).collect::<Vec<_>>();
        let rows = vec![
            letters("QWERTYUIOP"),
            letters("ASDFGHJKL"),
            letters("ZXCVBNM"),
            vec![KeyId::Shift, KeyId::Space, KeyId::Backspace, KeyId::ClearAll],
        ];
        Layout { rows, geometry: Geometry::default() }
    }
}

impl Layout {
    pub fn new(rows: Vec<Vec<KeyId>>, geometry: Geometry) -> Self {
        Layout { rows, geometry }
    }

    pub fn geometry(&self) -> Geometry {
        self.geometry
    }

    /// Total number of keys in the grid.
    pub fn key_count(&self) -> usize {
        self.rows.iter().map(|r| r.len()).sum()
    }

    /// Compute every key rectangle in row-major, left-to-right order.
    ///
    /// Rectangles tile with fixed spacing and never overlap; wide keys
    /// push the remainder of their row further right.
    pub fn rects(&self) -> Vec<KeyRect> {
        let g = self.geometry;
        let mut out = Vec::with_capacity(self.key_count());
        let mut y = g.origin_y;
        for row in &self.rows {
            let mut x = g.origin_x;
            for &key in row {
                let w = g.key_w * key.width_units();
                out.push(KeyRect { key, x, y, w, h: g.key_h });
                x += w + g.spacing;
            }
            y += g.key_h + g.spacing;
        }
        out
    }

    /// Resolve a display-space pixel coordinate to the key under it.
    ///
    /// First hit in row-major scan order wins; `None` when the point is
    /// between keys or outside the grid entirely.
    pub fn resolve(&self, x: f32, y: f32) -> Option<KeyId> {
        let g = self.geometry;
        let mut ry = g.origin_y;
        for row in &self.rows {
            let mut rx = g.origin_x;
            for &key in row {
                let w = g.key_w * key.width_units();
                if x >= rx && x <= rx + w && y >= ry && y <= ry + g.key_h {
                    return Some(key);
                }
                rx += w + g.spacing;
            }
            ry += g.key_h + g.spacing;
        }
        None
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
