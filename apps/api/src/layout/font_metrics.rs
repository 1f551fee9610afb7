//! Static font-metric tables for the three template font families.
//!
//! Character widths are in em units (relative to font size). The tables are an
//! approximation of the real glyph advances, close enough that wrapped line
//! counts match what a browser or PDF viewer produces for typical resume text.
//!
//! Only one table is stored: the sans-serif base. The other families are
//! expressed as a uniform scale of it, which keeps relative character shapes
//! and only shifts the overall set width.
//!
//! Index = (char as usize) - 32, covering ASCII 0x20..=0x7E.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Font family enum
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontFamily {
    /// Arial / Helvetica. Professional template.
    Sans,
    /// Lato-like humanist sans, slightly wider. Creative template.
    Humanist,
    /// Garamond / Times-like serif, narrower. Executive template.
    Serif,
}

impl FontFamily {
    pub const ALL: [FontFamily; 3] = [FontFamily::Sans, FontFamily::Humanist, FontFamily::Serif];

    pub fn is_serif(&self) -> bool {
        matches!(self, FontFamily::Serif)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Metrics
// ────────────────────────────────────────────────────────────────────────────

/// Width metrics for one family, derived from the base table.
pub struct FontMetrics {
    /// Multiplier applied to every base width.
    scale: f32,
    /// Fallback width for non-ASCII characters (codepoints > 0x7E), unscaled.
    average_char_width: f32,
}

impl FontMetrics {
    /// Width of `s` in em units.
    pub fn measure_em(&self, s: &str) -> f32 {
        s.chars()
            .map(|c| {
                let code = c as usize;
                if (32..=126).contains(&code) {
                    BASE_WIDTHS[code - 32]
                } else {
                    self.average_char_width
                }
            })
            .sum::<f32>()
            * self.scale
    }

    /// Width of `s` in pixels when set at `size_px`.
    pub fn measure_px(&self, s: &str, size_px: f32) -> f32 {
        self.measure_em(s) * size_px
    }

    pub fn space_px(&self, size_px: f32) -> f32 {
        BASE_WIDTHS[0] * self.scale * size_px
    }

    /// Greedy word wrap of `text` into lines no wider than `max_width_px`.
    ///
    /// Whitespace runs collapse to single spaces. A word wider than the line is
    /// placed on a line of its own rather than split. Blank input yields no lines.
    pub fn wrap(&self, text: &str, size_px: f32, max_width_px: f32) -> Vec<String> {
        let space_w = self.space_px(size_px);
        let mut lines = Vec::new();
        let mut current = String::new();
        let mut current_width = 0.0_f32;

        for word in text.split_whitespace() {
            let word_w = self.measure_px(word, size_px);
            if current.is_empty() {
                current.push_str(word);
                current_width = word_w;
            } else if current_width + space_w + word_w > max_width_px {
                lines.push(std::mem::take(&mut current));
                current.push_str(word);
                current_width = word_w;
            } else {
                current.push(' ');
                current.push_str(word);
                current_width += space_w + word_w;
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Base width table (95 ASCII printable characters)
// ────────────────────────────────────────────────────────────────────────────

#[rustfmt::skip]
static BASE_WIDTHS: [f32; 95] = [
    // sp    !     "     #     $     %     &     '     (     )     *     +     ,     -     .     /
    0.28, 0.28, 0.36, 0.56, 0.56, 0.89, 0.67, 0.19, 0.33, 0.33, 0.39, 0.58, 0.28, 0.33, 0.28, 0.28,
    // 0-9
    0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56, 0.56,
    // :     ;     <     =     >     ?     @
    0.28, 0.28, 0.58, 0.58, 0.58, 0.56, 1.02,
    // A-M
    0.67, 0.67, 0.72, 0.72, 0.67, 0.61, 0.78, 0.72, 0.28, 0.50, 0.67, 0.56, 0.83,
    // N-Z
    0.72, 0.78, 0.67, 0.78, 0.72, 0.67, 0.61, 0.72, 0.67, 0.94, 0.67, 0.67, 0.61,
    // [     \     ]     ^     _     `
    0.28, 0.28, 0.28, 0.47, 0.56, 0.33,
    // a-m
    0.56, 0.56, 0.50, 0.56, 0.56, 0.28, 0.56, 0.56, 0.22, 0.22, 0.50, 0.22, 0.83,
    // n-z
    0.56, 0.56, 0.56, 0.56, 0.33, 0.50, 0.28, 0.56, 0.50, 0.72, 0.50, 0.50, 0.50,
    // {     |     }     ~
    0.33, 0.26, 0.33, 0.58,
];

static SANS: FontMetrics = FontMetrics {
    scale: 1.0,
    average_char_width: 0.55,
};

static HUMANIST: FontMetrics = FontMetrics {
    scale: 1.05,
    average_char_width: 0.55,
};

static SERIF: FontMetrics = FontMetrics {
    scale: 0.88,
    average_char_width: 0.55,
};

/// Returns the static metrics for a given font family.
pub fn get_metrics(family: FontFamily) -> &'static FontMetrics {
    match family {
        FontFamily::Sans => &SANS,
        FontFamily::Humanist => &HUMANIST,
        FontFamily::Serif => &SERIF,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
