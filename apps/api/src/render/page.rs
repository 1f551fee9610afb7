use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::layout::{arrange, Arrangement, FontFamily, Fragment};
use crate::render::style::{Align, Edges, Length, Rgb, TextStyle};
use crate::render::Template;

// ────────────────────────────────────────────────────────────────────────────
// Render inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Print units, decorations suppressed. Used for capture.
    Export,
    /// Screen units, decorations enabled. Used for previews.
    Interactive,
}

/// Physical page sizes at 96 DPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageSize {
    #[default]
    A4,
    Letter,
}

impl PageSize {
    /// (width, height) in CSS pixels.
    pub fn pixels(&self) -> (f32, f32) {
        match self {
            PageSize::A4 => (794.0, 1123.0),
            PageSize::Letter => (816.0, 1056.0),
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "a4" => Some(PageSize::A4),
            "letter" | "us-letter" => Some(PageSize::Letter),
            _ => None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Node tree
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub weight: f32,
    pub node: Node,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Border {
    pub width: Length,
    pub color: Rgb,
}

/// The visual tree a template produces, before positioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// Vertical stack of children separated by `gap`.
    Stack {
        gap: Length,
        padding: Edges,
        background: Option<Rgb>,
        border_left: Option<Border>,
        children: Vec<Node>,
    },
    /// Horizontal split; each column gets a share of the width by weight.
    /// With `stretch`, every column's background extends to the tallest column.
    Columns {
        gap: Length,
        stretch: bool,
        columns: Vec<Column>,
    },
    Text {
        text: String,
        style: TextStyle,
    },
    /// A single list item with a hanging marker.
    Bullet {
        text: String,
        style: TextStyle,
    },
    /// Inline pill labels that wrap onto new rows.
    Chips {
        items: Vec<String>,
        style: TextStyle,
        fill: Rgb,
        gap: Length,
    },
    Rule {
        color: Rgb,
        thickness: Length,
    },
    /// Ornamental glyph to the left of `child`. Interactive mode only.
    Decorated {
        glyph: String,
        size: Length,
        child: Box<Node>,
    },
    /// Profile picture placeholder. Interactive mode only.
    Avatar {
        diameter: Length,
        fill: Rgb,
    },
    /// Inline, inert message shown in place of content.
    Notice {
        message: String,
        style: TextStyle,
    },
}

impl Node {
    pub fn text(text: impl Into<String>, style: TextStyle) -> Self {
        Node::Text {
            text: text.into(),
            style,
        }
    }

    pub fn stack(gap: Length, children: Vec<Node>) -> Self {
        Node::Stack {
            gap,
            padding: Edges::NONE,
            background: None,
            border_left: None,
            children,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Rendered page
// ────────────────────────────────────────────────────────────────────────────

pub const RENDER_FAILURE_MESSAGE: &str =
    "An error occurred while rendering the resume. Please try again.";

/// A rendered resume page: the node tree plus its arrangement at page width.
///
/// The outer dimensions are always the physical page size. `content_height`
/// may exceed `height_px`; the renderer does not paginate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub template: Template,
    pub mode: RenderMode,
    pub size: PageSize,
    pub width_px: f32,
    pub height_px: f32,
    pub root: Node,
    pub arrangement: Arrangement,
    /// True when this page is the inline failure notice.
    pub is_fallback: bool,
}

impl Page {
    pub fn new(
        template: Template,
        mode: RenderMode,
        size: PageSize,
        root: Node,
    ) -> Result<Self, RenderError> {
        let (width_px, height_px) = size.pixels();
        let arrangement = arrange(&root, width_px)?;
        Ok(Page {
            template,
            mode,
            size,
            width_px,
            height_px,
            root,
            arrangement,
            is_fallback: false,
        })
    }

    /// The inert page shown when rendering fails. Never fails itself.
    pub fn notice(template: Template, mode: RenderMode, size: PageSize) -> Self {
        let (width_px, height_px) = size.pixels();
        let style = TextStyle {
            family: FontFamily::Sans,
            size: Length::Px(14.0),
            bold: false,
            italic: false,
            uppercase: false,
            color: Rgb(0xdc, 0x26, 0x26),
            align: Align::Left,
            line_height: 1.4,
        };
        let padding = 16.0;
        let fragment = Fragment::Text {
            x: padding,
            y: padding,
            width: width_px - 2.0 * padding,
            text: RENDER_FAILURE_MESSAGE.to_string(),
            family: style.family,
            size_px: 14.0,
            line_height_px: 14.0 * style.line_height,
            bold: false,
            italic: false,
            color: style.color,
        };
        Page {
            template,
            mode,
            size,
            width_px,
            height_px,
            root: Node::Notice {
                message: RENDER_FAILURE_MESSAGE.to_string(),
                style,
            },
            arrangement: Arrangement {
                fragments: vec![fragment],
                content_height: 2.0 * padding + 14.0 * style.line_height,
            },
            is_fallback: true,
        }
    }

    pub fn content_height(&self) -> f32 {
        self.arrangement.content_height
    }

    /// Content runs past the bottom of the physical page.
    pub fn overflows(&self) -> bool {
        self.content_height() > self.height_px
    }

    /// Families referenced by any text on the page.
    pub fn font_families(&self) -> BTreeSet<FontFamily> {
        self.arrangement
            .fragments
            .iter()
            .filter_map(|f| match f {
                Fragment::Text { family, .. } => Some(*family),
                _ => None,
            })
            .collect()
    }

    /// Every line of text in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.arrangement.fragments.iter().filter_map(|f| match f {
            Fragment::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}
