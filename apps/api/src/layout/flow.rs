//! Flow engine — positions a render node tree on a fixed-width page.
//!
//! Coordinates are CSS pixels with the origin at the top-left of the page.
//! The engine is a single top-down pass: every node receives its x, y and
//! available width, pushes fragments, and returns the height it consumed.
//! Backgrounds are pushed before their content and patched with the final
//! height once the content is known, so drawing order is back-to-front.

use serde::{Deserialize, Serialize};

use crate::errors::RenderError;
use crate::layout::font_metrics::get_metrics;
use crate::layout::FontFamily;
use crate::render::page::Node;
use crate::render::style::{Align, Length, Rgb, TextStyle};

const BULLET_MARKER: &str = "\u{2022}";
/// Hanging indent of a bullet item, in ems of its text size.
const BULLET_INDENT_EM: f32 = 1.0;
/// Horizontal padding inside a chip, in ems of its text size.
const CHIP_PADDING_EM: f32 = 0.75;
const CHIP_ROW_PADDING_EM: f32 = 0.3;

// ────────────────────────────────────────────────────────────────────────────
// Output types
// ────────────────────────────────────────────────────────────────────────────

/// A positioned drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fragment {
    /// One line of text. `y` is the top of the line box.
    Text {
        x: f32,
        y: f32,
        width: f32,
        text: String,
        family: FontFamily,
        size_px: f32,
        line_height_px: f32,
        bold: bool,
        italic: bool,
        color: Rgb,
    },
    /// Filled rectangle; `radius > 0` rounds the corners.
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill: Rgb,
    },
}

impl Fragment {
    /// Bottom edge of the fragment.
    pub fn bottom(&self) -> f32 {
        match self {
            Fragment::Text {
                y, line_height_px, ..
            } => y + line_height_px,
            Fragment::Rect { y, height, .. } => y + height,
        }
    }

    pub fn top(&self) -> f32 {
        match self {
            Fragment::Text { y, .. } | Fragment::Rect { y, .. } => *y,
        }
    }

    /// Copy of the fragment moved vertically by `dy` and scaled by `factor`.
    pub fn transformed(&self, dy: f32, factor: f32) -> Fragment {
        match self.clone() {
            Fragment::Text {
                x,
                y,
                width,
                text,
                family,
                size_px,
                line_height_px,
                bold,
                italic,
                color,
            } => Fragment::Text {
                x: x * factor,
                y: (y + dy) * factor,
                width: width * factor,
                text,
                family,
                size_px: size_px * factor,
                line_height_px: line_height_px * factor,
                bold,
                italic,
                color,
            },
            Fragment::Rect {
                x,
                y,
                width,
                height,
                radius,
                fill,
            } => Fragment::Rect {
                x: x * factor,
                y: (y + dy) * factor,
                width: width * factor,
                height: height * factor,
                radius: radius * factor,
                fill,
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arrangement {
    pub fragments: Vec<Fragment>,
    /// Height of the laid-out content from the top of the page.
    pub content_height: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Entry point
// ────────────────────────────────────────────────────────────────────────────

/// Arranges `root` into a page of `width` pixels.
pub fn arrange(root: &Node, width: f32) -> Result<Arrangement, RenderError> {
    if !width.is_finite() || width <= 0.0 {
        return Err(RenderError::NoSpace { width });
    }
    let mut flow = Flow::default();
    let height = flow.node(root, 0.0, 0.0, width, None)?;
    Ok(Arrangement {
        fragments: flow.fragments,
        content_height: height,
    })
}

#[derive(Default)]
struct Flow {
    fragments: Vec<Fragment>,
}

impl Flow {
    /// Places `node` at (x, y) within `width`; returns the height consumed.
    fn node(
        &mut self,
        node: &Node,
        x: f32,
        y: f32,
        width: f32,
        stretch_to: Option<f32>,
    ) -> Result<f32, RenderError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(RenderError::NoSpace { width });
        }

        match node {
            Node::Stack {
                gap,
                padding,
                background,
                border_left,
                children,
            } => {
                let gap = px(*gap, "stack gap")?;
                let (top, right, bottom, left) = (
                    px(padding.top, "padding")?,
                    px(padding.right, "padding")?,
                    px(padding.bottom, "padding")?,
                    px(padding.left, "padding")?,
                );
                let border = match border_left {
                    Some(b) => Some((px(b.width, "border width")?, b.color)),
                    None => None,
                };
                let border_w = border.map(|(w, _)| w).unwrap_or(0.0);

                let background_slot = background.map(|fill| self.push_rect(x, y, width, 0.0, 0.0, fill));
                let border_slot = border.map(|(w, color)| self.push_rect(x, y, w, 0.0, 0.0, color));

                let inner_x = x + border_w + left;
                let inner_w = width - border_w - left - right;
                let mut cursor = y + top;
                let mut placed_any = false;
                for child in children {
                    let start = if placed_any { cursor + gap } else { cursor };
                    let h = self.node(child, inner_x, start, inner_w, None)?;
                    if h > 0.0 {
                        cursor = start + h;
                        placed_any = true;
                    }
                }

                let natural = cursor - y + bottom;
                let height = natural.max(stretch_to.unwrap_or(0.0));
                if let Some(slot) = background_slot {
                    self.set_height(slot, height);
                }
                if let Some(slot) = border_slot {
                    self.set_height(slot, natural - top - bottom);
                    self.shift(slot, top);
                }
                Ok(height)
            }

            Node::Columns {
                gap,
                stretch,
                columns,
            } => {
                let total: f32 = columns.iter().map(|c| c.weight).sum();
                if columns.is_empty() || !total.is_finite() || total <= 0.0 {
                    return Err(RenderError::EmptyColumns);
                }
                let gap = px(*gap, "column gap")?;
                let available = width - gap * (columns.len() - 1) as f32;
                let widths: Vec<f32> = columns
                    .iter()
                    .map(|c| available * c.weight / total)
                    .collect();

                // Measure first so stretched backgrounds know the row height.
                let mut row_height = stretch_to.unwrap_or(0.0);
                for (column, w) in columns.iter().zip(&widths) {
                    let mut probe = Flow::default();
                    row_height = row_height.max(probe.node(&column.node, 0.0, 0.0, *w, None)?);
                }

                let mut cx = x;
                for (column, w) in columns.iter().zip(&widths) {
                    let stretch = if *stretch { Some(row_height) } else { None };
                    self.node(&column.node, cx, y, *w, stretch)?;
                    cx += w + gap;
                }
                Ok(row_height)
            }

            Node::Text { text, style } => self.text(text, style, x, y, width),

            Node::Notice { message, style } => self.text(message, style, x, y, width),

            Node::Bullet { text, style } => {
                let size = px(style.size, "font size")?;
                let indent = size * BULLET_INDENT_EM;
                if text.trim().is_empty() {
                    return Ok(0.0);
                }
                self.push_line(BULLET_MARKER.to_string(), style, size, x, y, indent);
                self.text(text, style, x + indent, y, (width - indent).max(1.0))
            }

            Node::Chips {
                items,
                style,
                fill,
                gap,
            } => {
                let size = px(style.size, "font size")?;
                let gap = px(*gap, "chip gap")?;
                let metrics = get_metrics(style.family);
                let pad_x = size * CHIP_PADDING_EM;
                let pad_y = size * CHIP_ROW_PADDING_EM;
                let chip_h = size * style.line_height + 2.0 * pad_y;

                let mut cx = x;
                let mut cy = y;
                let mut placed = false;
                for item in items.iter().map(|i| i.trim()).filter(|i| !i.is_empty()) {
                    let label = apply_case(item, style);
                    let chip_w = (metrics.measure_px(&label, size) + 2.0 * pad_x).min(width);
                    if placed && cx + chip_w > x + width {
                        cx = x;
                        cy += chip_h + gap;
                    }
                    self.push_rect(cx, cy, chip_w, chip_h, chip_h / 2.0, *fill);
                    self.push_line(label, style, size, cx + pad_x, cy + pad_y, chip_w - 2.0 * pad_x);
                    cx += chip_w + gap;
                    placed = true;
                }
                Ok(if placed { cy + chip_h - y } else { 0.0 })
            }

            Node::Rule { color, thickness } => {
                let h = px(*thickness, "rule thickness")?;
                self.push_rect(x, y, width, h, 0.0, *color);
                Ok(h)
            }

            Node::Decorated { glyph, size, child } => {
                let size = px(*size, "decoration size")?;
                let glyph_w = size * 1.5;
                let glyph_style = TextStyle {
                    family: FontFamily::Sans,
                    size: Length::Px(size),
                    bold: false,
                    italic: false,
                    uppercase: false,
                    color: Rgb(0x4a, 0x55, 0x68),
                    align: Align::Left,
                    line_height: 1.0,
                };
                self.push_line(glyph.clone(), &glyph_style, size, x, y, glyph_w);
                let h = self.node(child, x + glyph_w, y, (width - glyph_w).max(1.0), None)?;
                Ok(h.max(size))
            }

            Node::Avatar { diameter, fill } => {
                let d = px(*diameter, "avatar diameter")?.min(width);
                self.push_rect(x + (width - d) / 2.0, y, d, d, d / 2.0, *fill);
                Ok(d)
            }
        }
    }

    /// Wraps `text` into `width` and pushes one fragment per line.
    fn text(
        &mut self,
        text: &str,
        style: &TextStyle,
        x: f32,
        y: f32,
        width: f32,
    ) -> Result<f32, RenderError> {
        let size = px(style.size, "font size")?;
        if !style.line_height.is_finite() || style.line_height <= 0.0 {
            return Err(RenderError::InvalidLength {
                context: "line height",
                value: style.line_height,
            });
        }
        let line_h = size * style.line_height;
        let lines = get_metrics(style.family).wrap(&apply_case(text, style), size, width);
        let count = lines.len();
        for (i, line) in lines.into_iter().enumerate() {
            self.push_line(line, style, size, x, y + i as f32 * line_h, width);
        }
        Ok(count as f32 * line_h)
    }

    fn push_line(&mut self, line: String, style: &TextStyle, size: f32, x: f32, y: f32, width: f32) {
        let line_w = get_metrics(style.family).measure_px(&line, size);
        let lx = match style.align {
            Align::Left => x,
            Align::Center => x + ((width - line_w) / 2.0).max(0.0),
            Align::Right => x + (width - line_w).max(0.0),
        };
        self.fragments.push(Fragment::Text {
            x: lx,
            y,
            width: line_w,
            text: line,
            family: style.family,
            size_px: size,
            line_height_px: size * style.line_height,
            bold: style.bold,
            italic: style.italic,
            color: style.color,
        });
    }

    fn push_rect(&mut self, x: f32, y: f32, width: f32, height: f32, radius: f32, fill: Rgb) -> usize {
        self.fragments.push(Fragment::Rect {
            x,
            y,
            width,
            height,
            radius,
            fill,
        });
        self.fragments.len() - 1
    }

    fn set_height(&mut self, slot: usize, value: f32) {
        if let Some(Fragment::Rect { height, .. }) = self.fragments.get_mut(slot) {
            *height = value.max(0.0);
        }
    }

    fn shift(&mut self, slot: usize, dy: f32) {
        if let Some(Fragment::Rect { y, .. }) = self.fragments.get_mut(slot) {
            *y += dy;
        }
    }
}

fn px(length: Length, context: &'static str) -> Result<f32, RenderError> {
    let value = length.to_px();
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RenderError::InvalidLength { context, value })
    }
}

fn apply_case(text: &str, style: &TextStyle) -> String {
    if style.uppercase {
        text.to_uppercase()
    } else {
        text.to_string()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
