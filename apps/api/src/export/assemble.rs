//! PDF assembly — writes a captured display list into a paginated document.
//!
//! Page geometry is derived from the capture, not from a paper preset: a
//! capture that fits one physical page produces a single page of exactly the
//! captured size. Taller captures are cut into page-height segments.

use std::io::{BufWriter, Cursor, Write};

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference, Point, Polygon, Rgb as PdfRgb,
};
use tracing::debug;
use uuid::Uuid;

use crate::export::capture::Capture;
use crate::export::ExportError;
use crate::layout::{FontFamily, Fragment};
use crate::render::style::Rgb;
use crate::render::PageSize;

const MM_PER_PX: f32 = 25.4 / 96.0;
const PT_PER_PX: f32 = 72.0 / 96.0;
/// Distance from the top of the em box to the baseline, in ems.
const ASCENT_EM: f32 = 0.8;
/// Captures this close to one page still count as one page.
const PAGE_TOLERANCE_PX: f32 = 0.5;

#[derive(Debug, Clone)]
pub struct ExportDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// One output page: fragments in CSS px relative to the segment's top edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub width_px: f32,
    pub height_px: f32,
    pub fragments: Vec<Fragment>,
}

#[derive(Debug, Clone, Copy)]
pub struct PdfAssembler {
    page_size: PageSize,
}

impl PdfAssembler {
    pub fn new(page_size: PageSize) -> Self {
        PdfAssembler { page_size }
    }

    pub fn assemble(
        &self,
        capture: &Capture,
        title: &str,
        file_name: String,
    ) -> Result<ExportDocument, ExportError> {
        let (_, page_height) = self.page_size.pixels();
        let segments = segments(capture, page_height);
        let first = segments
            .first()
            .ok_or_else(|| ExportError::Assemble("capture produced no pages".to_string()))?;

        let doc_title = if title.trim().is_empty() { "Resume" } else { title.trim() };
        let (doc, page_idx, layer_idx) = PdfDocument::new(
            doc_title,
            Mm(first.width_px * MM_PER_PX),
            Mm(first.height_px * MM_PER_PX),
            "Layer 1",
        );
        let faces = Faces::load(&doc)?;

        for (i, segment) in segments.iter().enumerate() {
            let layer = if i == 0 {
                doc.get_page(page_idx).get_layer(layer_idx)
            } else {
                let (page, layer) = doc.add_page(
                    Mm(segment.width_px * MM_PER_PX),
                    Mm(segment.height_px * MM_PER_PX),
                    "Layer 1",
                );
                doc.get_page(page).get_layer(layer)
            };
            draw_segment(&layer, segment, &faces);
        }

        let mut bytes = Vec::new();
        {
            let mut writer = BufWriter::new(Cursor::new(&mut bytes));
            doc.save(&mut writer)
                .map_err(|e| ExportError::Assemble(e.to_string()))?;
            writer
                .flush()
                .map_err(|e| ExportError::Assemble(e.to_string()))?;
        }

        debug!("Assembled {} page(s), {} bytes", segments.len(), bytes.len());
        Ok(ExportDocument {
            file_name,
            bytes,
            page_count: segments.len(),
        })
    }
}

/// Undoes oversampling and cuts the capture into pages of `page_height_px`.
///
/// Rectangles are repeated on every page they overlap so backgrounds continue
/// across the cut. A text line belongs to the page its top falls on, unless
/// it would cross that page's bottom edge; then it starts the next page.
pub fn segments(capture: &Capture, page_height_px: f32) -> Vec<Segment> {
    let (width, height) = capture.css_size();
    let fragments: Vec<Fragment> = capture
        .fragments
        .iter()
        .map(|f| f.transformed(0.0, 1.0 / capture.scale))
        .collect();

    if height <= page_height_px + PAGE_TOLERANCE_PX || page_height_px <= 0.0 {
        return vec![Segment {
            width_px: width,
            height_px: height,
            fragments,
        }];
    }

    let count = (height / page_height_px).ceil() as usize;
    (0..count)
        .map(|i| {
            let top = i as f32 * page_height_px;
            let bottom = top + page_height_px;
            let fragments = fragments
                .iter()
                .filter(|f| match f {
                    Fragment::Text { .. } => text_page(f, page_height_px, count) == i,
                    Fragment::Rect { .. } => f.top() < bottom && f.bottom() > top,
                })
                .map(|f| {
                    let mut moved = f.transformed(-top, 1.0);
                    if let Fragment::Text { y, .. } = &mut moved {
                        *y = y.max(0.0);
                    }
                    moved
                })
                .collect();
            Segment {
                width_px: width,
                height_px: page_height_px,
                fragments,
            }
        })
        .collect()
}

/// Index of the page a text line is drawn on.
fn text_page(line: &Fragment, page_height_px: f32, count: usize) -> usize {
    let page = (line.top() / page_height_px).floor().max(0.0) as usize;
    let page_bottom = (page + 1) as f32 * page_height_px;
    let page = if line.bottom() > page_bottom + PAGE_TOLERANCE_PX {
        page + 1
    } else {
        page
    };
    page.min(count - 1)
}

/// `<title-slug>-<id>.pdf`, or `resume-<id>.pdf` when the title has no
/// usable characters.
pub fn export_file_name(title: &str, id: Uuid) -> String {
    let slug = slugify(title);
    if slug.is_empty() {
        format!("resume-{id}.pdf")
    } else {
        format!("{slug}-{id}.pdf")
    }
}

fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_end_matches('-').to_string()
}

// ────────────────────────────────────────────────────────────────────────────
// Drawing
// ────────────────────────────────────────────────────────────────────────────

/// Regular, bold, italic, bold-italic for each builtin face.
struct Faces {
    helvetica: [IndirectFontRef; 4],
    times: [IndirectFontRef; 4],
}

impl Faces {
    fn load(doc: &PdfDocumentReference) -> Result<Self, ExportError> {
        let add = |font: BuiltinFont| {
            doc.add_builtin_font(font)
                .map_err(|e| ExportError::Assemble(format!("font {font:?}: {e}")))
        };
        Ok(Faces {
            helvetica: [
                add(BuiltinFont::Helvetica)?,
                add(BuiltinFont::HelveticaBold)?,
                add(BuiltinFont::HelveticaOblique)?,
                add(BuiltinFont::HelveticaBoldOblique)?,
            ],
            times: [
                add(BuiltinFont::TimesRoman)?,
                add(BuiltinFont::TimesBold)?,
                add(BuiltinFont::TimesItalic)?,
                add(BuiltinFont::TimesBoldItalic)?,
            ],
        })
    }

    fn get(&self, family: FontFamily, bold: bool, italic: bool) -> &IndirectFontRef {
        let set = if family.is_serif() {
            &self.times
        } else {
            &self.helvetica
        };
        &set[usize::from(bold) | (usize::from(italic) << 1)]
    }
}

fn draw_segment(layer: &PdfLayerReference, segment: &Segment, faces: &Faces) {
    let page_height = segment.height_px;
    for fragment in &segment.fragments {
        match fragment {
            Fragment::Rect {
                x,
                y,
                width,
                height,
                fill,
                ..
            } => {
                // PDF space grows upwards from the bottom-left corner.
                let bottom = page_height - (y + height);
                let points = vec![
                    (point(*x, bottom), false),
                    (point(x + width, bottom), false),
                    (point(x + width, bottom + height), false),
                    (point(*x, bottom + height), false),
                ];
                set_fill_color(layer, *fill);
                layer.add_polygon(Polygon {
                    rings: vec![points],
                    mode: PaintMode::Fill,
                    winding_order: WindingOrder::NonZero,
                });
            }
            Fragment::Text {
                x,
                y,
                text,
                family,
                size_px,
                line_height_px,
                bold,
                italic,
                color,
                ..
            } => {
                let baseline = y + (line_height_px - size_px) / 2.0 + size_px * ASCENT_EM;
                set_fill_color(layer, *color);
                layer.use_text(
                    latin1(text),
                    size_px * PT_PER_PX,
                    Mm(x * MM_PER_PX),
                    Mm((page_height - baseline) * MM_PER_PX),
                    faces.get(*family, *bold, *italic),
                );
            }
        }
    }
}

fn point(x: f32, y: f32) -> Point {
    Point::new(Mm(x * MM_PER_PX), Mm(y * MM_PER_PX))
}

fn set_fill_color(layer: &PdfLayerReference, color: Rgb) {
    let (r, g, b) = color.unit();
    layer.set_fill_color(Color::Rgb(PdfRgb::new(r, g, b, None)));
}

/// The builtin faces only cover Latin-1.
fn latin1(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2022}' => '-',
            c if (c as u32) <= 0xff => c,
            _ => '?',
        })
        .collect()
}
