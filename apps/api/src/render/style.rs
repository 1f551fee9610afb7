//! Style tokens shared by the section builders.
//!
//! Each template is a set of tokens; the section builders never hard-code a
//! color or a size. Export mode expresses sizes in points, interactive mode in
//! rem. Both resolve to the same pixel values so the preview matches the export.

use serde::{Deserialize, Serialize};

use crate::layout::FontFamily;
use crate::render::page::RenderMode;
use crate::render::Template;

/// CSS reference: 96 px per inch, 72 pt per inch, 16 px per rem.
pub const PX_PER_PT: f32 = 96.0 / 72.0;
pub const PX_PER_REM: f32 = 16.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum Length {
    Pt(f32),
    Rem(f32),
    Px(f32),
}

impl Length {
    pub const ZERO: Length = Length::Px(0.0);

    pub fn to_px(self) -> f32 {
        match self {
            Length::Pt(v) => v * PX_PER_PT,
            Length::Rem(v) => v * PX_PER_REM,
            Length::Px(v) => v,
        }
    }

    /// A length of `pt` points expressed in the unit `mode` prefers.
    pub fn for_mode(mode: RenderMode, pt: f32) -> Length {
        match mode {
            RenderMode::Export => Length::Pt(pt),
            RenderMode::Interactive => Length::Rem(pt * PX_PER_PT / PX_PER_REM),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);

    /// Channels as 0.0..=1.0 floats.
    pub fn unit(self) -> (f32, f32, f32) {
        (
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Edges {
    pub const NONE: Edges = Edges {
        top: Length::ZERO,
        right: Length::ZERO,
        bottom: Length::ZERO,
        left: Length::ZERO,
    };

    pub fn symmetric(vertical: Length, horizontal: Length) -> Self {
        Edges {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn left(left: Length) -> Self {
        Edges { left, ..Edges::NONE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub family: FontFamily,
    pub size: Length,
    pub bold: bool,
    pub italic: bool,
    pub uppercase: bool,
    pub color: Rgb,
    pub align: Align,
    /// Line box height as a multiple of the font size.
    pub line_height: f32,
}

impl TextStyle {
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn uppercase(mut self) -> Self {
        self.uppercase = true;
        self
    }

    pub fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillLayout {
    Bullets,
    Chips,
}

/// Headings differ per template; the builders take them from here.
#[derive(Debug, Clone, Copy)]
pub struct SectionLabels {
    pub contact: &'static str,
    pub summary: &'static str,
    pub experience: &'static str,
    pub education: &'static str,
    pub skills: &'static str,
    pub languages: &'static str,
    pub references: &'static str,
}

/// Resolved style for one (template, mode) pair.
#[derive(Debug, Clone)]
pub struct StyleTokens {
    pub mode: RenderMode,
    pub name: TextStyle,
    pub role: TextStyle,
    pub heading: TextStyle,
    pub entry_title: TextStyle,
    pub entry_subtitle: TextStyle,
    pub meta: TextStyle,
    pub body: TextStyle,
    pub rule: Rgb,
    pub chip_fill: Rgb,
    pub section_gap: Length,
    pub item_gap: Length,
    pub line_gap: Length,
    /// Draw a rule under every section heading.
    pub ruled_headings: bool,
    /// Draw a left border beside each experience/education entry.
    pub entry_border: bool,
    pub skill_layout: SkillLayout,
    pub labels: SectionLabels,
}

const SLATE_700: Rgb = Rgb(0x4a, 0x55, 0x68);
const SLATE_500: Rgb = Rgb(0x71, 0x80, 0x96);
const SLATE_200: Rgb = Rgb(0xe2, 0xe8, 0xf0);
const GRAY_900: Rgb = Rgb(0x11, 0x18, 0x27);
const GRAY_700: Rgb = Rgb(0x37, 0x41, 0x51);
const GRAY_500: Rgb = Rgb(0x6b, 0x72, 0x80);
const GRAY_100: Rgb = Rgb(0xf3, 0xf4, 0xf6);
const INK: Rgb = Rgb(0x33, 0x33, 0x33);

impl StyleTokens {
    pub fn new(template: Template, mode: RenderMode) -> Self {
        let pt = |v: f32| Length::for_mode(mode, v);
        let family = template.font_family();
        let text = |size: f32, color: Rgb| TextStyle {
            family,
            size: pt(size),
            bold: false,
            italic: false,
            uppercase: false,
            color,
            align: Align::Left,
            line_height: 1.4,
        };

        match template {
            Template::Professional => StyleTokens {
                mode,
                name: text(28.0, SLATE_700).bold().uppercase(),
                role: text(12.0, SLATE_500).uppercase(),
                heading: text(12.0, SLATE_700).bold().uppercase(),
                entry_title: text(11.0, SLATE_700).bold(),
                entry_subtitle: text(10.0, SLATE_500).italic(),
                meta: text(9.0, SLATE_500).bold(),
                body: text(9.0, SLATE_700),
                rule: SLATE_200,
                chip_fill: SLATE_200,
                section_gap: pt(25.0),
                item_gap: pt(15.0),
                line_gap: pt(3.0),
                ruled_headings: false,
                entry_border: true,
                skill_layout: SkillLayout::Bullets,
                labels: SectionLabels {
                    contact: "Contact",
                    summary: "Profile",
                    experience: "Work Experience",
                    education: "Education",
                    skills: "Skills",
                    languages: "Languages",
                    references: "Reference",
                },
            },
            Template::Creative => StyleTokens {
                mode,
                name: text(22.0, GRAY_900).bold(),
                role: text(15.0, GRAY_500),
                heading: text(15.0, GRAY_900).bold(),
                entry_title: text(13.0, GRAY_900).bold(),
                entry_subtitle: text(11.0, GRAY_500),
                meta: text(9.5, GRAY_500),
                body: text(10.5, GRAY_700),
                rule: GRAY_100,
                chip_fill: GRAY_100,
                section_gap: pt(18.0),
                item_gap: pt(12.0),
                line_gap: pt(2.0),
                ruled_headings: false,
                entry_border: false,
                skill_layout: SkillLayout::Chips,
                labels: SectionLabels {
                    contact: "Contact",
                    summary: "Summary",
                    experience: "Experience",
                    education: "Education",
                    skills: "Skills",
                    languages: "Languages",
                    references: "References",
                },
            },
            Template::Executive => StyleTokens {
                mode,
                name: text(26.0, GRAY_900).bold().align(Align::Center),
                role: text(15.0, GRAY_500).align(Align::Center),
                heading: text(15.0, GRAY_900).bold(),
                entry_title: text(13.0, GRAY_900).bold(),
                entry_subtitle: text(11.5, GRAY_500),
                meta: text(9.5, GRAY_500),
                body: text(11.0, INK),
                rule: Rgb(0xe5, 0xe7, 0xeb),
                chip_fill: GRAY_100,
                section_gap: pt(18.0),
                item_gap: pt(12.0),
                line_gap: pt(3.0),
                ruled_headings: true,
                entry_border: false,
                skill_layout: SkillLayout::Chips,
                labels: SectionLabels {
                    contact: "Contact",
                    summary: "Professional Summary",
                    experience: "Professional Experience",
                    education: "Education",
                    skills: "Skills",
                    languages: "Languages",
                    references: "References",
                },
            },
        }
    }

    /// Tokens for text set on a dark panel (the professional sidebar).
    pub fn inverted(&self) -> Self {
        let on_dark = |style: TextStyle| style.color(Rgb::WHITE);
        StyleTokens {
            name: on_dark(self.name),
            role: on_dark(self.role),
            heading: on_dark(self.heading).uppercase(),
            entry_title: on_dark(self.entry_title),
            entry_subtitle: on_dark(self.entry_subtitle),
            meta: on_dark(self.meta),
            body: on_dark(self.body),
            rule: SLATE_500,
            chip_fill: SLATE_500,
            entry_border: false,
            ..self.clone()
        }
    }

    /// Icons, avatar and similar ornaments appear only on screen.
    pub fn decorations(&self) -> bool {
        self.mode == RenderMode::Interactive
    }

    pub fn pt(&self, value: f32) -> Length {
        Length::for_mode(self.mode, value)
    }
}

pub const SIDEBAR_FILL: Rgb = SLATE_700;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_and_interactive_lengths_resolve_equal() {
        let export = Length::for_mode(RenderMode::Export, 12.0).to_px();
        let interactive = Length::for_mode(RenderMode::Interactive, 12.0).to_px();
        assert!((export - 16.0).abs() < 1e-4);
        assert!((export - interactive).abs() < 1e-4);
    }

    #[test]
    fn test_export_uses_print_units() {
        let tokens = StyleTokens::new(Template::Executive, RenderMode::Export);
        assert!(matches!(tokens.body.size, Length::Pt(_)));
        assert!(!tokens.decorations());
    }

    #[test]
    fn test_interactive_uses_screen_units() {
        let tokens = StyleTokens::new(Template::Creative, RenderMode::Interactive);
        assert!(matches!(tokens.body.size, Length::Rem(_)));
        assert!(tokens.decorations());
    }

    #[test]
    fn test_inverted_tokens_are_white() {
        let tokens = StyleTokens::new(Template::Professional, RenderMode::Export).inverted();
        assert_eq!(tokens.body.color, Rgb::WHITE);
        assert_eq!(tokens.heading.color, Rgb::WHITE);
    }
}
