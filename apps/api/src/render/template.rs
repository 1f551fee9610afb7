use serde::{Deserialize, Deserializer, Serialize};

use crate::layout::FontFamily;
use crate::models::resume::ResumeData;
use crate::render::page::{Column, Node, PageSize};
use crate::render::sections;
use crate::render::style::{Edges, Length, StyleTokens, SIDEBAR_FILL};

/// The closed set of visual layouts. Unknown identifiers fall back to `Professional`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    /// Two-column page with a dark sidebar.
    #[default]
    Professional,
    /// Asymmetric 2:1 grid.
    Creative,
    /// Single formal column.
    Executive,
}

impl Template {
    pub const ALL: [Template; 3] = [
        Template::Professional,
        Template::Creative,
        Template::Executive,
    ];

    /// Case-insensitive lookup. Absent, blank or unknown ids yield `Professional`.
    pub fn from_id(id: Option<&str>) -> Self {
        match id.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("creative") => Template::Creative,
            Some("executive") => Template::Executive,
            _ => Template::Professional,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Professional => "professional",
            Template::Creative => "creative",
            Template::Executive => "executive",
        }
    }

    pub fn font_family(&self) -> FontFamily {
        match self {
            Template::Professional => FontFamily::Sans,
            Template::Creative => FontFamily::Humanist,
            Template::Executive => FontFamily::Serif,
        }
    }

    /// Builds the page tree for `resume`. `size` bounds decorative elements
    /// that scale with the page.
    pub fn layout(&self, resume: &ResumeData, tokens: &StyleTokens, size: PageSize) -> Node {
        match self {
            Template::Professional => professional(resume, tokens, size),
            Template::Creative => creative(resume, tokens),
            Template::Executive => executive(resume, tokens),
        }
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(Template::from_id(raw.as_deref()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Layouts
// ────────────────────────────────────────────────────────────────────────────

fn professional(resume: &ResumeData, tokens: &StyleTokens, size: PageSize) -> Node {
    let side_tokens = tokens.inverted();
    let (page_width, _) = size.pixels();

    let mut sidebar = Vec::new();
    if tokens.decorations() {
        sidebar.push(Node::Avatar {
            diameter: Length::Px(page_width * 0.2),
            fill: tokens.rule,
        });
    }
    sidebar.extend(
        [
            sections::contact(&resume.contact, &side_tokens),
            sections::skills(&resume.skills, &side_tokens),
            sections::languages(&resume.languages, &side_tokens),
            sections::references(&resume.references, &side_tokens),
        ]
        .into_iter()
        .flatten(),
    );

    let main = [
        Some(sections::header(resume, tokens)),
        sections::summary(&resume.summary, tokens),
        sections::experience(&resume.experience, tokens),
        sections::education(&resume.education, tokens),
    ]
    .into_iter()
    .flatten()
    .collect();

    Node::Columns {
        gap: Length::ZERO,
        stretch: true,
        columns: vec![
            Column {
                weight: 35.0,
                node: Node::Stack {
                    gap: tokens.pt(30.0),
                    padding: Edges::symmetric(tokens.pt(40.0), tokens.pt(20.0)),
                    background: Some(SIDEBAR_FILL),
                    border_left: None,
                    children: sidebar,
                },
            },
            Column {
                weight: 65.0,
                node: Node::Stack {
                    gap: tokens.section_gap,
                    padding: Edges::symmetric(tokens.pt(40.0), tokens.pt(30.0)),
                    background: None,
                    border_left: None,
                    children: main,
                },
            },
        ],
    }
}

fn creative(resume: &ResumeData, tokens: &StyleTokens) -> Node {
    let main = [
        Some(sections::header(resume, tokens)),
        sections::summary(&resume.summary, tokens),
        sections::experience(&resume.experience, tokens),
        sections::references(&resume.references, tokens),
    ]
    .into_iter()
    .flatten()
    .collect();

    let side = [
        sections::contact(&resume.contact, tokens),
        sections::education(&resume.education, tokens),
        sections::skills(&resume.skills, tokens),
        sections::languages(&resume.languages, tokens),
    ]
    .into_iter()
    .flatten()
    .collect();

    Node::Stack {
        gap: Length::ZERO,
        padding: Edges::symmetric(tokens.pt(36.0), tokens.pt(36.0)),
        background: None,
        border_left: None,
        children: vec![Node::Columns {
            gap: tokens.pt(24.0),
            stretch: false,
            columns: vec![
                Column {
                    weight: 2.0,
                    node: Node::stack(tokens.section_gap, main),
                },
                Column {
                    weight: 1.0,
                    node: Node::stack(tokens.section_gap, side),
                },
            ],
        }],
    }
}

fn executive(resume: &ResumeData, tokens: &StyleTokens) -> Node {
    let mut children: Vec<Node> = [
        Some(sections::header(resume, tokens)),
        sections::contact(&resume.contact, tokens),
        sections::summary(&resume.summary, tokens),
        sections::experience(&resume.experience, tokens),
    ]
    .into_iter()
    .flatten()
    .collect();

    // Education and skills share a band; a lone one takes the full width.
    let band: Vec<Node> = [
        sections::education(&resume.education, tokens),
        sections::skills(&resume.skills, tokens),
    ]
    .into_iter()
    .flatten()
    .collect();
    match band.len() {
        0 => {}
        1 => children.extend(band),
        _ => children.push(Node::Columns {
            gap: tokens.pt(24.0),
            stretch: false,
            columns: band
                .into_iter()
                .map(|node| Column { weight: 1.0, node })
                .collect(),
        }),
    }

    children.extend(
        [
            sections::languages(&resume.languages, tokens),
            sections::references(&resume.references, tokens),
        ]
        .into_iter()
        .flatten(),
    );

    Node::Stack {
        gap: tokens.section_gap,
        padding: Edges::symmetric(tokens.pt(40.0), tokens.pt(40.0)),
        background: None,
        border_left: None,
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_id_known_values() {
        assert_eq!(Template::from_id(Some("creative")), Template::Creative);
        assert_eq!(Template::from_id(Some(" Executive ")), Template::Executive);
        assert_eq!(Template::from_id(Some("professional")), Template::Professional);
    }

    #[test]
    fn test_from_id_unknown_falls_back() {
        assert_eq!(Template::from_id(Some("gothic")), Template::Professional);
        assert_eq!(Template::from_id(Some("")), Template::Professional);
        assert_eq!(Template::from_id(None), Template::Professional);
    }

    #[test]
    fn test_deserialize_unknown_and_null() {
        let t: Template = serde_json::from_str("\"gothic\"").unwrap();
        assert_eq!(t, Template::Professional);
        let t: Template = serde_json::from_str("null").unwrap();
        assert_eq!(t, Template::Professional);
        let t: Template = serde_json::from_str("\"creative\"").unwrap();
        assert_eq!(t, Template::Creative);
    }

    #[test]
    fn test_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Template::Executive).unwrap(),
            "\"executive\""
        );
    }
}
