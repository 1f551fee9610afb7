//! Section builders shared by all templates.
//!
//! Every builder returns `None` when it has nothing to show, and the template
//! simply drops the section. Missing data is never an error.

use crate::models::resume::{
    non_blank, Contact, EducationEntry, ExperienceEntry, LanguageEntry, ReferenceEntry,
    ResumeData,
};
use crate::render::dates::{format_month_year, format_range};
use crate::render::page::{Border, Column, Node};
use crate::render::style::{Align, Edges, Length, SkillLayout, StyleTokens};

pub const UNTITLED: &str = "Untitled Resume";
const UNTITLED_POSITION: &str = "Untitled Position";
const NO_COMPANY: &str = "No Company";
const NO_DEGREE: &str = "No Degree";
const NO_SCHOOL: &str = "No Institution";

/// Name/title and target role.
pub fn header(resume: &ResumeData, tokens: &StyleTokens) -> Node {
    let mut children = vec![Node::text(
        non_blank(Some(&resume.title)).unwrap_or(UNTITLED),
        tokens.name,
    )];
    if let Some(role) = non_blank(Some(&resume.job_title)) {
        children.push(Node::text(role, tokens.role));
    }
    Node::stack(tokens.pt(5.0), children)
}

/// Heading plus body. The heading carries an icon in interactive mode and a
/// rule beneath it when the template asks for ruled headings.
pub fn section(label: &str, icon: &str, body: Node, tokens: &StyleTokens) -> Node {
    let mut heading = Node::text(label, tokens.heading);
    if tokens.decorations() {
        heading = Node::Decorated {
            glyph: icon.to_string(),
            size: tokens.heading.size,
            child: Box::new(heading),
        };
    }

    let mut children = vec![heading];
    if tokens.ruled_headings {
        children.push(Node::Rule {
            color: tokens.rule,
            thickness: tokens.pt(1.5),
        });
    }
    children.push(body);
    Node::stack(tokens.pt(8.0), children)
}

pub fn contact(contact: &Contact, tokens: &StyleTokens) -> Option<Node> {
    if contact.is_blank() {
        return None;
    }
    let rows = [
        ("\u{2709}", contact.email.as_deref()),
        ("\u{260e}", contact.phone.as_deref()),
        ("\u{1f310}", contact.website.as_deref()),
        ("\u{1f4cd}", contact.location.as_deref()),
    ];
    let lines: Vec<Node> = rows
        .iter()
        .filter_map(|(icon, value)| {
            let value = non_blank(*value)?;
            let line = Node::text(value, tokens.body);
            Some(if tokens.decorations() {
                Node::Decorated {
                    glyph: icon.to_string(),
                    size: tokens.body.size,
                    child: Box::new(line),
                }
            } else {
                line
            })
        })
        .collect();

    Some(section(
        tokens.labels.contact,
        "\u{1f4c7}",
        Node::stack(tokens.line_gap, lines),
        tokens,
    ))
}

pub fn summary(text: &str, tokens: &StyleTokens) -> Option<Node> {
    let text = non_blank(Some(text))?;
    let body = bordered(Node::text(text, tokens.body), tokens);
    Some(section(tokens.labels.summary, "\u{1f464}", body, tokens))
}

pub fn experience(entries: &[ExperienceEntry], tokens: &StyleTokens) -> Option<Node> {
    if entries.is_empty() {
        return None;
    }
    let items = entries
        .iter()
        .map(|entry| {
            let mut children = vec![entry_heading(
                non_blank(Some(&entry.position)).unwrap_or(UNTITLED_POSITION),
                non_blank(Some(&entry.company)).unwrap_or(NO_COMPANY),
                format_range(entry.start_date.as_deref(), entry.end_date.as_deref()),
                tokens,
            )];
            if let Some(description) = non_blank(Some(&entry.description)) {
                children.push(Node::Bullet {
                    text: description.to_string(),
                    style: tokens.body,
                });
            }
            bordered(Node::stack(tokens.line_gap, children), tokens)
        })
        .collect();

    Some(section(
        tokens.labels.experience,
        "\u{1f4bc}",
        Node::stack(tokens.item_gap, items),
        tokens,
    ))
}

pub fn education(entries: &[EducationEntry], tokens: &StyleTokens) -> Option<Node> {
    if entries.is_empty() {
        return None;
    }
    let items = entries
        .iter()
        .map(|entry| {
            let degree = match (non_blank(Some(&entry.degree)), non_blank(Some(&entry.field))) {
                (Some(degree), Some(field)) => format!("{degree}, {field}"),
                (Some(degree), None) => degree.to_string(),
                (None, Some(field)) => field.to_string(),
                (None, None) => NO_DEGREE.to_string(),
            };
            let mut children = vec![entry_heading(
                &degree,
                non_blank(Some(&entry.school)).unwrap_or(NO_SCHOOL),
                format_month_year(entry.graduation_date.as_deref()),
                tokens,
            )];
            if let Some(gpa) = non_blank(entry.gpa.as_deref()) {
                children.push(Node::text(format!("GPA: {gpa}"), tokens.meta));
            }
            bordered(Node::stack(tokens.line_gap, children), tokens)
        })
        .collect();

    Some(section(
        tokens.labels.education,
        "\u{1f393}",
        Node::stack(tokens.item_gap, items),
        tokens,
    ))
}

pub fn skills(skills: &[String], tokens: &StyleTokens) -> Option<Node> {
    let skills: Vec<String> = skills
        .iter()
        .filter_map(|s| non_blank(Some(s)).map(str::to_string))
        .collect();
    if skills.is_empty() {
        return None;
    }
    let body = match tokens.skill_layout {
        SkillLayout::Bullets => Node::stack(
            tokens.line_gap,
            skills
                .into_iter()
                .map(|text| Node::Bullet {
                    text,
                    style: tokens.body,
                })
                .collect(),
        ),
        SkillLayout::Chips => Node::Chips {
            items: skills,
            style: tokens.body,
            fill: tokens.chip_fill,
            gap: tokens.pt(4.0),
        },
    };
    Some(section(tokens.labels.skills, "\u{2605}", body, tokens))
}

pub fn languages(entries: &[LanguageEntry], tokens: &StyleTokens) -> Option<Node> {
    let lines: Vec<Node> = entries
        .iter()
        .filter_map(|entry| {
            let name = non_blank(Some(&entry.name))?;
            Some(Node::text(
                format!("{name} ({})", entry.proficiency.label()),
                tokens.body,
            ))
        })
        .collect();
    if lines.is_empty() {
        return None;
    }
    Some(section(
        tokens.labels.languages,
        "\u{1f5e3}",
        Node::stack(tokens.line_gap, lines),
        tokens,
    ))
}

pub fn references(entries: &[ReferenceEntry], tokens: &StyleTokens) -> Option<Node> {
    let items: Vec<Node> = entries
        .iter()
        .filter_map(|entry| {
            let name = non_blank(Some(&entry.name))?;
            let mut lines = vec![Node::text(name, tokens.body.bold())];
            let affiliation = [non_blank(Some(&entry.company)), non_blank(Some(&entry.position))]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" / ");
            if !affiliation.is_empty() {
                lines.push(Node::text(affiliation, tokens.body));
            }
            if let Some(phone) = non_blank(entry.phone.as_deref()) {
                lines.push(Node::text(format!("Phone: {phone}"), tokens.body));
            }
            if let Some(email) = non_blank(entry.email.as_deref()) {
                lines.push(Node::text(format!("Email: {email}"), tokens.body));
            }
            Some(Node::stack(Length::ZERO, lines))
        })
        .collect();
    if items.is_empty() {
        return None;
    }
    Some(section(
        tokens.labels.references,
        "\u{1f91d}",
        Node::stack(tokens.item_gap, items),
        tokens,
    ))
}

/// Title and subtitle on the left, date range right-aligned.
fn entry_heading(title: &str, subtitle: &str, dates: String, tokens: &StyleTokens) -> Node {
    Node::Columns {
        gap: tokens.pt(6.0),
        stretch: false,
        columns: vec![
            Column {
                weight: 2.0,
                node: Node::stack(
                    tokens.pt(2.0),
                    vec![
                        Node::text(title, tokens.entry_title),
                        Node::text(subtitle, tokens.entry_subtitle),
                    ],
                ),
            },
            Column {
                weight: 1.0,
                node: Node::text(dates, tokens.meta.align(Align::Right)),
            },
        ],
    }
}

/// Wraps an entry in the template's left border, if it uses one.
fn bordered(node: Node, tokens: &StyleTokens) -> Node {
    if !tokens.entry_border {
        return node;
    }
    Node::Stack {
        gap: Length::ZERO,
        padding: Edges::left(tokens.pt(12.0)),
        background: None,
        border_left: Some(Border {
            width: tokens.pt(3.0),
            color: tokens.rule,
        }),
        children: vec![node],
    }
}
