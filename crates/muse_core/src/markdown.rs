//! crates/muse_core/src/markdown.rs
//!
//! Renders the restricted markdown dialect returned by the generation
//! service into typed display nodes. Recognized forms: blank lines,
//! `###`/`####` headings, `-`/`•` bullets, numbered items, and `**bold**`
//! spans. Everything else is literal text: nodes never carry HTML, links,
//! or anything executable, no matter what the generation service returns.

use serde::Serialize;

/// One inline run of text. `bold` marks a `**`-delimited span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Span {
    pub text: String,
    pub bold: bool,
}

impl Span {
    fn literal(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: false,
        }
    }

    fn bold(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: true,
        }
    }
}

/// A display node produced from one input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Node {
    Spacer,
    Heading { spans: Vec<Span> },
    SubHeading { spans: Vec<Span> },
    Bullet { spans: Vec<Span> },
    /// Rendered indented; the leading number is kept as literal text and
    /// never re-parsed.
    Numbered { spans: Vec<Span> },
    Paragraph { spans: Vec<Span> },
}

/// Renders markdown-subset text line by line. Stateless: each line maps to
/// exactly one node, classified in a fixed priority order.
pub fn render(text: &str) -> Vec<Node> {
    text.lines().map(render_line).collect()
}

fn render_line(line: &str) -> Node {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Node::Spacer;
    }
    // `####` must be tested before `###` - the longer prefix wins.
    if let Some(rest) = trimmed.strip_prefix("####") {
        return Node::SubHeading {
            spans: parse_inline(rest.trim_start()),
        };
    }
    if let Some(rest) = trimmed.strip_prefix("###") {
        return Node::Heading {
            spans: parse_inline(rest.trim_start()),
        };
    }
    if let Some(rest) = trimmed
        .strip_prefix('-')
        .or_else(|| trimmed.strip_prefix('•'))
    {
        return Node::Bullet {
            spans: parse_inline(rest.trim_start()),
        };
    }
    if is_numbered(trimmed) {
        return Node::Numbered {
            spans: parse_inline(trimmed),
        };
    }
    Node::Paragraph {
        spans: parse_inline(trimmed),
    }
}

/// `^\d+\.` - one or more digits followed by a dot.
fn is_numbered(line: &str) -> bool {
    let digits: usize = line.chars().take_while(|c| c.is_ascii_digit()).count();
    digits > 0 && line[digits..].starts_with('.')
}

/// Splits a line on `**` delimiters. Segments between a matched pair are
/// emphasized; everything else is literal, an unmatched trailing delimiter
/// included.
fn parse_inline(text: &str) -> Vec<Span> {
    let parts: Vec<&str> = text.split("**").collect();
    let mut spans = Vec::new();
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        let closed = i % 2 == 1 && i < parts.len() - 1;
        if closed {
            spans.push(Span::bold(part));
        } else {
            spans.push(Span::literal(part));
        }
    }
    spans
}
