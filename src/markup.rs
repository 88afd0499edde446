//! Chapter body normalization.
//!
//! Chapter content arrives as free-form text with an in-house section
//! marker convention: paragraphs separated by blank lines, `🔹` or
//! `##` prefixes for sub-section headings, and `**bold**` / `*italic*`
//! inline emphasis. This module converts one chapter body into an
//! ordered block sequence that every renderer consumes identically.

/// Reserved glyph marking a sub-section heading.
pub const SECTION_MARKER: char = '\u{1F539}';

/// A heading-like candidate longer than this is kept as body text.
const SUBTITLE_MAX_CHARS: usize = 100;

/// Inline emphasis applied to a span of paragraph text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStyle {
    /// No emphasis.
    Regular,
    /// Double-asterisk span.
    Bold,
    /// Single-asterisk span.
    Italic,
}

/// A run of paragraph text with a single style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    /// Emphasis-marker-free text.
    pub text: String,
    /// Style of this run.
    pub style: SpanStyle,
}

impl Span {
    fn regular(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::Regular,
        }
    }
}

/// One normalized block of a chapter body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Sub-section heading, marker stripped.
    Subtitle(String),
    /// Flowing body paragraph as styled runs.
    Paragraph(Vec<Span>),
}

impl Block {
    /// Marker-free text of the block.
    pub fn plain_text(&self) -> String {
        match self {
            Block::Subtitle(text) => text.clone(),
            Block::Paragraph(spans) => spans.iter().map(|s| s.text.as_str()).collect(),
        }
    }
}

/// Split a chapter body into normalized blocks.
///
/// Total over any input: an unrecognized candidate always falls back to
/// a plain paragraph, and empty candidates are dropped.
pub fn normalize(content: &str) -> Vec<Block> {
    split_candidates(content)
        .into_iter()
        .filter_map(|candidate| classify(candidate.trim()))
        .collect()
}

/// Split on blank-line boundaries (lines containing only whitespace).
fn split_candidates(content: &str) -> Vec<String> {
    let mut candidates = Vec::new();
    let mut current = String::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                candidates.push(std::mem::take(&mut current));
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.is_empty() {
        candidates.push(current);
    }

    candidates
}

fn classify(candidate: &str) -> Option<Block> {
    if candidate.is_empty() {
        return None;
    }

    // Section marker convention.
    if candidate.starts_with(SECTION_MARKER) {
        let text: String = candidate.replace(SECTION_MARKER, "");
        return Some(Block::Subtitle(collapse_newlines(text.trim())));
    }

    // Legacy heading convention and stray # artifacts.
    if candidate.starts_with('#') {
        let stripped = candidate.trim_start_matches('#');
        if stripped.starts_with(char::is_whitespace) {
            return Some(Block::Subtitle(collapse_newlines(stripped.trim())));
        }

        // Not a well-formed heading. Short text without an early
        // sentence break still reads as a heading; anything else is a
        // stray formatting artifact kept as body text.
        let clean = stripped.trim();
        let early: String = clean.chars().take(20).collect();
        if clean.chars().count() < SUBTITLE_MAX_CHARS && !early.contains(". ") {
            return Some(Block::Subtitle(collapse_newlines(clean)));
        }
        return Some(Block::Paragraph(parse_spans(&collapse_newlines(clean))));
    }

    Some(Block::Paragraph(parse_spans(&collapse_newlines(candidate))))
}

/// Soft line breaks inside a block are rendered as flowing text.
fn collapse_newlines(text: &str) -> String {
    text.replace('\n', " ")
}

/// Split paragraph text into styled runs on `**bold**` and `*italic*`
/// markers. Unterminated markers stay in the text verbatim.
fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '*' {
            let double = chars.get(i + 1) == Some(&'*');
            let (marker_len, style) = if double {
                (2, SpanStyle::Bold)
            } else {
                (1, SpanStyle::Italic)
            };

            if let Some(end) = find_closing(&chars, i + marker_len, marker_len) {
                let inner: String = chars[i + marker_len..end].iter().collect();
                if !plain.is_empty() {
                    spans.push(Span::regular(std::mem::take(&mut plain)));
                }
                if !inner.is_empty() {
                    spans.push(Span { text: inner, style });
                }
                i = end + marker_len;
                continue;
            }
        }

        plain.push(chars[i]);
        i += 1;
    }

    if !plain.is_empty() {
        spans.push(Span::regular(plain));
    }

    spans
}

fn find_closing(chars: &[char], from: usize, marker_len: usize) -> Option<usize> {
    let mut i = from;
    while i + marker_len <= chars.len() {
        if chars[i..i + marker_len].iter().all(|&c| c == '*')
            && (marker_len == 2 || chars.get(i + 1) != Some(&'*'))
        {
            return Some(i);
        }
        i += 1;
    }
    None
}
