//! Ebook data model and the defaulting adapter over loosely-typed records.

use crate::config::Locale;
use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback title when the record carries none.
pub const DEFAULT_TITLE: &str = "Untitled";

/// Fallback author when the record carries none.
pub const DEFAULT_AUTHOR: &str = "Anonymous";

/// Chapter role, which drives heading display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChapterKind {
    /// Opening chapter, shown without a "Chapter N" prefix.
    Introduction,
    /// Closing chapter, shown without a "Chapter N" prefix.
    Conclusion,
    /// Ordinary numbered chapter.
    #[default]
    Chapter,
}

impl ChapterKind {
    fn from_str(s: &str) -> Self {
        match s {
            "introduction" => ChapterKind::Introduction,
            "conclusion" => ChapterKind::Conclusion,
            _ => ChapterKind::Chapter,
        }
    }
}

/// One chapter of an ebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chapter {
    /// Display ordinal; 0 conventionally denotes an introduction.
    pub number: i64,

    /// Chapter title.
    pub title: String,

    /// Chapter role.
    #[serde(default, rename = "type")]
    pub kind: ChapterKind,

    /// Raw body text. Paragraphs are separated by blank lines and may
    /// carry section markers (see [`crate::markup`]).
    #[serde(default)]
    pub content: String,
}

impl Chapter {
    /// Heading shown on the chapter's own page. Introductions and
    /// conclusions show the bare title; ordinary chapters are prefixed
    /// with the localized "Chapter {number}:".
    pub fn heading(&self, locale: Locale) -> String {
        match self.kind {
            ChapterKind::Introduction | ChapterKind::Conclusion => self.title.clone(),
            ChapterKind::Chapter => locale.chapter_heading(self.number, &self.title),
        }
    }

    /// Short display used in EPUB navigation: "{number}. {title}" for
    /// ordinary chapters, bare title otherwise.
    pub fn nav_title(&self) -> String {
        match self.kind {
            ChapterKind::Introduction | ChapterKind::Conclusion => self.title.clone(),
            ChapterKind::Chapter => format!("{}. {}", self.number, self.title),
        }
    }
}

/// Supplemental table-of-contents data, index-aligned with chapters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TocEntry {
    /// Subtitles displayed beneath the chapter's TOC line.
    #[serde(default)]
    pub subtitles: Vec<String>,
}

/// Cover metadata.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cover {
    /// Short promotional line shown under the author on the cover.
    #[serde(default)]
    pub tagline: Option<String>,
}

/// Legal front-matter pages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LegalPages {
    /// Copyright page text, one centered line per source line.
    #[serde(default)]
    pub copyright_page: Option<String>,

    /// Legal mentions body text.
    #[serde(default)]
    pub legal_mentions: Option<String>,

    /// ISBN, if one was assigned.
    #[serde(default)]
    pub isbn: Option<String>,
}

impl LegalPages {
    /// True when there is nothing to render.
    pub fn is_empty(&self) -> bool {
        self.copyright_page.as_deref().is_none_or(str::is_empty)
            && self.legal_mentions.as_deref().is_none_or(str::is_empty)
    }
}

/// A fully-defaulted, render-ready ebook record.
///
/// Produced by [`Ebook::from_value`] from the loosely-typed document
/// store shape; every renderer consumes this and nothing else.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ebook {
    /// Record identifier, used for the EPUB package identifier.
    #[serde(default)]
    pub id: Option<String>,

    /// Book title.
    pub title: String,

    /// Author display name.
    pub author: String,

    /// Back-cover description.
    #[serde(default)]
    pub description: Option<String>,

    /// Cover metadata.
    #[serde(default)]
    pub cover: Cover,

    /// Supplemental TOC subtitles, index-aligned with `chapters`.
    #[serde(default)]
    pub toc: Vec<TocEntry>,

    /// Legal front matter.
    #[serde(default)]
    pub legal_pages: LegalPages,

    /// Chapters in rendering order.
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

impl Ebook {
    /// Build a render-ready record from a loosely-typed JSON value.
    ///
    /// Missing optional fields default silently; only structural
    /// corruption of a chapter entry is an error.
    pub fn from_value(value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| ExportError::MalformedRecord("not a JSON object".into()))?;

        let id = obj
            .get("_id")
            .or_else(|| obj.get("id"))
            .and_then(string_field);

        let title = obj
            .get("title")
            .and_then(string_field)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let author = obj
            .get("author")
            .and_then(string_field)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_AUTHOR.to_string());

        let description = obj
            .get("description")
            .and_then(string_field)
            .filter(|s| !s.is_empty());

        let cover = Cover {
            tagline: obj
                .get("cover")
                .and_then(Value::as_object)
                .and_then(|c| c.get("tagline"))
                .and_then(string_field)
                .filter(|s| !s.is_empty()),
        };

        let toc = obj
            .get("toc")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .map(|entry| TocEntry {
                        subtitles: entry
                            .get("subtitles")
                            .and_then(Value::as_array)
                            .map(|subs| subs.iter().filter_map(string_field).collect())
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let legal = obj.get("legal_pages").and_then(Value::as_object);
        let legal_pages = LegalPages {
            copyright_page: legal
                .and_then(|l| l.get("copyright_page"))
                .and_then(string_field)
                .filter(|s| !s.is_empty()),
            legal_mentions: legal
                .and_then(|l| l.get("legal_mentions"))
                .and_then(string_field)
                .filter(|s| !s.is_empty()),
            isbn: legal
                .and_then(|l| l.get("isbn"))
                .and_then(string_field)
                .filter(|s| !s.is_empty()),
        };

        let chapters = match obj.get("chapters") {
            Some(Value::Array(entries)) => entries
                .iter()
                .enumerate()
                .map(|(index, entry)| parse_chapter(index, entry))
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(Self {
            id,
            title,
            author,
            description,
            cover,
            toc,
            legal_pages,
            chapters,
        })
    }

    /// Subtitles for the chapter at `index`, if supplemental TOC data
    /// covers it.
    pub fn toc_subtitles(&self, index: usize) -> &[String] {
        self.toc
            .get(index)
            .map(|entry| entry.subtitles.as_slice())
            .unwrap_or(&[])
    }
}

fn parse_chapter(index: usize, entry: &Value) -> Result<Chapter> {
    let obj = entry.as_object().ok_or_else(|| ExportError::MalformedChapter {
        index,
        reason: "not an object".into(),
    })?;

    let number = obj.get("number").and_then(Value::as_i64);
    let title = obj.get("title").and_then(string_field);

    if number.is_none() && title.is_none() {
        return Err(ExportError::MalformedChapter {
            index,
            reason: "missing both number and title".into(),
        });
    }

    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .map(ChapterKind::from_str)
        .unwrap_or_default();

    Ok(Chapter {
        number: number.unwrap_or(0),
        title: title.unwrap_or_default(),
        kind,
        content: obj.get("content").and_then(string_field).unwrap_or_default(),
    })
}

fn string_field(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}
