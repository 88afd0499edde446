//! PDF renderer.
//!
//! Builds the page tree and content streams directly with lopdf, using
//! the three base-14 Helvetica faces with WinAnsi encoding. Layout is a
//! simple top-down cursor per page: blocks reserve vertical space, wrap
//! against the text width, and spill onto a fresh page when the cursor
//! reaches the bottom margin.

use crate::config::Locale;
use crate::ebook::Ebook;
use crate::error::{ExportError, Result};
use crate::formats::Renderer;
use crate::markup::{self, Block, Span, SpanStyle};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, StringFormat, dictionary};

// A4 geometry in points, margins from the original layout.
const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN_LEFT: f32 = 72.0;
const MARGIN_RIGHT: f32 = 72.0;
const MARGIN_TOP: f32 = 72.0;
const MARGIN_BOTTOM: f32 = 18.0;
const TEXT_WIDTH: f32 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;

type Rgb = (f32, f32, f32);

const TITLE_BLUE: Rgb = (0.231, 0.510, 0.965); // #3B82F6
const AUTHOR_GRAY: Rgb = (0.420, 0.447, 0.502); // #6B7280
const HEADING_PURPLE: Rgb = (0.545, 0.361, 0.965); // #8B5CF6
const TAGLINE_ORANGE: Rgb = (0.976, 0.451, 0.086); // #F97316
const BLACK: Rgb = (0.0, 0.0, 0.0);

/// Handler rendering paginated PDF documents.
pub struct PdfRenderer;

impl Renderer for PdfRenderer {
    fn render(&self, book: &Ebook, locale: Locale) -> Result<Vec<u8>> {
        let mut page = Composer::new();

        // Cover page.
        page.spacer(144.0);
        page.block(&plain(&book.title), Face::Bold, 24.0, 30.0, TITLE_BLUE, Align::Center);
        page.spacer(36.0);
        page.block(
            &plain(&locale.by_author(&book.author)),
            Face::Regular,
            14.0,
            18.0,
            AUTHOR_GRAY,
            Align::Center,
        );
        if let Some(tagline) = &book.cover.tagline {
            page.spacer(72.0);
            page.block(&plain(tagline), Face::Oblique, 12.0, 16.0, TAGLINE_ORANGE, Align::Center);
        }
        page.page_break();

        // Legal front matter.
        if let Some(copyright) = &book.legal_pages.copyright_page {
            for line in copyright.lines().filter(|l| !l.trim().is_empty()) {
                page.block(&plain(line.trim()), Face::Regular, 10.0, 13.0, BLACK, Align::Center);
                page.spacer(4.0);
            }
            page.page_break();
        }
        if let Some(mentions) = &book.legal_pages.legal_mentions {
            page.block(
                &plain(locale.legal_mentions_heading()),
                Face::Bold,
                18.0,
                24.0,
                HEADING_PURPLE,
                Align::Left,
            );
            page.spacer(14.0);
            for line in mentions.lines().filter(|l| !l.trim().is_empty()) {
                page.block(&plain(line.trim()), Face::Regular, 11.0, 16.0, BLACK, Align::Justify);
                page.spacer(6.0);
            }
            page.page_break();
        }

        // Table of contents.
        page.block(
            &plain(locale.toc_heading()),
            Face::Bold,
            18.0,
            24.0,
            HEADING_PURPLE,
            Align::Left,
        );
        page.spacer(22.0);
        for (idx, chapter) in book.chapters.iter().enumerate() {
            page.block(
                &plain(&chapter.heading(locale)),
                Face::Bold,
                11.0,
                16.0,
                BLACK,
                Align::Left,
            );
            for subtitle in book.toc_subtitles(idx) {
                page.indented_line(
                    &format!("\u{2022} {subtitle}"),
                    9.0,
                    12.0,
                    AUTHOR_GRAY,
                    20.0,
                );
            }
            page.spacer(6.0);
        }
        page.page_break();

        // Chapters. Identical styling for every chapter type; only the
        // heading text differs.
        for chapter in &book.chapters {
            page.block(
                &plain(&chapter.heading(locale)),
                Face::Bold,
                18.0,
                24.0,
                HEADING_PURPLE,
                Align::Left,
            );
            page.spacer(14.0);

            for block in markup::normalize(&chapter.content) {
                match block {
                    Block::Subtitle(text) => {
                        page.spacer(10.0);
                        page.block(
                            &plain(&text),
                            Face::Bold,
                            14.0,
                            19.0,
                            HEADING_PURPLE,
                            Align::Left,
                        );
                        page.spacer(6.0);
                    }
                    Block::Paragraph(spans) => {
                        page.block(&spans, Face::Regular, 11.0, 16.0, BLACK, Align::Justify);
                        page.spacer(12.0);
                    }
                }
            }
            page.page_break();
        }

        page.finish(book)
    }
}

fn plain(text: &str) -> Vec<Span> {
    vec![Span {
        text: text.to_string(),
        style: SpanStyle::Regular,
    }]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
    Oblique,
}

impl Face {
    fn resource(self) -> &'static str {
        match self {
            Face::Regular => "F1",
            Face::Bold => "F2",
            Face::Oblique => "F3",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Face::Regular => "Helvetica",
            Face::Bold => "Helvetica-Bold",
            Face::Oblique => "Helvetica-Oblique",
        }
    }

    fn for_style(style: SpanStyle, default: Face) -> Face {
        match style {
            SpanStyle::Regular => default,
            SpanStyle::Bold => Face::Bold,
            SpanStyle::Italic => Face::Oblique,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Center,
    Justify,
}

/// One wrapped output line: text runs per face, natural width, and the
/// number of inter-word spaces (for justification).
struct Line {
    segments: Vec<(String, Face)>,
    width: f32,
    spaces: usize,
}

/// Top-down page layout cursor accumulating content-stream operations.
struct Composer {
    pages: Vec<Vec<Operation>>,
    current: Vec<Operation>,
    y: f32,
}

impl Composer {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            current: Vec::new(),
            y: PAGE_HEIGHT - MARGIN_TOP,
        }
    }

    fn spacer(&mut self, h: f32) {
        self.y -= h;
    }

    fn page_break(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
        self.y = PAGE_HEIGHT - MARGIN_TOP;
    }

    fn ensure_space(&mut self, h: f32) {
        if self.y - h < MARGIN_BOTTOM {
            self.page_break();
        }
    }

    /// Lay out styled spans as wrapped lines of `size` points.
    fn block(
        &mut self,
        spans: &[Span],
        face: Face,
        size: f32,
        leading: f32,
        color: Rgb,
        align: Align,
    ) {
        let lines = wrap(spans, face, size, TEXT_WIDTH);
        let count = lines.len();
        for (i, line) in lines.into_iter().enumerate() {
            self.ensure_space(leading);
            self.y -= leading;

            let (x, word_spacing) = match align {
                Align::Left => (MARGIN_LEFT, 0.0),
                Align::Center => (MARGIN_LEFT + (TEXT_WIDTH - line.width) / 2.0, 0.0),
                Align::Justify => {
                    // The last line of a justified block stays ragged.
                    let extra = if i + 1 < count && line.spaces > 0 {
                        (TEXT_WIDTH - line.width) / line.spaces as f32
                    } else {
                        0.0
                    };
                    (MARGIN_LEFT, extra)
                }
            };
            self.emit_line(&line, size, color, x, word_spacing);
        }
    }

    /// Single left-aligned line with a horizontal indent (TOC bullets).
    fn indented_line(&mut self, text: &str, size: f32, leading: f32, color: Rgb, indent: f32) {
        for line in wrap(&plain(text), Face::Regular, size, TEXT_WIDTH - indent) {
            self.ensure_space(leading);
            self.y -= leading;
            self.emit_line(&line, size, color, MARGIN_LEFT + indent, 0.0);
        }
    }

    fn emit_line(&mut self, line: &Line, size: f32, color: Rgb, x: f32, word_spacing: f32) {
        self.current.push(Operation::new("BT", vec![]));
        self.current.push(Operation::new(
            "rg",
            vec![color.0.into(), color.1.into(), color.2.into()],
        ));
        self.current
            .push(Operation::new("Tw", vec![word_spacing.into()]));
        self.current
            .push(Operation::new("Td", vec![x.into(), self.y.into()]));
        for (text, face) in &line.segments {
            self.current.push(Operation::new(
                "Tf",
                vec![face.resource().into(), size.into()],
            ));
            self.current.push(Operation::new(
                "Tj",
                vec![Object::String(encode_winansi(text), StringFormat::Literal)],
            ));
        }
        self.current.push(Operation::new("ET", vec![]));
    }

    fn finish(mut self, book: &Ebook) -> Result<Vec<u8>> {
        if !self.current.is_empty() {
            self.page_break();
        }

        let mut doc = Document::with_version("1.5");

        let font_ids: Vec<_> = [Face::Regular, Face::Bold, Face::Oblique]
            .into_iter()
            .map(|face| {
                doc.add_object(dictionary! {
                    "Type" => "Font",
                    "Subtype" => "Type1",
                    "BaseFont" => face.base_font(),
                    "Encoding" => "WinAnsiEncoding",
                })
            })
            .collect();

        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => Object::Reference(font_ids[0]),
                "F2" => Object::Reference(font_ids[1]),
                "F3" => Object::Reference(font_ids[2]),
            },
        });

        let pages_id = doc.new_object_id();
        let mut kids = Vec::new();
        for operations in self.pages.drain(..) {
            let content = Content { operations };
            let encoded = content
                .encode()
                .map_err(|e| ExportError::Pdf(format!("content stream encode: {e}")))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "Contents" => Object::Reference(content_id),
            });
            kids.push(Object::Reference(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => Object::Reference(resources_id),
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    PAGE_WIDTH.into(),
                    PAGE_HEIGHT.into(),
                ],
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        // No CreationDate: renders stay byte-for-byte reproducible.
        let info_id = doc.add_object(dictionary! {
            "Title" => Object::string_literal(book.title.clone()),
            "Author" => Object::string_literal(book.author.clone()),
            "Producer" => Object::string_literal("ebook-export"),
        });
        doc.trailer.set("Info", Object::Reference(info_id));

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| ExportError::Pdf(format!("save: {e}")))?;
        Ok(out)
    }
}

/// Greedy word wrap of styled spans against `max_width` points.
///
/// Wrapping works over whitespace-delimited atoms, where one atom may
/// carry several faces (an emphasized word glued to its punctuation
/// must not be split or padded).
fn wrap(spans: &[Span], default_face: Face, size: f32, max_width: f32) -> Vec<Line> {
    let space_width = char_width(' ') * size / 1000.0;

    let mut lines = Vec::new();
    let mut segments: Vec<(String, Face)> = Vec::new();
    let mut width = 0.0f32;
    let mut spaces = 0usize;

    for atom in atomize(spans, default_face) {
        let atom_width: f32 = atom.iter().map(|(text, _)| text_width(text, size)).sum();

        if !segments.is_empty() && width + space_width + atom_width > max_width {
            lines.push(Line {
                segments: std::mem::take(&mut segments),
                width,
                spaces,
            });
            width = 0.0;
            spaces = 0;
        }

        if !segments.is_empty() {
            spaces += 1;
            width += space_width;
            // Inter-word space stays in the previous run so that
            // justification spacing applies to it.
            if let Some((text, _)) = segments.last_mut() {
                text.push(' ');
            }
        }
        for (text, face) in atom {
            push_run(&mut segments, text, face);
        }
        width += atom_width;
    }

    if !segments.is_empty() {
        lines.push(Line {
            segments,
            width,
            spaces,
        });
    }

    lines
}

/// Flatten styled spans into whitespace-free atoms of (text, face) runs.
fn atomize(spans: &[Span], default_face: Face) -> Vec<Vec<(String, Face)>> {
    let mut atoms = Vec::new();
    let mut current: Vec<(String, Face)> = Vec::new();

    for span in spans {
        let face = Face::for_style(span.style, default_face);
        let mut piece = String::new();
        for c in span.text.chars() {
            if c.is_whitespace() {
                if !piece.is_empty() {
                    push_run(&mut current, std::mem::take(&mut piece), face);
                }
                if !current.is_empty() {
                    atoms.push(std::mem::take(&mut current));
                }
            } else {
                piece.push(c);
            }
        }
        if !piece.is_empty() {
            push_run(&mut current, piece, face);
        }
    }
    if !current.is_empty() {
        atoms.push(current);
    }

    atoms
}

fn push_run(runs: &mut Vec<(String, Face)>, piece: String, face: Face) {
    if let Some((text, last_face)) = runs.last_mut()
        && *last_face == face
    {
        text.push_str(&piece);
        return;
    }
    runs.push((piece, face));
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(char_width).sum::<f32>() * size / 1000.0
}

/// Helvetica advance widths in 1/1000 em for the printable ASCII range.
/// The bold and oblique faces reuse these metrics for wrapping.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

fn char_width(c: char) -> f32 {
    let code = c as u32;
    if (0x20..0x7F).contains(&code) {
        f32::from(HELVETICA_WIDTHS[(code - 0x20) as usize])
    } else {
        556.0
    }
}

/// Encode text for the WinAnsi (CP1252) base-font encoding. Characters
/// outside the code page degrade to '?'.
fn encode_winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => (c as u32) as u8,
            '\u{20AC}' => 0x80,
            '\u{201A}' => 0x82,
            '\u{0192}' => 0x83,
            '\u{201E}' => 0x84,
            '\u{2026}' => 0x85,
            '\u{2020}' => 0x86,
            '\u{2021}' => 0x87,
            '\u{02C6}' => 0x88,
            '\u{2030}' => 0x89,
            '\u{0160}' => 0x8A,
            '\u{2039}' => 0x8B,
            '\u{0152}' => 0x8C,
            '\u{017D}' => 0x8E,
            '\u{2018}' => 0x91,
            '\u{2019}' => 0x92,
            '\u{201C}' => 0x93,
            '\u{201D}' => 0x94,
            '\u{2022}' => 0x95,
            '\u{2013}' => 0x96,
            '\u{2014}' => 0x97,
            '\u{02DC}' => 0x98,
            '\u{2122}' => 0x99,
            '\u{0161}' => 0x9A,
            '\u{203A}' => 0x9B,
            '\u{0153}' => 0x9C,
            '\u{017E}' => 0x9E,
            '\u{0178}' => 0x9F,
            _ => b'?',
        })
        .collect()
}
