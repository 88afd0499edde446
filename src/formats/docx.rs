//! DOCX renderer.
//!
//! A DOCX file is a ZIP container of WordprocessingML parts. The fixed
//! parts (content types, relationships, style definitions) are constant;
//! `word/document.xml` is generated per book with quick-xml events.
//!
//! Body paragraphs are emitted as plain text runs: inline emphasis is
//! not reproduced in this format, and the table of contents shows
//! "{number}. {title}" for every chapter type. Both are documented
//! product behavior carried over from the original exporter.

use crate::config::Locale;
use crate::ebook::Ebook;
use crate::error::Result;
use crate::formats::Renderer;
use crate::markup::{self, Block};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Cursor, Write as _};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const WPML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
  <Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>
</Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#;

/// Title, heading, and list styles in the palette of the other
/// renderers.
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal">
    <w:name w:val="Normal"/>
    <w:rPr><w:sz w:val="22"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Title">
    <w:name w:val="Title"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:after="300"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="56"/><w:color w:val="3B82F6"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading1">
    <w:name w:val="heading 1"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="32"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="Heading2">
    <w:name w:val="heading 2"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:spacing w:before="200" w:after="100"/><w:outlineLvl w:val="1"/></w:pPr>
    <w:rPr><w:b/><w:sz w:val="28"/></w:rPr>
  </w:style>
  <w:style w:type="paragraph" w:styleId="ListParagraph">
    <w:name w:val="List Paragraph"/>
    <w:basedOn w:val="Normal"/>
    <w:pPr><w:ind w:left="720"/></w:pPr>
  </w:style>
</w:styles>"#;

/// Run formatting applied directly to a paragraph's single text run.
#[derive(Default)]
struct ParaProps {
    style: Option<&'static str>,
    justify: Option<&'static str>,
    italic: bool,
    color: Option<&'static str>,
    /// Font size in half-points.
    size: Option<u32>,
}

/// Handler rendering editable DOCX documents.
pub struct DocxRenderer;

impl Renderer for DocxRenderer {
    fn render(&self, book: &Ebook, locale: Locale) -> Result<Vec<u8>> {
        let document = generate_document(book, locale);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        zip.start_file("[Content_Types].xml", deflated)?;
        zip.write_all(CONTENT_TYPES.as_bytes())?;
        zip.start_file("_rels/.rels", deflated)?;
        zip.write_all(ROOT_RELS.as_bytes())?;
        zip.start_file("word/_rels/document.xml.rels", deflated)?;
        zip.write_all(DOCUMENT_RELS.as_bytes())?;
        zip.start_file("word/styles.xml", deflated)?;
        zip.write_all(STYLES.as_bytes())?;
        zip.start_file("word/document.xml", deflated)?;
        zip.write_all(document.as_bytes())?;

        Ok(zip.finish()?.into_inner())
    }
}

fn generate_document(book: &Ebook, locale: Locale) -> String {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    let _ = writer.write_event(Event::Decl(BytesDecl::new(
        "1.0",
        Some("UTF-8"),
        Some("yes"),
    )));

    let mut document = BytesStart::new("w:document");
    document.push_attribute(("xmlns:w", WPML_NS));
    let _ = writer.write_event(Event::Start(document));
    let _ = writer.write_event(Event::Start(BytesStart::new("w:body")));

    // Cover block: centered colored title, byline, optional tagline.
    write_paragraph(
        &mut writer,
        &book.title,
        &ParaProps {
            style: Some("Title"),
            justify: Some("center"),
            ..Default::default()
        },
    );
    write_paragraph(
        &mut writer,
        &locale.by_author(&book.author),
        &ParaProps {
            justify: Some("center"),
            color: Some("6B7280"),
            size: Some(28),
            ..Default::default()
        },
    );
    if let Some(tagline) = &book.cover.tagline {
        write_paragraph(
            &mut writer,
            tagline,
            &ParaProps {
                justify: Some("center"),
                italic: true,
                color: Some("F97316"),
                ..Default::default()
            },
        );
    }
    write_page_break(&mut writer);

    // Table of contents: every chapter as "{number}. {title}".
    write_paragraph(
        &mut writer,
        locale.toc_heading(),
        &ParaProps {
            style: Some("Heading1"),
            ..Default::default()
        },
    );
    for chapter in &book.chapters {
        write_paragraph(
            &mut writer,
            &format!("{}. {}", chapter.number, chapter.title),
            &ParaProps {
                style: Some("ListParagraph"),
                ..Default::default()
            },
        );
    }
    write_page_break(&mut writer);

    for chapter in &book.chapters {
        write_paragraph(
            &mut writer,
            &chapter.heading(locale),
            &ParaProps {
                style: Some("Heading1"),
                color: Some("8B5CF6"),
                ..Default::default()
            },
        );

        for block in markup::normalize(&chapter.content) {
            match block {
                Block::Subtitle(text) => write_paragraph(
                    &mut writer,
                    &text,
                    &ParaProps {
                        style: Some("Heading2"),
                        color: Some("1E40AF"),
                        ..Default::default()
                    },
                ),
                Block::Paragraph(_) => write_paragraph(
                    &mut writer,
                    &block.plain_text(),
                    &ParaProps {
                        justify: Some("both"),
                        ..Default::default()
                    },
                ),
            }
        }
        write_page_break(&mut writer);
    }

    // A4 page size in twentieths of a point.
    let _ = writer.write_event(Event::Start(BytesStart::new("w:sectPr")));
    let mut pg_sz = BytesStart::new("w:pgSz");
    pg_sz.push_attribute(("w:w", "11906"));
    pg_sz.push_attribute(("w:h", "16838"));
    let _ = writer.write_event(Event::Empty(pg_sz));
    let _ = writer.write_event(Event::End(BytesEnd::new("w:sectPr")));

    let _ = writer.write_event(Event::End(BytesEnd::new("w:body")));
    let _ = writer.write_event(Event::End(BytesEnd::new("w:document")));

    String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
}

fn write_paragraph<W: std::io::Write>(writer: &mut Writer<W>, text: &str, props: &ParaProps) {
    let _ = writer.write_event(Event::Start(BytesStart::new("w:p")));

    if props.style.is_some() || props.justify.is_some() {
        let _ = writer.write_event(Event::Start(BytesStart::new("w:pPr")));
        if let Some(style) = props.style {
            let mut elem = BytesStart::new("w:pStyle");
            elem.push_attribute(("w:val", style));
            let _ = writer.write_event(Event::Empty(elem));
        }
        if let Some(justify) = props.justify {
            let mut elem = BytesStart::new("w:jc");
            elem.push_attribute(("w:val", justify));
            let _ = writer.write_event(Event::Empty(elem));
        }
        let _ = writer.write_event(Event::End(BytesEnd::new("w:pPr")));
    }

    let _ = writer.write_event(Event::Start(BytesStart::new("w:r")));

    if props.italic || props.color.is_some() || props.size.is_some() {
        let _ = writer.write_event(Event::Start(BytesStart::new("w:rPr")));
        if props.italic {
            let _ = writer.write_event(Event::Empty(BytesStart::new("w:i")));
        }
        if let Some(color) = props.color {
            let mut elem = BytesStart::new("w:color");
            elem.push_attribute(("w:val", color));
            let _ = writer.write_event(Event::Empty(elem));
        }
        if let Some(size) = props.size {
            let mut elem = BytesStart::new("w:sz");
            elem.push_attribute(("w:val", size.to_string().as_str()));
            let _ = writer.write_event(Event::Empty(elem));
        }
        let _ = writer.write_event(Event::End(BytesEnd::new("w:rPr")));
    }

    let mut t = BytesStart::new("w:t");
    t.push_attribute(("xml:space", "preserve"));
    let _ = writer.write_event(Event::Start(t));
    let _ = writer.write_event(Event::Text(BytesText::new(text)));
    let _ = writer.write_event(Event::End(BytesEnd::new("w:t")));

    let _ = writer.write_event(Event::End(BytesEnd::new("w:r")));
    let _ = writer.write_event(Event::End(BytesEnd::new("w:p")));
}

fn write_page_break<W: std::io::Write>(writer: &mut Writer<W>) {
    let _ = writer.write_event(Event::Start(BytesStart::new("w:p")));
    let _ = writer.write_event(Event::Start(BytesStart::new("w:r")));
    let mut br = BytesStart::new("w:br");
    br.push_attribute(("w:type", "page"));
    let _ = writer.write_event(Event::Empty(br));
    let _ = writer.write_event(Event::End(BytesEnd::new("w:r")));
    let _ = writer.write_event(Event::End(BytesEnd::new("w:p")));
}
