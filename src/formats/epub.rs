//! EPUB renderer.
//!
//! Packages one XHTML sub-document per chapter with an OPF package
//! document and NCX navigation into the standard ZIP container. The
//! package identifier is derived deterministically from the record so
//! repeated renders produce identical bytes.

use crate::config::Locale;
use crate::ebook::{Chapter, Ebook};
use crate::error::Result;
use crate::formats::Renderer;
use crate::markup::{self, Block, SpanStyle};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::fmt::Write as _;
use std::io::{Cursor, Write as _};
use uuid::Uuid;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// ISBN placeholder used upstream when none was assigned.
const ISBN_UNASSIGNED: &str = "Non attribué";

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const STYLESHEET: &str = r#"body {
  font-family: Cambria, "Liberation Serif", Georgia, "Times New Roman", serif;
  line-height: 1.6;
  margin: 5%;
}
h1 {
  text-align: left;
  font-weight: 200;
  color: #3B82F6;
  margin-bottom: 1em;
}
h2 {
  color: #8B5CF6;
  margin-top: 1.5em;
  margin-bottom: 0.5em;
}
p {
  text-align: justify;
  margin-bottom: 1em;
}
"#;

/// One spine entry: output path, manifest id, navigation label, body.
struct SpineDoc {
    href: String,
    id: String,
    label: String,
    xhtml: String,
}

/// Handler rendering packaged EPUB books.
pub struct EpubRenderer;

impl Renderer for EpubRenderer {
    fn render(&self, book: &Ebook, locale: Locale) -> Result<Vec<u8>> {
        let identifier = package_identifier(book);
        let docs = build_spine(book, locale);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let stored = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        let deflated = SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        // The mimetype entry must come first and stay uncompressed.
        zip.start_file("mimetype", stored)?;
        zip.write_all(b"application/epub+zip")?;

        zip.start_file("META-INF/container.xml", deflated)?;
        zip.write_all(CONTAINER_XML.as_bytes())?;

        zip.start_file("OEBPS/content.opf", deflated)?;
        zip.write_all(generate_opf(book, locale, &identifier, &docs).as_bytes())?;

        zip.start_file("OEBPS/toc.ncx", deflated)?;
        zip.write_all(generate_ncx(book, &identifier, &docs).as_bytes())?;

        zip.start_file("OEBPS/style/book.css", deflated)?;
        zip.write_all(STYLESHEET.as_bytes())?;

        for doc in &docs {
            zip.start_file(format!("OEBPS/{}", doc.href), deflated)?;
            zip.write_all(doc.xhtml.as_bytes())?;
        }

        Ok(zip.finish()?.into_inner())
    }
}

/// Deterministic package identifier: the record id when present,
/// otherwise a v5 UUID over title and author.
fn package_identifier(book: &Ebook) -> String {
    let seed = book
        .id
        .clone()
        .unwrap_or_else(|| format!("{}:{}", book.title, book.author));
    format!("urn:uuid:{}", Uuid::new_v5(&Uuid::NAMESPACE_URL, seed.as_bytes()))
}

fn build_spine(book: &Ebook, locale: Locale) -> Vec<SpineDoc> {
    let mut docs = Vec::new();

    // Legal front matter leads the spine when present.
    if !book.legal_pages.is_empty() {
        let label = locale.legal_information_heading().to_string();
        docs.push(SpineDoc {
            href: "legal.xhtml".into(),
            id: "legal".into(),
            xhtml: legal_xhtml(book, locale),
            label,
        });
    }

    for (idx, chapter) in book.chapters.iter().enumerate() {
        docs.push(SpineDoc {
            href: format!("chap_{}.xhtml", idx + 1),
            id: format!("chap_{}", idx + 1),
            label: chapter.nav_title(),
            xhtml: chapter_xhtml(chapter, locale),
        });
    }

    docs
}

fn xhtml_document(title: &str, locale: Locale, body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html>
<html xmlns="http://www.w3.org/1999/xhtml" lang="{lang}" xml:lang="{lang}">
<head>
  <title>{title}</title>
  <link rel="stylesheet" type="text/css" href="style/book.css"/>
</head>
<body>
{body}</body>
</html>
"#,
        lang = locale.language_tag(),
        title = escape_xml(title),
        body = body,
    )
}

fn chapter_xhtml(chapter: &Chapter, locale: Locale) -> String {
    let mut body = String::new();
    let _ = writeln!(body, "<h1>{}</h1>", escape_xml(&chapter.nav_title()));

    for block in markup::normalize(&chapter.content) {
        match block {
            Block::Subtitle(text) => {
                let _ = writeln!(body, "<h2>{}</h2>", escape_xml(&text));
            }
            Block::Paragraph(spans) => {
                body.push_str("<p>");
                for span in &spans {
                    match span.style {
                        SpanStyle::Regular => body.push_str(&escape_xml(&span.text)),
                        SpanStyle::Bold => {
                            let _ = write!(body, "<strong>{}</strong>", escape_xml(&span.text));
                        }
                        SpanStyle::Italic => {
                            let _ = write!(body, "<em>{}</em>", escape_xml(&span.text));
                        }
                    }
                }
                body.push_str("</p>\n");
            }
        }
    }

    xhtml_document(&chapter.nav_title(), locale, &body)
}

fn legal_xhtml(book: &Ebook, locale: Locale) -> String {
    let mut body = String::new();
    let _ = writeln!(
        body,
        "<h1>{}</h1>",
        escape_xml(locale.legal_information_heading())
    );

    if let Some(copyright) = &book.legal_pages.copyright_page {
        body.push_str("<div style=\"text-align: center; margin: 2em 0;\">\n");
        for line in copyright.lines().filter(|l| !l.trim().is_empty()) {
            let _ = writeln!(body, "<p>{}</p>", escape_xml(line.trim()));
        }
        body.push_str("</div>\n");
    }

    if let Some(mentions) = &book.legal_pages.legal_mentions {
        let _ = writeln!(
            body,
            "<h2>{}</h2>",
            escape_xml(locale.legal_mentions_heading())
        );
        for line in mentions.lines().filter(|l| !l.trim().is_empty()) {
            let _ = writeln!(body, "<p>{}</p>", escape_xml(line.trim()));
        }
    }

    xhtml_document(locale.legal_information_heading(), locale, &body)
}

fn generate_opf(book: &Ebook, locale: Locale, identifier: &str, docs: &[SpineDoc]) -> String {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)));

    let mut package = BytesStart::new("package");
    package.push_attribute(("xmlns", "http://www.idpf.org/2007/opf"));
    package.push_attribute(("version", "2.0"));
    package.push_attribute(("unique-identifier", "BookId"));
    let _ = writer.write_event(Event::Start(package));

    let mut metadata = BytesStart::new("metadata");
    metadata.push_attribute(("xmlns:dc", "http://purl.org/dc/elements/1.1/"));
    metadata.push_attribute(("xmlns:opf", "http://www.idpf.org/2007/opf"));
    let _ = writer.write_event(Event::Start(metadata));

    write_text_element(&mut writer, "dc:title", &book.title);

    let mut id_elem = BytesStart::new("dc:identifier");
    id_elem.push_attribute(("id", "BookId"));
    let _ = writer.write_event(Event::Start(id_elem));
    let _ = writer.write_event(Event::Text(BytesText::new(identifier)));
    let _ = writer.write_event(Event::End(BytesEnd::new("dc:identifier")));

    write_text_element(&mut writer, "dc:language", locale.language_tag());
    write_text_element(&mut writer, "dc:creator", &book.author);

    if let Some(description) = &book.description {
        write_text_element(&mut writer, "dc:description", description);
    }

    if let Some(isbn) = &book.legal_pages.isbn
        && isbn != ISBN_UNASSIGNED
    {
        let mut isbn_elem = BytesStart::new("dc:identifier");
        isbn_elem.push_attribute(("opf:scheme", "ISBN"));
        let _ = writer.write_event(Event::Start(isbn_elem));
        let _ = writer.write_event(Event::Text(BytesText::new(isbn)));
        let _ = writer.write_event(Event::End(BytesEnd::new("dc:identifier")));
    }

    let _ = writer.write_event(Event::End(BytesEnd::new("metadata")));

    let _ = writer.write_event(Event::Start(BytesStart::new("manifest")));
    write_manifest_item(&mut writer, "ncx", "toc.ncx", "application/x-dtbncx+xml");
    write_manifest_item(&mut writer, "css", "style/book.css", "text/css");
    for doc in docs {
        write_manifest_item(&mut writer, &doc.id, &doc.href, "application/xhtml+xml");
    }
    let _ = writer.write_event(Event::End(BytesEnd::new("manifest")));

    let mut spine = BytesStart::new("spine");
    spine.push_attribute(("toc", "ncx"));
    let _ = writer.write_event(Event::Start(spine));
    for doc in docs {
        let mut itemref = BytesStart::new("itemref");
        itemref.push_attribute(("idref", doc.id.as_str()));
        let _ = writer.write_event(Event::Empty(itemref));
    }
    let _ = writer.write_event(Event::End(BytesEnd::new("spine")));

    let _ = writer.write_event(Event::End(BytesEnd::new("package")));

    String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
}

fn generate_ncx(book: &Ebook, identifier: &str, docs: &[SpineDoc]) -> String {
    let mut ncx = String::new();
    let _ = write!(
        ncx,
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
    <meta name="dtb:uid" content="{uid}"/>
    <meta name="dtb:depth" content="1"/>
    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
    <text>{title}</text>
  </docTitle>
  <navMap>
"#,
        uid = escape_xml(identifier),
        title = escape_xml(&book.title),
    );

    for (order, doc) in docs.iter().enumerate() {
        let play_order = order + 1;
        let _ = write!(
            ncx,
            "    <navPoint id=\"navpoint-{play_order}\" playOrder=\"{play_order}\">\n      <navLabel>\n        <text>{}</text>\n      </navLabel>\n      <content src=\"{}\"/>\n    </navPoint>\n",
            escape_xml(&doc.label),
            escape_xml(&doc.href),
        );
    }

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_text_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, text: &str) {
    let _ = writer.write_event(Event::Start(BytesStart::new(name)));
    let _ = writer.write_event(Event::Text(BytesText::new(text)));
    let _ = writer.write_event(Event::End(BytesEnd::new(name)));
}

fn write_manifest_item<W: std::io::Write>(writer: &mut Writer<W>, id: &str, href: &str, media: &str) {
    let mut item = BytesStart::new("item");
    item.push_attribute(("id", id));
    item.push_attribute(("href", href));
    item.push_attribute(("media-type", media));
    let _ = writer.write_event(Event::Empty(item));
}

pub(crate) fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
