use crate::config::Locale;
use crate::ebook::{ChapterKind, Ebook};
use crate::error::ExportError;
use crate::formats::{
    self, DocxRenderer, EpubRenderer, ExportFormat, HtmlRenderer, PdfRenderer, Renderer,
};
use crate::markup::{self, Block, SpanStyle};
use serde_json::json;
use std::io::{Cursor, Read};

fn minimal_record() -> serde_json::Value {
    json!({
        "title": "T",
        "author": "A",
        "chapters": [
            {"number": 1, "title": "C1", "type": "chapter", "content": "Hello world."}
        ]
    })
}

fn minimal_book() -> Ebook {
    Ebook::from_value(&minimal_record()).unwrap()
}

fn full_book() -> Ebook {
    Ebook::from_value(&json!({
        "_id": "abc123",
        "title": "The Art of Tea",
        "author": "A. Writer",
        "description": "A short treatise.",
        "cover": {"tagline": "Steep boldly"},
        "toc": [
            {"subtitles": []},
            {"subtitles": ["Leaves", "Water"]},
            {"subtitles": []}
        ],
        "legal_pages": {
            "copyright_page": "© 2024 A. Writer\nAll rights reserved",
            "legal_mentions": "Published by Nobody\nFirst edition",
            "isbn": "978-0000000000"
        },
        "chapters": [
            {"number": 0, "title": "Foreword", "type": "introduction",
             "content": "Why tea matters."},
            {"number": 1, "title": "Choosing Leaves", "type": "chapter",
             "content": "\u{1F539} Section One\n\nBody text here with **bold** and *italic*."},
            {"number": 2, "title": "Closing Words", "type": "conclusion",
             "content": "## Old Style\n\nSome text."}
        ]
    }))
    .unwrap()
}

fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

fn zip_entry(data: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(data.to_vec())).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

fn zip_names(data: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(data.to_vec())).unwrap();
    archive.file_names().map(String::from).collect()
}

// ---- Source model adapter ----

#[test]
fn adapter_defaults_empty_record() {
    let book = Ebook::from_value(&json!({})).unwrap();
    assert_eq!(book.title, "Untitled");
    assert_eq!(book.author, "Anonymous");
    assert!(book.chapters.is_empty());
    assert!(book.toc.is_empty());
    assert!(book.legal_pages.is_empty());
    assert!(book.cover.tagline.is_none());
}

#[test]
fn adapter_rejects_non_object_record() {
    assert!(matches!(
        Ebook::from_value(&json!([1, 2, 3])),
        Err(ExportError::MalformedRecord(_))
    ));
}

#[test]
fn adapter_rejects_non_object_chapter() {
    let err = Ebook::from_value(&json!({"chapters": [42]})).unwrap_err();
    assert!(matches!(err, ExportError::MalformedChapter { index: 0, .. }));
}

#[test]
fn adapter_rejects_chapter_missing_number_and_title() {
    let err =
        Ebook::from_value(&json!({"chapters": [{"content": "text only"}]})).unwrap_err();
    assert!(matches!(err, ExportError::MalformedChapter { index: 0, .. }));
}

#[test]
fn adapter_accepts_partial_chapter() {
    let book = Ebook::from_value(&json!({
        "chapters": [
            {"number": 3},
            {"title": "Only a Title"}
        ]
    }))
    .unwrap();
    assert_eq!(book.chapters[0].number, 3);
    assert_eq!(book.chapters[0].title, "");
    assert_eq!(book.chapters[1].number, 0);
    assert_eq!(book.chapters[1].title, "Only a Title");
    assert_eq!(book.chapters[1].kind, ChapterKind::Chapter);
}

#[test]
fn adapter_collects_toc_subtitles() {
    let book = full_book();
    assert_eq!(book.toc_subtitles(1), ["Leaves", "Water"]);
    assert!(book.toc_subtitles(0).is_empty());
    assert!(book.toc_subtitles(99).is_empty());
}

// ---- Markup normalizer ----

#[test]
fn normalize_conserves_block_count() {
    let blocks = markup::normalize("First.\n\nSecond.\n\n  \n\nThird.");
    assert_eq!(blocks.len(), 3);
}

#[test]
fn normalize_section_marker_subtitle() {
    let blocks = markup::normalize("\u{1F539} Section One\n\nBody text here.");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0], Block::Subtitle("Section One".into()));
    assert_eq!(blocks[1].plain_text(), "Body text here.");
}

#[test]
fn normalize_legacy_heading_fallback() {
    let blocks = markup::normalize("## Old Style\n\nSome text.");
    assert_eq!(blocks[0], Block::Subtitle("Old Style".into()));
    assert_eq!(blocks[1].plain_text(), "Some text.");
}

#[test]
fn normalize_stray_hash_heuristic() {
    // Short heading-like text without an early sentence break.
    let blocks = markup::normalize("#Stray Heading");
    assert_eq!(blocks[0], Block::Subtitle("Stray Heading".into()));

    // Sentence-shaped text stays a paragraph, hashes stripped.
    let blocks = markup::normalize("#So it began. The rest of the story followed at length.");
    assert!(matches!(blocks[0], Block::Paragraph(_)));
    assert!(!blocks[0].plain_text().contains('#'));
}

#[test]
fn normalize_marker_stripping() {
    for content in ["\u{1F539} Marked", "## Marked", "### Marked", "#Marked"] {
        let blocks = markup::normalize(content);
        let Block::Subtitle(text) = &blocks[0] else {
            panic!("expected subtitle for {content:?}");
        };
        assert!(!text.contains('\u{1F539}'));
        assert!(!text.starts_with('#'));
    }
}

#[test]
fn normalize_inline_emphasis() {
    let blocks = markup::normalize("This is **bold** and *italic*.");
    assert_eq!(blocks.len(), 1);
    let Block::Paragraph(spans) = &blocks[0] else {
        panic!("expected paragraph");
    };
    let styled: Vec<(&str, SpanStyle)> =
        spans.iter().map(|s| (s.text.as_str(), s.style)).collect();
    assert_eq!(
        styled,
        vec![
            ("This is ", SpanStyle::Regular),
            ("bold", SpanStyle::Bold),
            (" and ", SpanStyle::Regular),
            ("italic", SpanStyle::Italic),
            (".", SpanStyle::Regular),
        ]
    );
    assert_eq!(blocks[0].plain_text(), "This is bold and italic.");
}

#[test]
fn normalize_unterminated_marker_stays_verbatim() {
    let blocks = markup::normalize("An *unclosed marker stays.");
    assert_eq!(blocks[0].plain_text(), "An *unclosed marker stays.");
}

#[test]
fn normalize_collapses_soft_line_breaks() {
    let blocks = markup::normalize("line one\nline two\n\nnext block");
    assert_eq!(blocks[0].plain_text(), "line one line two");
    assert_eq!(blocks[1].plain_text(), "next block");
}

#[test]
fn normalize_empty_content_yields_no_blocks() {
    assert!(markup::normalize("").is_empty());
    assert!(markup::normalize("   \n\n \t \n").is_empty());
}

// ---- Heading display rule ----

#[test]
fn chapter_heading_display_rule() {
    let book = full_book();
    assert_eq!(book.chapters[0].heading(Locale::En), "Foreword");
    assert_eq!(book.chapters[1].heading(Locale::En), "Chapter 1: Choosing Leaves");
    assert_eq!(book.chapters[1].heading(Locale::Fr), "Chapitre 1: Choosing Leaves");
    assert_eq!(book.chapters[2].heading(Locale::En), "Closing Words");

    assert_eq!(book.chapters[0].nav_title(), "Foreword");
    assert_eq!(book.chapters[1].nav_title(), "1. Choosing Leaves");
}

// ---- PDF renderer ----

#[test]
fn pdf_renders_minimal_book() {
    let data = PdfRenderer.render(&minimal_book(), Locale::En).unwrap();
    assert!(data.starts_with(b"%PDF"));
    assert!(contains_bytes(&data, b"(T)"));
    assert!(contains_bytes(&data, b"(by A)"));
    assert!(contains_bytes(&data, b"(Chapter 1: C1)"));
    assert!(contains_bytes(&data, b"(Hello world.)"));
}

#[test]
fn pdf_intro_and_conclusion_headings_are_bare() {
    let data = PdfRenderer.render(&full_book(), Locale::En).unwrap();
    assert!(contains_bytes(&data, b"(Foreword)"));
    assert!(contains_bytes(&data, b"(Closing Words)"));
    assert!(!contains_bytes(&data, b"Chapter 0"));
    assert!(!contains_bytes(&data, b"Chapter 2"));
}

#[test]
fn pdf_renders_subtitles_emphasis_and_front_matter() {
    let data = PdfRenderer.render(&full_book(), Locale::En).unwrap();
    assert!(contains_bytes(&data, b"(Section One)"));
    assert!(contains_bytes(&data, b"(Old Style)"));
    assert!(contains_bytes(&data, b"(bold )"));
    assert!(contains_bytes(&data, b"(italic)"));
    assert!(contains_bytes(&data, b"(Legal Mentions)"));
    assert!(contains_bytes(&data, b"(All rights reserved)"));
    assert!(contains_bytes(&data, b"(Steep boldly)"));
    // TOC subtitles render as indented bullet lines.
    assert!(contains_bytes(&data, b" Leaves)"));
    assert!(contains_bytes(&data, b" Water)"));
}

// ---- EPUB renderer ----

#[test]
fn epub_container_layout() {
    let data = EpubRenderer.render(&minimal_book(), Locale::En).unwrap();

    let mut archive = zip::ZipArchive::new(Cursor::new(data.clone())).unwrap();
    assert_eq!(archive.by_index(0).unwrap().name(), "mimetype");

    let names = zip_names(&data);
    assert!(names.contains(&"META-INF/container.xml".to_string()));
    assert!(names.contains(&"OEBPS/content.opf".to_string()));
    assert!(names.contains(&"OEBPS/toc.ncx".to_string()));
    assert!(names.contains(&"OEBPS/style/book.css".to_string()));
    assert!(names.contains(&"OEBPS/chap_1.xhtml".to_string()));
}

#[test]
fn epub_metadata_and_chapter_markup() {
    let data = EpubRenderer.render(&full_book(), Locale::En).unwrap();

    let opf = zip_entry(&data, "OEBPS/content.opf");
    assert!(opf.contains("<dc:title>The Art of Tea</dc:title>"));
    assert!(opf.contains("<dc:creator>A. Writer</dc:creator>"));
    assert!(opf.contains("<dc:language>en</dc:language>"));
    assert!(opf.contains("<dc:description>A short treatise.</dc:description>"));
    assert!(opf.contains("978-0000000000"));
    assert!(opf.contains("urn:uuid:"));

    let chapter = zip_entry(&data, "OEBPS/chap_2.xhtml");
    assert!(chapter.contains("<h1>1. Choosing Leaves</h1>"));
    assert!(chapter.contains("<h2>Section One</h2>"));
    assert!(chapter.contains("<strong>bold</strong>"));
    assert!(chapter.contains("<em>italic</em>"));

    let intro = zip_entry(&data, "OEBPS/chap_1.xhtml");
    assert!(intro.contains("<h1>Foreword</h1>"));
    assert!(!intro.contains("Chapter 0"));
}

#[test]
fn epub_legal_chapter_leads_spine() {
    let data = EpubRenderer.render(&full_book(), Locale::En).unwrap();

    let opf = zip_entry(&data, "OEBPS/content.opf");
    let legal_pos = opf.find("<itemref idref=\"legal\"/>").unwrap();
    let first_chapter_pos = opf.find("<itemref idref=\"chap_1\"/>").unwrap();
    assert!(legal_pos < first_chapter_pos);

    let legal = zip_entry(&data, "OEBPS/legal.xhtml");
    assert!(legal.contains("<h1>Legal Information</h1>"));
    assert!(legal.contains("All rights reserved"));
    assert!(legal.contains("Published by Nobody"));

    let ncx = zip_entry(&data, "OEBPS/toc.ncx");
    assert!(ncx.contains("<text>Legal Information</text>"));
    assert!(ncx.contains("<text>1. Choosing Leaves</text>"));
}

#[test]
fn epub_skips_unassigned_isbn() {
    let book = Ebook::from_value(&json!({
        "title": "T",
        "author": "A",
        "legal_pages": {"copyright_page": "c", "isbn": "Non attribué"},
        "chapters": []
    }))
    .unwrap();
    let data = EpubRenderer.render(&book, Locale::En).unwrap();
    assert!(!zip_entry(&data, "OEBPS/content.opf").contains("Non attribué"));
}

#[test]
fn epub_escapes_xml_metadata() {
    let book = Ebook::from_value(&json!({
        "title": "Salt & Smoke <Vol. 1>",
        "author": "A",
        "chapters": []
    }))
    .unwrap();
    let data = EpubRenderer.render(&book, Locale::En).unwrap();
    let opf = zip_entry(&data, "OEBPS/content.opf");
    assert!(opf.contains("Salt &amp; Smoke &lt;Vol. 1&gt;"));
}

// ---- DOCX renderer ----

#[test]
fn docx_container_and_document() {
    let data = DocxRenderer.render(&minimal_book(), Locale::En).unwrap();

    let names = zip_names(&data);
    assert!(names.contains(&"[Content_Types].xml".to_string()));
    assert!(names.contains(&"_rels/.rels".to_string()));
    assert!(names.contains(&"word/document.xml".to_string()));
    assert!(names.contains(&"word/styles.xml".to_string()));

    let document = zip_entry(&data, "word/document.xml");
    assert!(document.contains(">T</w:t>"));
    assert!(document.contains(">by A</w:t>"));
    assert!(document.contains(">Hello world.</w:t>"));
}

#[test]
fn docx_toc_numbers_every_chapter_type() {
    // The DOCX TOC shows "{number}. {title}" even for the introduction
    // and conclusion; only the per-chapter headings special-case them.
    let data = DocxRenderer.render(&full_book(), Locale::En).unwrap();
    let document = zip_entry(&data, "word/document.xml");

    assert!(document.contains(">0. Foreword</w:t>"));
    assert!(document.contains(">1. Choosing Leaves</w:t>"));
    assert!(document.contains(">2. Closing Words</w:t>"));

    assert!(document.contains(">Foreword</w:t>"));
    assert!(document.contains(">Chapter 1: Choosing Leaves</w:t>"));
    assert!(!document.contains("Chapter 0: Foreword"));
    assert!(!document.contains("Chapter 2: Closing Words"));
}

#[test]
fn docx_paragraphs_are_plain_text() {
    let data = DocxRenderer.render(&full_book(), Locale::En).unwrap();
    let document = zip_entry(&data, "word/document.xml");

    // Emphasis markers are stripped but not converted to runs.
    assert!(document.contains(">Body text here with bold and italic.</w:t>"));
    assert!(!document.contains("**"));
    // Subtitles become Heading2 paragraphs.
    assert!(document.contains("w:val=\"Heading2\""));
    assert!(document.contains(">Section One</w:t>"));
}

// ---- HTML flipbook renderer ----

#[test]
fn html_flipbook_structure() {
    let data = HtmlRenderer.render(&full_book(), Locale::En).unwrap();
    let html = String::from_utf8(data).unwrap();

    // Cover, TOC, and chapter pages; chapter i lives on page i + 2.
    assert!(html.contains("<div class=\"page active\" id=\"page-0\">"));
    assert!(html.contains("<div class=\"page\" id=\"page-1\">"));
    assert!(html.contains("onclick=\"goToPage(2)\""));
    assert!(html.contains("onclick=\"goToPage(4)\""));
    assert!(html.contains("const totalPages = 5;"));

    assert!(html.contains("<h1>The Art of Tea</h1>"));
    assert!(html.contains("by A. Writer"));
    assert!(html.contains("<div class=\"tagline\">Steep boldly</div>"));

    assert!(html.contains("<h1>Foreword</h1>"));
    assert!(html.contains("<h1>Chapter 1: Choosing Leaves</h1>"));
    assert!(html.contains("<h2>Section One</h2>"));
    // Plain paragraphs, no emphasis conversion in this renderer.
    assert!(html.contains("<p>Body text here with bold and italic.</p>"));

    assert!(html.contains("id=\"prevBtn\""));
    assert!(html.contains("id=\"nextBtn\""));
    assert!(html.contains("ArrowRight"));
}

#[test]
fn html_escapes_dynamic_text() {
    let book = Ebook::from_value(&json!({
        "title": "Salt & Smoke <Vol. 1>",
        "author": "A",
        "chapters": [{"number": 1, "title": "a < b", "content": "x & y"}]
    }))
    .unwrap();
    let data = HtmlRenderer.render(&book, Locale::En).unwrap();
    let html = String::from_utf8(data).unwrap();
    assert!(html.contains("Salt &amp; Smoke &lt;Vol. 1&gt;"));
    assert!(html.contains("<p>x &amp; y</p>"));
}

#[test]
fn html_uses_french_strings() {
    let data = HtmlRenderer.render(&minimal_book(), Locale::Fr).unwrap();
    let html = String::from_utf8(data).unwrap();
    assert!(html.contains("par A"));
    assert!(html.contains("Table des Matières"));
    assert!(html.contains("<html lang=\"fr\">"));
}

// ---- Export dispatch ----

#[test]
fn export_minimal_book_all_formats() {
    let book = minimal_book();
    for format in [
        ExportFormat::Pdf,
        ExportFormat::Epub,
        ExportFormat::Docx,
        ExportFormat::Html,
    ] {
        let result = formats::export(&book, format, Locale::En).unwrap();
        assert!(!result.data.is_empty());
        assert_eq!(result.mime_type, format.mime_type());
        assert!(result.advisory.is_none());
    }
}

#[test]
fn export_mobi_degrades_to_epub_with_advisory() {
    let book = minimal_book();
    let epub = formats::export(&book, ExportFormat::Epub, Locale::En).unwrap();
    let mobi = formats::export(&book, ExportFormat::Mobi, Locale::En).unwrap();

    assert_eq!(mobi.data, epub.data);
    assert_eq!(mobi.mime_type, "application/epub+zip");
    assert_eq!(mobi.advisory, Some(formats::MOBI_ADVISORY));
}

#[test]
fn exports_are_idempotent() {
    let book = full_book();
    for format in [
        ExportFormat::Pdf,
        ExportFormat::Epub,
        ExportFormat::Docx,
        ExportFormat::Html,
    ] {
        let first = formats::export(&book, format, Locale::En).unwrap();
        let second = formats::export(&book, format, Locale::En).unwrap();
        assert_eq!(first.data, second.data, "{format:?} output not idempotent");
    }
}

#[test]
fn export_degrades_gracefully_without_optionals() {
    // No legal pages, no TOC subtitles, no tagline: the corresponding
    // sections are omitted, nothing fails.
    let book = minimal_book();

    let pdf = PdfRenderer.render(&book, Locale::En).unwrap();
    assert!(!contains_bytes(&pdf, b"Legal Mentions"));

    let epub = EpubRenderer.render(&book, Locale::En).unwrap();
    assert!(!zip_names(&epub).contains(&"OEBPS/legal.xhtml".to_string()));

    let html = String::from_utf8(HtmlRenderer.render(&book, Locale::En).unwrap()).unwrap();
    assert!(!html.contains("class=\"tagline\""));

    DocxRenderer.render(&book, Locale::En).unwrap();
}

#[test]
fn empty_chapter_body_renders_heading_only() {
    let book = Ebook::from_value(&json!({
        "title": "T",
        "author": "A",
        "chapters": [{"number": 1, "title": "Silent", "content": ""}]
    }))
    .unwrap();

    let epub = EpubRenderer.render(&book, Locale::En).unwrap();
    let chapter = zip_entry(&epub, "OEBPS/chap_1.xhtml");
    assert!(chapter.contains("<h1>1. Silent</h1>"));
    assert!(!chapter.contains("<p>"));

    PdfRenderer.render(&book, Locale::En).unwrap();
    DocxRenderer.render(&book, Locale::En).unwrap();
    HtmlRenderer.render(&book, Locale::En).unwrap();
}

// ---- Filenames and formats ----

#[test]
fn suggested_filename_sanitizes_title() {
    assert_eq!(
        formats::suggested_filename("My Great  Book", ExportFormat::Pdf),
        "My_Great_Book.pdf"
    );
    assert_eq!(
        formats::suggested_filename("T", ExportFormat::Docx),
        "T.docx"
    );
    // The legacy format is really an EPUB and is named as one.
    assert_eq!(
        formats::suggested_filename("T", ExportFormat::Mobi),
        "T.epub"
    );
    assert_eq!(formats::suggested_filename("  ", ExportFormat::Html), "ebook.html");
}

#[test]
fn format_from_extension() {
    assert_eq!(ExportFormat::from_extension("PDF"), Some(ExportFormat::Pdf));
    assert_eq!(ExportFormat::from_extension("htm"), Some(ExportFormat::Html));
    assert_eq!(ExportFormat::from_extension("azw3"), Some(ExportFormat::Mobi));
    assert_eq!(ExportFormat::from_extension("cbz"), None);
}

#[test]
fn export_writes_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let book = minimal_book();
    let result = formats::export(&book, ExportFormat::Epub, Locale::En).unwrap();

    let path = dir
        .path()
        .join(formats::suggested_filename(&book.title, ExportFormat::Epub));
    std::fs::write(&path, &result.data).unwrap();

    assert_eq!(std::fs::read(&path).unwrap(), result.data);
    assert_eq!(path.file_name().unwrap(), "T.epub");
}
