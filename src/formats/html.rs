//! Interactive HTML flipbook renderer.
//!
//! Emits a single self-contained document: embedded stylesheet, one
//! `div.page` per cover/TOC/chapter, and an embedded script holding the
//! current page index with previous/next buttons, clickable TOC jumps,
//! and arrow-key navigation.
//!
//! Paragraphs are plain text in this format; inline emphasis is not
//! converted (documented product behavior).

use crate::config::Locale;
use crate::ebook::Ebook;
use crate::error::Result;
use crate::formats::Renderer;
use crate::markup::{self, Block};
use std::fmt::Write as _;

const STYLESHEET: &str = r#"        * {
            margin: 0;
            padding: 0;
            box-sizing: border-box;
        }

        body {
            font-family: 'Georgia', serif;
            background: linear-gradient(135deg, #667eea 0%, #764ba2 100%);
            min-height: 100vh;
            padding: 20px;
        }

        .flipbook-container {
            max-width: 1200px;
            margin: 0 auto;
            background: white;
            border-radius: 20px;
            box-shadow: 0 20px 60px rgba(0,0,0,0.3);
            overflow: hidden;
        }

        .cover {
            background: linear-gradient(135deg, #3B82F6 0%, #8B5CF6 100%);
            color: white;
            padding: 100px 50px;
            text-align: center;
            min-height: 600px;
            display: flex;
            flex-direction: column;
            justify-content: center;
        }

        .cover h1 {
            font-size: 3em;
            margin-bottom: 20px;
            text-shadow: 2px 2px 4px rgba(0,0,0,0.2);
        }

        .cover .author {
            font-size: 1.5em;
            opacity: 0.9;
            margin-bottom: 30px;
        }

        .cover .tagline {
            font-size: 1.2em;
            font-style: italic;
            color: #FCD34D;
            margin-top: 40px;
        }

        .page {
            padding: 60px;
            min-height: 600px;
            display: none;
        }

        .page.active {
            display: block;
        }

        .page h1 {
            color: #8B5CF6;
            font-size: 2.5em;
            margin-bottom: 30px;
            border-bottom: 3px solid #3B82F6;
            padding-bottom: 15px;
        }

        .page h2 {
            color: #1E40AF;
            font-size: 1.8em;
            margin-top: 30px;
            margin-bottom: 15px;
        }

        .page p {
            line-height: 1.8;
            text-align: justify;
            margin-bottom: 20px;
            color: #374151;
            font-size: 1.1em;
        }

        .navigation {
            background: #F3F4F6;
            padding: 20px;
            display: flex;
            justify-content: space-between;
            align-items: center;
            border-top: 1px solid #E5E7EB;
        }

        .nav-button {
            background: linear-gradient(135deg, #3B82F6, #8B5CF6);
            color: white;
            border: none;
            padding: 12px 30px;
            border-radius: 8px;
            font-size: 1em;
            cursor: pointer;
            transition: transform 0.2s, box-shadow 0.2s;
        }

        .nav-button:hover {
            transform: translateY(-2px);
            box-shadow: 0 10px 20px rgba(59, 130, 246, 0.3);
        }

        .nav-button:disabled {
            opacity: 0.5;
            cursor: not-allowed;
        }

        .page-info {
            color: #6B7280;
            font-size: 0.9em;
        }

        .toc {
            padding: 60px;
        }

        .toc h1 {
            color: #8B5CF6;
            margin-bottom: 30px;
        }

        .toc-item {
            padding: 15px;
            margin: 10px 0;
            background: #F9FAFB;
            border-left: 4px solid #3B82F6;
            cursor: pointer;
            transition: all 0.3s;
        }

        .toc-item:hover {
            background: #EEF2FF;
            transform: translateX(10px);
        }

        .toc-item .chapter-number {
            color: #8B5CF6;
            font-weight: bold;
            margin-right: 10px;
        }
"#;

const SCRIPT: &str = r#"        function showPage(pageNum) {
            document.querySelectorAll('.page').forEach(page => {
                page.classList.remove('active');
            });

            document.getElementById('page-' + pageNum).classList.add('active');
            document.getElementById('currentPage').textContent = pageNum + 1;

            document.getElementById('prevBtn').disabled = (pageNum === 0);
            document.getElementById('nextBtn').disabled = (pageNum === totalPages - 1);

            currentPage = pageNum;

            window.scrollTo({ top: 0, behavior: 'smooth' });
        }

        function nextPage() {
            if (currentPage < totalPages - 1) {
                showPage(currentPage + 1);
            }
        }

        function prevPage() {
            if (currentPage > 0) {
                showPage(currentPage - 1);
            }
        }

        function goToPage(pageNum) {
            showPage(pageNum);
        }

        document.addEventListener('keydown', (e) => {
            if (e.key === 'ArrowRight') nextPage();
            if (e.key === 'ArrowLeft') prevPage();
        });

        showPage(0);
"#;

/// Handler rendering self-contained HTML flipbooks.
pub struct HtmlRenderer;

impl Renderer for HtmlRenderer {
    fn render(&self, book: &Ebook, locale: Locale) -> Result<Vec<u8>> {
        // Cover and TOC pages precede the chapters.
        let total_pages = book.chapters.len() + 2;
        let mut html = String::new();

        let _ = write!(
            html,
            r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
{css}    </style>
</head>
<body>
    <div class="flipbook-container">
"#,
            lang = locale.language_tag(),
            title = escape_html(&book.title),
            css = STYLESHEET,
        );

        // Page 0: cover.
        let _ = write!(
            html,
            r#"        <div class="page active" id="page-0">
            <div class="cover">
                <h1>{title}</h1>
                <div class="author">{byline}</div>
"#,
            title = escape_html(&book.title),
            byline = escape_html(&locale.by_author(&book.author)),
        );
        if let Some(tagline) = &book.cover.tagline {
            let _ = writeln!(
                html,
                "                <div class=\"tagline\">{}</div>",
                escape_html(tagline)
            );
        }
        html.push_str("            </div>\n        </div>\n");

        // Page 1: clickable table of contents.
        let _ = write!(
            html,
            r#"        <div class="page" id="page-1">
            <div class="toc">
                <h1>{}</h1>
"#,
            escape_html(locale.toc_heading()),
        );
        for (idx, chapter) in book.chapters.iter().enumerate() {
            let _ = write!(
                html,
                r#"                <div class="toc-item" onclick="goToPage({page})">
                    <span class="chapter-number">{number}.</span>
                    <span class="chapter-title">{title}</span>
                </div>
"#,
                page = idx + 2,
                number = chapter.number,
                title = escape_html(&chapter.title),
            );
        }
        html.push_str("            </div>\n        </div>\n");

        // Pages 2..N+1: one page per chapter.
        for (idx, chapter) in book.chapters.iter().enumerate() {
            let _ = write!(
                html,
                "        <div class=\"page\" id=\"page-{}\">\n            <h1>{}</h1>\n",
                idx + 2,
                escape_html(&chapter.heading(locale)),
            );
            for block in markup::normalize(&chapter.content) {
                match block {
                    Block::Subtitle(text) => {
                        let _ = writeln!(html, "            <h2>{}</h2>", escape_html(&text));
                    }
                    Block::Paragraph(_) => {
                        let _ = writeln!(
                            html,
                            "            <p>{}</p>",
                            escape_html(&block.plain_text())
                        );
                    }
                }
            }
            html.push_str("        </div>\n");
        }

        // Navigation chrome and the embedded pager script.
        let _ = write!(
            html,
            r#"        <div class="navigation">
            <button class="nav-button" id="prevBtn" onclick="prevPage()">{prev}</button>
            <div class="page-info">
                <span id="currentPage">1</span> / <span id="totalPages">{total}</span>
            </div>
            <button class="nav-button" id="nextBtn" onclick="nextPage()">{next}</button>
        </div>
    </div>

    <script>
        let currentPage = 0;
        const totalPages = {total};

{script}    </script>
</body>
</html>
"#,
            prev = escape_html(locale.previous_label()),
            next = escape_html(locale.next_label()),
            total = total_pages,
            script = SCRIPT,
        );

        Ok(html.into_bytes())
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
