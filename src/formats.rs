mod docx;
mod epub;
mod html;
mod pdf;

pub use docx::DocxRenderer;
pub use epub::EpubRenderer;
pub use html::HtmlRenderer;
pub use pdf::PdfRenderer;

use crate::config::Locale;
use crate::ebook::Ebook;
use crate::error::Result;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Advisory attached to the legacy e-reader export, which is really an
/// EPUB: a true conversion needs an external tool.
pub const MOBI_ADVISORY: &str =
    "MOBI output is the EPUB artifact; convert it client-side with an external tool";

/// Trait for format-specific document renderers.
///
/// A renderer is stateless: each call allocates its own builders and
/// output buffer, so the same record may be rendered to several formats
/// concurrently.
pub trait Renderer: Send + Sync {
    /// Render a complete, standalone document for `book`.
    fn render(&self, book: &Ebook, locale: Locale) -> Result<Vec<u8>>;
}

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// PDF (paginated, styled).
    Pdf,
    /// EPUB (packaged e-book).
    Epub,
    /// DOCX (editable word-processor document).
    Docx,
    /// Self-contained interactive HTML flipbook.
    Html,
    /// Legacy e-reader format; degrades to EPUB (see [`MOBI_ADVISORY`]).
    Mobi,
}

impl ExportFormat {
    /// Get the MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Epub => "application/epub+zip",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Html => "text/html",
            ExportFormat::Mobi => "application/epub+zip",
        }
    }

    /// Canonical file extension (no dot).
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Epub => "epub",
            ExportFormat::Docx => "docx",
            ExportFormat::Html => "html",
            ExportFormat::Mobi => "epub",
        }
    }

    /// Try to detect format from a file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(ExportFormat::Pdf),
            "epub" => Some(ExportFormat::Epub),
            "docx" => Some(ExportFormat::Docx),
            "html" | "htm" => Some(ExportFormat::Html),
            "mobi" | "azw" | "azw3" => Some(ExportFormat::Mobi),
            _ => None,
        }
    }
}

/// One finished export.
#[derive(Debug, Clone)]
pub struct Export {
    /// Complete output document.
    pub data: Vec<u8>,
    /// MIME type of `data`.
    pub mime_type: &'static str,
    /// Caller-visible note when the output is a stand-in for the
    /// requested format.
    pub advisory: Option<&'static str>,
}

/// Get the renderer for a directly-renderable format.
///
/// [`ExportFormat::Mobi`] has no renderer of its own; [`export`] maps it
/// to the EPUB renderer with an advisory.
pub fn get_renderer(format: ExportFormat) -> Box<dyn Renderer> {
    match format {
        ExportFormat::Pdf => Box::new(PdfRenderer),
        ExportFormat::Epub | ExportFormat::Mobi => Box::new(EpubRenderer),
        ExportFormat::Docx => Box::new(DocxRenderer),
        ExportFormat::Html => Box::new(HtmlRenderer),
    }
}

/// Render `book` to `format`.
pub fn export(book: &Ebook, format: ExportFormat, locale: Locale) -> Result<Export> {
    tracing::debug!(title = %book.title, ?format, "rendering export");

    let data = get_renderer(format).render(book, locale)?;

    tracing::info!(
        title = %book.title,
        ?format,
        size = data.len(),
        "export rendered"
    );

    Ok(Export {
        data,
        mime_type: format.mime_type(),
        advisory: (format == ExportFormat::Mobi).then_some(MOBI_ADVISORY),
    })
}

/// Default output filename for a title: whitespace runs become `_`, the
/// canonical extension is appended.
pub fn suggested_filename(title: &str, format: ExportFormat) -> String {
    let stem: String = title.split_whitespace().collect::<Vec<_>>().join("_");
    let stem = if stem.is_empty() { "ebook".to_string() } else { stem };
    format!("{}.{}", stem, format.extension())
}
