use crate::formats::ExportFormat;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Render ebook records to PDF, EPUB, DOCX or interactive HTML.
#[derive(Parser, Debug, Clone)]
#[command(name = "ebook-export")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the ebook record (JSON).
    pub input: PathBuf,

    /// Target format.
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Epub)]
    pub format: ExportFormat,

    /// Output file path (defaults to a name derived from the title).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Locale for the fixed display strings.
    #[arg(short, long, value_enum, default_value_t = Locale::En)]
    pub locale: Locale,
}

/// Locale for the fixed strings baked into rendered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English.
    #[default]
    En,
    /// French (the original product locale).
    Fr,
}

impl Locale {
    /// BCP 47 language tag for document metadata.
    pub fn language_tag(self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Fr => "fr",
        }
    }

    /// "by {author}" byline.
    pub fn by_author(self, author: &str) -> String {
        match self {
            Locale::En => format!("by {author}"),
            Locale::Fr => format!("par {author}"),
        }
    }

    /// Heading of the table of contents page.
    pub fn toc_heading(self) -> &'static str {
        match self {
            Locale::En => "Table of Contents",
            Locale::Fr => "Table des Matières",
        }
    }

    /// Heading of the legal mentions section.
    pub fn legal_mentions_heading(self) -> &'static str {
        match self {
            Locale::En => "Legal Mentions",
            Locale::Fr => "Mentions Légales",
        }
    }

    /// Title of the EPUB legal front-matter chapter.
    pub fn legal_information_heading(self) -> &'static str {
        match self {
            Locale::En => "Legal Information",
            Locale::Fr => "Informations Légales",
        }
    }

    /// "Chapter {number}: {title}" heading for ordinary chapters.
    pub fn chapter_heading(self, number: i64, title: &str) -> String {
        match self {
            Locale::En => format!("Chapter {number}: {title}"),
            Locale::Fr => format!("Chapitre {number}: {title}"),
        }
    }

    /// Label of the flipbook "previous page" control.
    pub fn previous_label(self) -> &'static str {
        match self {
            Locale::En => "← Previous",
            Locale::Fr => "← Précédent",
        }
    }

    /// Label of the flipbook "next page" control.
    pub fn next_label(self) -> &'static str {
        match self {
            Locale::En => "Next →",
            Locale::Fr => "Suivant →",
        }
    }
}
