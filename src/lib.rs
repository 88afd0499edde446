//! ebook-export: a multi-format exporter for generated ebooks.
//!
//! This crate takes a loosely-typed ebook record (title, author, ordered
//! chapters with free-form text bodies, optional cover/legal/TOC
//! metadata) and renders it into standalone export documents.
//!
//! # Features
//!
//! - Defaulting adapter over permissive/partial record shapes
//! - Shared markup normalization (section markers, legacy `#` headings,
//!   inline bold/italic) applied identically across all formats
//! - PDF, EPUB, DOCX, and interactive HTML flipbook renderers
//! - Deterministic output: the same record renders to identical bytes
//! - Localized fixed strings (English and French)
//!
//! The renderers are stateless and purely synchronous; see
//! [`formats::export`] for the single entry point.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// CLI definition and locale strings.
pub mod config;
/// Ebook data model and defaulting adapter.
pub mod ebook;
/// Error types.
pub mod error;
/// Format renderers and export dispatch.
pub mod formats;
/// Chapter body normalization.
pub mod markup;

#[cfg(test)]
mod tests;

pub use config::{Cli, Locale};
pub use ebook::Ebook;
pub use error::{ExportError, Result};
pub use formats::{Export, ExportFormat, export, suggested_filename};
