//! ebook-export CLI entry point.

use clap::Parser;
use ebook_export::{Cli, Ebook, export, suggested_filename};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ebook_export=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let raw = std::fs::read_to_string(&cli.input)?;
    let value: serde_json::Value = serde_json::from_str(&raw)?;
    let book = Ebook::from_value(&value)?;

    let result = export(&book, cli.format, cli.locale)?;

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(suggested_filename(&book.title, cli.format)));
    std::fs::write(&output, &result.data)?;

    println!(
        "Wrote {} ({}, {} bytes)",
        output.display(),
        result.mime_type,
        result.data.len()
    );
    if let Some(advisory) = result.advisory {
        println!("Note: {advisory}");
    }

    Ok(())
}
