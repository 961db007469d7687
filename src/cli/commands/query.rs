//! Read-only commands: status, ask, list, text.

use anyhow::Result;

use crate::documents::{DocumentName, PdfExtractor, TextExtractor};
use crate::engine::RagEngine;
use crate::store::CollectionStore;

/// Print `true`/`false` and the stored chunk count.
pub fn run_status(store: &CollectionStore, name: &str) -> Result<()> {
    let name = DocumentName::new(name)?;
    let entries = store.count(name.as_str())?;
    println!("{}", entries > 0);
    println!("{name}: {entries} chunks stored");
    Ok(())
}

/// Print the chunks most relevant to `query`.
pub async fn run_ask(
    engine: &RagEngine,
    name: &str,
    query: &str,
    k: Option<usize>,
    json: bool,
) -> Result<()> {
    let result = engine.retrieve(name, query, k).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", result.format());
    }
    Ok(())
}

/// Print every collection with its chunk count.
pub fn run_list(store: &CollectionStore, json: bool) -> Result<()> {
    let collections = store.list_collections()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&collections)?);
        return Ok(());
    }

    if collections.is_empty() {
        println!("No documents indexed yet.");
        return Ok(());
    }

    let width = collections.iter().map(|c| c.name.len()).max().unwrap_or(0);
    for collection in &collections {
        let dimension = collection
            .dimension
            .map(|d| format!("{d}d"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<width$}  {:>6} chunks  {dimension}",
            collection.name, collection.entries
        );
    }
    Ok(())
}

/// Print the text extracted from a document.
pub async fn run_text(extractor: &PdfExtractor, name: &str) -> Result<()> {
    let name = DocumentName::new(name)?;
    let text = extractor.extract(&name).await?;
    println!("{text}");
    Ok(())
}
