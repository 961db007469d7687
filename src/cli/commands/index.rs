//! Index command.

use anyhow::Result;

use crate::engine::RagEngine;

/// Index one document. Without `force`, an indexed document is left alone.
pub async fn run(engine: &RagEngine, name: &str, force: bool) -> Result<()> {
    let message = if force {
        engine.reindex(name).await?
    } else {
        engine.chunks(name).await?
    };
    println!("{message}");
    Ok(())
}
