//! Download an object body.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use super::Target;

/// Run the download command.
pub async fn run(target: &Target, bucket: &str, id: &str, output: &Path) -> Result<()> {
    let object = target.object(bucket, id)?;
    let body = object
        .download_body()
        .await
        .with_context(|| format!("Failed to download body of {}", object.entity_ref()))?;
    tokio::fs::write(output, &body.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        bytes = body.bytes.len(),
        content_type = body.content_type.as_deref().unwrap_or("unknown"),
        "saved body to {}",
        output.display()
    );
    Ok(())
}
