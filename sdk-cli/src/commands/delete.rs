//! Delete an object.

use anyhow::{Context, Result};
use tracing::info;

use super::Target;

/// Run the delete command.
pub async fn run(target: &Target, bucket: &str, id: &str) -> Result<()> {
    let mut object = target.object(bucket, id)?;
    let entity = object.entity_ref();
    object
        .delete()
        .await
        .with_context(|| format!("Failed to delete {entity}"))?;
    info!("deleted {entity}");
    Ok(())
}
