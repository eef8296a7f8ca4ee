//! Fetch an object.

use anyhow::{Context, Result};

use super::{print_object, Target};

/// Run the get command.
pub async fn run(target: &Target, bucket: &str, id: &str) -> Result<()> {
    let mut object = target.object(bucket, id)?;
    object
        .refresh()
        .await
        .with_context(|| format!("Failed to fetch {}", object.entity_ref()))?;
    print_object(&object)
}
