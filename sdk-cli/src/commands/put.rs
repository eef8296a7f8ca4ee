//! Write an object: create, full replace or patch.

use anyhow::{Context, Result};
use nimbus_sdk_client::{HttpTransport, RemoteObject};
use serde_json::{Map, Value};

use super::{print_object, Target};

/// Create a new object from `fields`.
pub async fn create(
    target: &Target,
    bucket: &str,
    fields: Map<String, Value>,
    type_hint: Option<&str>,
) -> Result<()> {
    let bucket = target.bucket(bucket)?;
    let mut object = match type_hint {
        Some(hint) => bucket.create_object_with_type(hint),
        None => bucket.create_object(),
    };
    stage(&mut object, fields);
    object
        .save(true)
        .await
        .with_context(|| format!("Failed to create object in {}", object.entity_ref()))?;
    print_object(&object)
}

/// Replace every field of an existing object.
pub async fn replace(
    target: &Target,
    bucket: &str,
    id: &str,
    fields: Map<String, Value>,
    overwrite: bool,
) -> Result<()> {
    let mut object = prepare(target, bucket, id, overwrite).await?;
    // A full replace sends exactly the given fields.
    for key in object.keys() {
        if !fields.contains_key(&key) {
            object.remove(&key);
        }
    }
    stage(&mut object, fields);
    object
        .save(overwrite)
        .await
        .with_context(|| format!("Failed to save {}", object.entity_ref()))?;
    print_object(&object)
}

/// Send only `fields` to an existing object.
pub async fn patch(
    target: &Target,
    bucket: &str,
    id: &str,
    fields: Map<String, Value>,
    overwrite: bool,
) -> Result<()> {
    let mut object = prepare(target, bucket, id, overwrite).await?;
    stage(&mut object, fields);
    object
        .patch_save(overwrite)
        .await
        .with_context(|| format!("Failed to patch {}", object.entity_ref()))?;
    print_object(&object)
}

/// Reference the object; a conditional write needs its version first.
async fn prepare(
    target: &Target,
    bucket: &str,
    id: &str,
    overwrite: bool,
) -> Result<RemoteObject<HttpTransport>> {
    let mut object = target.object(bucket, id)?;
    if !overwrite {
        object
            .refresh()
            .await
            .with_context(|| format!("Failed to read version of {}", object.entity_ref()))?;
    }
    Ok(object)
}

fn stage(object: &mut RemoteObject<HttpTransport>, fields: Map<String, Value>) {
    for (key, value) in fields {
        object.set(&key, value);
    }
}
