//! CLI command implementations.

pub mod classify;
pub mod delete;
pub mod download;
pub mod get;
pub mod put;

use anyhow::{Context, Result};
use nimbus_sdk_client::{Bucket, Client, HttpTransport, RemoteObject};
use serde_json::{Map, Value};

use crate::config::Config;

/// Client plus bucket scope shared by every remote command.
pub struct Target {
    client: Client<HttpTransport>,
    user: Option<String>,
}

impl Target {
    /// Build the configured transport and client.
    pub fn connect(config: &Config, user: Option<&str>) -> Result<Self> {
        let transport = HttpTransport::build(config.transport_kind(), config.transport_config())
            .context("Failed to build HTTP transport")?;
        Ok(Self {
            client: Client::new(config.context(), transport),
            user: user.map(str::to_string),
        })
    }

    /// Resolve a bucket in the selected scope.
    pub fn bucket(&self, name: &str) -> Result<Bucket<HttpTransport>> {
        let bucket = match &self.user {
            Some(user) => self.client.user_bucket(user, name),
            None => self.client.bucket(name),
        };
        bucket.with_context(|| format!("Invalid bucket {name:?}"))
    }

    /// Reference an existing object.
    pub fn object(&self, bucket: &str, id: &str) -> Result<RemoteObject<HttpTransport>> {
        self.bucket(bucket)?
            .object(id)
            .with_context(|| format!("Invalid object id {id:?}"))
    }
}

/// Parse `--data` into a field map.
pub fn parse_fields(data: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str(data).context("--data is not valid JSON")? {
        Value::Object(fields) => Ok(fields),
        _ => anyhow::bail!("--data must be a JSON object"),
    }
}

/// Print an object with its metadata.
pub fn print_object(object: &RemoteObject<HttpTransport>) -> Result<()> {
    let rendered = serde_json::to_string_pretty(&object.state().to_json())?;
    println!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_fields_accepts_objects_only() {
        let fields = parse_fields(r#"{"points": 10, "name": "ada"}"#).unwrap();
        assert_eq!(fields.len(), 2);
        assert!(parse_fields("[1, 2]").is_err());
        assert!(parse_fields("not json").is_err());
    }
}
