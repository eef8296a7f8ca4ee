//! Classify a legacy error string.

use anyhow::Result;
use nimbus_sdk_core::match_legacy;
use serde_json::json;

/// Run the classify command.
pub fn run(raw: &str) -> Result<()> {
    let (rule, error) = match_legacy(raw);
    let rendered = serde_json::to_string_pretty(&json!({
        "rule": rule,
        "status": error.status,
        "code": error.code,
        "message": error.message,
    }))?;
    println!("{rendered}");
    Ok(())
}
