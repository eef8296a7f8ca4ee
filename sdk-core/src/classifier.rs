//! Error classification.
//!
//! Two input shapes are reduced to a [`ClassifiedError`]:
//!
//! - **Structured**: an HTTP status plus a decoded body, as produced by the
//!   transports in `sdk-client`.
//! - **Legacy string**: a single error string produced by older call sites
//!   or by server-code executions. These are matched against
//!   [`LEGACY_RULES`], an ordered table evaluated first-match-wins.
//!
//! The order of [`LEGACY_RULES`] is part of the contract: earlier rules
//! shadow later ones on ambiguous input.

use crate::codes::status_for_code;
use nimbus_sdk_types::{ClassifiedError, ResponseBody, STATUS_UNKNOWN_CODE, STATUS_UNPARSEABLE};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;

/// Name reported by [`match_legacy`] when no rule matched.
pub const UNPARSEABLE_RULE: &str = "unparseable";

/// Classify a structured response.
///
/// An object body contributes `errorCode` and `message`; the resulting
/// message is `"<errorCode>: <message>"` so the code stays visible in logs.
/// A string body is used verbatim. A 429 without an explicit code becomes
/// the canonical rate-limit error.
pub fn classify_response(status: u16, body: &ResponseBody) -> ClassifiedError {
    let (code, message) = match body {
        ResponseBody::Json(Value::Object(map)) => {
            let code = map.get("errorCode").and_then(Value::as_str);
            let message = map.get("message").and_then(Value::as_str);
            let text = match (code, message) {
                (Some(code), Some(message)) => format!("{code}: {message}"),
                (Some(code), None) => code.to_string(),
                (None, Some(message)) => message.to_string(),
                (None, None) => String::new(),
            };
            (code.map(str::to_string), text)
        }
        ResponseBody::Json(Value::String(text)) | ResponseBody::Text(text) => {
            (None, text.clone())
        }
        _ => (None, String::new()),
    };

    if status == 429 && code.is_none() {
        return ClassifiedError::rate_limited();
    }

    ClassifiedError {
        status: i32::from(status),
        code,
        message,
    }
}

/// Classify a legacy error string.
pub fn classify_legacy(raw: &str) -> ClassifiedError {
    match_legacy(raw).1
}

/// Classify a legacy error string and report which rule fired.
///
/// Returns [`UNPARSEABLE_RULE`] as the name when nothing matched.
pub fn match_legacy(raw: &str) -> (&'static str, ClassifiedError) {
    LEGACY_RULES
        .iter()
        .find_map(|rule| (rule.apply)(raw).map(|error| (rule.name, error)))
        .unwrap_or_else(|| {
            (
                UNPARSEABLE_RULE,
                ClassifiedError::new(STATUS_UNPARSEABLE, None, raw),
            )
        })
}

/// One entry of the legacy cascade: a named predicate-and-extractor.
pub struct LegacyRule {
    /// Stable rule name, used in tests and logs.
    pub name: &'static str,
    /// Returns the classification when the rule matches.
    pub apply: fn(&str) -> Option<ClassifiedError>,
}

/// The legacy cascade, in evaluation order.
pub static LEGACY_RULES: &[LegacyRule] = &[
    LegacyRule {
        name: "network_prefix",
        apply: network_prefix,
    },
    LegacyRule {
        name: "rate_limit_prefix",
        apply: rate_limit_prefix,
    },
    LegacyRule {
        name: "server_code_network",
        apply: server_code_network,
    },
    LegacyRule {
        name: "invalid_grant_with_message",
        apply: invalid_grant_with_message,
    },
    LegacyRule {
        name: "invalid_grant",
        apply: invalid_grant,
    },
    LegacyRule {
        name: "trailing_status_code",
        apply: trailing_status_code,
    },
    LegacyRule {
        name: "error_code_prefix",
        apply: error_code_prefix,
    },
    LegacyRule {
        name: "server_code_steps_detail",
        apply: server_code_steps_detail,
    },
    LegacyRule {
        name: "server_code_detail",
        apply: server_code_detail,
    },
    LegacyRule {
        name: "server_code",
        apply: server_code,
    },
    LegacyRule {
        name: "server_code_reordered",
        apply: server_code_reordered,
    },
];

static TRAILING_STATUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"statusCode:\s*(\d+)\s*$").unwrap());

static CODE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^([A-Z][A-Z0-9]*(?:_[A-Z0-9]+)*): (.*)$").unwrap());

static SERVER_CODE_STEPS_DETAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?s)statusCode: (\d+) error code: (\S+) message: (.*?) executed steps: (\d+) detail message: (.*)$",
    )
    .unwrap()
});

static SERVER_CODE_DETAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)statusCode: (\d+) error code: (\S+) message: (.*?) detail message: (.*)$")
        .unwrap()
});

static SERVER_CODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)statusCode: (\d+) error code: (\S+) message: (.*)$").unwrap()
});

static SERVER_CODE_REORDERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)error code: (\S+) statusCode: (\d+) message: (.*)$").unwrap()
});

fn network_prefix(raw: &str) -> Option<ClassifiedError> {
    raw.starts_with("0 : http")
        .then(|| ClassifiedError::network(raw))
}

fn rate_limit_prefix(raw: &str) -> Option<ClassifiedError> {
    raw.starts_with("429 : http")
        .then(ClassifiedError::rate_limited)
}

fn server_code_network(raw: &str) -> Option<ClassifiedError> {
    raw.starts_with("fail to execute server code. statusCode: 0")
        .then(|| ClassifiedError::network(raw))
}

fn invalid_grant_with_message(raw: &str) -> Option<ClassifiedError> {
    if !raw.starts_with("invalid_grant: ") {
        return None;
    }
    let (_, rest) = raw.split_once(':')?;
    Some(ClassifiedError::new(
        400,
        Some("invalid_grant"),
        rest.trim_start_matches(' '),
    ))
}

fn invalid_grant(raw: &str) -> Option<ClassifiedError> {
    raw.starts_with("invalid_grant")
        .then(|| ClassifiedError::new(400, Some("invalid_grant"), raw))
}

fn trailing_status_code(raw: &str) -> Option<ClassifiedError> {
    let caps = TRAILING_STATUS.captures(raw)?;
    match caps[1].parse::<i32>() {
        Ok(429) => Some(ClassifiedError::rate_limited()),
        _ => Some(ClassifiedError::network(raw)),
    }
}

fn error_code_prefix(raw: &str) -> Option<ClassifiedError> {
    let caps = CODE_PREFIX.captures(raw)?;
    let code = &caps[1];
    let status = status_for_code(code).unwrap_or(STATUS_UNKNOWN_CODE);
    Some(ClassifiedError::new(status, Some(code), raw))
}

fn server_code_steps_detail(raw: &str) -> Option<ClassifiedError> {
    let caps = SERVER_CODE_STEPS_DETAIL.captures(raw)?;
    positional(&caps, 1, 2, Some(3), Some(5))
}

fn server_code_detail(raw: &str) -> Option<ClassifiedError> {
    let caps = SERVER_CODE_DETAIL.captures(raw)?;
    positional(&caps, 1, 2, Some(3), Some(4))
}

fn server_code(raw: &str) -> Option<ClassifiedError> {
    let caps = SERVER_CODE.captures(raw)?;
    positional(&caps, 1, 2, Some(3), None)
}

fn server_code_reordered(raw: &str) -> Option<ClassifiedError> {
    let caps = SERVER_CODE_REORDERED.captures(raw)?;
    positional(&caps, 2, 1, Some(3), None)
}

/// Build an error from capture group positions.
fn positional(
    caps: &Captures<'_>,
    status_at: usize,
    code_at: usize,
    message_at: Option<usize>,
    detail_at: Option<usize>,
) -> Option<ClassifiedError> {
    let status = caps[status_at].parse::<i32>().ok()?;
    let code = &caps[code_at];
    let message = message_at.map(|i| caps[i].trim()).unwrap_or_default();
    let message = match detail_at.map(|i| caps[i].trim()) {
        Some(detail) if !detail.is_empty() => format!("{message}: {detail}"),
        _ => message.to_string(),
    };
    Some(ClassifiedError::new(status, Some(code), message))
}
