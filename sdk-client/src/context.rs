//! Application context: where to send requests and as whom.

use std::fmt;

/// Immutable per-application settings shared by every request.
///
/// A login flow produces a new context with [`AppContext::with_access_token`]
/// and swaps it into the client; existing contexts are never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct AppContext {
    base_url: String,
    app_id: String,
    app_key: String,
    access_token: Option<String>,
}

impl AppContext {
    /// Create a context. A trailing `/` on `base_url` is dropped.
    pub fn new(base_url: &str, app_id: &str, app_key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            app_id: app_id.to_string(),
            app_key: app_key.to_string(),
            access_token: None,
        }
    }

    /// A copy of this context carrying `token`. An empty token clears it.
    pub fn with_access_token(&self, token: &str) -> Self {
        Self {
            access_token: Some(token.to_string()).filter(|t| !t.is_empty()),
            ..self.clone()
        }
    }

    /// API root, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Application identifier.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Application key.
    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    /// Bearer credential, if logged in.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// `<base>/apps/<appId>`.
    pub fn app_url(&self) -> String {
        format!("{}/apps/{}", self.base_url, self.app_id)
    }
}

impl fmt::Debug for AppContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppContext")
            .field("base_url", &self.base_url)
            .field("app_id", &self.app_id)
            .field("app_key", &"[REDACTED]")
            .field(
                "access_token",
                &self.access_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_dropped() {
        let ctx = AppContext::new("https://api.test/api/", "app1", "key");
        assert_eq!(ctx.app_url(), "https://api.test/api/apps/app1");
    }

    #[test]
    fn with_access_token_leaves_original_untouched() {
        let ctx = AppContext::new("https://api.test", "app1", "key");
        let logged_in = ctx.with_access_token("tok");
        assert_eq!(ctx.access_token(), None);
        assert_eq!(logged_in.access_token(), Some("tok"));
        assert_eq!(logged_in.with_access_token("").access_token(), None);
    }

    #[test]
    fn debug_redacts_secrets() {
        let ctx = AppContext::new("https://api.test", "app1", "secret-key").with_access_token("secret-tok");
        let debug = format!("{ctx:?}");
        assert!(!debug.contains("secret-key"));
        assert!(!debug.contains("secret-tok"));
        assert!(debug.contains("app1"));
    }
}
