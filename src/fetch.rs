//! Authenticated retrieval of subscriber-only edition pages
//!
//! Subscriber content on LWN sits behind session-cookie authentication.
//! Each fetch builds a fresh cookie-tracking client, logs in with the
//! account credentials, then retrieves the edition page with the session
//! cookies the login set. Nothing is cached across runs: the client and
//! its cookie jar are dropped when the call returns, and the next run
//! re-authenticates.
//!
//! There is no retry logic anywhere in this path. A login rejection or a
//! failed page fetch aborts the whole run; the next scheduled invocation
//! is the retry mechanism.

use crate::USER_AGENT;
use crate::error::{Error, Result};
use tracing::debug;

/// Production site origin for the login endpoint.
const SITE_URL: &str = "https://lwn.net";

/// Session-based page fetcher.
///
/// The default fetcher talks to the fixed production origin and requests
/// edition URLs verbatim. Tests construct one with [`Fetcher::with_base_url`]
/// pointed at a local mock server; edition URLs are then rebased onto that
/// origin (path and query preserved) so the whole login-then-fetch protocol
/// can be exercised offline.
pub struct Fetcher {
    base_override: Option<String>,
}

impl Fetcher {
    /// Fetcher against the production origin.
    pub fn new() -> Self {
        Self { base_override: None }
    }

    /// Fetcher whose login endpoint and edition URLs are rebased onto
    /// `base` (no trailing slash).
    pub fn with_base_url(base: impl Into<String>) -> Self {
        Self {
            base_override: Some(base.into()),
        }
    }

    fn login_url(&self) -> String {
        format!("{}/login", self.base_override.as_deref().unwrap_or(SITE_URL))
    }

    fn edition_url(&self, url: &str) -> Result<String> {
        let Some(base) = &self.base_override else {
            return Ok(url.to_string());
        };
        let parsed = url::Url::parse(url)
            .map_err(|e| Error::Fetch(format!("invalid edition URL '{url}': {e}")))?;
        let mut target = format!("{}{}", base.trim_end_matches('/'), parsed.path());
        if let Some(query) = parsed.query() {
            target.push('?');
            target.push_str(query);
        }
        Ok(target)
    }

    /// Log in and retrieve the edition page at `url`.
    ///
    /// The login POST sends `Username`, `Password` and a `target` field as
    /// an ordinary form; a success status means the response carried the
    /// session cookies the subsequent GET needs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Login`] when the login endpoint answers with a
    /// non-success status, [`Error::Fetch`] when the page request does, and
    /// [`Error::Network`] on transport failures. All abort the run.
    pub async fn fetch_edition(
        &self,
        url: &str,
        username: &str,
        password: &str,
    ) -> Result<String> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::Fetch(format!("failed to create HTTP client: {e}")))?;

        debug!("logging in");
        let response = client
            .post(self.login_url())
            .form(&[("Username", username), ("Password", password), ("target", "/")])
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Login(format!("login returned HTTP {}", status.as_u16())));
        }

        let target = self.edition_url(url)?;
        debug!(url = %target, "fetching edition page");
        let response = client.get(&target).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Fetch(format!(
                "page returned HTTP {}: {}",
                status.as_u16(),
                target
            )));
        }

        Ok(response.text().await?)
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}
