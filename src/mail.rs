//! Mail construction and submission
//!
//! The transformed edition is wrapped in a multipart message whose single
//! part is an HTML attachment. The attachment filename stem doubles as the
//! document title on e-book readers that import mailed files, so it is set
//! to the same short title used for the subject line.
//!
//! Submission goes through the [`MailTransport`] trait. The shipped
//! transport pipes the message into a local `sendmail -oi -t` process
//! (recipients read from the headers, no special lone-dot handling); an
//! SMTP-client transport could implement the same trait without the
//! pipeline knowing.

use crate::USER_AGENT;
use crate::error::{Error, Result};
use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Base64 body lines are wrapped at this width.
const ENCODED_LINE_WIDTH: usize = 76;

/// Build the complete message bytes for one edition.
///
/// `title` becomes the Subject header and the attachment filename stem;
/// `to` is the destination address. The body is base64-encoded so that
/// arbitrarily long HTML lines survive mail transports with line-length
/// limits. The result is ready to pipe into a mail submission program.
pub fn build_message(html: &str, title: &str, to: &str) -> Vec<u8> {
    // The boundary is derived from the content digest; base64 body lines
    // never contain the `_` it carries.
    let boundary = {
        let mut hasher = Sha256::new();
        hasher.update(html.as_bytes());
        let digest = format!("{:x}", hasher.finalize());
        format!("=_{}", &digest[..32])
    };

    let mut message = Vec::with_capacity(html.len() * 4 / 3 + 512);
    push_line(&mut message, &format!("To: {to}"));
    push_line(&mut message, &format!("Subject: {title}"));
    push_line(&mut message, &format!("User-Agent: {USER_AGENT}"));
    push_line(&mut message, "MIME-Version: 1.0");
    push_line(
        &mut message,
        &format!("Content-Type: multipart/mixed; boundary=\"{boundary}\""),
    );
    push_line(&mut message, "");
    push_line(&mut message, &format!("--{boundary}"));
    push_line(&mut message, "Content-Type: text/html; charset=\"utf-8\"");
    push_line(&mut message, "Content-Transfer-Encoding: base64");
    push_line(
        &mut message,
        &format!("Content-Disposition: attachment; filename=\"{title}.html\""),
    );
    push_line(&mut message, "");
    let encoded = BASE64.encode(html.as_bytes());
    for chunk in encoded.as_bytes().chunks(ENCODED_LINE_WIDTH) {
        message.extend_from_slice(chunk);
        message.extend_from_slice(b"\r\n");
    }
    push_line(&mut message, &format!("--{boundary}--"));

    message
}

fn push_line(message: &mut Vec<u8>, line: &str) {
    message.extend_from_slice(line.as_bytes());
    message.extend_from_slice(b"\r\n");
}

/// Outbound message submission.
///
/// Implementations take the finished message bytes and either hand them to
/// a local mail-transfer agent or speak SMTP themselves; the pipeline does
/// not assume which.
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Submit one message. An error means the message was not accepted and
    /// the edition must not be marked as delivered.
    async fn send(&self, message: &[u8]) -> Result<()>;
}

/// Transport that pipes messages into a local sendmail binary.
pub struct Sendmail {
    binary_path: PathBuf,
}

impl Sendmail {
    /// Create a transport with an explicit sendmail path.
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find sendmail in PATH.
    ///
    /// Returns `None` if no `sendmail` binary is found.
    pub fn from_path() -> Option<Self> {
        which::which("sendmail").ok().map(Self::new)
    }
}

#[async_trait]
impl MailTransport for Sendmail {
    async fn send(&self, message: &[u8]) -> Result<()> {
        debug!(binary = %self.binary_path.display(), "submitting message");

        // -t: read recipients from the headers; -oi: a lone dot on a line
        // is ordinary input, not end-of-message.
        let mut child = Command::new(&self.binary_path)
            .arg("-oi")
            .arg("-t")
            .stdin(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::Delivery(format!(
                    "failed to execute {}: {e}",
                    self.binary_path.display()
                ))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Delivery("sendmail stdin unavailable".to_string()))?;
        stdin
            .write_all(message)
            .await
            .map_err(|e| Error::Delivery(format!("failed to write message to sendmail: {e}")))?;
        // Close stdin so sendmail sees end of input.
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|e| Error::Delivery(format!("failed to wait for sendmail: {e}")))?;
        if !status.success() {
            return Err(Error::Delivery(format!("sendmail exited with {status}")));
        }
        Ok(())
    }
}
