//! Run orchestration
//!
//! One invocation delivers at most one edition. The stages run strictly in
//! sequence: read the feed, pick the first edition without a delivery
//! mark, log in and fetch it, rewrite it, deliver it, and only then write
//! the mark. The ordering of the last two steps is the system's one
//! correctness-critical rule: a failed delivery leaves no mark behind, so
//! the next scheduled run retries the same edition instead of skipping it.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::mail::MailTransport;
use crate::marks::{MarkStore, SeenSet, first_unmarked};
use crate::{feed, mail, transform};
use std::io::Write;
use tracing::info;

/// How a successful run ended
#[derive(Debug)]
pub enum Outcome {
    /// A new edition was delivered (or written to stdout) and marked
    Delivered {
        /// Display title of the delivered edition
        title: String,
    },

    /// Every edition in the feed was already delivered; nothing was done
    UpToDate,
}

/// Run the pipeline against the production endpoints.
///
/// # Errors
///
/// Any fatal stage error aborts the run before the delivery mark is
/// written; see [`crate::Error`] for the taxonomy.
pub async fn run(config: &Config, transport: &dyn MailTransport) -> Result<Outcome> {
    run_with(
        config,
        transport,
        feed::FEED_URL,
        &Fetcher::new(),
        &mut std::io::stdout(),
    )
    .await
}

/// Run the pipeline with injectable endpoints and output stream.
///
/// This is [`run`] with the seams exposed: tests point `feed_url` and
/// `fetcher` at a local mock server and capture stdout-mode output in a
/// buffer. Production behavior is byte-identical to [`run`].
///
/// # Errors
///
/// Same as [`run`].
pub async fn run_with<W: Write>(
    config: &Config,
    transport: &dyn MailTransport,
    feed_url: &str,
    fetcher: &Fetcher,
    out: &mut W,
) -> Result<Outcome> {
    let store = MarkStore::new(config.marks_dir.clone());
    store.ensure_dir()?;

    let client = feed::http_client()?;
    let channel = feed::fetch_channel(&client, feed_url).await?;

    let candidate = match first_unmarked(feed::candidates(&channel), &store) {
        Ok(candidate) => candidate,
        Err(Error::UpToDate) => {
            info!("every weekly edition in the feed has already been delivered");
            return Ok(Outcome::UpToDate);
        }
        Err(e) => return Err(e),
    };
    info!(title = %candidate.title, url = %candidate.url, "selected edition");

    let raw = fetcher
        .fetch_edition(&candidate.url, &config.username, &config.password)
        .await?;
    let html = transform::transform(&raw)?;

    if config.no_email {
        out.write_all(html.as_bytes())?;
        out.flush()?;
    } else {
        let message = mail::build_message(&html, &candidate.title, &config.address);
        transport.send(&message).await?;
        info!(to = %config.address, "edition mailed");
    }

    // Delivery succeeded; only now does the edition count as done.
    store.add(&candidate.url)?;

    Ok(Outcome::Delivered {
        title: candidate.title,
    })
}
