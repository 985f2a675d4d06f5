//! Weekly edition discovery from the LWN.net Features feed
//!
//! LWN publishes an RSS 1.0 (RDF) feed of feature articles. This module
//! fetches it, filters it down to Weekly Edition entries, and rewrites each
//! entry into a [`Candidate`]: the canonical "bigpage printable" URL plus a
//! short display title.

use crate::USER_AGENT;
use crate::error::{Error, Result};
use regex::Regex;
use rss::Channel;
use std::sync::LazyLock;
use tracing::debug;

/// The feed listing LWN feature articles, weekly editions included.
pub const FEED_URL: &str = "https://lwn.net/headlines/Features";

/// Canonical per-edition feed links end with this suffix.
const EDITION_LINK_SUFFIX: &str = "/rss";

/// Query form that renders the whole edition as one printable page.
const BIGPAGE_SUFFIX: &str = "bigpage?format=printable";

/// Any entry matching this title is a Weekly Edition. The `[$]` prefix
/// marks subscriber-only entries and is optional.
#[allow(clippy::expect_used)]
static WEEKLY_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\[\$\] )?LWN\.net Weekly Edition for").expect("static regex"));

/// Rewrites a Weekly Edition title to a short form that fits e-book reader
/// displays: only the date is kept, behind a fixed label.
#[allow(clippy::expect_used)]
static TITLE_REWRITE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\[\$\] )?LWN\.net Weekly Edition for (.*)$").expect("static regex")
});

/// A Weekly Edition eligible for delivery
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    /// Canonical bigpage-printable URL, always HTTPS. Uniquely identifies
    /// the edition and keys its delivery mark.
    pub url: String,

    /// Short display title, used as the mail subject and attachment name
    pub title: String,
}

/// Build the HTTP client used for feed fetching.
///
/// # Errors
/// Returns [`Error::Feed`] if the client cannot be constructed.
pub fn http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::Feed(format!("failed to create HTTP client: {e}")))
}

/// Fetch and parse the features feed.
///
/// # Errors
/// Returns [`Error::Feed`] on a non-success HTTP status or unparsable feed
/// content, [`Error::Network`] on transport failures. All are fatal; a feed
/// that cannot be read aborts the run.
pub async fn fetch_channel(client: &reqwest::Client, feed_url: &str) -> Result<Channel> {
    debug!(url = feed_url, "fetching features feed");

    let response = client.get(feed_url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::Feed(format!(
            "feed returned HTTP {}: {}",
            status.as_u16(),
            feed_url
        )));
    }

    let body = response.bytes().await?;
    Channel::read_from(&body[..]).map_err(|e| Error::Feed(format!("feed parse error: {e}")))
}

/// Yield Weekly Edition candidates from a parsed channel, in feed order.
///
/// Entries missing a title or link are skipped, as are entries that are not
/// weekly editions or whose link is not in the canonical per-edition form.
/// The sequence is lazy and single-pass; callers that stop early never pay
/// for the remaining entries.
pub fn candidates(channel: &Channel) -> impl Iterator<Item = Candidate> + '_ {
    channel.items().iter().filter_map(|item| {
        let (Some(title), Some(link)) = (item.title(), item.link()) else {
            debug!("skipping feed entry without title or link");
            return None;
        };
        if !WEEKLY_TITLE.is_match(title) || !link.ends_with(EDITION_LINK_SUFFIX) {
            return None;
        }
        Some(Candidate {
            url: bigpage_url(link),
            title: short_title(title),
        })
    })
}

/// Rewrite a per-edition feed link into the bigpage-printable form.
///
/// The trailing `rss` path segment is replaced with the bigpage query, and
/// the scheme is upgraded to HTTPS unconditionally: the feed still hands
/// out `http://` links even though the site serves HTTPS.
fn bigpage_url(link: &str) -> String {
    let base = link.strip_suffix("rss").unwrap_or(link);
    to_https(&format!("{base}{BIGPAGE_SUFFIX}"))
}

fn to_https(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}

fn short_title(title: &str) -> String {
    TITLE_REWRITE.replace(title, "LWN: $1").into_owned()
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    /// RSS 1.0 places `item` elements as siblings of `channel`, matching
    /// what the live feed serves.
    const FEATURES_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://lwn.net">
    <title>LWN.net</title>
    <link>https://lwn.net</link>
    <description>LWN.net Features</description>
  </channel>
  <item rdf:about="https://lwn.net/Articles/1012073/rss">
    <title>[$] LWN.net Weekly Edition for March 5, 2025</title>
    <link>http://lwn.net/Articles/1012073/rss</link>
  </item>
  <item rdf:about="https://lwn.net/Articles/1011911/rss">
    <title>[$] A look at some interesting kernel work</title>
    <link>http://lwn.net/Articles/1011911/rss</link>
  </item>
  <item rdf:about="https://lwn.net/Articles/1011300/rss">
    <title>LWN.net Weekly Edition for February 27, 2025</title>
    <link>http://lwn.net/Articles/1011300/rss</link>
  </item>
  <item rdf:about="https://lwn.net/Articles/1010002/">
    <title>[$] LWN.net Weekly Edition for February 20, 2025</title>
    <link>http://lwn.net/Articles/1010002/</link>
  </item>
</rdf:RDF>"#;

    fn parsed() -> Channel {
        Channel::read_from(FEATURES_FEED.as_bytes()).expect("fixture parses")
    }

    #[test]
    fn yields_weekly_editions_in_feed_order() {
        let channel = parsed();
        let found: Vec<_> = candidates(&channel).collect();

        // The non-edition article and the entry without the /rss link form
        // are both filtered out.
        assert_eq!(found.len(), 2);
        assert_eq!(
            found[0],
            Candidate {
                url: "https://lwn.net/Articles/1012073/bigpage?format=printable".to_string(),
                title: "LWN: March 5, 2025".to_string(),
            }
        );
        assert_eq!(
            found[1],
            Candidate {
                url: "https://lwn.net/Articles/1011300/bigpage?format=printable".to_string(),
                title: "LWN: February 27, 2025".to_string(),
            }
        );
    }

    #[test]
    fn entries_without_title_or_link_are_skipped() {
        let feed = r#"<?xml version="1.0" encoding="UTF-8"?>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns="http://purl.org/rss/1.0/">
  <channel rdf:about="https://lwn.net">
    <title>LWN.net</title>
    <link>https://lwn.net</link>
    <description>LWN.net Features</description>
  </channel>
  <item rdf:about="https://lwn.net/Articles/1/rss">
    <title>[$] LWN.net Weekly Edition for January 1, 2025</title>
  </item>
</rdf:RDF>"#;
        let channel = Channel::read_from(feed.as_bytes()).unwrap();
        assert_eq!(candidates(&channel).count(), 0);
    }

    #[test]
    fn url_is_canonicalized_to_https_bigpage() {
        assert_eq!(
            bigpage_url("http://example.org/Articles/123/rss"),
            "https://example.org/Articles/123/bigpage?format=printable"
        );
        // Already-secure links keep their scheme.
        assert_eq!(
            bigpage_url("https://example.org/Articles/123/rss"),
            "https://example.org/Articles/123/bigpage?format=printable"
        );
    }

    #[test]
    fn title_is_shortened_with_and_without_paywall_prefix() {
        assert_eq!(
            short_title("[$] LWN.net Weekly Edition for March 5, 2025"),
            "LWN: March 5, 2025"
        );
        assert_eq!(
            short_title("LWN.net Weekly Edition for March 5, 2025"),
            "LWN: March 5, 2025"
        );
    }

    #[test]
    fn weekly_title_pattern_rejects_other_features() {
        assert!(WEEKLY_TITLE.is_match("[$] LWN.net Weekly Edition for March 5, 2025"));
        assert!(WEEKLY_TITLE.is_match("LWN.net Weekly Edition for March 5, 2025"));
        assert!(!WEEKLY_TITLE.is_match("[$] A look at some interesting kernel work"));
        assert!(!WEEKLY_TITLE.is_match("Weekly Edition for March 5, 2025"));
    }

    #[tokio::test]
    async fn fetch_channel_rejects_http_errors() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/headlines/Features"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = http_client().unwrap();
        let url = format!("{}/headlines/Features", server.uri());
        let result = fetch_channel(&client, &url).await;

        assert!(matches!(result, Err(Error::Feed(_))));
    }

    #[tokio::test]
    async fn fetch_channel_rejects_unparsable_content() {
        use wiremock::matchers::{header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/headlines/Features"))
            .and(header("user-agent", USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("this is not a feed"))
            .mount(&server)
            .await;

        let client = http_client().unwrap();
        let url = format!("{}/headlines/Features", server.uri());
        let result = fetch_channel(&client, &url).await;

        assert!(matches!(result, Err(Error::Feed(_))));
    }

    #[tokio::test]
    async fn fetch_channel_parses_served_feed() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/headlines/Features"))
            .respond_with(ResponseTemplate::new(200).set_body_string(FEATURES_FEED))
            .mount(&server)
            .await;

        let client = http_client().unwrap();
        let url = format!("{}/headlines/Features", server.uri());
        let channel = fetch_channel(&client, &url).await.unwrap();

        assert_eq!(candidates(&channel).count(), 2);
    }
}
