//! Edition page rewriting
//!
//! The bigpage rendering of a weekly edition arrives wrapped in the full
//! site chrome: navigation, sidebars, ad slots. Only two pieces survive the
//! rewrite: the document title and the `div.ArticleText` container holding
//! the edition body. Section headlines (`p.Cat1HL`) are retagged as `h1`
//! elements so e-book readers produce a usable chapter structure.
//!
//! Parsing is permissive (html5ever tree building), so malformed markup in
//! the page body is tolerated. A page without the expected container or
//! title means the site layout changed out from under us, which is fatal.

use crate::error::{Error, Result};
use html5ever::{QualName, local_name, namespace_url, ns};
use scraper::{Html, Node, Selector};
use std::sync::LazyLock;
use tracing::debug;

#[allow(clippy::expect_used)]
static ARTICLE_BODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div.ArticleText").expect("static selector"));

#[allow(clippy::expect_used)]
static HEAD_TITLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("head title").expect("static selector"));

#[allow(clippy::expect_used)]
static SECTION_HEADLINE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("p.Cat1HL").expect("static selector"));

/// Rewrite a fetched edition page into a minimal self-contained document.
///
/// # Errors
///
/// Returns [`Error::Layout`] when the page has no `div.ArticleText`
/// container or no `head title` element.
pub fn transform(raw_html: &str) -> Result<String> {
    let mut document = Html::parse_document(raw_html);

    if document.select(&ARTICLE_BODY).next().is_none() {
        return Err(Error::Layout(
            "content container div.ArticleText not found".to_string(),
        ));
    }
    if document.select(&HEAD_TITLE).next().is_none() {
        return Err(Error::Layout("document has no title element".to_string()));
    }

    retag_headlines(&mut document);

    let title = document
        .select(&HEAD_TITLE)
        .next()
        .ok_or_else(|| Error::Layout("document has no title element".to_string()))?;
    let container = document
        .select(&ARTICLE_BODY)
        .next()
        .ok_or_else(|| Error::Layout("content container div.ArticleText not found".to_string()))?;

    Ok(format!(
        "<html>\n<head>{}</head>\n<body>\n{}\n</body>\n</html>\n",
        title.html(),
        container.html()
    ))
}

/// Retag every `p.Cat1HL` as a top-level heading, in place.
fn retag_headlines(document: &mut Html) {
    let headline_ids: Vec<_> = document
        .select(&SECTION_HEADLINE)
        .map(|element| element.id())
        .collect();
    debug!(count = headline_ids.len(), "retagging section headlines");

    for id in headline_ids {
        if let Some(mut node) = document.tree.get_mut(id)
            && let Node::Element(element) = node.value()
        {
            element.name = QualName::new(None, ns!(html), local_name!("h1"));
        }
    }
}
