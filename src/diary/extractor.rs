use std::sync::LazyLock;

use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::post::{truncate, Post};

/// Format of the date shown on each post, e.g. `15.03.2024 10:00`.
pub const POST_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

const POST_ID_PREFIX: &str = "postid_";

static POST: LazyLock<Selector> = LazyLock::new(|| selector(".post"));
static INFO: LazyLock<Selector> = LazyLock::new(|| selector("div.post__info"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a.post__option"));
static DATE: LazyLock<Selector> = LazyLock::new(|| selector("div.post__date"));
static AUTHOR: LazyLock<Selector> =
    LazyLock::new(|| selector("div.post__author-wrapper a.post__author"));
static TEXT: LazyLock<Selector> = LazyLock::new(|| selector("div.post__content div.post__text"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("Invalid selector")
}

/// Options controlling how a page is turned into posts.
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// Maximum codepoints kept in [`Post::preview`].
    pub preview_len: usize,
    /// Stop after this many post containers.
    pub limit: Option<usize>,
    /// Page URL; relative post links are resolved against it.
    pub base_url: Option<Url>,
}

/// Extract posts from a diary page, in document order.
///
/// Malformed containers degrade to empty fields instead of failing the page.
#[must_use]
pub fn extract_posts(html: &str, options: &ExtractOptions) -> Vec<Post> {
    let document = Html::parse_document(html);
    let limit = options.limit.unwrap_or(usize::MAX);

    document
        .select(&POST)
        .take(limit)
        .map(|container| extract_post(&container, options))
        .collect()
}

/// Build a [`Post`] from a single `.post` container.
fn extract_post(container: &ElementRef, options: &ExtractOptions) -> Post {
    let id = container.value().attr("id").map_or(0, parse_post_id);

    let info = container.select(&INFO).next();

    let url = info
        .and_then(|info| info.select(&LINK).next())
        .and_then(|link| link.value().attr("href"))
        .map(|href| resolve_url(href, options.base_url.as_ref()))
        .unwrap_or_default();

    let post_date = info
        .and_then(|info| info.select(&DATE).next())
        .and_then(|date| parse_post_date(&element_text(&date)));

    let author = info
        .and_then(|info| info.select(&AUTHOR).next())
        .map(|author| element_text(&author).trim().to_string())
        .unwrap_or_default();

    let content = container
        .select(&TEXT)
        .next()
        .map(|text| element_text(&text))
        .unwrap_or_default();

    let preview = truncate(&content, options.preview_len);

    Post {
        id,
        post_date,
        url,
        author,
        content,
        preview,
    }
}

/// Parse `postid_123` into `123`; anything else yields `0`.
#[must_use]
pub fn parse_post_id(attr: &str) -> i64 {
    let raw = attr.strip_prefix(POST_ID_PREFIX).unwrap_or(attr);
    raw.parse().unwrap_or_else(|_| {
        debug!(attr, "Unparseable post id");
        0
    })
}

/// Parse a post date. Surrounding whitespace is ignored.
#[must_use]
pub fn parse_post_date(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    NaiveDateTime::parse_from_str(trimmed, POST_DATE_FORMAT)
        .inspect_err(|e| debug!(date = trimmed, "Unparseable post date: {e}"))
        .ok()
}

fn element_text(element: &ElementRef) -> String {
    element.text().collect()
}

fn resolve_url(href: &str, base: Option<&Url>) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map_or_else(|_| href.to_string(), String::from),
        None => href.to_string(),
    }
}
