// ─── Blog Feed ───
// Fetches published posts from the Hytale blog API and normalises them
// for display.

use std::time::Duration;

use chrono::{DateTime, Datelike, FixedOffset};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};

pub const NEWS_ENDPOINT: &str = "https://hytale.com/api/blog/post/published";
const NEWS_PAGE_BASE: &str = "https://hytale.com/news";
const CDN_THUMB_BASE: &str = "https://cdn.hytale.com/variants/blog_thumb_";
const NEWS_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverImage {
    #[serde(default)]
    pub s3_key: String,
}

/// A blog post, as served by the API plus the derived display fields
/// (`excerpt`, `url`, `date`, `image_url`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsItem {
    pub title: String,
    pub body_excerpt: String,
    pub excerpt: String,
    pub url: String,
    pub date: String,
    pub published_at: String,
    pub slug: String,
    pub cover_image: CoverImage,
    pub author: String,
    pub image_url: String,
}

/// Fetch up to `limit` posts from `endpoint`.
pub async fn fetch_news(
    client: &reqwest::Client,
    endpoint: &str,
    limit: usize,
) -> LauncherResult<Vec<NewsItem>> {
    info!("Fetching news (limit {})...", limit);

    let response = client
        .get(endpoint)
        .query(&[("limit", limit)])
        .header(ACCEPT, "application/json")
        .timeout(NEWS_TIMEOUT)
        .send()
        .await?;

    let status = response.status();
    if status != reqwest::StatusCode::OK {
        return Err(LauncherError::DownloadFailed {
            url: endpoint.to_string(),
            status: status.as_u16(),
        });
    }

    let body = response.text().await?;
    let items = parse_news_json(&body)?;
    info!("Loaded {} news posts", items.len());
    Ok(items)
}

/// Decode the API payload and fill in the display fields.
pub fn parse_news_json(body: &str) -> LauncherResult<Vec<NewsItem>> {
    let mut items: Vec<NewsItem> = serde_json::from_str(body)?;

    for item in &mut items {
        let published = DateTime::parse_from_rfc3339(&item.published_at).map_err(|_| {
            LauncherError::InvalidNewsDate {
                slug: item.slug.clone(),
                value: item.published_at.clone(),
            }
        })?;

        item.url = post_url(&published, &item.slug);
        item.date = display_date(&published);
        item.excerpt = unescape_html(&item.body_excerpt);
        item.image_url = format!("{}{}", CDN_THUMB_BASE, item.cover_image.s3_key);
    }

    Ok(items)
}

/// `https://hytale.com/news/2026/1/hytale-patch-notes-update-1`
fn post_url(published: &DateTime<FixedOffset>, slug: &str) -> String {
    format!(
        "{}/{}/{}/{}",
        NEWS_PAGE_BASE,
        published.year(),
        published.month(),
        slug
    )
}

/// Same format the blog itself shows, e.g. `January 23rd 2026`.
fn display_date(published: &DateTime<FixedOffset>) -> String {
    format!(
        "{} {} {}",
        published.format("%B"),
        ordinal(published.day()),
        published.year()
    )
}

fn ordinal(n: u32) -> String {
    let suffix = match n {
        1 | 21 | 31 => "st",
        2 | 22 => "nd",
        3 | 23 => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Decode `&name;`, `&#N;` and `&#xN;` references one at a time. Anything
/// that is not a known reference (a bare `&`, `&bogus;`) stays as written.
fn unescape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];

        let decoded = after.find(';').and_then(|end| {
            let name = &after[..end];
            let valid = !name.is_empty()
                && !name.contains(|c: char| c.is_whitespace() || c == '&');
            valid
                .then(|| resolve_entity(name))
                .flatten()
                .map(|text| (text, end + 1))
        });

        match decoded {
            Some((text, consumed)) => {
                out.push_str(&text);
                rest = &after[consumed..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn resolve_entity(name: &str) -> Option<String> {
    match name.strip_prefix('#') {
        Some(num) => {
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse::<u32>().ok()?,
            };
            char::from_u32(code).map(String::from)
        }
        None => quick_xml::escape::resolve_html5_entity(name).map(str::to_string),
    }
}
