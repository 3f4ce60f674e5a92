//! Readable text for a web locator.

use anyhow::{Context, Result};
use assistant_core::ContentSource;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Elements whose whole content is dropped.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "head", "template"];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: [&str; 16] = [
    "p", "div", "br", "li", "tr", "h1", "h2", "h3", "h4", "h5", "h6", "section", "article",
    "header", "footer", "blockquote",
];

#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout (seconds)
    pub timeout: u64,
    pub user_agent: String,
    /// Maximum response size (bytes)
    pub max_size: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: 10,
            user_agent: "Mozilla/5.0 (compatible; assistant/0.1)".to_string(),
            max_size: 5_000_000,
        }
    }
}

/// Fetches pages over HTTP(S) and reduces HTML to plain text.
pub struct WebContent {
    client: Client,
    config: FetchConfig,
}

impl WebContent {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl ContentSource for WebContent {
    async fn get_content(&self, locator: &str) -> Result<String> {
        let url = normalize_locator(locator)?;
        info!("Fetching {url}");

        let response = self
            .client
            .get(url.clone())
            .header("User-Agent", &self.config.user_agent)
            .header("Accept", "text/html, text/plain")
            .send()
            .await
            .with_context(|| format!("HTTP request to {url} failed"))?
            .error_for_status()?;

        let is_html = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("html"));

        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?;
        if bytes.len() > self.config.max_size {
            anyhow::bail!(
                "Response too large: {} bytes (max: {})",
                bytes.len(),
                self.config.max_size
            );
        }

        let body = String::from_utf8_lossy(&bytes);
        let text = if is_html {
            html_to_text(&body)
        } else {
            body.into_owned()
        };

        if text.trim().is_empty() {
            anyhow::bail!("No readable text found at {url}");
        }
        Ok(text)
    }
}

/// Accept a full http(s) URL or promote a bare host/path to `https://`.
pub fn normalize_locator(locator: &str) -> Result<Url> {
    let locator = locator.trim();
    if let Ok(url) = Url::parse(locator) {
        if matches!(url.scheme(), "http" | "https") {
            return Ok(url);
        }
    }
    if locator.contains("://") {
        anyhow::bail!("Only http and https URLs are supported: {locator}");
    }
    Url::parse(&format!("https://{locator}")).with_context(|| format!("Invalid URL: {locator}"))
}

/// Reduce an HTML document to its visible text.
///
/// Non-content elements are dropped, block elements become line breaks,
/// common entities are decoded and whitespace is collapsed.
#[must_use]
pub fn html_to_text(html: &str) -> String {
    let mut text = String::with_capacity(html.len() / 2);
    let mut rest = html;

    while let Some(start) = rest.find('<') {
        text.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        if let Some(comment) = after.strip_prefix("!--") {
            rest = comment.find("-->").map_or("", |end| &comment[end + 3..]);
            continue;
        }

        let Some(end) = after.find('>') else {
            rest = "";
            break;
        };
        let tag = &after[..end];
        rest = &after[end + 1..];

        let closing = tag.starts_with('/');
        let name = tag_name(tag);
        if !closing && SKIPPED_ELEMENTS.contains(&name.as_str()) && !tag.ends_with('/') {
            rest = skip_past_closing(rest, &name);
        } else if BLOCK_ELEMENTS.contains(&name.as_str()) {
            text.push('\n');
        }
    }
    text.push_str(rest);

    decode_entities(&text)
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn tag_name(tag: &str) -> String {
    tag.trim_start_matches('/')
        .chars()
        .take_while(char::is_ascii_alphanumeric)
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Return what follows `</name ...>` in `rest`, or nothing if it never closes.
fn skip_past_closing<'a>(rest: &'a str, name: &str) -> &'a str {
    let close = format!("</{name}");
    let Some(at) = rest.to_ascii_lowercase().find(&close) else {
        return "";
    };
    let tail = &rest[at..];
    tail.find('>').map_or("", |end| &tail[end + 1..])
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
