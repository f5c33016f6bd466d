//! Content extraction from PDFs and web pages, and merging of sources.

use std::path::Path;
use std::time::Duration;

use podcast_domain::MergedContent;
use reqwest::StatusCode;
use scraper::{Html, Node, Selector};
use tracing::{debug, info, warn};

use crate::error::{Result, StudioError, UrlErrorCode, UrlFetchError};

/// Extracted text plus the log lines to forward to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    pub content: String,
    pub logs: Vec<String>,
}

/// A failed page fetch. Logs are still forwarded even though the content is
/// dropped.
#[derive(Debug, Clone)]
pub struct UrlFailure {
    pub error: UrlFetchError,
    pub logs: Vec<String>,
}

/// Elements whose text never belongs to the article body.
const SKIPPED_ELEMENTS: &[&str] = &[
    "script", "style", "noscript", "template", "svg", "nav", "header", "footer", "aside", "form",
    "iframe",
];

const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (compatible; podcast-studio/",
    env!("CARGO_PKG_VERSION"),
    ")"
);

#[derive(Debug, Clone)]
pub struct ContentParser {
    http: reqwest::Client,
    max_chars: usize,
}

impl ContentParser {
    pub fn new(fetch_timeout: Duration, max_chars: usize) -> Result<Self> {
        let http = podcast_minimax::http_client_builder()
            .timeout(fetch_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(podcast_minimax::Error::from)?;
        Ok(Self { http, max_chars })
    }

    /// Extract the text layer of a PDF. Extraction is CPU bound and runs on
    /// the blocking pool.
    pub async fn parse_pdf(&self, path: &Path) -> Result<ParseOutcome> {
        let owned = path.to_path_buf();
        let pdf_error = |reason: String| StudioError::Pdf {
            path: path.to_path_buf(),
            reason,
        };
        // The extractor panics on some malformed documents; a panic surfaces
        // here as a JoinError.
        let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&owned))
            .await
            .map_err(|e| pdf_error(format!("extractor aborted: {e}")))?
            .map_err(|e| pdf_error(e.to_string()))?;

        let content = normalize_text(&text);
        if content.is_empty() {
            return Err(pdf_error(
                "no extractable text (scanned document?)".to_string(),
            ));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let chars = content.chars().count();
        info!(file = %name, chars, "parsed PDF");
        Ok(ParseOutcome {
            logs: vec![format!("PDF parsed: {name}, {chars} characters extracted")],
            content,
        })
    }

    /// Fetch a web page and extract its readable text.
    pub async fn parse_url(&self, raw_url: &str) -> std::result::Result<ParseOutcome, UrlFailure> {
        let mut logs = Vec::new();
        let fail = |code, message: String, logs: Vec<String>| UrlFailure {
            error: UrlFetchError::new(code, message),
            logs,
        };

        let url = match url::Url::parse(raw_url.trim()) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => url,
            _ => {
                return Err(fail(
                    UrlErrorCode::InvalidUrl,
                    format!("Invalid URL: {raw_url}. Only http and https addresses are supported"),
                    logs,
                ));
            }
        };

        debug!(url = %url, "fetching page");
        let resp = match self.http.get(url.clone()).send().await {
            Ok(resp) => resp,
            Err(err) => {
                let (code, message) = classify_request_error(&err);
                warn!(url = %url, error = %err, "page fetch failed");
                logs.push(format!("Request error: {err}"));
                return Err(fail(code, message, logs));
            }
        };

        let status = resp.status();
        if !status.is_success() {
            let (code, message) = classify_status(status);
            logs.push(format!("Server answered HTTP {}", status.as_u16()));
            return Err(fail(code, message, logs));
        }

        let html = match resp.text().await {
            Ok(html) => html,
            Err(err) => {
                let (code, message) = classify_request_error(&err);
                logs.push(format!("Failed to read response body: {err}"));
                return Err(fail(code, message, logs));
            }
        };

        let page = extract_page_text(&html);
        if page.body.is_empty() {
            return Err(fail(
                UrlErrorCode::EmptyContent,
                "The page loaded but no readable text was found. It may require JavaScript or a login"
                    .to_string(),
                logs,
            ));
        }

        if let Some(title) = &page.title {
            logs.push(format!("Page title: {title}"));
        }
        let chars = page.body.chars().count();
        logs.push(format!("Web page parsed, {chars} characters extracted"));
        info!(url = %url, chars, "parsed web page");

        let content = match page.title {
            Some(title) => format!("{title}\n\n{}", page.body),
            None => page.body,
        };
        Ok(ParseOutcome { content, logs })
    }

    /// Merge the three sources and cap the result at the configured length.
    pub fn merge(&self, text: &str, url: &str, pdf: &str) -> (MergedContent, Option<String>) {
        let mut merged = MergedContent::merge(text, url, pdf);
        let total = merged.char_count();
        if merged.truncate_chars(self.max_chars) {
            warn!(total, kept = self.max_chars, "content truncated");
            let log = format!(
                "Content is {total} characters, only the first {} are used",
                self.max_chars
            );
            return (merged, Some(log));
        }
        (merged, None)
    }
}

fn classify_request_error(err: &reqwest::Error) -> (UrlErrorCode, String) {
    if err.is_timeout() {
        (
            UrlErrorCode::Timeout,
            "The page took too long to respond".to_string(),
        )
    } else if err.is_connect() {
        (
            UrlErrorCode::ConnectionFailed,
            "Could not connect to the site, check the address".to_string(),
        )
    } else {
        (
            UrlErrorCode::RequestFailed,
            format!("Failed to fetch the page: {err}"),
        )
    }
}

fn classify_status(status: StatusCode) -> (UrlErrorCode, String) {
    match status {
        StatusCode::FORBIDDEN => (
            UrlErrorCode::Forbidden,
            "The site refused access (HTTP 403); it may block automated readers".to_string(),
        ),
        StatusCode::NOT_FOUND => (
            UrlErrorCode::NotFound,
            "The page was not found (HTTP 404)".to_string(),
        ),
        other => (
            UrlErrorCode::HttpError,
            format!("The site returned HTTP {}", other.as_u16()),
        ),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageText {
    pub title: Option<String>,
    pub body: String,
}

/// Readable text of an HTML document, one block per line.
pub fn extract_page_text(html: &str) -> PageText {
    let document = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|sel| {
        document
            .select(&sel)
            .next()
            .map(|t| collapse_whitespace(&t.text().collect::<String>()))
            .filter(|t| !t.is_empty())
    });

    let root = Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element());

    let mut lines = Vec::new();
    for node in root.descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let skipped = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| SKIPPED_ELEMENTS.contains(&el.name()))
        });
        if skipped {
            continue;
        }
        let line = collapse_whitespace(text);
        if !line.is_empty() {
            lines.push(line);
        }
    }

    PageText {
        title,
        body: lines.join("\n"),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Trim each line and drop runs of blank lines.
fn normalize_text(text: &str) -> String {
    let mut out = Vec::new();
    let mut blank = false;
    for line in text.lines().map(str::trim) {
        if line.is_empty() {
            if !blank && !out.is_empty() {
                out.push("");
            }
            blank = true;
        } else {
            out.push(line);
            blank = false;
        }
    }
    while out.last() == Some(&"") {
        out.pop();
    }
    out.join("\n")
}
