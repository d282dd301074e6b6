use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

/// Configuration for the article fetcher
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (compatible; FinPulse/1.0)".to_string(),
        }
    }
}

impl ScraperConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_secs: std::env::var("SCRAPER_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_secs),
            user_agent: std::env::var("SCRAPER_USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

/// Capability to pull cleaned article text for a URL. Failure is signalled
/// as `None`, never as a hard error; the caller owns any retry policy.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    async fn fetch_article_text(&self, url: &str) -> Option<String>;
}

/// Fetches a page and extracts readable text, dropping script/style/nav
/// noise. Prefers the `<article>` container when the page exposes one.
pub struct ScraperService {
    client: Client,
}

impl ScraperService {
    pub fn new(config: ScraperConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl ContentFetcher for ScraperService {
    async fn fetch_article_text(&self, url: &str) -> Option<String> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Failed to load article {}: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("Article {} returned HTTP {}", url, response.status());
            return None;
        }

        let body = match response.text().await {
            Ok(b) => b,
            Err(e) => {
                warn!("Failed to read article body {}: {}", url, e);
                return None;
            }
        };

        let text = extract_readable_text(&body);
        info!("Fetched article {} ({} chars)", url, text.len());

        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// Tags whose subtrees are never article content
const NOISE_TAGS: &[&str] = &[
    "script", "style", "noscript", "header", "footer", "form", "nav", "aside",
];

/// Tags the fallback extraction collects when no `<article>` exists
const CONTENT_TAGS: &[&str] = &["p", "h1", "h2", "h3", "li"];

/// Pull readable text out of an HTML document. Noise subtrees (script,
/// style, nav, footer and the like) are skipped during collection, so an
/// ad-config `<script>` inside `<article>` or a menu `<li>` inside `<nav>`
/// never reaches the model input.
fn extract_readable_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let article_selector = Selector::parse("article").expect("invalid selector");
    let content_selector =
        Selector::parse("p, h1, h2, h3, li").expect("invalid selector");

    let mut parts: Vec<String> = Vec::new();

    if let Some(article) = document.select(&article_selector).next() {
        push_clean_text(article, &mut parts);
    } else {
        for element in document.select(&content_selector) {
            // Skip nested content elements (li > p); the outer element
            // already collects their text once.
            if has_ancestor_in(&element, NOISE_TAGS) || has_ancestor_in(&element, CONTENT_TAGS) {
                continue;
            }
            push_clean_text(element, &mut parts);
        }
    }

    parts
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collect text from an element's subtree, pruning noise subtrees
fn push_clean_text(element: ElementRef, parts: &mut Vec<String>) {
    if NOISE_TAGS.contains(&element.value().name()) {
        return;
    }

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            push_clean_text(child_element, parts);
        } else if let Some(text) = child.value().as_text() {
            parts.push(text.to_string());
        }
    }
}

fn has_ancestor_in(element: &ElementRef, names: &[&str]) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| names.contains(&ancestor.value().name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_container() {
        let html = r#"
            <html><body>
            <nav><p>Меню сайта</p></nav>
            <article><p>Ключевая новость дня.</p></article>
            </body></html>
        "#;
        let text = extract_readable_text(html);
        assert_eq!(text, "Ключевая новость дня.");
    }

    #[test]
    fn falls_back_to_content_elements() {
        let html = r#"
            <html><body>
            <script>var x = 1;</script>
            <h1>Заголовок</h1>
            <p>Первый абзац.</p>
            </body></html>
        "#;
        let text = extract_readable_text(html);
        assert_eq!(text, "Заголовок Первый абзац.");
    }

    #[test]
    fn script_noise_is_excluded() {
        let html = "<html><body><script>alert('spam')</script><p>Чисто.</p></body></html>";
        let text = extract_readable_text(html);
        assert!(!text.contains("spam"));
        assert_eq!(text, "Чисто.");
    }

    #[test]
    fn script_inside_article_is_stripped() {
        let html = r#"
            <html><body>
            <article>
            <p>ЦБ сохранил ставку.</p>
            <script>var adConfig = {slot: "leak_me"};</script>
            <style>.banner { display: none; }</style>
            </article>
            </body></html>
        "#;
        let text = extract_readable_text(html);
        assert_eq!(text, "ЦБ сохранил ставку.");
        assert!(!text.contains("adConfig"));
    }

    #[test]
    fn nav_and_footer_are_excluded_from_fallback() {
        let html = r#"
            <html><body>
            <nav><ul><li>Подписка</li><li>Курсы валют</li></ul></nav>
            <h1>Заголовок</h1>
            <p>Первый абзац.</p>
            <footer><p>Контакты редакции</p></footer>
            </body></html>
        "#;
        let text = extract_readable_text(html);
        assert_eq!(text, "Заголовок Первый абзац.");
        assert!(!text.contains("Подписка"));
        assert!(!text.contains("Контакты"));
    }

    #[test]
    fn nested_content_elements_are_counted_once() {
        let html = "<html><body><ul><li><p>Единственный пункт</p></li></ul></body></html>";
        assert_eq!(extract_readable_text(html), "Единственный пункт");
    }

    #[test]
    fn empty_document_yields_empty_text() {
        assert_eq!(extract_readable_text("<html><body></body></html>"), "");
    }
}
