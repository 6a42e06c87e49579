//! Heuristic URL content fetcher.
//!
//! One bounded-time fetch, no retries. Extraction runs an ordered list of
//! CSS-selector candidates per field, then regex fallbacks over the page
//! text; the first non-empty match wins. Any failure — timeout, non-2xx,
//! network error, unparseable page — yields the all-empty default rather
//! than an error, so a broken third-party page can never block a save.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use scraper::{Html, Selector};
use tracing::{debug, warn};
use url::Url;

use waymark_core::{defaults, Error, Result, UrlContent};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; Waymark/1.0)";

const ACCEPT_HEADER: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const ADDRESS_SELECTORS: &[&str] = &[
    r#"[itemtype*="PostalAddress"]"#,
    r#"[class*="address"]"#,
    r#"[class*="location"]"#,
    "address",
    r#"[data-testid*="address"]"#,
];

const HOURS_SELECTORS: &[&str] = &[
    r#"[class*="hours"]"#,
    r#"[class*="schedule"]"#,
    r#"[itemtype*="OpeningHoursSpecification"]"#,
];

const REVIEW_SELECTORS: &[&str] = &[
    r#"[class*="review"]"#,
    r#"[itemtype*="Review"]"#,
    r#"[data-testid*="review"]"#,
];

const RATING_SELECTORS: &[&str] = &[
    r#"[class*="rating"]"#,
    r#"[itemtype*="AggregateRating"]"#,
    r#"[aria-label*="rating"]"#,
];

const CUISINE_SELECTORS: &[&str] = &[
    r#"[class*="cuisine"]"#,
    r#"[class*="category"]"#,
    r#"[itemtype*="Restaurant"] [class*="type"]"#,
];

const RESERVATION_SELECTORS: &[&str] = &[
    r#"a[href*="reservation"]"#,
    r#"a[href*="resy.com"]"#,
    r#"a[href*="opentable.com"]"#,
    r#"a[href*="yelp.com/reservations"]"#,
    r#"a[href*="book"]"#,
    r#"[class*="reserve"] a"#,
    r#"[class*="booking"] a"#,
];

const CUISINE_TYPES: &[&str] = &[
    "Thai", "Italian", "Japanese", "Chinese", "Indian", "Mexican", "French", "Korean",
    "Vietnamese", "Mediterranean", "American", "Seafood", "Steakhouse", "Sushi", "Pizza", "BBQ",
    "Greek", "Spanish", "Middle Eastern", "Fusion",
];

fn phone_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)T:\s*(\+\d{1,4}[\s.-]?\d{2,4}[\s.-]?\d{3}[\s.-]?\d{3,4})",
            r"(?i)(?:tel|phone|call)[:\s]*(\+?\d{1,4}[\s.-]?\d{2,4}[\s.-]?\d{3}[\s.-]?\d{3,4})",
            r"(\+\d{1,4}[\s.-]?\d{2,4}[\s.-]?\d{3}[\s.-]?\d{3,4})",
            r"(\+?1?[-.\s]?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4})",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn hours_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)(?:hours|open)[:\s]*(?:daily\s+)?(?:for\s+\w+\s+)?(?:from\s+)?(\d{1,2}[:.]\d{2}\s*[-–]\s*\d{1,2}[:.]\d{2})",
            r"(?i)(\d{1,2}[:.]\d{2}\s*(?:am|pm)?\s*[-–]\s*\d{1,2}[:.]\d{2}\s*(?:am|pm)?)",
            r"(?i)(?:open|hours)[:\s]*([^\n]{10,60}(?:am|pm|daily|\d{2}:\d{2}))",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

fn rating_pattern() -> &'static Option<Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\d+\.?\d*)\s*(?:/\s*5|out of 5|stars?)?").ok())
}

fn price_pattern() -> &'static Option<Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(\$+|\$\$\$?-\$\$\$\$|€+|£+)").ok())
}

fn cuisine_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        CUISINE_TYPES
            .iter()
            .filter_map(|name| {
                let pattern = format!(
                    r"(?i){}\s*(?:cuisine|restaurant|food|kitchen|cooking)",
                    regex::escape(&name.to_lowercase())
                );
                Regex::new(&pattern).ok().map(|re| (*name, re))
            })
            .collect()
    })
}

fn strip_non_content_tags() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        ["script", "style", "noscript", "iframe"]
            .iter()
            .filter_map(|tag| Regex::new(&format!(r"(?is)<{tag}[^>]*>.*?</{tag}>")).ok())
            .collect()
    })
}

/// Fetches third-party pages and extracts best-effort structured content.
#[derive(Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
}

impl ContentFetcher {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(defaults::FETCH_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }

    /// Fetch a URL and extract structured content.
    ///
    /// Never returns an error — a failed fetch is an empty content record.
    pub async fn fetch(&self, url: &str) -> UrlContent {
        match self.try_fetch(url).await {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    subsystem = "enrich",
                    component = "fetcher",
                    op = "fetch",
                    url = url,
                    error = %e,
                    "Page fetch failed, continuing with empty content"
                );
                UrlContent::default()
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<UrlContent> {
        let response = self
            .client
            .get(url)
            .header("Accept", ACCEPT_HEADER)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Request(format!(
                "Failed to fetch URL: {}",
                response.status().as_u16()
            )));
        }

        let html = response.text().await?;
        let content = extract_content(&html, url);
        debug!(
            subsystem = "enrich",
            component = "fetcher",
            op = "extract",
            url = url,
            title_found = !content.title.is_empty(),
            address_found = content.address.is_some(),
            image_count = content.images.len(),
            "Page content extracted"
        );
        Ok(content)
    }
}

impl Default for ContentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn collapse_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First non-empty trimmed text among the selector candidates, optionally
/// bounded in length.
fn select_first_text(
    doc: &Html,
    selectors: &[&str],
    min_len: usize,
    max_len: usize,
) -> Option<String> {
    for selector in selectors.iter().filter_map(|s| Selector::parse(s).ok()) {
        if let Some(element) = doc.select(&selector).next() {
            let text = collapse_ws(&element.text().collect::<Vec<_>>().join(" "));
            if text.len() > min_len && text.len() < max_len {
                return Some(text);
            }
        }
    }
    None
}

fn meta_content(doc: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    doc.select(&selector)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn resolve_url(base: &Url, candidate: &str) -> Option<String> {
    base.join(candidate).ok().map(|u| u.to_string())
}

/// Extract structured fields from raw HTML. Pure; exercised directly by
/// unit tests without a live server.
pub fn extract_content(raw_html: &str, page_url: &str) -> UrlContent {
    // Drop script/style/noscript/iframe bodies before parsing so their
    // contents never leak into text extraction.
    let mut html = raw_html.to_string();
    for pattern in strip_non_content_tags() {
        html = pattern.replace_all(&html, " ").into_owned();
    }

    let doc = Html::parse_document(&html);
    let base = Url::parse(page_url).ok();

    // Title: <title>, og:title, first <h1> — in that order.
    let title = select_first_text(&doc, &["title"], 0, usize::MAX)
        .or_else(|| meta_content(&doc, r#"meta[property="og:title"]"#))
        .or_else(|| select_first_text(&doc, &["h1"], 0, usize::MAX))
        .unwrap_or_default();

    let description = meta_content(&doc, r#"meta[name="description"]"#)
        .or_else(|| meta_content(&doc, r#"meta[property="og:description"]"#))
        .unwrap_or_default();

    // Bounded body text, used for regex fallbacks and prompt excerpts.
    let body_text = select_first_text(&doc, &["body"], 0, usize::MAX)
        .unwrap_or_default()
        .chars()
        .take(defaults::FETCH_BODY_TEXT_LIMIT)
        .collect::<String>();

    let address = select_first_text(&doc, ADDRESS_SELECTORS, 10, 200);

    let phone = phone_patterns()
        .iter()
        .find_map(|re| re.captures(&html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string());

    let hours = select_first_text(&doc, HOURS_SELECTORS, 5, 500).or_else(|| {
        hours_patterns()
            .iter()
            .find_map(|re| re.captures(&body_text))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
    });

    let mut reviews = Vec::new();
    for selector in REVIEW_SELECTORS.iter().filter_map(|s| Selector::parse(s).ok()) {
        for element in doc.select(&selector).take(5) {
            let text = collapse_ws(&element.text().collect::<Vec<_>>().join(" "));
            if text.len() > 50 && text.len() < 1000 {
                reviews.push(text);
            }
        }
        if !reviews.is_empty() {
            break;
        }
    }

    let rating = RATING_SELECTORS
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            let element = doc.select(&selector).next()?;
            let text = collapse_ws(&element.text().collect::<Vec<_>>().join(" "));
            let re = rating_pattern().as_ref()?;
            re.captures(&text)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        });

    let price_range = price_pattern()
        .as_ref()
        .and_then(|re| re.captures(&html))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let cuisine = select_first_text(&doc, CUISINE_SELECTORS, 3, 100).or_else(|| {
        let lower = body_text.to_lowercase();
        cuisine_patterns()
            .iter()
            .find(|(_, re)| re.is_match(&lower))
            .map(|(name, _)| name.to_string())
    });

    // Images: og:image first (usually the hero), then content images with
    // icons, logos, and tiny dimensions filtered out.
    let mut images: Vec<String> = Vec::new();
    if let (Some(base), Some(og_image)) = (&base, meta_content(&doc, r#"meta[property="og:image"]"#))
    {
        if let Some(resolved) = resolve_url(base, &og_image) {
            images.push(resolved);
        }
    }
    if let (Some(base), Ok(selector)) = (&base, Selector::parse("img[src]")) {
        for element in doc.select(&selector) {
            if images.len() >= defaults::FETCH_MAX_IMAGES {
                break;
            }
            let Some(src) = element.value().attr("src") else {
                continue;
            };
            if src.contains("data:") || src.contains("svg") {
                continue;
            }
            if src.contains("logo") || src.contains("icon") {
                continue;
            }
            let too_small = |attr: &str, min: u32| {
                element
                    .value()
                    .attr(attr)
                    .and_then(|v| v.parse::<u32>().ok())
                    .is_some_and(|v| v < min)
            };
            if too_small("width", 200) || too_small("height", 150) {
                continue;
            }
            if let Some(resolved) = resolve_url(base, src) {
                if !images.contains(&resolved) {
                    images.push(resolved);
                }
            }
        }
    }

    let reservation_url = base.as_ref().and_then(|base| {
        RESERVATION_SELECTORS
            .iter()
            .filter_map(|s| Selector::parse(s).ok())
            .find_map(|selector| {
                let href = doc.select(&selector).next()?.value().attr("href")?;
                resolve_url(base, href)
            })
    });

    UrlContent {
        title,
        description,
        content: body_text,
        address,
        phone,
        hours,
        rating,
        price_range,
        cuisine,
        images,
        reviews,
        reservation_url,
    }
}

/// Assemble the labelled prompt block handed to the generative adapters.
pub fn format_for_prompt(content: &UrlContent) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !content.title.is_empty() {
        parts.push(format!("Page Title: {}", content.title));
    }
    if !content.description.is_empty() {
        parts.push(format!("Description: {}", content.description));
    }
    if let Some(address) = &content.address {
        parts.push(format!("Address Found: {}", address));
    }
    if let Some(phone) = &content.phone {
        parts.push(format!("Phone: {}", phone));
    }
    if let Some(hours) = &content.hours {
        parts.push(format!("Hours: {}", hours));
    }
    if let Some(rating) = &content.rating {
        parts.push(format!("Rating: {}/5", rating));
    }
    if let Some(price) = &content.price_range {
        parts.push(format!("Price Range: {}", price));
    }
    if let Some(cuisine) = &content.cuisine {
        parts.push(format!("Cuisine/Type: {}", cuisine));
    }
    if !content.reviews.is_empty() {
        let samples = content
            .reviews
            .iter()
            .take(3)
            .map(|r| format!("- {}", r.chars().take(300).collect::<String>()))
            .collect::<Vec<_>>()
            .join("\n");
        parts.push(format!("Sample Reviews:\n{}", samples));
    }
    if !content.content.is_empty() {
        let excerpt: String = content
            .content
            .chars()
            .take(defaults::GEOCODE_CONTENT_EXCERPT)
            .collect();
        parts.push(format!("Page Content (excerpt): {}", excerpt));
    }

    parts.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Example Bistro - Fine Dining</title>
  <meta name="description" content="A cozy French bistro on the waterfront.">
  <meta property="og:image" content="/images/hero.jpg">
  <script>var tracking = "should { not } leak";</script>
  <style>.address { color: red; }</style>
</head>
<body>
  <h1>Example Bistro</h1>
  <div class="address-block">123 Main Street, Springfield, IL 62704</div>
  <p>Call us: +1 555-867-5309</p>
  <div class="hours">Open daily 11:00 - 22:00</div>
  <div class="rating">4.5 / 5</div>
  <p>Prices from $$ per person. French cuisine at its finest.</p>
  <div class="review">The confit was extraordinary, and the staff remembered our anniversary without prompting. Truly a lovely evening.</div>
  <img src="/images/logo.png" width="64">
  <img src="/images/dining-room.jpg" width="800" height="600">
  <a href="https://resy.com/cities/sfo/example-bistro">Reserve a table</a>
</body>
</html>"#;

    #[test]
    fn test_extracts_title_and_description() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert_eq!(content.title, "Example Bistro - Fine Dining");
        assert_eq!(content.description, "A cozy French bistro on the waterfront.");
    }

    #[test]
    fn test_extracts_address_from_class_selector() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert_eq!(
            content.address.as_deref(),
            Some("123 Main Street, Springfield, IL 62704")
        );
    }

    #[test]
    fn test_extracts_phone_via_regex() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert_eq!(content.phone.as_deref(), Some("+1 555-867-5309"));
    }

    #[test]
    fn test_extracts_hours_rating_price() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert_eq!(content.hours.as_deref(), Some("Open daily 11:00 - 22:00"));
        assert_eq!(content.rating.as_deref(), Some("4.5"));
        assert_eq!(content.price_range.as_deref(), Some("$$"));
    }

    #[test]
    fn test_detects_cuisine_from_body_text() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert_eq!(content.cuisine.as_deref(), Some("French"));
    }

    #[test]
    fn test_collects_reviews() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert_eq!(content.reviews.len(), 1);
        assert!(content.reviews[0].contains("confit"));
    }

    #[test]
    fn test_images_prefer_og_and_skip_logos() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert_eq!(
            content.images,
            vec![
                "https://example.com/images/hero.jpg".to_string(),
                "https://example.com/images/dining-room.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn test_reservation_link_resolved() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert_eq!(
            content.reservation_url.as_deref(),
            Some("https://resy.com/cities/sfo/example-bistro")
        );
    }

    #[test]
    fn test_script_content_never_leaks_into_body_text() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        assert!(!content.content.contains("tracking"));
    }

    #[test]
    fn test_empty_page_yields_default() {
        let content = extract_content("", "https://example.com");
        assert_eq!(content.title, "");
        assert!(content.images.is_empty());
    }

    #[test]
    fn test_og_title_fallback() {
        let html = r#"<html><head><meta property="og:title" content="OG Name"></head><body></body></html>"#;
        let content = extract_content(html, "https://example.com");
        assert_eq!(content.title, "OG Name");
    }

    #[test]
    fn test_format_for_prompt_includes_labelled_fields() {
        let content = extract_content(SAMPLE_PAGE, "https://example.com/bistro");
        let formatted = format_for_prompt(&content);
        assert!(formatted.contains("Page Title: Example Bistro - Fine Dining"));
        assert!(formatted.contains("Address Found: 123 Main Street"));
        assert!(formatted.contains("Rating: 4.5/5"));
        assert!(formatted.contains("Sample Reviews:"));
        assert!(formatted.contains("Page Content (excerpt):"));
    }

    #[test]
    fn test_format_for_prompt_empty_content_is_empty() {
        assert_eq!(format_for_prompt(&UrlContent::default()), "");
    }
}
