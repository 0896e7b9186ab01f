//! Page-level extraction: exam names and fallback links.

use scraper::{Html, Selector};

/// Text markers that end the exam-name region of a landing page.
const NAME_END_MARKERS: &[&str] = &["返回首页", "首页"];

/// Exam names shorter than this are assumed to be stray page chrome.
const MIN_NAME_CHARS: usize = 6;

/// Pull the exam name out of a post-login landing page.
///
/// The portal prints the exam title as loose body text before the
/// 返回首页 link, usually prefixed with the school name. Text nodes are
/// walked in document order up to that link, configured site prefixes are
/// stripped, and the remainder is accepted only when it is long enough to
/// be a real title.
pub fn extract_exam_name(html: &str, strip_prefixes: &[String]) -> Option<String> {
    let doc = Html::parse_document(html);
    let body_sel = Selector::parse("body").expect("static selector");
    let body = doc.select(&body_sel).next()?;

    let mut parts: Vec<&str> = Vec::new();
    for text in body.text() {
        let t = text.trim();
        if t.is_empty() {
            continue;
        }
        parts.push(t);
        if t.contains(NAME_END_MARKERS[0]) {
            break;
        }
    }

    let mut full = parts.join(" ");
    for prefix in strip_prefixes {
        if !prefix.is_empty() && full.contains(prefix.as_str()) {
            full = full
                .rsplit(prefix.as_str())
                .next()
                .unwrap_or_default()
                .to_string();
        }
    }
    for marker in NAME_END_MARKERS {
        if let Some(idx) = full.find(marker) {
            full.truncate(idx);
        }
    }

    let name = full
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace(['【', '】'], "")
        .trim()
        .to_string();

    (name.chars().count() >= MIN_NAME_CHARS).then_some(name)
}

/// First hyperlink on the page, used as the one-hop fallback when the
/// landing page itself carries no score table.
pub fn first_link(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let sel = Selector::parse("a[href]").expect("static selector");
    doc.select(&sel)
        .filter_map(|a| a.value().attr("href"))
        .map(str::trim)
        .find(|href| !href.is_empty())
        .map(str::to_string)
}
