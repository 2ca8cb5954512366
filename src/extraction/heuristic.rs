// src/extraction/heuristic.rs
use scraper::{Html, Selector};

use crate::models::SelectorMap;
use crate::utils::clean_text;

/// Minimum plausible lengths; anything shorter is selector noise.
const MIN_TITLE_LEN: usize = 5;
const MIN_DESCRIPTION_LEN: usize = 40;

#[derive(Debug, Clone)]
pub struct ExtractedFields {
    pub title: String,
    pub company: String,
    pub description: String,
}

impl ExtractedFields {
    /// A parse only wins with a non-empty title, company AND description.
    /// The engine fills the company from the posting domain before this
    /// check when the page names none.
    pub fn is_usable(&self) -> bool {
        !self.title.is_empty() && !self.company.is_empty() && !self.description.is_empty()
    }
}

/// Apply a cached domain selector map to the page. All three fields must
/// resolve through the stored selectors; a partial hit means the cache is
/// stale and the caller falls over to the next strategy.
pub fn parse_with_selector_map(html: &str, map: &SelectorMap) -> Option<ExtractedFields> {
    let document = Html::parse_document(html);

    let title = select_text(&document, &map.title, MIN_TITLE_LEN)?;
    let company = select_text(&document, &map.company, 1)?;
    let description = select_text(&document, &map.description, MIN_DESCRIPTION_LEN)?;

    Some(ExtractedFields {
        title,
        company,
        description,
    })
}

/// Generic structural parse: heading and class-name heuristics plus meta
/// tags. Returns the fields and the selectors that produced them so a
/// successful parse can seed the domain selector cache.
pub fn parse_heuristic(html: &str) -> Option<(ExtractedFields, SelectorMap)> {
    let document = Html::parse_document(html);

    let title_selectors = [
        "h1",
        "[class*='job-title']",
        "[class*='title']",
        "[class*='position']",
    ];

    let company_selectors = [
        "[class*='company']",
        "[class*='employer']",
        "[class*='organization']",
        "meta[property='og:site_name']",
    ];

    let description_selectors = [
        "[class*='job-description']",
        "[class*='description']",
        "[class*='details']",
        "main",
        "article",
    ];

    let (title, title_sel) = find_by_selectors(&document, &title_selectors, MIN_TITLE_LEN)?;
    let (description, description_sel) =
        find_by_selectors(&document, &description_selectors, MIN_DESCRIPTION_LEN)?;

    // Company is best-effort: og:site_name often stands in when no class
    // matches; when nothing here resolves the engine substitutes the
    // posting domain before deciding usability.
    let (company, company_sel) = find_by_selectors(&document, &company_selectors, 1)
        .unwrap_or_else(|| (String::new(), company_selectors[0].to_string()));

    let fields = ExtractedFields {
        title,
        company,
        description,
    };
    let selectors = SelectorMap {
        title: title_sel,
        company: company_sel,
        description: description_sel,
    };

    Some((fields, selectors))
}

fn find_by_selectors(
    document: &Html,
    selectors: &[&str],
    min_len: usize,
) -> Option<(String, String)> {
    for selector_str in selectors {
        if let Some(text) = select_text(document, selector_str, min_len) {
            return Some((text, selector_str.to_string()));
        }
    }
    None
}

fn select_text(document: &Html, selector_str: &str, min_len: usize) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;
    let element = document.select(&selector).next()?;

    // Meta tags carry their value in the content attribute
    let text = if element.value().name() == "meta" {
        clean_text(element.value().attr("content")?)
    } else {
        clean_text(&element.text().collect::<Vec<_>>().join(" "))
    };

    if text.len() >= min_len {
        Some(text)
    } else {
        None
    }
}
