//! One-pass DOM extraction.
//!
//! The response body is parsed once into a traversable tree; everything the
//! body-derived vectors need is extracted up front, and the parsed document
//! is retained for CSS-selector queries by the DOM vector.

use std::collections::HashMap;

use scraper::Html;

use crate::utils::parse_selector_with_fallback;

/// Extracts only the `<script src>` values from a body.
///
/// A lightweight pre-pass used when external script fetching is enabled: the
/// asset fetcher needs the source list before the full extraction runs.
pub(crate) fn extract_script_srcs(body: &[u8]) -> Vec<String> {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);
    let selector = parse_selector_with_fallback("script[src]", "script src extraction");
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("src"))
        .filter(|src| !src.is_empty())
        .map(str::to_string)
        .collect()
}

/// Data extracted from the parsed page.
///
/// An unparseable or empty body yields an empty-but-valid structure; the
/// engine continues with the vectors that do not depend on it.
pub(crate) struct PageData {
    /// `src` values of every `<script>` tag bearing one
    pub script_srcs: Vec<String>,
    /// Text content of every `<script>` without `src`
    pub inline_scripts: Vec<String>,
    /// Text content of every `<style>` tag
    pub inline_css: Vec<String>,
    /// Meta `name` (or, when absent, `http-equiv`), lower-cased → content values
    pub meta_content: HashMap<String, Vec<String>>,
    /// Text of the first `<title>`
    pub title: String,
    /// Concatenated direct text children of `<body>`
    pub visible_text: String,
    /// The parsed document, retained for the DOM vector
    pub document: Html,
}

impl PageData {
    /// Parses the body and extracts all page-derived evidence.
    pub(crate) fn from_body(body: &[u8]) -> Self {
        let html = String::from_utf8_lossy(body);
        let document = Html::parse_document(&html);

        let mut script_srcs = Vec::new();
        let mut inline_scripts = Vec::new();
        let script_selector = parse_selector_with_fallback("script", "script extraction");
        for element in document.select(&script_selector) {
            match element.value().attr("src") {
                Some(src) if !src.is_empty() => script_srcs.push(src.to_string()),
                Some(_) => {}
                None => {
                    let text = element.text().collect::<String>();
                    if !text.trim().is_empty() {
                        inline_scripts.push(text);
                    }
                }
            }
        }

        let mut inline_css = Vec::new();
        let style_selector = parse_selector_with_fallback("style", "style extraction");
        for element in document.select(&style_selector) {
            inline_css.push(element.text().collect::<String>());
        }

        let mut meta_content: HashMap<String, Vec<String>> = HashMap::new();
        let meta_selector = parse_selector_with_fallback("meta", "meta extraction");
        for element in document.select(&meta_selector) {
            let name = element
                .value()
                .attr("name")
                .or_else(|| element.value().attr("http-equiv"));
            if let (Some(name), Some(content)) = (name, element.value().attr("content")) {
                meta_content
                    .entry(name.to_lowercase())
                    .or_default()
                    .push(content.to_string());
            }
        }

        let title_selector = parse_selector_with_fallback("title", "title extraction");
        let title = document
            .select(&title_selector)
            .next()
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default();

        // Visible text is the direct text children of <body> only; script,
        // style, and nested markup do not contribute.
        let mut visible_text = String::new();
        let body_selector = parse_selector_with_fallback("body", "body text extraction");
        if let Some(body_el) = document.select(&body_selector).next() {
            for child in body_el.children() {
                if let Some(text) = child.value().as_text() {
                    visible_text.push_str(text);
                }
            }
        }

        Self {
            script_srcs,
            inline_scripts,
            inline_css,
            meta_content,
            title,
            visible_text,
            document,
        }
    }
}
