//! Main-content extraction
//!
//! The document is parsed once. Body text comes from an ordered list of
//! content selectors with noise subtrees skipped, falling back to the whole
//! `<body>` when no content selector yields text.

use crate::config::ExtractionConfig;
use crate::extract::clean::{clean_text, extract_keywords, split_meta_keywords};
use crate::extract::{ExtractError, SearchableContent};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::HashSet;
use url::Url;

/// Turns HTML pages into [`SearchableContent`] records
///
/// All selectors are compiled once at construction, so a single extractor is
/// shared by every task of a crawl.
#[derive(Debug)]
pub struct ContentExtractor {
    content_selectors: Vec<Selector>,
    noise_selectors: Vec<Selector>,
    title: Selector,
    meta_keywords: Selector,
    headings: Selector,
    body: Selector,
    min_fragment_len: usize,
    max_keywords: usize,
    stop_words: HashSet<String>,
}

impl ContentExtractor {
    /// Compiles the configured selectors
    ///
    /// # Errors
    ///
    /// `ExtractError::InvalidSelector` naming the first selector that does not parse.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            content_selectors: compile_all(&config.content_selectors)?,
            noise_selectors: compile_all(&config.noise_selectors)?,
            title: compile("title")?,
            meta_keywords: compile("meta[name='keywords']")?,
            headings: compile("h1, h2, h3")?,
            body: compile("body")?,
            min_fragment_len: config.min_fragment_len,
            max_keywords: config.max_keywords,
            stop_words: config
                .stop_words
                .iter()
                .map(|word| word.to_lowercase())
                .collect(),
        })
    }

    /// Parses `html` and extracts a record for `url`
    ///
    /// # Errors
    ///
    /// `ExtractError::EmptyDocument` when `html` is blank.
    pub fn extract(&self, url: &Url, html: &str) -> Result<SearchableContent, ExtractError> {
        if html.trim().is_empty() {
            return Err(ExtractError::EmptyDocument);
        }
        let document = Html::parse_document(html);
        Ok(self.extract_document(url, &document))
    }

    /// Extracts a record from an already parsed document
    ///
    /// Every parsed page yields a record, even one with no title, headings or text.
    pub fn extract_document(&self, url: &Url, document: &Html) -> SearchableContent {
        let title = self.extract_title(document);
        let headings = self.extract_headings(document);
        let raw_text = self.extract_body_text(document);

        let text = clean_text(&raw_text, self.min_fragment_len);

        let mut keywords = self.extract_meta_keywords(document);
        if keywords.is_empty() {
            keywords = extract_keywords(&text, &self.stop_words, self.max_keywords);
        }

        SearchableContent {
            url: url.clone(),
            title,
            text,
            headings,
            keywords,
        }
    }

    fn extract_title(&self, document: &Html) -> String {
        document
            .select(&self.title)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .unwrap_or_default()
    }

    /// Keywords from every `<meta name="keywords">` tag, in document order
    fn extract_meta_keywords(&self, document: &Html) -> Vec<String> {
        let mut keywords = Vec::new();
        for content in document
            .select(&self.meta_keywords)
            .filter_map(|element| element.value().attr("content"))
        {
            for keyword in split_meta_keywords(content) {
                if !keywords.contains(&keyword) {
                    keywords.push(keyword);
                }
            }
        }
        keywords
    }

    fn extract_headings(&self, document: &Html) -> Vec<String> {
        document
            .select(&self.headings)
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|heading| !heading.is_empty())
            .collect()
    }

    /// Concatenated text of every content-selector match, or of `<body>`
    fn extract_body_text(&self, document: &Html) -> String {
        let mut fragments = Vec::new();

        for selector in &self.content_selectors {
            for element in document.select(selector) {
                let text = self.text_without_noise(element);
                let text = text.trim();
                if !text.is_empty() {
                    fragments.push(text.to_string());
                }
            }
        }

        if fragments.is_empty() {
            tracing::trace!("No main content found, falling back to <body>");
            if let Some(body) = document.select(&self.body).next() {
                let text = self.text_without_noise(body);
                let text = text.trim();
                if !text.is_empty() {
                    fragments.push(text.to_string());
                }
            }
        }

        fragments.join(" ")
    }

    /// Text of `root`, skipping any descendant subtree matched by a noise selector
    fn text_without_noise(&self, root: ElementRef<'_>) -> String {
        let mut text = String::new();
        let mut stack: Vec<_> = root.children().rev().collect();

        while let Some(node) = stack.pop() {
            match node.value() {
                Node::Text(fragment) => text.push_str(fragment),
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(node) {
                        if self.is_noise(&element) {
                            continue;
                        }
                    }
                    stack.extend(node.children().rev());
                }
                _ => {}
            }
        }

        text
    }

    fn is_noise(&self, element: &ElementRef<'_>) -> bool {
        self.noise_selectors
            .iter()
            .any(|selector| selector.matches(element))
    }
}

fn compile(selector: &str) -> Result<Selector, ExtractError> {
    Selector::parse(selector).map_err(|_| ExtractError::InvalidSelector(selector.to_string()))
}

fn compile_all(selectors: &[String]) -> Result<Vec<Selector>, ExtractError> {
    selectors.iter().map(|s| compile(s)).collect()
}
