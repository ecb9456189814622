//! Markdown rendering and HTML sanitizing for feed content.
//!
//! Bodies are always rendered first and sanitized second; raw HTML inside
//! markdown passes through the renderer untouched and only the sanitizer
//! decides what survives.

use pulldown_cmark::{Options, Parser, html::push_html};
use thiserror::Error;

/// Failure of a [`Renderer`] or [`Sanitizer`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct MarkupError(pub String);

/// Markdown → HTML.
pub trait Renderer {
    fn render(&self, markdown: &str) -> Result<String, MarkupError>;
}

/// Untrusted HTML → HTML safe to embed in a feed.
pub trait Sanitizer {
    fn sanitize(&self, html: &str) -> Result<String, MarkupError>;
}

/// CommonMark with tables, strikethrough, task lists and footnotes.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl Renderer for MarkdownRenderer {
    fn render(&self, markdown: &str) -> Result<String, MarkupError> {
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_FOOTNOTES;

        let mut html = String::with_capacity(markdown.len() * 2);
        push_html(&mut html, Parser::new_ext(markdown, options));
        Ok(html)
    }
}

/// Allow-list sanitizer: drops `<script>`/`<style>` with their content,
/// event handler attributes and any tag or attribute not on the list.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlSanitizer;

impl Sanitizer for HtmlSanitizer {
    fn sanitize(&self, html: &str) -> Result<String, MarkupError> {
        let clean = ammonia::clean(html);

        if clean.to_ascii_lowercase().contains("<script") {
            return Err(MarkupError("script element survived sanitizing".into()));
        }
        Ok(clean)
    }
}
