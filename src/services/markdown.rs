//! Markdown rendering service
//!
//! Renders post markdown to HTML with pulldown-cmark. Tables, strikethrough
//! and footnotes are enabled; raw HTML passes through unchanged (posts are
//! written by trusted staff).

use pulldown_cmark::{html, Options, Parser};

/// Markdown renderer
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render markdown source to HTML
    pub fn render(&self, markdown: &str) -> String {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_FOOTNOTES);

        let parser = Parser::new_ext(markdown, options);
        let mut output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut output, parser);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_heading() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Now playing");
        assert!(html.contains("<h1>Now playing</h1>"));
    }

    #[test]
    fn test_render_table() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_render_strikethrough() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("~~cancelled show~~");
        assert!(html.contains("<del>cancelled show</del>"));
    }

    #[test]
    fn test_render_empty() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.render(""), "");
    }
}
