//! Markdown processing pipeline with custom extensions.

pub mod callouts;
pub mod mermaid;

use pulldown_cmark::{html, Event, Options, Parser};

pub use callouts::CalloutTransformer;
pub use mermaid::MermaidTransformer;

/// Markdown processor with custom extensions
#[derive(Debug, Clone)]
pub struct MarkdownProcessor {
    options: Options,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);

        Self { options }
    }

    /// Convert markdown to HTML with all custom transforms
    pub fn convert(&self, markdown: &str) -> String {
        let events: Vec<Event<'static>> = Parser::new_ext(markdown, self.options)
            .map(Event::into_static)
            .collect();

        // Mermaid first so diagram sources never reach the code renderer
        let events = MermaidTransformer::new().transform(events);
        let events = CalloutTransformer::new().transform(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Render markdown with the default processor
pub fn render_markdown(markdown: &str) -> String {
    MarkdownProcessor::new().convert(markdown)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tables_and_task_lists() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n\n- [x] done\n");
        assert!(html.contains("<table>"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn test_code_blocks_keep_language_class() {
        let html = render_markdown("```yaml\nkey: value\n```\n");
        assert!(html.contains("<code class=\"language-yaml\">"));
    }

    #[test]
    fn test_full_pipeline() {
        let md = "# Title\n\n```mermaid\ngraph TD; A-->B\n```\n\n> **Tip:** use it\n";
        let html = render_markdown(md);
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<div class=\"mermaid\">"));
        assert!(html.contains("<blockquote class=\"callout callout-tip\">"));
    }
}
