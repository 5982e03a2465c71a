//! Turns ```` ```mermaid ```` fences into `<div class="mermaid">` blocks that
//! mermaid.js renders in the browser.

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};

#[derive(Debug, Default)]
pub struct MermaidTransformer;

impl MermaidTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut out = Vec::with_capacity(events.len());
        let mut diagram: Option<String> = None;

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref lang)))
                    if is_mermaid(lang) =>
                {
                    diagram = Some(String::new());
                }
                Event::Text(text) if diagram.is_some() => {
                    if let Some(source) = diagram.as_mut() {
                        source.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if diagram.is_some() => {
                    let source = diagram.take().unwrap_or_default();
                    let block = format!("<div class=\"mermaid\">\n{}\n</div>\n", source.trim());
                    out.push(Event::Html(CowStr::Boxed(block.into_boxed_str())));
                }
                other => out.push(other),
            }
        }

        out
    }
}

fn is_mermaid(lang: &str) -> bool {
    lang.split_whitespace().next() == Some("mermaid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulldown_cmark::{html, Parser};

    fn render(md: &str) -> String {
        let events = Parser::new(md).map(Event::into_static).collect();
        let mut out = String::new();
        html::push_html(&mut out, MermaidTransformer::new().transform(events).into_iter());
        out
    }

    #[test]
    fn test_mermaid_fence_becomes_div() {
        let html = render("```mermaid\ngraph LR\n  A --> B\n```\n");
        assert_eq!(html, "<div class=\"mermaid\">\ngraph LR\n  A --> B\n</div>\n");
    }

    #[test]
    fn test_other_fences_untouched() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre><code class=\"language-rust\">"));
        assert!(!html.contains("mermaid"));
    }
}
