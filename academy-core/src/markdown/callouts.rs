//! Callout blockquotes.
//!
//! A blockquote whose first bold run is a known label (`**Note:**`,
//! `**Warning:**`, `**Exercise:**`, `**Tip:**` or the matching emoji) is
//! rendered as `<blockquote class="callout callout-<kind>">`. Every other
//! blockquote gets the plain `callout` class.

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

const LABELS: &[(&str, &[&str])] = &[
    ("note", &["Note:", "📝"]),
    ("warning", &["Warning:", "⚠️"]),
    ("exercise", &["Exercise:", "🏋️"]),
    ("tip", &["Tip:", "💡"]),
];

#[derive(Debug, Default)]
pub struct CalloutTransformer;

impl CalloutTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let ends = matching_ends(&events);
        let mut closing = vec![false; events.len()];
        let mut out = Vec::with_capacity(events.len());

        for (idx, event) in events.iter().enumerate() {
            match event {
                Event::Start(Tag::BlockQuote(_)) => {
                    let end = ends[idx].unwrap_or(events.len());
                    if end < events.len() {
                        closing[end] = true;
                    }
                    let class = match callout_kind(&events[idx + 1..end]) {
                        Some(kind) => format!("callout callout-{}", kind),
                        None => "callout".to_string(),
                    };
                    let open = format!("<blockquote class=\"{}\">\n", class);
                    out.push(Event::Html(CowStr::Boxed(open.into_boxed_str())));
                }
                Event::End(TagEnd::BlockQuote(_)) if closing[idx] => {
                    out.push(Event::Html(CowStr::Borrowed("</blockquote>\n")));
                }
                other => out.push(other.clone()),
            }
        }

        out
    }
}

/// For every blockquote start, the index of its matching end
fn matching_ends(events: &[Event<'static>]) -> Vec<Option<usize>> {
    let mut ends = vec![None; events.len()];
    let mut stack = Vec::new();
    for (idx, event) in events.iter().enumerate() {
        match event {
            Event::Start(Tag::BlockQuote(_)) => stack.push(idx),
            Event::End(TagEnd::BlockQuote(_)) => {
                if let Some(start) = stack.pop() {
                    ends[start] = Some(idx);
                }
            }
            _ => {}
        }
    }
    ends
}

/// Kind named by the first bold run of the quote body, ignoring nested quotes
fn callout_kind(body: &[Event<'static>]) -> Option<&'static str> {
    let mut depth = 0usize;
    let mut label: Option<String> = None;

    for event in body {
        match event {
            Event::Start(Tag::BlockQuote(_)) => depth += 1,
            Event::End(TagEnd::BlockQuote(_)) => depth = depth.saturating_sub(1),
            Event::Start(Tag::Strong) if depth == 0 && label.is_none() => {
                label = Some(String::new());
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(current) = label.as_mut() {
                    current.push_str(text);
                }
            }
            Event::End(TagEnd::Strong) if label.is_some() => break,
            _ => {}
        }
    }

    let label = label?;
    let label = label.trim();
    LABELS
        .iter()
        .find(|(_, markers)| markers.contains(&label))
        .map(|(kind, _)| *kind)
}
