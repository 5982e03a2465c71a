//! HTML post-processing that turns a crawled page into a backend-free one.
//!
//! Passes run in a fixed order:
//!
//! 1. remote asset URLs become their bundled `/static/...` copies wherever
//!    the URL stands alone, quoted or not, but never as the prefix or
//!    suffix of a longer URL;
//! 2. links into server-only endpoints (e.g. `/api/...`) are removed along
//!    with their contents;
//! 3. pages carrying the lesson progress toggle get the `localStorage`
//!    progress and sidebar scripts;
//! 4. quiz pages get a client-side grader when an answer key is supplied.
//!
//! Every pass is a no-op when its marker is absent, and injected scripts
//! carry ids that stop a second pass from injecting again, so rewriting is
//! idempotent.

pub mod scripts;

use academy_core::{AnswerKey, AssetDescriptor};
use regex::{Captures, Regex};
use std::sync::OnceLock;

use scripts::{
    PROGRESS_JS, PROGRESS_SCRIPT_ID, QUIZ_JS, QUIZ_KEY_ID, QUIZ_SCRIPT_ID, SIDEBAR_JS,
};

fn anchor_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<a\b([^>]*)>.*?</a\s*>").expect("valid anchor regex"))
}

fn href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)\bhref\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("valid href regex")
    })
}

fn progress_wrap_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<(\w+)\b[^>]*\bid\s*=\s*["']progress-btn-wrap["'][^>]*>"#)
            .expect("valid progress wrapper regex")
    })
}

fn input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<input\b[^>]*>").expect("valid input regex"))
}

fn quiz_form_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)<form\b[^>]*\bid\s*=\s*["']quiz-form["']"#).expect("valid quiz form regex")
    })
}

/// Page rewriter configured with the asset map and server-only prefixes
#[derive(Debug, Clone)]
pub struct Rewriter {
    /// (remote, local) URL pairs
    url_map: Vec<(String, String)>,
    server_only_prefixes: Vec<String>,
}

impl Rewriter {
    pub fn new(assets: &[AssetDescriptor], server_only_prefixes: &[String]) -> Self {
        let url_map = assets
            .iter()
            .map(|asset| (asset.url.clone(), asset.local_url()))
            .collect();
        Self {
            url_map,
            server_only_prefixes: server_only_prefixes.to_vec(),
        }
    }

    /// Apply every pass. `answer_key` is the quiz of the page's module, if
    /// the page is a quiz page.
    pub fn rewrite(&self, html: &str, answer_key: Option<&AnswerKey>) -> String {
        let html = self.substitute_urls(html);
        let html = self.strip_server_links(&html);
        let html = inject_progress(&html);
        match answer_key {
            Some(key) => inject_quiz(&html, key),
            None => html,
        }
    }

    fn substitute_urls(&self, html: &str) -> String {
        let mut out = html.to_string();
        for (remote, local) in &self.url_map {
            if out.contains(remote.as_str()) {
                out = replace_standalone(&out, remote, local);
            }
        }
        out
    }

    fn strip_server_links(&self, html: &str) -> String {
        if self.server_only_prefixes.is_empty() {
            return html.to_string();
        }
        anchor_regex()
            .replace_all(html, |caps: &Captures| {
                let href = href_regex()
                    .captures(&caps[1])
                    .and_then(|h| h.get(1).or_else(|| h.get(2)))
                    .map(|m| m.as_str());
                match href {
                    Some(href) if self.is_server_only(href) => String::new(),
                    _ => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn is_server_only(&self, href: &str) -> bool {
        self.server_only_prefixes.iter().any(|prefix| {
            href.starts_with(prefix.as_str())
                || prefix
                    .strip_suffix('/')
                    .is_some_and(|bare| href == bare)
        })
    }
}

/// Characters that extend a URL, so a match touching one is part of a
/// longer URL rather than the asset itself
fn continues_url(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-._~/?#[]@!$&*+%:".contains(c)
}

/// Replace occurrences of `remote` bounded on both sides by a non-URL
/// character (quote, whitespace, `=`, `<`, `>`, `(`, ...) or the text edge
fn replace_standalone(html: &str, remote: &str, local: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for (start, _) in html.match_indices(remote) {
        let end = start + remote.len();
        let before = html[..start].chars().next_back();
        let after = html[end..].chars().next();
        if before.is_some_and(continues_url) || after.is_some_and(continues_url) {
            continue;
        }
        out.push_str(&html[last..start]);
        out.push_str(local);
        last = end;
    }
    out.push_str(&html[last..]);
    out
}

/// True when `id="progress-btn-wrap"` encloses a hidden `lesson_id` input
pub fn has_progress_toggle(html: &str) -> bool {
    let Some(open) = progress_wrap_regex().captures(html) else {
        return false;
    };
    let (Some(whole), Some(tag)) = (open.get(0), open.get(1)) else {
        return false;
    };

    let body = &html[whole.end()..];
    let close = format!("</{}", tag.as_str().to_ascii_lowercase());
    let end = find_wrapper_end(body, tag.as_str(), &close).unwrap_or(body.len());

    input_regex().find_iter(&body[..end]).any(|input| {
        let attrs = input.as_str().to_ascii_lowercase();
        attr_is(&attrs, "name", "lesson_id") && attr_is(&attrs, "type", "hidden")
    })
}

/// Offset of the tag closing the wrapper, accounting for nested tags of the
/// same name
fn find_wrapper_end(body: &str, tag: &str, close: &str) -> Option<usize> {
    let lower = body.to_ascii_lowercase();
    let open = format!("<{}", tag.to_ascii_lowercase());
    let mut depth = 0usize;
    let mut pos = 0;

    loop {
        let next_open = lower[pos..].find(&open).map(|i| i + pos);
        let next_close = lower[pos..].find(close).map(|i| i + pos)?;
        match next_open {
            Some(o) if o < next_close => {
                depth += 1;
                pos = o + open.len();
            }
            _ if depth == 0 => return Some(next_close),
            _ => {
                depth -= 1;
                pos = next_close + close.len();
            }
        }
    }
}

fn attr_is(attrs: &str, name: &str, value: &str) -> bool {
    [
        format!("{}=\"{}\"", name, value),
        format!("{}='{}'", name, value),
        format!("{}={}", name, value),
    ]
    .iter()
    .any(|needle| attrs.contains(needle.as_str()))
}

fn has_element_id(html: &str, id: &str) -> bool {
    html.contains(&format!("id=\"{}\"", id)) || html.contains(&format!("id='{}'", id))
}

/// Insert `snippet` before the last `</body>`; pages without one are left alone
fn insert_before_body_end(html: &str, snippet: &str) -> Option<String> {
    let at = html.to_ascii_lowercase().rfind("</body>")?;
    let mut out = String::with_capacity(html.len() + snippet.len());
    out.push_str(&html[..at]);
    out.push_str(snippet);
    out.push_str(&html[at..]);
    Some(out)
}

fn inject_progress(html: &str) -> String {
    if has_element_id(html, PROGRESS_SCRIPT_ID) || !has_progress_toggle(html) {
        return html.to_string();
    }
    let snippet = format!("{}{}", PROGRESS_JS, SIDEBAR_JS);
    insert_before_body_end(html, &snippet).unwrap_or_else(|| {
        tracing::debug!("Progress toggle found but page has no </body>; not injecting");
        html.to_string()
    })
}

fn inject_quiz(html: &str, key: &AnswerKey) -> String {
    if has_element_id(html, QUIZ_SCRIPT_ID) || !quiz_form_regex().is_match(html) {
        return html.to_string();
    }

    let json = match serde_json::to_string(key) {
        // `</` would end the script element early
        Ok(json) => json.replace("</", "<\\/"),
        Err(err) => {
            tracing::warn!("Cannot encode answer key for {}: {}", key.quiz_id, err);
            return html.to_string();
        }
    };
    let snippet = format!(
        "\n<script id=\"{}\" type=\"application/json\">{}</script>{}",
        QUIZ_KEY_ID, json, QUIZ_JS
    );
    insert_before_body_end(html, &snippet).unwrap_or_else(|| html.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use academy_core::assets::{HTMX_JS, MERMAID_JS};

    fn rewriter() -> Rewriter {
        Rewriter::new(
            &academy_core::default_vendor_assets(),
            &["/api/".to_string()],
        )
    }

    const LESSON: &str = r##"<html><head><script src="https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js"></script></head>
<body>
<nav><a href="/">Modules</a><a href="/api/progress" class="api-link">Progress <b>JSON</b></a></nav>
<div id="progress-btn-wrap">
  <form hx-post="/progress/toggle" hx-target="#progress-btn-wrap" hx-swap="outerHTML">
    <input type="hidden" name="lesson_id" value="a::x">
    <button type="submit" class="btn btn-outline">Mark Complete</button>
  </form>
</div>
</body></html>"##;

    #[test]
    fn test_lesson_page_rewrite() {
        let out = rewriter().rewrite(LESSON, None);
        assert!(!out.contains(HTMX_JS));
        assert!(out.contains(r#"src="/static/vendor/htmx.min.js""#));
        assert!(!out.contains("/api/progress"));
        assert!(out.contains(r#"<a href="/">Modules</a>"#));
        assert!(out.contains(r#"<script id="static-progress-js">"#));
        assert!(out.contains(r#"<script id="static-sidebar-progress-js">"#));
        assert!(out.contains(scripts::PROGRESS_STORAGE_KEY));

        let script_at = out.find("static-progress-js").unwrap();
        assert!(script_at < out.rfind("</body>").unwrap());
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let r = rewriter();
        let once = r.rewrite(LESSON, None);
        assert_eq!(r.rewrite(&once, None), once);
        assert_eq!(once.matches("static-progress-js").count(), 1);
    }

    #[test]
    fn test_standalone_remote_urls_are_all_replaced() {
        let html = format!(
            concat!(
                r#"<script src="{m}"></script><script src='{m}'></script>"#,
                "<script src={h}></script><pre>curl {h}</pre>",
                r#"<a href="{m}.map">map</a><a href="{m}?v=2">v2</a>"#
            ),
            m = MERMAID_JS,
            h = HTMX_JS
        );
        let out = rewriter().rewrite(&html, None);

        assert!(out.contains(r#"src="/static/vendor/mermaid.min.js""#));
        assert!(out.contains("src='/static/vendor/mermaid.min.js'"));
        assert!(out.contains("<script src=/static/vendor/htmx.min.js></script>"));
        assert!(out.contains("<pre>curl /static/vendor/htmx.min.js</pre>"));
        assert!(!out.contains(HTMX_JS));

        // Longer URLs that merely start with an asset URL are left alone
        assert!(out.contains(&format!(r#"href="{}.map""#, MERMAID_JS)));
        assert!(out.contains(&format!(r#"href="{}?v=2""#, MERMAID_JS)));
        let standalone = out
            .replace(&format!("{}.map", MERMAID_JS), "")
            .replace(&format!("{}?v=2", MERMAID_JS), "");
        assert!(!standalone.contains(MERMAID_JS));
    }

    #[test]
    fn test_page_without_markers_only_gets_url_substitution() {
        let html = format!(
            "<html><body><script src=\"{}\"></script><p>Hi</p></body></html>",
            HTMX_JS
        );
        let out = rewriter().rewrite(&html, None);
        assert_eq!(
            out,
            "<html><body><script src=\"/static/vendor/htmx.min.js\"></script><p>Hi</p></body></html>"
        );
    }

    #[test]
    fn test_toggle_requires_hidden_lesson_id_inside_wrapper() {
        let visible = r#"<body><div id="progress-btn-wrap"><input type="text" name="lesson_id" value="a::x"></div></body>"#;
        assert!(!has_progress_toggle(visible));

        let outside = r#"<body><div id="progress-btn-wrap"><div>btn</div></div><input type="hidden" name="lesson_id" value="a::x"></body>"#;
        assert!(!has_progress_toggle(outside));

        let nested = r#"<body><div id='progress-btn-wrap'><div><span>x</span></div><form><input name="lesson_id" type="hidden" value="a"></form></div></body>"#;
        assert!(has_progress_toggle(nested));
    }

    #[test]
    fn test_missing_body_end_skips_injection() {
        let html = r#"<div id="progress-btn-wrap"><input type="hidden" name="lesson_id" value="a::x"></div>"#;
        assert_eq!(rewriter().rewrite(html, None), html);
    }

    #[test]
    fn test_injects_before_last_body_end() {
        let html = r#"<body><div id="progress-btn-wrap"><input type="hidden" name="lesson_id" value="a"></div><pre>&lt;/body&gt; </body></pre></body>"#;
        let out = rewriter().rewrite(html, None);
        let script = out.find("static-progress-js").unwrap();
        assert!(script > out.find("<pre>").unwrap());
        assert!(out.ends_with("</script>\n</body>"));
    }

    #[test]
    fn test_quiz_page_gets_answer_key() {
        let quiz: academy_core::Quiz = serde_json::from_value(serde_json::json!({
            "id": "intro-quiz",
            "questions": [{ "id": "q1", "prompt": "P", "correct": "b", "explanation": "</script>" }]
        }))
        .unwrap();
        let key = quiz.answer_key();
        let html = r#"<body><form id="quiz-form" method="post"></form></body>"#;

        let out = rewriter().rewrite(html, Some(&key));
        assert!(out.contains(r#"<script id="static-quiz-key" type="application/json">"#));
        assert!(out.contains(r#""quiz_id":"intro-quiz""#));
        assert!(out.contains(r#"<\/script>"#));
        assert!(out.contains(scripts::QUIZ_STORAGE_KEY));
        assert_eq!(rewriter().rewrite(&out, Some(&key)), out);

        // No key, or no quiz form: untouched
        assert_eq!(rewriter().rewrite(html, None), html);
        let plain = "<body><p>no quiz</p></body>";
        assert_eq!(rewriter().rewrite(plain, Some(&key)), plain);
    }
}
