//! Third-party script and style assets referenced by the page templates.
//!
//! The live site links these from public CDNs. A static export downloads
//! each one into `static/vendor/` and points pages at the local copy.

use serde::{Deserialize, Serialize};

pub const HIGHLIGHT_CSS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/styles/github-dark.min.css";
pub const HIGHLIGHT_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/highlight.min.js";
pub const HIGHLIGHT_YAML_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/languages/yaml.min.js";
pub const HIGHLIGHT_TYPESCRIPT_JS: &str =
    "https://cdnjs.cloudflare.com/ajax/libs/highlight.js/11.9.0/languages/typescript.min.js";
pub const MERMAID_JS: &str = "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.min.js";
pub const HTMX_JS: &str = "https://unpkg.com/htmx.org@2.0.4/dist/htmx.min.js";

/// A remote asset and where its bundled copy lives, relative to `static/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetDescriptor {
    pub url: String,
    pub local: String,
}

impl AssetDescriptor {
    pub fn new(url: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            local: local.into(),
        }
    }

    /// Site-absolute URL of the bundled copy (e.g. `/static/vendor/htmx.min.js`)
    pub fn local_url(&self) -> String {
        format!("/static/{}", self.local.trim_start_matches('/'))
    }
}

/// The assets the built-in templates load
pub fn default_vendor_assets() -> Vec<AssetDescriptor> {
    vec![
        AssetDescriptor::new(HIGHLIGHT_CSS, "vendor/highlight.min.css"),
        AssetDescriptor::new(HIGHLIGHT_JS, "vendor/highlight.min.js"),
        AssetDescriptor::new(HIGHLIGHT_YAML_JS, "vendor/highlight-yaml.min.js"),
        AssetDescriptor::new(HIGHLIGHT_TYPESCRIPT_JS, "vendor/highlight-typescript.min.js"),
        AssetDescriptor::new(MERMAID_JS, "vendor/mermaid.min.js"),
        AssetDescriptor::new(HTMX_JS, "vendor/htmx.min.js"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn local_url_is_rooted_under_static() {
        let asset = AssetDescriptor::new(HTMX_JS, "vendor/htmx.min.js");
        assert_eq!(asset.local_url(), "/static/vendor/htmx.min.js");
    }

    #[test]
    fn default_assets_have_distinct_destinations() {
        let assets = default_vendor_assets();
        let locals: HashSet<_> = assets.iter().map(|a| a.local.as_str()).collect();
        let urls: HashSet<_> = assets.iter().map(|a| a.url.as_str()).collect();
        assert_eq!(locals.len(), assets.len());
        assert_eq!(urls.len(), assets.len());
    }
}
