//! Portal URL resolution and tree annotation.
//!
//! API responses carry document locations under a handful of field names
//! (`path`, `href`, ...). [`PortalUrls::annotate`] walks an arbitrary JSON
//! tree and attaches the absolute portal address as `portal_url` next to
//! each of them.

use serde_json::{Map, Value, json};
use tracing::{debug, trace, warn};

/// Candidate location fields, in priority order.
const PATH_FIELDS: [&str; 6] = ["path", "href", "url", "link", "uri", "pathname"];

/// Fields never descended into.
const SKIP_FIELDS: [&str; 4] = ["portal_url", "content", "body", "html"];

/// Key under which derived URLs are stored.
pub const PORTAL_URL_FIELD: &str = "portal_url";

/// Paths shown by [`PortalUrls::diagnostics`].
const EXAMPLE_PATHS: [&str; 2] = ["getting-started/installation", "/guides/configuration"];

/// Resolves document paths against a configured portal base URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalUrls {
    base: String,
}

impl PortalUrls {
    /// Create a resolver. Trailing slashes on `base_url` are dropped;
    /// an empty base disables URL generation.
    pub fn new(base_url: impl Into<String>) -> Self {
        let base: String = base_url.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    /// The normalized base URL (empty when unset).
    pub fn base_url(&self) -> &str {
        &self.base
    }

    pub fn is_configured(&self) -> bool {
        !self.base.is_empty()
    }

    /// Turn a path-like value into an absolute portal URL.
    ///
    /// Absolute paths are appended to the base, bare relative paths are
    /// joined with `/`. Empty values and anything starting with `http`
    /// yield `None`.
    pub fn resolve(&self, path: &str) -> Option<String> {
        if !self.is_configured() {
            return None;
        }
        if path.starts_with('/') {
            Some(format!("{}{path}", self.base))
        } else if !path.is_empty() && !path.starts_with("http") {
            Some(format!("{}/{path}", self.base))
        } else {
            None
        }
    }

    /// Unconditional join used for explicit URL listing.
    fn join(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.base)
        } else {
            format!("{}/{path}", self.base)
        }
    }

    /// Return a copy of `node` with `portal_url` attached wherever a
    /// location field is found. The input is never modified.
    pub fn annotate(&self, node: &Value) -> Value {
        if !self.is_configured() {
            warn!("portal base URL not set, skipping URL generation");
            return node.clone();
        }

        debug!(base = %self.base, "adding portal URLs");
        self.annotate_node(node)
    }

    fn annotate_node(&self, node: &Value) -> Value {
        match node {
            Value::Object(map) => Value::Object(self.annotate_object(map)),
            Value::Array(items) => {
                Value::Array(items.iter().map(|item| self.annotate_node(item)).collect())
            }
            scalar => scalar.clone(),
        }
    }

    fn annotate_object(&self, map: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::with_capacity(map.len() + 1);

        for (key, value) in map {
            let descend = !SKIP_FIELDS.contains(&key.as_str())
                && (value.is_object() || value.is_array());
            let value = if descend {
                self.annotate_node(value)
            } else {
                value.clone()
            };
            out.insert(key.clone(), value);
        }

        // First string-valued candidate decides, even if it yields nothing.
        let location = PATH_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_str).map(|v| (*field, v)));

        if let Some((field, path)) = location {
            if let Some(url) = self.resolve(path) {
                trace!(field, %url, "added portal URL");
                out.insert(PORTAL_URL_FIELD.to_string(), Value::String(url));
            }
        }

        out
    }

    /// Build `{base_url, urls: [{path, portal_url}]}` for a list of paths.
    /// Non-string entries are skipped.
    pub fn generate(&self, paths: &[Value]) -> Value {
        let urls: Vec<Value> = paths
            .iter()
            .filter_map(Value::as_str)
            .map(|path| json!({ "path": path, "portal_url": self.join(path) }))
            .collect();

        json!({ "base_url": self.base, "urls": urls })
    }

    /// Describe the current portal configuration with sample URLs.
    pub fn diagnostics(&self) -> Value {
        let generated: Vec<Value> = if self.is_configured() {
            EXAMPLE_PATHS
                .iter()
                .map(|path| json!({ "path": path, "portal_url": self.join(path) }))
                .collect()
        } else {
            Vec::new()
        };

        json!({
            "portal_base_url": if self.is_configured() { self.base.as_str() } else { "NOT SET" },
            "example_paths": EXAMPLE_PATHS,
            "generated_urls": generated,
        })
    }
}
