// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Template renderers.
//!
//! Template engines plug in through [`ViewRenderer`]. Besides rendering, a
//! renderer recognizes its template names (usually by file suffix); this is
//! what separates direct template calls from static asset requests.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde_json::Value as JsonValue;

use crate::error::{PagesError, Result};

/// A template engine.
pub trait ViewRenderer: Send + Sync + 'static {
    /// Renderer name, referenced by application renderer requirements.
    fn name(&self) -> &str;

    /// Returns true when the (file) name is a template of this engine.
    fn is_renderable(&self, template: &str) -> bool;

    /// Renders template source with the model.
    fn render(&self, template: &str, source: &[u8], model: &JsonValue) -> Result<String>;
}

/// Registered template engines, in registration order.
#[derive(Clone, Default)]
pub struct RendererRegistry {
    renderers: Vec<Arc<dyn ViewRenderer>>,
}

impl RendererRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a renderer.
    pub fn register<R: ViewRenderer>(&mut self, renderer: R) {
        tracing::debug!("Registered view renderer '{}'", renderer.name());
        self.renderers.push(Arc::new(renderer));
    }

    /// Names of registered renderers.
    pub fn names(&self) -> Vec<&str> {
        self.renderers.iter().map(|r| r.name()).collect()
    }

    /// True when a renderer with the name is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.renderers.iter().any(|r| r.name() == name)
    }

    /// True when any renderer recognizes the name as a template.
    pub fn is_template(&self, name: &str) -> bool {
        self.renderers.iter().any(|r| r.is_renderable(name))
    }

    /// First renderer accepting the template.
    pub fn renderer_for(&self, template: &str) -> Option<&dyn ViewRenderer> {
        self.renderers
            .iter()
            .find(|r| r.is_renderable(template))
            .map(|r| r.as_ref())
    }

    /// Renders with the first renderer accepting the template.
    pub fn render(&self, template: &str, source: &[u8], model: &JsonValue) -> Result<String> {
        let renderer = self
            .renderer_for(template)
            .ok_or_else(|| PagesError::NoRenderer(template.to_string()))?;
        tracing::debug!("Rendering {} with '{}'", template, renderer.name());
        renderer.render(template, source, model)
    }
}

impl std::fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

lazy_static! {
    // {{{ raw.path }}} or {{ escaped.path }}
    static ref PLACEHOLDER: Regex =
        Regex::new(r"\{\{\{\s*([\w.]+)\s*\}\}\}|\{\{\s*([\w.]+)\s*\}\}").unwrap();
}

/// Minimal built-in engine for `.tpl` files.
///
/// Substitutes `{{ path.to.value }}` from the model (html escaped) and
/// `{{{ path.to.value }}}` (raw). Missing values render as empty strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderRenderer;

impl PlaceholderRenderer {
    /// Renderer name.
    pub const NAME: &'static str = "placeholder";

    /// Template file suffix.
    pub const SUFFIX: &'static str = ".tpl";
}

impl ViewRenderer for PlaceholderRenderer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_renderable(&self, template: &str) -> bool {
        template.ends_with(Self::SUFFIX)
    }

    fn render(&self, template: &str, source: &[u8], model: &JsonValue) -> Result<String> {
        let source = std::str::from_utf8(source).map_err(|e| PagesError::RenderError {
            template: template.to_string(),
            message: e.to_string(),
        })?;
        let rendered = PLACEHOLDER.replace_all(source, |caps: &Captures| {
            match (caps.get(1), caps.get(2)) {
                (Some(raw), _) => display_value(lookup_value(model, raw.as_str())),
                (None, Some(escaped)) => html_escape(&display_value(lookup_value(model, escaped.as_str()))),
                _ => String::new(),
            }
        });
        Ok(rendered.into_owned())
    }
}

fn lookup_value<'a>(model: &'a JsonValue, path: &str) -> Option<&'a JsonValue> {
    path.split('.').try_fold(model, |value, key| match value {
        JsonValue::Object(map) => map.get(key),
        JsonValue::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

fn display_value(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => String::new(),
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Escapes html special characters.
pub fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_placeholder_render() {
        let model = json!({
            "title": "<b>Hi</b>",
            "user": {"name": "Ann", "roles": ["admin"]},
            "count": 3
        });
        let out = PlaceholderRenderer
            .render(
                "page.tpl",
                b"{{ title }}|{{{title}}}|{{ user.name }}|{{ user.roles.0 }}|{{count}}|{{ missing.x }}",
                &model,
            )
            .unwrap();
        assert_eq!(out, "&lt;b&gt;Hi&lt;/b&gt;|<b>Hi</b>|Ann|admin|3|");
    }

    #[test]
    fn test_registry_template_detection() {
        let mut registry = RendererRegistry::new();
        assert!(!registry.is_template("index.tpl"));
        registry.register(PlaceholderRenderer);
        assert!(registry.is_template("index.tpl"));
        assert!(!registry.is_template("style.css"));
        assert!(registry.contains("placeholder"));
        assert!(matches!(
            registry.render("x.ftl", b"", &JsonValue::Null),
            Err(PagesError::NoRenderer(_))
        ));
    }

    #[test]
    fn test_invalid_utf8_is_render_error() {
        let err = PlaceholderRenderer
            .render("bad.tpl", &[0xff, 0xfe], &JsonValue::Null)
            .unwrap_err();
        assert_eq!(err.status(), 500);
    }
}
