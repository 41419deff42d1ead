//! Placeholder rendering for selector values.
//!
//! Selector patterns may reference the match-time context through
//! `{{ path.to.value }}` placeholders (and, when legacy mode is on,
//! `${path.to.value}`, which is rewritten to the primary syntax before
//! rendering). Paths are dot-separated lookups into a JSON context such
//! as `{ "element": {...} }` or `{ "from": {...}, "to": {...} }`;
//! unresolved paths render as an empty string.

use regex::Regex;
use serde_json::Value;

/// Renders `{{ ... }}` placeholders against a JSON context.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    placeholder: Regex,
    legacy: Option<Regex>,
}

impl TemplateRenderer {
    /// Creates a renderer. With `legacy_templates`, `${x}` placeholders
    /// are accepted as an alias for `{{x}}`.
    #[must_use]
    pub fn new(legacy_templates: bool) -> Self {
        #[allow(clippy::expect_used)]
        let placeholder =
            Regex::new(r"\{\{\s*([\w.$-]+)\s*\}\}").expect("placeholder regex is well formed");
        let legacy = legacy_templates.then(|| {
            #[allow(clippy::expect_used)]
            Regex::new(r"\$\{\s*([\w.$-]+)\s*\}").expect("legacy placeholder regex is well formed")
        });
        Self {
            placeholder,
            legacy,
        }
    }

    /// Renders a template against the given context.
    ///
    /// Returns the input unchanged (aside from placeholder substitution)
    /// so plain glob patterns pass through untouched.
    #[must_use]
    pub fn render(&self, template: &str, context: &Value) -> String {
        let rewritten = match &self.legacy {
            Some(legacy) if template.contains("${") => {
                legacy.replace_all(template, "{{$1}}").into_owned()
            }
            _ => template.to_string(),
        };

        if !rewritten.contains("{{") {
            return rewritten;
        }

        self.placeholder
            .replace_all(&rewritten, |caps: &regex::Captures<'_>| {
                lookup(context, &caps[1])
            })
            .into_owned()
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Resolves a dot-separated path within a JSON value, rendering scalars
/// as strings and anything unresolved as an empty string.
fn lookup(context: &Value, path: &str) -> String {
    let mut current = context;
    for key in path.split('.') {
        current = match current {
            Value::Object(map) => match map.get(key) {
                Some(value) => value,
                None => return String::new(),
            },
            Value::Array(items) => match key.parse::<usize>().ok().and_then(|i| items.get(i)) {
                Some(value) => value,
                None => return String::new(),
            },
            _ => return String::new(),
        };
    }
    match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Object(_) | Value::Array(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn renders_simple_path() {
        let renderer = TemplateRenderer::new(true);
        let context = json!({ "element": { "type": "component" } });
        assert_eq!(renderer.render("{{element.type}}", &context), "component");
    }

    #[test]
    fn renders_with_inner_whitespace() {
        let renderer = TemplateRenderer::new(true);
        let context = json!({ "element": { "type": "module" } });
        assert_eq!(renderer.render("{{ element.type }}", &context), "module");
    }

    #[test]
    fn legacy_syntax_is_rewritten() {
        let renderer = TemplateRenderer::new(true);
        let context = json!({ "from": { "captured": { "family": "atoms" } } });
        assert_eq!(renderer.render("${from.captured.family}", &context), "atoms");
    }

    #[test]
    fn legacy_syntax_disabled() {
        let renderer = TemplateRenderer::new(false);
        let context = json!({ "element": { "type": "component" } });
        assert_eq!(renderer.render("${element.type}", &context), "${element.type}");
    }

    #[test]
    fn unresolved_path_renders_empty() {
        let renderer = TemplateRenderer::new(true);
        let context = json!({ "element": {} });
        assert_eq!(renderer.render("{{element.missing}}", &context), "");
    }

    #[test]
    fn plain_pattern_passes_through() {
        let renderer = TemplateRenderer::new(true);
        let context = json!({});
        assert_eq!(renderer.render("src/**/*.js", &context), "src/**/*.js");
    }

    #[test]
    fn mixed_literal_and_placeholder() {
        let renderer = TemplateRenderer::new(true);
        let context = json!({ "element": { "category": "ui" } });
        assert_eq!(
            renderer.render("modules/{{element.category}}/*", &context),
            "modules/ui/*"
        );
    }

    #[test]
    fn scalars_are_stringified() {
        let renderer = TemplateRenderer::new(true);
        let context = json!({ "element": { "isUnknown": false, "depth": 3 } });
        assert_eq!(renderer.render("{{element.isUnknown}}", &context), "false");
        assert_eq!(renderer.render("{{element.depth}}", &context), "3");
    }
}
