//! Sub-predicate evaluation shared by both matchers.
//!
//! Each predicate is vacuously true when its selector key is absent,
//! never matches when the rendered pattern list is empty, and otherwise
//! glob-matches the element value after template rendering. Boolean
//! predicates use strict equality, never globs.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use strata_core::{ElementFacts, PatternMatcher, Relationship, TemplateRenderer};

use crate::selector::{CapturedSpec, PatternSpec, SelectorData};

pub(crate) struct PredicateEngine {
    patterns: Arc<PatternMatcher>,
    renderer: TemplateRenderer,
}

impl PredicateEngine {
    pub(crate) fn new(patterns: Arc<PatternMatcher>, legacy_templates: bool) -> Self {
        Self {
            patterns,
            renderer: TemplateRenderer::new(legacy_templates),
        }
    }

    /// Renders a pattern spec against the context, dropping entries that
    /// render empty so a stray empty string cannot match universally.
    fn render(&self, spec: &PatternSpec, context: &Value) -> Vec<String> {
        spec.patterns()
            .iter()
            .map(|pattern| self.renderer.render(pattern, context))
            .filter(|rendered| !rendered.is_empty())
            .collect()
    }

    /// Glob predicate over one optional element value.
    pub(crate) fn field(
        &self,
        spec: Option<&PatternSpec>,
        actual: Option<&str>,
        context: &Value,
    ) -> bool {
        let Some(spec) = spec else {
            return true;
        };
        let rendered = self.render(spec, context);
        if rendered.is_empty() {
            return false;
        }
        let Some(value) = actual else {
            return false;
        };
        self.patterns.is_match(value, &rendered)
    }

    /// Captured-values predicate: every constrained capture must exist,
    /// be non-empty, and glob-match its pattern.
    fn captured(
        &self,
        spec: Option<&CapturedSpec>,
        actual: Option<&BTreeMap<String, String>>,
        context: &Value,
    ) -> bool {
        let Some(spec) = spec else {
            return true;
        };
        if spec.is_empty() {
            return true;
        }
        let Some(values) = actual else {
            return false;
        };
        spec.iter().all(|(name, pattern)| {
            values
                .get(name)
                .filter(|value| !value.is_empty())
                .is_some_and(|value| self.field(Some(pattern), Some(value), context))
        })
    }

    /// Relationship predicate, honoring the deprecated `brother` alias.
    pub(crate) fn relationship(
        &self,
        spec: Option<&PatternSpec>,
        actual: Option<Relationship>,
        context: &Value,
    ) -> bool {
        let Some(spec) = spec else {
            return true;
        };
        let rendered: Vec<String> = self
            .render(spec, context)
            .into_iter()
            .map(|pattern| {
                if pattern == "brother" {
                    "sibling".to_string()
                } else {
                    pattern
                }
            })
            .collect();
        if rendered.is_empty() {
            return false;
        }
        let Some(relationship) = actual else {
            return false;
        };
        self.patterns.is_match(relationship.as_str(), &rendered)
    }

    /// Specifiers predicate: any imported specifier may satisfy the
    /// patterns.
    pub(crate) fn specifiers(
        &self,
        spec: Option<&PatternSpec>,
        actual: Option<&[String]>,
        context: &Value,
    ) -> bool {
        let Some(spec) = spec else {
            return true;
        };
        let rendered = self.render(spec, context);
        if rendered.is_empty() {
            return false;
        }
        actual.is_some_and(|specifiers| {
            specifiers
                .iter()
                .any(|specifier| self.patterns.is_match(specifier, &rendered))
        })
    }

    /// Full element predicate set, cheap checks first.
    pub(crate) fn element_matches<E: ElementFacts + ?Sized>(
        &self,
        element: &E,
        data: &SelectorData,
        context: &Value,
    ) -> bool {
        self.field(data.element_type.as_ref(), element.element_type(), context)
            && self.field(data.category.as_ref(), element.category(), context)
            && self.field(
                data.origin.as_ref(),
                Some(element.origin().as_str()),
                context,
            )
            && data
                .is_ignored
                .map_or(true, |expected| expected == element.is_ignored())
            && data
                .is_unknown
                .map_or(true, |expected| expected == element.is_unknown())
            && self.field(data.path.as_ref(), element.path(), context)
            && self.field(data.element_path.as_ref(), element.element_path(), context)
            && self.field(
                data.internal_path.as_ref(),
                element.internal_path(),
                context,
            )
            && self.field(data.source.as_ref(), element.source(), context)
            && self.field(data.base_source.as_ref(), element.base_source(), context)
            && self.captured(data.captured.as_ref(), element.captured(), context)
    }
}

/// Builds a template/match context from named element views plus extra
/// caller-supplied data.
pub(crate) fn build_context(entries: &[(&str, Value)], extra: Option<&Value>) -> Value {
    let mut map = serde_json::Map::new();
    for (name, value) in entries {
        map.insert((*name).to_string(), value.clone());
    }
    if let Some(Value::Object(extra_map)) = extra {
        for (key, value) in extra_map {
            map.insert(key.clone(), value.clone());
        }
    }
    Value::Object(map)
}
