//! Matching of described dependencies against dependency selectors.

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use strata_core::{Cache, CacheKey, CacheSnapshot, DependencyDescription, ElementFacts, PatternMatcher};

use crate::predicates::{build_context, PredicateEngine};
use crate::selector::{
    DependencySelector, FromSelectorData, NormalizedDependencySelector, SelectorError,
    TargetSelectorData,
};

/// Evaluates whether described dependencies satisfy dependency
/// selectors.
///
/// The importer side is constrained by element predicates plus the
/// importer-side relationship; the imported side additionally carries
/// the dependency metadata predicates (kind, node kind, specifiers,
/// relationship). An absent side is vacuously true.
pub struct DependenciesMatcher {
    engine: PredicateEngine,
    cache: Cache<Option<usize>>,
}

impl DependenciesMatcher {
    /// Creates a matcher over a shared pattern registry.
    #[must_use]
    pub fn new(patterns: Arc<PatternMatcher>, legacy_templates: bool, cache_enabled: bool) -> Self {
        Self {
            engine: PredicateEngine::new(patterns, legacy_templates),
            cache: Cache::new(cache_enabled),
        }
    }

    /// Whether the dependency satisfies the selector.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for a malformed selector.
    pub fn is_dependency_match(
        &self,
        dependency: &DependencyDescription,
        selector: &DependencySelector,
        extra: Option<&Value>,
    ) -> Result<bool, SelectorError> {
        self.get_selectors_matching(dependency, std::slice::from_ref(selector), extra)
            .map(|matched| matched.is_some())
    }

    /// The first selector the dependency fully satisfies, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for an empty or malformed selector
    /// list.
    pub fn get_selectors_matching(
        &self,
        dependency: &DependencyDescription,
        selectors: &[DependencySelector],
        extra: Option<&Value>,
    ) -> Result<Option<DependencySelector>, SelectorError> {
        if selectors.is_empty() {
            return Err(SelectorError::Empty);
        }
        let normalized = selectors
            .iter()
            .map(DependencySelector::normalized)
            .collect::<Result<Vec<_>, _>>()?;

        let from_identity = dependency.from.template_value();
        let to_identity = dependency.to.template_value();

        let key = CacheKey::of(&(
            &from_identity,
            &to_identity,
            &dependency.dependency,
            &normalized,
            extra,
        ));
        if self.cache.has(&key) {
            trace!("dependency match cache hit");
            return Ok(self
                .cache
                .get(&key)
                .flatten()
                .map(|index| selectors[index].clone()));
        }

        let context = build_context(
            &[("from", from_identity), ("to", to_identity)],
            extra,
        );
        let found = normalized
            .iter()
            .position(|selector| self.selector_matches(dependency, selector, &context));

        self.cache.set(&key, found);
        Ok(found.map(|index| selectors[index].clone()))
    }

    fn selector_matches(
        &self,
        dependency: &DependencyDescription,
        selector: &NormalizedDependencySelector,
        context: &Value,
    ) -> bool {
        let from_ok = selector.from.as_ref().map_or(true, |list| {
            list.iter()
                .any(|data| self.from_side_matches(dependency, data, context))
        });
        if !from_ok {
            return false;
        }
        selector.to.as_ref().map_or(true, |list| {
            list.iter()
                .any(|data| self.to_side_matches(dependency, data, context))
        })
    }

    fn from_side_matches(
        &self,
        dependency: &DependencyDescription,
        data: &FromSelectorData,
        context: &Value,
    ) -> bool {
        self.engine
            .element_matches(&dependency.from, &data.element, context)
            && self.engine.relationship(
                data.relationship.as_ref(),
                dependency.dependency.relationship.from,
                context,
            )
    }

    fn to_side_matches(
        &self,
        dependency: &DependencyDescription,
        data: &TargetSelectorData,
        context: &Value,
    ) -> bool {
        self.engine
            .element_matches(&dependency.to, &data.element, context)
            && self.engine.field(
                data.kind.as_ref(),
                Some(dependency.dependency.kind.as_str()),
                context,
            )
            && self.engine.field(
                data.node_kind.as_ref(),
                dependency.dependency.node_kind.as_deref(),
                context,
            )
            && self.engine.specifiers(
                data.specifiers.as_ref(),
                dependency.dependency.specifiers.as_deref(),
                context,
            )
            && self.engine.relationship(
                data.relationship.as_ref(),
                dependency.dependency.relationship.to,
                context,
            )
    }

    /// Serializes the match cache.
    #[must_use]
    pub fn serialize_cache(&self) -> CacheSnapshot<Option<usize>> {
        self.cache.snapshot()
    }

    /// Loads the match cache from a snapshot, additively.
    pub fn set_cache_from_serialized(&self, snapshot: CacheSnapshot<Option<usize>>) {
        self.cache.load_snapshot(snapshot);
    }

    /// Wipes the match cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use strata_core::{
        DependenciesDescriptor, DependencyRequest, ElementDescriptor, ElementsDescriptor,
        Settings,
    };

    fn describe(from: &str, to: Option<&str>, source: &str) -> DependencyDescription {
        let settings = Arc::new(Settings::new(vec![ElementDescriptor::new(
            Some("module"),
            None,
            vec!["modules/*".to_string()],
        )
        .unwrap()
        .with_capture(vec!["name".to_string()])]));
        let elements = Arc::new(ElementsDescriptor::new(
            settings,
            Arc::new(PatternMatcher::new()),
        ));
        DependenciesDescriptor::new(elements, true).describe_dependency(&DependencyRequest {
            from: Some(from.to_string()),
            to: to.map(str::to_string),
            source: Some(source.to_string()),
            kind: "value".to_string(),
            node_kind: Some("import".to_string()),
            specifiers: vec!["useThing".to_string(), "OtherThing".to_string()],
        })
    }

    fn sibling_dependency() -> DependencyDescription {
        describe(
            "src/modules/root/modules/mod-a/index.js",
            Some("src/modules/root/modules/mod-b/index.js"),
            "../mod-b",
        )
    }

    fn matcher() -> DependenciesMatcher {
        DependenciesMatcher::new(Arc::new(PatternMatcher::new()), true, true)
    }

    #[test]
    fn both_sides_must_match() {
        let dependency = sibling_dependency();
        let m = matcher();

        let both = DependencySelector::from_value(&json!({
            "from": { "type": "module" },
            "to": { "type": "module" }
        }))
        .unwrap();
        assert!(m.is_dependency_match(&dependency, &both, None).unwrap());

        let wrong_from = DependencySelector::from_value(&json!({
            "from": { "type": "component" },
            "to": { "type": "module" }
        }))
        .unwrap();
        assert!(!m.is_dependency_match(&dependency, &wrong_from, None).unwrap());
    }

    #[test]
    fn absent_sides_are_vacuously_true() {
        let dependency = sibling_dependency();
        let m = matcher();
        let empty = DependencySelector::default();
        assert!(m.is_dependency_match(&dependency, &empty, None).unwrap());
    }

    #[test]
    fn relationship_constrains_to_side() {
        let dependency = sibling_dependency();
        let m = matcher();

        let sibling = DependencySelector::from_value(&json!({
            "to": { "type": "module", "relationship": "sibling" }
        }))
        .unwrap();
        assert!(m.is_dependency_match(&dependency, &sibling, None).unwrap());

        let child = DependencySelector::from_value(&json!({
            "to": { "type": "module", "relationship": "child" }
        }))
        .unwrap();
        assert!(!m.is_dependency_match(&dependency, &child, None).unwrap());
    }

    #[test]
    fn brother_alias_matches_sibling() {
        let dependency = sibling_dependency();
        let selector = DependencySelector::from_value(&json!({
            "to": { "relationship": "brother" }
        }))
        .unwrap();
        assert!(matcher()
            .is_dependency_match(&dependency, &selector, None)
            .unwrap());
    }

    #[test]
    fn from_side_relationship_uses_importer_perspective() {
        let dependency = describe(
            "src/modules/root/modules/sub/index.js",
            Some("src/modules/root/index.js"),
            "../..",
        );
        // The imported element is the importer's parent.
        let selector = DependencySelector::from_value(&json!({
            "from": { "relationship": "parent" }
        }))
        .unwrap();
        assert!(matcher()
            .is_dependency_match(&dependency, &selector, None)
            .unwrap());

        let inverse_only = DependencySelector::from_value(&json!({
            "from": { "relationship": "child" }
        }))
        .unwrap();
        assert!(!matcher()
            .is_dependency_match(&dependency, &inverse_only, None)
            .unwrap());
    }

    #[test]
    fn kind_and_node_kind_predicates() {
        let dependency = sibling_dependency();
        let m = matcher();

        let matching = DependencySelector::from_value(&json!({
            "to": { "kind": "value", "nodeKind": "import" }
        }))
        .unwrap();
        assert!(m.is_dependency_match(&dependency, &matching, None).unwrap());

        let wrong_kind = DependencySelector::from_value(&json!({
            "to": { "kind": "type" }
        }))
        .unwrap();
        assert!(!m.is_dependency_match(&dependency, &wrong_kind, None).unwrap());
    }

    #[test]
    fn any_specifier_satisfies_the_pattern() {
        let dependency = sibling_dependency();
        let m = matcher();

        let matching = DependencySelector::from_value(&json!({
            "to": { "specifiers": "use*" }
        }))
        .unwrap();
        assert!(m.is_dependency_match(&dependency, &matching, None).unwrap());

        let failing = DependencySelector::from_value(&json!({
            "to": { "specifiers": ["Missing*"] }
        }))
        .unwrap();
        assert!(!m.is_dependency_match(&dependency, &failing, None).unwrap());
    }

    #[test]
    fn external_dependency_matches_on_base_source() {
        let dependency = describe("src/modules/mod-a/index.js", None, "react-dom/client");
        let selector = DependencySelector::from_value(&json!({
            "to": { "origin": "external", "baseSource": "react-dom" }
        }))
        .unwrap();
        assert!(matcher()
            .is_dependency_match(&dependency, &selector, None)
            .unwrap());
    }

    #[test]
    fn templates_can_reference_both_sides() {
        let dependency = sibling_dependency();
        // Matches only when both sides captured the same module name;
        // here they differ, so the selector must fail.
        let selector = DependencySelector::from_value(&json!({
            "to": { "captured": { "name": "{{from.captured.name}}" } }
        }))
        .unwrap();
        assert!(!matcher()
            .is_dependency_match(&dependency, &selector, None)
            .unwrap());

        let internal = describe(
            "src/modules/root/modules/mod-a/index.js",
            Some("src/modules/root/modules/mod-a/util.js"),
            "./util",
        );
        assert!(matcher()
            .is_dependency_match(&internal, &selector, None)
            .unwrap());
    }

    #[test]
    fn first_matching_selector_is_returned() {
        let dependency = sibling_dependency();
        let selectors = vec![
            DependencySelector::from_value(&json!({
                "to": { "relationship": "child" }
            }))
            .unwrap(),
            DependencySelector::from_value(&json!({
                "to": { "relationship": "sibling" }
            }))
            .unwrap(),
        ];
        let matched = matcher()
            .get_selectors_matching(&dependency, &selectors, None)
            .unwrap();
        assert_eq!(matched, Some(selectors[1].clone()));
    }

    #[test]
    fn empty_selector_list_errors() {
        let dependency = sibling_dependency();
        let result = matcher().get_selectors_matching(&dependency, &[], None);
        assert!(matches!(result, Err(SelectorError::Empty)));
    }

    #[test]
    fn results_are_memoized() {
        let patterns = Arc::new(PatternMatcher::new());
        let m = DependenciesMatcher::new(Arc::clone(&patterns), true, true);
        let dependency = sibling_dependency();
        let selector = DependencySelector::from_value(&json!({
            "to": { "relationship": "sibling" }
        }))
        .unwrap();

        assert!(m.is_dependency_match(&dependency, &selector, None).unwrap());
        let after_first = patterns.invocations();
        assert!(m.is_dependency_match(&dependency, &selector, None).unwrap());
        assert_eq!(patterns.invocations(), after_first);
    }
}
