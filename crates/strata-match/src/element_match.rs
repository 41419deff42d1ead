//! Matching of described elements against selectors.

use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use strata_core::{Cache, CacheKey, CacheSnapshot, ElementFacts, PatternMatcher};

use crate::predicates::{build_context, PredicateEngine};
use crate::selector::{ElementSelectors, SelectorData, SelectorError};

/// Evaluates whether described elements satisfy element selectors.
///
/// Selectors are tried in declaration order and the first fully
/// matching one wins. Results are memoized on the element's identity,
/// the normalized selector list, and any extra template data.
pub struct ElementsMatcher {
    engine: PredicateEngine,
    cache: Cache<Option<usize>>,
}

impl ElementsMatcher {
    /// Creates a matcher over a shared pattern registry.
    #[must_use]
    pub fn new(patterns: Arc<PatternMatcher>, legacy_templates: bool, cache_enabled: bool) -> Self {
        Self {
            engine: PredicateEngine::new(patterns, legacy_templates),
            cache: Cache::new(cache_enabled),
        }
    }

    /// Whether the element satisfies any of the selectors.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for a malformed selector list.
    pub fn is_element_match<E: ElementFacts>(
        &self,
        element: &E,
        selectors: &ElementSelectors,
        extra: Option<&Value>,
    ) -> Result<bool, SelectorError> {
        self.get_selector_matching(element, selectors, extra)
            .map(|matched| matched.is_some())
    }

    /// The first selector the element fully satisfies, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError`] for a malformed selector list.
    pub fn get_selector_matching<E: ElementFacts>(
        &self,
        element: &E,
        selectors: &ElementSelectors,
        extra: Option<&Value>,
    ) -> Result<Option<SelectorData>, SelectorError> {
        let normalized = selectors.normalized()?;
        let identity = element.template_value();

        let key = CacheKey::of(&(&identity, &normalized, extra));
        if self.cache.has(&key) {
            trace!("element match cache hit");
            return Ok(self
                .cache
                .get(&key)
                .flatten()
                .map(|index| normalized[index].clone()));
        }

        let context = build_context(&[("element", identity)], extra);
        let found = normalized
            .iter()
            .position(|selector| self.engine.element_matches(element, selector, &context));

        self.cache.set(&key, found);
        Ok(found.map(|index| normalized[index].clone()))
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
