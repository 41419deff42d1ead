//! The engine facade: description plus matching behind one API.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use strata_core::{
    CacheSnapshot, DependenciesDescriptor, DependencyDescription, DependencyElement,
    DependencyRequest, ElementFacts, ElementsCacheSnapshot, ElementsDescriptor, FileElement,
    PatternMatcher, Settings,
};
use strata_match::{
    DependenciesMatcher, DependencySelector, ElementSelectors, ElementsMatcher, SelectorData,
    SelectorError,
};

/// Serialized caches of the describing components.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DescriptorsCacheSnapshot {
    /// File and dependency-element caches.
    #[serde(flatten)]
    pub elements: ElementsCacheSnapshot,
    /// Dependency description cache.
    pub dependencies: CacheSnapshot<DependencyDescription>,
}

/// Serialized caches of a whole [`Matcher`], nested by component.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatcherCacheSnapshot {
    /// Caches of the describing side.
    pub descriptors: DescriptorsCacheSnapshot,
    /// Element match cache.
    pub elements_matcher: CacheSnapshot<Option<usize>>,
    /// Dependency match cache.
    pub dependencies_matcher: CacheSnapshot<Option<usize>>,
}

/// Facade composing element description, dependency description and
/// selector matching over one configuration root.
///
/// Sibling matchers created with [`Matcher::sibling`] share the
/// compiled-pattern registry, so identical glob work is deduplicated
/// across instances; every other cache stays per-instance.
pub struct Matcher {
    settings: Arc<Settings>,
    patterns: Arc<PatternMatcher>,
    elements: Arc<ElementsDescriptor>,
    dependencies: DependenciesDescriptor,
    elements_matcher: ElementsMatcher,
    dependencies_matcher: DependenciesMatcher,
}

impl Matcher {
    /// Creates a matcher with its own pattern registry.
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self::with_registry(Arc::new(settings), Arc::new(PatternMatcher::new()))
    }

    /// Creates a matcher over an explicitly shared pattern registry.
    #[must_use]
    pub fn with_registry(settings: Arc<Settings>, patterns: Arc<PatternMatcher>) -> Self {
        let cache_enabled = settings.cache_enabled();
        let legacy = settings.legacy_templates();
        let elements = Arc::new(ElementsDescriptor::new(
            Arc::clone(&settings),
            Arc::clone(&patterns),
        ));
        Self {
            dependencies: DependenciesDescriptor::new(Arc::clone(&elements), cache_enabled),
            elements_matcher: ElementsMatcher::new(Arc::clone(&patterns), legacy, cache_enabled),
            dependencies_matcher: DependenciesMatcher::new(
                Arc::clone(&patterns),
                legacy,
                cache_enabled,
            ),
            settings,
            patterns,
            elements,
        }
    }

    /// Creates a sibling matcher: same settings, shared pattern
    /// registry, fresh result caches.
    #[must_use]
    pub fn sibling(&self) -> Self {
        Self::with_registry(Arc::clone(&self.settings), Arc::clone(&self.patterns))
    }

    /// The settings this matcher was built from.
    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// The shared compiled-pattern registry.
    #[must_use]
    pub fn pattern_registry(&self) -> &Arc<PatternMatcher> {
        &self.patterns
    }

    // ── description ──

    /// Describes a project file.
    #[must_use]
    pub fn describe_element(&self, file_path: Option<&str>) -> FileElement {
        self.elements.describe_element(file_path)
    }

    /// Describes the target of an import.
    #[must_use]
    pub fn describe_dependency_element(
        &self,
        source: Option<&str>,
        file_path: Option<&str>,
    ) -> DependencyElement {
        self.elements.describe_dependency_element(source, file_path)
    }

    /// Describes one dependency between two files.
    #[must_use]
    pub fn describe_dependency(&self, request: &DependencyRequest) -> DependencyDescription {
        self.dependencies.describe_dependency(request)
    }

    // ── matching ──

    /// Whether a described element satisfies the selectors.
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
        self.elements_matcher.is_element_match(element, selectors, extra)
    }

    /// The first selector a described element satisfies, if any.
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
        self.elements_matcher
            .get_selector_matching(element, selectors, extra)
    }

    /// Whether a described dependency satisfies the selector.
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
        self.dependencies_matcher
            .is_dependency_match(dependency, selector, extra)
    }

    /// The first selector a described dependency satisfies, if any.
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
        self.dependencies_matcher
            .get_selectors_matching(dependency, selectors, extra)
    }

    /// Whether an element satisfies selectors supplied as untyped JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Shape`] immediately for a value with no
    /// recognizable selector shape.
    pub fn is_element_match_value<E: ElementFacts>(
        &self,
        element: &E,
        selectors: &Value,
        extra: Option<&Value>,
    ) -> Result<bool, SelectorError> {
        let selectors = ElementSelectors::from_value(selectors)?;
        self.is_element_match(element, &selectors, extra)
    }

    /// Whether a dependency satisfies a selector supplied as untyped
    /// JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Shape`] immediately for a value with no
    /// recognizable selector shape.
    pub fn is_dependency_match_value(
        &self,
        dependency: &DependencyDescription,
        selector: &Value,
        extra: Option<&Value>,
    ) -> Result<bool, SelectorError> {
        let selector = DependencySelector::from_value(selector)?;
        self.is_dependency_match(dependency, &selector, extra)
    }

    // ── cache passthrough ──

    /// Serializes every cache, nested by component.
    #[must_use]
    pub fn serialize_cache(&self) -> MatcherCacheSnapshot {
        MatcherCacheSnapshot {
            descriptors: DescriptorsCacheSnapshot {
                elements: self.elements.serialize_cache(),
                dependencies: self.dependencies.serialize_cache(),
            },
            elements_matcher: self.elements_matcher.serialize_cache(),
            dependencies_matcher: self.dependencies_matcher.serialize_cache(),
        }
    }

    /// Loads every cache from a snapshot, additively.
    pub fn set_cache_from_serialized(&self, snapshot: MatcherCacheSnapshot) {
        self.elements
            .set_cache_from_serialized(snapshot.descriptors.elements);
        self.dependencies
            .set_cache_from_serialized(snapshot.descriptors.dependencies);
        self.elements_matcher
            .set_cache_from_serialized(snapshot.elements_matcher);
        self.dependencies_matcher
            .set_cache_from_serialized(snapshot.dependencies_matcher);
    }

    /// Wipes every cache. Results are unaffected, only performance.
    pub fn clear_cache(&self) {
        self.elements.clear_cache();
        self.dependencies.clear_cache();
        self.elements_matcher.clear_cache();
        self.dependencies_matcher.clear_cache();
    }
}
