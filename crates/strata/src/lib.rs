//! # strata
//!
//! Element classification and dependency boundary matching.
//!
//! strata classifies source files into architectural elements
//! (components, modules, services, ...) based on configurable path
//! patterns, infers the structural relationship between any two
//! elements connected by an import, and evaluates declarative,
//! glob/template-based selectors against the result, all behind the
//! [`Matcher`] facade, with serializable multi-level caches.
//!
//! ## Example
//!
//! ```ignore
//! use strata::{DependencyRequest, ElementDescriptor, Matcher, Settings};
//!
//! let settings = Settings::new(vec![ElementDescriptor::new(
//!     Some("module"),
//!     None,
//!     vec!["modules/*".to_string()],
//! )?]);
//! let matcher = Matcher::new(settings);
//!
//! let described = matcher.describe_dependency(&DependencyRequest {
//!     from: Some("src/modules/mod-a/index.js".into()),
//!     to: Some("src/modules/mod-b/index.js".into()),
//!     source: Some("../mod-b".into()),
//!     kind: "value".into(),
//!     ..Default::default()
//! });
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod matcher;

pub use matcher::{DescriptorsCacheSnapshot, Matcher, MatcherCacheSnapshot};

pub use strata_core::{
    Cache, CacheKey, CacheSnapshot, ConfigError, DependenciesDescriptor, DependencyDescription,
    DependencyElement, DependencyInfo, DependencyRequest, ElementClass, ElementDescriptor,
    ElementFacts, ElementParent, ElementsCacheSnapshot, ElementsDescriptor, FileElement,
    MatchMode, Origin, PatternError, PatternMatcher, Relationship, RelationshipPair, Settings,
    TemplateRenderer,
};
pub use strata_match::{
    CapturedSpec, DependenciesMatcher, DependencySelector, ElementSelector, ElementSelectors,
    ElementsMatcher, FromSelector, FromSelectorData, FromSelectors, PatternSpec, SelectorData,
    SelectorError, TargetSelector, TargetSelectorData, TargetSelectors,
};
