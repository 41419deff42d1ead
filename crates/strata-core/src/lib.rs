//! # strata-core
//!
//! Core engine for classifying source files into architectural elements
//! and describing the dependencies between them.
//!
//! Files are resolved against an ordered list of [`ElementDescriptor`]s
//! into [`FileElement`]s carrying a type/category, the element's root
//! path, captured pattern values and a chain of ancestor elements. Two
//! resolved paths connected by an import become a
//! [`DependencyDescription`] with an inferred structural
//! [`Relationship`] (parent, child, sibling, uncle, ...). Every derived
//! value is memoized in serializable caches.
//!
//! ## Example
//!
//! ```ignore
//! use strata_core::{ElementDescriptor, ElementsDescriptor, Settings};
//!
//! let settings = Settings::new(vec![ElementDescriptor::new(
//!     Some("component"),
//!     None,
//!     vec!["src/components/*".to_string()],
//! )?]);
//! let elements = ElementsDescriptor::new(settings.into(), Default::default());
//! let element = elements.describe_element(Some("src/components/button/index.js"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod config;
mod dependencies;
mod elements;
mod relationship;
mod template;
mod types;

/// Glob matching and the shared compiled-pattern registry.
pub mod pattern;

pub use cache::{Cache, CacheKey, CacheSnapshot};
pub use config::{ConfigError, ElementDescriptor, MatchMode, Settings};
pub use dependencies::DependenciesDescriptor;
pub use elements::{ElementsCacheSnapshot, ElementsDescriptor};
pub use pattern::{PatternError, PatternMatcher};
pub use relationship::relationship_between;
pub use template::TemplateRenderer;
pub use types::{
    DependencyDescription, DependencyElement, DependencyInfo, DependencyRequest, ElementClass,
    ElementFacts, ElementParent, FileElement, Origin, Relationship, RelationshipPair,
};
