//! # strata-match
//!
//! Selector model and matching engine for strata.
//!
//! Declarative selectors (glob- and template-capable predicates over
//! element types, categories, paths, captured values and dependency
//! metadata) are normalized into one canonical shape and evaluated
//! against described elements and dependencies. Matching is
//! first-match-wins over ordered selector lists, with results memoized
//! per element identity and selector list.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod dependency_match;
mod element_match;
mod predicates;
mod selector;

pub use dependency_match::DependenciesMatcher;
pub use element_match::ElementsMatcher;
pub use selector::{
    CapturedSpec, DependencySelector, ElementSelector, ElementSelectors, FromSelector,
    FromSelectorData, FromSelectors, NormalizedDependencySelector, PatternSpec, SelectorData,
    SelectorError, TargetSelector, TargetSelectorData, TargetSelectors,
};
