//! Selector shapes and normalization.
//!
//! Selectors arrive in three legacy-compatible shapes: a bare string
//! (shorthand for `{ type }`), a `[type, captured]` pair, or a full
//! object. Every shape is normalized into one canonical [`SelectorData`]
//! before any matching logic runs; the matchers never see the raw
//! shapes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors raised for malformed selector input.
///
/// These signal misuse of the API, not runtime data conditions: an
/// element that matches nothing is a `false`/`None` result, never an
/// error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SelectorError {
    /// The JSON value does not have a recognizable selector shape.
    #[error("invalid selector: {detail}")]
    Shape {
        /// What failed to deserialize.
        detail: String,
    },

    /// An empty selector list was supplied.
    #[error("invalid selector: empty selector list")]
    Empty,
}

/// One glob pattern or a list of alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PatternSpec {
    /// A single pattern.
    One(String),
    /// Any of several patterns.
    Many(Vec<String>),
}

impl PatternSpec {
    /// The patterns as a slice.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        match self {
            Self::One(pattern) => std::slice::from_ref(pattern),
            Self::Many(patterns) => patterns,
        }
    }
}

impl From<&str> for PatternSpec {
    fn from(pattern: &str) -> Self {
        Self::One(pattern.to_string())
    }
}

/// Patterns constraining captured values, keyed by capture name.
pub type CapturedSpec = BTreeMap<String, PatternSpec>;

/// The canonical element selector: every field optional, absent fields
/// constrain nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectorData {
    /// Element type pattern.
    #[serde(rename = "type")]
    pub element_type: Option<PatternSpec>,
    /// Element category pattern.
    pub category: Option<PatternSpec>,
    /// File path pattern.
    pub path: Option<PatternSpec>,
    /// Element root path pattern.
    pub element_path: Option<PatternSpec>,
    /// Internal path pattern.
    pub internal_path: Option<PatternSpec>,
    /// Origin pattern (`local`, `external`, `core`).
    pub origin: Option<PatternSpec>,
    /// Import specifier pattern.
    pub source: Option<PatternSpec>,
    /// Package/builtin root pattern.
    pub base_source: Option<PatternSpec>,
    /// Captured-value patterns.
    pub captured: Option<CapturedSpec>,
    /// Exact match on the ignored flag.
    pub is_ignored: Option<bool>,
    /// Exact match on the unknown flag.
    pub is_unknown: Option<bool>,
}

impl SelectorData {
    /// Shorthand for a selector constraining only the element type.
    #[must_use]
    pub fn of_type(element_type: &str) -> Self {
        Self {
            element_type: Some(PatternSpec::from(element_type)),
            ..Self::default()
        }
    }
}

/// An element selector in any accepted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementSelector {
    /// Bare string shorthand for `{ type }`.
    Type(String),
    /// Legacy `[type, captured]` pair.
    TypeAndCaptured(String, CapturedSpec),
    /// Full selector object.
    Data(SelectorData),
}

impl ElementSelector {
    /// Normalizes into canonical selector data.
    #[must_use]
    pub fn normalize(&self) -> SelectorData {
        match self {
            Self::Type(element_type) => SelectorData::of_type(element_type),
            Self::TypeAndCaptured(element_type, captured) => SelectorData {
                element_type: Some(PatternSpec::from(element_type.as_str())),
                captured: Some(captured.clone()),
                ..SelectorData::default()
            },
            Self::Data(data) => data.clone(),
        }
    }
}

/// One element selector or an ordered list of alternatives.
///
/// Lists are evaluated in declaration order; the first fully matching
/// entry wins and entries are never merged. A two-entry array whose
/// first entry is a string and second an object is always read as the
/// legacy `[type, captured]` pair, not as a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementSelectors {
    /// A single selector.
    One(ElementSelector),
    /// An ordered list of selectors.
    Many(Vec<ElementSelector>),
}

impl ElementSelectors {
    /// Builds selectors from untyped JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Shape`] when the value has no
    /// recognizable selector shape.
    pub fn from_value(value: &Value) -> Result<Self, SelectorError> {
        serde_json::from_value(value.clone()).map_err(|e| SelectorError::Shape {
            detail: e.to_string(),
        })
    }

    /// Normalizes into an ordered list of canonical selector data.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Empty`] for an empty list.
    pub fn normalized(&self) -> Result<Vec<SelectorData>, SelectorError> {
        let normalized: Vec<SelectorData> = match self {
            Self::One(selector) => vec![selector.normalize()],
            Self::Many(selectors) => selectors.iter().map(ElementSelector::normalize).collect(),
        };
        if normalized.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(normalized)
    }
}

impl From<&str> for ElementSelectors {
    fn from(element_type: &str) -> Self {
        Self::One(ElementSelector::Type(element_type.to_string()))
    }
}

// ── dependency selectors ──

/// Importer-side selector: element predicates plus the relationship as
/// seen from the importing file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FromSelectorData {
    /// Element predicates.
    #[serde(flatten)]
    pub element: SelectorData,
    /// Relationship pattern checked against the importer-side value.
    pub relationship: Option<PatternSpec>,
}

/// Imported-side selector: element predicates plus dependency metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TargetSelectorData {
    /// Element predicates.
    #[serde(flatten)]
    pub element: SelectorData,
    /// Dependency kind pattern (e.g. `value`, `type`).
    pub kind: Option<PatternSpec>,
    /// Statement node kind pattern.
    pub node_kind: Option<PatternSpec>,
    /// Specifier patterns; any imported specifier may satisfy them.
    pub specifiers: Option<PatternSpec>,
    /// Relationship pattern checked against the imported-side value.
    pub relationship: Option<PatternSpec>,
}

/// An importer-side selector in any accepted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FromSelector {
    /// Bare string shorthand for `{ type }`.
    Type(String),
    /// Legacy `[type, captured]` pair.
    TypeAndCaptured(String, CapturedSpec),
    /// Full selector object.
    Data(Box<FromSelectorData>),
}

impl FromSelector {
    fn normalize(&self) -> FromSelectorData {
        match self {
            Self::Type(element_type) => FromSelectorData {
                element: SelectorData::of_type(element_type),
                relationship: None,
            },
            Self::TypeAndCaptured(element_type, captured) => FromSelectorData {
                element: SelectorData {
                    element_type: Some(PatternSpec::from(element_type.as_str())),
                    captured: Some(captured.clone()),
                    ..SelectorData::default()
                },
                relationship: None,
            },
            Self::Data(data) => (**data).clone(),
        }
    }
}

/// An imported-side selector in any accepted shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetSelector {
    /// Bare string shorthand for `{ type }`.
    Type(String),
    /// Legacy `[type, captured]` pair.
    TypeAndCaptured(String, CapturedSpec),
    /// Full selector object.
    Data(Box<TargetSelectorData>),
}

impl TargetSelector {
    fn normalize(&self) -> TargetSelectorData {
        match self {
            Self::Type(element_type) => TargetSelectorData {
                element: SelectorData::of_type(element_type),
                ..TargetSelectorData::default()
            },
            Self::TypeAndCaptured(element_type, captured) => TargetSelectorData {
                element: SelectorData {
                    element_type: Some(PatternSpec::from(element_type.as_str())),
                    captured: Some(captured.clone()),
                    ..SelectorData::default()
                },
                ..TargetSelectorData::default()
            },
            Self::Data(data) => (**data).clone(),
        }
    }
}

/// One importer-side selector or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FromSelectors {
    /// A single selector.
    One(FromSelector),
    /// An ordered list of selectors.
    Many(Vec<FromSelector>),
}

impl FromSelectors {
    fn normalized(&self) -> Result<Vec<FromSelectorData>, SelectorError> {
        let normalized: Vec<FromSelectorData> = match self {
            Self::One(selector) => vec![selector.normalize()],
            Self::Many(selectors) => selectors.iter().map(FromSelector::normalize).collect(),
        };
        if normalized.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(normalized)
    }
}

/// One imported-side selector or an ordered list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TargetSelectors {
    /// A single selector.
    One(TargetSelector),
    /// An ordered list of selectors.
    Many(Vec<TargetSelector>),
}

impl TargetSelectors {
    fn normalized(&self) -> Result<Vec<TargetSelectorData>, SelectorError> {
        let normalized: Vec<TargetSelectorData> = match self {
            Self::One(selector) => vec![selector.normalize()],
            Self::Many(selectors) => selectors.iter().map(TargetSelector::normalize).collect(),
        };
        if normalized.is_empty() {
            return Err(SelectorError::Empty);
        }
        Ok(normalized)
    }
}

/// A dependency selector: importer-side and imported-side constraints,
/// each optional and vacuously true when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DependencySelector {
    /// Importer-side selectors.
    pub from: Option<FromSelectors>,
    /// Imported-side selectors.
    pub to: Option<TargetSelectors>,
}

/// A dependency selector reduced to canonical data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedDependencySelector {
    /// Importer-side selector data.
    pub from: Option<Vec<FromSelectorData>>,
    /// Imported-side selector data.
    pub to: Option<Vec<TargetSelectorData>>,
}

impl DependencySelector {
    /// Builds a selector from untyped JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Shape`] when the value has no
    /// recognizable selector shape.
    pub fn from_value(value: &Value) -> Result<Self, SelectorError> {
        if !value.is_object() {
            return Err(SelectorError::Shape {
                detail: "dependency selector must be an object".to_string(),
            });
        }
        serde_json::from_value(value.clone()).map_err(|e| SelectorError::Shape {
            detail: e.to_string(),
        })
    }

    /// Normalizes both sides.
    ///
    /// # Errors
    ///
    /// Returns [`SelectorError::Empty`] when a present side holds an
    /// empty list.
    pub fn normalized(&self) -> Result<NormalizedDependencySelector, SelectorError> {
        Ok(NormalizedDependencySelector {
            from: self.from.as_ref().map(FromSelectors::normalized).transpose()?,
            to: self.to.as_ref().map(TargetSelectors::normalized).transpose()?,
        })
    }
}
