//! Element and dependency description types.
//!
//! All values here are derived data: computed once from a file path (or
//! a path pair plus import metadata), memoized, and never mutated. The
//! enums make the sentinel states structural: an ignored or unknown
//! element cannot carry classification fields.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Where a described element lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// A file inside the analyzed project.
    Local,
    /// A third-party package.
    External,
    /// A platform builtin module.
    Core,
}

impl Origin {
    /// The lowercase name used in selectors and templates.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::External => "external",
            Self::Core => "core",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structural position of a dependency's element relative to the
/// importer's element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relationship {
    /// Same element on both sides.
    Internal,
    /// The imported element is a direct child of the importer.
    Child,
    /// The imported element is below the importer, more than one level.
    Descendant,
    /// Both elements share the same direct parent.
    #[serde(alias = "brother")]
    Sibling,
    /// The imported element is the importer's direct parent.
    Parent,
    /// The imported element's direct parent is a shared ancestor.
    Uncle,
    /// Inverse of [`Relationship::Uncle`].
    Nephew,
    /// The imported element is above the importer, more than one level.
    Ancestor,
}

impl Relationship {
    /// The structural inverse: how the importer looks from the imported
    /// element's side.
    #[must_use]
    pub fn inverse(self) -> Self {
        match self {
            Self::Internal => Self::Internal,
            Self::Child => Self::Parent,
            Self::Parent => Self::Child,
            Self::Descendant => Self::Ancestor,
            Self::Ancestor => Self::Descendant,
            Self::Sibling => Self::Sibling,
            Self::Uncle => Self::Nephew,
            Self::Nephew => Self::Uncle,
        }
    }

    /// The lowercase name used in selectors and templates.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Internal => "internal",
            Self::Child => "child",
            Self::Descendant => "descendant",
            Self::Sibling => "sibling",
            Self::Parent => "parent",
            Self::Uncle => "uncle",
            Self::Nephew => "nephew",
            Self::Ancestor => "ancestor",
        }
    }

    /// Parses a relationship name, accepting the deprecated `brother`
    /// alias for `sibling`.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "internal" => Some(Self::Internal),
            "child" => Some(Self::Child),
            "descendant" => Some(Self::Descendant),
            "sibling" | "brother" => Some(Self::Sibling),
            "parent" => Some(Self::Parent),
            "uncle" => Some(Self::Uncle),
            "nephew" => Some(Self::Nephew),
            "ancestor" => Some(Self::Ancestor),
            _ => None,
        }
    }
}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ancestor element discovered on the walk toward the path root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementParent {
    /// Element type assigned by the matching descriptor.
    #[serde(rename = "type")]
    pub element_type: Option<String>,
    /// Element category assigned by the matching descriptor.
    pub category: Option<String>,
    /// Path prefix identifying the ancestor element's root.
    pub element_path: String,
    /// Values captured from the ancestor descriptor's pattern.
    pub captured: BTreeMap<String, String>,
}

/// Classification attached to a known local element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementClass {
    /// Element type assigned by the matching descriptor.
    #[serde(rename = "type")]
    pub element_type: Option<String>,
    /// Element category assigned by the matching descriptor.
    pub category: Option<String>,
    /// Path prefix identifying the element's root.
    pub element_path: String,
    /// Path of the file relative to the element root.
    pub internal_path: String,
    /// Values captured from the descriptor's pattern (and base pattern).
    pub captured: BTreeMap<String, String>,
    /// Ancestor elements, nearest first.
    pub parents: Vec<ElementParent>,
}

/// A project file resolved against the configured element descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FileElement {
    /// Path excluded by the include/ignore configuration.
    Ignored {
        /// The excluded path.
        path: String,
    },
    /// Local file that matched no descriptor (or no path was supplied).
    Unknown {
        /// The unmatched path, when one was supplied.
        path: Option<String>,
    },
    /// Local file classified by a descriptor.
    Known {
        /// The resolved path.
        path: String,
        /// The classification.
        class: ElementClass,
    },
}

impl FileElement {
    /// The canonical sentinel for a missing path.
    #[must_use]
    pub fn unknown() -> Self {
        Self::Unknown { path: None }
    }
}

/// The target of an import, resolved and completed with its specifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencyElement {
    /// Import of a file inside the analyzed project.
    Local {
        /// Raw import specifier.
        source: Option<String>,
        /// The resolved file element (known or unknown).
        file: FileElement,
    },
    /// Import of a third-party package.
    External {
        /// Resolved path, when the package was resolvable on disk.
        path: Option<String>,
        /// Raw import specifier.
        source: Option<String>,
        /// Package root (`pkg` or `@scope/pkg`).
        base_source: String,
        /// Import subpath below the package root.
        internal_path: Option<String>,
    },
    /// Import of a platform builtin module.
    Core {
        /// Raw import specifier.
        source: Option<String>,
        /// The builtin module name, scheme stripped.
        base_source: String,
        /// Import subpath below the module name.
        internal_path: Option<String>,
    },
    /// Import whose resolved file is excluded by configuration.
    Ignored {
        /// The excluded path.
        path: Option<String>,
        /// Raw import specifier.
        source: Option<String>,
    },
}

/// Uniform read access to a described element, local or otherwise.
///
/// This is the seam between the describing side and the matching side:
/// selector predicates only ever see an element through this trait.
pub trait ElementFacts {
    /// Where the element lives.
    fn origin(&self) -> Origin;

    /// Whether the element was excluded by configuration.
    fn is_ignored(&self) -> bool;

    /// Whether the element is local but matched no descriptor.
    fn is_unknown(&self) -> bool;

    /// The resolved file path, when there is one.
    fn path(&self) -> Option<&str>;

    /// The raw import specifier, for dependency elements.
    fn source(&self) -> Option<&str> {
        None
    }

    /// The package or builtin root, for external and core elements.
    fn base_source(&self) -> Option<&str> {
        None
    }

    /// The classification, for known local elements.
    fn class(&self) -> Option<&ElementClass>;

    /// The path relative to the element or package root.
    fn internal_path(&self) -> Option<&str> {
        self.class().map(|c| c.internal_path.as_str())
    }

    /// Element type, when classified.
    fn element_type(&self) -> Option<&str> {
        self.class().and_then(|c| c.element_type.as_deref())
    }

    /// Element category, when classified.
    fn category(&self) -> Option<&str> {
        self.class().and_then(|c| c.category.as_deref())
    }

    /// Element root path, when classified.
    fn element_path(&self) -> Option<&str> {
        self.class().map(|c| c.element_path.as_str())
    }

    /// Captured pattern values, when classified.
    fn captured(&self) -> Option<&BTreeMap<String, String>> {
        self.class().map(|c| &c.captured)
    }

    /// The JSON view of this element used both as template context and
    /// as its cache identity.
    fn template_value(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), opt_str(self.element_type()));
        map.insert("category".into(), opt_str(self.category()));
        map.insert("path".into(), opt_str(self.path()));
        map.insert("elementPath".into(), opt_str(self.element_path()));
        map.insert("internalPath".into(), opt_str(self.internal_path()));
        map.insert("origin".into(), Value::String(self.origin().to_string()));
        map.insert("source".into(), opt_str(self.source()));
        map.insert("baseSource".into(), opt_str(self.base_source()));
        map.insert("isIgnored".into(), Value::Bool(self.is_ignored()));
        map.insert("isUnknown".into(), Value::Bool(self.is_unknown()));
        let captured = self.captured().map_or_else(Map::new, |captured| {
            captured
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect()
        });
        map.insert("captured".into(), Value::Object(captured));
        Value::Object(map)
    }
}

fn opt_str(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_string()))
}

impl ElementFacts for FileElement {
    fn origin(&self) -> Origin {
        Origin::Local
    }

    fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored { .. })
    }

    fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    fn path(&self) -> Option<&str> {
        match self {
            Self::Ignored { path } | Self::Known { path, .. } => Some(path),
            Self::Unknown { path } => path.as_deref(),
        }
    }

    fn class(&self) -> Option<&ElementClass> {
        match self {
            Self::Known { class, .. } => Some(class),
            Self::Ignored { .. } | Self::Unknown { .. } => None,
        }
    }
}

impl ElementFacts for DependencyElement {
    fn origin(&self) -> Origin {
        match self {
            Self::Local { .. } | Self::Ignored { .. } => Origin::Local,
            Self::External { .. } => Origin::External,
            Self::Core { .. } => Origin::Core,
        }
    }

    fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored { .. })
    }

    fn is_unknown(&self) -> bool {
        matches!(self, Self::Local { file, .. } if file.is_unknown())
    }

    fn path(&self) -> Option<&str> {
        match self {
            Self::Local { file, .. } => file.path(),
            Self::External { path, .. } | Self::Ignored { path, .. } => path.as_deref(),
            Self::Core { .. } => None,
        }
    }

    fn source(&self) -> Option<&str> {
        match self {
            Self::Local { source, .. }
            | Self::External { source, .. }
            | Self::Core { source, .. }
            | Self::Ignored { source, .. } => source.as_deref(),
        }
    }

    fn base_source(&self) -> Option<&str> {
        match self {
            Self::External { base_source, .. } | Self::Core { base_source, .. } => {
                Some(base_source)
            }
            Self::Local { .. } | Self::Ignored { .. } => None,
        }
    }

    fn class(&self) -> Option<&ElementClass> {
        match self {
            Self::Local { file, .. } => file.class(),
            _ => None,
        }
    }

    fn internal_path(&self) -> Option<&str> {
        match self {
            Self::Local { file, .. } => file.class().map(|c| c.internal_path.as_str()),
            Self::External { internal_path, .. } | Self::Core { internal_path, .. } => {
                internal_path.as_deref()
            }
            Self::Ignored { .. } => None,
        }
    }
}

/// The bidirectional relationship carried by a dependency description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelationshipPair {
    /// Relationship seen from the importing file's element.
    pub from: Option<Relationship>,
    /// The structural inverse, seen from the imported element.
    pub to: Option<Relationship>,
}

/// Import metadata plus the inferred relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    /// Dependency kind (e.g. `value`, `type`).
    pub kind: String,
    /// Syntax-level kind of the statement, when the host provides one.
    pub node_kind: Option<String>,
    /// Imported specifier names, when the host provides them.
    pub specifiers: Option<Vec<String>>,
    /// The inferred bidirectional relationship.
    pub relationship: RelationshipPair,
}

/// A fully described dependency: both resolved elements plus metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyDescription {
    /// The importing file's element.
    pub from: FileElement,
    /// The imported element.
    pub to: DependencyElement,
    /// Import metadata and relationship.
    pub dependency: DependencyInfo,
}

/// Inputs identifying one dependency to describe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyRequest {
    /// Path of the importing file.
    pub from: Option<String>,
    /// Resolved path of the imported file, when resolvable.
    pub to: Option<String>,
    /// Raw import specifier.
    pub source: Option<String>,
    /// Dependency kind (e.g. `value`, `type`).
    pub kind: String,
    /// Syntax-level kind of the statement.
    pub node_kind: Option<String>,
    /// Imported specifier names.
    pub specifiers: Vec<String>,
}
