//! Engine configuration: element descriptors and matching options.
//!
//! Configuration is supplied once, validated eagerly, and immutable for
//! the engine's lifetime. A malformed descriptor aborts construction;
//! there is no partial or best-effort setup.

use serde::Deserialize;

use crate::pattern::{self, PatternError};

/// How a descriptor's pattern is applied during the path walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Pattern names an element folder; files anywhere below belong to
    /// the element.
    #[default]
    Folder,
    /// Pattern names element files directly.
    File,
    /// Pattern is matched against the entire file path.
    Full,
}

/// Configuration errors. All fatal: construction either fully succeeds
/// or fails.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A descriptor declares no pattern.
    #[error("{context}: element descriptor requires at least one pattern")]
    MissingPattern {
        /// Which descriptor.
        context: String,
    },

    /// A descriptor declares neither `type` nor `category`.
    #[error("{context}: element descriptor requires `type` or `category`")]
    MissingClassification {
        /// Which descriptor.
        context: String,
    },

    /// A pattern fails to compile.
    #[error("{context}: {source}")]
    Pattern {
        /// Which descriptor or option.
        context: String,
        /// The underlying pattern error.
        source: PatternError,
    },

    /// The TOML document fails to parse.
    #[error("invalid settings: {message}")]
    Parse {
        /// Parse error detail.
        message: String,
    },
}

/// One ordered rule mapping path patterns to an element type/category.
///
/// Descriptors are tried in declaration order; the first match on a walk
/// becomes the main element, later matches become parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementDescriptor {
    element_type: Option<String>,
    category: Option<String>,
    patterns: Vec<String>,
    base_pattern: Option<String>,
    mode: MatchMode,
    capture: Vec<String>,
    base_capture: Vec<String>,
}

impl ElementDescriptor {
    /// Creates a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if no pattern is supplied, a pattern does
    /// not compile, or both `element_type` and `category` are absent.
    pub fn new(
        element_type: Option<&str>,
        category: Option<&str>,
        patterns: Vec<String>,
    ) -> Result<Self, ConfigError> {
        let context = element_type
            .or(category)
            .map_or_else(|| "element descriptor".to_string(), str::to_string);

        if element_type.is_none() && category.is_none() {
            return Err(ConfigError::MissingClassification { context });
        }
        if patterns.is_empty() || patterns.iter().any(String::is_empty) {
            return Err(ConfigError::MissingPattern { context });
        }
        for p in &patterns {
            pattern::validate(p).map_err(|source| ConfigError::Pattern {
                context: context.clone(),
                source,
            })?;
        }

        Ok(Self {
            element_type: element_type.map(str::to_string),
            category: category.map(str::to_string),
            patterns,
            base_pattern: None,
            mode: MatchMode::default(),
            capture: Vec::new(),
            base_capture: Vec::new(),
        })
    }

    /// Sets the match mode (default: [`MatchMode::Folder`]).
    #[must_use]
    pub fn with_mode(mut self, mode: MatchMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets capture names zipped against the pattern's wildcards.
    #[must_use]
    pub fn with_capture(mut self, names: Vec<String>) -> Self {
        self.capture = names;
        self
    }

    /// Sets a base pattern matched against the path left of the element,
    /// for multi-root monorepo layouts.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the base pattern does not compile.
    pub fn with_base_pattern(
        mut self,
        base_pattern: &str,
        base_capture: Vec<String>,
    ) -> Result<Self, ConfigError> {
        pattern::validate(base_pattern).map_err(|source| ConfigError::Pattern {
            context: self
                .element_type
                .as_deref()
                .or(self.category.as_deref())
                .unwrap_or("element descriptor")
                .to_string(),
            source,
        })?;
        self.base_pattern = Some(base_pattern.to_string());
        self.base_capture = base_capture;
        Ok(self)
    }

    /// Element type assigned on match.
    #[must_use]
    pub fn element_type(&self) -> Option<&str> {
        self.element_type.as_deref()
    }

    /// Element category assigned on match.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Patterns, any of which may match.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// The base pattern, if any.
    #[must_use]
    pub fn base_pattern(&self) -> Option<&str> {
        self.base_pattern.as_deref()
    }

    /// The match mode.
    #[must_use]
    pub fn mode(&self) -> MatchMode {
        self.mode
    }

    /// Capture names for the main pattern.
    #[must_use]
    pub fn capture_names(&self) -> &[String] {
        &self.capture
    }

    /// Capture names for the base pattern.
    #[must_use]
    pub fn base_capture_names(&self) -> &[String] {
        &self.base_capture
    }
}

/// Validated engine settings: ordered descriptors plus matching options.
#[derive(Debug, Clone)]
pub struct Settings {
    descriptors: Vec<ElementDescriptor>,
    include_paths: Vec<String>,
    ignore_paths: Vec<String>,
    include_external: bool,
    legacy_templates: bool,
    cache: bool,
}

impl Settings {
    /// Creates settings from already-validated descriptors, with
    /// defaults for every option.
    #[must_use]
    pub fn new(descriptors: Vec<ElementDescriptor>) -> Self {
        Self {
            descriptors,
            include_paths: Vec::new(),
            ignore_paths: Vec::new(),
            include_external: false,
            legacy_templates: true,
            cache: true,
        }
    }

    /// Restricts description to paths matching these globs.
    #[must_use]
    pub fn with_include_paths(mut self, paths: Vec<String>) -> Self {
        self.include_paths = paths;
        self
    }

    /// Excludes paths matching these globs. Ignores win over includes.
    #[must_use]
    pub fn with_ignore_paths(mut self, paths: Vec<String>) -> Self {
        self.ignore_paths = paths;
        self
    }

    /// Also admits paths under `node_modules` when include paths are
    /// set.
    #[must_use]
    pub fn with_include_external(mut self, include_external: bool) -> Self {
        self.include_external = include_external;
        self
    }

    /// Enables or disables the legacy `${x}` template syntax
    /// (default: enabled).
    #[must_use]
    pub fn with_legacy_templates(mut self, legacy_templates: bool) -> Self {
        self.legacy_templates = legacy_templates;
        self
    }

    /// Enables or disables memoization (default: enabled). Disabling
    /// only affects performance, never results.
    #[must_use]
    pub fn with_cache(mut self, cache: bool) -> Self {
        self.cache = cache;
        self
    }

    /// Loads settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document does not parse or any
    /// descriptor is malformed.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let dto: SettingsDto = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;

        let mut descriptors = Vec::with_capacity(dto.elements.len());
        for element in dto.elements {
            let mut descriptor = ElementDescriptor::new(
                element.element_type.as_deref(),
                element.category.as_deref(),
                element.pattern.into_vec(),
            )?
            .with_mode(element.mode)
            .with_capture(element.capture);
            if let Some(base) = element.base_pattern {
                descriptor = descriptor.with_base_pattern(&base, element.base_capture)?;
            }
            descriptors.push(descriptor);
        }

        Ok(Self::new(descriptors)
            .with_include_paths(dto.settings.include)
            .with_ignore_paths(dto.settings.ignore)
            .with_include_external(dto.settings.include_external)
            .with_legacy_templates(dto.settings.legacy_templates)
            .with_cache(dto.settings.cache))
    }

    /// The ordered element descriptors.
    #[must_use]
    pub fn descriptors(&self) -> &[ElementDescriptor] {
        &self.descriptors
    }

    /// Include globs (empty means everything local).
    #[must_use]
    pub fn include_paths(&self) -> &[String] {
        &self.include_paths
    }

    /// Ignore globs.
    #[must_use]
    pub fn ignore_paths(&self) -> &[String] {
        &self.ignore_paths
    }

    /// Whether `node_modules` paths bypass the include filter.
    #[must_use]
    pub fn include_external(&self) -> bool {
        self.include_external
    }

    /// Whether `${x}` template syntax is accepted.
    #[must_use]
    pub fn legacy_templates(&self) -> bool {
        self.legacy_templates
    }

    /// Whether memoization is enabled.
    #[must_use]
    pub fn cache_enabled(&self) -> bool {
        self.cache
    }
}

// ── TOML DTO layer ──

/// A pattern field accepting one glob or a list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl Default for OneOrMany {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct SettingsDto {
    settings: OptionsDto,
    elements: Vec<ElementDto>,
}

#[derive(Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct OptionsDto {
    include: Vec<String>,
    ignore: Vec<String>,
    include_external: bool,
    legacy_templates: bool,
    cache: bool,
}

impl Default for OptionsDto {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            ignore: Vec::new(),
            include_external: false,
            legacy_templates: true,
            cache: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
struct ElementDto {
    #[serde(rename = "type")]
    element_type: Option<String>,
    category: Option<String>,
    pattern: OneOrMany,
    base_pattern: Option<String>,
    mode: MatchMode,
    capture: Vec<String>,
    base_capture: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_requires_type_or_category() {
        let result = ElementDescriptor::new(None, None, vec!["src/*".to_string()]);
        assert!(matches!(
            result,
            Err(ConfigError::MissingClassification { .. })
        ));
    }

    #[test]
    fn descriptor_requires_pattern() {
        let result = ElementDescriptor::new(Some("component"), None, vec![]);
        assert!(matches!(result, Err(ConfigError::MissingPattern { .. })));

        let result = ElementDescriptor::new(Some("component"), None, vec![String::new()]);
        assert!(matches!(result, Err(ConfigError::MissingPattern { .. })));
    }

    #[test]
    fn descriptor_rejects_bad_pattern() {
        let result = ElementDescriptor::new(Some("component"), None, vec!["src/[".to_string()]);
        assert!(matches!(result, Err(ConfigError::Pattern { .. })));
    }

    #[test]
    fn descriptor_accepts_category_only() {
        let descriptor =
            ElementDescriptor::new(None, Some("ui"), vec!["src/ui/*".to_string()]).unwrap();
        assert_eq!(descriptor.category(), Some("ui"));
        assert!(descriptor.element_type().is_none());
        assert_eq!(descriptor.mode(), MatchMode::Folder);
    }

    #[test]
    fn settings_defaults() {
        let settings = Settings::new(vec![]);
        assert!(settings.legacy_templates());
        assert!(settings.cache_enabled());
        assert!(!settings.include_external());
        assert!(settings.include_paths().is_empty());
    }

    #[test]
    fn from_toml_full_document() {
        let settings = Settings::from_toml(
            r#"
[settings]
include = ["src/**"]
ignore = ["**/*.test.js"]
legacy-templates = false

[[elements]]
type = "component"
pattern = "src/components/*"
capture = ["name"]

[[elements]]
type = "module"
pattern = ["src/modules/*", "src/legacy-modules/*"]
mode = "folder"
"#,
        )
        .unwrap();

        assert_eq!(settings.descriptors().len(), 2);
        assert_eq!(settings.descriptors()[0].element_type(), Some("component"));
        assert_eq!(settings.descriptors()[1].patterns().len(), 2);
        assert_eq!(settings.include_paths(), ["src/**".to_string()]);
        assert!(!settings.legacy_templates());
        assert!(settings.cache_enabled());
    }

    #[test]
    fn from_toml_file_mode_and_base_pattern() {
        let settings = Settings::from_toml(
            r#"
[[elements]]
type = "helper"
pattern = "helpers/*.js"
mode = "file"
base-pattern = "packages/*"
base-capture = ["package"]
"#,
        )
        .unwrap();

        let descriptor = &settings.descriptors()[0];
        assert_eq!(descriptor.mode(), MatchMode::File);
        assert_eq!(descriptor.base_pattern(), Some("packages/*"));
        assert_eq!(descriptor.base_capture_names(), ["package".to_string()]);
    }

    #[test]
    fn from_toml_rejects_descriptor_without_classification() {
        let result = Settings::from_toml(
            r#"
[[elements]]
pattern = "src/*"
"#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::MissingClassification { .. })
        ));
    }

    #[test]
    fn from_toml_rejects_invalid_document() {
        assert!(matches!(
            Settings::from_toml("not [valid"),
            Err(ConfigError::Parse { .. })
        ));
    }
}
