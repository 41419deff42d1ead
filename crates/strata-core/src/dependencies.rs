//! Description of import dependencies between two files.
//!
//! Composes two element resolutions with relationship inference into a
//! single memoized [`DependencyDescription`].

use std::sync::Arc;

use tracing::trace;

use crate::cache::{Cache, CacheKey, CacheSnapshot};
use crate::elements::ElementsDescriptor;
use crate::relationship::relationship_between;
use crate::types::{
    DependencyDescription, DependencyInfo, DependencyRequest, ElementFacts, RelationshipPair,
};

/// Resolves dependency requests into full descriptions.
pub struct DependenciesDescriptor {
    elements: Arc<ElementsDescriptor>,
    cache: Cache<DependencyDescription>,
}

impl DependenciesDescriptor {
    /// Creates a dependency resolver sharing an element resolver.
    #[must_use]
    pub fn new(elements: Arc<ElementsDescriptor>, cache_enabled: bool) -> Self {
        Self {
            elements,
            cache: Cache::new(cache_enabled),
        }
    }

    /// Describes one dependency. Memoized by the full request.
    #[must_use]
    pub fn describe_dependency(&self, request: &DependencyRequest) -> DependencyDescription {
        let key = CacheKey::of(request);
        if let Some(hit) = self.cache.get(&key) {
            trace!("dependency cache hit for {:?}", request.source);
            return hit;
        }

        let from = self.elements.describe_element(request.from.as_deref());
        let to = self
            .elements
            .describe_dependency_element(request.source.as_deref(), request.to.as_deref());

        // Relationships only exist between two known local elements of a
        // non-ignored dependency.
        let relationship_from = match (from.class(), to.class()) {
            (Some(importer), Some(imported)) if !to.is_ignored() => {
                relationship_between(importer, imported)
            }
            _ => None,
        };
        let relationship = RelationshipPair {
            from: relationship_from,
            to: relationship_from.map(crate::types::Relationship::inverse),
        };

        let description = DependencyDescription {
            from,
            to,
            dependency: DependencyInfo {
                kind: request.kind.clone(),
                node_kind: request.node_kind.clone(),
                specifiers: (!request.specifiers.is_empty()).then(|| request.specifiers.clone()),
                relationship,
            },
        };
        self.cache.set(&key, description.clone());
        description
    }

    /// Serializes the dependency cache.
    #[must_use]
    pub fn serialize_cache(&self) -> CacheSnapshot<DependencyDescription> {
        self.cache.snapshot()
    }

    /// Loads the dependency cache from a snapshot, additively.
    pub fn set_cache_from_serialized(&self, snapshot: CacheSnapshot<DependencyDescription>) {
        self.cache.load_snapshot(snapshot);
    }

    /// Wipes the dependency cache.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ElementDescriptor, Settings};
    use crate::pattern::PatternMatcher;
    use crate::types::Relationship;

    fn dependencies() -> DependenciesDescriptor {
        let settings = Arc::new(Settings::new(vec![ElementDescriptor::new(
            Some("module"),
            None,
            vec!["modules/*".to_string()],
        )
        .unwrap()]));
        let elements = Arc::new(ElementsDescriptor::new(
            settings,
            Arc::new(PatternMatcher::new()),
        ));
        DependenciesDescriptor::new(elements, true)
    }

    fn request(from: &str, to: &str, source: &str) -> DependencyRequest {
        DependencyRequest {
            from: Some(from.to_string()),
            to: Some(to.to_string()),
            source: Some(source.to_string()),
            kind: "value".to_string(),
            node_kind: Some("import".to_string()),
            specifiers: vec!["thing".to_string()],
        }
    }

    #[test]
    fn sibling_dependency_is_symmetric() {
        let descriptor = dependencies();
        let described = descriptor.describe_dependency(&request(
            "src/modules/root/modules/mod-a/index.js",
            "src/modules/root/modules/mod-b/index.js",
            "../mod-b",
        ));

        assert_eq!(
            described.dependency.relationship.from,
            Some(Relationship::Sibling)
        );
        assert_eq!(
            described.dependency.relationship.to,
            Some(Relationship::Sibling)
        );
        assert_eq!(described.dependency.kind, "value");
        assert_eq!(
            described.dependency.specifiers,
            Some(vec!["thing".to_string()])
        );
    }

    #[test]
    fn child_and_parent_are_inverses() {
        let descriptor = dependencies();
        let forward = descriptor.describe_dependency(&request(
            "src/modules/mod-a/index.js",
            "src/modules/mod-a/modules/sub/index.js",
            "./modules/sub",
        ));
        assert_eq!(
            forward.dependency.relationship.from,
            Some(Relationship::Child)
        );
        assert_eq!(
            forward.dependency.relationship.to,
            Some(Relationship::Parent)
        );

        let backward = descriptor.describe_dependency(&request(
            "src/modules/mod-a/modules/sub/index.js",
            "src/modules/mod-a/index.js",
            "../..",
        ));
        assert_eq!(
            backward.dependency.relationship.from,
            Some(Relationship::Parent)
        );
        assert_eq!(
            backward.dependency.relationship.to,
            Some(Relationship::Child)
        );
    }

    #[test]
    fn internal_dependency() {
        let descriptor = dependencies();
        let described = descriptor.describe_dependency(&request(
            "src/modules/mod-a/index.js",
            "src/modules/mod-a/util.js",
            "./util",
        ));
        assert_eq!(
            described.dependency.relationship.from,
            Some(Relationship::Internal)
        );
    }

    #[test]
    fn external_dependency_has_no_relationship() {
        let descriptor = dependencies();
        let described = descriptor.describe_dependency(&DependencyRequest {
            from: Some("src/modules/mod-a/index.js".to_string()),
            to: None,
            source: Some("react".to_string()),
            kind: "value".to_string(),
            node_kind: None,
            specifiers: vec![],
        });
        assert_eq!(described.dependency.relationship.from, None);
        assert_eq!(described.dependency.relationship.to, None);
        assert_eq!(described.dependency.specifiers, None);
    }

    #[test]
    fn unknown_importer_has_no_relationship() {
        let descriptor = dependencies();
        let described = descriptor.describe_dependency(&request(
            "src/scripts/build.js",
            "src/modules/mod-a/index.js",
            "../modules/mod-a",
        ));
        assert!(described.from.is_unknown());
        assert_eq!(described.dependency.relationship.from, None);
    }

    #[test]
    fn absent_to_path_keeps_key_distinct_from_literal() {
        let descriptor = dependencies();
        let with_none = descriptor.describe_dependency(&DependencyRequest {
            from: Some("src/modules/mod-a/index.js".to_string()),
            to: None,
            source: Some("react".to_string()),
            kind: "value".to_string(),
            node_kind: None,
            specifiers: vec![],
        });
        let with_literal = descriptor.describe_dependency(&DependencyRequest {
            from: Some("src/modules/mod-a/index.js".to_string()),
            to: Some("undefined".to_string()),
            source: Some("react".to_string()),
            kind: "value".to_string(),
            node_kind: None,
            specifiers: vec![],
        });
        // Both describable, and the literal path resolves differently.
        assert_ne!(with_none, with_literal);
    }

    #[test]
    fn descriptions_are_memoized() {
        let descriptor = dependencies();
        let req = request(
            "src/modules/root/modules/mod-a/index.js",
            "src/modules/root/modules/mod-b/index.js",
            "../mod-b",
        );
        let first = descriptor.describe_dependency(&req);
        let second = descriptor.describe_dependency(&req);
        assert_eq!(first, second);
        assert_eq!(descriptor.serialize_cache().len(), 1);
    }
}
