//! Structural relationship inference between two described elements.
//!
//! Operates purely on element roots and parent chains. The decision
//! ladder below is order-sensitive: descendant must be tested before
//! sibling (a grandchild's parent chain would otherwise fake a shared
//! parent), and the overall first-match-wins ordering is part of the
//! engine's observable behavior.

use crate::types::{ElementClass, Relationship};

/// The nearest ancestor's element path, when the chain is non-empty.
fn parent_path(class: &ElementClass) -> Option<&str> {
    class.parents.first().map(|p| p.element_path.as_str())
}

/// First entry in `a`'s parent chain whose element path also appears
/// anywhere in `b`'s chain. Ties break toward `a`'s nearest ancestor.
fn common_ancestor<'a>(a: &'a ElementClass, b: &ElementClass) -> Option<&'a str> {
    a.parents
        .iter()
        .map(|p| p.element_path.as_str())
        .find(|path| b.parents.iter().any(|q| q.element_path == *path))
}

/// Infers how `dependency` relates to `element` (the importer), from
/// the importer's perspective.
///
/// Returns `None` when the pair fits no known structural position.
// TODO: a multi-level ancestor whose parent chain overlaps the
// importer's can satisfy the uncle test first and be reported as uncle;
// reordering the uncle/ancestor checks changes pinned behavior, so keep
// them as they are until a breaking release.
#[must_use]
pub fn relationship_between(
    element: &ElementClass,
    dependency: &ElementClass,
) -> Option<Relationship> {
    if dependency.element_path == element.element_path {
        return Some(Relationship::Internal);
    }
    if parent_path(dependency) == Some(element.element_path.as_str()) {
        return Some(Relationship::Child);
    }
    if dependency
        .parents
        .iter()
        .any(|p| p.element_path == element.element_path)
    {
        return Some(Relationship::Descendant);
    }
    match (parent_path(dependency), parent_path(element)) {
        (Some(a), Some(b)) if a == b => return Some(Relationship::Sibling),
        _ => {}
    }
    if parent_path(element) == Some(dependency.element_path.as_str()) {
        return Some(Relationship::Parent);
    }
    if let (Some(shared), Some(dependency_parent)) =
        (common_ancestor(dependency, element), parent_path(dependency))
    {
        if shared == dependency_parent {
            return Some(Relationship::Uncle);
        }
    }
    if element
        .parents
        .iter()
        .any(|p| p.element_path == dependency.element_path)
    {
        return Some(Relationship::Ancestor);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    use crate::types::ElementParent;

    fn class(element_path: &str, parents: &[&str]) -> ElementClass {
        ElementClass {
            element_type: Some("module".to_string()),
            category: None,
            element_path: element_path.to_string(),
            internal_path: "index.js".to_string(),
            captured: BTreeMap::new(),
            parents: parents
                .iter()
                .map(|p| ElementParent {
                    element_type: Some("module".to_string()),
                    category: None,
                    element_path: (*p).to_string(),
                    captured: BTreeMap::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn same_element_is_internal() {
        let a = class("src/mod-a", &[]);
        let b = class("src/mod-a", &[]);
        assert_eq!(relationship_between(&a, &b), Some(Relationship::Internal));
    }

    #[test]
    fn direct_child() {
        let importer = class("src/mod-a", &[]);
        let imported = class("src/mod-a/sub", &["src/mod-a"]);
        assert_eq!(
            relationship_between(&importer, &imported),
            Some(Relationship::Child)
        );
    }

    #[test]
    fn deep_descendant_not_sibling() {
        // Importer is the grandparent; the shared-parent test must not
        // run first.
        let importer = class("src/mod-a", &["src/root"]);
        let imported = class("src/mod-a/mid/leaf", &["src/mod-a/mid", "src/mod-a"]);
        assert_eq!(
            relationship_between(&importer, &imported),
            Some(Relationship::Descendant)
        );
    }

    #[test]
    fn siblings_share_direct_parent() {
        let importer = class("src/parent/a", &["src/parent"]);
        let imported = class("src/parent/b", &["src/parent"]);
        assert_eq!(
            relationship_between(&importer, &imported),
            Some(Relationship::Sibling)
        );
    }

    #[test]
    fn direct_parent() {
        let importer = class("src/mod-a/sub", &["src/mod-a"]);
        let imported = class("src/mod-a", &[]);
        assert_eq!(
            relationship_between(&importer, &imported),
            Some(Relationship::Parent)
        );
    }

    #[test]
    fn uncle_is_parents_sibling() {
        let importer = class(
            "src/root/branch-a/leaf",
            &["src/root/branch-a", "src/root"],
        );
        let imported = class("src/root/branch-b", &["src/root"]);
        assert_eq!(
            relationship_between(&importer, &imported),
            Some(Relationship::Uncle)
        );
    }

    #[test]
    fn grandparent_is_ancestor() {
        let importer = class(
            "src/root/branch-a/leaf",
            &["src/root/branch-a", "src/root"],
        );
        let imported = class("src/root", &[]);
        assert_eq!(
            relationship_between(&importer, &imported),
            Some(Relationship::Ancestor)
        );
    }

    #[test]
    fn ancestor_with_shared_chain_reports_uncle() {
        // Pins the precedence of the uncle test over the ancestor test:
        // a grandparent that itself has a parent present in the
        // importer's chain satisfies the uncle condition first.
        let importer = class(
            "src/top/mid/leaf",
            &["src/top/mid", "src/top", "src/root"],
        );
        let imported = class("src/top", &["src/root"]);
        assert_eq!(
            relationship_between(&importer, &imported),
            Some(Relationship::Uncle)
        );
    }

    #[test]
    fn unrelated_elements_have_no_relationship() {
        let importer = class("src/a", &[]);
        let imported = class("lib/b", &[]);
        assert_eq!(relationship_between(&importer, &imported), None);
    }
}
