//! Resolution of file paths into described elements.
//!
//! A path is classified by walking its segments leaf-to-root while
//! accumulating an unmatched tail. The first descriptor to match the
//! tail names the main element; further matches on the remaining
//! segments become the element's parents, nearest first. Import
//! specifiers are then completed into local, external or core
//! dependency elements.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::cache::{Cache, CacheKey, CacheSnapshot};
use crate::config::{ElementDescriptor, MatchMode, Settings};
use crate::pattern::PatternMatcher;
use crate::types::{
    DependencyElement, ElementClass, ElementFacts, ElementParent, FileElement,
};

/// Builtin module roots recognized as `origin = core`.
const CORE_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "domain",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "repl",
    "stream",
    "string_decoder",
    "sys",
    "timers",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Serialized caches of an [`ElementsDescriptor`].
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementsCacheSnapshot {
    /// Resolved file elements keyed by path.
    pub files: CacheSnapshot<FileElement>,
    /// Completed dependency elements keyed by source and path.
    pub elements: CacheSnapshot<DependencyElement>,
}

/// One successful descriptor probe during the walk.
struct DescriptorMatch {
    pattern: String,
    base_captured: BTreeMap<String, String>,
}

/// Resolves file paths (and import specifiers) into described elements.
pub struct ElementsDescriptor {
    settings: Arc<Settings>,
    patterns: Arc<PatternMatcher>,
    files: Cache<FileElement>,
    elements: Cache<DependencyElement>,
}

impl ElementsDescriptor {
    /// Creates a descriptor resolver over shared settings and pattern
    /// registry.
    #[must_use]
    pub fn new(settings: Arc<Settings>, patterns: Arc<PatternMatcher>) -> Self {
        let enabled = settings.cache_enabled();
        Self {
            settings,
            patterns,
            files: Cache::new(enabled),
            elements: Cache::new(enabled),
        }
    }

    /// Describes a project file. Memoized by path.
    #[must_use]
    pub fn describe_element(&self, file_path: Option<&str>) -> FileElement {
        let Some(path) = file_path.filter(|p| !p.is_empty()) else {
            return FileElement::unknown();
        };

        let key = CacheKey::of(&path);
        if let Some(hit) = self.files.get(&key) {
            trace!("element cache hit for {path}");
            return hit;
        }

        let element = self.classify(path);
        self.files.set(&key, element.clone());
        element
    }

    /// Describes the target of an import: the resolved file (when any)
    /// completed with its specifier. Memoized by `(source, path)`.
    #[must_use]
    pub fn describe_dependency_element(
        &self,
        source: Option<&str>,
        file_path: Option<&str>,
    ) -> DependencyElement {
        let key = CacheKey::of(&(source, file_path));
        if let Some(hit) = self.elements.get(&key) {
            return hit;
        }

        let file = self.describe_element(file_path);
        let described = self.complete_dependency(source, file);
        self.elements.set(&key, described.clone());
        described
    }

    /// Serializes both caches.
    #[must_use]
    pub fn serialize_cache(&self) -> ElementsCacheSnapshot {
        ElementsCacheSnapshot {
            files: self.files.snapshot(),
            elements: self.elements.snapshot(),
        }
    }

    /// Loads both caches from a snapshot, additively.
    pub fn set_cache_from_serialized(&self, snapshot: ElementsCacheSnapshot) {
        self.files.load_snapshot(snapshot.files);
        self.elements.load_snapshot(snapshot.elements);
    }

    /// Wipes both caches. Results are unaffected, only performance.
    pub fn clear_cache(&self) {
        self.files.clear();
        self.elements.clear();
    }

    // ── include/ignore filter ──

    fn is_included(&self, path: &str) -> bool {
        if self
            .patterns
            .is_match(path, self.settings.ignore_paths())
        {
            return false;
        }
        if self.settings.include_paths().is_empty() {
            return true;
        }
        self.patterns.is_match(path, self.settings.include_paths())
            || (self.settings.include_external() && path.contains("node_modules"))
    }

    // ── path classification walk ──

    fn classify(&self, path: &str) -> FileElement {
        if !self.is_included(path) {
            trace!("{path} excluded by include/ignore configuration");
            return FileElement::Ignored {
                path: path.to_string(),
            };
        }

        let (segments, ends) = split_segments(path);
        let count = segments.len();
        if count == 0 {
            return FileElement::Unknown {
                path: Some(path.to_string()),
            };
        }

        let mut main: Option<ElementClass> = None;
        let mut parents: Vec<ElementParent> = Vec::new();
        let mut tail_end = count;
        let mut i = count;

        while i > 0 {
            i -= 1;
            let tail = &segments[i..tail_end];
            let tail_str = tail.join("/");
            let mut reset: Option<usize> = None;

            for descriptor in self.settings.descriptors() {
                let main_found = main.is_some();
                if main_found && descriptor.mode() == MatchMode::Full {
                    continue;
                }
                let Some(probe) = self.try_descriptor(descriptor, &tail_str, path, main_found)
                else {
                    continue;
                };

                if main_found {
                    let element_path = path[..ends[tail_end - 1]].to_string();
                    let mut captured = probe.base_captured;
                    if let Some(values) = self.patterns.capture(&probe.pattern, &tail_str) {
                        captured.extend(zip_captures(descriptor.capture_names(), &values));
                    }
                    parents.push(ElementParent {
                        element_type: descriptor.element_type().map(str::to_string),
                        category: descriptor.category().map(str::to_string),
                        element_path,
                        captured,
                    });
                    reset = Some(i);
                } else if let Some((class, next_tail_end)) =
                    self.locate_main(descriptor, &probe, i, tail_end, &segments, &ends, path)
                {
                    main = Some(class);
                    reset = Some(next_tail_end);
                } else {
                    continue;
                }
                break;
            }

            if let Some(next_tail_end) = reset {
                tail_end = next_tail_end;
                if tail_end == 0 {
                    break;
                }
            }
        }

        match main {
            Some(mut class) => {
                trace!(
                    "{path} described as {:?}/{:?} at {}",
                    class.element_type,
                    class.category,
                    class.element_path
                );
                class.parents = parents;
                FileElement::Known {
                    path: path.to_string(),
                    class,
                }
            }
            // Ancestor-only matches without a main element are dropped.
            None => FileElement::Unknown {
                path: Some(path.to_string()),
            },
        }
    }

    /// Probes one descriptor against the current tail (or the full path
    /// in full mode), including the base-pattern veto.
    fn try_descriptor(
        &self,
        descriptor: &ElementDescriptor,
        tail_str: &str,
        path: &str,
        main_found: bool,
    ) -> Option<DescriptorMatch> {
        for pattern in descriptor.patterns() {
            let effective = match descriptor.mode() {
                MatchMode::Folder if !main_found => format!("{pattern}/**/*"),
                MatchMode::Folder | MatchMode::File | MatchMode::Full => pattern.clone(),
            };
            let target = if descriptor.mode() == MatchMode::Full {
                path
            } else {
                tail_str
            };
            if !self.patterns.is_match_one(target, &effective) {
                continue;
            }

            let base_captured = match descriptor.base_pattern() {
                None => BTreeMap::new(),
                Some(base) => {
                    let combined = format!("{base}/**/{effective}");
                    let Some(values) = self.patterns.capture(&combined, path) else {
                        // Base pattern veto: the main pattern alone is
                        // not enough.
                        continue;
                    };
                    let base_groups = self.patterns.group_count(base);
                    zip_captures(
                        descriptor.base_capture_names(),
                        &values[..base_groups.min(values.len())],
                    )
                }
            };

            return Some(DescriptorMatch {
                pattern: pattern.clone(),
                base_captured,
            });
        }
        None
    }

    /// Recovers the main element's root, internal path and captures.
    /// Returns the class and the tail bound for the parent walk.
    #[allow(clippy::too_many_arguments)]
    fn locate_main(
        &self,
        descriptor: &ElementDescriptor,
        probe: &DescriptorMatch,
        i: usize,
        tail_end: usize,
        segments: &[&str],
        ends: &[usize],
        path: &str,
    ) -> Option<(ElementClass, usize)> {
        let (element_path, internal_path, root_str, next_tail_end) = match descriptor.mode() {
            MatchMode::Folder => {
                let tail = &segments[i..tail_end];
                let span = self.patterns.matching_prefix(&probe.pattern, tail)?;
                let root_end = ends[i + span - 1];
                (
                    path[..root_end].to_string(),
                    path[(root_end + 1).min(path.len())..].to_string(),
                    tail[..span].join("/"),
                    i,
                )
            }
            MatchMode::File => {
                let tail_str = segments[i..tail_end].join("/");
                (
                    path[..ends[tail_end - 1]].to_string(),
                    segments[tail_end - 1].to_string(),
                    tail_str,
                    i,
                )
            }
            MatchMode::Full => {
                // A pattern ending in a globstar names a folder; recover
                // its root by scanning path prefixes with the suffix
                // stripped. Anything else covers the file itself.
                let folder_root = probe
                    .pattern
                    .strip_suffix("/**/*")
                    .or_else(|| probe.pattern.strip_suffix("/**"))
                    .and_then(|folder| {
                        (1..segments.len())
                            .find(|&k| self.patterns.is_match_one(&path[..ends[k - 1]], folder))
                    });
                match folder_root {
                    Some(span) => {
                        let root_end = ends[span - 1];
                        (
                            path[..root_end].to_string(),
                            path[(root_end + 1).min(path.len())..].to_string(),
                            path.to_string(),
                            0,
                        )
                    }
                    None => (
                        path.to_string(),
                        segments[segments.len() - 1].to_string(),
                        path.to_string(),
                        0,
                    ),
                }
            }
        };

        let mut captured = probe.base_captured.clone();
        if let Some(values) = self.patterns.capture(&probe.pattern, &root_str) {
            captured.extend(zip_captures(descriptor.capture_names(), &values));
        }

        Some((
            ElementClass {
                element_type: descriptor.element_type().map(str::to_string),
                category: descriptor.category().map(str::to_string),
                element_path,
                internal_path,
                captured,
                parents: Vec::new(),
            },
            next_tail_end,
        ))
    }

    // ── dependency completion ──

    fn complete_dependency(
        &self,
        source: Option<&str>,
        file: FileElement,
    ) -> DependencyElement {
        if file.is_ignored() {
            return DependencyElement::Ignored {
                path: file.path().map(str::to_string),
                source: source.map(str::to_string),
            };
        }

        if let Some(src) = source {
            let stripped = src.strip_prefix("node:").unwrap_or(src);
            let root = stripped.split('/').next().unwrap_or(stripped);
            if CORE_MODULES.contains(&root) {
                let internal = stripped[root.len()..].trim_start_matches('/');
                return DependencyElement::Core {
                    source: Some(src.to_string()),
                    base_source: root.to_string(),
                    internal_path: (!internal.is_empty()).then(|| internal.to_string()),
                };
            }
        }

        let path_is_external = file.path().map_or(true, |p| p.contains("node_modules"));
        let source_is_external = source.map_or(true, looks_like_package);

        if path_is_external && source_is_external {
            let (base_source, internal_path) =
                source.map_or((String::new(), None), split_package);
            return DependencyElement::External {
                path: file.path().map(str::to_string),
                source: source.map(str::to_string),
                base_source,
                internal_path,
            };
        }

        DependencyElement::Local {
            source: source.map(str::to_string),
            file,
        }
    }
}

/// Whether a specifier looks like a bare or scoped package name rather
/// than a relative/absolute path.
fn looks_like_package(source: &str) -> bool {
    match source.chars().next() {
        Some(c) if c.is_ascii_alphanumeric() || c == '_' => true,
        Some('@') => source.len() > 1,
        _ => false,
    }
}

/// Splits a package specifier into its root (`pkg` or `@scope/pkg`) and
/// the import subpath below it.
fn split_package(source: &str) -> (String, Option<String>) {
    let segment_count = if source.starts_with('@') { 2 } else { 1 };
    let mut boundary = source.len();
    let mut seen = 0;
    for (idx, c) in source.char_indices() {
        if c == '/' {
            seen += 1;
            if seen == segment_count {
                boundary = idx;
                break;
            }
        }
    }
    let base = source[..boundary].to_string();
    let rest = source[boundary..].trim_start_matches('/');
    (base, (!rest.is_empty()).then(|| rest.to_string()))
}

/// Splits a path into non-empty segments plus the byte offset where
/// each segment ends in the original string.
fn split_segments(path: &str) -> (Vec<&str>, Vec<usize>) {
    let mut segments = Vec::new();
    let mut ends = Vec::new();
    let mut pos = 0;
    for segment in path.split('/') {
        let end = pos + segment.len();
        if !segment.is_empty() {
            segments.push(segment);
            ends.push(end);
        }
        pos = end + 1;
    }
    (segments, ends)
}

/// Pairs capture names with captured values positionally.
fn zip_captures(names: &[String], values: &[String]) -> BTreeMap<String, String> {
    names
        .iter()
        .zip(values.iter())
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}
