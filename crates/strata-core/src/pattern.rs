//! Glob pattern engine with a shared compiled-regex registry.
//!
//! Every glob is translated once into an anchored [`regex::Regex`] whose
//! capture groups correspond positionally to the glob's wildcards, then
//! reused for all subsequent matches. The registry is shared (via `Arc`)
//! between every component of an engine, and between sibling engines
//! built from the same configuration root, so identical patterns are
//! compiled exactly once per process.
//!
//! Supported syntax: `*` (one path segment), `**` (any number of
//! segments), `?` (one character), `{a,b}` alternation, `[...]` character
//! classes, and a leading `!` for negation. A trailing `dir/**` also
//! matches `dir` itself.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use regex::Regex;

/// Errors produced while compiling a glob pattern.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PatternError {
    /// Pattern is empty.
    #[error("glob pattern must not be empty")]
    Empty,

    /// Pattern has invalid syntax.
    #[error("invalid glob pattern `{pattern}`: {reason}")]
    Invalid {
        /// The offending pattern.
        pattern: String,
        /// Why it failed to compile.
        reason: String,
    },
}

/// A glob compiled down to an anchored regex.
#[derive(Debug)]
struct CompiledPattern {
    regex: Regex,
    groups: usize,
    negated: bool,
}

/// Checks that a glob pattern compiles, without touching any registry.
///
/// Used at configuration time so that malformed descriptor patterns are
/// rejected before any matching starts.
///
/// # Errors
///
/// Returns [`PatternError`] if the pattern is empty or fails to compile.
pub fn validate(pattern: &str) -> Result<(), PatternError> {
    compile(pattern).map(|_| ())
}

fn compile(pattern: &str) -> Result<CompiledPattern, PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    let (negated, body) = match pattern.strip_prefix('!') {
        Some(rest) if !rest.starts_with('(') => (true, rest),
        _ => (false, pattern),
    };
    if body.is_empty() {
        return Err(PatternError::Invalid {
            pattern: pattern.to_string(),
            reason: "nothing follows the negation".to_string(),
        });
    }

    let (source, groups) = translate(body).map_err(|reason| PatternError::Invalid {
        pattern: pattern.to_string(),
        reason,
    })?;
    let regex = Regex::new(&source).map_err(|e| PatternError::Invalid {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    Ok(CompiledPattern {
        regex,
        groups,
        negated,
    })
}

/// Translates a glob body into anchored regex source, returning the
/// number of capture groups emitted.
fn translate(body: &str) -> Result<(String, usize), String> {
    let segments: Vec<&str> = body.split('/').collect();
    let count = segments.len();

    let mut out = String::from("^");
    let mut groups = 0;
    let mut pending_sep = false;

    for (i, segment) in segments.iter().enumerate() {
        if *segment == "**" {
            if count == 1 {
                out.push_str("(.*)");
            } else if i + 1 == count {
                // Trailing globstar: zero or more trailing segments.
                out.push_str("(?:/(.*))?");
            } else {
                if pending_sep {
                    out.push('/');
                }
                out.push_str("(?:(.*)/)?");
            }
            groups += 1;
            pending_sep = false;
        } else {
            if pending_sep {
                out.push('/');
            }
            groups += translate_segment(segment, &mut out)?;
            pending_sep = true;
        }
    }

    out.push('$');
    Ok((out, groups))
}

/// Translates one path segment (no `/`), pushing regex source onto `out`.
fn translate_segment(segment: &str, out: &mut String) -> Result<usize, String> {
    let mut groups = 0;
    let chars: Vec<char> = segment.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '*' => {
                // Consecutive stars inside a segment collapse to one.
                while i + 1 < chars.len() && chars[i + 1] == '*' {
                    i += 1;
                }
                out.push_str("([^/]*)");
                groups += 1;
            }
            '?' => {
                out.push_str("([^/])");
                groups += 1;
            }
            '[' => {
                let end = chars[i + 1..]
                    .iter()
                    .position(|&c| c == ']')
                    .ok_or_else(|| "unterminated character class".to_string())?;
                out.push('[');
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '!' || chars[j] == '^') {
                    out.push('^');
                    j += 1;
                }
                for &c in &chars[j..=i + end] {
                    if c == '\\' {
                        out.push('\\');
                    }
                    out.push(c);
                }
                out.push(']');
                i += end + 1;
            }
            '{' => {
                let mut depth = 1;
                let mut j = i + 1;
                while j < chars.len() && depth > 0 {
                    match chars[j] {
                        '{' => depth += 1,
                        '}' => depth -= 1,
                        _ => {}
                    }
                    j += 1;
                }
                if depth != 0 {
                    return Err("unterminated brace alternation".to_string());
                }
                let inner: String = chars[i + 1..j - 1].iter().collect();
                out.push('(');
                groups += 1;
                for (k, alternative) in split_alternatives(&inner).iter().enumerate() {
                    if k > 0 {
                        out.push('|');
                    }
                    groups += translate_segment(alternative, out)?;
                }
                out.push(')');
                i = j - 1;
            }
            c @ ('.' | '+' | '(' | ')' | '^' | '$' | '|' | '\\' | '}') => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
        i += 1;
    }

    Ok(groups)
}

/// Splits brace-alternation content on top-level commas.
fn split_alternatives(inner: &str) -> Vec<String> {
    let mut alternatives = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    for c in inner.chars() {
        match c {
            '{' => {
                depth += 1;
                current.push(c);
            }
            '}' => {
                depth -= 1;
                current.push(c);
            }
            ',' if depth == 0 => {
                alternatives.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    alternatives.push(current);
    alternatives
}

/// Glob matching and capture extraction over a process-shared registry
/// of compiled patterns.
#[derive(Debug, Default)]
pub struct PatternMatcher {
    compiled: Mutex<HashMap<String, Arc<CompiledPattern>>>,
    invocations: AtomicU64,
}

impl PatternMatcher {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of match/capture invocations served so far.
    ///
    /// Monotone instrumentation counter; lets callers observe that a
    /// memoized result was served without re-running the glob engine.
    #[must_use]
    pub fn invocations(&self) -> u64 {
        self.invocations.load(Ordering::Relaxed)
    }

    /// Number of distinct patterns compiled so far.
    #[must_use]
    pub fn compiled_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<CompiledPattern>>> {
        self.compiled.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, pattern: &str) -> Option<Arc<CompiledPattern>> {
        if let Some(found) = self.lock().get(pattern) {
            return Some(Arc::clone(found));
        }
        match compile(pattern) {
            Ok(compiled) => {
                let compiled = Arc::new(compiled);
                self.lock()
                    .insert(pattern.to_string(), Arc::clone(&compiled));
                Some(compiled)
            }
            Err(error) => {
                tracing::warn!("skipping unusable pattern `{pattern}`: {error}");
                None
            }
        }
    }

    /// Tests a value against a single glob pattern.
    #[must_use]
    pub fn is_match_one(&self, value: &str, pattern: &str) -> bool {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        self.get(pattern).is_some_and(|compiled| {
            let hit = compiled.regex.is_match(value);
            if compiled.negated {
                !hit
            } else {
                hit
            }
        })
    }

    /// Tests a value against a list of glob patterns (any may match).
    ///
    /// An empty list never matches.
    #[must_use]
    pub fn is_match(&self, value: &str, patterns: &[String]) -> bool {
        patterns.iter().any(|p| self.is_match_one(value, p))
    }

    /// Extracts positional capture-group values, or `None` on no match.
    ///
    /// Unmatched optional groups surface as empty strings. Negated
    /// patterns never capture.
    #[must_use]
    pub fn capture(&self, pattern: &str, value: &str) -> Option<Vec<String>> {
        self.invocations.fetch_add(1, Ordering::Relaxed);
        let compiled = self.get(pattern)?;
        if compiled.negated {
            return None;
        }
        let captures = compiled.regex.captures(value)?;
        Some(
            (1..=compiled.groups)
                .map(|i| {
                    captures
                        .get(i)
                        .map_or_else(String::new, |m| m.as_str().to_string())
                })
                .collect(),
        )
    }

    /// Number of capture groups the pattern compiles to.
    #[must_use]
    pub fn group_count(&self, pattern: &str) -> usize {
        self.get(pattern).map_or(0, |compiled| compiled.groups)
    }

    /// Finds the shortest prefix of `segments` (joined with `/`) that
    /// matches the pattern, returning how many segments it spans.
    #[must_use]
    pub fn matching_prefix(&self, pattern: &str, segments: &[&str]) -> Option<usize> {
        for end in 1..=segments.len() {
            if self.is_match_one(&segments[..end].join("/"), pattern) {
                return Some(end);
            }
        }
        None
    }
}
