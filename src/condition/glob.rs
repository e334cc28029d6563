//! Glob patterns used by `event_match` conditions.
//!
//! Supported syntax: `*` (any run of characters), `?` (exactly one
//! character) and `[...]` character classes with `!` negation. Matching is
//! always case-insensitive.
//!
//! [`GlobCache`] keeps compiled patterns across events so a batch compiles
//! each rule pattern once.

use std::collections::HashMap;
use std::sync::RwLock;

use regex::Regex;

/// Entries kept before a [`GlobCache`] starts over.
const MAX_CACHED_PATTERNS: usize = 4096;

/// How a glob is anchored against the candidate text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobMode {
    /// The whole value must match.
    Exact,
    /// The pattern must match a run of whole words somewhere in the value.
    Words,
}

/// Compiles `pattern` into a regex. Returns `None` for empty patterns or
/// patterns that do not produce a valid regex.
#[must_use]
pub fn compile(pattern: &str, mode: GlobMode) -> Option<Regex> {
    if pattern.is_empty() {
        return None;
    }

    let mut re = String::with_capacity(pattern.len() * 2 + 16);
    re.push_str("(?is)");
    match mode {
        GlobMode::Exact => re.push('^'),
        GlobMode::Words => re.push_str(r"(?:^|\W)"),
    }

    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*?"),
            '?' => re.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == ']' {
                        closed = true;
                        break;
                    }
                    class.push(inner);
                }
                if closed && !class.is_empty() {
                    re.push('[');
                    let body = match class.strip_prefix('!') {
                        Some(rest) => {
                            re.push('^');
                            rest
                        }
                        None => class.as_str(),
                    };
                    for ch in body.chars() {
                        if ch == '-' {
                            re.push('-');
                        } else {
                            re.push_str(&regex::escape(&ch.to_string()));
                        }
                    }
                    re.push(']');
                } else {
                    // Unterminated class: treat the bracket text literally.
                    re.push_str(&regex::escape("["));
                    re.push_str(&regex::escape(&class));
                    if closed {
                        re.push_str(&regex::escape("]"));
                    }
                }
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }

    match mode {
        GlobMode::Exact => re.push('$'),
        GlobMode::Words => re.push_str(r"(?:\W|$)"),
    }

    Regex::new(&re).ok()
}

/// Convenience wrapper: compile and test in one step.
#[must_use]
pub fn matches(pattern: &str, value: &str, mode: GlobMode) -> bool {
    compile(pattern, mode).is_some_and(|re| re.is_match(value))
}

/// Compiles a whole-word, case-insensitive search for the literal `needle`.
#[must_use]
pub fn compile_word(needle: &str) -> Option<Regex> {
    if needle.trim().is_empty() {
        return None;
    }
    let re = format!(r"(?i)(?:^|\W){}(?:\W|$)", regex::escape(needle));
    Regex::new(&re).ok()
}

/// True if `needle` occurs in `haystack` as a whole word, ignoring case.
#[must_use]
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    compile_word(needle).is_some_and(|re| re.is_match(haystack))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Flavor {
    Glob(GlobMode),
    Word,
}

/// Shared cache of compiled patterns, keyed by pattern text and mode.
///
/// Patterns that fail to compile are cached as misses too. A poisoned lock
/// degrades to compiling on every call.
#[derive(Debug, Default)]
pub struct GlobCache {
    compiled: RwLock<HashMap<(String, Flavor), Option<Regex>>>,
}

impl GlobCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached form of [`matches`].
    #[must_use]
    pub fn matches(&self, pattern: &str, value: &str, mode: GlobMode) -> bool {
        self.get_or_compile(pattern, Flavor::Glob(mode))
            .is_some_and(|re| re.is_match(value))
    }

    /// Cached form of [`contains_word`].
    #[must_use]
    pub fn contains_word(&self, haystack: &str, needle: &str) -> bool {
        self.get_or_compile(needle, Flavor::Word)
            .is_some_and(|re| re.is_match(haystack))
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.compiled.read().map_or(0, |map| map.len())
    }

    /// True if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get_or_compile(&self, pattern: &str, flavor: Flavor) -> Option<Regex> {
        let key = (pattern.to_string(), flavor);
        if let Ok(map) = self.compiled.read() {
            if let Some(hit) = map.get(&key) {
                return hit.clone();
            }
        }

        let compiled = match flavor {
            Flavor::Glob(mode) => compile(pattern, mode),
            Flavor::Word => compile_word(pattern),
        };
        if let Ok(mut map) = self.compiled.write() {
            if map.len() >= MAX_CACHED_PATTERNS {
                map.clear();
            }
            map.insert(key, compiled.clone());
        }
        compiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_mode_anchors_both_ends() {
        assert!(matches("m.room.message", "m.room.message", GlobMode::Exact));
        assert!(matches("M.ROOM.*", "m.room.member", GlobMode::Exact));
        assert!(!matches("m.room", "m.room.message", GlobMode::Exact));
        assert!(matches("m.room.?ember", "m.room.member", GlobMode::Exact));
    }

    #[test]
    fn words_mode_requires_word_boundaries() {
        assert!(matches("cake", "I like cake!", GlobMode::Words));
        assert!(matches("cake*lie", "the cake is a lie", GlobMode::Words));
        assert!(!matches("cake", "cakes are great", GlobMode::Words));
        assert!(!matches("cake", "pancake", GlobMode::Words));
        assert!(matches("CAKE", "cake", GlobMode::Words));
    }

    #[test]
    fn character_classes() {
        assert!(matches("[ab]c", "bc", GlobMode::Exact));
        assert!(!matches("[!ab]c", "bc", GlobMode::Exact));
        assert!(matches("[!ab]c", "zc", GlobMode::Exact));
        assert!(matches("[a-c]x", "bx", GlobMode::Exact));
        assert!(matches("[ab", "[ab", GlobMode::Exact));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("a.b", "a.b", GlobMode::Exact));
        assert!(!matches("a.b", "axb", GlobMode::Exact));
        assert!(matches("(hi)", "(hi)", GlobMode::Exact));
    }

    #[test]
    fn empty_pattern_never_matches() {
        assert!(compile("", GlobMode::Exact).is_none());
        assert!(!matches("", "", GlobMode::Words));
    }

    #[test]
    fn contains_word_is_whole_word_and_case_insensitive() {
        assert!(contains_word("hello Alice", "Alice"));
        assert!(contains_word("ALICE: ping", "alice"));
        assert!(!contains_word("hello Alicextra", "Alice"));
        assert!(!contains_word("hello Bob", "Alice"));
        assert!(contains_word("ping [bot] now", "[bot]"));
        assert!(!contains_word("anything", "  "));
    }

    #[test]
    fn cache_compiles_each_pattern_once() {
        let cache = GlobCache::new();
        assert!(cache.is_empty());

        for _ in 0..3 {
            assert!(cache.matches("cake*", "cake is great", GlobMode::Words));
            assert!(!cache.matches("cake*", "pancake", GlobMode::Words));
            assert!(cache.contains_word("hello Alice", "alice"));
        }
        assert_eq!(cache.len(), 2);

        // Same text, different mode: separate entry with its own anchoring.
        assert!(!cache.matches("cake", "the cake", GlobMode::Exact));
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn cache_agrees_with_uncached_matching() {
        let cache = GlobCache::new();
        let cases = [
            ("m.room.*", "m.room.member", GlobMode::Exact),
            ("[!ab]c", "bc", GlobMode::Exact),
            ("", "", GlobMode::Words),
            ("[ab", "[ab", GlobMode::Exact),
        ];
        for (pattern, value, mode) in cases {
            assert_eq!(cache.matches(pattern, value, mode), matches(pattern, value, mode));
        }
        assert!(!cache.contains_word("anything", " "));
    }
}
