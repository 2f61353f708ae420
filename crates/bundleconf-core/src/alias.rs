//! Alias rules: symbolic import prefixes rewritten to filesystem roots.
//!
//! A rule matches the leading segment of a specifier: `@` matches `@` and
//! `@/components/Foo.vue`, but not the scoped package `@mdi/font`.

use serde::Serialize;
use std::path::PathBuf;

/// A single `find → replacement` rewrite applied before module resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasRule {
    /// Symbolic prefix, e.g. `@`.
    pub find: String,
    /// Absolute filesystem root the prefix stands for.
    ///
    /// Replacements are always filesystem paths. A package-style replacement
    /// such as `vue/dist/vue.esm-bundler.js` is taken relative to the project
    /// root like any other relative path; it is not re-resolved as a bare
    /// specifier through `node_modules`.
    pub replacement: PathBuf,
}

impl AliasRule {
    /// Create a rule. `replacement` is expected to be absolute and normalized;
    /// the config loader guarantees this.
    pub fn new(find: impl Into<String>, replacement: impl Into<PathBuf>) -> Self {
        Self {
            find: find.into(),
            replacement: replacement.into(),
        }
    }

    /// Whether the specifier starts with this rule's prefix as a whole segment.
    #[must_use]
    pub fn matches(&self, specifier: &str) -> bool {
        match specifier.strip_prefix(self.find.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/') || self.find.ends_with('/'),
            None => false,
        }
    }

    /// Rewrite `specifier` to `replacement + specifier[len(find)..]`, or `None`
    /// if the rule does not match.
    #[must_use]
    pub fn rewrite(&self, specifier: &str) -> Option<PathBuf> {
        if !self.matches(specifier) {
            return None;
        }
        let rest = &specifier[self.find.len()..];
        let rest = rest.trim_start_matches('/');
        if rest.is_empty() {
            Some(self.replacement.clone())
        } else {
            Some(self.replacement.join(rest))
        }
    }
}

/// Apply the first matching rule in declaration order.
#[must_use]
pub fn apply_aliases<'a>(
    rules: &'a [AliasRule],
    specifier: &str,
) -> Option<(&'a AliasRule, PathBuf)> {
    rules
        .iter()
        .find_map(|rule| rule.rewrite(specifier).map(|path| (rule, path)))
}
