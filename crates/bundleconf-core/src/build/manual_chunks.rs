//! Chunk grouping policy: dependencies pinned to named output chunks.
//!
//! ```js
//! build: { rollupOptions: { output: { manualChunks: { 'material-icons': ['@mdi/font'] } } } }
//! ```
//!
//! A package may belong to at most one group. The bundling engine refuses to
//! place one module in two manual chunks, so a conflicting assignment is
//! rejected here, at load time, instead of failing mid-build.

use crate::error::{Error, Result};
use rustc_hash::FxHashMap as HashMap;
use serde::Serialize;

/// A named output chunk and the packages forced into it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkGroup {
    pub name: String,
    pub packages: Vec<String>,
}

impl ChunkGroup {
    pub fn new<I, S>(name: impl Into<String>, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            packages: packages.into_iter().map(Into::into).collect(),
        }
    }
}

/// Validated chunk groups with a package lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ManualChunks {
    groups: Vec<ChunkGroup>,
    #[serde(skip)]
    by_package: HashMap<String, usize>,
}

impl ManualChunks {
    /// Validate groups and index them by package.
    ///
    /// Rejects empty or duplicate chunk names, names containing path
    /// separators, empty package lists, and a package listed in two groups.
    /// A package repeated inside one group is kept once.
    pub fn from_groups(groups: Vec<ChunkGroup>) -> Result<Self> {
        let mut by_package: HashMap<String, usize> = HashMap::default();
        let mut normalized = Vec::with_capacity(groups.len());

        for (idx, group) in groups.into_iter().enumerate() {
            let field = format!("build.rollupOptions.output.manualChunks.{}", group.name);

            if group.name.trim().is_empty() {
                return Err(Error::invalid(
                    "build.rollupOptions.output.manualChunks",
                    "chunk name must not be empty",
                ));
            }
            if group.name.contains(['/', '\\']) {
                return Err(Error::invalid(field, "chunk name must not contain path separators"));
            }
            if normalized.iter().any(|g: &ChunkGroup| g.name == group.name) {
                return Err(Error::invalid(field, "chunk name is declared twice"));
            }
            if group.packages.is_empty() {
                return Err(Error::invalid(field, "chunk group lists no packages"));
            }

            let mut packages = Vec::with_capacity(group.packages.len());
            for package in group.packages {
                if package.trim().is_empty() {
                    return Err(Error::invalid(field, "package identifier must not be empty"));
                }
                match by_package.get(&package) {
                    Some(&other) if other == idx => {}
                    Some(&other) => {
                        let first: &ChunkGroup = &normalized[other];
                        return Err(Error::ChunkAssignmentConflict {
                            package,
                            first: first.name.clone(),
                            second: group.name,
                        });
                    }
                    None => {
                        by_package.insert(package.clone(), idx);
                        packages.push(package);
                    }
                }
            }

            normalized.push(ChunkGroup {
                name: group.name,
                packages,
            });
        }

        Ok(Self {
            groups: normalized,
            by_package,
        })
    }

    /// Groups in declaration order.
    #[must_use]
    pub fn groups(&self) -> &[ChunkGroup] {
        &self.groups
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Index of the group `package` is pinned to.
    #[must_use]
    pub fn group_index(&self, package: &str) -> Option<usize> {
        self.by_package.get(package).copied()
    }

    /// Name of the chunk `package` is pinned to.
    #[must_use]
    pub fn chunk_for_package(&self, package: &str) -> Option<&str> {
        self.group_index(package)
            .map(|idx| self.groups[idx].name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let chunks = ManualChunks::from_groups(vec![
            ChunkGroup::new("material-icons", ["@mdi/font"]),
            ChunkGroup::new("vendor", ["vue", "vue-router"]),
        ])
        .unwrap();

        assert_eq!(chunks.chunk_for_package("@mdi/font"), Some("material-icons"));
        assert_eq!(chunks.chunk_for_package("vue-router"), Some("vendor"));
        assert_eq!(chunks.chunk_for_package("pinia"), None);
    }

    #[test]
    fn test_conflicting_assignment_is_rejected() {
        let err = ManualChunks::from_groups(vec![
            ChunkGroup::new("material-icons", ["@mdi/font"]),
            ChunkGroup::new("vendor", ["vue", "@mdi/font"]),
        ])
        .unwrap_err();

        match err {
            Error::ChunkAssignmentConflict {
                package,
                first,
                second,
            } => {
                assert_eq!(package, "@mdi/font");
                assert_eq!(first, "material-icons");
                assert_eq!(second, "vendor");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_within_group_is_collapsed() {
        let chunks =
            ManualChunks::from_groups(vec![ChunkGroup::new("icons", ["@mdi/font", "@mdi/font"])])
                .unwrap();
        assert_eq!(chunks.groups()[0].packages, vec!["@mdi/font".to_string()]);
    }

    #[test]
    fn test_invalid_groups() {
        let empty_name = ManualChunks::from_groups(vec![ChunkGroup::new("", ["vue"])]);
        assert!(matches!(empty_name, Err(Error::InvalidConfig { .. })));

        let slash = ManualChunks::from_groups(vec![ChunkGroup::new("a/b", ["vue"])]);
        assert!(matches!(slash, Err(Error::InvalidConfig { .. })));

        let no_packages =
            ManualChunks::from_groups(vec![ChunkGroup::new("a", Vec::<String>::new())]);
        assert!(matches!(no_packages, Err(Error::InvalidConfig { .. })));

        let twice = ManualChunks::from_groups(vec![
            ChunkGroup::new("a", ["vue"]),
            ChunkGroup::new("a", ["pinia"]),
        ]);
        assert!(matches!(twice, Err(Error::InvalidConfig { .. })));
    }
}
