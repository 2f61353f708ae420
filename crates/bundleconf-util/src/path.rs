//! Lexical path helpers.
//!
//! Nothing here touches the filesystem: `..` is folded against the preceding
//! component, so the result of [`normalize`] can be compared component-wise
//! without trusting the requested path.

use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.`, fold `..` into its parent.
///
/// `..` at the root of an absolute path stays at the root, so
/// `/a/../../etc` becomes `/etc`.
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                );
                if at_root && out.has_root() {
                    continue;
                }
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else {
                    out.push("..");
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Join `path` onto `base` unless it is already absolute, then normalize.
#[must_use]
pub fn absolutize(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&base.join(path))
    }
}

/// Whether `path` is `root` or lies below it, compared component-wise.
///
/// `/app-evil` is not inside `/app`. An empty `root` contains nothing.
#[must_use]
pub fn is_within(path: &Path, root: &Path) -> bool {
    root.has_root() && path.starts_with(root)
}

/// Name of the npm package that owns `path`, taken from its last
/// `node_modules` segment (`@scope/name` or `name`).
#[must_use]
pub fn package_name(path: &Path) -> Option<String> {
    let parts: Vec<&str> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => s.to_str(),
            _ => None,
        })
        .collect();

    let idx = parts.iter().rposition(|p| *p == "node_modules")?;
    let first = parts.get(idx + 1)?;
    if first.starts_with('@') {
        let second = parts.get(idx + 2)?;
        Some(format!("{first}/{second}"))
    } else {
        Some((*first).to_string())
    }
}
