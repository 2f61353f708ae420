use std::path::{Path, PathBuf};

/// Find the project root by walking up from `cwd` looking for `package.json`,
/// a bundler config file, or `.git`.
///
/// Returns the first directory containing any marker, or `None` if none is found.
#[must_use]
pub fn project_root(cwd: &Path) -> Option<PathBuf> {
    let mut current = cwd.to_path_buf();

    loop {
        if current.join("package.json").exists()
            || crate::config::find_config_file(&current).is_some()
            || current.join(".git").exists()
        {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}
