use std::path::{Component, Path, PathBuf};

/// Renders a path in its most readable absolute form for logs and error
/// messages, without failing on paths that do not exist.
pub trait BestEffortPathExt {
    fn best_effort_path_display(&self) -> String;
}

impl BestEffortPathExt for Path {
    fn best_effort_path_display(&self) -> String {
        best_effort_display(self)
    }
}

impl BestEffortPathExt for PathBuf {
    fn best_effort_path_display(&self) -> String {
        best_effort_display(self)
    }
}

fn best_effort_display(path: &Path) -> String {
    match path.canonicalize() {
        Ok(canonical) => canonical.display().to_string(),
        Err(_) => {
            // Nonexistent paths cannot be canonicalized, absolutize and
            // normalize by hand instead.
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                match std::env::current_dir() {
                    Ok(current) => current.join(path),
                    Err(_) => path.to_path_buf(),
                }
            };
            normalize(&absolute).display().to_string()
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !matches!(parts.last(), None | Some(Component::RootDir)) {
                    parts.pop();
                }
            }
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}
