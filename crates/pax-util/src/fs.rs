use std::path::{Component, Path, PathBuf};

/// Nearest directory at or above `start` that holds `filename`.
pub fn find_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    let mut current = start;
    loop {
        let candidate = current.join(filename);
        if candidate.is_file() {
            return Some(current.to_path_buf());
        }
        current = current.parent()?;
    }
}

/// Walk up from `start` while every directory holds `filename`, returning the
/// topmost one. `None` if `start` itself does not contain the file.
pub fn topmost_ancestor_with(start: &Path, filename: &str) -> Option<PathBuf> {
    if !start.join(filename).is_file() {
        return None;
    }
    let mut top = start.to_path_buf();
    while let Some(parent) = top.parent() {
        if !parent.join(filename).is_file() {
            break;
        }
        top = parent.to_path_buf();
    }
    Some(top)
}

/// Make `path` absolute (against the current directory) and fold away `.` and
/// `..` components without touching the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Like [`normalize`], but resolves symlinks in the longest existing prefix so
/// paths to not-yet-created directories compare equal to canonical ones.
pub fn canonicalize_lenient(path: &Path) -> PathBuf {
    let path = normalize(path);
    let mut existing = path.as_path();
    let mut tail = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut out = canonical;
            for segment in tail.iter().rev() {
                out.push(segment);
            }
            return out;
        }
        match (existing.file_name(), existing.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => return path,
        }
    }
}

/// Decomposition of the route between two directories:
/// go up `up` levels to `common`, then down through `down`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePath {
    pub up: usize,
    pub common: PathBuf,
    pub down: PathBuf,
}

impl RelativePath {
    /// Number of directory levels below `common` on the `to` side.
    pub fn down_levels(&self) -> usize {
        self.down.components().count()
    }

    /// Signed change in depth when moving from the `from` side to the `to` side.
    pub fn depth_delta(&self) -> isize {
        self.down_levels() as isize - self.up as isize
    }
}

/// Compute the route from directory `from` to directory `to`.
///
/// Both paths are normalized first. Returns `None` when the two paths share
/// no ancestor beyond the filesystem root (different drives or roots).
pub fn relative_path(from: &Path, to: &Path) -> Option<RelativePath> {
    let from = canonicalize_lenient(from);
    let to = canonicalize_lenient(to);

    let from_parts: Vec<Component> = from.components().collect();
    let to_parts: Vec<Component> = to.components().collect();

    let shared = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let named_shared = from_parts[..shared]
        .iter()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count();
    if named_shared == 0 {
        return None;
    }

    let common: PathBuf = from_parts[..shared].iter().collect();
    let down: PathBuf = to_parts[shared..].iter().collect();

    Some(RelativePath {
        up: from_parts.len() - shared,
        common,
        down,
    })
}
