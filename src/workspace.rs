//! Explicit workspace root for artifact persistence.
//!
//! Every pipeline step receives the workspace as a value instead of relying
//! on the process working directory. Artifact paths come from the generation
//! service, so writes are guarded against traversal outside the root.

use std::io;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a service-provided relative path against the root, rejecting
    /// absolute paths and anything that would escape the workspace.
    pub fn resolve(&self, relative: &str) -> io::Result<PathBuf> {
        let candidate = Path::new(relative);
        if candidate.is_absolute() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact path must be relative: {relative}"),
            ));
        }
        let mut depth: i32 = 0;
        for component in candidate.components() {
            match component {
                Component::Normal(_) => depth += 1,
                Component::ParentDir => {
                    depth -= 1;
                    if depth < 0 {
                        return Err(io::Error::new(
                            io::ErrorKind::InvalidInput,
                            format!("artifact path escapes the workspace: {relative}"),
                        ));
                    }
                }
                Component::CurDir => {}
                Component::RootDir | Component::Prefix(_) => {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("artifact path must be relative: {relative}"),
                    ));
                }
            }
        }
        if depth == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("artifact path is empty: {relative}"),
            ));
        }
        Ok(self.root.join(candidate))
    }

    /// Write a UTF-8 artifact under the root, creating parent directories.
    pub fn write_artifact(&self, relative: &str, content: &str) -> io::Result<PathBuf> {
        let path = self.resolve(relative)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn read_artifact(&self, relative: &str) -> io::Result<String> {
        let path = self.resolve(relative)?;
        std::fs::read_to_string(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn write_and_read_roundtrip() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().to_path_buf());
        ws.write_artifact("tests/status.test.js", "test body").unwrap();
        assert_eq!(ws.read_artifact("tests/status.test.js").unwrap(), "test body");
        assert!(dir.path().join("tests/status.test.js").exists());
    }

    #[test]
    fn write_creates_nested_parents() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().to_path_buf());
        ws.write_artifact("a/b/c/file.js", "x").unwrap();
        assert!(dir.path().join("a/b/c/file.js").exists());
    }

    #[test]
    fn rejects_absolute_path() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().to_path_buf());
        let err = ws.write_artifact("/etc/passwd", "x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn rejects_traversal_outside_root() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().to_path_buf());
        assert!(ws.write_artifact("../escape.js", "x").is_err());
        assert!(ws.write_artifact("a/../../escape.js", "x").is_err());
    }

    #[test]
    fn allows_internal_parent_components() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().to_path_buf());
        // a/b/../c stays inside the root
        ws.write_artifact("a/b/../c.js", "x").unwrap();
        assert!(dir.path().join("a/c.js").exists());
    }

    #[test]
    fn rejects_empty_path() {
        let dir = tempdir().unwrap();
        let ws = Workspace::new(dir.path().to_path_buf());
        assert!(ws.write_artifact("", "x").is_err());
        assert!(ws.write_artifact(".", "x").is_err());
    }
}
