use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A single path component: one name between slashes.
///
/// Components are non-empty and never contain `/`, `\`, or NUL; `.` and `..`
/// are rejected so every component names exactly one tree entry.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PathComponent(String);

impl PathComponent {
    /// Validate and wrap a single component.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        if let Some(reason) = component_problem(&name) {
            return Err(TypeError::InvalidPathComponent {
                component: name,
                reason: reason.to_string(),
            });
        }
        Ok(Self(name))
    }

    /// The component as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PathComponent({})", self.0)
    }
}

impl fmt::Display for PathComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn component_problem(name: &str) -> Option<&'static str> {
    if name.is_empty() {
        return Some("empty component");
    }
    if name == "." || name == ".." {
        return Some("relative component");
    }
    if name.contains('/') {
        return Some("contains '/'");
    }
    if name.contains('\\') {
        return Some("contains '\\'");
    }
    if name.contains('\0') {
        return Some("contains NUL");
    }
    None
}

/// A canonical repo-relative path.
///
/// Components are joined by `/`; the empty path names the repository root.
/// Paths are value types: cheap to clone and immutable once built.
#[derive(Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoPath(String);

impl RepoPath {
    /// The empty path, naming the repository root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse and validate a path string.
    ///
    /// The empty string parses to the root path. Every component must be a
    /// valid [`PathComponent`]; leading, trailing, and doubled slashes are
    /// rejected rather than normalized.
    pub fn parse(path: &str) -> Result<Self, TypeError> {
        if path.is_empty() {
            return Ok(Self::root());
        }
        for component in path.split('/') {
            if let Some(reason) = component_problem(component) {
                return Err(TypeError::InvalidPath {
                    path: path.to_string(),
                    reason: reason.to_string(),
                });
            }
        }
        Ok(Self(path.to_string()))
    }

    /// Append a component, returning the extended path.
    pub fn join(&self, name: &PathComponent) -> RepoPath {
        if self.0.is_empty() {
            RepoPath(name.as_str().to_string())
        } else {
            RepoPath(format!("{}/{}", self.0, name.as_str()))
        }
    }

    /// The last component, or `None` for the root path.
    pub fn basename(&self) -> Option<&str> {
        if self.0.is_empty() {
            None
        } else {
            Some(self.0.rsplit('/').next().unwrap_or(&self.0))
        }
    }

    /// Iterate over the components from the root down.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// The path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if another path equals this one or lies beneath it.
    ///
    /// The root path contains every path.
    pub fn contains(&self, other: &RepoPath) -> bool {
        if self.0.is_empty() {
            return true;
        }
        match other.0.strip_prefix(&self.0) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// Returns `true` for the root path.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RepoPath({})", self.0)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
