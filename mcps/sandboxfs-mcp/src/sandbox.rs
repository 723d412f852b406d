//! Sandbox module for path validation and security
//!
//! Every caller-supplied path goes through [`Sandbox::confine`] before any
//! filesystem primitive sees it. Confinement is lexical: `.`/`..` segments
//! are resolved without touching the disk and the result must sit under
//! the root component by component, so `/data` never admits `/data-other`.

use std::path::{Component, Path, PathBuf};

use crate::types::{FsError, FsResult, SandboxConfig};

/// A path proven to lie inside the sandbox root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfinedPath(PathBuf);

impl ConfinedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl AsRef<Path> for ConfinedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl std::fmt::Display for ConfinedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Sandbox confining filesystem operations to a single root
#[derive(Debug, Clone)]
pub struct Sandbox {
    /// Normalized absolute root
    root: PathBuf,
    /// Re-check containment against the canonical (symlink-free) root
    resolve_symlinks: bool,
}

impl Sandbox {
    /// Create a sandbox rooted at `root`
    ///
    /// `~` expands to the home directory and a relative root is anchored at
    /// the current directory. The root does not have to exist yet.
    pub fn new(root: &str) -> FsResult<Self> {
        let expanded = expand_tilde(root)?;
        let absolute = if expanded.is_absolute() {
            expanded
        } else {
            std::env::current_dir()
                .map_err(|e| FsError::ConfigError(format!("Could not resolve current dir: {}", e)))?
                .join(expanded)
        };

        Ok(Self {
            root: normalize(&absolute),
            resolve_symlinks: false,
        })
    }

    /// Create a sandbox from the `[sandbox]` config section
    pub fn from_config(config: &SandboxConfig) -> FsResult<Self> {
        Ok(Self::new(&config.root)?.with_symlink_resolution(config.resolve_symlinks))
    }

    pub fn with_symlink_resolution(mut self, enabled: bool) -> Self {
        self.resolve_symlinks = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a caller-supplied path to a confined absolute path
    pub fn confine(&self, candidate: &str) -> FsResult<ConfinedPath> {
        if candidate.contains('\0') {
            return Err(FsError::InvalidPath("Path contains null byte".to_string()));
        }

        let cleaned = normalize(Path::new(candidate));
        let resolved = if cleaned.is_absolute() {
            cleaned
        } else {
            normalize(&self.root.join(cleaned))
        };

        if !resolved.starts_with(&self.root) {
            return Err(self.denied());
        }

        if self.resolve_symlinks {
            self.check_resolved(&resolved)?;
        }

        Ok(ConfinedPath(resolved))
    }

    /// Canonicalize the deepest existing ancestor of `path` and require it to
    /// remain under the canonical root
    fn check_resolved(&self, path: &Path) -> FsResult<()> {
        let Some(real_root) = canonicalize_existing(&self.root) else {
            return Ok(());
        };
        match canonicalize_existing(path) {
            Some(real) if real.starts_with(&real_root) => Ok(()),
            Some(real) => {
                tracing::warn!(
                    "Symlink escape: {} resolves to {}",
                    path.display(),
                    real.display()
                );
                Err(self.denied())
            }
            None => Ok(()),
        }
    }

    fn denied(&self) -> FsError {
        FsError::AccessDenied {
            root: self.root.clone(),
        }
    }
}

/// Lexically normalize a path: drop `.`, fold `..` into its parent and
/// collapse redundant separators. Never touches the filesystem.
///
/// `..` directly under the filesystem root is discarded; leading `..` on a
/// relative path is kept so the caller can still see the escape.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(part) => out.push(part),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Canonicalize the longest existing prefix of `path`, re-appending the
/// missing tail
fn canonicalize_existing(path: &Path) -> Option<PathBuf> {
    let mut existing = path;
    let mut tail = Vec::new();
    loop {
        if let Ok(real) = existing.canonicalize() {
            return Some(tail.iter().rev().fold(real, |acc: PathBuf, part| acc.join(part)));
        }
        tail.push(existing.file_name()?.to_owned());
        existing = existing.parent()?;
    }
}

fn expand_tilde(path: &str) -> FsResult<PathBuf> {
    if path != "~" && !path.starts_with("~/") {
        return Ok(PathBuf::from(path));
    }
    let home = dirs::home_dir()
        .ok_or_else(|| FsError::ConfigError("Could not determine home directory".to_string()))?;
    Ok(match path.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => home,
    })
}
