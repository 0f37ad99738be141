//! Import path → package directory resolution.
//!
//! An input is tried against these rules, first match wins:
//!
//! 1. an absolute path is used as the directory, with no root;
//! 2. a path starting with `.` is relative to the working directory and is
//!    attributed to the first root containing that directory, unless the
//!    result leaves that root;
//! 3. `root/input` for each root in order, if it exists inside the root;
//! 4. for each root containing the working directory, `input` with its first
//!    segment replaced by the working directory's position under the root;
//!
//! and otherwise the path is not found. A path naming a regular file resolves
//! to the file's directory.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use super::roots::RootSet;
use crate::error::{Error, Result};

/// Where a package lives: its directory, the root it was found under and its
/// import path relative to that root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CanonicalPackageRef {
    /// `dir` relative to `root` with `/` separators; for rootless results the
    /// directory itself.
    pub package_path: String,
    pub dir: PathBuf,
    /// Empty when the package is not under any root.
    pub root: PathBuf,
}

impl CanonicalPackageRef {
    pub fn is_rooted(&self) -> bool {
        !self.root.as_os_str().is_empty()
    }
}

pub struct PathResolver<'r> {
    roots: &'r RootSet,
    working_dir: PathBuf,
}

impl<'r> PathResolver<'r> {
    pub fn new(roots: &'r RootSet, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            roots,
            working_dir: working_dir.into(),
        }
    }

    pub fn resolve(&self, input: &str) -> Result<CanonicalPackageRef> {
        let chosen = self.choose(input)?;
        let resolved = self.collapse_file(input, chosen)?;
        debug!(
            input,
            dir = %resolved.dir.display(),
            root = %resolved.root.display(),
            package_path = %resolved.package_path,
            "resolved package path"
        );
        Ok(resolved)
    }

    fn not_found(&self, input: &str) -> Error {
        Error::NotFound {
            input: input.to_string(),
            roots: self.roots.to_vec(),
        }
    }

    /// Roots made absolute against the working directory, in search order.
    fn absolute_roots(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.roots.iter().map(|root| clean(&self.working_dir.join(root)))
    }

    fn choose(&self, input: &str) -> Result<CanonicalPackageRef> {
        if Path::new(input).is_absolute() {
            return Ok(CanonicalPackageRef {
                package_path: input.to_string(),
                dir: PathBuf::from(input),
                root: PathBuf::new(),
            });
        }

        let (first, rest) = split_first_segment(input);

        if first == "." {
            let dir = clean(&self.working_dir.join(rest));
            let working_dir = clean(&self.working_dir);
            let root = self
                .absolute_roots()
                .find(|root| working_dir.starts_with(root))
                .filter(|root| dir.starts_with(root));
            return Ok(match root {
                Some(root) => CanonicalPackageRef {
                    package_path: relative_slash(&dir, &root),
                    dir,
                    root,
                },
                None => CanonicalPackageRef {
                    package_path: dir.display().to_string(),
                    dir,
                    root: PathBuf::new(),
                },
            });
        }

        for root in self.absolute_roots() {
            let candidate = clean(&root.join(input));
            if !candidate.starts_with(&root) {
                continue;
            }
            if exists(&candidate)? {
                return Ok(CanonicalPackageRef {
                    package_path: relative_slash(&candidate, &root),
                    dir: candidate,
                    root,
                });
            }
        }

        let working_dir = clean(&self.working_dir);
        for root in self.absolute_roots() {
            let Ok(remainder) = working_dir.strip_prefix(&root) else {
                continue;
            };
            let candidate = clean(&root.join(remainder).join(rest));
            if candidate.starts_with(&root) && exists(&candidate)? {
                return Ok(CanonicalPackageRef {
                    package_path: relative_slash(&candidate, &root),
                    dir: candidate,
                    root,
                });
            }
        }

        Err(self.not_found(input))
    }

    fn collapse_file(&self, input: &str, chosen: CanonicalPackageRef) -> Result<CanonicalPackageRef> {
        let metadata = match fs::metadata(&chosen.dir) {
            Ok(metadata) => metadata,
            Err(err) if is_missing(&err) => return Err(self.not_found(input)),
            Err(err) => return Err(Error::filesystem(chosen.dir, err)),
        };
        if !metadata.is_file() {
            return Ok(chosen);
        }

        let dir = chosen.dir.parent().map(Path::to_path_buf).unwrap_or_default();
        let package_path = if chosen.is_rooted() {
            relative_slash(&dir, &chosen.root)
        } else {
            dir.display().to_string()
        };
        Ok(CanonicalPackageRef {
            package_path,
            dir,
            root: chosen.root,
        })
    }
}

fn is_missing(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

fn exists(path: &Path) -> Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(err) if is_missing(&err) => Ok(false),
        Err(err) => Err(Error::filesystem(path, err)),
    }
}

/// First `/`-separated segment of `input` and the remainder after it.
fn split_first_segment(input: &str) -> (&str, &str) {
    match input.split_once('/') {
        Some((first, rest)) => (first, rest.trim_start_matches('/')),
        None => (input, ""),
    }
}

/// Lexically normalizes `path`: drops `.` components and folds `..` into the
/// preceding component.
pub(crate) fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last = out.components().next_back();
                match last {
                    Some(Component::Normal(_)) => {
                        out.pop();
                    }
                    Some(Component::RootDir | Component::Prefix(_)) => {}
                    _ => out.push(".."),
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// `dir` relative to `root`, `/`-separated and without surrounding separators.
fn relative_slash(dir: &Path, root: &Path) -> String {
    let relative = dir.strip_prefix(root).unwrap_or(dir);
    let segments: Vec<String> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean() {
        assert_eq!(clean(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(clean(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(clean(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn test_relative_slash() {
        assert_eq!(relative_slash(Path::new("/go/src/a/b"), Path::new("/go/src")), "a/b");
        assert_eq!(relative_slash(Path::new("/go/src"), Path::new("/go/src")), "");
    }

    #[test]
    fn test_split_first_segment() {
        assert_eq!(split_first_segment("./pkg/sub"), (".", "pkg/sub"));
        assert_eq!(split_first_segment("."), (".", ""));
        assert_eq!(split_first_segment("github.com/me/x"), ("github.com", "me/x"));
    }

    #[test]
    fn test_absolute_input_is_rootless() {
        let dir = tempfile::tempdir().unwrap();
        let roots = RootSet::new().with("/nonexistent-root");
        let input = dir.path().to_str().unwrap();

        let resolved = PathResolver::new(&roots, "/").resolve(input).unwrap();
        assert_eq!(resolved.package_path, input);
        assert_eq!(resolved.dir, dir.path());
        assert!(!resolved.is_rooted());
    }

    #[test]
    fn test_missing_absolute_input_is_not_found() {
        let roots = RootSet::new().with("/r");
        let err = PathResolver::new(&roots, "/")
            .resolve("/definitely/not/here")
            .unwrap_err();
        assert!(err.is_not_found());
    }
}
