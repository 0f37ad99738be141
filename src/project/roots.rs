//! The ordered set of directories import paths are resolved under.

use std::path::{Path, PathBuf};

use indexmap::IndexSet;

/// Root directories in search order, without duplicates.
///
/// The first root that contains a package wins, so insertion order matters.
/// Inserting a root that is already present keeps its original position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RootSet {
    roots: IndexSet<PathBuf>,
}

impl RootSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `root` unless already present; returns whether it was added.
    pub fn insert(&mut self, root: impl Into<PathBuf>) -> bool {
        self.roots.insert(root.into())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, root: impl Into<PathBuf>) -> Self {
        self.insert(root);
        self
    }

    pub fn contains(&self, root: &Path) -> bool {
        self.roots.contains(root)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.roots.iter().map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn to_vec(&self) -> Vec<PathBuf> {
        self.roots.iter().cloned().collect()
    }
}

impl<P: Into<PathBuf>> FromIterator<P> for RootSet {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self {
            roots: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<P: Into<PathBuf>> Extend<P> for RootSet {
    fn extend<I: IntoIterator<Item = P>>(&mut self, iter: I) {
        self.roots.extend(iter.into_iter().map(Into::into));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_set_keeps_first_position() {
        let mut roots = RootSet::new();

        assert!(roots.insert("/go/src"));
        assert!(roots.insert("/work/src"));
        assert!(!roots.insert("/go/src"));

        assert_eq!(roots.len(), 2);
        assert_eq!(
            roots.iter().collect::<Vec<_>>(),
            [Path::new("/go/src"), Path::new("/work/src")]
        );
    }

    #[test]
    fn test_root_set_from_iter() {
        let roots: RootSet = ["/a", "/b", "/a"].into_iter().collect();
        assert_eq!(roots.to_vec(), [PathBuf::from("/a"), PathBuf::from("/b")]);
        assert!(roots.contains(Path::new("/b")));
    }
}
