//! File identifiers handed out by a [`FileSet`](crate::hir::FileSet).

use std::fmt;

/// Handle for one parsed source file.
///
/// Ids are assigned sequentially by the `FileSet` that scanned the file, in
/// directory listing order. Two ids are only comparable when they come from
/// the same `FileSet`; within one set, ordering by id orders files the way the
/// scanner saw them.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct FileId(pub u32);

impl FileId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileId({})", self.0)
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "file#{}", self.0)
    }
}

impl From<u32> for FileId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}
