//! Identifiers for declarations inside a package.

use std::fmt;

use crate::base::FileId;

/// Identifies one struct type declaration of a package.
///
/// `local` is the position of the spec among the file's struct type specs in
/// source order (see [`SourceFile::struct_specs`](crate::syntax::SourceFile::struct_specs)).
/// The owning file is found by looking `file` up in the package, so ids stay
/// plain values that can be copied and compared freely.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RecordId {
    pub file: FileId,
    pub local: u32,
}

impl RecordId {
    #[inline]
    pub const fn new(file: FileId, local: u32) -> Self {
        Self { file, local }
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({:?}:{})", self.file, self.local)
    }
}
