//! Position table shared by the files of one scan.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::base::{FileId, LineCol, LineIndex, Position, TextSize};

/// Assigns [`FileId`]s to paths and keeps each file's text and line index.
///
/// Ids are handed out sequentially in the order paths are first seen, so a
/// scan that registers its listing before parsing gets ids in listing order.
/// One `FileSet` is created per `open` and shared (behind an `Arc`) by every
/// package produced from it.
#[derive(Debug, Default)]
pub struct FileSet {
    inner: RwLock<FileSetInner>,
}

#[derive(Debug, Default)]
struct FileSetInner {
    path_to_id: IndexMap<PathBuf, FileId>,
    id_to_path: IndexMap<FileId, PathBuf>,
    contents: IndexMap<FileId, (Arc<str>, LineIndex)>,
    next_id: u32,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of `path`, assigning the next free one on first sight.
    pub fn file_id(&self, path: &Path) -> FileId {
        {
            let inner = self.inner.read();
            if let Some(&id) = inner.path_to_id.get(path) {
                return id;
            }
        }

        let mut inner = self.inner.write();
        // another writer may have won the race
        if let Some(&id) = inner.path_to_id.get(path) {
            return id;
        }

        let id = FileId::new(inner.next_id);
        inner.next_id += 1;
        inner.path_to_id.insert(path.to_owned(), id);
        inner.id_to_path.insert(id, path.to_owned());
        id
    }

    pub fn path(&self, file: FileId) -> Option<PathBuf> {
        self.inner.read().id_to_path.get(&file).cloned()
    }

    /// Stores the text of `file` and indexes its lines.
    pub fn set_contents(&self, file: FileId, contents: impl Into<Arc<str>>) {
        let contents = contents.into();
        let index = LineIndex::new(&contents);
        self.inner.write().contents.insert(file, (contents, index));
    }

    pub fn contents(&self, file: FileId) -> Option<Arc<str>> {
        self.inner
            .read()
            .contents
            .get(&file)
            .map(|(text, _)| Arc::clone(text))
    }

    /// Line and column of `offset`, if the file's contents are known.
    pub fn line_col(&self, file: FileId, offset: TextSize) -> Option<LineCol> {
        self.inner
            .read()
            .contents
            .get(&file)
            .map(|(_, index)| index.line_col(offset))
    }

    pub fn position(&self, file: FileId, offset: TextSize) -> Option<Position> {
        let line_col = self.line_col(file, offset)?;
        Some(Position {
            file,
            offset,
            line_col,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.read().path_to_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every registered id, in assignment order.
    pub fn files(&self) -> Vec<FileId> {
        self.inner.read().id_to_path.keys().copied().collect()
    }
}
