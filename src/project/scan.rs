//! Directory scanning: list `.go` files and parse them.

use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::hir::FileSet;
use crate::syntax::{SourceFile, parse_source};

/// Parses every `.go` file of `dir`, and of its subdirectories when
/// `recursive`, in file name order.
///
/// File ids are taken from `file_set` in listing order before any file is
/// parsed, so ids are independent of parse scheduling. A `dir` naming a
/// regular file scans the file's directory. The first read or parse failure
/// aborts the scan.
pub fn scan_dir(file_set: &FileSet, dir: &Path, recursive: bool) -> Result<Vec<SourceFile>> {
    let metadata = fs::metadata(dir).map_err(|err| Error::filesystem(dir, err))?;
    if !metadata.is_dir() {
        let parent = dir.parent().unwrap_or(Path::new(""));
        return scan_dir(file_set, parent, recursive);
    }

    let paths = collect_go_files(dir, recursive)?;
    let ids: Vec<_> = paths.iter().map(|path| file_set.file_id(path)).collect();

    let files = paths
        .par_iter()
        .zip(ids)
        .map(|(path, id)| {
            let text = fs::read_to_string(path).map_err(|err| Error::filesystem(path, err))?;
            let file = parse_source(id, path, &text)?;
            file_set.set_contents(id, text);
            Ok(file)
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(dir = %dir.display(), recursive, files = files.len(), "scanned directory");
    Ok(files)
}

fn collect_go_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut walker = WalkDir::new(dir).min_depth(1).sort_by_file_name();
    if !recursive {
        walker = walker.max_depth(1);
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            Error::filesystem(path, err.into())
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == "go") {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}
