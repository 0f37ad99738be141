//! Error types for package resolution and model queries.
//!
//! Every fallible operation in the crate returns [`Result`]. Variants carry the
//! path, package or record they concern so that the message is useful without
//! the caller adding context. Nothing here is retried or swallowed: the only
//! recovery the crate performs itself is the external-resolver fallback on
//! [`Error::NotFound`].

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::base::LineCol;
use crate::hir::TypeError;

/// Boxed error returned by caller-supplied collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// The input path did not resolve under any root.
    #[error("unable to find package with path '{input}' in {roots:?}")]
    NotFound { input: String, roots: Vec<PathBuf> },

    /// A stat, list or read failed.
    #[error("unable to access '{}': {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Malformed Go source or build-constraint line.
    #[error("cannot parse go file '{}'{}: {message}", path.display(), fmt_line_col(*line_col))]
    Parse {
        path: PathBuf,
        line_col: Option<LineCol>,
        message: String,
    },

    /// The type checker rejected one package's file group.
    #[error("unable to get type info of package '{package}' (in '{}'): {source}", dir.display())]
    TypeCheck {
        dir: PathBuf,
        package: String,
        #[source]
        source: TypeError,
    },

    /// A type query was made on a package opened with `files_only`.
    #[error("package '{package}' has no type information (opened files-only)")]
    MissingTypeInfo { package: String },

    /// A field's type expression has no entry in the package type map.
    #[error("unable to lookup type of field '{field}' of '{record}'")]
    TypeLookup { record: String, field: String },

    /// More than one method of the record carries the requested name.
    #[error("found more than one method of '{record}' with the same name '{method}': {count}")]
    AmbiguousMethod {
        record: String,
        method: String,
        count: usize,
    },

    /// The external resolver failed for a path outside every root.
    #[error("unable to import '{path}': {source}")]
    External {
        path: String,
        #[source]
        source: BoxError,
    },

    /// Importing for type resolution came back to a package still being checked.
    #[error("import cycle through '{path}'")]
    ImportCycle { path: String },

    /// One or more direct imports of a package could not be opened.
    #[error("unable to open {} import(s) of package '{package}'", failures.len())]
    Imports {
        package: String,
        failures: Vec<ImportFailure>,
    },
}

/// One failed import inside [`Error::Imports`].
#[derive(Debug)]
pub struct ImportFailure {
    pub path: String,
    pub error: Error,
}

impl Error {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn parse(
        path: impl Into<PathBuf>,
        line_col: Option<LineCol>,
        message: impl Into<String>,
    ) -> Self {
        Self::Parse {
            path: path.into(),
            line_col,
            message: message.into(),
        }
    }

    /// True for [`Error::NotFound`], the one error the loader can recover from.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

fn fmt_line_col(line_col: Option<LineCol>) -> String {
    line_col.map(|lc| format!(" at {lc}")).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_lists_roots() {
        let err = Error::NotFound {
            input: "nonexistent/pkg".into(),
            roots: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        };

        let message = err.to_string();
        assert!(message.contains("nonexistent/pkg"));
        assert!(message.contains("/a") && message.contains("/b"));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_error_mentions_position() {
        let err = Error::parse("/src/a.go", Some(LineCol::new(2, 4)), "syntax error");
        assert_eq!(
            err.to_string(),
            "cannot parse go file '/src/a.go' at 3:5: syntax error"
        );

        let err = Error::parse("/src/a.go", None, "missing package clause");
        assert_eq!(
            err.to_string(),
            "cannot parse go file '/src/a.go': missing package clause"
        );
    }
}
