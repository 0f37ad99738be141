//! Foundation types shared by every layer:
//! - [`FileId`] - handles for scanned files
//! - [`TextRange`], [`TextSize`] - byte ranges inside a file
//! - [`LineCol`], [`LineIndex`], [`Position`] - human-facing positions
//!
//! This module has NO dependencies on other gosrc modules.

mod file_id;
mod span;

pub use file_id::FileId;
pub use span::{LineCol, LineIndex, Position, TextRange, TextSize};

pub use text_size;
