//! Finding, scanning and loading packages from the filesystem.

mod context;
mod loader;
mod resolve;
mod roots;
mod scan;

pub use context::BuildContext;
pub use loader::{Loader, OpenOptions};
pub use resolve::{CanonicalPackageRef, PathResolver};
pub use roots::RootSet;
pub use scan::scan_dir;
