//! Build configuration: where to look for packages and which tags are set.

use std::env;
use std::path::PathBuf;

use super::roots::RootSet;
use crate::syntax::BuildTags;

/// Roots, active build tags and working directory used by a
/// [`Loader`](super::Loader).
#[derive(Clone, Debug, Default)]
pub struct BuildContext {
    pub roots: RootSet,
    pub tags: BuildTags,
    /// Directory `./` inputs and relative roots are interpreted against;
    /// `None` means the process working directory.
    pub working_dir: Option<PathBuf>,
}

impl BuildContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context of a Go toolchain configured through the environment.
    ///
    /// Roots are `$GOROOT/src` and then `<entry>/src` for each `$GOPATH` entry
    /// (`~/go` when unset). Tags are `$GOOS` and `$GOARCH` (host values when
    /// unset), `gc`, `cgo` when `CGO_ENABLED=1`, and any `-tags=` in `$GOFLAGS`.
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok().filter(|value| !value.is_empty()))
    }

    /// [`from_env`](Self::from_env) over an arbitrary variable lookup.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut roots = RootSet::new();
        if let Some(goroot) = var("GOROOT") {
            roots.insert(PathBuf::from(goroot).join("src"));
        }
        match var("GOPATH") {
            Some(gopath) => {
                roots.extend(env::split_paths(&gopath).map(|entry| entry.join("src")));
            }
            None => {
                if let Some(home) = dirs::home_dir() {
                    roots.insert(home.join("go").join("src"));
                }
            }
        }

        let mut tags = BuildTags::new();
        tags.insert(var("GOOS").unwrap_or_else(|| host_os().to_string()));
        tags.insert(var("GOARCH").unwrap_or_else(|| host_arch().to_string()));
        tags.insert("gc");
        if var("CGO_ENABLED").as_deref() == Some("1") {
            tags.insert("cgo");
        }
        if let Some(goflags) = var("GOFLAGS") {
            tags.extend(flag_tags(&goflags));
        }

        Self {
            roots,
            tags,
            working_dir: None,
        }
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.roots.insert(root);
        self
    }

    pub fn with_roots(mut self, roots: RootSet) -> Self {
        self.roots = roots;
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag);
        self
    }

    pub fn with_tags(mut self, tags: BuildTags) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

/// Tags from `-tags=a,b` fields of a `GOFLAGS` value.
fn flag_tags(goflags: &str) -> Vec<String> {
    goflags
        .split_whitespace()
        .filter_map(|flag| {
            flag.strip_prefix("--tags=")
                .or_else(|| flag.strip_prefix("-tags="))
        })
        .flat_map(|list| list.split(','))
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

/// Go's name for the host operating system.
fn host_os() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Go's name for the host architecture.
fn host_arch() -> &'static str {
    match env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "x86" => "386",
        "powerpc64" => "ppc64",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::Path;

    fn context(vars: &[(&str, &str)]) -> BuildContext {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BuildContext::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_roots_from_goroot_and_gopath() {
        let ctx = context(&[("GOROOT", "/usr/local/go"), ("GOPATH", "/work/go")]);
        assert_eq!(
            ctx.roots.iter().collect::<Vec<_>>(),
            [Path::new("/usr/local/go/src"), Path::new("/work/go/src")]
        );
    }

    #[test]
    fn test_tags_from_environment() {
        let ctx = context(&[
            ("GOOS", "linux"),
            ("GOARCH", "arm64"),
            ("CGO_ENABLED", "1"),
            ("GOFLAGS", "-mod=mod -tags=integration,debug"),
        ]);
        for tag in ["linux", "arm64", "gc", "cgo", "integration", "debug"] {
            assert!(ctx.tags.contains(tag), "missing {tag}");
        }
        assert_eq!(ctx.tags.len(), 6);
    }

    #[test]
    fn test_host_defaults() {
        let ctx = context(&[("GOPATH", "/work/go")]);
        assert!(ctx.tags.contains(host_os()));
        assert!(ctx.tags.contains(host_arch()));
        assert!(!ctx.tags.contains("cgo"));
    }

    #[test]
    fn test_builder() {
        let ctx = BuildContext::new()
            .with_root("/a")
            .with_root("/b")
            .with_tag("linux")
            .with_working_dir("/a/x");
        assert_eq!(ctx.roots.len(), 2);
        assert!(ctx.tags.contains("linux"));
        assert_eq!(ctx.working_dir.as_deref(), Some(Path::new("/a/x")));
    }
}
