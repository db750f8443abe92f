use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::{DirEntry, WalkDir};

use crate::manifest::{MANIFEST_FILE, Manifest, Scripts};

/// Directory names the scanner never descends into.
pub const SKIPPED_DIRS: [&str; 2] = ["node_modules", ".git"];

/// A directory holding a runnable manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub path: PathBuf,
    pub scripts: Scripts,
}

/// Projects found under one configured root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootResult {
    pub root: PathBuf,
    pub items: Vec<Project>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Maximum directory depth below the root; `None` walks the whole tree.
    pub max_depth: Option<usize>,
}

/// Depth-first project discovery over a directory tree.
///
/// Recursion continues below a directory that already qualified as a
/// project, so nested packages in a monorepo are reported as their own
/// entries alongside the enclosing one.
pub struct Scanner {
    options: ScanOptions,
}

impl Scanner {
    pub fn new(options: ScanOptions) -> Self {
        Scanner { options }
    }

    /// Walk `root` and return its runnable projects in traversal order.
    ///
    /// Never fails: an unreadable root yields an empty list, and an entry
    /// that cannot be read or stat'ed (a dangling link, a symlink loop, a
    /// permission error) only drops that branch.
    pub fn scan(&self, root: &Path) -> Vec<Project> {
        // Symlinked directories are followed; walkdir reports loops as errors.
        let mut walker = WalkDir::new(root).follow_links(true).sort_by_file_name();
        if let Some(max) = self.options.max_depth {
            // Manifests sit one level below the deepest directory entered.
            walker = walker.max_depth(max.saturating_add(1));
        }

        let mut projects = Vec::new();
        for entry in walker.into_iter().filter_entry(|e| !is_skipped_dir(e)) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("skipping during scan of {}: {e}", root.display());
                    continue;
                }
            };
            if entry.file_type().is_file() && entry.file_name() == MANIFEST_FILE {
                if let Some(dir) = entry.path().parent() {
                    projects.extend(consider_manifest(dir, entry.path()));
                }
            }
        }
        tracing::debug!("scan of {} found {} project(s)", root.display(), projects.len());
        projects
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && SKIPPED_DIRS.iter().any(|name| entry.file_name() == *name)
}

fn consider_manifest(dir: &Path, manifest_path: &Path) -> Option<Project> {
    let manifest = match Manifest::read(manifest_path) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("failed to parse {}: {e}", manifest_path.display());
            return None;
        }
    };
    if !manifest.is_runnable() {
        return None;
    }
    Some(Project {
        name: project_name(dir),
        path: dir.to_path_buf(),
        scripts: manifest.scripts,
    })
}

/// Scan a single root with default options.
pub fn scan(root: &Path) -> Vec<Project> {
    Scanner::new(ScanOptions::default()).scan(root)
}

/// Scan every root in order. Roots that do not exist are left out entirely.
pub fn scan_roots(roots: &[PathBuf], options: ScanOptions) -> Vec<RootResult> {
    let scanner = Scanner::new(options);
    roots
        .iter()
        .filter(|root| {
            let exists = root.exists();
            if !exists {
                tracing::info!("skipping missing root {}", root.display());
            }
            exists
        })
        .map(|root| RootResult {
            root: root.clone(),
            items: scanner.scan(root),
        })
        .collect()
}

fn project_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| dir.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, json: &str) {
        fs::create_dir_all(dir).expect("create dir");
        fs::write(dir.join(MANIFEST_FILE), json).expect("write manifest");
    }

    fn paths(projects: &[Project]) -> Vec<PathBuf> {
        projects.iter().map(|p| p.path.clone()).collect()
    }

    #[test]
    fn node_modules_is_not_descended() {
        let tmp = TempDir::new().expect("tempdir");
        let app = tmp.path().join("app");
        write_manifest(&app, r#"{"scripts": {"start": "x"}}"#);
        write_manifest(&app.join("node_modules/pkg"), r#"{"scripts": {"start": "y"}}"#);

        let found = scan(tmp.path());
        assert_eq!(paths(&found), vec![app]);
        assert_eq!(found[0].name, "app");
    }

    #[test]
    fn git_dir_is_not_descended() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(&tmp.path().join(".git/hooks"), r#"{"scripts": {"dev": "x"}}"#);
        assert!(scan(tmp.path()).is_empty());
    }

    #[test]
    fn skipped_names_only_apply_to_directories() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"scripts": {"dev": "x"}}"#);
        fs::write(tmp.path().join("node_modules"), "not a dir").expect("write file");
        assert_eq!(scan(tmp.path()).len(), 1);
    }

    #[test]
    fn manifests_without_runnable_scripts_are_excluded() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(&tmp.path().join("lib"), r#"{"scripts": {"build": "tsc", "test": "jest"}}"#);
        write_manifest(&tmp.path().join("empty"), r#"{"scripts": {}}"#);
        write_manifest(&tmp.path().join("none"), r#"{"name": "none"}"#);
        assert!(scan(tmp.path()).is_empty());
    }

    #[test]
    fn malformed_manifest_is_skipped_not_fatal() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(&tmp.path().join("broken"), "{ not json");
        write_manifest(&tmp.path().join("good"), r#"{"scripts": {"predev": "x"}}"#);
        assert_eq!(paths(&scan(tmp.path())), vec![tmp.path().join("good")]);
    }

    #[test]
    fn nested_projects_are_reported_separately() {
        let tmp = TempDir::new().expect("tempdir");
        let outer = tmp.path().join("mono");
        let inner = outer.join("packages/web");
        write_manifest(&outer, r#"{"scripts": {"dev": "turbo dev"}}"#);
        write_manifest(&inner, r#"{"scripts": {"start": "vite"}}"#);

        assert_eq!(paths(&scan(tmp.path())), vec![outer, inner]);
    }

    #[test]
    fn scanning_twice_is_identical() {
        let tmp = TempDir::new().expect("tempdir");
        for name in ["c", "a", "b/inner", "b"] {
            write_manifest(&tmp.path().join(name), r#"{"scripts": {"serve": "x"}}"#);
        }
        let first = scan(tmp.path());
        let second = scan(tmp.path());
        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
    }

    #[test]
    fn scripts_are_carried_on_the_project() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(tmp.path(), r#"{"scripts": {"build": "tsc", "start": "node ."}}"#);
        let found = scan(tmp.path());
        assert_eq!(found[0].scripts.len(), 2);
        assert_eq!(found[0].scripts["start"], "node .");
    }

    #[test]
    fn missing_root_yields_empty() {
        let tmp = TempDir::new().expect("tempdir");
        assert!(scan(&tmp.path().join("nope")).is_empty());
    }

    #[test]
    fn max_depth_limits_recursion() {
        let tmp = TempDir::new().expect("tempdir");
        write_manifest(&tmp.path().join("a"), r#"{"scripts": {"dev": "x"}}"#);
        write_manifest(&tmp.path().join("a/b/c"), r#"{"scripts": {"dev": "x"}}"#);
        let found = Scanner::new(ScanOptions { max_depth: Some(1) }).scan(tmp.path());
        assert_eq!(paths(&found), vec![tmp.path().join("a")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_cycles_terminate() {
        let tmp = TempDir::new().expect("tempdir");
        let app = tmp.path().join("app");
        write_manifest(&app, r#"{"scripts": {"start": "x"}}"#);
        std::os::unix::fs::symlink(tmp.path(), app.join("loop")).expect("symlink");
        assert_eq!(paths(&scan(tmp.path())), vec![app]);
    }

    #[cfg(unix)]
    #[test]
    fn dangling_link_drops_only_that_entry() {
        let tmp = TempDir::new().expect("tempdir");
        std::os::unix::fs::symlink(tmp.path().join("gone"), tmp.path().join("a_dangling"))
            .expect("symlink");
        let b = tmp.path().join("b");
        write_manifest(&b, r#"{"scripts": {"dev": "x"}}"#);
        assert_eq!(paths(&scan(tmp.path())), vec![b]);
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_dir_drops_only_that_branch() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().expect("tempdir");
        let locked = tmp.path().join("a_locked");
        write_manifest(&locked.join("inner"), r#"{"scripts": {"dev": "x"}}"#);
        let b = tmp.path().join("b");
        write_manifest(&b, r#"{"scripts": {"dev": "x"}}"#);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).expect("chmod");

        let found = scan(tmp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).expect("chmod back");
        // root ignores permission bits, so only require that b survives
        assert!(paths(&found).contains(&b));
        assert_eq!(found.last().map(|p| p.path.clone()), Some(b));
    }

    // -----------------------------------------------------------------------
    // scan_roots
    // -----------------------------------------------------------------------

    #[test]
    fn roots_keep_configured_order_and_drop_missing() {
        let one = TempDir::new().expect("tempdir");
        let two = TempDir::new().expect("tempdir");
        write_manifest(one.path(), r#"{"scripts": {"start": "x"}}"#);
        let roots = vec![
            two.path().to_path_buf(),
            one.path().join("missing"),
            one.path().to_path_buf(),
        ];

        let results = scan_roots(&roots, ScanOptions::default());
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].root, two.path());
        assert!(results[0].items.is_empty());
        assert_eq!(results[1].root, one.path());
        assert_eq!(results[1].items.len(), 1);
    }
}
