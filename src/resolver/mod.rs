// src/resolver/mod.rs

//! Download orchestration with build dependency discovery
//!
//! Requested names are processed from a worklist. Each name is visited at
//! most once: a name found in a local binary repository is recorded as
//! satisfied locally and never fetched; anything else is looked up in the
//! AUR, downloaded and unpacked. With recursive depth the unpacked PKGBUILD
//! is read and every dependency not seen before is appended to the end of
//! the worklist. Since names are only appended once, the walk terminates on
//! any dependency graph, cyclic or not.

use crate::error::{PackageFailure, Result};
use crate::filesystem;
use crate::packages::pkgbuild;
use crate::repository::{ArchiveFetcher, LocalIndex, RemoteIndex};
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Do not download anything
pub const DEPTH_NONE: u8 = 0;

/// Download the requested packages only
pub const DEPTH_DIRECT: u8 = 1;

/// Also download build dependencies found in the AUR, recursively
pub const DEPTH_RECURSIVE: u8 = 2;

/// Outcome buckets of a resolution run, sorted by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionResult {
    pub fetched: BTreeSet<String>,
    pub satisfied_locally: BTreeSet<String>,
}

/// Everything a resolution run produced
#[derive(Debug, Default)]
pub struct ResolutionReport {
    pub result: ResolutionResult,
    /// Per-package failures in the order they happened
    pub failures: Vec<PackageFailure>,
    /// Directory the packages were unpacked into
    pub target_dir: PathBuf,
}

impl ResolutionReport {
    pub fn is_empty(&self) -> bool {
        self.result.fetched.is_empty() && self.result.satisfied_locally.is_empty()
    }
}

/// Drives fetching of AUR packages and their dependencies
pub struct Resolver<'a> {
    remote: &'a dyn RemoteIndex,
    local: &'a dyn LocalIndex,
    fetcher: &'a dyn ArchiveFetcher,
    target_dir: PathBuf,
}

impl<'a> Resolver<'a> {
    pub fn new(
        remote: &'a dyn RemoteIndex,
        local: &'a dyn LocalIndex,
        fetcher: &'a dyn ArchiveFetcher,
        target_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            remote,
            local,
            fetcher,
            target_dir: target_dir.into(),
        }
    }

    /// Resolve and download `requested` into the target directory
    ///
    /// Fails as a whole only when the target directory is unusable; errors
    /// for individual packages are collected in the report.
    pub fn resolve(
        &self,
        requested: &[String],
        depth: u8,
        overwrite: bool,
    ) -> Result<ResolutionReport> {
        let target_dir = filesystem::ensure_target_dir(&self.target_dir)?;
        let mut report = ResolutionReport {
            target_dir: target_dir.clone(),
            ..Default::default()
        };

        if depth == DEPTH_NONE {
            debug!("Dependency depth 0, nothing to download");
            return Ok(report);
        }

        // Every name ever queued; guards against duplicate visits and cycles
        let mut seen: HashSet<String> = HashSet::new();
        let mut worklist: Vec<String> = Vec::new();
        for name in requested {
            if seen.insert(name.clone()) {
                worklist.push(name.clone());
            }
        }

        let mut cursor = 0;
        while cursor < worklist.len() {
            let name = worklist[cursor].clone();
            cursor += 1;

            if report.result.satisfied_locally.contains(&name) {
                continue;
            }

            if let Some(repo) = self.local.is_locally_available(&name) {
                info!("{} is available in {}", name, repo);
                report.result.satisfied_locally.insert(name);
                continue;
            }

            let root = match self.fetch_one(&name, &target_dir, overwrite) {
                Ok(root) => root,
                Err(error) => {
                    warn!("Failed to fetch {}: {}", name, error);
                    report.failures.push(PackageFailure::new(name, error));
                    continue;
                }
            };
            report.result.fetched.insert(name.clone());

            if depth >= DEPTH_RECURSIVE {
                for dep in self.recipe_dependencies(&name, &target_dir.join(&root)) {
                    if seen.insert(dep.clone()) {
                        debug!("Queueing {} (dependency of {})", dep, name);
                        worklist.push(dep);
                    }
                }
            }
        }

        info!(
            "Resolved {} names: {} fetched, {} in sync repositories, {} failed",
            worklist.len(),
            report.result.fetched.len(),
            report.result.satisfied_locally.len(),
            report.failures.len()
        );
        Ok(report)
    }

    fn fetch_one(&self, name: &str, target_dir: &Path, overwrite: bool) -> Result<String> {
        let meta = self.remote.fetch_metadata(name)?;
        debug!("Fetching {} {} from {}", meta.name, meta.version_release, meta.download_path);
        self.fetcher
            .fetch_and_extract(&meta.download_path, target_dir, overwrite)
    }

    /// Dependencies declared in an unpacked package's PKGBUILD
    fn recipe_dependencies(&self, name: &str, package_dir: &Path) -> Vec<String> {
        let recipe = package_dir.join("PKGBUILD");
        match pkgbuild::read_dependencies(&recipe) {
            Ok(deps) => deps,
            Err(e) => {
                warn!("Could not read dependencies of {} from {}: {}", name, recipe.display(), e);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::repository::{RemoteMetadata, SyncDatabase};
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory AUR whose snapshots are PKGBUILD strings
    struct FakeAur {
        recipes: HashMap<String, String>,
        fetches: RefCell<Vec<String>>,
    }

    impl FakeAur {
        fn new(recipes: &[(&str, &str)]) -> Self {
            Self {
                recipes: recipes
                    .iter()
                    .map(|(n, r)| (n.to_string(), r.to_string()))
                    .collect(),
                fetches: RefCell::new(Vec::new()),
            }
        }
    }

    impl RemoteIndex for FakeAur {
        fn fetch_metadata(&self, name: &str) -> Result<RemoteMetadata> {
            if self.recipes.contains_key(name) {
                Ok(RemoteMetadata::new(name, "1.0-1"))
            } else {
                Err(Error::NotFound(name.to_string()))
            }
        }

        fn search(&self, _query: &str) -> Result<Vec<RemoteMetadata>> {
            Ok(Vec::new())
        }
    }

    impl ArchiveFetcher for FakeAur {
        fn fetch_and_extract(
            &self,
            download_path: &str,
            dest_dir: &Path,
            overwrite: bool,
        ) -> Result<String> {
            let file = download_path.rsplit('/').next().unwrap();
            let name = file.trim_end_matches(".tar.gz");
            filesystem::check_targets(dest_dir, name, overwrite)?;
            self.fetches.borrow_mut().push(name.to_string());

            let dir = dest_dir.join(name);
            std::fs::create_dir_all(&dir)?;
            std::fs::write(dir.join("PKGBUILD"), &self.recipes[name])?;
            Ok(name.to_string())
        }
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn set(list: &[&str]) -> BTreeSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_direct_depth_reports_only_requested_names() {
        // depth 1 never opens the PKGBUILD, so `bar` is not reported as local
        let dir = tempfile::tempdir().unwrap();
        let aur = FakeAur::new(&[("foo", "depends=(bar baz)"), ("baz", "")]);
        let local = SyncDatabase::from_entries([("bar", "extra")]);
        let resolver = Resolver::new(&aur, &local, &aur, dir.path());

        let report = resolver.resolve(&names(&["foo"]), DEPTH_DIRECT, false).unwrap();

        assert_eq!(report.result.fetched, set(&["foo"]));
        assert!(report.result.satisfied_locally.is_empty());
        assert_eq!(*aur.fetches.borrow(), vec!["foo".to_string()]);

        // a requested name found locally is still reported at depth 1
        let report = resolver
            .resolve(&names(&["bar"]), DEPTH_DIRECT, false)
            .unwrap();
        assert!(report.result.fetched.is_empty());
        assert_eq!(report.result.satisfied_locally, set(&["bar"]));
    }

    #[test]
    fn test_recursive_download() {
        let dir = tempfile::tempdir().unwrap();
        let aur = FakeAur::new(&[("foo", "depends=(bar baz)"), ("baz", "")]);
        let local = SyncDatabase::from_entries([("bar", "extra")]);
        let resolver = Resolver::new(&aur, &local, &aur, dir.path());

        let report = resolver
            .resolve(&names(&["foo"]), DEPTH_RECURSIVE, false)
            .unwrap();

        assert_eq!(report.result.fetched, set(&["baz", "foo"]));
        assert_eq!(report.result.satisfied_locally, set(&["bar"]));
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let aur = FakeAur::new(&[("a", "depends=(b)"), ("b", "makedepends=(a)")]);
        let local = SyncDatabase::default();
        let resolver = Resolver::new(&aur, &local, &aur, dir.path());

        let report = resolver.resolve(&names(&["a"]), DEPTH_RECURSIVE, false).unwrap();

        assert_eq!(report.result.fetched, set(&["a", "b"]));
        assert_eq!(*aur.fetches.borrow(), names(&["a", "b"]));
    }

    #[test]
    fn test_duplicate_requests_visit_once() {
        let dir = tempfile::tempdir().unwrap();
        let aur = FakeAur::new(&[("foo", "")]);
        let local = SyncDatabase::from_entries([("bar", "core")]);
        let resolver = Resolver::new(&aur, &local, &aur, dir.path());

        let report = resolver
            .resolve(&names(&["foo", "bar", "foo", "bar"]), DEPTH_DIRECT, false)
            .unwrap();

        assert_eq!(report.result.fetched, set(&["foo"]));
        assert_eq!(report.result.satisfied_locally, set(&["bar"]));
        assert_eq!(aur.fetches.borrow().len(), 1);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_local_package_never_fetched() {
        let dir = tempfile::tempdir().unwrap();
        // "bar" exists in the AUR too, but the binary repository wins
        let aur = FakeAur::new(&[("foo", "depends=(bar)"), ("bar", "")]);
        let local = SyncDatabase::from_entries([("bar", "community")]);
        let resolver = Resolver::new(&aur, &local, &aur, dir.path());

        let report = resolver
            .resolve(&names(&["foo", "bar"]), DEPTH_RECURSIVE, false)
            .unwrap();

        assert_eq!(report.result.fetched, set(&["foo"]));
        assert_eq!(report.result.satisfied_locally, set(&["bar"]));
        assert!(!aur.fetches.borrow().contains(&"bar".to_string()));
    }

    #[test]
    fn test_not_found_does_not_abort() {
        let dir = tempfile::tempdir().unwrap();
        let aur = FakeAur::new(&[("foo", "")]);
        let local = SyncDatabase::default();
        let resolver = Resolver::new(&aur, &local, &aur, dir.path());

        let report = resolver
            .resolve(&names(&["missing", "foo"]), DEPTH_DIRECT, false)
            .unwrap();

        assert_eq!(report.result.fetched, set(&["foo"]));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].name, "missing");
        assert!(report.failures[0].error.is_not_found());
    }

    #[test]
    fn test_existing_target_is_per_package_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("foo")).unwrap();
        let aur = FakeAur::new(&[("foo", ""), ("bar", "")]);
        let local = SyncDatabase::default();
        let resolver = Resolver::new(&aur, &local, &aur, dir.path());

        let report = resolver
            .resolve(&names(&["foo", "bar"]), DEPTH_DIRECT, false)
            .unwrap();
        assert_eq!(report.result.fetched, set(&["bar"]));
        assert!(matches!(report.failures[0].error, Error::TargetExists(_)));

        let forced = resolver.resolve(&names(&["foo"]), DEPTH_DIRECT, true).unwrap();
        assert_eq!(forced.result.fetched, set(&["foo"]));
    }

    #[test]
    fn test_depth_none_downloads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let aur = FakeAur::new(&[("foo", "")]);
        let local = SyncDatabase::default();
        let resolver = Resolver::new(&aur, &local, &aur, dir.path());

        let report = resolver.resolve(&names(&["foo"]), DEPTH_NONE, false).unwrap();
        assert!(report.is_empty());
        assert!(aur.fetches.borrow().is_empty());
    }

    #[test]
    fn test_unusable_target_dir_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let aur = FakeAur::new(&[("foo", "")]);
        let local = SyncDatabase::default();
        let resolver = Resolver::new(&aur, &local, &aur, dir.path().join("nope"));

        let result = resolver.resolve(&names(&["foo"]), DEPTH_DIRECT, false);
        assert!(matches!(result, Err(Error::TargetDir(_))));
    }
}
