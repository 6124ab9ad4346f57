// tests/integration_test.rs

//! Integration tests for Slurpy
//!
//! These tests run the download and update flows end to end against an
//! in-memory AUR that serves real gzip snapshots.

use flate2::Compression as GzLevel;
use flate2::write::GzEncoder;
use slurpy::filesystem::{self, Compression};
use slurpy::packages::InstalledPackage;
use slurpy::repository::{ArchiveFetcher, RemoteIndex, RemoteMetadata, SyncDatabase};
use slurpy::resolver::{DEPTH_DIRECT, DEPTH_RECURSIVE, Resolver};
use slurpy::updates::detect_updates;
use slurpy::{Error, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Mutex;
use tempfile::TempDir;

/// AUR double: package name → (version, PKGBUILD)
struct FakeAur {
    packages: HashMap<String, (String, String)>,
    downloads: Mutex<Vec<String>>,
}

impl FakeAur {
    fn new(packages: &[(&str, &str, &str)]) -> Self {
        Self {
            packages: packages
                .iter()
                .map(|(n, v, r)| (n.to_string(), (v.to_string(), r.to_string())))
                .collect(),
            downloads: Mutex::new(Vec::new()),
        }
    }

    fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }

    fn snapshot(&self, name: &str) -> Vec<u8> {
        let recipe = &self.packages[name].1;
        let encoder = GzEncoder::new(Vec::new(), GzLevel::default());
        let mut builder = tar::Builder::new(encoder);
        let mut header = tar::Header::new_gnu();
        header.set_size(recipe.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{}/PKGBUILD", name), recipe.as_bytes())
            .unwrap();
        builder.into_inner().unwrap().finish().unwrap()
    }
}

impl RemoteIndex for FakeAur {
    fn fetch_metadata(&self, name: &str) -> Result<RemoteMetadata> {
        match self.packages.get(name) {
            Some((version, _)) => Ok(RemoteMetadata::new(name, version.as_str())),
            None => Err(Error::NotFound(name.to_string())),
        }
    }

    fn search(&self, query: &str) -> Result<Vec<RemoteMetadata>> {
        Ok(self
            .packages
            .iter()
            .filter(|(n, _)| n.contains(query))
            .map(|(n, (v, _))| RemoteMetadata::new(n.as_str(), v.as_str()))
            .collect())
    }
}

impl ArchiveFetcher for FakeAur {
    fn fetch_and_extract(&self, download_path: &str, dest_dir: &Path, overwrite: bool) -> Result<String> {
        let file_name = download_path.rsplit('/').next().unwrap_or(download_path);
        let (stem, compression) = filesystem::archive_stem(file_name);
        filesystem::check_targets(dest_dir, &stem, overwrite)?;

        let archive = dest_dir.join(file_name);
        std::fs::write(&archive, self.snapshot(&stem))?;
        let root = filesystem::extract_archive(&archive, compression, dest_dir);
        std::fs::remove_file(&archive)?;

        self.downloads.lock().unwrap().push(stem.clone());
        Ok(root?.unwrap_or(stem))
    }
}

/// Sync directory with a legacy `extra/` database containing `names`
fn sync_dir(names: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for name in names {
        std::fs::create_dir_all(dir.path().join("extra").join(format!("{}-1.0-1", name))).unwrap();
    }
    dir
}

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn request(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn sample_aur() -> FakeAur {
    FakeAur::new(&[
        ("foo", "1.0-1", "pkgname=foo\ndepends=('bar' 'baz>=2')\n"),
        ("baz", "2.1-1", "pkgname=baz\nmakedepends=('qux')\n"),
        ("qux", "0.1-1", "pkgname=qux\n"),
        ("cycle-a", "1-1", "depends=(cycle-b)\n"),
        ("cycle-b", "1-1", "depends=(cycle-a)\n"),
    ])
}

#[test]
fn test_direct_download_ignores_recipe_dependencies() {
    let aur = sample_aur();
    let sync = sync_dir(&["bar"]);
    let local = SyncDatabase::load(sync.path(), &request(&["extra"])).unwrap();
    let target = tempfile::tempdir().unwrap();

    let resolver = Resolver::new(&aur, &local, &aur, target.path());
    let report = resolver.resolve(&request(&["foo"]), DEPTH_DIRECT, false).unwrap();

    assert_eq!(report.result.fetched, set(&["foo"]));
    assert!(report.result.satisfied_locally.is_empty());
    assert!(target.path().join("foo").join("PKGBUILD").is_file());
    assert!(!target.path().join("foo.tar.gz").exists());
}

#[test]
fn test_recursive_download_end_to_end() {
    let aur = sample_aur();
    let sync = sync_dir(&["bar"]);
    let local = SyncDatabase::load(sync.path(), &request(&["extra"])).unwrap();
    let target = tempfile::tempdir().unwrap();

    let resolver = Resolver::new(&aur, &local, &aur, target.path());
    let report = resolver
        .resolve(&request(&["foo"]), DEPTH_RECURSIVE, false)
        .unwrap();

    assert_eq!(report.result.fetched, set(&["baz", "foo", "qux"]));
    assert_eq!(report.result.satisfied_locally, set(&["bar"]));
    assert!(report.failures.is_empty());
    assert_eq!(aur.downloads(), request(&["foo", "baz", "qux"]));
}

#[test]
fn test_unknown_package_does_not_abort_run() {
    let aur = sample_aur();
    let local = SyncDatabase::default();
    let target = tempfile::tempdir().unwrap();

    let resolver = Resolver::new(&aur, &local, &aur, target.path());
    let report = resolver
        .resolve(&request(&["nope", "qux"]), DEPTH_RECURSIVE, false)
        .unwrap();

    assert_eq!(report.result.fetched, set(&["qux"]));
    assert_eq!(report.failures.len(), 1);
    assert!(report.failures[0].error.is_not_found());
}

#[test]
fn test_cyclic_dependencies_terminate() {
    let aur = sample_aur();
    let local = SyncDatabase::default();
    let target = tempfile::tempdir().unwrap();

    let resolver = Resolver::new(&aur, &local, &aur, target.path());
    let report = resolver
        .resolve(&request(&["cycle-a"]), DEPTH_RECURSIVE, false)
        .unwrap();

    assert_eq!(report.result.fetched, set(&["cycle-a", "cycle-b"]));
    assert_eq!(aur.downloads().len(), 2);
}

#[test]
fn test_repeated_download_needs_force() {
    let aur = sample_aur();
    let local = SyncDatabase::default();
    let target = tempfile::tempdir().unwrap();
    let resolver = Resolver::new(&aur, &local, &aur, target.path());

    resolver.resolve(&request(&["qux"]), DEPTH_DIRECT, false).unwrap();

    let again = resolver.resolve(&request(&["qux"]), DEPTH_DIRECT, false).unwrap();
    assert!(again.result.fetched.is_empty());
    assert!(matches!(again.failures[0].error, Error::TargetExists(_)));

    let forced = resolver.resolve(&request(&["qux"]), DEPTH_DIRECT, true).unwrap();
    assert_eq!(forced.result.fetched, set(&["qux"]));
}

#[test]
fn test_missing_target_directory_is_fatal() {
    let aur = sample_aur();
    let local = SyncDatabase::default();
    let target = tempfile::tempdir().unwrap();
    let resolver = Resolver::new(&aur, &local, &aur, target.path().join("missing"));

    let result = resolver.resolve(&request(&["qux"]), DEPTH_DIRECT, false);
    assert!(matches!(result, Err(Error::TargetDir(_))));
    assert!(aur.downloads().is_empty());
}

#[test]
fn test_update_then_download() {
    let aur = sample_aur();
    let installed = vec![
        InstalledPackage::new("foo", "1.0-1"),
        InstalledPackage::new("baz", "2.0-3"),
        InstalledPackage::new("qux", "0.1-1"),
        InstalledPackage::new("local-only", "1.0-1"),
    ];

    let updates = detect_updates(&aur, &installed);
    assert_eq!(updates.names(), request(&["baz"]));
    assert_eq!(updates.updates[0].installed_version, "2.0-3");
    assert!(updates.failures.is_empty());

    let local = SyncDatabase::default();
    let target = tempfile::tempdir().unwrap();
    let resolver = Resolver::new(&aur, &local, &aur, target.path());
    let report = resolver
        .resolve(&updates.names(), DEPTH_RECURSIVE, false)
        .unwrap();
    assert_eq!(report.result.fetched, set(&["baz", "qux"]));
}

#[test]
fn test_snapshot_helpers_agree_on_gzip() {
    let (stem, compression) = filesystem::archive_stem("foo.tar.gz");
    assert_eq!(stem, "foo");
    assert_eq!(compression, Compression::Gzip);
}
