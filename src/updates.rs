// src/updates.rs

//! Detection of AUR updates for installed foreign packages

use crate::error::{Error, PackageFailure};
use crate::packages::InstalledPackage;
use crate::repository::{RemoteIndex, RemoteMetadata};
use crate::version::is_newer;
use rayon::prelude::*;
use tracing::{debug, info};

/// An installed package with a newer version in the AUR
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvailableUpdate {
    pub metadata: RemoteMetadata,
    pub installed_version: String,
}

impl AvailableUpdate {
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

#[derive(Debug, Default)]
pub struct UpdateReport {
    /// Updates in the order the packages were listed as installed
    pub updates: Vec<AvailableUpdate>,
    pub failures: Vec<PackageFailure>,
}

impl UpdateReport {
    /// Names of all packages with an update, for handing to the resolver
    pub fn names(&self) -> Vec<String> {
        self.updates.iter().map(|u| u.name().to_string()).collect()
    }
}

enum Check {
    Update(AvailableUpdate),
    Current,
    Failed(PackageFailure),
}

/// Compare every installed package against its AUR metadata
///
/// Lookups run in parallel. Packages unknown to the AUR are skipped
/// silently; any other lookup error is reported as a failure without
/// stopping the rest.
pub fn detect_updates<R>(remote: &R, installed: &[InstalledPackage]) -> UpdateReport
where
    R: RemoteIndex + Sync + ?Sized,
{
    debug!("Checking {} installed packages for updates", installed.len());

    let checks: Vec<Check> = installed
        .par_iter()
        .map(|pkg| check_package(remote, pkg))
        .collect();

    let mut report = UpdateReport::default();
    for check in checks {
        match check {
            Check::Update(update) => report.updates.push(update),
            Check::Current => {}
            Check::Failed(failure) => report.failures.push(failure),
        }
    }

    info!(
        "{} updates available, {} lookups failed",
        report.updates.len(),
        report.failures.len()
    );
    report
}

fn check_package<R>(remote: &R, pkg: &InstalledPackage) -> Check
where
    R: RemoteIndex + ?Sized,
{
    match remote.fetch_metadata(&pkg.name) {
        Ok(metadata) => {
            if is_newer(&metadata.version_release, &pkg.installed_version_release) {
                debug!(
                    "{}: {} -> {}",
                    pkg.name, pkg.installed_version_release, metadata.version_release
                );
                Check::Update(AvailableUpdate {
                    metadata,
                    installed_version: pkg.installed_version_release.clone(),
                })
            } else {
                Check::Current
            }
        }
        Err(Error::NotFound(_)) => {
            debug!("{} is not in the AUR", pkg.name);
            Check::Current
        }
        Err(e) => Check::Failed(PackageFailure::new(pkg.name.clone(), e)),
    }
}
