// src/packages/traits.rs

//! Common types for installed package queries

use crate::error::Result;

/// A package installed on this system that did not come from a sync repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub installed_version_release: String,
}

impl InstalledPackage {
    pub fn new(name: impl Into<String>, version_release: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            installed_version_release: version_release.into(),
        }
    }
}

/// Source of the installed foreign package list
pub trait InstalledSource {
    /// Foreign packages in the order the package manager lists them
    fn list_installed_foreign_packages(&self) -> Result<Vec<InstalledPackage>>;
}
