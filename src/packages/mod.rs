// src/packages/mod.rs

//! Local package information for Slurpy
//!
//! This module reads build recipes (PKGBUILDs) and queries the installed
//! foreign packages from pacman.

pub mod pacman;
pub mod pkgbuild;
pub mod traits;

pub use pacman::Pacman;
pub use traits::{InstalledPackage, InstalledSource};
