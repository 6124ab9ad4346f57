// src/lib.rs

//! Slurpy, an AUR helper
//!
//! Searches the Arch User Repository, downloads package snapshots together
//! with their AUR build dependencies, and reports updates for installed
//! foreign packages.
//!
//! # Architecture
//!
//! - `repository`: AUR RPC client, snapshot download, local sync databases
//! - `resolver`: worklist-driven download of packages and dependencies
//! - `updates`: comparison of installed packages against the AUR
//! - `version`: loose version ordering used for update detection
//! - `packages`: PKGBUILD dependency extraction and pacman queries

pub mod config;
mod error;
pub mod filesystem;
pub mod output;
pub mod packages;
pub mod repository;
pub mod resolver;
pub mod search;
pub mod updates;
pub mod version;

pub use error::{Error, PackageFailure, Result};
