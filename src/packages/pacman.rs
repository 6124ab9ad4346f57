// src/packages/pacman.rs

//! Query foreign packages from the local pacman database
//!
//! Uses `pacman -Qm`, which lists installed packages not found in any
//! configured sync database, one `name version` pair per line.

use crate::error::{Error, Result};
use crate::packages::traits::{InstalledPackage, InstalledSource};
use std::process::Command;
use tracing::{debug, warn};

/// The system pacman binary
#[derive(Debug, Clone)]
pub struct Pacman {
    program: String,
}

impl Pacman {
    pub fn new() -> Self {
        Self {
            program: "pacman".to_string(),
        }
    }

    /// Use a different executable (wrappers, tests)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for Pacman {
    fn default() -> Self {
        Self::new()
    }
}

impl InstalledSource for Pacman {
    fn list_installed_foreign_packages(&self) -> Result<Vec<InstalledPackage>> {
        debug!("Querying foreign packages with {} -Qm", self.program);

        let output = Command::new(&self.program)
            .arg("-Qm")
            .env("LC_ALL", "C")
            .output()
            .map_err(|e| {
                Error::Command(format!("Failed to run {}: {}. Is pacman installed?", self.program, e))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if !output.status.success() {
            // pacman exits 1 with no output when there is nothing to list
            if output.status.code() == Some(1) && stdout.trim().is_empty() {
                debug!("No foreign packages installed");
                return Ok(Vec::new());
            }
            return Err(Error::Command(format!(
                "{} -Qm failed: {}",
                self.program,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let packages = parse_query_output(&stdout);
        debug!("Found {} foreign packages", packages.len());
        Ok(packages)
    }
}

/// Parse `pacman -Q` style output
fn parse_query_output(output: &str) -> Vec<InstalledPackage> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some(name), Some(version)) => Some(InstalledPackage::new(name, version)),
                _ => {
                    warn!("Ignoring malformed pacman output line: {}", line);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_query_output() {
        let output = "slurpy 3.0.0-1\nyay-bin 12.3.5-1\n\nbogus\n";
        let packages = parse_query_output(output);

        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0], InstalledPackage::new("slurpy", "3.0.0-1"));
        assert_eq!(packages[1].name, "yay-bin");
        assert_eq!(packages[1].installed_version_release, "12.3.5-1");
    }

    #[test]
    fn test_missing_binary_is_command_error() {
        let pacman = Pacman::with_program("/nonexistent/pacman");
        let result = pacman.list_installed_foreign_packages();
        assert!(matches!(result, Err(Error::Command(_))));
    }
}
