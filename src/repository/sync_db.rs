// src/repository/sync_db.rs

//! Local binary repository index
//!
//! Answers "is this package available from a configured pacman repository"
//! by reading the sync databases under `/var/lib/pacman/sync`. Each
//! repository is either a `<repo>.db` tarball of `<name>-<ver>-<rel>/desc`
//! entries (desc files use %FIELD% markers) or, on old systems, a
//! `<repo>/` directory with one `<name>-<ver>-<rel>` subdirectory per package.

use crate::error::{Error, Result};
use crate::filesystem;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tar::Archive;
use tracing::{debug, info, warn};

/// Lookup of packages in the local binary repositories
pub trait LocalIndex {
    /// Name of the first repository providing `name`, if any
    fn is_locally_available(&self, name: &str) -> Option<String>;
}

/// Package names from every configured sync database
#[derive(Debug, Default)]
pub struct SyncDatabase {
    /// package (or provided) name → repository
    packages: HashMap<String, String>,
    repos: Vec<String>,
}

impl SyncDatabase {
    /// Build an index from `(package, repository)` pairs; earlier pairs win
    pub fn from_entries<I, N, R>(entries: I) -> Self
    where
        I: IntoIterator<Item = (N, R)>,
        N: Into<String>,
        R: Into<String>,
    {
        let mut db = Self::default();
        for (name, repo) in entries {
            let repo = repo.into();
            if !db.repos.contains(&repo) {
                db.repos.push(repo.clone());
            }
            db.packages.entry(name.into()).or_insert(repo);
        }
        db
    }

    /// Load the sync databases of `repos` (in priority order) from `sync_dir`
    ///
    /// Missing or unreadable repositories are skipped with a warning.
    pub fn load(sync_dir: &Path, repos: &[String]) -> Result<Self> {
        let mut db = Self::default();

        for repo in repos {
            match db.load_repo(sync_dir, repo) {
                Ok(count) => debug!("Loaded {} packages from {}", count, repo),
                Err(e) => warn!("Skipping repository {}: {}", repo, e),
            }
            db.repos.push(repo.clone());
        }

        info!(
            "Indexed {} package names from {} repositories",
            db.packages.len(),
            db.repos.len()
        );
        Ok(db)
    }

    fn load_repo(&mut self, sync_dir: &Path, repo: &str) -> Result<usize> {
        let db_file = sync_dir.join(format!("{}.db", repo));
        let legacy_dir = sync_dir.join(repo);

        let names = if db_file.is_file() {
            read_db_archive(&db_file)?
        } else if legacy_dir.is_dir() {
            read_legacy_dir(&legacy_dir)?
        } else {
            return Err(Error::NotFound(db_file.display().to_string()));
        };

        let count = names.len();
        for name in names {
            self.packages.entry(name).or_insert_with(|| repo.to_string());
        }
        Ok(count)
    }
}

impl LocalIndex for SyncDatabase {
    fn is_locally_available(&self, name: &str) -> Option<String> {
        self.packages.get(name).cloned()
    }
}

/// Repository sections of a pacman.conf, in file order
pub fn configured_repositories(pacman_conf: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(pacman_conf)?;
    Ok(parse_pacman_conf(&content))
}

fn parse_pacman_conf(content: &str) -> Vec<String> {
    let mut repos = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if let Some(section) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let section = section.trim();
            if section != "options" && !section.is_empty() && !repos.iter().any(|r| r == section) {
                repos.push(section.to_string());
            }
        }
    }
    repos
}

/// Names and provides from a `<repo>.db` archive
fn read_db_archive(path: &Path) -> Result<Vec<String>> {
    let data = filesystem::read_decompressed(path)?;
    let mut archive = Archive::new(data.as_slice());
    let mut names = Vec::new();

    for entry in archive.entries()? {
        let mut entry =
            entry.map_err(|e| Error::Parse(format!("Failed to read tarball entry: {}", e)))?;

        let path = entry
            .path()
            .map_err(|e| Error::Parse(format!("Invalid path in tarball: {}", e)))?
            .to_string_lossy()
            .into_owned();

        let is_desc = path.ends_with("/desc");
        if !is_desc && !path.ends_with("/depends") {
            continue;
        }

        let mut content = String::new();
        entry
            .read_to_string(&mut content)
            .map_err(|e| Error::Parse(format!("Failed to read {}: {}", path, e)))?;
        let fields = parse_desc_file(&content);

        if is_desc {
            let name = fields
                .get("NAME")
                .and_then(|v| v.first())
                .cloned()
                .or_else(|| path.split('/').next().and_then(package_name).map(str::to_string));
            match name {
                Some(name) => names.push(name),
                None => warn!("Could not determine package name for {}", path),
            }
        }

        // Newer databases keep PROVIDES in desc, older ones in depends
        if let Some(provides) = fields.get("PROVIDES") {
            names.extend(provides.iter().map(|p| strip_constraint(p).to_string()));
        }
    }

    Ok(names)
}

/// Names from a legacy `<repo>/` directory of `<name>-<ver>-<rel>` entries
fn read_legacy_dir(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        match package_name(&file_name.to_string_lossy()) {
            Some(name) => names.push(name.to_string()),
            None => debug!("Ignoring {:?}", file_name),
        }
    }
    Ok(names)
}

/// Parse a desc file into %FIELD% → values
fn parse_desc_file(content: &str) -> HashMap<String, Vec<String>> {
    let mut fields = HashMap::new();
    let mut current_field: Option<String> = None;
    let mut values: Vec<String> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.len() > 1 && trimmed.starts_with('%') && trimmed.ends_with('%') {
            if let Some(field) = current_field.take() {
                fields.insert(field, std::mem::take(&mut values));
            }
            current_field = Some(trimmed[1..trimmed.len() - 1].to_string());
        } else if !trimmed.is_empty() {
            values.push(trimmed.to_string());
        }
    }

    if let Some(field) = current_field {
        fields.insert(field, values);
    }

    fields
}

/// "bash-5.2.037-1" → "bash", "lib32-foo-1:2.0-3" → "lib32-foo"
fn package_name(entry: &str) -> Option<&str> {
    let (rest, _release) = entry.rsplit_once('-')?;
    let (name, _version) = rest.rsplit_once('-')?;
    if name.is_empty() { None } else { Some(name) }
}

/// "libfoo.so=1-64" → "libfoo.so", "sh" → "sh"
fn strip_constraint(dep: &str) -> &str {
    match dep.find(['<', '>', '=']) {
        Some(pos) => &dep[..pos],
        None => dep,
    }
}
