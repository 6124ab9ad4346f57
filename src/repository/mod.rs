// src/repository/mod.rs

//! AUR access and the local binary repositories
//!
//! This module provides functionality for:
//! - Querying the AUR JSON-RPC interface (info, search)
//! - Downloading and unpacking package snapshots
//! - Looking up packages in the local pacman sync databases

pub mod rpc;
pub mod sync_db;

pub use rpc::RemoteMetadata;
pub use sync_db::{LocalIndex, SyncDatabase};

use crate::error::{Error, Result};
use crate::filesystem;
use reqwest::blocking::{Client, Response};
use std::fs::File;
use std::io::{self, Seek, SeekFrom};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default AUR location
pub const DEFAULT_AUR_URL: &str = "https://aur.archlinux.org";

/// Default timeout for HTTP requests (30 seconds)
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Maximum retry attempts for failed requests
const MAX_RETRIES: u32 = 3;

/// Retry delay in milliseconds
const RETRY_DELAY_MS: u64 = 1000;

/// AUR category names indexed by `CategoryID`
pub const CATEGORIES: [Option<&str>; 20] = [
    None,
    None,
    Some("daemons"),
    Some("devel"),
    Some("editors"),
    Some("emulators"),
    Some("games"),
    Some("gnome"),
    Some("i18n"),
    Some("kde"),
    Some("lib"),
    Some("modules"),
    Some("multimedia"),
    Some("network"),
    Some("office"),
    Some("science"),
    Some("system"),
    Some("x11"),
    Some("xfce"),
    Some("kernels"),
];

/// Map a `CategoryID` to its name
pub fn category_name(category_id: u64) -> &'static str {
    usize::try_from(category_id)
        .ok()
        .and_then(|idx| CATEGORIES.get(idx).copied().flatten())
        .unwrap_or("none")
}

/// Package metadata lookups against the AUR
pub trait RemoteIndex {
    /// Fetch metadata for one package
    ///
    /// Unknown names yield `Error::NotFound`; other server-side errors
    /// yield `Error::Rpc`.
    fn fetch_metadata(&self, name: &str) -> Result<RemoteMetadata>;

    /// Free-text search; no matches is an empty list, not an error
    fn search(&self, query: &str) -> Result<Vec<RemoteMetadata>>;
}

/// Retrieval of package snapshots into a working directory
pub trait ArchiveFetcher {
    /// Download the snapshot at `download_path` and unpack it into `dest_dir`
    ///
    /// Returns the name of the unpacked top-level directory.
    fn fetch_and_extract(&self, download_path: &str, dest_dir: &Path, overwrite: bool)
    -> Result<String>;
}

/// HTTP client for the AUR with retry support
pub struct AurClient {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl AurClient {
    /// Create a new client for the AUR at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("slurpy/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| Error::InitError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: MAX_RETRIES,
        })
    }

    /// Absolute URL for a snapshot path returned in `URLPath`
    pub fn download_url(&self, download_path: &str) -> String {
        if download_path.starts_with("http://") || download_path.starts_with("https://") {
            download_path.to_string()
        } else {
            format!("{}/{}", self.base_url, download_path.trim_start_matches('/'))
        }
    }

    /// Web page of a package on the AUR
    pub fn package_page(&self, meta: &RemoteMetadata) -> String {
        format!("{}/packages.php?ID={}", self.base_url, meta.id)
    }

    /// Metadata for a single package
    pub fn info(&self, name: &str) -> Result<RemoteMetadata> {
        self.fetch_metadata(name)
    }

    /// Send a GET request, retrying transport failures
    fn get_with_retry(&self, url: &str, query: &[(&str, &str)]) -> Result<Response> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url).query(query).send() {
                Ok(response) => {
                    if !response.status().is_success() {
                        return Err(Error::Download(format!(
                            "HTTP {} from {}",
                            response.status(),
                            url
                        )));
                    }
                    return Ok(response);
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(Error::Download(format!(
                            "Failed to fetch {} after {} attempts: {}",
                            url, attempt, e
                        )));
                    }
                    warn!("Request attempt {} failed: {}, retrying...", attempt, e);
                    std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
                }
            }
        }
    }

    /// Perform one RPC call and decode the envelope
    fn rpc(&self, kind: &str, arg: &str) -> Result<rpc::RpcResponse> {
        let url = format!("{}/rpc.php", self.base_url);
        debug!("RPC {} {}", kind, arg);

        let response = self.get_with_retry(&url, &[("v", "5"), ("type", kind), ("arg", arg)])?;
        response
            .json()
            .map_err(|e| Error::Parse(format!("Failed to parse RPC response: {}", e)))
    }

    /// Stream `url` into `file`, starting over on each retry
    ///
    /// A transport error or an interrupted body costs one attempt; an HTTP
    /// error status fails immediately.
    fn download_to(&self, url: &str, file: &mut File) -> Result<()> {
        info!("Downloading {}", url);

        let mut attempt = 0;
        loop {
            attempt += 1;
            let failure = match self.client.get(url).send() {
                Ok(response) if !response.status().is_success() => {
                    return Err(Error::Download(format!(
                        "HTTP {} from {}",
                        response.status(),
                        url
                    )));
                }
                Ok(mut response) => {
                    file.set_len(0)?;
                    file.seek(SeekFrom::Start(0))?;
                    match io::copy(&mut response, file) {
                        Ok(bytes) => {
                            debug!("Downloaded {} bytes from {}", bytes, url);
                            return Ok(());
                        }
                        Err(e) => e.to_string(),
                    }
                }
                Err(e) => e.to_string(),
            };

            if attempt >= self.max_retries {
                return Err(Error::Download(format!(
                    "Failed to download {} after {} attempts: {}",
                    url, attempt, failure
                )));
            }
            warn!("Download attempt {} failed: {}, retrying...", attempt, failure);
            std::thread::sleep(Duration::from_millis(RETRY_DELAY_MS * attempt as u64));
        }
    }
}

impl Default for AurClient {
    fn default() -> Self {
        Self::new(DEFAULT_AUR_URL, HTTP_TIMEOUT).expect("Failed to create default AUR client")
    }
}

impl RemoteIndex for AurClient {
    fn fetch_metadata(&self, name: &str) -> Result<RemoteMetadata> {
        self.rpc("info", name)?.into_info(name)
    }

    fn search(&self, query: &str) -> Result<Vec<RemoteMetadata>> {
        self.rpc("search", query)?.into_search()
    }
}

impl ArchiveFetcher for AurClient {
    fn fetch_and_extract(
        &self,
        download_path: &str,
        dest_dir: &Path,
        overwrite: bool,
    ) -> Result<String> {
        let url = self.download_url(download_path);
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Download(format!("No file name in {}", url)))?;
        let (stem, compression) = filesystem::archive_stem(file_name);

        filesystem::check_targets(dest_dir, &stem, overwrite)?;

        // Removed when dropped, whether or not extraction succeeds
        let mut archive = tempfile::Builder::new()
            .prefix(&format!(".{}-", stem))
            .suffix(compression.suffix())
            .tempfile_in(dest_dir)?;

        self.download_to(&url, archive.as_file_mut())?;

        let root = filesystem::extract_archive(archive.path(), compression, dest_dir)?;
        Ok(root.unwrap_or(stem))
    }
}
