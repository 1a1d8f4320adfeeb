use crate::domain::{BuildList, Catalog, artifact_file_name};
use crate::infra::InterruptFlag;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::{debug, info, warn};

const DEFAULT_API: &str = "https://api.papermc.io/v2/projects/paper";
const BIN_NAME: &str = "server-mgr";
const CATALOG_CACHE: &str = "repo.cache";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
const CACHE_TTL: Duration = Duration::from_secs(24 * 3600);
const CHUNK_SIZE: usize = 16 * 1024;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("cache {path} is unusable: {source}")]
    Cache { path: String, source: io::Error },

    #[error("failed to write {path}: {source}")]
    Write { path: String, source: io::Error },

    #[error("sha256 mismatch for {artifact}")]
    ShaMismatch { artifact: String },

    #[error("download interrupted")]
    Interrupted,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DownloadProgress {
    pub received: u64,
    pub total: Option<u64>,
}

/// Remote source of releases. Metadata calls may be served from a local cache
/// unless `force` is set.
pub trait ReleaseSource {
    fn catalog(&self, force: bool) -> Result<Catalog, CatalogError>;

    fn builds(&self, version: &str, force: bool) -> Result<BuildList, CatalogError>;

    /// Downloads one build into `dest_dir`, returning the written path.
    fn download(
        &self,
        version: &str,
        build: u32,
        dest_dir: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
        interrupt: &InterruptFlag,
    ) -> Result<PathBuf, CatalogError>;
}

#[derive(Debug, Deserialize)]
struct BuildDetail {
    downloads: BuildDownloads,
}

#[derive(Debug, Deserialize)]
struct BuildDownloads {
    application: DownloadEntry,
}

#[derive(Debug, Deserialize)]
struct DownloadEntry {
    name: String,
    #[serde(default)]
    sha256: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PaperClient {
    base_url: String,
    cache_dir: PathBuf,
    cache_ttl: Duration,
}

impl PaperClient {
    pub fn new(cache_dir: PathBuf) -> Self {
        let base_url = std::env::var("SERVER_MGR_API").unwrap_or_else(|_| DEFAULT_API.to_string());
        Self::with_base_url(base_url, cache_dir)
    }

    pub fn with_base_url(base_url: String, cache_dir: PathBuf) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_dir,
            cache_ttl: CACHE_TTL,
        }
    }

    fn fetch_cached<T: DeserializeOwned>(
        &self,
        url: &str,
        cache_name: &str,
        force: bool,
    ) -> Result<T, CatalogError> {
        let cache_path = self.cache_dir.join(cache_name);
        if !force && is_fresh(&cache_path, self.cache_ttl, SystemTime::now()) {
            match read_cache(&cache_path) {
                Ok(value) => {
                    debug!(cache = %cache_path.display(), "serving release metadata from cache");
                    return Ok(value);
                }
                Err(error) => warn!(%error, "discarding unreadable cache entry"),
            }
        }

        let agent = make_agent(DEFAULT_TIMEOUT);
        info!(url, force, "fetching release metadata");
        let text = agent
            .get(url)
            .header("User-Agent", &user_agent())
            .call()
            .map_err(|error| http_error(url, error))?
            .body_mut()
            .read_to_string()
            .map_err(|error| http_error(url, error))?;

        let value = serde_json::from_str(&text).map_err(|error| CatalogError::Decode {
            url: url.to_string(),
            message: error.to_string(),
        })?;
        write_cache(&cache_path, &text)?;
        Ok(value)
    }

    fn build_detail(&self, version: &str, build: u32) -> Result<BuildDetail, CatalogError> {
        let url = format!("{}/versions/{version}/builds/{build}", self.base_url);
        make_agent(DEFAULT_TIMEOUT)
            .get(&url)
            .header("User-Agent", &user_agent())
            .call()
            .map_err(|error| http_error(&url, error))?
            .body_mut()
            .read_json::<BuildDetail>()
            .map_err(|error| CatalogError::Decode {
                url: url.clone(),
                message: error.to_string(),
            })
    }
}

impl ReleaseSource for PaperClient {
    fn catalog(&self, force: bool) -> Result<Catalog, CatalogError> {
        self.fetch_cached(&self.base_url, CATALOG_CACHE, force)
    }

    fn builds(&self, version: &str, force: bool) -> Result<BuildList, CatalogError> {
        let url = format!("{}/versions/{version}", self.base_url);
        self.fetch_cached(&url, &format!("v{version}.cache"), force)
    }

    fn download(
        &self,
        version: &str,
        build: u32,
        dest_dir: &Path,
        progress: &mut dyn FnMut(DownloadProgress),
        interrupt: &InterruptFlag,
    ) -> Result<PathBuf, CatalogError> {
        interrupt.take();
        let detail = self.build_detail(version, build)?;
        let remote_name = detail.downloads.application.name;
        let expected_sha = detail
            .downloads
            .application
            .sha256
            .map(|sha| sha.to_ascii_lowercase());

        let url = format!(
            "{}/versions/{version}/builds/{build}/downloads/{remote_name}",
            self.base_url
        );
        let destination = dest_dir.join(artifact_file_name(version, build));
        let partial = destination.with_extension("jar.part");

        info!(url = %url, destination = %destination.display(), "downloading artifact");
        let response = make_download_agent()
            .get(&url)
            .header("User-Agent", &user_agent())
            .call()
            .map_err(|error| http_error(&url, error))?;
        let total = response.body().content_length();
        let mut reader = response.into_body().into_reader();

        let actual = save_partial(&partial, |file| {
            stream_body(&mut reader, file, total, progress, interrupt, &url, &partial)
        })?;

        if let Some(expected) = expected_sha {
            if actual != expected {
                let _ = fs::remove_file(&partial);
                return Err(CatalogError::ShaMismatch {
                    artifact: destination.display().to_string(),
                });
            }
        }

        if destination.exists() {
            debug!(destination = %destination.display(), "overwriting existing artifact");
        }
        fs::rename(&partial, &destination).map_err(|source| CatalogError::Write {
            path: destination.display().to_string(),
            source,
        })?;
        Ok(destination)
    }
}

/// Creates `partial` and lets `fill` write it. The file is removed again if
/// `fill` fails.
fn save_partial<T>(
    partial: &Path,
    fill: impl FnOnce(&mut fs::File) -> Result<T, CatalogError>,
) -> Result<T, CatalogError> {
    let mut file = fs::File::create(partial).map_err(|source| CatalogError::Write {
        path: partial.display().to_string(),
        source,
    })?;
    let result = fill(&mut file);
    drop(file);
    if result.is_err() {
        let _ = fs::remove_file(partial);
    }
    result
}

/// Copies the response body into `sink` in fixed chunks, returning the
/// SHA-256 of everything written.
fn stream_body(
    reader: &mut impl Read,
    sink: &mut impl Write,
    total: Option<u64>,
    progress: &mut dyn FnMut(DownloadProgress),
    interrupt: &InterruptFlag,
    url: &str,
    partial: &Path,
) -> Result<String, CatalogError> {
    let write_error = |source: io::Error| CatalogError::Write {
        path: partial.display().to_string(),
        source,
    };
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut received = 0u64;
    loop {
        if interrupt.take() {
            warn!(url, "download interrupted");
            return Err(CatalogError::Interrupted);
        }
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(read) => read,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(http_error(url, error)),
        };
        sink.write_all(&buffer[..read]).map_err(write_error)?;
        hasher.update(&buffer[..read]);
        received += read as u64;
        progress(DownloadProgress { received, total });
    }
    sink.flush().map_err(write_error)?;
    Ok(hex_digest(&hasher.finalize()))
}

fn is_fresh(path: &Path, ttl: Duration, now: SystemTime) -> bool {
    let Ok(modified) = fs::metadata(path).and_then(|meta| meta.modified()) else {
        return false;
    };
    match now.checked_sub(ttl) {
        Some(threshold) => modified >= threshold,
        None => true,
    }
}

fn read_cache<T: DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Cache {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|error| CatalogError::Cache {
        path: path.display().to_string(),
        source: io::Error::new(io::ErrorKind::InvalidData, error),
    })
}

fn write_cache(path: &Path, text: &str) -> Result<(), CatalogError> {
    let write_error = |source: io::Error| CatalogError::Write {
        path: path.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    let tmp = path.with_extension("cache.tmp");
    fs::write(&tmp, text).map_err(write_error)?;
    fs::rename(&tmp, path).map_err(write_error)?;
    Ok(())
}

fn make_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    config.into()
}

fn make_download_agent() -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_connect(Some(DEFAULT_TIMEOUT))
        .timeout_recv_response(Some(DEFAULT_TIMEOUT))
        .build();
    config.into()
}

fn user_agent() -> String {
    format!("{BIN_NAME}/{}", env!("CARGO_PKG_VERSION"))
}

fn http_error(url: &str, error: impl std::fmt::Display) -> CatalogError {
    CatalogError::Http {
        url: url.to_string(),
        message: error.to_string(),
    }
}

fn hex_digest(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push(hex_char(b >> 4));
        out.push(hex_char(b & 0x0f));
    }
    out
}

fn hex_char(value: u8) -> char {
    match value {
        0..=9 => (b'0' + value) as char,
        10..=15 => (b'a' + (value - 10)) as char,
        _ => '0',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    // Nothing listens on the discard port, so any network access fails fast.
    const UNREACHABLE: &str = "http://127.0.0.1:9/v2/projects/paper";

    #[test]
    fn fresh_cache_is_served_without_network() {
        let dir = tempdir().expect("tempdir");
        fs::write(
            dir.path().join(CATALOG_CACHE),
            r#"{"version_groups":["1.21"],"versions":["1.21.1"]}"#,
        )
        .expect("seed cache");

        let client = PaperClient::with_base_url(UNREACHABLE.to_string(), dir.path().to_path_buf());
        let catalog = client.catalog(false).expect("cached catalog");
        assert_eq!(catalog.version_groups, vec!["1.21".to_string()]);
    }

    #[test]
    fn force_bypasses_cache() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("v1.21.1.cache"), r#"{"builds":[1,2]}"#).expect("seed cache");

        let client = PaperClient::with_base_url(UNREACHABLE.to_string(), dir.path().to_path_buf());
        assert_eq!(client.builds("1.21.1", false).expect("cached").builds, vec![1, 2]);
        assert!(matches!(
            client.builds("1.21.1", true),
            Err(CatalogError::Http { .. })
        ));
    }

    #[test]
    fn staleness_window_is_time_based() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("entry.cache");
        assert!(!is_fresh(&path, CACHE_TTL, SystemTime::now()));

        fs::write(&path, "{}").expect("write");
        assert!(is_fresh(&path, CACHE_TTL, SystemTime::now()));
        let later = SystemTime::now() + CACHE_TTL + Duration::from_secs(60);
        assert!(!is_fresh(&path, CACHE_TTL, later));
    }

    #[test]
    fn hex_digest_matches_known_sha256() {
        let digest = Sha256::digest(b"abc");
        assert_eq!(
            hex_digest(&digest),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    struct FullDisk;

    impl Write for FullDisk {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("no space left on device"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stream_body_hashes_and_reports_progress() {
        let mut seen = Vec::new();
        let mut sink = Vec::new();
        let digest = stream_body(
            &mut &b"abc"[..],
            &mut sink,
            Some(3),
            &mut |progress| seen.push(progress.received),
            &InterruptFlag::default(),
            "fake://jar",
            Path::new("paper.jar.part"),
        )
        .expect("stream");
        assert_eq!(sink, b"abc");
        assert_eq!(seen, vec![3]);
        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn stream_body_surfaces_write_failures() {
        let result = stream_body(
            &mut &b"abc"[..],
            &mut FullDisk,
            None,
            &mut |_| {},
            &InterruptFlag::default(),
            "fake://jar",
            Path::new("paper.jar.part"),
        );
        assert!(matches!(result, Err(CatalogError::Write { .. })));
    }

    #[test]
    fn stream_body_stops_when_interrupted() {
        let interrupt = InterruptFlag::default();
        interrupt.raise();
        let mut sink = Vec::new();
        let result = stream_body(
            &mut &b"abc"[..],
            &mut sink,
            None,
            &mut |_| {},
            &interrupt,
            "fake://jar",
            Path::new("paper.jar.part"),
        );
        assert!(matches!(result, Err(CatalogError::Interrupted)));
        assert!(sink.is_empty());
    }

    #[test]
    fn failed_fill_removes_the_partial_file() {
        let dir = tempdir().expect("tempdir");
        let partial = dir.path().join("paper-1.21.1-102.jar.part");
        let result: Result<(), CatalogError> = save_partial(&partial, |file| {
            file.write_all(b"half a jar").expect("write");
            stream_body(
                &mut &b"rest"[..],
                &mut FullDisk,
                None,
                &mut |_| {},
                &InterruptFlag::default(),
                "fake://jar",
                &partial,
            )
            .map(|_| ())
        });
        assert!(matches!(result, Err(CatalogError::Write { .. })));
        assert!(!partial.exists());

        let kept = save_partial(&partial, |file| {
            file.write_all(b"jar!").map_err(|source| CatalogError::Write {
                path: String::new(),
                source,
            })
        });
        assert!(kept.is_ok());
        assert_eq!(fs::read(&partial).expect("read"), b"jar!");
    }
}
