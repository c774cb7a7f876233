//! Download of remote granules into a local cache directory.

use crate::constants::default_download_directory;
use crate::granule::Vnp21ImgNrtGranule;
use crate::io::search::RemoteGranule;
use crate::io::swath::GranuleName;
use crate::types::{Vnp21Error, Vnp21Result};
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Where and how granules are downloaded
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub download_directory: PathBuf,
    /// Earthdata bearer token, sent when present
    pub token: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_directory: default_download_directory(),
            token: None,
            timeout_secs: 600,
            max_retries: 3,
        }
    }
}

/// Local path for a remote granule.
///
/// Without an explicit parent the file goes to a `YYYY.MM.DD` subdirectory of
/// the download directory, dated by the granule's start time.
pub fn download_path(remote: &RemoteGranule, config: &DownloadConfig, parent_directory: Option<&Path>) -> PathBuf {
    let filename = remote.filename();

    if let Some(parent) = parent_directory {
        return parent.join(filename);
    }

    let date = remote
        .time_start
        .map(|t| t.date_naive())
        .or_else(|| GranuleName::parse(&filename).ok().map(|n| n.acquisition.date()));

    match date {
        Some(date) => config
            .download_directory
            .join(date.format("%Y.%m.%d").to_string())
            .join(filename),
        None => config.download_directory.join(filename),
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".download");
    path.with_file_name(name)
}

fn try_download_once(
    client: &reqwest::blocking::Client,
    url: &str,
    token: Option<&str>,
    output_path: &Path,
) -> Vnp21Result<u64> {
    let mut request = client.get(url);
    if let Some(token) = token {
        request = request.bearer_auth(token);
    }

    let mut response = request.send()?;

    if !response.status().is_success() {
        return Err(Vnp21Error::Download(format!(
            "HTTP {} {}: {}",
            response.status().as_u16(),
            response.status().canonical_reason().unwrap_or(""),
            url
        )));
    }

    let partial = partial_path(output_path);
    let result = write_partial(&mut response, &partial, url);

    if result.is_err() {
        discard_partial(&partial);
    }

    let bytes = result?;
    fs::rename(&partial, output_path)?;
    Ok(bytes)
}

fn write_partial<R: Read>(body: &mut R, partial: &Path, url: &str) -> Vnp21Result<u64> {
    let mut file = fs::File::create(partial)?;
    let bytes = std::io::copy(body, &mut file)?;

    if bytes == 0 {
        return Err(Vnp21Error::Download(format!("Empty response from {}", url)));
    }

    Ok(bytes)
}

fn discard_partial(partial: &Path) {
    if let Err(e) = fs::remove_file(partial) {
        if e.kind() != ErrorKind::NotFound {
            log::warn!("Could not remove partial download {}: {}", partial.display(), e);
        }
    }
}

/// Fetch `url` into `output_path`, retrying failed attempts
pub fn download_file(url: &str, output_path: &Path, config: &DownloadConfig) -> Vnp21Result<()> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }

    log::info!("Downloading {} to {}", url, output_path.display());

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .user_agent(concat!("vnp21imgnrt/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let started = Instant::now();
    let attempts = config.max_retries.max(1);
    let mut last_error = None;

    for attempt in 1..=attempts {
        log::debug!("Download attempt {} of {}", attempt, attempts);

        match try_download_once(&client, url, config.token.as_deref(), output_path) {
            Ok(bytes) => {
                log::info!(
                    "Downloaded {} bytes in {:.1}s",
                    bytes,
                    started.elapsed().as_secs_f64()
                );
                return Ok(());
            }
            Err(e) => {
                log::warn!("Download attempt {} failed: {}", attempt, e);
                last_error = Some(e);
                if attempt < attempts {
                    std::thread::sleep(Duration::from_secs(2));
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| Vnp21Error::Download(format!("Download failed: {}", url))))
}

/// Download a granule unless a non-empty copy already exists, then open it
pub fn retrieve_granule(
    remote: &RemoteGranule,
    config: &DownloadConfig,
    parent_directory: Option<&Path>,
) -> Vnp21Result<Vnp21ImgNrtGranule> {
    let path = download_path(remote, config, parent_directory);

    let cached = fs::metadata(&path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false);
    if cached {
        log::info!("Using existing file: {}", path.display());
    } else {
        download_file(&remote.data_url, &path, config)?;
    }

    Vnp21ImgNrtGranule::open(path)
}
