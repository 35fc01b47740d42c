// ============================================================
// Layer 4 — Dataset Downloader
// ============================================================
// Fetches a CoNLL file over HTTP into a local cache directory.
//
// If the target file is already in the cache, no request is
// made. Downloads land in a `.part` file first and are renamed
// into place only once the body has been fully written, so an
// interrupted download never looks like a cache hit.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};

/// WikiGold, CoNLL format, IOB1 tags (PER, LOC, ORG, MISC).
pub const WIKIGOLD_URL: &str = "https://raw.githubusercontent.com/juand-r/entity-recognition-datasets/master/data/wikigold/CONLL-format/data/wikigold.conll.txt";

pub struct DatasetDownloader {
    url:       String,
    cache_dir: PathBuf,
}

impl DatasetDownloader {
    pub fn new(url: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self { url: url.into(), cache_dir: cache_dir.into() }
    }

    /// Path the dataset is (or will be) cached at.
    pub fn target_path(&self) -> Result<PathBuf> {
        let name = file_name_from_url(&self.url)
            .ok_or_else(|| anyhow!("Cannot derive a file name from URL '{}'", self.url))?;
        Ok(self.cache_dir.join(name))
    }

    /// Return the cached file, downloading it first if needed.
    pub fn fetch(&self) -> Result<PathBuf> {
        let target = self.target_path()?;
        if target.exists() {
            tracing::info!("Using cached dataset '{}'", target.display());
            return Ok(target);
        }

        fs::create_dir_all(&self.cache_dir).with_context(|| {
            format!("Cannot create cache directory '{}'", self.cache_dir.display())
        })?;

        tracing::info!("Downloading {}", self.url);
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("conll-ner/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(120))
            .build()
            .context("Failed to create HTTP client")?;

        let response = client
            .get(&self.url)
            .send()
            .with_context(|| format!("Request to '{}' failed", self.url))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Download of '{}' failed with HTTP {}", self.url, status);
        }

        let body = response.bytes().context("Failed to read response body")?;
        write_atomically(&target, &body)?;

        tracing::info!("Saved {} bytes to '{}'", body.len(), target.display());
        Ok(target)
    }
}

fn file_name_from_url(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next()?;
    path.rsplit('/').next().filter(|n| !n.is_empty())
}

fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let partial = target.with_extension("part");
    let mut f = fs::File::create(&partial)
        .with_context(|| format!("Cannot create '{}'", partial.display()))?;
    f.write_all(bytes)?;
    f.sync_all()?;
    fs::rename(&partial, target)
        .with_context(|| format!("Cannot move download into '{}'", target.display()))?;
    Ok(())
}
