use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info};

use crate::error::{Error, FetchFailure, Result};

/// Downloads a remote file with a single HTTP GET.
///
/// There is no retry and no resumption: a failed fetch leaves whatever was
/// written so far at the target path, and the caller decides whether to try
/// again.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Create a fetcher with a default client (30 second connect timeout)
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| Error::HttpFetch {
                url: String::new(),
                source: FetchFailure::Transport(e),
            })?;
        Ok(Self { client })
    }

    /// Use an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetch `url` and write the response body to `path`.
    ///
    /// Any status other than `200 OK` is a failure. Parent directories of
    /// `path` are created, and an existing file is truncated.
    ///
    /// Returns the number of body bytes written.
    pub async fn fetch(&self, url: &str, path: &Path) -> Result<u64> {
        info!(url, path = %path.display(), "fetching");

        let transport = |e: reqwest::Error| Error::HttpFetch {
            url: url.to_string(),
            source: FetchFailure::Transport(e),
        };

        let mut resp = self.client.get(url).send().await.map_err(transport)?;

        if resp.status() != StatusCode::OK {
            return Err(Error::HttpFetch {
                url: url.to_string(),
                source: FetchFailure::Status(resp.status()),
            });
        }

        let write_err = |e: std::io::Error| Error::DownloadWrite {
            path: path.to_path_buf(),
            source: e,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        let file = fs::File::create(path).await.map_err(write_err)?;
        let mut out = BufWriter::new(file);
        let mut written = 0u64;

        while let Some(chunk) = resp.chunk().await.map_err(transport)? {
            out.write_all(&chunk).await.map_err(write_err)?;
            written += chunk.len() as u64;
        }

        out.flush().await.map_err(write_err)?;
        out.into_inner().sync_all().await.map_err(write_err)?;

        debug!(url, bytes = written, "fetch complete");
        Ok(written)
    }
}
