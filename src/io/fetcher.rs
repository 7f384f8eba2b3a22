use anyhow::{Context, Result};
use tracing::{info, warn};

use super::gzip::decompress_lines;
use super::{ByteReader, HttpByteReader, LocalFileByteReader, RawLine, SourceUri};
use crate::config::{TlsVerification, USER_AGENT};

/// Downloads a named report and turns it into raw lines
pub struct Fetcher {
    base_url: String,
    http_client: reqwest::Client,
}

impl Fetcher {
    /// Create a fetcher for reports under `base_url`
    pub fn new(base_url: impl Into<String>, tls: TlsVerification) -> Result<Self> {
        if !tls.is_enforced() {
            warn!("TLS certificate verification is disabled for report downloads");
        }

        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .danger_accept_invalid_certs(!tls.is_enforced())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into(),
            http_client,
        })
    }

    /// Create a ByteReader for the report's resolved location
    fn create_reader(&self, file_name: &str) -> Result<Box<dyn ByteReader>> {
        match SourceUri::resolve(&self.base_url, file_name)? {
            SourceUri::Http(url) => Ok(Box::new(HttpByteReader::new(
                self.http_client.clone(),
                url,
            ))),
            SourceUri::Local(path) => Ok(Box::new(LocalFileByteReader::new(path))),
        }
    }

    /// Fetch and decompress a report
    ///
    /// Download and decompression failures are logged and yield an empty line
    /// list. Only a base location that cannot be resolved is returned as an
    /// error.
    pub async fn fetch_lines(&self, file_name: &str) -> Result<Vec<RawLine>> {
        let reader = self.create_reader(file_name)?;
        let location = reader.location();

        let body = match reader.read_all().await {
            Ok(body) => body,
            Err(e) => {
                warn!(%location, "unable to download report: {:#}", e);
                return Ok(Vec::new());
            }
        };

        match decompress_lines(&body) {
            Ok(lines) => {
                info!(
                    %location,
                    compressed_bytes = body.len(),
                    lines = lines.len(),
                    "report downloaded"
                );
                Ok(lines)
            }
            Err(e) => {
                warn!(%location, "unable to decompress report: {:#}", e);
                Ok(Vec::new())
            }
        }
    }
}
