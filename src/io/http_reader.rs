use anyhow::{Context, Result};
use async_trait::async_trait;
use url::Url;

use super::byte_reader::ByteReader;

/// ByteReader implementation for HTTP(S) endpoints
#[derive(Clone)]
pub struct HttpByteReader {
    client: reqwest::Client,
    url: Url,
}

impl HttpByteReader {
    pub fn new(client: reqwest::Client, url: Url) -> Self {
        Self { client, url }
    }
}

#[async_trait]
impl ByteReader for HttpByteReader {
    async fn read_all(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .context("Failed to send report request")?
            .error_for_status()
            .context("Report server returned an error status")?;

        let bytes = response
            .bytes()
            .await
            .context("Failed to read report response body")?
            .to_vec();

        Ok(bytes)
    }

    fn location(&self) -> String {
        self.url.to_string()
    }
}
