use anyhow::{Result, anyhow};
use std::path::PathBuf;
use url::Url;

/// Where a report file is read from
#[derive(Debug, Clone, PartialEq)]
pub enum SourceUri {
    Http(Url),
    Local(PathBuf),
}

impl SourceUri {
    /// Resolve a report file name against the configured base location
    ///
    /// The base is used as a plain prefix, so it normally ends with `/`.
    pub fn resolve(base: &str, file_name: &str) -> Result<Self> {
        Self::parse(&format!("{}{}", base, file_name))
    }

    /// Parse a URI string into a SourceUri
    pub fn parse(uri: &str) -> Result<Self> {
        // Try parsing as URL first
        if let Ok(url) = Url::parse(uri) {
            match url.scheme() {
                "http" | "https" => {
                    if url.host_str().is_none() {
                        return Err(anyhow!("HTTP URI missing host: {}", uri));
                    }
                    Ok(SourceUri::Http(url))
                }
                "file" => {
                    let path = url
                        .to_file_path()
                        .map_err(|_| anyhow!("Invalid file:// URI: {}", uri))?;
                    Ok(SourceUri::Local(path))
                }
                scheme => Err(anyhow!("Unsupported URI scheme: {}", scheme)),
            }
        } else {
            // Treat as local file path
            Ok(SourceUri::Local(PathBuf::from(uri)))
        }
    }
}
