use anyhow::Result;
use async_trait::async_trait;

/// Abstraction over where a compressed report lives
/// This trait lets the fetcher read reports from HTTP endpoints and local
/// files through one interface
#[async_trait]
pub trait ByteReader: Send + Sync {
    /// Read the whole object into memory
    async fn read_all(&self) -> Result<Vec<u8>>;

    /// Human-readable location, for logs
    fn location(&self) -> String;
}
