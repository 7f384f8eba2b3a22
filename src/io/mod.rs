//! I/O layer: locating, downloading and decompressing report files

pub mod byte_reader;
pub mod fetcher;
pub mod gzip;
pub mod http_reader;
pub mod local_reader;
pub mod uri;

pub use byte_reader::ByteReader;
pub use fetcher::Fetcher;
pub use http_reader::HttpByteReader;
pub use local_reader::LocalFileByteReader;
pub use uri::SourceUri;

/// One line of a decompressed report, terminator removed
pub type RawLine = Vec<u8>;
