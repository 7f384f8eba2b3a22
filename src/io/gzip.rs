//! Gzip decompression of downloaded reports into raw lines.

use std::io::{BufRead, BufReader};

use anyhow::{Context, Result};
use flate2::read::MultiGzDecoder;

use super::RawLine;

/// Decompress a gzip body and split it on `\n`
///
/// Line terminators are stripped (a trailing `\r` too). A final line without a
/// terminator is kept; the empty tail after a trailing newline is not a line.
/// Concatenated gzip members are read as one stream.
pub fn decompress_lines(body: &[u8]) -> Result<Vec<RawLine>> {
    let reader = BufReader::new(MultiGzDecoder::new(body));

    let mut lines = Vec::new();
    for line in reader.split(b'\n') {
        let mut line = line.context("Failed to decompress gzip stream")?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        lines.push(line);
    }

    Ok(lines)
}
