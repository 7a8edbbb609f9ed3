//! zlib boundary for payloads.
//!
//! Decoding leans on the zlib frame being self-terminating: the stream ends
//! at its Adler-32 trailer and anything after it (pixel padding, grid slack)
//! is never read. A replacement backend has to keep that property.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::{Compression, Decompress, FlushDecompress, Status};
use log::debug;

use crate::error::{CodecError, Result};

/// Compresses `data` into a single zlib frame at the default level.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| CodecError::Compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CodecError::Compression(e.to_string()))?;

    debug!("Compressed {} bytes into {}", data.len(), compressed.len());
    Ok(compressed)
}

/// Inflates the first zlib frame in `data`, ignoring whatever follows it.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    if data.is_empty() {
        return Err(CodecError::CorruptData("no data to decompress".into()));
    }

    let mut inflater = Decompress::new(true);
    let mut out = Vec::with_capacity(data.len().saturating_mul(4).max(64));

    loop {
        if out.len() == out.capacity() {
            out.reserve(out.capacity());
        }

        let (before_in, before_out) = (inflater.total_in(), inflater.total_out());
        let status = inflater
            .decompress_vec(
                &data[before_in as usize..],
                &mut out,
                FlushDecompress::None,
            )
            .map_err(|e| CodecError::CorruptData(e.to_string()))?;

        if status == Status::StreamEnd {
            break;
        }
        // With output room available, a pass that moves nothing means the
        // input ran out before the end of the frame.
        if inflater.total_in() == before_in && inflater.total_out() == before_out {
            return Err(CodecError::CorruptData("truncated zlib stream".into()));
        }
    }

    debug!(
        "Decompressed {} bytes into {} ({} trailing bytes ignored)",
        inflater.total_in(),
        out.len(),
        data.len() - inflater.total_in() as usize
    );
    Ok(out)
}
