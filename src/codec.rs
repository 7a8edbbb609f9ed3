//! File ⇄ image conversion.
//!
//! Encode: compress, pack the compressed bytes into RGBA8 pixels, write a
//! PNG. Decode: read every pixel back, inflate, write the recovered bytes.
//! Encoding is declined when compression does not shrink the input.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView, RgbaImage};
use log::{debug, info};
use serde::Serialize;

use crate::bits::{pack, unpack};
use crate::compress::{compress, decompress};
use crate::config::Settings;
use crate::diagnostics::{report, DiagnosticLog};
use crate::error::{CodecError, Result};
use crate::raster;

/// Coarse progress points of a conversion, in the order they are reached.
///
/// `Transformed` follows compression on encode and pixel unpacking on
/// decode; `Converted` follows pixel packing on encode and decompression on
/// decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Checkpoint {
    Started,
    Loaded,
    Transformed,
    Converted,
    Written,
    Finished,
}

impl Checkpoint {
    pub fn percent(self) -> u8 {
        match self {
            Checkpoint::Started => 0,
            Checkpoint::Loaded => 20,
            Checkpoint::Transformed => 50,
            Checkpoint::Converted => 70,
            Checkpoint::Written => 90,
            Checkpoint::Finished => 100,
        }
    }
}

/// Receiver of [`Checkpoint`]s. Any `Fn(Checkpoint)` closure qualifies.
pub trait Progress {
    fn report(&self, checkpoint: Checkpoint);
}

impl<F: Fn(Checkpoint)> Progress for F {
    fn report(&self, checkpoint: Checkpoint) {
        self(checkpoint)
    }
}

/// Size accounting for a successful encode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EncodeReport {
    pub original_size: usize,
    pub compressed_size: usize,
    pub width: u32,
    pub height: u32,
    pub pixel_count: u64,
    pub padding_bits: usize,
}

impl EncodeReport {
    /// `(1 - compressed / original) * 100`
    pub fn compression_percentage(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (1.0 - self.compressed_size as f64 / self.original_size as f64) * 100.0
    }
}

/// Encode was declined: compression did not make the payload smaller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NoBenefit {
    pub original_size: usize,
    pub compressed_size: usize,
}

#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub image: RgbaImage,
    pub report: EncodeReport,
}

#[derive(Debug, Clone)]
pub enum EncodeOutcome {
    Encoded(EncodedImage),
    Aborted(NoBenefit),
}

/// Turns `payload` into an image, or declines when compression doesn't help.
pub fn encode(payload: &[u8], progress: &dyn Progress) -> Result<EncodeOutcome> {
    let compressed = compress(payload)?;
    progress.report(Checkpoint::Transformed);

    if compressed.len() >= payload.len() {
        info!(
            "Compression gave no benefit ({} -> {} bytes), not encoding",
            payload.len(),
            compressed.len()
        );
        return Ok(EncodeOutcome::Aborted(NoBenefit {
            original_size: payload.len(),
            compressed_size: compressed.len(),
        }));
    }

    let grid = pack(&compressed);
    debug!(
        "Packed {} bytes into {} pixels ({} padding bits) on a {}x{} grid",
        compressed.len(),
        grid.layout.pixel_count,
        grid.padding_bits,
        grid.width(),
        grid.height()
    );
    let image = raster::render(&grid);
    progress.report(Checkpoint::Converted);

    Ok(EncodeOutcome::Encoded(EncodedImage {
        image,
        report: EncodeReport {
            original_size: payload.len(),
            compressed_size: compressed.len(),
            width: grid.width(),
            height: grid.height(),
            pixel_count: grid.layout.pixel_count,
            padding_bits: grid.padding_bits,
        },
    }))
}

/// Recovers the original bytes from an image produced by [`encode`].
pub fn decode(img: &DynamicImage, progress: &dyn Progress) -> Result<Vec<u8>> {
    let bytes = unpack(&raster::pixels(img)).into_bytes();
    progress.report(Checkpoint::Transformed);

    let payload = decompress(&bytes)?;
    progress.report(Checkpoint::Converted);
    Ok(payload)
}

/// Result of a file-level conversion.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Summary {
    Encoded {
        output: PathBuf,
        #[serde(flatten)]
        report: EncodeReport,
    },
    Aborted(NoBenefit),
    Decoded {
        output: PathBuf,
        size: usize,
    },
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Encoded { output, report } => write!(
                f,
                "File converted to image successfully: {}\n\
                 Original Size: {} bytes\n\
                 Compressed Size: {} bytes\n\
                 Compression Efficiency: {:.2}%",
                output.display(),
                report.original_size,
                report.compressed_size,
                report.compression_percentage()
            ),
            Summary::Aborted(_) => write!(
                f,
                "Compressed file is not smaller than the original. No file saved."
            ),
            Summary::Decoded { output, .. } => write!(
                f,
                "Image converted to file successfully: {}",
                output.display()
            ),
        }
    }
}

/// Reads `input`, encodes it and writes the PNG into `output_dir`.
/// Failures are also recorded in `log`.
pub fn encode_file(
    input: &Path,
    output_dir: &Path,
    settings: &Settings,
    progress: &dyn Progress,
    log: Option<&DiagnosticLog>,
) -> Result<Summary> {
    let result = encode_file_inner(input, output_dir, settings, progress);
    if let Err(e) = &result {
        report(log, "encode_file", &e.to_string());
    }
    result
}

fn encode_file_inner(
    input: &Path,
    output_dir: &Path,
    settings: &Settings,
    progress: &dyn Progress,
) -> Result<Summary> {
    progress.report(Checkpoint::Started);
    let file_data = fs::read(input)?;
    info!("Read '{}' ({} bytes)", input.display(), file_data.len());
    progress.report(Checkpoint::Loaded);

    let encoded = match encode(&file_data, progress)? {
        EncodeOutcome::Encoded(encoded) => encoded,
        // Nothing was written, so progress stops short of `Finished`.
        EncodeOutcome::Aborted(no_benefit) => return Ok(Summary::Aborted(no_benefit)),
    };

    let output = settings.image_path(input, output_dir);
    write_atomically(&output, &raster::to_png(&encoded.image)?)?;
    info!(
        "Saved {}x{} image to '{}'",
        encoded.report.width,
        encoded.report.height,
        output.display()
    );
    progress.report(Checkpoint::Written);

    progress.report(Checkpoint::Finished);
    Ok(Summary::Encoded {
        output,
        report: encoded.report,
    })
}

/// Reads the image at `input`, decodes it and writes the data into
/// `output_dir`. Failures are also recorded in `log`.
pub fn decode_file(
    input: &Path,
    output_dir: &Path,
    settings: &Settings,
    progress: &dyn Progress,
    log: Option<&DiagnosticLog>,
) -> Result<Summary> {
    let result = decode_file_inner(input, output_dir, settings, progress);
    if let Err(e) = &result {
        report(log, "decode_file", &e.to_string());
    }
    result
}

fn decode_file_inner(
    input: &Path,
    output_dir: &Path,
    settings: &Settings,
    progress: &dyn Progress,
) -> Result<Summary> {
    progress.report(Checkpoint::Started);
    let img = raster::load(input)?;
    let (width, height) = img.dimensions();
    info!("Loaded '{}' ({}x{})", input.display(), width, height);
    progress.report(Checkpoint::Loaded);

    let payload = decode(&img, progress)?;

    let output = settings.data_path(input, output_dir);
    write_atomically(&output, &payload)?;
    info!("Saved {} bytes to '{}'", payload.len(), output.display());
    progress.report(Checkpoint::Written);

    progress.report(Checkpoint::Finished);
    Ok(Summary::Decoded {
        output,
        size: payload.len(),
    })
}

/// Writes to a sibling temp file, then renames it over `path`, so a failed
/// write never leaves a partial file at `path`.
fn write_atomically(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".partial");
    let tmp = path.with_file_name(tmp_name);

    if let Err(e) = fs::write(&tmp, contents).and_then(|_| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(CodecError::Io(e));
    }
    Ok(())
}
