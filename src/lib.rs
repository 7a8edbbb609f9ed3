//! Store any file as a lossless RGBA8 PNG and get it back byte for byte.
//!
//! The file is zlib-compressed, the compressed bytes are packed 32 bits per
//! pixel into a square grid, and the grid is saved as a PNG. No file name or
//! length is stored in the image.

pub mod bits;
pub mod codec;
pub mod compress;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod raster;
pub mod worker;

pub use codec::{decode, encode, Checkpoint, EncodeOutcome, EncodeReport, NoBenefit, Summary};
pub use config::Settings;
pub use diagnostics::DiagnosticLog;
pub use error::{CodecError, Result};
