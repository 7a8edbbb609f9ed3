//! Packing of payload bytes into RGBA8 pixels and back.
//!
//! Every pixel carries one 32-bit chunk of the bitstream, most significant
//! bit first: bits 0..8 go to R, 8..16 to G, 16..24 to B and 24..32 to A.

use image::Rgba;

use crate::layout::{layout, RasterLayout, BITS_PER_PIXEL};

/// An ordered run of bits. The last byte of `bytes` may be only partly used
/// when `bit_len` is not a multiple of 8; unused low bits are always zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitstream {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl Bitstream {
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            bytes: payload.to_vec(),
            bit_len: payload.len() * 8,
        }
    }

    #[cfg(test)]
    fn from_bits<I: IntoIterator<Item = u8>>(bits: I) -> Self {
        let mut bytes = Vec::new();
        let mut bit_len = 0;
        for bit in bits {
            if bit_len % 8 == 0 {
                bytes.push(0);
            }
            if bit & 1 == 1 {
                if let Some(last) = bytes.last_mut() {
                    *last |= 0x80 >> (bit_len % 8);
                }
            }
            bit_len += 1;
        }
        Self { bytes, bit_len }
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Iterates the bits, most significant bit of each byte first.
    #[cfg(test)]
    fn bits(&self) -> impl Iterator<Item = u8> + '_ {
        self.bytes
            .iter()
            .flat_map(|&byte| (0..8).map(move |i| (byte >> (7 - i)) & 1))
            .take(self.bit_len)
    }

    /// Zero bits needed to reach the next 32-bit boundary.
    pub fn padding_len(&self) -> usize {
        let chunk = BITS_PER_PIXEL as usize;
        (chunk - self.bit_len % chunk) % chunk
    }

    /// Appends zero bits up to the next 32-bit boundary and returns how many
    /// were added.
    pub fn pad_to_chunk(&mut self) -> usize {
        let padding = self.padding_len();
        self.bit_len += padding;
        self.bytes.resize(self.bit_len.div_ceil(8), 0);
        padding
    }

    /// Groups the bits into bytes, big-endian. A trailing partial byte is
    /// filled on the right with zero bits.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.bytes.truncate(self.bit_len.div_ceil(8));
        self.bytes
    }
}

/// Output of [`pack`]: the payload pixels plus the grid they belong in.
#[derive(Debug, Clone)]
pub struct PackedGrid {
    /// Only the `layout.pixel_count` payload pixels; slack is left implicit.
    pub pixels: Vec<Rgba<u8>>,
    pub layout: RasterLayout,
    pub padding_bits: usize,
}

impl PackedGrid {
    pub fn width(&self) -> u32 {
        self.layout.width
    }

    pub fn height(&self) -> u32 {
        self.layout.height
    }

    /// Bit length of the payload after padding.
    pub fn padded_bit_len(&self) -> usize {
        self.pixels.len() * BITS_PER_PIXEL as usize
    }
}

/// Packs `payload` into pixels, padding the last chunk with zero bits.
pub fn pack(payload: &[u8]) -> PackedGrid {
    let mut stream = Bitstream::from_payload(payload);
    let grid = layout(stream.bit_len() as u64);
    let padding_bits = stream.pad_to_chunk();

    // Whole chunks only, so this is exact.
    let pixels = stream
        .into_bytes()
        .chunks_exact(4)
        .map(|chunk| Rgba([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect::<Vec<_>>();
    debug_assert_eq!(pixels.len() as u64, grid.pixel_count);

    PackedGrid {
        pixels,
        layout: grid,
        padding_bits,
    }
}

/// Reads every pixel back into a bitstream, R, G, B then A.
///
/// The caller passes the whole grid, slack included; nothing here needs to
/// know how many pixels were real payload.
pub fn unpack<'a, I>(pixels: I) -> Bitstream
where
    I: IntoIterator<Item = &'a Rgba<u8>>,
{
    let bytes = pixels
        .into_iter()
        .flat_map(|pixel| pixel.0)
        .collect::<Vec<u8>>();
    let bit_len = bytes.len() * 8;
    Bitstream { bytes, bit_len }
}
