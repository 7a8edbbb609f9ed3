//! Grid dimensions for a packed payload.
//!
//! The grid is always square. Nothing about the layout is stored in the
//! image itself; on decode the dimensions come from the image container.

/// Bits carried by a single RGBA8 pixel.
pub const BITS_PER_PIXEL: u64 = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLayout {
    /// Pixels that hold payload bits. Everything after them is slack.
    pub pixel_count: u64,
    pub width: u32,
    pub height: u32,
}

impl RasterLayout {
    /// Total cells in the grid, slack included.
    pub fn cells(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn slack(&self) -> u64 {
        self.cells() - self.pixel_count
    }
}

/// Computes the grid for a payload of `bit_length` bits.
///
/// `width = height = floor(sqrt(pixel_count)) + 1`, which always leaves at
/// least one spare cell, including for an empty payload (1x1).
pub fn layout(bit_length: u64) -> RasterLayout {
    let pixel_count = bit_length.div_ceil(BITS_PER_PIXEL);
    let side = isqrt(pixel_count) + 1;

    RasterLayout {
        pixel_count,
        width: side as u32,
        height: side as u32,
    }
}

/// Largest `r` with `r * r <= n`.
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }

    // Float estimate, then fix up the last-bit rounding error.
    let mut r = (n as f64).sqrt() as u64;
    while r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).map_or(false, |sq| sq <= n) {
        r += 1;
    }
    r
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_gets_one_cell() {
        let grid = layout(0);
        assert_eq!(grid.pixel_count, 0);
        assert_eq!((grid.width, grid.height), (1, 1));
    }

    #[test]
    fn partial_chunk_rounds_up() {
        assert_eq!(layout(1).pixel_count, 1);
        assert_eq!(layout(32).pixel_count, 1);
        assert_eq!(layout(33).pixel_count, 2);
    }

    #[test]
    fn perfect_square_still_grows() {
        // 16 pixels fit a 4x4 grid exactly but the policy always adds a row.
        let grid = layout(16 * 32);
        assert_eq!(grid.pixel_count, 16);
        assert_eq!(grid.width, 5);
        assert_eq!(grid.slack(), 9);
    }

    #[test]
    fn grid_always_covers_payload() {
        for bits in (0..20_000).step_by(7) {
            let grid = layout(bits);
            assert_eq!(grid.width, grid.height);
            assert!(grid.cells() >= bits.div_ceil(32), "bits = {bits}");
        }
    }

    #[test]
    fn isqrt_is_exact_near_squares() {
        for r in [1u64, 2, 3, 255, 4096, 94_906_265, 3_037_000_499] {
            assert_eq!(isqrt(r * r), r);
            assert_eq!(isqrt(r * r - 1), r - 1);
            assert_eq!(isqrt(r * r + 1), r);
        }
        assert_eq!(isqrt(u64::MAX), 4_294_967_295);
    }
}
