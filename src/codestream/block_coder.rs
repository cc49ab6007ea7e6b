//! Code-block coding of subband coefficients.
//!
//! A subband is split into code-blocks of the configured size, clipped at the
//! band edge, visited in raster order. Each block starts with a 5-bit
//! magnitude width `b`; each coefficient then takes `b` magnitude bits plus a
//! sign bit (1 = negative) when the magnitude is non-zero. An all-zero block
//! costs only its prefix.

use super::bit_io::{J2kBitReader, J2kBitWriter};
use super::params::Point;
use super::subband::Rect;
use crate::constants::MAGNITUDE_BITS_PREFIX;
use crate::error::Htj2kError;

/// Code-block rectangles covering `band`, in raster order.
pub fn codeblocks(band: Rect, block: Point) -> impl Iterator<Item = Rect> {
    let (bw, bh) = (block.x.max(1) as usize, block.y.max(1) as usize);
    (band.y0..band.y1).step_by(bh).flat_map(move |y0| {
        (band.x0..band.x1).step_by(bw).map(move |x0| {
            Rect::new(x0, y0, (x0 + bw).min(band.x1), (y0 + bh).min(band.y1))
        })
    })
}

pub fn encode_band(
    plane: &[i32],
    stride: usize,
    band: Rect,
    block: Point,
    writer: &mut J2kBitWriter,
) {
    for rect in codeblocks(band, block) {
        let max_magnitude = rows(rect)
            .flat_map(move |y| plane[y * stride + rect.x0..y * stride + rect.x1].iter())
            .map(|value| value.unsigned_abs().min(i32::MAX as u32))
            .max()
            .unwrap_or(0);
        let bits = (u32::BITS - max_magnitude.leading_zeros()) as u8;
        writer.write_bits(u32::from(bits), MAGNITUDE_BITS_PREFIX);
        if bits == 0 {
            continue;
        }
        for y in rows(rect) {
            for &value in &plane[y * stride + rect.x0..y * stride + rect.x1] {
                let magnitude = value.unsigned_abs().min(i32::MAX as u32);
                writer.write_bits(magnitude, bits);
                if magnitude != 0 {
                    writer.write_bit(u8::from(value < 0));
                }
            }
        }
    }
}

/// Decodes `band` into `plane`. On error the band may be partially written.
pub fn decode_band(
    plane: &mut [i32],
    stride: usize,
    band: Rect,
    block: Point,
    reader: &mut J2kBitReader,
) -> Result<(), Htj2kError> {
    for rect in codeblocks(band, block) {
        let bits = reader.read_bits(MAGNITUDE_BITS_PREFIX)? as u8;
        for y in rows(rect) {
            for value in &mut plane[y * stride + rect.x0..y * stride + rect.x1] {
                if bits == 0 {
                    *value = 0;
                    continue;
                }
                let magnitude = reader.read_bits(bits)? as i32;
                *value = if magnitude != 0 && reader.read_bit()? == 1 {
                    -magnitude
                } else {
                    magnitude
                };
            }
        }
    }
    Ok(())
}

/// Zeroes `band` in `plane`.
pub fn clear_band(plane: &mut [i32], stride: usize, band: Rect) {
    for y in rows(band) {
        plane[y * stride + band.x0..y * stride + band.x1].fill(0);
    }
}

fn rows(rect: Rect) -> std::ops::Range<usize> {
    if rect.is_empty() { 0..0 } else { rect.y0..rect.y1 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codeblocks_clip_at_band_edge() {
        let blocks: Vec<Rect> = codeblocks(Rect::new(2, 0, 12, 5), Point::new(4, 4)).collect();
        assert_eq!(blocks.len(), 6);
        assert_eq!(blocks[0], Rect::new(2, 0, 6, 4));
        assert_eq!(blocks[2], Rect::new(10, 0, 12, 4));
        assert_eq!(blocks[5], Rect::new(10, 4, 12, 5));
        assert_eq!(codeblocks(Rect::new(3, 3, 3, 9), Point::new(4, 4)).count(), 0);
    }

    #[test]
    fn test_band_round_trip() {
        let stride = 9;
        let plane: Vec<i32> = (0..stride * 7)
            .map(|i| match i % 5 {
                0 => 0,
                1 => -(i as i32),
                _ => i as i32 * 3,
            })
            .collect();
        let band = Rect::new(1, 2, 8, 7);
        let mut writer = J2kBitWriter::new();
        encode_band(&plane, stride, band, Point::new(4, 4), &mut writer);
        let bytes = writer.finish();

        let mut decoded = vec![0i32; plane.len()];
        let mut reader = J2kBitReader::new(&bytes);
        decode_band(&mut decoded, stride, band, Point::new(4, 4), &mut reader).unwrap();
        for y in 0..7 {
            for x in 0..stride {
                let expected = if x >= 1 && x < 8 && y >= 2 { plane[y * stride + x] } else { 0 };
                assert_eq!(decoded[y * stride + x], expected, "at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_zero_block_costs_prefix_only() {
        let plane = vec![0i32; 64];
        let mut writer = J2kBitWriter::new();
        encode_band(&plane, 8, Rect::new(0, 0, 8, 8), Point::new(8, 8), &mut writer);
        assert_eq!(writer.finish(), vec![0]);
    }

    #[test]
    fn test_truncated_band_fails() {
        let plane = vec![1000i32; 16];
        let mut writer = J2kBitWriter::new();
        encode_band(&plane, 4, Rect::new(0, 0, 4, 4), Point::new(4, 4), &mut writer);
        let bytes = writer.finish();
        let mut decoded = vec![0i32; 16];
        let mut reader = J2kBitReader::new(&bytes[..bytes.len() / 2]);
        let result = decode_band(&mut decoded, 4, Rect::new(0, 0, 4, 4), Point::new(4, 4), &mut reader);
        assert_eq!(result, Err(Htj2kError::NeedMoreData));
    }
}
