//! Conversion between raw image bytes and the codec's `i32` scanlines.
//!
//! A raw image is tightly packed and component-interleaved: sample `x` of
//! component `c` on row `y` lives at flat index `(y * width + x) * components + c`.
//! Up to 8 bits per sample the index counts bytes; above 8 bits it counts
//! little-endian 16-bit words.

use crate::error::BridgeError;
use crate::image_descriptor::ImageDescriptor;

/// Downsampling factor of a component relative to the raw image grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Subsampling {
    pub dx: u32,
    pub dy: u32,
}

impl Subsampling {
    pub const NONE: Subsampling = Subsampling { dx: 1, dy: 1 };

    pub fn new(dx: u32, dy: u32) -> Self {
        Self { dx, dy }
    }

    /// Samples per component line for an image `width` pixels wide.
    pub fn line_width(&self, width: u32) -> usize {
        width.div_ceil(self.dx) as usize
    }

    /// Component lines for an image `height` pixels tall.
    pub fn line_count(&self, height: u32) -> u32 {
        height.div_ceil(self.dy)
    }
}

impl Default for Subsampling {
    fn default() -> Self {
        Subsampling::NONE
    }
}

/// Fills `dst` with row `row` of `component` taken from the raw image `src`.
pub fn write_line(
    dst: &mut [i32],
    src: &[u8],
    descriptor: &ImageDescriptor,
    component: u32,
    row: u32,
) -> Result<(), BridgeError> {
    write_subsampled_line(dst, src, descriptor, component, row, Subsampling::NONE)
}

/// Scatters the codec line `src` into row `row` of `component` in the raw image `dst`.
pub fn read_line(
    dst: &mut [u8],
    src: &[i32],
    descriptor: &ImageDescriptor,
    component: u32,
    row: u32,
) -> Result<(), BridgeError> {
    read_subsampled_line(dst, src, descriptor, component, row, Subsampling::NONE)
}

/// Like [`write_line`] for a component sampled every `dx` pixels and `dy` rows.
/// Line sample `x` of component row `row` is raw pixel `(x * dx, row * dy)`.
pub fn write_subsampled_line(
    dst: &mut [i32],
    src: &[u8],
    descriptor: &ImageDescriptor,
    component: u32,
    row: u32,
    sampling: Subsampling,
) -> Result<(), BridgeError> {
    check_line_site(src.len(), descriptor, component, row, sampling)?;
    let count = sampling.line_width(descriptor.width);
    let available = dst.len();
    let line = dst.get_mut(..count).ok_or_else(|| {
        BridgeError::invalid(format!(
            "line buffer holds {available} samples, component {component} needs {count}"
        ))
    })?;

    let width = descriptor.width as usize;
    let components = descriptor.components as usize;
    let y = row as usize * sampling.dy as usize;
    let dx = sampling.dx as usize;
    let c = component as usize;

    if descriptor.bits_per_sample <= 8 {
        for (x, value) in line.iter_mut().enumerate() {
            let byte = src[(y * width + x * dx) * components + c];
            *value = if descriptor.signed {
                i32::from(byte as i8)
            } else {
                i32::from(byte)
            };
        }
    } else {
        for (x, value) in line.iter_mut().enumerate() {
            let word = 2 * ((y * width + x * dx) * components + c);
            let bytes = [src[word], src[word + 1]];
            *value = if descriptor.signed {
                i32::from(i16::from_le_bytes(bytes))
            } else {
                i32::from(u16::from_le_bytes(bytes))
            };
        }
    }
    Ok(())
}

/// Like [`read_line`] for a subsampled component: every line sample is
/// replicated over its `dx * dy` block of raw pixels, clipped at the image edge.
pub fn read_subsampled_line(
    dst: &mut [u8],
    src: &[i32],
    descriptor: &ImageDescriptor,
    component: u32,
    row: u32,
    sampling: Subsampling,
) -> Result<(), BridgeError> {
    check_line_site(dst.len(), descriptor, component, row, sampling)?;
    let count = sampling.line_width(descriptor.width);
    if src.len() < count {
        return Err(BridgeError::invalid(format!(
            "decoded line holds {} samples, component {component} needs {count}",
            src.len()
        )));
    }

    let width = descriptor.width as usize;
    let components = descriptor.components as usize;
    let dx = sampling.dx as usize;
    let c = component as usize;
    let first_row = row * sampling.dy;
    let last_row = (first_row + sampling.dy).min(descriptor.height);

    for y in first_row as usize..last_row as usize {
        if descriptor.bits_per_sample <= 8 {
            for x in 0..width {
                dst[(y * width + x) * components + c] = src[x / dx] as u8;
            }
        } else {
            for x in 0..width {
                let word = 2 * ((y * width + x) * components + c);
                let bytes = (src[x / dx] as u16).to_le_bytes();
                dst[word] = bytes[0];
                dst[word + 1] = bytes[1];
            }
        }
    }
    Ok(())
}

fn check_line_site(
    raw_len: usize,
    descriptor: &ImageDescriptor,
    component: u32,
    row: u32,
    sampling: Subsampling,
) -> Result<(), BridgeError> {
    descriptor.check_buffer_len(raw_len)?;
    if component >= u32::from(descriptor.components) {
        return Err(BridgeError::invalid(format!(
            "component {component} outside image with {} components",
            descriptor.components
        )));
    }
    if sampling.dx == 0 || sampling.dy == 0 {
        return Err(BridgeError::invalid("subsampling factors must be non-zero"));
    }
    let rows = sampling.line_count(descriptor.height);
    if row >= rows {
        return Err(BridgeError::invalid(format!(
            "row {row} outside component {component} with {rows} rows"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_line_8bit_interleaved() {
        // 3x2 image, 2 components: c0 = 10*y + x, c1 = 100 + x
        let descriptor = ImageDescriptor::new(3, 2, 2, 8);
        let raw: Vec<u8> = (0..2u8)
            .flat_map(|y| (0..3u8).flat_map(move |x| [10 * y + x, 100 + x]))
            .collect();

        let mut line = [0i32; 3];
        write_line(&mut line, &raw, &descriptor, 0, 1).unwrap();
        assert_eq!(line, [10, 11, 12]);
        write_line(&mut line, &raw, &descriptor, 1, 0).unwrap();
        assert_eq!(line, [100, 101, 102]);
    }

    #[test]
    fn test_write_line_16bit_little_endian_words() {
        let descriptor = ImageDescriptor::new(2, 1, 1, 12);
        let raw = [0x34, 0x12, 0xFF, 0x0F];
        let mut line = [0i32; 2];
        write_line(&mut line, &raw, &descriptor, 0, 0).unwrap();
        assert_eq!(line, [0x1234, 0x0FFF]);
    }

    #[test]
    fn test_signed_samples_are_sign_extended() {
        let descriptor = ImageDescriptor::new(2, 1, 1, 8).with_signed(true);
        let mut line = [0i32; 2];
        write_line(&mut line, &[0xFF, 0x7F], &descriptor, 0, 0).unwrap();
        assert_eq!(line, [-1, 127]);

        let descriptor = ImageDescriptor::new(1, 1, 1, 16).with_signed(true);
        let mut line = [0i32; 1];
        write_line(&mut line, &[0x00, 0x80], &descriptor, 0, 0).unwrap();
        assert_eq!(line, [-32768]);

        let mut raw = [0u8; 2];
        read_line(&mut raw, &[-32768], &descriptor, 0, 0).unwrap();
        assert_eq!(raw, [0x00, 0x80]);
    }

    #[test]
    fn test_read_line_scatters_one_component() {
        let descriptor = ImageDescriptor::new(2, 2, 3, 8);
        let mut raw = vec![0u8; descriptor.raw_size()];
        read_line(&mut raw, &[7, 8], &descriptor, 2, 1).unwrap();
        assert_eq!(raw, [0, 0, 0, 0, 0, 0, 0, 0, 7, 0, 0, 8]);
    }

    #[test]
    fn test_read_line_16bit() {
        let descriptor = ImageDescriptor::new(2, 1, 2, 16);
        let mut raw = vec![0u8; descriptor.raw_size()];
        read_line(&mut raw, &[0xABCD, 0x0102], &descriptor, 1, 0).unwrap();
        assert_eq!(raw, [0, 0, 0xCD, 0xAB, 0, 0, 0x02, 0x01]);
    }

    #[test]
    fn test_longer_codec_line_is_accepted() {
        let descriptor = ImageDescriptor::new(2, 1, 1, 8);
        let mut line = [-1i32; 4];
        write_line(&mut line, &[1, 2], &descriptor, 0, 0).unwrap();
        assert_eq!(line, [1, 2, -1, -1]);
    }

    #[test]
    fn test_rejects_bad_sites() {
        let descriptor = ImageDescriptor::new(2, 2, 1, 8);
        let raw = [0u8; 4];
        let mut line = [0i32; 2];
        assert!(write_line(&mut line, &raw, &descriptor, 1, 0).is_err());
        assert!(write_line(&mut line, &raw, &descriptor, 0, 2).is_err());
        assert!(write_line(&mut line[..1], &raw, &descriptor, 0, 0).is_err());
        assert!(write_line(&mut line, &raw[..3], &descriptor, 0, 0).is_err());

        let mut short = [0u8; 3];
        assert!(read_line(&mut short, &[1, 2], &descriptor, 0, 0).is_err());
        let mut out = [0u8; 4];
        assert!(read_line(&mut out, &[1], &descriptor, 0, 0).is_err());
        assert_eq!(out, [0u8; 4]);
    }

    #[test]
    fn test_subsampled_round_trip_replicates_blocks() {
        // 3x3 image, component 1 downsampled by 2x2
        let descriptor = ImageDescriptor::new(3, 3, 2, 8);
        let sampling = Subsampling::new(2, 2);
        assert_eq!(sampling.line_width(3), 2);
        assert_eq!(sampling.line_count(3), 2);

        let mut raw: Vec<u8> = vec![0; descriptor.raw_size()];
        for (i, pixel) in raw.chunks_exact_mut(2).enumerate() {
            pixel[1] = i as u8;
        }
        let mut line = [0i32; 2];
        write_subsampled_line(&mut line, &raw, &descriptor, 1, 1, sampling).unwrap();
        // raw pixels (0,2) and (2,2)
        assert_eq!(line, [6, 8]);

        let mut out = vec![0u8; descriptor.raw_size()];
        read_subsampled_line(&mut out, &[5, 9], &descriptor, 1, 0, sampling).unwrap();
        let c1: Vec<u8> = out.chunks_exact(2).map(|p| p[1]).collect();
        assert_eq!(c1, [5, 5, 9, 5, 5, 9, 0, 0, 0]);
    }
}
