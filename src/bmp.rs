//! Conversion between bottom-up, BGR-ordered device-independent bitmap pixel
//! arrays and raw images.

use crate::error::BridgeError;
use crate::image_descriptor::ImageDescriptor;

/// Geometry of a bitmap pixel array. Rows are padded to four bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpPixelLayout {
    pub width: u32,
    pub height: u32,
    /// 8 (grayscale), 24 (BGR) or 32 (BGRA).
    pub bits_per_pixel: u16,
    /// First row in memory is the top row of the image.
    pub top_down: bool,
}

impl BmpPixelLayout {
    /// Bottom-up layout.
    pub fn new(width: u32, height: u32, bits_per_pixel: u16) -> Self {
        Self {
            width,
            height,
            bits_per_pixel,
            top_down: false,
        }
    }

    pub fn with_top_down(mut self, top_down: bool) -> Self {
        self.top_down = top_down;
        self
    }

    pub fn bytes_per_pixel(&self) -> usize {
        usize::from(self.bits_per_pixel / 8)
    }

    /// Padded byte length of one pixel row.
    pub fn row_stride(&self) -> usize {
        (self.width as usize * self.bytes_per_pixel() + 3) & !3
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.width == 0 || self.height == 0 {
            return Err(BridgeError::invalid(format!(
                "bitmap dimensions {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if !matches!(self.bits_per_pixel, 8 | 24 | 32) {
            return Err(BridgeError::invalid(format!(
                "unsupported bitmap depth {} (expected 8, 24 or 32)",
                self.bits_per_pixel
            )));
        }
        Ok(())
    }

    fn stored_row(&self, y: usize) -> usize {
        if self.top_down {
            y
        } else {
            self.height as usize - 1 - y
        }
    }
}

/// Swaps the first and third channel of every pixel in place.
fn swap_red_blue(pixels: &mut [u8], channels: usize) {
    if channels >= 3 {
        for pixel in pixels.chunks_exact_mut(channels) {
            pixel.swap(0, 2);
        }
    }
}

/// Converts a bitmap pixel array into an 8-bit raw image.
pub fn bmp_to_raw(
    pixels: &[u8],
    layout: &BmpPixelLayout,
) -> Result<(Vec<u8>, ImageDescriptor), BridgeError> {
    layout.validate()?;
    let stride = layout.row_stride();
    let required = stride
        .checked_mul(layout.height as usize)
        .ok_or_else(|| BridgeError::invalid("bitmap size overflows"))?;
    if pixels.len() < required {
        return Err(BridgeError::invalid(format!(
            "bitmap holds {} bytes, layout requires {required}",
            pixels.len()
        )));
    }

    let channels = layout.bytes_per_pixel();
    let descriptor = ImageDescriptor::new(layout.width, layout.height, channels as u8, 8);
    let row_bytes = descriptor.samples_per_row();
    let mut raw = vec![0u8; descriptor.raw_size()];
    for (y, row) in raw.chunks_exact_mut(row_bytes).enumerate() {
        let start = layout.stored_row(y) * stride;
        row.copy_from_slice(&pixels[start..start + row_bytes]);
        swap_red_blue(row, channels);
    }
    Ok((raw, descriptor))
}

/// Converts an unsigned raw image with 1, 3 or 4 components into a bottom-up
/// bitmap pixel array. Samples wider than 8 bits keep their top 8 bits.
pub fn raw_to_bmp(
    raw: &[u8],
    descriptor: &ImageDescriptor,
) -> Result<(Vec<u8>, BmpPixelLayout), BridgeError> {
    descriptor.check_buffer_len(raw.len())?;
    if !matches!(descriptor.components, 1 | 3 | 4) {
        return Err(BridgeError::invalid(format!(
            "bitmap needs 1, 3 or 4 components, image has {}",
            descriptor.components
        )));
    }
    if descriptor.signed {
        return Err(BridgeError::invalid("bitmap samples must be unsigned"));
    }

    let channels = usize::from(descriptor.components);
    let layout = BmpPixelLayout::new(descriptor.width, descriptor.height, channels as u16 * 8);
    let stride = layout.row_stride();
    let row_samples = descriptor.samples_per_row();
    let narrowed: Vec<u8> = if descriptor.sample_width_bytes() == 2 {
        let shift = descriptor.bits_per_sample - 8;
        raw.chunks_exact(2)
            .map(|word| (u16::from_le_bytes([word[0], word[1]]) >> shift) as u8)
            .collect()
    } else {
        raw.to_vec()
    };

    let mut pixels = vec![0u8; stride * layout.height as usize];
    for (y, row) in narrowed.chunks_exact(row_samples).enumerate() {
        let start = layout.stored_row(y) * stride;
        let destination = &mut pixels[start..start + row_samples];
        destination.copy_from_slice(row);
        swap_red_blue(destination, channels);
    }
    Ok((pixels, layout))
}
