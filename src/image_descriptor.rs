//! Geometry and sample format of a raw image buffer.

use crate::constants::{
    MAXIMUM_BITS_PER_SAMPLE, MAXIMUM_COMPONENT_COUNT, MINIMUM_BITS_PER_SAMPLE,
    MINIMUM_COMPONENT_COUNT,
};
use crate::error::BridgeError;

/// Describes a tightly packed, component-interleaved raw image.
///
/// Samples of up to 8 bits occupy one byte; wider samples occupy one
/// little-endian 16-bit word. Rows carry no padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageDescriptor {
    pub width: u32,
    pub height: u32,
    pub components: u8,
    pub bits_per_sample: u8,
    /// Samples are two's complement values of `bits_per_sample` bits.
    pub signed: bool,
    /// Exchange lines with the codec one whole component at a time instead of
    /// row-interleaved. The raw buffer stays interleaved either way.
    pub planar: bool,
}

impl ImageDescriptor {
    /// Unsigned, row-interleaved descriptor.
    pub fn new(width: u32, height: u32, components: u8, bits_per_sample: u8) -> Self {
        Self {
            width,
            height,
            components,
            bits_per_sample,
            signed: false,
            planar: false,
        }
    }

    pub fn with_signed(mut self, signed: bool) -> Self {
        self.signed = signed;
        self
    }

    pub fn with_planar(mut self, planar: bool) -> Self {
        self.planar = planar;
        self
    }

    /// Bytes per sample in the raw buffer: 1 up to 8 bits, 2 above.
    pub fn sample_width_bytes(&self) -> usize {
        if self.bits_per_sample > 8 { 2 } else { 1 }
    }

    /// Samples in one raw row (`width * components`).
    pub fn samples_per_row(&self) -> usize {
        self.width as usize * self.components as usize
    }

    /// Exact byte size of the raw buffer, or `None` if it does not fit in memory.
    pub fn checked_raw_size(&self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)?
            .checked_mul(self.components as usize)?
            .checked_mul(self.sample_width_bytes())
    }

    /// Exact byte size of the raw buffer. Call [`validate`](Self::validate) first
    /// for a checked value.
    pub fn raw_size(&self) -> usize {
        self.checked_raw_size().unwrap_or(usize::MAX)
    }

    /// Largest value a sample can hold.
    pub fn max_sample_value(&self) -> i32 {
        if self.signed {
            (1 << (self.bits_per_sample - 1)) - 1
        } else {
            (1 << self.bits_per_sample) - 1
        }
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.width == 0 || self.height == 0 {
            return Err(BridgeError::invalid(format!(
                "image dimensions {}x{} must be non-zero",
                self.width, self.height
            )));
        }
        if !(MINIMUM_COMPONENT_COUNT..=MAXIMUM_COMPONENT_COUNT).contains(&self.components) {
            return Err(BridgeError::invalid(format!(
                "component count {} outside {MINIMUM_COMPONENT_COUNT}..={MAXIMUM_COMPONENT_COUNT}",
                self.components
            )));
        }
        if !(MINIMUM_BITS_PER_SAMPLE..=MAXIMUM_BITS_PER_SAMPLE).contains(&self.bits_per_sample) {
            return Err(BridgeError::invalid(format!(
                "bits per sample {} outside {MINIMUM_BITS_PER_SAMPLE}..={MAXIMUM_BITS_PER_SAMPLE}",
                self.bits_per_sample
            )));
        }
        if self.checked_raw_size().is_none() {
            return Err(BridgeError::invalid(format!(
                "raw size of {}x{}x{} image overflows",
                self.width, self.height, self.components
            )));
        }
        Ok(())
    }

    /// Validates the descriptor and checks that `len` is exactly its raw size.
    pub fn check_buffer_len(&self, len: usize) -> Result<(), BridgeError> {
        self.validate()?;
        let expected = self.raw_size();
        if len != expected {
            return Err(BridgeError::invalid(format!(
                "raw buffer holds {len} bytes, descriptor requires {expected}"
            )));
        }
        if len % self.sample_width_bytes() != 0 {
            return Err(BridgeError::invalid(format!(
                "raw buffer length {len} is not a multiple of the sample width"
            )));
        }
        Ok(())
    }
}
