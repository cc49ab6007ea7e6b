//! Collects the codec's decoded lines into a raw image.

use tracing::debug;

use crate::codestream::params::zeroed;
use crate::codestream::{LinePull, SizParams};
use crate::constants::MAXIMUM_COMPONENT_COUNT;
use crate::error::{BridgeError, Operation};
use crate::image_descriptor::ImageDescriptor;
use crate::line_cursor::LineCursors;
use crate::sample_codec::{Subsampling, read_subsampled_line};

/// Decode-side switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    /// Tolerate damaged codestreams instead of failing.
    pub resilient: bool,
    /// Number of highest resolution levels to drop; each halves both dimensions.
    pub reduce_level: u32,
}

impl DecodeOptions {
    pub fn with_resilient(mut self, resilient: bool) -> Self {
        self.resilient = resilient;
        self
    }

    pub fn with_reduce_level(mut self, reduce_level: u32) -> Self {
        self.reduce_level = reduce_level;
        self
    }
}

/// A decoded raw image and its layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub data: Vec<u8>,
    pub descriptor: ImageDescriptor,
}

/// Layout of the decoded raw image: reduced extent, widest component depth.
pub fn output_descriptor(siz: &SizParams, reduce_level: u32) -> Result<ImageDescriptor, BridgeError> {
    let count = siz.component_count();
    let components = u8::try_from(count)
        .ok()
        .filter(|c| *c <= MAXIMUM_COMPONENT_COUNT)
        .ok_or_else(|| {
            BridgeError::invalid(format!(
                "codestream has {count} components, at most {MAXIMUM_COMPONENT_COUNT} are supported"
            ))
        })?;
    let bits_per_sample = siz
        .components
        .iter()
        .map(|c| c.bit_depth)
        .max()
        .unwrap_or(0);
    let signed = siz.components.iter().any(|c| c.is_signed);
    let extent = siz.reduced_extent(reduce_level);
    let descriptor =
        ImageDescriptor::new(extent.x, extent.y, components, bits_per_sample).with_signed(signed);
    descriptor.validate()?;
    Ok(descriptor)
}

/// Decodes through `codec`, scattering every delivered line into the output
/// image. The codec is closed on every path.
pub fn decode_lines<C: LinePull>(
    codec: &mut C,
    options: &DecodeOptions,
    operation: Operation,
) -> Result<DecodedImage, BridgeError> {
    let result = collect_lines(codec, options, operation);
    codec.close();
    result
}

fn collect_lines<C: LinePull>(
    codec: &mut C,
    options: &DecodeOptions,
    operation: Operation,
) -> Result<DecodedImage, BridgeError> {
    if options.resilient {
        codec
            .enable_resilience()
            .map_err(BridgeError::codec(operation))?;
    }
    codec.read_headers().map_err(BridgeError::codec(operation))?;
    if options.reduce_level > 0 {
        codec
            .restrict_input_resolution(options.reduce_level)
            .map_err(BridgeError::codec(operation))?;
    }

    let siz = codec.siz().clone();
    let descriptor = output_descriptor(&siz, options.reduce_level)?;
    codec.create().map_err(BridgeError::codec(operation))?;

    let sampling: Vec<Subsampling> = siz
        .components
        .iter()
        .map(|c| Subsampling::new(c.downsampling.x, c.downsampling.y))
        .collect();
    let mut cursors = LineCursors::new(
        sampling
            .iter()
            .map(|s| s.line_count(descriptor.height))
            .collect(),
    );
    let mut data: Vec<u8> =
        zeroed(descriptor.raw_size()).map_err(BridgeError::codec(operation))?;

    while !cursors.all_complete() {
        let Some(line) = codec.pull().map_err(BridgeError::codec(operation))? else {
            let component = cursors.first_incomplete().unwrap_or_default();
            return Err(BridgeError::protocol(
                operation,
                format!("codec stopped before component {component} was complete"),
            ));
        };
        let component = line.component;
        let Some(&component_sampling) = sampling.get(component as usize) else {
            return Err(BridgeError::protocol(
                operation,
                format!(
                    "codec delivered component {component} of a {}-component image",
                    descriptor.components
                ),
            ));
        };
        let row = cursors.advance(component).ok_or_else(|| {
            BridgeError::protocol(
                operation,
                format!("codec delivered more lines of component {component} than it has"),
            )
        })?;
        read_subsampled_line(&mut data, line.line, &descriptor, component, row, component_sampling)?;
    }

    debug!(
        %operation,
        width = descriptor.width,
        height = descriptor.height,
        components = descriptor.components,
        bits_per_sample = descriptor.bits_per_sample,
        reduce_level = options.reduce_level,
        "image lines collected"
    );
    Ok(DecodedImage { data, descriptor })
}
