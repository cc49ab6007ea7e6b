//! Drives the codec's pull-based line exchange during encode.

use tracing::{debug, trace};

use crate::codestream::{CodParams, ComponentSiz, LineExchange, Point, SizParams};
use crate::coding_parameters::CompressionParams;
use crate::error::{BridgeError, Operation};
use crate::image_descriptor::ImageDescriptor;
use crate::line_cursor::LineCursors;
use crate::sample_codec::{Subsampling, write_subsampled_line};

/// Image parameters handed to the codec for `descriptor`.
pub fn image_siz(descriptor: &ImageDescriptor, params: &CompressionParams) -> SizParams {
    let mut siz = SizParams::new(descriptor.width, descriptor.height);
    for c in 0..descriptor.components {
        let component = ComponentSiz::new(descriptor.bits_per_sample, descriptor.signed);
        siz.components.push(if c > 0 && params.chroma_subsample {
            component.with_downsampling(2, 2)
        } else {
            component
        });
    }
    siz
}

/// Coding parameters handed to the codec. `params` must be validated.
pub fn coding_params(descriptor: &ImageDescriptor, params: &CompressionParams) -> CodParams {
    CodParams {
        decomposition_levels: params.decomposition_levels as u8,
        block_dims: Point::new(params.codeblock_width, params.codeblock_height),
        progression_order: params.progression_order,
        color_transform: params.color_transform_for(descriptor.components),
        reversible: params.lossless,
        quantization_step: if params.lossless {
            0.0
        } else {
            params.quantization_step
        },
    }
}

/// Encodes `raw` through `codec`, answering each line request with the
/// matching component row. The codec is closed on every path.
pub fn encode_lines<C: LineExchange>(
    codec: &mut C,
    raw: &[u8],
    descriptor: &ImageDescriptor,
    params: &CompressionParams,
    operation: Operation,
) -> Result<(), BridgeError> {
    let result = exchange_lines(codec, raw, descriptor, params, operation);
    codec.close();
    result
}

fn exchange_lines<C: LineExchange>(
    codec: &mut C,
    raw: &[u8],
    descriptor: &ImageDescriptor,
    params: &CompressionParams,
    operation: Operation,
) -> Result<(), BridgeError> {
    descriptor.check_buffer_len(raw.len())?;
    params.validate()?;

    let siz = image_siz(descriptor, params);
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

    codec
        .configure(siz)
        .map_err(BridgeError::codec(operation))?;
    codec
        .configure_coding(coding_params(descriptor, params))
        .map_err(BridgeError::codec(operation))?;
    codec
        .set_planar(descriptor.planar)
        .map_err(BridgeError::codec(operation))?;
    codec
        .write_headers()
        .map_err(BridgeError::codec(operation))?;

    let mut lines = 0usize;
    while let Some(request) = codec.exchange().map_err(BridgeError::codec(operation))? {
        let component = request.component;
        let Some(&component_sampling) = sampling.get(component as usize) else {
            return Err(BridgeError::protocol(
                operation,
                format!(
                    "codec requested component {component} of a {}-component image",
                    descriptor.components
                ),
            ));
        };
        let row = cursors.advance(component).ok_or_else(|| {
            BridgeError::protocol(
                operation,
                format!("codec requested more lines of component {component} than it has"),
            )
        })?;
        trace!(component, row, "line requested");
        write_subsampled_line(request.line, raw, descriptor, component, row, component_sampling)?;
        lines += 1;
    }

    if let Some(component) = cursors.first_incomplete() {
        return Err(BridgeError::protocol(
            operation,
            format!("codec finished before component {component} was complete"),
        ));
    }
    codec.flush().map_err(BridgeError::codec(operation))?;
    debug!(
        %operation,
        width = descriptor.width,
        height = descriptor.height,
        components = descriptor.components,
        lines,
        "image lines exchanged"
    );
    Ok(())
}
