//! Public entry points: owning-return, caller-buffer and file-path forms of
//! compress and decompress.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use tracing::{debug, warn};

use crate::codestream::{Htj2kDecoder, Htj2kEncoder};
use crate::coding_parameters::CompressionParams;
use crate::error::{BridgeError, Operation};
use crate::image_descriptor::ImageDescriptor;
use crate::line_decoder::{DecodeOptions, DecodedImage, decode_lines};
use crate::line_encoder::encode_lines;

/// Outcome of writing into a caller-owned buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferFill {
    /// The result was copied; holds the number of bytes written.
    Filled(usize),
    /// The buffer was left untouched; holds the number of bytes required.
    TooSmall(usize),
}

impl BufferFill {
    pub fn is_filled(&self) -> bool {
        matches!(self, BufferFill::Filled(_))
    }

    /// Written length, or [`BridgeError::BufferTooSmall`].
    pub fn into_result(self) -> Result<usize, BridgeError> {
        match self {
            BufferFill::Filled(len) => Ok(len),
            BufferFill::TooSmall(required) => Err(BridgeError::BufferTooSmall { required }),
        }
    }
}

fn fill(out: &mut [u8], data: &[u8]) -> BufferFill {
    match out.get_mut(..data.len()) {
        Some(destination) => {
            destination.copy_from_slice(data);
            BufferFill::Filled(data.len())
        }
        None => BufferFill::TooSmall(data.len()),
    }
}

fn io_error(operation: Operation, path: &Path) -> impl FnOnce(std::io::Error) -> BridgeError + '_ {
    move |source| BridgeError::Io {
        operation,
        path: path.to_path_buf(),
        source,
    }
}

fn remove_partial(path: &Path) {
    if let Err(cleanup) = fs::remove_file(path) {
        warn!(path = %path.display(), %cleanup, "could not remove partial codestream");
    }
}

fn check_codestream(codestream: &[u8]) -> Result<(), BridgeError> {
    if codestream.is_empty() {
        return Err(BridgeError::invalid("codestream is empty"));
    }
    Ok(())
}

/// Compresses a raw image into a new codestream.
pub fn compress(
    raw: &[u8],
    descriptor: &ImageDescriptor,
    params: &CompressionParams,
) -> Result<Vec<u8>, BridgeError> {
    let mut codec = Htj2kEncoder::new(Vec::new());
    encode_lines(&mut codec, raw, descriptor, params, Operation::Compress)?;
    let codestream = codec.into_inner();
    debug!(
        raw_bytes = raw.len(),
        codestream_bytes = codestream.len(),
        lossless = params.lossless,
        "image compressed"
    );
    Ok(codestream)
}

/// Compresses into `out`. When `out` is too small it is left untouched and
/// the required size is reported.
pub fn compress_into(
    raw: &[u8],
    descriptor: &ImageDescriptor,
    params: &CompressionParams,
    out: &mut [u8],
) -> Result<BufferFill, BridgeError> {
    let codestream = compress(raw, descriptor, params)?;
    Ok(fill(out, &codestream))
}

/// Decodes a codestream into a new raw image.
pub fn decompress(codestream: &[u8], options: &DecodeOptions) -> Result<DecodedImage, BridgeError> {
    check_codestream(codestream)?;
    let mut codec = Htj2kDecoder::new(codestream);
    decode_lines(&mut codec, options, Operation::Decompress)
}

/// Decodes into `out`, returning the fill outcome and the image layout.
pub fn decompress_into(
    codestream: &[u8],
    out: &mut [u8],
    options: &DecodeOptions,
) -> Result<(BufferFill, ImageDescriptor), BridgeError> {
    let image = decompress(codestream, options)?;
    Ok((fill(out, &image.data), image.descriptor))
}

/// Compresses straight into a file at `path`, returning the bytes written.
/// A partially written file is removed on failure.
pub fn compress_to_file(
    raw: &[u8],
    descriptor: &ImageDescriptor,
    params: &CompressionParams,
    path: impl AsRef<Path>,
) -> Result<u64, BridgeError> {
    let path = path.as_ref();
    let operation = Operation::CompressToFile;
    descriptor.check_buffer_len(raw.len())?;
    params.validate()?;

    let file = File::create(path).map_err(io_error(operation, path))?;
    let mut codec = Htj2kEncoder::new(BufWriter::new(file));
    let result = encode_lines(&mut codec, raw, descriptor, params, operation);
    let written = codec.bytes_written();
    let finished = result.and_then(|()| {
        codec
            .into_inner()
            .into_inner()
            .map_err(|error| io_error(operation, path)(error.into_error()))
    });
    if let Err(error) = finished {
        remove_partial(path);
        return Err(error);
    }
    debug!(path = %path.display(), bytes = written, "codestream written");
    Ok(written)
}

/// Reads and decodes the codestream stored at `path`.
pub fn decompress_from_file(
    path: impl AsRef<Path>,
    options: &DecodeOptions,
) -> Result<DecodedImage, BridgeError> {
    let path = path.as_ref();
    let operation = Operation::DecompressFromFile;
    let codestream = fs::read(path).map_err(io_error(operation, path))?;
    check_codestream(&codestream)?;
    let mut codec = Htj2kDecoder::new(&codestream);
    decode_lines(&mut codec, options, operation)
}
