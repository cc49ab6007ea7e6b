//! Streaming bridge between raw, component-interleaved image buffers and a
//! line-based HTJ2K codestream codec.
//!
//! The codec asks for (encode) or hands out (decode) one component line at a
//! time; the bridge converts between those `i32` lines and the packed 8-bit or
//! little-endian 16-bit samples of the raw buffer.

pub mod bmp;
pub mod codestream;
pub mod coding_parameters;
pub mod constants;
pub mod error;
pub mod image_descriptor;
pub mod line_cursor;
pub mod line_decoder;
pub mod line_encoder;
pub mod processor;
pub mod sample_codec;

pub use bmp::{BmpPixelLayout, bmp_to_raw, raw_to_bmp};
pub use coding_parameters::{CompressionParams, ProgressionOrder};
pub use error::{BridgeError, ErrorKind, Htj2kError, Operation};
pub use image_descriptor::ImageDescriptor;
pub use line_decoder::{DecodeOptions, DecodedImage, decode_lines};
pub use line_encoder::encode_lines;
pub use processor::{
    BufferFill, compress, compress_into, compress_to_file, decompress, decompress_from_file,
    decompress_into,
};
