//! Line-based codestream codec (single tile, JPEG 2000 marker syntax).
//!
//! The bridge only talks to this module through the traits in [`boundary`].
//! [`encoder::Htj2kEncoder`] and [`decoder::Htj2kDecoder`] are the reference
//! implementation of those traits:
//!
//! - `marker` / `writer` / `parser`: marker codes and main-header segments
//!   (SOC, SIZ, COD, QCD, SOT, SOD, EOC).
//! - `packet`: SOP-delimited packets, one per component and resolution.
//! - `subband`: subband geometry of the in-place (Mallat) wavelet layout.
//! - `dwt`: reversible 5/3 and irreversible 9/7 lifting transforms.
//! - `color`: RCT and ICT component transforms.
//! - `quantization`: dead-zone scalar quantization and QCD step encoding.
//! - `block_coder`: code-block sign-magnitude coding.
//! - `bit_io`: byte-stuffed bit reader and writer.

pub mod bit_io;
pub mod block_coder;
pub mod boundary;
pub mod color;
pub mod decoder;
pub mod dwt;
pub mod encoder;
pub mod marker;
pub mod packet;
pub mod params;
pub mod parser;
pub mod quantization;
pub mod subband;
pub mod writer;

pub use boundary::{DecodedLine, LineExchange, LinePull, LineRequest};
pub use decoder::Htj2kDecoder;
pub use encoder::Htj2kEncoder;
pub use params::{CodParams, ComponentSiz, Point, SizParams};
