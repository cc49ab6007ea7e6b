//! The line exchange boundary between the bridge and a codestream codec.
//!
//! Encoding is pull-based: the codec decides which component line it needs
//! next and lends a buffer for the caller to fill. Decoding is push-based: the
//! codec hands out one reconstructed line at a time together with its component.

use super::params::{CodParams, SizParams};
use crate::error::Htj2kError;

/// A line the encoder wants filled.
#[derive(Debug)]
pub struct LineRequest<'a> {
    pub component: u32,
    pub line: &'a mut [i32],
}

/// A reconstructed line handed out by the decoder.
#[derive(Debug)]
pub struct DecodedLine<'a> {
    pub component: u32,
    pub line: &'a [i32],
}

/// Encoder side of the line exchange protocol.
pub trait LineExchange {
    fn configure(&mut self, siz: SizParams) -> Result<(), Htj2kError>;

    fn configure_coding(&mut self, cod: CodParams) -> Result<(), Htj2kError>;

    /// Request lines component by component instead of row-interleaved.
    fn set_planar(&mut self, planar: bool) -> Result<(), Htj2kError>;

    fn write_headers(&mut self) -> Result<(), Htj2kError>;

    /// Takes back the line lent by the previous call as filled and lends the
    /// next one. `None` once every line of every component was received.
    fn exchange(&mut self) -> Result<Option<LineRequest<'_>>, Htj2kError>;

    fn flush(&mut self) -> Result<(), Htj2kError>;

    /// Releases codec resources. Safe to call in any state.
    fn close(&mut self);
}

/// Decoder side of the line exchange protocol.
pub trait LinePull {
    /// Tolerate damaged or truncated codestreams. Must precede `read_headers`.
    fn enable_resilience(&mut self) -> Result<(), Htj2kError>;

    fn read_headers(&mut self) -> Result<(), Htj2kError>;

    /// Skip the `skipped_levels` highest resolutions; each level halves both
    /// output dimensions.
    fn restrict_input_resolution(&mut self, skipped_levels: u32) -> Result<(), Htj2kError>;

    /// Image parameters read from the headers.
    fn siz(&self) -> &SizParams;

    fn create(&mut self) -> Result<(), Htj2kError>;

    /// Next decoded line, `None` once every line was delivered.
    fn pull(&mut self) -> Result<Option<DecodedLine<'_>>, Htj2kError>;

    /// Releases codec resources. Safe to call in any state.
    fn close(&mut self);
}
