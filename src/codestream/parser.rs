//! Main header parsing.

use super::marker::{J2kMarker, MARKER_START_BYTE};
use super::params::{CodParams, ComponentSiz, Point, SizParams};
use super::quantization::decode_step;
use super::writer::SOT_SEGMENT_LENGTH;
use crate::coding_parameters::ProgressionOrder;
use crate::constants::{
    MAXIMUM_CODESTREAM_BIT_DEPTH, MAXIMUM_CODESTREAM_COMPONENTS, MAXIMUM_DECOMPOSITION_LEVELS,
};
use crate::error::Htj2kError;

/// Big-endian reader over a codestream.
#[derive(Debug, Clone)]
pub struct J2kReader<'a> {
    source: &'a [u8],
    position: usize,
}

impl<'a> J2kReader<'a> {
    pub fn new(source: &'a [u8]) -> Self {
        Self {
            source,
            position: 0,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.source.len());
    }

    pub fn remaining(&self) -> usize {
        self.source.len() - self.position
    }

    pub fn read_u8(&mut self) -> Result<u8, Htj2kError> {
        let value = *self
            .source
            .get(self.position)
            .ok_or(Htj2kError::NeedMoreData)?;
        self.position += 1;
        Ok(value)
    }

    pub fn read_u16(&mut self) -> Result<u16, Htj2kError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, Htj2kError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], Htj2kError> {
        if self.remaining() < count {
            return Err(Htj2kError::NeedMoreData);
        }
        let bytes = &self.source[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    pub fn skip(&mut self, count: usize) -> Result<(), Htj2kError> {
        self.read_bytes(count).map(|_| ())
    }

    /// Reads a marker. Codes outside [`J2kMarker`] come back as `Err(code)`.
    pub fn read_marker(&mut self) -> Result<Result<J2kMarker, u8>, Htj2kError> {
        if self.read_u8()? != MARKER_START_BYTE {
            return Err(Htj2kError::InvalidData);
        }
        let code = self.read_u8()?;
        Ok(J2kMarker::try_from(code).map_err(|_| code))
    }

    /// True when the next two bytes are `marker`.
    pub fn at_marker(&self, marker: J2kMarker) -> bool {
        self.source
            .get(self.position..self.position + 2)
            .is_some_and(|bytes| bytes == marker.bytes())
    }

    /// Reads a segment length and checks the body is present.
    fn read_segment_length(&mut self) -> Result<usize, Htj2kError> {
        let length = usize::from(self.read_u16()?);
        if length < 2 {
            return Err(Htj2kError::InvalidMarkerSegmentSize);
        }
        if self.remaining() < length - 2 {
            return Err(Htj2kError::NeedMoreData);
        }
        Ok(length - 2)
    }

    pub fn skip_segment(&mut self) -> Result<(), Htj2kError> {
        let body = self.read_segment_length()?;
        self.skip(body)
    }
}

/// Header contents needed to decode the tile data.
#[derive(Debug, Clone, PartialEq)]
pub struct MainHeader {
    pub siz: SizParams,
    pub cod: CodParams,
    /// Offset of the first byte after SOD.
    pub data_offset: usize,
}

/// Parses SOC through SOD of the single tile-part.
pub fn parse_headers(source: &[u8]) -> Result<MainHeader, Htj2kError> {
    let mut reader = J2kReader::new(source);
    match reader.read_marker() {
        Ok(Ok(J2kMarker::StartOfCodestream)) => {}
        _ => return Err(Htj2kError::StartOfCodestreamNotFound),
    }

    let mut siz = None;
    let mut cod = None;
    let mut step = None;
    loop {
        match reader.read_marker()? {
            Ok(J2kMarker::ImageAndTileSize) => siz = Some(parse_siz(&mut reader)?),
            Ok(J2kMarker::CodingStyleDefault) => cod = Some(parse_cod(&mut reader)?),
            Ok(J2kMarker::QuantizationDefault) => step = Some(parse_qcd(&mut reader)?),
            Ok(J2kMarker::StartOfTile) => break,
            Ok(marker) if marker.is_delimiter() => return Err(Htj2kError::UnexpectedMarker),
            _ => reader.skip_segment()?,
        }
    }

    let siz = siz.ok_or(Htj2kError::InvalidData)?;
    let mut cod = cod.ok_or(Htj2kError::InvalidData)?;
    let step = step.ok_or(Htj2kError::InvalidData)?;
    if !cod.reversible {
        cod.quantization_step = step.ok_or(Htj2kError::InvalidData)?;
    }
    if cod.color_transform && !color_transform_applies(&siz) {
        return Err(Htj2kError::ColorTransformNotSupported);
    }

    parse_sot(&mut reader)?;
    loop {
        match reader.read_marker()? {
            Ok(J2kMarker::StartOfData) => break,
            Ok(marker) if marker.is_delimiter() => return Err(Htj2kError::UnexpectedMarker),
            _ => reader.skip_segment()?,
        }
    }

    Ok(MainHeader {
        siz,
        cod,
        data_offset: reader.position(),
    })
}

/// The component transform needs three leading components of equal size.
pub fn color_transform_applies(siz: &SizParams) -> bool {
    siz.components.len() >= 3
        && siz.components[1].downsampling == siz.components[0].downsampling
        && siz.components[2].downsampling == siz.components[0].downsampling
}

fn parse_siz(reader: &mut J2kReader) -> Result<SizParams, Htj2kError> {
    let body = reader.read_segment_length()?;
    if body < 36 {
        return Err(Htj2kError::InvalidMarkerSegmentSize);
    }
    let _capabilities = reader.read_u16()?;
    let width = reader.read_u32()?;
    let height = reader.read_u32()?;
    let origin = (reader.read_u32()?, reader.read_u32()?);
    let tile = (reader.read_u32()?, reader.read_u32()?);
    let tile_origin = (reader.read_u32()?, reader.read_u32()?);
    let count = usize::from(reader.read_u16()?);
    if body != 36 + 3 * count {
        return Err(Htj2kError::InvalidMarkerSegmentSize);
    }
    if width == 0 || height == 0 || origin != (0, 0) || tile_origin != (0, 0) {
        return Err(Htj2kError::InvalidParameterExtent);
    }
    if tile.0 < width || tile.1 < height {
        // only single-tile codestreams are produced and accepted
        return Err(Htj2kError::InvalidData);
    }
    if count == 0 || count > MAXIMUM_CODESTREAM_COMPONENTS {
        return Err(Htj2kError::InvalidParameterComponentCount);
    }

    let mut siz = SizParams::new(width, height);
    for _ in 0..count {
        let precision = reader.read_u8()?;
        let dx = reader.read_u8()?;
        let dy = reader.read_u8()?;
        let bit_depth = (precision & 0x7F) + 1;
        if bit_depth > MAXIMUM_CODESTREAM_BIT_DEPTH {
            return Err(Htj2kError::InvalidParameterBitDepth);
        }
        if dx == 0 || dy == 0 {
            return Err(Htj2kError::InvalidParameterDownsampling);
        }
        siz.components.push(ComponentSiz {
            downsampling: Point::new(u32::from(dx), u32::from(dy)),
            bit_depth,
            is_signed: precision & 0x80 != 0,
        });
    }
    Ok(siz)
}

fn parse_cod(reader: &mut J2kReader) -> Result<CodParams, Htj2kError> {
    let body = reader.read_segment_length()?;
    if body < 10 {
        return Err(Htj2kError::InvalidMarkerSegmentSize);
    }
    let end = reader.position() + body;
    let _style = reader.read_u8()?;
    let progression_order = ProgressionOrder::try_from(reader.read_u8()?)
        .map_err(|_| Htj2kError::InvalidParameterProgressionOrder)?;
    let layers = reader.read_u16()?;
    let color_transform = match reader.read_u8()? {
        0 => false,
        1 => true,
        _ => return Err(Htj2kError::InvalidData),
    };
    let decomposition_levels = reader.read_u8()?;
    let xcb = reader.read_u8()?;
    let ycb = reader.read_u8()?;
    let _block_style = reader.read_u8()?;
    let reversible = match reader.read_u8()? {
        0 => false,
        1 => true,
        _ => return Err(Htj2kError::InvalidData),
    };
    if layers == 0 {
        return Err(Htj2kError::InvalidData);
    }
    if u32::from(decomposition_levels) > MAXIMUM_DECOMPOSITION_LEVELS {
        return Err(Htj2kError::InvalidParameterDecompositionLevels);
    }
    if xcb > 8 || ycb > 8 || xcb + ycb > 8 {
        return Err(Htj2kError::InvalidParameterCodeblockSize);
    }
    reader.set_position(end);

    Ok(CodParams {
        decomposition_levels,
        block_dims: Point::new(1 << (xcb + 2), 1 << (ycb + 2)),
        progression_order,
        color_transform,
        reversible,
        quantization_step: 0.0,
    })
}

/// Returns the base step when QCD signals scalar quantization.
fn parse_qcd(reader: &mut J2kReader) -> Result<Option<f32>, Htj2kError> {
    let body = reader.read_segment_length()?;
    if body < 1 {
        return Err(Htj2kError::InvalidMarkerSegmentSize);
    }
    let end = reader.position() + body;
    let style = reader.read_u8()? & 0x1F;
    let step = match style {
        0 => None,
        1 | 2 => {
            if body < 3 {
                return Err(Htj2kError::InvalidMarkerSegmentSize);
            }
            Some(decode_step(reader.read_u16()?))
        }
        _ => return Err(Htj2kError::InvalidData),
    };
    reader.set_position(end);
    Ok(step)
}

fn parse_sot(reader: &mut J2kReader) -> Result<(), Htj2kError> {
    let length = reader.read_u16()?;
    if length != SOT_SEGMENT_LENGTH {
        return Err(Htj2kError::InvalidMarkerSegmentSize);
    }
    let tile_index = reader.read_u16()?;
    let _tile_part_length = reader.read_u32()?;
    let tile_part = reader.read_u8()?;
    let _tile_parts = reader.read_u8()?;
    if tile_index != 0 || tile_part != 0 {
        return Err(Htj2kError::InvalidData);
    }
    Ok(())
}
