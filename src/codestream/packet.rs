//! Packets: one per (component, resolution) pair, each behind an SOP marker.
//!
//! Layout after SOP: component (u16), resolution (u8), body length (u32),
//! then the byte-stuffed body.

use super::marker::J2kMarker;
use super::parser::J2kReader;
use super::writer::J2kWriter;
use crate::coding_parameters::ProgressionOrder;
use crate::error::Htj2kError;

/// Fields following the SOP segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub sequence: u16,
    pub component: u16,
    pub resolution: u8,
    pub body_length: u32,
}

pub fn write_packet(writer: &mut J2kWriter, header: &PacketHeader, body: &[u8]) {
    writer.write_sop(header.sequence);
    writer.write_u16(header.component);
    writer.write_byte(header.resolution);
    writer.write_u32(body.len() as u32);
    writer.write_bytes(body);
}

/// Reads a packet header at the reader position, which must be an SOP marker.
pub fn read_packet_header(reader: &mut J2kReader) -> Result<PacketHeader, Htj2kError> {
    match reader.read_marker()? {
        Ok(J2kMarker::StartOfPacket) => {}
        _ => return Err(Htj2kError::UnexpectedMarker),
    }
    if reader.read_u16()? != 4 {
        return Err(Htj2kError::InvalidMarkerSegmentSize);
    }
    Ok(PacketHeader {
        sequence: reader.read_u16()?,
        component: reader.read_u16()?,
        resolution: reader.read_u8()?,
        body_length: reader.read_u32()?,
    })
}

/// Position of the next SOP marker at or after `from`.
pub fn find_next_packet(source: &[u8], from: usize) -> Option<usize> {
    let marker = J2kMarker::StartOfPacket.bytes();
    source
        .get(from..)?
        .windows(2)
        .position(|pair| pair == marker)
        .map(|offset| from + offset)
}

/// Packet sequence as (component, resolution) pairs for a progression order.
pub fn packet_order(
    order: ProgressionOrder,
    components: usize,
    resolutions: usize,
) -> Vec<(usize, usize)> {
    let mut sequence = Vec::with_capacity(components * resolutions);
    if order.is_resolution_major() {
        for resolution in 0..resolutions {
            for component in 0..components {
                sequence.push((component, resolution));
            }
        }
    } else {
        for component in 0..components {
            for resolution in 0..resolutions {
                sequence.push((component, resolution));
            }
        }
    }
    sequence
}
