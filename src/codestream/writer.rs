use super::marker::J2kMarker;
use super::params::{CodParams, SizParams};
use super::quantization::encode_step;
use super::subband::SubbandOrientation;
use crate::constants::GUARD_BITS;

/// Length of the SOT segment body plus its length field.
pub const SOT_SEGMENT_LENGTH: u16 = 10;

/// Coding style flag: packets are preceded by SOP markers.
pub const SCOD_SOP_MARKERS: u8 = 0x02;

fn subband_count(cod: &CodParams) -> usize {
    1 + 3 * usize::from(cod.decomposition_levels)
}

/// Big-endian marker segment writer over a growable buffer.
#[derive(Debug, Default)]
pub struct J2kWriter {
    data: Vec<u8>,
}

impl J2kWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Hands out the bytes written so far and starts over.
    pub fn take(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.data)
    }

    pub fn write_byte(&mut self, value: u8) {
        self.data.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.data.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.data.extend_from_slice(data);
    }

    pub fn write_marker(&mut self, marker: J2kMarker) {
        self.write_bytes(&marker.bytes());
    }

    pub fn write_soc(&mut self) {
        self.write_marker(J2kMarker::StartOfCodestream);
    }

    pub fn write_eoc(&mut self) {
        self.write_marker(J2kMarker::EndOfCodestream);
    }

    /// SIZ with a single tile covering the image.
    pub fn write_siz(&mut self, siz: &SizParams) {
        self.write_marker(J2kMarker::ImageAndTileSize);
        // Lsiz: 38 fixed bytes + 3 per component
        let length = 38 + 3 * siz.components.len();
        self.write_u16(length as u16);
        self.write_u16(0); // Rsiz
        self.write_u32(siz.extent.x);
        self.write_u32(siz.extent.y);
        self.write_u32(0); // XOsiz
        self.write_u32(0); // YOsiz
        self.write_u32(siz.extent.x);
        self.write_u32(siz.extent.y);
        self.write_u32(0); // XTOsiz
        self.write_u32(0); // YTOsiz
        self.write_u16(siz.components.len() as u16);
        for component in &siz.components {
            let sign = if component.is_signed { 0x80 } else { 0 };
            self.write_byte(sign | (component.bit_depth - 1));
            self.write_byte(component.downsampling.x as u8);
            self.write_byte(component.downsampling.y as u8);
        }
    }

    pub fn write_cod(&mut self, cod: &CodParams) {
        self.write_marker(J2kMarker::CodingStyleDefault);
        self.write_u16(12);
        self.write_byte(SCOD_SOP_MARKERS);

        // SGcod
        self.write_byte(u8::from(cod.progression_order));
        self.write_u16(1); // layers
        self.write_byte(u8::from(cod.color_transform));

        // SPcod
        self.write_byte(cod.decomposition_levels);
        self.write_byte(cod.block_dims.x.trailing_zeros() as u8 - 2);
        self.write_byte(cod.block_dims.y.trailing_zeros() as u8 - 2);
        self.write_byte(0); // code-block style
        self.write_byte(u8::from(cod.reversible));
    }

    /// QCD: exponents only for the reversible path, one derived step otherwise.
    /// Reversible exponents follow component 0; see [`write_qcc`](Self::write_qcc).
    pub fn write_qcd(&mut self, cod: &CodParams, siz: &SizParams) {
        self.write_marker(J2kMarker::QuantizationDefault);
        if cod.reversible {
            let depth = siz.components.first().map_or(8, |c| c.bit_depth);
            self.write_u16((3 + subband_count(cod)) as u16);
            self.write_exponents(cod, depth);
        } else {
            self.write_u16(5);
            self.write_byte((GUARD_BITS << 5) | 0x01);
            self.write_u16(encode_step(cod.quantization_step));
        }
    }

    /// QCC for every component whose reversible exponents differ from the QCD
    /// ones. The irreversible step is relative to each component's range, so
    /// QCD alone covers it.
    pub fn write_qcc(&mut self, cod: &CodParams, siz: &SizParams) {
        let Some(first) = siz.components.first() else {
            return;
        };
        if !cod.reversible {
            return;
        }
        let wide_index = siz.component_count() > 256;
        for (c, component) in siz.components.iter().enumerate().skip(1) {
            if component.bit_depth == first.bit_depth {
                continue;
            }
            self.write_marker(J2kMarker::QuantizationComponent);
            let index_bytes = if wide_index { 2 } else { 1 };
            self.write_u16((2 + index_bytes + 1 + subband_count(cod)) as u16);
            if wide_index {
                self.write_u16(c as u16);
            } else {
                self.write_byte(c as u8);
            }
            self.write_exponents(cod, component.bit_depth);
        }
    }

    /// Sqcx followed by one exponent byte per subband, LL first.
    fn write_exponents(&mut self, cod: &CodParams, depth: u8) {
        self.write_byte(GUARD_BITS << 5);
        self.write_byte(depth << 3);
        for _ in 0..cod.decomposition_levels {
            for orientation in [
                SubbandOrientation::Hl,
                SubbandOrientation::Lh,
                SubbandOrientation::Hh,
            ] {
                self.write_byte((depth + orientation.gain()) << 3);
            }
        }
    }

    /// SOT of the only tile-part; Psot 0 means "until EOC".
    pub fn write_sot(&mut self) {
        self.write_marker(J2kMarker::StartOfTile);
        self.write_u16(SOT_SEGMENT_LENGTH);
        self.write_u16(0); // Isot
        self.write_u32(0); // Psot
        self.write_byte(0); // TPsot
        self.write_byte(1); // TNsot
    }

    pub fn write_sod(&mut self) {
        self.write_marker(J2kMarker::StartOfData);
    }

    pub fn write_sop(&mut self, sequence: u16) {
        self.write_marker(J2kMarker::StartOfPacket);
        self.write_u16(4);
        self.write_u16(sequence);
    }
}
