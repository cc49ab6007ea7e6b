use num_enum::{IntoPrimitive, TryFromPrimitive};

pub const MARKER_START_BYTE: u8 = 0xFF;

/// Marker codes used by the codestream (second byte after 0xFF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum J2kMarker {
    /// SOC: Start of codestream.
    StartOfCodestream = 0x4F,
    /// CAP: Extended capabilities.
    Capability = 0x50,
    /// SIZ: Image and tile size.
    ImageAndTileSize = 0x51,
    /// COD: Coding style default.
    CodingStyleDefault = 0x52,
    /// COC: Coding style component.
    CodingStyleComponent = 0x53,
    /// QCD: Quantization default.
    QuantizationDefault = 0x5C,
    /// QCC: Quantization component.
    QuantizationComponent = 0x5D,
    /// COM: Comment.
    Comment = 0x64,
    /// SOT: Start of tile-part.
    StartOfTile = 0x90,
    /// SOP: Start of packet.
    StartOfPacket = 0x91,
    /// EPH: End of packet header.
    EndOfPacketHeader = 0x92,
    /// SOD: Start of data.
    StartOfData = 0x93,
    /// EOC: End of codestream.
    EndOfCodestream = 0xD9,
}

impl J2kMarker {
    /// Markers that stand alone, without a length field.
    pub fn is_delimiter(self) -> bool {
        matches!(
            self,
            J2kMarker::StartOfCodestream
                | J2kMarker::EndOfPacketHeader
                | J2kMarker::StartOfData
                | J2kMarker::EndOfCodestream
        )
    }

    pub fn bytes(self) -> [u8; 2] {
        [MARKER_START_BYTE, u8::from(self)]
    }
}
