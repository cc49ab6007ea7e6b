use crate::error::Htj2kError;

/// MSB-first bit reader over a byte-stuffed packet body: a 0x00 following a
/// 0xFF byte carries no data.
pub struct J2kBitReader<'a> {
    data: &'a [u8],
    pos: usize,
    bit_buffer: u8,
    bits_left: u8,
}

impl<'a> J2kBitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            bit_buffer: 0,
            bits_left: 0,
        }
    }

    pub fn read_bit(&mut self) -> Result<u8, Htj2kError> {
        if self.bits_left == 0 {
            let byte = *self.data.get(self.pos).ok_or(Htj2kError::NeedMoreData)?;
            self.pos += 1;
            if byte == 0xFF {
                match self.data.get(self.pos) {
                    Some(0x00) => self.pos += 1,
                    // Unstuffed 0xFF is a marker, never packet data.
                    Some(_) => return Err(Htj2kError::InvalidPacket),
                    None => {}
                }
            }
            self.bit_buffer = byte;
            self.bits_left = 8;
        }

        let bit = (self.bit_buffer >> (self.bits_left - 1)) & 1;
        self.bits_left -= 1;
        Ok(bit)
    }

    /// Reads `count` bits (at most 32), first bit most significant.
    pub fn read_bits(&mut self, count: u8) -> Result<u32, Htj2kError> {
        let mut bits = 0u32;
        for _ in 0..count {
            bits = (bits << 1) | u32::from(self.read_bit()?);
        }
        Ok(bits)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

/// Counterpart of [`J2kBitReader`].
#[derive(Default)]
pub struct J2kBitWriter {
    data: Vec<u8>,
    bit_buffer: u8,
    bits_count: u8,
}

impl J2kBitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_bit(&mut self, bit: u8) {
        self.bit_buffer = (self.bit_buffer << 1) | (bit & 1);
        self.bits_count += 1;
        if self.bits_count == 8 {
            self.flush_byte();
        }
    }

    /// Writes the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u32, count: u8) {
        for shift in (0..count).rev() {
            self.write_bit(((value >> shift) & 1) as u8);
        }
    }

    fn flush_byte(&mut self) {
        let byte = self.bit_buffer;
        self.data.push(byte);
        if byte == 0xFF {
            self.data.push(0x00);
        }
        self.bit_buffer = 0;
        self.bits_count = 0;
    }

    /// Pads the last byte with zero bits and returns the stuffed bytes.
    pub fn finish(mut self) -> Vec<u8> {
        if self.bits_count > 0 {
            self.bit_buffer <<= 8 - self.bits_count;
            self.flush_byte();
        }
        self.data
    }
}
