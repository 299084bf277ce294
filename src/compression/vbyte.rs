use crate::core::error::{Error, Result};

/// Variable byte encoding for integers (best for small integers)
pub struct VByteEncoder;

impl VByteEncoder {
    /// Values < 128 use 1 byte, < 16384 use 2 bytes, etc.
    pub fn encode_u32(output: &mut Vec<u8>, mut value: u32) {
        while value >= 128 {
            output.push((value & 127) as u8 | 128);  // continuation bit
            value >>= 7;
        }
        output.push(value as u8);
    }

    /// Decode single u32 value, returns (value, bytes_consumed)
    pub fn decode_u32(input: &[u8]) -> Result<(u32, usize)> {
        let mut value = 0u32;
        let mut shift = 0;
        let mut consumed = 0;

        for &byte in input {
            consumed += 1;
            value |= ((byte & 127) as u32) << shift;

            if byte & 128 == 0 {
                return Ok((value, consumed));
            }

            shift += 7;
            if shift > 28 {  // Max 5 bytes for u32
                return Err(Error::corrupt_segment("VByte overflow"));
            }
        }

        Err(Error::corrupt_segment("Incomplete VByte"))
    }
}

/// Cursor over a VByte stream.
pub struct VByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        VByteReader { data, pos: 0 }
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let rest = self.data.get(self.pos..).unwrap_or(&[]);
        let (value, consumed) = VByteEncoder::decode_u32(rest)?;
        self.pos += consumed;
        Ok(value)
    }

    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_use_expected_width() {
        let mut out = Vec::new();
        VByteEncoder::encode_u32(&mut out, 127);
        assert_eq!(out.len(), 1);
        VByteEncoder::encode_u32(&mut out, 128);
        assert_eq!(out.len(), 3);
        VByteEncoder::encode_u32(&mut out, u32::MAX);
        assert_eq!(out.len(), 8);

        let mut reader = VByteReader::new(&out);
        assert_eq!(reader.read_u32().unwrap(), 127);
        assert_eq!(reader.read_u32().unwrap(), 128);
        assert_eq!(reader.read_u32().unwrap(), u32::MAX);
        assert!(reader.read_u32().is_err());
    }

    #[test]
    fn truncated_input_is_corruption() {
        assert!(VByteEncoder::decode_u32(&[0x80, 0x80]).unwrap_err().is_corrupt());
    }
}
