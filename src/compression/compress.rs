use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Codec applied to each stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompressionType {
    None,
    Lz4,      // Fast, default for stored fields
    Zstd,     // Better ratio, slower
    Snappy,
}

impl CompressionType {
    pub fn tag(self) -> u8 {
        match self {
            CompressionType::None => 0,
            CompressionType::Lz4 => 1,
            CompressionType::Zstd => 2,
            CompressionType::Snappy => 3,
        }
    }

    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Lz4),
            2 => Ok(CompressionType::Zstd),
            3 => Ok(CompressionType::Snappy),
            other => Err(Error::corrupt_segment(format!("Unknown compression tag {}", other))),
        }
    }
}

/// Compressed block: one tag byte followed by the codec payload.
pub struct CompressedBlock;

impl CompressedBlock {
    pub fn compress(data: &[u8], compression: CompressionType) -> Result<Vec<u8>> {
        let mut out = vec![compression.tag()];
        match compression {
            CompressionType::None => out.extend_from_slice(data),

            CompressionType::Lz4 => {
                out.extend_from_slice(&lz4_flex::compress_prepend_size(data));
            }

            CompressionType::Zstd => {
                out.extend_from_slice(&zstd::encode_all(data, 3)?);
            }

            CompressionType::Snappy => {
                let mut encoder = snap::raw::Encoder::new();
                let compressed = encoder.compress_vec(data)
                    .map_err(|e| Error::new(ErrorKind::Io, e.to_string()))?;
                out.extend_from_slice(&compressed);
            }
        }
        Ok(out)
    }

    pub fn decompress(block: &[u8]) -> Result<Vec<u8>> {
        let (tag, payload) = block
            .split_first()
            .ok_or_else(|| Error::corrupt_segment("Empty compressed block"))?;

        match CompressionType::from_tag(*tag)? {
            CompressionType::None => Ok(payload.to_vec()),

            CompressionType::Lz4 => lz4_flex::decompress_size_prepended(payload)
                .map_err(|e| Error::corrupt_segment(e.to_string())),

            CompressionType::Zstd => zstd::decode_all(payload)
                .map_err(|e| Error::corrupt_segment(e.to_string())),

            CompressionType::Snappy => {
                let mut decoder = snap::raw::Decoder::new();
                decoder.decompress_vec(payload)
                    .map_err(|e| Error::corrupt_segment(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_codec_restores_input() {
        let data = b"learn data learn data learn data, tell jokes".repeat(8);
        for codec in [CompressionType::None, CompressionType::Lz4, CompressionType::Zstd, CompressionType::Snappy] {
            let block = CompressedBlock::compress(&data, codec).unwrap();
            assert_eq!(block[0], codec.tag());
            assert_eq!(CompressedBlock::decompress(&block).unwrap(), data);
        }
    }

    #[test]
    fn unknown_tag_is_corruption() {
        let err = CompressedBlock::decompress(&[9, 1, 2]).unwrap_err();
        assert!(err.is_corrupt());
    }
}
