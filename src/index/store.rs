use bytes::Bytes;
use crate::compression::compress::{CompressedBlock, CompressionType};
use crate::core::error::{Error, Result};
use crate::core::types::{DocOrdinal, Document};

/// Stored-record buffer for one segment under construction.
#[derive(Debug, Default)]
pub struct StoreWriter {
    records: Vec<Vec<u8>>,
}

impl StoreWriter {
    pub fn compress(doc: &Document, compression: CompressionType) -> Result<Vec<u8>> {
        CompressedBlock::compress(&doc.to_record()?, compression)
    }

    pub fn push(&mut self, block: Vec<u8>) {
        self.records.push(block);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    // [count: u32] [offsets: u64 * (count + 1)] [blocks...]
    pub fn encode(&self) -> Vec<u8> {
        let data_len: usize = self.records.iter().map(|r| r.len()).sum();
        let mut out = Vec::with_capacity(4 + 8 * (self.records.len() + 1) + data_len);
        out.extend_from_slice(&(self.records.len() as u32).to_le_bytes());

        let mut offset = 0u64;
        out.extend_from_slice(&offset.to_le_bytes());
        for record in &self.records {
            offset += record.len() as u64;
            out.extend_from_slice(&offset.to_le_bytes());
        }
        for record in &self.records {
            out.extend_from_slice(record);
        }
        out
    }
}

/// Random access over an encoded store file.
#[derive(Debug, Clone)]
pub struct StoreReader {
    offsets: Vec<u64>,
    data: Bytes,
}

impl StoreReader {
    pub fn open(file: Bytes, expected_docs: u32) -> Result<Self> {
        let count_bytes: [u8; 4] = file
            .get(..4)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| Error::corrupt_segment("Store file too short"))?;
        let count = u32::from_le_bytes(count_bytes);
        if count != expected_docs {
            return Err(Error::corrupt_segment(format!(
                "Store holds {} records, segment has {} docs",
                count, expected_docs
            )));
        }

        let table_end = 4 + 8 * (count as usize + 1);
        let table = file
            .get(4..table_end)
            .ok_or_else(|| Error::corrupt_segment("Store offset table truncated"))?;
        let offsets: Vec<u64> = table
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect();

        let data = file.slice(table_end..);
        let monotonic = offsets.windows(2).all(|w| w[0] <= w[1]);
        if !monotonic || offsets.last().copied() != Some(data.len() as u64) {
            return Err(Error::corrupt_segment("Store offsets inconsistent with data"));
        }

        Ok(StoreReader { offsets, data })
    }

    pub fn document(&self, ordinal: DocOrdinal) -> Result<Document> {
        let i = ordinal as usize;
        if i + 1 >= self.offsets.len() {
            return Err(Error::not_found(format!("No stored record for ordinal {}", ordinal)));
        }
        let block = &self.data[self.offsets[i] as usize..self.offsets[i + 1] as usize];
        let record = CompressedBlock::decompress(block)?;
        Document::from_record(&record)
            .map_err(|e| Error::corrupt_segment(format!("Stored record {}: {}", ordinal, e.context)))
    }
}
