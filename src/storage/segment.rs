use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Segment identifier, allocated sequentially by the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "seg_{:06}", self.0)
    }
}

/// Length and CRC32 of one segment file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChecksum {
    pub len: u64,
    pub crc32: u32,
}

impl FileChecksum {
    pub fn of(data: &[u8]) -> Self {
        FileChecksum {
            len: data.len() as u64,
            crc32: crc32fast::hash(data),
        }
    }

    pub fn matches(&self, data: &[u8]) -> bool {
        self.len == data.len() as u64 && self.crc32 == crc32fast::hash(data)
    }
}

/// Contents of the `.meta` file, written last when a segment is flushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMeta {
    pub version: u32,     // Format version
    pub id: SegmentId,
    pub doc_count: u32,
    pub created_at: DateTime<Utc>,
    pub dictionary: FileChecksum,
    pub postings: FileChecksum,
    pub store: FileChecksum,
    pub points: FileChecksum,
}

impl SegmentMeta {
    pub const VERSION: u32 = 1;

    pub fn size_bytes(&self) -> u64 {
        self.dictionary.len + self.postings.len + self.store.len + self.points.len
    }
}
