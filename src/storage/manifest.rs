use std::collections::BTreeSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::core::error::{Error, Result};
use crate::storage::directory::Directory;
use crate::storage::layout;
use crate::storage::segment::SegmentId;

/// One committed segment as listed by the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentEntry {
    pub id: SegmentId,
    pub doc_count: u32,
    /// Generation of the tombstone file, `None` while nothing is deleted.
    pub del_gen: Option<u64>,
    pub del_count: u32,
}

impl SegmentEntry {
    pub fn new(id: SegmentId, doc_count: u32) -> Self {
        SegmentEntry {
            id,
            doc_count,
            del_gen: None,
            del_count: 0,
        }
    }

    pub fn live_docs(&self) -> u32 {
        self.doc_count - self.del_count
    }
}

/// The single root of truth: whatever the last published manifest lists is
/// the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub generation: u64,
    pub next_segment_id: u64,
    pub committed_at: DateTime<Utc>,
    pub segments: Vec<SegmentEntry>,
}

impl Manifest {
    pub const VERSION: u32 = 1;

    /// Generation 0, no segments. Never published on its own.
    pub fn empty() -> Self {
        Manifest {
            version: Self::VERSION,
            generation: 0,
            next_segment_id: 0,
            committed_at: Utc::now(),
            segments: Vec::new(),
        }
    }

    pub fn load(directory: &dyn Directory) -> Result<Option<Manifest>> {
        match directory.read_manifest()? {
            Some(bytes) => Self::decode(&bytes).map(Some),
            None => Ok(None),
        }
    }

    // [bincode body] [crc32 of body]
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut data = bincode::serialize(self)?;
        let crc = crc32fast::hash(&data);
        data.extend_from_slice(&crc.to_le_bytes());
        Ok(data)
    }

    pub fn decode(data: &[u8]) -> Result<Manifest> {
        if data.len() < 4 {
            return Err(Error::corrupt_segment("Manifest truncated"));
        }
        let (body, trailer) = data.split_at(data.len() - 4);
        let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        if crc32fast::hash(body) != expected {
            return Err(Error::corrupt_segment("Manifest checksum mismatch"));
        }

        let manifest: Manifest = bincode::deserialize(body)
            .map_err(|e| Error::corrupt_segment(format!("Manifest unreadable: {}", e)))?;
        if manifest.version != Self::VERSION {
            return Err(Error::corrupt_segment(format!(
                "Unsupported manifest version {}",
                manifest.version
            )));
        }
        Ok(manifest)
    }

    pub fn num_docs(&self) -> u64 {
        self.segments.iter().map(|s| s.live_docs() as u64).sum()
    }

    pub fn max_doc(&self) -> u64 {
        self.segments.iter().map(|s| s.doc_count as u64).sum()
    }

    /// Every file this manifest needs; anything else with the index prefix
    /// is garbage once the manifest is published.
    pub fn referenced_files(&self) -> BTreeSet<String> {
        let mut files = BTreeSet::new();
        for entry in &self.segments {
            files.extend(layout::segment_files(entry.id));
            if let Some(generation) = entry.del_gen {
                files.insert(layout::tombstone_file(entry.id, generation));
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> Manifest {
        let mut manifest = Manifest::empty();
        manifest.generation = 3;
        manifest.next_segment_id = 2;
        manifest.segments.push(SegmentEntry::new(SegmentId(0), 10));
        let mut deleted = SegmentEntry::new(SegmentId(1), 5);
        deleted.del_gen = Some(3);
        deleted.del_count = 2;
        manifest.segments.push(deleted);
        manifest
    }

    #[test]
    fn counts_exclude_deleted_docs() {
        let manifest = manifest();
        assert_eq!(manifest.max_doc(), 15);
        assert_eq!(manifest.num_docs(), 13);
    }

    #[test]
    fn encoded_manifest_detects_corruption() {
        let manifest = manifest();
        let mut bytes = manifest.encode().unwrap();
        assert_eq!(Manifest::decode(&bytes).unwrap(), manifest);

        let last = bytes.len() - 1;
        bytes[last] ^= 1;
        assert!(Manifest::decode(&bytes).unwrap_err().is_corrupt());
        assert!(Manifest::decode(&[1, 2]).unwrap_err().is_corrupt());
    }

    #[test]
    fn referenced_files_include_tombstones() {
        let files = manifest().referenced_files();
        assert!(files.contains("seg_000001_3.del"));
        assert!(files.contains(&layout::segment_file(SegmentId(0), layout::META_EXT)));
        assert!(!files.iter().any(|f| f.starts_with("seg_000000_")));
    }
}
