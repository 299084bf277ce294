use std::sync::Arc;
use roaring::RoaringBitmap;
use crate::core::error::{Error, Result};
use crate::core::types::{DocOrdinal, Document};
use crate::storage::directory::Directory;
use crate::storage::manifest::SegmentEntry;
use crate::storage::segment::SegmentId;
use crate::storage::segment_reader::{read_tombstones, SegmentReader};

/// A segment together with the tombstones in effect for one snapshot.
///
/// The segment is shared by every reader that lists it. The bitmap is shared
/// too until the writer marks a new delete, at which point it gets a private
/// copy (`Arc::make_mut`), so open readers keep seeing the old one.
#[derive(Clone)]
pub struct SegmentSnapshot {
    pub entry: SegmentEntry,
    pub segment: Arc<SegmentReader>,
    pub tombstones: Arc<RoaringBitmap>,
}

impl SegmentSnapshot {
    pub fn new(entry: SegmentEntry, segment: Arc<SegmentReader>) -> Self {
        SegmentSnapshot {
            entry,
            segment,
            tombstones: Arc::new(RoaringBitmap::new()),
        }
    }

    /// Open segment files and the tombstones named by `entry`.
    pub fn load(directory: &dyn Directory, entry: &SegmentEntry) -> Result<Self> {
        let segment = Arc::new(SegmentReader::open(directory, entry.id, entry.doc_count)?);
        Self::with_segment(directory, entry, segment)
    }

    /// Reuse an already open segment, loading only its tombstones.
    pub fn with_segment(directory: &dyn Directory, entry: &SegmentEntry, segment: Arc<SegmentReader>) -> Result<Self> {
        let tombstones = match entry.del_gen {
            Some(generation) => read_tombstones(directory, entry.id, generation, entry.doc_count)?,
            None => RoaringBitmap::new(),
        };
        if tombstones.len() != entry.del_count as u64 {
            return Err(Error::corrupt_segment(format!(
                "{}: manifest lists {} deletes, tombstones hold {}",
                entry.id,
                entry.del_count,
                tombstones.len()
            )));
        }

        Ok(SegmentSnapshot {
            entry: entry.clone(),
            segment,
            tombstones: Arc::new(tombstones),
        })
    }

    pub fn id(&self) -> SegmentId {
        self.segment.id
    }

    pub fn doc_count(&self) -> u32 {
        self.segment.doc_count
    }

    pub fn is_live(&self, ordinal: DocOrdinal) -> bool {
        ordinal < self.segment.doc_count && !self.tombstones.contains(ordinal)
    }

    pub fn live_docs(&self) -> u32 {
        self.segment.doc_count - self.tombstones.len() as u32
    }

    pub fn num_deleted(&self) -> u32 {
        self.tombstones.len() as u32
    }

    /// Stored record of a live document.
    pub fn document(&self, ordinal: DocOrdinal) -> Result<Option<Document>> {
        if !self.is_live(ordinal) {
            return Ok(None);
        }
        self.segment.document(ordinal).map(Some)
    }
}
