use std::collections::HashMap;
use std::ops::Bound;
use std::sync::Arc;
use log::{debug, info};
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, Document};
use crate::reader::snapshot_reader::SegmentSnapshot;
use crate::search::results::DocAddress;
use crate::storage::directory::Directory;
use crate::storage::manifest::Manifest;
use crate::storage::segment::SegmentId;
use crate::storage::segment_reader::SegmentReader;

/// Point-in-time view of the index as of one manifest generation.
///
/// Nothing committed after the reader was opened is visible; reopen (or
/// `open_if_changed`) to move forward. Readers are independent of each other
/// and of the writer.
pub struct IndexReader {
    directory: Arc<dyn Directory>,
    manifest: Manifest,
    segments: Vec<SegmentSnapshot>,
}

impl IndexReader {
    pub fn open(directory: Arc<dyn Directory>) -> Result<Self> {
        Self::open_with(directory, &[])
    }

    /// A reader on the latest generation, or `None` if it is the one this
    /// reader already shows. Unchanged segments are shared with `self`.
    pub fn open_if_changed(&self) -> Result<Option<IndexReader>> {
        let generation = Manifest::load(&*self.directory)?
            .map(|m| m.generation)
            .unwrap_or(0);
        if generation == self.manifest.generation {
            return Ok(None);
        }
        Self::open_with(self.directory.clone(), &self.segments).map(Some)
    }

    fn open_with(directory: Arc<dyn Directory>, previous: &[SegmentSnapshot]) -> Result<Self> {
        loop {
            let manifest = Manifest::load(&*directory)?.unwrap_or_else(Manifest::empty);
            let generation = manifest.generation;

            match Self::load_segments(&*directory, &manifest, previous) {
                Ok(segments) => {
                    info!(
                        "opened reader at generation {} ({} segments, {} live docs)",
                        generation,
                        segments.len(),
                        manifest.num_docs()
                    );
                    return Ok(IndexReader {
                        directory,
                        manifest,
                        segments,
                    });
                }
                // A commit may have published and cleaned up in between. Each
                // retry starts from a newer generation.
                Err(e) if e.is_not_found() => {
                    let current = Manifest::load(&*directory)?.map(|m| m.generation).unwrap_or(0);
                    if current == generation {
                        return Err(Error::corrupt_segment(format!(
                            "generation {} references a missing file: {}",
                            generation, e.context
                        )));
                    }
                    debug!("generation moved from {} to {} while opening, retrying", generation, current);
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn load_segments(
        directory: &dyn Directory,
        manifest: &Manifest,
        previous: &[SegmentSnapshot],
    ) -> Result<Vec<SegmentSnapshot>> {
        let open: HashMap<SegmentId, &SegmentSnapshot> = previous.iter().map(|s| (s.id(), s)).collect();

        manifest
            .segments
            .iter()
            .map(|entry| match open.get(&entry.id) {
                Some(snapshot) if snapshot.entry == *entry => Ok((*snapshot).clone()),
                Some(snapshot) => SegmentSnapshot::with_segment(directory, entry, snapshot.segment.clone()),
                None => SegmentSnapshot::load(directory, entry),
            })
            .collect()
    }

    pub fn generation(&self) -> u64 {
        self.manifest.generation
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn segments(&self) -> &[SegmentSnapshot] {
        &self.segments
    }

    pub fn segment_readers(&self) -> impl Iterator<Item = &Arc<SegmentReader>> {
        self.segments.iter().map(|s| &s.segment)
    }

    /// Live documents.
    pub fn num_docs(&self) -> u64 {
        self.segments.iter().map(|s| s.live_docs() as u64).sum()
    }

    /// All documents, deleted ones included.
    pub fn max_doc(&self) -> u64 {
        self.segments.iter().map(|s| s.doc_count() as u64).sum()
    }

    pub fn num_deleted(&self) -> u64 {
        self.max_doc() - self.num_docs()
    }

    /// Stored record at `address`, `None` if it has been deleted.
    pub fn doc(&self, address: DocAddress) -> Result<Option<Document>> {
        let segment = self
            .segments
            .get(address.segment_ord as usize)
            .ok_or_else(|| Error::not_found(format!("No segment at position {}", address.segment_ord)))?;
        if address.doc >= segment.doc_count() {
            return Err(Error::not_found(format!(
                "{} has {} documents, asked for {}",
                segment.id(),
                segment.doc_count(),
                address.doc
            )));
        }
        segment.document(address.doc)
    }

    /// First live document whose numeric `id_field` equals `id`, in
    /// segment order.
    pub fn fetch_stored(&self, id_field: &str, id: DocId) -> Result<Option<Document>> {
        for segment in &self.segments {
            let mut hits = segment
                .segment
                .points_in_range(id_field, Bound::Included(id.0), Bound::Included(id.0));
            hits -= segment.tombstones.as_ref();
            if let Some(ordinal) = hits.min() {
                return segment.segment.document(ordinal).map(Some);
            }
        }
        Ok(None)
    }

    /// Release the snapshot. Segments still used by other readers stay open.
    pub fn close(self) {
        debug!("closed reader at generation {}", self.manifest.generation);
    }
}
