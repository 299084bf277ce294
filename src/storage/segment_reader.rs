use std::ops::Bound;
use bytes::Bytes;
use fst::Map;
use roaring::RoaringBitmap;
use crate::core::error::{Error, Result};
use crate::core::types::{DocOrdinal, Document};
use crate::index::inverted::{FrozenSegment, Term};
use crate::index::points::PointIndex;
use crate::index::posting::PostingList;
use crate::index::store::StoreReader;
use crate::storage::directory::Directory;
use crate::storage::layout::{self, DICT_EXT, META_EXT, POINTS_EXT, POSTINGS_EXT, STORE_EXT};
use crate::storage::segment::{FileChecksum, SegmentId, SegmentMeta};

/// Read-only view of one committed segment. Never changes after open;
/// shared between readers behind an `Arc`.
pub struct SegmentReader {
    pub id: SegmentId,
    pub doc_count: u32,
    dictionary: Map<Bytes>,
    postings: Bytes,
    store: StoreReader,
    points: PointIndex,
}

impl SegmentReader {
    /// Load and verify every file of segment `id`.
    pub fn open(directory: &dyn Directory, id: SegmentId, expected_docs: u32) -> Result<Self> {
        let meta_bytes = directory.read_file(&layout::segment_file(id, META_EXT))?;
        let meta: SegmentMeta = bincode::deserialize(&meta_bytes)
            .map_err(|e| Error::corrupt_segment(format!("{}: unreadable meta: {}", id, e)))?;

        if meta.version != SegmentMeta::VERSION {
            return Err(Error::corrupt_segment(format!(
                "{}: unsupported format version {}",
                id, meta.version
            )));
        }
        if meta.id != id || meta.doc_count != expected_docs {
            return Err(Error::corrupt_segment(format!(
                "{}: meta describes {} with {} docs, manifest expects {} docs",
                id, meta.id, meta.doc_count, expected_docs
            )));
        }

        let dictionary = read_verified(directory, id, DICT_EXT, &meta.dictionary)?;
        let postings = read_verified(directory, id, POSTINGS_EXT, &meta.postings)?;
        let store = read_verified(directory, id, STORE_EXT, &meta.store)?;
        let points = read_verified(directory, id, POINTS_EXT, &meta.points)?;

        Self::from_parts(id, meta.doc_count, dictionary, postings, store, points)
    }

    /// View over a segment the writer has just frozen, without a round trip
    /// through the directory.
    pub fn from_frozen(id: SegmentId, frozen: FrozenSegment) -> Result<Self> {
        Self::from_parts(
            id,
            frozen.doc_count,
            Bytes::from(frozen.dictionary),
            Bytes::from(frozen.postings),
            Bytes::from(frozen.store),
            Bytes::from(frozen.points),
        )
    }

    fn from_parts(
        id: SegmentId,
        doc_count: u32,
        dictionary: Bytes,
        postings: Bytes,
        store: Bytes,
        points: Bytes,
    ) -> Result<Self> {
        let dictionary = Map::new(dictionary)
            .map_err(|e| Error::corrupt_segment(format!("{}: invalid dictionary: {}", id, e)))?;
        let store = StoreReader::open(store, doc_count)?;
        let points = PointIndex::decode(&points)?;

        Ok(SegmentReader {
            id,
            doc_count,
            dictionary,
            postings,
            store,
            points,
        })
    }

    pub fn num_terms(&self) -> usize {
        self.dictionary.len()
    }

    pub fn postings(&self, field: &str, token: &str) -> Result<Option<PostingList>> {
        match self.dictionary.get(Term::key_for(field, token)) {
            Some(offset) => PostingList::decode(&self.postings, offset as usize, self.doc_count).map(Some),
            None => Ok(None),
        }
    }

    /// Documents containing the term, deleted ones included.
    pub fn doc_freq(&self, field: &str, token: &str) -> Result<u32> {
        Ok(self.postings(field, token)?.map(|p| p.doc_freq()).unwrap_or(0))
    }

    pub fn points_in_range(&self, field: &str, lower: Bound<i64>, upper: Bound<i64>) -> RoaringBitmap {
        self.points.range(field, lower, upper)
    }

    pub fn document(&self, ordinal: DocOrdinal) -> Result<Document> {
        self.store.document(ordinal)
    }
}

fn read_verified(directory: &dyn Directory, id: SegmentId, ext: &str, checksum: &FileChecksum) -> Result<Bytes> {
    let name = layout::segment_file(id, ext);
    let data = directory.read_file(&name)?;
    if !checksum.matches(&data) {
        return Err(Error::corrupt_segment(format!("{}: checksum mismatch", name)));
    }
    Ok(data)
}

/// Load a tombstone file written by `SegmentWriter::write_tombstones`.
pub fn read_tombstones(directory: &dyn Directory, id: SegmentId, generation: u64, doc_count: u32) -> Result<RoaringBitmap> {
    let name = layout::tombstone_file(id, generation);
    let data = directory.read_file(&name)?;
    if data.len() < 4 {
        return Err(Error::corrupt_segment(format!("{}: truncated", name)));
    }

    let (body, trailer) = data.split_at(data.len() - 4);
    let expected = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
    if crc32fast::hash(body) != expected {
        return Err(Error::corrupt_segment(format!("{}: checksum mismatch", name)));
    }

    let deleted = RoaringBitmap::deserialize_from(body)
        .map_err(|e| Error::corrupt_segment(format!("{}: {}", name, e)))?;
    if deleted.max().is_some_and(|max| max >= doc_count) {
        return Err(Error::corrupt_segment(format!("{}: ordinal beyond {} docs", name, doc_count)));
    }
    Ok(deleted)
}
