use chrono::Utc;
use log::debug;
use roaring::RoaringBitmap;
use crate::core::error::Result;
use crate::index::inverted::FrozenSegment;
use crate::storage::directory::Directory;
use crate::storage::layout::{self, DICT_EXT, META_EXT, POINTS_EXT, POSTINGS_EXT, STORE_EXT};
use crate::storage::segment::{FileChecksum, SegmentId, SegmentMeta};

pub struct SegmentWriter;

impl SegmentWriter {
    // seg_N.dict / .post / .store / .pts, then seg_N.meta carrying their checksums
    pub fn write(
        directory: &dyn Directory,
        id: SegmentId,
        frozen: &FrozenSegment,
        sync: bool,
    ) -> Result<SegmentMeta> {
        let files = [
            (DICT_EXT, &frozen.dictionary),
            (POSTINGS_EXT, &frozen.postings),
            (STORE_EXT, &frozen.store),
            (POINTS_EXT, &frozen.points),
        ];
        for (ext, data) in files {
            directory.write_file(&layout::segment_file(id, ext), data, sync)?;
        }

        let meta = SegmentMeta {
            version: SegmentMeta::VERSION,
            id,
            doc_count: frozen.doc_count,
            created_at: Utc::now(),
            dictionary: FileChecksum::of(&frozen.dictionary),
            postings: FileChecksum::of(&frozen.postings),
            store: FileChecksum::of(&frozen.store),
            points: FileChecksum::of(&frozen.points),
        };
        let meta_bytes = bincode::serialize(&meta)?;
        directory.write_file(&layout::segment_file(id, META_EXT), &meta_bytes, sync)?;

        debug!("wrote segment {} ({} docs, {} bytes)", id, meta.doc_count, meta.size_bytes());
        Ok(meta)
    }

    // [roaring bitmap] [crc32 of bitmap]
    pub fn write_tombstones(
        directory: &dyn Directory,
        id: SegmentId,
        generation: u64,
        deleted: &RoaringBitmap,
        sync: bool,
    ) -> Result<()> {
        let mut data = Vec::with_capacity(deleted.serialized_size() + 4);
        deleted.serialize_into(&mut data)?;
        let crc = crc32fast::hash(&data);
        data.extend_from_slice(&crc.to_le_bytes());

        directory.write_file(&layout::tombstone_file(id, generation), &data, sync)?;
        debug!("wrote {} tombstones for segment {} at generation {}", deleted.len(), id, generation);
        Ok(())
    }
}
