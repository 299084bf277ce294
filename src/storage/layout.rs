use std::path::PathBuf;
use crate::core::error::Result;
use crate::storage::segment::SegmentId;

pub const MANIFEST_FILE: &str = "MANIFEST";
pub const MANIFEST_TMP_FILE: &str = "MANIFEST.tmp";
pub const LOCK_FILE: &str = "write.lock";

/// Segment file extensions
pub const META_EXT: &str = "meta";
pub const DICT_EXT: &str = "dict";
pub const POSTINGS_EXT: &str = "post";
pub const STORE_EXT: &str = "store";
pub const POINTS_EXT: &str = "pts";
pub const TOMBSTONE_EXT: &str = "del";

pub fn segment_file(id: SegmentId, ext: &str) -> String {
    format!("seg_{:06}.{}", id.0, ext)
}

/// Tombstones are versioned by the manifest generation that wrote them.
pub fn tombstone_file(id: SegmentId, generation: u64) -> String {
    format!("seg_{:06}_{}.{}", id.0, generation, TOMBSTONE_EXT)
}

/// Every file a segment owns except tombstones.
pub fn segment_files(id: SegmentId) -> Vec<String> {
    [META_EXT, DICT_EXT, POSTINGS_EXT, STORE_EXT, POINTS_EXT]
        .iter()
        .map(|ext| segment_file(id, ext))
        .collect()
}

/// Files the engine may garbage collect; anything else in the directory is
/// left alone.
pub fn is_index_file(name: &str) -> bool {
    name.starts_with("seg_")
}

/// Directory structure for a filesystem index
#[derive(Debug, Clone)]
pub struct StorageLayout {
    pub base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&base_dir)?;
        Ok(StorageLayout { base_dir })
    }

    pub fn file_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.file_path(MANIFEST_FILE)
    }

    pub fn manifest_tmp_path(&self) -> PathBuf {
        self.file_path(MANIFEST_TMP_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.file_path(LOCK_FILE)
    }
}
