pub mod index_reader;
pub mod snapshot_reader;

pub use index_reader::IndexReader;
pub use snapshot_reader::SegmentSnapshot;
