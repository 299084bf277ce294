pub mod core;
pub mod storage;
pub mod analysis;
pub mod index;
pub mod scoring;
pub mod search;
pub mod query;
pub mod writer;
pub mod reader;
pub mod compression;

pub use crate::analysis::{Analyzer, PerFieldAnalyzer, TextAnalyzer};
pub use crate::core::config::{Config, WriterConfig};
pub use crate::core::engine::Engine;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{DocId, Document, Field, FieldKind, FieldValue};
pub use crate::query::{BooleanQuery, Occur, Operator, Query};
pub use crate::reader::IndexReader;
pub use crate::search::{DocAddress, ScoredDocument, Searcher, TopDocs};
pub use crate::storage::directory::Directory;
pub use crate::storage::fs_directory::FsDirectory;
pub use crate::storage::ram_directory::RamDirectory;
pub use crate::writer::{IndexWriter, WriterState};

/*
┌──────────────────────────────────────── QUARRY ─────────────────────────────────────────┐
│                                                                                          │
│  Engine ──opens──> IndexWriter (one per location, holds write.lock)                      │
│    │                   │                                                                 │
│    │                   ├── InvertedIndex      build buffer: terms, points, stored docs   │
│    │                   ├── SegmentSnapshot[]  committed segments + working tombstones    │
│    │                   └── commit():                                                     │
│    │                         freeze ──> SegmentWriter ──> seg_N.{dict,post,store,pts}    │
│    │                         tombstones ──> seg_N_<gen>.del                              │
│    │                         seg_N.meta (checksums), then Manifest ──atomic_publish──>   │
│    │                                                                                     │
│    └──opens──> IndexReader (snapshot of one manifest generation)                         │
│                    │                                                                     │
│                    └── SegmentSnapshot[] ── Arc<SegmentReader> shared across readers     │
│                                                                                          │
│  Searcher: Query ──QueryPlanner──> Plan ──evaluate(segment)──> (ordinal, score) stream   │
│            ──> TopKCollector (min-heap, k) ──> TopDocs                                   │
│                                                                                          │
│  Directory: FsDirectory (MANIFEST.tmp + rename, flock) | RamDirectory                    │
│                                                                                          │
└──────────────────────────────────────────────────────────────────────────────────────────┘
*/
