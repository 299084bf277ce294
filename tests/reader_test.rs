mod common;

use std::collections::BTreeSet;
use std::io::Read;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use bytes::Bytes;
use quarry::analysis::analyzer::TextAnalyzer;
use quarry::core::config::Config;
use quarry::core::engine::Engine;
use quarry::core::error::{Error, Result};
use quarry::query::ast::Query;
use quarry::search::results::DocAddress;
use quarry::reader::index_reader::IndexReader;
use quarry::storage::directory::{Directory, DirectoryLock, WritableFile};
use quarry::storage::layout;
use quarry::storage::ram_directory::RamDirectory;
use quarry::storage::segment::SegmentId;
use common::{article, ids, sorted_ids};

#[test]
fn test_empty_index_reads_as_generation_zero() {
    let engine = Engine::in_memory();
    let reader = engine.reader().unwrap();
    assert_eq!(reader.generation(), 0);
    assert_eq!(reader.num_docs(), 0);
    assert!(engine.searcher(&reader).search(&Query::match_all(), 10).unwrap().is_empty());
    assert!(reader.open_if_changed().unwrap().is_none());
}

#[test]
fn test_reader_is_isolated_from_later_commits() {
    let engine = Engine::in_memory();
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "alpha", "")).unwrap();
    writer.commit().unwrap();

    let reader = engine.reader().unwrap();
    writer.add_document(article(2, "alpha", "")).unwrap();
    writer.delete_documents(&Query::exact("id", 1)).unwrap();

    // Uncommitted work is invisible to everyone
    assert_eq!(ids(&engine.search(&Query::term("title", "alpha"), 10).unwrap()), vec![1]);

    writer.commit().unwrap();
    let searcher = engine.searcher(&reader);
    assert_eq!(ids(&searcher.search(&Query::term("title", "alpha"), 10).unwrap()), vec![1]);
    assert_eq!(reader.generation(), 1);
    assert_eq!(ids(&engine.search(&Query::term("title", "alpha"), 10).unwrap()), vec![2]);
}

#[test]
fn test_open_if_changed_shares_unchanged_segments() {
    let engine = Engine::in_memory();
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "a", "")).unwrap();
    writer.add_document(article(2, "b", "")).unwrap();
    writer.commit().unwrap();
    let first = engine.reader().unwrap();

    writer.delete_documents(&Query::term("title", "a")).unwrap();
    writer.add_document(article(3, "c", "")).unwrap();
    writer.commit().unwrap();

    let second = first.open_if_changed().unwrap().unwrap();
    assert_eq!(second.generation(), 2);
    assert_eq!(second.segments().len(), 2);
    assert!(Arc::ptr_eq(&first.segments()[0].segment, &second.segments()[0].segment));
    assert_eq!(second.num_docs(), 2);
    assert_eq!(second.num_deleted(), 1);
    assert_eq!(first.num_docs(), 2);
    assert_eq!(first.num_deleted(), 0);

    assert!(second.open_if_changed().unwrap().is_none());
    first.close();
    assert_eq!(engine.searcher(&second).count(&Query::match_all()).unwrap(), 2);
}

#[test]
fn test_doc_lookup_by_address() {
    let engine = Engine::in_memory();
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "a", "")).unwrap();
    writer.add_document(article(2, "b", "")).unwrap();
    writer.commit().unwrap();
    writer.delete_documents(&Query::exact("id", 2)).unwrap();
    writer.commit().unwrap();

    let reader = engine.reader().unwrap();
    let doc = reader.doc(DocAddress::new(0, 0)).unwrap().unwrap();
    assert_eq!(doc.get_field("title").and_then(|v| v.as_text()), Some("a"));
    assert!(reader.doc(DocAddress::new(0, 1)).unwrap().is_none());
    assert!(reader.doc(DocAddress::new(0, 2)).unwrap_err().is_not_found());
    assert!(reader.doc(DocAddress::new(1, 0)).unwrap_err().is_not_found());
}

#[test]
fn test_corrupt_segment_file_is_detected() {
    let engine = Engine::in_memory();
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "checksums matter", "every byte counts")).unwrap();
    writer.commit().unwrap();
    drop(writer);

    let name = layout::segment_file(SegmentId(0), layout::POSTINGS_EXT);
    let mut data = engine.directory().read_file(&name).unwrap().to_vec();
    let middle = data.len() / 2;
    data[middle] ^= 0xFF;
    engine.directory().write_file(&name, &data, false).unwrap();

    assert!(engine.reader().err().unwrap().is_corrupt());
    assert!(engine.writer().err().unwrap().is_corrupt());
}

#[test]
fn test_corrupt_manifest_is_detected() {
    let engine = Engine::in_memory();
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "a", "")).unwrap();
    writer.commit().unwrap();
    drop(writer);

    engine.directory().atomic_publish(b"definitely not a manifest", true).unwrap();
    assert!(engine.reader().err().unwrap().is_corrupt());
}

#[test]
fn test_missing_segment_file_is_corrupt() {
    let engine = Engine::in_memory();
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "a", "")).unwrap();
    writer.commit().unwrap();
    drop(writer);

    engine.directory().delete_file(&layout::segment_file(SegmentId(0), layout::DICT_EXT)).unwrap();
    assert!(engine.reader().err().unwrap().is_corrupt());
    assert!(engine.writer().err().unwrap().is_corrupt());
}

/// Publishes a newer manifest and hides one file the first time a segment
/// file is read, as if a commit had cleaned up underneath the reader.
struct RacingDirectory {
    inner: RamDirectory,
    newer_manifest: Mutex<Option<Bytes>>,
}

impl RacingDirectory {
    fn race(&self, name: &str) -> Result<()> {
        if let Some(manifest) = self.newer_manifest.lock().unwrap().take() {
            self.inner.atomic_publish(&manifest, false)?;
            return Err(Error::not_found(format!("No such file: {}", name)));
        }
        Ok(())
    }
}

impl Directory for RacingDirectory {
    fn create_file(&self, name: &str) -> Result<Box<dyn WritableFile>> {
        self.inner.create_file(name)
    }

    fn open_file(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        self.race(name)?;
        self.inner.open_file(name)
    }

    fn list_files(&self) -> Result<BTreeSet<String>> {
        self.inner.list_files()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.inner.delete_file(name)
    }

    fn atomic_publish(&self, manifest: &[u8], sync: bool) -> Result<()> {
        self.inner.atomic_publish(manifest, sync)
    }

    fn read_manifest(&self) -> Result<Option<Bytes>> {
        self.inner.read_manifest()
    }

    fn obtain_lock(&self, timeout: Option<Duration>) -> Result<Box<dyn DirectoryLock>> {
        self.inner.obtain_lock(timeout)
    }

    fn read_file(&self, name: &str) -> Result<Bytes> {
        self.race(name)?;
        self.inner.read_file(name)
    }
}

#[test]
fn test_open_follows_generation_that_moved_underneath() {
    let inner = RamDirectory::new();
    let engine = Engine::with_directory(Arc::new(inner.clone()), Arc::new(TextAnalyzer::standard()), Config::default());
    let mut writer = engine.writer().unwrap();
    writer.add_document(article(1, "first", "")).unwrap();
    writer.commit().unwrap();
    let first = inner.read_manifest().unwrap().unwrap();
    writer.add_document(article(2, "second", "")).unwrap();
    writer.commit().unwrap();
    let second = inner.read_manifest().unwrap().unwrap();
    drop(writer);

    inner.atomic_publish(&first, false).unwrap();
    let directory = RacingDirectory {
        inner,
        newer_manifest: Mutex::new(Some(second)),
    };

    let reader = IndexReader::open(Arc::new(directory)).unwrap();
    assert_eq!(reader.generation(), 2);
    assert_eq!(reader.num_docs(), 2);
}

#[test]
fn test_readers_during_concurrent_commits_see_whole_commits() {
    let engine = Engine::in_memory();
    let writer_engine = engine.clone();

    let handle = thread::spawn(move || {
        let mut writer = writer_engine.writer().unwrap();
        for batch in 0..20 {
            for i in 0..5 {
                writer.add_document(article(batch * 5 + i, "batch", "")).unwrap();
            }
            writer.commit().unwrap();
        }
    });

    let mut last_generation = 0;
    while last_generation < 20 {
        let reader = engine.reader().unwrap();
        assert!(reader.generation() >= last_generation);
        assert_eq!(reader.num_docs() % 5, 0);
        assert_eq!(reader.num_docs(), reader.generation() * 5);
        let count = engine.searcher(&reader).count(&Query::term("title", "batch")).unwrap();
        assert_eq!(count as u64, reader.num_docs());
        last_generation = reader.generation();
        if handle.is_finished() && last_generation < 20 {
            break;
        }
    }

    handle.join().unwrap();
    assert_eq!(engine.reader().unwrap().num_docs(), 100);
}

#[test]
fn test_filesystem_index_persists_across_engines() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::default().with_storage_path(dir.path());

    {
        let engine = Engine::open(config.clone()).unwrap();
        let mut writer = engine.writer().unwrap();
        assert!(Engine::open(config.clone()).unwrap().writer().err().unwrap().is_lock_held());

        writer.add_document(article(1, "persisted", "on disk")).unwrap();
        writer.add_document(article(2, "persisted", "too")).unwrap();
        writer.commit().unwrap();
        writer.delete_documents(&Query::exact("id", 2)).unwrap();
        writer.close().unwrap();
    }

    let engine = Engine::open(config).unwrap();
    let reader = engine.reader().unwrap();
    assert_eq!(reader.generation(), 2);
    assert_eq!(sorted_ids(&engine.search(&Query::term("title", "persisted"), 10).unwrap()), vec![1]);

    let files = engine.directory().list_files().unwrap();
    assert!(files.contains(layout::MANIFEST_FILE));
    assert!(files.contains(&layout::tombstone_file(SegmentId(0), 2)));
    assert!(!files.contains(layout::MANIFEST_TMP_FILE));

    // Lock released on close
    assert!(engine.writer().is_ok());
}
