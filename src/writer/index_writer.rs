use std::collections::HashSet;
use std::sync::Arc;
use chrono::Utc;
use log::{debug, info, warn};
use crate::analysis::analyzer::Analyzer;
use crate::core::config::WriterConfig;
use crate::core::error::{Error, Result};
use crate::core::types::{DocOrdinal, Document};
use crate::index::inverted::InvertedIndex;
use crate::query::ast::Query;
use crate::query::evaluator::evaluate;
use crate::query::planner::{Plan, QueryPlanner};
use crate::reader::snapshot_reader::SegmentSnapshot;
use crate::scoring::scorer::TfIdfScorer;
use crate::storage::directory::{Directory, DirectoryLock};
use crate::storage::layout;
use crate::storage::manifest::{Manifest, SegmentEntry};
use crate::storage::segment::SegmentId;
use crate::storage::segment_reader::SegmentReader;
use crate::storage::segment_writer::SegmentWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// Nothing pending since open.
    Open,
    /// Documents or deletes waiting for the next commit.
    Buffering,
    Flushing,
    /// Last commit published; nothing pending.
    Committed,
}

/// A delete recorded while documents were buffered. It covers the first
/// `covers` buffered documents, the ones added before it.
struct BufferedDelete {
    plan: Plan,
    covers: u32,
}

/// Everything a commit produces before the manifest swap. Applied to the
/// writer only once publication succeeded.
struct PendingCommit {
    manifest: Manifest,
    new_segment: Option<SegmentSnapshot>,
}

/// Single writer per index location.
///
/// Owns the write lock, the build buffer for the next segment and the
/// working tombstones of committed segments. Readers never see any of it
/// until `commit` publishes a new manifest.
pub struct IndexWriter {
    directory: Arc<dyn Directory>,
    analyzer: Arc<dyn Analyzer>,
    config: WriterConfig,
    manifest: Manifest,
    segments: Vec<SegmentSnapshot>,
    dirty: HashSet<SegmentId>,  // Segments with unpublished tombstones
    buffer: InvertedIndex,
    buffered_deletes: Vec<BufferedDelete>,
    state: WriterState,
    _lock: Box<dyn DirectoryLock>,
}

impl IndexWriter {
    /// Take the write lock and load the latest committed state.
    pub fn open(directory: Arc<dyn Directory>, analyzer: Arc<dyn Analyzer>, config: WriterConfig) -> Result<Self> {
        let lock = directory.obtain_lock(config.lock_timeout)?;

        let manifest = Manifest::load(&*directory)?.unwrap_or_else(Manifest::empty);
        let segments = manifest
            .segments
            .iter()
            .map(|entry| {
                SegmentSnapshot::load(&*directory, entry).map_err(|e| {
                    if e.is_not_found() {
                        Error::corrupt_segment(format!("{} references a missing file: {}", entry.id, e.context))
                    } else {
                        e
                    }
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let writer = IndexWriter {
            buffer: InvertedIndex::new(config.stored_compression),
            directory,
            analyzer,
            config,
            manifest,
            segments,
            dirty: HashSet::new(),
            buffered_deletes: Vec::new(),
            state: WriterState::Open,
            _lock: lock,
        };

        // Leftovers of an interrupted commit
        writer.remove_obsolete_files();

        info!(
            "opened writer at generation {} ({} segments)",
            writer.manifest.generation,
            writer.segments.len()
        );
        Ok(writer)
    }

    pub fn state(&self) -> WriterState {
        self.state
    }

    /// Generation of the last published manifest.
    pub fn generation(&self) -> u64 {
        self.manifest.generation
    }

    pub fn num_buffered_docs(&self) -> u32 {
        self.buffer.doc_count
    }

    pub fn has_uncommitted_changes(&self) -> bool {
        !self.buffer.is_empty() || !self.dirty.is_empty()
    }

    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    /// Buffer a document for the next segment. An analysis failure leaves
    /// the buffer as it was.
    pub fn add_document(&mut self, doc: Document) -> Result<()> {
        self.buffer.add_document(&doc, self.analyzer.as_ref())?;
        self.state = WriterState::Buffering;
        Ok(())
    }

    /// Tombstone every live committed document matching `query`, plus the
    /// matching documents buffered so far. Returns the number of committed
    /// documents newly marked; buffered ones are resolved at commit.
    pub fn delete_documents(&mut self, query: &Query) -> Result<u64> {
        let plan = QueryPlanner::new(self.analyzer.as_ref()).plan(query)?;
        let matches = self.collect_matches(&plan)?;

        let deleted = self.apply_deletes(matches);
        self.buffer_delete(plan, self.buffer.doc_count);
        Ok(deleted)
    }

    /// Delete whatever matches `delete_query`, then add `doc`. Both take
    /// effect in the same commit, and either both or neither are recorded.
    pub fn update_document(&mut self, delete_query: &Query, doc: Document) -> Result<u64> {
        let plan = QueryPlanner::new(self.analyzer.as_ref()).plan(delete_query)?;
        let matches = self.collect_matches(&plan)?;
        let covers = self.buffer.doc_count;

        self.buffer.add_document(&doc, self.analyzer.as_ref())?;

        let deleted = self.apply_deletes(matches);
        self.buffer_delete(plan, covers);
        self.state = WriterState::Buffering;
        Ok(deleted)
    }

    fn collect_matches(&self, plan: &Plan) -> Result<Vec<(usize, Vec<DocOrdinal>)>> {
        let scorer = TfIdfScorer::new();
        let mut matches = Vec::new();
        if plan.is_empty() {
            return Ok(matches);
        }
        for (i, segment) in self.segments.iter().enumerate() {
            let ordinals: Vec<DocOrdinal> = evaluate(plan, segment, &scorer)?.map(|(o, _)| o).collect();
            if !ordinals.is_empty() {
                matches.push((i, ordinals));
            }
        }
        Ok(matches)
    }

    fn apply_deletes(&mut self, matches: Vec<(usize, Vec<DocOrdinal>)>) -> u64 {
        let mut deleted = 0;
        for (i, ordinals) in matches {
            let segment = &mut self.segments[i];
            let tombstones = Arc::make_mut(&mut segment.tombstones);
            for ordinal in ordinals {
                if tombstones.insert(ordinal) {
                    deleted += 1;
                }
            }
            self.dirty.insert(segment.id());
            debug!("marked deletes in {}, {} now deleted", segment.id(), segment.num_deleted());
        }
        if deleted > 0 {
            self.state = WriterState::Buffering;
        }
        deleted
    }

    fn buffer_delete(&mut self, plan: Plan, covers: u32) {
        if covers > 0 && !plan.is_empty() {
            self.buffered_deletes.push(BufferedDelete { plan, covers });
            self.state = WriterState::Buffering;
        }
    }

    /// Flush the buffer as a new segment, write pending tombstones and
    /// atomically publish a new manifest. Returns the published generation.
    ///
    /// On failure the previous manifest stays in effect, pending work is
    /// kept and the call can be retried.
    pub fn commit(&mut self) -> Result<u64> {
        if !self.has_uncommitted_changes() {
            return Ok(self.manifest.generation);
        }

        let previous = self.state;
        self.state = WriterState::Flushing;

        let pending = match self.prepare_commit() {
            Ok(pending) => pending,
            Err(e) => {
                self.state = previous;
                warn!("commit of generation {} failed: {}", self.manifest.generation + 1, e);
                return Err(if e.is_commit() { e } else { Error::commit(e.to_string()) });
            }
        };

        self.finish_commit(pending);
        self.remove_obsolete_files();
        self.state = WriterState::Committed;

        info!(
            "committed generation {} ({} segments, {} live docs)",
            self.manifest.generation,
            self.manifest.segments.len(),
            self.manifest.num_docs()
        );
        Ok(self.manifest.generation)
    }

    // Writes files and publishes; touches no writer state.
    fn prepare_commit(&self) -> Result<PendingCommit> {
        let generation = self.manifest.generation + 1;
        let sync = self.config.sync_on_commit;
        let mut manifest = self.manifest.clone();
        manifest.generation = generation;
        manifest.committed_at = Utc::now();

        for (entry, segment) in manifest.segments.iter_mut().zip(&self.segments) {
            if self.dirty.contains(&segment.id()) {
                SegmentWriter::write_tombstones(&*self.directory, segment.id(), generation, &segment.tombstones, sync)?;
                entry.del_gen = Some(generation);
                entry.del_count = segment.num_deleted();
            }
        }

        let new_segment = if self.buffer.is_empty() {
            None
        } else {
            let id = SegmentId(manifest.next_segment_id);
            let frozen = self.buffer.freeze()?;
            SegmentWriter::write(&*self.directory, id, &frozen, sync)?;

            let reader = Arc::new(SegmentReader::from_frozen(id, frozen)?);
            let mut snapshot = SegmentSnapshot::new(SegmentEntry::new(id, reader.doc_count), reader);
            self.apply_buffered_deletes(&mut snapshot)?;

            if snapshot.num_deleted() > 0 {
                SegmentWriter::write_tombstones(&*self.directory, id, generation, &snapshot.tombstones, sync)?;
                snapshot.entry.del_gen = Some(generation);
                snapshot.entry.del_count = snapshot.num_deleted();
            }

            manifest.segments.push(snapshot.entry.clone());
            manifest.next_segment_id += 1;
            Some(snapshot)
        };

        self.directory.atomic_publish(&manifest.encode()?, sync)?;
        Ok(PendingCommit { manifest, new_segment })
    }

    /// Run buffered deletes against the segment built from the buffer, each
    /// limited to the documents that were buffered before it.
    fn apply_buffered_deletes(&self, snapshot: &mut SegmentSnapshot) -> Result<()> {
        let scorer = TfIdfScorer::new();
        for delete in &self.buffered_deletes {
            let ordinals: Vec<DocOrdinal> = evaluate(&delete.plan, snapshot, &scorer)?
                .map(|(o, _)| o)
                .take_while(|o| *o < delete.covers)
                .collect();
            let tombstones = Arc::make_mut(&mut snapshot.tombstones);
            tombstones.extend(ordinals);
        }
        Ok(())
    }

    fn finish_commit(&mut self, pending: PendingCommit) {
        for (snapshot, entry) in self.segments.iter_mut().zip(&pending.manifest.segments) {
            snapshot.entry = entry.clone();
        }
        if let Some(snapshot) = pending.new_segment {
            debug!("flushed {} with {} docs", snapshot.id(), snapshot.doc_count());
            self.segments.push(snapshot);
        }
        self.manifest = pending.manifest;
        self.dirty.clear();
        self.buffer.clear();
        self.buffered_deletes.clear();
    }

    /// Delete index files the current manifest no longer references. Best
    /// effort: failures are logged and retried after the next commit.
    fn remove_obsolete_files(&self) {
        let referenced = self.manifest.referenced_files();
        let files = match self.directory.list_files() {
            Ok(files) => files,
            Err(e) => {
                warn!("could not list index files: {}", e);
                return;
            }
        };

        for name in files {
            if layout::is_index_file(&name) && !referenced.contains(&name) {
                match self.directory.delete_file(&name) {
                    Ok(()) => debug!("removed obsolete file {}", name),
                    Err(e) => warn!("could not remove obsolete file {}: {}", name, e),
                }
            }
        }
    }

    /// Drop buffered documents and pending deletes, release the lock. The
    /// last committed state is untouched.
    pub fn rollback(self) {
        info!(
            "rolled back writer at generation {} ({} buffered docs discarded)",
            self.manifest.generation,
            self.buffer.doc_count
        );
    }

    /// Commit pending changes and release the lock.
    pub fn close(mut self) -> Result<u64> {
        let generation = self.commit()?;
        debug!("closed writer at generation {}", generation);
        Ok(generation)
    }
}
