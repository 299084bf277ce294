#![allow(dead_code)]

use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use bytes::Bytes;
use quarry::core::error::{Error, ErrorKind, Result};
use quarry::core::types::{DocId, Document};
use quarry::search::results::TopDocs;
use quarry::storage::directory::{Directory, DirectoryLock, WritableFile};
use quarry::storage::ram_directory::RamDirectory;

pub fn article(id: i64, title: &str, content: &str) -> Document {
    Document::new()
        .with_i64("id", id)
        .with_text("title", title)
        .with_text("content", content)
}

pub fn ids(top: &TopDocs) -> Vec<i64> {
    top.doc_ids().into_iter().map(|DocId(id)| id).collect()
}

pub fn sorted_ids(top: &TopDocs) -> Vec<i64> {
    let mut ids = ids(top);
    ids.sort_unstable();
    ids
}

/// RamDirectory that can be told to fail file creation or manifest
/// publication. Also remembers how often it was asked to sync.
#[derive(Clone, Default)]
pub struct FailingDirectory {
    pub inner: RamDirectory,
    fail_create: Arc<AtomicBool>,
    fail_publish: Arc<AtomicBool>,
    synced_publishes: Arc<AtomicUsize>,
    synced_files: Arc<AtomicUsize>,
}

impl FailingDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::SeqCst);
    }

    pub fn fail_publish(&self, fail: bool) {
        self.fail_publish.store(fail, Ordering::SeqCst);
    }

    pub fn synced_publishes(&self) -> usize {
        self.synced_publishes.load(Ordering::SeqCst)
    }

    pub fn synced_files(&self) -> usize {
        self.synced_files.load(Ordering::SeqCst)
    }

    fn injected(what: &str) -> Error {
        Error::new(ErrorKind::Io, format!("injected {} failure", what))
    }
}

struct CountingFile {
    inner: Box<dyn WritableFile>,
    synced: Arc<AtomicUsize>,
}

impl Write for CountingFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

impl WritableFile for CountingFile {
    fn close(self: Box<Self>, sync: bool) -> Result<()> {
        if sync {
            self.synced.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.close(sync)
    }
}

impl Directory for FailingDirectory {
    fn create_file(&self, name: &str) -> Result<Box<dyn WritableFile>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(Self::injected("create"));
        }
        Ok(Box::new(CountingFile {
            inner: self.inner.create_file(name)?,
            synced: self.synced_files.clone(),
        }))
    }

    fn open_file(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        self.inner.open_file(name)
    }

    fn list_files(&self) -> Result<BTreeSet<String>> {
        self.inner.list_files()
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        self.inner.delete_file(name)
    }

    fn atomic_publish(&self, manifest: &[u8], sync: bool) -> Result<()> {
        if self.fail_publish.load(Ordering::SeqCst) {
            return Err(Self::injected("publish"));
        }
        if sync {
            self.synced_publishes.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.atomic_publish(manifest, sync)
    }

    fn read_manifest(&self) -> Result<Option<Bytes>> {
        self.inner.read_manifest()
    }

    fn obtain_lock(&self, timeout: Option<Duration>) -> Result<Box<dyn DirectoryLock>> {
        self.inner.obtain_lock(timeout)
    }

    fn read_file(&self, name: &str) -> Result<Bytes> {
        self.inner.read_file(name)
    }
}
