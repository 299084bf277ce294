use std::collections::{BTreeSet, HashMap};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use bytes::Bytes;
use parking_lot::{Mutex, RwLock};
use crate::core::error::{Error, Result};
use crate::storage::directory::{Directory, DirectoryLock, WritableFile};
use crate::storage::file_lock::poll_lock;
use crate::storage::layout::MANIFEST_FILE;

/// In-memory directory. Clones share the same files, so a writer and any
/// number of readers can be handed separate handles to one index.
#[derive(Clone, Default)]
pub struct RamDirectory {
    inner: Arc<RamInner>,
}

#[derive(Default)]
struct RamInner {
    files: RwLock<HashMap<String, Bytes>>,
    locked: Mutex<bool>,
}

impl RamDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes held, manifest included.
    pub fn size_bytes(&self) -> usize {
        self.inner.files.read().values().map(|b| b.len()).sum()
    }
}

struct RamWritableFile {
    name: String,
    buffer: Vec<u8>,
    inner: Arc<RamInner>,
}

impl Write for RamWritableFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl WritableFile for RamWritableFile {
    fn close(self: Box<Self>, _sync: bool) -> Result<()> {
        let RamWritableFile { name, buffer, inner } = *self;
        inner.files.write().insert(name, Bytes::from(buffer));
        Ok(())
    }
}

struct RamLock {
    inner: Arc<RamInner>,
}

impl DirectoryLock for RamLock {}

impl Drop for RamLock {
    fn drop(&mut self) {
        *self.inner.locked.lock() = false;
    }
}

impl Directory for RamDirectory {
    fn create_file(&self, name: &str) -> Result<Box<dyn WritableFile>> {
        Ok(Box::new(RamWritableFile {
            name: name.to_string(),
            buffer: Vec::new(),
            inner: self.inner.clone(),
        }))
    }

    fn open_file(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        Ok(Box::new(Cursor::new(self.read_file(name)?)))
    }

    fn list_files(&self) -> Result<BTreeSet<String>> {
        Ok(self.inner.files.read().keys().cloned().collect())
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        match self.inner.files.write().remove(name) {
            Some(_) => Ok(()),
            None => Err(Error::not_found(format!("No such file: {}", name))),
        }
    }

    fn atomic_publish(&self, manifest: &[u8], _sync: bool) -> Result<()> {
        self.inner
            .files
            .write()
            .insert(MANIFEST_FILE.to_string(), Bytes::copy_from_slice(manifest));
        Ok(())
    }

    fn read_manifest(&self) -> Result<Option<Bytes>> {
        Ok(self.inner.files.read().get(MANIFEST_FILE).cloned())
    }

    fn obtain_lock(&self, timeout: Option<Duration>) -> Result<Box<dyn DirectoryLock>> {
        let lock = poll_lock(timeout, || {
            let mut locked = self.inner.locked.lock();
            if *locked {
                return Ok(None);
            }
            *locked = true;
            Ok(Some(RamLock { inner: self.inner.clone() }))
        })?;
        Ok(Box::new(lock))
    }

    fn read_file(&self, name: &str) -> Result<Bytes> {
        self.inner
            .files
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("No such file: {}", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abandoned_handle_leaves_no_file() {
        let dir = RamDirectory::new();
        {
            let mut file = dir.create_file("seg_000000.post").unwrap();
            file.write_all(b"partial").unwrap();
        }
        assert!(dir.list_files().unwrap().is_empty());

        dir.write_file("seg_000000.post", b"done", false).unwrap();
        assert_eq!(&dir.read_file("seg_000000.post").unwrap()[..], b"done");
    }

    #[test]
    fn clones_share_lock() {
        let dir = RamDirectory::new();
        let other = dir.clone();
        let held = dir.obtain_lock(None).unwrap();
        assert!(other.obtain_lock(None).err().unwrap().is_lock_held());
        drop(held);
        assert!(other.obtain_lock(Some(Duration::from_millis(50))).is_ok());
    }
}
