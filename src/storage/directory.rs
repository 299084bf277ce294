use std::collections::BTreeSet;
use std::io::{Read, Write};
use std::time::Duration;
use bytes::Bytes;
use crate::core::error::Result;

/// Write handle returned by [`Directory::create_file`]. A file is complete
/// only once `close` returns; dropping the handle abandons it.
pub trait WritableFile: Write + Send {
    fn close(self: Box<Self>, sync: bool) -> Result<()>;
}

/// Held while a writer owns an index location; dropping it releases the lock.
pub trait DirectoryLock: Send {}

/// Storage medium for index files.
///
/// `atomic_publish` is the only operation that must be crash-atomic: after it
/// returns, `read_manifest` yields the new bytes, and a crash at any point
/// leaves either the old or the new manifest in place, never a mix. With
/// `sync == false` the swap is still atomic but may not survive power loss.
pub trait Directory: Send + Sync {
    fn create_file(&self, name: &str) -> Result<Box<dyn WritableFile>>;

    fn open_file(&self, name: &str) -> Result<Box<dyn Read + Send>>;

    fn list_files(&self) -> Result<BTreeSet<String>>;

    fn delete_file(&self, name: &str) -> Result<()>;

    fn atomic_publish(&self, manifest: &[u8], sync: bool) -> Result<()>;

    /// `None` when nothing has been published yet.
    fn read_manifest(&self) -> Result<Option<Bytes>>;

    /// `timeout == None` fails fast with `LockHeld`.
    fn obtain_lock(&self, timeout: Option<Duration>) -> Result<Box<dyn DirectoryLock>>;

    /// Whole-file read.
    fn read_file(&self, name: &str) -> Result<Bytes> {
        let mut data = Vec::new();
        self.open_file(name)?.read_to_end(&mut data)?;
        Ok(Bytes::from(data))
    }

    /// Create, fill and close a file in one step.
    fn write_file(&self, name: &str, data: &[u8], sync: bool) -> Result<()> {
        let mut file = self.create_file(name)?;
        file.write_all(data)?;
        file.close(sync)
    }
}
