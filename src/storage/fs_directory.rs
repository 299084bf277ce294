use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use bytes::Bytes;
use crate::core::error::{Error, Result};
use crate::storage::directory::{Directory, DirectoryLock, WritableFile};
use crate::storage::file_lock::FileLock;
use crate::storage::layout::StorageLayout;

/// Local filesystem directory. All index files live side by side in one
/// folder.
#[derive(Debug, Clone)]
pub struct FsDirectory {
    pub layout: StorageLayout,
}

impl FsDirectory {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(FsDirectory {
            layout: StorageLayout::new(path.into())?,
        })
    }

    pub fn path(&self) -> &Path {
        &self.layout.base_dir
    }

    fn sync_dir(&self) -> Result<()> {
        #[cfg(unix)]
        {
            File::open(&self.layout.base_dir)?.sync_all()?;
        }
        Ok(())
    }
}

struct FsWritableFile {
    writer: BufWriter<File>,
}

impl Write for FsWritableFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl WritableFile for FsWritableFile {
    fn close(self: Box<Self>, sync: bool) -> Result<()> {
        let file = self.writer
            .into_inner()
            .map_err(|e| Error::from(e.into_error()))?;
        if sync {
            file.sync_all()?;
        }
        Ok(())
    }
}

impl Directory for FsDirectory {
    fn create_file(&self, name: &str) -> Result<Box<dyn WritableFile>> {
        let file = File::create(self.layout.file_path(name))?;
        Ok(Box::new(FsWritableFile {
            writer: BufWriter::new(file),
        }))
    }

    fn open_file(&self, name: &str) -> Result<Box<dyn Read + Send>> {
        let file = File::open(self.layout.file_path(name))?;
        Ok(Box::new(file))
    }

    fn list_files(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();
        for entry in fs::read_dir(&self.layout.base_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    fn delete_file(&self, name: &str) -> Result<()> {
        fs::remove_file(self.layout.file_path(name))?;
        Ok(())
    }

    // write tmp -> fsync -> rename over MANIFEST -> fsync dir
    fn atomic_publish(&self, manifest: &[u8], sync: bool) -> Result<()> {
        let tmp = self.layout.manifest_tmp_path();
        {
            let mut file = File::create(&tmp)?;
            file.write_all(manifest)?;
            if sync {
                file.sync_all()?;
            }
        }
        fs::rename(&tmp, self.layout.manifest_path())?;
        if sync {
            self.sync_dir()?;
        }
        Ok(())
    }

    fn read_manifest(&self) -> Result<Option<Bytes>> {
        match fs::read(self.layout.manifest_path()) {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn obtain_lock(&self, timeout: Option<Duration>) -> Result<Box<dyn DirectoryLock>> {
        let lock = FileLock::acquire(&self.layout.lock_path(), timeout)?;
        Ok(Box::new(lock))
    }

    fn read_file(&self, name: &str) -> Result<Bytes> {
        Ok(Bytes::from(fs::read(self.layout.file_path(name))?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_replaces_manifest_and_leaves_no_tmp() {
        let dir = tempfile::tempdir().unwrap();
        let fs_dir = FsDirectory::open(dir.path()).unwrap();
        assert!(fs_dir.read_manifest().unwrap().is_none());

        fs_dir.atomic_publish(b"gen-1", true).unwrap();
        fs_dir.atomic_publish(b"gen-2", true).unwrap();
        assert_eq!(&fs_dir.read_manifest().unwrap().unwrap()[..], b"gen-2");

        fs_dir.atomic_publish(b"gen-3", false).unwrap();
        assert_eq!(&fs_dir.read_manifest().unwrap().unwrap()[..], b"gen-3");
        assert!(!fs_dir.list_files().unwrap().contains("MANIFEST.tmp"));
    }

    #[test]
    fn second_lock_fails_fast_until_released() {
        let dir = tempfile::tempdir().unwrap();
        let fs_dir = FsDirectory::open(dir.path()).unwrap();
        let held = fs_dir.obtain_lock(None).unwrap();
        let err = fs_dir.obtain_lock(None).err().unwrap();
        assert!(err.is_lock_held());
        drop(held);
        assert!(fs_dir.obtain_lock(None).is_ok());
    }

    #[test]
    fn files_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let fs_dir = FsDirectory::open(dir.path()).unwrap();
        fs_dir.write_file("seg_000000.dict", b"abc", true).unwrap();
        assert_eq!(&fs_dir.read_file("seg_000000.dict").unwrap()[..], b"abc");
        fs_dir.delete_file("seg_000000.dict").unwrap();
        assert!(fs_dir.read_file("seg_000000.dict").unwrap_err().is_not_found());
    }
}
