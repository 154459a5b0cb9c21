use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

/// Atomic file replacement via a temporary file and rename.
pub struct AtomicFile {
    path: PathBuf,
    temp_path: PathBuf,
}

impl AtomicFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let temp_path = Self::temp_path(&path)?;

        Ok(Self { path, temp_path })
    }

    fn temp_path(path: &Path) -> Result<PathBuf> {
        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("Invalid file path"))?;

        let temp_name = format!(
            ".{}.tmp.{}",
            file_name.to_string_lossy(),
            std::process::id()
        );

        Ok(path.with_file_name(temp_name))
    }

    /// Write content so that readers only ever observe the previous or the
    /// new version of the file, never a partial write.
    pub fn write(&self, content: &[u8]) -> Result<()> {
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.temp_path)
            .context("Failed to create temporary file")?;

        temp_file
            .write_all(content)
            .context("Failed to write to temporary file")?;

        temp_file
            .sync_all()
            .context("Failed to sync temporary file")?;

        #[cfg(unix)]
        {
            let metadata = fs::metadata(&self.temp_path)?;
            let mut permissions = metadata.permissions();
            permissions.set_mode(0o644);
            fs::set_permissions(&self.temp_path, permissions)?;
        }

        fs::rename(&self.temp_path, &self.path)
            .context("Failed to atomically rename file")?;

        Ok(())
    }
}

/// Process-wide mutual exclusion per backing file path. All repository
/// operations on the same document funnel through the same mutex, which
/// gives read-your-writes consistency within the process.
static PATH_LOCKS: Lazy<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

pub fn path_lock(path: &Path) -> Arc<Mutex<()>> {
    let mut locks = PATH_LOCKS.lock().unwrap_or_else(PoisonError::into_inner);
    locks
        .entry(path.to_path_buf())
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone()
}

/// File locking mechanism to prevent concurrent access across processes
#[cfg(unix)]
pub mod lock {
    use anyhow::Result;
    use std::fs::File;
    use std::os::unix::io::AsRawFd;

    pub struct FileLock {
        file: File,
    }

    impl FileLock {
        pub fn acquire(file: File) -> Result<Self> {
            use libc::{flock, LOCK_EX};

            let fd = file.as_raw_fd();
            let result = unsafe { flock(fd, LOCK_EX) };

            if result != 0 {
                anyhow::bail!("Failed to acquire file lock");
            }

            Ok(Self { file })
        }
    }

    impl Drop for FileLock {
        fn drop(&mut self) {
            use libc::{flock, LOCK_UN};

            let fd = self.file.as_raw_fd();
            unsafe { flock(fd, LOCK_UN) };
        }
    }
}

#[cfg(not(unix))]
pub mod lock {
    use anyhow::Result;
    use std::fs::File;

    pub struct FileLock {
        _file: File,
    }

    impl FileLock {
        pub fn acquire(file: File) -> Result<Self> {
            Ok(Self { _file: file })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    #[test]
    fn test_atomic_write() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("test.xml");

        let atomic_file = AtomicFile::new(&file_path)?;
        atomic_file.write(b"<projects/>")?;

        assert_eq!(fs::read(&file_path)?, b"<projects/>");
        Ok(())
    }

    #[test]
    fn test_atomic_write_replaces_existing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("test.xml");
        fs::write(&file_path, b"old")?;

        AtomicFile::new(&file_path)?.write(b"new")?;

        assert_eq!(fs::read(&file_path)?, b"new");
        Ok(())
    }

    #[test]
    fn test_path_lock_is_shared_per_path() {
        let a = path_lock(Path::new("/tmp/same.xml"));
        let b = path_lock(Path::new("/tmp/same.xml"));
        let c = path_lock(Path::new("/tmp/other.xml"));

        assert!(Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
    }

    #[test]
    fn test_file_lock_acquire_and_release() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let file_path = temp_dir.path().join("locked.txt");

        fs::write(&file_path, "test")?;

        let file = File::open(&file_path)?;
        let lock = lock::FileLock::acquire(file)?;
        drop(lock);

        Ok(())
    }
}
