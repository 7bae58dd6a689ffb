//! How the engine observes the filesystem: existence and modification time, nothing else.

use std::io;
use std::path::{Path, PathBuf};

use fab_types::Mtime;

use crate::error::BuildError;

/// Source of file modification times.
pub trait Filesystem {
    /// Returns the [`Mtime`] of `path`, `None` if nothing exists there.
    ///
    /// Implementations must not cache, the engine relies on seeing the effects of commands.
    fn mtime(&self, path: &str) -> Result<Option<Mtime>, BuildError>;
}

impl<T: Filesystem + ?Sized> Filesystem for &T {
    fn mtime(&self, path: &str) -> Result<Option<Mtime>, BuildError> {
        (**self).mtime(path)
    }
}

/// The real filesystem of the host.
#[derive(Debug, Clone, Default)]
pub struct HostFilesystem {
    /// Relative paths are resolved against this directory, or the process' working directory.
    root: Option<PathBuf>,
}

impl HostFilesystem {
    pub fn new() -> Self {
        HostFilesystem::default()
    }

    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        HostFilesystem {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => Path::new(path).to_path_buf(),
        }
    }
}

impl Filesystem for HostFilesystem {
    fn mtime(&self, path: &str) -> Result<Option<Mtime>, BuildError> {
        let stat_err = |source: io::Error| BuildError::Stat {
            path: path.to_string(),
            source,
        };

        match std::fs::metadata(self.resolve(path)) {
            Ok(metadata) => {
                let modified = metadata.modified().map_err(stat_err)?;
                Ok(Some(Mtime::from(modified)))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(stat_err(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::time::{Duration, SystemTime};

    use super::*;

    #[test]
    fn missing_file_has_no_mtime() {
        let dir = tempfile::TempDir::new().unwrap();
        let fs = HostFilesystem::rooted_at(dir.path());
        assert_eq!(fs.mtime("nope.txt").unwrap(), None);
    }

    #[test]
    fn reads_modified_time() {
        let dir = tempfile::TempDir::new().unwrap();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let file = File::create(dir.path().join("a.c")).unwrap();
        file.set_modified(when).unwrap();
        drop(file);

        let fs = HostFilesystem::rooted_at(dir.path());
        assert_eq!(fs.mtime("a.c").unwrap(), Some(Mtime::from_secs(1_000_000)));

        // Absolute paths ignore the root.
        let absolute = dir.path().join("a.c");
        let fs = HostFilesystem::new();
        assert_eq!(
            fs.mtime(absolute.to_str().unwrap()).unwrap(),
            Some(Mtime::from_secs(1_000_000))
        );
    }
}
