//! The staging directory that holds working copies.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::core::{Error, Result, utils};
use crate::files::Staging;

const TEMP_PREFIX: &str = ".scoped-files-";

pub(crate) enum StagingDir {
    Temp(TempDir),
    Fixed(PathBuf),
}

impl StagingDir {
    /// Creates the staging directory described by `staging`.
    /// The staging directory and `base_dir` must not contain one another: copies must not land
    /// in the tree being iterated, and teardown must not delete it.
    pub(crate) fn create(staging: &Staging, base_dir: &Path) -> Result<Self> {
        match staging {
            Staging::Temp => {
                let temp_root = std::env::temp_dir();
                if utils::is_within(&temp_root, base_dir) {
                    return Err(Error::InvalidArgument(format!(
                        "system temp directory {} lies inside {}; use Staging::Fixed",
                        temp_root.display(),
                        base_dir.display()
                    )));
                }
                let dir = tempfile::Builder::new()
                    .prefix(TEMP_PREFIX)
                    .tempdir_in(&temp_root)
                    .map_err(|e| Error::io(&temp_root, e))?;
                debug!("created staging directory {}", dir.path().display());
                Ok(StagingDir::Temp(dir))
            }
            Staging::Fixed(path) => {
                if path.as_os_str().is_empty() {
                    return Err(Error::InvalidArgument(
                        "staging directory path is empty".to_string(),
                    ));
                }
                if path.exists() && !path.is_dir() {
                    return Err(Error::InvalidArgument(format!(
                        "staging path {} is not a directory",
                        path.display()
                    )));
                }
                if utils::is_within(path, base_dir) {
                    return Err(Error::InvalidArgument(format!(
                        "staging directory {} lies inside {}",
                        path.display(),
                        base_dir.display()
                    )));
                }
                if utils::is_within(base_dir, path) {
                    return Err(Error::InvalidArgument(format!(
                        "base directory {} lies inside staging directory {}",
                        base_dir.display(),
                        path.display()
                    )));
                }
                if path.is_dir() {
                    debug!("reusing staging directory {}", path.display());
                } else {
                    std::fs::create_dir_all(path).map_err(|e| Error::io(path, e))?;
                    debug!("created staging directory {}", path.display());
                }
                Ok(StagingDir::Fixed(path.clone()))
            }
        }
    }

    pub(crate) fn path(&self) -> &Path {
        match self {
            StagingDir::Temp(dir) => dir.path(),
            StagingDir::Fixed(path) => path,
        }
    }

    /// Copies `original` into the staging directory under its file name and
    /// returns the path of the copy. A stale copy of the same name is replaced.
    pub(crate) fn stage(&self, original: &Path) -> Result<PathBuf> {
        let name = original
            .file_name()
            .ok_or_else(|| Error::not_found(original))?;
        let staged = self.path().join(name);

        // the stale copy may be read-only, so remove it instead of truncating
        if staged.exists() {
            std::fs::remove_file(&staged).map_err(|e| Error::io(&staged, e))?;
        }
        std::fs::copy(original, &staged).map_err(|e| Error::io(original, e))?;
        make_writable(&staged).map_err(|e| Error::io(&staged, e))?;

        Ok(staged)
    }

    /// Deletes the directory and everything in it. "Already gone" is not an error.
    pub(crate) fn remove(self) -> std::io::Result<()> {
        match self {
            StagingDir::Temp(dir) => {
                let path = dir.path().to_path_buf();
                match dir.close() {
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
                    Err(_) => utils::rm_dir_all(path),
                    Ok(()) => Ok(()),
                }
            }
            StagingDir::Fixed(path) => utils::rm_dir_all(path),
        }
    }
}

/// `std::fs::copy` carries the source permissions over; the copy has to be
/// opened for writing.
fn make_writable(path: &Path) -> std::io::Result<()> {
    let mut perms = std::fs::metadata(path)?.permissions();
    if !perms.readonly() {
        return Ok(());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(perms.mode() | 0o200);
    }
    #[cfg(not(unix))]
    {
        #[allow(clippy::permissions_set_readonly_false)]
        perms.set_readonly(false);
    }
    std::fs::set_permissions(path, perms)
}
