use std::path::{Path, PathBuf};

/// Errors reported by [`ScopedFiles`](crate::ScopedFiles).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The base directory is missing or is not a directory, or a snapshotted
    /// file disappeared before it could be opened.
    #[error("no such file or directory: {}", .path.display())]
    NotFound { path: PathBuf },

    /// An option value that can not be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Any other I/O failure.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn not_found<P: AsRef<Path>>(path: P) -> Self {
        Error::NotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Maps `NotFound` I/O failures to [`Error::NotFound`], keeps the rest as [`Error::Io`].
    pub(crate) fn io<P: AsRef<Path>>(path: P, source: std::io::Error) -> Self {
        let path = path.as_ref().to_path_buf();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound { path }
        } else {
            Error::Io { path, source }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub mod utils {
    use std::path::{Component, Path, PathBuf};

    /// Resolves `.` and `..` lexically, without touching the host.
    pub fn normalize<P: AsRef<Path>>(path: P) -> PathBuf {
        let mut result = PathBuf::new();
        for component in path.as_ref().components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    result.pop();
                }
                _ => result.push(component),
            }
        }
        result
    }

    /// Returns true if `path` is `dir` or lies below it.
    /// Neither path has to exist; the longest existing ancestor is canonicalized
    /// and the rest is resolved lexically.
    pub fn is_within<P: AsRef<Path>, D: AsRef<Path>>(path: P, dir: D) -> bool {
        resolve(path.as_ref()).starts_with(resolve(dir.as_ref()))
    }

    fn resolve(path: &Path) -> PathBuf {
        let path = if path.is_relative() {
            match std::env::current_dir() {
                Ok(cwd) => cwd.join(path),
                Err(_) => path.to_path_buf(),
            }
        } else {
            path.to_path_buf()
        };
        let path = normalize(path);

        let mut existing = path.as_path();
        loop {
            if let Ok(canonical) = existing.canonicalize() {
                return match path.strip_prefix(existing) {
                    Ok(rest) => canonical.join(rest),
                    Err(_) => canonical,
                };
            }
            match existing.parent() {
                Some(parent) => existing = parent,
                None => return path,
            }
        }
    }

    /// Removes a directory tree, treating "already absent" as success.
    pub fn rm_dir_all<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
        match std::fs::remove_dir_all(path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}
