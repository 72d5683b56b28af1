use std::fmt;
use std::path::{Path, PathBuf};

/// Decides whether a file found under the base directory takes part in the iteration.
pub type Predicate = Box<dyn Fn(&Path) -> bool>;

/// How each snapshotted file is handed to the caller.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    /// The original is copied into the staging directory and the copy is opened read/write.
    #[default]
    WritableCopy,
    /// The original itself is opened read-only. No staging directory is created.
    ReadOnlyDirect,
}

/// Where working copies are kept.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Staging {
    /// A fresh uniquely named directory under the system temp directory.
    #[default]
    Temp,
    /// A caller-chosen directory. Created if missing, reused if it already exists
    /// (e.g. left over by a previous crashed run). Removed on teardown either way.
    Fixed(PathBuf),
}

/// Options for [`ScopedFiles`](crate::ScopedFiles).
///
/// ### Example:
/// ```
/// use std::path::Path;
/// use scoped_files::{Mode, Options, filter};
///
/// let options = Options::new()
///     .predicate(filter::extension("txt"))
///     .mode(Mode::WritableCopy)
///     .sorted(true);
/// assert!(options.accepts(Path::new("notes.txt")));
/// assert!(!options.accepts(Path::new("notes.log")));
/// ```
#[derive(Default)]
pub struct Options {
    pub(crate) predicate: Option<Predicate>,
    pub(crate) mode: Mode,
    pub(crate) staging: Staging,
    pub(crate) sorted: bool,
    pub(crate) follow_links: bool,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the file predicate. Without one every regular file matches.
    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Path) -> bool + 'static,
    {
        self.predicate = Some(Box::new(predicate));
        self
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    pub fn staging(mut self, staging: Staging) -> Self {
        self.staging = staging;
        self
    }

    /// Sorts each directory's entries by file name during the walk.
    /// By default files come in the order the host returns them.
    pub fn sorted(mut self, sorted: bool) -> Self {
        self.sorted = sorted;
        self
    }

    /// Descends into symlinked directories during the walk.
    pub fn follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Applies the predicate to `path`.
    pub fn accepts(&self, path: &Path) -> bool {
        self.predicate.as_ref().is_none_or(|predicate| predicate(path))
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("predicate", &self.predicate.as_ref().map(|_| "<fn>"))
            .field("mode", &self.mode)
            .field("staging", &self.staging)
            .field("sorted", &self.sorted)
            .field("follow_links", &self.follow_links)
            .finish()
    }
}
