//! This module provides an iterator over the files of a directory tree that hands out
//! editable working copies and leaves the originals untouched.
//!
//! ### Key Features:
//! - **Snapshot**: The matching files are collected once, at construction. Later changes to the
//!   tree are not seen.
//! - **One open file**: Advancing closes the previous handle before the next one is opened.
//! - **Staging area**: Copies live in a private directory that is deleted on teardown.
//! - **Auto‑cleanup**: `close()` tears everything down; `Drop` does the same if it was not called.

use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::{Error, Result};
use crate::files::entry::OpenEntry;
use crate::files::staging::StagingDir;
use crate::files::{Current, Mode, Options};

/// Where a [`ScopedFiles`] is in its lifecycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum State {
    /// No file is open and the snapshot still has entries to hand out
    /// (or has not been advanced over yet).
    Idle,
    /// A file is open.
    Open,
    /// The snapshot has been consumed (or iteration was aborted by an error).
    Exhausted,
    /// Torn down. Terminal.
    Closed,
}

/// Iterates the files under a base directory, one open file at a time.
///
/// `ScopedFiles` takes a snapshot of the matching files when it is created. Each call to
/// [`next_file`](Self::next_file) closes the previously opened file, stages a copy of the next
/// original in a private directory, opens the copy for reading and writing and returns it.
/// Once the snapshot is consumed, further calls return `None`; the tree is never rescanned.
///
/// ### Usage notes:
/// - Copies are named after the original's file name, so two originals with the same name in
///   different directories share one staged path; the later one replaces the earlier copy.
/// - Nothing is ever written under the base directory.
/// - Not thread‑safe, and not meant for nested iteration over one instance.
///
/// ### Example:
/// ```
/// use std::io::{Seek, SeekFrom, Write};
/// use scoped_files::{Options, ScopedFiles, filter};
///
/// let base = std::env::temp_dir().join("scoped_files_doc");
/// std::fs::create_dir_all(&base).unwrap();
/// std::fs::write(base.join("a.txt"), "hello").unwrap();
///
/// let options = Options::new().predicate(filter::extension("txt"));
/// let mut files = ScopedFiles::with_options(&base, options).unwrap();
/// while let Some(mut file) = files.next_file().unwrap() {
///     assert_eq!(file.text().unwrap(), "hello");
///     file.seek(SeekFrom::Start(0)).unwrap();
///     file.write_all(b"HELLO").unwrap();
/// }
/// files.close();
///
/// assert_eq!(std::fs::read_to_string(base.join("a.txt")).unwrap(), "hello");
/// # std::fs::remove_dir_all(&base).unwrap();
/// ```
pub struct ScopedFiles {
    base_dir: PathBuf,
    mode: Mode,
    snapshot: Vec<PathBuf>,
    position: usize, // index of the next snapshot entry to open
    staging: Option<StagingDir>,
    current: Option<OpenEntry>,
    spent: bool,
    closed: bool,
}

impl ScopedFiles {
    /// Creates an iterator over every regular file below `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        Self::with_options(base_dir, Options::default())
    }

    /// Creates an iterator over the files below `base_dir` accepted by `options`.
    ///
    /// # Errors
    /// * [`Error::NotFound`] - `base_dir` does not exist or is not a directory.
    /// * [`Error::InvalidArgument`] - `base_dir` is empty, or the staging location can not be
    ///   used: a [`Staging::Fixed`](crate::Staging::Fixed) path that is a file, lies inside
    ///   `base_dir` or contains it; or, with [`Staging::Temp`](crate::Staging::Temp), a `base_dir`
    ///   that contains the system temp directory (e.g. `/`). Use `Staging::Fixed` with a path
    ///   outside `base_dir` in that case.
    /// * [`Error::Io`] - the staging directory could not be created.
    pub fn with_options<P: AsRef<Path>>(base_dir: P, options: Options) -> Result<Self> {
        let base_dir = base_dir.as_ref();

        if base_dir.as_os_str().is_empty() {
            return Err(Error::InvalidArgument(
                "base directory path is empty".to_string(),
            ));
        }
        if !base_dir.is_dir() {
            return Err(Error::not_found(base_dir));
        }

        let snapshot = Self::take_snapshot(base_dir, &options);
        debug!(
            "snapshot of {}: {} file(s)",
            base_dir.display(),
            snapshot.len()
        );

        let staging = match options.mode {
            Mode::WritableCopy => Some(StagingDir::create(&options.staging, base_dir)?),
            Mode::ReadOnlyDirect => None,
        };

        Ok(Self {
            base_dir: base_dir.to_path_buf(),
            mode: options.mode,
            snapshot,
            position: 0,
            staging,
            current: None,
            spent: false,
            closed: false,
        })
    }

    /// Runs `f` against a new iterator and tears it down afterwards, whatever `f` returns.
    ///
    /// ```
    /// use scoped_files::{Options, ScopedFiles};
    ///
    /// let base = std::env::temp_dir().join("scoped_files_scope_doc");
    /// std::fs::create_dir_all(&base).unwrap();
    /// std::fs::write(base.join("one.txt"), "1").unwrap();
    ///
    /// let names = ScopedFiles::scope(&base, Options::new(), |files| {
    ///     let mut names = Vec::new();
    ///     while let Some(file) = files.next_file()? {
    ///         names.push(file.name().unwrap().to_string_lossy().into_owned());
    ///     }
    ///     Ok::<_, scoped_files::Error>(names)
    /// })
    /// .unwrap();
    ///
    /// assert_eq!(names, ["one.txt"]);
    /// # std::fs::remove_dir_all(&base).unwrap();
    /// ```
    pub fn scope<P, T, E, F>(base_dir: P, options: Options, f: F) -> std::result::Result<T, E>
    where
        P: AsRef<Path>,
        E: From<Error>,
        F: FnOnce(&mut ScopedFiles) -> std::result::Result<T, E>,
    {
        let mut files = Self::with_options(base_dir, options)?;
        let result = f(&mut files);
        files.close();
        result
    }

    /// Regular files below `base_dir` accepted by the predicate, in walk order.
    /// Entries that can not be read are left out.
    fn take_snapshot(base_dir: &Path, options: &Options) -> Vec<PathBuf> {
        let mut walker = WalkDir::new(base_dir)
            .min_depth(1)
            .follow_links(options.follow_links);
        if options.sorted {
            walker = walker.sort_by_file_name();
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("skipping unreadable entry: {}", e);
                    continue;
                }
            };
            // `Path::is_file` follows symlinks, so links to regular files are kept
            let path = entry.path();
            if path.is_file() && options.accepts(path) {
                files.push(path.to_path_buf());
            }
        }
        files
    }

    /// Opens the next file of the snapshot.
    ///
    /// The previously returned file is closed first. Returns `Ok(None)` once the snapshot is
    /// consumed, and on every call after that.
    ///
    /// # Errors
    /// * [`Error::NotFound`] - the original disappeared after the snapshot was taken.
    /// * [`Error::Io`] - copying or opening failed.
    ///
    /// Any error aborts the iteration: the remaining entries are dropped and later calls
    /// return `Ok(None)`. Copies handed out before stay where they are until teardown.
    pub fn next_file(&mut self) -> Result<Option<Current<'_>>> {
        self.close_current();
        if self.closed || self.spent {
            return Ok(None);
        }

        let Some(original) = self.snapshot.get(self.position).cloned() else {
            debug!("snapshot of {} consumed", self.base_dir.display());
            self.forget_snapshot();
            return Ok(None);
        };
        self.position += 1;

        match self.open(original) {
            Ok(entry) => Ok(Some(Current::new(self.current.insert(entry)))),
            Err(e) => {
                self.forget_snapshot();
                Err(e)
            }
        }
    }

    fn open(&self, original: PathBuf) -> Result<OpenEntry> {
        if !original.is_file() {
            return Err(Error::not_found(&original));
        }
        match &self.staging {
            Some(staging) => {
                let staged = staging.stage(&original)?;
                let file = OpenOptions::new()
                    .read(true)
                    .write(true)
                    .open(&staged)
                    .map_err(|e| Error::io(&staged, e))?;
                debug!("staged {} as {}", original.display(), staged.display());
                Ok(OpenEntry::new(original, Some(staged), file))
            }
            None => {
                let file = File::open(&original).map_err(|e| Error::io(&original, e))?;
                debug!("opened {}", original.display());
                Ok(OpenEntry::new(original, None, file))
            }
        }
    }

    fn forget_snapshot(&mut self) {
        self.snapshot.clear();
        self.position = 0;
        self.spent = true;
    }

    /// Closes the open file, if any, and drops its cached text. Can be called any number of
    /// times.
    pub fn close_current(&mut self) {
        if let Some(entry) = self.current.take() {
            debug!("closed {}", entry.original().display());
        }
    }

    /// Tears the iterator down: closes the open file and deletes the staging directory with
    /// everything in it.
    ///
    /// Never fails; a directory that can not be removed is only logged. Calling it again is a
    /// no-op. `Drop` calls it too, but only as a fallback.
    pub fn close(&mut self) {
        self.close_current();
        if let Some(staging) = self.staging.take() {
            let path = staging.path().to_path_buf();
            match staging.remove() {
                Ok(()) => debug!("removed staging directory {}", path.display()),
                Err(e) => warn!(
                    "failed to remove staging directory {}: {}",
                    path.display(),
                    e
                ),
            }
        }
        self.snapshot.clear();
        self.position = 0;
        self.closed = true;
    }

    /// Returns the open file again, e.g. after the borrow from `next_file` has ended.
    pub fn current_file(&mut self) -> Option<Current<'_>> {
        self.current.as_mut().map(Current::new)
    }

    /// Parent directory of the open file's original.
    pub fn current_dir(&self) -> Option<&Path> {
        self.current.as_ref().and_then(OpenEntry::dir)
    }

    /// File name of the open file's original.
    pub fn current_name(&self) -> Option<&OsStr> {
        self.current.as_ref().and_then(OpenEntry::name)
    }

    /// Full path of the open file's original.
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(OpenEntry::original)
    }

    /// Path of the open working copy. Always `None` in [`Mode::ReadOnlyDirect`].
    pub fn current_staged_path(&self) -> Option<&Path> {
        self.current.as_ref().and_then(OpenEntry::staged)
    }

    /// Text of the open file, read on first access and cached until it is closed.
    /// `Ok(None)` when no file is open.
    pub fn current_text(&mut self) -> Result<Option<&str>> {
        match self.current.as_mut() {
            Some(entry) => entry.text().map(Some),
            None => Ok(None),
        }
    }

    pub fn state(&self) -> State {
        if self.closed {
            State::Closed
        } else if self.current.is_some() {
            State::Open
        } else if self.spent {
            State::Exhausted
        } else {
            State::Idle
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// The staging directory; `None` in [`Mode::ReadOnlyDirect`] and after teardown.
    pub fn staging_dir(&self) -> Option<&Path> {
        self.staging.as_ref().map(StagingDir::path)
    }

    /// Every file of the snapshot, in iteration order. Empty once consumed.
    pub fn snapshot(&self) -> &[PathBuf] {
        &self.snapshot
    }

    /// Number of files not handed out yet.
    pub fn remaining(&self) -> usize {
        self.snapshot.len() - self.position
    }
}

impl Drop for ScopedFiles {
    fn drop(&mut self) {
        if !self.closed {
            self.close();
        }
    }
}
