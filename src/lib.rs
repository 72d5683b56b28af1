//! Safe iteration over the files of a directory tree through editable working copies.
//!
//! ### Overview
//!
//! `scoped-files` walks a base directory once, remembers the files that match a predicate and then
//! hands them out one at a time. Each file is copied into a private staging directory first, so
//! the caller reads and writes the copy while the original stays untouched. The staging directory
//! disappears when the iterator is closed or dropped.
//!
//! **Key ideas**:
//! - **Snapshot**: The set of files is fixed at construction and never rescanned.
//! - **One file at a time**: Advancing closes the previous file before opening the next one.
//! - **Cleanup**: `close()`, `ScopedFiles::scope` or `Drop` delete the staging directory.
//! - **Read-only variant**: `Mode::ReadOnlyDirect` opens the originals directly, without copies.
//!
//! ### Example
//!
//! ```no_run
//! use scoped_files::{Options, ScopedFiles, filter};
//!
//! let options = Options::new().predicate(filter::extension("py"));
//! ScopedFiles::scope("/path/to/project", options, |files| {
//!     while let Some(mut file) = files.next_file()? {
//!         let len = file.text()?.len();
//!         println!("{:?} in {:?}: {} bytes", file.name(), file.dir(), len);
//!     }
//!     Ok::<_, scoped_files::Error>(())
//! })
//! .unwrap();
//! ```

mod core;
mod files;
pub mod filter;

pub use self::core::{Error, Result, utils};
pub use self::files::{Current, Mode, Options, Predicate, ScopedFiles, Staging, State};
