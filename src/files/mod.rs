mod entry;
mod options;
mod scoped_files;
mod staging;

pub use entry::Current;
pub use options::{Mode, Options, Predicate, Staging};
pub use scoped_files::{ScopedFiles, State};
