use std::ffi::OsStr;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use crate::core::{Error, Result};

/// The one file that is currently open.
#[derive(Debug)]
pub(crate) struct OpenEntry {
    original: PathBuf,
    staged: Option<PathBuf>, // None when the original itself is open
    file: File,
    text: Option<String>,
}

impl OpenEntry {
    pub(crate) fn new(original: PathBuf, staged: Option<PathBuf>, file: File) -> Self {
        Self {
            original,
            staged,
            file,
            text: None,
        }
    }

    pub(crate) fn original(&self) -> &Path {
        &self.original
    }

    pub(crate) fn staged(&self) -> Option<&Path> {
        self.staged.as_deref()
    }

    /// The path of the file behind the handle.
    fn handle_path(&self) -> &Path {
        self.staged().unwrap_or(&self.original)
    }

    pub(crate) fn dir(&self) -> Option<&Path> {
        self.original.parent()
    }

    pub(crate) fn name(&self) -> Option<&OsStr> {
        self.original.file_name()
    }

    /// Reads the whole handle as UTF-8 on first call and caches it.
    /// The handle's position is left where it was.
    pub(crate) fn text(&mut self) -> Result<&str> {
        let text = match self.text.take() {
            Some(text) => text,
            None => self.read_all().map_err(|e| Error::io(self.handle_path(), e))?,
        };
        Ok(self.text.insert(text).as_str())
    }

    fn read_all(&mut self) -> std::io::Result<String> {
        let position = self.file.stream_position()?;
        self.file.seek(SeekFrom::Start(0))?;
        let mut text = String::new();
        let read = self.file.read_to_string(&mut text);
        self.file.seek(SeekFrom::Start(position))?;
        read.map(|_| text)
    }
}

/// A view of the currently open file, handed out by
/// [`ScopedFiles::next_file`](crate::ScopedFiles::next_file).
///
/// It reads and writes through to the open handle, so `std::io` traits can be
/// used on it directly. In [`Mode::WritableCopy`](crate::Mode::WritableCopy)
/// every write lands in the staged copy, never in the original.
#[derive(Debug)]
pub struct Current<'a> {
    entry: &'a mut OpenEntry,
}

impl<'a> Current<'a> {
    pub(crate) fn new(entry: &'a mut OpenEntry) -> Self {
        Self { entry }
    }

    /// The open handle.
    pub fn file(&mut self) -> &mut File {
        &mut self.entry.file
    }

    /// Path of the original file.
    pub fn path(&self) -> &Path {
        self.entry.original()
    }

    /// Path of the working copy, `None` when the original is opened directly.
    pub fn staged_path(&self) -> Option<&Path> {
        self.entry.staged()
    }

    /// Parent directory of the original file.
    pub fn dir(&self) -> Option<&Path> {
        self.entry.dir()
    }

    /// File name of the original file.
    pub fn name(&self) -> Option<&OsStr> {
        self.entry.name()
    }

    /// Whole content as text, read once and cached until the file is closed.
    pub fn text(&mut self) -> Result<&str> {
        self.entry.text()
    }
}

impl Read for Current<'_> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.entry.file.read(buf)
    }
}

impl Write for Current<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.entry.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.entry.file.flush()
    }
}

impl Seek for Current<'_> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.entry.file.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    fn open_entry(dir: &TempDir, name: &str, content: &[u8]) -> OpenEntry {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .unwrap();
        OpenEntry::new(path, None, file)
    }

    #[test]
    fn test_identity_accessors() {
        let temp_dir = TempDir::new("entry_test").unwrap();
        let mut entry = open_entry(&temp_dir, "a.txt", b"x");
        let current = Current::new(&mut entry);

        assert_eq!(current.name(), Some(OsStr::new("a.txt")));
        assert_eq!(current.dir(), Some(temp_dir.path()));
        assert_eq!(current.path(), temp_dir.path().join("a.txt"));
        assert_eq!(current.staged_path(), None);
    }

    #[test]
    fn test_text_is_cached() {
        let temp_dir = TempDir::new("entry_test").unwrap();
        let mut entry = open_entry(&temp_dir, "a.txt", b"first");

        assert_eq!(entry.text().unwrap(), "first");
        std::fs::write(temp_dir.path().join("a.txt"), b"second").unwrap();
        assert_eq!(entry.text().unwrap(), "first");
    }

    #[test]
    fn test_text_keeps_position() {
        let temp_dir = TempDir::new("entry_test").unwrap();
        let mut entry = open_entry(&temp_dir, "a.txt", b"abcdef");
        let mut current = Current::new(&mut entry);

        let mut head = [0u8; 2];
        current.read_exact(&mut head).unwrap();
        assert_eq!(current.text().unwrap(), "abcdef");

        let mut rest = String::new();
        current.read_to_string(&mut rest).unwrap();
        assert_eq!(rest, "cdef");
    }

    #[test]
    fn test_text_invalid_utf8_is_error() {
        let temp_dir = TempDir::new("entry_test").unwrap();
        let mut entry = open_entry(&temp_dir, "bin.dat", &[0xff, 0xfe, 0x00]);

        let result = entry.text();

        assert!(matches!(result, Err(Error::Io { .. })));
        assert!(entry.text.is_none());
    }

    #[test]
    fn test_write_goes_to_handle() {
        let temp_dir = TempDir::new("entry_test").unwrap();
        let mut entry = open_entry(&temp_dir, "a.txt", b"hello");
        let mut current = Current::new(&mut entry);

        current.write_all(b"HELLO").unwrap();
        current.flush().unwrap();

        assert_eq!(std::fs::read(temp_dir.path().join("a.txt")).unwrap(), b"HELLO");
    }
}
