use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::io::{Read, Seek, SeekFrom, Write};
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};

use scoped_files::{Error, Mode, Options, ScopedFiles, Staging, State, filter};
use tempdir::TempDir;

fn setup_tree() -> TempDir {
    let temp_dir = TempDir::new("scoped_files_it").unwrap();
    for (name, content) in [
        ("a.txt", "hello"),
        ("notes/b.txt", "second"),
        ("notes/old/c.txt", "third"),
        ("notes/skip.log", "log"),
    ] {
        let path = temp_dir.path().join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }
    temp_dir
}

fn txt_options() -> Options {
    Options::new().predicate(filter::extension("txt"))
}

#[test]
fn test_full_pass_over_copies() {
    let tree = setup_tree();
    let mut files = ScopedFiles::with_options(tree.path(), txt_options()).unwrap();
    let staging = files.staging_dir().unwrap().to_path_buf();

    let mut originals = BTreeSet::new();
    while let Some(mut file) = files.next_file().unwrap() {
        let staged = file.staged_path().unwrap().to_path_buf();
        assert!(staged.starts_with(&staging));
        let original = std::fs::read_to_string(file.path()).unwrap();
        assert_eq!(file.text().unwrap(), original);

        file.seek(SeekFrom::Start(0)).unwrap();
        file.write_all(b"overwritten").unwrap();
        assert!(originals.insert(file.path().to_path_buf()));
    }

    let expected: BTreeSet<PathBuf> = ["a.txt", "notes/b.txt", "notes/old/c.txt"]
        .iter()
        .map(|name| tree.path().join(name))
        .collect();
    assert_eq!(originals, expected);

    // originals untouched
    assert_eq!(read(tree.path(), "a.txt"), "hello");
    assert_eq!(read(tree.path(), "notes/b.txt"), "second");
    assert_eq!(read(tree.path(), "notes/old/c.txt"), "third");

    files.close();
    assert!(!staging.exists());
    assert_eq!(files.state(), State::Closed);
}

#[test]
fn test_original_untouched_after_edit() {
    let tree = setup_tree();
    let options = Options::new()
        .predicate(|path: &Path| path.file_name() == Some(OsStr::new("a.txt")));
    let mut files = ScopedFiles::with_options(tree.path(), options).unwrap();

    {
        let mut file = files.next_file().unwrap().unwrap();
        file.write_all(b"HELLO").unwrap();
    }
    files.close_current();

    assert_eq!(read(tree.path(), "a.txt"), "hello");
    assert!(files.next_file().unwrap().is_none());
}

#[test]
fn test_txt_only_example() {
    let temp_dir = TempDir::new("scoped_files_it").unwrap();
    std::fs::write(temp_dir.path().join("x.txt"), "1").unwrap();
    std::fs::write(temp_dir.path().join("y.log"), "2").unwrap();

    let mut files = ScopedFiles::with_options(temp_dir.path(), txt_options()).unwrap();

    let mut names = Vec::new();
    while files.next_file().unwrap().is_some() {
        names.push(files.current_name().unwrap().to_string_lossy().into_owned());
    }
    assert_eq!(names, ["x.txt"]);
}

#[test]
fn test_second_pass_is_empty_even_with_new_files() {
    let tree = setup_tree();
    let mut files = ScopedFiles::with_options(tree.path(), txt_options()).unwrap();

    let mut first = 0;
    while files.next_file().unwrap().is_some() {
        first += 1;
    }
    std::fs::write(tree.path().join("late.txt"), "late").unwrap();

    let mut second = 0;
    while files.next_file().unwrap().is_some() {
        second += 1;
    }

    assert_eq!(first, 3);
    assert_eq!(second, 0);
}

#[test]
fn test_missing_base_dir() {
    let temp_dir = TempDir::new("scoped_files_it").unwrap();
    let missing = temp_dir.path().join("nope");

    match ScopedFiles::new(&missing) {
        Err(Error::NotFound { path }) => assert_eq!(path, missing),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("construction over a missing directory must fail"),
    }
}

#[test]
fn test_staging_inside_base_is_invalid() {
    let tree = setup_tree();
    let options = Options::new().staging(Staging::Fixed(tree.path().join("work")));

    let result = ScopedFiles::with_options(tree.path(), options);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    assert!(!tree.path().join("work").exists());
}

#[test]
fn test_staging_containing_base_is_invalid() {
    let outer = TempDir::new("scoped_files_it_outer").unwrap();
    let base = outer.path().join("project");
    std::fs::create_dir(&base).unwrap();
    std::fs::write(base.join("a.txt"), "hello").unwrap();
    let options = Options::new().staging(Staging::Fixed(outer.path().to_path_buf()));

    let result = ScopedFiles::with_options(&base, options);

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    drop(result);
    assert_eq!(read(&base, "a.txt"), "hello");
}

#[test]
fn test_read_only_direct_pass() {
    let tree = setup_tree();
    let options = txt_options().mode(Mode::ReadOnlyDirect).sorted(true);
    let mut files = ScopedFiles::with_options(tree.path(), options).unwrap();
    assert_eq!(files.staging_dir(), None);

    let mut texts = Vec::new();
    while let Some(mut file) = files.next_file().unwrap() {
        let mut text = String::new();
        file.read_to_string(&mut text).unwrap();
        texts.push(text);
    }

    assert_eq!(texts, ["hello", "second", "third"]);
}

#[test]
fn test_scope_cleans_up_on_panic() {
    let tree = setup_tree();
    let staging = TempDir::new("scoped_files_it_staging").unwrap();
    let work = staging.path().join("work");
    let options = txt_options().staging(Staging::Fixed(work.clone()));

    let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
        let _ = ScopedFiles::scope(tree.path(), options, |files| {
            files.next_file()?;
            if files.state() == State::Open {
                panic!("caller failed mid-iteration");
            }
            Ok::<_, Error>(())
        });
    }));

    assert!(outcome.is_err());
    assert!(!work.exists());
    assert_eq!(read(tree.path(), "a.txt"), "hello");
}

fn read(base: &Path, name: &str) -> String {
    std::fs::read_to_string(base.join(name)).unwrap()
}
