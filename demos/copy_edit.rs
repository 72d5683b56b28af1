use std::io::{Seek, SeekFrom, Write};

use scoped_files::{Options, ScopedFiles, filter};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let tmp = std::env::temp_dir();
    let base = tmp.join("scoped_files_demo");
    println!("Base dir: {}", base.display());

    std::fs::create_dir_all(base.join("docs"))?;
    std::fs::write(base.join("docs/first.txt"), "Hello")?;
    std::fs::write(base.join("second.txt"), "World")?;
    std::fs::write(base.join("ignored.log"), "not a text file")?;

    let options = Options::new()
        .predicate(filter::extension("txt"))
        .sorted(true);

    // every copy is upper-cased; the originals keep their content
    ScopedFiles::scope(&base, options, |files| {
        println!("first pass");
        while let Some(mut file) = files.next_file()? {
            let upper = file.text()?.to_uppercase();
            file.seek(SeekFrom::Start(0))?;
            file.write_all(upper.as_bytes())?;
            println!(
                "directory: {}, file: {}, copy: {}",
                file.dir().map(|d| d.display().to_string()).unwrap_or_default(),
                file.name().map(|n| n.to_string_lossy()).unwrap_or_default(),
                upper
            );
        }

        // the snapshot is spent, nothing is yielded
        println!("second pass");
        while let Some(file) = files.next_file()? {
            println!("unexpected: {}", file.path().display());
        }
        Ok::<_, anyhow::Error>(())
    })?;

    println!(
        "{}, {}!",
        std::fs::read_to_string(base.join("docs/first.txt"))?,
        std::fs::read_to_string(base.join("second.txt"))?
    );

    std::fs::remove_dir_all(&base)?;
    Ok(())
}
