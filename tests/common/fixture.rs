use std::{io, env, fs, path::{Path, PathBuf}, ops::Deref, fmt::{self, Formatter, Display}};
use tempfile::{self, TempDir};

pub const TEST_DATA_DIR: &str = "./tests/test-data";

/// A path living within its own temporary directory. The directory is removed once the fixture is dropped.
pub struct Fixture {
    path: PathBuf,
    source: PathBuf,
    _tempdir: TempDir,
}

impl Fixture {
    /// Reserve a path named `name` within a fresh temporary directory, without creating it.
    pub fn blank(name: &str) -> Self {
        let root_dir = &env::var("CARGO_MANIFEST_DIR").expect("$CARGO_MANIFEST_DIR");
        let source = PathBuf::from(root_dir).join(TEST_DATA_DIR).join(name);

        let tempdir = tempfile::tempdir().expect("Failed to generate temp directory");
        let path = match Path::new(name).file_name() {
            Some(filename) => tempdir.path().join(filename),
            None           => tempdir.path().join(name),
        };
        Fixture { _tempdir: tempdir, source, path }
    }

    /// Copy `tests/test-data/<name>` (file or directory) within a fresh temporary directory.
    pub fn copy(name: &str) -> Self {
        let fixture = Fixture::blank(name);
        if fixture.source.is_dir() {
            copy_dir_all(&fixture.source, &fixture.path).expect("Failed to copy directory");
        } else {
            fs::copy(&fixture.source, &fixture.path).expect("Failed to copy fixture file");
        }
        fixture
    }
}

fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        match entry.file_type()?.is_dir() {
            true  => copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?,
            false => {fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;},
        }
    }
    Ok(())
}

impl Deref for Fixture {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path.deref()
    }
}

impl Display for Fixture {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
