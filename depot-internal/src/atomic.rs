use anyhow::{Context, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// Writes `contents` to `path` atomically: the new content is written to a temporary file in
/// `path`'s parent directory, then renamed into place. A reader can never observe a partially
/// written file.
///
/// Grounded in `package_options::Backup`'s same-directory-tempfile-then-rename pattern, applied
/// here to normal writes rather than backup/restore.
pub fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("`{}` has no parent directory", path.display()))?;
    std::fs::create_dir_all(parent)
        .with_context(|| format!("could not create `{}`", parent.display()))?;
    let mut tempfile = NamedTempFile::new_in(parent)
        .with_context(|| format!("could not create temp file in `{}`", parent.display()))?;
    use std::io::Write;
    tempfile
        .write_all(contents.as_bytes())
        .with_context(|| "could not write temp file contents")?;
    tempfile
        .persist(path)
        .map(|_| ())
        .map_err(|err| err.error)
        .with_context(|| format!("could not persist temp file to `{}`", path.display()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("file.toml");
        atomic_write(&path, "hello = 1\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello = 1\n");
    }

    #[test]
    fn second_write_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("file.toml");
        atomic_write(&path, "a = 1\n").unwrap();
        atomic_write(&path, "b = 2\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b = 2\n");
    }
}
