// src/file.rs

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Read, Seek, SeekFrom, Write},
    path::Path,
};

use tempfile::NamedTempFile;

/// Create `dir` (and parents) unless it already exists as a directory.
pub fn ensure_directory(dir: &Path) -> io::Result<()> {
    if dir.exists() && !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("path exists but is not a directory: {}", dir.display()),
        ));
    }
    if !dir.exists() { fs::create_dir_all(dir)?; }
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."))
}

/// Open for reading; a missing file is `None`, not an error.
pub fn open_existing(path: &Path) -> io::Result<Option<File>> {
    match File::open(path) {
        Ok(f) => Ok(Some(f)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Replace `path` with whatever `fill` writes, all or nothing.
/// The content goes to a temp file next to `path`, is synced, then renamed
/// over the target; a crash leaves either the old file or the new one.
pub fn write_atomic<E, F>(path: &Path, fill: F) -> Result<(), E>
where
    E: From<io::Error>,
    F: FnOnce(&mut dyn Write) -> Result<(), E>,
{
    let dir = parent_dir(path);
    ensure_directory(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        fill(&mut out)?;
        out.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Append whatever `fill` writes to the end of an existing file.
/// Bytes already in the file are never touched. A final line left without
/// its newline (hand edits) is terminated first so rows never run together.
pub fn append_with<E, F>(path: &Path, fill: F) -> Result<(), E>
where
    E: From<io::Error>,
    F: FnOnce(&mut dyn Write) -> Result<(), E>,
{
    let mut file = OpenOptions::new().read(true).append(true).open(path)?;
    let needs_newline = ends_without_newline(&mut file)?;
    {
        let mut out = BufWriter::new(&mut file);
        if needs_newline { out.write_all(b"\n")?; }
        fill(&mut out)?;
        out.flush()?;
    }
    file.sync_all()?;
    Ok(())
}

fn ends_without_newline(file: &mut File) -> io::Result<bool> {
    let len = file.seek(SeekFrom::End(0))?;
    if len == 0 { return Ok(false); }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_write_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.txt");
        write_atomic::<io::Error, _>(&path, |w| w.write_all(b"one\n")).unwrap();
        write_atomic::<io::Error, _>(&path, |w| w.write_all(b"two\n")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "two\n");
    }

    #[test]
    fn failed_fill_keeps_old_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old\n").unwrap();

        let res = write_atomic::<io::Error, _>(&path, |w| {
            w.write_all(b"half")?;
            Err(io::Error::other("disk full"))
        });
        assert!(res.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old\n");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn append_terminates_dangling_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "a\nb").unwrap();
        append_with::<io::Error, _>(&path, |w| w.write_all(b"c\n")).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "a\nb\nc\n");
    }

    #[test]
    fn append_to_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(append_with::<io::Error, _>(&dir.path().join("nope"), |_| Ok(())).is_err());
    }

    #[test]
    fn missing_file_opens_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(open_existing(&dir.path().join("nope")).unwrap().is_none());
    }

    #[test]
    fn file_in_place_of_directory_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taken");
        fs::write(&path, "").unwrap();
        assert!(ensure_directory(&path).is_err());
    }
}
