use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// Size-rotating log file.
///
/// When writing a record would take the file to `max_bytes` or beyond, the
/// file is renamed to `<path>.1`, existing backups shift up by one, and
/// anything past `backup_count` is removed.
#[derive(Clone)]
pub struct RotatingFileWriter {
    path: PathBuf,
    inner: Arc<Mutex<RotatingFile>>,
}

struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backup_count: usize,
    file: File,
    size: u64,
}

impl RotatingFileWriter {
    pub fn open(
        path: impl Into<PathBuf>,
        max_bytes: u64,
        backup_count: usize,
    ) -> io::Result<Self> {
        let path = path.into();
        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path: path.clone(),
            inner: Arc::new(Mutex::new(RotatingFile {
                path,
                max_bytes,
                backup_count,
                file,
                size,
            })),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the n-th backup, e.g. `microblog.log.3`.
    pub fn backup_path(&self, index: usize) -> PathBuf {
        backup_path(&self.path, index)
    }
}

impl RotatingFile {
    fn write_record(&mut self, buf: &[u8]) -> io::Result<()> {
        if self.should_rollover(buf.len() as u64) {
            self.rollover()?;
        }

        self.file.write_all(buf)?;
        self.size += buf.len() as u64;
        Ok(())
    }

    fn should_rollover(&self, incoming: u64) -> bool {
        self.max_bytes > 0 && self.size > 0 && self.size + incoming >= self.max_bytes
    }

    fn rollover(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.backup_count > 0 {
            for index in (1..self.backup_count).rev() {
                let source = backup_path(&self.path, index);
                if source.exists() {
                    let target = backup_path(&self.path, index + 1);
                    remove_if_exists(&target)?;
                    fs::rename(&source, &target)?;
                }
            }

            let first = backup_path(&self.path, 1);
            remove_if_exists(&first)?;
            fs::rename(&self.path, &first)?;
            self.file = open_append(&self.path)?;
        } else {
            self.file = File::create(&self.path)?;
        }

        self.size = 0;
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

fn backup_path(path: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// Writer handed out per log record.
pub struct RotatingFileGuard<'a> {
    inner: &'a Mutex<RotatingFile>,
}

impl Write for RotatingFileGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut file = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        file.write_record(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let mut file = self
            .inner
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log file lock poisoned"))?;
        file.file.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingFileGuard { inner: &self.inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(len: usize) -> Vec<u8> {
        let mut line = vec![b'x'; len - 1];
        line.push(b'\n');
        line
    }

    #[test]
    fn test_no_rotation_below_limit() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::open(dir.path().join("app.log"), 1024, 3).unwrap();

        let mut guard = writer.make_writer();
        guard.write_all(&record(100)).unwrap();
        guard.write_all(&record(100)).unwrap();

        assert_eq!(fs::metadata(writer.path()).unwrap().len(), 200);
        assert!(!writer.backup_path(1).exists());
    }

    #[test]
    fn test_rotates_when_limit_would_be_reached() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::open(dir.path().join("app.log"), 250, 3).unwrap();

        for _ in 0..3 {
            writer.make_writer().write_all(&record(100)).unwrap();
        }

        // Third record would reach 300 >= 250, so the first two moved to .1
        assert_eq!(fs::metadata(writer.backup_path(1)).unwrap().len(), 200);
        assert_eq!(fs::metadata(writer.path()).unwrap().len(), 100);
    }

    #[test]
    fn test_keeps_at_most_backup_count_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::open(dir.path().join("app.log"), 100, 3).unwrap();

        for _ in 0..10 {
            writer.make_writer().write_all(&record(60)).unwrap();
        }

        for index in 1..=3 {
            assert!(writer.backup_path(index).exists(), "missing backup {index}");
        }
        assert!(!writer.backup_path(4).exists());
    }

    #[test]
    fn test_oldest_backup_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::open(dir.path().join("app.log"), 10, 2).unwrap();

        for marker in ["first\n", "second\n", "third\n", "fourth\n"] {
            writer.make_writer().write_all(marker.as_bytes()).unwrap();
        }

        assert_eq!(fs::read_to_string(writer.path()).unwrap(), "fourth\n");
        assert_eq!(fs::read_to_string(writer.backup_path(1)).unwrap(), "third\n");
        assert_eq!(fs::read_to_string(writer.backup_path(2)).unwrap(), "second\n");
        assert!(!writer.backup_path(3).exists());
    }

    #[test]
    fn test_ten_kib_file_with_ten_backups() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::open(dir.path().join("microblog.log"), 10240, 10).unwrap();

        // 12 records of 1 KiB exceed one file's capacity
        for _ in 0..12 {
            writer.make_writer().write_all(&record(1024)).unwrap();
        }

        assert!(writer.backup_path(1).exists());
        assert!(!writer.backup_path(2).exists());
        assert!(fs::metadata(writer.path()).unwrap().len() < 10240);
    }

    #[test]
    fn test_eleventh_rollover_discards_oldest_backup() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RotatingFileWriter::open(dir.path().join("microblog.log"), 10240, 10).unwrap();

        // Nine 1 KiB records fit per file, so 120 records roll over 13 times
        for n in 0..120 {
            let mut line = format!("{:04}", n).into_bytes();
            line.extend_from_slice(&record(1020));
            writer.make_writer().write_all(&line).unwrap();
        }

        for index in 1..=10 {
            let len = fs::metadata(writer.backup_path(index)).unwrap().len();
            assert_eq!(len, 9 * 1024, "backup {index}");
        }
        assert!(!writer.backup_path(11).exists());

        let newest = fs::read_to_string(writer.backup_path(1)).unwrap();
        let oldest = fs::read_to_string(writer.backup_path(10)).unwrap();
        assert!(newest.starts_with("0108"));
        assert!(oldest.starts_with("0027"));
        assert!(fs::read_to_string(writer.path()).unwrap().starts_with("0117"));
    }

    #[test]
    fn test_reopen_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "existing\n").unwrap();

        let writer = RotatingFileWriter::open(&path, 1024, 1).unwrap();
        writer.make_writer().write_all(b"appended\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "existing\nappended\n");
    }
}
