//! Reading input documents and writing the converted backup.

use crate::error::{ConvertError, ConvertResult};
use flate2::read::GzDecoder;
use std::fmt;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Read a whole file into memory, transparently decompressing gzip.
pub fn read_input(path: &Path) -> ConvertResult<Vec<u8>> {
    let bytes = std::fs::read(path).map_err(|e| ConvertError::io(path, e))?;
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }

    let mut decoded = Vec::new();
    GzDecoder::new(bytes.as_slice())
        .read_to_end(&mut decoded)
        .map_err(|e| ConvertError::io(path, e))?;
    Ok(decoded)
}

/// Where the converted backup goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    /// `-` means standard output.
    pub fn parse(s: &str) -> Self {
        if s == "-" {
            Output::Stdout
        } else {
            Output::File(PathBuf::from(s))
        }
    }

    /// Write `bytes` followed by a newline.
    ///
    /// Files are written to a temporary sibling first and renamed into place,
    /// so the destination either keeps its old content or gets the full output.
    pub fn write(&self, bytes: &[u8]) -> ConvertResult<()> {
        match self {
            Output::Stdout => {
                let mut stdout = std::io::stdout().lock();
                write_line(&mut stdout, bytes).map_err(|e| ConvertError::io("<stdout>", e))
            }
            Output::File(path) => write_atomic(path, bytes),
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::Stdout => write!(f, "-"),
            Output::File(path) => write!(f, "{}", path.display()),
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> ConvertResult<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ConvertError::io(dir, e))?;
    let written = write_line(tmp.as_file_mut(), bytes).and_then(|_| tmp.as_file().sync_all());
    written.map_err(|e| ConvertError::io(tmp.path(), e))?;
    tmp.persist(path)
        .map_err(|e| ConvertError::io(path, e.error))?;
    Ok(())
}

fn write_line(w: &mut impl Write, bytes: &[u8]) -> std::io::Result<()> {
    w.write_all(bytes)?;
    w.write_all(b"\n")?;
    w.flush()
}
