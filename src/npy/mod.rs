//! `.npy` file codec.
//!
//! [`NpyFile`] binds one file and one [`Mode`] for its whole open lifetime:
//!
//! ```text
//! open(path, Read)  --load()*-->  close()
//! open(path, Write) --save()*-->  close()
//! ```
//!
//! Calling `load` on a write-mode file or `save` on a read-mode file is a [`NpyError::Mode`];
//! any call after [`NpyFile::close`] is a [`NpyError::Closed`]. `close` flushes pending writes
//! and may be called more than once; dropping an open file closes it without reporting flush
//! errors.
//!
//! The stream-level functions [`read_npy`] and [`write_npy`] work on any `Read`/`Write` and are
//! what the file codec is built on.
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::array::{ArrayD, Dimension, Element, StridedArray, WritableElement};

pub mod error;
pub mod header;
pub mod parser;
pub mod reader;
pub mod writer;

pub use error::{FormatError, NpyError};
pub use header::{ByteOrder, Descr, Header, Version};
pub use parser::HeaderParseError;
pub use reader::{read_header, read_npy};
pub use writer::write_npy;

/// Access mode a [`NpyFile`] is opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Read,
    Write,
}

enum Handle {
    Read(BufReader<File>),
    Write(BufWriter<File>),
    Closed,
}

/// A `.npy` file opened for reading or writing.
pub struct NpyFile {
    path: PathBuf,
    mode: Mode,
    handle: Handle,
}

impl NpyFile {
    /// Open `path` in `mode`. Write mode creates the file or truncates an existing one.
    pub fn open<P: AsRef<Path>>(path: P, mode: Mode) -> Result<Self, NpyError> {
        let path = path.as_ref().to_path_buf();
        let handle = match mode {
            Mode::Read => Handle::Read(BufReader::new(File::open(&path)?)),
            Mode::Write => Handle::Write(BufWriter::new(File::create(&path)?)),
        };
        tracing::debug!(path = %path.display(), ?mode, "opened npy file");
        Ok(Self { path, mode, handle })
    }

    pub fn open_read<P: AsRef<Path>>(path: P) -> Result<Self, NpyError> {
        Self::open(path, Mode::Read)
    }

    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, NpyError> {
        Self::open(path, Mode::Write)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.handle, Handle::Closed)
    }

    /// Read the array stored in the file.
    ///
    /// The stored element kind and width must match `T`. Data in the other byte order is
    /// converted. A file written in Fortran order is returned with its shape reversed and its
    /// payload untouched, i.e. as the transpose of the stored array.
    pub fn load<T: Element>(&mut self) -> Result<ArrayD<T>, NpyError> {
        let reader = match &mut self.handle {
            Handle::Read(reader) => reader,
            Handle::Write(_) => {
                return Err(NpyError::Mode {
                    mode: self.mode,
                    operation: "load",
                });
            }
            Handle::Closed => return Err(NpyError::Closed { operation: "load" }),
        };
        let array = read_npy::<T, _>(reader)?;
        tracing::debug!(path = %self.path.display(), shape = ?array.shape(), "loaded array");
        Ok(array)
    }

    /// Read the stored array into a rank-checked container.
    pub fn load_as<T: Element, D: Dimension>(&mut self) -> Result<StridedArray<T, D>, NpyError> {
        Ok(self.load::<T>()?.into_dimensionality()?)
    }

    /// Write `array` and flush it to the file. Returns the format version written.
    pub fn save<T: WritableElement, D: Dimension>(
        &mut self,
        array: &StridedArray<T, D>,
        version: Option<Version>,
    ) -> Result<Version, NpyError> {
        let writer = match &mut self.handle {
            Handle::Write(writer) => writer,
            Handle::Read(_) => {
                return Err(NpyError::Mode {
                    mode: self.mode,
                    operation: "save",
                });
            }
            Handle::Closed => return Err(NpyError::Closed { operation: "save" }),
        };
        let version = write_npy(writer, array, version)?;
        writer.flush()?;
        tracing::debug!(path = %self.path.display(), %version, "saved array");
        Ok(version)
    }

    /// Flush and release the file handle. Closing an already closed file does nothing.
    pub fn close(&mut self) -> Result<(), NpyError> {
        match std::mem::replace(&mut self.handle, Handle::Closed) {
            Handle::Write(mut writer) => {
                writer.flush()?;
                tracing::debug!(path = %self.path.display(), "closed npy file");
            }
            Handle::Read(_) => {
                tracing::debug!(path = %self.path.display(), "closed npy file");
            }
            Handle::Closed => {}
        }
        Ok(())
    }
}

/// Load the array stored at `path`.
pub fn load_npy<T: Element, P: AsRef<Path>>(path: P) -> Result<ArrayD<T>, NpyError> {
    let mut file = NpyFile::open_read(path)?;
    let array = file.load()?;
    file.close()?;
    Ok(array)
}

/// Save `array` to `path` with automatic version selection.
pub fn save_npy<T: WritableElement, D: Dimension, P: AsRef<Path>>(
    path: P,
    array: &StridedArray<T, D>,
) -> Result<Version, NpyError> {
    let mut file = NpyFile::create(path)?;
    let version = file.save(array, None)?;
    file.close()?;
    Ok(version)
}
