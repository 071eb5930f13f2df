//! Rotating file writer with size-based rotation and numbered backups
//!
//! This module provides the writer at the heart of the crate: an append sink
//! that tracks how many bytes the live file holds and swaps in a fresh file
//! whenever a write would push it past the configured maximum size. The old
//! content is renamed to backup index 0 and a background pass shifts every
//! older backup up by one, deleting the ones past the retention limit.
//!
//! ## Behavior
//!
//! - A single write larger than the maximum size is rejected outright; writes
//!   are never split across files.
//! - Rotation renames `app.log` to `app_0.log`, then the background pass
//!   turns `app_0.log`, `app_1.log`, ... into `app_1.log`, `app_2.log`, ...
//! - Writes to the fresh file are not blocked by the renumbering of old
//!   backups; only the next rotation (or close) waits for the pass to finish.
//! - Errors from the background pass surface from whichever `rotate` or
//!   `close` call waits on it.
//!
//! ## Concurrency
//!
//! [`RotatingWriter`] is a cheaply cloneable handle; every clone shares one
//! writer state behind a single mutex, so `write`, `rotate` and `close` are
//! safe to call from any number of threads and are serialized internally. At
//! most one renumbering pass is in flight at a time: a rotation joins the
//! previous pass before it renames the live file.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rotolog::RotatingWriter;
//!
//! let writer = RotatingWriter::builder()
//!     .with_path("logs/app.log")
//!     .with_max_size(10 * rotolog::MEGABYTE)
//!     .with_max_backups(5)
//!     .build()
//!     .expect("writer config");
//!
//! writer.write(b"hello\n").unwrap();
//! writer.close().unwrap();
//! ```
//!
//! The handle also implements `tracing_subscriber`'s `MakeWriter`, so it can
//! back an `fmt` layer directly:
//!
//! ```rust,no_run
//! # use rotolog::RotatingWriter;
//! use tracing_subscriber::layer::SubscriberExt;
//! use tracing_subscriber::util::SubscriberInitExt;
//!
//! let writer = RotatingWriter::builder().with_path("logs/app.log").build().unwrap();
//! tracing_subscriber::registry()
//!     .with(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(writer.clone()))
//!     .init();
//! let _guard = writer.into_guard();
//! ```

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use tracing_subscriber::fmt::MakeWriter;

use crate::config::Config;
use crate::rotation;

/// Builder for configuring a [`RotatingWriter`]
pub struct RotatingWriterBuilder {
    config: Config,
}

impl RotatingWriterBuilder {
    pub fn with_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config.path = path.as_ref().to_string_lossy().to_string();
        self
    }

    pub fn with_max_size(mut self, bytes: u64) -> Self {
        self.config.max_size = bytes;
        self
    }

    pub fn with_max_backups(mut self, max: u64) -> Self {
        self.config.max_backups = max;
        self
    }

    pub fn build(self) -> io::Result<RotatingWriter> {
        RotatingWriter::new(self.config)
    }
}

/// Shared handle to a size-bounded rotating log file writer.
///
/// Clones share the same underlying file and byte counter. The writer opens
/// the file lazily on the first write; constructing it touches nothing on
/// disk.
#[derive(Clone, Debug)]
pub struct RotatingWriter {
    inner: Arc<Mutex<WriterState>>,
}

impl RotatingWriter {
    /// Start building a writer from the default configuration.
    pub fn builder() -> RotatingWriterBuilder {
        RotatingWriterBuilder {
            config: Config::default(),
        }
    }

    pub fn new(config: Config) -> io::Result<Self> {
        if config.max_size == 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "max-size must be positive",
            ));
        }
        Ok(Self {
            inner: Arc::new(Mutex::new(WriterState {
                config,
                file: None,
                size: 0,
                rotate_done: None,
            })),
        })
    }

    /// Appends `buf` to the live file, rotating first when it would not fit.
    ///
    /// Returns the number of bytes written. A request larger than the
    /// configured maximum size fails without touching any file.
    pub fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().write(buf)
    }

    /// Forces a rotation of the live file.
    ///
    /// Waits for any previous renumbering pass to finish first; an error from
    /// that pass is returned here. On failure the writer is left closed and
    /// the next write re-opens the file.
    pub fn rotate(&self) -> io::Result<()> {
        self.inner.lock().unwrap().rotate()
    }

    /// Closes the live file and waits out any in-flight renumbering pass.
    pub fn close(&self) -> io::Result<()> {
        self.inner.lock().unwrap().close()
    }

    pub fn flush(&self) -> io::Result<()> {
        self.inner.lock().unwrap().flush()
    }

    /// Convert this handle into an RAII guard that closes the writer on drop.
    pub fn into_guard(self) -> RotatingFileGuard {
        RotatingFileGuard { writer: self }
    }
}

impl Write for RotatingWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        RotatingWriter::write(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        RotatingWriter::flush(self)
    }
}

/// Guard that closes the writer when dropped
///
/// Dropping it waits for any pending renumbering pass, so backups are never
/// left half-shifted at process exit. Errors at this point are discarded;
/// call [`RotatingWriter::close`] explicitly to observe them.
pub struct RotatingFileGuard {
    writer: RotatingWriter,
}

impl Drop for RotatingFileGuard {
    fn drop(&mut self) {
        let _ = self.writer.close();
    }
}

impl<'a> MakeWriter<'a> for RotatingWriter {
    type Writer = RotatingWriterGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingWriterGuard {
            inner: self.inner.clone(),
            _phantom: std::marker::PhantomData,
        }
    }
}

/// Per-event writer handed out to the tracing subscriber
pub struct RotatingWriterGuard<'a> {
    inner: Arc<Mutex<WriterState>>,
    _phantom: std::marker::PhantomData<&'a ()>,
}

impl Write for RotatingWriterGuard<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.lock().unwrap().flush()
    }
}

/// The writer state proper, only ever touched under the handle's mutex.
#[derive(Debug)]
struct WriterState {
    config: Config,
    file: Option<File>,
    size: u64,
    rotate_done: Option<JoinHandle<io::Result<()>>>,
}

impl WriterState {
    fn open_file(&mut self) -> io::Result<()> {
        if let Some(parent) = Path::new(&self.config.path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.config.path)?;
        // A pre-existing file counts toward the size limit from the start.
        let size = file.metadata()?.len();
        self.file = Some(file);
        self.size = size;
        Ok(())
    }

    fn close_file(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }
        Ok(())
    }

    /// Joins the pending renumbering pass, surfacing its first error.
    fn wait_rotate_done(&mut self) -> io::Result<()> {
        if let Some(handle) = self.rotate_done.take() {
            return match handle.join() {
                Ok(result) => result,
                Err(_) => Err(io::Error::new(io::ErrorKind::Other, "backup renumbering task panicked")),
            };
        }
        Ok(())
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let data_len = buf.len() as u64;
        if data_len > self.config.max_size {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "write larger than the configured maximum file size",
            ));
        }
        if self.size + data_len > self.config.max_size {
            self.rotate()?;
        }
        if self.file.is_none() {
            self.open_file()?;
        }
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file is not open"))?;
        let n = file.write(buf)?;
        self.size += n as u64;
        Ok(n)
    }

    // No tracing events in here or anywhere reached under the lock: the
    // writer may itself be the subscriber's sink, and an event dispatched
    // while the lock is held re-enters it on the same thread.
    fn rotate(&mut self) -> io::Result<()> {
        self.close_file()?;
        // The live file must not be renamed while the previous pass may still
        // be renaming backups into its target names.
        self.wait_rotate_done()?;
        self.rotate_done = Some(rotation::rename_and_rotate(
            &self.config.path,
            self.config.max_backups,
        )?);
        self.open_file()?;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        let closed = self.close_file();
        let waited = self.wait_rotate_done();
        closed.and(waited)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for WriterState {
    fn drop(&mut self) {
        if let Some(handle) = self.rotate_done.take() {
            let _ = handle.join();
        }
    }
}
