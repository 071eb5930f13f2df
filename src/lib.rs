//! Size-bounded rotating log file writer with numbered backups
//!
//! `rotolog` appends bytes to a file and, whenever a write would push the
//! file past a configured maximum size, swaps in a fresh file while moving
//! the old content into a numbered backup sequence: `app.log` becomes
//! `app_0.log`, previous backups shift to `app_1.log`, `app_2.log`, and so
//! on, and backups past the retention limit are deleted. The shift of older
//! backups runs on a background thread so writes to the fresh file are not
//! held up by it.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use rotolog::{RotatingWriter, MEGABYTE};
//!
//! let writer = RotatingWriter::builder()
//!     .with_path("logs/app.log")
//!     .with_max_size(10 * MEGABYTE)
//!     .with_max_backups(5)
//!     .build()
//!     .expect("writer config");
//!
//! writer.write(b"one line of output\n").unwrap();
//! writer.close().unwrap();
//! ```
//!
//! The writer handle implements `std::io::Write` and
//! `tracing_subscriber::fmt::MakeWriter`, so it plugs into anything that
//! writes lines to an `io::Write` sink as well as directly into a tracing
//! subscriber.

mod backup_format;
pub mod config;
pub mod rotating_writer;
mod rotation;

// Re-export the main types for easy access
pub use config::{Config, GIGABYTE, KILOBYTE, MEGABYTE};
pub use rotating_writer::{
    RotatingFileGuard, RotatingWriter, RotatingWriterBuilder, RotatingWriterGuard,
};
