//! Backup file name encoding and decoding
//!
//! Backup files live next to the live log file and carry a generation number
//! between the base name and the extension: `program.log` with index 7 becomes
//! `program_7.log`. Within one renumbering pass the index may be zero-padded
//! to a fixed width (e.g. `master_0027.log`) so that a batch of backups sorts
//! lexicographically; decoding accepts any digit run regardless of the
//! currently configured width, so every encoded name parses back to its index.

use std::path::{Path, PathBuf};

/// Formats and parses backup file names for one base log file.
///
/// Built once from the configured log path by splitting it into directory,
/// name-without-extension and extension (including the leading dot, or empty
/// when the name has none).
#[derive(Debug, Clone)]
pub(crate) struct BackupFormat {
    dir: PathBuf,
    prefix: String,
    ext: String,
    number_width: Option<usize>,
}

impl BackupFormat {
    pub fn new<P: AsRef<Path>>(file_name: P) -> Self {
        let path = file_name.as_ref();
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        // The extension starts at the last dot, dotfile-style names included.
        let (prefix, ext) = match name.rfind('.') {
            Some(i) => (name[..i].to_string(), name[i..].to_string()),
            None => (name, String::new()),
        };
        Self {
            dir,
            prefix,
            ext,
            number_width: None,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.dir
    }

    /// Joins a bare file name onto this format's directory.
    pub fn path_for(&self, file_name: &str) -> PathBuf {
        if self.dir.as_os_str().is_empty() {
            PathBuf::from(file_name)
        } else {
            self.dir.join(file_name)
        }
    }

    /// Sets the zero-padding width for subsequently encoded indices.
    ///
    /// Widths outside 2..=9 mean plain decimal formatting, not an error.
    pub fn set_number_width(&mut self, n: usize) {
        self.number_width = if (2..=9).contains(&n) { Some(n) } else { None };
    }

    /// Builds the backup path for the given index.
    pub fn backup_name(&self, number: u64) -> PathBuf {
        let formatted = match self.number_width {
            Some(width) => format!("{:0width$}", number),
            None => number.to_string(),
        };
        self.path_for(&format!("{}_{}{}", self.prefix, formatted, self.ext))
    }

    /// Decodes a bare file name back to its backup index.
    ///
    /// Returns `None` unless the name is exactly prefix, `_`, one or more
    /// decimal digits, extension. Padding plays no role here: any digit run
    /// is accepted, so this is the inverse of [`backup_name`](Self::backup_name)
    /// for every index it can produce.
    pub fn parse_number(&self, file_name: &str) -> Option<u64> {
        let rest = file_name.strip_prefix(self.prefix.as_str())?;
        let middle = rest.strip_suffix(self.ext.as_str())?;
        let digits = middle.strip_prefix('_')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

/// Number of decimal digits in `x` (1 for 0..=9, 2 for 10..=99, and so on).
pub(crate) fn count_digits(x: u64) -> usize {
    let mut count = 1;
    let mut bound = 10;
    while bound <= x {
        count += 1;
        bound = match bound.checked_mul(10) {
            Some(next) => next,
            None => break,
        };
    }
    count
}
