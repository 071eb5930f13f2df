//! Backup discovery and renumbering
//!
//! Each rotation renames the live file to backup 0 and then shifts every
//! existing backup up by one index on a background thread, deleting the ones
//! that would land past the retention limit. The returned join handle is the
//! completion signal for that pass: joining it yields the first error the
//! pass hit, and the writer must not rename the live file again until the
//! handle has been joined.

use std::fs;
use std::io;
use std::path::Path;
use std::thread::JoinHandle;

use crate::backup_format::{count_digits, BackupFormat};

/// One directory entry that decoded as a backup of the live file.
#[derive(Debug)]
pub(crate) struct BackupFileInfo {
    pub name: String,
    pub number: u64,
}

/// Lists the format's directory and keeps the entries that parse as backups.
///
/// Entries that fail to decode are skipped silently; a directory that cannot
/// be read is an error. Order of the result is unspecified.
pub(crate) fn backup_files(bf: &BackupFormat) -> io::Result<Vec<BackupFileInfo>> {
    let dir = bf.directory();
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if let Some(number) = bf.parse_number(&name) {
            files.push(BackupFileInfo { name, number });
        }
    }
    Ok(files)
}

/// Shifts every backup index up by one, evicting past `max_backups`.
///
/// Backups are processed in descending index order so an increment never
/// collides with a name that has not been moved yet. The zero-padding width
/// for the whole pass comes from the first entry that is actually renamed
/// (the largest surviving index plus one), so every name written by one pass
/// shares a single digit width. The first rename or delete failure aborts
/// the pass.
fn renumber(mut bf: BackupFormat, max_backups: u64) -> io::Result<()> {
    let mut files = backup_files(&bf)?;
    files.sort_by(|a, b| b.number.cmp(&a.number));

    let mut need_width = true;
    for file in files {
        let old_path = bf.path_for(&file.name);
        let new_number = file.number + 1;
        if new_number > max_backups {
            fs::remove_file(&old_path)?;
            continue;
        }
        if need_width {
            bf.set_number_width(count_digits(new_number));
            need_width = false;
        }
        fs::rename(&old_path, bf.backup_name(new_number))?;
    }
    Ok(())
}

/// Renames the live file to backup 0 and spawns the renumbering pass.
///
/// The rename happens synchronously so the caller can reopen a fresh file at
/// the same path immediately; only the shift of the older backups runs in the
/// background. Backup 0 is written unpadded, the pass picks the padding width
/// once it has seen the whole backup set.
pub(crate) fn rename_and_rotate(
    file_name: &str,
    max_backups: u64,
) -> io::Result<JoinHandle<io::Result<()>>> {
    let bf = BackupFormat::new(file_name);
    fs::rename(file_name, bf.backup_name(0))?;
    Ok(std::thread::spawn(move || renumber(bf, max_backups)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str, contents: &str) {
        fs::write(dir.join(name), contents).unwrap();
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn scanner_keeps_only_decodable_entries() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "test_0.log", "");
        touch(dir.path(), "test_3.log", "");
        touch(dir.path(), "test.log", "");
        touch(dir.path(), "test_x.log", "");
        touch(dir.path(), "other.txt", "");

        let bf = BackupFormat::new(dir.path().join("test.log"));
        let mut numbers: Vec<u64> = backup_files(&bf).unwrap().iter().map(|f| f.number).collect();
        numbers.sort();
        assert_eq!(numbers, vec![0, 3]);
    }

    #[test]
    fn scanner_propagates_missing_directory() {
        let dir = tempdir().unwrap();
        let bf = BackupFormat::new(dir.path().join("missing").join("test.log"));
        assert!(backup_files(&bf).is_err());
    }

    #[test]
    fn renumber_shifts_every_backup_up_by_one() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "test_0.log", "newest");
        touch(dir.path(), "test_1.log", "older");
        touch(dir.path(), "test_2.log", "oldest");

        let bf = BackupFormat::new(dir.path().join("test.log"));
        renumber(bf, 10).unwrap();

        assert_eq!(
            names(dir.path()),
            vec!["test_1.log", "test_2.log", "test_3.log"]
        );
        assert_eq!(fs::read_to_string(dir.path().join("test_1.log")).unwrap(), "newest");
        assert_eq!(fs::read_to_string(dir.path().join("test_3.log")).unwrap(), "oldest");
    }

    #[test]
    fn renumber_evicts_past_retention_limit() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "test_0.log", "keep");
        touch(dir.path(), "test_1.log", "drop");

        let bf = BackupFormat::new(dir.path().join("test.log"));
        renumber(bf, 1).unwrap();

        assert_eq!(names(dir.path()), vec!["test_1.log"]);
        assert_eq!(fs::read_to_string(dir.path().join("test_1.log")).unwrap(), "keep");
    }

    #[test]
    fn renumber_with_zero_retention_evicts_everything() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "test_0.log", "");
        touch(dir.path(), "test_1.log", "");

        let bf = BackupFormat::new(dir.path().join("test.log"));
        renumber(bf, 0).unwrap();

        assert!(names(dir.path()).is_empty());
    }

    #[test]
    fn renumber_on_empty_directory_is_a_no_op() {
        let dir = tempdir().unwrap();
        let bf = BackupFormat::new(dir.path().join("test.log"));
        renumber(bf, 5).unwrap();
        assert!(names(dir.path()).is_empty());
    }

    #[test]
    fn pass_width_comes_from_first_renamed_entry() {
        // Ten backups: shifting 9 to 10 crosses into two digits, so the whole
        // pass writes two-digit names.
        let dir = tempdir().unwrap();
        for i in 0..10 {
            touch(dir.path(), &format!("test_{i}.log"), &format!("gen {i}"));
        }

        let bf = BackupFormat::new(dir.path().join("test.log"));
        renumber(bf, 99).unwrap();

        let expected: Vec<String> = (1..=10).map(|i| format!("test_{i:02}.log")).collect();
        assert_eq!(names(dir.path()), expected);
        assert_eq!(fs::read_to_string(dir.path().join("test_10.log")).unwrap(), "gen 9");
        assert_eq!(fs::read_to_string(dir.path().join("test_01.log")).unwrap(), "gen 0");
    }

    #[test]
    fn evictions_do_not_set_the_pass_width() {
        // The largest entry is evicted before any rename, so the width comes
        // from shifting 5 to 6: one digit, unpadded.
        let dir = tempdir().unwrap();
        touch(dir.path(), "test_5.log", "survives");
        touch(dir.path(), "test_6.log", "evicted");

        let bf = BackupFormat::new(dir.path().join("test.log"));
        renumber(bf, 6).unwrap();

        assert_eq!(names(dir.path()), vec!["test_6.log"]);
        assert_eq!(fs::read_to_string(dir.path().join("test_6.log")).unwrap(), "survives");
    }

    #[test]
    fn rename_and_rotate_moves_live_file_and_shifts_backups() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "test.log", "live");
        touch(dir.path(), "test_1.log", "previous");

        let path = dir.path().join("test.log");
        let handle = rename_and_rotate(path.to_str().unwrap(), 5).unwrap();
        // The live file is renamed before the pass is spawned.
        assert!(!path.exists());
        handle.join().unwrap().unwrap();

        assert_eq!(names(dir.path()), vec!["test_1.log", "test_2.log"]);
        assert_eq!(fs::read_to_string(dir.path().join("test_1.log")).unwrap(), "live");
        assert_eq!(fs::read_to_string(dir.path().join("test_2.log")).unwrap(), "previous");
    }

    #[test]
    fn rename_and_rotate_fails_without_a_live_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.log");
        let err = rename_and_rotate(path.to_str().unwrap(), 5).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
