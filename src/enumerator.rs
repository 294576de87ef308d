//! Directory traversal with the fixed ignore policy.
//!
//! Two passes per run share this module: a pre-count pass that only tallies,
//! and the processing pass that yields descriptors. Both apply the identical
//! policy, which is what keeps progress percentages honest.

use crate::error::Result;
use crate::types::FileDescriptor;
use std::path::Path;
use walkdir::WalkDir;

/// Base names never uploaded (OS-generated marker files).
pub const IGNORED_FILE_NAMES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Office lock/temp files start with this prefix.
pub const TEMP_FILE_PREFIX: &str = "~$";

/// Whether the ignore policy excludes a file with this base name.
pub fn is_ignored(file_name: &str) -> bool {
    IGNORED_FILE_NAMES.contains(&file_name) || file_name.starts_with(TEMP_FILE_PREFIX)
}

/// Walk `root` and yield one [`FileDescriptor`] per candidate file, in
/// traversal order. Directories are never yielded. When `recursive` is
/// false only the root's immediate files appear.
///
/// The sequence is finite and single-pass; call it twice for the pre-count
/// and the processing pass. A directory-read error surfaces as an `Err`
/// item, which the caller treats as fatal.
pub fn enumerate(
    root: &Path,
    recursive: bool,
) -> impl Iterator<Item = Result<FileDescriptor>> + '_ {
    let max_depth = if recursive { usize::MAX } else { 1 };

    WalkDir::new(root)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let name = entry.file_name().to_string_lossy();
            if is_ignored(&name) {
                return None;
            }
            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => return Some(Err(e.into())),
            };
            let path = entry.into_path();
            let relative = path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| path.clone());
            Some(Ok(FileDescriptor {
                path,
                relative,
                size,
            }))
        })
}

/// Count the files a processing pass over the same arguments would yield.
pub fn count(root: &Path, recursive: bool) -> Result<u64> {
    let mut total = 0;
    for entry in enumerate(root, recursive) {
        entry?;
        total += 1;
    }
    Ok(total)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Build a tree with files at the root, in a subdirectory, and a few
    /// that the ignore policy must drop.
    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "alpha").unwrap();
        fs::write(dir.path().join("b.pdf"), "bravo").unwrap();
        fs::write(dir.path().join("Thumbs.db"), "junk").unwrap();
        fs::write(dir.path().join(".DS_Store"), "junk").unwrap();
        fs::write(dir.path().join("~$scratch.xlsx"), "lock").unwrap();

        let sub = dir.path().join("sub");
        fs::create_dir(&sub).unwrap();
        fs::write(sub.join("c.txt"), "charlie").unwrap();
        fs::write(sub.join("~$deep.docx"), "lock").unwrap();
        dir
    }

    fn names(root: &Path, recursive: bool) -> Vec<String> {
        enumerate(root, recursive)
            .map(|r| r.unwrap().file_name())
            .collect()
    }

    #[test]
    fn ignore_policy_drops_marker_and_temp_files() {
        let dir = sample_tree();
        let found = names(dir.path(), true);

        assert!(!found.iter().any(|n| n == "Thumbs.db"));
        assert!(!found.iter().any(|n| n == ".DS_Store"));
        assert!(!found.iter().any(|n| n.starts_with("~$")));
        assert_eq!(found.len(), 3);
    }

    #[test]
    fn non_recursive_yields_root_files_only() {
        let dir = sample_tree();
        let mut found = names(dir.path(), false);
        found.sort();
        assert_eq!(found, vec!["a.txt", "b.pdf"]);
    }

    #[test]
    fn directories_are_never_yielded() {
        let dir = sample_tree();
        for entry in enumerate(dir.path(), true) {
            let fd = entry.unwrap();
            assert!(fd.path.is_file(), "{} is not a file", fd.path.display());
        }
    }

    #[test]
    fn count_matches_enumeration_under_same_policy() {
        let dir = sample_tree();
        for recursive in [false, true] {
            let counted = count(dir.path(), recursive).unwrap();
            let enumerated = enumerate(dir.path(), recursive).count() as u64;
            assert_eq!(counted, enumerated);
        }
    }

    #[test]
    fn descriptors_carry_relative_path_and_size() {
        let dir = sample_tree();
        let descriptors: Vec<_> = enumerate(dir.path(), true)
            .map(|r| r.unwrap())
            .collect();
        let c = descriptors
            .iter()
            .find(|d| d.file_name() == "c.txt")
            .unwrap();
        assert_eq!(c.relative, Path::new("sub").join("c.txt"));
        assert_eq!(c.size, "charlie".len() as u64);
        assert!(c.path.is_absolute() || c.path.starts_with(dir.path()));
    }

    #[test]
    fn empty_directory_counts_zero() {
        let dir = TempDir::new().unwrap();
        assert_eq!(count(dir.path(), true).unwrap(), 0);
    }

    #[test]
    fn is_ignored_matches_fixed_denylist() {
        assert!(is_ignored("Thumbs.db"));
        assert!(is_ignored(".DS_Store"));
        assert!(is_ignored("~$scratch.xlsx"));
        assert!(!is_ignored("thumbs.db"));
        assert!(!is_ignored("report.pdf"));
    }
}
