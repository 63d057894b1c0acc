use anyhow::{bail, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::classify::sniff_mime;
use crate::config::InputConfig;
use crate::models::FileRecord;

/// Recursively list non-empty regular files under the configured root.
///
/// A missing or non-directory root is fatal. Entries that cannot be read
/// are logged and skipped.
pub fn scan_directory(input: &InputConfig) -> Result<Vec<FileRecord>> {
    let root = &input.root;
    if !root.exists() {
        bail!("Input root does not exist: {}", root.display());
    }
    if !root.is_dir() {
        bail!("Input root is not a directory: {}", root.display());
    }

    let mut default_excludes = vec!["**/.git/**".to_string()];
    default_excludes.extend(input.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut records = Vec::new();

    let walker = WalkDir::new(root).follow_links(input.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Could not access entry under {}: {}", root.display(), e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude_set.is_match(relative) {
            continue;
        }

        let size = match entry.metadata() {
            Ok(m) => m.len(),
            Err(e) => {
                warn!("Could not access {}: {}", path.display(), e);
                continue;
            }
        };
        if size == 0 {
            debug!("Skipping empty file {}", path.display());
            continue;
        }

        records.push(file_record(path, size));
    }

    // Sort for deterministic ordering
    records.sort_by(|a, b| a.path.cmp(&b.path));

    Ok(records)
}

fn file_record(path: &Path, size: u64) -> FileRecord {
    FileRecord {
        path: path.to_path_buf(),
        size,
        mime_type: sniff_mime(path),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn input(root: &Path) -> InputConfig {
        InputConfig {
            root: root.to_path_buf(),
            ..InputConfig::default()
        }
    }

    #[test]
    fn missing_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = scan_directory(&input(&tmp.path().join("nope"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn file_root_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        let err = scan_directory(&input(&file)).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
    }

    #[test]
    fn walks_recursively_and_skips_empty_files() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("day1/sub")).unwrap();
        fs::write(tmp.path().join("top.txt"), "hello").unwrap();
        fs::write(tmp.path().join("day1/sub/deep.txt"), "world").unwrap();
        fs::write(tmp.path().join("day1/empty.txt"), "").unwrap();

        let records = scan_directory(&input(tmp.path())).unwrap();
        let names: Vec<String> = records
            .iter()
            .map(|r| r.path.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["deep.txt", "top.txt"]);
        assert_eq!(records[0].size, 5);
    }

    #[test]
    fn exclude_globs_apply_to_relative_paths() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("skip")).unwrap();
        fs::write(tmp.path().join("skip/a.txt"), "a").unwrap();
        fs::write(tmp.path().join("keep.txt"), "b").unwrap();

        let mut cfg = input(tmp.path());
        cfg.exclude_globs = vec!["skip/**".to_string()];
        let records = scan_directory(&cfg).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].path.ends_with("keep.txt"));
    }
}
