// src/discovery.rs
//! Default file enumerator: walks a root, prunes tool and dependency
//! directories, keeps files with a front-end's extensions.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use tracing::warn;

/// Every file under `root` whose extension is in `extensions`, sorted.
///
/// Directories named in `prune_dirs` are never descended into. Walk errors
/// are counted and logged, never fatal.
#[must_use]
pub fn find_files(root: &Path, extensions: &[&str], prune_dirs: &[String]) -> Vec<PathBuf> {
    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !should_prune(&e.file_name().to_string_lossy(), prune_dirs));

    let (paths, error_count) = accumulate_walker(walker);
    if error_count > 0 {
        warn!(root = %root.display(), errors = error_count, "errors during file walk");
    }

    let mut files: Vec<PathBuf> = paths
        .into_iter()
        .filter(|p| has_extension(p, extensions))
        .collect();
    files.sort();
    files
}

fn should_prune(name: &str, prune_dirs: &[String]) -> bool {
    prune_dirs.iter().any(|d| d == name)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}

fn accumulate_walker<I>(walker: I) -> (Vec<PathBuf>, usize)
where
    I: Iterator<Item = walkdir::Result<walkdir::DirEntry>>,
{
    let mut paths = Vec::new();
    let mut errors = 0;
    for item in walker {
        match item {
            Ok(entry) => {
                if entry.file_type().is_file() {
                    paths.push(entry.into_path());
                }
            }
            Err(_) => errors += 1,
        }
    }
    (paths, errors)
}
