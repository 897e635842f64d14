// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Filesystem helpers
//!
//! Artifacts are published by writing a temporary sibling and renaming it
//! into place, so a reader never observes a half-written file and a failed
//! task leaves the previous artifact intact. Artifact IO is async; the
//! startup-only helpers (manifest reads, glob expansion) stay synchronous.

use crate::errors::{AssetflowError, AssetflowResult};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Remove a directory tree. Missing directories are fine.
pub async fn clean_dir(path: &Path) -> AssetflowResult<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(AssetflowError::file_write(path, e)),
    }
}

/// Write `contents` to `path` atomically via a temporary sibling.
pub async fn publish_atomic(path: &Path, contents: &[u8]) -> AssetflowResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AssetflowError::file_write(parent, e))?;
    }
    let staging = staging_path(path);
    fs::write(&staging, contents)
        .await
        .map_err(|e| AssetflowError::file_write(&staging, e))?;
    if let Err(e) = fs::rename(&staging, path).await {
        // Leave no stray staging file behind on a failed rename.
        let _ = fs::remove_file(&staging).await;
        return Err(AssetflowError::file_write(path, e));
    }
    Ok(())
}

/// Copy `src` to `dest` atomically via a temporary sibling of `dest`.
pub async fn copy_atomic(src: &Path, dest: &Path) -> AssetflowResult<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| AssetflowError::file_write(parent, e))?;
    }
    let staging = staging_path(dest);
    fs::copy(src, &staging)
        .await
        .map_err(|e| AssetflowError::file_read(src, e))?;
    if let Err(e) = fs::rename(&staging, dest).await {
        let _ = fs::remove_file(&staging).await;
        return Err(AssetflowError::file_write(dest, e));
    }
    Ok(())
}

/// Expand glob patterns into a sorted list of matching files. Directories
/// and unreadable entries are dropped.
pub fn expand_globs(patterns: &[String]) -> AssetflowResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in patterns {
        let paths = glob::glob(pattern)?;
        files.extend(paths.filter_map(Result::ok).filter(|p| p.is_file()));
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn staging_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{name}.staging"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as stdfs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_publish_creates_parents_and_leaves_no_staging_file() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("dist").join("app.js");

        publish_atomic(&dest, b"bundle").await.unwrap();

        assert_eq!(stdfs::read(&dest).unwrap(), b"bundle");
        let siblings: Vec<_> = stdfs::read_dir(dest.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(siblings, ["app.js"]);
    }

    #[tokio::test]
    async fn test_publish_replaces_existing_artifact() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("app.js");
        stdfs::write(&dest, "old").unwrap();

        publish_atomic(&dest, b"new").await.unwrap();
        assert_eq!(stdfs::read_to_string(&dest).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_copy_atomic_mirrors_contents() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("logo.svg");
        stdfs::write(&src, "<svg/>").unwrap();
        let dest = dir.path().join("out").join("logo.svg");

        copy_atomic(&src, &dest).await.unwrap();
        assert_eq!(stdfs::read_to_string(&dest).unwrap(), "<svg/>");
    }

    #[test]
    fn test_expand_globs_sorts_and_skips_directories() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        stdfs::create_dir_all(src.join("nested")).unwrap();
        stdfs::write(src.join("b.js"), "").unwrap();
        stdfs::write(src.join("a.js"), "").unwrap();
        stdfs::write(src.join("nested").join("c.js"), "").unwrap();
        stdfs::write(src.join("ignore.css"), "").unwrap();

        let pattern = format!("{}/**/*.js", src.to_string_lossy());
        let files = expand_globs(&[pattern]).unwrap();

        assert_eq!(
            files,
            [
                src.join("a.js"),
                src.join("b.js"),
                src.join("nested").join("c.js"),
            ]
        );
    }

    #[tokio::test]
    async fn test_clean_dir_tolerates_missing_target() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("dist");
        clean_dir(&target).await.unwrap();

        stdfs::create_dir(&target).unwrap();
        stdfs::write(target.join("a.js"), "x").unwrap();
        clean_dir(&target).await.unwrap();
        assert!(!target.exists());
    }
}
