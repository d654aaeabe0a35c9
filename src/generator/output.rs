// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Filesystem writer for run outcomes.

use std::{
    fs,
    path::{Path, PathBuf}
};

use tracing::info;

use super::run::Outcome;
use crate::error::{Error, Result};

/// Apply an outcome under `root`.
///
/// Cleanups delete the files with the cleanup's extension directly inside
/// its directory; missing directories are skipped. Documents are written
/// after creating their directories. Returns the paths deleted or written.
///
/// # Errors
///
/// Returns [`Error::DirectoryConflict`] when a directory on the way is a
/// file (or a document path is a directory), and [`Error::Io`] on other
/// filesystem failures.
pub fn write_outcome(root: &Path, outcome: &Outcome) -> Result<Vec<PathBuf>> {
    let base = root.join(&outcome.dest);
    let mut touched = Vec::new();

    for cleanup in &outcome.cleanups {
        let dir = base.join(&cleanup.dir);
        if !dir.exists() {
            continue;
        }
        if !dir.is_dir() {
            return Err(Error::DirectoryConflict {
                path: dir
            });
        }
        let mut doomed = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|e| e == cleanup.extension) {
                doomed.push(path);
            }
        }
        doomed.sort();
        for path in doomed {
            fs::remove_file(&path)?;
            info!(target_name = outcome.target, path = %path.display(), "removed file");
            touched.push(path);
        }
    }

    for doc in &outcome.documents {
        let dir = base.join(&doc.dir);
        ensure_dir(&dir)?;
        let path = dir.join(format!("{}.{}", doc.stem, doc.extension));
        if path.is_dir() {
            return Err(Error::DirectoryConflict {
                path
            });
        }
        fs::write(&path, &doc.body)?;
        info!(target_name = outcome.target, path = %path.display(), "wrote file");
        touched.push(path);
    }
    Ok(touched)
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if let Some(existing) = dir.ancestors().find(|p| p.exists())
        && !existing.is_dir()
    {
        return Err(Error::DirectoryConflict {
            path: existing.to_path_buf()
        });
    }
    fs::create_dir_all(dir)?;
    Ok(())
}
