// SPDX-FileCopyrightText: 2025-2026 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Generated files before they touch the disk.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf}
};

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Dotted namespace of the directory (`bs.orders.tables`).
    pub namespace: String,

    /// Directory, relative to the target dest.
    pub dir: PathBuf,

    /// File stem.
    pub stem: String,

    /// Extension without the dot.
    pub extension: &'static str,

    /// Main type the file declares, when there is one.
    pub class_name: Option<String>,

    /// File contents.
    pub body: String
}

impl Document {
    /// Namespace of `dir` under the target namespace `root`.
    #[must_use]
    pub fn namespace_of(root: &str, dir: &Path) -> String {
        root.split('.')
            .map(str::to_string)
            .chain(dir.components().map(|c| c.as_os_str().to_string_lossy().into_owned()))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Path relative to the target dest.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.stem, self.extension))
    }
}

/// File written into a directory, as the index step sees it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ManifestEntry {
    /// File stem.
    pub stem: String,

    /// Main type the file declares.
    pub class_name: Option<String>
}

/// Every generated file of a run, grouped by directory in write order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    dirs: BTreeMap<PathBuf, Vec<ManifestEntry>>
}

impl Manifest {
    /// Record a document.
    pub fn record(&mut self, doc: &Document) {
        let entries = self.dirs.entry(doc.dir.clone()).or_default();
        if !entries.iter().any(|e| e.stem == doc.stem) {
            entries.push(ManifestEntry {
                stem:       doc.stem.clone(),
                class_name: doc.class_name.clone()
            });
        }
    }

    /// Entries of one directory.
    #[must_use]
    pub fn entries(&self, dir: &Path) -> &[ManifestEntry] {
        self.dirs.get(dir).map_or(&[], Vec::as_slice)
    }

    /// Directories with their entries, sorted by path.
    pub fn dirs(&self) -> impl Iterator<Item = (&Path, &[ManifestEntry])> {
        self.dirs.iter().map(|(d, e)| (d.as_path(), e.as_slice()))
    }

    /// True when nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

/// Files to delete in clean mode.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cleanup {
    /// Directory, relative to the target dest.
    pub dir: PathBuf,

    /// Extension of the files to delete.
    pub extension: &'static str
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(dir: &str, stem: &str) -> Document {
        Document {
            namespace:  dir.replace('/', "."),
            dir:        PathBuf::from(dir),
            stem:       stem.to_string(),
            extension:  "py",
            class_name: Some(stem.to_uppercase()),
            body:       String::new()
        }
    }

    #[test]
    fn relative_path_joins_dir_and_extension() {
        assert_eq!(doc("tables", "Orders").relative_path(), PathBuf::from("tables/Orders.py"));
    }

    #[test]
    fn namespace_joins_root_and_dir() {
        assert_eq!(
            Document::namespace_of("bs.orders", Path::new("dao/postgres")),
            "bs.orders.dao.postgres"
        );
        assert_eq!(Document::namespace_of("", Path::new("tables")), "tables");
    }

    #[test]
    fn manifest_keeps_write_order_and_dedupes() {
        let mut manifest = Manifest::default();
        manifest.record(&doc("tables", "b"));
        manifest.record(&doc("tables", "a"));
        manifest.record(&doc("tables", "b"));
        manifest.record(&doc("dao/postgres", "c"));

        let stems: Vec<_> = manifest
            .entries(Path::new("tables"))
            .iter()
            .map(|e| e.stem.as_str())
            .collect();
        assert_eq!(stems, vec!["b", "a"]);
        assert_eq!(manifest.dirs().count(), 2);
        assert!(manifest.entries(Path::new("nowhere")).is_empty());
    }
}
