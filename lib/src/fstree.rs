use std::fs;
use std::sync::Arc;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// The regular files below a directory, captured once, in a stable order.
#[derive(Debug)]
pub struct FsTree {
    root: Arc<Path>,
    files: Vec<File>,
}

#[derive(Debug, Clone)]
pub struct File {
    /// Where the file lives on disk.
    pub path: Arc<Path>,
    /// The path below the tree's root.
    pub relative: PathBuf,
    pub len: u64,
}

#[derive(Default, Debug)]
struct FsMetadata(Option<fs::Metadata>);

impl jwalk::ClientState for FsMetadata {
    type ReadDirState = ();
    type DirEntryState = Self;
}

impl FsTree {
    /// Walks `root`, following links. Unreadable entries are skipped.
    pub fn build<P: AsRef<Path>>(root: P) -> Result<Self> {
        use jwalk::WalkDirGeneric;

        let root = root.as_ref();
        if !root.is_dir() {
            return err! {
                "file system tree root must be an existing directory",
                "search root" => root.display(),
            }
        }

        let walker = WalkDirGeneric::<FsMetadata>::new(root)
            .follow_links(true)
            .sort(true)
            .process_read_dir(|_, _, _, entries| {
                entries.iter_mut()
                    .filter_map(|e| e.as_mut().ok())
                    .for_each(|e| e.client_state = FsMetadata(e.metadata().ok()))
            });

        let files = walker.into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.depth > 0)
            .filter_map(|e| {
                let metadata = e.client_state.0.as_ref().filter(|m| m.is_file())?;
                let path = e.path();
                let relative = path.strip_prefix(root).ok()?.to_path_buf();
                Some(File { len: metadata.len(), path: path.into(), relative })
            })
            .collect();

        Ok(FsTree { root: root.into(), files })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every file, depth first, siblings in name order.
    pub fn files(&self) -> &[File] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Total size of every file in bytes.
    pub fn size(&self) -> u64 {
        self.files.iter().map(|f| f.len).sum()
    }
}
