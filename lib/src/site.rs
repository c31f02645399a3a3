use std::fs;
use std::sync::Arc;
use std::path::{Component, Path, PathBuf};

use derive_more::{Debug, From};
use rayon::prelude::*;
use rustc_hash::FxHashSet;

use crate::error::{Chainable, Result};
use crate::fstree::FsTree;

/// The contents of a single output file.
#[derive(Debug, Clone, From)]
pub enum Body {
    #[debug("Bytes({} bytes)", _0.len())]
    Bytes(Arc<[u8]>),
    #[debug("Text({} bytes)", _0.len())]
    Text(String),
    /// Copied from this file at write time.
    Copy(Arc<Path>),
}

/// A file to be written, at `path` relative to the output directory.
#[derive(Debug, Clone)]
pub struct Resource {
    pub path: PathBuf,
    pub body: Body,
}

/// A set of output files, filled concurrently and written in parallel.
#[derive(Debug, Default)]
#[debug("Site({} resources)", resources.count())]
pub struct Site {
    resources: boxcar::Vec<Resource>,
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Body::Bytes(bytes.into())
    }
}

impl Site {
    pub fn new() -> Self {
        Site::default()
    }

    pub fn len(&self) -> usize {
        self.resources.count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Queues `body` for writing at the relative `path`.
    pub fn add<P, B>(&self, path: P, body: B)
        where P: Into<PathBuf>, B: Into<Body>
    {
        self.resources.push(Resource { path: path.into(), body: body.into() });
    }

    /// Queues every file in `tree` for copying below `prefix`.
    pub fn add_tree<P: AsRef<Path>>(&self, tree: &FsTree, prefix: P) {
        for file in tree.files() {
            self.add(prefix.as_ref().join(&file.relative), Body::Copy(file.path.clone()));
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter().map(|(_, r)| r)
    }

    /// The resource at `path`, if any.
    pub fn get<P: AsRef<Path>>(&self, path: P) -> Option<&Resource> {
        self.iter().find(|r| r.path == path.as_ref())
    }

    /// Writes every resource below `output`. Paths must be relative, must
    /// not leave `output`, and must be unique.
    pub fn write_to(&self, output: &Path) -> Result<()> {
        let resources: Vec<&Resource> = self.iter().collect();
        let mut seen = FxHashSet::default();
        for resource in &resources {
            let path = &resource.path;
            ensure!(path.components().all(|c| matches!(c, Component::Normal(_))),
                "output paths must be relative and stay in the output directory",
                "path" => path.display());

            ensure!(seen.insert(path.as_path()),
                "two resources were generated for the same output path",
                "path" => path.display());
        }

        resources.par_iter().try_for_each(|resource| {
            let target = output.join(&resource.path);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).chain_with(|| error! {
                    "failed to create output directory",
                    "path" => parent.display(),
                })?;
            }

            let written = match &resource.body {
                Body::Bytes(bytes) => fs::write(&target, bytes),
                Body::Text(text) => fs::write(&target, text),
                Body::Copy(source) => fs::copy(source, &target).map(|_| ()),
            };

            written.chain_with(|| error! {
                "failed to write output file",
                "path" => target.display(),
            })
        })?;

        tracing::info!(count = resources.len(), output = %output.display(), "wrote site");
        Ok(())
    }
}

/// Removes everything inside `dir` except entries named in `keep`. A
/// missing `dir` is created.
pub fn clear_dir(dir: &Path, keep: &[&str]) -> Result<()> {
    if !dir.exists() {
        return fs::create_dir_all(dir).chain_with(|| error! {
            "failed to create output directory",
            "path" => dir.display(),
        });
    }

    let entries = fs::read_dir(dir).chain_with(|| error! {
        "failed to read output directory",
        "path" => dir.display(),
    })?;

    for entry in entries {
        let entry = entry?;
        if keep.iter().any(|k| entry.file_name() == **k) {
            continue;
        }

        let path = entry.path();
        let result = match entry.file_type()?.is_dir() {
            true => fs::remove_dir_all(&path),
            false => fs::remove_file(&path),
        };

        result.chain_with(|| error! {
            "failed to clear output entry",
            "path" => path.display(),
        })?;
    }

    Ok(())
}

#[cfg(test)]
static_assertions::assert_impl_all!(Site: Send, Sync);
