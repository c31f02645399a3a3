use std::path::Path;

use rustc_hash::FxHashMap;
use serde::Deserialize;

use perch::error::{Chainable, Result};
use perch::format::{Format, Json};
use perch::{err, error};

use crate::model::ProjectOverride;

/// Curated project overrides, looked up by exact repository name.
#[derive(Debug, Default)]
pub struct MetadataStore {
    overrides: FxHashMap<String, ProjectOverride>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct MetadataFile {
    #[serde(default)]
    projects: Vec<ProjectOverride>,
}

impl MetadataStore {
    pub fn empty() -> Self {
        MetadataStore::default()
    }

    /// Reads a `{ "Projects": [...] }` document.
    pub fn load(path: &Path) -> Result<Self> {
        let file: MetadataFile = Json::read(path)?;
        Self::from_overrides(file.projects).chain_with(|| error! {
            "invalid project metadata",
            "file path" => path.display(),
        })
    }

    pub fn from_overrides<I>(overrides: I) -> Result<Self>
        where I: IntoIterator<Item = ProjectOverride>
    {
        let mut store = MetadataStore::default();
        for extra in overrides {
            if store.overrides.contains_key(&extra.name) {
                return err!("project metadata is defined twice", "project name" => extra.name);
            }

            store.overrides.insert(extra.name.clone(), extra);
        }

        tracing::debug!(count = store.len(), "loaded project metadata");
        Ok(store)
    }

    pub fn get(&self, name: &str) -> Option<&ProjectOverride> {
        self.overrides.get(name)
    }

    pub fn len(&self) -> usize {
        self.overrides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overrides.is_empty()
    }
}
