use std::path::Path;

use perch::error::Result;
use perch::format::{Format, Json};

use crate::metadata::MetadataStore;
use crate::model::{Project, RepositoryRecord, SiteData};

/// Pairs every described repository with its override, if one exists
/// under the exact same name. Record order is kept.
pub fn assemble(records: Vec<RepositoryRecord>, metadata: &MetadataStore) -> SiteData {
    let projects = records.into_iter()
        .filter(|record| record.description.is_some())
        .map(|repository| Project {
            extra: metadata.get(&repository.name).cloned(),
            repository,
        })
        .collect();

    SiteData { projects }
}

impl SiteData {
    /// Overwrites `path` with the whole dataset.
    pub fn write_cache(&self, path: &Path) -> Result<()> {
        Json::write(path, self)?;
        tracing::info!(path = %path.display(), projects = self.projects.len(), "wrote data cache");
        Ok(())
    }

    pub fn read_cache(path: &Path) -> Result<SiteData> {
        let data: SiteData = Json::read(path)?;
        tracing::info!(path = %path.display(), projects = data.projects.len(), "read data cache");
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{record, with_logo_text};
    use crate::model::DevelopmentStatus;

    #[test]
    fn joins_overrides_by_exact_name() {
        let metadata = MetadataStore::from_overrides([
            with_logo_text("beta-tool", "BT"),
            with_logo_text("alpha", "lower"),
        ]).unwrap();

        let data = assemble(vec![
            record("Alpha", Some("desc A")),
            record("Hidden", None),
            record("beta-tool", Some("desc B")),
        ], &metadata);

        assert_eq!(data.projects.len(), 2);
        assert_eq!(data.projects[0].name(), "Alpha");
        assert!(data.projects[0].extra.is_none());
        assert_eq!(data.projects[1].logo_text(), Some("BT"));
    }

    #[test]
    fn cache_round_trips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");

        let mut extra = with_logo_text("Zeta", "Z.");
        extra.development_status = Some(DevelopmentStatus::Mature);
        extra.recommended = Some(false);
        extra.packages = Some(vec!["Nerven.Zeta".into()]);

        let mut zeta = record("Zeta", Some("last by name, first in file"));
        zeta.license_text = Some("\u{FEFF}The MIT License (MIT)\n(c) 2016".into());
        zeta.readme_html = Some("<div><pre>a\r\nb</pre></div>".into());

        let data = assemble(vec![zeta, record("Alpha", Some("desc A"))], &MetadataStore::from_overrides([extra]).unwrap());
        data.write_cache(&path).unwrap();

        let read = SiteData::read_cache(&path).unwrap();
        assert_eq!(read, data);
        assert_eq!(read.projects[0].name(), "Zeta");
    }
}
