use std::path::{Path, PathBuf};

use futures::future::try_join_all;

use perch::error::{Chainable, Error, Result};
use perch::fstree::FsTree;
use perch::url::Url;
use perch::{error, Site};

use crate::config::Settings;
use crate::logo::LogoBuilder;
use crate::model::{LogoSubject, SiteData};
use crate::page::Pages;

pub const LOGO_ASSETS_DIR: &str = "external-assets/logo";
pub const ASSETS_DIR: &str = "assets";

/// Assembles every output file of the site in memory.
pub struct SiteBuilder<'a> {
    settings: &'a Settings,
    logos: &'a LogoBuilder,
    pages: Pages<'a>,
    site: Site,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(settings: &'a Settings, base_uri: &'a Url, logos: &'a LogoBuilder) -> Result<Self> {
        Ok(SiteBuilder {
            settings,
            logos,
            pages: Pages::new(settings, base_uri, logos)?,
            site: Site::new(),
        })
    }

    /// Renders pages and logo assets for `data`, then adds the files below
    /// `resources`, if any, under `assets/`.
    pub async fn build(self, data: &SiteData, resources: Option<&Path>) -> Result<Site> {
        let this = &self;
        let subjects = std::iter::once(LogoSubject::Organization)
            .chain(data.projects.iter().map(LogoSubject::from));

        let logos = try_join_all(subjects.map(|subject| this.add_logo(subject)));
        let projects = try_join_all(data.projects.iter().map(|project| async move {
            let html = this.pages.project(project).await?;
            this.site.add(PathBuf::from(project.slug()).join("index.html"), html);
            Ok::<_, Error>(())
        }));

        let index = async {
            let html = this.pages.index(&data.projects).await?;
            this.site.add("index.html", html);
            Ok::<_, Error>(())
        };

        futures::try_join!(logos, projects, index)?;

        if let Some(dir) = resources {
            let tree = FsTree::build(dir).chain_with(|| error! {
                "failed to read site resources",
                "directory" => dir.display(),
            })?;

            self.site.add_tree(&tree, ASSETS_DIR);
        }

        tracing::info!(
            projects = data.projects.len(),
            logos = self.logos.len(),
            files = self.site.len(),
            "site assembled"
        );

        Ok(self.site)
    }

    /// Adds the outlined SVG, the text template and every PNG size of a logo.
    async fn add_logo(&self, subject: LogoSubject<'_>) -> Result<()> {
        let logo = self.logos.logo(subject)?;
        let dir = Path::new(LOGO_ASSETS_DIR);
        let file = |ext: &str| format!("{}.{ext}", logo.key());

        self.site.add(dir.join("svg").join(file("svg")), logo.svg_document().await?);
        self.site.add(dir.join("svg-text").join(file("svg")), logo.template_svg());

        let pngs = try_join_all(self.settings.png_sizes.iter().map(|&size| {
            let logo = &logo;
            async move { Ok::<_, Error>((size, logo.png(size).await?)) }
        })).await?;

        for (size, png) in pngs {
            self.site.add(dir.join(format!("{size}x{size}_png")).join(file("png")), png);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use super::*;
    use crate::logo::fake::{style, FakeRasterizer};
    use crate::model::fixtures::{project, with_logo_text};
    use crate::model::ProjectOverride;

    fn data() -> SiteData {
        let obsolete = ProjectOverride {
            recommended: Some(false),
            ..with_logo_text("beta-tool", "BT")
        };

        SiteData { projects: vec![project("Alpha", None), project("beta-tool", Some(obsolete))] }
    }

    async fn build(base_uri: &Url, resources: Option<&Path>) -> (Site, Arc<FakeRasterizer>) {
        let settings = Settings { png_sizes: vec![16, 32], ..Settings::default() };
        let rasterizer = Arc::new(FakeRasterizer::default());
        let logos = LogoBuilder::new(style(), rasterizer.clone(), None);
        let builder = SiteBuilder::new(&settings, base_uri, &logos).unwrap();
        (builder.build(&data(), resources).await.unwrap(), rasterizer)
    }

    fn text(site: &Site, path: &str) -> String {
        match &site.get(path).unwrap().body {
            perch::Body::Text(text) => text.clone(),
            other => panic!("{path} is not text: {other:?}"),
        }
    }

    #[tokio::test]
    async fn builds_pages_and_logo_assets() {
        let (site, rasterizer) = build(Url::new(""), None).await;

        let index = text(&site, "index.html");
        assert!(index.find(r#"href="/alpha/""#).unwrap() < index.find(r#"href="/beta-tool/""#).unwrap());
        assert!(index.contains(r#"<section class="obsolete-project"><a href="/beta-tool/">"#));

        let beta = text(&site, "beta-tool/index.html");
        assert!(beta.contains("<title>Nerven beta-tool</title>"));
        assert!(site.get("alpha/index.html").is_some());

        for key in ["nerven", "nerven-alpha", "nerven-beta-tool"] {
            let svg = text(&site, &format!("external-assets/logo/svg/{key}.svg"));
            assert!(svg.starts_with("<?xml"));
            assert!(!svg.contains("<text"));

            let template = text(&site, &format!("external-assets/logo/svg-text/{key}.svg"));
            assert!(template.contains("<text"));

            for size in [16, 32] {
                let path = format!("external-assets/logo/{size}x{size}_png/{key}.png");
                assert!(site.get(&path).is_some(), "missing {path}");
            }
        }

        assert!(text(&site, "external-assets/logo/svg-text/nerven-beta-tool.svg").contains(">BT<"));
        assert_eq!(site.len(), 3 + 3 * 4);
        assert_eq!(rasterizer.outlines(), 3);
        assert_eq!(rasterizer.rasters(), 3 * 2);
    }

    #[tokio::test]
    async fn file_sites_link_index_files() {
        let (site, _) = build(Url::new("file:///srv/site"), None).await;
        let index = text(&site, "index.html");
        assert!(index.contains(r#"href="file:///srv/site/alpha/index.html""#));
        assert!(index.contains(r#"href="file:///srv/site/index.html""#));
    }

    #[tokio::test]
    async fn copies_resources_and_writes() {
        let resources = tempfile::tempdir().unwrap();
        fs::create_dir_all(resources.path().join("font-asap")).unwrap();
        fs::write(resources.path().join("font-asap/Asap-Bold-webfont.woff"), b"woff").unwrap();

        let (site, _) = build(Url::new("https://nerven.se"), Some(resources.path())).await;
        let output = tempfile::tempdir().unwrap();
        site.write_to(output.path()).unwrap();

        let font = output.path().join("assets/font-asap/Asap-Bold-webfont.woff");
        assert_eq!(fs::read(font).unwrap(), b"woff");
        assert_eq!(fs::read(output.path().join("external-assets/logo/16x16_png/nerven.png")).unwrap(), b"PNG 16");
        assert!(fs::read_to_string(output.path().join("alpha/index.html")).unwrap()
            .contains(r#"<a href="https://nerven.se/">"#));
    }
}
