//! The site's HTML pages.
//!
//! Every page shares the same chrome: a `<head>` with the inlined
//! stylesheet and favicons, optional breadcrumbs, a header carrying the
//! page's logo, and a footer. Only the contents differ between the index
//! and the per-project pages.

use futures::future::try_join_all;

use perch::error::{Chainable, Result};
use perch::format::Grass;
use perch::markup::{Element, Node};
use perch::url::Url;
use perch::error;

use crate::config::Settings;
use crate::logo::{Logo, LogoBuilder};
use crate::model::{LogoSubject, Project};
use crate::readme::{fix_license, fix_readme};

const STYLESHEET: &str = include_str!("style.scss");
const BASE_URI_PLACEHOLDER: &str = "'__BASE_URI'";

/// The absolute link to the page at `path`. Every page is a directory
/// index, so links end in `/`, or in `/index.html` for `file:` sites where
/// nothing resolves directory indexes.
pub fn document_uri(base: &Url, path: &[&str]) -> String {
    let mut uri = base.to_url_buf();
    for segment in path {
        uri.push_segment(segment);
    }

    uri.with_trailing_slash();
    if base.is_file() {
        uri.append("index.html");
    }

    uri.into()
}

/// Compiles the site stylesheet with its asset links rooted at `base`.
pub fn compile_stylesheet(base: &Url) -> Result<String> {
    let scss = STYLESHEET.replace(BASE_URI_PLACEHOLDER, &format!("'{}'", base.as_str()));
    let css = Grass::default().compile(&scss).chain(error!("invalid site stylesheet"))?;
    Ok(css.trim().replace('\n', " "))
}

fn link<S: AsRef<str>>(href: S) -> Element {
    Element::new("a").attr_with("href", href)
}

fn span() -> Element {
    Element::new("span")
}

fn term(text: &str) -> Element {
    Element::new("dt").text(text)
}

fn definition() -> Element {
    Element::new("dd")
}

/// Renders pages against one set of settings and one base URI.
pub struct Pages<'a> {
    settings: &'a Settings,
    base_uri: &'a Url,
    logos: &'a LogoBuilder,
    stylesheet: String,
}

impl<'a> Pages<'a> {
    pub fn new(settings: &'a Settings, base_uri: &'a Url, logos: &'a LogoBuilder) -> Result<Self> {
        let stylesheet = compile_stylesheet(base_uri)?;
        Ok(Pages { settings, base_uri, logos, stylesheet })
    }

    pub fn uri(&self, path: &[&str]) -> String {
        document_uri(self.base_uri, path)
    }

    /// The front page: every project, recommended ones first.
    pub async fn index(&self, projects: &[Project]) -> Result<String> {
        let mut ordered: Vec<&Project> = projects.iter().collect();
        ordered.sort_by(|a, b| {
            let obsolete = |p: &Project| p.recommended() == Some(false);
            obsolete(a).cmp(&obsolete(b)).then_with(|| a.name().cmp(b.name()))
        });

        let sections = try_join_all(ordered.into_iter().map(|p| self.index_section(p))).await?;
        let contents = Element::new("div").child(Element::new("div")
            .class("projects-index")
            .child(Element::new("div").children(sections)));

        let logo = self.logos.logo(LogoSubject::Organization)?;
        self.document(&[], None, &logo, contents).await
    }

    async fn index_section(&self, project: &Project) -> Result<Element> {
        let logo = self.logos.logo(project.into())?;
        let slug = project.slug();
        let heading = Element::new("h2").child(logo.node().await?).text(project.name());
        let mut section = Element::new("section");
        if project.recommended() == Some(false) {
            section = section.class("obsolete-project");
        }

        Ok(section.child(link(self.uri(&[&slug]))
            .child(Element::new("header").child(heading))
            .child(Element::new("p").text(project.description()))))
    }

    /// A project's own page: its facts, README and license.
    pub async fn project(&self, project: &Project) -> Result<String> {
        let readme = match &project.repository.readme_html {
            Some(html) => Some(fix_readme(html, project.name()).chain_with(|| error! {
                "failed to clean up README",
                "project" => project.name(),
            })?),
            None => None,
        };

        let readme = readme.map(|readme| Element::new("section")
            .class("project-readme-section")
            .child(Element::new("header").child(Element::new("h2").text("Readme")))
            .child(Element::new("div").child(readme)));

        let license = project.repository.license_text.as_deref().map(|text| Element::new("section")
            .class("project-license-section")
            .child(Element::new("header").child(Element::new("h2").text("License")))
            .child(Element::new("pre").text(fix_license(text))));

        let contents = Element::new("article")
            .class("project-article")
            .child(Element::new("section")
                .class("project-info-section")
                .child(Element::new("p").text(project.description()))
                .child(self.facts(project)))
            .maybe_child(readme)
            .maybe_child(license);

        let slug = project.slug();
        let logo = self.logos.logo(project.into())?;
        self.document(&[&slug], Some(project.name()), &logo, contents).await
    }

    fn facts(&self, project: &Project) -> Element {
        let repo = &project.repository;
        let settings = self.settings;
        let mut list = Element::new("dl")
            .child(term("GitHub"))
            .child(definition().child(link(&repo.html_url)
                .text(format!("github.com/{}/{}", repo.owner_name, repo.name))));

        if !project.packages().is_empty() {
            list = list.child(term(&settings.package_label));
            for package in project.packages() {
                list = list.child(definition()
                    .child(Element::new("kbd").text(&settings.package_install).text(package))
                    .text(" (")
                    .child(link(settings.package_url(package)).text(package))
                    .text(")"));
            }
        }

        if !project.platforms().is_empty() {
            list = list.child(term(&settings.platform_label));
            for platform in project.platforms() {
                list = list.child(definition().text(platform));
            }
        }

        if let Some(status) = project.development_status() {
            list = list.child(term("Development")).child(definition().text(status.to_string()));
        }

        if let Some(license) = &repo.license_name {
            list = list.child(term("License")).child(definition().text(license));
        }

        let archive = |ext: &str| definition()
            .child(link(format!("{}/archive/master{ext}", repo.html_url)).text(ext));

        list.child(term("Source (git)"))
            .child(definition().child(Element::new("kbd").text(&repo.ssh_url)))
            .child(definition().child(Element::new("kbd").text(&repo.clone_url)))
            .child(term("Source (archive)"))
            .child(archive(".tar.gz"))
            .child(archive(".zip"))
    }

    /// Wraps `contents` in the page chrome. `path` locates the page and
    /// `title` names it; the front page has neither.
    async fn document(
        &self,
        path: &[&str],
        title: Option<&str>,
        logo: &Logo,
        contents: Element,
    ) -> Result<String> {
        let organization = &self.settings.organization;
        let root = self.uri(&[]);
        let page_title = match title {
            Some(title) => format!("{organization} {title}"),
            None => organization.clone(),
        };

        let head = Element::new("head")
            .child(Element::new("meta").attr_with("charset", "utf-8"))
            .child(Element::new("meta")
                .attr_with("name", "viewport")
                .attr_with("content", "width=device-width, initial-scale=1.0"))
            .child(Element::new("title").text(page_title))
            .child(Element::new("style")
                .attr_with("type", "text/css")
                .child(Node::raw(self.stylesheet.as_str())))
            .child(Element::new("link")
                .attr_with("rel", "icon")
                .attr_with("type", "image/png")
                .attr_with("sizes", "16x16")
                .attr_with("href", logo.png_data_uri(16).await?))
            .child(Element::new("link")
                .attr_with("rel", "icon")
                .attr_with("type", "image/svg+xml")
                .attr_with("sizes", "any")
                .attr_with("href", logo.svg_data_uri().await?));

        let heading = match title {
            Some(title) => link(self.uri(path))
                .child(logo.node().await?)
                .child(Element::new("small").text(organization))
                .child(Element::new("br"))
                .text(title),
            None => link(&root).child(logo.node().await?).text(organization),
        };

        let breadcrumbs = match title {
            Some(title) if !path.is_empty() => Some(self.breadcrumbs(path, title).await?),
            _ => None,
        };

        let footer = Element::new("footer")
            .class("site-footer")
            .child(Element::new("div")
                .child(span().child(link(&root).text(organization)))
                .child(span().text(" by "))
                .child(span().child(link(&self.settings.author_url).text(&self.settings.author_name))))
            .child(Element::new("div")
                .child(span().text(format!("This website, including the {organization} logo and \
                    all {organization} project logos, was automagically generated by ")))
                .child(span().child(link(&self.settings.generator_url)
                    .text(&self.settings.generator_name))));

        let body = Element::new("body").child(Element::new("div")
            .maybe_child(breadcrumbs)
            .child(Element::new("header")
                .class("site-header")
                .child(Element::new("h1").child(heading)))
            .child(Element::new("div").class("site-contents").child(contents))
            .child(footer));

        let html = Element::new("html")
            .attr_with("lang", "en")
            .child(head)
            .child(body);

        Ok(html.to_html_document())
    }

    async fn breadcrumbs(&self, path: &[&str], title: &str) -> Result<Element> {
        let organization = self.logos.logo(LogoSubject::Organization)?;
        let home = span()
            .child(link(self.uri(&[]))
                .child(organization.node().await?)
                .text(&self.settings.organization))
            .child(span().text(" / "));

        let current = span().child(link(self.uri(path)).text(title));
        Ok(Element::new("nav")
            .class("site-nav")
            .child(Element::new("div").child(home).child(current)))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::logo::fake::{style, FakeRasterizer};
    use crate::model::fixtures::project;
    use crate::model::{DevelopmentStatus, ProjectOverride};

    fn logos() -> LogoBuilder {
        LogoBuilder::new(style(), Arc::new(FakeRasterizer::default()), None)
    }

    #[test]
    fn document_uris() {
        let empty = Url::new("");
        assert_eq!(document_uri(empty, &[]), "/");
        assert_eq!(document_uri(empty, &["alpha"]), "/alpha/");

        let http = Url::new("https://nerven.se");
        assert_eq!(document_uri(http, &["beta-tool"]), "https://nerven.se/beta-tool/");
        assert_eq!(document_uri(http, &["my tool"]), "https://nerven.se/my%20tool/");

        let file = Url::new("file:///srv/site");
        assert_eq!(document_uri(file, &[]), "file:///srv/site/index.html");
        assert_eq!(document_uri(file, &["alpha"]), "file:///srv/site/alpha/index.html");
    }

    #[test]
    fn stylesheet_links_assets_below_the_base() {
        let css = compile_stylesheet(Url::new("https://nerven.se")).unwrap();
        assert!(css.contains("https://nerven.se/assets/font-asap/Asap-Bold-webfont.woff"));
        assert!(!css.contains("__BASE_URI"));
        assert!(!css.contains('\n'));
        assert!(css.contains(".obsolete-project"));
    }

    #[tokio::test]
    async fn index_orders_recommended_first() {
        let settings = Settings::default();
        let logos = logos();
        let pages = Pages::new(&settings, Url::new(""), &logos).unwrap();

        let obsolete = ProjectOverride {
            name: "Aardvark".into(),
            recommended: Some(false),
            ..ProjectOverride::default()
        };

        let projects = [
            project("beta-tool", None),
            project("Aardvark", Some(obsolete)),
            project("Alpha", None),
        ];

        let html = pages.index(&projects).await.unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n<html lang=\"en\">"));
        assert!(html.contains("<title>Nerven</title>"));

        let alpha = html.find(r#"href="/alpha/""#).unwrap();
        let beta = html.find(r#"href="/beta-tool/""#).unwrap();
        let aardvark = html.find(r#"href="/aardvark/""#).unwrap();
        assert!(alpha < beta && beta < aardvark);
        assert!(html.contains(r#"<section class="obsolete-project"><a href="/aardvark/">"#));
        assert!(html.contains("<p>about Alpha</p>"));
        assert!(!html.contains("<nav"));
    }

    #[tokio::test]
    async fn project_page_lists_facts() {
        let settings = Settings::default();
        let logos = logos();
        let pages = Pages::new(&settings, Url::new("https://nerven.se"), &logos).unwrap();

        let mut alpha = project("Alpha", Some(ProjectOverride {
            name: "Alpha".into(),
            packages: Some(vec!["Nerven.Alpha".into()]),
            platforms: Some(vec![".NET Standard 2.0".into()]),
            development_status: Some(DevelopmentStatus::Beta),
            ..ProjectOverride::default()
        }));

        alpha.repository.license_name = Some("MIT".into());
        alpha.repository.license_text = Some("Copyright (c) 2016 Nerven".into());
        alpha.repository.readme_html = Some("<div><h1>Alpha</h1><p>Hi</p></div>".into());

        let html = pages.project(&alpha).await.unwrap();
        assert!(html.contains("<title>Nerven Alpha</title>"));
        assert!(html.contains(r#"<a href="https://github.com/Nerven/Alpha">github.com/Nerven/Alpha</a>"#));
        assert!(html.contains("<dt>NuGet</dt><dd><kbd>Install-Package Nerven.Alpha</kbd> (<a href=\"https://www.nuget.org/packages/Nerven.Alpha/\">Nerven.Alpha</a>)</dd>"));
        assert!(html.contains("<dt>.NET platform</dt><dd>.NET Standard 2.0</dd>"));
        assert!(html.contains("<dt>Development</dt><dd>Beta</dd>"));
        assert!(html.contains("<dt>License</dt><dd>MIT</dd>"));
        assert!(html.contains("<dd><kbd>git@github.com:Nerven/Alpha.git</kbd></dd>"));
        assert!(html.contains(r#"<a href="https://github.com/Nerven/Alpha/archive/master.zip">.zip</a>"#));
        assert!(html.contains(r#"<section class="project-readme-section">"#));
        assert!(html.contains(r#"<section class="project-license-section">"#));
        assert!(html.contains("<pre>Copyright © 2016 Nerven</pre>"));
        assert!(html.contains("<div><div><p>Hi</p></div></div>"));
        assert!(html.contains(r#"<nav class="site-nav">"#));
        assert!(html.contains(r#"<span><a href="https://nerven.se/alpha/">Alpha</a></span>"#));
        assert!(html.contains("<small>Nerven</small><br/>Alpha</a></h1>"));
    }

    #[tokio::test]
    async fn sections_are_optional() {
        let settings = Settings::default();
        let logos = logos();
        let pages = Pages::new(&settings, Url::new(""), &logos).unwrap();

        let html = pages.project(&project("Bare", None)).await.unwrap();
        assert!(!html.contains(r#"<section class="project-readme-section""#));
        assert!(!html.contains(r#"<section class="project-license-section""#));
        assert!(!html.contains("<dt>Development</dt>"));
        assert!(!html.contains("<dt>NuGet</dt>"));
        assert!(html.contains("<dt>Source (git)</dt>"));
    }
}
