//! Logos drawn from a fixed template, and the artifacts derived from them.
//!
//! Each logo starts as an SVG with a text label. An external vector tool
//! converts the label to outlines (so the logo renders without the font) and
//! rasterizes the template to PNGs. Every derived artifact is computed at
//! most once per logo and cached.

use std::sync::Arc;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dashmap::DashMap;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use perch::command::Command;
use perch::error::{Chainable, Result};
use perch::markup::{parse_element, Attr, Element, Node};
use perch::util::data_uri;
use perch::{ensure, error};

use crate::config::Settings;
use crate::model::LogoSubject;

/// Font size and baseline offset of the label on the 2000x2000 canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub font_size: u32,
    pub text_y: u32,
}

/// Picks one of three fixed layouts by the label's length in characters.
pub fn layout_for(text: &str) -> Layout {
    match text.chars().count() {
        0..=2 => Layout { font_size: 1400, text_y: 1550 },
        3 => Layout { font_size: 1000, text_y: 1400 },
        _ => Layout { font_size: 800, text_y: 1300 },
    }
}

/// The label drawn on a logo.
///
/// The organization gets its initial. A project gets its override text if
/// one is set, otherwise the upper-case letters of its name followed by a
/// period. When that would be two characters or fewer, the first two
/// characters of the name and a period are used instead.
pub fn logo_text(subject: LogoSubject<'_>, organization: &str) -> String {
    let project = match subject {
        LogoSubject::Organization => return organization.chars().take(1).collect(),
        LogoSubject::Project(project) => project,
    };

    if let Some(text) = project.logo_text() {
        return text.to_string();
    }

    let name = project.name();
    let mut initials: String = name.chars().filter(|c| c.is_uppercase()).collect();
    initials.push('.');
    if initials.chars().count() <= 2 {
        let mut short: String = name.chars().take(2).collect();
        short.push('.');
        return short;
    }

    initials
}

/// The cache key and asset file stem. Project keys are prefixed with the
/// organization's key so the two never collide.
pub fn logo_key(subject: LogoSubject<'_>, organization: &str) -> String {
    let organization = organization.to_lowercase();
    match subject {
        LogoSubject::Organization => organization,
        LogoSubject::Project(project) => format!("{organization}-{}", project.slug()),
    }
}

/// An external tool that outlines text in and rasterizes SVG documents.
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Writes a plain SVG to `output` with all text converted to paths.
    async fn outline(&self, input: &Path, output: &Path) -> Result<()>;

    /// Writes a `size` by `size` PNG rendering of `input` to `output`.
    async fn rasterize(&self, input: &Path, size: u32, output: &Path) -> Result<()>;
}

/// Inkscape 1.x, driven from its command line.
#[derive(Debug, Clone)]
pub struct Inkscape {
    executable: PathBuf,
}

impl Inkscape {
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        Inkscape { executable: executable.into() }
    }

    fn export_to(output: &Path) -> OsString {
        let mut flag = OsString::from("--export-filename=");
        flag.push(output);
        flag
    }

    fn outline_command(&self, input: &Path, output: &Path) -> Command {
        Command::new(&self.executable)
            .arg(input)
            .args(["--export-text-to-path", "--export-plain-svg"])
            .arg(Self::export_to(output))
    }

    fn rasterize_command(&self, input: &Path, size: u32, output: &Path) -> Command {
        Command::new(&self.executable)
            .arg(input)
            .arg("--export-type=png")
            .arg(format!("--export-width={size}"))
            .arg(format!("--export-height={size}"))
            .arg(Self::export_to(output))
    }
}

#[async_trait]
impl Rasterizer for Inkscape {
    async fn outline(&self, input: &Path, output: &Path) -> Result<()> {
        self.outline_command(input, output).run().await
    }

    async fn rasterize(&self, input: &Path, size: u32, output: &Path) -> Result<()> {
        self.rasterize_command(input, size, output).run().await
    }
}

/// An external program that rewrites a PNG file in place.
#[derive(Debug, Clone)]
pub struct PngOptimizer {
    executable: PathBuf,
}

impl PngOptimizer {
    pub fn new<P: Into<PathBuf>>(executable: P) -> Self {
        PngOptimizer { executable: executable.into() }
    }

    pub async fn optimize(&self, png: &Path) -> Result<()> {
        Command::new(&self.executable).arg(png).run().await
    }
}

/// What every logo shares: the organization, colors and font.
#[derive(Debug, Clone)]
pub struct LogoStyle {
    pub organization: String,
    pub brand_color: String,
    pub font_family: String,
}

impl From<&Settings> for LogoStyle {
    fn from(settings: &Settings) -> Self {
        LogoStyle {
            organization: settings.organization.clone(),
            brand_color: settings.brand_color.clone(),
            font_family: settings.logo_font.clone(),
        }
    }
}

/// Creates logos on demand and hands out the same logo for the same key.
pub struct LogoBuilder {
    style: LogoStyle,
    tools: Arc<Tools>,
    logos: DashMap<String, Arc<Logo>>,
}

struct Tools {
    rasterizer: Arc<dyn Rasterizer>,
    optimizer: Option<PngOptimizer>,
}

impl LogoBuilder {
    pub fn new(
        style: LogoStyle,
        rasterizer: Arc<dyn Rasterizer>,
        optimizer: Option<PngOptimizer>,
    ) -> Self {
        LogoBuilder {
            style,
            tools: Arc::new(Tools { rasterizer, optimizer }),
            logos: DashMap::new(),
        }
    }

    pub fn logo(&self, subject: LogoSubject<'_>) -> Result<Arc<Logo>> {
        let key = logo_key(subject, &self.style.organization);
        if let Some(logo) = self.logos.get(&key) {
            return Ok(logo.clone());
        }

        let text = logo_text(subject, &self.style.organization);
        let template = template(&key, &text, &self.style)?;
        let logo = Arc::new(Logo {
            key: key.clone(),
            text,
            template,
            tools: self.tools.clone(),
            cache: Mutex::new(Cache::default()),
        });

        Ok(self.logos.entry(key).or_insert(logo).clone())
    }

    pub fn len(&self) -> usize {
        self.logos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logos.is_empty()
    }
}

/// One logo: its template and the artifacts derived from it so far.
pub struct Logo {
    key: String,
    text: String,
    template: Element,
    tools: Arc<Tools>,
    cache: Mutex<Cache>,
}

#[derive(Default)]
struct Cache {
    outline: Option<Arc<Element>>,
    node: Option<Element>,
    pngs: FxHashMap<u32, Arc<[u8]>>,
}

impl Logo {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn template(&self) -> &Element {
        &self.template
    }

    /// The template, label still set in text, as a standalone document.
    pub fn template_svg(&self) -> String {
        self.template.to_xml_document()
    }

    /// The template with its label replaced by outlined paths.
    pub async fn outline(&self) -> Result<Arc<Element>> {
        let mut cache = self.cache.lock().await;
        self.cached_outline(&mut cache).await
    }

    async fn cached_outline(&self, cache: &mut Cache) -> Result<Arc<Element>> {
        if let Some(outline) = &cache.outline {
            return Ok(outline.clone());
        }

        let outline = Arc::new(self.generate_outline().await?);
        cache.outline = Some(outline.clone());
        Ok(outline)
    }

    pub async fn svg_document(&self) -> Result<String> {
        Ok(self.outline().await?.to_xml_document())
    }

    pub async fn svg_data_uri(&self) -> Result<String> {
        Ok(data_uri("image/svg+xml", self.svg_document().await?.as_bytes()))
    }

    /// The outlined logo wrapped for embedding in a page. Every call returns
    /// a fresh copy.
    pub async fn node(&self) -> Result<Element> {
        let mut cache = self.cache.lock().await;
        if let Some(node) = &cache.node {
            return Ok(node.clone());
        }

        let outline = self.cached_outline(&mut cache).await?;
        let node = Element::new("span").class("logo").child((*outline).clone());
        cache.node = Some(node.clone());
        Ok(node)
    }

    /// The logo rendered as a `size` by `size` PNG.
    pub async fn png(&self, size: u32) -> Result<Arc<[u8]>> {
        let mut cache = self.cache.lock().await;
        if let Some(png) = cache.pngs.get(&size) {
            return Ok(png.clone());
        }

        let png: Arc<[u8]> = self.generate_png(size).await?.into();
        cache.pngs.insert(size, png.clone());
        Ok(png)
    }

    pub async fn png_data_uri(&self, size: u32) -> Result<String> {
        Ok(data_uri("image/png", &self.png(size).await?))
    }

    async fn write_template(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.svg", self.key));
        tokio::fs::write(&path, self.template_svg()).await.chain_with(|| error! {
            "failed to write logo template",
            "path" => path.display(),
        })?;

        Ok(path)
    }

    async fn generate_outline(&self) -> Result<Element> {
        tracing::debug!(logo = %self.key, "outlining logo text");
        let dir = scratch_dir()?;
        let input = self.write_template(dir.path()).await?;
        let output = dir.path().join(format!("{}-outline.svg", self.key));
        self.tools.rasterizer.outline(&input, &output).await.chain_with(|| error! {
            "failed to outline logo text",
            "logo" => self.key,
        })?;

        let outlined = tokio::fs::read_to_string(&output).await.chain_with(|| error! {
            "vector tool did not write an outlined document",
            "path" => output.display(),
        })?;

        outline_template(&self.template, &self.key, &outlined)
    }

    async fn generate_png(&self, size: u32) -> Result<Vec<u8>> {
        tracing::debug!(logo = %self.key, size, "rasterizing logo");
        let dir = scratch_dir()?;
        let input = self.write_template(dir.path()).await?;
        let output = dir.path().join(format!("{}-{size}.png", self.key));
        self.tools.rasterizer.rasterize(&input, size, &output).await.chain_with(|| error! {
            "failed to rasterize logo",
            "logo" => self.key,
            "size" => size,
        })?;

        if let Some(optimizer) = &self.tools.optimizer {
            optimizer.optimize(&output).await?;
        }

        tokio::fs::read(&output).await.chain_with(|| error! {
            "vector tool did not write a PNG",
            "path" => output.display(),
        })
    }
}

fn scratch_dir() -> Result<tempfile::TempDir> {
    tempfile::Builder::new()
        .prefix("magpie-logo-")
        .tempdir()
        .chain_with(|| "failed to create a temporary directory")
}

fn local_name(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}

/// Builds the logo's template document.
fn template(key: &str, text: &str, style: &LogoStyle) -> Result<Element> {
    let Layout { font_size, text_y } = layout_for(text);
    let LogoStyle { brand_color, font_family, .. } = style;
    let label = Node::text(text);
    let svg = format!(r##"<svg
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
    xmlns:svg="http://www.w3.org/2000/svg"
    xmlns="http://www.w3.org/2000/svg"
    viewBox="0 0 2000 2000"
    id="{key}-logo"
    version="1.1"
    width="100%"
    height="100%">
    <defs>
        <style type="text/css">
<![CDATA[
@font-face {{
    font-family: '{font_family}';
    src: url('./font-asap/Asap-Bold-webfont.woff') format('woff'),
         url('./font-asap/Asap-Bold-webfont.ttf') format('truetype');
    font-weight: bold;
    font-style: normal;
}}
]]>
        </style>
    </defs>
    <g>
        <rect
            x="0"
            y="0"
            width="2000"
            height="2000"
            style="fill:{brand_color}" />
        <polygon
            points="0,0 185,0 1495,2000 0,2000"
            style="fill:#ffffff;fill-opacity:0.2" />
        <g
            transform="translate(1000,{text_y})">
            <text
                id="{key}-logo-text"
                font-family="{font_family}"
                font-size="{font_size}"
                font-weight="bold"
                text-anchor="middle"
                style="fill:#fff">
                <tspan>{label}</tspan>
            </text>
        </g>
    </g>
</svg>
"##);

    parse_element(&svg).chain_with(|| error!("invalid logo template", "logo" => key))
}

/// Replaces the template's text label with the paths the vector tool
/// produced for it in `outlined`, drops style definitions, and writes every
/// empty element with an explicit closing tag.
fn outline_template(template: &Element, key: &str, outlined: &str) -> Result<Element> {
    let outlined = parse_element(outlined)?;
    let find_g = |e: &Element| e.elements().find(|c| local_name(&c.name) == "g").cloned();
    let paths: Vec<String> = find_g(&outlined)
        .and_then(|g| find_g(&g))
        .and_then(|g| find_g(&g))
        .map(|g| g.elements()
            .filter(|e| local_name(&e.name) == "path")
            .filter_map(|e| e.attr("d").map(String::from))
            .collect())
        .unwrap_or_default();

    ensure!(!paths.is_empty(), "vector tool produced no outlined text paths", "logo" => key);

    let text_id = format!("{key}-logo-text");
    let mut svg = template.clone();
    svg.splice(&mut |e| {
        if local_name(&e.name) == "defs" {
            return Some(vec![]);
        }

        if e.attr("id") == Some(text_id.as_str()) {
            return Some(paths.iter().map(|d| Node::Element(Element {
                name: "path".into(),
                attrs: vec![
                    Attr { name: "style".into(), value: "fill:#ffffff".into() },
                    Attr { name: "d".into(), value: d.clone() },
                ],
                ..Element::default()
            })).collect());
        }

        None
    });

    svg.walk_mut(&mut |e| {
        if e.children.is_empty() {
            e.self_closing = false;
        }
    });

    Ok(svg)
}
