use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use perch::error::{Chainable, Error, Result};
use perch::format::{Format, Toml};
use perch::url::{Url, UrlBuf};
use perch::{ensure, err, error};

pub const SETTINGS_FILE: &str = "magpie.toml";
pub const RESOURCES_DIR: &str = "resources";
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

pub mod flags {
    use std::path::PathBuf;

    xflags::xflags! {
        /// Generate a showcase site for an organization's repositories.
        cmd magpie {
            /// Directory the site is written to.
            required output: PathBuf
            /// Prefix of every absolute link in the site.
            optional --base-uri base_uri: String
            /// GitHub access token. Defaults to `$GITHUB_TOKEN`.
            optional --token token: String
            /// JSON file with curated project metadata.
            optional --metadata metadata: PathBuf
            /// Write the fetched project data to this file.
            optional --cache-to cache_to: PathBuf
            /// Read project data from this file instead of fetching it.
            optional --cache-from cache_from: PathBuf
            /// Program run on every generated PNG.
            optional --png-optimizer png_optimizer: PathBuf
            /// Inkscape executable.
            optional --rasterizer rasterizer: PathBuf
            /// Directory copied into the site's `assets/`.
            optional --resources resources: PathBuf
            /// TOML settings file. Defaults to `magpie.toml` if present.
            optional --config config: PathBuf
            /// Empty the output directory first, keeping `.git`.
            optional --clear
            /// Commit the output directory if anything changed.
            optional --commit
            /// Author of the commit.
            optional --author author: String
            /// Push after committing.
            optional --push
        }
    }
}

/// Site-wide settings, read from TOML. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// The GitHub organization and the name shown across the site.
    pub organization: String,
    pub author_name: String,
    pub author_url: String,
    pub generator_name: String,
    pub generator_url: String,
    pub brand_color: String,
    pub logo_font: String,
    pub png_sizes: Vec<u32>,
    pub platform_label: String,
    pub package_label: String,
    /// Shown before a package name as the install command.
    pub package_install: String,
    /// Package page, with `{}` standing for the package name.
    pub package_url: String,
    pub commit_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            organization: "Nerven".into(),
            author_name: "Victor Blomberg".into(),
            author_url: "http://victorblomberg.se/en/".into(),
            generator_name: "Nerven.Self".into(),
            generator_url: "https://github.com/Nerven/Self/".into(),
            brand_color: "#248400".into(),
            logo_font: "Asap".into(),
            png_sizes: vec![16, 32, 48, 256, 512, 4096],
            platform_label: ".NET platform".into(),
            package_label: "NuGet".into(),
            package_install: "Install-Package ".into(),
            package_url: "https://www.nuget.org/packages/{}/".into(),
            commit_prefix: "nerven.se".into(),
        }
    }
}

impl Settings {
    pub fn package_url(&self, package: &str) -> String {
        self.package_url.replace("{}", package)
    }
}

/// Where project data comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Cache(PathBuf),
    GitHub { token: String },
}

/// Everything a run needs, resolved from flags, environment and settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub output: PathBuf,
    pub base_uri: UrlBuf,
    pub source: DataSource,
    pub metadata: Option<PathBuf>,
    pub cache_to: Option<PathBuf>,
    pub rasterizer: PathBuf,
    pub png_optimizer: Option<PathBuf>,
    pub resources: Option<PathBuf>,
    pub clear: bool,
    pub commit: bool,
    pub author: Option<String>,
    pub push: bool,
    pub settings: Settings,
}

impl Config {
    /// Resolves command-line flags, with `env_token` standing in for a
    /// missing `--token`.
    pub fn from_flags(flags: flags::Magpie, env_token: Option<String>) -> Result<Config> {
        let settings = match &flags.config {
            Some(path) => Toml::read(path)?,
            None if Path::new(SETTINGS_FILE).is_file() => Toml::read(Path::new(SETTINGS_FILE))?,
            None => Settings::default(),
        };

        ensure!(!settings.organization.is_empty(), "the organization name must not be empty");

        let source = match (flags.cache_from, flags.token.or(env_token)) {
            (Some(cache), _) => DataSource::Cache(cache),
            (None, Some(token)) if !token.is_empty() => DataSource::GitHub { token },
            (None, _) => return err! {
                "a GitHub token is required to fetch repositories",
                "hint" => format!("pass --token, set ${TOKEN_VAR}, or read a cache with --cache-from"),
            },
        };

        let base_uri = flags.base_uri.as_deref().unwrap_or_default().trim_end_matches('/');
        let base_uri = match Url::try_new(base_uri) {
            Some(url) => url.to_url_buf(),
            None => return err!("the base URI contains invalid characters", "base URI" => base_uri),
        };

        let resources = match flags.resources {
            Some(dir) if dir.is_dir() => Some(dir),
            Some(dir) => return err! {
                "the resources directory does not exist",
                "path" => dir.display(),
            },
            None => Some(PathBuf::from(RESOURCES_DIR)).filter(|dir| dir.is_dir()),
        };

        ensure!(!flags.push || flags.commit, "--push requires --commit");

        Ok(Config {
            output: flags.output,
            base_uri,
            source,
            metadata: flags.metadata,
            cache_to: flags.cache_to,
            rasterizer: flags.rasterizer.unwrap_or_else(|| "inkscape".into()),
            png_optimizer: flags.png_optimizer,
            resources,
            clear: flags.clear,
            commit: flags.commit,
            author: flags.author.filter(|author| !author.is_empty()),
            push: flags.push,
            settings,
        })
    }

    /// Parses the process's arguments and environment.
    pub fn from_env() -> Result<Config> {
        let flags = flags::Magpie::from_env()
            .map_err(|e| Error::from_std(e).chain(error!("invalid command line")))?;

        Config::from_flags(flags, std::env::var(TOKEN_VAR).ok())
            .chain_with(|| "invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;

    use super::*;

    fn flags(args: &[&str]) -> flags::Magpie {
        flags::Magpie::from_vec(args.iter().map(OsString::from).collect()).unwrap()
    }

    #[test]
    fn parses_every_flag() {
        let flags = flags(&[
            "out", "--base-uri", "https://nerven.se/", "--token", "t0k",
            "--metadata", "extra.json", "--cache-to", "cache.json",
            "--png-optimizer", "optipng", "--rasterizer", "/opt/inkscape",
            "--clear", "--commit", "--author", "Bot <bot@nerven.se>", "--push",
        ]);

        let config = Config::from_flags(flags, None).unwrap();
        assert_eq!(config.output, Path::new("out"));
        assert_eq!(config.base_uri.as_str(), "https://nerven.se");
        assert_eq!(config.source, DataSource::GitHub { token: "t0k".into() });
        assert_eq!(config.metadata.as_deref(), Some(Path::new("extra.json")));
        assert_eq!(config.cache_to.as_deref(), Some(Path::new("cache.json")));
        assert_eq!(config.rasterizer, Path::new("/opt/inkscape"));
        assert_eq!(config.png_optimizer.as_deref(), Some(Path::new("optipng")));
        assert!(config.clear && config.commit && config.push);
        assert_eq!(config.author.as_deref(), Some("Bot <bot@nerven.se>"));
        assert_eq!(config.settings, Settings::default());
    }

    #[test]
    fn token_falls_back_to_environment_and_cache() {
        let config = Config::from_flags(flags(&["out"]), Some("env".into())).unwrap();
        assert_eq!(config.source, DataSource::GitHub { token: "env".into() });
        assert_eq!(config.base_uri.as_str(), "");
        assert_eq!(config.rasterizer, Path::new("inkscape"));

        let config = Config::from_flags(flags(&["out", "--cache-from", "c.json"]), None).unwrap();
        assert_eq!(config.source, DataSource::Cache("c.json".into()));

        let error = Config::from_flags(flags(&["out"]), None).unwrap_err();
        assert_eq!(error.message(), "a GitHub token is required to fetch repositories");
    }

    #[test]
    fn explicit_resources_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let args = ["out", "--token", "t", "--resources", missing.to_str().unwrap()];
        assert!(Config::from_flags(flags(&args), None).is_err());

        let args = ["out", "--token", "t", "--resources", dir.path().to_str().unwrap()];
        let config = Config::from_flags(flags(&args), None).unwrap();
        assert_eq!(config.resources.as_deref(), Some(dir.path()));
    }

    #[test]
    fn push_requires_commit() {
        assert!(Config::from_flags(flags(&["out", "--token", "t", "--push"]), None).is_err());
    }

    #[test]
    fn reads_partial_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("site.toml");
        std::fs::write(&path, "organization = \"Acme\"\npng_sizes = [16, 64]\n").unwrap();

        let args = ["out", "--token", "t", "--config", path.to_str().unwrap()];
        let settings = Config::from_flags(flags(&args), None).unwrap().settings;
        assert_eq!(settings.organization, "Acme");
        assert_eq!(settings.png_sizes, [16, 64]);
        assert_eq!(settings.brand_color, "#248400");
        assert_eq!(settings.package_url("Acme.Core"), "https://www.nuget.org/packages/Acme.Core/");
    }
}
