use std::process::ExitCode;
use std::sync::Arc;

use perch::error::{Error, Result};
use perch::time;

use crate::config::{Config, DataSource};
use crate::dataset::assemble;
use crate::fetch::{fetch_repositories, GitHub};
use crate::logo::{Inkscape, LogoBuilder, LogoStyle, PngOptimizer};
use crate::metadata::MetadataStore;
use crate::model::SiteData;
use crate::publish::{publish, Git, PublishOptions};
use crate::site::SiteBuilder;

mod config;
mod dataset;
mod fetch;
mod logo;
mod metadata;
mod model;
mod page;
mod publish;
mod readme;
mod site;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load(config: &Config) -> Result<SiteData> {
    let token = match &config.source {
        DataSource::Cache(path) => {
            if config.metadata.is_some() {
                tracing::warn!("project metadata is ignored when reading a data cache");
            }

            return SiteData::read_cache(path);
        }
        DataSource::GitHub { token } => token,
    };

    let metadata = match &config.metadata {
        Some(path) => MetadataStore::load(path)?,
        None => MetadataStore::empty(),
    };

    let github = GitHub::new(token, &config.settings.organization)?;
    let records = time!("fetch", fetch_repositories(&github).await?);
    let data = assemble(records, &metadata);
    if let Some(path) = &config.cache_to {
        data.write_cache(path)?;
    }

    Ok(data)
}

async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let data = load(&config).await?;

    if config.clear {
        perch::site::clear_dir(&config.output, &[".git"])?;
    }

    let rasterizer = Arc::new(Inkscape::new(&config.rasterizer));
    let optimizer = config.png_optimizer.as_ref().map(PngOptimizer::new);
    let logos = LogoBuilder::new(LogoStyle::from(&config.settings), rasterizer, optimizer);
    let builder = SiteBuilder::new(&config.settings, &config.base_uri, &logos)?;
    let site = time!("render", builder.build(&data, config.resources.as_deref()).await?);

    let output = config.output.clone();
    let written = tokio::task::spawn_blocking(move || site.write_to(&output))
        .await
        .map_err(Error::from_std)?;

    written?;

    let options = PublishOptions {
        commit: config.commit,
        push: config.push,
        author: config.author.as_deref(),
        message_prefix: &config.settings.commit_prefix,
    };

    let git = Git::new(&config.output);
    let published = time!("publish", publish(&git, &options, chrono::Utc::now()).await?);
    tracing::debug!(?published, "done");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("magpie failed\n{e}");
            ExitCode::FAILURE
        }
    }
}
