//! Committing and pushing the generated site.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use perch::command::Command;
use perch::error::{Chainable, Result};
use perch::util::is_blank;
use perch::error;

/// A version control system operating on the output directory.
#[async_trait]
pub trait Vcs: Send + Sync {
    /// Runs one command and returns its standard output.
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>>;
}

/// The `git` executable, run inside a working tree.
#[derive(Debug, Clone)]
pub struct Git {
    dir: PathBuf,
}

impl Git {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Git { dir: dir.into() }
    }
}

#[async_trait]
impl Vcs for Git {
    async fn run(&self, args: &[&str]) -> Result<Vec<u8>> {
        Command::new("git")
            .args(args)
            .current_dir(&self.dir)
            .output()
            .await
            .chain_with(|| error!("git command failed", "working tree" => self.dir.display()))
    }
}

#[derive(Debug, Clone, Default)]
pub struct PublishOptions<'a> {
    pub commit: bool,
    pub push: bool,
    pub author: Option<&'a str>,
    /// Starts every commit message.
    pub message_prefix: &'a str,
}

/// What [`publish`] ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Published {
    Skipped,
    Unchanged,
    Committed,
    Pushed,
}

pub fn commit_message(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{prefix} regenerated {}", now.format("%Y-%m-%d %H:%M:%SZ"))
}

/// Stages everything, then commits and optionally pushes if the working
/// tree changed.
pub async fn publish(vcs: &dyn Vcs, options: &PublishOptions<'_>, now: DateTime<Utc>) -> Result<Published> {
    if !options.commit {
        return Ok(Published::Skipped);
    }

    vcs.run(&["add", "."]).await?;
    let status = vcs.run(&["status", "--porcelain"]).await?;
    if is_blank(&status) {
        tracing::info!("site unchanged, nothing to commit");
        return Ok(Published::Unchanged);
    }

    let message = commit_message(options.message_prefix, now);
    let author = options.author.map(|author| format!("--author={author}"));
    let mut commit = vec!["commit"];
    commit.extend(author.as_deref());
    commit.extend(["-m", message.as_str()]);
    vcs.run(&commit).await?;
    tracing::info!(%message, "committed site");

    if !options.push {
        return Ok(Published::Committed);
    }

    vcs.run(&["push"]).await.chain(error!("failed to push site"))?;
    tracing::info!("pushed site");
    Ok(Published::Pushed)
}
