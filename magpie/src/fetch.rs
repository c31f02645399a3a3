use async_trait::async_trait;
use futures::future::try_join_all;
use http::header::{HeaderMap, HeaderValue, ACCEPT};
use http::StatusCode;
use octocrab::models::repos::Content;
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;

use perch::error::{Chainable, Error, Result};
use perch::{err, error};

use crate::model::RepositoryRecord;

const GITHUB_API: &str = "https://api.github.com";
const HTML_MEDIA_TYPE: &str = "application/vnd.github.html";
const LICENSE_FILE: &str = "LICENSE.txt";
const MIT_PREFIX: &str = "\u{FEFF}The MIT License (MIT)\n";

/// A repository from the organization listing, before its documents are
/// fetched.
#[derive(Debug, Clone)]
pub struct Listing {
    pub record: RepositoryRecord,
    pub private: bool,
}

/// Where repository data comes from. Each per-repository lookup returns
/// `Ok(None)` when the document does not exist.
#[async_trait]
pub trait RepositorySource: Send + Sync {
    async fn list_repositories(&self) -> Result<Vec<Listing>>;

    async fn readme(&self, repo: &RepositoryRecord) -> Result<Option<String>>;

    async fn readme_html(&self, repo: &RepositoryRecord) -> Result<Option<String>>;

    async fn license(&self, repo: &RepositoryRecord) -> Result<Option<String>>;
}

/// Lists the organization's public repositories and fetches their README
/// and license documents concurrently. Repositories without a description
/// are dropped; the rest are sorted by name.
pub async fn fetch_repositories(source: &dyn RepositorySource) -> Result<Vec<RepositoryRecord>> {
    let listings = source.list_repositories().await?;
    tracing::info!(count = listings.len(), "listed repositories");

    let public = listings.into_iter().filter(|listing| !listing.private);
    let fetched = try_join_all(public.map(|Listing { mut record, .. }| async move {
        let (readme, readme_html, license) = futures::try_join!(
            source.readme(&record),
            source.readme_html(&record),
            source.license(&record),
        )?;

        tracing::debug!(
            repository = %record.full_name,
            readme = readme.is_some(),
            license = license.is_some(),
            "fetched repository documents"
        );

        record.license_name = license.as_deref().and_then(classify_license).map(Into::into);
        record.readme_markdown = readme;
        record.readme_html = readme_html;
        record.license_text = license;
        Ok::<_, Error>(record)
    })).await?;

    let mut records: Vec<_> = fetched.into_iter()
        .filter(|record| record.description.is_some())
        .collect();

    records.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(records)
}

/// Names the license whose text starts with a known preamble. Only the
/// exact MIT preamble, byte order mark included, is recognized.
pub fn classify_license(text: &str) -> Option<&'static str> {
    text.starts_with(MIT_PREFIX).then_some("MIT License")
}

/// The GitHub REST API, read with a personal access token.
pub struct GitHub {
    client: Octocrab,
    organization: String,
}

impl GitHub {
    pub fn new(token: &str, organization: &str) -> Result<Self> {
        GitHub::with_base_uri(GITHUB_API, token, organization)
    }

    /// A client for the API served at `base_uri`. Failed requests are not
    /// retried.
    pub fn with_base_uri(base_uri: &str, token: &str, organization: &str) -> Result<Self> {
        let fail = |e: octocrab::Error| Error::from_std(e).chain(error! {
            "failed to create GitHub client",
            "base URI" => base_uri,
        });

        let mut builder = Octocrab::builder();
        builder.add_retry_config(RetryConfig::None);
        let client = builder
            .base_uri(base_uri)
            .map_err(fail)?
            .personal_token(token.to_string())
            .build()
            .map_err(fail)?;

        Ok(GitHub { client, organization: organization.into() })
    }

    /// Fetches a document of `repo`. Any 404 means the document is absent,
    /// whatever message GitHub gives with it. Other failures are errors.
    async fn document(
        &self,
        repo: &RepositoryRecord,
        what: &str,
        path: &str,
        accept: Option<&'static str>,
    ) -> Result<Option<String>> {
        let route = format!("/repos/{}/{}/{path}", repo.owner_name, repo.name);
        let headers = accept.map(|accept| {
            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT, HeaderValue::from_static(accept));
            headers
        });

        let fail = |e: octocrab::Error| Error::from_std(e).chain(error! {
            format!("failed to fetch {what}"),
            "repository" => repo.full_name,
        });

        let response = self.client._get_with_headers(route, headers).await.map_err(fail)?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            tracing::debug!(repository = %repo.full_name, what, "document not found");
            return Ok(None);
        }

        let body = self.client.body_to_string(response).await.map_err(fail)?;
        if !status.is_success() {
            return err! {
                format!("failed to fetch {what}"),
                "repository" => repo.full_name,
                "status" => status,
                "response" => body,
            };
        }

        Ok(Some(body))
    }

    /// Fetches a document through the contents API and decodes its text.
    async fn contents(&self, repo: &RepositoryRecord, what: &str, path: &str) -> Result<Option<String>> {
        let Some(body) = self.document(repo, what, path, None).await? else {
            return Ok(None);
        };

        let content: Content = serde_json::from_str(&body)
            .map_err(|e| Error::from(e).chain(error! {
                format!("malformed {what} contents"),
                "repository" => repo.full_name,
            }))?;

        Ok(content.decoded_content())
    }
}

#[async_trait]
impl RepositorySource for GitHub {
    async fn list_repositories(&self) -> Result<Vec<Listing>> {
        let fail = |e: octocrab::Error| Error::from_std(e).chain(error! {
            "failed to list organization repositories",
            "organization" => self.organization,
        });

        let first = self.client.orgs(&self.organization)
            .list_repos()
            .per_page(100)
            .send()
            .await
            .map_err(fail)?;

        let repositories = self.client.all_pages(first).await.map_err(fail)?;
        let listings = repositories.into_iter().map(|repo| {
            let owner_name = repo.owner.map(|owner| owner.login).unwrap_or_default();
            let full_name = repo.full_name.unwrap_or_else(|| format!("{owner_name}/{}", repo.name));
            Listing {
                private: repo.private.unwrap_or(false),
                record: RepositoryRecord {
                    owner_name,
                    full_name,
                    name: repo.name,
                    description: repo.description,
                    html_url: repo.html_url.map(String::from).unwrap_or_default(),
                    clone_url: repo.clone_url.map(String::from).unwrap_or_default(),
                    git_url: repo.git_url.map(String::from).unwrap_or_default(),
                    ssh_url: repo.ssh_url.unwrap_or_default(),
                    readme_markdown: None,
                    readme_html: None,
                    license_text: None,
                    license_name: None,
                },
            }
        });

        Ok(listings.collect())
    }

    async fn readme(&self, repo: &RepositoryRecord) -> Result<Option<String>> {
        self.contents(repo, "README", "readme").await
    }

    async fn readme_html(&self, repo: &RepositoryRecord) -> Result<Option<String>> {
        self.document(repo, "rendered README", "readme", Some(HTML_MEDIA_TYPE)).await
    }

    async fn license(&self, repo: &RepositoryRecord) -> Result<Option<String>> {
        let path = format!("contents/{LICENSE_FILE}");
        self.contents(repo, LICENSE_FILE, &path).await
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeSource;
    use super::*;
    use crate::model::fixtures::record;

    #[test]
    fn classifies_only_the_exact_mit_preamble() {
        assert_eq!(classify_license("\u{FEFF}The MIT License (MIT)\n\nCopyright"), Some("MIT License"));
        assert_eq!(classify_license("The MIT License (MIT)\n"), None);
        assert_eq!(classify_license("\u{FEFF}The MIT License (MIT)\r\n"), None);
        assert_eq!(classify_license("Apache License"), None);
    }

    #[tokio::test]
    async fn filters_fetches_and_sorts() {
        let mut source = FakeSource::default()
            .public(record("beta-tool", Some("desc B")))
            .public(record("Undescribed", None))
            .private(record("Secret", Some("hidden")))
            .public(record("Alpha", Some("desc A")))
            .public(record("Zeta", Some("desc Z")));

        source.readmes.insert("Alpha".into(), "# Alpha".into());
        source.licenses.insert("Alpha".into(), format!("{MIT_PREFIX}\nCopyright (c) Nerven"));

        let records = fetch_repositories(&source).await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["Alpha", "Zeta", "beta-tool"]);

        let alpha = &records[0];
        assert_eq!(alpha.readme_markdown.as_deref(), Some("# Alpha"));
        assert_eq!(alpha.readme_html.as_deref(), Some("<div><p># Alpha</p></div>"));
        assert_eq!(alpha.license_name.as_deref(), Some("MIT License"));
        assert!(records[2].readme_html.is_none());
        assert!(records[2].license_name.is_none());
    }

    /// Serves every request on a local port with the same status and JSON
    /// body. Returns the base URI to point a client at.
    async fn serve(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let response = format!(
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );

                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        format!("http://{address}")
    }

    #[tokio::test]
    async fn any_not_found_is_an_absent_document() {
        let base = serve("404 Not Found", r#"{"message":"This repository is empty."}"#).await;
        let github = GitHub::with_base_uri(&base, "token", "Nerven").unwrap();
        let empty = record("Empty", Some("nothing yet"));

        assert_eq!(github.readme(&empty).await.unwrap(), None);
        assert_eq!(github.readme_html(&empty).await.unwrap(), None);
        assert_eq!(github.license(&empty).await.unwrap(), None);
    }

    #[tokio::test]
    async fn contents_are_decoded() {
        let body = r#"{
            "name": "LICENSE.txt", "path": "LICENSE.txt", "sha": "3b18e51", "size": 7,
            "url": "https://api.github.com/repos/Nerven/Alpha/contents/LICENSE.txt",
            "type": "file", "encoding": "base64", "content": "IyBB\nbHBoYQ==\n",
            "_links": { "self": "https://api.github.com/repos/Nerven/Alpha/contents/LICENSE.txt" }
        }"#;

        let base = serve("200 OK", body).await;
        let github = GitHub::with_base_uri(&base, "token", "Nerven").unwrap();
        let alpha = record("Alpha", Some("desc A"));

        assert_eq!(github.readme(&alpha).await.unwrap().as_deref(), Some("# Alpha"));
        assert_eq!(github.license(&alpha).await.unwrap().as_deref(), Some("# Alpha"));
    }

    #[tokio::test]
    async fn server_errors_abort_the_fetch() {
        let base = serve("500 Internal Server Error", r#"{"message":"Server Error"}"#).await;
        let github = GitHub::with_base_uri(&base, "token", "Nerven").unwrap();
        let alpha = record("Alpha", Some("desc A"));

        let error = github.readme(&alpha).await.unwrap_err();
        assert_eq!(error.message(), "failed to fetch README");
        let error = github.license(&alpha).await.unwrap_err();
        assert_eq!(error.message(), "failed to fetch LICENSE.txt");
        assert!(github.readme_html(&alpha).await.is_err());
        assert!(fetch_repositories(&github).await.is_err());
    }

    #[tokio::test]
    async fn lookup_failures_abort_the_fetch() {
        let mut source = FakeSource::default()
            .public(record("Alpha", Some("desc A")))
            .public(record("Broken", Some("desc")));

        source.failing = Some("Broken".into());
        let error = fetch_repositories(&source).await.unwrap_err();
        assert_eq!(error.message(), "service unavailable");
    }
}
