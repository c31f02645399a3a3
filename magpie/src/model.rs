use std::fmt;

use serde::{Deserialize, Serialize};

/// A repository as reported by the hosting service, plus the documents
/// fetched alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RepositoryRecord {
    pub owner_name: String,
    pub full_name: String,
    pub name: String,
    pub description: Option<String>,
    pub html_url: String,
    pub clone_url: String,
    pub git_url: String,
    pub ssh_url: String,
    pub readme_markdown: Option<String>,
    pub readme_html: Option<String>,
    pub license_text: Option<String>,
    pub license_name: Option<String>,
}

/// Locally curated metadata layered over a repository with the same name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProjectOverride {
    pub name: String,
    pub logo_text: Option<String>,
    #[serde(alias = "DotNetPlatforms")]
    pub platforms: Option<Vec<String>>,
    #[serde(alias = "NugetPackages")]
    pub packages: Option<Vec<String>>,
    pub development_status: Option<DevelopmentStatus>,
    pub recommended: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevelopmentStatus {
    Planning,
    Alpha,
    Beta,
    Stable,
    Mature,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Project {
    pub extra: Option<ProjectOverride>,
    #[serde(rename = "GitHub")]
    pub repository: RepositoryRecord,
}

/// The full, ordered list of projects a site is rendered from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SiteData {
    pub projects: Vec<Project>,
}

/// Whose logo is being drawn: the organization's own or a project's.
#[derive(Debug, Clone, Copy)]
pub enum LogoSubject<'a> {
    Organization,
    Project(&'a Project),
}

impl Project {
    pub fn name(&self) -> &str {
        &self.repository.name
    }

    /// The URL path segment and logo key suffix: the lower-cased name.
    pub fn slug(&self) -> String {
        self.repository.name.to_lowercase()
    }

    pub fn description(&self) -> &str {
        self.repository.description.as_deref().unwrap_or_default()
    }

    pub fn recommended(&self) -> Option<bool> {
        self.extra.as_ref().and_then(|e| e.recommended)
    }

    pub fn logo_text(&self) -> Option<&str> {
        self.extra.as_ref().and_then(|e| e.logo_text.as_deref())
    }

    pub fn platforms(&self) -> &[String] {
        self.extra.as_ref().and_then(|e| e.platforms.as_deref()).unwrap_or_default()
    }

    pub fn packages(&self) -> &[String] {
        self.extra.as_ref().and_then(|e| e.packages.as_deref()).unwrap_or_default()
    }

    pub fn development_status(&self) -> Option<DevelopmentStatus> {
        self.extra.as_ref().and_then(|e| e.development_status)
    }
}

impl fmt::Display for DevelopmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl<'a> From<&'a Project> for LogoSubject<'a> {
    fn from(project: &'a Project) -> Self {
        LogoSubject::Project(project)
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;

    pub fn record(name: &str, description: Option<&str>) -> RepositoryRecord {
        let html_url = format!("https://github.com/Nerven/{name}");
        RepositoryRecord {
            owner_name: "Nerven".into(),
            full_name: format!("Nerven/{name}"),
            name: name.into(),
            description: description.map(Into::into),
            clone_url: format!("{html_url}.git"),
            git_url: format!("git://github.com/Nerven/{name}.git"),
            ssh_url: format!("git@github.com:Nerven/{name}.git"),
            html_url,
            readme_markdown: None,
            readme_html: None,
            license_text: None,
            license_name: None,
        }
    }

    pub fn project(name: &str, extra: Option<ProjectOverride>) -> Project {
        Project { extra, repository: record(name, Some(&format!("about {name}"))) }
    }

    pub fn with_logo_text(name: &str, text: &str) -> ProjectOverride {
        ProjectOverride {
            name: name.into(),
            logo_text: Some(text.into()),
            ..ProjectOverride::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_accept_legacy_field_names() {
        let json = r#"{
            "Name": "Assertion",
            "DotNetPlatforms": [".NET Standard 1.0"],
            "NugetPackages": ["Nerven.Assertion"],
            "DevelopmentStatus": "Beta",
            "Recommended": false
        }"#;

        let extra: ProjectOverride = serde_json::from_str(json).unwrap();
        assert_eq!(extra.platforms.as_deref(), Some(&[".NET Standard 1.0".to_string()][..]));
        assert_eq!(extra.packages.unwrap(), ["Nerven.Assertion"]);
        assert_eq!(extra.development_status, Some(DevelopmentStatus::Beta));
        assert_eq!(extra.logo_text, None);
        assert_eq!(DevelopmentStatus::Beta.to_string(), "Beta");
    }

    #[test]
    fn accessors_default_without_override() {
        let project = fixtures::project("Htmler", None);
        assert_eq!(project.slug(), "htmler");
        assert_eq!(project.recommended(), None);
        assert!(project.platforms().is_empty());
        assert!(project.packages().is_empty());
    }
}
