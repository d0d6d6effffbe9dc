// src/repository/source.rs

//! Where a configured repository lives

use std::fmt;

/// Default OBS download server
pub const DEFAULT_BASE_URL: &str = "https://download.opensuse.org/repositories";

/// A named remote RPM repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySource {
    name: String,
    url: String,
}

impl RepositorySource {
    /// An OBS project repository, e.g. `systemsmanagement:Uyuni:Master` / `openSUSE_Leap_15.5`
    ///
    /// OBS publishes project `a:b:c` under the directory `a:/b:/c`.
    pub fn obs(name: impl Into<String>, base_url: &str, project: &str, repository: &str) -> Self {
        Self {
            name: name.into(),
            url: format!(
                "{}/{}/{}",
                base_url.trim_end_matches('/'),
                project.replace(':', ":/"),
                repository.trim_matches('/')
            ),
        }
    }

    /// A repository at an arbitrary URL
    pub fn custom(name: impl Into<String>, url: &str) -> Self {
        Self {
            name: name.into(),
            url: url.trim_end_matches('/').to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Absolute URL of a repository-relative path
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

impl fmt::Display for RepositorySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.url)
    }
}
