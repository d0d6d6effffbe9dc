// src/config.rs

//! YAML configuration
//!
//! ```yaml
//! url: https://download.opensuse.org/repositories   # optional
//! group: suse                                       # optional default group
//! exclude: [javadoc, examples, manual, test, demo]  # optional
//! repositories:
//!   uyuni:
//!     project: systemsmanagement:Uyuni:Master:Other
//!     repository: openSUSE_Leap_15.5
//!   mirror:
//!     url: http://mirror.example.com/java
//! artifacts:
//!   - artifact: commons-lang3
//!     package: apache-commons-lang3
//!     repository: uyuni
//!     group: org.apache.commons
//! ```

use crate::artifact::{ArtifactSpec, DEFAULT_ARCH, DEFAULT_GROUP};
use crate::error::{Error, Result};
use crate::repository::{DEFAULT_BASE_URL, DEFAULT_DENYLIST, RepositorySource};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::warn;

fn default_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

/// Configuration file as written by the user
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_group")]
    pub group: String,
    #[serde(default)]
    pub exclude: Option<Vec<String>>,
    #[serde(default)]
    pub repositories: BTreeMap<String, RepositoryEntry>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactEntry>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositoryEntry {
    pub project: Option<String>,
    pub repository: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArtifactEntry {
    pub artifact: String,
    pub package: Option<String>,
    /// Former name of `package`
    pub rpm: Option<String>,
    pub jar: Option<String>,
    pub arch: Option<String>,
    pub repository: String,
    pub group: Option<String>,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub repositories: BTreeMap<String, RepositorySource>,
    pub artifacts: Vec<ArtifactSpec>,
    pub denylist: Vec<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;
        Self::from_yaml(&content).map_err(|e| match e {
            Error::ConfigError(msg) => Error::ConfigError(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {}", e)))?;
        Self::from_file(file)
    }

    pub fn from_file(file: ConfigFile) -> Result<Self> {
        let mut repositories = BTreeMap::new();
        for (name, entry) in file.repositories {
            let source = match (&entry.url, &entry.project, &entry.repository) {
                (Some(url), _, _) => RepositorySource::custom(&name, url),
                (None, Some(project), Some(repository)) => {
                    RepositorySource::obs(&name, &file.url, project, repository)
                }
                _ => {
                    return Err(Error::ConfigError(format!(
                        "Either 'project' and 'repository' or 'url' must be defined for repository {}",
                        name
                    )));
                }
            };
            repositories.insert(name, source);
        }

        let mut artifacts = Vec::with_capacity(file.artifacts.len());
        for entry in file.artifacts {
            if !repositories.contains_key(&entry.repository) {
                return Err(Error::ConfigError(format!(
                    "Missing repository definition: {}",
                    entry.repository
                )));
            }
            if entry.rpm.is_some() {
                warn!("artifact {}: \"rpm\" property is deprecated, use \"package\"", entry.artifact);
            }

            let spec = ArtifactSpec {
                package: entry
                    .rpm
                    .or(entry.package)
                    .unwrap_or_else(|| entry.artifact.clone()),
                artifact_id: entry.artifact,
                jar: entry.jar,
                arch: entry.arch.unwrap_or_else(|| DEFAULT_ARCH.to_string()),
                group: entry.group.unwrap_or_else(|| file.group.clone()),
                repository: entry.repository,
            };
            spec.package_pattern()?;
            artifacts.push(spec);
        }

        let denylist = file
            .exclude
            .unwrap_or_else(|| DEFAULT_DENYLIST.iter().map(|s| s.to_string()).collect());

        Ok(Self {
            repositories,
            artifacts,
            denylist,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CONFIG: &str = r#"
group: com.suse
repositories:
  uyuni:
    project: systemsmanagement:Uyuni:Master:Other
    repository: openSUSE_Leap_15.5
  mirror:
    url: http://mirror.example.com/java/
artifacts:
  - artifact: commons-lang3
    package: apache-commons-lang3
    repository: uyuni
    group: org.apache.commons
  - artifact: jose4j
    repository: mirror
    arch: x86_64
    jar: jose4j/jose4j.jar
  - artifact: old-style
    rpm: legacy-
    repository: uyuni
"#;

    #[test]
    fn test_parse_config() {
        let config = Config::from_yaml(CONFIG).unwrap();

        assert_eq!(
            config.repositories["uyuni"].url(),
            "https://download.opensuse.org/repositories/systemsmanagement:/Uyuni:/Master:/Other/openSUSE_Leap_15.5"
        );
        assert_eq!(config.repositories["mirror"].url(), "http://mirror.example.com/java");

        let lang = &config.artifacts[0];
        assert_eq!(lang.package, "apache-commons-lang3");
        assert_eq!(lang.group, "org.apache.commons");
        assert_eq!(lang.arch, "noarch");

        let jose = &config.artifacts[1];
        assert_eq!(jose.package, "jose4j");
        assert_eq!(jose.group, "com.suse");
        assert_eq!(jose.arch, "x86_64");
        assert_eq!(jose.jar.as_deref(), Some("jose4j/jose4j.jar"));

        assert_eq!(config.artifacts[2].package, "legacy-");
        assert_eq!(config.denylist.len(), DEFAULT_DENYLIST.len());
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml(
            "repositories:\n  r: {project: p, repository: x}\nartifacts:\n  - {artifact: foo, repository: r}\nexclude: [debug]\n",
        )
        .unwrap();
        assert_eq!(config.artifacts[0].group, "suse");
        assert_eq!(config.denylist, vec!["debug".to_string()]);
        assert_eq!(
            config.repositories["r"].url(),
            "https://download.opensuse.org/repositories/p/x"
        );
    }

    #[test]
    fn test_unknown_repository() {
        let err = Config::from_yaml("artifacts:\n  - {artifact: foo, repository: nope}\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(msg) if msg.contains("nope")));
    }

    #[test]
    fn test_incomplete_repository() {
        let err = Config::from_yaml("repositories:\n  r: {project: p}\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }

    #[test]
    fn test_missing_file() {
        let temp = TempDir::new().unwrap();
        let err = Config::load(&temp.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)));
    }
}
