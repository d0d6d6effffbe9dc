// src/packages/jar.rs

//! Choosing the jar to publish from a package file list

use crate::error::{Error, Result};
use crate::packages::extract::ArchiveEntry;
use regex::Regex;

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::ConfigError(format!("Invalid jar pattern '{}': {}", pattern, e)))
}

/// Pick the jar entry of `artifact_id` among the package's files
///
/// Symbolic links are never chosen. When the package ships a single jar it
/// is taken as is. Otherwise the jars are narrowed with `jar`, a regular
/// expression over the file name, defaulting to the artifact id.
pub fn select_jar<'a>(
    entries: &'a [ArchiveEntry],
    artifact_id: &str,
    jar: Option<&str>,
    package: &str,
) -> Result<&'a ArchiveEntry> {
    let loose = compile(r"^/usr/.*/[^/]*\.jar$")?;
    let jars: Vec<&ArchiveEntry> = entries
        .iter()
        .filter(|e| !e.is_link() && loose.is_match(&e.path))
        .collect();

    match jars.as_slice() {
        [] => return Err(Error::NotFoundError(format!("Found no jar to extract in {}", package))),
        [only] => return Ok(only),
        _ => {}
    }

    let pattern = match jar {
        Some(jar) => jar.to_string(),
        None => regex::escape(artifact_id),
    };
    let suffix = match jar {
        Some(jar) if jar.ends_with(".jar") => "",
        _ => r"[^/]*\.jar",
    };
    let narrow = compile(&format!("^/usr/.*/{}{}$", pattern, suffix))?;

    let selected: Vec<&ArchiveEntry> = jars.into_iter().filter(|e| narrow.is_match(&e.path)).collect();
    match selected.as_slice() {
        [] => Err(Error::NotFoundError(format!(
            "Found no jar matching {} in {}",
            pattern, package
        ))),
        [only] => Ok(only),
        _ => Err(Error::AmbiguousMatch {
            what: format!("Found several jars to extract in {}", package),
            candidates: selected.iter().map(|e| e.path.clone()).collect(),
        }),
    }
}

/// Version embedded in a jar file name such as `foo-1.2.3.jar`
pub fn jar_version(artifact_id: &str, entry: &str) -> Option<String> {
    let file_name = entry.rsplit('/').next().unwrap_or(entry);
    let pattern = format!(r"{}-([0-9.]+)\.jar", regex::escape(artifact_id));
    let regex = Regex::new(&pattern).ok()?;
    regex
        .captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim_end_matches('.').to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_jar_is_taken() {
        let entries = vec![
            ArchiveEntry::file("/usr/share/java/whatever-1.0.jar"),
            ArchiveEntry::file("/usr/share/doc/packages/foo/README"),
        ];
        let jar = select_jar(&entries, "foo", None, "foo.rpm").unwrap();
        assert_eq!(jar.path, "/usr/share/java/whatever-1.0.jar");
    }

    #[test]
    fn test_symlinks_are_never_selected() {
        let entries = vec![
            ArchiveEntry::file("/usr/share/java/foo/foo-1.2.3.jar"),
            ArchiveEntry::link("/usr/share/java/foo.jar", "foo/foo-1.2.3.jar"),
            ArchiveEntry::link("/usr/share/java/foo-core.jar", "foo/foo-1.2.3.jar"),
        ];
        let jar = select_jar(&entries, "foo", None, "foo.rpm").unwrap();
        assert_eq!(jar.path, "/usr/share/java/foo/foo-1.2.3.jar");
    }

    #[test]
    fn test_narrowing_by_artifact_id() {
        let entries = vec![
            ArchiveEntry::file("/usr/share/java/log4j/log4j-api.jar"),
            ArchiveEntry::file("/usr/share/java/log4j/log4j-core.jar"),
        ];
        let jar = select_jar(&entries, "log4j-core", None, "log4j.rpm").unwrap();
        assert_eq!(jar.path, "/usr/share/java/log4j/log4j-core.jar");

        let err = select_jar(&entries, "log4j", None, "log4j.rpm").unwrap_err();
        match err {
            Error::AmbiguousMatch { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected error {}", other),
        }
    }

    #[test]
    fn test_configured_jar_pattern() {
        let entries = vec![
            ArchiveEntry::file("/usr/share/java/jetty/jetty-util.jar"),
            ArchiveEntry::file("/usr/share/java/jetty/jetty-util-ajax.jar"),
        ];
        let jar = select_jar(&entries, "jetty-util", Some("jetty/jetty-util.jar"), "jetty.rpm").unwrap();
        assert_eq!(jar.path, "/usr/share/java/jetty/jetty-util.jar");

        let missing = select_jar(&entries, "jetty-util", Some("jetty/jetty-http"), "jetty.rpm");
        assert!(matches!(missing, Err(Error::NotFoundError(msg)) if msg.contains("jetty/jetty-http")));
    }

    #[test]
    fn test_no_jar_in_package() {
        let entries = vec![ArchiveEntry::file("/usr/share/maven-poms/foo.pom")];
        assert!(matches!(select_jar(&entries, "foo", None, "foo.rpm"), Err(Error::NotFoundError(_))));
    }

    #[test]
    fn test_jar_version() {
        assert_eq!(jar_version("foo", "/usr/share/java/foo-1.2.3.jar"), Some("1.2.3".to_string()));
        assert_eq!(jar_version("foo", "/usr/share/java/foo.jar"), None);
        assert_eq!(jar_version("foo", "/usr/share/java/foo-api.jar"), None);
    }
}
