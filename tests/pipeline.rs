// tests/pipeline.rs

//! End-to-end runs of the artifact pipeline against an in-memory repository.

mod common;

use common::{FakeObs, FakePackage, Workspace, config, snapshot};
use filetime::FileTime;
use obs_maven::maven::MavenMetadata;
use obs_maven::{RecordingEvents, SyncEvent};
use std::fs;

const POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
  <modelVersion>4.0.0</modelVersion>
  <parent>
    <groupId>org.apache.commons</groupId>
    <artifactId>commons-parent</artifactId>
    <version>52</version>
  </parent>
  <artifactId>commons-lang3</artifactId>
  <version>3.12.0</version>
</project>"#;

fn lang3(version: &str, release: &str, file_time: u64) -> FakePackage {
    FakePackage::new("apache-commons-lang3", version, release, file_time)
        .file(
            &format!("/usr/share/java/commons-lang3-{}.jar", version),
            format!("jar {}", version).as_bytes(),
        )
        .link("/usr/share/java/commons-lang3.jar", &format!("commons-lang3-{}.jar", version))
}

const LANG3: &str = "  - artifact: commons-lang3\n    package: apache-commons-lang3\n    repository: obs\n";

#[test]
fn test_second_run_skips_deployed_generation() {
    let obs = FakeObs::new();
    obs.publish(&[lang3("3.12.0", "1.1", 1650000000)]);
    let workspace = Workspace::new();
    let config = config(LANG3);

    let events = RecordingEvents::new();
    let first = workspace.runner(&obs, &config, false).run(&config.artifacts, &[], &events);
    assert_eq!(first.deployed, vec!["commons-lang3"]);

    let jar = workspace.out("suse/commons-lang3/3.12.0/commons-lang3-3.12.0.jar");
    assert_eq!(fs::read(&jar).unwrap(), b"jar 3.12.0");
    let mtime = FileTime::from_last_modification_time(&fs::metadata(&jar).unwrap());
    assert_eq!(mtime.unix_seconds(), 1650000000);
    let tree_before = snapshot(workspace.out.path());
    assert_eq!(tree_before.len(), 3);

    let events = RecordingEvents::new();
    let second = workspace.runner(&obs, &config, false).run(&config.artifacts, &[], &events);
    assert_eq!(second.skipped, vec!["commons-lang3"]);
    assert!(second.is_success());
    assert!(events.any(|e| matches!(e, SyncEvent::ArtifactSkipped { file_time: 1650000000, .. })));
    assert!(events.any(|e| matches!(e, SyncEvent::IndexLoaded { from_cache: true, .. })));

    // one binary download and one package list download across both runs
    assert_eq!(obs.requests_ending_with(".noarch.rpm"), 1);
    assert_eq!(obs.requests_ending_with("primary.xml.gz"), 1);
    // jar, POM and metadata untouched: same bytes, same mtimes
    assert_eq!(snapshot(workspace.out.path()), tree_before);
}

#[test]
fn test_new_generation_is_merged_into_metadata() {
    let obs = FakeObs::new();
    let workspace = Workspace::new();
    let config = config(LANG3);

    obs.publish(&[lang3("3.12.0", "1.1", 1650000000)]);
    workspace.runner(&obs, &config, false).run(&config.artifacts, &[], &RecordingEvents::new());

    obs.publish(&[lang3("3.13.0", "1.1", 1660000000), lang3("3.12.0", "1.1", 1650000000)]);
    let summary = workspace.runner(&obs, &config, false).run(&config.artifacts, &[], &RecordingEvents::new());
    assert_eq!(summary.deployed, vec!["commons-lang3"]);

    let xml = fs::read_to_string(workspace.out("suse/commons-lang3/maven-metadata-local.xml")).unwrap();
    let metadata = MavenMetadata::parse(&xml).unwrap();
    assert_eq!(metadata.versions(), ["3.12.0", "3.13.0"]);
    assert_eq!(metadata.versioning.release.as_deref(), Some("3.13.0"));
    assert!(workspace.out("suse/commons-lang3/3.12.0/commons-lang3-3.12.0.jar").is_file());
    assert!(workspace.out("suse/commons-lang3/3.13.0/commons-lang3-3.13.0.jar").is_file());
}

#[test]
fn test_pom_coordinates_take_precedence() {
    let obs = FakeObs::new();
    obs.publish(&[FakePackage::new("apache-commons-lang3", "3.12.0", "4.2", 1650000000)
        .file("/usr/share/java/commons-lang3.jar", b"jar")
        .file("/usr/share/maven-poms/JPP-commons-lang3.pom", POM.as_bytes())]);
    let workspace = Workspace::new();
    let config = config(LANG3);

    let events = RecordingEvents::new();
    let summary = workspace.runner(&obs, &config, true).run(&config.artifacts, &[], &events);
    assert!(summary.is_success(), "{:?}", summary.failed);

    assert!(workspace
        .out("org/apache/commons/commons-lang3/3.12.0/commons-lang3-3.12.0.jar")
        .is_file());
    let pom = fs::read_to_string(workspace.out("org/apache/commons/commons-lang3/3.12.0/commons-lang3-3.12.0.pom")).unwrap();
    assert!(pom.contains("<groupId>org.apache.commons</groupId>"));
    assert!(events.any(|e| matches!(e, SyncEvent::DescriptorResolved { group, .. } if group == "org.apache.commons")));

    // a different POM group still counts as deployed for the skip check
    let again = workspace.runner(&obs, &config, true).run(&config.artifacts, &[], &RecordingEvents::new());
    assert_eq!(again.skipped, vec!["commons-lang3"]);
}

#[test]
fn test_version_falls_back_to_package_version() {
    let obs = FakeObs::new();
    obs.publish(&[FakePackage::new("jose4j", "0.9.3", "2.1", 1650000000)
        .file("/usr/share/java/jose4j/jose4j.jar", b"jar")]);
    let workspace = Workspace::new();
    let config = config("  - artifact: jose4j\n    repository: obs\n    group: org.bitbucket.b_c\n");

    let summary = workspace.runner(&obs, &config, true).run(&config.artifacts, &[], &RecordingEvents::new());
    assert!(summary.is_success(), "{:?}", summary.failed);
    assert!(workspace.out("org/bitbucket/b_c/jose4j/0.9.3/jose4j-0.9.3.jar").is_file());
}

#[test]
fn test_symlinks_are_not_deployed() {
    let obs = FakeObs::new();
    obs.publish(&[FakePackage::new("log4j", "2.17.1", "1.1", 1650000000)
        .file("/usr/share/java/log4j/log4j-api.jar", b"api")
        .file("/usr/share/java/log4j/log4j-core.jar", b"core")
        .link("/usr/share/java/log4j-core.jar", "log4j/log4j-core.jar")]);
    let workspace = Workspace::new();
    let config = config("  - artifact: log4j-core\n    package: log4j\n    repository: obs\n    group: org.apache.logging.log4j\n");

    let events = RecordingEvents::new();
    let summary = workspace.runner(&obs, &config, false).run(&config.artifacts, &[], &events);
    assert!(summary.is_success(), "{:?}", summary.failed);
    assert!(events.any(|e| matches!(e, SyncEvent::JarSelected { entry, .. } if entry == "/usr/share/java/log4j/log4j-core.jar")));

    let jar = workspace.out("org/apache/logging/log4j/log4j-core/2.17.1/log4j-core-2.17.1.jar");
    assert_eq!(fs::read(jar).unwrap(), b"core");
}

#[test]
fn test_failures_do_not_stop_the_batch() {
    let obs = FakeObs::new();
    obs.publish(&[
        lang3("3.12.0", "1.1", 1650000000),
        FakePackage::new("foo", "1.0", "1", 1).file("/usr/share/java/foo.jar", b"foo"),
        FakePackage::new("foo-extras", "1.0", "1", 1).file("/usr/share/java/foo-extras.jar", b"x"),
    ]);
    let workspace = Workspace::new();
    let config = config(
        "  - artifact: foo\n    package: foo-\n    repository: obs\n  - artifact: missing\n    repository: obs\n  - artifact: commons-lang3\n    package: apache-commons-lang3\n    repository: obs\n",
    );

    let summary = workspace.runner(&obs, &config, false).run(&config.artifacts, &[], &RecordingEvents::new());
    assert_eq!(summary.deployed, vec!["commons-lang3"]);
    assert_eq!(summary.failed.len(), 2);
    assert_eq!(summary.exit_code(), 1);

    let (name, message) = &summary.failed[0];
    assert_eq!(name, "foo");
    assert!(message.contains("foo-1.0-1.noarch.rpm"));
    assert!(message.contains("foo-extras-1.0-1.noarch.rpm"));
    assert!(summary.failed[1].1.contains("missing-[0-9]"));
}

#[test]
fn test_artifact_allow_list() {
    let obs = FakeObs::new();
    obs.publish(&[
        lang3("3.12.0", "1.1", 1650000000),
        FakePackage::new("foo", "1.0", "1", 1).file("/usr/share/java/foo.jar", b"foo"),
    ]);
    let workspace = Workspace::new();
    let config = config(&format!("{}  - artifact: foo\n    repository: obs\n", LANG3));

    let only = vec!["foo".to_string(), "unknown".to_string()];
    let summary = workspace.runner(&obs, &config, false).run(&config.artifacts, &only, &RecordingEvents::new());
    assert_eq!(summary.deployed, vec!["foo"]);
    assert_eq!(summary.failed, vec![("unknown".to_string(), "not configured".to_string())]);
    assert!(!workspace.out("suse/commons-lang3").exists());
}

#[test]
fn test_work_dir_is_left_empty() {
    let obs = FakeObs::new();
    obs.publish(&[lang3("3.12.0", "1.1", 1650000000)]);
    let workspace = Workspace::new();
    let config = config(LANG3);

    workspace.runner(&obs, &config, true).run(&config.artifacts, &[], &RecordingEvents::new());
    assert_eq!(fs::read_dir(workspace.work.path()).unwrap().count(), 0);
}
