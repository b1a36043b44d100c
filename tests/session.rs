// tests/session.rs

//! Integration tests for full lock sessions

mod common;

use common::{FakeResolver, find, project};
use relock::{DependencyTree, Error, LockConfig, LockEntry, lock_packages, parse_packages};

const MANIFEST: &str = r#"
[[source]]
name = "pypi"
url = "https://pypi.org/simple"
verify_ssl = true

[[source]]
name = "internal"
url = "https://packages.corp.example/simple"

[packages]
requests = "*"

[dev-packages]
pytest = "*"
"#;

const LOCK: &str = r#"{
    "default": {"requests": {"version": "==2.31.0", "hashes": ["sha256:old"]}},
    "develop": {"pytest": {"version": "==8.0.0", "hashes": ["sha256:old"]}}
}"#;

#[test]
fn test_fresh_resolution_is_returned_by_default() {
    let project = project(MANIFEST, LOCK);
    let resolver = FakeResolver::new(vec![
        LockEntry::new("requests", "==2.31.0").with_hashes(["sha256:new"]),
    ]);

    let entries = lock_packages(
        &resolver,
        &DependencyTree::new(),
        &project,
        &["requests".to_string()],
        &LockConfig::default(),
    )
    .unwrap();
    assert_eq!(entries, resolver.results);

    let request = resolver.last_request();
    assert_eq!(request.packages, vec!["requests".to_string()]);
    assert_eq!(request.sources, project.manifest.sources);
    assert!(!request.dev);
}

#[test]
fn test_keep_outdated_reconciles_with_lock() {
    let project = project(MANIFEST, LOCK);
    let resolver = FakeResolver::new(vec![
        LockEntry::new("requests", "==2.31.0").with_hashes(["sha256:new"]),
        LockEntry::new("idna", "==3.7"),
    ]);
    let config = LockConfig {
        keep_outdated: true,
        ..LockConfig::default()
    };

    let entries = lock_packages(&resolver, &DependencyTree::new(), &project, &[], &config).unwrap();
    assert_eq!(entries[0].name_str(), "idna");
    let requests = find(&entries, "requests");
    assert_eq!(requests.version.as_deref(), Some("2.31.0"));
    assert_eq!(requests.hashes, vec!["sha256:new", "sha256:old"]);
}

#[test]
fn test_dev_session_uses_develop_section() {
    let project = project(MANIFEST, LOCK);
    let resolver = FakeResolver::new(vec![
        LockEntry::new("pytest", "==8.0.0").with_hashes(["sha256:new"]),
    ]);
    let config = LockConfig::default()
        .with_env_overrides([
            ("RELOCK_DEV", "true"),
            ("RELOCK_KEEP_OUTDATED", "1"),
            ("RELOCK_PRE", "yes"),
        ])
        .unwrap();

    let entries = lock_packages(&resolver, &DependencyTree::new(), &project, &[], &config).unwrap();
    assert_eq!(find(&entries, "pytest").hashes, vec!["sha256:new", "sha256:old"]);

    let request = resolver.last_request();
    assert!(request.dev);
    assert!(request.pre);
    assert!(!request.clear);
}

#[test]
fn test_mirror_replaces_public_index() {
    let project = project(MANIFEST, LOCK);
    let resolver = FakeResolver::new(Vec::new());
    let config = LockConfig {
        pypi_mirror: Some("https://mirror.example.com/simple".to_string()),
        ..LockConfig::default()
    };

    lock_packages(&resolver, &DependencyTree::new(), &project, &[], &config).unwrap();
    let names: Vec<String> = resolver
        .last_request()
        .sources
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["mirror.example.com", "internal"]);
}

#[test]
fn test_invalid_mirror_fails_before_resolving() {
    let project = project(MANIFEST, LOCK);
    let resolver = FakeResolver::new(Vec::new());
    let config = LockConfig {
        pypi_mirror: Some("::not a url::".to_string()),
        ..LockConfig::default()
    };

    let err = lock_packages(&resolver, &DependencyTree::new(), &project, &[], &config).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert!(resolver.requests.borrow().is_empty());
}

#[test]
fn test_configured_packages_are_appended_to_request() {
    let project = project(MANIFEST, LOCK);
    let resolver = FakeResolver::new(Vec::new());
    let config = LockConfig::default()
        .with_env_overrides([("RELOCK_PACKAGES", "idna>=3\nurllib3")])
        .unwrap();

    lock_packages(
        &resolver,
        &DependencyTree::new(),
        &project,
        &["requests".to_string()],
        &config,
    )
    .unwrap();
    assert_eq!(
        resolver.last_request().packages,
        vec!["requests".to_string(), "idna>=3".to_string(), "urllib3".to_string()]
    );
}

#[test]
fn test_parse_packages_skips_bad_lines() {
    let lines: Vec<String> = [
        "requests[socks]>=2.31; python_version >= '3.8'",
        "",
        "==1.0",
        "six",
    ]
    .into_iter()
    .map(String::from)
    .collect();

    let parsed = parse_packages(&lines);
    let names: Vec<&str> = parsed.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(names, vec!["requests", "six"]);

    let (_, requests) = &parsed[0];
    assert_eq!(requests.version.as_deref(), Some(">=2.31"));
    assert_eq!(requests.extras, vec!["socks".to_string()]);
    assert_eq!(requests.markers.as_deref(), Some("python_version >= '3.8'"));
    assert_eq!(parsed[1].1.version.as_deref(), Some("*"));
}
