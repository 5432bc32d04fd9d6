use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::*;

static TEST_DIR_COUNTER: AtomicU64 = AtomicU64::new(0);

fn package(name: &str, version: &str) -> InstalledPackage {
    InstalledPackage {
        name: name.to_string(),
        version: version.to_string(),
        requires: Vec::new(),
        required_by: Vec::new(),
        install_line: format!("{name}=={version}"),
    }
}

fn test_dir() -> PathBuf {
    let mut path = std::env::temp_dir();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time")
        .as_nanos();
    let counter = TEST_DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
    path.push(format!(
        "pipfold-core-tests-{}-{}-{}",
        std::process::id(),
        nanos,
        counter
    ));
    std::fs::create_dir_all(&path).expect("must create test dir");
    path
}

#[test]
fn normalization_folds_case_and_separators() {
    assert_eq!(normalize_package_name("Foo-Bar"), "foo_bar");
    assert_eq!(normalize_package_name("foo_bar"), "foo_bar");
    assert_eq!(
        normalize_package_name("Foo-Bar"),
        normalize_package_name("FOO_bar")
    );
}

#[test]
fn normalization_is_idempotent() {
    for name in ["Django", "zope.interface", "typing-extensions", "", "A-b_C-d"] {
        let once = normalize_package_name(name);
        assert_eq!(normalize_package_name(&once), once, "input: {name}");
    }
}

#[test]
fn split_requirement_separates_name_and_constraint() {
    assert_eq!(
        split_requirement("requests==2.31.0"),
        Some(("requests", Some("==2.31.0")))
    );
    assert_eq!(split_requirement("flask"), Some(("flask", None)));
    assert_eq!(
        split_requirement("Django>=4.2,<5"),
        Some(("Django", Some(">=4.2,<5")))
    );
    assert_eq!(
        split_requirement("torch==2.1.0+cu118"),
        Some(("torch", Some("==2.1.0+cu118")))
    );
    assert_eq!(split_requirement("-e git+https://x/y#egg=y"), None);
    assert_eq!(split_requirement("pkg @ file:///tmp/pkg"), None);
}

#[test]
fn parse_manifest_groups_in_declared_order() {
    let manifest = Manifest::parse(
        r#"
[[source]]
url = "https://pypi.org/simple"
verify_ssl = true
name = "pypi"

[packages]
requests = "*"
django = ">=4.2"
mylib = { git = "https://example.test/mylib.git", ref = "main" }
celery = { version = "==5.3.0", extras = ["redis", "msgpack"] }

[dev-packages]
pytest = "*"
requests = "*"
"#,
        Path::new("Pipfile"),
    )
    .expect("manifest must parse");

    assert_eq!(
        manifest
            .root_names(DependencyGroup::Default)
            .collect::<Vec<_>>(),
        vec!["requests", "django", "mylib", "celery"]
    );
    assert_eq!(
        manifest
            .root_names(DependencyGroup::Development)
            .collect::<Vec<_>>(),
        vec!["pytest", "requests"]
    );
    assert_eq!(manifest.packages["requests"], DependencySpec::Any);
    assert_eq!(
        manifest.packages["django"],
        DependencySpec::Pinned(">=4.2".to_string())
    );
    assert_eq!(
        manifest.packages["mylib"],
        DependencySpec::Vcs {
            git: "https://example.test/mylib.git".to_string(),
            reference: Some("main".to_string()),
            extras: Vec::new(),
        }
    );
    assert!(manifest.other.contains_key("source"));
}

#[test]
fn parse_manifest_without_dev_group_yields_empty_group() {
    let manifest = Manifest::parse("[packages]\nrequests = \"*\"\n", Path::new("Pipfile"))
        .expect("manifest must parse");
    assert!(manifest.dev_packages.is_empty());
}

#[test]
fn parse_manifest_rejects_table_without_git_or_version() {
    let err = Manifest::parse(
        "[packages]\nodd = { extras = [\"x\"] }\n",
        Path::new("Pipfile"),
    )
    .expect_err("table without git or version must be rejected");
    assert!(matches!(err, Error::ManifestUnreadable { .. }), "{err}");
}

#[test]
fn parse_manifest_rejects_names_equal_after_normalization() {
    let err = Manifest::parse(
        "[packages]\nFoo-Bar = \"*\"\nfoo_bar = \"==1.0\"\n",
        Path::new("Pipfile"),
    )
    .expect_err("duplicate package must be rejected");
    assert!(err.to_string().contains("name the same package"), "{err}");
}

#[test]
fn load_missing_manifest_is_unreadable() {
    let dir = test_dir();
    let err = Manifest::load(&dir.join("Pipfile")).expect_err("missing manifest must fail");
    assert!(matches!(err, Error::ManifestUnreadable { .. }), "{err}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn pip_args_cover_every_spec_shape() {
    assert_eq!(DependencySpec::Any.pip_args("requests"), vec!["requests"]);
    assert_eq!(
        DependencySpec::Pinned(">=2.0".to_string()).pip_args("requests"),
        vec!["requests>=2.0"]
    );
    assert_eq!(
        DependencySpec::Vcs {
            git: "https://example.test/lib.git".to_string(),
            reference: None,
            extras: Vec::new(),
        }
        .pip_args("lib"),
        vec!["-e", "git+https://example.test/lib.git#egg=lib"]
    );
    assert_eq!(
        DependencySpec::Versioned {
            version: "==5.3.0".to_string(),
            extras: vec!["redis".to_string(), "msgpack".to_string()],
        }
        .pip_args("celery"),
        vec!["celery[redis,msgpack]==5.3.0"]
    );
    assert_eq!(
        DependencySpec::Versioned {
            version: "*".to_string(),
            extras: vec!["socks".to_string()],
        }
        .pip_args("requests"),
        vec!["requests[socks]"]
    );
}

#[test]
fn insert_replaces_entry_spelled_differently() {
    let mut manifest = Manifest::parse(
        "[packages]\nFlask = \"*\"\nrequests = \"*\"\n",
        Path::new("Pipfile"),
    )
    .expect("manifest must parse");

    manifest.insert(
        DependencyGroup::Default,
        "flask",
        DependencySpec::Pinned("==3.0.0".to_string()),
    );
    manifest.insert(DependencyGroup::Development, "pytest", DependencySpec::Any);

    assert_eq!(
        manifest
            .root_names(DependencyGroup::Default)
            .collect::<Vec<_>>(),
        vec!["Flask", "requests"]
    );
    assert_eq!(
        manifest.packages["Flask"],
        DependencySpec::Pinned("==3.0.0".to_string())
    );
    assert_eq!(manifest.dev_packages["pytest"], DependencySpec::Any);
}

#[test]
fn save_then_load_preserves_entries_and_foreign_tables() {
    let dir = test_dir();
    let path = dir.join("Pipfile");
    let mut manifest = Manifest::parse(
        r#"
[requires]
python_version = "3.11"

[packages]
requests = "*"
celery = { version = "==5.3.0", extras = ["redis"] }
"#,
        &path,
    )
    .expect("manifest must parse");
    manifest.insert(DependencyGroup::Development, "pytest", DependencySpec::Any);

    manifest.save(&path).expect("must save manifest");
    let reloaded = Manifest::load(&path).expect("must reload manifest");

    assert_eq!(reloaded, manifest);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn save_writes_foreign_tables_before_dependency_groups() {
    let dir = test_dir();
    let path = dir.join("Pipfile");
    let mut manifest = Manifest::parse(
        r#"
[packages]
requests = "*"

[requires]
python_version = "3.11"
"#,
        &path,
    )
    .expect("manifest must parse");
    manifest.insert(DependencyGroup::Development, "pytest", DependencySpec::Any);

    manifest.save(&path).expect("must save manifest");
    let saved = std::fs::read_to_string(&path).expect("must read saved manifest");
    let position = |header: &str| {
        saved
            .find(header)
            .unwrap_or_else(|| panic!("missing {header} in:\n{saved}"))
    };

    assert!(position("[requires]") < position("[packages]"), "{saved}");
    assert!(position("[packages]") < position("[dev-packages]"), "{saved}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn lock_text_is_sorted_regardless_of_input_order() {
    let forward = [package("B", "v1"), package("A", "v2")];
    let backward = [package("A", "v2"), package("B", "v1")];

    assert_eq!(render_lock(&forward), "A==v2\nB==v1");
    assert_eq!(render_lock(&forward), render_lock(&backward));
}

#[test]
fn empty_lock_renders_empty_text() {
    assert_eq!(render_lock(std::iter::empty()), "");
}

#[test]
fn write_lock_replaces_existing_file_without_leaving_staging_file() {
    let dir = test_dir();
    let path = dir.join("requirements.txt");
    std::fs::write(&path, "stale==0.0.1\n").expect("must seed lock file");

    write_lock(
        &[package("urllib3", "2.0.7"), package("requests", "2.31.0")],
        &path,
    )
    .expect("must write lock");

    let written = std::fs::read_to_string(&path).expect("must read lock");
    assert_eq!(written, "requests==2.31.0\nurllib3==2.0.7");
    assert!(!dir.join(".requirements.txt.tmp").exists());

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn write_lock_into_missing_directory_reports_io_error() {
    let dir = test_dir();
    let path = dir.join("missing").join("requirements.txt");

    let err = write_lock(&[package("six", "1.16.0")], &path).expect_err("must fail");
    assert!(matches!(err, Error::Io { .. }), "{err}");

    let _ = std::fs::remove_dir_all(&dir);
}
