//! Integration tests for the `transform` command.
//!
//! Every test runs the real binary inside its own project directory, with a
//! private lock directory and an empty project config so nothing on the host
//! leaks in.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use ttbuild::core::{fingerprint::fingerprint, lock::RunLock};
use ttbuild::models::{LockKey, Operation};

struct Project {
    _temp: TempDir,
    root: PathBuf,
    locks: PathBuf,
}

impl Project {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let root = dunce::canonicalize(temp.path()).unwrap();
        let locks = root.join(".locks");
        fs::write(root.join("ttbuild.toml"), "").unwrap();
        Self {
            _temp: temp,
            root,
            locks,
        }
    }

    /// Writes a file and backdates it so outputs written later are strictly
    /// newer, whatever the filesystem's timestamp granularity.
    fn write_old(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.join(name);
        fs::write(&path, content).unwrap();
        set_age(&path, 3600);
        path
    }

    fn ttbuild(&self) -> Command {
        let mut cmd = Command::cargo_bin("ttbuild").unwrap();
        cmd.current_dir(&self.root)
            .env("TTBUILD_LOCK_DIR", &self.locks)
            .env_remove("TTBUILD_LOG")
            .env_remove("RUST_LOG");
        cmd
    }

    /// The canonical example: `A.tt` declares `cs`, `B.tt` includes
    /// `C.ttinclude`.
    fn with_example_templates(&self) {
        self.write_old("A.tt", "<#@ output extension=\"cs\" #>\nclass A {}\n");
        self.write_old(
            "B.tt",
            "<#@ output extension=\"cs\" #>\n<#@ include file=\"C.ttinclude\" #>\nclass B {}\n",
        );
        self.write_old("C.ttinclude", "// shared header\n");
    }

    fn line(&self, name: &str) -> String {
        format!("{}\n", self.root.join(name).display())
    }
}

fn set_age(path: &Path, age_secs: u64) {
    let time = SystemTime::now() - Duration::from_secs(age_secs);
    File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(time)
        .unwrap();
}

#[test]
fn test_first_run_generates_and_second_run_skips() {
    let project = Project::new();
    project.with_example_templates();

    let expected = format!("{}{}", project.line("A.cs"), project.line("B.cs"));
    project
        .ttbuild()
        .args(["transform", "--skip-up-to-date", "A.tt", "B.tt"])
        .assert()
        .success()
        .stdout(expected)
        .stderr(predicate::str::contains("Templates transformed for"));

    assert_eq!(
        fs::read_to_string(project.root.join("A.cs")).unwrap(),
        "class A {}\n"
    );
    assert_eq!(
        fs::read_to_string(project.root.join("B.cs")).unwrap(),
        "// shared header\nclass B {}\n"
    );

    project
        .ttbuild()
        .args(["transform", "--skip-up-to-date", "A.tt", "B.tt"])
        .assert()
        .success()
        .stdout("")
        .stderr(
            predicate::str::contains("No templates needed transforming")
                .and(predicate::str::contains("Templates transformed").not()),
        );

    assert_eq!(
        fs::read_to_string(project.root.join("B.cs")).unwrap(),
        "// shared header\nclass B {}\n"
    );
}

#[test]
fn test_touching_an_include_regenerates_its_template() {
    let project = Project::new();
    project.with_example_templates();

    project
        .ttbuild()
        .args(["transform", "-s", "A.tt", "B.tt"])
        .assert()
        .success();

    // Push the include past the outputs.
    let include = project.root.join("C.ttinclude");
    fs::write(&include, "// changed header\n").unwrap();
    File::options()
        .write(true)
        .open(&include)
        .unwrap()
        .set_modified(SystemTime::now() + Duration::from_secs(60))
        .unwrap();

    project
        .ttbuild()
        .args(["transform", "-s", "A.tt", "B.tt"])
        .assert()
        .success()
        .stdout(project.line("B.cs"));

    assert_eq!(
        fs::read_to_string(project.root.join("B.cs")).unwrap(),
        "// changed header\nclass B {}\n"
    );
}

#[test]
fn test_outputs_are_sorted_case_insensitively_in_every_mode() {
    let project = Project::new();
    for name in ["delta.tt", "Bravo.tt", "alpha.tt", "Charlie.tt"] {
        project.write_old(name, "x\n");
    }
    let expected = ["alpha.txt", "Bravo.txt", "Charlie.txt", "delta.txt"]
        .iter()
        .map(|n| project.line(n))
        .collect::<String>();

    let serial = project
        .ttbuild()
        .args(["transform", "delta.tt", "Bravo.tt", "alpha.tt", "Charlie.tt"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let parallel = project
        .ttbuild()
        .args(["transform", "-p", "delta.tt", "Bravo.tt", "alpha.tt", "Charlie.tt"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let bounded = project
        .ttbuild()
        .args(["transform", "-p", "-j", "2", "delta.tt", "Bravo.tt", "alpha.tt", "Charlie.tt"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    assert_eq!(String::from_utf8(serial.clone()).unwrap(), expected);
    assert_eq!(serial, parallel);
    assert_eq!(serial, bounded);
}

#[test]
fn test_variables_are_substituted() {
    let project = Project::new();
    project.write_old("V.tt", "mode=$(Configuration); other=$(Other)\n");

    project
        .ttbuild()
        .args([
            "transform",
            "-v",
            "Configuration=Release",
            "--variable",
            "Unused=1",
            "V.tt",
        ])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(project.root.join("V.txt")).unwrap(),
        "mode=Release; other=$(Other)\n"
    );
}

#[test]
fn test_configured_variables_are_overridden_by_the_command_line() {
    let project = Project::new();
    fs::write(
        project.root.join("ttbuild.toml"),
        "[variables]\nConfiguration = \"Debug\"\nPlatform = \"x64\"\n",
    )
    .unwrap();
    project.write_old("V.tt", "$(Configuration)|$(Platform)");

    project
        .ttbuild()
        .args(["transform", "-v", "Configuration=Release", "V.tt"])
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(project.root.join("V.txt")).unwrap(),
        "Release|x64"
    );
}

#[test]
fn test_invalid_variable_exits_with_one() {
    let project = Project::new();
    project.write_old("A.tt", "x");

    project
        .ttbuild()
        .args(["transform", "-v", "NoSeparator", "A.tt"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("Invalid variable definition"));

    assert!(!project.root.join("A.txt").exists());
}

#[test]
fn test_missing_template_exits_with_one() {
    let project = Project::new();

    project
        .ttbuild()
        .args(["transform", "Missing.tt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_template_errors_fail_only_that_job() {
    let project = Project::new();
    project.write_old("Good.tt", "fine\n");
    project.write_old("Bad.tt", "line one\n<#= DateTime.Now #>\n");

    project
        .ttbuild()
        .args(["transform", "-p", "Good.tt", "Bad.tt"])
        .assert()
        .code(1)
        .stdout(project.line("Good.txt"))
        .stderr(
            predicate::str::contains("Bad.tt(2,1): ERROR: Control blocks")
                .and(predicate::str::contains("Templates transformed").not()),
        );

    assert!(project.root.join("Good.txt").exists());
    assert!(!project.root.join("Bad.txt").exists());
}

#[test]
fn test_lock_timeout_aborts_before_any_job() {
    let project = Project::new();
    let template = project.write_old("A.tt", "x");

    let key = LockKey::new(Operation::Transform, fingerprint(&[template]));
    let held = RunLock::acquire(&project.locks, &key, Duration::from_secs(5)).unwrap();

    project
        .ttbuild()
        .args(["--lock-timeout", "1", "transform", "A.tt"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains(
            "Another instance of ttbuild is still running after 1 sec",
        ));
    assert!(!project.root.join("A.txt").exists());

    drop(held);
    project
        .ttbuild()
        .args(["transform", "-t", "1", "A.tt"])
        .assert()
        .success()
        .stdout(project.line("A.txt"));
}

#[test]
fn test_different_operations_do_not_contend() {
    let project = Project::new();
    let template = project.write_old("A.tt", "x");

    let key = LockKey::new(Operation::Clean, fingerprint(&[template]));
    let _held = RunLock::acquire(&project.locks, &key, Duration::from_secs(5)).unwrap();

    project
        .ttbuild()
        .args(["transform", "--lock-timeout", "0", "A.tt"])
        .assert()
        .success();
}

#[test]
fn test_unknown_config_key_is_reported() {
    let project = Project::new();
    fs::write(project.root.join("ttbuild.toml"), "paralel = true\n").unwrap();
    project.write_old("A.tt", "x");

    project
        .ttbuild()
        .args(["transform", "A.tt"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid config file"));
}

#[test]
fn test_usage_errors_exit_with_one() {
    let project = Project::new();
    project.write_old("x.tt", "x");

    project
        .ttbuild()
        .arg("transform")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("required arguments were not provided"));

    project
        .ttbuild()
        .args(["transform", "-j", "abc", "x.tt"])
        .assert()
        .code(1);

    assert!(!project.root.join("x.txt").exists());
}

#[test]
fn test_help_exits_with_zero() {
    let project = Project::new();

    project
        .ttbuild()
        .args(["transform", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--skip-up-to-date"));
}
