//! Integration tests for Kiln

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn kiln() -> Command {
        cargo_bin_cmd!("kiln")
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|out| out.status.success())
            .unwrap_or(false)
    }

    fn git(root: &Path, args: &[&str]) {
        let status = std::process::Command::new("git")
            .current_dir(root)
            .args(args)
            .output()
            .unwrap();
        assert!(status.status.success(), "git {args:?} failed");
    }

    fn write_pom(root: &Path, module: &str, body: &str) {
        let dir = root.join(module);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("pom.xml"),
            format!("<project>{body}</project>"),
        )
        .unwrap();
    }

    /// A committed two-module project: aggregate root, site and core.
    fn project_fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write_pom(
            root,
            ".",
            "<groupId>com.example.shop</groupId>\
             <artifactId>aggregate</artifactId>\
             <version>1.0</version>\
             <packaging>pom</packaging>\
             <modules><module>core</module><module>site</module></modules>",
        );
        write_pom(
            root,
            "site",
            "<groupId>com.example.shop</groupId>\
             <artifactId>site</artifactId>\
             <version>2.0</version>\
             <packaging>war</packaging>",
        );
        write_pom(
            root,
            "core",
            "<groupId>com.example.shop</groupId>\
             <artifactId>core</artifactId>\
             <version>1.2.7</version>",
        );
        git(root, &["init", "-q"]);
        git(root, &["add", "."]);
        git(
            root,
            &[
                "-c",
                "user.email=kiln@test",
                "-c",
                "user.name=kiln",
                "commit",
                "-q",
                "-m",
                "initial",
            ],
        );
        dir
    }

    #[test]
    fn help_displays() {
        kiln()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("incremental build orchestrator"));
    }

    #[test]
    fn version_displays() {
        kiln()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("kiln"));
    }

    #[test]
    fn build_help_lists_version_flags() {
        kiln()
            .args(["build", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--pull-request"))
            .stdout(predicate::str::contains("--skip-tests"));
    }

    #[test]
    fn missing_descriptor_rejects_root() {
        let dir = TempDir::new().unwrap();
        kiln()
            .args(["-C", dir.path().to_str().unwrap(), "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Not a module root"));
    }

    #[test]
    fn broken_config_is_reported() {
        let dir = TempDir::new().unwrap();
        write_pom(dir.path(), ".", "<artifactId>x</artifactId>");
        fs::write(dir.path().join("kiln.toml"), "[cache\nstale_days = 3").unwrap();
        kiln()
            .args(["-C", dir.path().to_str().unwrap(), "status"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn status_reports_modules() {
        if !git_available() {
            return;
        }
        let project = project_fixture();
        let store = TempDir::new().unwrap();
        kiln()
            .args([
                "-C",
                project.path().to_str().unwrap(),
                "--repository",
                store.path().to_str().unwrap(),
                "status",
                "--format",
                "plain",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("core"))
            .stdout(predicate::str::contains("build"));
    }

    #[test]
    fn status_json_carries_roles() {
        if !git_available() {
            return;
        }
        let project = project_fixture();
        let store = TempDir::new().unwrap();
        kiln()
            .args([
                "-C",
                project.path().to_str().unwrap(),
                "--repository",
                store.path().to_str().unwrap(),
                "status",
                "--format",
                "json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"role\": \"site\""));
    }

    #[test]
    fn pull_request_env_overrides_site_version() {
        if !git_available() {
            return;
        }
        let project = project_fixture();
        let store = TempDir::new().unwrap();
        kiln()
            .env("KILN_PULL_REQUEST", "42")
            .args([
                "-C",
                project.path().to_str().unwrap(),
                "--repository",
                store.path().to_str().unwrap(),
                "status",
                "--format",
                "plain",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("2.0-PR42"));
    }

    #[test]
    fn gc_dry_run_leaves_the_store_alone() {
        if !git_available() {
            return;
        }
        let project = project_fixture();
        let store = TempDir::new().unwrap();
        let stale = store.path().join("com/thirdparty/lib/9.9");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("lib-9.9.jar"), b"jar").unwrap();

        kiln()
            .args([
                "-C",
                project.path().to_str().unwrap(),
                "--repository",
                store.path().to_str().unwrap(),
                "gc",
                "--dry-run",
                "--stale-before",
                "2999-01-01",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Dry run - would remove 1 file(s)"));
        assert!(stale.join("lib-9.9.jar").exists());
    }

    #[test]
    fn gc_removes_stale_files() {
        if !git_available() {
            return;
        }
        let project = project_fixture();
        let store = TempDir::new().unwrap();
        let stale = store.path().join("com/thirdparty/lib/9.9");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("lib-9.9.jar"), b"jar").unwrap();

        kiln()
            .args([
                "-C",
                project.path().to_str().unwrap(),
                "--repository",
                store.path().to_str().unwrap(),
                "gc",
                "--stale-before",
                "2999-01-01",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("removed 1 file(s)"));
        assert!(!stale.join("lib-9.9.jar").exists());
        assert!(!store.path().join("com").exists());
    }
}
