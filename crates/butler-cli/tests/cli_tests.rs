//! End-to-end tests for the `butler` binary.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// A `butler` command isolated from the user's config and environment.
fn butler(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("butler").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("NO_COLOR");
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Template tree plus a config file that registers it as `go-cli`.
fn template_fixture(home: &Path) -> std::path::PathBuf {
    let template = home.join("templates/go-cli");
    write(&template, "cmd/butler{.Project.Name}/main.go", "package main // butler{.Project.Name}\n");
    write(&template, "go.mod", "module example.com/butler{.Vars.owner}/butler{.Project.Name}\n");

    let config = home.join("butler.toml");
    fs::write(
        &config,
        format!(
            "[variables]\nowner = \"acme\"\n\n[[templates]]\nname = \"go-cli\"\nurl = \"{}\"\ndescription = \"Go command-line app\"\n",
            template.display()
        ),
    )
    .unwrap();
    config
}

#[test]
fn help_and_version() {
    let home = TempDir::new().unwrap();
    butler(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("render"));
    butler(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn render_in_place() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("shop");
    write(&project, "butler{.Project.Name}/butler{toSnakeCase .Vars.svc}.go", "package butler{.Project.Name}\n");

    butler(home.path())
        .args(["render", "shop", "--var", "svc=OrderService"])
        .assert()
        .success()
        .stdout(predicate::str::contains("succeeded"));

    assert_eq!(
        fs::read_to_string(project.join("shop/order_service.go")).unwrap(),
        "package shop\n"
    );
}

#[test]
fn render_reports_failures_with_exit_code_5() {
    let home = TempDir::new().unwrap();
    let project = home.path().join("app");
    write(&project, "bad.txt", "butler{.Project.Name");
    write(&project, "good.txt", "butler{.Project.Name}");

    butler(home.path())
        .args(["render", "app"])
        .assert()
        .code(5)
        .stderr(predicate::str::contains("bad.txt [file]: parse error"));

    assert_eq!(fs::read_to_string(project.join("good.txt")).unwrap(), "app");
    assert_eq!(
        fs::read_to_string(project.join("bad.txt")).unwrap(),
        "butler{.Project.Name"
    );
}

#[test]
fn render_json_report() {
    let home = TempDir::new().unwrap();
    write(&home.path().join("app"), "a.txt", "butler{.Project.Name}");

    let out = butler(home.path())
        .args(["--output-format", "json", "render", "app"])
        .output()
        .unwrap();
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["succeeded"], 1);
    assert_eq!(report["files_rendered"], 1);
    assert!(report["failures"].as_array().unwrap().is_empty());
}

#[test]
fn render_missing_directory_is_not_found() {
    let home = TempDir::new().unwrap();
    butler(home.path())
        .args(["render", "nope"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Directory not found"));
}

#[test]
fn malformed_var_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    butler(home.path())
        .args(["render", ".", "--var", "novalue"])
        .assert()
        .code(2);
}

#[test]
fn new_from_configured_template() {
    let home = TempDir::new().unwrap();
    let config = template_fixture(home.path());

    butler(home.path())
        .arg("--config")
        .arg(&config)
        .args(["new", "tool", "--template", "go-cli", "--dest", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Project 'tool' created!"));

    let project = home.path().join("out/tool");
    assert_eq!(
        fs::read_to_string(project.join("go.mod")).unwrap(),
        "module example.com/acme/tool\n"
    );
    assert_eq!(
        fs::read_to_string(project.join("cmd/tool/main.go")).unwrap(),
        "package main // tool\n"
    );

    butler(home.path())
        .arg("--config")
        .arg(&config)
        .args(["new", "tool", "--template", "go-cli", "--dest", "out"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--force"));

    butler(home.path())
        .arg("--config")
        .arg(&config)
        .args(["new", "tool", "--template", "go-cli", "--dest", "out", "--force", "--var", "owner=other"])
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(project.join("go.mod")).unwrap(),
        "module example.com/other/tool\n"
    );
}

#[test]
fn new_with_unknown_template_is_not_found() {
    let home = TempDir::new().unwrap();
    let config = template_fixture(home.path());
    butler(home.path())
        .arg("--config")
        .arg(&config)
        .args(["new", "tool", "--template", "rust-cli"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("rust-cli"));
}

#[test]
fn new_rejects_hidden_names() {
    let home = TempDir::new().unwrap();
    let config = template_fixture(home.path());
    butler(home.path())
        .arg("--config")
        .arg(&config)
        .args(["new", ".hidden", "--template", "go-cli"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid project name"));
}

#[test]
fn list_formats() {
    let home = TempDir::new().unwrap();
    let config = template_fixture(home.path());

    butler(home.path())
        .arg("--config")
        .arg(&config)
        .args(["list", "--format", "list"])
        .assert()
        .success()
        .stdout("go-cli\n");

    let out = butler(home.path())
        .arg("--config")
        .arg(&config)
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    let entries: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(entries[0]["name"], "go-cli");
    assert_eq!(entries[0]["description"], "Go command-line app");
}

#[test]
fn environment_overrides_config() {
    let home = TempDir::new().unwrap();
    butler(home.path())
        .env("BUTLER__RENDER__WORKERS", "3")
        .args(["config", "get", "render.workers"])
        .assert()
        .success()
        .stdout("3\n");
}

#[test]
fn missing_config_file_is_a_configuration_error() {
    let home = TempDir::new().unwrap();
    butler(home.path())
        .args(["--config", "absent.toml", "list"])
        .assert()
        .code(4);
}

#[test]
fn init_local_writes_defaults_once() {
    let home = TempDir::new().unwrap();
    butler(home.path()).args(["init", "--local"]).assert().success();

    let written = fs::read_to_string(home.path().join(".butler.toml")).unwrap();
    assert!(written.contains("start_delimiter"));

    butler(home.path())
        .args(["init", "--local"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    butler(home.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(".butler.toml\n");
}

#[test]
fn shell_completions() {
    let home = TempDir::new().unwrap();
    butler(home.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("butler"));
}
