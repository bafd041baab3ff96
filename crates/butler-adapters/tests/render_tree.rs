//! End-to-end runs of the two-phase renderer over real and in-memory trees.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use butler_adapters::{FsOp, LocalFilesystem, LocalTemplateSource, MarkerEngine, MemoryFilesystem};
use butler_core::{
    application::{ApplicationError, ScaffoldOptions, ScaffoldService, ports::Filesystem},
    domain::{Context, JobError, Phase, RenderPhase, TemplateEntry},
    error::ButlerError,
};
use tempfile::TempDir;

fn service(filesystem: Arc<dyn Filesystem>) -> ScaffoldService {
    ScaffoldService::new(
        filesystem,
        Arc::new(MarkerEngine::new()),
        ScaffoldOptions {
            workers: 4,
            ..ScaffoldOptions::default()
        },
    )
}

fn context(root: &Path) -> Context {
    Context::builder("demo")
        .path(root)
        .variable("module", "HttpServer")
        .build()
        .unwrap()
}

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn local_service() -> ScaffoldService {
    service(Arc::new(LocalFilesystem::new()))
}

#[test]
fn renders_directory_file_name_and_body() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "butler{.Project.Name}/butler{.Project.Name}.go",
        b"package butler{.Project.Name}\n",
    );

    let report = local_service().render_tree(context(dir.path())).unwrap();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(
        fs::read_to_string(dir.path().join("demo/demo.go")).unwrap(),
        "package demo\n"
    );
    assert!(!dir.path().join("butler{.Project.Name}").exists());
    assert_eq!(report.directories_renamed, 1);
    assert_eq!(report.files_moved, 1);
}

#[test]
fn binary_files_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let png = b"\x89PNG\r\n\x1a\nbutler{.Project.Name}\xff\x00";
    write(dir.path(), "assets/butler{.Project.Name}.png", png);

    let report = local_service().render_tree(context(dir.path())).unwrap();

    assert!(report.is_success());
    assert_eq!(
        fs::read(dir.path().join("assets/butler{.Project.Name}.png")).unwrap(),
        png
    );
    assert!(!dir.path().join("assets/demo.png").exists());
}

#[test]
fn malformed_marker_fails_only_its_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "broken.txt", b"oops butler{.Project.Name");
    write(dir.path(), "ok.txt", b"name: butler{.Project.Name}");
    write(dir.path(), "src/other.go", b"package butler{toSnakeCase .Vars.module}");

    let report = local_service().render_tree(context(dir.path())).unwrap();

    assert_eq!(report.failed(), 1);
    let failure = report
        .failure_for(&dir.path().join("broken.txt"))
        .expect("broken.txt should fail");
    assert_eq!(failure.phase, Phase::File);
    assert!(matches!(
        &failure.error,
        JobError::Render(e) if e.phase == RenderPhase::Parse
    ));

    assert_eq!(
        fs::read_to_string(dir.path().join("broken.txt")).unwrap(),
        "oops butler{.Project.Name"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("ok.txt")).unwrap(),
        "name: demo"
    );
    assert_eq!(
        fs::read_to_string(dir.path().join("src/other.go")).unwrap(),
        "package http_server"
    );
}

#[test]
fn second_run_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "butler{.Project.Name}/main.go", b"package butler{.Project.Name}");
    write(dir.path(), "README.md", b"# butler{.Project.Name}");

    let first = local_service().render_tree(context(dir.path())).unwrap();
    assert!(first.is_success());
    let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();

    let second = local_service().render_tree(context(dir.path())).unwrap();
    assert!(second.is_success());
    assert_eq!(second.directories_renamed, 0);
    assert_eq!(second.files_rendered, 0);
    assert_eq!(second.files_moved, 0);
    assert_eq!(second.unchanged, second.succeeded);
    assert_eq!(
        fs::read_to_string(dir.path().join("README.md")).unwrap(),
        readme
    );
}

#[test]
fn excluded_and_hidden_subtrees_are_untouched() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "node_modules/butler{.Project.Name}/x.js", b"butler{.Project.Name}");
    write(dir.path(), ".github/butler{.Project.Name}.yml", b"butler{.Project.Name}");
    write(dir.path(), "main.go", b"butler{.Project.Name}");

    let report = local_service().render_tree(context(dir.path())).unwrap();

    assert!(report.is_success());
    assert_eq!(report.total(), 1);
    assert_eq!(
        fs::read_to_string(dir.path().join("node_modules/butler{.Project.Name}/x.js")).unwrap(),
        "butler{.Project.Name}"
    );
    assert!(dir.path().join(".github/butler{.Project.Name}.yml").exists());
}

#[test]
fn nested_renames_compose() {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "butler{.Project.Name}/butler{toSnakeCase .Vars.module}/butler{.Vars.module}.txt",
        b"butler{.Vars.module | toKebabCase}",
    );

    let report = local_service().render_tree(context(dir.path())).unwrap();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.directories_renamed, 2);
    assert_eq!(
        fs::read_to_string(dir.path().join("demo/http_server/HttpServer.txt")).unwrap(),
        "http-server"
    );
}

#[test]
fn rename_onto_existing_directory_keeps_the_original() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "demo/keep.txt", b"existing");
    write(dir.path(), "butler{.Project.Name}/new.txt", b"new");

    let report = local_service().render_tree(context(dir.path())).unwrap();

    let failure = report
        .failure_for(&dir.path().join("butler{.Project.Name}"))
        .expect("rename should fail");
    assert_eq!(failure.phase, Phase::Directory);
    assert!(dir.path().join("butler{.Project.Name}/new.txt").exists());
    assert_eq!(
        fs::read_to_string(dir.path().join("demo/keep.txt")).unwrap(),
        "existing"
    );

    // two directories and two files, each counted once
    assert_eq!(report.failed(), 1);
    assert_eq!(report.succeeded, 3);
    assert_eq!(report.total(), 4);
    assert_eq!(report.directories_renamed, 0);
}

#[test]
fn rendered_file_name_replaces_existing_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "demo.txt", b"stale");
    write(dir.path(), "butler{.Project.Name}.txt", b"fresh butler{.Project.Name}");

    let report = local_service().render_tree(context(dir.path())).unwrap();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(
        fs::read_to_string(dir.path().join("demo.txt")).unwrap(),
        "fresh demo"
    );
    assert!(!dir.path().join("butler{.Project.Name}.txt").exists());
    assert_eq!(report.files_moved, 1);
}

#[cfg(unix)]
#[test]
fn executable_bit_follows_renamed_files() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    write(dir.path(), "bin/butler{.Project.Name}.sh", b"#!/bin/sh\necho butler{.Project.Name}\n");
    let script = dir.path().join("bin/butler{.Project.Name}.sh");
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let report = local_service().render_tree(context(dir.path())).unwrap();

    assert!(report.is_success());
    let mode = fs::metadata(dir.path().join("bin/demo.sh"))
        .unwrap()
        .permissions()
        .mode();
    assert_ne!(mode & 0o111, 0);
}

#[test]
fn missing_destination_aborts_before_any_job() {
    let dir = TempDir::new().unwrap();
    let err = local_service()
        .render_tree(context(&dir.path().join("absent")))
        .unwrap_err();
    assert!(matches!(
        err,
        ButlerError::Application(ApplicationError::DestinationMissing { .. })
    ));
}

#[test]
fn io_fault_is_isolated_to_its_file() {
    let memory = MemoryFilesystem::new();
    memory
        .add_file("p/a.txt", "butler{.Project.Name}")
        .add_file("p/b.txt", "butler{.Project.Name}")
        .add_file("p/c.txt", "butler{.Project.Name}")
        .inject_fault(FsOp::Read, "p/b.txt");

    let report = service(Arc::new(memory.clone()))
        .render_tree(context(Path::new("p")))
        .unwrap();

    assert_eq!(report.succeeded, 2);
    assert!(matches!(
        report.failure_for(Path::new("p/b.txt")).map(|f| &f.error),
        Some(JobError::Io { operation: "read", .. })
    ));
    assert_eq!(memory.file_text("p/a.txt").as_deref(), Some("demo"));
    assert_eq!(memory.file_text("p/c.txt").as_deref(), Some("demo"));
}

#[test]
fn renames_land_before_file_jobs_start() {
    let memory = MemoryFilesystem::new();
    for i in 0..20 {
        memory.add_file(
            format!("p/butler{{.Project.Name}}/d{i}/butler{{.Project.Name}}.txt"),
            "x",
        );
    }

    let report = service(Arc::new(memory.clone()))
        .render_tree(context(Path::new("p")))
        .unwrap();

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.files_moved, 20);
    for i in 0..20 {
        assert!(memory.has_file(format!("p/demo/d{i}/demo.txt")));
    }
    assert!(!memory.has_dir("p/butler{.Project.Name}"));
}

#[test]
fn scaffold_copies_then_renders() {
    let dir = TempDir::new().unwrap();
    let template = dir.path().join("tpl");
    write(&template, "butler{.Project.Name}/main.go", b"package butler{.Project.Name}");
    write(&template, ".git/HEAD", b"ref: refs/heads/main");
    let dest = dir.path().join("out");

    let filesystem: Arc<dyn Filesystem> = Arc::new(LocalFilesystem::new());
    let service = service(Arc::clone(&filesystem))
        .with_source(Box::new(LocalTemplateSource::new(filesystem)));
    let entry = TemplateEntry::new("go", template.display().to_string());

    let report = service.scaffold(&entry, context(&dest), false).unwrap();
    assert!(report.is_success());
    assert_eq!(
        fs::read_to_string(dest.join("demo/main.go")).unwrap(),
        "package demo"
    );
    assert!(!dest.join(".git").exists());

    let err = service.scaffold(&entry, context(&dest), false).unwrap_err();
    assert!(matches!(
        err,
        ButlerError::Application(ApplicationError::ProjectExists { .. })
    ));
}
