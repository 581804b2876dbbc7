use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

struct Fixture {
    project: TempDir,
    framework: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            project: TempDir::new().expect("project dir"),
            framework: TempDir::new().expect("framework dir"),
        };
        write(
            fixture.framework.path(),
            "package.json",
            r#"{ "name": "fw", "version": "3.2.1", "description": "Framework CLI" }"#,
        );
        fixture
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_launchpad"))
            .args(args)
            .current_dir(self.project.path())
            .env("LAUNCHPAD_HOME", self.framework.path())
            .env_remove("RUST_LOG")
            .output()
            .expect("run launchpad")
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).expect("mkdir");
    std::fs::write(path, content).expect("write");
}

fn echo_manifest(text: &str) -> String {
    format!(
        r#"{{ "description": "prints {text}", "exec": ["sh", "-c", "echo {text} \"$@\"", "sh"] }}"#
    )
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[cfg(unix)]
#[test]
fn e2e_runs_discovered_exec_command() {
    let fixture = Fixture::new();
    write(fixture.project.path(), "cli/greet.json", &echo_manifest("hello"));

    let output = fixture.run(&["greet", "world", "--loud"]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "hello world --loud");
}

#[cfg(unix)]
#[test]
fn e2e_project_command_shadows_framework_default() {
    let fixture = Fixture::new();
    write(fixture.project.path(), "src/cli/greet.json", &echo_manifest("project"));
    write(fixture.framework.path(), "cli/greet.json", &echo_manifest("framework"));
    write(fixture.framework.path(), "cli/extra.json", &echo_manifest("extra"));

    let output = fixture.run(&["greet"]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "project");

    let output = fixture.run(&["extra"]);
    assert_eq!(stdout(&output).trim(), "extra");
}

#[cfg(unix)]
#[test]
fn e2e_broken_module_is_a_warning() {
    let fixture = Fixture::new();
    write(fixture.project.path(), "cli/good.json", &echo_manifest("ok"));
    write(fixture.project.path(), "cli/bad.json", "{ broken");

    let output = fixture.run(&["good"]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "ok");
    let err = stderr(&output);
    assert!(err.contains("bad.json"), "Got:\n{}", err);
    assert!(err.contains("malformed module"), "Got:\n{}", err);
}

#[test]
fn e2e_help_lists_commands_and_title() {
    let fixture = Fixture::new();
    write(fixture.framework.path(), "cli/greet.json", &echo_manifest("hello"));

    let output = fixture.run(&["--help"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("Framework CLI 3.2.1"), "Got:\n{}", out);
    assert!(out.contains("greet"), "Got:\n{}", out);
    assert!(out.contains("prints hello"), "Got:\n{}", out);
    assert!(out.contains("--config"), "Got:\n{}", out);
}

#[test]
fn e2e_version_uses_package_identity() {
    let fixture = Fixture::new();
    write(
        fixture.project.path(),
        "package.json",
        r#"{ "name": "acme", "version": "0.9.0", "description": "Acme" }"#,
    );

    let output = fixture.run(&["--version"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "acme 0.9.0");
}

#[test]
fn e2e_config_builtin_reads_framework_config() {
    let fixture = Fixture::new();
    write(fixture.framework.path(), "config.json", r#"{ "region": "eu-west" }"#);
    write(fixture.framework.path(), "cli/config.json", r#"{ "builtin": "config" }"#);

    let output = fixture.run(&["config", "get", "region"]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "eu-west");
}

#[test]
fn e2e_config_flag_overlays_values() {
    let fixture = Fixture::new();
    write(fixture.framework.path(), "config.json", r#"{ "region": "eu-west" }"#);
    write(fixture.framework.path(), "cli/config.json", r#"{ "builtin": "config" }"#);
    write(fixture.project.path(), "local.json", r#"{ "region": "us-east" }"#);

    let output = fixture.run(&["--config", "local.json", "config", "get", "region"]);
    assert!(output.status.success(), "stderr:\n{}", stderr(&output));
    assert_eq!(stdout(&output).trim(), "us-east");
}

#[test]
fn e2e_unknown_command_fails() {
    let fixture = Fixture::new();
    let output = fixture.run(&["does-not-exist"]);
    assert!(!output.status.success());
}

#[cfg(unix)]
#[test]
fn e2e_failing_command_exits_nonzero() {
    let fixture = Fixture::new();
    write(
        fixture.project.path(),
        "cli/fail.json",
        r#"{ "exec": ["sh", "-c", "exit 4"] }"#,
    );

    let output = fixture.run(&["fail"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = stderr(&output);
    assert!(stderr.contains("Error: "));
    assert!(stderr.contains("exited with status 4"));
}
