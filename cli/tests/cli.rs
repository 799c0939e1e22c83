use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output};

fn testdata(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("testdata")
        .join(relative)
}

fn blocks(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_blocks"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("spawn blocks")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn all_sample_cases_pass() {
    let root = testdata("");
    let output = blocks(&["test", "--no-color", root.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(
        stderr(&output).contains("test result: ok. 16 passed, 0 failed"),
        "{}",
        stderr(&output)
    );
}

#[test]
fn category_filter_runs_only_that_category() {
    let root = testdata("");
    let output = blocks(&["test", "--no-color", root.to_str().unwrap(), "-c", "math"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let report = stderr(&output);
    assert!(report.contains("3 passed"), "{}", report);
    assert!(!report.contains("control"), "{}", report);
}

#[test]
fn run_prints_bindings_as_toml() {
    let program = testdata("control/repeat.json");
    let output = blocks(&["run", program.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "n = 3\n");
}

#[test]
fn run_prints_bindings_as_json() {
    let program = testdata("control/for.json");
    let output = blocks(&["run", "--json", program.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    let bindings: serde_json::Value = serde_json::from_str(&stdout(&output)).expect("json");
    assert_eq!(bindings, serde_json::json!({ "i": 13, "sum": 22 }));
}

#[test]
fn run_reads_globals_file() {
    let mut globals = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(globals, "x = 0").expect("write globals");
    let program = testdata("control/sign.json");
    let output = blocks(&[
        "run",
        program.to_str().unwrap(),
        "--globals",
        globals.path().to_str().unwrap(),
    ]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "x = 0\nbranch = \"zero\"\n");
}

#[test]
fn null_bindings_are_commented_out() {
    let mut program = tempfile::NamedTempFile::new().expect("temp file");
    write!(program, r#"{{ "variables": [{{ "name": "unset" }}] }}"#).expect("write program");
    let output = blocks(&["run", program.path().to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "# unset = null\n");
}

#[test]
fn run_reports_evaluation_errors() {
    // Without a host value `x` stays null and cannot be ordered against a number.
    let program = testdata("control/sign.json");
    let output = blocks(&["run", program.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("type mismatch"), "{}", stderr(&output));
}

#[test]
fn generation_does_not_check_types() {
    let program = testdata("errors/number_condition.json");
    let output = blocks(&["generate", program.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(stdout(&output), "if (1) {\n  break;\n}\n");
}

#[test]
fn generate_prints_source() {
    let program = testdata("control/repeat.json");
    let output = blocks(&["generate", program.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\
var n, count0;

n = n;
for (count0 = 0; count0 < 3; count0 = count0 + 1) {
  n = (typeof n === \"number\" ? n : 0) + 1;
}
"
    );
}

#[test]
fn generate_reports_unsupported_kinds() {
    let program = testdata("math/properties.json");
    let output = blocks(&["generate", program.to_str().unwrap()]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unsupported operation"), "{}", stderr(&output));
}

#[test]
fn check_reports_malformed_json_with_location() {
    let program = testdata("errors/truncated.json");
    let output = blocks(&["check", "--no-color", program.to_str().unwrap()]);
    assert!(!output.status.success());
    let report = stderr(&output);
    assert!(report.contains("truncated.json:"), "{}", report);
    assert!(report.contains("could not parse"), "{}", report);
}

#[test]
fn check_lists_nested_blocks() {
    let program = testdata("control/repeat.json");
    let output = blocks(&["check", "--list-blocks", program.to_str().unwrap()]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "\
variables_set (global:n)
  VALUE: variables_get (global:n:value)
controls_repeat_ext (loop)
  TIMES: math_number
  DO: math_change
    DELTA: math_number
"
    );
}
