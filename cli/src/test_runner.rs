use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use engine::{Execution, RuntimeValue, Workspace};

use crate::values;

const SUFFIX: &str = ".test.toml";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TestCase {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Program file, relative to the test file.
    pub program: PathBuf,

    /// Initial root bindings.
    #[serde(default)]
    pub globals: toml::Table,

    #[serde(default)]
    pub expect: Expectations,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Expectations {
    /// Root bindings that must hold after the run. Other bindings are ignored.
    #[serde(default)]
    pub bindings: Option<toml::Table>,

    /// Evaluation must fail with an error containing this substring.
    #[serde(default)]
    pub error: Option<String>,

    /// Parsing must fail.
    #[serde(default)]
    pub parse_error: bool,

    /// Generation must fail with an error containing this substring.
    #[serde(default)]
    pub generate_error: Option<String>,

    /// The emitted source must contain each of these.
    #[serde(default)]
    pub code_contains: Vec<String>,
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match read_case(path) {
        Ok(case) => {
            let outcome = match check_case(path, &case) {
                Ok(()) => TestOutcome::Pass,
                Err(reason) => TestOutcome::Fail(reason),
            };
            (case.description, outcome)
        }
        Err(reason) => (None, TestOutcome::Fail(reason)),
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

fn read_case(path: &Path) -> Result<TestCase, String> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("cannot read file: {}", e))?;
    toml::from_str(&content).map_err(|e| format!("TOML parse error: {}", e))
}

/// Check every expectation of one case. `Err` carries the failure reason.
fn check_case(path: &Path, case: &TestCase) -> Result<(), String> {
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let program_path = base_dir.join(&case.program);
    let source = std::fs::read_to_string(&program_path)
        .map_err(|e| format!("cannot read program '{}': {}", program_path.display(), e))?;

    let expect = &case.expect;
    let parsed = engine::parse_program(&source);
    if expect.parse_error {
        return match parsed {
            Err(_) => Ok(()),
            Ok(_) => Err("expected parse error, but parsing succeeded".into()),
        };
    }
    let workspace = parsed.map_err(|e| format!("unexpected parse error: {}", e))?;
    debug!(case = %path.display(), chains = workspace.len(), "running case");

    check_generation(&workspace, expect)?;

    let globals = values::bindings_from_table(&case.globals).map_err(|e| format!("{:#}", e))?;
    let result = workspace.run(globals);
    match (&expect.error, result) {
        (Some(expected), Err(error)) => {
            let message = error.to_string();
            if message.contains(expected.as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "expected error containing \"{}\", got: {}",
                    expected, message
                ))
            }
        }
        (Some(expected), Ok(_)) => Err(format!(
            "expected error containing \"{}\", but execution succeeded",
            expected
        )),
        (None, Err(error)) => Err(format!("unexpected runtime error: {}", error)),
        (None, Ok(execution)) => match &expect.bindings {
            Some(bindings) => check_bindings(&execution, bindings),
            None => Ok(()),
        },
    }
}

fn check_generation(workspace: &Workspace, expect: &Expectations) -> Result<(), String> {
    if expect.generate_error.is_none() && expect.code_contains.is_empty() {
        return Ok(());
    }
    let program = match (workspace.compile(), &expect.generate_error) {
        (Err(error), Some(expected)) => {
            let message = error.to_string();
            return if message.contains(expected.as_str()) {
                Ok(())
            } else {
                Err(format!(
                    "expected generate error containing \"{}\", got: {}",
                    expected, message
                ))
            };
        }
        (Ok(_), Some(expected)) => {
            return Err(format!(
                "expected generate error containing \"{}\", but generation succeeded",
                expected
            ));
        }
        (Err(error), None) => return Err(format!("unexpected generate error: {}", error)),
        (Ok(program), None) => program,
    };

    let code = engine::codegen::emit::emit_program(&program);
    let missing: Vec<&str> = expect
        .code_contains
        .iter()
        .map(String::as_str)
        .filter(|needle| !code.contains(needle))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(format!(
            "generated source is missing {:?}\n  source:\n{}",
            missing,
            indent(&code)
        ))
    }
}

fn check_bindings(execution: &Execution, expected: &toml::Table) -> Result<(), String> {
    for (name, value) in expected {
        let want = values::from_toml(value).map_err(|e| format!("binding `{}`: {:#}", name, e))?;
        let got = execution
            .variables
            .get(name)
            .cloned()
            .unwrap_or(RuntimeValue::Null);
        if got != want {
            return Err(format!(
                "binding `{}` mismatch\n  expected: {}\n  actual:   {}",
                name,
                want.to_json(),
                got.to_json()
            ));
        }
    }
    Ok(())
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Case files grouped by category: the sub-directory they sit in, relative
/// to the suite root. Files at the root itself have the empty category.
struct Suite {
    categories: BTreeMap<String, Vec<PathBuf>>,
}

impl Suite {
    fn single(path: &Path) -> Self {
        Suite {
            categories: BTreeMap::from([(String::new(), vec![path.to_path_buf()])]),
        }
    }

    fn discover(root: &Path) -> Self {
        let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for path in entries.flatten().map(|entry| entry.path()) {
                if path.is_dir() {
                    pending.push(path);
                } else if is_case_file(&path) {
                    let category = dir
                        .strip_prefix(root)
                        .map(|rel| rel.to_string_lossy().replace('\\', "/"))
                        .unwrap_or_default();
                    categories.entry(category).or_default().push(path);
                }
            }
        }
        for files in categories.values_mut() {
            files.sort();
        }
        Suite { categories }
    }

    fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    fn names(&self) -> String {
        self.categories
            .keys()
            .map(|name| category_label(name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Keep the requested categories and their sub-categories; everything
    /// when nothing is requested.
    fn select(self, requested: &[String]) -> Suite {
        if requested.is_empty() {
            return self;
        }
        let wanted: Vec<&str> = requested.iter().map(|r| r.trim_matches('/')).collect();
        for want in &wanted {
            if !self.categories.keys().any(|name| within(name, want)) {
                eprintln!(
                    "warning: category '{}' not found (available: {})",
                    want,
                    self.names()
                );
            }
        }
        let categories = self
            .categories
            .into_iter()
            .filter(|(name, _)| wanted.iter().any(|want| within(name, want)))
            .collect();
        Suite { categories }
    }
}

fn is_case_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| name.ends_with(SUFFIX))
}

fn within(category: &str, requested: &str) -> bool {
    category == requested
        || category
            .strip_prefix(requested)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn category_label(name: &str) -> &str {
    if name.is_empty() { "(root)" } else { name }
}

pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }
    let suite = Suite::discover(path);
    if suite.is_empty() {
        eprintln!("no {} files found in {}", SUFFIX, path.display());
        return;
    }
    eprintln!("available categories:");
    for (name, files) in &suite.categories {
        eprintln!("  {} ({} tests)", category_label(name), files.len());
    }
}

/// Collects outcomes and prints the PASS/FAIL lines and the summary.
struct Report {
    no_color: bool,
    passed: usize,
    failures: Vec<TestResult>,
}

impl Report {
    fn new(no_color: bool) -> Self {
        Report {
            no_color,
            passed: 0,
            failures: Vec::new(),
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn header(&self, category: &str) {
        eprintln!();
        eprintln!("{}", self.paint(category_label(category), "1"));
    }

    fn record(&mut self, result: TestResult) {
        let label = label_for(&result);
        if let TestOutcome::Fail(_) = result.outcome {
            eprintln!("  {}  {}", self.paint("FAIL", "31"), label);
            self.failures.push(result);
        } else {
            eprintln!("  {}  {}", self.paint("PASS", "32"), label);
            self.passed += 1;
        }
    }

    /// Print failure details and the summary line; returns the exit code.
    fn finish(self) -> i32 {
        if !self.failures.is_empty() {
            eprintln!();
            eprintln!("failures:");
        }
        for result in &self.failures {
            eprintln!();
            eprintln!("  --- {} ---", result.path.display());
            if let TestOutcome::Fail(reason) = &result.outcome {
                reason.lines().for_each(|line| eprintln!("  {}", line));
            }
        }

        eprintln!();
        let failed = self.failures.len();
        if failed == 0 {
            eprintln!("test result: {}. {} passed, 0 failed", self.paint("ok", "32"), self.passed);
            0
        } else {
            eprintln!(
                "test result: {}. {} passed, {} failed (of {})",
                self.paint("FAILED", "31"),
                self.passed,
                failed,
                self.passed + failed
            );
            1
        }
    }
}

fn label_for(result: &TestResult) -> String {
    if let Some(description) = &result.description {
        return description.clone();
    }
    result
        .path
        .file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.trim_end_matches(SUFFIX).to_string())
        .unwrap_or_else(|| "?".to_string())
}

/// Run all `.test.toml` files under `path` (or a single file), limited to
/// `categories` when any are given. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let single = path.is_file();
    let suite = if single {
        Suite::single(path)
    } else {
        let suite = Suite::discover(path);
        if suite.is_empty() {
            eprintln!("no {} files found in {}", SUFFIX, path.display());
            return 1;
        }
        suite.select(categories)
    };
    if suite.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut report = Report::new(no_color);
    for (category, files) in &suite.categories {
        if !single {
            report.header(category);
        }
        for file in files {
            report.record(run_single_test(file));
        }
    }
    report.finish()
}
