use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "modsynth-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_modsynth<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_modsynth");
    Command::new(bin)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("modsynth command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

const SAMPLE_MANIFEST: &str = r#"
[[loader]]
id = "prefix1"
match_only = "Prefix1::**"

[[loader.rule]]
pattern = "Prefix1::**"
fragments = ["our $TAIL = '{1}';"]

[[loader]]
id = "prefix2"
match_only = "Prefix2::**"

[[loader.rule]]
pattern = "Prefix2::Broken"
action = "fail"
message = "cannot build {name}"

[[loader.rule]]
pattern = "Prefix2::*"
fragments = ["sub leaf {{ '{1}' }}"]
"#;

fn write_manifest(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("modsynth.toml");
    fs::write(&path, text).expect("manifest should be written");
    path
}

#[test]
fn match_json_reports_captures() {
    let output = run_modsynth([
        "match",
        "Some::**::Class",
        "Some::Freaking::Class",
        "Some/Other/Freaking/Class.pm",
        "Other::Freaking::Class",
        "--json",
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["pattern"], "Some::**::Class");
    assert_eq!(payload["wildcards"], 1);
    let results = payload["results"].as_array().expect("results array");
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["captures"], serde_json::json!(["Freaking"]));
    assert_eq!(results[1]["name"], "Some::Other::Freaking::Class");
    assert_eq!(results[1]["captures"], serde_json::json!(["Other::Freaking"]));
    assert_eq!(results[2]["matched"], false);
    assert!(results[2]["captures"].is_null());
}

#[test]
fn match_text_output() {
    let output = run_modsynth(["match", "Foo::*", "Foo::Bar", "Foo"]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("Foo::Bar: match [Bar]"), "{text}");
    assert!(text.contains("Foo: no match"), "{text}");
}

#[test]
fn match_rejects_malformed_pattern() {
    let output = run_modsynth(["match", "Foo::", "Foo::Bar"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_text(&output).contains("empty segment"));
}

#[test]
fn check_json_lists_loaders() {
    let tmp = TempDirGuard::new("check-json");
    let manifest = write_manifest(tmp.path(), SAMPLE_MANIFEST);

    let output = run_modsynth([
        OsStr::new("check"),
        OsStr::new("--manifest"),
        manifest.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["result"], "accepted");
    assert_eq!(payload["registryPolicy"], "first_writer_wins");
    assert_eq!(payload["loaders"][0]["id"], "prefix1");
    assert_eq!(payload["loaders"][0]["matchOnly"], serde_json::json!(["Prefix1::**"]));
    assert_eq!(payload["loaders"][1]["rules"][0]["action"], "fail");
    assert_eq!(payload["emit"]["trailer"], "1;");
}

#[test]
fn check_rejects_invalid_manifest() {
    let tmp = TempDirGuard::new("check-invalid");
    let manifest = write_manifest(
        tmp.path(),
        "[[loader]]\n[[loader.rule]]\npattern = \"A::*\"\nfragments = [\"{3}\"]\n",
    );

    let output = run_modsynth([
        OsStr::new("check"),
        OsStr::new("--manifest"),
        manifest.as_os_str(),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_text(&output).contains("exceeds the 1 capture(s)"));
}

#[test]
fn resolve_text_prints_units_and_notes_unhandled() {
    let tmp = TempDirGuard::new("resolve-text");
    let manifest = write_manifest(tmp.path(), SAMPLE_MANIFEST);

    let output = run_modsynth([
        OsStr::new("resolve"),
        OsStr::new("--manifest"),
        manifest.as_os_str(),
        OsStr::new("Prefix2/Thing.pm"),
        OsStr::new("Prefix3::Thing"),
    ]);
    assert_success(&output);
    assert_eq!(
        stdout_text(&output),
        "package Prefix2::Thing;\nsub leaf { 'Thing' }\n1;\n"
    );
    assert!(stderr_text(&output).contains("no loader handled Prefix3::Thing"));
}

#[test]
fn resolve_logs_outcomes_only_when_verbose() {
    let tmp = TempDirGuard::new("resolve-verbose");
    let manifest = write_manifest(tmp.path(), SAMPLE_MANIFEST);
    let args = |verbose: bool| {
        let mut args = vec![
            OsStr::new("resolve"),
            OsStr::new("--manifest"),
            manifest.as_os_str(),
            OsStr::new("Prefix1::Thing"),
        ];
        if verbose {
            args.push(OsStr::new("--verbose"));
        }
        run_modsynth(args)
    };

    let quiet = args(false);
    assert_success(&quiet);
    assert!(!stderr_text(&quiet).contains("resolved"));

    let verbose = args(true);
    assert_success(&verbose);
    let stderr = stderr_text(&verbose);
    assert!(stderr.contains("resolved"), "{stderr}");
    assert!(stderr.contains("generated unit"), "{stderr}");
    assert_eq!(stdout_text(&verbose), stdout_text(&quiet));
}

#[test]
fn resolve_json_routes_by_match_only() {
    let tmp = TempDirGuard::new("resolve-json");
    let manifest = write_manifest(tmp.path(), SAMPLE_MANIFEST);

    let output = run_modsynth([
        OsStr::new("resolve"),
        OsStr::new("--manifest"),
        manifest.as_os_str(),
        OsStr::new("Prefix1::A::B"),
        OsStr::new("Prefix3::Thing"),
        OsStr::new("--json"),
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["loaders"], serde_json::json!(["prefix1", "prefix2"]));
    let results = payload["results"].as_array().expect("results array");
    assert_eq!(results[0]["result"], "generated");
    assert_eq!(results[0]["loader"], "prefix1");
    assert_eq!(results[0]["pattern"], "Prefix1::**");
    assert_eq!(
        results[0]["source"],
        "package Prefix1::A::B;\nour $TAIL = 'A::B';\n1;\n"
    );
    assert!(
        results[0]["digest"]
            .as_str()
            .is_some_and(|d| d.starts_with("sha256:"))
    );
    assert_eq!(results[1]["result"], "not_handled");
}

#[test]
fn resolve_generator_failure_exits_with_status_two() {
    let tmp = TempDirGuard::new("resolve-fail");
    let manifest = write_manifest(tmp.path(), SAMPLE_MANIFEST);

    let output = run_modsynth([
        OsStr::new("resolve"),
        OsStr::new("--manifest"),
        manifest.as_os_str(),
        OsStr::new("Prefix2::Broken"),
        OsStr::new("Prefix2::Fine"),
        OsStr::new("--json"),
    ]);
    assert_eq!(output.status.code(), Some(2));

    let payload = parse_json_stdout(&output);
    let results = payload["results"].as_array().expect("results array");
    assert_eq!(results[0]["result"], "error");
    assert!(
        results[0]["error"]
            .as_str()
            .is_some_and(|e| e.contains("cannot build Prefix2::Broken"))
    );
    assert_eq!(results[1]["result"], "generated");
}

#[test]
fn provenance_json_names_the_generating_loader() {
    let tmp = TempDirGuard::new("provenance-json");
    let manifest = write_manifest(tmp.path(), SAMPLE_MANIFEST);

    let output = run_modsynth([
        OsStr::new("provenance"),
        OsStr::new("--manifest"),
        manifest.as_os_str(),
        OsStr::new("Prefix1::Thing"),
        OsStr::new("Prefix3::Thing"),
        OsStr::new("--json"),
    ]);
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    let requests = payload["requests"].as_array().expect("requests array");
    assert_eq!(requests[0]["generated"], true);
    assert_eq!(requests[0]["generatedBy"], "prefix1");
    assert_eq!(requests[1]["generated"], false);
    assert!(requests[1]["generatedBy"].is_null());
    let records = payload["records"].as_array().expect("records array");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Prefix1::Thing");
    assert_eq!(records[0]["pattern"], "Prefix1::**");
    assert!(records[0]["recordedAt"].is_string());
}

#[test]
fn provenance_text_output() {
    let tmp = TempDirGuard::new("provenance-text");
    let manifest = write_manifest(tmp.path(), SAMPLE_MANIFEST);

    let output = run_modsynth([
        OsStr::new("provenance"),
        OsStr::new("--manifest"),
        manifest.as_os_str(),
        OsStr::new("Prefix2::Thing"),
        OsStr::new("Nowhere"),
    ]);
    assert_success(&output);
    let text = stdout_text(&output);
    assert!(text.contains("Prefix2::Thing: generated by prefix2"), "{text}");
    assert!(text.contains("Nowhere: not generated"), "{text}");
    assert!(text.contains("Loader prefix2: Prefix2::Thing"), "{text}");
}
