use std::process::Command;

use modelmark_compiler::{
    compile_schema, entity_summary, CompilerConfig, CompilerError, CompilerOptions,
    DialectSelection,
};
use modelmark_compiler_diagnostics::DiagnosticCode;
use modelmark_test_utils::{fixture_path, list_fixtures, read_fixture};

fn check_command() -> Command {
    Command::new(env!("CARGO_BIN_EXE_modelmark-check"))
}

#[test]
fn test_compile_valid_fixtures() {
    for dir in ["current", "legacy"] {
        for fixture in list_fixtures(dir) {
            let source = read_fixture(&format!("{dir}/{fixture}"));
            if let Err(err) = compile_schema(&source, &CompilerOptions::default()) {
                panic!("{dir}/{fixture} failed to compile: {err} {:?}", err.diagnostics());
            }
        }
    }
}

#[test]
fn test_compile_invalid_fixtures() {
    for fixture in list_fixtures("invalid") {
        let source = read_fixture(&format!("invalid/{fixture}"));
        let err = compile_schema(&source, &CompilerOptions::default()).unwrap_err();
        assert!(matches!(err, CompilerError::SemanticErrors(_)), "{fixture}: {err}");
    }
}

#[test]
fn test_shop_summary() {
    let output =
        compile_schema(&read_fixture("current/shop.md"), &CompilerOptions::default()).unwrap();
    let summary = output
        .document
        .entities()
        .map(entity_summary)
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(summary, @r"
    interface IEntity: 3 fields
    interface IAuditable: 2 fields
    model Customer: 10 fields (inherits IAuditable, IEntity)
    model Order: 8 fields (inherits IEntity)
    model OrderLine: 6 fields (inherits IEntity)
    model Product: 6 fields (inherits IEntity)
    enum OrderStatus: 4 values
    ");
}

#[test]
fn test_cycle_warning_can_fail_compilation() {
    let source = read_fixture("current/cycles.md");
    let output = compile_schema(&source, &CompilerOptions::default()).unwrap();
    assert!(output.warnings.contains_code(DiagnosticCode::CycleDetected));

    let strict = CompilerOptions {
        fail_on_warnings: true,
        ..CompilerOptions::default()
    };
    let err = compile_schema(&source, &strict).unwrap_err();
    assert_eq!(err.diagnostics()[0].code, DiagnosticCode::CycleDetected);
}

#[test]
fn test_config_file_drives_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("modelmark.toml");
    std::fs::write(
        &path,
        "[compiler]\ndialect = \"legacy\"\ninfer_foreign_keys = false\n",
    )
    .unwrap();

    let options = CompilerConfig::from_path(&path).unwrap().options();
    assert_eq!(options.dialect, DialectSelection::Legacy);

    let output = compile_schema("## Order\n- CustomerId: guid\n## Customer\n", &options).unwrap();
    let order = output.document.model("Order").unwrap();
    assert!(!order.full_field("CustomerId").unwrap().is_foreign_key());
}

#[test]
fn test_missing_config_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(CompilerConfig::from_path(&dir.path().join("missing.toml")).is_err());
}

#[test]
fn test_check_binary_accepts_fixture() {
    let res = check_command()
        .arg("--input")
        .arg(fixture_path("legacy/crm.md"))
        .output()
        .expect("Failed to run modelmark-check");
    assert!(
        res.status.success(),
        "modelmark-check failed with error: {}",
        String::from_utf8_lossy(&res.stderr)
    );
    let stdout = String::from_utf8_lossy(&res.stdout);
    assert!(stdout.contains("model Account: 7 fields (inherits BaseEntity, IAuditable)"));
    assert!(stdout.contains("No issues found"));
}

#[test]
fn test_check_binary_rejects_invalid_fixture() {
    let res = check_command()
        .arg("--input")
        .arg(fixture_path("invalid/unknown_parent.md"))
        .output()
        .expect("Failed to run modelmark-check");
    assert!(!res.status.success());
    assert!(String::from_utf8_lossy(&res.stderr).contains("unknown_parent.md"));
}

#[test]
fn test_check_binary_honours_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("modelmark.toml");
    std::fs::write(&config, "[compiler]\nfail_on_warnings = true\n").unwrap();

    let res = check_command()
        .arg("--input")
        .arg(fixture_path("current/cycles.md"))
        .arg("--config")
        .arg(&config)
        .output()
        .expect("Failed to run modelmark-check");
    assert!(!res.status.success());
}
