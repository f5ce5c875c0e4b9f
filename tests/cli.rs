use std::{fs, path::PathBuf, process::Command};

fn fabfront() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fabfront"))
}

fn scratch(name: &str, text: &str) -> PathBuf {
    let path = PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join(name);
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn reports_crate_version() {
    let output = fabfront().arg("--version").output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert_eq!(stdout.trim(), format!("fab front end {}", env!("CARGO_PKG_VERSION")));
}

#[test]
fn dumps_tokens() {
    let path = scratch("dump.fab", "if x\n");
    let output = fabfront().arg("-t").arg(&path).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert_eq!(stdout.lines().count(), 4);
    assert!(stdout.lines().next().unwrap().ends_with(": `if`"));
}

#[test]
fn lexical_errors_fail() {
    let path = scratch("bad.fab", "a \u{e9}\n");
    let output = fabfront().arg(&path).output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Lexical error: Bad byte 0xc3 in input stream"));
}

#[test]
fn expands_macro_files() {
    let path = scratch("greet.macrofab", "#:x:# hello #x#");
    let output = fabfront()
        .args(["-m"])
        .arg(&path)
        .args(["-a", "Bob"])
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), " hello Bob");
}
