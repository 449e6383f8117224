/// Smoke tests to verify the binary runs without panicking
use std::process::Command;

fn moodtree() -> Command {
    Command::new(env!("CARGO_BIN_EXE_moodtree"))
}

#[test]
fn binary_shows_help() {
    let output = moodtree().arg("--help").output().expect("Failed to run moodtree");

    assert!(
        output.status.success(),
        "Binary failed to run --help: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("moodtree"), "Help output should mention moodtree");
    assert!(stdout.contains("grow") && stdout.contains("print"));
}

#[test]
fn binary_shows_version() {
    let output = moodtree().arg("--version").output().expect("Failed to run moodtree");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("0.1.0"));
}

#[test]
fn invalid_subcommand_fails_gracefully() {
    let output = moodtree().arg("nonexistent-command").output().expect("Failed to run moodtree");

    assert!(!output.status.success(), "Invalid subcommand should return error status");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("panicked at"), "Invalid subcommand should not cause panic");
}

#[test]
fn print_writes_braille_tree() {
    let output = moodtree()
        .args(["print", "--mood", "0.9", "--frames", "30", "--seed", "7", "--cols", "60", "--rows", "20"])
        .env("HOME", std::env::temp_dir())
        .env("XDG_CONFIG_HOME", std::env::temp_dir().join("moodtree-smoke"))
        .output()
        .expect("Failed to run moodtree");

    assert!(
        output.status.success(),
        "print failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 20);
    assert!(stdout.chars().any(|c| ('\u{2801}'..='\u{28ff}').contains(&c)));
}

#[test]
fn unknown_style_is_rejected() {
    let output = moodtree()
        .args(["print", "--style", "tulip", "--cols", "40", "--rows", "10"])
        .env("XDG_CONFIG_HOME", std::env::temp_dir().join("moodtree-smoke"))
        .output()
        .expect("Failed to run moodtree");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("tulip"));
    assert!(!stderr.contains("panicked at"));
}
