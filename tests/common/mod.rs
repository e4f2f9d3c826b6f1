use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
    /// Args, status and both streams of the run, kept next to `home`.
    pub transcript: PathBuf,
}

/// Run the built `atl` binary against an isolated `home`.
///
/// Every inherited `ATL_*` variable is cleared so the caller's shell cannot
/// change config or output mode. The transcript lands in `home`, which the
/// test's tempdir cleans up.
pub fn run_cli_case(case_name: &str, home: &Path, args: &[&str]) -> CmdResult {
    let mut command = Command::new(env!("CARGO_BIN_EXE_atl"));
    command
        .args(args)
        .env("HOME", home)
        .env("NO_COLOR", "1")
        .env("RUST_BACKTRACE", "1");
    for (key, _) in std::env::vars_os() {
        if key.to_string_lossy().starts_with("ATL_") {
            command.env_remove(key);
        }
    }
    let output = command.output().expect("execute atl");

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    let mut transcript = String::new();
    let _ = writeln!(transcript, "$ atl {}", args.join(" "));
    let _ = writeln!(transcript, "{}", output.status);
    let _ = writeln!(transcript, "--- stdout\n{stdout}\n--- stderr\n{stderr}");
    let transcript_path = home.join(format!("{case_name}.transcript"));
    fs::write(&transcript_path, transcript).expect("write transcript");

    CmdResult {
        status: output.status,
        stdout,
        stderr,
        transcript: transcript_path,
    }
}
