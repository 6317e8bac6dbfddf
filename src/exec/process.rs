//! Shared subprocess plumbing for executor backends.
//!
//! Failures of the external tool (including a missing binary) are folded
//! into an [`ExecResult`] with a non-zero exit code so callers can inspect
//! exit codes uniformly; nothing here raises for a failed command.

use crate::exec::{ExecResult, StdinSource};
use std::fs::File;
use std::io::{Read, Write};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// Exit code reported when the child could not be spawned at all.
pub(crate) const SPAWN_FAILURE_CODE: i32 = 127;

/// Run a command, capturing stdout/stderr.
pub(crate) fn capture(cmd: &mut Command, stdin: Option<&StdinSource>) -> ExecResult {
    let cmd_debug = format!("{:?}", cmd);

    match stdin {
        None => {
            cmd.stdin(Stdio::null());
        }
        Some(StdinSource::Bytes(_)) => {
            cmd.stdin(Stdio::piped());
        }
        Some(StdinSource::File(path)) => match File::open(path) {
            Ok(file) => {
                cmd.stdin(Stdio::from(file));
            }
            Err(e) => {
                return spawn_failure(&cmd_debug, &format!("cannot open {}: {}", path.display(), e));
            }
        },
    }

    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return spawn_failure(&cmd_debug, &e.to_string()),
    };

    if let Some(StdinSource::Bytes(bytes)) = stdin
        && let Some(mut pipe) = child.stdin.take()
    {
        // Feed stdin from a thread so a chatty child cannot deadlock us;
        // broken-pipe is ignored, the child may exit before reading it all.
        let bytes = bytes.clone();
        thread::spawn(move || {
            let _ = pipe.write_all(&bytes);
        });
    }

    match child.wait_with_output() {
        Ok(output) => ExecResult {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        },
        Err(e) => spawn_failure(&cmd_debug, &e.to_string()),
    }
}

/// Run a command with inherited terminal I/O. Blocks until the user exits
/// the external program; stdout/stderr in the result are empty.
pub(crate) fn interactive(cmd: &mut Command) -> ExecResult {
    let cmd_debug = format!("{:?}", cmd);

    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    match cmd.status() {
        Ok(status) => ExecResult {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: status.code().unwrap_or(-1),
        },
        Err(e) => spawn_failure(&cmd_debug, &e.to_string()),
    }
}

/// Run a command under a hard deadline. Returns `None` when the deadline
/// passes (the child is killed), used by the remote connectivity probe.
pub(crate) fn capture_with_timeout(cmd: &mut Command, timeout: Duration) -> Option<ExecResult> {
    let cmd_debug = format!("{:?}", cmd);

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = match cmd.spawn() {
        Ok(child) => child,
        Err(e) => return Some(spawn_failure(&cmd_debug, &e.to_string())),
    };

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_thread = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(out) = stdout {
            let _ = std::io::BufReader::new(out).read_to_end(&mut buf);
        }
        buf
    });
    let stderr_thread = thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(err) = stderr {
            let _ = std::io::BufReader::new(err).read_to_end(&mut buf);
        }
        buf
    });

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    let _ = stdout_thread.join();
                    let _ = stderr_thread.join();
                    return None;
                }
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => return Some(spawn_failure(&cmd_debug, &e.to_string())),
        }
    };

    let stdout = stdout_thread.join().unwrap_or_default();
    let stderr = stderr_thread.join().unwrap_or_default();

    Some(ExecResult {
        stdout: String::from_utf8_lossy(&stdout).into_owned(),
        stderr: String::from_utf8_lossy(&stderr).into_owned(),
        exit_code: status.code().unwrap_or(-1),
    })
}

fn spawn_failure(command: &str, reason: &str) -> ExecResult {
    ExecResult {
        stdout: String::new(),
        stderr: format!("failed to run {}: {}", command, reason),
        exit_code: SPAWN_FAILURE_CODE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_missing_binary_reports_spawn_failure() {
        let mut cmd = Command::new("definitely-not-a-real-binary-xyz");
        let result = capture(&mut cmd, None);
        assert_eq!(result.exit_code, SPAWN_FAILURE_CODE);
        assert!(result.stderr.contains("failed to run"));
    }

    #[test]
    fn capture_collects_stdout_and_exit_code() {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "printf hello; exit 3"]);
        let result = capture(&mut cmd, None);
        assert_eq!(result.stdout, "hello");
        assert_eq!(result.exit_code, 3);
        assert!(!result.success());
    }

    #[test]
    fn capture_feeds_stdin_bytes() {
        let mut cmd = Command::new("cat");
        let result = capture(&mut cmd, Some(&StdinSource::Bytes(b"ping".to_vec())));
        assert_eq!(result.stdout, "ping");
        assert!(result.success());
    }

    #[test]
    fn timeout_kills_long_running_child() {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        let result = capture_with_timeout(&mut cmd, Duration::from_millis(200));
        assert!(result.is_none());
    }

    #[test]
    fn timeout_returns_result_for_fast_child() {
        let mut cmd = Command::new("true");
        let result = capture_with_timeout(&mut cmd, Duration::from_secs(5)).expect("fast child");
        assert!(result.success());
    }
}
