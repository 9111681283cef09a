//! Helpers for running collaborator child processes with timeouts and bounded output.

use std::io::Read;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, error, instrument, warn};
use wait_timeout::ChildExt;

/// Limits applied to every child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessLimits {
    pub timeout: Duration,
    pub output_limit_bytes: usize,
}

impl Default for ProcessLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(300),
            output_limit_bytes: 100_000,
        }
    }
}

/// Exit status plus captured streams of one collaborator command.
#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub stdout_truncated: usize,
    pub stderr_truncated: usize,
    pub timed_out: bool,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.status.success()
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    /// One-line failure reason suitable for reports.
    pub fn failure_reason(&self, limits: &ProcessLimits) -> String {
        if self.timed_out {
            return format!("timed out after {}s", limits.timeout.as_secs());
        }
        let stderr = self.stderr_text();
        let stderr = stderr.trim();
        let detail = if stderr.is_empty() {
            self.stdout_text().trim().to_string()
        } else {
            stderr.to_string()
        };
        match self.status.code() {
            Some(code) if detail.is_empty() => format!("exit status {code}"),
            Some(code) => format!("exit status {code}: {detail}"),
            None => format!("terminated by signal: {detail}"),
        }
    }
}

/// Run `program args...` in `workdir` and fail unless it exits successfully.
pub fn run_checked(
    program: &str,
    args: &[&str],
    workdir: &Path,
    limits: &ProcessLimits,
) -> Result<CommandOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args).current_dir(workdir);
    let output = run_command_with_timeout(cmd, *limits)
        .with_context(|| format!("spawn {program} {}", args.join(" ")))?;
    if !output.success() {
        return Err(anyhow!(
            "{program} {} failed: {}",
            args.join(" "),
            output.failure_reason(limits)
        ));
    }
    Ok(output)
}

/// Spawn `cmd`, kill it after `limits.timeout`, and collect both streams.
///
/// Reader threads drain stdout and stderr while the child runs so a chatty `git` or `gh` cannot
/// block on a full pipe. At most `output_limit_bytes` per stream is kept; the rest is counted.
#[instrument(skip_all, fields(timeout_secs = limits.timeout.as_secs()))]
pub fn run_command_with_timeout(mut cmd: Command, limits: ProcessLimits) -> Result<CommandOutput> {
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());

    debug!(program = ?cmd.get_program(), "spawning child process");
    let mut child = match cmd.spawn() {
        Ok(c) => c,
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            return Err(e).context("spawn command");
        }
    };

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| anyhow!("stdout was not piped"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| anyhow!("stderr was not piped"))?;

    let limit = limits.output_limit_bytes;
    let stdout_handle = thread::spawn(move || read_stream_limited(stdout, limit));
    let stderr_handle = thread::spawn(move || read_stream_limited(stderr, limit));

    let mut timed_out = false;
    let status = match child
        .wait_timeout(limits.timeout)
        .context("wait for command")?
    {
        Some(status) => status,
        None => {
            warn!(
                timeout_secs = limits.timeout.as_secs(),
                "command timed out, killing"
            );
            timed_out = true;
            child.kill().context("kill command")?;
            child.wait().context("wait command after kill")?
        }
    };

    let (stdout, stdout_truncated) = join_output(stdout_handle).context("join stdout")?;
    let (stderr, stderr_truncated) = join_output(stderr_handle).context("join stderr")?;

    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(stdout_truncated, stderr_truncated, "output truncated");
    }

    debug!(exit_code = ?status.code(), timed_out, "command finished");
    Ok(CommandOutput {
        status,
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        timed_out,
    })
}

fn join_output(handle: thread::JoinHandle<Result<(Vec<u8>, usize)>>) -> Result<(Vec<u8>, usize)> {
    match handle.join() {
        Ok(result) => result,
        Err(_) => Err(anyhow!("output reader thread panicked")),
    }
}

fn read_stream_limited<R: Read>(mut reader: R, limit: usize) -> Result<(Vec<u8>, usize)> {
    let mut buf = Vec::new();
    let mut truncated = 0usize;
    let mut chunk = [0u8; 8192];

    loop {
        let n = reader.read(&mut chunk).context("read output")?;
        if n == 0 {
            break;
        }
        let remaining = limit.saturating_sub(buf.len());
        if remaining > 0 {
            let keep = n.min(remaining);
            buf.extend_from_slice(&chunk[..keep]);
            truncated += n.saturating_sub(keep);
        } else {
            truncated += n;
        }
    }

    Ok((buf, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_stream_limited_counts_discarded_bytes() {
        let data = vec![b'x'; 20_000];
        let (kept, truncated) = read_stream_limited(&data[..], 1_000).expect("read");
        assert_eq!(kept.len(), 1_000);
        assert_eq!(truncated, 19_000);
    }

    #[test]
    fn read_stream_limited_keeps_short_output() {
        let (kept, truncated) = read_stream_limited(&b"hello"[..], 1_000).expect("read");
        assert_eq!(kept, b"hello");
        assert_eq!(truncated, 0);
    }

    #[cfg(unix)]
    #[test]
    fn run_checked_reports_exit_status_and_stderr() {
        let temp = tempfile::tempdir().expect("tempdir");
        let err = run_checked(
            "sh",
            &["-c", "echo boom >&2; exit 3"],
            temp.path(),
            &ProcessLimits::default(),
        )
        .expect_err("non-zero exit must fail");
        let message = err.to_string();
        assert!(message.contains("exit status 3"), "{message}");
        assert!(message.contains("boom"), "{message}");
    }

    #[cfg(unix)]
    #[test]
    fn timed_out_command_is_killed() {
        let temp = tempfile::tempdir().expect("tempdir");
        let limits = ProcessLimits {
            timeout: Duration::from_millis(200),
            output_limit_bytes: 1_000,
        };
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "exec sleep 5"]).current_dir(temp.path());
        let output = run_command_with_timeout(cmd, limits).expect("run");
        assert!(output.timed_out);
        assert!(!output.success());
        assert_eq!(output.failure_reason(&limits), "timed out after 0s");
    }
}
