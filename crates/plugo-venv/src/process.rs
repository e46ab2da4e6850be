//! Blocking subprocess runner shared by venv creation, pip and the site query.
//!
//! stdout/stderr are drained on background threads while the child runs; without
//! that a child writing more than the pipe buffer (~64KB, pip does) blocks on
//! write and we deadlock waiting for it to exit.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{EnvError, Result};

/// Poll interval while waiting for a child with a timeout.
const WAIT_POLL_INTERVAL_MS: u64 = 50;

/// Bytes of stderr kept in a `ToolFailed` error.
const STDERR_TAIL_BYTES: usize = 4096;

/// Captured result of a finished tool.
#[derive(Debug)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run `cmd` to completion, killing it after `timeout`.
///
/// Only spawn failures and timeouts are errors here; see [`run_checked`] for
/// treating a non-zero exit as fatal.
pub fn run_tool(mut cmd: Command, tool: &str, timeout: Option<Duration>) -> Result<ToolOutput> {
    tracing::debug!(tool, command = ?cmd, "spawning");
    // Own process group, so a timeout also reaches ensurepip / build backends.
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| EnvError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

    let stdout_handle = child.stdout.take().map(|mut out| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = out.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });
    let stderr_handle = child.stderr.take().map(|mut err| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = err.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });
    let collect = |h: Option<thread::JoinHandle<String>>| {
        h.map(|h| h.join().unwrap_or_default()).unwrap_or_default()
    };

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => {}
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                collect(stdout_handle);
                collect(stderr_handle);
                return Err(EnvError::Spawn {
                    tool: tool.to_string(),
                    source,
                });
            }
        }

        if let Some(limit) = timeout {
            if start.elapsed() > limit {
                kill_tree(&mut child);
                let _ = child.wait();
                // Readers are detached, not joined: a grandchild outside the
                // group may still hold the pipes open.
                drop(stdout_handle);
                drop(stderr_handle);
                return Err(EnvError::Timeout {
                    tool: tool.to_string(),
                    timeout: limit,
                });
            }
        }

        thread::sleep(Duration::from_millis(WAIT_POLL_INTERVAL_MS));
    };

    Ok(ToolOutput {
        status,
        stdout: collect(stdout_handle),
        stderr: collect(stderr_handle),
    })
}

/// Kill the child's process group, falling back to the child alone.
#[cfg(unix)]
fn kill_tree(child: &mut Child) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pgid = Pid::from_raw(child.id() as i32);
    if killpg(pgid, Signal::SIGKILL).is_err() {
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_tree(child: &mut Child) {
    let _ = child.kill();
}

/// Like [`run_tool`], but a non-zero exit becomes [`EnvError::ToolFailed`].
pub fn run_checked(cmd: Command, tool: &str, timeout: Option<Duration>) -> Result<ToolOutput> {
    let out = run_tool(cmd, tool, timeout)?;
    if !out.status.success() {
        return Err(EnvError::ToolFailed {
            tool: tool.to_string(),
            code: out.status.code(),
            stderr: stderr_tail(&out.stderr),
        });
    }
    Ok(out)
}

fn stderr_tail(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let mut start = trimmed.len() - STDERR_TAIL_BYTES;
    while !trimmed.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &trimmed[start..])
}
