// src/exec/command.rs

//! Shell command runner shared by the shell executor and scan discovery.

use std::path::Path;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

/// Build a shell command appropriate for the platform.
pub fn shell_command(script: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(script);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(script);
        c
    }
}

/// Run `script` through the shell in `cwd` with extra environment variables,
/// and wait for it to exit.
///
/// stdout/stderr are consumed line by line and logged at debug level under
/// `label`. A non-zero exit status is an error.
pub async fn run_shell(
    label: &str,
    script: &str,
    cwd: &Path,
    envs: &[(&str, &str)],
) -> Result<()> {
    info!(label, cmd = %script, "running shell command");

    let mut cmd = shell_command(script);
    cmd.current_dir(cwd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in envs {
        cmd.env(key, value);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for '{label}'"))?;

    if let Some(stdout) = child.stdout.take() {
        forward_lines(label.to_string(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(label.to_string(), "stderr", stderr);
    }

    let status = child
        .wait()
        .await
        .with_context(|| format!("waiting for process of '{label}'"))?;

    let code = status.code().unwrap_or(-1);
    debug!(label, exit_code = code, success = status.success(), "shell command exited");

    if !status.success() {
        bail!("command `{script}` for '{label}' exited with code {code}");
    }

    Ok(())
}

/// Always consume a child stream so buffers don't fill; log at debug.
fn forward_lines<R>(label: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(label = %label, stream, "{}", line);
        }
    });
}
