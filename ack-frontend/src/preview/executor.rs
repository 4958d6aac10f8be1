use crate::error::RenderError;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Runs external render tools with a hard timeout.
#[derive(Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn execute(&self, program: &str, args: &[&str]) -> Result<Output, RenderError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .kill_on_drop(true)
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped());

        tracing::debug!(
            program = %program,
            args = ?args,
            timeout_secs = %self.timeout.as_secs(),
            "Executing command"
        );

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                RenderError::Command(format!(
                    "{} timed out after {} seconds",
                    program,
                    self.timeout.as_secs()
                ))
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(
                program = %program,
                args = ?args,
                stderr = %stderr,
                "Command failed"
            );
            return Err(RenderError::Command(format!("{}: {}", program, stderr.trim())));
        }

        Ok(output)
    }
}
