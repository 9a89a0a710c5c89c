//! CEC adapter process
//!
//! Runs `cec-client` (or a compatible program) with piped stdio. Its stdout
//! is the bridge's line stream and its stdin receives feedback frames.

use std::process::Stdio;

use thiserror::Error;
use tokio::io::BufReader;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::settings::AdapterSettings;

#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} was started without a piped {1}")]
    MissingPipe(String, &'static str),
}

/// A running adapter process with its pipes split off
pub struct AdapterProcess {
    child: Child,
    /// Adapter output, one CEC event per line
    pub stdout: BufReader<ChildStdout>,
    /// Adapter input for `tx` frames
    pub stdin: ChildStdin,
}

impl AdapterProcess {
    /// Spawn the configured program
    ///
    /// The process is killed if the handle is dropped.
    pub fn spawn(settings: &AdapterSettings) -> Result<Self, AdapterError> {
        let mut child = Command::new(&settings.program)
            .args(&settings.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| AdapterError::Spawn {
                program: settings.program.clone(),
                source,
            })?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AdapterError::MissingPipe(settings.program.clone(), "stdout"))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| AdapterError::MissingPipe(settings.program.clone(), "stdin"))?;

        info!(
            "Started {} {} (pid {:?})",
            settings.program,
            settings.args.join(" "),
            child.id()
        );

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            stdin,
        })
    }

    /// Split into the child handle and its pipes
    pub fn into_parts(self) -> (Child, BufReader<ChildStdout>, ChildStdin) {
        (self.child, self.stdout, self.stdin)
    }
}

/// Stop the adapter if it is still running and reap it
pub async fn stop(mut child: Child) {
    match child.try_wait() {
        Ok(Some(status)) => {
            debug!("Adapter already exited: {}", status);
            return;
        }
        Ok(None) => {}
        Err(e) => warn!("Could not query adapter status: {}", e),
    }

    if let Err(e) = child.kill().await {
        warn!("Failed to stop adapter: {}", e);
    } else {
        info!("Adapter stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn test_missing_program() {
        let settings = AdapterSettings {
            program: "/nonexistent/cec-client".into(),
            args: Vec::new(),
        };
        let err = AdapterProcess::spawn(&settings).err().unwrap();
        assert!(matches!(err, AdapterError::Spawn { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pipes_are_connected() {
        let settings = AdapterSettings {
            program: "cat".into(),
            args: Vec::new(),
        };
        let (child, stdout, mut stdin) = AdapterProcess::spawn(&settings).unwrap().into_parts();

        stdin.write_all(b"tx 50:7a:08\n").await.unwrap();
        stdin.flush().await.unwrap();
        drop(stdin);

        let mut lines = stdout.lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("tx 50:7a:08"));
        assert_eq!(lines.next_line().await.unwrap(), None);

        stop(child).await;
    }
}
