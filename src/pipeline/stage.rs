//! A single spawned filter process.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout};

use super::command::Invocation;
use super::SpawnError;

/// One running process in a pipeline.
///
/// The child is killed if the stage is dropped while it still runs.
#[derive(Debug)]
pub struct Stage {
    script: String,
    invocation: Invocation,
    child: Child,
}

/// A freshly spawned stage and its pipe ends.
pub(crate) struct Spawned {
    pub stage: Stage,
    pub stdin: Option<ChildStdin>,
    pub stdout: ChildStdout,
}

impl Stage {
    /// Spawn `invocation` in `cwd`. `stdin` is piped when the stage has an
    /// upstream and null when it generates content on its own.
    pub(crate) fn spawn(
        script: &str,
        invocation: Invocation,
        cwd: &Path,
        piped_stdin: bool,
    ) -> Result<Spawned, SpawnError> {
        let mut command = invocation.command(cwd);
        command
            .stdin(if piped_stdin { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|source| SpawnError::Spawn {
            command: script.to_string(),
            source,
        })?;

        tracing::debug!(
            script,
            command = %invocation,
            pid = child.id(),
            "Stage spawned"
        );

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| SpawnError::MissingPipe {
            command: script.to_string(),
        })?;

        Ok(Spawned {
            stage: Stage {
                script: script.to_string(),
                invocation,
                child,
            },
            stdin,
            stdout,
        })
    }

    /// The script string as declared on the route.
    pub fn script(&self) -> &str {
        &self.script
    }

    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// OS process id, while the process has not been reaped.
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    pub(crate) fn child_mut(&mut self) -> &mut Child {
        &mut self.child
    }
}
