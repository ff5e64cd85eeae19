//! Wiring stages into one stream.

use std::io;
use std::path::Path;
use std::time::Duration;

use axum::body::Body;
use bytes::{Bytes, BytesMut};
use futures_util::Stream;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::ChildStdin;
use tokio::task::JoinHandle;

use super::command::resolve_command;
use super::manifest::NamedScripts;
use super::stage::{Spawned, Stage};
use super::SpawnError;
use crate::observability::metrics;

/// Any byte source feeding a pipeline.
pub type Input = Box<dyn AsyncRead + Send + Unpin>;

const CHUNK_SIZE: usize = 16 * 1024;

/// How long finished stages get to report an exit status before being killed.
const REAP_GRACE: Duration = Duration::from_secs(2);

/// An ordered chain of running stages.
///
/// The pipeline owns every child process and every pump task between them.
/// Dropping it (client gone, handler failed) aborts the pumps and kills the
/// children that are still running.
pub struct Pipeline {
    stages: Vec<Stage>,
    pumps: Vec<JoinHandle<()>>,
    output: Input,
}

impl Pipeline {
    /// Spawn `scripts` in order inside `cwd`.
    ///
    /// With `input`, it feeds the first stage. Without it, the first stage
    /// runs with a null stdin and generates the content. With no scripts the
    /// input itself is the output.
    pub fn spawn(
        named: &NamedScripts,
        cwd: &Path,
        scripts: &[String],
        input: Option<Input>,
    ) -> Result<Self, SpawnError> {
        let mut pipeline = Pipeline {
            stages: Vec::with_capacity(scripts.len()),
            pumps: Vec::with_capacity(scripts.len()),
            output: Box::new(tokio::io::empty()),
        };
        let mut upstream = input;

        for script in scripts {
            let invocation = resolve_command(named, script)?;
            let launcher = invocation.launcher;
            let spawned = Stage::spawn(script, invocation, cwd, upstream.is_some())
                .inspect_err(|_| metrics::record_spawn_failure())?;
            metrics::record_stage(launcher.as_str());

            let Spawned {
                stage,
                stdin,
                stdout,
            } = spawned;
            if let (Some(reader), Some(writer)) = (upstream.take(), stdin) {
                let script = stage.script().to_string();
                pipeline.pumps.push(tokio::spawn(pump(reader, writer, script)));
            }
            pipeline.stages.push(stage);
            upstream = Some(Box::new(stdout));
        }

        if let Some(output) = upstream {
            pipeline.output = output;
        }
        Ok(pipeline)
    }

    /// Running stages, in order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The final output as a stream of chunks.
    ///
    /// Reading happens on demand, so a slow client slows every stage down.
    /// Once the output ends, the stages get a grace period to exit; a non-zero
    /// exit becomes a trailing error item.
    pub fn into_stream(self) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        self.stream_from(None)
    }

    /// The final output as a response body.
    ///
    /// Waits for the first chunk, so a pipeline that fails before producing
    /// anything is reported here instead of as a truncated body.
    pub async fn into_body(mut self) -> Result<Body, SpawnError> {
        let mut first = BytesMut::with_capacity(CHUNK_SIZE);
        match self.output.read_buf(&mut first).await {
            Ok(0) => {
                self.finish().await?;
                Ok(Body::empty())
            }
            Ok(_) => Ok(Body::from_stream(self.stream_from(Some(first.freeze())))),
            Err(err) => Err(SpawnError::Output(err)),
        }
    }

    fn stream_from(
        self,
        first: Option<Bytes>,
    ) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
        async_stream::stream! {
            let mut pipeline = self;
            let mut failed = false;
            if let Some(chunk) = first {
                yield Ok(chunk);
            }
            loop {
                let mut chunk = BytesMut::with_capacity(CHUNK_SIZE);
                match pipeline.output.read_buf(&mut chunk).await {
                    Ok(0) => break,
                    Ok(_) => yield Ok(chunk.freeze()),
                    Err(err) => {
                        tracing::warn!(error = %err, "Pipeline output failed");
                        yield Err(err);
                        failed = true;
                        break;
                    }
                }
            }
            if !failed {
                if let Err(err) = pipeline.finish().await {
                    yield Err(io::Error::other(err));
                }
            }
        }
    }

    /// Collect exit statuses once the output has ended.
    ///
    /// Stages still running after the grace period are killed. The first stage
    /// that exited with a non-zero code is returned as the error; stages ended
    /// by a signal (e.g. SIGPIPE after a downstream stage quit early) are not
    /// counted.
    async fn finish(&mut self) -> Result<(), SpawnError> {
        let stages = std::mem::take(&mut self.stages);
        let deadline = tokio::time::Instant::now() + REAP_GRACE;
        let mut fault = None;

        for mut stage in stages {
            let exit = tokio::time::timeout_at(deadline, stage.child_mut().wait()).await;
            match exit {
                Ok(Ok(status)) => match status.code() {
                    Some(0) => tracing::trace!(script = stage.script(), "Stage finished"),
                    Some(code) => {
                        tracing::warn!(script = stage.script(), code, "Stage exited unsuccessfully");
                        fault.get_or_insert(SpawnError::Exited {
                            command: stage.script().to_string(),
                            code,
                        });
                    }
                    None => tracing::debug!(script = stage.script(), %status, "Stage ended by signal"),
                },
                Ok(Err(err)) => {
                    tracing::warn!(script = stage.script(), error = %err, "Failed to wait for stage");
                }
                Err(_) => {
                    tracing::debug!(script = stage.script(), "Stage outlived its output, killing");
                    let _ = stage.child_mut().kill().await;
                }
            }
        }

        fault.map_or(Ok(()), Err)
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        for pump in &self.pumps {
            pump.abort();
        }
        if !self.stages.is_empty() {
            tracing::debug!(stages = self.stages.len(), "Pipeline dropped before completion");
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages)
            .field("pumps", &self.pumps.len())
            .finish()
    }
}

/// Copy `reader` into a stage's stdin, then close it.
async fn pump(mut reader: Input, mut writer: ChildStdin, script: String) {
    match tokio::io::copy(&mut reader, &mut writer).await {
        Ok(bytes) => tracing::trace!(script = %script, bytes, "Stage input complete"),
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            tracing::debug!(script = %script, "Stage closed its input early");
        }
        Err(err) => tracing::warn!(script = %script, error = %err, "Feeding stage failed"),
    }
    let _ = writer.shutdown().await;
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use futures_util::TryStreamExt;

    fn scripts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    async fn collect(pipeline: Pipeline) -> String {
        let chunks: Vec<Bytes> = pipeline.into_stream().try_collect().await.unwrap();
        String::from_utf8(chunks.concat()).unwrap()
    }

    fn input(text: &'static str) -> Option<Input> {
        Some(Box::new(text.as_bytes()))
    }

    #[tokio::test]
    async fn no_scripts_passes_input_through() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline =
            Pipeline::spawn(&NamedScripts::default(), dir.path(), &[], input("raw bytes")).unwrap();
        assert!(pipeline.stages().is_empty());
        assert_eq!(collect(pipeline).await, "raw bytes");
    }

    #[tokio::test]
    async fn filters_input_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::spawn(
            &NamedScripts::default(),
            dir.path(),
            &scripts(&["sed s/world/you/g", "tr a-z A-Z"]),
            input("Hello world!\n"),
        )
        .unwrap();
        assert_eq!(pipeline.stages().len(), 2);
        assert_eq!(collect(pipeline).await, "HELLO YOU!\n");
    }

    #[tokio::test]
    async fn first_stage_generates_without_input() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "Hello world!\n").unwrap();

        let pipeline = Pipeline::spawn(
            &NamedScripts::default(),
            dir.path(),
            &scripts(&["cat index.html", "sed s/world/you/g"]),
            None,
        )
        .unwrap();
        assert_eq!(collect(pipeline).await, "Hello you!\n");
    }

    #[tokio::test]
    async fn generator_gets_no_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline =
            Pipeline::spawn(&NamedScripts::default(), dir.path(), &scripts(&["cat"]), None).unwrap();
        assert_eq!(collect(pipeline).await, "");
    }

    #[tokio::test]
    async fn named_scripts_use_the_runner() {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::config::ManifestConfig {
            runner: "echo".to_string(),
            runner_args: vec!["-n".to_string(), "via".to_string()],
            ..Default::default()
        };
        let named = NamedScripts::new(&config).with_script("greeting", "unused");

        let pipeline =
            Pipeline::spawn(&named, dir.path(), &scripts(&["greeting world"]), None).unwrap();
        assert_eq!(collect(pipeline).await, "via greeting world");
    }

    #[tokio::test]
    async fn spawn_failure_names_the_script() {
        let dir = tempfile::tempdir().unwrap();
        let err = Pipeline::spawn(
            &NamedScripts::default(),
            dir.path(),
            &scripts(&["cat", "zulu-no-such-program --flag"]),
            input("x"),
        )
        .unwrap_err();
        assert!(matches!(err, SpawnError::Spawn { .. }));
        assert!(err.to_string().contains("zulu-no-such-program --flag"));
    }

    #[tokio::test]
    async fn failing_filter_before_output_fails_the_body() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::spawn(
            &NamedScripts::default(),
            dir.path(),
            &scripts(&["sed s/world"]),
            input("Hello world!\n"),
        )
        .unwrap();

        let err = pipeline.into_body().await.unwrap_err();
        match err {
            SpawnError::Exited { command, code } => {
                assert_eq!(command, "sed s/world");
                assert_ne!(code, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn failing_stage_after_output_ends_stream_with_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), "Hello world!\n").unwrap();
        let pipeline = Pipeline::spawn(
            &NamedScripts::default(),
            dir.path(),
            &scripts(&["cat index.html missing.txt"]),
            None,
        )
        .unwrap();

        let items: Vec<io::Result<Bytes>> =
            futures_util::StreamExt::collect(pipeline.into_stream()).await;
        let (last, body) = items.split_last().unwrap();
        let body: Vec<u8> = body.iter().flat_map(|chunk| chunk.as_ref().unwrap().to_vec()).collect();
        assert_eq!(body, b"Hello world!\n");
        assert!(last.as_ref().unwrap_err().to_string().contains("cat index.html missing.txt"));
    }

    #[tokio::test]
    async fn successful_pipeline_body_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = Pipeline::spawn(
            &NamedScripts::default(),
            dir.path(),
            &scripts(&["tr a-z A-Z"]),
            input("quiet"),
        )
        .unwrap();

        let body = pipeline.into_body().await.unwrap();
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"QUIET");
    }

    #[tokio::test]
    async fn dropping_kills_running_stages() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline =
            Pipeline::spawn(&NamedScripts::default(), dir.path(), &scripts(&["sleep 30"]), None)
                .unwrap();
        let pid = pipeline.stages()[0].id().expect("running");
        drop(pipeline);

        let proc_dir = std::path::PathBuf::from(format!("/proc/{}", pid));
        for _ in 0..50 {
            let gone = match std::fs::read_to_string(proc_dir.join("stat")) {
                Err(_) => true,
                // Killed but not yet reaped by the runtime.
                Ok(stat) => stat.split_whitespace().nth(2) == Some("Z"),
            };
            if gone {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("stage {} still running after drop", pid);
    }
}
