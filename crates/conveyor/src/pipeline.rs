use std::{collections::BTreeMap, ffi::OsString, future::Future, path::PathBuf};

use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::debug;

use crate::{builder::ConveyorBuilder, process, splitter, ConveyorError};

/// A configured record pipeline over one external source process.
///
/// Each `run_*` call spawns the source, consumes its stdout to completion,
/// and owns the whole run exclusively; a `Conveyor` holds no shared state, so
/// independent runs (including clones) never interfere with each other.
///
/// The `*_with` variants take a finisher that receives the full ordered
/// result sequence once the source has exited and every record has been
/// handled; the variants without a finisher resolve with no value. Picking
/// between them is an explicit choice at the call site rather than an
/// optional field.
#[derive(Debug, Clone)]
pub struct Conveyor {
    pub(crate) command: PathBuf,
    pub(crate) args: Vec<OsString>,
    pub(crate) current_dir: Option<PathBuf>,
    pub(crate) env: BTreeMap<String, String>,
    pub(crate) debug: bool,
}

impl Conveyor {
    pub fn builder(command: impl Into<PathBuf>) -> ConveyorBuilder {
        ConveyorBuilder::new(command.into())
    }

    /// Feeds each trimmed stdout line through `on_next`, one at a time, in
    /// arrival order.
    pub async fn run_lines<H, Fut, N, E>(&self, on_next: H) -> Result<(), ConveyorError>
    where
        H: FnMut(String) -> Fut,
        Fut: Future<Output = Result<N, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.drive(Ok, on_next).await.map(|_| ())
    }

    /// Like [`run_lines`](Conveyor::run_lines), then invokes `on_finish` with
    /// the ordered results and returns its value.
    pub async fn run_lines_with<H, Fut, N, E, Fin, FinFut, F>(
        &self,
        on_next: H,
        on_finish: Fin,
    ) -> Result<F, ConveyorError>
    where
        H: FnMut(String) -> Fut,
        Fut: Future<Output = Result<N, E>>,
        E: std::error::Error + Send + Sync + 'static,
        Fin: FnOnce(Vec<N>) -> FinFut,
        FinFut: Future<Output = F>,
    {
        let results = self.drive(Ok, on_next).await?;
        Ok(on_finish(results).await)
    }

    /// Parses each stdout line as JSON into `I` before handing it to
    /// `on_next`. A line that fails to parse aborts the run with
    /// [`ConveyorError::MalformedRecord`].
    pub async fn run_json<I, H, Fut, N, E>(&self, on_next: H) -> Result<(), ConveyorError>
    where
        I: DeserializeOwned,
        H: FnMut(I) -> Fut,
        Fut: Future<Output = Result<N, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.drive(decode_json::<I>, on_next).await.map(|_| ())
    }

    /// Like [`run_json`](Conveyor::run_json), then invokes `on_finish` with
    /// the ordered results and returns its value.
    pub async fn run_json_with<I, H, Fut, N, E, Fin, FinFut, F>(
        &self,
        on_next: H,
        on_finish: Fin,
    ) -> Result<F, ConveyorError>
    where
        I: DeserializeOwned,
        H: FnMut(I) -> Fut,
        Fut: Future<Output = Result<N, E>>,
        E: std::error::Error + Send + Sync + 'static,
        Fin: FnOnce(Vec<N>) -> FinFut,
        FinFut: Future<Output = F>,
    {
        let results = self.drive(decode_json::<I>, on_next).await?;
        Ok(on_finish(results).await)
    }

    /// Spawns the source, drains its records through the handler, and returns
    /// the ordered results once the source has exited.
    ///
    /// The stdout reader runs as its own task and only appends to the record
    /// channel; it never waits on the consumer. The consumer loop below is
    /// the sole dequeuer, and it receives the next record only after the
    /// handler for the previous one has completed, so at most one handler
    /// invocation is ever in flight. The run finishes when the channel is
    /// closed (stdout hit EOF, so no further record can arrive) and the loop
    /// has drained everything still queued; the exit status is reaped after
    /// that, which keeps the drain ordered before completion even when the
    /// process exits ahead of its final buffered chunks.
    async fn drive<D, I, H, Fut, N, E>(
        &self,
        decode: D,
        mut on_next: H,
    ) -> Result<Vec<N>, ConveyorError>
    where
        D: Fn(String) -> Result<I, ConveyorError>,
        H: FnMut(I) -> Fut,
        Fut: Future<Output = Result<N, E>>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let mut child = process::spawn_source(self)?;
        debug!(binary = ?self.command, "conveyor source spawned");

        let stdout = child.stdout.take().ok_or(ConveyorError::MissingStdout)?;
        let stderr = child.stderr.take().ok_or(ConveyorError::MissingStderr)?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let stdout_task = tokio::spawn(splitter::forward_records(stdout, tx, self.debug));
        let stderr_task = tokio::spawn(process::drain_stderr(stderr, self.debug));

        // An early return here (malformed record or handler error) drops the
        // receiver, which stops the reader task, and drops the child, which
        // kills the source. Collected results are discarded on that path.
        let mut results = Vec::new();
        while let Some(line) = rx.recv().await {
            let input = decode(line)?;
            let output = on_next(input)
                .await
                .map_err(|source| ConveyorError::Handler(Box::new(source)))?;
            results.push(output);
        }

        stdout_task
            .await
            .map_err(|err| ConveyorError::Join(err.to_string()))?
            .map_err(ConveyorError::StdoutRead)?;
        stderr_task
            .await
            .map_err(|err| ConveyorError::Join(err.to_string()))?
            .map_err(ConveyorError::StderrRead)?;

        let status = child.wait().await.map_err(ConveyorError::Wait)?;
        debug!(?status, records = results.len(), "conveyor source exited");

        Ok(results)
    }
}

fn decode_json<I: DeserializeOwned>(line: String) -> Result<I, ConveyorError> {
    serde_json::from_str(&line).map_err(|source| ConveyorError::MalformedRecord { line, source })
}
