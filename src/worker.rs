//! Runs conversions off the caller's thread.
//!
//! A job runs on tokio's blocking pool and streams [`Event`]s back over an
//! unbounded channel. There is no cancellation; a job runs to completion or
//! fails.

use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use log::info;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::codec::{decode_file, encode_file, Checkpoint, Progress, Summary};
use crate::config::Settings;
use crate::diagnostics::{report, DiagnosticLog};
use crate::error::{CodecError, Result};

#[derive(Debug, Clone)]
pub enum Job {
    Encode { input: PathBuf, output_dir: PathBuf },
    Decode { input: PathBuf, output_dir: PathBuf },
}

impl Job {
    pub fn name(&self) -> &'static str {
        match self {
            Job::Encode { .. } => "encode",
            Job::Decode { .. } => "decode",
        }
    }
}

#[derive(Debug, Clone)]
pub enum Event {
    Progress(Checkpoint),
    Finished(Summary),
    Failed(String),
}

/// Handle to a running job.
pub struct Conversion {
    events: UnboundedReceiver<Event>,
    task: JoinHandle<Result<Summary>>,
}

impl Conversion {
    /// Next event, or `None` once the job is done and all events are drained.
    pub async fn next_event(&mut self) -> Option<Event> {
        self.events.recv().await
    }

    /// Waits for the job and returns its result.
    pub async fn finish(self) -> Result<Summary> {
        self.task.await?
    }
}

/// Starts `job` on the blocking pool. Failures are recorded in `log` before
/// the `Failed` event is sent.
pub fn spawn(job: Job, settings: Arc<Settings>, log: Option<Arc<DiagnosticLog>>) -> Conversion {
    let (tx, events) = mpsc::unbounded_channel();

    let task = tokio::task::spawn_blocking(move || {
        info!("Starting {} job", job.name());
        supervise(&tx, log.as_deref(), |progress| match &job {
            Job::Encode { input, output_dir } => {
                encode_file(input, output_dir, &settings, progress, log.as_deref())
            }
            Job::Decode { input, output_dir } => {
                decode_file(input, output_dir, &settings, progress, log.as_deref())
            }
        })
    });

    Conversion { events, task }
}

/// Runs `body`, forwarding its progress, and always ends with exactly one
/// `Finished` or `Failed` event. A panic in `body` is logged and becomes
/// [`CodecError::Panicked`].
fn supervise<F>(tx: &UnboundedSender<Event>, log: Option<&DiagnosticLog>, body: F) -> Result<Summary>
where
    F: FnOnce(&dyn Progress) -> Result<Summary>,
{
    let progress = |checkpoint: Checkpoint| {
        // Receiver may already be gone; the job still completes.
        let _ = tx.send(Event::Progress(checkpoint));
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| body(&progress))).unwrap_or_else(|payload| {
        let message = match payload.downcast_ref::<&str>() {
            Some(message) => message.to_string(),
            None => payload
                .downcast_ref::<String>()
                .cloned()
                .unwrap_or_else(|| "unknown panic".to_string()),
        };
        let err = CodecError::Panicked(message);
        report(log, "worker", &err.to_string());
        Err(err)
    });

    let event = match &result {
        Ok(summary) => Event::Finished(summary.clone()),
        Err(e) => Event::Failed(e.to_string()),
    };
    let _ = tx.send(event);
    result
}
