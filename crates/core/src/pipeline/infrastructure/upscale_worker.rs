use std::path::PathBuf;
use std::thread;

use crossbeam_channel::{Receiver, Sender};

use crate::job::domain::job::{Job, Stage};
use crate::pipeline::pipeline_error::PipelineError;
use crate::pipeline::pipeline_logger::PipelineLogger;
use crate::pipeline::upscale_video_use_case::UpscaleVideoUseCase;

/// Messages sent from the worker thread to the caller.
#[derive(Debug)]
pub enum WorkerMessage {
    Stage(Stage),
    Progress(usize, usize),
    Complete(PathBuf),
    Failed(PipelineError),
}

/// Forwards stage and progress events over the worker channel.
pub struct ChannelPipelineLogger {
    tx: Sender<WorkerMessage>,
}

impl ChannelPipelineLogger {
    pub fn new(tx: Sender<WorkerMessage>) -> Self {
        Self { tx }
    }
}

impl PipelineLogger for ChannelPipelineLogger {
    fn stage(&mut self, stage: Stage) {
        log::info!("Starting {stage}");
        let _ = self.tx.send(WorkerMessage::Stage(stage));
    }

    fn progress(&mut self, current: usize, total: usize) {
        let _ = self.tx.send(WorkerMessage::Progress(current, total));
    }

    fn timing(&mut self, name: &str, duration_ms: f64) {
        log::debug!("{name}: {duration_ms:.1}ms");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }
}

/// Handle to a job running on a background thread.
pub struct UpscaleTask {
    rx: Receiver<WorkerMessage>,
}

impl UpscaleTask {
    /// Live event stream. `Complete` or `Failed` is always the last message.
    pub fn messages(&self) -> &Receiver<WorkerMessage> {
        &self.rx
    }

    /// Blocks until the job finishes.
    pub fn wait(self) -> Result<PathBuf, PipelineError> {
        self.wait_with(|_| {})
    }

    /// Blocks until the job finishes, passing every intermediate event to `on_event`.
    pub fn wait_with(
        self,
        mut on_event: impl FnMut(&WorkerMessage),
    ) -> Result<PathBuf, PipelineError> {
        for message in self.rx.iter() {
            match message {
                WorkerMessage::Complete(output) => return Ok(output),
                WorkerMessage::Failed(e) => return Err(e),
                other => on_event(&other),
            }
        }
        Err(PipelineError::WorkerDisconnected)
    }
}

/// Spawns a background worker running `job`.
///
/// `build` receives the channel-backed logger and returns the use case to run,
/// so callers choose the wiring while the worker owns the thread.
pub fn spawn<F>(job: Job, build: F) -> UpscaleTask
where
    F: FnOnce(Box<dyn PipelineLogger>) -> UpscaleVideoUseCase + Send + 'static,
{
    let (tx, rx) = crossbeam_channel::unbounded::<WorkerMessage>();

    thread::spawn(move || {
        let logger = ChannelPipelineLogger::new(tx.clone());
        let mut use_case = build(Box::new(logger));
        let (_job, result) = use_case.run(job);

        let message = match result {
            Ok(output) => WorkerMessage::Complete(output),
            Err(e) => WorkerMessage::Failed(e),
        };
        let _ = tx.send(message);
    });

    UpscaleTask { rx }
}
