use std::fmt;
use std::path::{Path, PathBuf};

use crate::job::domain::job_paths::JobPaths;
use crate::shared::size_token::SizeToken;
use crate::shared::video_metadata::VideoMetadata;

/// A failure-prone pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    ExtractAudio,
    Probe,
    Resample,
    Remux,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ExtractAudio => "audio extraction",
            Stage::Probe => "probe",
            Stage::Resample => "frame resampling",
            Stage::Remux => "remux",
        })
    }
}

/// Lifecycle of a job. `Cleaned` and `Failed` are terminal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobState {
    Start,
    PathsResolved,
    AudioExtracted,
    Probed,
    Resampled,
    Remuxed,
    Cleaned,
    Failed(Stage),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Cleaned | JobState::Failed(_))
    }
}

/// The unit of work handed to the orchestrator.
///
/// Built by the caller from a source path and size selection; paths and
/// metadata are filled in as stages complete. A job owns no resources
/// beyond the artifact paths the janitor releases.
#[derive(Clone, Debug)]
pub struct Job {
    source_path: PathBuf,
    size_token: SizeToken,
    paths: Option<JobPaths>,
    metadata: Option<VideoMetadata>,
    state: JobState,
}

impl Job {
    pub fn new(source_path: impl Into<PathBuf>, size_token: SizeToken) -> Self {
        Self {
            source_path: source_path.into(),
            size_token,
            paths: None,
            metadata: None,
            state: JobState::Start,
        }
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn size_token(&self) -> SizeToken {
        self.size_token
    }

    pub fn paths(&self) -> Option<&JobPaths> {
        self.paths.as_ref()
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub(crate) fn set_paths(&mut self, paths: JobPaths) {
        self.paths = Some(paths);
        self.state = JobState::PathsResolved;
    }

    pub(crate) fn set_metadata(&mut self, metadata: VideoMetadata) {
        self.metadata = Some(metadata);
        self.state = JobState::Probed;
    }

    pub(crate) fn advance(&mut self, state: JobState) {
        log::debug!("Job {}: {:?} -> {:?}", self.source_path.display(), self.state, state);
        self.state = state;
    }
}
