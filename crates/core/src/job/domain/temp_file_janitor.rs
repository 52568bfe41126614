use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::job::domain::job_paths::JobPaths;

#[derive(Error, Debug)]
#[error("failed to remove intermediate artifact {path}: {source}")]
pub struct CleanupError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Removes a job's intermediate artifacts.
///
/// Only the audio artifact and the silent video are ever touched; the source
/// and the output are outside its reach. Missing files count as already
/// cleaned, so running it repeatedly is harmless.
#[derive(Clone, Copy, Debug, Default)]
pub struct TempFileJanitor;

impl TempFileJanitor {
    pub fn new() -> Self {
        Self
    }

    /// Removes both intermediates. Failures are logged and returned, never
    /// raised, so they cannot mask the job's own outcome.
    pub fn cleanup(&self, paths: &JobPaths) -> Vec<CleanupError> {
        paths
            .intermediates()
            .into_iter()
            .filter_map(|path| remove_artifact(path).err())
            .inspect(|e| log::warn!("{e}"))
            .collect()
    }

    /// Intermediate paths that already hold a file. They will be overwritten
    /// and then removed by this job.
    pub fn preexisting(&self, paths: &JobPaths) -> Vec<PathBuf> {
        paths
            .intermediates()
            .into_iter()
            .filter(|path| path.exists())
            .map(Path::to_path_buf)
            .collect()
    }
}

fn remove_artifact(path: &Path) -> Result<(), CleanupError> {
    match fs::remove_file(path) {
        Ok(()) => {
            log::debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(CleanupError {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Scoped ownership of a job's intermediate artifacts.
///
/// Armed before the first artifact is created; dropping it (early return,
/// `?`, or unwinding panic) runs the janitor. [`TempArtifacts::release`]
/// runs it explicitly and reports any removal failures.
pub struct TempArtifacts {
    janitor: TempFileJanitor,
    paths: JobPaths,
    released: bool,
}

impl TempArtifacts {
    pub fn new(janitor: TempFileJanitor, paths: JobPaths) -> Self {
        for path in janitor.preexisting(&paths) {
            log::info!(
                "{} already exists; it will be replaced and removed by this job",
                path.display()
            );
        }
        Self {
            janitor,
            paths,
            released: false,
        }
    }

    pub fn paths(&self) -> &JobPaths {
        &self.paths
    }

    pub fn release(mut self) -> Vec<CleanupError> {
        self.released = true;
        self.janitor.cleanup(&self.paths)
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        if !self.released {
            self.janitor.cleanup(&self.paths);
        }
    }
}
