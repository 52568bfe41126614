use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::job::domain::job::{Job, JobState, Stage};
use crate::job::domain::job_paths::JobPaths;
use crate::job::domain::temp_file_janitor::{TempArtifacts, TempFileJanitor};
use crate::resampling::domain::frame_resampler::FrameResampler;
use crate::resampling::infrastructure::cubic_frame_resizer::CubicFrameResizer;
use crate::shared::size_token::SizeToken;
use crate::video::domain::audio_extractor::AudioExtractor;
use crate::video::domain::media_probe::MediaProbe;
use crate::video::domain::remuxer::Remuxer;
use crate::video::infrastructure::ffmpeg_audio_extractor::FfmpegAudioExtractor;
use crate::video::infrastructure::ffmpeg_probe::FfmpegProbe;
use crate::video::infrastructure::ffmpeg_reader::FfmpegReader;
use crate::video::infrastructure::ffmpeg_remuxer::FfmpegRemuxer;
use crate::video::infrastructure::ffmpeg_writer::FfmpegWriter;

use super::pipeline_error::PipelineError;
use super::pipeline_logger::PipelineLogger;
use super::resample_frames_use_case::ResampleFramesUseCase;
use super::upscale_config::UpscaleConfig;

/// Runs one upscale job: extract audio, probe, resample frames, remux.
///
/// Stages run strictly in order and each consumes the previous one's output.
/// Intermediate artifacts are owned by a [`TempArtifacts`] guard from the
/// moment paths are resolved, so they are removed after success, after any
/// stage error and during unwinding. The first stage error is returned; no
/// stage is retried.
pub struct UpscaleVideoUseCase {
    extractor: Box<dyn AudioExtractor>,
    probe: Box<dyn MediaProbe>,
    resampler: Box<dyn FrameResampler>,
    remuxer: Box<dyn Remuxer>,
    janitor: TempFileJanitor,
    logger: Box<dyn PipelineLogger>,
}

impl UpscaleVideoUseCase {
    pub fn new(
        extractor: Box<dyn AudioExtractor>,
        probe: Box<dyn MediaProbe>,
        resampler: Box<dyn FrameResampler>,
        remuxer: Box<dyn Remuxer>,
        logger: Box<dyn PipelineLogger>,
    ) -> Self {
        Self {
            extractor,
            probe,
            resampler,
            remuxer,
            janitor: TempFileJanitor::new(),
            logger,
        }
    }

    /// The ffmpeg-backed pipeline with cubic frame resampling.
    pub fn with_ffmpeg(config: UpscaleConfig, logger: Box<dyn PipelineLogger>) -> Self {
        let resampler = ResampleFramesUseCase::new(
            Box::new(FfmpegReader::new()),
            Box::new(FfmpegWriter::new()),
            Box::new(CubicFrameResizer::new()),
        );
        let remuxer = FfmpegRemuxer::new(config.video_codec).with_crf(config.crf_or_default());

        Self::new(
            Box::new(FfmpegAudioExtractor::new()),
            Box::new(FfmpegProbe::new()),
            Box::new(resampler),
            Box::new(remuxer),
            logger,
        )
    }

    /// Upscales `source` to the size named by `token` and returns the output path.
    pub fn upscale(&mut self, source: &Path, token: SizeToken) -> Result<PathBuf, PipelineError> {
        let (_, result) = self.run(Job::new(source, token));
        result
    }

    /// Runs `job` to a terminal state and hands it back with the outcome.
    pub fn run(&mut self, mut job: Job) -> (Job, Result<PathBuf, PipelineError>) {
        let paths = JobPaths::resolve(job.source_path(), job.size_token());
        log::info!(
            "Upscaling {} to {} -> {}",
            paths.source.display(),
            job.size_token(),
            paths.output.display()
        );
        job.set_paths(paths.clone());

        let artifacts = TempArtifacts::new(self.janitor, paths);
        let result = self.run_stages(&mut job, artifacts.paths());

        let cleanup_failures = artifacts.release().len();
        if cleanup_failures > 0 {
            log::warn!("{cleanup_failures} intermediate artifact(s) could not be removed");
        }

        let result = match result {
            Ok(output) => {
                job.advance(JobState::Cleaned);
                log::info!("Wrote {}", output.display());
                Ok(output)
            }
            Err((stage, e)) => {
                job.advance(JobState::Failed(stage));
                log::error!("{e}");
                Err(e)
            }
        };
        self.logger.summary();

        (job, result)
    }

    /// Runs the four stages in order. A failure is tagged with the stage that
    /// was running when it happened.
    fn run_stages(
        &mut self,
        job: &mut Job,
        paths: &JobPaths,
    ) -> Result<PathBuf, (Stage, PipelineError)> {
        let target = job.size_token().dimensions();

        self.logger.stage(Stage::ExtractAudio);
        let started = Instant::now();
        let audio = self
            .extractor
            .extract_audio(&paths.source, &paths.audio_artifact)
            .map_err(failed_at(Stage::ExtractAudio))?;
        self.logger.timing("extract_audio", elapsed_ms(started));
        job.advance(JobState::AudioExtracted);

        self.logger.stage(Stage::Probe);
        let started = Instant::now();
        let metadata = self
            .probe
            .probe(&paths.source)
            .map_err(failed_at(Stage::Probe))?;
        self.logger.timing("probe", elapsed_ms(started));
        self.logger.info(&format!(
            "Source: {} @ {} fps, {} frames ({:.2}s)",
            metadata.dimensions,
            metadata.frame_rate,
            metadata.frame_count,
            metadata.duration()
        ));
        job.set_metadata(metadata.clone());

        self.logger.stage(Stage::Resample);
        let started = Instant::now();
        self.resampler
            .resample(
                &paths.source,
                &paths.silent_video,
                target,
                &metadata,
                self.logger.as_mut(),
            )
            .map_err(failed_at(Stage::Resample))?;
        self.logger.timing("resample", elapsed_ms(started));
        job.advance(JobState::Resampled);

        self.logger.stage(Stage::Remux);
        let started = Instant::now();
        self.remuxer
            .remux(&paths.silent_video, &audio, metadata.frame_rate, &paths.output)
            .map_err(failed_at(Stage::Remux))?;
        self.logger.timing("remux", elapsed_ms(started));
        job.advance(JobState::Remuxed);

        Ok(paths.output.clone())
    }
}

fn failed_at<E: Into<PipelineError>>(stage: Stage) -> impl FnOnce(E) -> (Stage, PipelineError) {
    move |e| (stage, e.into())
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
