use std::path::Path;
use std::time::Instant;

use crate::resampling::domain::frame_resampler::{FrameResampler, ResizeError};
use crate::resampling::domain::frame_resizer::FrameResizer;
use crate::shared::dimensions::Dimensions;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;
use crate::video::domain::video_writer::VideoWriter;

use super::pipeline_logger::PipelineLogger;

/// Streams frames from a reader through a resizer into a writer.
///
/// Frames are handled one at a time in decode order, so memory use does not
/// grow with the length of the video. The reader and writer are closed on
/// every path; a failed run leaves whatever was written for the caller's
/// cleanup.
pub struct ResampleFramesUseCase {
    reader: Box<dyn VideoReader>,
    writer: Box<dyn VideoWriter>,
    resizer: Box<dyn FrameResizer>,
}

impl ResampleFramesUseCase {
    pub fn new(
        reader: Box<dyn VideoReader>,
        writer: Box<dyn VideoWriter>,
        resizer: Box<dyn FrameResizer>,
    ) -> Self {
        Self {
            reader,
            writer,
            resizer,
        }
    }

    fn process(
        &mut self,
        target: Dimensions,
        total: usize,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, ResizeError> {
        let mut written = 0;

        for (index, frame_result) in self.reader.frames().enumerate() {
            let frame = frame_result.map_err(|source| ResizeError::Decode { index, source })?;

            let started = Instant::now();
            let resized = self
                .resizer
                .resize(&frame, target)
                .map_err(|source| ResizeError::Resample { index, source })?;
            logger.timing("resize", started.elapsed().as_secs_f64() * 1000.0);

            let started = Instant::now();
            self.writer
                .write(&resized)
                .map_err(|source| ResizeError::Write { index, source })?;
            logger.timing("encode", started.elapsed().as_secs_f64() * 1000.0);

            written += 1;
            logger.progress(written, total.max(written));
        }

        Ok(written)
    }
}

impl FrameResampler for ResampleFramesUseCase {
    fn resample(
        &mut self,
        source: &Path,
        output: &Path,
        target: Dimensions,
        metadata: &VideoMetadata,
        logger: &mut dyn PipelineLogger,
    ) -> Result<usize, ResizeError> {
        let source_size = self
            .reader
            .open(source)
            .map_err(|source_err| ResizeError::OpenSource {
                path: source.to_path_buf(),
                source: source_err,
            })?;

        if let Err(e) = self.writer.open(output, target, metadata.frame_rate) {
            self.reader.close();
            return Err(ResizeError::CreateWriter {
                path: output.to_path_buf(),
                source: e,
            });
        }

        logger.info(&format!(
            "Resampling {} frames from {source_size} to {target} at {} fps",
            metadata.frame_count, metadata.frame_rate
        ));

        let result = self.process(target, metadata.frame_count, logger);
        self.reader.close();
        let finalized = self.writer.close();

        match (result, finalized) {
            (Err(e), _) => Err(e),
            (Ok(_), Err(source)) => Err(ResizeError::Finalize { source }),
            (Ok(written), Ok(())) => {
                if written != metadata.frame_count {
                    log::debug!(
                        "Container reported {} frames, decoded {written}",
                        metadata.frame_count
                    );
                }
                Ok(written)
            }
        }
    }
}
