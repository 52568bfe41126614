use std::collections::BTreeMap;
use std::time::Instant;

use crate::job::domain::job::Stage;

/// Observer for upscale runs: stage transitions, frame progress and timings.
///
/// Use cases report through this port so the CLI, the background worker and
/// tests can each watch a run without changing the orchestration code.
pub trait PipelineLogger: Send {
    /// A stage is about to start.
    fn stage(&mut self, stage: Stage);

    /// Report frame-level progress of the resampling stage.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named step took, in milliseconds.
    fn timing(&mut self, name: &str, duration_ms: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn stage(&mut self, _stage: Stage) {}
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _name: &str, _duration_ms: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Logger for terminal use: forwards events to the `log` facade and keeps
/// timings for a summary at the end of the run.
///
/// Progress output is throttled to every `throttle_frames` frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: BTreeMap<String, Vec<f64>>,
    start_time: Instant,
    total_frames: usize,
    stages: Vec<Stage>,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: BTreeMap::new(),
            start_time: Instant::now(),
            total_frames: 0,
            stages: Vec::new(),
        }
    }

    /// Returns the formatted summary string, or `None` if nothing was timed.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.total_frames;
        let mut lines = vec![format!(
            "Upscale summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        )];

        for (name, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let pct = if elapsed_ms > 0.0 {
                total_ms / elapsed_ms * 100.0
            } else {
                0.0
            };
            if durations.len() > 1 {
                let avg_ms = total_ms / durations.len() as f64;
                lines.push(format!(
                    "  {name:14}: avg {avg_ms:6.1}ms  total {total_ms:7.0}ms  ({pct:4.1}%)"
                ));
            } else {
                lines.push(format!("  {name:14}: {total_ms:7.0}ms  ({pct:4.1}%)"));
            }
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    /// Returns the recorded durations for a named step.
    pub fn timings_for(&self, name: &str) -> Option<&[f64]> {
        self.timings.get(name).map(|v| v.as_slice())
    }

    /// Frame total from the most recent progress report.
    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    /// Stages started so far, in order.
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(25)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn stage(&mut self, stage: Stage) {
        self.stages.push(stage);
        log::info!("Starting {stage}");
    }

    fn progress(&mut self, current: usize, total: usize) {
        self.total_frames = total;
        if total > 0 && (current % self.throttle_frames == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Resampling: {current}/{total} frames ({pct:.1}%)");
        }
    }

    fn timing(&mut self, name: &str, duration_ms: f64) {
        self.timings
            .entry(name.to_string())
            .or_default()
            .push(duration_ms);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_null_logger_all_methods_are_noop() {
        let mut logger = NullPipelineLogger;
        logger.stage(Stage::Probe);
        logger.progress(1, 10);
        logger.timing("resize", 5.0);
        logger.info("hello");
        logger.summary();
    }

    #[test]
    fn test_timing_records_values() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.timing("resize", 20.0);
        logger.timing("resize", 30.0);
        logger.timing("remux", 5.0);

        let resize = logger.timings_for("resize").unwrap();
        assert_eq!(resize.len(), 2);
        assert_relative_eq!(resize[0], 20.0);
        assert_relative_eq!(resize[1], 30.0);
        assert_eq!(logger.timings_for("remux").unwrap(), &[5.0]);
        assert!(logger.timings_for("probe").is_none());
    }

    #[test]
    fn test_summary_lists_steps_and_throughput() {
        let mut logger = StdoutPipelineLogger::new(10);
        logger.progress(100, 100);
        logger.timing("resize", 20.0);
        logger.timing("resize", 30.0);
        logger.timing("remux", 400.0);

        let summary = logger.summary_string().unwrap();
        assert!(summary.contains("Upscale summary (100 frames"));
        assert!(summary.contains("resize"));
        assert!(summary.contains("avg"));
        assert!(summary.contains("remux"));
        assert!(summary.contains("fps"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        let logger = StdoutPipelineLogger::new(10);
        assert!(logger.summary_string().is_none());
    }

    #[test]
    fn test_progress_tracks_total() {
        let mut logger = StdoutPipelineLogger::new(10);
        for i in 1..=20 {
            logger.progress(i, 20);
        }
        assert_eq!(logger.total_frames(), 20);
    }

    #[test]
    fn test_stages_recorded_in_order() {
        let mut logger = StdoutPipelineLogger::default();
        logger.stage(Stage::ExtractAudio);
        logger.stage(Stage::Probe);
        assert_eq!(logger.stages(), &[Stage::ExtractAudio, Stage::Probe]);
    }

    #[test]
    fn test_zero_throttle_is_clamped() {
        let logger = StdoutPipelineLogger::new(0);
        assert_eq!(logger.throttle_frames, 1);
    }
}
