use log::{debug, info, warn};
use serde_derive::{Deserialize, Serialize};

use crate::config::Config;
use crate::confirmation::ConfirmationEngine;
use crate::error::Error;
use crate::filter::DetectionFilter;
use crate::session::SessionController;
use crate::{Associator, Detector, FrameSource};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Leading frames dropped before any detection runs; some sources emit
    /// unstable frames right after opening.
    pub warmup_frames: u64,
    /// Progress is logged every this many frames, 0 disables it.
    pub log_interval: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            warmup_frames: 4,
            log_interval: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Opening,
    Running,
    Draining,
    Finished,
}

#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub frames_read: u64,
    pub frames_processed: u64,
    pub confirmed: usize,
}

/// Clears the session's active flag however the run ends, unwinding included.
struct FinishGuard<'a>(&'a SessionController);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        self.0.finish();
    }
}

/// Sequential per-session loop: source -> detector -> filter -> associator
/// -> confirmation engine -> session report.
#[derive(Debug)]
pub struct FrameDriver {
    label: String,
    config: PipelineConfig,
    filter: DetectionFilter,
    engine: ConfirmationEngine,
    session: SessionController,
    state: DriverState,
}

impl FrameDriver {
    pub fn new(label: String, config: &Config, session: SessionController) -> Self {
        Self {
            label,
            config: config.pipeline.clone(),
            filter: DetectionFilter::new(config.filter.clone()),
            engine: ConfirmationEngine::new(config.confirmation.clone()),
            session,
            state: DriverState::Opening,
        }
    }

    #[inline]
    pub fn state(&self) -> DriverState {
        self.state
    }

    #[inline]
    pub fn engine(&self) -> &ConfirmationEngine {
        &self.engine
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Runs the session to the end of `source`. Any source or oracle failure
    /// ends the session; the failed frame is not retried.
    pub fn run<S, D, A>(
        &mut self,
        mut source: S,
        mut detector: D,
        mut associator: A,
    ) -> Result<RunSummary, Error>
    where
        S: FrameSource,
        D: Detector<S::Frame>,
        A: Associator<S::Frame>,
    {
        let session = self.session.clone();
        let _guard = FinishGuard(&session);

        let result = self.drive(&mut source, &mut detector, &mut associator);
        self.state = DriverState::Finished;

        match &result {
            Ok(summary) => info!(
                target: "pipeline",
                "final count for {}: {} ({} frames)",
                self.label,
                summary.confirmed,
                summary.frames_read
            ),
            Err(err) => warn!(target: "pipeline", "session for {} aborted: {err}", self.label),
        }

        result
    }

    fn drive<S, D, A>(
        &mut self,
        source: &mut S,
        detector: &mut D,
        associator: &mut A,
    ) -> Result<RunSummary, Error>
    where
        S: FrameSource,
        D: Detector<S::Frame>,
        A: Associator<S::Frame>,
    {
        self.state = DriverState::Opening;
        source.open()?;
        self.state = DriverState::Running;

        let mut summary = RunSummary::default();

        while let Some(frame) = source.next_frame()? {
            summary.frames_read += 1;
            let frame_index = summary.frames_read;

            if frame_index <= self.config.warmup_frames {
                debug!(target: "pipeline", "skipping warm-up frame {frame_index}");
                continue;
            }

            let detections = detector.detect(&frame)?;
            let admissible = self.filter.apply(&detections);
            let tracks = associator.associate(&frame, &admissible)?;
            let count = self.engine.advance(frame_index, &tracks)?;

            self.session.report(count);
            summary.frames_processed += 1;
            summary.confirmed = count;

            if self.config.log_interval > 0 && frame_index % self.config.log_interval == 0 {
                info!(
                    target: "pipeline",
                    "[{}] frame {frame_index}: {count} detected",
                    self.label
                );
            }
        }

        self.state = DriverState::Draining;

        Ok(summary)
    }
}
