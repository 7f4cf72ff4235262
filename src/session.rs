use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{info, warn};
use serde_derive::Serialize;

use crate::config::Config;
use crate::error::Error;
use crate::pipeline::{FrameDriver, RunSummary};
use crate::{Associator, Detector, FrameSource};

#[derive(Debug, Default)]
struct SessionState {
    labs: BTreeMap<String, usize>,
    current_lab: Option<String>,
    processing: bool,
}

/// Consistent copy of the session table taken under the lock.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub labs: BTreeMap<String, usize>,
    pub current_lab: Option<String>,
    pub processing: bool,
    /// `current_lab` while processing, `None` otherwise.
    pub processing_lab: Option<String>,
}

impl Status {
    #[inline]
    pub fn count(&self, label: &str) -> usize {
        self.labs.get(label).copied().unwrap_or(0)
    }
}

/// Owns the single active session and the per-label count table.
///
/// Handles are cheap to clone; the pipeline thread and status readers share
/// one lock and never hold it across I/O.
#[derive(Debug, Clone)]
pub struct SessionController {
    state: Arc<Mutex<SessionState>>,
    config: Arc<Config>,
}

impl Default for SessionController {
    fn default() -> Self {
        Self::with_config(Config::default())
    }
}

impl SessionController {
    /// Fails with [`Error::InvalidConfig`] when `config` does not validate.
    pub fn new(config: Config) -> Result<Self, Error> {
        config.validate()?;

        Ok(Self::with_config(config))
    }

    fn with_config(config: Config) -> Self {
        let labs = config.labs.iter().map(|lab| (lab.clone(), 0)).collect();

        Self {
            state: Arc::new(Mutex::new(SessionState {
                labs,
                current_lab: None,
                processing: false,
            })),
            config: Arc::new(config),
        }
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    // no critical section can panic halfway, so a poisoned lock is still whole
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Accepts a new session and launches its pipeline on a background thread.
    ///
    /// `label` falls back to the configured default lab when absent or empty.
    pub fn start<S, D, A>(
        &self,
        label: Option<&str>,
        source: S,
        detector: D,
        associator: A,
    ) -> Result<SessionHandle, Error>
    where
        S: FrameSource + Send + 'static,
        D: Detector<S::Frame> + Send + 'static,
        A: Associator<S::Frame> + Send + 'static,
    {
        if self.is_processing() {
            return Err(Error::AlreadyRunning);
        }

        // outside the lock; the flag is checked again before it is taken
        source.validate()?;

        let label = match label {
            Some(label) if !label.is_empty() => label.to_string(),
            _ => self.config.default_lab.clone(),
        };

        {
            let mut state = self.lock();
            if state.processing {
                return Err(Error::AlreadyRunning);
            }

            state.processing = true;
            state.current_lab = Some(label.clone());
            state.labs.insert(label.clone(), 0);
        }

        info!(target: "session", "processing video for lab {label}");

        let mut driver = FrameDriver::new(label.clone(), &self.config, self.clone());
        let spawned = thread::Builder::new()
            .name("frame-pipeline".into())
            .spawn(move || driver.run(source, detector, associator));

        match spawned {
            Ok(handle) => Ok(SessionHandle { label, handle }),
            Err(err) => {
                self.finish();
                Err(err.into())
            }
        }
    }

    /// Publishes the latest confirmed count for the active label.
    pub fn report(&self, count: usize) {
        let mut state = self.lock();
        if !state.processing {
            return;
        }

        if let Some(lab) = state.current_lab.clone() {
            state.labs.insert(lab, count);
        }
    }

    /// Ends the active session. The label and its last count stay readable.
    pub fn finish(&self) {
        self.lock().processing = false;
    }

    pub fn status(&self) -> Status {
        let state = self.lock();

        Status {
            labs: state.labs.clone(),
            current_lab: state.current_lab.clone(),
            processing: state.processing,
            processing_lab: state
                .current_lab
                .clone()
                .filter(|_| state.processing),
        }
    }

    /// Last known count for `label`, 0 if it was never processed.
    pub fn count(&self, label: &str) -> usize {
        self.lock().labs.get(label).copied().unwrap_or(0)
    }

    #[inline]
    pub fn is_processing(&self) -> bool {
        self.lock().processing
    }
}

/// Join handle for a launched session.
#[derive(Debug)]
pub struct SessionHandle {
    label: String,
    handle: JoinHandle<Result<RunSummary, Error>>,
}

impl SessionHandle {
    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the pipeline ends and returns its outcome.
    pub fn join(self) -> Result<RunSummary, Error> {
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => {
                warn!(target: "session", "pipeline thread for {} panicked", self.label);
                Err(Error::Panicked)
            }
        }
    }
}
