pub mod bbox;
pub mod config;
pub mod confirmation;
pub mod detection;
pub mod error;
pub mod filter;
pub mod frame;
pub mod pipeline;
pub mod replay;
pub mod session;
pub mod track;

pub use config::Config;
pub use confirmation::ConfirmationEngine;
pub use detection::{AdmissibleDetection, Detection};
pub use filter::DetectionFilter;
pub use frame::Frame;
pub use pipeline::FrameDriver;
pub use session::{SessionController, SessionHandle, Status};
pub use track::{Track, TrackId};

use error::Error;

/// An ordered stream of frames, owned by the pipeline for one session.
pub trait FrameSource {
    type Frame;

    /// Cheap check run synchronously before a session is accepted.
    fn validate(&self) -> Result<(), Error> {
        Ok(())
    }

    fn open(&mut self) -> Result<(), Error>;

    /// `Ok(None)` once the stream is exhausted.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>, Error>;
}

/// Per-frame object detector. Output is unfiltered.
pub trait Detector<F> {
    fn detect(&mut self, frame: &F) -> Result<Vec<Detection>, Error>;
}

/// Assigns stable identities to the admissible detections of a frame.
pub trait Associator<F> {
    fn associate(
        &mut self,
        frame: &F,
        detections: &[AdmissibleDetection],
    ) -> Result<Vec<Track>, Error>;
}
