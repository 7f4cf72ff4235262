use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("a session is already running")]
    AlreadyRunning,

    #[error("invalid source: {0}")]
    InvalidSource(String),

    #[error("unable to open source: {0}")]
    SourceOpen(String),

    #[error("source read failed: {0}")]
    Source(String),

    #[error("detector failed: {0}")]
    Detector(String),

    #[error("associator failed: {0}")]
    Associator(String),

    #[error("frame {got} is not after frame {previous}")]
    FrameOutOfOrder { previous: u64, got: u64 },

    #[error("pipeline thread panicked")]
    Panicked,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("wrong file format at line {line}: {reason}")]
    Format { line: usize, reason: String },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    Json(#[from] serde_json::Error),
}
