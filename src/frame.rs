use serde_derive::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::track::Track;

/// One recorded frame: what the detector and the associator produced for it.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Frame {
    #[serde(default)]
    pub dims: (u32, u32),
    #[serde(default)]
    pub detections: Vec<Detection>,
    #[serde(default)]
    pub tracks: Vec<Track>,
}

impl Frame {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.detections.is_empty()
    }
}
