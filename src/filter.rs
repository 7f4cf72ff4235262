use serde_derive::{Deserialize, Serialize};

use crate::detection::{AdmissibleDetection, Detection};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    pub class: i32,
    pub min_area: f32,
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    pub min_confidence: f32,
}

impl FilterConfig {
    pub fn new(class: i32) -> Self {
        Self {
            class,
            min_area: 900.0,
            min_aspect_ratio: 0.3,
            max_aspect_ratio: 3.5,
            min_confidence: 0.0,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Geometric admissibility check applied to raw detector output before it
/// reaches the associator.
#[derive(Debug, Clone, Default)]
pub struct DetectionFilter {
    config: FilterConfig,
}

impl DetectionFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    pub fn is_admissible(&self, det: &Detection) -> bool {
        if det.class != self.config.class {
            return false;
        }

        if det.confidence < self.config.min_confidence {
            return false;
        }

        if !det.bbox.is_finite() {
            return false;
        }

        // strict `<`: a box of exactly `min_area` is kept
        if det.area() < self.config.min_area || det.area() <= 0.0 {
            return false;
        }

        let aspect = det.aspect_ratio();

        aspect >= self.config.min_aspect_ratio && aspect <= self.config.max_aspect_ratio
    }

    #[inline]
    pub fn admit(&self, det: &Detection) -> Option<AdmissibleDetection> {
        if self.is_admissible(det) {
            Some(AdmissibleDetection::new(*det))
        } else {
            None
        }
    }

    pub fn apply(&self, dets: &[Detection]) -> Vec<AdmissibleDetection> {
        dets.iter().filter_map(|det| self.admit(det)).collect()
    }
}
