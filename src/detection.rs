use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// Semantic label carried by every detection that passes the filter.
pub const SUBJECT_LABEL: &str = "person";

/// Raw detector output: corners in frame pixels, score and class.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: BBox<Ltrb>,
    #[serde(rename = "p")]
    pub confidence: f32,
    #[serde(rename = "c")]
    pub class: i32,
}

impl Detection {
    #[inline]
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, confidence: f32, class: i32) -> Self {
        Self {
            bbox: BBox::ltrb(x1, y1, x2, y2),
            confidence,
            class,
        }
    }

    #[inline(always)]
    pub fn area(&self) -> f32 {
        self.bbox.area()
    }

    #[inline(always)]
    pub fn aspect_ratio(&self) -> f32 {
        self.bbox.aspect_ratio()
    }
}

/// A [`Detection`] that passed the [`DetectionFilter`](crate::filter::DetectionFilter).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissibleDetection {
    pub detection: Detection,
    pub label: &'static str,
}

impl AdmissibleDetection {
    pub(crate) fn new(detection: Detection) -> Self {
        Self {
            detection,
            label: SUBJECT_LABEL,
        }
    }

    #[inline(always)]
    pub fn bbox(&self) -> BBox<Ltrb> {
        self.detection.bbox
    }

    #[inline(always)]
    pub fn confidence(&self) -> f32 {
        self.detection.confidence
    }
}
