use serde_derive::{Deserialize, Serialize};

use crate::bbox::{BBox, Ltrb};

/// Identity assigned by the association oracle. Opaque to this crate and
/// possibly recycled by the oracle once it drops a track.
pub type TrackId = u64;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Track {
    #[serde(rename = "id")]
    pub track_id: TrackId,
    pub bbox: BBox<Ltrb>,

    // the oracle's own judgement, unrelated to count-level confirmation
    pub confirmed: bool,
}

impl Track {
    #[inline]
    pub fn new(track_id: TrackId, bbox: BBox<Ltrb>, confirmed: bool) -> Self {
        Self {
            track_id,
            bbox,
            confirmed,
        }
    }
}
