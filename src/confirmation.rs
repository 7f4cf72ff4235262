use std::collections::{HashMap, HashSet};

use log::debug;
use serde_derive::{Deserialize, Serialize};

use crate::error::Error;
use crate::track::{Track, TrackId};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ConfirmationConfig {
    /// Consecutive sightings required before an identity is counted.
    pub threshold: u32,
    /// Frames an identity may stay unseen before its state is dropped.
    pub expiry: u64,
}

impl Default for ConfirmationConfig {
    fn default() -> Self {
        Self {
            threshold: 12,
            expiry: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackState {
    pub consecutive: u32,
    pub last_seen: u64,
}

/// Turns per-frame tracker output into a monotonic count of identities that
/// were seen for `threshold` frames in a row.
#[derive(Debug, Default)]
pub struct ConfirmationEngine {
    config: ConfirmationConfig,
    states: HashMap<TrackId, TrackState>,
    confirmed: HashSet<TrackId>,
    last_frame: Option<u64>,
}

impl ConfirmationEngine {
    pub fn new(config: ConfirmationConfig) -> Self {
        Self {
            config,
            states: HashMap::with_capacity(64),
            confirmed: HashSet::new(),
            last_frame: None,
        }
    }

    /// Feeds the tracks visible in `frame_index` and returns the confirmed count.
    ///
    /// Tracks the oracle has not confirmed itself are ignored. Indices must be
    /// strictly increasing across calls; gaps between them are allowed and
    /// count as missed frames.
    pub fn advance(&mut self, frame_index: u64, observed: &[Track]) -> Result<usize, Error> {
        if let Some(previous) = self.last_frame {
            if frame_index <= previous {
                return Err(Error::FrameOutOfOrder {
                    previous,
                    got: frame_index,
                });
            }
        }
        self.last_frame = Some(frame_index);

        let mut seen = HashSet::with_capacity(observed.len());

        for track in observed.iter().filter(|t| t.confirmed) {
            let id = track.track_id;
            if !seen.insert(id) {
                continue;
            }

            let state = self.states.entry(id).or_insert(TrackState {
                consecutive: 0,
                last_seen: 0,
            });

            if state.consecutive > 0 && state.last_seen + 1 == frame_index {
                state.consecutive += 1;
            } else {
                state.consecutive = 1;
            }
            state.last_seen = frame_index;

            if state.consecutive >= self.config.threshold && self.confirmed.insert(id) {
                debug!(target: "confirmation", "track {id} confirmed at frame {frame_index}");
            }
        }

        let expiry = self.config.expiry;
        self.states.retain(|id, state| {
            if seen.contains(id) {
                return true;
            }

            if frame_index - state.last_seen > expiry {
                debug!(target: "confirmation", "track {id} expired at frame {frame_index}");
                return false;
            }

            state.consecutive = 0;
            true
        });

        Ok(self.confirmed.len())
    }

    #[inline]
    pub fn confirmed_count(&self) -> usize {
        self.confirmed.len()
    }

    #[inline]
    pub fn is_confirmed(&self, id: TrackId) -> bool {
        self.confirmed.contains(&id)
    }

    #[inline]
    pub fn state(&self, id: TrackId) -> Option<&TrackState> {
        self.states.get(&id)
    }

    /// Number of identities that currently hold state.
    #[inline]
    pub fn tracked(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn last_frame(&self) -> Option<u64> {
        self.last_frame
    }

    #[inline]
    pub fn config(&self) -> &ConfirmationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bbox::BBox;

    fn seen(id: TrackId) -> Track {
        Track::new(id, BBox::ltrb(0.0, 0.0, 40.0, 80.0), true)
    }

    fn tentative(id: TrackId) -> Track {
        Track::new(id, BBox::ltrb(0.0, 0.0, 40.0, 80.0), false)
    }

    fn engine() -> ConfirmationEngine {
        ConfirmationEngine::new(ConfirmationConfig::default())
    }

    #[test]
    fn confirms_exactly_at_threshold() {
        let mut engine = engine();

        // frames 5..=15 are 11 sightings
        for frame in 5..16 {
            assert_eq!(engine.advance(frame, &[seen(7)]).unwrap(), 0);
            assert!(!engine.is_confirmed(7));
        }

        assert_eq!(engine.advance(16, &[seen(7)]).unwrap(), 1);
        assert!(engine.is_confirmed(7));
        assert_eq!(engine.state(7).unwrap().consecutive, 12);
    }

    #[test]
    fn tentative_tracks_never_touch_state() {
        let mut engine = engine();

        for frame in 1..40 {
            assert_eq!(engine.advance(frame, &[tentative(1)]).unwrap(), 0);
        }

        assert!(engine.state(1).is_none());
        assert_eq!(engine.tracked(), 0);
    }

    #[test]
    fn short_gap_breaks_streak_but_keeps_state() {
        let mut engine = engine();

        for frame in 1..12 {
            engine.advance(frame, &[seen(4)]).unwrap();
        }
        assert_eq!(engine.state(4).unwrap().consecutive, 11);

        // one missed frame
        engine.advance(12, &[]).unwrap();
        assert_eq!(
            engine.state(4),
            Some(&TrackState {
                consecutive: 0,
                last_seen: 11
            })
        );

        // needs a full new run of 12
        for frame in 13..24 {
            assert_eq!(engine.advance(frame, &[seen(4)]).unwrap(), 0);
        }
        assert_eq!(engine.advance(24, &[seen(4)]).unwrap(), 1);
    }

    #[test]
    fn long_gap_expires_state() {
        let mut engine = engine();

        for frame in 1..12 {
            engine.advance(frame, &[seen(9)]).unwrap();
        }

        // last seen at 11, expiry 16: still held at 27, gone at 28
        for frame in 12..28 {
            engine.advance(frame, &[]).unwrap();
            assert!(engine.state(9).is_some(), "frame {frame}");
        }
        engine.advance(28, &[]).unwrap();
        assert!(engine.state(9).is_none());

        engine.advance(29, &[seen(9)]).unwrap();
        assert_eq!(
            engine.state(9),
            Some(&TrackState {
                consecutive: 1,
                last_seen: 29
            })
        );
    }

    #[test]
    fn confirmation_survives_expiry() {
        let mut engine = engine();

        for frame in 1..=12 {
            engine.advance(frame, &[seen(3)]).unwrap();
        }
        assert_eq!(engine.confirmed_count(), 1);

        for frame in 13..60 {
            assert_eq!(engine.advance(frame, &[]).unwrap(), 1);
        }
        assert!(engine.state(3).is_none());
        assert!(engine.is_confirmed(3));
    }

    #[test]
    fn reappearance_after_short_gap_keeps_count() {
        let mut engine = engine();

        // confirmed at 20
        for frame in 9..=20 {
            engine.advance(frame, &[seen(3)]).unwrap();
        }
        assert_eq!(engine.confirmed_count(), 1);

        for frame in 21..30 {
            assert_eq!(engine.advance(frame, &[]).unwrap(), 1);
            if frame == 22 {
                assert_eq!(engine.state(3).unwrap().consecutive, 0);
            }
        }

        assert_eq!(engine.advance(30, &[seen(3)]).unwrap(), 1);
        assert_eq!(engine.state(3).unwrap().consecutive, 1);
        assert_eq!(engine.advance(31, &[seen(3)]).unwrap(), 1);
        assert_eq!(engine.state(3).unwrap().consecutive, 2);
    }

    #[test]
    fn count_is_monotonic() {
        let mut engine = engine();
        let mut last = 0;

        for frame in 1..200u64 {
            let visible: Vec<_> = (0..6u64)
                .filter(|id| (frame / (id + 3)) % 2 == 0)
                .map(seen)
                .collect();
            let count = engine.advance(frame, &visible).unwrap();
            assert!(count >= last);
            last = count;
        }
    }

    #[test]
    fn duplicate_ids_in_one_frame_count_once() {
        let mut engine = engine();

        engine.advance(1, &[seen(5), seen(5)]).unwrap();
        assert_eq!(engine.state(5).unwrap().consecutive, 1);

        engine.advance(2, &[seen(5), seen(5)]).unwrap();
        assert_eq!(engine.state(5).unwrap().consecutive, 2);
    }

    #[test]
    fn rejects_non_increasing_frames() {
        let mut engine = engine();

        engine.advance(5, &[seen(1)]).unwrap();
        assert!(matches!(
            engine.advance(5, &[seen(1)]),
            Err(Error::FrameOutOfOrder {
                previous: 5,
                got: 5
            })
        ));
        assert!(engine.advance(3, &[]).is_err());

        assert_eq!(engine.state(1).unwrap().consecutive, 1);
        assert_eq!(engine.last_frame(), Some(5));
    }
}
