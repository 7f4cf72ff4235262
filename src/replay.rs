//! Recorded detector and tracker output played back as a session.
//!
//! A dump holds one frame per line as `index:json`, where `index` is the
//! frame number at recording time and `json` is a serialized [`Frame`]:
//!
//! ```text
//! 1:{"dims":[640,480],"detections":[{"bbox":[10,10,50,100],"p":0.8,"c":0}],"tracks":[{"id":3,"bbox":[10,10,50,100],"confirmed":true}]}
//! ```
//!
//! Recorded tracks only come back out of [`ReplayAssociator`] when they
//! overlap a detection that passed the filter, so filter settings change the
//! replayed count the same way they would gate a live tracker's input.
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;

use crate::detection::{AdmissibleDetection, Detection};
use crate::error::Error;
use crate::frame::Frame;
use crate::track::Track;
use crate::{Associator, Detector, FrameSource};

enum Input {
    Path {
        path: PathBuf,
        lines: Option<Lines<BufReader<File>>>,
        line: usize,
    },
    Memory(VecDeque<Frame>),
}

pub struct ReplaySource {
    input: Input,
}

impl ReplaySource {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            input: Input::Path {
                path: path.into(),
                lines: None,
                line: 0,
            },
        }
    }

    pub fn from_frames<I: IntoIterator<Item = Frame>>(frames: I) -> Self {
        Self {
            input: Input::Memory(frames.into_iter().collect()),
        }
    }
}

pub fn parse_line(line: usize, text: &str) -> Result<Frame, Error> {
    let Some(idx) = text.find(':') else {
        return Err(Error::Format {
            line,
            reason: "expected `:`".into(),
        });
    };

    let (index, json) = text.split_at(idx);

    if index.trim().parse::<u64>().is_err() {
        return Err(Error::Format {
            line,
            reason: format!("parse frame index failed: {index:?}"),
        });
    }

    serde_json::from_str(&json[1..]).map_err(|err| Error::Format {
        line,
        reason: format!("parse json failed: {err}"),
    })
}

impl FrameSource for ReplaySource {
    type Frame = Frame;

    fn validate(&self) -> Result<(), Error> {
        match &self.input {
            Input::Path { path, .. } if path.as_os_str().is_empty() => {
                Err(Error::InvalidSource("no video path provided".into()))
            }
            _ => Ok(()),
        }
    }

    fn open(&mut self) -> Result<(), Error> {
        if let Input::Path { path, lines, .. } = &mut self.input {
            let file = File::open(&*path)
                .map_err(|err| Error::SourceOpen(format!("{}: {err}", path.display())))?;
            *lines = Some(BufReader::new(file).lines());
        }

        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, Error> {
        match &mut self.input {
            Input::Memory(frames) => Ok(frames.pop_front()),
            Input::Path { lines, line, .. } => {
                let Some(lines) = lines.as_mut() else {
                    return Err(Error::Source("read before open".into()));
                };

                for text in lines.by_ref() {
                    let text = text.map_err(|err| Error::Source(err.to_string()))?;
                    *line += 1;

                    if text.trim().is_empty() {
                        continue;
                    }

                    return parse_line(*line, &text).map(Some);
                }

                Ok(None)
            }
        }
    }
}

/// Plays back the detections stored in each frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayDetector;

impl Detector<Frame> for ReplayDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>, Error> {
        Ok(frame.detections.clone())
    }
}

/// Plays back the recorded tracks that overlap an admissible detection by at
/// least `min_iou`.
#[derive(Debug, Clone, Copy)]
pub struct ReplayAssociator {
    pub min_iou: f32,
}

impl ReplayAssociator {
    pub fn new(min_iou: f32) -> Self {
        Self { min_iou }
    }
}

impl Default for ReplayAssociator {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Associator<Frame> for ReplayAssociator {
    fn associate(
        &mut self,
        frame: &Frame,
        detections: &[AdmissibleDetection],
    ) -> Result<Vec<Track>, Error> {
        Ok(frame
            .tracks
            .iter()
            .filter(|track| {
                detections
                    .iter()
                    .any(|det| track.bbox.iou(&det.bbox()) >= self.min_iou)
            })
            .copied()
            .collect())
    }
}
