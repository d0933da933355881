//! Landmark extraction seam.
//!
//! The landmark model itself is an external collaborator. This module defines
//! the trait the sampler drives, the index layout of the face-mesh and pose
//! models it expects, and two extractors for landmarks produced upstream.
//!
//! # Face mesh layout (468/478-point model)
//!
//! - 61 / 291: mouth corners (left / right)
//! - 13 / 14: inner upper / lower lip
//! - 65 / 295: inner brow (left / right)
//! - 159 / 145: left eye upper / lower lid
//! - 386 / 374: right eye upper / lower lid
//! - 6 / 168: nose bridge
//! - 10: forehead, 152: chin, 172 / 397: jaw
//! - 151: mid forehead, 109 / 338: forehead sides, 55 / 285: inner brow ends
//! - 33 / 362: eye corners
//!
//! # Pose layout (33-point model)
//!
//! Indices follow the standard body pose topology: nose 0, shoulders 11/12,
//! elbows 13/14, wrists 15/16, hips 23/24, knees 25/26, ankles 27/28.

use std::collections::HashMap;
use std::path::Path;

use emo_models::PersonLandmarks;
use tracing::{debug, info};

use crate::error::{MediaError, MediaResult};
use crate::source::Frame;

/// Minimum number of face points for the full face-mesh layout.
pub const FACE_MESH_POINTS: usize = 468;

/// Number of points in the body pose layout.
pub const POSE_POINTS: usize = 33;

/// Key face landmarks used for change detection.
pub const KEY_FACE_LANDMARKS: &[usize] = &[
    61, 291, // mouth corners
    65, 295, // inner brows
    159, 386, 145, 374, // eyelids
    6, 168, // nose bridge
    152, 172, 397, // jaw
];

/// Face mesh indices.
pub mod face {
    pub const MOUTH_LEFT: usize = 61;
    pub const MOUTH_RIGHT: usize = 291;
    pub const LIP_UPPER_INNER: usize = 13;
    pub const LIP_LOWER_INNER: usize = 14;
    pub const BROW_LEFT: usize = 65;
    pub const BROW_RIGHT: usize = 295;
    pub const LEFT_EYE_UPPER: usize = 159;
    pub const LEFT_EYE_LOWER: usize = 145;
    pub const NOSE_BRIDGE: usize = 6;
    pub const NOSE_TOP: usize = 168;
    pub const FOREHEAD: usize = 10;
    pub const CHIN: usize = 152;
    pub const FOREHEAD_MID: usize = 151;
    pub const FOREHEAD_LEFT: usize = 109;
    pub const FOREHEAD_RIGHT: usize = 338;
    pub const INNER_BROW_LEFT: usize = 55;
    pub const INNER_BROW_RIGHT: usize = 285;
    pub const RIGHT_EYE_UPPER: usize = 386;
    pub const RIGHT_EYE_LOWER: usize = 374;
    pub const LEFT_EYE_OUTER: usize = 33;
    pub const RIGHT_EYE_INNER: usize = 362;
    pub const JAW_LEFT: usize = 172;
    pub const JAW_RIGHT: usize = 397;
}

/// Body pose indices.
pub mod pose {
    pub const NOSE: usize = 0;
    pub const LEFT_SHOULDER: usize = 11;
    pub const RIGHT_SHOULDER: usize = 12;
    pub const LEFT_ELBOW: usize = 13;
    pub const RIGHT_ELBOW: usize = 14;
    pub const LEFT_WRIST: usize = 15;
    pub const RIGHT_WRIST: usize = 16;
    pub const LEFT_HIP: usize = 23;
    pub const RIGHT_HIP: usize = 24;
    pub const LEFT_ANKLE: usize = 27;
    pub const RIGHT_ANKLE: usize = 28;
}

/// Produces landmarks for a frame.
///
/// `Ok(None)` means no face was found; the sampler skips the frame without
/// touching its baseline. `Err` is treated as a per-frame failure.
pub trait LandmarkExtractor: Send {
    fn extract(&mut self, frame: &Frame) -> MediaResult<Option<Vec<PersonLandmarks>>>;
}

impl<T: LandmarkExtractor + ?Sized> LandmarkExtractor for Box<T> {
    fn extract(&mut self, frame: &Frame) -> MediaResult<Option<Vec<PersonLandmarks>>> {
        (**self).extract(frame)
    }
}

fn non_empty(persons: Vec<PersonLandmarks>) -> Option<Vec<PersonLandmarks>> {
    if persons.is_empty() {
        None
    } else {
        Some(persons)
    }
}

/// Uses the landmarks carried on the frame itself.
///
/// For producers (a webcam client, an upstream decoder) that already ran the
/// model and ship landmarks together with pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmbeddedLandmarks;

impl LandmarkExtractor for EmbeddedLandmarks {
    fn extract(&mut self, frame: &Frame) -> MediaResult<Option<Vec<PersonLandmarks>>> {
        Ok(frame.landmarks.clone().and_then(non_empty))
    }
}

/// Landmarks emitted by an external model, keyed by frame index.
///
/// The on-disk format is a JSON object whose keys are frame indices:
///
/// ```json
/// { "0": [ { "person_index": 0, "keypoints": [{"x": 0.5, "y": 0.4, "z": 0.0}] } ] }
/// ```
///
/// Frames without an entry (or with an empty list) report no face.
#[derive(Debug, Default, Clone)]
pub struct PrecomputedExtractor {
    frames: HashMap<u64, Vec<PersonLandmarks>>,
}

impl PrecomputedExtractor {
    pub fn from_map(frames: HashMap<u64, Vec<PersonLandmarks>>) -> Self {
        Self { frames }
    }

    /// Load landmarks from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let extractor = Self::from_json_str(&content)?;
        info!(
            path = %path.display(),
            frames = extractor.frames.len(),
            "Loaded precomputed landmarks"
        );
        Ok(extractor)
    }

    pub fn from_json_str(json: &str) -> MediaResult<Self> {
        let frames: HashMap<u64, Vec<PersonLandmarks>> = serde_json::from_str(json)?;
        Ok(Self { frames })
    }

    /// Number of frames with landmark entries.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl LandmarkExtractor for PrecomputedExtractor {
    fn extract(&mut self, frame: &Frame) -> MediaResult<Option<Vec<PersonLandmarks>>> {
        let persons = self.frames.get(&frame.index).cloned();
        if persons.is_none() {
            debug!(frame_index = frame.index, "No precomputed landmarks for frame");
        }
        Ok(persons.and_then(non_empty))
    }
}
