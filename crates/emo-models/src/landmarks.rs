//! Landmark data produced by the external face/pose landmark model.
//!
//! Coordinates are normalized image coordinates (x, y in [0, 1], z relative
//! depth), matching the face-mesh and pose layouts the extractor emits.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single 3D keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct Point3 {
    pub x: f64,
    pub y: f64,
    #[serde(default)]
    pub z: f64,
}

impl Point3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance in 3D.
    pub fn distance(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Euclidean distance in the image plane (ignores depth).
    pub fn distance_2d(&self, other: &Point3) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<(f64, f64, f64)> for Point3 {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

/// Landmarks for one detected person in a frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PersonLandmarks {
    /// Index of the detected person/face within the frame
    pub person_index: u32,

    /// Face mesh keypoints (468/478-point layout)
    #[serde(default)]
    pub keypoints: Vec<Point3>,

    /// Body pose keypoints (33-point layout), empty when not extracted
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pose: Vec<Point3>,
}

impl PersonLandmarks {
    /// Create landmarks for a person with face keypoints only.
    pub fn new(person_index: u32, keypoints: Vec<Point3>) -> Self {
        Self {
            person_index,
            keypoints,
            pose: Vec::new(),
        }
    }

    /// Attach body pose keypoints.
    pub fn with_pose(mut self, pose: Vec<Point3>) -> Self {
        self.pose = pose;
        self
    }

    /// Face keypoint by index.
    pub fn point(&self, index: usize) -> Option<&Point3> {
        self.keypoints.get(index)
    }

    /// Pose keypoint by index.
    pub fn pose_point(&self, index: usize) -> Option<&Point3> {
        self.pose.get(index)
    }

    pub fn has_pose(&self) -> bool {
        !self.pose.is_empty()
    }
}

/// The full set of landmarks detected in one frame.
///
/// Snapshots are immutable once captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LandmarkSnapshot {
    /// Frame index within the input (0-based)
    pub frame_index: u64,

    /// Timestamp in seconds
    pub timestamp: f64,

    /// Detected persons, in extractor order
    pub persons: Vec<PersonLandmarks>,
}

impl LandmarkSnapshot {
    pub fn new(frame_index: u64, timestamp: f64, persons: Vec<PersonLandmarks>) -> Self {
        Self {
            frame_index,
            timestamp,
            persons,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }
}
