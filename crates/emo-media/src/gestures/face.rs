//! Facial expression rules over the face mesh.

use emo_models::{PersonLandmarks, Point3};

use super::{above, all_of, below};
use crate::landmarks::{face as idx, FACE_MESH_POINTS};

/// Face labels in catalog order.
pub const FACE_LABELS: &[&str] = &[
    "smile",
    "frown",
    "raised_eyebrows",
    "squint",
    "mouth_open",
    "brow_furrow",
    "surprise",
    "concentration",
    "confusion",
    "contempt",
    "sadness",
    "joy",
    "thinking",
    "skeptical",
    "amused",
    "interested",
];

/// Measurements the expression rules are written against.
pub(crate) struct FaceGeometry<'a> {
    points: &'a [Point3],
}

impl<'a> FaceGeometry<'a> {
    pub(crate) fn from_person(person: &'a PersonLandmarks) -> Option<Self> {
        if person.keypoints.len() < FACE_MESH_POINTS {
            return None;
        }
        Some(Self {
            points: &person.keypoints,
        })
    }

    fn p(&self, index: usize) -> &Point3 {
        &self.points[index]
    }

    /// Horizontal distance between mouth corners.
    fn mouth_width(&self) -> f64 {
        (self.p(idx::MOUTH_LEFT).x - self.p(idx::MOUTH_RIGHT).x).abs()
    }

    /// Vertical gap between inner lips.
    fn mouth_gap(&self) -> f64 {
        (self.p(idx::LIP_UPPER_INNER).y - self.p(idx::LIP_LOWER_INNER).y).abs()
    }

    /// Eyelid to brow height (image y grows downward).
    fn brow_raise(&self) -> f64 {
        self.p(idx::LEFT_EYE_UPPER).y - self.p(idx::BROW_LEFT).y
    }

    fn eye_opening(&self) -> f64 {
        (self.p(idx::LEFT_EYE_UPPER).y - self.p(idx::LEFT_EYE_LOWER).y).abs()
    }

    fn brow_gap(&self) -> f64 {
        (self.p(idx::BROW_LEFT).x - self.p(idx::BROW_RIGHT).x).abs()
    }

    fn mouth_tilt(&self) -> f64 {
        (self.p(idx::MOUTH_LEFT).y - self.p(idx::MOUTH_RIGHT).y).abs()
    }

    /// Confidence per label, aligned with [`FACE_LABELS`].
    pub(crate) fn evaluate(&self) -> [Option<f64>; 16] {
        let width = self.mouth_width();
        let gap = self.mouth_gap();
        let raise = self.brow_raise();
        let eye = self.eye_opening();
        let brows = self.brow_gap();
        let upper_lip = self.p(idx::LIP_UPPER_INNER).y;
        let lip_drop = upper_lip - self.p(idx::LIP_LOWER_INNER).y;
        let face_height = self.p(idx::CHIN).y - self.p(idx::FOREHEAD).y;

        [
            above(width, 0.05),
            below(width, 0.035),
            above(raise, 0.04),
            below(eye, 0.01),
            above(gap, 0.04),
            below(brows, 0.03),
            all_of(&[above(raise, 0.06), above(gap, 0.05)]),
            all_of(&[below(brows, 0.035), below(eye, 0.012)]),
            all_of(&[above(raise, 0.03), below(width, 0.025)]),
            above(self.mouth_tilt(), 0.015),
            all_of(&[
                above(self.p(idx::MOUTH_LEFT).y - upper_lip, 0.015),
                above(self.p(idx::MOUTH_RIGHT).y - upper_lip, 0.015),
            ]),
            all_of(&[above(width, 0.07), above(eye, 0.02)]),
            all_of(&[below(brows, 0.04), above(lip_drop, 0.015)]),
            all_of(&[above(raise, 0.04), below(width, 0.025)]),
            all_of(&[above(width, 0.06), below(eye, 0.015)]),
            all_of(&[above(raise, 0.035), above(face_height, 0.05)]),
        ]
    }
}
