//! Body language rules over the 33-point pose.
//!
//! Each rule accumulates weighted evidence into a score in [0, 1]; the
//! classifier reports a label once its score reaches the reporting floor.

use emo_models::{PersonLandmarks, Point3};

use crate::landmarks::{pose as idx, POSE_POINTS};

/// Body labels in catalog order.
pub const BODY_LABELS: &[&str] = &[
    "crossed_arms",
    "hands_on_hips",
    "arms_open",
    "leaning_forward",
    "leaning_back",
    "wide_stance",
    "closed_stance",
    "hand_to_face",
];

pub(crate) struct PoseGeometry<'a> {
    points: &'a [Point3],
}

impl<'a> PoseGeometry<'a> {
    pub(crate) fn from_person(person: &'a PersonLandmarks) -> Option<Self> {
        if person.pose.len() < POSE_POINTS {
            return None;
        }
        Some(Self {
            points: &person.pose,
        })
    }

    fn p(&self, index: usize) -> &Point3 {
        &self.points[index]
    }

    fn shoulder_width(&self) -> f64 {
        (self.p(idx::LEFT_SHOULDER).x - self.p(idx::RIGHT_SHOULDER).x).abs()
    }

    fn ankle_width(&self) -> f64 {
        (self.p(idx::LEFT_ANKLE).x - self.p(idx::RIGHT_ANKLE).x).abs()
    }

    fn hip_center_x(&self) -> f64 {
        (self.p(idx::LEFT_HIP).x + self.p(idx::RIGHT_HIP).x) / 2.0
    }

    fn crossed_arms(&self) -> f64 {
        let lw = self.p(idx::LEFT_WRIST);
        let rw = self.p(idx::RIGHT_WRIST);
        let le = self.p(idx::LEFT_ELBOW);
        let re = self.p(idx::RIGHT_ELBOW);

        let left_angle = joint_angle(self.p(idx::LEFT_SHOULDER), le, lw);
        let right_angle = joint_angle(self.p(idx::RIGHT_SHOULDER), re, rw);
        let folded = |angle: f64| angle > 70.0 && angle < 110.0;

        let mut score = 0.0;
        if (lw.x - rw.x).abs() < 0.3 {
            score += 0.4;
        }
        if (le.y - re.y).abs() < 0.1 {
            score += 0.3;
        }
        if folded(left_angle) && folded(right_angle) {
            score += 0.3;
        }
        score
    }

    fn hands_on_hips(&self) -> f64 {
        let mut score = 0.0;
        if self.p(idx::LEFT_WRIST).distance_2d(self.p(idx::LEFT_HIP)) < 0.15 {
            score += 0.5;
        }
        if self.p(idx::RIGHT_WRIST).distance_2d(self.p(idx::RIGHT_HIP)) < 0.15 {
            score += 0.5;
        }
        score
    }

    fn arms_open(&self) -> f64 {
        let lw = self.p(idx::LEFT_WRIST);
        let rw = self.p(idx::RIGHT_WRIST);
        let ls = self.p(idx::LEFT_SHOULDER);
        let rs = self.p(idx::RIGHT_SHOULDER);

        let mut score = 0.0;
        if (lw.x - rw.x).abs() > self.shoulder_width() * 1.5 {
            score += 0.6;
        }
        if (lw.y - ls.y).abs() < 0.3 && (rw.y - rs.y).abs() < 0.3 {
            score += 0.4;
        }
        score
    }

    fn leaning_forward(&self) -> f64 {
        if self.p(idx::NOSE).x > self.hip_center_x() + 0.1 {
            0.8
        } else {
            0.0
        }
    }

    fn leaning_back(&self) -> f64 {
        if self.p(idx::NOSE).x < self.hip_center_x() - 0.1 {
            0.8
        } else {
            0.0
        }
    }

    fn wide_stance(&self) -> f64 {
        if self.ankle_width() > self.shoulder_width() * 1.3 {
            0.8
        } else {
            0.0
        }
    }

    fn closed_stance(&self) -> f64 {
        if self.ankle_width() < 0.08 {
            0.8
        } else {
            0.0
        }
    }

    fn hand_to_face(&self) -> f64 {
        let nose = self.p(idx::NOSE);
        let near = self.p(idx::LEFT_WRIST).distance_2d(nose) < 0.2
            || self.p(idx::RIGHT_WRIST).distance_2d(nose) < 0.2;
        if near {
            0.7
        } else {
            0.0
        }
    }

    /// Raw scores aligned with [`BODY_LABELS`].
    pub(crate) fn evaluate(&self) -> [f64; 8] {
        [
            self.crossed_arms(),
            self.hands_on_hips(),
            self.arms_open(),
            self.leaning_forward(),
            self.leaning_back(),
            self.wide_stance(),
            self.closed_stance(),
            self.hand_to_face(),
        ]
    }
}

/// Angle at `b` formed by `a-b-c`, in degrees within [0, 180].
fn joint_angle(a: &Point3, b: &Point3, c: &Point3) -> f64 {
    let radians = (c.y - b.y).atan2(c.x - b.x) - (a.y - b.y).atan2(a.x - b.x);
    let angle = radians.to_degrees().abs();
    if angle > 180.0 {
        360.0 - angle
    } else {
        angle
    }
}
