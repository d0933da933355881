//! Heuristic gesture and expression classification.
//!
//! Pure geometry over a single [`LandmarkSnapshot`]: no state, no I/O. The
//! same snapshot always yields the same labels, in catalog order.
//!
//! Two rule families:
//! - face expressions, evaluated when a person has the full face mesh
//! - body language, evaluated when a person has the 33-point pose
//!
//! A person with neither yields no labels. With several persons in frame the
//! highest confidence per label wins. The [`stress`] module scores the same
//! geometry into a stress estimate.

mod body;
mod face;
pub mod stress;

use emo_models::{GestureLabel, LandmarkSnapshot, PersonLandmarks};

pub use body::BODY_LABELS;
pub use face::FACE_LABELS;

/// Reporting floor for weighted body-pose scores.
pub const BODY_REPORT_FLOOR: f64 = 0.5;

/// Every label the classifier can emit, in output order.
pub fn catalog() -> impl Iterator<Item = &'static str> {
    FACE_LABELS.iter().chain(BODY_LABELS.iter()).copied()
}

/// Classify all persons in a snapshot.
pub fn classify(snapshot: &LandmarkSnapshot) -> Vec<GestureLabel> {
    let mut best: Vec<Option<f64>> = vec![None; FACE_LABELS.len() + BODY_LABELS.len()];

    for person in &snapshot.persons {
        for (slot, confidence) in classify_slots(person) {
            let entry = &mut best[slot];
            *entry = Some(entry.map_or(confidence, |c| c.max(confidence)));
        }
    }

    catalog()
        .zip(best)
        .filter_map(|(label, confidence)| confidence.map(|c| GestureLabel::new(label, c)))
        .collect()
}

/// Classify a single person.
pub fn classify_person(person: &PersonLandmarks) -> Vec<GestureLabel> {
    let labels: Vec<&'static str> = catalog().collect();
    classify_slots(person)
        .into_iter()
        .map(|(slot, confidence)| GestureLabel::new(labels[slot], confidence))
        .collect()
}

/// Catalog slot and confidence for every rule that fired.
fn classify_slots(person: &PersonLandmarks) -> Vec<(usize, f64)> {
    let mut fired = Vec::new();

    if let Some(face) = face::FaceGeometry::from_person(person) {
        for (slot, confidence) in face.evaluate().into_iter().enumerate() {
            if let Some(c) = confidence {
                fired.push((slot, c));
            }
        }
    }

    if let Some(pose) = body::PoseGeometry::from_person(person) {
        for (i, score) in pose.evaluate().into_iter().enumerate() {
            if score >= BODY_REPORT_FLOOR {
                fired.push((FACE_LABELS.len() + i, score.min(1.0)));
            }
        }
    }

    fired
}

/// Confidence for `value > threshold`: 0.5 at the threshold, 1.0 once the
/// value exceeds it by a full threshold width.
pub(crate) fn above(value: f64, threshold: f64) -> Option<f64> {
    if value > threshold {
        Some(margin_confidence(value - threshold, threshold))
    } else {
        None
    }
}

/// Confidence for `value < threshold`, mirrored from [`above`].
pub(crate) fn below(value: f64, threshold: f64) -> Option<f64> {
    if value < threshold {
        Some(margin_confidence(threshold - value, threshold))
    } else {
        None
    }
}

/// Composite rule: every part must fire; confidence is the weakest part.
pub(crate) fn all_of(parts: &[Option<f64>]) -> Option<f64> {
    parts
        .iter()
        .try_fold(1.0_f64, |acc, part| part.map(|c| acc.min(c)))
}

fn margin_confidence(margin: f64, width: f64) -> f64 {
    let width = width.abs().max(f64::EPSILON);
    (0.5 + 0.5 * (margin / width)).clamp(0.5, 1.0)
}
