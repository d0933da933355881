//! Landmark distance between an examined snapshot and each person's baseline.

use std::collections::BTreeMap;

use emo_models::{LandmarkSnapshot, PersonLandmarks, Point3, SignificanceScore};

use super::config::DistanceMetric;
use crate::landmarks::KEY_FACE_LANDMARKS;

/// Mean 3D distance between two persons' face points.
///
/// With [`DistanceMetric::KeyLandmarks`] only key indices present in both are
/// compared; if none are, every common point is used instead. `None` when the
/// two share no points at all.
pub fn person_distance(
    previous: &PersonLandmarks,
    current: &PersonLandmarks,
    metric: DistanceMetric,
) -> Option<f64> {
    if metric == DistanceMetric::KeyLandmarks {
        let key = mean_distance(
            KEY_FACE_LANDMARKS
                .iter()
                .filter_map(|&i| Some((previous.point(i)?, current.point(i)?))),
        );
        if key.is_some() {
            return key;
        }
    }
    mean_distance(previous.keypoints.iter().zip(current.keypoints.iter()))
}

/// Last examined landmarks of each person, keyed by `person_index`.
///
/// A person missing from a frame keeps their entry, so an occluded subject is
/// compared against where they were last seen, not against nothing.
#[derive(Debug, Clone, Default)]
pub struct PersonBaselines {
    persons: BTreeMap<u32, PersonLandmarks>,
}

impl PersonBaselines {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.persons.is_empty()
    }

    /// Largest distance of any person in `current` from their own baseline.
    ///
    /// Persons seen for the first time are ignored. Returns 0.0 when nobody
    /// can be compared.
    pub fn distance(&self, current: &LandmarkSnapshot, metric: DistanceMetric) -> f64 {
        current
            .persons
            .iter()
            .filter_map(|person| {
                let before = self.persons.get(&person.person_index)?;
                person_distance(before, person, metric)
            })
            .fold(0.0, f64::max)
    }

    /// Replace the baseline of every person present in `snapshot`.
    pub fn update(&mut self, snapshot: &LandmarkSnapshot) {
        for person in &snapshot.persons {
            self.persons.insert(person.person_index, person.clone());
        }
    }
}

/// Score a snapshot against the per-person baselines. No baseline scores zero.
pub fn score(
    baselines: &PersonBaselines,
    current: &LandmarkSnapshot,
    metric: DistanceMetric,
    reference_scale: f64,
) -> SignificanceScore {
    if baselines.is_empty() {
        return SignificanceScore::ZERO;
    }
    SignificanceScore::from_distance(baselines.distance(current, metric), reference_scale)
}

fn mean_distance<'a>(
    pairs: impl Iterator<Item = (&'a Point3, &'a Point3)>,
) -> Option<f64> {
    let (sum, count) = pairs.fold((0.0, 0usize), |(sum, count), (a, b)| {
        (sum + a.distance(b), count + 1)
    });
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}
