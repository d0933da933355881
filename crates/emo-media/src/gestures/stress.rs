//! Stress estimate from face-mesh and pose geometry.
//!
//! Four regions are scored independently: forehead tension, lip tension,
//! body fidgeting and eye strain. Each region's score is the mean weight of
//! the cues that fired in it, and the regions are combined with the weights in
//! [`StressComponents`]. Like the gesture rules this is a pure function of one
//! snapshot; the trend across a session is computed from the per-moment
//! percentages by [`stress_trend`].

use emo_models::{
    LandmarkSnapshot, PersonLandmarks, Point3, StressAssessment, StressComponents, StressLevel,
    StressTrend,
};

use crate::landmarks::{face, pose, FACE_MESH_POINTS, POSE_POINTS};

/// Recommendations kept per assessment.
pub const MAX_RECOMMENDATIONS: usize = 4;

/// Moments averaged on each side of a trend comparison.
pub const TREND_WINDOW: usize = 5;

/// Percentage points between windows before a trend is reported.
pub const TREND_MARGIN: f64 = 10.0;

/// Cues that fired in one region, with their weights.
#[derive(Default)]
struct Region {
    weights: Vec<f64>,
    indicators: Vec<&'static str>,
}

impl Region {
    fn cue(&mut self, fired: bool, weight: f64, indicator: &'static str) {
        if fired {
            self.weights.push(weight);
            self.indicators.push(indicator);
        }
    }

    fn score(&self) -> f64 {
        if self.weights.is_empty() {
            0.0
        } else {
            self.weights.iter().sum::<f64>() / self.weights.len() as f64
        }
    }
}

/// Assess every person in the snapshot and keep the most stressed one.
///
/// `None` when no person has the full face mesh or the body pose.
pub fn assess(snapshot: &LandmarkSnapshot) -> Option<StressAssessment> {
    snapshot
        .persons
        .iter()
        .filter_map(assess_person)
        .fold(None, |best: Option<StressAssessment>, current| match best {
            Some(best) if best.percentage >= current.percentage => Some(best),
            _ => Some(current),
        })
}

/// Assess a single person.
pub fn assess_person(person: &PersonLandmarks) -> Option<StressAssessment> {
    let face_points = (person.keypoints.len() >= FACE_MESH_POINTS).then_some(&person.keypoints[..]);
    let pose_points = (person.pose.len() >= POSE_POINTS).then_some(&person.pose[..]);
    if face_points.is_none() && pose_points.is_none() {
        return None;
    }

    let forehead = face_points.map(forehead_tension).unwrap_or_default();
    let lip = face_points.map(lip_tension).unwrap_or_default();
    let eye = face_points.map(eye_strain).unwrap_or_default();
    let fidget = pose_points.map(fidgeting).unwrap_or_default();

    let components = StressComponents {
        forehead: forehead.score(),
        lip: lip.score(),
        fidget: fidget.score(),
        eye: eye.score(),
    };
    let indicators: Vec<String> = [forehead, lip, fidget, eye]
        .iter()
        .flat_map(|region| region.indicators.iter().map(|s| s.to_string()))
        .collect();
    let percentage = components.percentage();

    Some(StressAssessment {
        percentage,
        level: StressLevel::from_percentage(percentage),
        components,
        recommendations: recommendations(percentage, &indicators),
        indicators,
    })
}

fn forehead_tension(points: &[Point3]) -> Region {
    let p = |i: usize| &points[i];
    let mut region = Region::default();

    let compression = (p(face::FOREHEAD).y - p(face::FOREHEAD_MID).y).abs();
    region.cue(compression < 0.02, 0.8, "horizontal_forehead_lines");

    let inner_brows = p(face::INNER_BROW_LEFT).distance_2d(p(face::INNER_BROW_RIGHT));
    region.cue(inner_brows < 0.045, 0.9, "frown_lines");

    let brow_y = (p(face::INNER_BROW_LEFT).y + p(face::INNER_BROW_RIGHT).y) / 2.0;
    let eye_y = (p(face::LEFT_EYE_UPPER).y + p(face::RIGHT_EYE_UPPER).y) / 2.0;
    if brow_y < eye_y - 0.035 {
        region.cue(true, 0.7, "raised_eyebrows");
    } else {
        region.cue(brow_y > eye_y - 0.015, 0.6, "lowered_eyebrows");
    }

    let width = (p(face::FOREHEAD_LEFT).x - p(face::FOREHEAD_RIGHT).x).abs();
    region.cue(width < 0.12, 0.5, "forehead_compression");

    region
}

fn lip_tension(points: &[Point3]) -> Region {
    let p = |i: usize| &points[i];
    let mut region = Region::default();

    let separation = (p(face::LIP_UPPER_INNER).y - p(face::LIP_LOWER_INNER).y).abs();
    region.cue(separation < 0.008, 0.8, "lip_compression");

    let left = p(face::MOUTH_LEFT);
    let right = p(face::MOUTH_RIGHT);
    region.cue((left.x - right.x).abs() < 0.045, 0.7, "lip_pursing");

    let center_x = p(face::LIP_UPPER_INNER).x;
    let asymmetry = ((left.x - center_x).abs() - (right.x - center_x).abs()).abs();
    region.cue(asymmetry > 0.015, 0.6, "mouth_asymmetry");

    let jaw = (p(face::JAW_LEFT).x - p(face::JAW_RIGHT).x).abs();
    region.cue(jaw < 0.08, 0.5, "jaw_tension");

    region
}

fn eye_strain(points: &[Point3]) -> Region {
    let p = |i: usize| &points[i];
    let mut region = Region::default();

    let left = (p(face::LEFT_EYE_UPPER).y - p(face::LEFT_EYE_LOWER).y).abs();
    let right = (p(face::RIGHT_EYE_UPPER).y - p(face::RIGHT_EYE_LOWER).y).abs();
    region.cue((left + right) / 2.0 < 0.012, 0.8, "squinting");
    region.cue((left - right).abs() > 0.008, 0.6, "eye_asymmetry");

    let lid_y = (p(face::LEFT_EYE_OUTER).y + p(face::RIGHT_EYE_INNER).y) / 2.0;
    region.cue(lid_y < p(face::FOREHEAD).y - 0.08, 0.5, "eyelid_tension");

    region
}

fn fidgeting(points: &[Point3]) -> Region {
    let p = |i: usize| &points[i];
    let mut region = Region::default();

    let left = p(pose::LEFT_SHOULDER);
    let right = p(pose::RIGHT_SHOULDER);
    region.cue((left.y - right.y).abs() > 0.03, 0.6, "shoulder_tension");

    // Head sunk toward the shoulder line
    let shoulder_y = (left.y + right.y) / 2.0;
    region.cue(shoulder_y - p(pose::NOSE).y < 0.15, 0.5, "neck_strain");

    region
}

fn recommendations(percentage: u8, indicators: &[String]) -> Vec<String> {
    let has = |names: &[&str]| indicators.iter().any(|i| names.contains(&i.as_str()));
    let mut out: Vec<&str> = Vec::new();

    if percentage >= 70 {
        out.push("Take deep breaths - try 4-7-8 breathing technique");
        out.push("Consider a 5-minute break from current activity");
    }
    if has(&["frown_lines", "forehead_compression"]) {
        out.push("Consciously relax your forehead muscles");
        out.push("Try gentle forehead massage");
    }
    if has(&["lip_compression", "jaw_tension"]) {
        out.push("Relax your jaw and lips");
        out.push("Do gentle jaw stretches");
    }
    if has(&["shoulder_tension", "neck_strain"]) {
        out.push("Try progressive muscle relaxation");
        out.push("Take a short walk if possible");
    }
    if has(&["squinting", "eye_asymmetry"]) {
        out.push("Rest your eyes - look at something distant");
        out.push("Adjust lighting or screen brightness");
    }
    if percentage >= 50 {
        out.push("Consider stress management techniques");
        out.push("Stay hydrated and maintain good posture");
    }

    out.into_iter()
        .take(MAX_RECOMMENDATIONS)
        .map(str::to_string)
        .collect()
}

/// Compare the latest stress percentages with the ones before them.
///
/// The newest [`TREND_WINDOW`] values are averaged against up to
/// [`TREND_WINDOW`] values preceding them; with fewer than twice the window
/// the sequence is split in half instead.
pub fn stress_trend(percentages: &[u8]) -> StressTrend {
    let n = percentages.len();
    if n < 2 {
        return StressTrend::InsufficientData;
    }

    let recent_len = TREND_WINDOW.min(n / 2);
    let split = n - recent_len;
    let older_start = split.saturating_sub(TREND_WINDOW);

    let mean = |values: &[u8]| values.iter().map(|&v| f64::from(v)).sum::<f64>() / values.len() as f64;
    let recent = mean(&percentages[split..]);
    let older = mean(&percentages[older_start..split]);

    if recent > older + TREND_MARGIN {
        StressTrend::Increasing
    } else if recent < older - TREND_MARGIN {
        StressTrend::Decreasing
    } else {
        StressTrend::Stable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A relaxed face on which no stress cue fires.
    fn calm_face() -> Vec<Point3> {
        let mut points = vec![Point3::new(0.5, 0.5, 0.0); FACE_MESH_POINTS];
        points[face::FOREHEAD] = Point3::new(0.5, 0.20, 0.0);
        points[face::FOREHEAD_MID] = Point3::new(0.5, 0.26, 0.0);
        points[face::FOREHEAD_LEFT] = Point3::new(0.41, 0.22, 0.0);
        points[face::FOREHEAD_RIGHT] = Point3::new(0.59, 0.22, 0.0);
        points[face::INNER_BROW_LEFT] = Point3::new(0.47, 0.375, 0.0);
        points[face::INNER_BROW_RIGHT] = Point3::new(0.53, 0.375, 0.0);
        points[face::LEFT_EYE_UPPER] = Point3::new(0.45, 0.40, 0.0);
        points[face::LEFT_EYE_LOWER] = Point3::new(0.45, 0.418, 0.0);
        points[face::RIGHT_EYE_UPPER] = Point3::new(0.55, 0.40, 0.0);
        points[face::RIGHT_EYE_LOWER] = Point3::new(0.55, 0.418, 0.0);
        points[face::LEFT_EYE_OUTER] = Point3::new(0.42, 0.41, 0.0);
        points[face::RIGHT_EYE_INNER] = Point3::new(0.53, 0.41, 0.0);
        points[face::LIP_UPPER_INNER] = Point3::new(0.5, 0.60, 0.0);
        points[face::LIP_LOWER_INNER] = Point3::new(0.5, 0.612, 0.0);
        points[face::MOUTH_LEFT] = Point3::new(0.47, 0.60, 0.0);
        points[face::MOUTH_RIGHT] = Point3::new(0.53, 0.60, 0.0);
        points[face::JAW_LEFT] = Point3::new(0.42, 0.70, 0.0);
        points[face::JAW_RIGHT] = Point3::new(0.58, 0.70, 0.0);
        points
    }

    /// Frowning, lips pressed, squinting.
    fn tense_face() -> Vec<Point3> {
        let mut points = calm_face();
        points[face::INNER_BROW_LEFT].x = 0.49;
        points[face::INNER_BROW_RIGHT].x = 0.51;
        points[face::LIP_LOWER_INNER].y = 0.604;
        points[face::LEFT_EYE_LOWER].y = 0.408;
        points[face::RIGHT_EYE_LOWER].y = 0.408;
        points
    }

    fn upright_pose() -> Vec<Point3> {
        let mut points = vec![Point3::new(0.5, 0.5, 0.0); POSE_POINTS];
        points[pose::NOSE] = Point3::new(0.5, 0.25, 0.0);
        points[pose::LEFT_SHOULDER] = Point3::new(0.4, 0.5, 0.0);
        points[pose::RIGHT_SHOULDER] = Point3::new(0.6, 0.5, 0.0);
        points
    }

    fn snapshot(persons: Vec<PersonLandmarks>) -> LandmarkSnapshot {
        LandmarkSnapshot::new(0, 0.0, persons)
    }

    #[test]
    fn test_calm_face_scores_zero() {
        let assessment = assess_person(&PersonLandmarks::new(0, calm_face())).unwrap();
        assert_eq!(assessment.percentage, 0);
        assert_eq!(assessment.level, StressLevel::VeryLow);
        assert!(assessment.indicators.is_empty());
        assert!(assessment.recommendations.is_empty());
    }

    #[test]
    fn test_tense_face_indicators() {
        let assessment = assess_person(&PersonLandmarks::new(0, tense_face())).unwrap();
        assert_eq!(
            assessment.indicators,
            vec!["frown_lines", "lip_compression", "squinting"]
        );
        // forehead 0.9, lip 0.8, eye 0.8 -> 0.315 + 0.2 + 0.12
        assert_eq!(assessment.percentage, 63);
        assert_eq!(assessment.level, StressLevel::High);
        assert_eq!(
            assessment.recommendations,
            vec![
                "Consciously relax your forehead muscles",
                "Try gentle forehead massage",
                "Relax your jaw and lips",
                "Do gentle jaw stretches",
            ]
        );
    }

    #[test]
    fn test_pose_only_person_scores_fidgeting() {
        let mut pose_points = upright_pose();
        pose_points[pose::LEFT_SHOULDER].y = 0.45;
        let person = PersonLandmarks::new(0, vec![]).with_pose(pose_points);

        let assessment = assess_person(&person).unwrap();
        assert_eq!(assessment.indicators, vec!["shoulder_tension"]);
        assert_eq!(assessment.components.fidget, 0.6);
        assert_eq!(assessment.components.forehead, 0.0);
        assert_eq!(assessment.percentage, 15);
    }

    #[test]
    fn test_sparse_person_not_assessed() {
        let person = PersonLandmarks::new(0, vec![Point3::default(); 10]);
        assert!(assess_person(&person).is_none());
        assert!(assess(&snapshot(vec![person])).is_none());
    }

    #[test]
    fn test_most_stressed_person_wins() {
        let assessment = assess(&snapshot(vec![
            PersonLandmarks::new(0, calm_face()),
            PersonLandmarks::new(1, tense_face()),
        ]))
        .unwrap();
        assert_eq!(assessment.percentage, 63);
    }

    #[test]
    fn test_trend() {
        assert_eq!(stress_trend(&[]), StressTrend::InsufficientData);
        assert_eq!(stress_trend(&[40]), StressTrend::InsufficientData);
        assert_eq!(stress_trend(&[10, 40]), StressTrend::Increasing);
        assert_eq!(stress_trend(&[60, 55, 20, 25]), StressTrend::Decreasing);
        assert_eq!(stress_trend(&[30, 35, 32, 38]), StressTrend::Stable);

        // Only the last two windows of five count
        let long = [90, 90, 90, 10, 10, 10, 10, 10, 30, 30, 30, 30, 30];
        assert_eq!(stress_trend(&long), StressTrend::Increasing);
    }
}
