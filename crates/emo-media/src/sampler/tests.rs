//! Scenario and property tests for the sampling pass.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use emo_models::{AnchorKind, MomentKind, PersonLandmarks, Point3, WarningKind};
use image::DynamicImage;
use proptest::prelude::*;

use super::*;
use crate::source::StreamInfo;

/// Generates tiny frames on demand and counts how many were decoded.
struct SyntheticSource {
    count: u64,
    fps: f64,
    cursor: u64,
    decoded: Arc<AtomicU64>,
    fail_at: Option<u64>,
}

impl SyntheticSource {
    fn new(count: u64, fps: f64) -> Self {
        Self {
            count,
            fps,
            cursor: 0,
            decoded: Arc::new(AtomicU64::new(0)),
            fail_at: None,
        }
    }

    fn failing_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }
}

impl FrameSource for SyntheticSource {
    fn info(&self) -> StreamInfo {
        StreamInfo::new(self.count, self.fps)
    }

    fn next_frame(&mut self) -> MediaResult<Option<Frame>> {
        if self.cursor >= self.count {
            return Ok(None);
        }
        let index = self.cursor;
        self.cursor += 1;
        if self.fail_at == Some(index) {
            return Err(MediaError::stream_read(format!("truncated at frame {index}")));
        }
        self.decoded.fetch_add(1, Ordering::SeqCst);
        Ok(Some(Frame::new(
            index,
            index as f64 / self.fps,
            DynamicImage::new_rgb8(4, 4),
        )))
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        if self.cursor >= self.count {
            return Ok(false);
        }
        self.cursor += 1;
        Ok(true)
    }
}

/// Landmarks scripted per frame index.
struct ScriptedExtractor<F>(F);

impl<F> LandmarkExtractor for ScriptedExtractor<F>
where
    F: FnMut(u64) -> MediaResult<Option<Vec<PersonLandmarks>>> + Send,
{
    fn extract(&mut self, frame: &Frame) -> MediaResult<Option<Vec<PersonLandmarks>>> {
        (self.0)(frame.index)
    }
}

/// One person, four points, shifted horizontally by `offset`.
fn face(offset: f64) -> Option<Vec<PersonLandmarks>> {
    Some(vec![PersonLandmarks::new(
        0,
        (0..4)
            .map(|i| Point3::new(0.1 * i as f64 + offset, 0.5, 0.0))
            .collect(),
    )])
}

fn sampler(config: SamplerConfig) -> FrameSignificanceSampler {
    FrameSignificanceSampler::new(config).unwrap()
}

fn kinds(outcome: &SamplingOutcome) -> Vec<MomentKind> {
    outcome.moments.iter().map(|m| m.moment.kind).collect()
}

#[test]
fn test_step_change_at_300_gives_anchors_plus_spike() {
    let mut extractor = ScriptedExtractor(|i: u64| Ok(face(if i < 300 { 0.0 } else { 0.05 })));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(600, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.frame_indices(), vec![0, 299, 300, 599]);
    assert_eq!(
        kinds(&outcome),
        vec![
            MomentKind::Anchor(AnchorKind::Start),
            MomentKind::Anchor(AnchorKind::Middle),
            MomentKind::Significant,
            MomentKind::Anchor(AnchorKind::End),
        ]
    );
    assert!((outcome.moments[2].moment.timestamp - 10.0).abs() < 1e-9);
    assert!(!outcome.budget_exceeded);
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.stats.frames_examined, 600);
}

#[test]
fn test_single_spike_among_small_changes() {
    // 0.0025 per frame scores 0.05; frame 300 jumps 0.045 and scores 0.9
    let offset = |i: u64| 0.0025 * i as f64 + if i >= 300 { 0.0425 } else { 0.0 };
    let mut extractor = ScriptedExtractor(move |i: u64| Ok(face(offset(i))));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(600, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.frame_indices(), vec![0, 299, 300, 599]);
    let scores: Vec<f64> = outcome
        .moments
        .iter()
        .map(|m| m.moment.significance.value())
        .collect();
    assert_eq!(scores[0], 0.0);
    assert!((scores[1] - 0.05).abs() < 1e-6);
    assert!((scores[2] - 0.9).abs() < 1e-6);
    assert!((scores[3] - 0.05).abs() < 1e-6);
    assert_eq!(outcome.moments[2].moment.kind, MomentKind::Significant);
    assert!(!outcome.budget_exceeded);
}

#[test]
fn test_occluded_subject_keeps_own_baseline() {
    // Person 0 never moves; person 1 is hidden at frame 5 and returns moved
    let mut extractor = ScriptedExtractor(|i: u64| {
        let still = PersonLandmarks::new(
            0,
            (0..4).map(|k| Point3::new(0.1 * k as f64, 0.2, 0.0)).collect(),
        );
        let shift = if i >= 6 { 0.1 } else { 0.0 };
        let other = PersonLandmarks::new(
            1,
            (0..4).map(|k| Point3::new(0.1 * k as f64 + shift, 0.7, 0.0)).collect(),
        );
        Ok(Some(if i == 5 { vec![still] } else { vec![still, other] }))
    });
    let config = SamplerConfig {
        max_moments: 20,
        ..Default::default()
    };
    let outcome = sampler(config)
        .run(SyntheticSource::new(20, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.frame_indices(), vec![0, 6, 9, 19]);
    let returned = &outcome.moments[1].moment;
    assert_eq!(returned.kind, MomentKind::Significant);
    assert_eq!(returned.significance, SignificanceScore::MAX);
}

#[test]
fn test_zero_fps_rejected() {
    let images = vec![DynamicImage::new_rgb8(4, 4); 9];
    let source = crate::source::MemoryFrameSource::from_images(images, 0.0);
    let mut extractor = ScriptedExtractor(|_: u64| Ok(face(0.0)));

    let err = sampler(SamplerConfig::default())
        .run(source, &mut extractor, &CancelFlag::new())
        .unwrap_err();
    assert!(matches!(err, MediaError::InvalidConfig(_)));
}

#[test]
fn test_start_without_face_before_middle_is_dropped() {
    // Frames 0..4 have no face; the middle anchor (4) is reached first
    let mut extractor = ScriptedExtractor(|i: u64| Ok(if i < 4 { None } else { face(0.0) }));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(9, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.frame_indices(), vec![4, 8]);
    assert_eq!(
        kinds(&outcome),
        vec![
            MomentKind::Anchor(AnchorKind::Middle),
            MomentKind::Anchor(AnchorKind::End),
        ]
    );
    assert_eq!(outcome.warnings.len(), 4);
}

#[test]
fn test_identical_snapshots_only_anchors() {
    let mut extractor = ScriptedExtractor(|_: u64| Ok(face(0.0)));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(90, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.frame_indices(), vec![0, 44, 89]);
    assert!(outcome.moments.iter().all(|m| m.moment.is_anchor()));
    // Four points are not enough for a stress estimate
    assert!(outcome.moments.iter().all(|m| m.moment.stress.is_none()));
}

#[test]
fn test_every_frame_significant_fills_budget() {
    let mut extractor = ScriptedExtractor(|i: u64| Ok(face(0.05 * i as f64)));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(600, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.moment_count(), 10);
    assert!(outcome.budget_exceeded);
    assert_eq!(outcome.frame_indices(), vec![0, 1, 2, 3, 4, 5, 6, 7, 299, 599]);
    // Frames 0..=8 scanned, then only the remaining anchors
    assert_eq!(outcome.stats.frames_examined, 11);
}

#[test]
fn test_every_frame_significant_short_input() {
    let mut extractor = ScriptedExtractor(|i: u64| Ok(face(0.05 * i as f64)));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(5, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.moment_count(), 5);
    assert!(!outcome.budget_exceeded);
}

#[test]
fn test_half_frames_without_face() {
    let mut extractor = ScriptedExtractor(|i: u64| Ok(if i % 2 == 0 { face(0.0) } else { None }));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(600, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.stats.frames_skipped, 300);
    assert_eq!(outcome.warnings.len() as u64, outcome.stats.frames_skipped);
    assert!(outcome.warnings.iter().all(|w| w.kind == WarningKind::NoFace));

    // Middle (299) defers to 300; end (599) falls back to 598
    assert_eq!(outcome.frame_indices(), vec![0, 300, 598]);
    assert_eq!(
        kinds(&outcome),
        vec![
            MomentKind::Anchor(AnchorKind::Start),
            MomentKind::Anchor(AnchorKind::Middle),
            MomentKind::Anchor(AnchorKind::End),
        ]
    );
}

#[test]
fn test_no_face_keeps_baseline() {
    // Frame 2 has no face; frame 3 is compared against frame 1, not frame 2.
    let mut extractor = ScriptedExtractor(|i: u64| {
        Ok(match i {
            2 => None,
            3 => face(0.1),
            _ => face(0.0),
        })
    });
    let config = SamplerConfig {
        max_moments: 20,
        ..Default::default()
    };
    let outcome = sampler(config)
        .run(SyntheticSource::new(10, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    let spike = outcome
        .moments
        .iter()
        .find(|m| m.moment.frame_index == 3)
        .unwrap();
    assert_eq!(spike.moment.significance, SignificanceScore::MAX);
    assert_eq!(spike.moment.kind, MomentKind::Significant);
}

#[test]
fn test_extraction_failure_is_absorbed() {
    let mut extractor = ScriptedExtractor(|i: u64| {
        if i == 5 {
            Err(MediaError::extraction_failed(i, "model returned garbage"))
        } else {
            Ok(face(0.0))
        }
    });
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(30, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].kind, WarningKind::ExtractionFailed);
    assert_eq!(outcome.warnings[0].frame_index, 5);
    assert_eq!(outcome.moment_count(), 3);
}

#[test]
fn test_stream_failure_aborts() {
    let mut extractor = ScriptedExtractor(|_: u64| Ok(face(0.0)));
    let err = sampler(SamplerConfig::default())
        .run(
            SyntheticSource::new(100, 30.0).failing_at(10),
            &mut extractor,
            &CancelFlag::new(),
        )
        .unwrap_err();
    assert!(matches!(err, MediaError::StreamRead { .. }));
}

#[test]
fn test_cancelled_before_start() {
    let cancel = CancelFlag::new();
    cancel.cancel();
    let mut extractor = ScriptedExtractor(|_: u64| Ok(face(0.0)));
    let err = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(100, 30.0), &mut extractor, &cancel)
        .unwrap_err();
    assert!(matches!(err, MediaError::Cancelled));
}

#[test]
fn test_cancelled_mid_scan() {
    let cancel = CancelFlag::new();
    let trigger = cancel.clone();
    let mut extractor = ScriptedExtractor(move |i: u64| {
        if i == 20 {
            trigger.cancel();
        }
        Ok(face(0.0))
    });
    let source = SyntheticSource::new(100, 30.0);
    let decoded = source.decoded.clone();

    let err = sampler(SamplerConfig::default())
        .run(source, &mut extractor, &cancel)
        .unwrap_err();
    assert!(matches!(err, MediaError::Cancelled));
    assert_eq!(decoded.load(Ordering::SeqCst), 21);
}

#[test]
fn test_zero_frames() {
    let mut extractor = ScriptedExtractor(|_: u64| Ok(face(0.0)));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(0, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();
    assert_eq!(outcome.moment_count(), 0);
    assert_eq!(outcome.stats.frames_examined, 0);
}

#[test]
fn test_fewer_frames_than_anchors() {
    let mut extractor = ScriptedExtractor(|_: u64| Ok(face(0.0)));
    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(2, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();
    assert_eq!(
        kinds(&outcome),
        vec![
            MomentKind::Anchor(AnchorKind::Start),
            MomentKind::Anchor(AnchorKind::End)
        ]
    );
}

#[test]
fn test_long_input_skips_without_decoding() {
    // 10 minutes at 30 fps: stride of 60 plus the two off-stride anchors
    let source = SyntheticSource::new(18_000, 30.0);
    let decoded = source.decoded.clone();
    let mut extractor = ScriptedExtractor(|_: u64| Ok(face(0.0)));

    let outcome = sampler(SamplerConfig::default())
        .run(source, &mut extractor, &CancelFlag::new())
        .unwrap();

    assert_eq!(outcome.stats.stride, 60);
    assert_eq!(outcome.stats.frames_examined, 302);
    assert_eq!(decoded.load(Ordering::SeqCst), 302);
    assert_eq!(outcome.frame_indices(), vec![0, 8999, 17_999]);
}

#[test]
fn test_time_budget_examines_anchors_only() {
    let config = SamplerConfig {
        max_processing_time: Some(Duration::ZERO),
        ..Default::default()
    };
    let mut extractor = ScriptedExtractor(|i: u64| Ok(face(0.05 * i as f64)));
    let outcome = sampler(config)
        .run(SyntheticSource::new(600, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    assert!(outcome.budget_exceeded);
    assert_eq!(outcome.stats.frames_examined, 3);
    assert_eq!(outcome.frame_indices(), vec![0, 299, 599]);
}

#[test]
fn test_payloads_and_labels_attached() {
    let mut points = vec![Point3::new(0.5, 0.5, 0.0); 468];
    // Wide mouth
    points[61] = Point3::new(0.40, 0.60, 0.0);
    points[291] = Point3::new(0.60, 0.60, 0.0);
    let person = PersonLandmarks::new(0, points);
    let mut extractor = ScriptedExtractor(move |_: u64| Ok(Some(vec![person.clone()])));

    let outcome = sampler(SamplerConfig::default())
        .run(SyntheticSource::new(3, 30.0), &mut extractor, &CancelFlag::new())
        .unwrap();

    for selected in &outcome.moments {
        let payload = selected.payload.as_ref().unwrap();
        assert_eq!((payload.width, payload.height), (4, 4));
        assert!(selected.moment.labels.iter().any(|l| l.label == "smile"));
        let stress = selected.moment.stress.as_ref().unwrap();
        assert!(stress.indicators.iter().any(|i| i == "frown_lines"));
    }
}

#[test]
fn test_invalid_config_rejected() {
    let err = FrameSignificanceSampler::new(SamplerConfig {
        threshold: -0.1,
        ..Default::default()
    })
    .unwrap_err();
    assert!(matches!(err, MediaError::InvalidConfig(_)));
}

fn run_scripted(
    offsets: &[f64],
    missing: &[bool],
    config: &SamplerConfig,
) -> SamplingOutcome {
    let count = offsets.len() as u64;
    let offsets = offsets.to_vec();
    let missing = missing.to_vec();
    let mut extractor = ScriptedExtractor(move |i: u64| {
        let i = i as usize;
        Ok(if missing[i] { None } else { face(offsets[i]) })
    });
    sampler(config.clone())
        .run(
            SyntheticSource::new(count, 30.0),
            &mut extractor,
            &CancelFlag::new(),
        )
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_moment_invariants(
        frames in prop::collection::vec((0.0f64..0.2, any::<bool>()), 0..150),
        max_moments in 1usize..12,
        threshold in 0.0f64..=1.0,
    ) {
        let offsets: Vec<f64> = frames.iter().map(|f| f.0).collect();
        let missing: Vec<bool> = frames.iter().map(|f| f.1).collect();
        let config = SamplerConfig { max_moments, threshold, ..Default::default() };

        let outcome = run_scripted(&offsets, &missing, &config);

        prop_assert!(outcome.moment_count() <= max_moments);
        let indices = outcome.frame_indices();
        prop_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        let stamps: Vec<f64> = outcome.moments.iter().map(|m| m.moment.timestamp).collect();
        prop_assert!(stamps.windows(2).all(|w| w[0] < w[1]));
        prop_assert_eq!(outcome.warnings.len() as u64, outcome.stats.frames_skipped);

        for selected in &outcome.moments {
            let moment = &selected.moment;
            prop_assert!(moment.is_anchor() || moment.significance.meets(threshold));
            prop_assert!(!missing[moment.frame_index as usize]);
        }

        let again = run_scripted(&offsets, &missing, &config);
        prop_assert_eq!(outcome.into_moments(), again.into_moments());
    }

    #[test]
    fn prop_anchors_present_when_faces_everywhere(
        offsets in prop::collection::vec(0.0f64..0.2, 3..150),
        max_moments in 3usize..12,
    ) {
        let missing = vec![false; offsets.len()];
        let config = SamplerConfig { max_moments, ..Default::default() };
        let outcome = run_scripted(&offsets, &missing, &config);

        for anchor in [AnchorKind::Start, AnchorKind::Middle, AnchorKind::End] {
            prop_assert!(outcome
                .moments
                .iter()
                .any(|m| m.moment.kind == MomentKind::Anchor(anchor)));
        }
    }
}
