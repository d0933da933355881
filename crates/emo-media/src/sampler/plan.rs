//! Scan plan: which frames to examine and where the anchors sit.

use emo_models::AnchorKind;

use super::config::SamplerConfig;
use crate::source::StreamInfo;

/// An anchor position reserved in the moment budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorSlot {
    pub kind: AnchorKind,
    pub position: u64,
}

/// Stride and anchors for one input, fixed before scanning starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPlan {
    pub frame_count: u64,
    pub stride: u64,
    /// Reserved anchors, in priority order (start, end, middle)
    pub anchors: Vec<AnchorSlot>,
}

impl ScanPlan {
    pub fn new(info: &StreamInfo, config: &SamplerConfig) -> Self {
        let frame_count = info.frame_count;
        Self {
            frame_count,
            stride: compute_stride(info, config),
            anchors: reserve_anchors(frame_count, config.max_moments),
        }
    }

    /// Anchor reserved at this position, if any.
    pub fn anchor_at(&self, position: u64) -> Option<AnchorKind> {
        self.anchors
            .iter()
            .find(|slot| slot.position == position)
            .map(|slot| slot.kind)
    }

    /// Whether any reserved anchor sits at or after `position`.
    pub fn has_anchor_from(&self, position: u64) -> bool {
        self.anchors.iter().any(|slot| slot.position >= position)
    }

    pub fn on_stride(&self, position: u64) -> bool {
        position % self.stride == 0
    }

    /// Moments available for significant (non-anchor) frames.
    pub fn spike_budget(&self, max_moments: usize) -> usize {
        max_moments.saturating_sub(self.anchors.len())
    }
}

/// Dense stride for short inputs, time-based stride for long ones, raised so
/// examined frames stay within `max_examined_frames`.
pub fn compute_stride(info: &StreamInfo, config: &SamplerConfig) -> u64 {
    let limit_secs = f64::from(config.max_duration_minutes) * 60.0;
    let base = if info.fps <= 0.0 || info.duration_secs() <= limit_secs {
        config.dense_stride
    } else {
        (info.fps * config.long_sample_interval_secs).round() as u64
    };

    let bound = info.frame_count.div_ceil(config.max_examined_frames.max(1));
    base.max(bound).max(1)
}

/// Start, middle and end positions, deduplicated and truncated to `max_moments`.
///
/// When positions collide the higher-priority kind keeps the slot.
pub fn reserve_anchors(frame_count: u64, max_moments: usize) -> Vec<AnchorSlot> {
    if frame_count == 0 {
        return Vec::new();
    }
    let last = frame_count - 1;
    let candidates = [
        AnchorSlot {
            kind: AnchorKind::Start,
            position: 0,
        },
        AnchorSlot {
            kind: AnchorKind::End,
            position: last,
        },
        AnchorSlot {
            kind: AnchorKind::Middle,
            position: last / 2,
        },
    ];

    let mut anchors: Vec<AnchorSlot> = Vec::with_capacity(3);
    for slot in candidates {
        if !anchors.iter().any(|a| a.position == slot.position) {
            anchors.push(slot);
        }
    }
    anchors.truncate(max_moments);
    anchors
}
