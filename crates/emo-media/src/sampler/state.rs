//! Moment selection state machine.
//!
//! ```text
//!            anchor frame without face
//!  Scanning ───────────────────────────▶ AnchorPending
//!     │  ▲                                   │
//!     │  └──── next frame with a face ───────┘ (budget left)
//!     │
//!     │ qualifying frame refused / time budget elapsed
//!     ▼
//!  BudgetExhausted ◀──── next frame with a face (no budget left)
//! ```
//!
//! Anchors never consume the significant-moment budget; their slots are
//! reserved up front by the scan plan. At most one anchor is pending: reaching
//! a later anchor position drops the one still waiting, so anchors keep their
//! start, middle, end order in the output.

use tracing::debug;

use emo_models::{AnchorKind, MomentKind, SignificanceScore};

/// Current selection phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionState {
    /// Accepting significant moments while budget remains
    Scanning,
    /// An anchor is waiting for a frame with a face
    AnchorPending {
        pending: AnchorKind,
        exhausted: bool,
    },
    /// Only anchor positions are examined
    BudgetExhausted,
}

impl SelectionState {
    pub fn name(&self) -> &'static str {
        match self {
            SelectionState::Scanning => "scanning",
            SelectionState::AnchorPending { .. } => "anchor_pending",
            SelectionState::BudgetExhausted => "budget_exhausted",
        }
    }
}

/// Drives [`SelectionState`] frame by frame.
#[derive(Debug, Clone)]
pub struct Selector {
    state: SelectionState,
    threshold: f64,
    spikes_left: usize,
    budget_exceeded: bool,
}

impl Selector {
    pub fn new(threshold: f64, spike_budget: usize) -> Self {
        Self {
            state: SelectionState::Scanning,
            threshold,
            spikes_left: spike_budget,
            budget_exceeded: false,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    pub fn budget_exceeded(&self) -> bool {
        self.budget_exceeded
    }

    /// Whether significant moments are no longer accepted.
    pub fn is_exhausted(&self) -> bool {
        match &self.state {
            SelectionState::Scanning => false,
            SelectionState::AnchorPending { exhausted, .. } => *exhausted,
            SelectionState::BudgetExhausted => true,
        }
    }

    /// Whether a frame at this position should go through extraction.
    pub fn should_examine(&self, at_anchor: bool, on_stride: bool) -> bool {
        match self.state {
            SelectionState::BudgetExhausted => at_anchor,
            _ => at_anchor || on_stride,
        }
    }

    /// The wall-clock budget ran out: stop looking for significant moments.
    pub fn time_exhausted(&mut self) {
        if self.is_exhausted() {
            return;
        }
        self.budget_exceeded = true;
        self.state = match std::mem::replace(&mut self.state, SelectionState::Scanning) {
            SelectionState::AnchorPending { pending, .. } => SelectionState::AnchorPending {
                pending,
                exhausted: true,
            },
            _ => SelectionState::BudgetExhausted,
        };
    }

    /// An examined frame had no usable landmarks.
    pub fn frame_skipped(&mut self, anchor: Option<AnchorKind>) {
        let Some(kind) = anchor else {
            return;
        };
        let exhausted = self.is_exhausted();
        self.drop_pending(kind);
        self.state = SelectionState::AnchorPending {
            pending: kind,
            exhausted,
        };
    }

    /// An examined frame had landmarks. Returns the moment kind if selected.
    pub fn frame_scored(
        &mut self,
        anchor: Option<AnchorKind>,
        score: SignificanceScore,
    ) -> Option<MomentKind> {
        if let Some(kind) = anchor {
            self.drop_pending(kind);
            self.resolve_pending();
            return Some(MomentKind::Anchor(kind));
        }

        if let Some(kind) = self.resolve_pending() {
            return Some(MomentKind::Anchor(kind));
        }

        if !score.meets(self.threshold) || self.state != SelectionState::Scanning {
            return None;
        }

        if self.spikes_left > 0 {
            self.spikes_left -= 1;
            Some(MomentKind::Significant)
        } else {
            self.budget_exceeded = true;
            self.state = SelectionState::BudgetExhausted;
            None
        }
    }

    /// Take the anchor still waiting when the stream ended.
    pub fn finish(&mut self) -> Option<AnchorKind> {
        match std::mem::replace(&mut self.state, SelectionState::BudgetExhausted) {
            SelectionState::AnchorPending { pending, .. } => Some(pending),
            _ => None,
        }
    }

    /// Leave `AnchorPending`, returning the anchor that was waiting.
    fn resolve_pending(&mut self) -> Option<AnchorKind> {
        let SelectionState::AnchorPending { pending, exhausted } = self.state else {
            return None;
        };
        self.state = if exhausted {
            SelectionState::BudgetExhausted
        } else {
            SelectionState::Scanning
        };
        Some(pending)
    }

    fn drop_pending(&self, reached: AnchorKind) {
        if let SelectionState::AnchorPending { pending, .. } = &self.state {
            debug!(
                dropped = %pending,
                reached = %reached,
                "Later anchor reached, dropping pending anchor"
            );
        }
    }
}
