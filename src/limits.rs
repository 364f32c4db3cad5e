//! Resource limits for a single analysis run.
//!
//! A limits struct plus a mutable running-counter struct checked against
//! it, scoped to analysis-time costs (chunk count, interned names, block
//! nesting depth) rather than runtime ones.

use crate::diagnostics::{SemaError, SemaErrorKind};
use crate::span::Span;
use std::borrow::Cow;

/// Caps on the shape of a single analysis run.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisLimits {
    /// Maximum number of chunks the import loader will enqueue before giving up.
    pub max_chunks: usize,
    /// Maximum number of distinct interned names.
    pub max_names: usize,
    /// Maximum nesting depth of sub-blocks within one function block.
    pub max_block_depth: usize,
}

impl Default for AnalysisLimits {
    fn default() -> Self {
        Self {
            max_chunks: 4096,
            max_names: 1_000_000,
            max_block_depth: 256,
        }
    }
}

impl AnalysisLimits {
    /// No limits at all — used by unit tests that don't want to reason about caps.
    #[must_use]
    pub fn unlimited() -> Self {
        Self {
            max_chunks: usize::MAX,
            max_names: usize::MAX,
            max_block_depth: usize::MAX,
        }
    }
}

/// Running counters checked against [`AnalysisLimits`].
#[derive(Debug, Default)]
pub struct LimitTracker {
    chunks: usize,
    block_depth: usize,
}

impl LimitTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter_chunk(&mut self, limits: &AnalysisLimits, span: Span) -> Result<(), SemaError> {
        self.chunks += 1;
        if self.chunks > limits.max_chunks {
            return Err(SemaError::new(
                SemaErrorKind::LimitExceeded {
                    what: Cow::Borrowed("max_chunks"),
                },
                span,
            ));
        }
        Ok(())
    }

    pub fn enter_block_depth(&mut self, limits: &AnalysisLimits, span: Span) -> Result<(), SemaError> {
        self.block_depth += 1;
        if self.block_depth > limits.max_block_depth {
            return Err(SemaError::new(
                SemaErrorKind::LimitExceeded {
                    what: Cow::Borrowed("max_block_depth"),
                },
                span,
            ));
        }
        Ok(())
    }

    pub fn leave_block_depth(&mut self) {
        self.block_depth = self.block_depth.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ChunkId;

    fn span() -> Span {
        Span::synthetic(ChunkId::new(0))
    }

    #[test]
    fn chunk_limit_trips_past_max() {
        let limits = AnalysisLimits { max_chunks: 2, ..AnalysisLimits::unlimited() };
        let mut tracker = LimitTracker::new();
        tracker.enter_chunk(&limits, span()).unwrap();
        tracker.enter_chunk(&limits, span()).unwrap();
        let err = tracker.enter_chunk(&limits, span()).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::LimitExceeded { .. }));
    }

    #[test]
    fn block_depth_tracks_enter_and_leave() {
        let limits = AnalysisLimits { max_block_depth: 1, ..AnalysisLimits::unlimited() };
        let mut tracker = LimitTracker::new();
        tracker.enter_block_depth(&limits, span()).unwrap();
        let err = tracker.enter_block_depth(&limits, span()).unwrap_err();
        assert!(matches!(err.kind, SemaErrorKind::LimitExceeded { .. }));
        tracker.leave_block_depth();
        tracker.enter_block_depth(&limits, span()).unwrap();
    }

    #[test]
    fn unlimited_never_trips() {
        let limits = AnalysisLimits::unlimited();
        let mut tracker = LimitTracker::new();
        for _ in 0..10_000 {
            tracker.enter_chunk(&limits, span()).unwrap();
        }
    }
}
