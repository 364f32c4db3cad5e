//! Analysis-pass tracing.
//!
//! Provides a trait-based tracing system for [`crate::driver::SemaDriver`]
//! with zero-cost abstraction: all hooks have no-op default bodies, so
//! [`NoopTracer`] compiles away entirely via monomorphization. No
//! `log`/`tracing` dependency — this trait is the idiom that stands in
//! for it.
//!
//! | Tracer | Purpose |
//! |--------|---------|
//! | [`NoopTracer`] | Zero-cost no-op (default) |
//! | [`RecordingTracer`] | Full event recording, for tests and post-mortem inspection |

use crate::ids::{ChunkId, ModuleId, ResolvedSymId, SymId};

/// One recorded analysis event. Used by [`RecordingTracer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceEvent {
    /// A chunk's statement traversal began.
    ChunkStarted { chunk: ChunkId },
    /// A chunk's statement traversal finished without a fatal error.
    ChunkFinished { chunk: ChunkId },
    /// A local sym was resolved to a process-wide resolved sym.
    SymResolved { sym: SymId, resolved: ResolvedSymId },
    /// A sub-block closed and merged variable types into its parent.
    SubBlockClosed { vars_widened: usize },
    /// A module was requested by spec and either found or freshly enqueued.
    ModuleRequested { module: ModuleId, was_new: bool },
}

/// Hook points the [`crate::driver::SemaDriver`] calls into during traversal.
///
/// All methods have default no-op implementations; implement only the hooks
/// you care about. Driven generically (`SemaDriver<Tr: SemaTracer>`) so the
/// compiler can inline [`NoopTracer`] calls away entirely.
pub trait SemaTracer {
    fn on_chunk_started(&mut self, _chunk: ChunkId) {}
    fn on_chunk_finished(&mut self, _chunk: ChunkId) {}
    fn on_sym_resolved(&mut self, _sym: SymId, _resolved: ResolvedSymId) {}
    fn on_sub_block_closed(&mut self, _vars_widened: usize) {}
    fn on_module_requested(&mut self, _module: ModuleId, _was_new: bool) {}
}

/// Zero-cost no-op tracer; the production default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopTracer;

impl SemaTracer for NoopTracer {}

/// Records every event for tests and post-mortem inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracer {
    pub events: Vec<TraceEvent>,
}

impl RecordingTracer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SemaTracer for RecordingTracer {
    fn on_chunk_started(&mut self, chunk: ChunkId) {
        self.events.push(TraceEvent::ChunkStarted { chunk });
    }

    fn on_chunk_finished(&mut self, chunk: ChunkId) {
        self.events.push(TraceEvent::ChunkFinished { chunk });
    }

    fn on_sym_resolved(&mut self, sym: SymId, resolved: ResolvedSymId) {
        self.events.push(TraceEvent::SymResolved { sym, resolved });
    }

    fn on_sub_block_closed(&mut self, vars_widened: usize) {
        self.events.push(TraceEvent::SubBlockClosed { vars_widened });
    }

    fn on_module_requested(&mut self, module: ModuleId, was_new: bool) {
        self.events.push(TraceEvent::ModuleRequested { module, was_new });
    }
}
