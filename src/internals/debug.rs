//! Tracing support (§4.9). `TraceMode` gates whether the inner interpreter
//! reports each token it executes through `Msg::trace`; `Interpreter`
//! additionally bounds how many return-stack levels deep a trace fires via
//! `trace_depth`, mirroring the teacher's STEPPER/STEPPER-DEPTH pair without
//! the global variables it used to live in.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceMode {
    /// No tracing; the common case.
    Off,
    /// Report every token executed, unconditionally.
    Trace,
    /// Like `Trace`, but intended for host-driven single-stepping; the core
    /// itself never blocks — pausing is the embedder's `on_trace` hook's job.
    Step,
}

impl Default for TraceMode {
    fn default() -> Self {
        TraceMode::Off
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_off() {
        assert_eq!(TraceMode::default(), TraceMode::Off);
    }

    #[test]
    fn test_variants_distinct() {
        assert_ne!(TraceMode::Off, TraceMode::Trace);
        assert_ne!(TraceMode::Trace, TraceMode::Step);
    }
}
