//! Progress reporting.
//!
//! The solver never prints. It emits [`SolverEvent`]s to a [`ProgressSink`]
//! chosen by the caller; [`LogSink`] forwards them to the `log` facade.

use crate::config::{CorrectionScheme, MatrixType, Orthogonalization, SizeUpdate};
use std::cell::RefCell;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum SolverEvent {
    /// Effective settings of a solve, after clamping against the operator.
    Started {
        operator_size: usize,
        n_eigen: usize,
        initial_guess: usize,
        tracked_roots: usize,
        max_search_space: usize,
        max_iter: usize,
        tolerance: f64,
        correction: CorrectionScheme,
        size_update: SizeUpdate,
        orthogonalization: Orthogonalization,
        matrix_type: MatrixType,
    },
    Iteration {
        iteration: usize,
        search_space: usize,
        max_residual: f64,
        converged_roots: usize,
        tracked_roots: usize,
        /// `max |VᵀV − I|` of the basis used in this iteration, present only
        /// when the sink asks for it.
        orthonormality: Option<f64>,
    },
    /// Conjugate pairs were removed from the harmonic Ritz values.
    ComplexPairs { iteration: usize, count: usize },
    Restart {
        iteration: usize,
        from: usize,
        to: usize,
    },
    Finished {
        converged: bool,
        iterations: usize,
        elapsed: Duration,
    },
}

/// Receiver for solver progress events.
pub trait ProgressSink {
    fn record(&self, event: &SolverEvent);

    /// Whether iteration events should carry the basis orthonormality
    /// error. Measuring it costs an extra `VᵀV` product per iteration.
    fn wants_orthonormality(&self) -> bool {
        false
    }
}

impl<S: ProgressSink + ?Sized> ProgressSink for &S {
    fn record(&self, event: &SolverEvent) {
        (**self).record(event)
    }

    fn wants_orthonormality(&self) -> bool {
        (**self).wants_orthonormality()
    }
}

/// Forwards events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl ProgressSink for LogSink {
    fn record(&self, event: &SolverEvent) {
        match *event {
            SolverEvent::Started {
                operator_size,
                n_eigen,
                initial_guess,
                tracked_roots,
                max_search_space,
                max_iter,
                tolerance,
                correction,
                size_update,
                orthogonalization,
                matrix_type,
            } => {
                log::info!(
                    "Davidson: {n_eigen} roots of a {operator_size}-dim {matrix_type} operator"
                );
                log::info!(
                    "  tolerance {tolerance:.1e}, max iterations {max_iter}, max search space {max_search_space}"
                );
                log::info!(
                    "  correction {correction}, size update {size_update} ({tracked_roots} tracked, {initial_guess} initial), orthogonalization {orthogonalization}"
                );
            }
            SolverEvent::Iteration {
                iteration,
                search_space,
                max_residual,
                converged_roots,
                tracked_roots,
                orthonormality,
            } => {
                let percent = 100.0 * converged_roots as f64 / tracked_roots.max(1) as f64;
                log::info!(
                    "{iteration:4} {search_space:8}   {max_residual:9.2e}   {percent:6.2}% converged"
                );
                if let Some(err) = orthonormality {
                    log::trace!("basis orthonormality error {err:.2e}");
                }
            }
            SolverEvent::ComplexPairs { iteration, count } => {
                log::debug!("iteration {iteration}: dropped {count} complex conjugate pair(s)");
            }
            SolverEvent::Restart { iteration, from, to } => {
                log::debug!("iteration {iteration}: restart {from} -> {to} vectors");
            }
            SolverEvent::Finished {
                converged: true,
                iterations,
                elapsed,
            } => {
                log::info!("Davidson converged in {iterations} iterations ({elapsed:?})");
            }
            SolverEvent::Finished {
                converged: false,
                iterations,
                elapsed,
            } => {
                log::warn!(
                    "Davidson did not converge in {iterations} iterations ({elapsed:?})"
                );
            }
        }
    }

    fn wants_orthonormality(&self) -> bool {
        log::log_enabled!(log::Level::Trace)
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn record(&self, _event: &SolverEvent) {}
}

/// Keeps every event in memory, mainly for tests and post-run inspection.
///
/// Asks for the basis orthonormality error unless built with
/// [`without_orthonormality`](Self::without_orthonormality).
#[derive(Debug)]
pub struct MemorySink {
    events: RefCell<Vec<SolverEvent>>,
    orthonormality: bool,
}

impl Default for MemorySink {
    fn default() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
            orthonormality: true,
        }
    }
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_orthonormality() -> Self {
        Self {
            orthonormality: false,
            ..Self::default()
        }
    }

    pub fn events(&self) -> Vec<SolverEvent> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Number of restarts recorded.
    pub fn restarts(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SolverEvent::Restart { .. }))
            .count()
    }

    /// Worst basis orthonormality error over all recorded iterations.
    /// `None` if no iteration carried a measurement.
    pub fn max_orthonormality_error(&self) -> Option<f64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SolverEvent::Iteration { orthonormality, .. } => *orthonormality,
                _ => None,
            })
            .reduce(f64::max)
    }

    /// Largest residual norm of every recorded iteration, in order.
    pub fn residual_history(&self) -> Vec<f64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                SolverEvent::Iteration { max_residual, .. } => Some(*max_residual),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl ProgressSink for MemorySink {
    fn record(&self, event: &SolverEvent) {
        self.events.borrow_mut().push(event.clone());
    }

    fn wants_orthonormality(&self) -> bool {
        self.orthonormality
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_collects() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());

        sink.record(&SolverEvent::Iteration {
            iteration: 0,
            search_space: 4,
            max_residual: 0.5,
            converged_roots: 0,
            tracked_roots: 3,
            orthonormality: Some(1e-15),
        });
        sink.record(&SolverEvent::Restart {
            iteration: 0,
            from: 8,
            to: 4,
        });
        sink.record(&SolverEvent::Iteration {
            iteration: 1,
            search_space: 7,
            max_residual: 0.1,
            converged_roots: 1,
            tracked_roots: 3,
            orthonormality: None,
        });

        assert_eq!(sink.len(), 3);
        assert_eq!(sink.restarts(), 1);
        assert_eq!(sink.residual_history(), vec![0.5, 0.1]);
        assert_eq!(sink.max_orthonormality_error(), Some(1e-15));
        assert!(sink.wants_orthonormality());
        assert!(!MemorySink::without_orthonormality().wants_orthonormality());
        assert!(!NullSink.wants_orthonormality());

        sink.clear();
        assert!(sink.is_empty());
    }

    #[test]
    fn test_sink_by_reference() {
        let sink = MemorySink::new();
        let by_ref: &dyn ProgressSink = &sink;
        (&by_ref).record(&SolverEvent::ComplexPairs {
            iteration: 2,
            count: 1,
        });
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_log_and_null_sinks_accept_all_events() {
        let events = [
            SolverEvent::ComplexPairs {
                iteration: 0,
                count: 2,
            },
            SolverEvent::Finished {
                converged: false,
                iterations: 3,
                elapsed: Duration::from_millis(5),
            },
        ];
        for e in &events {
            LogSink.record(e);
            NullSink.record(e);
        }
    }
}
