//! Generalized Davidson eigensolver.
//!
//! Finds a few extremal eigenpairs of a large operator that is only
//! accessed through [`LinearOperator::apply`]:
//!
//! - symmetric operators: the lowest eigenvalues, from standard Ritz pairs
//! - paired `[[A, B], [-B, -A]]` operators: the lowest positive eigenvalues,
//!   from harmonic Ritz pairs
//!
//! # Modules
//!
//! - [`config`]: options, string setters and JSON configuration
//! - [`correction`]: DPR and Olsen correction vectors
//! - [`projection`]: search space with cached operator products
//! - [`ritz`]: standard and harmonic Ritz extraction
//! - [`solver`]: the iteration itself
//! - [`sink`]: progress events
//!
//! [`LinearOperator::apply`]: ritz_operator::LinearOperator::apply

pub mod config;
pub mod correction;
pub mod error;
pub mod projection;
pub mod ritz;
pub mod sink;
pub mod solver;

pub use config::{
    CorrectionScheme, DavidsonConfig, MatrixType, Orthogonalization, SizeUpdate, TOLERANCE_PRESETS,
    parse_tolerance,
};
pub use correction::{CorrectionVector, DPR_CUTOFF, DprCorrection, OlsenCorrection};
pub use error::{DavidsonError, Result};
pub use projection::ProjectedSpace;
pub use ritz::{RitzEigenPair, harmonic_ritz, pair_complex_eigenvalues};
pub use sink::{LogSink, MemorySink, NullSink, ProgressSink, SolverEvent};
pub use solver::{DavidsonResult, DavidsonSolver, EffectiveSettings, SolveStatus};
