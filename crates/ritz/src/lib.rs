//! ritz: iterative subspace eigensolvers.
//!
//! This is the umbrella crate: it re-exports the operator, dense algebra
//! and Davidson crates and provides the two common entry points, one for
//! symmetric operators and one for paired excitation problems.

pub use ritz_davidson::{
    self, CorrectionScheme, DavidsonConfig, DavidsonError, DavidsonResult, DavidsonSolver,
    LogSink, MatrixType, MemorySink, NullSink, Orthogonalization, ProgressSink, SizeUpdate,
    SolveStatus, SolverEvent,
};
pub use ritz_math::{self, DMat, DVec};
pub use ritz_operator::{
    self, CsrMatrix, HamiltonianOperator, LinearOperator, MatrixFree, OperatorError, RowOperator,
};

/// Lowest eigenpairs of a symmetric operator.
///
/// Runs a [`DavidsonSolver`] with the symmetric mode forced and the search
/// space limited to `10 × n_eigen`.
pub fn solve_hermitian<O: LinearOperator + ?Sized>(
    op: &O,
    n_eigen: usize,
    config: DavidsonConfig,
) -> ritz_davidson::Result<DavidsonResult> {
    let config = DavidsonConfig {
        matrix_type: MatrixType::Symmetric,
        max_search_space: Some(10 * n_eigen),
        ..config
    };
    DavidsonSolver::new(config).solve(op, n_eigen)
}

/// Excitation energies and amplitudes of a paired problem.
#[derive(Debug, Clone)]
pub struct PairedSolution {
    /// Lowest positive eigenvalues, ascending.
    pub eigenvalues: DVec,
    /// A-block amplitudes, one column per root.
    pub x: DMat,
    /// B-block amplitudes, scaled with `x` so that `|X|² − |Y|² = 1`.
    pub y: DMat,
    pub result: DavidsonResult,
}

impl PairedSolution {
    pub fn is_converged(&self) -> bool {
        self.result.is_converged()
    }
}

/// Lowest positive eigenvalues of `[[A, B], [-B, -A]]`.
///
/// The blocks must be square and of equal size. The search space is
/// limited to `10 × n_eigen` and the harmonic Ritz extraction is forced.
pub fn solve_paired<A: LinearOperator, B: LinearOperator>(
    a: A,
    b: B,
    n_eigen: usize,
    config: DavidsonConfig,
) -> ritz_davidson::Result<PairedSolution> {
    let h = HamiltonianOperator::new(a, b)?;
    let config = DavidsonConfig {
        matrix_type: MatrixType::Hamiltonian,
        max_search_space: Some(10 * n_eigen),
        ..config
    };
    let result = DavidsonSolver::new(config).solve(&h, n_eigen)?;
    let (x, y) = h.normalize_excitations(&result.eigenvectors);
    Ok(PairedSolution {
        eigenvalues: result.eigenvalues.clone(),
        x,
        y,
        result,
    })
}
