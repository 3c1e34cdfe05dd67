//! The generalized Davidson iteration.
//!
//! Each iteration applies the operator to the new search directions,
//! extracts Ritz pairs from the projected problem, checks residual norms,
//! and appends one correction per unconverged tracked root. When the
//! search space outgrows its limit, it is rebuilt from the current best
//! Ritz vectors plus the latest corrections.

use crate::config::{DavidsonConfig, MatrixType, Orthogonalization};
use crate::correction::CorrectionVector;
use crate::error::{DavidsonError, Result};
use crate::projection::ProjectedSpace;
use crate::ritz::{RitzEigenPair, harmonic_ritz, ritz};
use crate::sink::{LogSink, ProgressSink, SolverEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ritz_math::{
    DMat, DVec, argsort, gram_schmidt, normalize_columns, orthonormality_error, qr_orthonormalize,
    select_columns,
};
use ritz_operator::{LinearOperator, OperatorError};
use std::time::Instant;

/// How a solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Converged,
    MaxIterationsReached,
}

/// Eigenpairs found by [`DavidsonSolver::solve`], sorted by eigenvalue.
#[derive(Debug, Clone)]
pub struct DavidsonResult {
    pub eigenvalues: DVec,
    /// Unit-norm eigenvectors, one per column.
    pub eigenvectors: DMat,
    pub residuals: DMat,
    pub residual_norms: DVec,
    /// Per-root convergence flag of the last iteration.
    pub root_converged: Vec<bool>,
    /// Iterations performed, counting the last one.
    pub iterations: usize,
    pub status: SolveStatus,
}

impl DavidsonResult {
    pub fn is_converged(&self) -> bool {
        self.status == SolveStatus::Converged
    }

    pub fn len(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.eigenvalues.is_empty()
    }

    pub fn max_residual(&self) -> f64 {
        self.residual_norms.iter().copied().fold(0.0, f64::max)
    }
}

/// Sizes derived from the configuration and the operator for one solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveSettings {
    pub initial_guess: usize,
    pub tracked_roots: usize,
    pub max_search_space: usize,
}

/// Generalized Davidson eigensolver.
///
/// The configuration is fixed at construction; every call to
/// [`solve`](Self::solve) is independent and reports progress to the sink.
#[derive(Debug, Clone)]
pub struct DavidsonSolver<S = LogSink> {
    config: DavidsonConfig,
    sink: S,
}

impl DavidsonSolver<LogSink> {
    pub fn new(config: DavidsonConfig) -> Self {
        Self {
            config,
            sink: LogSink,
        }
    }
}

impl Default for DavidsonSolver<LogSink> {
    fn default() -> Self {
        Self::new(DavidsonConfig::default())
    }
}

impl<S: ProgressSink> DavidsonSolver<S> {
    pub fn with_sink(config: DavidsonConfig, sink: S) -> Self {
        Self { config, sink }
    }

    pub fn config(&self) -> &DavidsonConfig {
        &self.config
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Lowest `n_eigen` eigenpairs (lowest positive ones for a
    /// Hamiltonian operator), starting from `2 × n_eigen` guess vectors.
    pub fn solve<O: LinearOperator + ?Sized>(&self, op: &O, n_eigen: usize) -> Result<DavidsonResult> {
        self.solve_with_guess(op, n_eigen, 0)
    }

    /// Like [`solve`](Self::solve) with an explicit initial guess size;
    /// `0` selects the default.
    pub fn solve_with_guess<O: LinearOperator + ?Sized>(
        &self,
        op: &O,
        n_eigen: usize,
        size_initial_guess: usize,
    ) -> Result<DavidsonResult> {
        self.config.validate()?;
        let n = op.rows();
        if op.cols() != n {
            return Err(OperatorError::NotSquare {
                what: "operator",
                rows: n,
                cols: op.cols(),
            }
            .into());
        }
        let diagonal = op.diagonal();
        if diagonal.len() != n {
            return Err(OperatorError::DimensionMismatch {
                what: "operator diagonal",
                expected: n,
                found: diagonal.len(),
            }
            .into());
        }
        let settings = self.effective_settings(n, n_eigen, size_initial_guess)?;

        self.sink.record(&SolverEvent::Started {
            operator_size: n,
            n_eigen,
            initial_guess: settings.initial_guess,
            tracked_roots: settings.tracked_roots,
            max_search_space: settings.max_search_space,
            max_iter: self.config.max_iter,
            tolerance: self.config.tolerance,
            correction: self.config.correction,
            size_update: self.config.size_update,
            orthogonalization: self.config.orthogonalization,
            matrix_type: self.config.matrix_type,
        });
        let start = Instant::now();

        let harmonic = self.config.matrix_type == MatrixType::Hamiltonian;
        let guess = self.initial_guess(&diagonal, settings.initial_guess);
        let mut space = ProjectedSpace::new(guess, settings.tracked_roots, harmonic);
        let correction = self.config.correction.strategy();

        let mut iter = 0;
        loop {
            space.update(op);
            let rep = if harmonic {
                let (rep, pairs) = harmonic_ritz(&space)?;
                if pairs > 0 {
                    self.sink.record(&SolverEvent::ComplexPairs {
                        iteration: iter,
                        count: pairs,
                    });
                }
                rep
            } else {
                ritz(&space)
            };

            let res_norms = rep.residual_norms();
            let converged = self.check_convergence(&mut space, &res_norms, n_eigen);
            let tracked = space.size_update().min(rep.len());
            self.sink.record(&SolverEvent::Iteration {
                iteration: iter,
                search_space: space.search_space(),
                max_residual: res_norms.rows(0, tracked).iter().copied().fold(0.0, f64::max),
                converged_roots: space.root_converged()[..tracked].iter().filter(|&&c| c).count(),
                tracked_roots: tracked,
                orthonormality: self
                    .sink
                    .wants_orthonormality()
                    .then(|| orthonormality_error(space.basis())),
            });

            if converged || iter + 1 == self.config.max_iter {
                let status = if converged {
                    SolveStatus::Converged
                } else {
                    SolveStatus::MaxIterationsReached
                };
                self.sink.record(&SolverEvent::Finished {
                    converged,
                    iterations: iter + 1,
                    elapsed: start.elapsed(),
                });
                return Ok(store(&rep, &res_norms, space.root_converged(), n_eigen, iter + 1, status));
            }

            let added = self.extend(&mut space, &rep, &diagonal, correction.as_ref());

            if space.search_space() > settings.max_search_space {
                let from = space.search_space();
                let basis = self.restart_basis(&space, &rep, settings.initial_guess, added);
                space.restart(basis);
                self.sink.record(&SolverEvent::Restart {
                    iteration: iter,
                    from,
                    to: space.search_space(),
                });
            }
            iter += 1;
        }
    }

    /// Resolve guess size, tracked roots and search space limit for an
    /// operator of dimension `n`.
    pub fn effective_settings(
        &self,
        n: usize,
        n_eigen: usize,
        size_initial_guess: usize,
    ) -> Result<EffectiveSettings> {
        // Hamiltonian guesses come from the upper half of the diagonal.
        let available = match self.config.matrix_type {
            MatrixType::Symmetric => n,
            MatrixType::Hamiltonian => n - n / 2,
        };
        if n_eigen == 0 {
            return Err(DavidsonError::InvalidRequest(
                "at least one eigenpair must be requested".to_string(),
            ));
        }
        if n_eigen > available {
            return Err(DavidsonError::InvalidRequest(format!(
                "{n_eigen} eigenpairs requested but only {available} are available for a {}-dim {} operator",
                n, self.config.matrix_type
            )));
        }

        let requested = if size_initial_guess == 0 {
            2 * n_eigen
        } else {
            size_initial_guess
        };
        let initial_guess = requested.max(n_eigen).min(available);
        let tracked_roots = self
            .config
            .size_update
            .tracked_roots(n_eigen)
            .clamp(n_eigen, initial_guess);

        let max_search_space = match self.config.max_search_space {
            Some(m) if m >= n_eigen => m,
            _ => 5 * n_eigen,
        }
        .min(n);

        Ok(EffectiveSettings {
            initial_guess,
            tracked_roots,
            max_search_space,
        })
    }

    /// Unit vectors on the smallest diagonal entries (or on the entries
    /// just above the midpoint for a Hamiltonian operator), optionally
    /// perturbed by seeded noise and re-orthonormalized.
    fn initial_guess(&self, diagonal: &DVec, size: usize) -> DMat {
        let n = diagonal.len();
        let idx = argsort(diagonal.as_slice());
        let offset = match self.config.matrix_type {
            MatrixType::Symmetric => 0,
            MatrixType::Hamiltonian => n / 2,
        };

        let mut guess = DMat::zeros(n, size);
        for j in 0..size {
            guess[(idx[offset + j], j)] = 1.0;
        }

        let noise = self.config.guess_noise;
        if noise > 0.0 {
            let mut rng = StdRng::seed_from_u64(self.config.seed);
            for x in guess.iter_mut() {
                *x += noise * (2.0 * rng.r#gen::<f64>() - 1.0);
            }
            guess = self.orthogonalize(&guess, 0);
        }
        guess
    }

    fn orthogonalize(&self, v: &DMat, start: usize) -> DMat {
        match self.config.orthogonalization {
            Orthogonalization::GramSchmidt => gram_schmidt(v, start),
            Orthogonalization::Qr => qr_orthonormalize(v),
        }
    }

    /// Flag tracked roots whose residual is below tolerance. Converged once
    /// the first `n_eigen` roots are.
    fn check_convergence(&self, space: &mut ProjectedSpace, res_norms: &DVec, n_eigen: usize) -> bool {
        let tol = self.config.tolerance;
        let flags = space.root_converged_mut();
        for (j, flag) in flags.iter_mut().enumerate() {
            *flag = j < res_norms.len() && res_norms[j] < tol;
        }
        n_eigen <= res_norms.len() && flags[..n_eigen].iter().all(|&c| c)
    }

    /// Append one correction per unconverged tracked root. Returns the
    /// number of new basis vectors.
    fn extend(
        &self,
        space: &mut ProjectedSpace,
        rep: &RitzEigenPair,
        diagonal: &DVec,
        correction: &dyn CorrectionVector,
    ) -> usize {
        let n = diagonal.len();
        let room = n.saturating_sub(space.search_space());
        let tracked = space.size_update().min(rep.len());

        let mut block = Vec::new();
        for j in 0..tracked {
            if block.len() == room {
                break;
            }
            if space.root_converged()[j] {
                continue;
            }
            let r = rep.res.column(j).into_owned();
            let q = rep.q.column(j).into_owned();
            let mut w = correction.correction(&r, &q, rep.lambda[j], diagonal);
            let norm = w.norm();
            if norm <= 0.0 || !norm.is_finite() {
                continue;
            }
            w /= norm;
            block.push(w);
        }
        if block.is_empty() {
            return 0;
        }
        let block = DMat::from_columns(&block);
        space.extend(&block, self.config.orthogonalization)
    }

    /// New basis after a restart: the leading `size_restart` Ritz vectors
    /// followed by the `fresh` most recent corrections.
    fn restart_basis(
        &self,
        space: &ProjectedSpace,
        rep: &RitzEigenPair,
        size_restart: usize,
        fresh: usize,
    ) -> DMat {
        let v = space.basis();
        let keep = size_restart.min(rep.len());
        let fresh = fresh.min(v.ncols());
        let mut basis = DMat::zeros(v.nrows(), keep + fresh);
        basis.columns_mut(0, keep).copy_from(&rep.q.columns(0, keep));
        basis
            .columns_mut(keep, fresh)
            .copy_from(&v.columns(v.ncols() - fresh, fresh));
        self.orthogonalize(&basis, 0)
    }
}

/// Keep the first `n_eigen` Ritz pairs, sorted by eigenvalue.
fn store(
    rep: &RitzEigenPair,
    res_norms: &DVec,
    root_converged: &[bool],
    n_eigen: usize,
    iterations: usize,
    status: SolveStatus,
) -> DavidsonResult {
    let k = n_eigen.min(rep.len());
    let order = argsort(&rep.lambda.as_slice()[..k]);

    let mut eigenvectors = select_columns(&rep.q, &order);
    normalize_columns(&mut eigenvectors);
    let residuals = select_columns(&rep.res, &order);

    DavidsonResult {
        eigenvalues: DVec::from_iterator(k, order.iter().map(|&i| rep.lambda[i])),
        residual_norms: DVec::from_iterator(k, order.iter().map(|&i| res_norms[i])),
        root_converged: order
            .iter()
            .map(|&i| root_converged.get(i).copied().unwrap_or(false))
            .collect(),
        eigenvectors,
        residuals,
        iterations,
        status,
    }
}
