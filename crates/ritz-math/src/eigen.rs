//! Dense eigendecomposition for small matrices.
//!
//! Symmetric problems go through nalgebra's `SymmetricEigen`. Nonsymmetric
//! and generalized problems take their eigenvalues from the real Schur form
//! and recover eigenvectors by shifted inverse iteration in complex
//! arithmetic, since nalgebra has no nonsymmetric eigenvector routine.

use crate::{CMat, CVec, Complex64, DMat, DVec, argsort, select_columns};
use nalgebra::linalg::Schur;

/// Relative shift applied to an eigenvalue before inverse iteration.
const INVERSE_SHIFT: f64 = 1e-10;
/// Linear solves per inverse iteration.
const INVERSE_STEPS: usize = 3;

/// Eigenvalues and eigenvectors of a symmetric matrix.
#[derive(Debug, Clone)]
pub struct Spectrum {
    /// Eigenvalues in ascending order.
    pub values: DVec,
    /// Corresponding orthonormal eigenvectors (columns).
    pub vectors: DMat,
}

impl Spectrum {
    /// Number of eigenpairs held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Smallest eigenvalue.
    pub fn lowest(&self) -> f64 {
        self.values[0]
    }

    /// Spectral gap (λ_1 - λ_0).
    pub fn gap(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }
        self.values[1] - self.values[0]
    }
}

/// Diagonalize a real symmetric matrix.
///
/// If `n_lowest` is `Some(n)`, only the `n` lowest eigenpairs are returned
/// (still computed via full diagonalization).
pub fn diagonalize(h: &DMat, n_lowest: Option<usize>) -> Spectrum {
    let eig = h.clone().symmetric_eigen();
    let values: Vec<f64> = eig.eigenvalues.iter().copied().collect();
    let mut idx = argsort(&values);
    if let Some(n) = n_lowest {
        idx.truncate(n);
    }

    Spectrum {
        values: DVec::from_iterator(idx.len(), idx.iter().map(|&i| values[i])),
        vectors: select_columns(&eig.eigenvectors, &idx),
    }
}

/// Eigenpairs of a real nonsymmetric matrix (or pencil).
///
/// Complex eigenvalues appear in conjugate pairs; vectors are unit-norm
/// columns with their largest component rotated onto the positive real
/// axis.
#[derive(Debug, Clone)]
pub struct GeneralEigen {
    pub values: Vec<Complex64>,
    pub vectors: CMat,
}

impl GeneralEigen {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Eigenpairs of a real square matrix.
///
/// Returns `None` if `m` is not square, the Schur iteration does not
/// converge, or a shifted system stays singular.
pub fn general_eigen(m: &DMat) -> Option<GeneralEigen> {
    let n = m.nrows();
    if m.ncols() != n {
        return None;
    }
    if n == 0 {
        return Some(GeneralEigen {
            values: Vec::new(),
            vectors: CMat::zeros(0, 0),
        });
    }
    if m.iter().any(|x| !x.is_finite()) {
        return None;
    }

    let schur = Schur::try_new(m.clone(), f64::EPSILON, 1000 + 100 * n)?;
    let values: Vec<Complex64> = schur.complex_eigenvalues().iter().copied().collect();

    let mc: CMat = m.map(|x| Complex64::new(x, 0.0));
    let scale = m.amax().max(1.0);
    let mut vectors = CMat::zeros(n, n);
    for (k, &lambda) in values.iter().enumerate() {
        let v = inverse_iteration(&mc, lambda, k, scale)?;
        vectors.set_column(k, &v);
    }

    Some(GeneralEigen { values, vectors })
}

/// Eigenpairs of the pencil `a u = θ b u`.
///
/// Solved as the standard problem `b⁻¹ a`; returns `None` when `b` is
/// singular or the reduced problem fails.
pub fn generalized_eigen(a: &DMat, b: &DMat) -> Option<GeneralEigen> {
    if a.shape() != b.shape() || a.nrows() != a.ncols() {
        return None;
    }
    let m = b.clone().lu().solve(a)?;
    general_eigen(&m)
}

fn inverse_iteration(mc: &CMat, lambda: Complex64, k: usize, scale: f64) -> Option<CVec> {
    let n = mc.nrows();
    let mut shift = INVERSE_SHIFT * scale;

    for _attempt in 0..4 {
        let sigma = lambda + Complex64::new(shift, 0.0);
        let mut shifted = mc.clone();
        for i in 0..n {
            shifted[(i, i)] -= sigma;
        }
        let lu = shifted.lu();

        let mut x = start_vector(n, k);
        let mut ok = true;
        for _ in 0..INVERSE_STEPS {
            let Some(y) = lu.solve(&x) else {
                ok = false;
                break;
            };
            let norm = y.norm();
            if norm == 0.0 || !norm.is_finite() {
                ok = false;
                break;
            }
            x = y.unscale(norm);
        }

        if ok {
            return Some(fix_phase(x));
        }
        shift *= 1e3;
    }
    None
}

// Deterministic, generic start vector; varies with `k` so that degenerate
// eigenvalues pick up different directions of their eigenspace.
fn start_vector(n: usize, k: usize) -> CVec {
    let x = CVec::from_fn(n, |i, _| {
        let t = ((i + 1) * (k + 2)) as f64 * 0.618_033_988_749_895;
        Complex64::new(0.5 + t.fract(), 0.0)
    });
    let norm = x.norm();
    x.unscale(norm)
}

fn fix_phase(mut x: CVec) -> CVec {
    let pivot = x
        .iter()
        .copied()
        .max_by(|a, b| a.norm_sqr().total_cmp(&b.norm_sqr()))
        .unwrap_or(Complex64::new(1.0, 0.0));
    let mag = pivot.norm();
    if mag > 0.0 {
        let phase = pivot.conj() / mag;
        x *= phase;
    }
    x
}
