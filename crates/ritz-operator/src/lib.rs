//! Linear operators for iterative subspace eigensolvers.
//!
//! The solvers never need a materialized matrix: an operator only has to
//! report its dimension, its diagonal (for preconditioning and for ranking
//! initial guesses), and its action on a block of column vectors.
//!
//! # Modules
//!
//! - [`dense`]: `LinearOperator` for nalgebra matrices
//! - [`matrix_free`]: row-access operators and the [`MatrixFree`] adapter
//! - [`csr`]: compressed sparse row storage with column-parallel products
//! - [`hamiltonian`]: the paired `[[A, B], [-B, -A]]` operator

pub mod csr;
pub mod dense;
pub mod error;
pub mod hamiltonian;
pub mod matrix_free;

pub use csr::CsrMatrix;
pub use error::{OperatorError, Result};
pub use hamiltonian::HamiltonianOperator;
pub use matrix_free::{MatrixFree, RowOperator};

use ritz_math::{DMat, DVec};

/// A square linear operator accessed through its action.
///
/// `apply` is the single abstraction boundary the eigensolvers depend on:
/// it maps an `n × k` block to an `n × k` block and must not mutate the
/// operator.
pub trait LinearOperator {
    /// Operator dimension n.
    fn rows(&self) -> usize;

    fn cols(&self) -> usize {
        self.rows()
    }

    /// The n diagonal entries.
    fn diagonal(&self) -> DVec;

    /// Product with an `n × k` block.
    fn apply(&self, x: &DMat) -> DMat;

    /// Product with a single vector.
    fn apply_vec(&self, x: &DVec) -> DVec {
        let block = DMat::from_column_slice(x.len(), 1, x.as_slice());
        self.apply(&block).column(0).into_owned()
    }

    /// Materialize the operator by applying it to the identity.
    ///
    /// Meant for tests and small reference calculations.
    fn to_dense(&self) -> DMat {
        self.apply(&DMat::identity(self.rows(), self.cols()))
    }
}

impl<T: LinearOperator + ?Sized> LinearOperator for &T {
    fn rows(&self) -> usize {
        (**self).rows()
    }

    fn cols(&self) -> usize {
        (**self).cols()
    }

    fn diagonal(&self) -> DVec {
        (**self).diagonal()
    }

    fn apply(&self, x: &DMat) -> DMat {
        (**self).apply(x)
    }

    fn apply_vec(&self, x: &DVec) -> DVec {
        (**self).apply_vec(x)
    }

    fn to_dense(&self) -> DMat {
        (**self).to_dense()
    }
}
