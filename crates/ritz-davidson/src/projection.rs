//! Search space bookkeeping.
//!
//! [`ProjectedSpace`] holds the orthonormal basis `V`, the cached images
//! `AV` (and `A·AV` for harmonic extraction) and the projected matrix
//! `T = VᵀAV`. Operator products are computed only for columns appended
//! since the last update; a restart resets the cache cursor.

use crate::config::Orthogonalization;
use ritz_math::{DMat, gram_schmidt, qr_orthonormalize};
use ritz_operator::LinearOperator;

#[derive(Debug, Clone)]
pub struct ProjectedSpace {
    v: DMat,
    av: DMat,
    a2v: Option<DMat>,
    t: DMat,
    /// Leading columns of `V` whose images are cached.
    computed: usize,
    size_update: usize,
    root_converged: Vec<bool>,
}

impl ProjectedSpace {
    /// Start from an orthonormal block `v`. With `harmonic` set, `A·AV` is
    /// cached alongside `AV`.
    pub fn new(v: DMat, size_update: usize, harmonic: bool) -> Self {
        let n = v.nrows();
        Self {
            v,
            av: DMat::zeros(n, 0),
            a2v: harmonic.then(|| DMat::zeros(n, 0)),
            t: DMat::zeros(0, 0),
            computed: 0,
            size_update,
            root_converged: vec![false; size_update],
        }
    }

    pub fn search_space(&self) -> usize {
        self.v.ncols()
    }

    pub fn basis(&self) -> &DMat {
        &self.v
    }

    pub fn image(&self) -> &DMat {
        &self.av
    }

    pub fn projected(&self) -> &DMat {
        &self.t
    }

    pub fn size_update(&self) -> usize {
        self.size_update
    }

    pub fn root_converged(&self) -> &[bool] {
        &self.root_converged
    }

    pub(crate) fn root_converged_mut(&mut self) -> &mut [bool] {
        &mut self.root_converged
    }

    /// Columns of `V` still waiting for their operator product.
    pub fn pending(&self) -> usize {
        self.v.ncols() - self.computed
    }

    /// Apply the operator to the new columns of `V` and refresh `T`.
    pub fn update<O: LinearOperator + ?Sized>(&mut self, op: &O) {
        let m = self.v.ncols();
        let start = self.computed;
        if start < m {
            let fresh = self.v.columns(start, m - start).into_owned();
            let fresh_av = op.apply(&fresh);
            if let Some(a2v) = self.a2v.take() {
                let fresh_a2v = op.apply(&fresh_av);
                self.a2v = Some(append_columns(&a2v, start, &fresh_a2v));
            }
            self.av = append_columns(&self.av, start, &fresh_av);
            self.computed = m;
        }
        self.t = self.v.tr_mul(&self.av);
    }

    /// `VᵀA·AV`, the metric of the harmonic Ritz problem.
    pub fn harmonic_metric(&self) -> Option<DMat> {
        self.a2v.as_ref().map(|a2v| self.v.tr_mul(a2v))
    }

    /// Append `block` to the basis and orthonormalize. Returns the number of
    /// columns that survived.
    pub fn extend(&mut self, block: &DMat, ortho: Orthogonalization) -> usize {
        let old = self.v.ncols();
        let mut stacked = DMat::zeros(self.v.nrows(), old + block.ncols());
        stacked.columns_mut(0, old).copy_from(&self.v);
        stacked.columns_mut(old, block.ncols()).copy_from(block);

        self.v = match ortho {
            Orthogonalization::GramSchmidt => gram_schmidt(&stacked, old),
            Orthogonalization::Qr => qr_orthonormalize(&stacked),
        };
        if self.v.ncols() < old {
            // The frozen prefix lost rank; nothing cached is valid any more.
            self.computed = 0;
        }
        self.v.ncols().saturating_sub(old)
    }

    /// Replace the basis after a restart. All cached products are discarded.
    pub fn restart(&mut self, v: DMat) {
        let n = v.nrows();
        self.v = v;
        self.av = DMat::zeros(n, 0);
        if self.a2v.is_some() {
            self.a2v = Some(DMat::zeros(n, 0));
        }
        self.t = DMat::zeros(0, 0);
        self.computed = 0;
    }
}

fn append_columns(cached: &DMat, keep: usize, fresh: &DMat) -> DMat {
    let mut out = DMat::zeros(fresh.nrows(), keep + fresh.ncols());
    out.columns_mut(0, keep).copy_from(&cached.columns(0, keep));
    out.columns_mut(keep, fresh.ncols()).copy_from(fresh);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ritz_math::{DVec, orthonormality_error};
    use std::cell::Cell;

    /// Diagonal operator that counts applied columns.
    struct Counting {
        d: DVec,
        applied: Cell<usize>,
    }

    impl LinearOperator for Counting {
        fn rows(&self) -> usize {
            self.d.len()
        }

        fn diagonal(&self) -> DVec {
            self.d.clone()
        }

        fn apply(&self, x: &DMat) -> DMat {
            self.applied.set(self.applied.get() + x.ncols());
            let mut y = x.clone();
            for (i, mut row) in y.row_iter_mut().enumerate() {
                row *= self.d[i];
            }
            y
        }
    }

    fn op(n: usize) -> Counting {
        Counting {
            d: DVec::from_iterator(n, (0..n).map(|i| (i + 1) as f64)),
            applied: Cell::new(0),
        }
    }

    fn unit_block(n: usize, cols: &[usize]) -> DMat {
        let mut v = DMat::zeros(n, cols.len());
        for (j, &i) in cols.iter().enumerate() {
            v[(i, j)] = 1.0;
        }
        v
    }

    #[test]
    fn test_incremental_products() {
        let a = op(6);
        let mut space = ProjectedSpace::new(unit_block(6, &[0, 1]), 2, false);
        space.update(&a);
        assert_eq!(a.applied.get(), 2);
        assert_eq!(space.pending(), 0);

        let added = space.extend(&unit_block(6, &[2, 3]), Orthogonalization::GramSchmidt);
        assert_eq!(added, 2);
        assert_eq!(space.pending(), 2);
        space.update(&a);
        // Only the two new columns are applied.
        assert_eq!(a.applied.get(), 4);

        let expected = DMat::from_diagonal(&DVec::from_vec(vec![1.0, 2.0, 3.0, 4.0]));
        assert_relative_eq!(space.projected().clone(), expected, epsilon = 1e-14);
    }

    #[test]
    fn test_extend_drops_dependent_directions() {
        let mut space = ProjectedSpace::new(unit_block(5, &[0, 1]), 2, false);
        let mut block = unit_block(5, &[1, 2]);
        block[(0, 0)] = 1.0;
        let added = space.extend(&block, Orthogonalization::GramSchmidt);
        assert_eq!(added, 1);
        assert_eq!(space.search_space(), 3);
        assert!(orthonormality_error(space.basis()) < 1e-12);
    }

    #[test]
    fn test_extend_qr_keeps_prefix() {
        let mut space = ProjectedSpace::new(unit_block(5, &[0, 1]), 2, false);
        let mut block = DMat::from_element(5, 2, 0.3);
        block[(4, 1)] = -1.0;
        let before = space.basis().clone();
        let added = space.extend(&block, Orthogonalization::Qr);
        assert_eq!(added, 2);
        assert_relative_eq!(space.basis().columns(0, 2).into_owned(), before, epsilon = 1e-12);
        assert!(orthonormality_error(space.basis()) < 1e-12);
    }

    #[test]
    fn test_restart_recomputes_everything() {
        let a = op(4);
        let mut space = ProjectedSpace::new(unit_block(4, &[0, 1, 2]), 2, true);
        space.update(&a);
        // A and A·A for three columns.
        assert_eq!(a.applied.get(), 6);

        space.restart(unit_block(4, &[3]));
        assert_eq!(space.pending(), 1);
        space.update(&a);
        assert_eq!(a.applied.get(), 8);
        assert_relative_eq!(space.projected()[(0, 0)], 4.0);
        let metric = space.harmonic_metric().unwrap();
        assert_relative_eq!(metric[(0, 0)], 16.0);
    }

    #[test]
    fn test_symmetric_mode_has_no_metric() {
        let space = ProjectedSpace::new(unit_block(3, &[0]), 1, false);
        assert!(space.harmonic_metric().is_none());
        assert_eq!(space.root_converged(), &[false]);
    }
}
