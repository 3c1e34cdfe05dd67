//! CSR (Compressed Sparse Row) operator.
//!
//! Stores only the non-zero entries. Products against a block of vectors
//! run one column per rayon task.

use crate::LinearOperator;
use crate::error::{OperatorError, Result};
use rayon::prelude::*;
use ritz_math::{DMat, DVec};

/// Square sparse matrix in Compressed Sparse Row format.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    pub nrows: usize,
    pub row_ptr: Vec<usize>,
    pub col_indices: Vec<usize>,
    pub values: Vec<f64>,
}

impl CsrMatrix {
    /// Build from a dense matrix, dropping entries with `|a_ij| <= drop_tol`.
    /// Diagonal entries are always stored.
    pub fn from_dense(m: &DMat, drop_tol: f64) -> Result<Self> {
        if m.nrows() != m.ncols() {
            return Err(OperatorError::NotSquare {
                what: "CSR matrix",
                rows: m.nrows(),
                cols: m.ncols(),
            });
        }
        let n = m.nrows();
        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_indices = Vec::new();
        let mut values = Vec::new();

        row_ptr.push(0);
        for i in 0..n {
            for j in 0..n {
                let v = m[(i, j)];
                if i == j || v.abs() > drop_tol {
                    col_indices.push(j);
                    values.push(v);
                }
            }
            row_ptr.push(values.len());
        }

        Ok(Self {
            nrows: n,
            row_ptr,
            col_indices,
            values,
        })
    }

    /// Build from `(row, col, value)` triplets. Duplicate positions are summed.
    pub fn from_triplets(n: usize, triplets: &[(usize, usize, f64)]) -> Result<Self> {
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for &(i, j, v) in triplets {
            if i >= n || j >= n {
                return Err(OperatorError::EntryOutOfBounds {
                    row: i,
                    col: j,
                    size: n,
                });
            }
            rows[i].push((j, v));
        }

        let mut row_ptr = Vec::with_capacity(n + 1);
        let mut col_indices = Vec::with_capacity(triplets.len());
        let mut values = Vec::with_capacity(triplets.len());
        row_ptr.push(0);

        for row in &mut rows {
            row.sort_by_key(|&(j, _)| j);
            let mut last: Option<usize> = None;
            for &(j, v) in row.iter() {
                if last == Some(j) {
                    if let Some(acc) = values.last_mut() {
                        *acc += v;
                    }
                } else {
                    col_indices.push(j);
                    values.push(v);
                    last = Some(j);
                }
            }
            row_ptr.push(values.len());
        }

        Ok(Self {
            nrows: n,
            row_ptr,
            col_indices,
            values,
        })
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Compute y = A * x.
    pub fn matvec(&self, x: &[f64]) -> Vec<f64> {
        let mut y = vec![0.0; self.nrows];
        for (i, yi) in y.iter_mut().enumerate() {
            let start = self.row_ptr[i];
            let end = self.row_ptr[i + 1];
            let mut sum = 0.0;
            for idx in start..end {
                sum += self.values[idx] * x[self.col_indices[idx]];
            }
            *yi = sum;
        }
        y
    }
}

impl LinearOperator for CsrMatrix {
    fn rows(&self) -> usize {
        self.nrows
    }

    fn diagonal(&self) -> DVec {
        let mut diag = DVec::zeros(self.nrows);
        for i in 0..self.nrows {
            for idx in self.row_ptr[i]..self.row_ptr[i + 1] {
                if self.col_indices[idx] == i {
                    diag[i] += self.values[idx];
                }
            }
        }
        diag
    }

    fn apply(&self, x: &DMat) -> DMat {
        assert_eq!(x.nrows(), self.nrows, "CsrMatrix::apply: block has wrong row count");
        if x.ncols() == 0 {
            return DMat::zeros(self.nrows, 0);
        }

        let columns: Vec<DVec> = (0..x.ncols())
            .into_par_iter()
            .map(|j| {
                let xj = x.column(j).into_owned();
                DVec::from_vec(self.matvec(xj.as_slice()))
            })
            .collect();
        DMat::from_columns(&columns)
    }

    fn apply_vec(&self, x: &DVec) -> DVec {
        DVec::from_vec(self.matvec(x.as_slice()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn sparse_symmetric(n: usize, seed: u64) -> DMat {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut m = DMat::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0 + i as f64;
            if i + 3 < n {
                let v = rng.r#gen::<f64>() * 0.1;
                m[(i, i + 3)] = v;
                m[(i + 3, i)] = v;
            }
        }
        m
    }

    #[test]
    fn test_from_dense_roundtrip_product() {
        let dense = sparse_symmetric(12, 1);
        let csr = CsrMatrix::from_dense(&dense, 0.0).unwrap();

        assert_eq!(csr.nnz(), 12 + 2 * 9);
        let x = DMat::from_fn(12, 4, |i, j| ((i + 2 * j) as f64).sin());
        assert!((csr.apply(&x) - &dense * &x).amax() < 1e-14);
        assert_eq!(csr.diagonal(), dense.diagonal());
    }

    #[test]
    fn test_from_triplets_sums_duplicates() {
        let csr = CsrMatrix::from_triplets(3, &[(0, 0, 1.0), (2, 1, 4.0), (0, 0, 2.0), (1, 2, -1.0)]).unwrap();
        assert_eq!(csr.nnz(), 3);
        let y = csr.matvec(&[1.0, 1.0, 1.0]);
        assert_eq!(y, vec![3.0, -1.0, 4.0]);
        assert_eq!(csr.diagonal()[0], 3.0);
        assert_eq!(csr.diagonal()[1], 0.0);
    }

    #[test]
    fn test_from_triplets_out_of_bounds() {
        let err = CsrMatrix::from_triplets(2, &[(0, 2, 1.0)]).unwrap_err();
        assert_eq!(err, OperatorError::EntryOutOfBounds { row: 0, col: 2, size: 2 });
    }

    #[test]
    fn test_from_dense_rejects_rectangular() {
        assert!(CsrMatrix::from_dense(&DMat::zeros(2, 3), 0.0).is_err());
    }

    #[test]
    fn test_to_dense_matches() {
        let dense = sparse_symmetric(6, 2);
        let csr = CsrMatrix::from_dense(&dense, 1e-300).unwrap();
        assert!((csr.to_dense() - dense).amax() < 1e-15);
    }
}
