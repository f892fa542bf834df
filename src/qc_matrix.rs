//! Quasi-cyclic parity-check matrices in exponent form.
//!
//! A QC matrix is a compact description of a binary matrix built from Z×Z
//! blocks: a stored exponent v at block position (i, j) stands for the Z×Z
//! identity cyclically right-shifted by v, an absent position for the zero
//! block. The exponent matrix itself is kept in CSC form. Syndromes can be
//! computed directly from the exponents, without ever materializing the
//! expanded binary matrix.

use thiserror::Error;

use crate::sparse_matrix::{BinaryCsc, SparseError};
use crate::tanner::Adjacency;

#[derive(Error, Debug)]
pub enum QcError {
    #[error("Expansion factor must be positive")]
    ZeroExpansionFactor,
    #[error("Shift exponent {exponent} at entry {entry} is not below the expansion factor {z}")]
    ExponentOutOfRange { entry: usize, exponent: u32, z: usize },
    #[error("Exponent array length {exponents} does not match row index length {rows}")]
    LengthMismatch { exponents: usize, rows: usize },
    #[error(transparent)]
    Storage(#[from] SparseError),
    #[error("Input length {got} does not match expanded column count {expected}")]
    InputLengthMismatch { expected: usize, got: usize },
}

/// Sparse matrix of cyclic-shift exponents plus the expansion factor Z.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QcMatrix {
    z: usize,
    block_rows: usize,
    block_cols: usize,
    col_ptr: Vec<u32>,
    row_idx: Vec<u32>,
    exponents: Vec<u32>,
}

impl QcMatrix {
    /// Builds a QC matrix from CSC exponent storage.
    ///
    /// `col_ptr` and `row_idx` describe the block structure exactly like a
    /// [`BinaryCsc`]; `exponents` holds the shift of each stored block and
    /// must be elementwise below `z`.
    pub fn from_parts(
        z: usize,
        col_ptr: Vec<u32>,
        row_idx: Vec<u32>,
        exponents: Vec<u32>,
    ) -> Result<Self, QcError> {
        if z == 0 {
            return Err(QcError::ZeroExpansionFactor);
        }
        if exponents.len() != row_idx.len() {
            return Err(QcError::LengthMismatch {
                exponents: exponents.len(),
                rows: row_idx.len(),
            });
        }
        if let Some(entry) = exponents.iter().position(|&v| v as usize >= z) {
            return Err(QcError::ExponentOutOfRange {
                entry,
                exponent: exponents[entry],
                z,
            });
        }
        // Borrow the CSC validation; the exponent structure obeys the same
        // storage invariants as a binary matrix.
        let structure = BinaryCsc::from_parts(col_ptr, row_idx)?;
        let (block_rows, block_cols) = (structure.n_rows(), structure.n_cols());
        let col_ptr = structure.col_ptr().to_vec();
        let row_idx = structure.row_idx().to_vec();

        Ok(Self {
            z,
            block_rows,
            block_cols,
            col_ptr,
            row_idx,
            exponents,
        })
    }

    pub fn expansion_factor(&self) -> usize {
        self.z
    }

    pub fn block_rows(&self) -> usize {
        self.block_rows
    }

    pub fn block_cols(&self) -> usize {
        self.block_cols
    }

    /// Row count of the implied binary matrix.
    pub fn expanded_rows(&self) -> usize {
        self.z * self.block_rows
    }

    /// Column count of the implied binary matrix.
    pub fn expanded_cols(&self) -> usize {
        self.z * self.block_cols
    }

    pub fn col_ptr(&self) -> &[u32] {
        &self.col_ptr
    }

    pub fn row_idx(&self) -> &[u32] {
        &self.row_idx
    }

    /// Shift exponent of each stored block, parallel to `row_idx`.
    pub fn exponents(&self) -> &[u32] {
        &self.exponents
    }

    fn block_col(&self, j: usize) -> impl Iterator<Item = (u32, u32)> + '_ {
        let lo = self.col_ptr[j] as usize;
        let hi = self.col_ptr[j + 1] as usize;
        self.row_idx[lo..hi]
            .iter()
            .zip(&self.exponents[lo..hi])
            .map(|(&i, &v)| (i, v))
    }

    /// The row of the expanded matrix hit by expanded column `Z·j + r`
    /// through the block at block-row `i` with shift `v`.
    fn target_row(&self, i: u32, v: u32, r: usize) -> usize {
        self.z * i as usize + (r + self.z - v as usize) % self.z
    }

    /// Expands to the equivalent binary matrix.
    ///
    /// Block (i, j) with exponent v contributes, for every r below Z, a one
    /// at row `Z·i + ((r − v) mod Z)`, column `Z·j + r`. Column entries come
    /// out sorted because distinct block rows occupy disjoint row ranges.
    pub fn expand(&self) -> Result<BinaryCsc, QcError> {
        let mut col_ptr = Vec::with_capacity(self.expanded_cols() + 1);
        let mut row_idx = Vec::with_capacity(self.row_idx.len() * self.z);
        col_ptr.push(0u32);

        for j in 0..self.block_cols {
            for r in 0..self.z {
                for (i, v) in self.block_col(j) {
                    row_idx.push(self.target_row(i, v, r) as u32);
                }
                col_ptr.push(row_idx.len() as u32);
            }
        }

        Ok(BinaryCsc::from_parts(col_ptr, row_idx)?)
    }

    /// Computes the syndrome directly from the exponent form.
    ///
    /// Bit-for-bit identical to encoding through [`QcMatrix::expand`].
    pub fn syndrome(&self, x: &[u8]) -> Result<Vec<u8>, QcError> {
        if x.len() != self.expanded_cols() {
            return Err(QcError::InputLengthMismatch {
                expected: self.expanded_cols(),
                got: x.len(),
            });
        }
        let mut out = vec![0u8; self.expanded_rows()];
        for (col, &bit) in x.iter().enumerate() {
            if bit == 0 {
                continue;
            }
            let (j, r) = (col / self.z, col % self.z);
            for (i, v) in self.block_col(j) {
                out[self.target_row(i, v, r)] ^= 1;
            }
        }
        Ok(out)
    }

    /// Check-to-variable adjacency of the expanded matrix, derived from the
    /// exponent rules alone. Walking expanded columns in ascending order
    /// keeps every list sorted.
    pub fn check_adjacency(&self) -> Adjacency {
        let mut rows: Vec<Vec<u32>> = vec![Vec::new(); self.expanded_rows()];
        for col in 0..self.expanded_cols() {
            let (j, r) = (col / self.z, col % self.z);
            for (i, v) in self.block_col(j) {
                rows[self.target_row(i, v, r)].push(col as u32);
            }
        }
        let total: usize = rows.iter().map(Vec::len).sum();
        let mut adj = Adjacency::with_capacity(rows.len(), total);
        for row in &rows {
            adj.push_row(row);
        }
        adj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Protograph [1 2 1 3; 1 . 2 5] with Z = 4 (the dot is a zero block).
    fn small_qc() -> QcMatrix {
        QcMatrix::from_parts(
            4,
            vec![0, 2, 3, 5, 7],
            vec![0, 1, 0, 0, 1, 0, 1],
            vec![1, 1, 2, 1, 2, 3, 1],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions() {
        let qc = small_qc();
        assert_eq!(qc.block_rows(), 2);
        assert_eq!(qc.block_cols(), 4);
        assert_eq!(qc.expanded_rows(), 8);
        assert_eq!(qc.expanded_cols(), 16);
    }

    #[test]
    fn test_rejects_bad_exponent() {
        let err = QcMatrix::from_parts(4, vec![0, 1], vec![0], vec![4]).unwrap_err();
        assert!(matches!(err, QcError::ExponentOutOfRange { .. }));
        assert!(QcMatrix::from_parts(0, vec![0, 1], vec![0], vec![0]).is_err());
        assert!(QcMatrix::from_parts(4, vec![0, 1], vec![0], vec![0, 1]).is_err());
    }

    #[test]
    fn test_expand_single_block() {
        // One block, shift 1: column r has its one at row (r - 1) mod 4.
        let qc = QcMatrix::from_parts(4, vec![0, 1], vec![0], vec![1]).unwrap();
        let h = qc.expand().unwrap();
        assert_eq!(h.n_rows(), 4);
        assert_eq!(h.n_cols(), 4);
        assert_eq!(h.col(0), &[3]);
        assert_eq!(h.col(1), &[0]);
        assert_eq!(h.col(2), &[1]);
        assert_eq!(h.col(3), &[2]);
    }

    #[test]
    fn test_direct_syndrome_matches_expanded() {
        let qc = small_qc();
        let h = qc.expand().unwrap();
        let x: Vec<u8> = (0..16).map(|i| ((i * 7 + 3) % 5 < 2) as u8).collect();
        assert_eq!(qc.syndrome(&x).unwrap(), h.syndrome(&x).unwrap());
        let ones = vec![1u8; 16];
        assert_eq!(qc.syndrome(&ones).unwrap(), h.syndrome(&ones).unwrap());
    }

    #[test]
    fn test_check_adjacency_matches_expanded() {
        let qc = small_qc();
        let h = qc.expand().unwrap();
        let direct = qc.check_adjacency();
        let expanded = Adjacency::checks_of(&h);
        assert_eq!(direct, expanded);
    }
}
