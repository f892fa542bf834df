use thiserror::Error;

#[derive(Error, Debug)]
pub enum SparseError {
    #[error("Matrix has no stored entries")]
    EmptyMatrix,
    #[error("Column pointer array is invalid: {0}")]
    BadColumnPointers(String),
    #[error("Column {col} has unsorted or duplicate row indices")]
    UnsortedColumn { col: usize },
    #[error("Input length {got} does not match column count {expected}")]
    InputLengthMismatch { expected: usize, got: usize },
}

/// Binary M×N parity-check matrix in compressed sparse column (CSC) form.
///
/// Only the positions of ones are stored: `col_ptr` has length N+1 and
/// `row_idx[col_ptr[c]..col_ptr[c+1]]` lists the rows of the ones in
/// column c, strictly increasing. The row count is implied by the largest
/// stored row index. Constructed once and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryCsc {
    n_rows: usize,
    n_cols: usize,
    col_ptr: Vec<u32>,
    row_idx: Vec<u32>,
}

impl BinaryCsc {
    /// Builds a matrix from raw CSC arrays, validating the storage invariants.
    pub fn from_parts(col_ptr: Vec<u32>, row_idx: Vec<u32>) -> Result<Self, SparseError> {
        if col_ptr.is_empty() {
            return Err(SparseError::BadColumnPointers(
                "column pointer array is empty".to_string(),
            ));
        }
        if col_ptr[0] != 0 {
            return Err(SparseError::BadColumnPointers(format!(
                "first column pointer is {}, expected 0",
                col_ptr[0]
            )));
        }
        if col_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(SparseError::BadColumnPointers(
                "column pointers are not non-decreasing".to_string(),
            ));
        }
        let nnz = *col_ptr.last().unwrap() as usize;
        if nnz != row_idx.len() {
            return Err(SparseError::BadColumnPointers(format!(
                "last column pointer is {} but {} row indices are stored",
                nnz,
                row_idx.len()
            )));
        }
        if row_idx.is_empty() {
            return Err(SparseError::EmptyMatrix);
        }

        let n_cols = col_ptr.len() - 1;
        for col in 0..n_cols {
            let entries = &row_idx[col_ptr[col] as usize..col_ptr[col + 1] as usize];
            if entries.windows(2).any(|w| w[0] >= w[1]) {
                return Err(SparseError::UnsortedColumn { col });
            }
        }

        let n_rows = *row_idx.iter().max().unwrap() as usize + 1;

        Ok(Self {
            n_rows,
            n_cols,
            col_ptr,
            row_idx,
        })
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Number of stored ones.
    pub fn nnz(&self) -> usize {
        self.row_idx.len()
    }

    /// Row indices of the ones in column `col`, strictly increasing.
    pub fn col(&self, col: usize) -> &[u32] {
        &self.row_idx[self.col_ptr[col] as usize..self.col_ptr[col + 1] as usize]
    }

    /// Number of ones in column `col`.
    pub fn col_weight(&self, col: usize) -> usize {
        (self.col_ptr[col + 1] - self.col_ptr[col]) as usize
    }

    pub fn col_ptr(&self) -> &[u32] {
        &self.col_ptr
    }

    pub fn row_idx(&self) -> &[u32] {
        &self.row_idx
    }

    /// Sparse GF(2) matrix-vector product: the syndrome `H·x mod 2`.
    ///
    /// Any nonzero input byte counts as a one. The input length must equal
    /// the column count.
    pub fn syndrome(&self, x: &[u8]) -> Result<Vec<u8>, SparseError> {
        if x.len() != self.n_cols {
            return Err(SparseError::InputLengthMismatch {
                expected: self.n_cols,
                got: x.len(),
            });
        }
        let mut out = vec![0u8; self.n_rows];
        for (col, &bit) in x.iter().enumerate() {
            if bit != 0 {
                for &row in self.col(col) {
                    out[row as usize] ^= 1;
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // H = [1 0 1 0 1 0 1
    //      0 1 1 0 0 1 1
    //      0 0 0 1 1 1 1]
    fn toy_matrix() -> BinaryCsc {
        BinaryCsc::from_parts(
            vec![0, 1, 2, 4, 5, 7, 9, 12],
            vec![0, 1, 0, 1, 2, 0, 2, 1, 2, 0, 1, 2],
        )
        .unwrap()
    }

    #[test]
    fn test_dimensions_from_parts() {
        let h = toy_matrix();
        assert_eq!(h.n_rows(), 3);
        assert_eq!(h.n_cols(), 7);
        assert_eq!(h.nnz(), 12);
        assert_eq!(h.col(2), &[0, 1]);
        assert_eq!(h.col_weight(6), 3);
    }

    #[test]
    fn test_rejects_bad_col_ptr() {
        assert!(BinaryCsc::from_parts(vec![], vec![]).is_err());
        assert!(BinaryCsc::from_parts(vec![1, 2], vec![0, 1]).is_err());
        assert!(BinaryCsc::from_parts(vec![0, 2, 1], vec![0, 1]).is_err());
        assert!(BinaryCsc::from_parts(vec![0, 3], vec![0, 1]).is_err());
    }

    #[test]
    fn test_rejects_unsorted_column() {
        let err = BinaryCsc::from_parts(vec![0, 2], vec![1, 0]).unwrap_err();
        assert!(matches!(err, SparseError::UnsortedColumn { col: 0 }));
        let err = BinaryCsc::from_parts(vec![0, 2], vec![1, 1]).unwrap_err();
        assert!(matches!(err, SparseError::UnsortedColumn { col: 0 }));
    }

    #[test]
    fn test_syndrome_toy() {
        let h = toy_matrix();
        let x = [1, 1, 1, 1, 0, 0, 0];
        assert_eq!(h.syndrome(&x).unwrap(), vec![0, 0, 1]);
        let x_flipped = [1, 1, 1, 1, 0, 0, 1];
        assert_eq!(h.syndrome(&x_flipped).unwrap(), vec![1, 1, 0]);
        assert_eq!(h.syndrome(&[0; 7]).unwrap(), vec![0, 0, 0]);
        assert!(h.syndrome(&[0; 6]).is_err());
    }

    #[test]
    fn test_syndrome_linearity() {
        let h = toy_matrix();
        let x = [1, 0, 1, 1, 0, 1, 0];
        let y = [0, 1, 1, 0, 1, 1, 1];
        let mut xy = [0u8; 7];
        for i in 0..7 {
            xy[i] = x[i] ^ y[i];
        }
        let sx = h.syndrome(&x).unwrap();
        let sy = h.syndrome(&y).unwrap();
        let sxy = h.syndrome(&xy).unwrap();
        let combined: Vec<u8> = sx.iter().zip(&sy).map(|(a, b)| a ^ b).collect();
        assert_eq!(sxy, combined);
    }
}
