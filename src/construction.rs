//! Seeded pseudo-random parity-check construction.
//!
//! Production reconciliation codes come from offline optimization and are
//! loaded from files; this module builds throwaway codes for simulations
//! and tests. Columns get their degrees from a parseable distribution and
//! their check positions from a seeded ChaCha8 stream, so every code is
//! reproducible from `(n_checks, n_bits, seed, distribution)`.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::debug;

use crate::sparse_matrix::{BinaryCsc, SparseError};

#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error("Invalid degree distribution: {0}")]
    InvalidDistribution(String),
    #[error("Column degree {degree} exceeds the number of checks {n_checks}")]
    DegreeTooLarge { degree: usize, n_checks: usize },
    #[error("Need more bits ({n_bits}) than checks ({n_checks})")]
    TooFewBits { n_bits: usize, n_checks: usize },
    #[error(transparent)]
    Storage(#[from] SparseError),
}

#[derive(Debug, Clone)]
struct DegreeEntry {
    proportion: f64,
    degree: usize,
}

/// Column-degree distribution, e.g. `"3"` (all columns degree 3) or
/// `"0.3x2/0.7x3"` (30% degree 2, 70% degree 3). Proportions are
/// normalized to sum to one.
#[derive(Debug, Clone)]
pub struct DegreeDistribution {
    entries: Vec<DegreeEntry>,
}

impl DegreeDistribution {
    pub fn parse(spec: &str) -> Result<Self, ConstructionError> {
        if let Ok(degree) = spec.parse::<usize>() {
            if degree == 0 {
                return Err(ConstructionError::InvalidDistribution(
                    "degree must be positive".to_string(),
                ));
            }
            return Ok(Self {
                entries: vec![DegreeEntry {
                    proportion: 1.0,
                    degree,
                }],
            });
        }

        let mut entries = Vec::new();
        let mut sum = 0.0;
        for part in spec.split('/') {
            let (prop, degree) = part.split_once('x').ok_or_else(|| {
                ConstructionError::InvalidDistribution(format!(
                    "expected `proportion x degree`, got '{part}'"
                ))
            })?;
            let proportion: f64 = prop.parse().map_err(|_| {
                ConstructionError::InvalidDistribution(format!("bad proportion '{prop}'"))
            })?;
            let degree: usize = degree.parse().map_err(|_| {
                ConstructionError::InvalidDistribution(format!("bad degree '{degree}'"))
            })?;
            if proportion <= 0.0 || degree == 0 {
                return Err(ConstructionError::InvalidDistribution(format!(
                    "non-positive entry '{part}'"
                )));
            }
            entries.push(DegreeEntry { proportion, degree });
            sum += proportion;
        }
        if entries.is_empty() {
            return Err(ConstructionError::InvalidDistribution(
                "empty distribution".to_string(),
            ));
        }
        for entry in &mut entries {
            entry.proportion /= sum;
        }
        Ok(Self { entries })
    }

    pub fn max_degree(&self) -> usize {
        self.entries.iter().map(|e| e.degree).max().unwrap_or(0)
    }

    /// Splits `n_cols` columns between the entries, giving leftover columns
    /// to the largest fractional shares.
    fn partition(&self, n_cols: usize) -> Vec<usize> {
        let mut part = vec![0usize; self.entries.len()];
        let mut fractional = vec![0.0f64; self.entries.len()];
        let mut assigned = 0;

        for (i, entry) in self.entries.iter().enumerate() {
            let exact = entry.proportion * n_cols as f64;
            part[i] = exact.floor() as usize;
            fractional[i] = exact - part[i] as f64;
            assigned += part[i];
        }
        while assigned < n_cols {
            let mut best = 0;
            for i in 1..fractional.len() {
                if fractional[i] > fractional[best] {
                    best = i;
                }
            }
            part[best] += 1;
            fractional[best] = -1.0;
            assigned += 1;
        }
        part
    }
}

/// Builds a random sparse parity-check matrix.
///
/// Each column receives its distribution-assigned number of ones in
/// distinct random rows. A repair pass then tops up rows with fewer than
/// two ones, since degree-0 and degree-1 checks carry little or no parity
/// information.
pub fn random_code(
    n_checks: usize,
    n_bits: usize,
    seed: u64,
    distribution: &DegreeDistribution,
) -> Result<BinaryCsc, ConstructionError> {
    if n_bits <= n_checks {
        return Err(ConstructionError::TooFewBits { n_bits, n_checks });
    }
    if distribution.max_degree() > n_checks {
        return Err(ConstructionError::DegreeTooLarge {
            degree: distribution.max_degree(),
            n_checks,
        });
    }

    let mut rng = ChaCha8Rng::seed_from_u64(10 * seed + 1);
    let mut columns: Vec<Vec<u32>> = vec![Vec::new(); n_bits];
    let mut row_weights = vec![0usize; n_checks];

    let part = distribution.partition(n_bits);
    let mut entry_index = 0;
    let mut remaining = part[0];
    for column in columns.iter_mut() {
        while remaining == 0 {
            entry_index += 1;
            remaining = part[entry_index];
        }
        let degree = distribution.entries[entry_index].degree;
        for _ in 0..degree {
            loop {
                let row = rng.gen_range(0..n_checks) as u32;
                if let Err(pos) = column.binary_search(&row) {
                    column.insert(pos, row);
                    row_weights[row as usize] += 1;
                    break;
                }
            }
        }
        remaining -= 1;
    }

    // Repair pass: every check should involve at least two bits.
    let mut added = 0usize;
    for row in 0..n_checks {
        while row_weights[row] < 2 {
            let col = rng.gen_range(0..n_bits);
            let column = &mut columns[col];
            if let Err(pos) = column.binary_search(&(row as u32)) {
                column.insert(pos, row as u32);
                row_weights[row] += 1;
                added += 1;
            }
        }
    }
    if added > 0 {
        debug!(added, "topped up low-weight rows");
    }

    let mut col_ptr = Vec::with_capacity(n_bits + 1);
    let mut row_idx = Vec::new();
    col_ptr.push(0u32);
    for column in &columns {
        row_idx.extend_from_slice(column);
        col_ptr.push(row_idx.len() as u32);
    }
    Ok(BinaryCsc::from_parts(col_ptr, row_idx)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_single_degree() {
        let d = DegreeDistribution::parse("3").unwrap();
        assert_eq!(d.max_degree(), 3);
        assert_eq!(d.partition(100), vec![100]);
    }

    #[test]
    fn test_parse_mixed() {
        let d = DegreeDistribution::parse("0.3x2/0.7x3").unwrap();
        assert_eq!(d.max_degree(), 3);
        let part = d.partition(100);
        assert_eq!(part.iter().sum::<usize>(), 100);
        assert!(part[0] >= 28 && part[0] <= 32);
        assert!(part[1] >= 68 && part[1] <= 72);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(DegreeDistribution::parse("").is_err());
        assert!(DegreeDistribution::parse("0").is_err());
        assert!(DegreeDistribution::parse("0.5y3").is_err());
        assert!(DegreeDistribution::parse("-0.5x3/1.5x4").is_err());
        assert!(DegreeDistribution::parse("0.5x0").is_err());
    }

    #[test]
    fn test_random_code_shape() {
        let d = DegreeDistribution::parse("3").unwrap();
        let h = random_code(50, 100, 42, &d).unwrap();
        assert_eq!(h.n_rows(), 50);
        assert_eq!(h.n_cols(), 100);
        assert!(h.nnz() >= 300);
        for col in 0..100 {
            // Degree 3 by construction; the repair pass can only add.
            let w = h.col_weight(col);
            assert!(w >= 3, "column {col} has weight {w}");
        }

        let mut row_weights = vec![0usize; h.n_rows()];
        for col in 0..h.n_cols() {
            for &row in h.col(col) {
                row_weights[row as usize] += 1;
            }
        }
        assert!(row_weights.iter().all(|&w| w >= 2));
    }

    #[test]
    fn test_random_code_reproducible() {
        let d = DegreeDistribution::parse("0.5x2/0.5x4").unwrap();
        let a = random_code(40, 120, 7, &d).unwrap();
        let b = random_code(40, 120, 7, &d).unwrap();
        assert_eq!(a, b);
        let c = random_code(40, 120, 8, &d).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_random_code_rejects_bad_parameters() {
        let d = DegreeDistribution::parse("3").unwrap();
        assert!(matches!(
            random_code(100, 50, 1, &d),
            Err(ConstructionError::TooFewBits { .. })
        ));
        let wide = DegreeDistribution::parse("10").unwrap();
        assert!(matches!(
            random_code(5, 20, 1, &wide),
            Err(ConstructionError::DegreeTooLarge { .. })
        ));
    }
}
