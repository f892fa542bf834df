//! Rate-adaptive LDPC codes for syndrome coding.
//!
//! A [`RateAdaptiveCode`] holds the Tanner adjacency of a mother
//! parity-check matrix together with an ordered list of row pairs. Applying
//! k rate-adaption steps replaces the 2k paired mother rows with their k
//! GF(2) sums, shortening the syndrome from M to M−k bits without touching
//! the column count. Both parties derive the same reduced code as long as
//! they agree on the pair list and on k.

use tracing::debug;
use thiserror::Error;

use crate::qc_matrix::QcMatrix;
use crate::sparse_matrix::BinaryCsc;
use crate::tanner::Adjacency;

#[derive(Error, Debug)]
pub enum CodeError {
    #[error("Input length {got} does not match block length {expected}")]
    InputLengthMismatch { expected: usize, got: usize },
    #[error("Syndrome length {got} does not match current row count {expected}")]
    SyndromeLengthMismatch { expected: usize, got: usize },
    #[error("Requested {requested} rate-adaption steps but only {max} are available")]
    RateOutOfRange { requested: usize, max: usize },
    #[error("Requested syndrome length {requested} is outside the supported range [{min}, {max}]")]
    SyndromeLengthOutOfRange { requested: usize, min: usize, max: usize },
    #[error("Rate-adaption row list has odd length {len}")]
    OddPairList { len: usize },
    #[error("Rate-adaption pair {pair} references row {row}, but the mother matrix has {n_rows} rows")]
    PairIndexOutOfRange { pair: usize, row: u32, n_rows: usize },
}

/// Ordered list of mother-matrix row pairs, interpreted prefix-wise:
/// k rate-adaption steps combine exactly the first k pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateAdaption {
    pairs: Vec<(u32, u32)>,
}

impl RateAdaption {
    pub fn from_pairs(pairs: Vec<(u32, u32)>) -> Self {
        Self { pairs }
    }

    /// Builds from a flat row list `[a0, b0, a1, b1, …]`, rejecting odd
    /// lengths.
    pub fn from_flat(rows: Vec<u32>) -> Result<Self, CodeError> {
        if rows.len() % 2 != 0 {
            return Err(CodeError::OddPairList { len: rows.len() });
        }
        Ok(Self {
            pairs: rows.chunks_exact(2).map(|c| (c[0], c[1])).collect(),
        })
    }

    /// Maximum number of rate-adaption steps K.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(u32, u32)] {
        &self.pairs
    }

    /// Applies k combination steps to a mother syndrome.
    ///
    /// The first M−2k output bits are the mother bits whose rows are not
    /// touched by the first k pairs, in ascending row order; the last k bits
    /// are the pairwise XORs, in pair order. Rows repeated across pairs
    /// always read the original mother bit.
    pub fn apply(&self, mother_syndrome: &[u8], steps: usize) -> Result<Vec<u8>, CodeError> {
        if steps > self.pairs.len() {
            return Err(CodeError::RateOutOfRange {
                requested: steps,
                max: self.pairs.len(),
            });
        }
        let m = mother_syndrome.len();
        let mut used = vec![false; m];
        for (pair, &(a, b)) in self.pairs[..steps].iter().enumerate() {
            for row in [a, b] {
                if row as usize >= m {
                    return Err(CodeError::PairIndexOutOfRange { pair, row, n_rows: m });
                }
                used[row as usize] = true;
            }
        }

        let mut out = Vec::with_capacity(m.saturating_sub(steps));
        for (row, &bit) in mother_syndrome.iter().enumerate() {
            if !used[row] {
                out.push(bit);
            }
        }
        for &(a, b) in &self.pairs[..steps] {
            out.push(mother_syndrome[a as usize] ^ mother_syndrome[b as usize]);
        }
        Ok(out)
    }
}

/// What to do when the XOR of two combined rows cancels to empty support.
///
/// Such a row carries no parity information. The default keeps it as a
/// zero row so the syndrome length stays exactly M−k.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZeroRowPolicy {
    #[default]
    Keep,
    Drop,
}

/// A mother LDPC code plus rate-adaption state.
///
/// The mother adjacency and the pair list are fixed at construction; only
/// the derived current-rate adjacency changes on [`RateAdaptiveCode::set_rate`].
#[derive(Debug, Clone)]
pub struct RateAdaptiveCode {
    mother_varn: Adjacency,
    n_cols: usize,
    n_mother_rows: usize,
    adaption: RateAdaption,
    zero_row_policy: ZeroRowPolicy,
    current_steps: usize,
    pos_varn: Adjacency,
    pos_checkn: Adjacency,
}

impl RateAdaptiveCode {
    /// A code without rate adaption.
    pub fn new(matrix: &BinaryCsc) -> Self {
        Self::from_mother(
            Adjacency::checks_of(matrix),
            matrix.n_cols(),
            RateAdaption::from_pairs(Vec::new()),
            0,
            ZeroRowPolicy::default(),
        )
        .expect("zero initial steps are always in range")
    }

    /// A code with a rate-adaption pair list, starting at `initial_steps`
    /// row combinations.
    pub fn with_rate_adaption(
        matrix: &BinaryCsc,
        adaption: RateAdaption,
        initial_steps: usize,
    ) -> Result<Self, CodeError> {
        Self::from_mother(
            Adjacency::checks_of(matrix),
            matrix.n_cols(),
            adaption,
            initial_steps,
            ZeroRowPolicy::default(),
        )
    }

    /// A code whose mother adjacency is derived from the quasi-cyclic
    /// exponent rules, without materializing the expanded binary matrix.
    pub fn from_qc(qc: &QcMatrix) -> Self {
        Self::from_mother(
            qc.check_adjacency(),
            qc.expanded_cols(),
            RateAdaption::from_pairs(Vec::new()),
            0,
            ZeroRowPolicy::default(),
        )
        .expect("zero initial steps are always in range")
    }

    pub fn from_qc_with_rate_adaption(
        qc: &QcMatrix,
        adaption: RateAdaption,
        initial_steps: usize,
    ) -> Result<Self, CodeError> {
        Self::from_mother(
            qc.check_adjacency(),
            qc.expanded_cols(),
            adaption,
            initial_steps,
            ZeroRowPolicy::default(),
        )
    }

    fn from_mother(
        mother_varn: Adjacency,
        n_cols: usize,
        adaption: RateAdaption,
        initial_steps: usize,
        zero_row_policy: ZeroRowPolicy,
    ) -> Result<Self, CodeError> {
        let n_mother_rows = mother_varn.n_rows();
        for (pair, &(a, b)) in adaption.pairs().iter().enumerate() {
            for row in [a, b] {
                if row as usize >= n_mother_rows {
                    return Err(CodeError::PairIndexOutOfRange {
                        pair,
                        row,
                        n_rows: n_mother_rows,
                    });
                }
            }
        }

        let mut code = Self {
            mother_varn,
            n_cols,
            n_mother_rows,
            adaption,
            zero_row_policy,
            current_steps: usize::MAX, // forces the initial recompute
            pos_varn: Adjacency::with_capacity(0, 0),
            pos_checkn: Adjacency::with_capacity(0, 0),
        };
        code.set_rate(initial_steps)?;
        Ok(code)
    }

    // ------------------------------------------------------------ accessors

    /// Mother row count M, ignoring rate adaption.
    pub fn n_mother_rows(&self) -> usize {
        self.n_mother_rows
    }

    /// Row count of the currently derived code (the expected syndrome
    /// length).
    pub fn n_rows_at_current_rate(&self) -> usize {
        self.pos_varn.n_rows()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Maximum number of rate-adaption steps K.
    pub fn max_rate_adaption_steps(&self) -> usize {
        self.adaption.len()
    }

    pub fn current_rate_adaption_steps(&self) -> usize {
        self.current_steps
    }

    pub fn zero_row_policy(&self) -> ZeroRowPolicy {
        self.zero_row_policy
    }

    /// Variable nodes incident to check node `i` of the current code.
    pub fn vars_for_check(&self, i: usize) -> &[u32] {
        self.pos_varn.row(i)
    }

    /// Check nodes of the current code incident to variable node `j`.
    pub fn checks_for_var(&self, j: usize) -> &[u32] {
        self.pos_checkn.row(j)
    }

    pub(crate) fn pos_varn(&self) -> &Adjacency {
        &self.pos_varn
    }

    pub(crate) fn pos_checkn(&self) -> &Adjacency {
        &self.pos_checkn
    }

    // ----------------------------------------------------------- rate state

    /// Changes the policy for combined rows with empty support and rebuilds
    /// the current adjacency under the new policy.
    pub fn set_zero_row_policy(&mut self, policy: ZeroRowPolicy) {
        if policy != self.zero_row_policy {
            self.zero_row_policy = policy;
            self.recompute_adjacency(self.current_steps);
        }
    }

    /// Transitions to `steps` row combinations by recomputing the current
    /// adjacency from the mother adjacency. Idempotent; requesting the
    /// current state is a no-op.
    pub fn set_rate(&mut self, steps: usize) -> Result<(), CodeError> {
        if steps > self.adaption.len() {
            return Err(CodeError::RateOutOfRange {
                requested: steps,
                max: self.adaption.len(),
            });
        }
        if steps == self.current_steps {
            return Ok(());
        }
        self.recompute_adjacency(steps);
        debug!(
            steps,
            rows = self.pos_varn.n_rows(),
            "rate adaption recomputed"
        );
        Ok(())
    }

    fn recompute_adjacency(&mut self, steps: usize) {
        let mut used = vec![false; self.n_mother_rows];
        for &(a, b) in &self.adaption.pairs()[..steps] {
            used[a as usize] = true;
            used[b as usize] = true;
        }

        let mut varn = Adjacency::with_capacity(
            self.n_mother_rows.saturating_sub(steps),
            self.mother_varn.n_edges(),
        );
        for (row, &row_used) in used.iter().enumerate() {
            if !row_used {
                varn.push_row(self.mother_varn.row(row));
            }
        }
        let mut combined = Vec::new();
        for &(a, b) in &self.adaption.pairs()[..steps] {
            symmetric_difference(
                self.mother_varn.row(a as usize),
                self.mother_varn.row(b as usize),
                &mut combined,
            );
            if combined.is_empty() && self.zero_row_policy == ZeroRowPolicy::Drop {
                debug!(rows = ?(a, b), "dropping cancelled row combination");
                continue;
            }
            varn.push_row(&combined);
        }

        self.pos_checkn = varn.transpose(self.n_cols);
        self.pos_varn = varn;
        self.current_steps = steps;
    }

    // ------------------------------------------------------------- encoders

    /// Syndrome of `x` under the mother matrix, ignoring rate adaption.
    pub fn encode_mother(&self, x: &[u8]) -> Result<Vec<u8>, CodeError> {
        self.check_input_len(x)?;
        Ok(xor_rows(&self.mother_varn, x, self.n_mother_rows))
    }

    /// Rate-adapted syndrome of length `out_len`, computed from the mother
    /// syndrome. Does not change the internal rate state.
    pub fn encode_with_rate(&self, x: &[u8], out_len: usize) -> Result<Vec<u8>, CodeError> {
        self.check_input_len(x)?;
        let (m, k_max) = (self.n_mother_rows, self.adaption.len());
        let min = m.saturating_sub(k_max);
        if out_len > m || out_len < min {
            return Err(CodeError::SyndromeLengthOutOfRange {
                requested: out_len,
                min,
                max: m,
            });
        }
        let mother = xor_rows(&self.mother_varn, x, m);
        self.adaption.apply(&mother, m - out_len)
    }

    /// Syndrome of `x` under the currently derived code, read straight off
    /// the current adjacency.
    pub fn encode_at_current_rate(&self, x: &[u8]) -> Result<Vec<u8>, CodeError> {
        self.check_input_len(x)?;
        Ok(xor_rows(&self.pos_varn, x, self.pos_varn.n_rows()))
    }

    pub(crate) fn check_input_len(&self, x: &[u8]) -> Result<(), CodeError> {
        if x.len() != self.n_cols {
            return Err(CodeError::InputLengthMismatch {
                expected: self.n_cols,
                got: x.len(),
            });
        }
        Ok(())
    }
}

/// XOR of the input bits over each row's support.
fn xor_rows(rows: &Adjacency, x: &[u8], n_rows: usize) -> Vec<u8> {
    let mut out = vec![0u8; n_rows];
    for (i, out_bit) in out.iter_mut().enumerate() {
        let mut acc = 0u8;
        for &var in rows.row(i) {
            acc ^= (x[var as usize] != 0) as u8;
        }
        *out_bit = acc;
    }
    out
}

/// Merges two sorted index lists into their symmetric difference, the
/// support of the GF(2) row sum.
fn symmetric_difference(a: &[u32], b: &[u32], out: &mut Vec<u32>) {
    out.clear();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
}
