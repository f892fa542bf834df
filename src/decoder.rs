//! Belief-propagation decoder: sum-product algorithm with a flooding
//! schedule on the current-rate Tanner graph.
//!
//! The decoder is syndrome-conditioned: check node i enforces parity
//! `s_i` rather than 0, which is what turns the code into a Slepian–Wolf
//! decoder. Messages travel along the graph edges in two flattened buffers,
//! `msg_v` grouped by check node and `msg_c` grouped by variable node.
//! Routing between the two groupings uses deposit-order cursors: nodes are
//! visited in ascending index order and every adjacency list is sorted, so
//! the t-th message deposited for a node lands in its t-th edge slot.

use tracing::debug;

use crate::rate_adaptive::{CodeError, RateAdaptiveCode};
use crate::tanner::Adjacency;

/// Result of a decode call.
///
/// Non-convergence is an ordinary outcome, not an error: `bits` then holds
/// the last hard decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Hard decision for the N-bit string.
    pub bits: Vec<u8>,
    /// True iff the decision's syndrome matches the given syndrome.
    pub converged: bool,
    /// Iterations spent, counting the one that converged.
    pub iterations: u32,
}

impl RateAdaptiveCode {
    /// Runs sum-product decoding against the current rate state.
    ///
    /// `llrs` are the channel log-likelihood ratios (positive favors bit 0),
    /// `syndrome` must have the current-rate length. Messages are saturated
    /// to `[-vsat, vsat]` after every half-iteration; iteration stops early
    /// as soon as the hard decision reproduces the syndrome, or when a
    /// message turns NaN (divergence).
    pub fn decode_at_current_rate(
        &self,
        llrs: &[f64],
        syndrome: &[u8],
        max_iter: u32,
        vsat: f64,
    ) -> Result<DecodeOutcome, CodeError> {
        if llrs.len() != self.n_cols() {
            return Err(CodeError::InputLengthMismatch {
                expected: self.n_cols(),
                got: llrs.len(),
            });
        }
        let n_checks = self.n_rows_at_current_rate();
        if syndrome.len() != n_checks {
            return Err(CodeError::SyndromeLengthMismatch {
                expected: n_checks,
                got: syndrome.len(),
            });
        }

        let varn = self.pos_varn();
        let checkn = self.pos_checkn();

        // Variable-to-check messages start out as the channel LLRs.
        let mut msg_v = vec![0.0f64; varn.n_edges()];
        for i in 0..n_checks {
            for (slot, &v) in varn.range(i).zip(varn.row(i)) {
                msg_v[slot] = llrs[v as usize];
            }
        }
        let mut msg_c = vec![0.0f64; checkn.n_edges()];

        let mut decision = vec![0u8; llrs.len()];
        let mut mc_cursor = vec![0u32; llrs.len()];
        let mut mv_cursor = vec![0u32; n_checks];

        for iteration in 1..=max_iter {
            check_node_update(&mut msg_c, &msg_v, syndrome, varn, checkn, &mut mc_cursor);
            saturate(&mut msg_c, vsat);

            var_node_update(&mut msg_v, &msg_c, llrs, varn, checkn, &mut mv_cursor);
            saturate(&mut msg_v, vsat);

            hard_decision(&mut decision, llrs, &msg_c, checkn);

            let decision_syndrome = self.encode_at_current_rate(&decision)?;
            if decision_syndrome == syndrome {
                return Ok(DecodeOutcome {
                    bits: decision,
                    converged: true,
                    iterations: iteration,
                });
            }

            if msg_v.iter().any(|m| m.is_nan()) {
                debug!(iteration, "decoder diverged to NaN");
                return Ok(DecodeOutcome {
                    bits: decision,
                    converged: false,
                    iterations: iteration,
                });
            }
        }

        Ok(DecodeOutcome {
            bits: decision,
            converged: false,
            iterations: max_iter,
        })
    }

    /// Decodes after inferring the rate from the syndrome length.
    ///
    /// If the syndrome is shorter or longer than the current-rate row
    /// count, the code first transitions to `M − len(syndrome)` row
    /// combinations; this mutates the rate state.
    pub fn decode_infer_rate(
        &mut self,
        llrs: &[f64],
        syndrome: &[u8],
        max_iter: u32,
        vsat: f64,
    ) -> Result<DecodeOutcome, CodeError> {
        if syndrome.len() != self.n_rows_at_current_rate() {
            let m = self.n_mother_rows();
            let min = m.saturating_sub(self.max_rate_adaption_steps());
            if syndrome.len() < min || syndrome.len() > m {
                return Err(CodeError::SyndromeLengthOutOfRange {
                    requested: syndrome.len(),
                    min,
                    max: m,
                });
            }
            self.set_rate(m - syndrome.len())?;
        }
        self.decode_at_current_rate(llrs, syndrome, max_iter, vsat)
    }
}

/// Check-node half of an iteration.
///
/// For check i with parity s_i, the message to its k-th neighbor is the
/// log-ratio of `P / tanh(msg_k/2)` where P is the signed product of all
/// incoming tanh values. A zero denominator falls back to the explicit
/// product over the other neighbors.
fn check_node_update(
    msg_c: &mut [f64],
    msg_v: &[f64],
    syndrome: &[u8],
    varn: &Adjacency,
    checkn: &Adjacency,
    mc_cursor: &mut [u32],
) {
    mc_cursor.fill(0);

    for i in 0..varn.n_rows() {
        let incoming = &msg_v[varn.range(i)];
        let sign = 1.0 - 2.0 * (syndrome[i] != 0) as u8 as f64;

        let mut product = sign;
        for &m in incoming {
            product *= (0.5 * m).tanh();
        }

        for (k, &v) in varn.row(i).iter().enumerate() {
            let denominator = (0.5 * incoming[k]).tanh();
            let part = if denominator == 0.0 {
                let mut p = sign;
                for (other, &m) in incoming.iter().enumerate() {
                    if other != k {
                        p *= (0.5 * m).tanh();
                    }
                }
                p
            } else {
                product / denominator
            };
            let message = ((1.0 + part) / (1.0 - part)).ln();

            let v = v as usize;
            let slot = checkn.range(v).start + mc_cursor[v] as usize;
            msg_c[slot] = message;
            mc_cursor[v] += 1;
        }
    }
}

/// Variable-node half of an iteration: each outgoing message is the total
/// belief minus the addressee's own contribution.
fn var_node_update(
    msg_v: &mut [f64],
    msg_c: &[f64],
    llrs: &[f64],
    varn: &Adjacency,
    checkn: &Adjacency,
    mv_cursor: &mut [u32],
) {
    mv_cursor.fill(0);

    for j in 0..checkn.n_rows() {
        let incoming = &msg_c[checkn.range(j)];
        let total: f64 = llrs[j] + incoming.iter().sum::<f64>();

        for (k, &i) in checkn.row(j).iter().enumerate() {
            let i = i as usize;
            let slot = varn.range(i).start + mv_cursor[i] as usize;
            msg_v[slot] = total - incoming[k];
            mv_cursor[i] += 1;
        }
    }
}

/// Bit j is decided 1 iff its total belief is negative.
fn hard_decision(decision: &mut [u8], llrs: &[f64], msg_c: &[f64], checkn: &Adjacency) {
    for (j, bit) in decision.iter_mut().enumerate() {
        let total: f64 = llrs[j] + msg_c[checkn.range(j)].iter().sum::<f64>();
        *bit = (total < 0.0) as u8;
    }
}

/// Clamps every message into `[-vsat, vsat]`, keeping `tanh(m/2)` away
/// from ±1 so the check-node log-ratio stays finite.
fn saturate(messages: &mut [f64], vsat: f64) {
    for m in messages.iter_mut() {
        if *m > vsat {
            *m = vsat;
        } else if *m < -vsat {
            *m = -vsat;
        }
    }
}
