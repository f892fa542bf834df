//! Rate-adaptive LDPC syndrome coding for QKD information reconciliation.
//!
//! Two parties hold correlated N-bit strings: B's string is A's string
//! passed through a binary symmetric channel. A sends the syndrome of its
//! string under a sparse parity-check matrix over a noise-free channel; B
//! recovers A's string with a syndrome-conditioned belief-propagation
//! decoder. Rate adaption shortens the syndrome on demand by combining
//! parity-check rows pairwise, without re-deriving the code.
//!
//! ```
//! use ldpc_reconciliation::{BinaryCsc, RateAdaptiveCode};
//! use ldpc_reconciliation::simulation::bsc_llrs;
//!
//! // H = [1 0 1 0 1 0 1; 0 1 1 0 0 1 1; 0 0 0 1 1 1 1] in CSC form.
//! let h = BinaryCsc::from_parts(
//!     vec![0, 1, 2, 4, 5, 7, 9, 12],
//!     vec![0, 1, 0, 1, 2, 0, 2, 1, 2, 0, 1, 2],
//! )?;
//! let code = RateAdaptiveCode::new(&h);
//!
//! let x = [1u8, 1, 1, 1, 0, 0, 0];           // A's string
//! let syndrome = code.encode_mother(&x)?;     // sent over the side channel
//!
//! let x_noised = [1u8, 1, 1, 1, 0, 0, 1];     // B's string, one bit flipped
//! let llrs = bsc_llrs(&x_noised, 1.0 / 7.0);
//!
//! let outcome = code.decode_at_current_rate(&llrs, &syndrome, 50, 100.0)?;
//! assert!(outcome.converged);
//! assert_eq!(outcome.bits, x);
//! # Ok::<(), ldpc_reconciliation::LdpcError>(())
//! ```

pub mod construction;
pub mod decoder;
pub mod file_formats;
pub mod qc_matrix;
pub mod rate_adaptive;
pub mod simulation;
pub mod sparse_matrix;
pub mod tanner;

// Re-export main types
pub use construction::{ConstructionError, DegreeDistribution};
pub use decoder::DecodeOutcome;
pub use file_formats::FormatError;
pub use qc_matrix::{QcError, QcMatrix};
pub use rate_adaptive::{CodeError, RateAdaption, RateAdaptiveCode, ZeroRowPolicy};
pub use sparse_matrix::{BinaryCsc, SparseError};
pub use tanner::Adjacency;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LdpcError {
    #[error("Sparse matrix error: {0}")]
    SparseMatrix(#[from] sparse_matrix::SparseError),
    #[error("QC matrix error: {0}")]
    QcMatrix(#[from] qc_matrix::QcError),
    #[error("Code error: {0}")]
    Code(#[from] rate_adaptive::CodeError),
    #[error("Format error: {0}")]
    Format(#[from] file_formats::FormatError),
    #[error("Construction error: {0}")]
    Construction(#[from] construction::ConstructionError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
