//! Self-contained demonstration of syndrome-based error correction.
//!
//! A encodes its string into a 3-bit syndrome; B, holding a one-bit-flipped
//! copy, reconstructs A's string from the syndrome and its channel LLRs.
//! Exits non-zero iff the decoder failed to converge or reconstructed the
//! wrong string.

use std::process::ExitCode;

use ldpc_reconciliation::simulation::bsc_llrs;
use ldpc_reconciliation::{BinaryCsc, LdpcError, RateAdaptiveCode};

fn run() -> Result<bool, LdpcError> {
    // H = [1 0 1 0 1 0 1
    //      0 1 1 0 0 1 1
    //      0 0 0 1 1 1 1]
    let h = BinaryCsc::from_parts(
        vec![0, 1, 2, 4, 5, 7, 9, 12],
        vec![0, 1, 0, 1, 2, 0, 2, 1, 2, 0, 1, 2],
    )?;
    let code = RateAdaptiveCode::new(&h);

    let x = [1u8, 1, 1, 1, 0, 0, 0]; // true data to be sent
    let syndrome = code.encode_mother(&x)?;

    let x_noised = [1u8, 1, 1, 1, 0, 0, 1]; // distorted data
    let p = 1.0 / 7.0; // channel error probability (one flip out of seven)
    let llrs = bsc_llrs(&x_noised, p);

    let outcome = code.decode_at_current_rate(&llrs, &syndrome, 50, 100.0)?;

    println!(
        "decoder converged: {} (after {} iterations)",
        outcome.converged, outcome.iterations
    );
    println!("prediction matches: {}", outcome.bits == x);

    Ok(outcome.converged && outcome.bits == x)
}

fn main() -> ExitCode {
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
