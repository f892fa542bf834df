//! Readers and writers for the on-disk code formats.
//!
//! Four formats are supported: `bincsc.json` (binary CSC matrix),
//! `qccsc.json` (quasi-cyclic exponent matrix), the plain-text `alist`
//! format from the LDPC literature, and the two-column CSV listing the
//! rate-adaption row pairs. All numeric arrays in the JSON formats are
//! zero-based; alist files are one-based.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::qc_matrix::{QcError, QcMatrix};
use crate::rate_adaptive::RateAdaption;
use crate::sparse_matrix::{BinaryCsc, SparseError};
use crate::tanner::Adjacency;

/// `format` tag of a `bincsc.json` file.
pub const BINCSC_FORMAT_TAG: &str = "BINCSCJSON";
/// `format` tag of a `qccsc.json` file.
pub const QCCSC_FORMAT_TAG: &str = "COMPRESSED_SPARSE_COLUMN";

#[derive(Error, Debug)]
pub enum FormatError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown format tag '{found}', expected '{expected}'")]
    UnknownFormatTag { found: String, expected: &'static str },
    #[error("Malformed input: {0}")]
    Malformed(String),
    #[error(transparent)]
    Storage(#[from] SparseError),
    #[error(transparent)]
    Qc(#[from] QcError),
}

// ------------------------------------------------------------- bincsc.json

#[derive(Serialize, Deserialize)]
struct BincscFile {
    format: String,
    colptr: Vec<u32>,
    rowval: Vec<u32>,
}

pub fn parse_bincsc_json(text: &str) -> Result<BinaryCsc, FormatError> {
    let file: BincscFile = serde_json::from_str(text)?;
    if file.format != BINCSC_FORMAT_TAG {
        return Err(FormatError::UnknownFormatTag {
            found: file.format,
            expected: BINCSC_FORMAT_TAG,
        });
    }
    Ok(BinaryCsc::from_parts(file.colptr, file.rowval)?)
}

pub fn read_bincsc_json<P: AsRef<Path>>(path: P) -> Result<BinaryCsc, FormatError> {
    parse_bincsc_json(&fs::read_to_string(path)?)
}

pub fn write_bincsc_json(matrix: &BinaryCsc) -> String {
    let file = BincscFile {
        format: BINCSC_FORMAT_TAG.to_string(),
        colptr: matrix.col_ptr().to_vec(),
        rowval: matrix.row_idx().to_vec(),
    };
    serde_json::to_string_pretty(&file).expect("serialization of plain arrays cannot fail")
}

// -------------------------------------------------------------- qccsc.json

#[derive(Serialize, Deserialize)]
struct QccscFile {
    format: String,
    qc_expansion_factor: u32,
    colptr: Vec<u32>,
    rowval: Vec<u32>,
    nzval: Vec<u32>,
}

pub fn parse_qccsc_json(text: &str) -> Result<QcMatrix, FormatError> {
    let file: QccscFile = serde_json::from_str(text)?;
    if file.format != QCCSC_FORMAT_TAG {
        return Err(FormatError::UnknownFormatTag {
            found: file.format,
            expected: QCCSC_FORMAT_TAG,
        });
    }
    Ok(QcMatrix::from_parts(
        file.qc_expansion_factor as usize,
        file.colptr,
        file.rowval,
        file.nzval,
    )?)
}

pub fn read_qccsc_json<P: AsRef<Path>>(path: P) -> Result<QcMatrix, FormatError> {
    parse_qccsc_json(&fs::read_to_string(path)?)
}

pub fn write_qccsc_json(matrix: &QcMatrix) -> String {
    let file = QccscFile {
        format: QCCSC_FORMAT_TAG.to_string(),
        qc_expansion_factor: matrix.expansion_factor() as u32,
        colptr: matrix.col_ptr().to_vec(),
        rowval: matrix.row_idx().to_vec(),
        nzval: matrix.exponents().to_vec(),
    };
    serde_json::to_string_pretty(&file).expect("serialization of plain arrays cannot fail")
}

// ------------------------------------------------------------------- alist

/// Parses the alist format: `N M`, then the maximum column and row weights,
/// the per-column and per-row weights, then one line of 1-based row indices
/// per column and one line of 1-based column indices per row. Zero entries
/// (padding used by some writers for irregular codes) are skipped. The
/// row-oriented second half is checked for consistency with the first.
pub fn parse_alist(text: &str) -> Result<BinaryCsc, FormatError> {
    let mut lines = text.lines();
    let mut next_ints = |what: &str| -> Result<Vec<usize>, FormatError> {
        let line = lines
            .next()
            .ok_or_else(|| FormatError::Malformed(format!("missing {what} line")))?;
        line.split_whitespace()
            .map(|tok| {
                tok.parse::<usize>()
                    .map_err(|_| FormatError::Malformed(format!("bad integer '{tok}' in {what}")))
            })
            .collect()
    };

    let header = next_ints("size header")?;
    let &[n_cols, n_rows] = header.as_slice() else {
        return Err(FormatError::Malformed(
            "size header must hold exactly two integers".to_string(),
        ));
    };
    if n_cols == 0 || n_rows == 0 {
        return Err(FormatError::Malformed("empty matrix dimensions".to_string()));
    }
    let _max_weights = next_ints("maximum weight header")?;
    let col_weights = next_ints("column weights")?;
    let row_weights = next_ints("row weights")?;
    if col_weights.len() != n_cols || row_weights.len() != n_rows {
        return Err(FormatError::Malformed(
            "weight lists do not match the declared dimensions".to_string(),
        ));
    }

    let mut col_ptr = Vec::with_capacity(n_cols + 1);
    let mut row_idx = Vec::new();
    col_ptr.push(0u32);
    for (col, &weight) in col_weights.iter().enumerate() {
        let mut rows: Vec<usize> = next_ints("column entries")?
            .into_iter()
            .filter(|&r| r != 0)
            .collect();
        if rows.len() != weight {
            return Err(FormatError::Malformed(format!(
                "column {col} lists {} entries but declares weight {weight}",
                rows.len()
            )));
        }
        if rows.iter().any(|&r| r > n_rows) {
            return Err(FormatError::Malformed(format!(
                "column {col} references a row beyond the declared {n_rows}"
            )));
        }
        rows.sort_unstable();
        row_idx.extend(rows.into_iter().map(|r| (r - 1) as u32));
        col_ptr.push(row_idx.len() as u32);
    }

    let matrix = BinaryCsc::from_parts(col_ptr, row_idx)?;

    // Second half: the row-oriented listing must be the transpose of the
    // column-oriented one.
    let varn = Adjacency::checks_of(&matrix);
    for (row, &weight) in row_weights.iter().enumerate() {
        let mut cols: Vec<usize> = next_ints("row entries")?
            .into_iter()
            .filter(|&c| c != 0)
            .collect();
        cols.sort_unstable();
        let listed: Vec<u32> = cols.into_iter().map(|c| (c - 1) as u32).collect();
        let actual: &[u32] = if row < varn.n_rows() { varn.row(row) } else { &[] };
        if listed.len() != weight || listed != actual {
            return Err(FormatError::Malformed(format!(
                "row {row} listing is inconsistent with the column listing"
            )));
        }
    }

    if matrix.n_rows() != n_rows {
        return Err(FormatError::Malformed(format!(
            "declared {n_rows} rows but only {} are referenced",
            matrix.n_rows()
        )));
    }

    Ok(matrix)
}

pub fn read_alist<P: AsRef<Path>>(path: P) -> Result<BinaryCsc, FormatError> {
    parse_alist(&fs::read_to_string(path)?)
}

pub fn write_alist(matrix: &BinaryCsc) -> String {
    let varn = Adjacency::checks_of(matrix);
    let mut out = String::new();
    out.push_str(&format!("{} {}\n", matrix.n_cols(), matrix.n_rows()));

    let max_col = (0..matrix.n_cols()).map(|c| matrix.col_weight(c)).max().unwrap_or(0);
    let max_row = varn.degrees().max().unwrap_or(0);
    out.push_str(&format!("{max_col} {max_row}\n"));

    let col_weights: Vec<String> = (0..matrix.n_cols())
        .map(|c| matrix.col_weight(c).to_string())
        .collect();
    out.push_str(&col_weights.join(" "));
    out.push('\n');
    let row_weights: Vec<String> = varn.degrees().map(|d| d.to_string()).collect();
    out.push_str(&row_weights.join(" "));
    out.push('\n');

    for col in 0..matrix.n_cols() {
        let entries: Vec<String> = matrix.col(col).iter().map(|r| (r + 1).to_string()).collect();
        out.push_str(&entries.join(" "));
        out.push('\n');
    }
    for row in varn.iter() {
        let entries: Vec<String> = row.iter().map(|c| (c + 1).to_string()).collect();
        out.push_str(&entries.join(" "));
        out.push('\n');
    }
    out
}

// ------------------------------------------------------- rate-adaption CSV

/// Parses the rate-adaption CSV: one `a,b` pair of 0-based mother row
/// indices per line, in combination order.
pub fn parse_rate_adaption_csv(text: &str) -> Result<RateAdaption, FormatError> {
    let mut pairs = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let (a, b) = line.split_once(',').ok_or_else(|| {
            FormatError::Malformed(format!("line {}: expected 'a,b'", lineno + 1))
        })?;
        let parse = |tok: &str| {
            tok.trim().parse::<u32>().map_err(|_| {
                FormatError::Malformed(format!("line {}: bad row index '{tok}'", lineno + 1))
            })
        };
        pairs.push((parse(a)?, parse(b)?));
    }
    Ok(RateAdaption::from_pairs(pairs))
}

pub fn read_rate_adaption_csv<P: AsRef<Path>>(path: P) -> Result<RateAdaption, FormatError> {
    parse_rate_adaption_csv(&fs::read_to_string(path)?)
}

pub fn write_rate_adaption_csv(adaption: &RateAdaption) -> String {
    let mut out = String::new();
    for &(a, b) in adaption.pairs() {
        out.push_str(&format!("{a},{b}\n"));
    }
    out
}
