//! Cell reference and range parsing ("B12", "A1:C10")

use crate::error::{Result, XlsxError};
use crate::types::SheetDimensions;

/// Parse the column letters of a cell reference into a 1-based column number.
///
/// Uses positional base-26 conversion: A = 1, Z = 26, AA = 27.
pub fn column_number(reference: &str) -> Result<u32> {
    let mut col = 0u32;
    let mut letters = 0;

    for ch in reference.chars() {
        if !ch.is_ascii_alphabetic() {
            break;
        }
        let value = ch.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        col = col
            .checked_mul(26)
            .and_then(|c| c.checked_add(value))
            .ok_or_else(|| {
                XlsxError::MalformedDocument(format!("column overflow in reference '{reference}'"))
            })?;
        letters += 1;
    }

    if letters == 0 {
        return Err(XlsxError::MalformedDocument(format!(
            "cell reference '{reference}' has no column letters"
        )));
    }
    Ok(col)
}

/// Parse the trailing digit run of a cell reference into a 1-based row number.
pub fn row_number(reference: &str) -> Result<u32> {
    let digits = reference.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    digits.parse::<u32>().map_err(|_| {
        XlsxError::MalformedDocument(format!("cell reference '{reference}' has no row number"))
    })
}

/// Parse a `dimension` range reference into sheet bounds.
///
/// Excel writes single-cell sheets as a bare reference without a colon; that
/// form is accepted as both corners.
pub fn parse_range(range: &str) -> Result<SheetDimensions> {
    let mut parts = range.splitn(2, ':');
    let first = parts.next().unwrap_or("");
    let second = parts.next().unwrap_or(first);

    Ok(SheetDimensions {
        min_row: row_number(first)?,
        max_row: row_number(second)?,
        min_col: column_number(first)?,
        max_col: column_number(second)?,
    })
}
