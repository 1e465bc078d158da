//! Batch export built atop the paginated reader

use std::path::Path;

use crate::error::Result;
use crate::session::{PageReader, DEFAULT_PAGE_SIZE};
use crate::types::Row;

/// Read every row of the first worksheet by pulling pages until an empty
/// one appears.
///
/// `page_size` bounds how many rows are decoded per internal read; it does
/// not change the result. A failure mid-scan propagates at that point.
pub fn export_with_page_size<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Vec<Row>> {
    let mut reader = PageReader::open(path, page_size)?;
    let capacity = reader
        .dimensions()
        .map(|d| d.max_row as usize)
        .unwrap_or(0);

    let mut rows = Vec::with_capacity(capacity);
    let mut page = 1;
    loop {
        let batch = reader.read(page)?;
        if batch.is_empty() {
            break;
        }
        rows.extend(batch);
        page += 1;
    }
    Ok(rows)
}

/// [`export_with_page_size`] with the default internal page size.
pub fn export<P: AsRef<Path>>(path: P) -> Result<Vec<Row>> {
    export_with_page_size(path, DEFAULT_PAGE_SIZE)
}
