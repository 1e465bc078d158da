//! Type definitions for paged worksheet data

/// One dense worksheet row: index 0 is column A, absent cells are `None`.
///
/// A row's length always equals the sheet's `max_col`, regardless of which
/// cells are actually present in the source.
pub type Row = Vec<Option<String>>;

/// One page of rows. An empty page signals "no more data".
pub type Page = Vec<Row>;

/// Declared used-range bounds of a worksheet.
///
/// All indices are 1-based and inclusive, parsed once from the sheet's
/// `dimension` element (e.g. `"A1:C10"`). A sheet without a declared range
/// is treated as empty by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetDimensions {
    /// First row with data
    pub min_row: u32,
    /// Last row with data
    pub max_row: u32,
    /// First column with data (A = 1)
    pub min_col: u32,
    /// Last column with data
    pub max_col: u32,
}

impl SheetDimensions {
    /// Number of pages needed to cover the sheet at the given page size.
    pub(crate) fn page_count(&self, page_size: usize) -> usize {
        (self.max_row as usize).div_ceil(page_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_count() {
        let dims = SheetDimensions {
            min_row: 1,
            max_row: 3,
            min_col: 1,
            max_col: 2,
        };
        assert_eq!(dims.page_count(2), 2);
        assert_eq!(dims.page_count(3), 1);
        assert_eq!(dims.page_count(1000), 1);
    }
}
