//! Paged read sessions over one worksheet

use std::path::Path;

use log::{debug, trace};

use crate::error::{Result, XlsxError};
use crate::package::Package;
use crate::sheet::SheetStream;
use crate::types::{Page, SheetDimensions};

/// Default rows per page when the caller does not supply a size.
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// A paged reader session over the first worksheet of an XLSX document.
///
/// The session exclusively owns the document and stream handles. Reads are
/// 1-based pages; sequential page requests continue from the current stream
/// position, anything else reopens the document and fast-skips forward.
///
/// ```no_run
/// use xlsxpager::PageReader;
///
/// # fn main() -> xlsxpager::Result<()> {
/// let mut reader = PageReader::open("data.xlsx", 500)?;
/// let mut page = 1;
/// loop {
///     let rows = reader.read(page)?;
///     if rows.is_empty() {
///         break;
///     }
///     for row in &rows {
///         println!("{row:?}");
///     }
///     page += 1;
/// }
/// # Ok(())
/// # }
/// ```
pub struct PageReader {
    package: Option<Package>,
    dimensions: Option<SheetDimensions>,
    page_size: usize,
    stream: Option<SheetStream>,
    /// Fast-path cache: the page a sequential read would serve next, and
    /// the page size that position was built with.
    expected_page: usize,
    expected_page_size: usize,
}

impl PageReader {
    /// Open a document, computing sheet dimensions and lookup tables once.
    ///
    /// `page_size` is the session default for [`read`](Self::read).
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize) -> Result<Self> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty() {
            return Err(XlsxError::InvalidArgument("path must not be blank".into()));
        }
        if page_size == 0 {
            return Err(XlsxError::InvalidArgument(
                "page size must be a positive value".into(),
            ));
        }

        let package = Package::open(path)?;

        // dedicated scan pass; row access later uses fresh streams
        let mut scan = SheetStream::new(package.open_sheet_reader()?);
        let dimensions = scan.scan_dimensions()?;
        debug!("sheet dimensions: {dimensions:?}");

        Ok(PageReader {
            package: Some(package),
            dimensions,
            page_size,
            stream: None,
            expected_page: 0,
            expected_page_size: 0,
        })
    }

    /// Open with the default page size.
    pub fn open_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open(path, DEFAULT_PAGE_SIZE)
    }

    /// Declared sheet bounds, or `None` for an empty sheet.
    pub fn dimensions(&self) -> Option<&SheetDimensions> {
        self.dimensions.as_ref()
    }

    /// Read one page of rows using the session's configured page size.
    pub fn read(&mut self, page: usize) -> Result<Page> {
        self.read_with_size(page, self.page_size)
    }

    /// Read one page of rows with an explicit page size.
    ///
    /// Returns fewer than `page_size` rows on the final page, and an empty
    /// page once the sheet is exhausted.
    pub fn read_with_size(&mut self, page: usize, page_size: usize) -> Result<Page> {
        let package = self.package.as_ref().ok_or(XlsxError::Closed)?;
        if page == 0 {
            return Err(XlsxError::InvalidArgument("page numbers are 1-based".into()));
        }
        if page_size == 0 {
            return Err(XlsxError::InvalidArgument(
                "page size must be a positive value".into(),
            ));
        }

        let dimensions = match self.dimensions {
            Some(d) => d,
            None => return Ok(Page::new()),
        };

        // past the last page: answer without touching the stream
        if page > dimensions.page_count(page_size) {
            return Ok(Page::new());
        }

        let sequential =
            page == self.expected_page && page_size == self.expected_page_size;
        if !sequential || self.stream.is_none() {
            trace!("repositioning to page {page} (size {page_size})");
            let mut stream = SheetStream::new(package.open_sheet_reader()?);
            stream.skip_to_row_index(((page - 1) * page_size + 1) as u32)?;
            self.stream = Some(stream);
        } else {
            trace!("sequential read of page {page}");
        }

        // invalidate the fast path up front; a decode failure mid-page
        // leaves the stream position unusable
        self.expected_page = 0;

        let stream = self.stream.as_mut().ok_or(XlsxError::Closed)?;
        let max_col = dimensions.max_col as usize;
        let mut rows = Page::with_capacity(page_size);
        while rows.len() < page_size {
            match stream.decode_row(max_col, package.styles(), package.shared_strings())? {
                Some(row) => rows.push(row),
                None => break,
            }
        }

        self.expected_page = page + 1;
        self.expected_page_size = page_size;
        Ok(rows)
    }

    /// Release the stream and document handles. Idempotent; later reads
    /// fail with [`XlsxError::Closed`].
    pub fn close(&mut self) {
        self.stream = None;
        self.package = None;
        self.expected_page = 0;
    }
}
