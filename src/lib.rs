//! # xlsxpager
//!
//! A paged streaming reader for XLSX worksheets.
//!
//! ## Features
//!
//! - **Streaming Read**: decode the first worksheet row-by-row without
//!   loading it into memory
//! - **Paged Access**: rows come back in 1-based pages of configurable size;
//!   sequential page requests continue from the current stream position
//! - **Display Values**: cells resolve to the strings a spreadsheet
//!   application would show, with number formats, date serials, booleans
//!   and shared strings applied
//! - **Dense Rows**: every row has exactly `max_col` cells; absent cells are
//!   `None`, never dropped
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use xlsxpager::PageReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut reader = PageReader::open("data.xlsx", 1000)?;
//!
//! if let Some(dims) = reader.dimensions() {
//!     println!("{} rows x {} columns", dims.max_row, dims.max_col);
//! }
//!
//! let first_page = reader.read(1)?;
//! for row in first_page {
//!     println!("{row:?}");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Or pull everything at once:
//!
//! ```rust,no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let rows = xlsxpager::export("data.xlsx")?;
//! println!("read {} rows", rows.len());
//! # Ok(())
//! # }
//! ```

pub mod cellref;
pub mod error;
pub mod export;
pub mod formats;
pub mod package;
pub mod render;
pub mod resolve;
pub mod session;
pub mod sheet;
pub mod types;

pub use error::{Result, XlsxError};
pub use export::{export, export_with_page_size};
pub use session::{PageReader, DEFAULT_PAGE_SIZE};
pub use types::{Page, Row, SheetDimensions};
