//! Forward-only worksheet decoding: dimension scan, row skipping, row decode
//!
//! A `SheetStream` walks worksheet markup strictly forward. Reaching an
//! earlier position means opening a fresh stream and replaying from the
//! start; nothing here can seek backward.

use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::cellref;
use crate::error::{Result, XlsxError};
use crate::formats::StyleTable;
use crate::resolve;
use crate::types::{Row, SheetDimensions};

/// A row element whose start tag has been consumed but whose cells have not.
struct PendingRow {
    /// Declared 1-based row index (`r` attribute), or the running fallback
    index: u32,
    self_closing: bool,
}

/// Streaming cursor over one worksheet part.
pub struct SheetStream {
    xml: Reader<BufReader<Box<dyn Read + Send>>>,
    buf: Vec<u8>,
    pending: Option<PendingRow>,
    done: bool,
    last_row_index: u32,
}

impl SheetStream {
    pub fn new(reader: Box<dyn Read + Send>) -> Self {
        // text is taken verbatim: cell content keeps its boundary whitespace
        let xml = Reader::from_reader(BufReader::with_capacity(64 * 1024, reader));
        SheetStream {
            xml,
            buf: Vec::with_capacity(8 * 1024),
            pending: None,
            done: false,
            last_row_index: 0,
        }
    }

    /// Scan forward for the worksheet's `dimension` element.
    ///
    /// Returns `None` when the stream ends without one; callers treat that
    /// as an empty sheet. Consumes the stream, so run this on a dedicated
    /// pass before any row access.
    pub fn scan_dimensions(&mut self) -> Result<Option<SheetDimensions>> {
        loop {
            self.buf.clear();
            match self.xml.read_event_into(&mut self.buf)? {
                Event::Start(e) | Event::Empty(e)
                    if e.local_name().as_ref() == b"dimension" =>
                {
                    for attr in e.attributes().flatten() {
                        if attr.key.local_name().as_ref() == b"ref" {
                            let value = attr.decode_and_unescape_value(self.xml.decoder())?;
                            return cellref::parse_range(&value).map(Some);
                        }
                    }
                    return Err(XlsxError::MalformedDocument(
                        "dimension element has no ref attribute".to_string(),
                    ));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Fast-skip forward until the next row's declared index reaches or
    /// exceeds `start`. Skipped rows' cells are never decoded. The matching
    /// row stays pending for the decoder.
    pub fn skip_to_row_index(&mut self, start: u32) -> Result<()> {
        while let Some(row) = self.advance_to_row()? {
            if row.index >= start {
                self.pending = Some(row);
                return Ok(());
            }
            if !row.self_closing {
                self.skip_row_children()?;
            }
        }
        Ok(())
    }

    /// Decode the next row into a dense buffer of `max_col` cells.
    ///
    /// Returns `None` at end-of-data. Cells absent from the source stay
    /// `None` at their column position; the buffer is never truncated.
    pub fn decode_row(
        &mut self,
        max_col: usize,
        styles: &StyleTable,
        shared_strings: Option<&[String]>,
    ) -> Result<Option<Row>> {
        let row = match self.advance_to_row()? {
            Some(row) => row,
            None => return Ok(None),
        };

        let mut cells: Row = vec![None; max_col];
        if row.self_closing {
            return Ok(Some(cells));
        }

        loop {
            self.buf.clear();
            match self.xml.read_event_into(&mut self.buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"c" => {
                    let (reference, cell_type, style_index) =
                        cell_attributes(&e, self.xml.decoder())?;
                    let raw = self.read_cell_text()?;
                    store_cell(
                        &mut cells,
                        max_col,
                        reference,
                        &raw,
                        cell_type.as_deref(),
                        style_index,
                        styles,
                        shared_strings,
                    )?;
                }
                Event::Empty(e) if e.local_name().as_ref() == b"c" => {
                    // no children, no stored text: resolves to null, nothing to do
                }
                Event::End(e) if e.local_name().as_ref() == b"row" => break,
                Event::Eof => {
                    self.done = true;
                    break;
                }
                _ => {}
            }
        }

        Ok(Some(cells))
    }

    /// Consume events until the next row start (or end of sheet data).
    fn advance_to_row(&mut self) -> Result<Option<PendingRow>> {
        if let Some(row) = self.pending.take() {
            return Ok(Some(row));
        }
        if self.done {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            match self.xml.read_event_into(&mut self.buf)? {
                Event::Start(e) if e.local_name().as_ref() == b"row" => {
                    let declared = declared_row_index(&e, self.xml.decoder())?;
                    let index = declared.unwrap_or(self.last_row_index + 1);
                    self.last_row_index = index;
                    return Ok(Some(PendingRow {
                        index,
                        self_closing: false,
                    }));
                }
                Event::Empty(e) if e.local_name().as_ref() == b"row" => {
                    let declared = declared_row_index(&e, self.xml.decoder())?;
                    let index = declared.unwrap_or(self.last_row_index + 1);
                    self.last_row_index = index;
                    return Ok(Some(PendingRow {
                        index,
                        self_closing: true,
                    }));
                }
                Event::End(e) if e.local_name().as_ref() == b"sheetData" => {
                    self.done = true;
                    return Ok(None);
                }
                Event::Eof => {
                    self.done = true;
                    return Ok(None);
                }
                _ => {}
            }
        }
    }

    /// Skip the current row's children without touching cell contents.
    fn skip_row_children(&mut self) -> Result<()> {
        let mut depth = 0usize;
        loop {
            self.buf.clear();
            match self.xml.read_event_into(&mut self.buf)? {
                Event::Start(_) => depth += 1,
                Event::End(e) => {
                    if depth == 0 {
                        if e.local_name().as_ref() != b"row" {
                            return Err(XlsxError::MalformedDocument(format!(
                                "unexpected closing element {}",
                                String::from_utf8_lossy(e.local_name().as_ref())
                            )));
                        }
                        return Ok(());
                    }
                    depth -= 1;
                }
                Event::Eof => {
                    self.done = true;
                    return Ok(());
                }
                _ => {}
            }
        }
    }

    /// Collect the text content of the current cell element (`v` value or
    /// inline-string `t` runs) up to its closing tag.
    fn read_cell_text(&mut self) -> Result<String> {
        let mut text = String::new();
        let mut capture = false;
        loop {
            self.buf.clear();
            match self.xml.read_event_into(&mut self.buf)? {
                Event::Start(e) => {
                    if matches!(e.local_name().as_ref(), b"v" | b"t") {
                        capture = true;
                    }
                }
                Event::Text(t) if capture => text.push_str(&t.unescape()?),
                Event::End(e) => match e.local_name().as_ref() {
                    b"v" | b"t" => capture = false,
                    b"c" => break,
                    _ => {}
                },
                Event::Eof => {
                    self.done = true;
                    break;
                }
                _ => {}
            }
        }
        Ok(text)
    }
}

/// Declared `r` attribute of a row element, when present and numeric.
fn declared_row_index(e: &BytesStart<'_>, decoder: quick_xml::Decoder) -> Result<Option<u32>> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"r" {
            let value = attr.decode_and_unescape_value(decoder)?;
            return Ok(value.parse::<u32>().ok());
        }
    }
    Ok(None)
}

fn cell_attributes(
    e: &BytesStart<'_>,
    decoder: quick_xml::Decoder,
) -> Result<(String, Option<String>, Option<u32>)> {
    let mut reference = None;
    let mut cell_type = None;
    let mut style_index = None;
    for attr in e.attributes().flatten() {
        match attr.key.local_name().as_ref() {
            b"r" => reference = Some(attr.decode_and_unescape_value(decoder)?.into_owned()),
            b"t" => cell_type = Some(attr.decode_and_unescape_value(decoder)?.into_owned()),
            b"s" => {
                style_index = attr
                    .decode_and_unescape_value(decoder)?
                    .parse::<u32>()
                    .ok()
            }
            _ => {}
        }
    }
    let reference = reference.ok_or_else(|| {
        XlsxError::MalformedDocument("cell element has no reference attribute".to_string())
    })?;
    Ok((reference, cell_type, style_index))
}

#[allow(clippy::too_many_arguments)]
fn store_cell(
    cells: &mut Row,
    max_col: usize,
    reference: String,
    raw: &str,
    cell_type: Option<&str>,
    style_index: Option<u32>,
    styles: &StyleTable,
    shared_strings: Option<&[String]>,
) -> Result<()> {
    let col = cellref::column_number(&reference)? as usize;
    if col == 0 || col > max_col {
        return Err(XlsxError::MalformedDocument(format!(
            "cell {reference} outside declared dimensions (max column {max_col})"
        )));
    }
    cells[col - 1] = resolve::resolve_cell(raw, cell_type, style_index, styles, shared_strings)?;
    Ok(())
}
