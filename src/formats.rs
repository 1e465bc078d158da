//! Number format and cell format tables parsed from xl/styles.xml

use std::collections::HashMap;

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;

/// Format ids whose pattern renders a date serial rather than a plain number.
const DATE_FORMAT_IDS: [u32; 12] = [14, 15, 16, 17, 18, 19, 20, 21, 22, 45, 46, 47];

/// Whether a format id belongs to the fixed date/time id set.
pub fn is_date_format_id(id: u32) -> bool {
    DATE_FORMAT_IDS.contains(&id)
}

/// Display pattern for a builtin number format id.
///
/// Ids not listed here (and not supplied by the workbook's custom table)
/// make the cell degrade to its raw text.
pub fn builtin_format(id: u32) -> Option<&'static str> {
    match id {
        0 => Some("General"),
        1 => Some("0"),
        2 => Some("0.00"),
        3 => Some("#,##0"),
        4 => Some("#,##0.00"),
        9 => Some("0%"),
        10 => Some("0.00%"),
        11 => Some("0.00E+00"),
        12 => Some("# ?/?"),
        13 => Some("# ??/??"),
        14 => Some("d/M/yyyy"),
        15 => Some("d-MMM-yy"),
        16 => Some("d-MMM"),
        17 => Some("MMM-yy"),
        18 => Some("h:mm tt"),
        19 => Some("h:mm:ss tt"),
        20 => Some("H:mm"),
        21 => Some("H:mm:ss"),
        22 => Some("M/d/yyyy H:mm"),
        37 => Some("#,##0 ;(#,##0)"),
        38 => Some("#,##0 ;[Red](#,##0)"),
        39 => Some("#,##0.00;(#,##0.00)"),
        40 => Some("#,##0.00;[Red](#,##0.00)"),
        45 => Some("mm:ss"),
        46 => Some("[h]:mm:ss"),
        47 => Some("mmss.0"),
        48 => Some("##0.0E+0"),
        49 => Some("@"),
        _ => None,
    }
}

/// One `cellXfs` record: which number format a style index points at.
#[derive(Debug, Clone, Copy)]
pub struct CellFormat {
    pub number_format_id: u32,
    pub apply_number_format: bool,
}

/// Style lookup tables computed once when a document is opened.
#[derive(Debug, Default)]
pub struct StyleTable {
    cell_formats: Vec<CellFormat>,
    custom_formats: HashMap<u32, String>,
}

impl StyleTable {
    /// Parse `xl/styles.xml` content into lookup tables.
    ///
    /// Only `cellXfs` and `numFmts` are read; fonts, fills and borders are
    /// outside this reader's concern.
    pub fn parse(content: &str) -> Result<Self> {
        let mut reader = Reader::from_str(content);
        reader.config_mut().trim_text(true);

        let mut table = StyleTable::default();
        let mut buf = Vec::with_capacity(1024);
        let mut in_cell_xfs = false;

        loop {
            buf.clear();
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) | Event::Empty(e) => match e.local_name().as_ref() {
                    b"cellXfs" => in_cell_xfs = true,
                    b"xf" if in_cell_xfs => {
                        let mut number_format_id = 0u32;
                        let mut apply_number_format = false;
                        for attr in e.attributes().flatten() {
                            match attr.key.local_name().as_ref() {
                                b"numFmtId" => {
                                    if let Ok(value) =
                                        attr.decode_and_unescape_value(reader.decoder())
                                    {
                                        number_format_id = value.parse().unwrap_or(0);
                                    }
                                }
                                b"applyNumberFormat" => {
                                    if let Ok(value) =
                                        attr.decode_and_unescape_value(reader.decoder())
                                    {
                                        apply_number_format =
                                            value.as_ref() == "1" || value.as_ref() == "true";
                                    }
                                }
                                _ => {}
                            }
                        }
                        table.cell_formats.push(CellFormat {
                            number_format_id,
                            apply_number_format,
                        });
                    }
                    b"numFmt" => {
                        let mut id = None;
                        let mut code = None;
                        for attr in e.attributes().flatten() {
                            match attr.key.local_name().as_ref() {
                                b"numFmtId" => {
                                    if let Ok(value) =
                                        attr.decode_and_unescape_value(reader.decoder())
                                    {
                                        id = value.parse::<u32>().ok();
                                    }
                                }
                                b"formatCode" => {
                                    if let Ok(value) =
                                        attr.decode_and_unescape_value(reader.decoder())
                                    {
                                        code = Some(value.to_string());
                                    }
                                }
                                _ => {}
                            }
                        }
                        if let (Some(id), Some(code)) = (id, code) {
                            table.custom_formats.insert(id, code);
                        }
                    }
                    _ => {}
                },
                Event::End(e) if e.local_name().as_ref() == b"cellXfs" => in_cell_xfs = false,
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(table)
    }

    /// Format record for a cell's style index, if one exists.
    pub fn cell_format(&self, style_index: u32) -> Option<&CellFormat> {
        self.cell_formats.get(style_index as usize)
    }

    /// Resolve a format id to its display pattern. Builtin ids take
    /// precedence over workbook-custom entries with the same id.
    pub fn format_code(&self, id: u32) -> Option<&str> {
        builtin_format(id).or_else(|| self.custom_formats.get(&id).map(String::as_str))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_format_lookup() {
        assert_eq!(builtin_format(0), Some("General"));
        assert_eq!(builtin_format(14), Some("d/M/yyyy"));
        assert_eq!(builtin_format(22), Some("M/d/yyyy H:mm"));
        assert_eq!(builtin_format(999), None);
    }

    #[test]
    fn test_date_format_id_set() {
        assert!(is_date_format_id(14));
        assert!(is_date_format_id(22));
        assert!(is_date_format_id(47));
        assert!(!is_date_format_id(0));
        assert!(!is_date_format_id(4));
        assert!(!is_date_format_id(49));
    }

    #[test]
    fn test_parse_styles() {
        let xml = r#"<?xml version="1.0"?>
            <styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
              <numFmts count="1">
                <numFmt numFmtId="164" formatCode="0.000"/>
              </numFmts>
              <cellXfs count="3">
                <xf numFmtId="0" fontId="0"/>
                <xf numFmtId="14" applyNumberFormat="1"/>
                <xf numFmtId="164" applyNumberFormat="1"/>
              </cellXfs>
            </styleSheet>"#;

        let table = StyleTable::parse(xml).unwrap();

        let xf = table.cell_format(1).unwrap();
        assert_eq!(xf.number_format_id, 14);
        assert!(xf.apply_number_format);

        let xf = table.cell_format(0).unwrap();
        assert_eq!(xf.number_format_id, 0);
        assert!(!xf.apply_number_format);

        assert!(table.cell_format(3).is_none());
        assert_eq!(table.format_code(164), Some("0.000"));
        assert_eq!(table.format_code(4), Some("#,##0.00"));
        assert_eq!(table.format_code(200), None);
    }

    #[test]
    fn test_builtin_wins_over_custom() {
        let xml = r#"<styleSheet>
              <numFmts><numFmt numFmtId="4" formatCode="overridden"/></numFmts>
            </styleSheet>"#;
        let table = StyleTable::parse(xml).unwrap();
        assert_eq!(table.format_code(4), Some("#,##0.00"));
    }

    #[test]
    fn test_cell_style_xfs_ignored() {
        // cellStyleXfs carries master records; only cellXfs maps style indices
        let xml = r#"<styleSheet>
              <cellStyleXfs count="1"><xf numFmtId="9" applyNumberFormat="1"/></cellStyleXfs>
              <cellXfs count="1"><xf numFmtId="10" applyNumberFormat="1"/></cellXfs>
            </styleSheet>"#;
        let table = StyleTable::parse(xml).unwrap();
        assert_eq!(table.cell_format(0).unwrap().number_format_id, 10);
        assert!(table.cell_format(1).is_none());
    }
}
