//! Cell value resolution: raw stored text to display-equivalent strings

use crate::error::{Result, XlsxError};
use crate::formats::{is_date_format_id, StyleTable};
use crate::render;

/// Resolve one cell's display value.
///
/// `cell_type` is the worksheet's `t` attribute (`None` means implicit
/// numeric), `style_index` its `s` attribute. Cells whose number format
/// cannot be resolved degrade to their raw text rather than failing.
pub fn resolve_cell(
    raw: &str,
    cell_type: Option<&str>,
    style_index: Option<u32>,
    styles: &StyleTable,
    shared_strings: Option<&[String]>,
) -> Result<Option<String>> {
    if raw.trim().is_empty() {
        return Ok(None);
    }

    match cell_type {
        None => resolve_numeric(raw, style_index, styles).map(Some),
        Some("str") => Ok(Some(raw.to_string())),
        Some("s") => resolve_shared_string(raw, shared_strings),
        Some("b") => Ok(Some(
            if raw == "0" { "FALSE" } else { "TRUE" }.to_string(),
        )),
        // explicit numerics, errors, inline strings: raw text is the display text
        Some(_) => Ok(Some(raw.to_string())),
    }
}

fn resolve_numeric(raw: &str, style_index: Option<u32>, styles: &StyleTable) -> Result<String> {
    let format = style_index.and_then(|idx| styles.cell_format(idx));

    let format = match format {
        Some(f) => f,
        None => return Ok(render::invariant(parse_number(raw)?)),
    };

    // General or apply-flag off: graceful fallback to the stored text
    if format.number_format_id == 0 || !format.apply_number_format {
        return Ok(raw.to_string());
    }

    let pattern = match styles.format_code(format.number_format_id) {
        Some(p) => p,
        None => return Ok(raw.to_string()),
    };

    if pattern == "@" {
        return Ok(raw.to_string());
    }

    if is_date_format_id(format.number_format_id) {
        render::render_serial_date(parse_number(raw)?, pattern)
    } else {
        Ok(render::render_number(parse_number(raw)?, pattern))
    }
}

fn resolve_shared_string(raw: &str, shared_strings: Option<&[String]>) -> Result<Option<String>> {
    // a container with no shared-strings part resolves these cells to null;
    // a present table, even an empty one, makes a bad index fatal
    let table = match shared_strings {
        Some(table) => table,
        None => return Ok(None),
    };
    let index: usize = raw.trim().parse().map_err(|_| {
        XlsxError::MalformedDocument(format!("shared string index '{raw}' is not an integer"))
    })?;
    match table.get(index) {
        Some(text) => Ok(Some(text.clone())),
        None => Err(XlsxError::MalformedDocument(format!(
            "shared string index {index} out of range (table has {} entries)",
            table.len()
        ))),
    }
}

fn parse_number(raw: &str) -> Result<f64> {
    raw.trim().parse::<f64>().map_err(|_| {
        XlsxError::MalformedDocument(format!("cell value '{raw}' is not a valid number"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styles_with(xml: &str) -> StyleTable {
        StyleTable::parse(xml).unwrap()
    }

    fn no_styles() -> StyleTable {
        StyleTable::default()
    }

    #[test]
    fn test_blank_raw_is_null() {
        assert_eq!(resolve_cell("", None, None, &no_styles(), None).unwrap(), None);
        assert_eq!(
            resolve_cell("   ", Some("s"), None, &no_styles(), None).unwrap(),
            None
        );
    }

    #[test]
    fn test_plain_numeric_invariant() {
        assert_eq!(
            resolve_cell("12.50", None, None, &no_styles(), None).unwrap(),
            Some("12.5".to_string())
        );
        assert_eq!(
            resolve_cell("3", None, None, &no_styles(), None).unwrap(),
            Some("3".to_string())
        );
    }

    #[test]
    fn test_numeric_not_a_number_is_fatal() {
        assert!(resolve_cell("abc", None, None, &no_styles(), None).is_err());
    }

    #[test]
    fn test_general_and_unapplied_formats_fall_back_to_raw() {
        let styles = styles_with(
            r#"<styleSheet><cellXfs>
                 <xf numFmtId="0"/>
                 <xf numFmtId="4"/>
               </cellXfs></styleSheet>"#,
        );
        // General id
        assert_eq!(
            resolve_cell("1.5", None, Some(0), &styles, None).unwrap(),
            Some("1.5".to_string())
        );
        // apply flag absent
        assert_eq!(
            resolve_cell("1.5", None, Some(1), &styles, None).unwrap(),
            Some("1.5".to_string())
        );
        // style index with no record at all: plain parse
        assert_eq!(
            resolve_cell("1.50", None, Some(9), &styles, None).unwrap(),
            Some("1.5".to_string())
        );
    }

    #[test]
    fn test_applied_builtin_number_format() {
        let styles = styles_with(
            r#"<styleSheet><cellXfs>
                 <xf numFmtId="10" applyNumberFormat="1"/>
               </cellXfs></styleSheet>"#,
        );
        assert_eq!(
            resolve_cell("0.4213", None, Some(0), &styles, None).unwrap(),
            Some("42.13%".to_string())
        );
    }

    #[test]
    fn test_applied_date_format() {
        let styles = styles_with(
            r#"<styleSheet><cellXfs>
                 <xf numFmtId="14" applyNumberFormat="1"/>
               </cellXfs></styleSheet>"#,
        );
        assert_eq!(
            resolve_cell("25569", None, Some(0), &styles, None).unwrap(),
            Some("1/1/1970".to_string())
        );
    }

    #[test]
    fn test_unregistered_format_id_falls_back_to_raw() {
        let styles = styles_with(
            r#"<styleSheet><cellXfs>
                 <xf numFmtId="200" applyNumberFormat="1"/>
               </cellXfs></styleSheet>"#,
        );
        assert_eq!(
            resolve_cell("1.5", None, Some(0), &styles, None).unwrap(),
            Some("1.5".to_string())
        );
    }

    #[test]
    fn test_custom_format() {
        let styles = styles_with(
            r#"<styleSheet>
                 <numFmts><numFmt numFmtId="164" formatCode="0.000"/></numFmts>
                 <cellXfs><xf numFmtId="164" applyNumberFormat="1"/></cellXfs>
               </styleSheet>"#,
        );
        assert_eq!(
            resolve_cell("1.5", None, Some(0), &styles, None).unwrap(),
            Some("1.500".to_string())
        );
    }

    #[test]
    fn test_inline_string() {
        assert_eq!(
            resolve_cell("hello", Some("str"), None, &no_styles(), None).unwrap(),
            Some("hello".to_string())
        );
    }

    #[test]
    fn test_shared_string_lookup() {
        let table = vec!["test".to_string()];
        assert_eq!(
            resolve_cell("0", Some("s"), None, &no_styles(), Some(table.as_slice())).unwrap(),
            Some("test".to_string())
        );
    }

    #[test]
    fn test_shared_string_out_of_range_is_fatal() {
        let table = vec!["test".to_string()];
        let err =
            resolve_cell("1", Some("s"), None, &no_styles(), Some(table.as_slice())).unwrap_err();
        assert!(matches!(err, XlsxError::MalformedDocument(_)));
    }

    #[test]
    fn test_shared_string_empty_table_is_fatal() {
        // the part exists but holds no entries: any index is out of range
        let err = resolve_cell("0", Some("s"), None, &no_styles(), Some(&[])).unwrap_err();
        assert!(matches!(err, XlsxError::MalformedDocument(_)));
    }

    #[test]
    fn test_shared_string_missing_table_is_null() {
        assert_eq!(
            resolve_cell("0", Some("s"), None, &no_styles(), None).unwrap(),
            None
        );
    }

    #[test]
    fn test_booleans() {
        assert_eq!(
            resolve_cell("0", Some("b"), None, &no_styles(), None).unwrap(),
            Some("FALSE".to_string())
        );
        assert_eq!(
            resolve_cell("1", Some("b"), None, &no_styles(), None).unwrap(),
            Some("TRUE".to_string())
        );
        assert_eq!(
            resolve_cell("anything", Some("b"), None, &no_styles(), None).unwrap(),
            Some("TRUE".to_string())
        );
    }

    #[test]
    fn test_other_types_pass_through() {
        assert_eq!(
            resolve_cell("42", Some("n"), None, &no_styles(), None).unwrap(),
            Some("42".to_string())
        );
        assert_eq!(
            resolve_cell("#DIV/0!", Some("e"), None, &no_styles(), None).unwrap(),
            Some("#DIV/0!".to_string())
        );
    }
}
