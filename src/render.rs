//! Display rendering of raw numeric values against number-format patterns

use chrono::{Datelike, NaiveDate, NaiveDateTime, TimeDelta, Timelike, Weekday};

use crate::error::{Result, XlsxError};

/// Day-serial epoch: OA dates count days from 1899-12-30.
fn serial_epoch() -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)
}

/// Convert a spreadsheet day serial to a calendar timestamp.
///
/// Follows OLE automation semantics (epoch 1899-12-30, fractional day as
/// time of day), the same conversion the reference display rules use.
fn serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || !(-657_435.0..2_958_466.0).contains(&serial) {
        return None;
    }
    let days = serial.trunc() as i64;
    let millis = (serial.fract() * 86_400_000.0).round() as i64;
    serial_epoch()?
        .checked_add_signed(TimeDelta::try_days(days)?)
        .and_then(|dt| dt.checked_add_signed(TimeDelta::try_milliseconds(millis)?))
}

/// Render a date serial with a date/time display pattern.
///
/// Pattern tokens follow the builtin table's convention: uppercase `M` runs
/// are months and lowercase `m` runs minutes, `H`/`h` pick 24/12-hour
/// clocks, `d`/`y`/`s` runs are day/year/second, `tt` is AM/PM, bracketed
/// `[h]`/`[m]`/`[s]` are elapsed totals and `.0` renders fractional seconds.
pub fn render_serial_date(serial: f64, pattern: &str) -> Result<String> {
    let dt = serial_to_datetime(serial).ok_or_else(|| {
        XlsxError::MalformedDocument(format!("value {serial} is not a valid date serial"))
    })?;

    let (year, month, day) = (dt.year(), dt.month(), dt.day());
    let (hour, minute, second) = (dt.hour(), dt.minute(), dt.second());
    let milli = dt.and_utc().timestamp_subsec_millis();

    let mut out = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            }
            '"' => {
                for next in chars.by_ref() {
                    if next == '"' {
                        break;
                    }
                    out.push(next);
                }
            }
            '[' => {
                let mut tag = String::new();
                for next in chars.by_ref() {
                    if next == ']' {
                        break;
                    }
                    tag.push(next);
                }
                let pad = tag.len() >= 2;
                match tag.to_ascii_lowercase().as_str() {
                    "h" | "hh" => push_padded(&mut out, (serial * 24.0).trunc() as i64, pad),
                    "m" | "mm" => push_padded(&mut out, (serial * 1440.0).trunc() as i64, pad),
                    "s" | "ss" => push_padded(&mut out, (serial * 86_400.0).trunc() as i64, pad),
                    _ => {} // color tags and locale prefixes carry no output
                }
            }
            'y' | 'Y' => {
                let count = 1 + take_run(&mut chars, |n| n == 'y' || n == 'Y');
                if count >= 4 {
                    out.push_str(&format!("{year:04}"));
                } else {
                    out.push_str(&format!("{:02}", year.rem_euclid(100)));
                }
            }
            'M' => {
                let count = 1 + take_run(&mut chars, |n| n == 'M');
                match count {
                    1 => out.push_str(&month.to_string()),
                    2 => out.push_str(&format!("{month:02}")),
                    3 => out.push_str(month_name(month, false)),
                    _ => out.push_str(month_name(month, true)),
                }
            }
            'm' => {
                let count = 1 + take_run(&mut chars, |n| n == 'm');
                push_padded(&mut out, minute as i64, count >= 2);
            }
            'd' | 'D' => {
                let count = 1 + take_run(&mut chars, |n| n == 'd' || n == 'D');
                match count {
                    1 => out.push_str(&day.to_string()),
                    2 => out.push_str(&format!("{day:02}")),
                    3 => out.push_str(weekday_name(dt.weekday(), false)),
                    _ => out.push_str(weekday_name(dt.weekday(), true)),
                }
            }
            'H' => {
                let count = 1 + take_run(&mut chars, |n| n == 'H');
                push_padded(&mut out, hour as i64, count >= 2);
            }
            'h' => {
                let count = 1 + take_run(&mut chars, |n| n == 'h');
                let clock12 = match hour {
                    0 => 12,
                    1..=12 => hour,
                    _ => hour - 12,
                };
                push_padded(&mut out, clock12 as i64, count >= 2);
            }
            's' | 'S' => {
                let count = 1 + take_run(&mut chars, |n| n == 's' || n == 'S');
                push_padded(&mut out, second as i64, count >= 2);
            }
            't' => {
                let count = 1 + take_run(&mut chars, |n| n == 't');
                let marker = if hour >= 12 { "PM" } else { "AM" };
                out.push_str(if count >= 2 { marker } else { &marker[..1] });
            }
            '.' if chars.peek() == Some(&'0') => {
                let digits = take_run(&mut chars, |n| n == '0');
                let scale = 10u32.pow(digits as u32);
                let frac = ((milli as f64 / 1000.0) * scale as f64).round() as u32 % scale;
                out.push('.');
                out.push_str(&format!("{frac:0width$}", width = digits));
            }
            _ => out.push(c),
        }
    }

    Ok(out)
}

/// Render a number with a spreadsheet number-format pattern.
///
/// Supports `0`/`#`/`?` digit placeholders, `,` grouping, `.` decimals, `%`
/// scaling, `E+00` scientific notation, `;`-separated sign sections, quoted
/// and escaped literals, and `[..]` tags (skipped). Fraction patterns
/// (`# ?/?`) degrade to invariant digits.
pub fn render_number(value: f64, pattern: &str) -> String {
    let sections: Vec<&str> = pattern.split(';').collect();
    let (section, from_sign_section) = if sections.len() > 1 {
        if value < 0.0 {
            (sections[1], true)
        } else if value == 0.0 {
            (*sections.get(2).unwrap_or(&sections[0]), false)
        } else {
            (sections[0], false)
        }
    } else {
        (pattern, false)
    };

    let spec = match scan_section(section) {
        Some(spec) => spec,
        None => return invariant(value),
    };

    if spec.fraction {
        return invariant(value);
    }
    if spec.scientific {
        return render_scientific(value, section, &spec);
    }

    let scaled = value * 100f64.powi(spec.percents as i32);
    let core = format_core(scaled.abs(), &spec);

    let mut out = String::with_capacity(section.len() + core.len());
    if value < 0.0 && !from_sign_section {
        out.push('-');
    }
    emit_section(&mut out, value, section, &spec, &core);
    out
}

/// Invariant-digit rendering used for General cells and degraded patterns.
pub fn invariant(value: f64) -> String {
    value.to_string()
}

struct SectionSpec {
    /// Byte range of the digit-placeholder run the core value replaces
    run: Option<(usize, usize)>,
    min_int_digits: usize,
    min_decimals: usize,
    max_decimals: usize,
    grouping: bool,
    percents: usize,
    scientific: bool,
    fraction: bool,
}

/// Scan one pattern section for its digit-placeholder run and modifiers.
/// Returns `None` for sections this renderer cannot honor.
fn scan_section(section: &str) -> Option<SectionSpec> {
    let mut spec = SectionSpec {
        run: None,
        min_int_digits: 0,
        min_decimals: 0,
        max_decimals: 0,
        grouping: false,
        percents: 0,
        scientific: false,
        fraction: false,
    };

    let mut in_quotes = false;
    let mut escaped = false;
    let mut in_brackets = false;
    let mut run_start = None;
    let mut after_dot = false;

    let mut iter = section.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if escaped {
            escaped = false;
            continue;
        }
        let is_placeholder =
            matches!(c, '0' | '#' | '?' | '.' | ',') && !in_quotes && !in_brackets;
        if !is_placeholder {
            if let Some(start) = run_start.take() {
                spec.run = Some((start, i));
            }
        }
        match c {
            '\\' | '_' | '*' if !in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            _ if in_quotes => {}
            '[' => in_brackets = true,
            ']' => in_brackets = false,
            _ if in_brackets => {}
            '%' => spec.percents += 1,
            'E' | 'e' if matches!(iter.peek(), Some(&(_, '+' | '-' | '0'))) => {
                spec.scientific = true;
            }
            '/' if spec.run.is_some() => spec.fraction = true,
            '0' | '#' | '?' | '.' | ',' if is_placeholder => {
                if run_start.is_none() && spec.run.is_none() {
                    run_start = Some(i);
                }
                if run_start.is_some() {
                    match c {
                        ',' => spec.grouping = true,
                        '.' => after_dot = true,
                        '0' => {
                            if after_dot {
                                spec.min_decimals += 1;
                                spec.max_decimals += 1;
                            } else {
                                spec.min_int_digits += 1;
                            }
                        }
                        _ => {
                            if after_dot {
                                spec.max_decimals += 1;
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    if let Some(start) = run_start {
        spec.run = Some((start, section.len()));
    }
    spec.run?;
    Some(spec)
}

/// Format the absolute scaled value into the digit core: rounding, integer
/// zero-padding, grouping, and trailing-zero trimming for `#` decimals.
fn format_core(abs: f64, spec: &SectionSpec) -> String {
    let factor = 10f64.powi(spec.max_decimals as i32);
    // round half away from zero, the way spreadsheet display does
    let rounded = (abs * factor).round() / factor;
    let fixed = format!("{:.*}", spec.max_decimals, rounded);

    let mut parts = fixed.splitn(2, '.');
    let int_part = parts.next().unwrap_or("0");
    let mut frac_part = parts.next().unwrap_or("").to_string();

    while frac_part.len() > spec.min_decimals && frac_part.ends_with('0') {
        frac_part.pop();
    }

    let mut int_digits = int_part.to_string();
    while int_digits.len() < spec.min_int_digits {
        int_digits.insert(0, '0');
    }
    if spec.grouping {
        int_digits = insert_commas(&int_digits);
    }

    if frac_part.is_empty() {
        int_digits
    } else {
        format!("{int_digits}.{frac_part}")
    }
}

/// Walk the section emitting literals, substituting the core value for the
/// digit-placeholder run.
fn emit_section(out: &mut String, value: f64, section: &str, spec: &SectionSpec, core: &str) {
    let (run_start, run_end) = spec.run.unwrap_or((usize::MAX, usize::MAX));
    let mut in_quotes = false;
    let mut iter = section.char_indices().peekable();

    while let Some((i, c)) = iter.next() {
        if i >= run_start && i < run_end {
            if i == run_start {
                out.push_str(core);
            }
            continue;
        }
        match c {
            '"' if !in_quotes => in_quotes = true,
            '"' => in_quotes = false,
            _ if in_quotes => out.push(c),
            '\\' => {
                if let Some((_, next)) = iter.next() {
                    out.push(next);
                }
            }
            '_' => {
                iter.next();
                out.push(' ');
            }
            '*' => {
                iter.next();
            }
            '[' => {
                for (_, next) in iter.by_ref() {
                    if next == ']' {
                        break;
                    }
                }
            }
            '@' => out.push_str(&invariant(value)),
            _ => out.push(c),
        }
    }
}

/// Scientific notation: mantissa decimals and exponent digits come from the
/// pattern, and multi-digit integer groups ("##0.0E+0") step the exponent
/// the engineering way.
fn render_scientific(value: f64, section: &str, spec: &SectionSpec) -> String {
    let group = section
        .split(['E', 'e'])
        .next()
        .map(|m| m.chars().filter(|c| matches!(c, '0' | '#' | '?')).count())
        .filter(|&n| n > 0)
        .map(|m| {
            // placeholders after the dot belong to the mantissa decimals
            m.saturating_sub(spec.max_decimals).max(1)
        })
        .unwrap_or(1) as i32;

    let always_sign = section.contains("E+") || section.contains("e+");
    let exp_digits = section
        .rsplit(['+', '-'])
        .next()
        .map(|tail| tail.chars().take_while(|&c| c == '0').count())
        .unwrap_or(1)
        .max(1);

    let abs = value.abs();
    let exponent = if abs == 0.0 {
        0
    } else {
        let raw = abs.log10().floor() as i32;
        raw.div_euclid(group) * group
    };
    let mantissa = if abs == 0.0 {
        0.0
    } else {
        abs / 10f64.powi(exponent)
    };

    let sign = if value < 0.0 { "-" } else { "" };
    let exp_sign = if exponent < 0 {
        "-"
    } else if always_sign {
        "+"
    } else {
        ""
    };
    format!(
        "{sign}{:.*}E{exp_sign}{:0width$}",
        spec.max_decimals,
        mantissa,
        exponent.unsigned_abs(),
        width = exp_digits
    )
}

fn insert_commas(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let chars: Vec<char> = digits.chars().collect();
    let mut out = String::with_capacity(chars.len() + chars.len() / 3);
    for (idx, ch) in chars.iter().enumerate() {
        if idx > 0 && (chars.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(*ch);
    }
    out
}

fn push_padded(out: &mut String, value: i64, pad: bool) {
    if pad {
        out.push_str(&format!("{value:02}"));
    } else {
        out.push_str(&value.to_string());
    }
}

fn take_run<F: Fn(char) -> bool>(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    matches: F,
) -> usize {
    let mut count = 0;
    while let Some(&next) = chars.peek() {
        if matches(next) {
            count += 1;
            chars.next();
        } else {
            break;
        }
    }
    count
}

fn month_name(month: u32, full: bool) -> &'static str {
    const SHORT: [&str; 12] = [
        "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
    ];
    const FULL: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    let idx = (month.clamp(1, 12) - 1) as usize;
    if full {
        FULL[idx]
    } else {
        SHORT[idx]
    }
}

fn weekday_name(weekday: Weekday, full: bool) -> &'static str {
    match (weekday, full) {
        (Weekday::Mon, false) => "Mon",
        (Weekday::Tue, false) => "Tue",
        (Weekday::Wed, false) => "Wed",
        (Weekday::Thu, false) => "Thu",
        (Weekday::Fri, false) => "Fri",
        (Weekday::Sat, false) => "Sat",
        (Weekday::Sun, false) => "Sun",
        (Weekday::Mon, true) => "Monday",
        (Weekday::Tue, true) => "Tuesday",
        (Weekday::Wed, true) => "Wednesday",
        (Weekday::Thu, true) => "Thursday",
        (Weekday::Fri, true) => "Friday",
        (Weekday::Sat, true) => "Saturday",
        (Weekday::Sun, true) => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_patterns() {
        assert_eq!(render_number(42.0, "0"), "42");
        assert_eq!(render_number(42.4, "0"), "42");
        assert_eq!(render_number(42.5, "0"), "43");
        assert_eq!(render_number(42.0, "00000"), "00042");
    }

    #[test]
    fn test_decimal_patterns() {
        assert_eq!(render_number(1234.567, "0.00"), "1234.57");
        assert_eq!(render_number(5.0, "0.00"), "5.00");
        assert_eq!(render_number(-5.0, "0.00"), "-5.00");
        assert_eq!(render_number(1.5, "0.0#"), "1.5");
        assert_eq!(render_number(1.25, "0.0#"), "1.25");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(render_number(1_234_567.0, "#,##0"), "1,234,567");
        assert_eq!(render_number(999.0, "#,##0"), "999");
        assert_eq!(render_number(1234.5, "#,##0.00"), "1,234.50");
    }

    #[test]
    fn test_percent_scaling() {
        assert_eq!(render_number(0.42, "0%"), "42%");
        assert_eq!(render_number(0.4213, "0.00%"), "42.13%");
    }

    #[test]
    fn test_sign_sections() {
        assert_eq!(render_number(1234.0, "#,##0 ;(#,##0)"), "1,234 ");
        assert_eq!(render_number(-1234.0, "#,##0 ;(#,##0)"), "(1,234)");
        assert_eq!(render_number(-1234.5, "#,##0.00;[Red](#,##0.00)"), "(1,234.50)");
    }

    #[test]
    fn test_scientific() {
        assert_eq!(render_number(12345.0, "0.00E+00"), "1.23E+04");
        assert_eq!(render_number(0.0012345, "0.00E+00"), "1.23E-03");
        assert_eq!(render_number(12345.0, "##0.0E+0"), "12.3E+3");
        assert_eq!(render_number(0.0, "0.00E+00"), "0.00E+00");
    }

    #[test]
    fn test_fraction_degrades_to_invariant() {
        assert_eq!(render_number(0.5, "# ?/?"), "0.5");
        assert_eq!(render_number(2.75, "# ??/??"), "2.75");
    }

    #[test]
    fn test_quoted_literals() {
        assert_eq!(render_number(5.0, "0.00\" kg\""), "5.00 kg");
    }

    #[test]
    fn test_invariant_digits() {
        assert_eq!(invariant(3.0), "3");
        assert_eq!(invariant(1234.5), "1234.5");
        assert_eq!(invariant(-0.25), "-0.25");
    }

    #[test]
    fn test_date_serial_epoch_offsets() {
        // 25569 is the Unix epoch in day-serial terms
        assert_eq!(render_serial_date(25569.0, "d/M/yyyy").unwrap(), "1/1/1970");
        assert_eq!(render_serial_date(44197.0, "d/M/yyyy").unwrap(), "1/1/2021");
        assert_eq!(render_serial_date(44197.0, "d-MMM-yy").unwrap(), "1-Jan-21");
        assert_eq!(render_serial_date(44197.0, "MMM-yy").unwrap(), "Jan-21");
    }

    #[test]
    fn test_time_patterns() {
        assert_eq!(render_serial_date(25569.5, "H:mm").unwrap(), "12:00");
        assert_eq!(render_serial_date(25569.75, "H:mm:ss").unwrap(), "18:00:00");
        assert_eq!(render_serial_date(25569.75, "h:mm tt").unwrap(), "6:00 PM");
        assert_eq!(render_serial_date(25569.25, "h:mm tt").unwrap(), "6:00 AM");
        assert_eq!(
            render_serial_date(44197.5, "M/d/yyyy H:mm").unwrap(),
            "1/1/2021 12:00"
        );
    }

    #[test]
    fn test_elapsed_and_fractional() {
        assert_eq!(render_serial_date(1.5, "[h]:mm:ss").unwrap(), "36:00:00");
        assert_eq!(render_serial_date(0.5, "mm:ss").unwrap(), "00:00");
        // 90.5 seconds into the day
        let serial = 90.5 / 86_400.0;
        assert_eq!(render_serial_date(serial, "mmss.0").unwrap(), "0130.5");
    }

    #[test]
    fn test_weekday_names() {
        // 2021-01-01 was a Friday
        assert_eq!(render_serial_date(44197.0, "ddd").unwrap(), "Fri");
        assert_eq!(render_serial_date(44197.0, "dddd").unwrap(), "Friday");
    }

    #[test]
    fn test_invalid_serial() {
        assert!(render_serial_date(f64::NAN, "d/M/yyyy").is_err());
        assert!(render_serial_date(f64::INFINITY, "d/M/yyyy").is_err());
        assert!(render_serial_date(3_000_000.0, "d/M/yyyy").is_err());
    }
}
