//! Small shared helpers for grid rendering and date handling

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use unicode_width::UnicodeWidthChar;

/// Truncate a string to a display width, appending an ellipsis when cut.
///
/// Width is measured in terminal cells (CJK and emoji count as two), so a
/// truncated cell never overflows its grid column.
pub fn fit_cell(s: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }

    let total: usize = s.chars().map(|c| c.width().unwrap_or(0)).sum();
    if total <= max_width {
        return s.to_string();
    }

    // One cell is reserved for the ellipsis marker
    let content_width = max_width - 1;
    let mut width = 0;
    let mut out = String::new();
    for c in s.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > content_width {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push('…');
    out
}

/// Render an optional timestamp the way the grids show it
pub fn fmt_ts(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => String::new(),
    }
}

/// Parse an operator-typed date: `2026-08-07`, `2026-08-07 13:45:00`,
/// or full RFC 3339. A bare date means start of that day, UTC.
pub fn parse_user_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(t) = DateTime::parse_from_rfc3339(input) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&t));
    }
    if let Ok(d) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&d.and_hms_opt(0, 0, 0)?));
    }
    None
}

/// Yes/no marker for boolean grid cells
pub fn fmt_bool(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_cell_shorter_than_width() {
        assert_eq!(fit_cell("audit", 10), "audit");
    }

    #[test]
    fn test_fit_cell_truncates_with_ellipsis() {
        let cell = fit_cell("averylongbackendname", 8);
        assert!(cell.ends_with('…'));
        assert!(cell.chars().count() <= 8);
    }

    #[test]
    fn test_fit_cell_handles_wide_characters() {
        // Each CJK character occupies two cells
        assert_eq!(fit_cell("網關控制台", 4), "網…");
    }

    #[test]
    fn test_fit_cell_zero_width() {
        assert_eq!(fit_cell("anything", 0), "");
    }

    #[test]
    fn test_parse_user_date_variants() {
        assert!(parse_user_date("2026-08-07").is_some());
        assert!(parse_user_date("2026-08-07 13:45:00").is_some());
        assert!(parse_user_date("2026-08-07T13:45:00Z").is_some());
        assert!(parse_user_date("not a date").is_none());
        assert!(parse_user_date("").is_none());
    }

    #[test]
    fn test_fmt_ts_renders_empty_for_none() {
        assert_eq!(fmt_ts(None), "");
        let t = Utc.with_ymd_and_hms(2026, 8, 7, 9, 30, 0).unwrap();
        assert_eq!(fmt_ts(Some(t)), "2026-08-07 09:30:00");
    }
}
