//! Read-only reporting over the ledger.
//!
//! Consumes the formula-evaluated view of the sheet (calamine exposes the
//! cached values, not the formula text) and groups rows by the month
//! extracted from column A's `MM-DD` string. Never mutates the file; row
//! insertion belongs to [`crate::ledger`] alone.

use crate::ledger::{FIRST_DATA_ROW, LedgerError, SHEET_NAME};
use calamine::{Data, DataType, Reader, open_workbook_auto};
use std::collections::BTreeMap;
use std::path::Path;

/// Evaluated totals of one ledger row.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyTotals {
    pub date: String,
    pub month: u32,
    /// Column B: venue subtotal.
    pub venue: f64,
    /// Column I: store subtotal.
    pub store: f64,
    /// Column Q: revenue.
    pub revenue: f64,
    /// Column R: combined total including recharges.
    pub combined: f64,
}

/// Aggregates for one month of data rows.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlySummary {
    pub month: u32,
    pub days: usize,
    pub venue: f64,
    pub store: f64,
    pub revenue: f64,
    pub revenue_mean: f64,
    pub peak_revenue: f64,
    pub peak_date: String,
}

fn number_at(range: &calamine::Range<Data>, row: u32, col: u32) -> f64 {
    range
        .get_value((row, col))
        .and_then(|c| {
            c.as_f64()
                .or_else(|| c.as_string().and_then(|s| s.trim().parse().ok()))
        })
        .unwrap_or(0.0)
}

/// Load the evaluated per-day totals from the data region.
pub fn load_daily_totals(path: &Path) -> Result<Vec<DailyTotals>, LedgerError> {
    if !path.exists() {
        return Err(LedgerError::FileNotFound(path.to_path_buf()));
    }
    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|n| n == SHEET_NAME) {
        return Err(LedgerError::SheetNotFound);
    }
    let range = workbook.worksheet_range(SHEET_NAME)?;
    let last_row = range.end().map(|(r, _)| r).unwrap_or(0);

    let mut out = Vec::new();
    for r in (FIRST_DATA_ROW - 1)..=last_row {
        let Some(date) = range.get_value((r, 0)).and_then(|c| c.as_string()) else {
            continue;
        };
        let date = date.trim().to_string();
        if date.is_empty() {
            continue;
        }
        let Some(month) = month_of(&date) else { continue };
        out.push(DailyTotals {
            date,
            month,
            venue: number_at(&range, r, 1),    // B
            store: number_at(&range, r, 8),    // I
            revenue: number_at(&range, r, 16), // Q
            combined: number_at(&range, r, 17), // R
        });
    }
    Ok(out)
}

/// Month from a `MM-DD` date string; None for anything malformed.
pub fn month_of(date: &str) -> Option<u32> {
    let (m, _) = date.split_once('-')?;
    let month: u32 = m.parse().ok()?;
    (1..=12).contains(&month).then_some(month)
}

/// Group daily totals by month, in month order.
pub fn summarize_by_month(rows: &[DailyTotals]) -> Vec<MonthlySummary> {
    let mut by_month: BTreeMap<u32, Vec<&DailyTotals>> = BTreeMap::new();
    for row in rows {
        by_month.entry(row.month).or_default().push(row);
    }

    by_month
        .into_iter()
        .map(|(month, days)| {
            let venue: f64 = days.iter().map(|d| d.venue).sum();
            let store: f64 = days.iter().map(|d| d.store).sum();
            let revenue: f64 = days.iter().map(|d| d.revenue).sum();
            let peak = days
                .iter()
                .max_by(|a, b| a.revenue.total_cmp(&b.revenue))
                .map(|d| (d.revenue, d.date.clone()))
                .unwrap_or((0.0, String::new()));
            MonthlySummary {
                month,
                days: days.len(),
                venue,
                store,
                revenue,
                revenue_mean: revenue / days.len() as f64,
                peak_revenue: peak.0,
                peak_date: peak.1,
            }
        })
        .collect()
}

/// Currency rendering for terminal output: thousands grouping, two
/// decimals for fractional values, `0` for null.
pub fn format_currency(value: Option<f64>) -> String {
    let Some(v) = value else { return "0".to_string() };
    if v.fract() == 0.0 {
        group_thousands(&format!("{}", v as i64))
    } else {
        let s = format!("{v:.2}");
        match s.split_once('.') {
            Some((int, frac)) => format!("{}.{}", group_thousands(int), frac),
            None => group_thousands(&s),
        }
    }
}

fn group_thousands(digits: &str) -> String {
    let (sign, digits) = match digits.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", digits),
    };
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    format!("{sign}{out}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn day(date: &str, venue: f64, store: f64, revenue: f64) -> DailyTotals {
        DailyTotals {
            date: date.to_string(),
            month: month_of(date).expect("month"),
            venue,
            store,
            revenue,
            combined: revenue,
        }
    }

    #[test]
    fn month_extraction() {
        assert_eq!(month_of("10-28"), Some(10));
        assert_eq!(month_of("03-05"), Some(3));
        assert_eq!(month_of("13-05"), None);
        assert_eq!(month_of("invalid"), None);
    }

    #[test]
    fn monthly_grouping_and_means() {
        let rows = vec![
            day("09-30", 100.0, 10.0, 110.0),
            day("10-01", 200.0, 20.0, 220.0),
            day("10-02", 400.0, 40.0, 440.0),
        ];
        let summary = summarize_by_month(&rows);
        assert_eq!(summary.len(), 2);
        assert_eq!(summary[0].month, 9);
        assert_eq!(summary[0].days, 1);
        assert_eq!(summary[1].month, 10);
        assert_eq!(summary[1].days, 2);
        assert_abs_diff_eq!(summary[1].venue, 600.0, epsilon = 1e-9);
        assert_abs_diff_eq!(summary[1].revenue_mean, 330.0, epsilon = 1e-9);
        assert_eq!(summary[1].peak_date, "10-02");
        assert_abs_diff_eq!(summary[1].peak_revenue, 440.0, epsilon = 1e-9);
    }

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(None), "0");
        assert_eq!(format_currency(Some(144.0)), "144");
        assert_eq!(format_currency(Some(1000.0)), "1,000");
        assert_eq!(format_currency(Some(1234567.0)), "1,234,567");
        assert_eq!(format_currency(Some(505.5)), "505.50");
        assert_eq!(format_currency(Some(1000.123)), "1,000.12");
        assert_eq!(format_currency(Some(-1234.0)), "-1,234");
    }
}
