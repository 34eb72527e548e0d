//! Input validation, split in three layers:
//!
//! - [`validate_structure`]: cheap text pre-filter before parsing;
//! - [`validate_record`]: collected checks on a parsed record;
//! - [`validate_date`]: stricter standalone calendar check.
//!
//! Record validation never fails fast: every applicable problem is reported
//! in one pass so the operator can fix the report once.

use crate::fields::field_to_label;
use crate::parser::DailyRecord;
use chrono::{Datelike, Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound for any single field; larger values are almost certainly
/// typos in a daily report.
const MAX_FIELD_VALUE: f64 = 1_000_000.0;

static DATE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+月\d+日销售日报").expect("date header pattern"));
static DATE_SHAPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}-\d{2}$").expect("MM-DD pattern"));

/// Structural pre-check on raw text: non-empty, has the date header, and at
/// least two non-blank lines.
pub fn validate_structure(text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("输入文本为空".to_string());
    }
    if !DATE_HEADER.is_match(text) {
        return Err("未找到日期标题 (格式: X月Y日销售日报)".to_string());
    }
    let lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    if lines < 2 {
        return Err("输入内容太少，请确认格式正确".to_string());
    }
    Ok(())
}

/// Validate a parsed record. All errors are collected; date format is the
/// only prerequisite (range checks need a well-formed date).
pub fn validate_record(record: &DailyRecord) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if record.date.is_empty() {
        errors.push("日期为空".to_string());
    } else if !DATE_SHAPE.is_match(&record.date) {
        errors.push(format!("日期格式错误: {} (应为 MM-DD 格式)", record.date));
    } else {
        let (m, d) = record.date.split_once('-').unwrap_or(("0", "0"));
        let month: u32 = m.parse().unwrap_or(0);
        let day: u32 = d.parse().unwrap_or(0);
        if !(1..=12).contains(&month) {
            errors.push(format!("月份无效: {month}"));
        }
        if !(1..=31).contains(&day) {
            errors.push(format!("日期无效: {day}"));
        }
    }

    for (field, value) in record.iter() {
        let Some(v) = value else { continue };
        let label = field_to_label(field);
        if v < 0.0 {
            errors.push(format!("字段 {label} 的值不能为负数: {v}"));
        } else if v > MAX_FIELD_VALUE {
            errors.push(format!("字段 {label} 的值过大: {v} (请确认)"));
        }
    }

    if record.iter().all(|(_, v)| v.is_none()) {
        errors.push("所有数据字段都为空，请确认输入".to_string());
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Strict calendar check on a month/day pair: day must exist in the month
/// (Feb 29 resolved against the current year), and the date must not be
/// more than one day in the future.
pub fn validate_date(month: u32, day: u32) -> Result<(), String> {
    validate_date_at(month, day, Local::now().date_naive())
}

fn validate_date_at(month: u32, day: u32, today: NaiveDate) -> Result<(), String> {
    const DAYS_IN_MONTH: [u32; 12] = [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

    if !(1..=12).contains(&month) {
        return Err(format!("月份无效: {month} (应在 1-12 之间)"));
    }
    if !(1..=31).contains(&day) {
        return Err(format!("日期无效: {day} (应在 1-31 之间)"));
    }
    if day > DAYS_IN_MONTH[(month - 1) as usize] {
        return Err(format!("{month}月不能有{day}日"));
    }

    // Feb 29 only exists in leap years; from_ymd_opt resolves that against
    // the current year, same as the original tool.
    let date = NaiveDate::from_ymd_opt(today.year(), month, day)
        .ok_or_else(|| format!("日期无效: {month}月{day}日"))?;
    if date > today && (date - today).num_days() > 1 {
        return Err(format!("日期 {month}月{day}日 在未来，请确认"));
    }
    Ok(())
}
