//! Daily report parser.
//!
//! Turns pasted Chinese report text like
//!
//! ```text
//! 10月28日销售日报
//! 大众美团 144
//! 储值卡核销 505
//! 4. 储值卡充值: 1000
//! ```
//!
//! into a [`DailyRecord`]. Parsing is a pure function: the same text always
//! yields the same record.

use crate::fields::{FieldId, FIELD_TABLE, field_to_label};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

/// Date header announcing a daily report, e.g. "10月28日销售日报".
static DATE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)月(\d+)日销售日报").expect("date header pattern"));

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("输入文本为空")]
    EmptyInput,
    #[error("未找到日期信息，请确认格式为 'X月Y日销售日报'")]
    MissingDate,
}

/// One day's parsed report: a mandatory `MM-DD` date plus all 13 fields,
/// each individually nullable. Null means "no data", never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyRecord {
    pub date: String,
    values: BTreeMap<FieldId, Option<f64>>,
}

impl DailyRecord {
    pub fn new(date: impl Into<String>) -> Self {
        let values = FieldId::ALL.iter().map(|f| (*f, None)).collect();
        Self { date: date.into(), values }
    }

    pub fn get(&self, field: FieldId) -> Option<f64> {
        self.values.get(&field).copied().flatten()
    }

    pub fn set(&mut self, field: FieldId, value: Option<f64>) {
        self.values.insert(field, value);
    }

    /// All fields in id order, null or not.
    pub fn iter(&self) -> impl Iterator<Item = (FieldId, Option<f64>)> + '_ {
        self.values.iter().map(|(f, v)| (*f, *v))
    }

    pub fn non_empty_count(&self) -> usize {
        self.values.values().filter(|v| v.is_some()).count()
    }
}

/// Parse report text into a [`DailyRecord`].
///
/// The date header may appear anywhere in the text; the first match wins.
/// Each non-empty line is matched against the field table in declaration
/// order and contributes to at most one field. A label with no trailing
/// number records an explicit null for that field.
pub fn parse_daily_report(text: &str) -> Result<DailyRecord, ParseError> {
    if text.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }

    let caps = DATE_HEADER.captures(text).ok_or(ParseError::MissingDate)?;
    let month: u32 = caps[1].parse().map_err(|_| ParseError::MissingDate)?;
    let day: u32 = caps[2].parse().map_err(|_| ParseError::MissingDate)?;

    let mut record = DailyRecord::new(format!("{month:02}-{day:02}"));

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        for (label, field) in FIELD_TABLE {
            if let Some(pos) = line.find(label) {
                let rest = &line[pos + label.len()..];
                record.set(field, read_value(rest));
                break;
            }
        }
    }

    Ok(record)
}

/// Read the optional numeric token following a matched label: optional
/// separators (whitespace, half/full-width colon) then digits with an
/// optional decimal part. Returns None when the label stands alone.
fn read_value(rest: &str) -> Option<f64> {
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == ':' || c == '：');
    let mut token = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.peek() {
        if c.is_ascii_digit() {
            token.push(*c);
            chars.next();
        } else {
            break;
        }
    }
    if token.is_empty() {
        return None;
    }
    if chars.peek() == Some(&'.') {
        token.push('.');
        chars.next();
        while let Some(c) = chars.peek() {
            if c.is_ascii_digit() {
                token.push(*c);
                chars.next();
            } else {
                break;
            }
        }
    }
    token.parse::<f64>().ok()
}

/// Readable rendering of a record for the operator, non-null fields only.
pub fn format_record(record: &DailyRecord) -> String {
    let mut lines = vec![format!("日期: {}", record.date)];
    let mut any = false;
    for (field, value) in record.iter() {
        if let Some(v) = value {
            lines.push(format!("  {}: {}", field_to_label(field), format_value(v)));
            any = true;
        }
    }
    if !any {
        lines.push("  (无数据)".to_string());
    }
    lines.join("\n")
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}
