//! Daily sales report -> Excel ledger automation.
//!
//! Parses freeform Chinese daily sales reports, validates the extracted
//! record, and appends a styled row with derived-column formulas to the
//! persistent tracking workbook. See each module for details:
//!
//! - [`fields`]: label <-> field dictionary
//! - [`parser`]: text -> [`parser::DailyRecord`]
//! - [`validator`]: structural/record/date checks
//! - [`ledger`]: row insertion, formulas, styling, backup, save
//! - [`report`]: read-only monthly aggregation

pub mod config;
pub mod fields;
pub mod ledger;
pub mod parser;
pub mod report;
pub mod validator;
