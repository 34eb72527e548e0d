//! Ledger row engine: insertion into the persistent Excel tracking sheet.
//!
//! The sheet layout is fixed: `每日数据`, rows 1-2 reserved for the header,
//! one data row per day from row 3, 18 columns A..R. Column A holds the
//! date as a literal `MM-DD` string; B, I, Q and R are formula columns
//! evaluated by Excel itself.
//!
//! [`Ledger::open`] loads the whole workbook into memory (calamine
//! releases the file handle before returning): the daily sheet as
//! structured rows, every sibling sheet as carried cells so nothing else
//! in the user's workbook is lost. [`Ledger::save`] rewrites the workbook
//! deterministically from that model. Nothing touches the file between
//! the two, so any failure before `save` leaves it untouched.

use crate::fields::FieldId;
use crate::parser::DailyRecord;
use calamine::{Data, DataType, Reader, open_workbook_auto};
use chrono::Local;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatPattern, Formula, Workbook, Worksheet};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Name of the daily data sheet inside the workbook.
pub const SHEET_NAME: &str = "每日数据";

/// First data row, 1-indexed. Rows 1-2 are header/reserved.
pub const FIRST_DATA_ROW: u32 = 3;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("Excel文件不存在: {0}")]
    FileNotFound(PathBuf),
    #[error("Excel文件中未找到'{SHEET_NAME}'工作表")]
    SheetNotFound,
    #[error("打开Excel文件失败: {0}")]
    Open(#[from] calamine::Error),
    #[error("保存文件失败，请确认文件未被其他程序占用: {0}")]
    Save(#[from] rust_xlsxwriter::XlsxError),
    #[error("创建备份失败: {0}")]
    Backup(#[from] std::io::Error),
}

/// What a column holds. The assignment is fixed and never varies per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnBinding {
    Date,
    Field(FieldId),
    Formula,
}

/// The 18-column layout, A through R.
pub const COLUMNS: [(char, ColumnBinding); 18] = [
    ('A', ColumnBinding::Date),
    ('B', ColumnBinding::Formula), // venue subtotal =C+D+E+F+G+H
    ('C', ColumnBinding::Field(FieldId::Meituan)),
    ('D', ColumnBinding::Field(FieldId::StoredCardRedemption)),
    ('E', ColumnBinding::Field(FieldId::Douyin)),
    ('F', ColumnBinding::Field(FieldId::CoachingRedemption)),
    ('G', ColumnBinding::Field(FieldId::Wechat)),
    ('H', ColumnBinding::Field(FieldId::Alipay)),
    ('I', ColumnBinding::Formula), // store subtotal =J+K+L
    ('J', ColumnBinding::Field(FieldId::Water)),
    ('K', ColumnBinding::Field(FieldId::Gatorade)),
    ('L', ColumnBinding::Field(FieldId::Other)),
    ('M', ColumnBinding::Field(FieldId::TrialClass)),
    ('N', ColumnBinding::Field(FieldId::StoredCardRecharge)),
    ('O', ColumnBinding::Field(FieldId::PrivateCoachingRecharge)),
    ('P', ColumnBinding::Field(FieldId::MonthlyCard)),
    ('Q', ColumnBinding::Formula), // revenue =B+I+P
    ('R', ColumnBinding::Formula), // combined =B+I+M+N+O+P
];

/// Visual style for a column group. Plain values, cloned per cell; a fresh
/// `Format` is built for every cell application so no style instance is
/// ever shared between cells.
#[derive(Debug, Clone, PartialEq)]
pub struct CellStyle {
    pub fill: u32,
    pub font_name: &'static str,
    pub font_size: f64,
    pub font_color: u32,
    pub centered: bool,
}

impl CellStyle {
    fn to_format(&self) -> Format {
        let mut format = Format::new()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(self.fill))
            .set_font_name(self.font_name)
            .set_font_size(self.font_size)
            .set_font_color(Color::RGB(self.font_color));
        if self.centered {
            format = format.set_align(FormatAlign::Center);
        }
        format
    }
}

const fn style(fill: u32, font_color: u32) -> CellStyle {
    CellStyle { fill, font_name: "Cambria", font_size: 11.0, font_color, centered: true }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnSpan {
    Single(char),
    Range(char, char),
}

/// Style table: exact single-column entries first, then contiguous ranges
/// (inclusive bounds) tried in declaration order.
const STYLE_TABLE: [(ColumnSpan, CellStyle); 7] = [
    (ColumnSpan::Single('A'), style(0xB4A7D6, 0xFFFFFF)), // date
    (ColumnSpan::Single('B'), style(0x366092, 0xFFFF00)), // venue subtotal
    (ColumnSpan::Single('I'), style(0x366092, 0xFFFF00)), // store subtotal
    (ColumnSpan::Range('C', 'H'), style(0x5B9BD5, 0x000000)), // venue subcategories
    (ColumnSpan::Range('J', 'L'), style(0x5B9BD5, 0x000000)), // store items
    (ColumnSpan::Range('M', 'P'), style(0x366092, 0xFFFF00)), // recharges
    (ColumnSpan::Range('Q', 'R'), style(0xF4CCCC, 0xCC0000)), // totals
];

const DEFAULT_STYLE: CellStyle = style(0x5B9BD5, 0x000000);

/// Resolve the style for a column letter. Total: exact entry, then first
/// covering range, then the default. Returns an owned copy.
pub fn style_for_column(col: char) -> CellStyle {
    for (span, s) in &STYLE_TABLE {
        if let ColumnSpan::Single(c) = span {
            if *c == col {
                return s.clone();
            }
        }
    }
    for (span, s) in &STYLE_TABLE {
        if let ColumnSpan::Range(start, end) = span {
            if (*start..=*end).contains(&col) {
                return s.clone();
            }
        }
    }
    DEFAULT_STYLE
}

/// Formulas for the derived columns of one row, keyed by column letter.
/// Each refers only to cells of its own row.
pub fn compute_formulas(row: u32) -> BTreeMap<char, String> {
    BTreeMap::from([
        ('B', format!("=C{row}+D{row}+E{row}+F{row}+G{row}+H{row}")),
        ('I', format!("=J{row}+K{row}+L{row}")),
        ('Q', format!("=B{row}+I{row}+P{row}")),
        ('R', format!("=B{row}+I{row}+M{row}+N{row}+O{row}+P{row}")),
    ])
}

/// One in-memory data row. Absent values stay absent; they are written as
/// blank cells, never as zero.
#[derive(Debug, Clone, Default)]
struct DataRow {
    date: Option<String>,
    values: BTreeMap<FieldId, f64>,
}

impl DataRow {
    fn is_empty(&self) -> bool {
        self.date.is_none() && self.values.is_empty()
    }

    /// Sum of the raw values bound to columns `start..=end`; absent values
    /// count as zero, exactly as Excel treats blank cells in a sum.
    fn sum_columns(&self, start: char, end: char) -> f64 {
        COLUMNS
            .iter()
            .filter(|(l, _)| (start..=end).contains(l))
            .filter_map(|(_, b)| match b {
                ColumnBinding::Field(f) => self.values.get(f).copied(),
                _ => None,
            })
            .sum()
    }
}

/// A cell of a sheet this crate does not manage, carried through the
/// open/save round trip untouched.
#[derive(Debug, Clone)]
enum CarriedValue {
    Number(f64),
    Text(String),
    Bool(bool),
    Formula { text: String, result: Option<String> },
}

#[derive(Debug, Clone)]
struct CarriedCell {
    row: u32,
    col: u16,
    value: CarriedValue,
}

#[derive(Debug, Clone)]
struct CarriedSheet {
    name: String,
    cells: Vec<CarriedCell>,
}

/// The loaded ledger. Exclusive owner of mutation: readers use
/// [`crate::report`] instead.
pub struct Ledger {
    path: PathBuf,
    /// Rows 1-2 as text, written back verbatim on save.
    header: Vec<Vec<String>>,
    /// Data region; index 0 is sheet row `FIRST_DATA_ROW`.
    rows: Vec<DataRow>,
    /// Every other worksheet of the workbook, written back on save.
    carried: Vec<CarriedSheet>,
    /// Position of the daily sheet in the workbook's sheet order.
    daily_position: usize,
}

fn cell_text(cell: &Data) -> Option<String> {
    let s = cell.as_string()?;
    let s = s.trim().to_string();
    if s.is_empty() { None } else { Some(s) }
}

fn cell_number(cell: &Data) -> Option<f64> {
    if let Some(f) = cell.as_f64() {
        return Some(f);
    }
    cell.as_string().and_then(|s| s.trim().parse::<f64>().ok())
}

impl Ledger {
    /// Open the workbook and load it into memory: the `每日数据` sheet as
    /// structured rows, every sibling sheet as carried cells.
    pub fn open(path: &Path) -> Result<Self, LedgerError> {
        if !path.exists() {
            return Err(LedgerError::FileNotFound(path.to_path_buf()));
        }
        let mut workbook = open_workbook_auto(path)?;
        let sheet_names = workbook.sheet_names().to_owned();
        let daily_position = sheet_names
            .iter()
            .position(|n| n == SHEET_NAME)
            .ok_or(LedgerError::SheetNotFound)?;
        let range = workbook.worksheet_range(SHEET_NAME)?;
        let last_row = range.end().map(|(r, _)| r).unwrap_or(0);

        let mut header = Vec::new();
        for r in 0..(FIRST_DATA_ROW - 1).min(last_row + 1) {
            let mut cells = Vec::new();
            for c in 0..COLUMNS.len() as u32 {
                let text = range
                    .get_value((r, c))
                    .and_then(cell_text)
                    .unwrap_or_default();
                cells.push(text);
            }
            header.push(cells);
        }

        let mut rows = Vec::new();
        for r in (FIRST_DATA_ROW - 1)..=last_row {
            let mut row = DataRow {
                date: range.get_value((r, 0)).and_then(cell_text),
                values: BTreeMap::new(),
            };
            for (idx, (_, binding)) in COLUMNS.iter().enumerate() {
                if let ColumnBinding::Field(field) = binding {
                    if let Some(v) = range.get_value((r, idx as u32)).and_then(cell_number) {
                        row.values.insert(*field, v);
                    }
                }
            }
            rows.push(row);
        }
        // Drop trailing fully-empty rows so the append position stays stable.
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }

        let mut carried = Vec::new();
        for name in &sheet_names {
            if name != SHEET_NAME {
                carried.push(load_carried_sheet(&mut workbook, name)?);
            }
        }

        Ok(Self { path: path.to_path_buf(), header, rows, carried, daily_position })
    }

    /// First data row whose date cell is empty, or one past the last known
    /// row. 1-indexed sheet row.
    pub fn locate_insertion_row(&self) -> u32 {
        for (i, row) in self.rows.iter().enumerate() {
            if row.date.is_none() {
                return FIRST_DATA_ROW + i as u32;
            }
        }
        FIRST_DATA_ROW + self.rows.len() as u32
    }

    /// Exact string match against column A over the data region; first hit
    /// wins. `MM-DD` strings are compared bit-for-bit.
    pub fn check_duplicate_date(&self, date: &str) -> Option<u32> {
        self.rows
            .iter()
            .position(|r| r.date.as_deref() == Some(date))
            .map(|i| FIRST_DATA_ROW + i as u32)
    }

    /// Write the record into the insertion row of the in-memory model and
    /// return that row. Durable only after [`Ledger::save`]. Duplicate
    /// dates always land in a new row; there is no in-place overwrite.
    pub fn insert_record(&mut self, record: &DailyRecord) -> u32 {
        let row = self.locate_insertion_row();
        let idx = (row - FIRST_DATA_ROW) as usize;
        while self.rows.len() <= idx {
            self.rows.push(DataRow::default());
        }
        let slot = &mut self.rows[idx];
        slot.date = Some(record.date.clone());
        slot.values.clear();
        for (field, value) in record.iter() {
            if let Some(v) = value {
                slot.values.insert(field, v);
            }
        }
        row
    }

    /// Copy the file to a timestamped sibling
    /// (`basename_backup_YYYYMMDD_HHMMSS.ext`); the original is untouched.
    pub fn create_backup(&self) -> Result<PathBuf, LedgerError> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let backup = backup_path(&self.path, &timestamp);
        std::fs::copy(&self.path, &backup)?;
        Ok(backup)
    }

    /// Persist the in-memory model, rewriting the whole workbook in its
    /// original sheet order: the daily sheet from the structured rows,
    /// every carried sheet verbatim.
    pub fn save(&self) -> Result<(), LedgerError> {
        let mut workbook = Workbook::new();
        let mut carried = self.carried.iter();
        for position in 0..=self.carried.len() {
            if position == self.daily_position {
                let worksheet = workbook.add_worksheet().set_name(SHEET_NAME)?;
                self.write_daily_sheet(worksheet)?;
            } else if let Some(sheet) = carried.next() {
                let worksheet = workbook.add_worksheet().set_name(&sheet.name)?;
                write_carried_sheet(worksheet, sheet)?;
            }
        }
        workbook.save(&self.path)?;
        Ok(())
    }

    /// Daily sheet: header text, raw values, regenerated per-row formulas
    /// with their evaluated result cached, and a freshly built format per
    /// cell from the static style table.
    fn write_daily_sheet(&self, worksheet: &mut Worksheet) -> Result<(), LedgerError> {
        for (r, cells) in self.header.iter().enumerate() {
            for (c, text) in cells.iter().enumerate() {
                if !text.is_empty() {
                    worksheet.write_string(r as u32, c as u16, text)?;
                }
            }
        }

        for (i, row) in self.rows.iter().enumerate() {
            if row.is_empty() {
                continue;
            }
            let sheet_row = FIRST_DATA_ROW + i as u32;
            let formulas = compute_formulas(sheet_row);
            let venue = row.sum_columns('C', 'H');
            let store = row.sum_columns('J', 'L');
            let monthly = row.values.get(&FieldId::MonthlyCard).copied().unwrap_or(0.0);
            let revenue = venue + store + monthly;
            let combined = venue + store + row.sum_columns('M', 'P');
            for (idx, (letter, binding)) in COLUMNS.iter().enumerate() {
                let r = sheet_row - 1;
                let c = idx as u16;
                let format = style_for_column(*letter).to_format();
                match binding {
                    ColumnBinding::Date => match &row.date {
                        Some(d) => worksheet.write_string_with_format(r, c, d, &format)?,
                        None => worksheet.write_blank(r, c, &format)?,
                    },
                    ColumnBinding::Formula => {
                        // COLUMNS and compute_formulas agree on the formula columns.
                        let text = formulas.get(letter).map(String::as_str).unwrap_or("");
                        let result = match letter {
                            'B' => venue,
                            'I' => store,
                            'Q' => revenue,
                            _ => combined,
                        };
                        // Readers consume the cached result until Excel
                        // recalculates the file.
                        let formula = Formula::new(text).set_result(format_result(result));
                        worksheet.write_formula_with_format(r, c, formula, &format)?
                    }
                    ColumnBinding::Field(field) => match row.values.get(field) {
                        Some(v) => worksheet.write_number_with_format(r, c, *v, &format)?,
                        None => worksheet.write_blank(r, c, &format)?,
                    },
                };
            }
        }
        Ok(())
    }
}

fn load_carried_sheet(
    workbook: &mut calamine::Sheets<std::io::BufReader<std::fs::File>>,
    name: &str,
) -> Result<CarriedSheet, LedgerError> {
    let values = workbook.worksheet_range(name)?;
    let formula_range = workbook.worksheet_formula(name)?;

    let mut formulas: BTreeMap<(u32, u32), String> = BTreeMap::new();
    if let Some((start_row, start_col)) = formula_range.start() {
        for (i, row) in formula_range.rows().enumerate() {
            for (j, text) in row.iter().enumerate() {
                if !text.is_empty() {
                    formulas.insert((start_row + i as u32, start_col + j as u32), text.clone());
                }
            }
        }
    }

    let mut cells = Vec::new();
    if let Some((start_row, start_col)) = values.start() {
        for (i, row) in values.rows().enumerate() {
            for (j, cell) in row.iter().enumerate() {
                let (r, c) = (start_row + i as u32, start_col + j as u32);
                if c > u16::MAX as u32 {
                    continue;
                }
                let value = if let Some(text) = formulas.remove(&(r, c)) {
                    CarriedValue::Formula { text, result: cached_result(cell) }
                } else {
                    match cell {
                        Data::Empty => continue,
                        Data::Bool(b) => CarriedValue::Bool(*b),
                        _ => match cell.as_f64() {
                            Some(n) => CarriedValue::Number(n),
                            None => match cell.as_string() {
                                Some(s) => CarriedValue::Text(s),
                                None => continue,
                            },
                        },
                    }
                };
                cells.push(CarriedCell { row: r, col: c as u16, value });
            }
        }
    }
    // Formula cells with no cached value fall outside the value range.
    for ((r, c), text) in formulas {
        if c <= u16::MAX as u32 {
            cells.push(CarriedCell { row: r, col: c as u16, value: CarriedValue::Formula { text, result: None } });
        }
    }

    Ok(CarriedSheet { name: name.to_string(), cells })
}

fn write_carried_sheet(worksheet: &mut Worksheet, sheet: &CarriedSheet) -> Result<(), LedgerError> {
    for cell in &sheet.cells {
        match &cell.value {
            CarriedValue::Number(n) => worksheet.write_number(cell.row, cell.col, *n)?,
            CarriedValue::Text(s) => worksheet.write_string(cell.row, cell.col, s)?,
            CarriedValue::Bool(b) => worksheet.write_boolean(cell.row, cell.col, *b)?,
            CarriedValue::Formula { text, result } => {
                let mut formula = Formula::new(text.as_str());
                if let Some(r) = result {
                    formula = formula.set_result(r.as_str());
                }
                worksheet.write_formula(cell.row, cell.col, formula)?
            }
        };
    }
    Ok(())
}

/// Cached display value of a cell, for re-attaching to a carried formula.
fn cached_result(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::Bool(b) => Some(if *b { "TRUE" } else { "FALSE" }.to_string()),
        _ => match cell.as_f64() {
            Some(n) => Some(format_result(n)),
            None => cell.as_string(),
        },
    }
}

fn format_result(v: f64) -> String {
    if v.fract() == 0.0 { format!("{}", v as i64) } else { format!("{v}") }
}

fn backup_path(path: &Path, timestamp: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("ledger");
    let name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}_backup_{timestamp}.{ext}"),
        None => format!("{stem}_backup_{timestamp}"),
    };
    match path.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_daily_report;
    use approx::assert_abs_diff_eq;

    fn ledger_with_dates(dates: &[Option<&str>]) -> Ledger {
        let rows = dates
            .iter()
            .map(|d| DataRow { date: d.map(str::to_string), values: BTreeMap::new() })
            .collect();
        Ledger {
            path: PathBuf::from("测试台账.xlsx"),
            header: vec![vec![String::new(); 18]; 2],
            rows,
            carried: Vec::new(),
            daily_position: 0,
        }
    }

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sales_ledger_{}_{}.xlsx", std::process::id(), tag))
    }

    #[test]
    fn formulas_for_row_7() {
        let f = compute_formulas(7);
        assert_eq!(f[&'B'], "=C7+D7+E7+F7+G7+H7");
        assert_eq!(f[&'I'], "=J7+K7+L7");
        assert_eq!(f[&'Q'], "=B7+I7+P7");
        assert_eq!(f[&'R'], "=B7+I7+M7+N7+O7+P7");
        assert_eq!(f.len(), 4);
    }

    #[test]
    fn style_is_total_over_layout() {
        for (letter, _) in COLUMNS {
            // Resolution must succeed for every column; spot-check groups.
            let s = style_for_column(letter);
            assert_eq!(s.font_name, "Cambria");
        }
        assert_eq!(style_for_column('A').fill, 0xB4A7D6);
        assert_eq!(style_for_column('B'), style_for_column('I'));
        assert_eq!(style_for_column('C'), style_for_column('H'));
        assert_eq!(style_for_column('M').font_color, 0xFFFF00);
        assert_eq!(style_for_column('R').fill, 0xF4CCCC);
        // Unmapped columns fall back to the default.
        assert_eq!(style_for_column('Z'), DEFAULT_STYLE);
    }

    #[test]
    fn styles_are_fresh_instances() {
        let a = style_for_column('C');
        let mut b = style_for_column('C');
        b.font_size = 20.0;
        assert_ne!(a, b);
        assert_eq!(style_for_column('C'), a);
    }

    #[test]
    fn insertion_row_is_first_empty() {
        let ledger = ledger_with_dates(&[
            Some("10-22"),
            Some("10-23"),
            None,
            Some("10-25"),
        ]);
        assert_eq!(ledger.locate_insertion_row(), 5);
    }

    #[test]
    fn insertion_row_appends_when_full() {
        let dates: Vec<Option<&str>> = vec![
            Some("10-22"),
            Some("10-23"),
            Some("10-24"),
            Some("10-25"),
            Some("10-26"),
            Some("10-27"),
            Some("10-28"),
        ];
        let ledger = ledger_with_dates(&dates);
        // Rows 3..9 populated -> next is 10.
        assert_eq!(ledger.locate_insertion_row(), 10);
    }

    #[test]
    fn empty_ledger_starts_at_first_data_row() {
        let ledger = ledger_with_dates(&[]);
        assert_eq!(ledger.locate_insertion_row(), FIRST_DATA_ROW);
    }

    #[test]
    fn duplicate_date_detection() {
        let ledger = ledger_with_dates(&[Some("10-27"), Some("10-28")]);
        assert_eq!(ledger.check_duplicate_date("10-28"), Some(4));
        assert_eq!(ledger.check_duplicate_date("10-29"), None);
        // Bit-for-bit: an unpadded variant is not the same date string.
        assert_eq!(ledger.check_duplicate_date("10-8"), None);
    }

    #[test]
    fn insert_record_fills_the_insertion_row() {
        let mut ledger = ledger_with_dates(&[Some("10-28")]);
        let rec = parse_daily_report("10月29日销售日报\n大众美团 200\n抖音\n水 10").expect("parse");
        let row = ledger.insert_record(&rec);
        assert_eq!(row, 4);
        assert_eq!(ledger.check_duplicate_date("10-29"), Some(4));
        let slot = &ledger.rows[1];
        assert_eq!(slot.values.get(&FieldId::Meituan), Some(&200.0));
        assert_eq!(slot.values.get(&FieldId::Water), Some(&10.0));
        // Null stays absent, not zero.
        assert_eq!(slot.values.get(&FieldId::Douyin), None);
    }

    #[test]
    fn insert_reuses_a_gap_row() {
        let mut ledger = ledger_with_dates(&[Some("10-27"), None, Some("10-29")]);
        let rec = parse_daily_report("10月28日销售日报\n大众美团 1").expect("parse");
        assert_eq!(ledger.insert_record(&rec), 4);
        assert_eq!(ledger.rows.len(), 3);
    }

    #[test]
    fn column_layout_is_complete() {
        assert_eq!(COLUMNS.len(), 18);
        assert_eq!(COLUMNS[0], ('A', ColumnBinding::Date));
        let formula_cols: Vec<char> = COLUMNS
            .iter()
            .filter(|(_, b)| *b == ColumnBinding::Formula)
            .map(|(l, _)| *l)
            .collect();
        assert_eq!(formula_cols, vec!['B', 'I', 'Q', 'R']);
        // Every field id is bound to exactly one column.
        let bound: Vec<FieldId> = COLUMNS
            .iter()
            .filter_map(|(_, b)| match b {
                ColumnBinding::Field(f) => Some(*f),
                _ => None,
            })
            .collect();
        assert_eq!(bound.len(), FieldId::ALL.len());
        for f in FieldId::ALL {
            assert!(bound.contains(&f));
        }
    }

    #[test]
    fn sibling_sheets_survive_save() {
        let path = temp_path("siblings");

        let mut wb = Workbook::new();
        let daily = wb.add_worksheet().set_name(SHEET_NAME).expect("sheet name");
        daily.write_string(0, 0, "日期").expect("write");
        daily.write_string(2, 0, "10-27").expect("write");
        daily.write_number(2, 2, 100.0).expect("write");
        let monthly = wb.add_worksheet().set_name("月度汇总").expect("sheet name");
        monthly.write_string(0, 0, "月份").expect("write");
        monthly.write_number(1, 1, 42.0).expect("write");
        monthly
            .write_formula(2, 1, Formula::new("=B2*2").set_result("84"))
            .expect("write");
        wb.save(&path).expect("save fixture");

        let mut ledger = Ledger::open(&path).expect("open");
        let rec = parse_daily_report("10月28日销售日报\n大众美团 144").expect("parse");
        ledger.insert_record(&rec);
        ledger.save().expect("save");

        let mut reopened = open_workbook_auto(&path).expect("reopen");
        assert_eq!(reopened.sheet_names().to_owned(), vec![SHEET_NAME, "月度汇总"]);
        let range = reopened.worksheet_range("月度汇总").expect("range");
        assert_eq!(range.get_value((0, 0)).and_then(cell_text).as_deref(), Some("月份"));
        assert_eq!(range.get_value((1, 1)).and_then(|c| c.as_f64()), Some(42.0));
        assert_eq!(range.get_value((2, 1)).and_then(|c| c.as_f64()), Some(84.0));

        // The appended row itself also survived.
        let ledger = Ledger::open(&path).expect("open again");
        assert_eq!(ledger.check_duplicate_date("10-27"), Some(3));
        assert_eq!(ledger.check_duplicate_date("10-28"), Some(4));

        std::fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn formula_results_survive_save_round_trip() {
        let path = temp_path("totals");

        let mut wb = Workbook::new();
        let daily = wb.add_worksheet().set_name(SHEET_NAME).expect("sheet name");
        daily.write_string(0, 0, "日期").expect("write");
        wb.save(&path).expect("save fixture");

        let mut ledger = Ledger::open(&path).expect("open");
        let rec = parse_daily_report(
            "10月28日销售日报\n大众美团 144\n储值卡核销 505\n水 10\n月卡 300",
        )
        .expect("parse");
        assert_eq!(ledger.insert_record(&rec), 3);
        ledger.save().expect("save");

        let totals = crate::report::load_daily_totals(&path).expect("load");
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].date, "10-28");
        assert_abs_diff_eq!(totals[0].venue, 649.0, epsilon = 1e-9);
        assert_abs_diff_eq!(totals[0].store, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(totals[0].revenue, 959.0, epsilon = 1e-9);
        assert_abs_diff_eq!(totals[0].combined, 959.0, epsilon = 1e-9);

        std::fs::remove_file(&path).expect("cleanup");
    }

    #[test]
    fn backup_path_shape() {
        let p = backup_path(Path::new("Finance/财务跟踪表_完整版_KL.xlsx"), "20251028_143000");
        assert_eq!(
            p,
            PathBuf::from("Finance/财务跟踪表_完整版_KL_backup_20251028_143000.xlsx")
        );
        let p = backup_path(Path::new("ledger"), "20251028_143000");
        assert_eq!(p, PathBuf::from("ledger_backup_20251028_143000"));
    }
}
