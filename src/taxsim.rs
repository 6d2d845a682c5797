//! TAXSIM-35 input translation
//!
//! Converts whitespace-delimited TAXSIM-35 input files (32 numeric columns,
//! first line a header) into CSV input rows for the tax calculator.

use log::info;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Number of columns in a TAXSIM-35 input row
pub const TAXSIM_COLUMNS: usize = 32;

/// Most EITC-qualifying children the calculator distinguishes
pub const MAX_EIC_CHILDREN: i64 = 3;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("INPUT file named {0} does not exist")]
    MissingInput(PathBuf),

    #[error("must specify OUTPUT file name")]
    MissingOutputName,

    #[error("line {line}: expected {TAXSIM_COLUMNS} columns, found {found}")]
    ColumnCount { line: usize, found: usize },

    #[error("line {line} column {column}: cannot parse '{value}' as a number")]
    Parse {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("record {recid}: marital status {mstat} is neither 1 nor 2")]
    MaritalStatus { recid: i64, mstat: i64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, TranslateError>;

/// One TAXSIM-35 input row, columns numbered from 1
#[derive(Debug, Clone, PartialEq)]
pub struct TaxsimRecord {
    columns: [f64; TAXSIM_COLUMNS],
}

impl TaxsimRecord {
    pub fn new(columns: [f64; TAXSIM_COLUMNS]) -> Self {
        Self { columns }
    }

    /// Value of 1-based column `n`, which must be in `1..=TAXSIM_COLUMNS`
    fn col(&self, n: usize) -> f64 {
        self.columns[n - 1]
    }

    fn int(&self, n: usize) -> i64 {
        self.col(n) as i64
    }
}

/// Tax-calculator input row, serialized with the calculator's column names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TcInputRow {
    #[serde(rename = "RECID")]
    pub recid: i64,
    #[serde(rename = "FLPDYR")]
    pub flpdyr: i64,
    pub age_head: i64,
    pub age_spouse: i64,
    #[serde(rename = "MARS")]
    pub mars: i64,
    pub f2441: i64,
    pub n24: i64,
    #[serde(rename = "EIC")]
    pub eic: i64,
    #[serde(rename = "XTOT")]
    pub xtot: i64,
    pub e00200p: f64,
    pub e00200s: f64,
    pub e00200: f64,
    pub e00650: f64,
    pub e00600: f64,
    pub e00300: f64,
    pub p22250: f64,
    pub p23250: f64,
    pub e02000: f64,
    pub e00800: f64,
    pub e01700: f64,
    pub e01500: f64,
    pub e02400: f64,
    pub e02300: f64,
    pub e18500: f64,
    pub e18400: f64,
    pub e32800: f64,
    pub e19200: f64,
    pub e26270: f64,
    pub e00900p: f64,
    pub e00900s: f64,
    pub e00900: f64,
    #[serde(rename = "PT_SSTB_income")]
    pub pt_sstb_income: i64,
}

/// Read TAXSIM-35 records; the first line is a header and blank lines are skipped
pub fn read_records<R: Read>(reader: R) -> Result<Vec<TaxsimRecord>> {
    let mut records = Vec::new();
    for (idx, line) in BufReader::new(reader).lines().enumerate().skip(1) {
        let line = line?;
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.is_empty() {
            continue;
        }
        if fields.len() != TAXSIM_COLUMNS {
            return Err(TranslateError::ColumnCount {
                line: line_no,
                found: fields.len(),
            });
        }
        let mut columns = [0.0; TAXSIM_COLUMNS];
        for (i, field) in fields.iter().enumerate() {
            columns[i] = field.parse().map_err(|_| TranslateError::Parse {
                line: line_no,
                column: i + 1,
                value: field.to_string(),
            })?;
        }
        records.push(TaxsimRecord::new(columns));
    }
    Ok(records)
}

/// Translate one TAXSIM-35 record.
///
/// State code (3), non-taxable transfers (22), rent paid (23) and the
/// professional-income flags (30, 32) have no calculator counterpart.
pub fn translate(record: &TaxsimRecord) -> Result<TcInputRow> {
    let recid = record.int(1);
    let mstat = record.int(4);
    let num_deps = record.int(7);
    let mars = match mstat {
        1 if num_deps > 0 => 4,
        1 => 1,
        2 => 2,
        _ => return Err(TranslateError::MaritalStatus { recid, mstat }),
    };
    let num_taxpayers = if mars == 2 { 2 } else { 1 };

    let e00200p = record.col(11);
    let e00200s = record.col(12);
    let e00650 = record.col(13);
    let e01700 = record.col(19);
    let e00900p = record.col(29);
    let e00900s = record.col(31);

    Ok(TcInputRow {
        recid,
        flpdyr: record.int(2),
        age_head: record.int(5),
        age_spouse: record.int(6),
        mars,
        f2441: record.int(8),
        n24: record.int(9),
        eic: record.int(10).min(MAX_EIC_CHILDREN),
        xtot: num_taxpayers + num_deps,
        e00200p,
        e00200s,
        e00200: e00200p + e00200s,
        e00650,
        e00600: e00650,
        e00300: record.col(14),
        p22250: record.col(15),
        p23250: record.col(16),
        e02000: record.col(17),
        e00800: record.col(18),
        e01700,
        e01500: e01700,
        e02400: record.col(20),
        e02300: record.col(21),
        e18500: record.col(24),
        e18400: record.col(25),
        e32800: record.col(26),
        e19200: record.col(27),
        e26270: record.col(28),
        e00900p,
        e00900s,
        e00900: e00900p + e00900s,
        pt_sstb_income: 0,
    })
}

/// Write translated rows as CSV with a header line
pub fn write_rows<W: Write>(writer: W, rows: &[TcInputRow]) -> Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Translate a TAXSIM-35 file into a calculator input file.
///
/// Any existing output file is replaced. Returns the number of rows written.
pub fn prepare_input_file(input: &Path, output: &Path) -> Result<usize> {
    if !input.is_file() {
        return Err(TranslateError::MissingInput(input.to_path_buf()));
    }
    if output.as_os_str().is_empty() {
        return Err(TranslateError::MissingOutputName);
    }
    if output.is_file() {
        fs::remove_file(output)?;
    }

    let records = read_records(File::open(input)?)?;
    let rows = records.iter().map(translate).collect::<Result<Vec<_>>>()?;
    write_rows(File::create(output)?, &rows)?;
    info!(
        "Translated {} TAXSIM records from {} into {}",
        rows.len(),
        input.display(),
        output.display()
    );
    Ok(rows.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "taxsimid year state mstat page sage depx dep13 dep17 dep18 \
        pwages swages dividends intrec stcg ltcg otherprop nonprop pensions gssi \
        ui transfers rentpaid proptax otheritem childcare mortgage scorp pbusinc \
        pprofinc sbusinc sprofinc";

    fn row(recid: i64, mstat: i64, deps: i64, eitc_kids: i64) -> String {
        let mut cols = vec![0.0; TAXSIM_COLUMNS];
        cols[0] = recid as f64;
        cols[1] = 2020.0;
        cols[3] = mstat as f64;
        cols[4] = 40.0;
        cols[5] = if mstat == 2 { 38.0 } else { 0.0 };
        cols[6] = deps as f64;
        cols[9] = eitc_kids as f64;
        cols[10] = 50000.0;
        cols[11] = 25000.0;
        cols[12] = 300.0;
        cols[18] = 1200.0;
        cols[28] = 1000.0;
        cols[30] = 500.5;
        cols.iter().map(|c| c.to_string()).collect::<Vec<_>>().join("  ")
    }

    fn parse(lines: &[String]) -> Vec<TaxsimRecord> {
        let text = format!("{}\n{}\n", HEADER, lines.join("\n"));
        read_records(text.as_bytes()).unwrap()
    }

    #[test]
    fn test_filing_status_and_household_size() {
        let records = parse(&[row(1, 1, 0, 0), row(2, 1, 2, 5), row(3, 2, 3, 2)]);
        let rows: Vec<TcInputRow> = records.iter().map(|r| translate(r).unwrap()).collect();

        assert_eq!((rows[0].mars, rows[0].xtot, rows[0].eic), (1, 1, 0));
        assert_eq!((rows[1].mars, rows[1].xtot, rows[1].eic), (4, 3, 3));
        assert_eq!((rows[2].mars, rows[2].xtot, rows[2].eic), (2, 5, 2));
        assert_eq!(rows[2].age_spouse, 38);
    }

    #[test]
    fn test_income_totals() {
        let records = parse(&[row(7, 2, 0, 0)]);
        let tc = translate(&records[0]).unwrap();
        assert_eq!(tc.recid, 7);
        assert_eq!(tc.flpdyr, 2020);
        assert_eq!(tc.e00200, 75000.0);
        assert_eq!(tc.e00600, 300.0);
        assert_eq!(tc.e01500, 1200.0);
        assert_eq!(tc.e00900, 1500.5);
        assert_eq!(tc.pt_sstb_income, 0);
    }

    #[test]
    fn test_bad_marital_status() {
        let records = parse(&[row(9, 3, 0, 0)]);
        let err = translate(&records[0]).unwrap_err();
        assert!(matches!(err, TranslateError::MaritalStatus { recid: 9, mstat: 3 }));
    }

    #[test]
    fn test_malformed_lines() {
        let short = format!("{}\n1 2020 0 1\n", HEADER);
        assert!(matches!(
            read_records(short.as_bytes()),
            Err(TranslateError::ColumnCount { line: 2, found: 4 })
        ));

        let bad = format!("{}\n{}\n", HEADER, row(1, 1, 0, 0).replacen("2020", "x", 1));
        assert!(matches!(
            read_records(bad.as_bytes()),
            Err(TranslateError::Parse { line: 2, column: 2, .. })
        ));
    }

    #[test]
    fn test_csv_header_order() {
        let records = parse(&[row(1, 1, 0, 0)]);
        let rows = vec![translate(&records[0]).unwrap()];
        let mut out = Vec::new();
        write_rows(&mut out, &rows).unwrap();
        let text = String::from_utf8(out).unwrap();
        let header = text.lines().next().unwrap();
        assert!(header.starts_with("RECID,FLPDYR,age_head,age_spouse,MARS,f2441,n24,EIC,XTOT,"));
        assert!(header.ends_with("e00900p,e00900s,e00900,PT_SSTB_income"));
        assert_eq!(text.lines().count(), 2);
    }

    #[test]
    fn test_prepare_input_file() {
        let dir = std::env::temp_dir().join(format!("taxsim_test_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("in.txt");
        let output = dir.join("out.csv");
        fs::write(&input, format!("{}\n{}\n{}\n", HEADER, row(1, 1, 0, 0), row(2, 2, 1, 1))).unwrap();
        fs::write(&output, "stale").unwrap();

        assert_eq!(prepare_input_file(&input, &output).unwrap(), 2);
        let text = fs::read_to_string(&output).unwrap();
        assert!(text.starts_with("RECID,"));
        assert_eq!(text.lines().count(), 3);

        assert!(matches!(
            prepare_input_file(&dir.join("missing.txt"), &output),
            Err(TranslateError::MissingInput(_))
        ));
        assert!(matches!(
            prepare_input_file(&input, Path::new("")),
            Err(TranslateError::MissingOutputName)
        ));
        fs::remove_dir_all(&dir).unwrap();
    }
}
