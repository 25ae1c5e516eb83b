// Checkpoint column layout and cell codecs
//
// Reading is lenient so checkpoints written by pandas (`True`/`False`,
// integer columns rendered as `250.0`, `NaN` cells) load unchanged.

use cnfsweep_core::domain::{InputIdentifier, ResultRecord};
use cnfsweep_core::error::{AppError, Result};
use csv::StringRecord;

/// Column order of a written checkpoint
pub const CHECKPOINT_HEADER: [&str; 5] = ["filename", "seconds", "sat", "nof_vars", "nof_clauses"];

/// Positions of the checkpoint columns in a file's header
#[derive(Debug, Clone, Copy)]
pub(crate) struct ColumnIndex {
    filename: usize,
    seconds: usize,
    sat: usize,
    nof_vars: Option<usize>,
    nof_clauses: Option<usize>,
}

impl ColumnIndex {
    pub(crate) fn from_headers(headers: &StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| {
                AppError::CheckpointFormat(format!("missing required column '{}'", name))
            })
        };

        Ok(Self {
            filename: require("filename")?,
            seconds: require("seconds")?,
            sat: require("sat")?,
            nof_vars: find("nof_vars"),
            nof_clauses: find("nof_clauses"),
        })
    }

    pub(crate) fn parse_row(
        &self,
        row: &StringRecord,
    ) -> std::result::Result<(InputIdentifier, ResultRecord), String> {
        let cell = |idx: usize| row.get(idx).unwrap_or("");
        let optional_cell = |idx: Option<usize>| idx.map(cell).unwrap_or("");

        let filename = cell(self.filename);
        if filename.is_empty() {
            return Err("empty filename".to_string());
        }

        let record = ResultRecord {
            seconds: parse_seconds(cell(self.seconds))?,
            sat: parse_sat(cell(self.sat))?,
            nof_vars: parse_count(optional_cell(self.nof_vars))?,
            nof_clauses: parse_count(optional_cell(self.nof_clauses))?,
        };

        Ok((filename.to_string(), record))
    }
}

fn is_null(cell: &str) -> bool {
    matches!(cell, "" | "nan" | "NaN" | "None" | "null" | "NULL")
}

fn parse_seconds(cell: &str) -> std::result::Result<f64, String> {
    let cell = cell.trim();
    match cell.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(format!("invalid seconds value '{}'", cell)),
    }
}

fn parse_sat(cell: &str) -> std::result::Result<Option<bool>, String> {
    let cell = cell.trim();
    match cell {
        c if is_null(c) => Ok(None),
        "True" | "true" | "TRUE" | "1" | "1.0" => Ok(Some(true)),
        "False" | "false" | "FALSE" | "0" | "0.0" => Ok(Some(false)),
        other => Err(format!("invalid sat value '{}'", other)),
    }
}

fn parse_count(cell: &str) -> std::result::Result<Option<u64>, String> {
    let cell = cell.trim();
    if is_null(cell) {
        return Ok(None);
    }
    if let Ok(count) = cell.parse::<u64>() {
        return Ok(Some(count));
    }
    match cell.parse::<f64>() {
        Ok(value) if value >= 0.0 && value.fract() == 0.0 && value <= u64::MAX as f64 => {
            Ok(Some(value as u64))
        }
        _ => Err(format!("invalid count value '{}'", cell)),
    }
}

/// Render one checkpoint row in `CHECKPOINT_HEADER` order
pub(crate) fn format_row(id: &str, record: &ResultRecord) -> [String; 5] {
    let sat = match record.sat {
        Some(true) => "True".to_string(),
        Some(false) => "False".to_string(),
        None => String::new(),
    };
    let count = |value: Option<u64>| value.map(|v| v.to_string()).unwrap_or_default();

    [
        id.to_string(),
        format!("{:?}", record.seconds),
        sat,
        count(record.nof_vars),
        count(record.nof_clauses),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(cols: &[&str]) -> StringRecord {
        StringRecord::from(cols.to_vec())
    }

    #[test]
    fn test_parse_sat_variants() {
        assert_eq!(parse_sat("True"), Ok(Some(true)));
        assert_eq!(parse_sat("false"), Ok(Some(false)));
        assert_eq!(parse_sat(" 1 "), Ok(Some(true)));
        assert_eq!(parse_sat(""), Ok(None));
        assert_eq!(parse_sat("NaN"), Ok(None));
        assert!(parse_sat("maybe").is_err());
    }

    #[test]
    fn test_parse_count_accepts_float_rendering() {
        assert_eq!(parse_count("250"), Ok(Some(250)));
        assert_eq!(parse_count("250.0"), Ok(Some(250)));
        assert_eq!(parse_count(""), Ok(None));
        assert!(parse_count("12.5").is_err());
        assert!(parse_count("-3").is_err());
    }

    #[test]
    fn test_parse_seconds_rejects_garbage() {
        assert_eq!(parse_seconds("0.75"), Ok(0.75));
        assert_eq!(parse_seconds("500"), Ok(500.0));
        assert!(parse_seconds("").is_err());
        assert!(parse_seconds("-1").is_err());
        assert!(parse_seconds("inf").is_err());
    }

    #[test]
    fn test_columns_located_by_name() {
        let index = ColumnIndex::from_headers(&headers(&[
            "sat",
            "filename",
            "nof_clauses",
            "seconds",
        ]))
        .unwrap();

        let row = StringRecord::from(vec!["False", "f/1.cnf", "1065.0", "2.5"]);
        let (id, record) = index.parse_row(&row).unwrap();

        assert_eq!(id, "f/1.cnf");
        assert_eq!(record.seconds, 2.5);
        assert_eq!(record.sat, Some(false));
        assert_eq!(record.nof_vars, None);
        assert_eq!(record.nof_clauses, Some(1065));
    }

    #[test]
    fn test_missing_required_column() {
        let err = ColumnIndex::from_headers(&headers(&["filename", "sat"])).unwrap_err();
        assert!(err.to_string().contains("seconds"));
    }

    #[test]
    fn test_format_row() {
        let row = format_row("a.cnf", &ResultRecord::new(60.0, Some(true), 250, 1065));
        assert_eq!(row, ["a.cnf", "60.0", "True", "250", "1065"]);

        let row = format_row("b.cnf", &ResultRecord::placeholder(0.5));
        assert_eq!(row, ["b.cnf", "0.5", "", "", ""]);
    }
}
