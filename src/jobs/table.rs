use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{DashError, Result};
use crate::jobs::record::{parse_status, Facet, JobRecord};

/// Columns every row must carry. A table without them would aggregate into
/// empty charts instead of failing, so it is rejected up front.
pub const REQUIRED_COLUMNS: [&str; 5] = ["LABEL", "PROJECT", "PROCTYPE", "USER", "STATUS"];

/// Columns that default to an empty string when a row omits them.
pub const OPTIONAL_COLUMNS: [&str; 3] = ["LASTMOD", "WALLTIME", "JOBID"];

/// Ordered snapshot of job records. Duplicates are kept as delivered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct JobTable {
    records: Vec<JobRecord>,
}

impl JobTable {
    pub fn new(records: Vec<JobRecord>) -> Self {
        Self { records }
    }

    /// Parse a JSON array of row objects, validating every row.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        Self::from_json_value(value)
    }

    pub fn from_json_value(value: Value) -> Result<Self> {
        let rows = match value {
            Value::Array(rows) => rows,
            other => {
                return Err(DashError::MalformedTable(format!(
                    "expected an array of rows, got {}",
                    json_kind(&other)
                )))
            }
        };

        let records = rows
            .into_iter()
            .enumerate()
            .map(|(i, row)| match row {
                Value::Object(cells) => record_from_row(i, &cells),
                other => Err(DashError::MalformedTable(format!(
                    "row {} is {}, expected an object",
                    i,
                    json_kind(&other)
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { records })
    }

    pub fn records(&self) -> &[JobRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, JobRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct values of a facet, sorted, for populating selectors.
    pub fn distinct_values(&self, facet: Facet) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.facet_value(facet))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl FromIterator<JobRecord> for JobTable {
    fn from_iter<I: IntoIterator<Item = JobRecord>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a JobTable {
    type Item = &'a JobRecord;
    type IntoIter = std::slice::Iter<'a, JobRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

fn record_from_row(row: usize, cells: &Map<String, Value>) -> Result<JobRecord> {
    if let Some(column) = REQUIRED_COLUMNS
        .into_iter()
        .find(|column| !cells.contains_key(*column))
    {
        return Err(DashError::MissingColumn { row, column });
    }

    let required = |column: &'static str| -> Result<String> {
        match cells.get(column) {
            Some(value) => cell_string(row, column, value),
            None => Err(DashError::MissingColumn { row, column }),
        }
    };
    let optional = |column: &'static str| -> Result<String> {
        match cells.get(column) {
            Some(value) => cell_string(row, column, value),
            None => Ok(String::new()),
        }
    };

    let status = parse_status(row, &required("STATUS")?)?;
    let [lastmod, walltime, jobid] = OPTIONAL_COLUMNS.map(optional);

    Ok(JobRecord {
        label: required("LABEL")?,
        project: required("PROJECT")?,
        proctype: required("PROCTYPE")?,
        user: required("USER")?,
        status,
        lastmod: lastmod?,
        walltime: walltime?,
        jobid: jobid?,
    })
}

// Null cells read as empty; numbers are accepted for id-like columns.
fn cell_string(row: usize, column: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        Value::Number(n) if column == "JOBID" => Ok(n.to_string()),
        other => Err(DashError::MalformedTable(format!(
            "row {} column {} is {}, expected a string",
            row,
            column,
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
