use std::{
    collections::HashMap,
    fs::File,
    io::{self, Read},
    path::{Path, PathBuf},
};

use itertools::Itertools;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Input file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("Failed to parse {input}: {reason}")]
    Parse { input: String, reason: String },
    #[error("Cannot compute a range over {0}: table has no rows")]
    EmptyInput(String),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A single benchmark measurement, tagged with the partition it was run on
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    fields: HashMap<String, String>,
    partition: String,
}

impl Row {
    pub fn new<K, V>(fields: impl IntoIterator<Item = (K, V)>, partition: &str) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            partition: partition.to_owned(),
        }
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// The field parsed as a number, `None` when absent or not numeric
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(|v| v.trim().parse::<f64>().ok())
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }
}

/// Ordered benchmark rows. A freshly loaded table carries a single partition
/// label, a combined one carries the labels of everything it was built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    source: String,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(source: &str, rows: Vec<Row>) -> Self {
        Self {
            source: source.to_owned(),
            rows,
        }
    }

    /// Reads a benchmark csv and tags every row with `partition`.
    ///
    /// The header must contain `value_field` and every data row must hold a
    /// number in that column. A header-only file yields an empty table.
    pub fn load(path: &Path, partition: &str, value_field: &str) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TableError::FileNotFound(path.to_path_buf()),
            _ => TableError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        Self::from_reader(file, partition, value_field, &path.display().to_string())
    }

    pub fn from_reader<R: Read>(
        reader: R,
        partition: &str,
        value_field: &str,
        source: &str,
    ) -> Result<Self, TableError> {
        let parse_err = |reason: String| TableError::Parse {
            input: source.to_owned(),
            reason,
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr
            .headers()
            .map_err(|e| parse_err(format!("invalid header: {e}")))?
            .clone();
        let value_idx = headers
            .iter()
            .position(|h| h == value_field)
            .ok_or_else(|| parse_err(format!("missing column {value_field}")))?;

        let mut rows = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let record = record.map_err(|e| parse_err(e.to_string()))?;
            let value = record.get(value_idx).unwrap_or_default();
            if value.parse::<f64>().is_err() {
                return Err(parse_err(format!(
                    "row {}: {value:?} in column {value_field} is not a number",
                    i + 1
                )));
            }
            rows.push(Row::new(headers.iter().zip(record.iter()), partition));
        }

        debug!("Loaded {} rows from {source} as {partition}", rows.len());
        Ok(Self::new(source, rows))
    }

    /// Concatenates two tables, `first`'s rows followed by `second`'s
    pub fn combine(first: Table, second: Table) -> Table {
        let source = format!("{} + {}", first.source, second.source);
        let mut rows = first.rows;
        rows.extend(second.rows);
        Table { source, rows }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct partition labels in order of first appearance
    pub fn partitions(&self) -> Vec<&str> {
        self.rows.iter().map(Row::partition).unique().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, io::Cursor};

    use tempfile::tempdir;

    use super::*;
    use crate::THROUGHPUT_FIELD;

    fn table(data: &str, partition: &str) -> Table {
        Table::from_reader(Cursor::new(data), partition, THROUGHPUT_FIELD, "test").unwrap()
    }

    #[test]
    fn load_tags_every_row() {
        let t = table("Size,Throughput[GB/s]\n15,100.0\n16,150.0\n", "Media");
        assert_eq!(t.len(), 2);
        assert_eq!(t.rows()[0].number("Size"), Some(15.0));
        assert_eq!(t.rows()[0].number(THROUGHPUT_FIELD), Some(100.0));
        assert_eq!(t.rows()[1].number("Size"), Some(16.0));
        assert_eq!(t.rows()[1].number(THROUGHPUT_FIELD), Some(150.0));
        assert!(t.rows().iter().all(|r| r.partition() == "Media"));
    }

    #[test]
    fn header_only_is_empty() {
        let t = table("X,Y,Z,Throughput[GB/s]\n", "Knl");
        assert!(t.is_empty());
        assert!(t.partitions().is_empty());
    }

    #[test]
    fn missing_value_column() {
        let err = Table::from_reader(
            Cursor::new("Size,Time[s]\n15,0.1\n"),
            "Media",
            THROUGHPUT_FIELD,
            "skl.csv",
        )
        .unwrap_err();
        match err {
            TableError::Parse { input, reason } => {
                assert_eq!(input, "skl.csv");
                assert!(reason.contains(THROUGHPUT_FIELD));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn non_numeric_value() {
        let err = Table::from_reader(
            Cursor::new("Size,Throughput[GB/s]\n15,fast\n"),
            "Media",
            THROUGHPUT_FIELD,
            "skl.csv",
        )
        .unwrap_err();
        assert!(matches!(err, TableError::Parse { .. }));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn ragged_row_is_parse_error() {
        let err = Table::from_reader(
            Cursor::new("Size,Throughput[GB/s]\n15,1.0,7\n"),
            "Media",
            THROUGHPUT_FIELD,
            "skl.csv",
        )
        .unwrap_err();
        assert!(matches!(err, TableError::Parse { .. }));
    }

    #[test]
    fn load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("skl.csv");
        fs::write(&path, "Size, Throughput[GB/s]\n15, 100.0\n16, 150.0\n17, 90.5\n").unwrap();
        let t = Table::load(&path, "Media", THROUGHPUT_FIELD).unwrap();
        assert_eq!(t.len(), 3);
        assert_eq!(t.rows()[2].number(THROUGHPUT_FIELD), Some(90.5));
        assert_eq!(t.source(), path.display().to_string());
    }

    #[test]
    fn load_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nope.csv");
        match Table::load(&path, "Media", THROUGHPUT_FIELD) {
            Err(TableError::FileNotFound(p)) => assert_eq!(p, path),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn combine_keeps_order_and_labels() {
        let a = table("Size,Throughput[GB/s]\n15,1\n16,2\n", "Media");
        let b = table("Size,Throughput[GB/s]\n15,3\n16,4\n17,5\n", "Knl");
        let (a_rows, b_rows) = (a.rows().to_vec(), b.rows().to_vec());

        let c = Table::combine(a, b);
        assert_eq!(c.len(), 5);
        assert_eq!(&c.rows()[..2], a_rows.as_slice());
        assert_eq!(&c.rows()[2..], b_rows.as_slice());
        assert_eq!(c.partitions(), vec!["Media", "Knl"]);
        assert_eq!(c.source(), "test + test");
    }

    #[test]
    fn combine_with_empty() {
        let a = table("Size,Throughput[GB/s]\n", "Media");
        let b = table("Size,Throughput[GB/s]\n15,3\n", "Knl");
        let c = Table::combine(a, b);
        assert_eq!(c.len(), 1);
        assert_eq!(c.rows()[0].partition(), "Knl");
    }
}
