use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::table::{Table, TableError};

/// Inclusive span of values shared by both panels of a chart
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f64,
    pub max: f64,
}

impl AxisRange {
    /// Adds `padding` to the upper bound, leaving the lower bound untouched
    pub fn padded(self, padding: f64) -> Self {
        Self {
            min: self.min,
            max: self.max + padding,
        }
    }
}

/// Global min and max of `field` over both tables.
///
/// Fails with [`TableError::EmptyInput`] if either table has no rows.
pub fn find_range(a: &Table, b: &Table, field: &str) -> Result<AxisRange, TableError> {
    for table in [a, b] {
        if table.is_empty() {
            return Err(TableError::EmptyInput(table.source().to_owned()));
        }
    }

    let mut range = AxisRange {
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };
    for table in [a, b] {
        for (i, row) in table.rows().iter().enumerate() {
            let value = row.number(field).ok_or_else(|| TableError::Parse {
                input: table.source().to_owned(),
                reason: format!("row {}: no numeric {field}", i + 1),
            })?;
            range.min = range.min.min(value);
            range.max = range.max.max(value);
        }
    }

    debug!("{field} spans {} to {}", range.min, range.max);
    Ok(range)
}
