use common::{config::XAxis, table::Table};

use crate::ChartError;

/// The points of one partition on one panel
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub points: Vec<(f64, f64)>,
}

/// Splits a table into one series per partition, in order of first appearance.
///
/// With [`XAxis::Field`] the points are sorted by x. With [`XAxis::Index`] the
/// x of the `i`th row of a partition is `start + i`.
pub fn build_series(
    table: &Table,
    x_axis: &XAxis,
    y_field: &str,
) -> Result<Vec<Series>, ChartError> {
    let missing = |row: usize, field: &str| ChartError::MissingField {
        input: table.source().to_owned(),
        row: row + 1,
        field: field.to_owned(),
    };

    table
        .partitions()
        .into_iter()
        .map(|partition| -> Result<Series, ChartError> {
            let mut points = table
                .rows()
                .iter()
                .enumerate()
                .filter(|(_, row)| row.partition() == partition)
                .enumerate()
                .map(|(i, (row_idx, row))| -> Result<(f64, f64), ChartError> {
                    let x = match x_axis {
                        XAxis::Field { field } => {
                            row.number(field).ok_or_else(|| missing(row_idx, field.as_str()))?
                        }
                        XAxis::Index { start } => (*start + i as i64) as f64,
                    };
                    let y = row
                        .number(y_field)
                        .ok_or_else(|| missing(row_idx, y_field))?;
                    Ok((x, y))
                })
                .collect::<Result<Vec<_>, _>>()?;
            if let XAxis::Field { .. } = x_axis {
                points.sort_by(|a, b| a.0.total_cmp(&b.0));
            }
            Ok(Series {
                label: partition.to_owned(),
                points,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use common::THROUGHPUT_FIELD;

    use super::*;

    fn table(data: &str, partition: &str) -> Table {
        Table::from_reader(Cursor::new(data), partition, THROUGHPUT_FIELD, partition).unwrap()
    }

    #[test]
    fn field_axis_sorts_by_x() {
        let t = Table::combine(
            table("Size,Throughput[GB/s]\n17,3\n15,1\n16,2\n", "Media"),
            table("Size,Throughput[GB/s]\n15,10\n16,20\n", "Knl"),
        );
        let series = build_series(&t, &XAxis::Field { field: "Size".into() }, THROUGHPUT_FIELD)
            .unwrap();
        assert_eq!(
            series,
            vec![
                Series {
                    label: "Media".into(),
                    points: vec![(15.0, 1.0), (16.0, 2.0), (17.0, 3.0)],
                },
                Series {
                    label: "Knl".into(),
                    points: vec![(15.0, 10.0), (16.0, 20.0)],
                },
            ]
        );
    }

    #[test]
    fn index_axis_restarts_per_partition() {
        let t = Table::combine(
            table("X,Y,Z,Throughput[GB/s]\n64,64,64,3\n128,64,64,1\n", "Media"),
            table("X,Y,Z,Throughput[GB/s]\n64,64,64,5\n128,64,64,4\n", "Knl"),
        );
        let series = build_series(&t, &XAxis::Index { start: 5 }, THROUGHPUT_FIELD).unwrap();
        assert_eq!(series[0].points, vec![(5.0, 3.0), (6.0, 1.0)]);
        assert_eq!(series[1].points, vec![(5.0, 5.0), (6.0, 4.0)]);
    }

    #[test]
    fn missing_x_field() {
        let t = table("X,Y,Z,Throughput[GB/s]\n64,64,64,3\n", "Media");
        let err = build_series(&t, &XAxis::Field { field: "Size".into() }, THROUGHPUT_FIELD)
            .unwrap_err();
        match err {
            ChartError::MissingField { row, field, .. } => {
                assert_eq!(row, 1);
                assert_eq!(field, "Size");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn empty_table_has_no_series() {
        let t = table("Size,Throughput[GB/s]\n", "Media");
        assert!(
            build_series(&t, &XAxis::Index { start: 0 }, THROUGHPUT_FIELD)
                .unwrap()
                .is_empty()
        );
    }
}
