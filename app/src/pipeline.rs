use std::path::{Path, PathBuf};

use common::{
    config::{BenchPlot, ChartStyle, Source},
    range::find_range,
    table::{Table, TableError},
};
use eyre::{Result, WrapErr};
use tracing::debug;

/// Loads, combines and plots one benchmark, returning the files written
pub fn run(
    plot: &BenchPlot,
    style: &ChartStyle,
    data_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<PathBuf>> {
    let shared = load_mode(&plot.inputs.shared, &plot.y_field, data_dir)
        .wrap_err("Loading shared memory results")?;
    let distributed = load_mode(&plot.inputs.distributed, &plot.y_field, data_dir)
        .wrap_err("Loading distributed memory results")?;
    debug!(
        "{}: {} shared rows, {} distributed rows",
        plot.name,
        shared.len(),
        distributed.len()
    );

    let range = find_range(&shared, &distributed, &plot.y_field)?.padded(plot.padding);
    let written = throughput_plot::render(&shared, &distributed, range, plot, style, out_dir)?;
    Ok(written)
}

/// Loads every source of one memory mode and concatenates them in order
pub fn load_mode(sources: &[Source], field: &str, data_dir: &Path) -> Result<Table, TableError> {
    let tables = sources
        .iter()
        .map(|s| Table::load(&data_dir.join(&s.path), &s.partition, field))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tables.into_iter().reduce(Table::combine).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use common::{
        THROUGHPUT_FIELD,
        config::{Inputs, PanelTitles, Ticks, XAxis},
    };
    use tempfile::tempdir;
    use throughput_plot::ChartError;

    use super::*;

    fn bench(outputs: &[&str]) -> BenchPlot {
        BenchPlot {
            name: "reduction".into(),
            inputs: Inputs {
                shared: vec![
                    Source::new("skl-shared.csv", "Media"),
                    Source::new("knl-shared.csv", "Knl"),
                ],
                distributed: vec![
                    Source::new("skl-dist.csv", "Media"),
                    Source::new("knl-dist.csv", "Knl"),
                ],
            },
            x_axis: XAxis::Field {
                field: "Size".into(),
            },
            y_field: THROUGHPUT_FIELD.into(),
            x_label: "#Elements in powers of two".into(),
            y_label: "Throughput [GB/s]".into(),
            titles: PanelTitles {
                shared: "Shared Memory".into(),
                distributed: "Distributed Memory".into(),
            },
            ticks: Ticks::Auto,
            x_limits: None,
            log_scale: true,
            padding: 200.0,
            figure_size: (800, 400),
            tick_label_size: None,
            rotate_tick_labels: false,
            outputs: outputs.iter().map(PathBuf::from).collect(),
        }
    }

    fn write_inputs(dir: &Path, dist_knl: &str) {
        let rows = "Size,Throughput[GB/s]\n15,100.0\n16,150.0\n";
        fs::write(dir.join("skl-shared.csv"), rows).unwrap();
        fs::write(dir.join("knl-shared.csv"), rows).unwrap();
        fs::write(dir.join("skl-dist.csv"), rows).unwrap();
        fs::write(dir.join("knl-dist.csv"), dist_knl).unwrap();
    }

    #[test]
    fn load_mode_concatenates_in_order() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), "Size,Throughput[GB/s]\n15,90.0\n16,200.0\n17,210.0\n");
        let plot = bench(&["reduction.png"]);

        let table = load_mode(&plot.inputs.distributed, THROUGHPUT_FIELD, dir.path()).unwrap();
        assert_eq!(table.len(), 5);
        assert_eq!(table.partitions(), vec!["Media", "Knl"]);
        assert_eq!(table.rows()[2].number(THROUGHPUT_FIELD), Some(90.0));
    }

    #[test]
    fn missing_csv_names_the_file() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), "Size,Throughput[GB/s]\n15,90.0\n");
        fs::remove_file(dir.path().join("knl-shared.csv")).unwrap();

        let err = run(
            &bench(&["reduction.png"]),
            &ChartStyle::default(),
            dir.path(),
            dir.path(),
        )
        .unwrap_err();
        match err.downcast_ref::<TableError>() {
            Some(TableError::FileNotFound(path)) => {
                assert_eq!(path, &dir.path().join("knl-shared.csv"))
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn header_only_csv_stops_before_rendering() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_inputs(dir.path(), "Size,Throughput[GB/s]\n");
        fs::write(dir.path().join("skl-dist.csv"), "Size,Throughput[GB/s]\n").unwrap();

        let err = run(
            &bench(&["reduction.png"]),
            &ChartStyle::default(),
            dir.path(),
            out.path(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TableError>(),
            Some(TableError::EmptyInput(_))
        ));
        assert!(fs::read_dir(out.path()).unwrap().next().is_none());
    }

    #[test]
    fn writes_every_output() {
        let dir = tempdir().unwrap();
        let out = tempdir().unwrap();
        write_inputs(dir.path(), "Size,Throughput[GB/s]\n15,90.0\n16,200.0\n");

        let written = run(
            &bench(&["reduction.png", "reduction.pdf"]),
            &ChartStyle::default(),
            dir.path(),
            out.path(),
        )
        .unwrap();
        assert_eq!(
            written,
            vec![out.path().join("reduction.png"), out.path().join("reduction.pdf")]
        );
        assert!(fs::metadata(&written[0]).unwrap().len() > 0);
        assert!(fs::read(&written[1]).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn unknown_output_format_is_a_chart_error() {
        let dir = tempdir().unwrap();
        write_inputs(dir.path(), "Size,Throughput[GB/s]\n15,90.0\n16,200.0\n");

        let err = run(
            &bench(&["reduction.jpg"]),
            &ChartStyle::default(),
            dir.path(),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ChartError>(),
            Some(ChartError::UnsupportedFormat(_))
        ));
    }
}
