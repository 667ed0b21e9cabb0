use std::path::PathBuf;

use common::{
    THROUGHPUT_FIELD,
    config::{BenchPlot, ChartStyle, Config, Inputs, PanelTitles, Source, Ticks, XAxis},
};

/// Machines the benchmarks were run on, as (file name tag, partition label)
const PLATFORMS: [(&str, &str); 2] = [("skl", "Media"), ("knl", "Knl")];

const Y_LABEL: &str = "Throughput [GB/s]";

/// The benchmarks plotted when no config file is given
pub fn builtin() -> Config {
    Config {
        style: ChartStyle::default(),
        benches: vec![reduction(), reduction_wide(), stencil(), symmetrize_openmp()],
    }
}

/// Expands `{mode}` and `{platform}` in `template` for both platforms
fn inputs(template: &str) -> Inputs {
    let sources = |mode: &str| {
        PLATFORMS
            .iter()
            .map(|(platform, partition)| {
                Source::new(
                    template
                        .replace("{mode}", mode)
                        .replace("{platform}", platform),
                    partition,
                )
            })
            .collect::<Vec<_>>()
    };
    Inputs {
        shared: sources("shared"),
        distributed: sources("dist"),
    }
}

fn titles(suffix: &str) -> PanelTitles {
    PanelTitles {
        shared: format!("Shared Memory{suffix}"),
        distributed: format!("Distributed Memory{suffix}"),
    }
}

fn outputs(names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(PathBuf::from).collect()
}

fn reduction() -> BenchPlot {
    BenchPlot {
        name: "reduction".to_owned(),
        inputs: inputs("csv/reduction-{mode}-{platform}-upcxx.csv"),
        x_axis: XAxis::Index { start: 15 },
        y_field: THROUGHPUT_FIELD.to_owned(),
        x_label: "#Elements in powers of two".to_owned(),
        y_label: Y_LABEL.to_owned(),
        titles: titles(""),
        ticks: Ticks::Range { start: 15, end: 31 },
        x_limits: Some((14.0, 31.0)),
        log_scale: true,
        padding: 200.0,
        figure_size: (1500, 700),
        tick_label_size: None,
        rotate_tick_labels: false,
        outputs: outputs(&["reduction.png", "reduction.pdf"]),
    }
}

/// Earlier reduction sweep, plotted against the raw `Size` column
fn reduction_wide() -> BenchPlot {
    BenchPlot {
        name: "reduction-wide".to_owned(),
        inputs: inputs("reduction-{platform}-{mode}.csv"),
        x_axis: XAxis::Field {
            field: "Size".to_owned(),
        },
        padding: 500.0,
        outputs: outputs(&["reduction-wide.pdf"]),
        ..reduction()
    }
}

fn stencil() -> BenchPlot {
    BenchPlot {
        name: "stencil".to_owned(),
        inputs: inputs("stencil-{mode}-{platform}-upcxx.csv"),
        x_axis: XAxis::Index { start: 0 },
        y_field: THROUGHPUT_FIELD.to_owned(),
        x_label: "Volume".to_owned(),
        y_label: Y_LABEL.to_owned(),
        titles: titles(""),
        ticks: Ticks::Fields {
            start: 0,
            fields: vec!["X".to_owned(), "Y".to_owned(), "Z".to_owned()],
            separator: "x".to_owned(),
            limit: 13,
        },
        x_limits: None,
        log_scale: false,
        padding: 2.0,
        figure_size: (1500, 800),
        tick_label_size: Some(7.0),
        rotate_tick_labels: true,
        outputs: outputs(&["stencil.pdf", "stencil.png"]),
    }
}

fn symmetrize_openmp() -> BenchPlot {
    BenchPlot {
        name: "symmetrize_openmp".to_owned(),
        inputs: inputs("csv/symmetrize-{mode}-{platform}-upcxx-openmp.csv"),
        x_axis: XAxis::Index { start: 5 },
        y_field: THROUGHPUT_FIELD.to_owned(),
        x_label: "Matrix Dimension".to_owned(),
        y_label: Y_LABEL.to_owned(),
        titles: titles(" (OpenMP)"),
        ticks: Ticks::Labels {
            start: 5,
            labels: (5..15).map(|e| format!("{0}x{0}", 1u64 << e)).collect(),
        },
        x_limits: Some((4.0, 15.0)),
        log_scale: true,
        padding: 500.0,
        figure_size: (1500, 800),
        tick_label_size: Some(7.0),
        rotate_tick_labels: true,
        outputs: outputs(&["symmetrize_openmp.pdf", "symmetrize_openmp.png"]),
    }
}
