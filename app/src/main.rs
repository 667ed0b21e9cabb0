use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use common::config::Config;
use eyre::{Result, WrapErr, bail};
use regex::Regex;
use tracing::{debug, error};
use tracing_subscriber::{
    EnvFilter,
    fmt::{layer, time::ChronoLocal},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

mod pipeline;
mod presets;

/// Crates whose logs follow RUST_LOG unless a --log directive names them
const MODULES: &[&str] = &["common", "throughput_plot"];

#[derive(Parser)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    #[arg(short, long)]
    log: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the comparison charts
    Plot {
        /// Benchmark config, the built-in benchmarks are used when omitted
        #[arg(short, long)]
        config_file: Option<PathBuf>,
        /// Directory the csv paths are relative to
        #[arg(long, default_value = ".")]
        data_dir: PathBuf,
        /// Directory the charts are written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Only plot benchmarks whose name matches this regex
        #[arg(long)]
        only: Option<String>,
    },
    /// List configured benchmarks
    Ls {
        #[arg(short, long)]
        config_file: Option<PathBuf>,
    },
    /// Print the benchmark config as yaml
    Print {
        #[arg(short, long)]
        config_file: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let log_level = std::env::var("RUST_LOG").unwrap_or("warn".to_owned());
    let args = Cli::parse();
    let file_appender = tracing_appender::rolling::never(".", "log.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let mut env_filter = EnvFilter::new(format!("bench_plots={log_level}"));

    for log in &args.log {
        env_filter = env_filter.add_directive(log.parse()?);
    }

    for module in MODULES {
        if !args.log.iter().any(|x| x.starts_with(module)) {
            env_filter = env_filter.add_directive(format!("{module}={log_level}").parse()?);
        }
    }

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            layer()
                .with_timer(ChronoLocal::new("%v %k:%M:%S %z".to_owned()))
                .compact(),
        )
        .with(layer().with_writer(non_blocking))
        .init();

    let result = match args.command {
        Commands::Plot {
            config_file,
            data_dir,
            out_dir,
            only,
        } => plot(config_file.as_deref(), &data_dir, &out_dir, only.as_deref()),
        Commands::Ls { config_file } => list_benchmarks(config_file.as_deref()),
        Commands::Print { config_file } => print_config(config_file.as_deref()),
    };
    if let Err(err) = &result {
        error!("{err:#?}");
    }
    result
}

fn load_config(config_file: Option<&Path>) -> Result<Config> {
    match config_file {
        Some(path) => {
            debug!("Reading config {}", path.display());
            Ok(Config::load(path)?)
        }
        None => Ok(presets::builtin()),
    }
}

fn plot(
    config_file: Option<&Path>,
    data_dir: &Path,
    out_dir: &Path,
    only: Option<&str>,
) -> Result<()> {
    let config = load_config(config_file)?;
    let filter = only.map(Regex::new).transpose()?;

    let benches = config
        .benches
        .iter()
        .filter(|b| filter.as_ref().is_none_or(|r| r.is_match(&b.name)))
        .collect::<Vec<_>>();
    if benches.is_empty() {
        bail!("No benchmark matches {}", only.unwrap_or_default());
    }

    for bench in benches {
        let written = pipeline::run(bench, &config.style, data_dir, out_dir)
            .wrap_err_with(|| format!("Plotting {}", bench.name))?;
        for path in written {
            println!("{}", path.display());
        }
    }
    Ok(())
}

fn list_benchmarks(config_file: Option<&Path>) -> Result<()> {
    for bench in load_config(config_file)?.benches {
        let outputs = bench
            .outputs
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>();
        println!("{} -> {}", bench.name, outputs.join(", "));
    }
    Ok(())
}

fn print_config(config_file: Option<&Path>) -> Result<()> {
    print!("{}", load_config(config_file)?.to_yaml()?);
    Ok(())
}
