//! Terminal visualizer for maze generation

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use mazecarve::{
    app::{App, RunConfig},
    generators::{Generator, GeneratorOptions, RowOrder, SidewinderOptions},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    Dfs,
    Sidewinder,
    Wilson,
    RecurDiv,
}

impl From<Algorithm> for Generator {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Dfs => Generator::Dfs,
            Algorithm::Sidewinder => Generator::Sidewinder,
            Algorithm::Wilson => Generator::Wilson,
            Algorithm::RecurDiv => Generator::RecurDiv,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Rows {
    TopDown,
    BottomUp,
}

/// Animate perfect maze generation in the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Maze width in cells
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u16).range(2..=250))]
    width: u16,

    /// Maze height in cells
    #[arg(long, default_value_t = 15, value_parser = clap::value_parser!(u16).range(2..=250))]
    height: u16,

    /// Generation algorithm
    #[arg(long, value_enum, default_value_t = Algorithm::Dfs)]
    algorithm: Algorithm,

    /// Random seed; regenerating uses the following seeds
    #[arg(long)]
    seed: Option<u64>,

    /// Delay between two drawn steps, in milliseconds
    #[arg(long, default_value_t = 20)]
    delay_ms: u64,

    /// Sidewinder row processing order
    #[arg(long, value_enum, default_value_t = Rows::TopDown)]
    row_order: Rows,

    /// Sidewinder probability of extending a run instead of closing it
    #[arg(long, default_value_t = 0.5)]
    extend_probability: f64,

    /// Maximum level of the log file
    #[arg(long, default_value_t = tracing::Level::INFO)]
    log_level: tracing::Level,

    /// Directory of the log file
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // The terminal is used for drawing, so logs go to a file
    let file_appender = tracing_appender::rolling::never(&args.log_dir, "mazecarve.log");
    let (writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(args.log_level)
        .init();

    let config = RunConfig {
        width: args.width,
        height: args.height,
        generator: args.algorithm.into(),
        options: GeneratorOptions {
            sidewinder: SidewinderOptions {
                row_order: match args.row_order {
                    Rows::TopDown => RowOrder::TopDown,
                    Rows::BottomUp => RowOrder::BottomUp,
                },
                extend_probability: args.extend_probability,
            },
        },
        seed: args.seed,
    };

    let app = App::new(std::time::Duration::from_millis(args.delay_ms));
    let mut stdout = std::io::stdout();
    App::setup_terminal(&mut stdout)?;
    let result = app.run(config);
    App::restore_terminal(&mut stdout)?;

    if let Err(e) = &result {
        tracing::error!("[main] {:#}", e);
    }
    result
}
