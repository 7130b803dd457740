use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use cdc_viewer_core::{
    chart::{render, Figure},
    dataset::{Dataset, Session},
    formats::telemetry::{export, RecordLayout},
};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre;
use tracing::info;

const DEFAULT_DUMP: &str = "runs/telemetry.bin";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Record layout the dumps were written with
    #[arg(short, long, value_enum, default_value_t = Layout::WithFpga, global = true)]
    layout: Layout,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the comparison chart of one or more dumps to a PNG
    Plot {
        #[arg(value_name = "FILE", default_value = DEFAULT_DUMP)]
        files: Vec<PathBuf>,
        #[arg(short, long, value_name = "PNG", default_value = "chart.png")]
        output: PathBuf,
        #[arg(long, default_value_t = render::DEFAULT_SIZE.0)]
        width: u32,
        #[arg(long, default_value_t = render::DEFAULT_SIZE.1)]
        height: u32,
    },
    /// Print headline numbers of each dump
    Summary {
        #[arg(value_name = "FILE", default_value = DEFAULT_DUMP)]
        files: Vec<PathBuf>,
    },
    /// Write a dump as CSV
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// Defaults to stdout
        #[arg(short, long, value_name = "CSV")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Layout {
    /// time, cpu, ram, disk, bandwidth, fpga, machines, avg power, total power, SLAVs
    WithFpga,
    /// Same without the fpga column
    WithoutFpga,
}

impl From<Layout> for RecordLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::WithFpga => RecordLayout::WithFpga,
            Layout::WithoutFpga => RecordLayout::WithoutFpga,
        }
    }
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::init();

    let args = Cli::parse();
    let layout = RecordLayout::from(args.layout);

    match args.command {
        Command::Plot {
            files,
            output,
            width,
            height,
        } => {
            let mut session = Session::new(layout);
            session.load_files(&files);
            if session.datasets().is_empty() {
                return Err(eyre::eyre!("None of the {} file(s) could be loaded", files.len()));
            }

            let figure = Figure::build(session.datasets());
            render::render_png(&figure, &output, (width, height))?;
            info!("Plotted {} dataset(s)", session.datasets().len());
        }
        Command::Summary { files } => {
            let mut session = Session::new(layout);
            session.load_files(&files);
            for dataset in session.datasets() {
                println!("{}", dataset.path.display());
                println!("{}\n", dataset.summary());
            }
        }
        Command::Export { file, output } => {
            let dataset = Dataset::load(&file, layout)?;
            match output {
                Some(path) => {
                    let wtr = BufWriter::new(File::create(&path)?);
                    export::write_csv(wtr, dataset.records())?;
                    info!("Exported {} records to {:?}", dataset.len(), path);
                }
                None => {
                    let stdout = io::stdout().lock();
                    export::write_csv(stdout, dataset.records())?;
                    io::stdout().flush()?;
                }
            }
        }
    }

    Ok(())
}
