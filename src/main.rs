use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Mutex;

use chrono::Local;
use clap::Parser;
use tracing::{debug, info};
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod columns;
mod controller;
mod domain;
mod drawer;
mod export;
mod filter;
mod inputter;
mod loader;
mod model;
mod pagination;
mod records;
mod reports;
mod schedule;
mod stats;
mod ui;

use columns::RecordShape;
use controller::Controller;
use domain::{DashConfig, DashError};
use model::{Model, Status};
use pagination::PageSize;
use records::RecordStore;
use ui::DashUI;

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ShapeArg {
    Normal,
    Reservation,
}

impl From<ShapeArg> for RecordShape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Normal => RecordShape::Normal,
            ShapeArg::Reservation => RecordShape::Reservation,
        }
    }
}

/// Payment transaction dashboard for the terminal.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Transactions file (csv, parquet or arrow). Mock data is generated without it.
    #[arg(short, long)]
    data: Option<String>,

    /// Record shape of the data
    #[arg(short, long, value_enum, default_value_t = ShapeArg::Normal)]
    shape: ShapeArg,

    /// Number of generated mock transactions per shape
    #[arg(long, default_value_t = 50)]
    rows: usize,

    /// Seed of the mock data generator
    #[arg(long, default_value_t = 2025)]
    seed: u64,

    /// Initial rows per page (5, 10, 20 or 50)
    #[arg(long, default_value_t = 10, value_parser = parse_page_size)]
    page_size: usize,

    /// Log file, RUST_LOG sets the level
    #[arg(long, default_value = "paydash.log")]
    log_file: String,

    /// Event poll interval in milliseconds
    #[arg(long, default_value_t = 100)]
    poll_ms: u64,
}

fn parse_page_size(s: &str) -> Result<usize, String> {
    let rows: usize = s.parse().map_err(|e| format!("{e}"))?;
    PageSize::from_rows(rows)
        .map(|p| p.rows())
        .ok_or_else(|| format!("{rows} is not one of 5, 10, 20, 50"))
}

fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(p) => PathBuf::from(p.as_ref()),
        Err(_) => PathBuf::from(path),
    }
}

fn setup_logging(path: PathBuf) -> Result<(), DashError> {
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(filter)
        .with(ErrorLayer::default())
        .init();
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let result = run(args);
    ratatui::restore();
    match result {
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(args: Args) -> Result<(), DashError> {
    setup_logging(expand_path(&args.log_file))?;

    let shape = RecordShape::from(args.shape);
    let config = DashConfig::default()
        .with_shape(shape)
        .with_mock_rows(args.rows)
        .with_seed(args.seed)
        .with_page_size(PageSize::from_rows(args.page_size).unwrap_or_default())
        .with_event_poll_time(args.poll_ms);
    info!("Starting paydash with {:?}", config);

    let today = Local::now().date_naive();
    let (normal, reservation) = match &args.data {
        Some(path) => {
            let store = loader::load_data_file(expand_path(path), shape)?;
            let other = RecordStore::empty();
            match shape {
                RecordShape::Normal => (store, other),
                RecordShape::Reservation => (other, store),
            }
        }
        None => (
            RecordStore::generate(RecordShape::Normal, config.mock_rows, config.seed, today),
            RecordStore::generate(RecordShape::Reservation, config.mock_rows, config.seed, today),
        ),
    };

    let mut terminal = ratatui::init();
    let size = terminal.size()?;
    let mut model = Model::init(
        &config,
        normal,
        reservation,
        today,
        size.width as usize,
        size.height as usize,
    )?;
    let mut ui = DashUI::new();
    let controller = Controller::new(&config);

    while model.status != Status::Quitting {
        // Render the current view
        terminal.draw(|f| ui.draw(&model, f))?;

        // Handle events and map to a Message
        let message = controller.handle_event(&model)?;
        model.update(message)?;
    }

    debug!("Session ended with {} export requests", model.export_log().len());
    Ok(())
}
