use std::io;
use std::path::PathBuf;

use anyhow::Result;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::debug;

use scanbook::app::App;
use scanbook::data::ExportFormat;
use scanbook::scanning::camera::Terminal;
use scanbook::scanning::decoder::decode;
use scanbook::scanning::storage::{FileStorage, MemoryStorage};
use scanbook::scanning::store::ScanStore;

#[derive(Parser)]
#[command(name = "scanbook", version, about = "Record scanned part numbers and prices, grouped by day")]
struct Cli {
    /// JSON file holding the scan records
    #[arg(long, env = "SCANBOOK_STORE", default_value = "scans.json", global = true)]
    store: PathBuf,

    /// Keep records in memory only
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Read codes from the scanner (one per line on stdin) and save the first valid one
    Scan,
    /// Enter a part number and MRP by hand
    Add { part_no: String, mrp: String },
    /// Show the records grouped by date, with totals
    History,
    /// Delete one record
    Delete { date: NaiveDate, part_no: String, mrp: String },
    /// Write the records to a spreadsheet
    Export {
        /// Only export records of this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Xlsx)]
        format: ExportFormat,
    },
    /// Print what a payload decodes to
    Decode { payload: String },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Command::Decode { payload } = &cli.command {
        match decode(payload) {
            Ok(candidate) => println!("Part No: {}\nMRP: {}", candidate.part_no, candidate.mrp),
            Err(err) => {
                eprintln!("{}", err);
                std::process::exit(1);
            },
        }
        return Ok(());
    }

    let store = if cli.ephemeral {
        ScanStore::new(MemoryStorage::new())
    } else {
        debug!("using store, path={}", cli.store.display());
        ScanStore::new(FileStorage::new(&cli.store))
    };

    let terminal = Terminal::new(io::stdin().lock(), io::stdout());
    let mut app = App::new(store, terminal, cli.yes);

    match cli.command {
        Command::Scan => app.scan()?,
        Command::Add { part_no, mrp } => app.add(&part_no, &mrp)?,
        Command::History => app.history()?,
        Command::Delete { date, part_no, mrp } => app.delete(date, &part_no, &mrp)?,
        Command::Export { date, out_dir, format } => {
            app.export(date, format, &out_dir)?;
        },
        Command::Decode { .. } => {},
    }

    Ok(())
}
