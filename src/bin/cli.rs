//! fdstore CLI
//!
//! Inspect and edit flash data storage images on disk.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use fdstore::format::scan_image;
use fdstore::{image, Command, Config, Engine, FdsError, Reply, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// fdstore CLI
#[derive(Parser, Debug)]
#[command(name = "fdstore-cli")]
#[command(about = "Inspect and edit flash data storage images")]
#[command(version)]
struct Args {
    /// Image file
    #[arg(short, long)]
    image: PathBuf,

    /// Page size in 32-bit words (inferred when omitted)
    #[arg(short = 'w', long)]
    page_size: Option<usize>,

    /// Number of pages (derived from the image length when omitted)
    #[arg(short = 'p', long)]
    pages: Option<usize>,

    /// Verify record CRCs while mounting
    #[arg(long)]
    crc_check: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty, formatted image
    Format,

    /// Show geometry and space usage
    Info,

    /// List live records
    Ls {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the data of a record
    Cat {
        record_id: u32,
    },

    /// Write a new record
    Write {
        file_id: u16,
        key: u16,
        data: String,
    },

    /// Replace the data of a record
    Update {
        record_id: u32,
        data: String,
    },

    /// Delete a record
    Rm {
        record_id: u32,
    },

    /// Delete every record of a file
    RmFile {
        file_id: u16,
    },

    /// Reclaim space held by deleted records
    Gc,

    /// Hex dump of the image
    Hexdump,
}

fn main() -> ExitCode {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,fdstore=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{} [{}]", e, e.status());
            ExitCode::from(e.status().code() as u8)
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder().crc_check(args.crc_check);
    if let Some(words) = args.page_size {
        builder = builder.virtual_page_size(words);
    }
    if let Some(pages) = args.pages {
        builder = builder.virtual_pages(pages);
    }
    let config = builder.build();

    let bytes = match args.command {
        Commands::Format => {
            let nrf52 = Config::nrf52();
            let config = Config {
                virtual_page_size: config.virtual_page_size.or(nrf52.virtual_page_size),
                virtual_pages: config.virtual_pages.or(nrf52.virtual_pages),
                ..config
            };
            let engine = Engine::format(config)?;
            image::save(&args.image, &engine.image()?)?;
            tracing::info!("Formatted {}", args.image.display());
            return Ok(());
        }
        _ => image::load(&args.image)?,
    };

    let mut engine = Engine::new(config);
    engine.mount(&bytes)?;

    let command = match args.command {
        Commands::Info => {
            let store = engine.store()?;
            let geometry = store.geometry();
            let stats = scan_image(&bytes, geometry.virtual_page_size);
            println!("page size:   {} words", geometry.virtual_page_size);
            println!("pages:       {}", geometry.virtual_pages);
            println!("records:     {}", stats.records);
            println!("deleted:     {}", stats.deleted);
            println!("skipped:     {}", stats.skipped);
            println!("used words:  {}", store.used_words());
            println!("free words:  {}", store.free_words());
            return Ok(());
        }
        Commands::Hexdump => {
            print!("{}", image::hexdump(&bytes));
            return Ok(());
        }
        Commands::Ls { json } => {
            let entries = engine.read_all()?;
            if json {
                let text = serde_json::to_string_pretty(&entries)
                    .map_err(|e| FdsError::Internal(e.to_string()))?;
                println!("{}", text);
            } else {
                for entry in entries {
                    println!(
                        "{:>10}  file=0x{:04x}  key=0x{:04x}  {} bytes",
                        entry.record_id,
                        entry.file_id,
                        entry.key,
                        entry.data.len()
                    );
                }
            }
            return Ok(());
        }
        Commands::Cat { record_id } => {
            let (_, _, data) = engine.read(record_id)?;
            println!("{}", String::from_utf8_lossy(&data));
            return Ok(());
        }
        Commands::Write { file_id, key, data } => Command::Write {
            key,
            file_id,
            data: data.into_bytes(),
        },
        Commands::Update { record_id, data } => Command::Update {
            record_id,
            data: data.into_bytes(),
        },
        Commands::Rm { record_id } => Command::DeleteRecord { record_id },
        Commands::RmFile { file_id } => Command::DeleteFile { file_id },
        Commands::Gc => Command::GarbageCollect,
        Commands::Format => return Ok(()),
    };

    if let Reply::RecordId(record_id) = engine.execute(command)? {
        println!("{}", record_id);
    }
    image::save(&args.image, &engine.image()?)?;
    Ok(())
}
