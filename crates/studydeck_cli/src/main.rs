//! Operator tool for a StudyDeck data directory.
//!
//! # Responsibility
//! - Verify `studydeck_core` linkage (`ping`).
//! - Inspect, back up, restore and tidy a directory-backed store.

use clap::{Parser, Subcommand};
use log::error;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use studydeck_core::logging::init_logging_from_config;
use studydeck_core::{
    load_config, BlobStore, DirBlobStore, QuestionService, StudyConfig, StudySession, TagService,
};

#[derive(Debug, Parser)]
#[command(name = "studydeck", version, about = "Inspect and maintain a StudyDeck store")]
struct Cli {
    /// TOML config file; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Overrides `data_dir` from the config.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core linkage and version.
    Ping,
    /// Print question, tag and note counts.
    Stats,
    /// Write the full database image to a file.
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Replace the database with an image file.
    Import {
        #[arg(long)]
        input: PathBuf,
    },
    /// Delete tags that no question uses.
    PruneTags,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_exit module=cli status=error error={err}");
            eprintln!("studydeck: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Command::Ping = cli.command {
        println!("studydeck_core ping={}", studydeck_core::ping());
        println!("studydeck_core version={}", studydeck_core::core_version());
        return Ok(());
    }

    let mut config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => StudyConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    config.validate()?;
    init_logging_from_config(&config)?;

    let store = DirBlobStore::open(&config.data_dir)?;
    let mut legacy = config
        .legacy_dir
        .as_deref()
        .map(DirBlobStore::open)
        .transpose()?;
    let mut session = StudySession::initialize(
        store,
        legacy.as_mut().map(|store| store as &mut dyn BlobStore),
    )?;

    match cli.command {
        Command::Ping => {}
        Command::Stats => {
            let questions = QuestionService::new(&mut session);
            for (kind, total) in questions.count_by_type()? {
                println!("questions.{kind}={total}");
            }
            let tags = TagService::new(&mut session).list_all()?;
            println!("tags={}", tags.len());
            let notes = session.notes().list_by_updated()?;
            println!("notes={}", notes.len());
        }
        Command::Export { out } => {
            let image = session.export_image()?;
            std::fs::write(&out, &image)?;
            println!("exported {} bytes to {}", image.len(), out.display());
        }
        Command::Import { input } => {
            let image = std::fs::read(&input)?;
            session.import_image(&image)?;
            println!("imported {} bytes from {}", image.len(), input.display());
        }
        Command::PruneTags => {
            let deleted = TagService::new(&mut session).prune_unused()?;
            println!("pruned {deleted} unused tag(s)");
        }
    }
    Ok(())
}
