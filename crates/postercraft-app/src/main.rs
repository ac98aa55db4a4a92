//! # Postercraft CLI
//!
//! Command-line shell over the poster document engine.
//!
//! ## Usage
//!
//! ```bash
//! # Export a project file to PNG at 2x
//! postercraft export poster.json --scale 2 --fonts ./fonts
//!
//! # Export a project from the local store by id
//! postercraft export 3f2c9a7e-... --out ./out.png
//!
//! # List saved projects
//! postercraft list
//!
//! # Print the keyboard shortcut table
//! postercraft shortcuts
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use thiserror::Error;

use postercraft_core::{
    Document, FileStorage, Project, ProjectStorage, ShortcutRegistry, StorageError,
};
use postercraft_render::{DataUriLoader, FontBook, RenderError, export_png_blocking};

/// Postercraft - poster document tools
#[derive(Parser, Debug)]
#[command(name = "postercraft")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a project to a PNG file
    Export {
        /// Project JSON file, or the id of a project in the store
        input: String,

        /// Resolution multiplier
        #[arg(long, default_value = "1.0")]
        scale: f64,

        /// Extra .ttf/.otf files named like `Family-Bold.ttf`; DejaVu Sans
        /// is always available as the fallback family
        #[arg(long, value_name = "DIR")]
        fonts: Option<PathBuf>,

        /// Output file (defaults to the sanitized project name)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Project store directory (defaults to the user data directory)
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
    /// List projects in the store
    List {
        /// Project store directory (defaults to the user data directory)
        #[arg(long, value_name = "DIR")]
        store: Option<PathBuf>,
    },
    /// Print keyboard shortcuts
    Shortcuts,
}

#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid project file: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            input,
            scale,
            fonts,
            out,
            store,
        } => {
            let (name, document) = load_input(&input, store)?;

            let mut book = FontBook::new();
            if let Some(dir) = fonts {
                let added = book.load_dir(&dir)?;
                log::info!("Loaded {} font face(s) from {}", added, dir.display());
            }

            let export = export_png_blocking(&document, &book, &DataUriLoader, scale, &name)?;
            let path = out.unwrap_or_else(|| PathBuf::from(&export.file_name));
            std::fs::write(&path, &export.png_data)?;
            println!("Saved {}x{} image to {}", export.width, export.height, path.display());
        }
        Commands::List { store } => {
            let storage = open_store(store)?;
            let projects = pollster::block_on(storage.list())?;
            if projects.is_empty() {
                println!("No projects in {}", storage.base_path().display());
            }
            for project in projects {
                println!(
                    "{}  {:<32}  {} element(s)  updated {}",
                    project.id,
                    project.name,
                    project.document.len(),
                    project.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Commands::Shortcuts => {
            println!("{}", ShortcutRegistry::table());
        }
    }

    Ok(())
}

fn open_store(dir: Option<PathBuf>) -> Result<FileStorage, StorageError> {
    match dir {
        Some(dir) => FileStorage::new(dir),
        None => FileStorage::default_location(),
    }
}

/// Resolve `input` to a project name and document: a file on disk holding
/// either a saved project record or a bare document, else a store id.
fn load_input(input: &str, store: Option<PathBuf>) -> Result<(String, Document), AppError> {
    let path = Path::new(input);
    if path.is_file() {
        let json = std::fs::read_to_string(path)?;
        if let Ok(project) = Project::from_json(&json) {
            return Ok((project.name, project.document));
        }
        let document = Document::from_json(&json)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok((name, document));
    }

    let storage = open_store(store)?;
    let project = pollster::block_on(storage.get(input))?;
    Ok((project.name, project.document))
}
