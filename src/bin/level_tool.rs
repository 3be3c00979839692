//! Inspect and re-save level archives.
//!
//! Run with: cargo run --bin level-tool -- dump level.zip --area 1

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use level_archive::LevelArchive;
use nsmb_level::codec::metadata::TYPE_STRING;
use nsmb_level::codec::{BlockTable, Slot};
use nsmb_level::{Area, CodecConfig, LoadedArea, MemoryLibrary, Metadata, ObjectLibrary};

#[derive(Parser)]
#[command(name = "level-tool")]
#[command(about = "Inspect and re-save level archives")]
struct Cli {
    /// Log decode details (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print an area as JSON
    Dump {
        archive: PathBuf,
        #[arg(long, default_value_t = 1)]
        area: u8,
        #[command(flatten)]
        codec: CodecArgs,
    },
    /// Load and save every area, writing a new archive
    Resave {
        archive: PathBuf,
        output: PathBuf,
        /// Write tileset cross-references to course{N}_xref.bin
        #[arg(long)]
        separate_tilesets: bool,
        #[command(flatten)]
        codec: CodecArgs,
    },
    /// List an area's metadata entries
    Meta {
        archive: PathBuf,
        #[arg(long, default_value_t = 1)]
        area: u8,
    },
    /// Show an area's block table
    Blocks {
        archive: PathBuf,
        #[arg(long, default_value_t = 1)]
        area: u8,
    },
}

#[derive(clap::Args)]
struct CodecArgs {
    /// Directory of shared objects, one file per key
    #[arg(long)]
    library: Option<PathBuf>,
    /// Truncate off-stride slots instead of failing
    #[arg(long)]
    lenient: bool,
    /// Tileset slot that receives shared objects
    #[arg(long, default_value_t = 1)]
    shared_slot: u8,
    /// Zero bytes reserved after the block header on save
    #[arg(long, default_value_t = 0)]
    prefix_bytes: usize,
}

impl CodecArgs {
    fn config(&self) -> CodecConfig {
        CodecConfig {
            shared_slot: self.shared_slot,
            strict_strides: !self.lenient,
            extra_prefix_bytes: self.prefix_bytes,
        }
    }

    fn library(&self) -> Result<MemoryLibrary> {
        match &self.library {
            Some(dir) => load_library(dir),
            None => Ok(MemoryLibrary::new()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Dump { archive, area, codec } => {
            let archive = open_archive(&archive)?;
            let loaded = load_area(&archive, area, &codec.library()?, &codec.config())?;
            let out = json!({
                "area": loaded.area,
                "warnings": loaded.warnings.iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Commands::Resave { archive: path, output, separate_tilesets, codec } => {
            let mut archive = open_archive(&path)?;
            let library = codec.library()?;
            let config = codec.config();
            for index in archive.areas() {
                let mut loaded = load_area(&archive, index, &library, &config)?;
                let saved = loaded.area.save(separate_tilesets, &library, &config);
                for warning in &saved.warnings {
                    warn!(area = index, "{warning}");
                }
                let mut files = saved.files;
                files.insert(nsmb_level::area::course_file_name(index), saved.course);
                archive.set_area_files(index, files);
                info!(area = index, "resaved");
            }
            fs::write(&output, archive.to_zip()?)
                .with_context(|| format!("writing {}", output.display()))?;
        }
        Commands::Meta { archive, area } => {
            let archive = open_archive(&archive)?;
            let table = BlockTable::parse(archive.course(area)?)?;
            let metadata = Metadata::decode(table.slot(Slot::Metadata))?;
            for (key, types) in metadata.iter() {
                for (tag, value) in types {
                    if *tag == TYPE_STRING {
                        println!("{key} [str] {:?}", metadata.str_data(key).unwrap_or_default());
                    } else {
                        println!("{key} [{tag}] {} bytes", value.len());
                    }
                }
            }
        }
        Commands::Blocks { archive, area } => {
            let archive = open_archive(&archive)?;
            let table = BlockTable::parse(archive.course(area)?)?;
            for (slot, entry) in Slot::ALL.iter().zip(&table.entries) {
                println!(
                    "{:>2} {:<15} offset {:#07x} length {:#07x}",
                    slot.index(),
                    format!("{slot:?}"),
                    entry.offset,
                    entry.length
                );
            }
        }
    }
    Ok(())
}

fn open_archive(path: &Path) -> Result<LevelArchive> {
    let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    LevelArchive::from_zip(&data)
}

fn load_area(
    archive: &LevelArchive,
    index: u8,
    library: &dyn ObjectLibrary,
    config: &CodecConfig,
) -> Result<LoadedArea> {
    let course = archive.course(index)?;
    let files = archive.area_files(index);
    let loaded = Area::load_with_files(course, &files, index, library, config)
        .with_context(|| format!("decoding area {index}"))?;
    Ok(loaded)
}

fn load_library(dir: &Path) -> Result<MemoryLibrary> {
    let mut library = MemoryLibrary::new();
    for entry in fs::read_dir(dir).with_context(|| format!("reading {}", dir.display()))? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let Some(key) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        library.insert(key, fs::read(&path)?);
    }
    info!(objects = library.len(), "loaded object library");
    Ok(library)
}
