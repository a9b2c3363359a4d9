//! # pdes-cli::args
//!
//! Defines the command-line argument structure using `clap`.

use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pdes", author, version, about = "Parallel discrete-event simulation driver")]
pub struct Cli {
    /// Path to the model description file (`.toml`; `.xml`/`.sdl`/`.py`
    /// require the corresponding front end).
    #[arg(value_name = "SDL_FILE")]
    pub sdl_file: Option<PathBuf>,

    /// Build only, run from an archive, or build and run.
    #[arg(long = "run-mode", value_enum, default_value_t = RunMode::Both)]
    pub run_mode: RunMode,

    /// Time at which the simulation stops, e.g. "50 ns".
    #[arg(long = "stop-at")]
    pub stop_at: Option<String>,

    /// The core cycle unit of the run.
    #[arg(long, default_value = "1 ps")]
    pub timebase: String,

    /// Partition strategy: self, simple, rrobin, linear, or a registered
    /// name (defaults to linear).
    #[arg(long)]
    pub partitioner: Option<String>,

    /// Whether every rank parses the model itself (faster) or rank 0
    /// parses and broadcasts.
    #[arg(long = "all-parse", default_value_t = true, action = ArgAction::Set)]
    pub all_parse: bool,

    /// Checkpoint format.
    #[arg(long = "archive-type", value_enum, default_value_t = ArchiveType::Bin)]
    pub archive_type: ArchiveType,

    /// Checkpoint base name; files are `<name>.<type>.<rank>`.
    #[arg(long = "archive-file", default_value = "pdes_checkpoint")]
    pub archive_file: PathBuf,

    /// Dump the per-rank component assignment to this file.
    #[arg(long = "dump_partition")]
    pub dump_partition: Option<PathBuf>,

    /// Dump the configuration graph as a readable listing.
    #[arg(long = "dump_config_graph")]
    pub dump_config_graph: Option<PathBuf>,

    /// Write the configuration graph in dot format.
    #[arg(long = "output-dot")]
    pub output_dot: Option<PathBuf>,

    /// Component library search path (overrides the default).
    #[arg(long = "lib-path")]
    pub lib_path: Option<PathBuf>,

    /// Additional component library search paths.
    #[arg(long = "add-lib-path")]
    pub add_lib_path: Vec<PathBuf>,

    /// Build the graph programmatically through a registered generator
    /// instead of parsing a model file.
    #[arg(long)]
    pub generator: Option<String>,

    /// Option string passed to the generator.
    #[arg(long = "gen-options", default_value = "")]
    pub gen_options: String,

    /// Number of in-process ranks to run over the loopback fabric.
    #[arg(long, default_value_t = 1)]
    pub ranks: i32,

    /// Print phase timings and extra progress information.
    #[arg(long)]
    pub verbose: bool,

    /// Comma-separated tracing directives raised to trace level,
    /// e.g. "events,pdes_engine::sim".
    #[arg(long, value_delimiter = ',')]
    pub debug: Vec<String>,

    /// Send diagnostic output to a file instead of stderr.
    #[arg(long = "debug-file")]
    pub debug_file: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Build the graph, write the archive, and exit.
    Init,
    /// Load the graph from an archive and run it.
    Run,
    /// Build and run in one invocation.
    Both,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveType {
    /// Readable JSON.
    Text,
    /// Compact binary.
    Bin,
}

impl ArchiveType {
    pub fn extension(&self) -> &'static str {
        match self {
            ArchiveType::Text => "text",
            ArchiveType::Bin => "bin",
        }
    }
}
