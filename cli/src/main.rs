mod check_indexer;
mod explore;
mod generate;
mod probe;

use clap::{ArgAction, Parser, Subcommand};
use env_logger::{Builder, Target};
use log::LevelFilter;

use crate::check_indexer::CheckIndexer;
use crate::explore::Explore;
use crate::generate::Generate;
use crate::probe::Probe;

#[cfg(feature = "dhat")]
#[global_allocator]
static DHAT_ALLOCATOR: dhat::Alloc = dhat::Alloc;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
    #[arg(short, long, action = ArgAction::Count, default_value_t = 2)]
    verbose: u8,
    #[arg(
        long,
        help = "If set, logs will not include a timestamp",
        action = ArgAction::SetTrue
    )]
    no_time: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    Generate(Generate),
    Probe(Probe),
    Explore(Explore),
    CheckIndexer(CheckIndexer),
}

impl Cmd {
    fn run(self) {
        match self {
            Self::Generate(generate) => generate.run(),
            Self::Probe(probe) => probe.run(),
            Self::Explore(explore) => explore.run(),
            Self::CheckIndexer(check_indexer) => check_indexer.run(),
        }
    }
}

fn main() {
    #[cfg(feature = "dhat")]
    let _profiler = dhat::Profiler::new_heap();
    let args = Cli::parse();
    let mut builder = Builder::new();
    builder
        .filter(
            None,
            match args.verbose {
                0 => LevelFilter::Error,
                1 => LevelFilter::Info,
                2 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            },
        )
        .default_format()
        .target(Target::Stdout);

    if args.no_time {
        builder.format_timestamp(None);
    }
    builder.init();
    args.cmd.run();
}
