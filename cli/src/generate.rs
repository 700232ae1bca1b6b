use std::path::PathBuf;

use clap::Args;
use log::info;

use dobutsu_tb::{write_table, Stats, TableBaseBuilder, POSITION_COUNT};

#[derive(Args, Debug)]
pub struct Generate {
    #[arg(short, long, default_value = "dobutsu.tb")]
    output: PathBuf,
    #[arg(long, help = "Also write a JSON distance histogram here")]
    stats: Option<PathBuf>,
}

impl Generate {
    pub fn run(self) {
        info!("building all {POSITION_COUNT} positions, this takes a while");
        let table = TableBaseBuilder::build();
        let stats = Stats::from_table(&table);
        stats.log();
        if let Some(path) = &self.stats {
            std::fs::write(path, stats.to_json()).expect("stats file not writable");
            info!("stats written to {path:?}");
        }
        write_table(&self.output, &table).expect("table file not writable");
        info!("wrote {} bytes to {:?}", table.len(), self.output);
    }
}
