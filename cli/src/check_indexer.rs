use clap::Args;
use itertools::Itertools;
use log::{info, warn};
use rustc_hash::FxHashMap;

use dobutsu_tb::{
    decode_pos, encode_pos, poscode_aliases, position_offset, DecodeResult, PosCode,
    COHORT_COUNT, COHORT_SIZE, LIONPOS_COUNT, OWNERSHIP_COUNT,
};

/// Sanity sweep over the position code: every decodable code must
/// re-encode to itself, and every alias of a decoded position must
/// point back at the same canonical code. Prints per-cohort counts of
/// valid and dead entries.
#[derive(Args, Debug)]
pub struct CheckIndexer {
    #[arg(short, long, help = "Restrict the sweep to one cohort")]
    cohort: Option<u8>,
    #[arg(long, default_value_t = 1, help = "Only check every n-th map index")]
    stride: u32,
}

impl CheckIndexer {
    pub fn run(self) {
        let cohorts: Vec<u8> = match self.cohort {
            Some(cohort) => vec![cohort],
            None => (0..COHORT_COUNT as u8).collect(),
        };
        let mut mismatches = 0u64;
        for cohort in cohorts {
            let mut tally: FxHashMap<&'static str, u64> = FxHashMap::default();
            let size = COHORT_SIZE[cohort as usize].size;
            for (lionpos, ownership) in
                (0..LIONPOS_COUNT as u8).cartesian_product(0..OWNERSHIP_COUNT as u8)
            {
                for map in (0..size).step_by(self.stride.max(1) as usize) {
                    let pc = PosCode {
                        cohort,
                        lionpos,
                        map,
                        ownership,
                    };
                    mismatches += check_one(&pc, &mut tally);
                }
            }
            info!(
                "cohort {cohort}: {} valid, {} dead",
                tally.get("valid").copied().unwrap_or(0),
                tally.get("dead").copied().unwrap_or(0)
            );
        }
        if mismatches == 0 {
            info!("indexer clean");
        } else {
            warn!("{mismatches} mismatching codes");
        }
    }
}

fn check_one(pc: &PosCode, tally: &mut FxHashMap<&'static str, u64>) -> u64 {
    let DecodeResult::Position(pos) = decode_pos(pc) else {
        *tally.entry("dead").or_default() += 1;
        return 0;
    };
    *tally.entry("valid").or_default() += 1;
    let mut mismatches = 0;
    let back = encode_pos(&pos);
    // a non-canonical code is fine as long as it is an alias of the
    // position it decodes to
    if back != *pc && !poscode_aliases(&pos).contains(pc) {
        warn!(
            "{pc:?} (offset {}) decodes to {pos} but re-encodes to {back:?}",
            position_offset(pc)
        );
        mismatches += 1;
    }
    for alias in poscode_aliases(&pos) {
        let DecodeResult::Position(q) = decode_pos(&alias) else {
            warn!("alias {alias:?} of {pos} does not decode");
            mismatches += 1;
            continue;
        };
        if encode_pos(&q) != back {
            warn!("alias {alias:?} of {pos} drifts to {:?}", encode_pos(&q));
            mismatches += 1;
        }
    }
    mismatches
}
