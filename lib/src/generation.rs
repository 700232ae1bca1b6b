//! Offline construction of the tablebase: seed every code with its
//! immediate result, then walk backwards over unmoves until no
//! distance gets assigned any more. Whenever a position receives its
//! distance, every alias code is stamped with the same byte so later
//! passes may hit any rendering of it.

use std::io::{self, Write};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use log::{debug, info};
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::board::Color;
use crate::cohort::{COHORT_COUNT, COHORT_SIZE, LIONPOS_COUNT, OWNERSHIP_COUNT, POSITION_COUNT};
use crate::indexer::{
    decode_pos, encode_pos, encode_pos_check, poscode_aliases, position_offset, DecodeResult,
    EncodeResult, PosCode,
};
use crate::movegen::Move;
use crate::outcome::{DTM_DRAW, DTM_INVALID, DTM_MAX};
use crate::position::LION_S;
use crate::Position;

/// The whole tablebase in memory, one distance byte per code.
pub type DtmTable = Vec<u8>;

/// Visits every code in file order; the offset ticks up by one per
/// call, matching `position_offset`.
fn for_each_code(mut f: impl FnMut(u64, PosCode)) {
    let mut offset = 0u64;
    for cohort in 0..COHORT_COUNT as u8 {
        let size = COHORT_SIZE[cohort as usize].size;
        for lionpos in 0..LIONPOS_COUNT as u8 {
            for ownership in 0..OWNERSHIP_COUNT as u8 {
                for map in 0..size {
                    f(
                        offset,
                        PosCode {
                            cohort,
                            lionpos,
                            map,
                            ownership,
                        },
                    );
                    offset += 1;
                }
            }
        }
    }
    debug_assert_eq!(offset, POSITION_COUNT);
}

fn progress_bar(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new(POSITION_COUNT);
    pb.set_style(
        ProgressStyle::with_template(
            "{msg} {spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} ({eta})",
        )
        .expect("valid indicatif template")
        .progress_chars("#>-"),
    );
    pb.with_message(message)
}

/// A winning move that ends the game on the spot: walking the lion
/// onto the far rank. Its legality already guarantees the lion cannot
/// be captured in reply. Lion captures never show up here because a
/// position allowing one fails validation.
fn wins_at_once(m: &Move) -> bool {
    m.piece == LION_S && Color::Sente.far_rank().contains(m.to)
}

fn stamp_aliases(table: &mut [u8], pos: &Position, byte: u8) {
    for pc in poscode_aliases(pos) {
        table[position_offset(&pc) as usize] = byte;
    }
}

/// Distance byte of the position after `m`, read from the table under
/// construction, from the mover's perspective: `Some(odd)` means the
/// mover loses through this move, `Some(even)` that it wins, `None`
/// that the move's result is still open (or drawn).
fn successor_byte(table: &[u8], pos: &Position, m: &Move) -> Option<u8> {
    let mut after = *pos;
    after.play_move(m).expect("legal move");
    after.flip_sides();
    match encode_pos_check(&after) {
        // the mover just completed a try; from the successor's seat the
        // game is lost with zero plies left
        EncodeResult::GoteWon => Some(0),
        EncodeResult::SenteWon => unreachable!("the idle lion cannot reach its far rank"),
        EncodeResult::Invalid => unreachable!("legal moves preserve validity"),
        EncodeResult::Code(pc) => {
            let byte = table[position_offset(&pc) as usize];
            (byte <= DTM_MAX).then_some(byte)
        }
    }
}

pub struct TableBaseBuilder;

impl TableBaseBuilder {
    /// Runs the whole retrograde analysis. Expect this to take a long
    /// while and 255 MB of memory; the result is the finished table.
    #[must_use]
    pub fn build() -> DtmTable {
        let mut table = vec![DTM_DRAW; POSITION_COUNT as usize];
        Self::seed(&mut table);
        Self::propagate(&mut table);
        table
    }

    /// First pass: mark invalid codes, mated positions (distance 0)
    /// and positions with a game-ending move in hand (distance 1).
    fn seed(table: &mut [u8]) {
        let pb = progress_bar("Seed");
        let (mut invalid, mut mated, mut quick) = (0u64, 0u64, 0u64);
        for_each_code(|offset, pc| {
            if offset % (1 << 20) == 0 {
                pb.set_position(offset);
            }
            match decode_pos(&pc) {
                DecodeResult::Position(pos) => {
                    let moves = pos.legal_moves();
                    if moves.is_empty() {
                        // mate and stalemate both lose the game here
                        table[offset as usize] = 0;
                        mated += 1;
                    } else if moves.iter().any(wins_at_once) {
                        table[offset as usize] = 1;
                        quick += 1;
                    }
                }
                _ => {
                    table[offset as usize] = DTM_INVALID;
                    invalid += 1;
                }
            }
        });
        pb.finish_and_clear();
        info!(
            "seeded: {mated} mated, {quick} winning tries, {invalid} invalid, {} open",
            POSITION_COUNT - mated - quick - invalid
        );
    }

    /// Backward passes: from every position decided in `n` plies, walk
    /// the unmoves. Predecessors of a lost position win in `n + 1`;
    /// predecessors of a won position lose in `n + 1` once every one
    /// of their moves is refuted.
    fn propagate(table: &mut [u8]) {
        for distance in 0..DTM_MAX {
            let frontier = Self::one_pass(table, distance);
            info!("distance {distance}: {frontier} positions expanded");
            // the seed pass writes distances 0 and 1, so a level may
            // only be empty for good once those are behind us
            if frontier == 0 && distance > 0 {
                break;
            }
        }
    }

    fn one_pass(table: &mut [u8], distance: u8) -> u64 {
        let pb = progress_bar("Tag");
        let mut frontier = 0u64;
        let mut offset = 0u64;
        for cohort in 0..COHORT_COUNT as u8 {
            let size = COHORT_SIZE[cohort as usize].size;
            for lionpos in 0..LIONPOS_COUNT as u8 {
                for ownership in 0..OWNERSHIP_COUNT as u8 {
                    for map in 0..size {
                        let here = offset;
                        offset += 1;
                        if here % (1 << 20) == 0 {
                            pb.set_position(here);
                        }
                        if table[here as usize] != distance {
                            continue;
                        }
                        let pc = PosCode {
                            cohort,
                            lionpos,
                            map,
                            ownership,
                        };
                        let DecodeResult::Position(pos) = decode_pos(&pc) else {
                            unreachable!("distance bytes only sit on valid codes");
                        };
                        // aliases repeat the canonical work, skip them
                        if encode_pos(&pos) != pc {
                            continue;
                        }
                        frontier += 1;
                        Self::expand(table, &pos, distance);
                    }
                }
            }
        }
        pb.finish_and_clear();
        frontier
    }

    fn expand(table: &mut [u8], pos: &Position, distance: u8) {
        for u in pos.legal_unmoves() {
            let mut pred = *pos;
            pred.undo_move(&u);
            pred.flip_sides();
            let EncodeResult::Code(pc) = encode_pos_check(&pred) else {
                unreachable!("legal unmoves yield live positions");
            };
            if table[position_offset(&pc) as usize] != DTM_DRAW {
                continue;
            }
            if distance % 2 == 0 {
                // the predecessor walks into a position lost in
                // `distance`, winning one ply earlier than that
                stamp_aliases(table, &pred, distance + 1);
            } else if Self::all_moves_refuted(table, &pred, distance) {
                stamp_aliases(table, &pred, distance + 1);
            }
        }
    }

    /// Is every move of `pos` answered by a win for the opponent, the
    /// slowest of them in exactly `distance` plies?
    fn all_moves_refuted(table: &[u8], pos: &Position, distance: u8) -> bool {
        let mut slowest = 0u8;
        for m in pos.legal_moves() {
            if wins_at_once(&m) {
                return false;
            }
            match successor_byte(table, pos, &m) {
                Some(byte) if byte % 2 == 1 => slowest = slowest.max(byte),
                // an open, drawn or opponent-losing reply refutes
                // nothing
                _ => return false,
            }
        }
        slowest == distance
    }
}

/// Tallies of a finished table, ready for a JSON report.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct Stats {
    pub invalid: u64,
    pub draws: u64,
    pub wins: FxHashMap<u8, u64>,
    pub losses: FxHashMap<u8, u64>,
}

impl Stats {
    #[must_use]
    pub fn from_table(table: &[u8]) -> Self {
        let mut stats = Self::default();
        for &byte in table {
            match byte {
                DTM_INVALID => stats.invalid += 1,
                DTM_DRAW => stats.draws += 1,
                b if b % 2 == 1 => *stats.wins.entry(b).or_default() += 1,
                b => *stats.losses.entry(b).or_default() += 1,
            }
        }
        stats
    }

    pub fn log(&self) {
        debug!("invalid: {}, draws: {}", self.invalid, self.draws);
        for (dtm, count) in self.wins.iter().sorted() {
            debug!("win in {dtm}: {count}");
        }
        for (dtm, count) in self.losses.iter().sorted() {
            debug!("loss in {dtm}: {count}");
        }
    }

    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).expect("stats serialize cleanly")
    }
}

/// Writes a finished table to disk; the file is the flat byte array
/// the reader expects, no header, no trailer.
pub fn write_table(path: impl AsRef<Path>, table: &[u8]) -> io::Result<()> {
    assert_eq!(table.len() as u64, POSITION_COUNT, "table incomplete");
    let mut file = std::fs::File::create(path)?;
    file.write_all(table)?;
    file.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Square;
    use crate::indexer::canonical;

    #[test]
    fn test_code_enumeration_matches_offsets() {
        let mut seen = 0u64;
        for_each_code(|offset, pc| {
            if offset < 10_000 || offset % 65_537 == 0 {
                assert_eq!(position_offset(&pc), offset);
            }
            seen += 1;
        });
        assert_eq!(seen, POSITION_COUNT);
    }

    #[test]
    fn test_wins_at_once_spots_the_try() {
        // the gote lion covers b1, so c1 is the only winning entry
        let pos: Position = "S/---/l-L/---/---/ccggee".parse().unwrap();
        let tries: Vec<Move> = pos.legal_moves().into_iter().filter(wins_at_once).collect();
        assert_eq!(
            tries,
            vec![Move {
                piece: LION_S,
                to: Square::new(9)
            }]
        );
    }

    #[test]
    fn test_successor_byte_reads_a_try_as_lost() {
        // any table will do, nothing decided is ever read from it
        let table = vec![DTM_DRAW; POSITION_COUNT as usize];
        let pos: Position = "S/---/l-L/---/---/ccggee".parse().unwrap();
        let try_move = Move {
            piece: LION_S,
            to: Square::new(9),
        };
        assert_eq!(successor_byte(&table, &pos, &try_move), Some(0));
    }

    #[test]
    fn test_stamp_aliases_touches_every_rendering() {
        let mut table = vec![DTM_DRAW; POSITION_COUNT as usize];
        let pos = canonical(&"S/-l-/---/---/-L-/CcGgEe".parse::<Position>().unwrap()).unwrap();
        stamp_aliases(&mut table, &pos, 42);
        let stamped = poscode_aliases(&pos);
        assert_eq!(stamped.len(), 8);
        for pc in &stamped {
            assert_eq!(table[position_offset(pc) as usize], 42);
        }
    }

    #[test]
    fn test_stats_from_table() {
        let table = [0u8, 1, 1, DTM_DRAW, DTM_INVALID, 2, 3];
        let stats = Stats::from_table(&table);
        assert_eq!(stats.invalid, 1);
        assert_eq!(stats.draws, 1);
        assert_eq!(stats.wins.get(&1), Some(&2));
        assert_eq!(stats.wins.get(&3), Some(&1));
        assert_eq!(stats.losses.get(&0), Some(&1));
        assert_eq!(stats.losses.get(&2), Some(&1));
        assert!(stats.to_json().contains("\"draws\": 1"));
    }
}
