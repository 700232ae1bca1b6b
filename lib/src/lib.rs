#![warn(clippy::pedantic)]
#![allow(
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation
)]

mod board;
mod cohort;
mod generation;
mod indexer;
mod movegen;
mod notation;
mod outcome;
mod position;
mod probe;

pub use crate::board::{attacks, Bitboard, Color, PieceKind, Square, SQUARE_COUNT};
pub use crate::cohort::{
    cohort_index, CohortInfo, CohortSize, COHORT_COUNT, COHORT_INFO, COHORT_SIZE, LIONPOS_COUNT,
    LIONPOS_GOTE_WON, LIONPOS_INDEX, LIONPOS_MIRROR, LIONPOS_PAIR_COUNT, LIONPOS_SENTE_WON,
    LIONPOS_TABLE, LIONPOS_TOTAL_COUNT, MAX_ALIAS, OWNERSHIP_COUNT, POSITION_COUNT,
};
pub use crate::generation::{write_table, DtmTable, Stats, TableBaseBuilder};
pub use crate::indexer::{
    canonical, code_at_offset, decode_pos, encode_pos, encode_pos_check, poscode_aliases,
    position_offset, DecodeResult, EncodeResult, PosCode,
};
pub use crate::movegen::{IllegalMove, Move, MoveList, Unmove, UnmoveList, MAX_MOVES, MAX_UNMOVES};
pub use crate::notation::{MAX_MOVSTR, MAX_POSSTR};
pub use crate::outcome::{Dtm, DTM_DRAW, DTM_INVALID, DTM_MAX};
pub use crate::position::{
    kind_of, lion_slot, Position, CHICK_G, CHICK_S, ELEPHANT_G, ELEPHANT_S, GIRAFFE_G, GIRAFFE_S,
    GOTE_MOVES, IN_HAND, LION_G, LION_S, PIECE_COUNT, ROOST_G, ROOST_S,
};
pub use crate::probe::{ProbeError, Tablebase};
