use std::str::FromStr;

use clap::Args;
use log::info;

use dobutsu_tb::{
    canonical, code_at_offset, decode_pos, encode_pos_check, poscode_aliases, position_offset,
    DecodeResult, EncodeResult, Position,
};

/// Decodes a table offset, or encodes a position string, and shows the
/// board together with all its alias codes.
#[derive(Args, Debug)]
pub struct Explore {
    #[arg(short, long, conflicts_with = "pos", help = "Byte offset into the table")]
    offset: Option<u64>,
    #[arg(short, long, value_parser = Position::from_str)]
    pos: Option<Position>,
}

impl Explore {
    pub fn run(self) {
        match (self.offset, self.pos) {
            (Some(offset), None) => explore_offset(offset),
            (None, Some(pos)) => explore_position(&pos),
            _ => info!("pass exactly one of --offset and --pos"),
        }
    }
}

fn explore_offset(offset: u64) {
    let Some(pc) = code_at_offset(offset) else {
        info!("offset {offset} lies past the end of the table");
        return;
    };
    info!("offset {offset} holds {pc:?}");
    match decode_pos(&pc) {
        DecodeResult::Position(pos) => explore_position(&pos),
        other => info!("decodes to {other:?}"),
    }
}

fn explore_position(pos: &Position) {
    match canonical(pos) {
        Some(canon) => {
            info!("position: {pos}");
            if canon != *pos {
                info!("canonical: {canon}");
            }
            for pc in poscode_aliases(&canon) {
                info!("alias {pc:?} at offset {}", position_offset(&pc));
            }
        }
        None => {
            let mut query = *pos;
            if query.gote_moves() {
                query.flip_sides();
            }
            info!("position: {pos} ({:?})", encode_pos_check(&query));
        }
    }
}
