use std::path::PathBuf;
use std::str::FromStr;

use clap::{ArgAction, Args};
use log::{debug, info};

use dobutsu_tb::{canonical, encode_pos, Position, Tablebase};

#[derive(Args, Debug)]
pub struct Probe {
    #[arg(
        short,
        long,
        value_parser = Position::from_str,
        help = "example \"S/gle/-c-/-C-/ELG/-\""
    )]
    pos: Position,
    #[arg(long, default_value = "dobutsu.tb")]
    tb_path: PathBuf,
    #[arg(long, action = ArgAction::SetTrue)]
    expanded: bool,
}

impl Probe {
    pub fn run(self) {
        let tb = Tablebase::open(&self.tb_path)
            .unwrap_or_else(|e| panic!("no tablebase at {:?}: {e}", self.tb_path));
        let (line, dtm) = tb.best_line(&self.pos).expect("probe failed");
        let mut rendered = Vec::with_capacity(line.len());
        let mut positions = Vec::with_capacity(line.len());
        let mut current = self.pos;
        for m in &line {
            rendered.push(current.move_string(m));
            current.play_move(m).expect("line moves are legal");
            positions.push(current);
        }
        info!("For {}\nOutcome is {dtm:?}, Moves: {rendered:?}", self.pos);
        debug!(
            "code: {:?}",
            canonical(&self.pos).map(|canon| encode_pos(&canon))
        );
        if self.expanded {
            let expanded: Vec<String> = positions
                .iter()
                .map(|p| {
                    format!(
                        "{p}, code: {:?}",
                        canonical(p).map(|canon| encode_pos(&canon))
                    )
                })
                .collect();
            info!("{}", expanded.join("\n"));
        }
    }
}
