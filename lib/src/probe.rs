use std::error::Error;
use std::fmt;
use std::io;
use std::path::Path;

use log::{debug, trace};
use positioned_io::{RandomAccessFile, ReadAt};

use crate::cohort::POSITION_COUNT;
use crate::indexer::{encode_pos_check, position_offset, EncodeResult};
use crate::movegen::{Move, MoveList};
use crate::outcome::Dtm;
use crate::position::{LION_G, LION_S};
use crate::Position;

#[derive(Debug)]
pub enum ProbeError {
    /// The queried position fails validation.
    Invalid,
    /// The table holds the invalid marker at this offset; the file is
    /// damaged or not a tablebase.
    Corrupt(u64),
    Io(io::Error),
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid => f.write_str("invalid position"),
            Self::Corrupt(offset) => {
                write!(f, "corrupt tablebase entry at offset {offset}")
            }
            Self::Io(err) => write!(f, "tablebase read failed: {err}"),
        }
    }
}

impl Error for ProbeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ProbeError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

/// Read handle over a generated tablebase file. All reads are
/// positional (`pread`-style), so shared references can probe from
/// several threads without coordination; the file itself is immutable
/// after generation.
#[derive(Debug)]
pub struct Tablebase {
    raf: RandomAccessFile,
}

impl Tablebase {
    /// Opens a tablebase and checks its length; releasing the handle
    /// closes the file.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let len = std::fs::metadata(path.as_ref())?.len();
        if len != POSITION_COUNT {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "tablebase must be exactly {POSITION_COUNT} bytes, found {len}"
                ),
            ));
        }
        debug!("opening tablebase at {:?}", path.as_ref());
        Ok(Self {
            raf: RandomAccessFile::open(path)?,
        })
    }

    /// Perfect-play distance for the side to move. Decided positions
    /// (a lion captured en route here, or standing on its far rank)
    /// resolve without touching the file as `Win(0)` or `Lose(0)`.
    pub fn distance_to_mate(&self, pos: &Position) -> Result<Dtm, ProbeError> {
        let mut query = *pos;
        if query.gote_moves() {
            // the table stores Sente-to-move positions only
            query.flip_sides();
        }
        // a missing lion decides the game without a table entry; after
        // the flip the mover's lion is always in the Sente slot
        if query.in_hand(LION_S) {
            return Ok(Dtm::Lose(0));
        }
        if query.in_hand(LION_G) {
            return Ok(Dtm::Win(0));
        }
        match encode_pos_check(&query) {
            EncodeResult::SenteWon => Ok(Dtm::Win(0)),
            EncodeResult::GoteWon => Ok(Dtm::Lose(0)),
            EncodeResult::Invalid => Err(ProbeError::Invalid),
            EncodeResult::Code(pc) => {
                let offset = position_offset(&pc);
                let mut buf = [0u8; 1];
                self.raf.read_exact_at(offset, &mut buf)?;
                trace!("offset {offset} holds {:#04x}", buf[0]);
                Dtm::from_byte(buf[0]).ok_or(ProbeError::Corrupt(offset))
            }
        }
    }

    /// Result of playing `m`, seen from the mover.
    pub fn move_outcome(&self, pos: &Position, m: &Move) -> Result<Dtm, ProbeError> {
        let mut after = *pos;
        after.play_move(m).map_err(|_| ProbeError::Invalid)?;
        if after.in_hand(LION_S) || after.in_hand(LION_G) {
            // capturing the lion ends the game at once
            return Ok(Dtm::Win(1));
        }
        Ok(Dtm::from_successor(self.distance_to_mate(&after)?))
    }

    /// One best move, shortest win first, longest loss last.
    pub fn best_move(&self, pos: &Position) -> Result<Option<(Move, Dtm)>, ProbeError> {
        let mut best: Option<(Move, Dtm)> = None;
        for m in pos.legal_moves() {
            let dtm = self.move_outcome(pos, &m)?;
            if best.map_or(true, |(_, b)| dtm > b) {
                best = Some((m, dtm));
            }
        }
        Ok(best)
    }

    /// Walks a perfect-play line from `pos` until the game is decided
    /// or drawn play would repeat forever.
    pub fn best_line(&self, pos: &Position) -> Result<(MoveList, Dtm), ProbeError> {
        let root = self.distance_to_mate(pos)?;
        let mut line = MoveList::new();
        let Some(mut left) = root.plies() else {
            return Ok((line, root));
        };
        let mut current = *pos;
        while left > 0 {
            let (m, dtm) = self
                .best_move(&current)?
                .expect("positions short of mate have moves");
            debug_assert_eq!(dtm.plies(), Some(left));
            line.push(m);
            current.play_move(&m).map_err(|_| ProbeError::Invalid)?;
            left -= 1;
        }
        Ok((line, root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::encode_pos;
    use crate::outcome::{DTM_DRAW, DTM_INVALID};
    use std::fs::OpenOptions;
    use std::path::PathBuf;

    use positioned_io::WriteAt;

    /// A sparse file of the right length: every unwritten byte reads
    /// as 0x00.
    fn scratch_table(name: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("dobutsu-test-{name}-{}", std::process::id()));
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        file.set_len(POSITION_COUNT).unwrap();
        path
    }

    fn write_byte(path: &PathBuf, offset: u64, byte: u8) {
        let mut file = OpenOptions::new().write(true).open(path).unwrap();
        file.write_all_at(offset, &[byte]).unwrap();
    }

    #[test]
    fn test_open_rejects_wrong_length() {
        let path = std::env::temp_dir().join(format!("dobutsu-short-{}", std::process::id()));
        std::fs::write(&path, b"not a tablebase").unwrap();
        assert!(Tablebase::open(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_terminal_positions_skip_the_file() {
        let path = scratch_table("terminal");
        let tb = Tablebase::open(&path).unwrap();
        let won: Position = "S/L--/--l/---/---/ccggee".parse().unwrap();
        assert_eq!(tb.distance_to_mate(&won).unwrap(), Dtm::Win(0));
        let lost: Position = "S/---/---/---/L-l/CCGGEE".parse().unwrap();
        assert_eq!(tb.distance_to_mate(&lost).unwrap(), Dtm::Lose(0));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_byte_lookup_and_turn_flip() {
        let path = scratch_table("lookup");
        let pos = Position::initial();
        let offset = position_offset(&encode_pos(&pos));
        write_byte(&path, offset, DTM_DRAW);
        let tb = Tablebase::open(&path).unwrap();
        assert_eq!(tb.distance_to_mate(&pos).unwrap(), Dtm::Draw);
        // the flipped, Gote-to-move rendering reads the same byte
        let mut flipped = pos;
        flipped.flip_sides();
        assert_eq!(tb.distance_to_mate(&flipped).unwrap(), Dtm::Draw);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_corrupt_entry_is_an_error() {
        let path = scratch_table("corrupt");
        let pos = Position::initial();
        let offset = position_offset(&encode_pos(&pos));
        write_byte(&path, offset, DTM_INVALID);
        let tb = Tablebase::open(&path).unwrap();
        match tb.distance_to_mate(&pos) {
            Err(ProbeError::Corrupt(o)) => assert_eq!(o, offset),
            other => panic!("expected a corruption error, got {other:?}"),
        }
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_invalid_position_rejected() {
        let path = scratch_table("invalid");
        let tb = Tablebase::open(&path).unwrap();
        let pos: Position = "S/-l-/-C-/---/-L-/cggee".parse().unwrap();
        assert!(matches!(
            tb.distance_to_mate(&pos),
            Err(ProbeError::Invalid)
        ));
        std::fs::remove_file(&path).unwrap();
    }
}
