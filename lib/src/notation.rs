use std::fmt;
use std::str::FromStr;

use crate::board::{Color, PieceKind, Square};
use crate::movegen::Move;
use crate::position::{kind_of, GOTE_BIT, IN_HAND, LION_G, LION_S, PIECE_COUNT};
use crate::Position;

/// Longest position string, e.g. `S/L--/--l/---/---/ccggee`.
pub const MAX_POSSTR: usize = 25;

/// Longest move string, e.g. `Cb2xb3+`.
pub const MAX_MOVSTR: usize = 8;

fn piece_char(kind: PieceKind, promoted: bool, owner: Color) -> char {
    let c = match kind {
        PieceKind::Chick if promoted => 'r',
        PieceKind::Chick => 'c',
        PieceKind::Giraffe => 'g',
        PieceKind::Elephant => 'e',
        PieceKind::Lion => 'l',
    };
    if owner == Color::Sente {
        c.to_ascii_uppercase()
    } else {
        c
    }
}

fn char_piece(c: char) -> Option<(PieceKind, bool, Color)> {
    let owner = if c.is_ascii_uppercase() {
        Color::Sente
    } else {
        Color::Gote
    };
    let kind = match c.to_ascii_lowercase() {
        'c' => (PieceKind::Chick, false),
        'r' => (PieceKind::Chick, true),
        'g' => (PieceKind::Giraffe, false),
        'e' => (PieceKind::Elephant, false),
        'l' => (PieceKind::Lion, false),
        _ => return None,
    };
    Some((kind.0, kind.1, owner))
}

/// Renders `T/row1/row2/row3/row4/hand`: rows from Gote's home rank
/// down, three characters each, `-` for empty squares; the hand is the
/// concatenation of held pieces (kind by kind, Sente's before Gote's)
/// or `-` when empty.
impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.side_to_move().char())?;
        for rank in (0..4).rev() {
            f.write_str("/")?;
            for file in (0..3).rev() {
                let sq = Square::new(3 * rank + file);
                let slot = Color::ALL
                    .into_iter()
                    .find_map(|color| self.slot_on(color, sq));
                match slot {
                    Some(slot) => write!(
                        f,
                        "{}",
                        piece_char(kind_of(slot), self.promoted(slot), self.owner_of(slot))
                    )?,
                    None => f.write_str("-")?,
                }
            }
        }
        f.write_str("/")?;
        let mut any = false;
        for kind in PieceKind::HAND_KINDS {
            for owner in Color::ALL {
                for slot in [2 * kind.index(), 2 * kind.index() + 1] {
                    if self.in_hand(slot) && self.owner_of(slot) == owner {
                        write!(f, "{}", piece_char(kind, false, owner))?;
                        any = true;
                    }
                }
            }
        }
        if !any {
            f.write_str("-")?;
        }
        Ok(())
    }
}

impl FromStr for Position {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > MAX_POSSTR {
            return Err("position string too long");
        }
        let mut parts = s.split('/');
        let turn = match parts.next() {
            Some("S") => 0,
            Some("G") => crate::position::GOTE_MOVES,
            _ => return Err("side to move must be 'S' or 'G'"),
        };
        let mut pieces = [0xffu8; PIECE_COUNT];
        let mut status = turn;
        let mut place = |kind: PieceKind, promoted: bool, owner: Color, loc: u8| {
            let slot = match (kind, owner) {
                (PieceKind::Lion, Color::Sente) => LION_S,
                (PieceKind::Lion, Color::Gote) => LION_G,
                _ => {
                    let base = 2 * kind.index();
                    if pieces[base] == 0xff {
                        base
                    } else if pieces[base + 1] == 0xff {
                        base + 1
                    } else {
                        return Err("too many pieces of one kind");
                    }
                }
            };
            if pieces[slot] != 0xff {
                return Err("duplicate lion");
            }
            pieces[slot] = loc | if owner == Color::Gote { GOTE_BIT } else { 0 };
            if promoted {
                status |= 1 << slot;
            }
            Ok(())
        };
        for rank in (0..4).rev() {
            let row = parts.next().ok_or("expected four board rows")?;
            if row.len() != 3 {
                return Err("board row must have three squares");
            }
            for (i, ch) in row.chars().enumerate() {
                if ch == '-' {
                    continue;
                }
                let (kind, promoted, owner) =
                    char_piece(ch).ok_or("unknown piece character")?;
                let file = 2 - i as u8;
                place(kind, promoted, owner, 3 * rank as u8 + file)?;
            }
        }
        let hand = parts.next().ok_or("expected a hand field")?;
        if parts.next().is_some() {
            return Err("trailing fields after the hand");
        }
        if hand != "-" {
            for ch in hand.chars() {
                let (kind, promoted, owner) =
                    char_piece(ch).ok_or("unknown piece character")?;
                if promoted {
                    return Err("a hand cannot hold a rooster");
                }
                if kind == PieceKind::Lion {
                    return Err("a hand cannot hold a lion");
                }
                place(kind, false, owner, IN_HAND)?;
            }
        }
        if pieces.contains(&0xff) {
            return Err("every piece must be on the board or in a hand");
        }
        // structural checks only; move legality of the last ply is the
        // caller's business, via `Position::is_valid`
        Ok(Position::from_parts(pieces, status))
    }
}

impl Position {
    /// Renders `m` against this position, e.g. `Cb3xb2`, `Lb4-a3`,
    /// `G*b2` for a drop, with `+` marking automatic promotion.
    #[must_use]
    pub fn move_string(&self, m: &Move) -> String {
        let us = self.side_to_move();
        let kind = kind_of(m.piece);
        let mut s = String::with_capacity(MAX_MOVSTR);
        s.push(piece_char(kind, self.promoted(m.piece), us));
        match self.square_of(m.piece) {
            None => {
                s.push('*');
                s.push_str(&m.to.to_string());
            }
            Some(from) => {
                s.push_str(&from.to_string());
                s.push(if self.occupied().contains(m.to) { 'x' } else { '-' });
                s.push_str(&m.to.to_string());
                if kind == PieceKind::Chick
                    && !self.promoted(m.piece)
                    && us.far_rank().contains(m.to)
                {
                    s.push('+');
                }
            }
        }
        s
    }

    /// Parses a move string against this position and validates it.
    pub fn parse_move(&self, s: &str) -> Result<Move, &'static str> {
        if s.len() > MAX_MOVSTR {
            return Err("move string too long");
        }
        if !s.is_ascii() {
            return Err("move string must be ascii");
        }
        let us = self.side_to_move();
        let mut chars = s.chars();
        let (kind, promoted, owner) = chars
            .next()
            .and_then(char_piece)
            .ok_or("unknown piece character")?;
        if owner != us {
            return Err("piece does not belong to the side to move");
        }
        let rest = chars.as_str();
        let m = if let Some(to) = rest.strip_prefix('*') {
            let to = Square::parse(to).ok_or("bad drop square")?;
            let slot = self
                .hand_slot(kind, us)
                .ok_or("no such piece in hand")?;
            if promoted {
                return Err("a hand cannot hold a rooster");
            }
            Move { piece: slot, to }
        } else {
            if rest.len() < 5 {
                return Err("move string too short");
            }
            let from = Square::parse(&rest[0..2]).ok_or("bad source square")?;
            let to = Square::parse(&rest[3..5]).ok_or("bad target square")?;
            let promotes = match &rest[5..] {
                "" => false,
                "+" => true,
                _ => return Err("trailing characters after move"),
            };
            match &rest[2..3] {
                "x" | "-" => (),
                _ => return Err("expected 'x' or '-' between squares"),
            }
            let slot = self
                .slot_on(us, from)
                .ok_or("no piece on the source square")?;
            if kind_of(slot) != kind || self.promoted(slot) != promoted {
                return Err("piece character does not match the board");
            }
            let should_promote = kind == PieceKind::Chick
                && !promoted
                && us.far_rank().contains(to);
            if promotes != should_promote {
                return Err("promotion mark does not match the move");
            }
            Move { piece: slot, to }
        };
        if self.move_valid(&m) {
            Ok(m)
        } else {
            Err("illegal move")
        }
    }
}
