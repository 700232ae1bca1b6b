use std::error::Error;
use std::fmt;

use arrayvec::ArrayVec;

use crate::board::{attacks, Bitboard, Color, PieceKind, Square};
use crate::position::{kind_of, lion_slot, Position, GOTE_BIT, IN_HAND, LOC_MASK, PIECE_COUNT};

/// Most moves any position admits, e.g. `S/---/-L-/--l/-R-/CGGEE`.
pub const MAX_MOVES: usize = 40;

/// Most unmoves any position admits, e.g. `S/---/gel/---/-rL/cge`.
pub const MAX_UNMOVES: usize = 77;

pub type MoveList = ArrayVec<Move, MAX_MOVES>;
pub type UnmoveList = ArrayVec<Unmove, MAX_UNMOVES>;

/// A move: which piece goes where. The owner is implied by the side to
/// move; a piece moving out of the hand is a drop. Chick promotion is
/// automatic on reaching the far rank and needs no extra field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub piece: usize,
    pub to: Square,
}

/// What it takes to undo a move during retrograde analysis: the square
/// the piece came from ([`IN_HAND`] undoes a drop), the slot of a piece
/// the move captured, and promotion bits to xor back into the status
/// word (the mover's own promotion, or a captured rooster's demotion).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unmove {
    pub piece: usize,
    pub from: u8,
    pub capture: Option<usize>,
    pub status: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalMove;

impl fmt::Display for IllegalMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("illegal move")
    }
}

impl Error for IllegalMove {}

impl Position {
    /// Is `m` legal for the side to move? This covers movement rules,
    /// drop restrictions and lion safety. There are no discovered
    /// checks on this board (every piece moves one step), so a non-lion
    /// move is only constrained when the lion already stands in check.
    #[must_use]
    pub fn move_valid(&self, m: &Move) -> bool {
        if m.piece >= PIECE_COUNT {
            return false;
        }
        let us = self.side_to_move();
        if self.owner_of(m.piece) != us || self.occupied_by(us).contains(m.to) {
            return false;
        }
        let checkers = self.checkers(!us);
        match self.square_of(m.piece) {
            None => {
                // drop: only onto an empty square, chicks keep off the
                // far rank, and a drop can never resolve a check
                kind_of(m.piece) != PieceKind::Lion
                    && !self.occupied().contains(m.to)
                    && !(kind_of(m.piece) == PieceKind::Chick
                        && us.far_rank().contains(m.to))
                    && checkers.is_empty()
            }
            Some(from) => {
                if !attacks(kind_of(m.piece), self.promoted(m.piece), us, from).contains(m.to) {
                    return false;
                }
                if m.piece == lion_slot(us) {
                    // the square a captured piece stood on is never
                    // attacked by that piece itself, so this stays
                    // correct for captures
                    !self.attacked_by(!us).contains(m.to)
                } else {
                    checkers.is_empty() || (checkers.count() == 1 && checkers.contains(m.to))
                }
            }
        }
    }

    /// Plays `m` in place and returns the record needed to undo it.
    /// On an illegal move the position is left untouched.
    ///
    /// Capturing the opposing lion is accepted and ends the game; the
    /// resulting struct then has a lion in hand and is only good for
    /// inspection, not for further play.
    pub fn play_move(&mut self, m: &Move) -> Result<Unmove, IllegalMove> {
        if !self.move_valid(m) {
            return Err(IllegalMove);
        }
        let us = self.side_to_move();
        let us_bit = if us == Color::Gote { GOTE_BIT } else { 0 };
        let from = self.pieces_raw(m.piece) & LOC_MASK;
        let mut toggle = 0u16;

        let capture = self.slot_on(!us, m.to);
        if let Some(cap) = capture {
            if self.promoted(cap) {
                toggle |= 1 << cap; // capture demotes
            }
            self.set_loc(cap, IN_HAND | us_bit);
        }
        if kind_of(m.piece) == PieceKind::Chick
            && !self.promoted(m.piece)
            && from != IN_HAND
            && us.far_rank().contains(m.to)
        {
            toggle |= 1 << m.piece;
        }
        self.xor_status(toggle);
        self.set_loc(m.piece, m.to.u8() | us_bit);
        self.null_move();
        self.rebuild_map();
        Ok(Unmove {
            piece: m.piece,
            from,
            capture,
            status: toggle,
        })
    }

    /// Reverts a move previously applied to this position.
    pub fn undo_move(&mut self, u: &Unmove) {
        let mover_bit = self.pieces_raw(u.piece) & GOTE_BIT;
        let to = self.pieces_raw(u.piece) & LOC_MASK;
        self.set_loc(u.piece, u.from | mover_bit);
        if let Some(cap) = u.capture {
            // the captured piece reappears, owned by the other side
            self.set_loc(cap, to | (GOTE_BIT ^ mover_bit));
        }
        self.xor_status(u.status);
        self.null_move();
        self.rebuild_map();
    }

    /// Every legal move for the side to move, drops included.
    #[must_use]
    pub fn legal_moves(&self) -> MoveList {
        let us = self.side_to_move();
        let mut out = MoveList::new();
        let own = self.occupied_by(us);
        let checkers = self.checkers(!us);
        let danger = self.attacked_by(!us);
        for slot in 0..PIECE_COUNT {
            if self.owner_of(slot) != us {
                continue;
            }
            let Some(from) = self.square_of(slot) else {
                continue;
            };
            let targets = attacks(kind_of(slot), self.promoted(slot), us, from) & !own;
            for to in targets {
                if slot == lion_slot(us) {
                    if danger.contains(to) {
                        continue;
                    }
                } else if !checkers.is_empty()
                    && !(checkers.count() == 1 && checkers.contains(to))
                {
                    continue;
                }
                out.push(Move { piece: slot, to });
            }
        }
        if checkers.is_empty() {
            for kind in PieceKind::HAND_KINDS {
                let Some(slot) = self.hand_slot(kind, us) else {
                    continue;
                };
                let mut targets = !self.occupied();
                if kind == PieceKind::Chick {
                    targets &= !us.far_rank();
                }
                for to in targets {
                    out.push(Move { piece: slot, to });
                }
            }
        }
        out
    }

    /// Every legal unmove: each position yielded by undoing one entry
    /// is a valid predecessor in which the opponent is to move and the
    /// game was not yet decided.
    #[must_use]
    pub fn legal_unmoves(&self) -> UnmoveList {
        let us = self.side_to_move();
        let them = !us;
        let occ = self.occupied();
        let mut out = UnmoveList::new();
        for slot in 0..PIECE_COUNT {
            if self.owner_of(slot) != them {
                continue;
            }
            let Some(to) = self.square_of(slot) else {
                continue;
            };
            let kind = kind_of(slot);
            let promoted = self.promoted(slot);
            // squares the piece may have stepped from: the attack set
            // of the opposite color read at the destination
            let sources = match kind {
                PieceKind::Chick if promoted => attacks(kind, true, us, to),
                PieceKind::Chick if them.far_rank().contains(to) => Bitboard::EMPTY,
                k => attacks(k, promoted, us, to),
            } & !occ;
            for src in sources {
                self.push_step_undos(&mut out, slot, src, 0, them);
            }
            if promoted && them.far_rank().contains(to) {
                // the previous state may have been a chick promoting on
                // this very step
                for src in attacks(PieceKind::Chick, false, us, to) & !occ {
                    self.push_step_undos(&mut out, slot, src, 1 << slot, them);
                }
            }
            if !promoted
                && kind != PieceKind::Lion
                && !(kind == PieceKind::Chick && them.far_rank().contains(to))
            {
                self.try_push_unmove(
                    &mut out,
                    Unmove {
                        piece: slot,
                        from: IN_HAND,
                        capture: None,
                        status: 0,
                    },
                );
            }
        }
        out
    }

    fn push_step_undos(&self, out: &mut UnmoveList, slot: usize, src: Square, toggle: u16, them: Color) {
        self.try_push_unmove(
            out,
            Unmove {
                piece: slot,
                from: src.u8(),
                capture: None,
                status: toggle,
            },
        );
        for kind in PieceKind::HAND_KINDS {
            let Some(cap) = self.hand_slot(kind, them) else {
                continue;
            };
            self.try_push_unmove(
                out,
                Unmove {
                    piece: slot,
                    from: src.u8(),
                    capture: Some(cap),
                    status: toggle,
                },
            );
            if kind == PieceKind::Chick {
                // capture demotes, so the captured chick may have been
                // a rooster before this move
                self.try_push_unmove(
                    out,
                    Unmove {
                        piece: slot,
                        from: src.u8(),
                        capture: Some(cap),
                        status: toggle | 1 << cap,
                    },
                );
            }
        }
    }

    fn try_push_unmove(&self, out: &mut UnmoveList, u: Unmove) {
        let mut q = *self;
        q.undo_move(&u);
        if !q.is_valid() {
            return;
        }
        // the game must not already have ended before the move
        for color in Color::ALL {
            if let Some(sq) = q.square_of(lion_slot(color)) {
                if color.far_rank().contains(sq) {
                    return;
                }
            }
        }
        out.push(u);
    }

    /// First slot of `kind` sitting in `owner`'s hand. When both pieces
    /// of a pair are in the same hand they are indistinguishable, so
    /// returning one of them is enough.
    #[must_use]
    pub fn hand_slot(&self, kind: PieceKind, owner: Color) -> Option<usize> {
        let base = 2 * kind.index();
        [base, base + 1]
            .into_iter()
            .find(|&slot| self.in_hand(slot) && self.owner_of(slot) == owner)
    }
}
