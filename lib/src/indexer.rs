//! The bijection between positions and tablebase offsets. A canonical
//! Sente-to-move position splits into `(cohort, lionpos, map,
//! ownership)`; folding that tuple with the cohort tables gives the
//! byte offset of its distance-to-mate entry. Decoding walks the same
//! path backwards, so `decode ∘ encode` is the identity on canonical
//! positions by construction.

use arrayvec::ArrayVec;

use crate::board::{Color, PieceKind, Square};
use crate::cohort::{
    cohort_index, COHORT_COUNT, COHORT_INFO, COHORT_SIZE, LIONPOS_COUNT, LIONPOS_GOTE_WON,
    LIONPOS_INDEX, LIONPOS_INVALID, LIONPOS_MIRROR, LIONPOS_SENTE_WON, LIONPOS_TABLE, MAX_ALIAS,
    OWNERSHIP_COUNT,
};
use crate::position::{GOTE_BIT, IN_HAND, LION_G, LION_S};
use crate::Position;

/// A position code. `map` is the mixed-radix index of the non-lion
/// board pieces, chicks innermost, then giraffes, then elephants;
/// within a kind, squares ascend. Reordering any of this silently
/// corrupts the tablebase, so both directions go through the same
/// `encode_parts` walk below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PosCode {
    pub cohort: u8,
    pub lionpos: u8,
    pub map: u32,
    pub ownership: u8,
}

/// Byte offset of a code in the tablebase. Assumes a canonical code,
/// i.e. `lionpos < LIONPOS_COUNT`.
#[must_use]
pub fn position_offset(pc: &PosCode) -> u64 {
    let cs = &COHORT_SIZE[pc.cohort as usize];
    u64::from(cs.offset)
        + u64::from(cs.size)
            * (u64::from(pc.lionpos) * OWNERSHIP_COUNT as u64 + u64::from(pc.ownership))
        + u64::from(pc.map)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeResult {
    Code(PosCode),
    /// The Sente lion stands on its far rank and survived the reply.
    SenteWon,
    /// The Gote lion arrived on its far rank; a valid position means it
    /// cannot be captured, so Gote has won.
    GoteWon,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeResult {
    Position(Position),
    SenteWon,
    GoteWon,
    Invalid,
}

fn index_in(free: &[u8], sq: u8) -> u32 {
    free.iter()
        .position(|&s| s == sq)
        .expect("piece square among the free squares") as u32
}

/// The `(cohort, map, ownership)` parts of a Sente-to-move position,
/// optionally read through the horizontal mirror.
fn encode_parts(p: &Position, mirror: bool) -> (u8, u32, u8) {
    let view = |sq: Square| if mirror { sq.mirror().u8() } else { sq.u8() };
    let ls = view(p.square_of(LION_S).expect("sente lion on board"));
    let lg = view(p.square_of(LION_G).expect("gote lion on board"));
    let mut free: ArrayVec<u8, 10> = (0..12).filter(|&s| s != ls && s != lg).collect();
    let mut map = 0u32;
    let mut map_radix = 1u32;
    let mut ownership = 0u8;
    let mut own_bit = 0u8;
    let mut chick_status = 0u8;
    let mut counts = [0u8; 3];
    for kind in PieceKind::HAND_KINDS {
        let slots = [2 * kind.index(), 2 * kind.index() + 1];
        let mut board: ArrayVec<usize, 2> = slots
            .into_iter()
            .filter(|&slot| !p.in_hand(slot))
            .collect();
        board.sort_unstable_by_key(|&slot| view(p.square_of(slot).expect("on board")));
        let mut hand: ArrayVec<usize, 2> = slots
            .into_iter()
            .filter(|&slot| p.in_hand(slot))
            .collect();
        hand.sort_unstable_by_key(|&slot| p.owner_of(slot));

        let n = free.len() as u32;
        let digit = match *board {
            [] => 0,
            [a] => index_in(&free, view(p.square_of(a).expect("on board"))),
            [a, b] => {
                let i = index_in(&free, view(p.square_of(a).expect("on board")));
                let j = index_in(&free, view(p.square_of(b).expect("on board")));
                debug_assert!(i < j);
                i + j * (j - 1) / 2
            }
            _ => unreachable!("a pair has at most two pieces"),
        };
        let radix = match board.len() {
            0 => 1,
            1 => n,
            _ => n * (n - 1) / 2,
        };
        map += digit * map_radix;
        map_radix *= radix;
        for &slot in &board {
            let sq = view(p.square_of(slot).expect("on board"));
            free.retain(|s| *s != sq);
        }
        for (k, &slot) in board.iter().chain(hand.iter()).enumerate() {
            if p.owner_of(slot) == Color::Gote {
                ownership |= 1 << own_bit;
            }
            if kind == PieceKind::Chick && p.promoted(slot) {
                debug_assert!(k < board.len(), "hand chicks are demoted");
                chick_status |= 1 << k;
            }
            own_bit += 1;
        }
        counts[kind.index()] = board.len() as u8;
    }
    (
        cohort_index(counts[0], chick_status, counts[1], counts[2]),
        map,
        ownership,
    )
}

/// Encodes a valid Sente-to-move position. Decided positions (a lion
/// on its far rank) come back with one of the two marker `lionpos`
/// values and no payload.
#[must_use]
pub fn encode_pos(p: &Position) -> PosCode {
    debug_assert!(
        !p.gote_moves(),
        "codes are defined on Sente-to-move positions"
    );
    let ls = p.square_of(LION_S).expect("sente lion on board");
    let lg = p.square_of(LION_G).expect("gote lion on board");
    let decided = if Color::Sente.far_rank().contains(ls) {
        Some(LIONPOS_SENTE_WON)
    } else if Color::Gote.far_rank().contains(lg) {
        Some(LIONPOS_GOTE_WON)
    } else {
        None
    };
    if let Some(lionpos) = decided {
        return PosCode {
            cohort: 0,
            lionpos,
            map: 0,
            ownership: 0,
        };
    }
    let raw = LIONPOS_INDEX[ls.index()][lg.index()];
    debug_assert!(raw != LIONPOS_INVALID, "adjacent lions in valid position");
    let (lionpos, mirror) = if raw >= LIONPOS_COUNT as u8 {
        (LIONPOS_MIRROR[raw as usize], true)
    } else {
        (raw, false)
    };
    let (cohort, map, ownership) = if LIONPOS_MIRROR[lionpos as usize] == lionpos {
        // the lions sit on the symmetry axis: both renderings share the
        // lionpos, so take the lexicographically smaller one
        let plain = encode_parts(p, false);
        let mirrored = encode_parts(p, true);
        plain.min(mirrored)
    } else {
        encode_parts(p, mirror)
    };
    PosCode {
        cohort,
        lionpos,
        map,
        ownership,
    }
}

/// Validating front end to [`encode_pos`].
#[must_use]
pub fn encode_pos_check(p: &Position) -> EncodeResult {
    if p.gote_moves() || !p.is_valid() {
        return EncodeResult::Invalid;
    }
    let pc = encode_pos(p);
    match pc.lionpos {
        x if x == LIONPOS_SENTE_WON => EncodeResult::SenteWon,
        x if x == LIONPOS_GOTE_WON => EncodeResult::GoteWon,
        _ => EncodeResult::Code(pc),
    }
}

/// Rebuilds the canonical position for a code. Codes whose `lionpos`
/// is a decided-game marker classify as such; everything out of range
/// or failing validation is `Invalid`.
#[must_use]
pub fn decode_pos(pc: &PosCode) -> DecodeResult {
    if pc.lionpos == LIONPOS_SENTE_WON {
        return DecodeResult::SenteWon;
    }
    if pc.lionpos == LIONPOS_GOTE_WON {
        return DecodeResult::GoteWon;
    }
    if pc.lionpos >= LIONPOS_COUNT as u8
        || pc.cohort as usize >= COHORT_COUNT
        || pc.ownership as usize >= OWNERSHIP_COUNT
        || pc.map >= COHORT_SIZE[pc.cohort as usize].size
    {
        return DecodeResult::Invalid;
    }
    let info = &COHORT_INFO[pc.cohort as usize];
    let [ls, lg] = LIONPOS_TABLE[pc.lionpos as usize];
    let mut free: ArrayVec<u8, 10> = (0..12).filter(|&s| s != ls && s != lg).collect();
    let mut pieces = [0u8; 8];
    pieces[LION_S] = ls;
    pieces[LION_G] = lg | GOTE_BIT;
    let mut status = 0u16;
    let mut map = pc.map;
    let mut own = pc.ownership;
    for kind in PieceKind::HAND_KINDS {
        let count = info.pieces[kind.index()] as usize;
        let radix = u32::from(info.sizes[kind.index()]);
        let digit = map % radix;
        map /= radix;
        let mut squares: ArrayVec<u8, 2> = ArrayVec::new();
        match count {
            0 => {}
            1 => squares.push(free[digit as usize]),
            _ => {
                let mut j = 1u32;
                while (j + 1) * j / 2 <= digit {
                    j += 1;
                }
                let i = digit - j * (j - 1) / 2;
                squares.push(free[i as usize]);
                squares.push(free[j as usize]);
            }
        }
        for sq in squares.clone() {
            free.retain(|s| *s != sq);
        }
        let base = 2 * kind.index();
        for k in 0..2 {
            let slot = base + k;
            let loc = if k < count { squares[k] } else { IN_HAND };
            pieces[slot] = loc | if own & 1 != 0 { GOTE_BIT } else { 0 };
            own >>= 1;
            if kind == PieceKind::Chick && k < count && info.status >> k & 1 != 0 {
                status |= 1 << slot;
            }
        }
    }
    let pos = Position::from_parts(pieces, status);
    if pos.is_valid() {
        DecodeResult::Position(pos)
    } else {
        DecodeResult::Invalid
    }
}

/// All codes in the tablebase that stand for positions equivalent to
/// `p`, duplicates removed, the canonical one included. Two sources of
/// aliasing survive canonicalization: the horizontal mirror when the
/// lions sit on the symmetry axis, and the ownership rendering of a
/// piece pair whose two members are split between the hands.
#[must_use]
pub fn poscode_aliases(p: &Position) -> ArrayVec<PosCode, MAX_ALIAS> {
    let mut out: ArrayVec<PosCode, MAX_ALIAS> = ArrayVec::new();
    debug_assert!(!p.gote_moves());
    let ls = p.square_of(LION_S).expect("sente lion on board");
    let lg = p.square_of(LION_G).expect("gote lion on board");
    if Color::Sente.far_rank().contains(ls) || Color::Gote.far_rank().contains(lg) {
        return out; // decided positions have no table entries
    }
    let raw = LIONPOS_INDEX[ls.index()][lg.index()];
    if raw == LIONPOS_INVALID {
        return out;
    }
    let (lionpos, base_mirror) = if raw >= LIONPOS_COUNT as u8 {
        (LIONPOS_MIRROR[raw as usize], true)
    } else {
        (raw, false)
    };
    let on_axis = LIONPOS_MIRROR[lionpos as usize] == lionpos;

    let mut swap_masks: ArrayVec<u8, 3> = ArrayVec::new();
    for kind in PieceKind::HAND_KINDS {
        let (a, b) = (2 * kind.index(), 2 * kind.index() + 1);
        if p.in_hand(a) && p.in_hand(b) && p.owner_of(a) != p.owner_of(b) {
            swap_masks.push(0b11 << (2 * kind.index()));
        }
    }

    let mirrors = [
        Some(if on_axis { false } else { base_mirror }),
        on_axis.then_some(true),
    ];
    for mirror in mirrors.into_iter().flatten() {
        let (cohort, map, ownership) = encode_parts(p, mirror);
        for subset in 0..(1u32 << swap_masks.len()) {
            let mut ownership = ownership;
            for (i, &mask) in swap_masks.iter().enumerate() {
                if subset >> i & 1 != 0 {
                    ownership ^= mask;
                }
            }
            out.push(PosCode {
                cohort,
                lionpos,
                map,
                ownership,
            });
        }
    }
    out.sort_unstable();
    let mut dedup: ArrayVec<PosCode, MAX_ALIAS> = ArrayVec::new();
    for pc in out {
        if dedup.last() != Some(&pc) {
            dedup.push(pc);
        }
    }
    dedup
}

/// Inverse of [`position_offset`]: the code whose entry sits at a file
/// offset. `None` past the end of the table.
#[must_use]
pub fn code_at_offset(offset: u64) -> Option<PosCode> {
    if offset >= crate::cohort::POSITION_COUNT {
        return None;
    }
    let cohort = COHORT_SIZE
        .iter()
        .rposition(|c| u64::from(c.offset) <= offset)
        .expect("offset zero belongs to the first cohort");
    let cs = &COHORT_SIZE[cohort];
    let rem = offset - u64::from(cs.offset);
    let stride = rem / u64::from(cs.size);
    Some(PosCode {
        cohort: cohort as u8,
        lionpos: (stride / OWNERSHIP_COUNT as u64) as u8,
        map: (rem % u64::from(cs.size)) as u32,
        ownership: (stride % OWNERSHIP_COUNT as u64) as u8,
    })
}

/// The canonical rendering of any position: Sente to move, mirror
/// resolved, piece pairs in table order. `None` if the position is
/// invalid or the game is already decided.
#[must_use]
pub fn canonical(p: &Position) -> Option<Position> {
    let mut q = *p;
    if q.gote_moves() {
        q.flip_sides();
    }
    match encode_pos_check(&q) {
        EncodeResult::Code(pc) => match decode_pos(&pc) {
            DecodeResult::Position(r) => Some(r),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cohort::POSITION_COUNT;

    #[test]
    fn test_zero_code_round_trips() {
        let pc = PosCode {
            cohort: 0,
            lionpos: 0,
            map: 0,
            ownership: 0,
        };
        let DecodeResult::Position(pos) = decode_pos(&pc) else {
            panic!("code zero should decode");
        };
        assert!(pos.is_valid());
        assert_eq!(encode_pos(&pos), pc);
        assert_eq!(position_offset(&pc), 0);
    }

    #[test]
    fn test_initial_position_code() {
        let pos = Position::initial();
        let pc = encode_pos(&pos);
        // the lions stand on the b file, so the mirrored rendering
        // competes and wins on the giraffe digit
        assert_eq!(pc.lionpos, LIONPOS_INDEX[1][10]);
        assert_eq!(pc.cohort, 35);
        assert_eq!(pc.map, 13_338);
        assert_eq!(pc.ownership, 0b10_1010);
        match decode_pos(&pc) {
            DecodeResult::Position(back) => {
                assert_eq!(encode_pos(&back), pc);
                assert_eq!(canonical(&pos), Some(back));
            }
            other => panic!("initial position decoded to {other:?}"),
        }
    }

    #[test]
    fn test_canonical_is_idempotent() {
        for s in [
            "S/gle/-c-/-C-/ELG/-",
            "S/l--/-e-/-E-/--L/CcGg",
            "S/-l-/---/---/-L-/CcGgEe",
            "G/gle/-c-/-C-/ELG/-",
        ] {
            let pos: Position = s.parse().unwrap();
            let canon = canonical(&pos).expect("legal test position");
            assert_eq!(canonical(&canon), Some(canon), "{s}");
            assert!(!canon.gote_moves());
        }
    }

    #[test]
    fn test_turn_symmetry() {
        // a Gote-to-move position reaches the same canonical form as
        // its flipped Sente-to-move rendering
        let pos: Position = "G/gle/-c-/-C-/ELG/-".parse().unwrap();
        let mut flipped = pos;
        flipped.flip_sides();
        assert_eq!(canonical(&pos), canonical(&flipped));
        assert_eq!(canonical(&pos), canonical(&Position::initial()));
    }

    #[test]
    fn test_encode_ignores_slot_labels() {
        // swapping the two sente chicks must not change the code
        let a: Position = "S/l--/---/C-C/--L/ggee".parse().unwrap();
        let mut b = a;
        let (ca, cb) = (b.pieces_raw(0), b.pieces_raw(1));
        b.set_loc(0, cb);
        b.set_loc(1, ca);
        b.rebuild_map();
        assert_eq!(encode_pos(&a), encode_pos(&b));
    }

    #[test]
    fn test_decided_positions_classify() {
        // sente lion safe on the far rank
        let won: Position = "S/L--/--l/---/---/ccggee".parse().unwrap();
        assert_eq!(encode_pos_check(&won), EncodeResult::SenteWon);
        // gote lion arrived on its far rank, out of reach
        let lost: Position = "S/---/---/---/L-l/CCGGEE".parse().unwrap();
        assert_eq!(encode_pos_check(&lost), EncodeResult::GoteWon);
        assert_eq!(decode_pos(&encode_pos(&won)), DecodeResult::SenteWon);
        assert_eq!(decode_pos(&encode_pos(&lost)), DecodeResult::GoteWon);
        assert!(poscode_aliases(&won).is_empty());
    }

    #[test]
    fn test_invalid_positions_rejected() {
        // gote is in check with sente to move: the last move was illegal
        let pos: Position = "S/-l-/-C-/---/-L-/cggee".parse().unwrap();
        assert!(pos.gote_in_check());
        assert_eq!(encode_pos_check(&pos), EncodeResult::Invalid);
        // out-of-range codes
        for pc in [
            PosCode { cohort: 63, lionpos: 0, map: 0, ownership: 0 },
            PosCode { cohort: 0, lionpos: 21, map: 0, ownership: 0 },
            PosCode { cohort: 0, lionpos: 41, map: 0, ownership: 0 },
            PosCode { cohort: 0, lionpos: 0, map: 1, ownership: 0 },
        ] {
            assert_eq!(decode_pos(&pc), DecodeResult::Invalid, "{pc:?}");
        }
    }

    #[test]
    fn test_aliases_cover_hand_swaps_and_axis_mirror() {
        // lions alone on the axis, every pair split between the hands:
        // the mirror renders identically, the three swaps do not
        let pos: Position = "S/-l-/---/---/-L-/CcGgEe".parse().unwrap();
        let aliases = poscode_aliases(&pos);
        assert_eq!(aliases.len(), 8);
        let canonical_code = encode_pos(&pos);
        assert!(aliases.contains(&canonical_code));
        for pc in &aliases {
            let DecodeResult::Position(q) = decode_pos(pc) else {
                panic!("alias {pc:?} did not decode");
            };
            assert_eq!(encode_pos(&q), canonical_code);
            assert!(position_offset(pc) < POSITION_COUNT);
        }
    }

    #[test]
    fn test_aliases_with_board_asymmetry_on_axis() {
        // axis lions plus an off-axis board giraffe: the mirror
        // contributes a second rendering on top of the elephant swap
        let pos: Position = "S/-l-/g--/---/-L-/ccGEe".parse().unwrap();
        let aliases = poscode_aliases(&pos);
        assert_eq!(aliases.len(), 4);
        for pc in &aliases {
            let DecodeResult::Position(q) = decode_pos(pc) else {
                panic!("alias {pc:?} did not decode");
            };
            assert_eq!(encode_pos(&q), encode_pos(&pos));
        }
    }

    #[test]
    fn test_code_at_offset_inverts_position_offset() {
        for offset in (0..POSITION_COUNT).step_by(1_000_003) {
            let pc = code_at_offset(offset).unwrap();
            assert!(pc.lionpos < LIONPOS_COUNT as u8);
            assert_eq!(position_offset(&pc), offset);
        }
        assert_eq!(code_at_offset(POSITION_COUNT), None);
        assert_eq!(
            code_at_offset(POSITION_COUNT - 1).map(|pc| position_offset(&pc)),
            Some(POSITION_COUNT - 1)
        );
    }

    #[test]
    fn test_unmoves_stay_in_code_space() {
        // retrograde positions re-encode into valid table offsets
        let pos = canonical(&Position::initial()).unwrap();
        for u in pos.legal_unmoves() {
            let mut q = pos;
            q.undo_move(&u);
            q.flip_sides();
            match encode_pos_check(&q) {
                EncodeResult::Code(pc) => {
                    assert!(position_offset(&pc) < POSITION_COUNT);
                }
                other => panic!("unmove {u:?} left the code space: {other:?}"),
            }
        }
    }
}
