use dobutsu_tb::{
    canonical, decode_pos, encode_pos, poscode_aliases, position_offset, DecodeResult,
    PosCode, Position, COHORT_COUNT, COHORT_SIZE, LIONPOS_COUNT, LIONPOS_TOTAL_COUNT, MAX_ALIAS,
    MAX_MOVES, MAX_UNMOVES, OWNERSHIP_COUNT, POSITION_COUNT,
};

#[test]
fn check_table_counts() {
    assert_eq!(COHORT_COUNT, 63);
    assert_eq!(LIONPOS_COUNT, 21);
    assert_eq!(LIONPOS_TOTAL_COUNT, 41);
    assert_eq!(OWNERSHIP_COUNT, 64);
    assert_eq!(POSITION_COUNT, 255_280_704);
    assert_eq!(MAX_ALIAS, 16);
    assert_eq!(MAX_MOVES, 40);
    assert_eq!(MAX_UNMOVES, 77);
}

/// A decodable code either re-encodes to itself (canonical) or is one
/// of the aliases of the position it decodes to.
fn assert_code_round_trips(pc: &PosCode) -> bool {
    match decode_pos(pc) {
        DecodeResult::Position(pos) => {
            assert!(pos.is_valid(), "{pc:?} decoded to an invalid position");
            let back = encode_pos(&pos);
            if back != *pc {
                let aliases = poscode_aliases(&pos);
                assert!(
                    aliases.contains(pc),
                    "{pc:?} re-encodes to {back:?} without being its alias ({pos})"
                );
                assert!(aliases.contains(&back));
            }
            true
        }
        DecodeResult::Invalid => false,
        other => panic!("{pc:?} decoded to {other:?}"),
    }
}

#[test]
fn check_exhaustive_round_trip_small_cohorts() {
    // every code of the hands-heavy cohorts, several hundred thousand
    // in total
    for cohort in 0..6u8 {
        let size = COHORT_SIZE[cohort as usize].size;
        let mut valid = 0u64;
        for lionpos in 0..LIONPOS_COUNT as u8 {
            for ownership in 0..OWNERSHIP_COUNT as u8 {
                for map in 0..size {
                    let pc = PosCode {
                        cohort,
                        lionpos,
                        map,
                        ownership,
                    };
                    if assert_code_round_trips(&pc) {
                        valid += 1;
                    }
                }
            }
        }
        assert!(valid > 0, "cohort {cohort} holds no valid position");
    }
}

#[test]
fn check_sampled_round_trip_all_cohorts() {
    for cohort in 0..COHORT_COUNT as u8 {
        let size = COHORT_SIZE[cohort as usize].size;
        for lionpos in [0u8, 7, 20] {
            for ownership in [0u8, 21, 63] {
                let mut map = 0;
                while map < size {
                    assert_code_round_trips(&PosCode {
                        cohort,
                        lionpos,
                        map,
                        ownership,
                    });
                    map += 97;
                }
            }
        }
    }
}

#[test]
fn check_offsets_stay_in_bounds() {
    for cohort in 0..COHORT_COUNT as u8 {
        let size = COHORT_SIZE[cohort as usize].size;
        let last = PosCode {
            cohort,
            lionpos: LIONPOS_COUNT as u8 - 1,
            map: size - 1,
            ownership: OWNERSHIP_COUNT as u8 - 1,
        };
        assert!(position_offset(&last) < POSITION_COUNT);
        let first = PosCode {
            cohort,
            lionpos: 0,
            map: 0,
            ownership: 0,
        };
        assert_eq!(
            position_offset(&first),
            u64::from(COHORT_SIZE[cohort as usize].offset)
        );
    }
}

fn lcg(state: &mut u64) -> u64 {
    *state = state
        .wrapping_mul(6_364_136_223_846_793_005)
        .wrapping_add(1_442_695_040_888_963_407);
    *state >> 33
}

#[test]
fn check_random_walk_properties() {
    for seed in 0..20u64 {
        let mut state = seed.wrapping_mul(0x9e37_79b9_7f4a_7c15) + 1;
        let mut pos = Position::initial();
        for _ in 0..60 {
            assert!(pos.is_valid());
            assert!(pos.legal_unmoves().len() <= MAX_UNMOVES);

            let Some(canon) = canonical(&pos) else {
                break; // a lion reached its far rank
            };
            let pc = encode_pos(&canon);
            assert!(position_offset(&pc) < POSITION_COUNT);
            match decode_pos(&pc) {
                DecodeResult::Position(q) => assert_eq!(q, canon),
                other => panic!("walked into {other:?} at {pos}"),
            }
            for alias in poscode_aliases(&canon) {
                let DecodeResult::Position(q) = decode_pos(&alias) else {
                    panic!("alias {alias:?} of {pos} did not decode");
                };
                assert_eq!(encode_pos(&q), pc);
            }
            // both renderings of the turn agree on the canonical form
            let mut flipped = pos;
            flipped.flip_sides();
            assert_eq!(canonical(&flipped), Some(canon));

            let moves = pos.legal_moves();
            assert!(moves.len() <= MAX_MOVES);
            let Some(m) = moves.get(lcg(&mut state) as usize % moves.len().max(1)) else {
                break; // mated or stalemated
            };
            let before = pos;
            let u = pos.play_move(m).expect("generated moves are legal");
            let mut restored = pos;
            restored.undo_move(&u);
            assert_eq!(restored, before, "undo after {m:?} from {before}");
        }
    }
}
