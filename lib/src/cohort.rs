//! Static tables behind the position code. A cohort says which pieces
//! stand on the board and which board chicks are promoted; the lion
//! tables enumerate the joint placements of the two lions. Everything
//! is generated from first principles at compile time, and the totals
//! are pinned by `const` assertions so a wrong table cannot build.

/// Cohorts: 7 chick shapes (0 on board; 1, chick or rooster; 2 with
/// every promotion combination) × 3 giraffe counts × 3 elephant counts.
pub const COHORT_COUNT: usize = 63;

/// Canonical lion placements, after horizontal-mirror reduction.
pub const LIONPOS_COUNT: usize = 21;

/// All valid lion placements (39) plus the two decided-game entries.
pub const LIONPOS_TOTAL_COUNT: usize = 41;

/// Valid lion placements before mirror reduction.
pub const LIONPOS_PAIR_COUNT: usize = 39;

/// Ownership words: one Gote bit per non-lion piece.
pub const OWNERSHIP_COUNT: usize = 64;

/// Length of the tablebase in bytes; every byte is one position.
pub const POSITION_COUNT: u64 = 255_280_704;

/// Most codes a single position can map to: the mirror on the symmetry
/// axis and one swap per piece pair split between the two hands.
pub const MAX_ALIAS: usize = 16;

/// Squares left for non-lion pieces once the lions are placed.
const FREE_SQUARES: u8 = 10;

/// Per-cohort shape data. Eight bytes per entry, so an indexed
/// addressing mode reaches it in one instruction; the size/offset pair
/// lives in [`CohortSize`] for the same reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CohortInfo {
    /// On-board piece counts: chicks, giraffes, elephants.
    pub pieces: [u8; 3],
    /// Promotion bits of the on-board chicks, in ascending-square
    /// order: bit 0 is the lower chick.
    pub status: u8,
    /// Map radixes per kind, same order as `pieces`.
    pub sizes: [u8; 3],
    pub padding: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct CohortSize {
    /// Byte offset of this cohort's region in the tablebase.
    pub offset: u32,
    /// Product of the map radixes: positions per (lionpos, ownership)
    /// stride.
    pub size: u32,
}

/// Ways to put `count` indistinguishable pieces on `free` squares,
/// squares ascending.
const fn kind_radix(count: u8, free: u8) -> u8 {
    match count {
        0 => 1,
        1 => free,
        _ => free * (free - 1) / 2,
    }
}

/// (on-board chicks, promotion bits) of a chick class 0..7.
const fn chick_shape(class: u8) -> (u8, u8) {
    match class {
        0 => (0, 0),
        1 | 2 => (1, class - 1),
        _ => (2, class - 3),
    }
}

/// The cohort holding positions with the given on-board counts and
/// board-chick promotion bits.
#[must_use]
pub const fn cohort_index(chicks: u8, status: u8, giraffes: u8, elephants: u8) -> u8 {
    let class = match chicks {
        0 => 0,
        1 => 1 + status,
        _ => 3 + status,
    };
    class * 9 + giraffes * 3 + elephants
}

const fn build_cohort_info() -> [CohortInfo; COHORT_COUNT] {
    let mut table = [CohortInfo {
        pieces: [0; 3],
        status: 0,
        sizes: [0; 3],
        padding: 0,
    }; COHORT_COUNT];
    let mut cohort = 0;
    while cohort < COHORT_COUNT {
        let class = (cohort / 9) as u8;
        let giraffes = (cohort / 3 % 3) as u8;
        let elephants = (cohort % 3) as u8;
        let (chicks, status) = chick_shape(class);
        table[cohort] = CohortInfo {
            pieces: [chicks, giraffes, elephants],
            status,
            sizes: [
                kind_radix(chicks, FREE_SQUARES),
                kind_radix(giraffes, FREE_SQUARES - chicks),
                kind_radix(elephants, FREE_SQUARES - chicks - giraffes),
            ],
            padding: 0,
        };
        cohort += 1;
    }
    table
}

pub const COHORT_INFO: [CohortInfo; COHORT_COUNT] = build_cohort_info();

const fn build_cohort_size() -> [CohortSize; COHORT_COUNT] {
    let mut table = [CohortSize { offset: 0, size: 0 }; COHORT_COUNT];
    let mut offset: u64 = 0;
    let mut cohort = 0;
    while cohort < COHORT_COUNT {
        let info = &COHORT_INFO[cohort];
        let size =
            info.sizes[0] as u64 * info.sizes[1] as u64 * info.sizes[2] as u64;
        table[cohort] = CohortSize {
            offset: offset as u32,
            size: size as u32,
        };
        offset += size * (LIONPOS_COUNT * OWNERSHIP_COUNT) as u64;
        cohort += 1;
    }
    table
}

pub const COHORT_SIZE: [CohortSize; COHORT_COUNT] = build_cohort_size();

const fn total_positions() -> u64 {
    let last = &COHORT_SIZE[COHORT_COUNT - 1];
    last.offset as u64 + last.size as u64 * (LIONPOS_COUNT * OWNERSHIP_COUNT) as u64
}

const _: () = assert!(total_positions() == POSITION_COUNT);
const _: () = assert!(std::mem::size_of::<CohortInfo>() == 8);
const _: () = assert!(std::mem::size_of::<CohortSize>() == 8);

/// Marker index: the Sente lion already stands on its far rank, the
/// game is over and the position is not in the table.
pub const LIONPOS_SENTE_WON: u8 = LIONPOS_PAIR_COUNT as u8;

/// Marker index: the Gote lion arrived on its far rank. Validity rules
/// out capturing it, so the game is over as well.
pub const LIONPOS_GOTE_WON: u8 = LIONPOS_PAIR_COUNT as u8 + 1;

pub const LIONPOS_INVALID: u8 = 0xff;

const fn mirror_sq(sq: u8) -> u8 {
    3 * (sq / 3) + 2 - sq % 3
}

const fn lion_adjacent(a: u8, b: u8) -> bool {
    let dr = a as i8 / 3 - b as i8 / 3;
    let dc = a as i8 % 3 - b as i8 % 3;
    let dr = if dr < 0 { -dr } else { dr };
    let dc = if dc < 0 { -dc } else { dc };
    dr <= 1 && dc <= 1
}

/// Lion placements that occur in the table: Sente's lion short of its
/// far rank, Gote's short of its own, distinct and not adjacent (the
/// mover would have left their lion capturable otherwise).
const fn lionpos_pair_valid(sente: u8, gote: u8) -> bool {
    sente < 9 && gote > 2 && gote < 12 && sente != gote && !lion_adjacent(sente, gote)
}

const fn pair_canonical(sente: u8, gote: u8) -> bool {
    let ms = mirror_sq(sente);
    let mg = mirror_sq(gote);
    sente < ms || (sente == ms && gote <= mg)
}

/// `[sente lion, gote lion]` per index; the 21 canonical placements
/// come first, their mirror images after.
const fn build_lionpos_table() -> [[u8; 2]; LIONPOS_PAIR_COUNT] {
    let mut table = [[0u8; 2]; LIONPOS_PAIR_COUNT];
    let mut n = 0;
    let mut pass = 0;
    while pass < 2 {
        let mut sente = 0u8;
        while sente < 9 {
            let mut gote = 3u8;
            while gote < 12 {
                if lionpos_pair_valid(sente, gote)
                    && pair_canonical(sente, gote) == (pass == 0)
                {
                    if pass == 0 {
                        assert!(n < LIONPOS_COUNT);
                    }
                    table[n] = [sente, gote];
                    n += 1;
                }
                gote += 1;
            }
            sente += 1;
        }
        if pass == 0 {
            assert!(n == LIONPOS_COUNT);
        }
        pass += 1;
    }
    assert!(n == LIONPOS_PAIR_COUNT);
    table
}

pub const LIONPOS_TABLE: [[u8; 2]; LIONPOS_PAIR_COUNT] = build_lionpos_table();

const fn build_lionpos_index() -> [[u8; 12]; 12] {
    let mut table = [[LIONPOS_INVALID; 12]; 12];
    let mut i = 0;
    while i < LIONPOS_PAIR_COUNT {
        table[LIONPOS_TABLE[i][0] as usize][LIONPOS_TABLE[i][1] as usize] = i as u8;
        i += 1;
    }
    table
}

/// `(sente lion square, gote lion square)` to pair index, O(1).
pub const LIONPOS_INDEX: [[u8; 12]; 12] = build_lionpos_index();

const fn build_lionpos_mirror() -> [u8; LIONPOS_PAIR_COUNT] {
    let mut table = [0u8; LIONPOS_PAIR_COUNT];
    let mut i = 0;
    while i < LIONPOS_PAIR_COUNT {
        let m = LIONPOS_INDEX[mirror_sq(LIONPOS_TABLE[i][0]) as usize]
            [mirror_sq(LIONPOS_TABLE[i][1]) as usize];
        assert!(m != LIONPOS_INVALID);
        table[i] = m;
        i += 1;
    }
    table
}

/// Pair index of the mirror image; fixed points sit on the axis.
pub const LIONPOS_MIRROR: [u8; LIONPOS_PAIR_COUNT] = build_lionpos_mirror();

const _: () = assert!(LIONPOS_TOTAL_COUNT == LIONPOS_PAIR_COUNT + 2);
