use std::cmp::Ordering;
use std::ops::Not;

/// Byte value for a drawn position.
pub const DTM_DRAW: u8 = 0xfe;

/// Byte value for a slot no legal position maps to. Reading one from a
/// query is a data error, never a game result.
pub const DTM_INVALID: u8 = 0xff;

/// Largest representable distance-to-mate.
pub const DTM_MAX: u8 = 0xfd;

/// Perfect-play result for the side to move. Distances count plies to
/// the end of the game: an even distance means the side to move loses
/// in that many plies, an odd one that it wins, matching the byte
/// layout of the tablebase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtm {
    Win(u8),
    Draw,
    Lose(u8),
}

impl Dtm {
    /// Reads a table byte; `None` for the invalid marker.
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            DTM_INVALID => None,
            DTM_DRAW => Some(Self::Draw),
            b if b % 2 == 1 => Some(Self::Win(b)),
            b => Some(Self::Lose(b)),
        }
    }

    #[must_use]
    pub fn to_byte(self) -> u8 {
        match self {
            Self::Draw => DTM_DRAW,
            Self::Win(n) | Self::Lose(n) => n,
        }
    }

    /// Plies until the game ends, or `None` for a draw.
    #[must_use]
    pub fn plies(self) -> Option<u8> {
        match self {
            Self::Draw => None,
            Self::Win(n) | Self::Lose(n) => Some(n),
        }
    }

    /// The mover's result given the result of the position after the
    /// move (seen from the opponent).
    #[must_use]
    pub fn from_successor(successor: Self) -> Self {
        match successor {
            Self::Lose(n) => Self::Win(n + 1),
            Self::Win(n) => Self::Lose(n + 1),
            Self::Draw => Self::Draw,
        }
    }
}

impl Ord for Dtm {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Win(x), Self::Win(y)) => x.cmp(y).reverse(), // a short win is better
            (Self::Win(_), _) => Ordering::Greater,
            (_, Self::Win(_)) => Ordering::Less,
            (Self::Draw, Self::Draw) => Ordering::Equal,
            (Self::Draw, Self::Lose(_)) => Ordering::Greater,
            (Self::Lose(_), Self::Draw) => Ordering::Less,
            (Self::Lose(x), Self::Lose(y)) => x.cmp(y), // losing late is better
        }
    }
}

impl PartialOrd for Dtm {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Not for Dtm {
    type Output = Self;

    /// The same game seen from the other player.
    fn not(self) -> Self {
        match self {
            Self::Win(n) => Self::Lose(n),
            Self::Lose(n) => Self::Win(n),
            Self::Draw => Self::Draw,
        }
    }
}
