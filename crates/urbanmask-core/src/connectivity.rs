/// Cell adjacency rules for clustering.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Which neighbours count as touching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectivityMode {
    /// Orthogonal neighbours only (rook).
    #[serde(alias = "4", alias = "rook")]
    Four,
    /// Orthogonal plus diagonal neighbours (queen).
    #[default]
    #[serde(alias = "8", alias = "queen")]
    Eight,
}

/// (drow, dcol) of neighbours already visited by a row-major scan.
const BACKWARD_FOUR: [(isize, isize); 2] = [(0, -1), (-1, 0)];
const BACKWARD_EIGHT: [(isize, isize); 4] = [(0, -1), (-1, -1), (-1, 0), (-1, 1)];

const ALL_FOUR: [(isize, isize); 4] = [(-1, 0), (0, -1), (0, 1), (1, 0)];
const ALL_EIGHT: [(isize, isize); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1),           (0, 1),
    (1, -1),  (1, 0),  (1, 1),
];

impl ConnectivityMode {
    /// Neighbours that precede a cell in row-major order.
    pub fn backward_offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &BACKWARD_FOUR,
            Self::Eight => &BACKWARD_EIGHT,
        }
    }

    /// All neighbours of a cell.
    pub fn offsets(self) -> &'static [(isize, isize)] {
        match self {
            Self::Four => &ALL_FOUR,
            Self::Eight => &ALL_EIGHT,
        }
    }

    /// Offsets reaching into the previous row, used when stitching row bands.
    pub fn upward_offsets(self) -> &'static [isize] {
        match self {
            Self::Four => &[0],
            Self::Eight => &[-1, 0, 1],
        }
    }
}

impl fmt::Display for ConnectivityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Four => write!(f, "four"),
            Self::Eight => write!(f, "eight"),
        }
    }
}

impl FromStr for ConnectivityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "4" | "four" | "rook" => Ok(Self::Four),
            "8" | "eight" | "queen" => Ok(Self::Eight),
            other => Err(format!("unknown connectivity `{other}` (expected 4 or 8)")),
        }
    }
}
