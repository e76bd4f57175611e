//! D8 flow-direction encoding
//!
//! Directions are numbered clockwise starting at East:
//! ```text
//!   6  7  8
//!   5  .  1
//!   4  3  2
//! ```
//! Codes 9 and 10 mark terminal (outlet) cells, which have no downstream
//! neighbor but are legitimate basin exits. Anything else that is not NoData
//! is an invalid code.

use crate::error::{Error, Result};
use crate::raster::Region;

/// One of the eight D8 neighbor directions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    East = 1,
    SouthEast = 2,
    South = 3,
    SouthWest = 4,
    West = 5,
    NorthWest = 6,
    North = 7,
    NorthEast = 8,
}

impl Direction {
    /// All directions in ascending code order
    pub const ALL: [Direction; 8] = [
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::North,
        Direction::NorthEast,
    ];

    /// Direction for a code in `1..=8`
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1..=8 => Some(Self::ALL[(code - 1) as usize]),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// (row, col) offset of the neighbor in this direction
    pub fn offset(self) -> (isize, isize) {
        match self {
            Direction::East => (0, 1),
            Direction::SouthEast => (1, 1),
            Direction::South => (1, 0),
            Direction::SouthWest => (1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (-1, -1),
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
        }
    }

    /// The direction pointing back at this cell.
    ///
    /// A neighbor lying in direction `d` drains into the center cell exactly
    /// when its own code is `d.opposite()`.
    pub fn opposite(self) -> Self {
        Self::ALL[((self.code() - 1 + 4) % 8) as usize]
    }

    pub fn is_diagonal(self) -> bool {
        self.code() % 2 == 0
    }
}

/// Decoded value of one flow-direction cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowCode {
    /// Drains to the neighbor in this direction
    Flow(Direction),
    /// Outlet marker (9 or 10)
    Terminal(u8),
    /// Undefined direction
    NoData,
}

pub const TERMINAL_CODES: [u8; 2] = [9, 10];

/// Code conventionally written at a basin outlet
pub const OUTLET: f64 = 10.0;

impl FlowCode {
    /// Decode a raw cell value that is already known not to be NoData.
    ///
    /// `row`/`col` only label the error.
    pub fn decode(value: f64, row: usize, col: usize) -> Result<Self> {
        if value.fract() == 0.0 && (1.0..=10.0).contains(&value) {
            let code = value as u8;
            if let Some(dir) = Direction::from_code(code) {
                return Ok(FlowCode::Flow(dir));
            }
            return Ok(FlowCode::Terminal(code));
        }
        Err(Error::InvalidFlowCode { row, col, value })
    }

    pub fn direction(self) -> Option<Direction> {
        match self {
            FlowCode::Flow(dir) => Some(dir),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FlowCode::Terminal(_))
    }

    pub fn is_nodata(self) -> bool {
        self == FlowCode::NoData
    }

    /// Raw code index into [`StepLengths`]; NoData maps to 0
    pub fn index(self) -> usize {
        match self {
            FlowCode::Flow(dir) => dir.code() as usize,
            FlowCode::Terminal(code) => code as usize,
            FlowCode::NoData => 0,
        }
    }
}

/// Geometric length of one step for every flow code.
///
/// Indexed by code `0..=10`: the unused 0 and the two terminal codes have
/// length 0, East/West steps are one cell width, North/South steps one cell
/// height and diagonal steps `hypot(width, height)`. Every distance
/// algorithm reads from the same table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepLengths([f64; 11]);

impl StepLengths {
    pub fn from_region(region: &Region) -> Self {
        let mut table = [0.0; 11];
        let diagonal = region.we_res.hypot(region.ns_res);
        for dir in Direction::ALL {
            table[dir.code() as usize] = match dir {
                Direction::East | Direction::West => region.we_res,
                Direction::North | Direction::South => region.ns_res,
                _ => diagonal,
            };
        }
        Self(table)
    }

    pub fn of(&self, code: FlowCode) -> f64 {
        self.0[code.index()]
    }

    pub fn of_direction(&self, dir: Direction) -> f64 {
        self.0[dir.code() as usize]
    }

    pub fn table(&self) -> &[f64; 11] {
        &self.0
    }
}
