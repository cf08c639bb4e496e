//! Signal phase primitives: directions, light colors, phase state.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Approach direction at the intersection.
///
/// The right-of-way cycle advances clockwise: North → East → South → West → North.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Fixed clockwise cycle order.
    pub const CYCLE: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Next direction in the clockwise cycle.
    pub fn next(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    /// Lowercase name, stable across serde and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::East => "east",
            Direction::South => "south",
            Direction::West => "west",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One of the three sub-lights of a signal head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightColor {
    Red,
    Yellow,
    Green,
}

impl LightColor {
    /// Lowercase name, stable across serde and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            LightColor::Red => "red",
            LightColor::Yellow => "yellow",
            LightColor::Green => "green",
        }
    }
}

impl fmt::Display for LightColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authoritative phase of the intersection at an instant.
///
/// `direction` is the approach currently holding (or about to hold) right of
/// way; `color` is the color shown to that approach. At most one direction
/// ever holds `Green`; during an all-red interval every approach shows `Red`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseState {
    pub direction: Direction,
    pub color: LightColor,
}

impl PhaseState {
    pub fn new(direction: Direction, color: LightColor) -> Self {
        Self { direction, color }
    }
}

impl fmt::Display for PhaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.direction, self.color)
    }
}
