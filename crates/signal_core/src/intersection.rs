//! Intersection vocabulary: approach directions, the two conflicting phase pairs,
//! and the green/yellow sub-state of the active pair.

use serde::{Deserialize, Serialize};

/// Approach direction of the intersection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Direction::North => "north",
            Direction::South => "south",
            Direction::East => "east",
            Direction::West => "west",
        }
    }

    /// The phase pair this direction belongs to.
    pub fn phase(self) -> Phase {
        match self {
            Direction::North | Direction::South => Phase::NorthSouth,
            Direction::East | Direction::West => Phase::EastWest,
        }
    }
}

/// One of the two conflicting direction pairs that may hold a green light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    NorthSouth,
    EastWest,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::NorthSouth => "north_south",
            Phase::EastWest => "east_west",
        }
    }

    /// The conflicting pair.
    pub fn other(self) -> Phase {
        match self {
            Phase::NorthSouth => Phase::EastWest,
            Phase::EastWest => Phase::NorthSouth,
        }
    }

    pub fn directions(self) -> [Direction; 2] {
        match self {
            Phase::NorthSouth => [Direction::North, Direction::South],
            Phase::EastWest => [Direction::East, Direction::West],
        }
    }
}

/// Sub-state of the active phase pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalState {
    #[default]
    Green,
    Yellow,
}

impl SignalState {
    pub fn name(self) -> &'static str {
        match self {
            SignalState::Green => "green",
            SignalState::Yellow => "yellow",
        }
    }
}

/// One value per approach direction.
///
/// Serializes as an object keyed by direction name (`north`, `south`, `east`, `west`).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerDirection<T> {
    pub north: T,
    pub south: T,
    pub east: T,
    pub west: T,
}

/// Vehicle count per direction.
pub type DirectionCounts = PerDirection<u32>;

impl<T> PerDirection<T> {
    pub fn new(north: T, south: T, east: T, west: T) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Direction) -> T) -> Self {
        Self {
            north: f(Direction::North),
            south: f(Direction::South),
            east: f(Direction::East),
            west: f(Direction::West),
        }
    }

    pub fn get(&self, direction: Direction) -> &T {
        match direction {
            Direction::North => &self.north,
            Direction::South => &self.south,
            Direction::East => &self.east,
            Direction::West => &self.west,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut T {
        match direction {
            Direction::North => &mut self.north,
            Direction::South => &mut self.south,
            Direction::East => &mut self.east,
            Direction::West => &mut self.west,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Direction, &T)> {
        Direction::ALL.into_iter().map(move |d| (d, self.get(d)))
    }

    pub fn map<U>(&self, mut f: impl FnMut(Direction, &T) -> U) -> PerDirection<U> {
        PerDirection::from_fn(|d| f(d, self.get(d)))
    }
}

impl<T: Copy> PerDirection<T> {
    pub fn splat(value: T) -> Self {
        Self::new(value, value, value, value)
    }
}

impl PerDirection<u32> {
    pub fn total(&self) -> u64 {
        self.iter().map(|(_, c)| u64::from(*c)).sum()
    }

    /// Combined count of the two directions served by `phase`.
    pub fn pair_total(&self, phase: Phase) -> u64 {
        phase
            .directions()
            .iter()
            .map(|d| u64::from(*self.get(*d)))
            .sum()
    }
}
