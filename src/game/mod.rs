//! # Game Module
//!
//! The dungeon data model and the systems that operate on it after
//! generation: floors and tiles, mobs and items, fog-of-war visibility, and
//! the lazily-populated `Dungeon` container.

pub mod dungeon;
pub mod visibility;
pub mod world;

pub use dungeon::*;
pub use visibility::*;
pub use world::*;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents a 2D coordinate on a dungeon floor.
///
/// # Examples
///
/// ```
/// use delve::Position;
///
/// let pos = Position::new(10, 5);
/// assert_eq!(pos.x, 10);
/// assert_eq!(pos.y, 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    /// Creates a new position with the given coordinates.
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Calculates the Manhattan distance to another position.
    pub fn manhattan_distance(self, other: Position) -> u32 {
        ((self.x - other.x).abs() + (self.y - other.y).abs()) as u32
    }

    /// Calculates the squared Euclidean distance to another position.
    ///
    /// Used by the visibility radius test, which compares against a squared
    /// radius to stay in integer arithmetic.
    pub fn distance_squared(self, other: Position) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// Returns the 4 cardinal adjacent positions (no diagonals).
    pub fn cardinal_adjacent_positions(self) -> [Position; 4] {
        [
            Position::new(self.x, self.y - 1), // N
            Position::new(self.x - 1, self.y), // W
            Position::new(self.x + 1, self.y), // E
            Position::new(self.x, self.y + 1), // S
        ]
    }
}

impl std::ops::Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl std::ops::Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Unique identifier for a mob on a floor.
pub type MobId = Uuid;

/// Unique identifier for an item on a floor.
pub type ItemId = Uuid;

/// Unique identifier for a player character, assigned by the session layer.
pub type CharacterId = Uuid;

/// Mints an id from the generation RNG.
///
/// Ids drawn this way are a pure function of the seed, which keeps the whole
/// generated floor reproducible. `Uuid::new_v4` would break that.
pub fn mint_id<R: Rng>(rng: &mut R) -> Uuid {
    let mut bytes = [0u8; 16];
    rng.fill(&mut bytes);
    Uuid::from_bytes(bytes)
}
