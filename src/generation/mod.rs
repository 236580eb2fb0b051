//! # Generation Module
//!
//! Procedural floor generation: configuration, room geometry, and the
//! pipeline that turns a seed into a playable `Floor`.
//!
//! Generation is a pure function of its inputs. Every randomized decision is
//! drawn from one `StdRng` seeded from the dungeon seed and the floor level,
//! so the same inputs always yield the same floor.

pub mod floor;
pub mod population;

pub use floor::*;
pub use population::*;

use crate::Position;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Parameters for one room-placement pass.
///
/// Passes are tried in order: the standard pass first, then a relaxed pass
/// that only runs when the floor is still below the minimum viable room
/// count. Additional fallback tiers are a data change, not a code change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RoomPlacementParams {
    /// Number of candidate room slots to attempt
    pub max_rooms: u32,
    /// Minimum room dimension, walls included
    pub min_room_size: u32,
    /// Maximum room dimension, walls included
    pub max_room_size: u32,
    /// Margin by which placed rooms repel each other
    pub min_separation: u32,
    /// Rejection-sampling budget per room slot
    pub attempts_per_room: u32,
}

impl RoomPlacementParams {
    /// The relaxed variant of these parameters: smaller rooms, a larger
    /// attempt budget, and no separation margin, to squeeze rooms into a
    /// floor the standard pass could not fill.
    pub fn relaxed(self) -> Self {
        Self {
            min_room_size: self.min_room_size.saturating_sub(2).max(4),
            min_separation: 0,
            attempts_per_room: self.attempts_per_room * 3,
            ..self
        }
    }
}

/// Configuration for floor generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Room-placement passes, tried in order until the floor has at least
    /// `MIN_VIABLE_ROOMS` rooms
    pub placement_passes: Vec<RoomPlacementParams>,
    /// Chance that a corridor opening into a room becomes a door
    pub door_chance: f64,
    /// Base mob count before depth and difficulty scaling
    pub base_mob_count: u32,
    /// Base item count before depth scaling
    pub base_item_count: u32,
    /// Re-roll budget when a mob/item lands on an occupied tile
    pub placement_reroll_limit: u32,
}

impl GenerationConfig {
    /// The standard configuration used by `generate_floor`.
    pub fn standard() -> Self {
        let base = RoomPlacementParams {
            max_rooms: 12,
            min_room_size: 6,
            max_room_size: 12,
            min_separation: 1,
            attempts_per_room: 30,
        };
        Self {
            placement_passes: vec![base, base.relaxed()],
            door_chance: 0.3,
            base_mob_count: crate::config::BASE_MOB_COUNT,
            base_item_count: crate::config::BASE_ITEM_COUNT,
            placement_reroll_limit: crate::config::PLACEMENT_REROLL_LIMIT,
        }
    }

    /// Creates a configuration for testing with smaller, simpler floors.
    pub fn for_testing() -> Self {
        let base = RoomPlacementParams {
            max_rooms: 6,
            min_room_size: 4,
            max_room_size: 7,
            min_separation: 1,
            attempts_per_room: 20,
        };
        Self {
            placement_passes: vec![base, base.relaxed()],
            door_chance: 0.0,
            base_mob_count: 2,
            base_item_count: 1,
            placement_reroll_limit: 5,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::standard()
    }
}

/// Named difficulty tier, independent of depth scaling.
///
/// A tier scales the mob count and biases the variant distribution toward
/// the harder end of each depth pool. Parsed from the wire string with
/// `FromStr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
    Nightmare,
}

/// The scaling knobs one difficulty tier applies on top of depth scaling.
#[derive(Debug, Clone, Copy)]
pub struct DifficultyProfile {
    /// Multiplier on the depth-scaled mob count
    pub mob_count_multiplier: f64,
    /// Weight multiplier for the hardest variants in each depth pool
    pub elite_weight_multiplier: f64,
}

impl Difficulty {
    /// The configuration table consulted by the population generator.
    pub fn profile(self) -> DifficultyProfile {
        match self {
            Difficulty::Easy => DifficultyProfile {
                mob_count_multiplier: 0.75,
                elite_weight_multiplier: 0.5,
            },
            Difficulty::Normal => DifficultyProfile {
                mob_count_multiplier: 1.0,
                elite_weight_multiplier: 1.0,
            },
            Difficulty::Hard => DifficultyProfile {
                mob_count_multiplier: 1.5,
                elite_weight_multiplier: 2.0,
            },
            Difficulty::Nightmare => DifficultyProfile {
                mob_count_multiplier: 2.0,
                elite_weight_multiplier: 4.0,
            },
        }
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            "nightmare" => Ok(Difficulty::Nightmare),
            other => Err(format!("unknown difficulty tier: {other}")),
        }
    }
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Nightmare => "nightmare",
        };
        write!(f, "{name}")
    }
}

/// Gameplay role of a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoomType {
    /// First room of the floor; players enter here and no mobs spawn
    Entrance,
    Standard,
    Treasure,
    Boss,
    Safe,
    Shop,
}

/// A rectangular room on a floor.
///
/// The rectangle includes the room's wall ring; only the interior is carved
/// as floor. Rooms are identified by a floor-local id and tagged with a
/// gameplay role.
///
/// # Examples
///
/// ```
/// use delve::{Position, Room, RoomType};
///
/// let room = Room::new(1, RoomType::Standard, 5, 5, 10, 8);
/// assert_eq!(room.center(), Position::new(10, 9));
/// assert!(room.contains(Position::new(7, 7)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: u32,
    #[serde(rename = "type")]
    pub room_type: RoomType,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub explored: bool,
}

impl Room {
    /// Creates a new room with the given rectangle.
    pub fn new(id: u32, room_type: RoomType, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            id,
            room_type,
            x,
            y,
            width,
            height,
            explored: false,
        }
    }

    /// The center of the room, always an interior tile for rooms of size 3+.
    pub fn center(&self) -> Position {
        Position::new(
            self.x + self.width as i32 / 2,
            self.y + self.height as i32 / 2,
        )
    }

    /// Checks whether a position lies inside the room rectangle.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x
            && pos.y >= self.y
            && pos.x < self.x + self.width as i32
            && pos.y < self.y + self.height as i32
    }

    /// Checks whether this room's rectangle intersects another room's
    /// rectangle expanded by `margin` on all sides.
    pub fn overlaps_with_margin(&self, other: &Room, margin: u32) -> bool {
        let m = margin as i32;
        !(self.x >= other.x + other.width as i32 + m
            || other.x - m >= self.x + self.width as i32
            || self.y >= other.y + other.height as i32 + m
            || other.y - m >= self.y + self.height as i32)
    }

    /// All interior positions, excluding the 1-tile wall ring.
    pub fn interior_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for y in (self.y + 1)..(self.y + self.height as i32 - 1) {
            for x in (self.x + 1)..(self.x + self.width as i32 - 1) {
                positions.push(Position::new(x, y));
            }
        }
        positions
    }

    /// Border positions of the room rectangle (the wall ring).
    pub fn border_positions(&self) -> Vec<Position> {
        let mut positions = Vec::new();
        for x in self.x..(self.x + self.width as i32) {
            positions.push(Position::new(x, self.y));
            positions.push(Position::new(x, self.y + self.height as i32 - 1));
        }
        for y in (self.y + 1)..(self.y + self.height as i32 - 1) {
            positions.push(Position::new(self.x, y));
            positions.push(Position::new(self.x + self.width as i32 - 1, y));
        }
        positions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_room_geometry() {
        let room = Room::new(1, RoomType::Standard, 5, 5, 10, 8);
        assert_eq!(room.center(), Position::new(10, 9));
        assert!(room.contains(Position::new(5, 5))); // top-left corner
        assert!(room.contains(Position::new(14, 12))); // bottom-right corner
        assert!(!room.contains(Position::new(15, 12)));
        assert!(!room.contains(Position::new(4, 5)));
    }

    #[test]
    fn test_room_interior_excludes_border() {
        let room = Room::new(1, RoomType::Standard, 5, 5, 4, 4);
        let interior: HashSet<_> = room.interior_positions().into_iter().collect();
        let border: HashSet<_> = room.border_positions().into_iter().collect();

        // 4x4 room: 2x2 interior, 12 border tiles.
        assert_eq!(interior.len(), 4);
        assert_eq!(border.len(), 12);
        assert!(interior.is_disjoint(&border));
    }

    #[test]
    fn test_overlap_with_margin() {
        let room1 = Room::new(1, RoomType::Standard, 5, 5, 10, 8);
        let touching = Room::new(2, RoomType::Standard, 15, 5, 6, 6);
        let far = Room::new(3, RoomType::Standard, 30, 30, 5, 5);

        // Abutting rectangles do not overlap without a margin but do with one.
        assert!(!room1.overlaps_with_margin(&touching, 0));
        assert!(room1.overlaps_with_margin(&touching, 1));
        assert!(!room1.overlaps_with_margin(&far, 3));
        assert!(touching.overlaps_with_margin(&room1, 1));
    }

    #[test]
    fn test_relaxed_params_shrink_rooms_and_grow_budget() {
        let base = RoomPlacementParams {
            max_rooms: 12,
            min_room_size: 6,
            max_room_size: 12,
            min_separation: 2,
            attempts_per_room: 30,
        };
        let relaxed = base.relaxed();
        assert!(relaxed.min_room_size < base.min_room_size);
        assert!(relaxed.attempts_per_room > base.attempts_per_room);
        assert_eq!(relaxed.min_separation, 0);
        assert_eq!(relaxed.max_rooms, base.max_rooms);
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("normal".parse::<Difficulty>().unwrap(), Difficulty::Normal);
        assert_eq!("HARD".parse::<Difficulty>().unwrap(), Difficulty::Hard);
        assert!("brutal".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::Nightmare.to_string(), "nightmare");
    }

    #[test]
    fn test_difficulty_profiles_are_ordered() {
        let easy = Difficulty::Easy.profile();
        let normal = Difficulty::Normal.profile();
        let hard = Difficulty::Hard.profile();
        let nightmare = Difficulty::Nightmare.profile();

        assert!(easy.mob_count_multiplier < normal.mob_count_multiplier);
        assert!(normal.mob_count_multiplier < hard.mob_count_multiplier);
        assert!(hard.mob_count_multiplier < nightmare.mob_count_multiplier);
        assert!(easy.elite_weight_multiplier < hard.elite_weight_multiplier);
    }
}
