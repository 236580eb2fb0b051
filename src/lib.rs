//! # Delve World Engine
//!
//! Server-side world generation for a multiplayer dungeon crawler.
//!
//! ## Architecture Overview
//!
//! The crate is organized around a small number of cooperating pieces:
//!
//! - **Data Model**: `Floor`, `Tile`, `Room`, `Mob`, and `Item` describe one
//!   playable dungeon floor. All gameplay mutation goes through the `Floor`
//!   accessor API so the occupancy and connectivity invariants hold.
//! - **Generation Pipeline**: room placement, corridor routing, stair
//!   placement, and population run in a fixed order against a shared tile
//!   grid, driven by a single seeded RNG so identical inputs always produce
//!   identical floors.
//! - **Visibility**: a radius-based fog-of-war pass recomputed after every
//!   player move.
//! - **Dungeon Layer**: lazy per-level generation with single-flight
//!   caching, so concurrent requests for the same ungenerated floor observe
//!   one shared instance.
//!
//! Transport, combat resolution, persistence, and rendering live elsewhere;
//! they consume the `Floor` structures produced here through the accessor
//! API and the JSON floor representation.

pub mod game;
pub mod generation;

pub use game::{
    mint_id, recompute_visibility, CharacterId, Dungeon, DungeonConfig, DungeonRegistry, Floor,
    Item, ItemId, ItemKind, Mob, MobId, MobKind, Position, Tile, TileType,
};
pub use generation::{
    generate_floor, is_fully_connected, Difficulty, GenerationConfig, Room, RoomPlacementParams,
    RoomType,
};

/// Core error type for the Delve engine.
#[derive(thiserror::Error, Debug)]
pub enum DelveError {
    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// A floor level outside the dungeon's configured depth was requested
    #[error("floor level out of range: {level} (dungeon has {total_floors} floors)")]
    LevelOutOfRange { level: u32, total_floors: u32 },

    /// Generation failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// Floor state is invalid for the requested operation
    #[error("Invalid state: {0}")]
    InvalidState(String),
}

/// Result type used throughout the Delve codebase.
pub type DelveResult<T> = Result<T, DelveError>;

/// Version information for the engine.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine configuration constants.
pub mod config {
    /// Default floor width in tiles
    pub const DEFAULT_FLOOR_WIDTH: u32 = 80;

    /// Default floor height in tiles
    pub const DEFAULT_FLOOR_HEIGHT: u32 = 50;

    /// Default number of floors in a dungeon
    pub const DEFAULT_TOTAL_FLOORS: u32 = 10;

    /// Minimum viable room count before the relaxed placement pass runs
    pub const MIN_VIABLE_ROOMS: usize = 3;

    /// Base mob count before depth scaling
    pub const BASE_MOB_COUNT: u32 = 5;

    /// Base item count before depth scaling
    pub const BASE_ITEM_COUNT: u32 = 3;

    /// Bounded re-roll budget when a mob/item lands on an occupied tile
    pub const PLACEMENT_REROLL_LIMIT: u32 = 10;

    /// Default sight radius for fog-of-war recomputation
    pub const DEFAULT_SIGHT_RADIUS: u32 = 8;

    /// Seconds of inactivity after which an empty dungeon may be reclaimed
    pub const DUNGEON_IDLE_TIMEOUT_SECS: u64 = 1800;
}
