//! # World Model
//!
//! Tiles, mobs, items, and the `Floor` aggregate produced by the generation
//! pipeline.
//!
//! A `Floor` is created once by `generate_floor` and afterwards mutated only
//! through the accessor API in this module (occupant references, visibility
//! flags, mob/item removal). Gameplay code never indexes the tile grid
//! directly; routing every mutation through here is what keeps the occupancy
//! and connectivity invariants intact.

use crate::generation::Room;
use crate::{CharacterId, DelveError, DelveResult, ItemId, MobId, Position};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The kind of terrain occupying one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileType {
    Wall,
    Floor,
    Door,
    StairsUp,
    StairsDown,
}

impl TileType {
    /// Whether an entity can stand on this tile type.
    pub fn is_walkable(self) -> bool {
        !matches!(self, TileType::Wall)
    }
}

/// One cell of the floor grid.
///
/// Occupant references are weak links: ids resolved through the owning
/// floor's mob/item maps, never ownership. `explored` is monotonic — once a
/// tile has been seen it stays explored for the life of the floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    #[serde(rename = "type")]
    pub tile_type: TileType,
    pub explored: bool,
    pub visible: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub character_id: Option<CharacterId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub mob_id: Option<MobId>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub item_id: Option<ItemId>,
}

impl Tile {
    /// Creates an unexplored tile of the given type with no occupants.
    pub fn new(tile_type: TileType) -> Self {
        Self {
            tile_type,
            explored: false,
            visible: false,
            character_id: None,
            mob_id: None,
            item_id: None,
        }
    }

    /// Creates a wall tile (the initial state of every grid cell).
    pub fn wall() -> Self {
        Self::new(TileType::Wall)
    }

    /// Whether an entity can stand here.
    pub fn is_walkable(&self) -> bool {
        self.tile_type.is_walkable()
    }

    /// Whether a mob or item may be placed here during population.
    ///
    /// Stairs are kept clear so arriving players never spawn on top of
    /// something.
    pub fn is_free_for_placement(&self) -> bool {
        self.tile_type == TileType::Floor && self.mob_id.is_none() && self.item_id.is_none()
    }

    /// Marks the tile visible, which also marks it explored.
    pub fn set_visible(&mut self) {
        self.visible = true;
        self.explored = true;
    }
}

/// Monster variants, ordered roughly by threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MobKind {
    Rat,
    Bat,
    Goblin,
    Skeleton,
    Orc,
    Zombie,
    Wraith,
    Troll,
    Ogre,
    Demon,
    Dragon,
}

/// A monster on a floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mob {
    pub id: MobId,
    pub kind: MobKind,
    pub position: Position,
}

/// Item variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ItemKind {
    Gold,
    Potion,
    Scroll,
    Food,
    Weapon,
    Armor,
}

/// An item lying on a floor tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub kind: ItemKind,
    pub position: Position,
}

/// One fully-generated dungeon floor.
///
/// The tile grid is row-major: `tiles[y][x]`, `height` rows of `width`
/// tiles. Rooms are stored in placement order; the first room is the safe
/// entrance room. The serialized form of this struct is the wire
/// representation consumed by the networking layer.
///
/// # Examples
///
/// ```
/// use delve::{generate_floor, Difficulty};
///
/// let floor = generate_floor(1, 80, 50, Difficulty::Normal, 42, 10).unwrap();
/// assert_eq!(floor.level, 1);
/// assert!(floor.rooms.len() >= 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Floor {
    /// 1-indexed depth of this floor within its dungeon
    pub level: u32,
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<Vec<Tile>>,
    /// Rooms in placement order; the first room is the entrance/safe room
    pub rooms: Vec<Room>,
    pub up_stairs: Vec<Position>,
    pub down_stairs: Vec<Position>,
    pub mobs: HashMap<MobId, Mob>,
    pub items: HashMap<ItemId, Item>,
}

impl Floor {
    /// Creates a floor of the given dimensions with every tile a wall.
    pub fn new(level: u32, width: u32, height: u32) -> Self {
        let tiles = vec![vec![Tile::wall(); width as usize]; height as usize];
        Self {
            level,
            width,
            height,
            tiles,
            rooms: Vec::new(),
            up_stairs: Vec::new(),
            down_stairs: Vec::new(),
            mobs: HashMap::new(),
            items: HashMap::new(),
        }
    }

    /// Whether a position lies within the grid.
    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width as i32 && pos.y < self.height as i32
    }

    /// Gets the tile at a position, or `None` when out of bounds.
    pub fn tile_at(&self, pos: Position) -> Option<&Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(&self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Mutable tile access, bounds-checked.
    pub(crate) fn tile_at_mut(&mut self, pos: Position) -> Option<&mut Tile> {
        if !self.in_bounds(pos) {
            return None;
        }
        Some(&mut self.tiles[pos.y as usize][pos.x as usize])
    }

    /// Sets a tile's terrain type, preserving flags and occupants.
    ///
    /// Out-of-bounds writes are clipped silently: corridor carving produces
    /// intermediate coordinates that must not panic or propagate.
    pub(crate) fn set_tile_type(&mut self, pos: Position, tile_type: TileType) {
        if let Some(tile) = self.tile_at_mut(pos) {
            tile.tile_type = tile_type;
        }
    }

    /// Whether the tile at `pos` exists and can be stood on.
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.tile_at(pos).is_some_and(|tile| tile.is_walkable())
    }

    /// Looks up a room by its id.
    pub fn room_with_id(&self, id: u32) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    /// Finds the room containing a position, if any.
    pub fn room_at(&self, pos: Position) -> Option<&Room> {
        self.rooms.iter().find(|room| room.contains(pos))
    }

    /// Total number of walkable tiles, useful for density heuristics.
    pub fn walkable_tile_count(&self) -> usize {
        self.tiles
            .iter()
            .flat_map(|row| row.iter())
            .filter(|tile| tile.is_walkable())
            .count()
    }

    /// Registers a mob and stamps its tile reference.
    ///
    /// Population uses this after it has already verified the tile is free.
    pub(crate) fn add_mob(&mut self, mob: Mob) -> DelveResult<()> {
        let pos = mob.position;
        let tile = self
            .tile_at_mut(pos)
            .ok_or_else(|| DelveError::InvalidState(format!("mob position {pos} out of bounds")))?;
        if tile.mob_id.is_some() {
            return Err(DelveError::InvalidState(format!(
                "tile {pos} already holds a mob"
            )));
        }
        tile.mob_id = Some(mob.id);
        self.mobs.insert(mob.id, mob);
        Ok(())
    }

    /// Registers an item and stamps its tile reference.
    pub(crate) fn add_item(&mut self, item: Item) -> DelveResult<()> {
        let pos = item.position;
        let tile = self.tile_at_mut(pos).ok_or_else(|| {
            DelveError::InvalidState(format!("item position {pos} out of bounds"))
        })?;
        if tile.item_id.is_some() {
            return Err(DelveError::InvalidState(format!(
                "tile {pos} already holds an item"
            )));
        }
        tile.item_id = Some(item.id);
        self.items.insert(item.id, item);
        Ok(())
    }

    /// Removes a mob (death) and clears its tile reference.
    ///
    /// Called by the combat subsystem; returns the removed mob for loot or
    /// experience accounting.
    pub fn remove_mob(&mut self, id: MobId) -> DelveResult<Mob> {
        let mob = self
            .mobs
            .remove(&id)
            .ok_or_else(|| DelveError::InvalidState(format!("no mob with id {id}")))?;
        if let Some(tile) = self.tile_at_mut(mob.position) {
            tile.mob_id = None;
        }
        Ok(mob)
    }

    /// Removes an item (pickup) and clears its tile reference.
    pub fn remove_item(&mut self, id: ItemId) -> DelveResult<Item> {
        let item = self
            .items
            .remove(&id)
            .ok_or_else(|| DelveError::InvalidState(format!("no item with id {id}")))?;
        if let Some(tile) = self.tile_at_mut(item.position) {
            tile.item_id = None;
        }
        Ok(item)
    }

    /// Relocates a mob, keeping its tile reference in sync.
    ///
    /// Used by the mob AI turn; the destination must be walkable and free of
    /// other mobs and characters.
    pub fn move_mob(&mut self, id: MobId, to: Position) -> DelveResult<()> {
        let from = self
            .mobs
            .get(&id)
            .map(|mob| mob.position)
            .ok_or_else(|| DelveError::InvalidState(format!("no mob with id {id}")))?;
        let dest = self
            .tile_at(to)
            .ok_or_else(|| DelveError::InvalidState(format!("destination {to} out of bounds")))?;
        if !dest.is_walkable() || dest.mob_id.is_some() || dest.character_id.is_some() {
            return Err(DelveError::InvalidState(format!(
                "destination {to} is blocked"
            )));
        }
        if let Some(tile) = self.tile_at_mut(from) {
            tile.mob_id = None;
        }
        if let Some(tile) = self.tile_at_mut(to) {
            tile.mob_id = Some(id);
        }
        if let Some(mob) = self.mobs.get_mut(&id) {
            mob.position = to;
        }
        Ok(())
    }

    /// Stamps a character reference onto a walkable tile.
    ///
    /// The movement/session layer calls this when a player enters the floor
    /// or completes a move; it clears the old tile itself via
    /// [`Floor::remove_character`].
    pub fn place_character(&mut self, id: CharacterId, pos: Position) -> DelveResult<()> {
        let tile = self
            .tile_at_mut(pos)
            .ok_or_else(|| DelveError::InvalidState(format!("position {pos} out of bounds")))?;
        if !tile.is_walkable() {
            return Err(DelveError::InvalidState(format!(
                "position {pos} is not walkable"
            )));
        }
        if tile.character_id.is_some_and(|existing| existing != id) {
            return Err(DelveError::InvalidState(format!(
                "tile {pos} already holds a character"
            )));
        }
        tile.character_id = Some(id);
        Ok(())
    }

    /// Clears a character reference from a tile, if present.
    pub fn remove_character(&mut self, pos: Position) {
        if let Some(tile) = self.tile_at_mut(pos) {
            tile.character_id = None;
        }
    }

    /// The spawn point for players entering this floor: the first room's
    /// center, which generation guarantees is walkable.
    pub fn entrance_position(&self) -> Option<Position> {
        self.rooms.first().map(|room| room.center())
    }

    /// Serializes the floor to the JSON wire representation.
    pub fn to_json(&self) -> DelveResult<String> {
        serde_json::to_string(self).map_err(DelveError::from)
    }
}
