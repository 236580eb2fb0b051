//! # Floor Generation
//!
//! The room-and-corridor pipeline that builds one dungeon floor.
//!
//! Stages run in a fixed order against a shared tile grid: room placement
//! (rejection sampling), corridor routing (L-shaped runs plus redundant
//! extra links), door placement, stair placement, and population. Each
//! stage draws from the same seeded RNG, which is what makes the whole
//! floor a pure function of `(seed, level)`.

use crate::generation::population;
use crate::generation::{Difficulty, GenerationConfig, Room, RoomPlacementParams, RoomType};
use crate::{config, DelveError, DelveResult, Floor, Position, TileType};
use log::{debug, error, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::{HashSet, VecDeque};

/// Smallest floor dimension the pipeline accepts. Below this not even one
/// relaxed-size room fits inside the 1-tile outer border.
pub(crate) const MIN_FLOOR_DIMENSION: u32 = 16;

/// Generates one dungeon floor.
///
/// This is the generation entry point consumed by the dungeon/session
/// layer. `level` is 1-indexed; requests outside `[1, total_floors]` are
/// rejected. The result is deterministic: identical arguments always yield
/// an identical floor, including mob and item ids.
///
/// # Examples
///
/// ```
/// use delve::{generate_floor, Difficulty};
///
/// let floor = generate_floor(3, 80, 50, Difficulty::Normal, 42, 10).unwrap();
/// let again = generate_floor(3, 80, 50, Difficulty::Normal, 42, 10).unwrap();
/// assert_eq!(floor, again);
/// ```
pub fn generate_floor(
    level: u32,
    width: u32,
    height: u32,
    difficulty: Difficulty,
    seed: i64,
    total_floors: u32,
) -> DelveResult<Floor> {
    if level < 1 || level > total_floors {
        return Err(DelveError::LevelOutOfRange {
            level,
            total_floors,
        });
    }
    if width < MIN_FLOOR_DIMENSION || height < MIN_FLOOR_DIMENSION {
        return Err(DelveError::GenerationFailed(format!(
            "floor dimensions {width}x{height} below minimum {MIN_FLOOR_DIMENSION}"
        )));
    }

    Ok(build_floor(
        level,
        width,
        height,
        difficulty,
        seed,
        total_floors,
        &GenerationConfig::standard(),
    ))
}

/// Derives the per-floor seed from the dungeon seed and the level index.
fn floor_seed(seed: i64, level: u32) -> u64 {
    (seed as u64).wrapping_add(level as u64 * 1000)
}

/// Runs the pipeline against validated inputs.
///
/// Infallible by construction: placement shortfall degrades the floor
/// rather than failing it, and corridor writes are bounds-clipped.
pub(crate) fn build_floor(
    level: u32,
    width: u32,
    height: u32,
    difficulty: Difficulty,
    seed: i64,
    total_floors: u32,
    gen_config: &GenerationConfig,
) -> Floor {
    let mut rng = StdRng::seed_from_u64(floor_seed(seed, level));
    let mut floor = Floor::new(level, width, height);

    let mut rooms = place_rooms(&mut floor, gen_config, &mut rng);
    connect_rooms(&mut floor, &rooms, &mut rng);
    place_doors(&mut floor, &rooms, gen_config.door_chance, &mut rng);

    // The deepest floor hosts the boss encounter in its final room.
    if level == total_floors && rooms.len() > 1 {
        if let Some(last) = rooms.last_mut() {
            last.room_type = RoomType::Boss;
        }
    }

    floor.rooms = rooms;
    place_stairs(&mut floor, level, total_floors);

    population::populate_mobs(&mut floor, level, difficulty, gen_config, &mut rng);
    population::populate_items(&mut floor, level, gen_config, &mut rng);

    if !is_fully_connected(&floor) {
        // Construction guarantees this never fires; if it does, the bug is
        // in corridor routing, not in the caller's inputs.
        error!(
            "floor {level} (seed {seed}) generated with disconnected rooms"
        );
    }

    debug!(
        "generated floor {level}: {} rooms, {} mobs, {} items",
        floor.rooms.len(),
        floor.mobs.len(),
        floor.items.len()
    );

    floor
}

/// Places rooms via rejection sampling, running the configured passes in
/// order until the floor holds the minimum viable room count.
fn place_rooms(floor: &mut Floor, gen_config: &GenerationConfig, rng: &mut StdRng) -> Vec<Room> {
    let mut rooms: Vec<Room> = Vec::new();
    let mut next_id = 0u32;

    for (pass_index, params) in gen_config.placement_passes.iter().enumerate() {
        if pass_index > 0 {
            if rooms.len() >= config::MIN_VIABLE_ROOMS {
                break;
            }
            warn!(
                "floor {}: only {} rooms after pass {}, retrying with relaxed parameters",
                floor.level,
                rooms.len(),
                pass_index
            );
        }

        let slots = (params.max_rooms as usize).saturating_sub(rooms.len());
        for _ in 0..slots {
            if let Some(room) = try_place_room(floor, params, next_id, &rooms, rng) {
                carve_room(floor, &room);
                rooms.push(room);
                next_id += 1;
            }
        }
    }

    if rooms.len() < config::MIN_VIABLE_ROOMS {
        // Recoverable: a degenerate floor is still playable.
        warn!(
            "floor {}: proceeding with only {} rooms",
            floor.level,
            rooms.len()
        );
    }

    rooms
}

/// Attempts to place a single room within its rejection-sampling budget.
///
/// A `None` return is not an error; the slot simply stays empty and the
/// dungeon ends up smaller.
fn try_place_room(
    floor: &Floor,
    params: &RoomPlacementParams,
    id: u32,
    existing: &[Room],
    rng: &mut StdRng,
) -> Option<Room> {
    for _ in 0..params.attempts_per_room {
        let room_w = rng.gen_range(params.min_room_size..=params.max_room_size);
        let room_h = rng.gen_range(params.min_room_size..=params.max_room_size);

        // The room must fit inside the grid with a 1-tile outer border.
        let max_x = floor.width as i32 - room_w as i32 - 1;
        let max_y = floor.height as i32 - room_h as i32 - 1;
        if max_x < 1 || max_y < 1 {
            continue;
        }
        let x = rng.gen_range(1..=max_x);
        let y = rng.gen_range(1..=max_y);

        let room_type = determine_room_type(id, rng);
        let candidate = Room::new(id, room_type, x, y, room_w, room_h);

        if existing
            .iter()
            .any(|placed| candidate.overlaps_with_margin(placed, params.min_separation))
        {
            continue;
        }

        return Some(candidate);
    }

    None
}

/// Assigns a gameplay role to a newly placed room.
fn determine_room_type(id: u32, rng: &mut StdRng) -> RoomType {
    // The first room is always the entrance; players spawn there and
    // population keeps it clear of mobs.
    if id == 0 {
        return RoomType::Entrance;
    }

    let roll: f64 = rng.gen();
    if roll < 0.05 {
        RoomType::Treasure
    } else if roll < 0.08 {
        RoomType::Shop
    } else if roll < 0.12 {
        RoomType::Safe
    } else {
        RoomType::Standard
    }
}

/// Carves a room's interior into the grid as floor tiles. The wall ring is
/// left as-is; corridors punch through it later.
fn carve_room(floor: &mut Floor, room: &Room) {
    for pos in room.interior_positions() {
        floor.set_tile_type(pos, TileType::Floor);
    }
}

/// Connects rooms into a single traversable graph.
///
/// A spanning chain of L-corridors links each room to the next in placement
/// order, then a second pass adds `room_count / 3 + 1` redundant links
/// between random distinct pairs so most rooms have more than one exit. The
/// second pass is skipped below 3 rooms.
fn connect_rooms(floor: &mut Floor, rooms: &[Room], rng: &mut StdRng) {
    if rooms.len() < 2 {
        return;
    }

    for pair in rooms.windows(2) {
        carve_l_corridor(floor, pair[0].center(), pair[1].center(), rng);
    }

    if rooms.len() < 3 {
        return;
    }
    let extra_links = rooms.len() / 3 + 1;
    for _ in 0..extra_links {
        let first = rng.gen_range(0..rooms.len());
        let mut second = rng.gen_range(0..rooms.len());
        while second == first {
            second = rng.gen_range(0..rooms.len());
        }
        carve_l_corridor(floor, rooms[first].center(), rooms[second].center(), rng);
    }
}

/// Carves a 1-tile-wide L-shaped corridor between two points.
///
/// Whether the horizontal or vertical run comes first is a coin flip per
/// connection. Endpoints are always valid room centers, but the elbow tile
/// can land anywhere, so every write goes through the clipped setter.
fn carve_l_corridor(floor: &mut Floor, start: Position, end: Position, rng: &mut StdRng) {
    let horizontal_first = rng.gen_bool(0.5);

    if horizontal_first {
        carve_horizontal_run(floor, start.x, end.x, start.y);
        carve_vertical_run(floor, start.y, end.y, end.x);
    } else {
        carve_vertical_run(floor, start.y, end.y, start.x);
        carve_horizontal_run(floor, start.x, end.x, end.y);
    }
}

fn carve_horizontal_run(floor: &mut Floor, x1: i32, x2: i32, y: i32) {
    for x in x1.min(x2)..=x1.max(x2) {
        let pos = Position::new(x, y);
        if floor
            .tile_at(pos)
            .is_some_and(|tile| tile.tile_type == TileType::Wall)
        {
            floor.set_tile_type(pos, TileType::Floor);
        }
    }
}

fn carve_vertical_run(floor: &mut Floor, y1: i32, y2: i32, x: i32) {
    for y in y1.min(y2)..=y1.max(y2) {
        let pos = Position::new(x, y);
        if floor
            .tile_at(pos)
            .is_some_and(|tile| tile.tile_type == TileType::Wall)
        {
            floor.set_tile_type(pos, TileType::Floor);
        }
    }
}

/// Converts a fraction of corridor openings in room walls into doors.
fn place_doors(floor: &mut Floor, rooms: &[Room], door_chance: f64, rng: &mut StdRng) {
    if door_chance <= 0.0 {
        return;
    }
    for room in rooms {
        for pos in room.border_positions() {
            let is_opening = floor
                .tile_at(pos)
                .is_some_and(|tile| tile.tile_type == TileType::Floor);
            if is_opening && rng.gen_bool(door_chance) {
                floor.set_tile_type(pos, TileType::Door);
            }
        }
    }
}

/// Marks stair tiles and records their positions on the floor.
///
/// Stairs-up go at the first room's center on every floor but the topmost;
/// stairs-down at the last room's center on every floor but the bottommost.
/// `total_floors` is the dungeon's configured depth, threaded through from
/// the caller — dungeons are arbitrary-depth, so no constant will do.
fn place_stairs(floor: &mut Floor, level: u32, total_floors: u32) {
    let Some(first) = floor.rooms.first() else {
        return;
    };
    let up_pos = first.center();

    if level > 1 {
        floor.set_tile_type(up_pos, TileType::StairsUp);
        floor.up_stairs.push(up_pos);
    }

    if level < total_floors {
        let last = floor.rooms.last().cloned();
        if let Some(last) = last {
            let mut down_pos = last.center();
            if floor
                .tile_at(down_pos)
                .is_some_and(|tile| tile.tile_type == TileType::StairsUp)
            {
                // Degenerate single-room floor: both stairways land in the
                // same room, so the down-stairs shifts off the center.
                if let Some(alternative) = last
                    .interior_positions()
                    .into_iter()
                    .find(|&pos| pos != down_pos && floor.is_walkable(pos))
                {
                    down_pos = alternative;
                } else {
                    warn!(
                        "floor {level}: no free tile for stairs-down, floor is a dead end"
                    );
                    return;
                }
            }
            floor.set_tile_type(down_pos, TileType::StairsDown);
            floor.down_stairs.push(down_pos);
        }
    }
}

/// Checks that every room interior tile is reachable from the first room's
/// center over walkable tiles.
///
/// Generation upholds this by construction; the check exists for the
/// validation hook and the test suite.
pub fn is_fully_connected(floor: &Floor) -> bool {
    let Some(start) = floor.entrance_position() else {
        return true;
    };

    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    visited.insert(start);
    queue.push_back(start);

    while let Some(pos) = queue.pop_front() {
        for adjacent in pos.cardinal_adjacent_positions() {
            if visited.contains(&adjacent) {
                continue;
            }
            if floor.is_walkable(adjacent) {
                visited.insert(adjacent);
                queue.push_back(adjacent);
            }
        }
    }

    floor.rooms.iter().all(|room| {
        room.interior_positions()
            .iter()
            .all(|pos| visited.contains(pos))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_rng() -> StdRng {
        StdRng::seed_from_u64(12345)
    }

    #[test]
    fn test_level_out_of_range_is_rejected() {
        assert!(matches!(
            generate_floor(0, 80, 50, Difficulty::Normal, 42, 10),
            Err(DelveError::LevelOutOfRange { level: 0, .. })
        ));
        assert!(matches!(
            generate_floor(11, 80, 50, Difficulty::Normal, 42, 10),
            Err(DelveError::LevelOutOfRange { level: 11, .. })
        ));
        assert!(generate_floor(10, 80, 50, Difficulty::Normal, 42, 10).is_ok());
    }

    #[test]
    fn test_tiny_dimensions_are_rejected() {
        assert!(generate_floor(1, 8, 8, Difficulty::Normal, 42, 10).is_err());
    }

    #[test]
    fn test_carve_l_corridor_connects_endpoints() {
        let mut floor = Floor::new(1, 30, 30);
        let mut rng = test_rng();
        let start = Position::new(5, 5);
        let end = Position::new(20, 22);

        carve_l_corridor(&mut floor, start, end, &mut rng);

        assert!(floor.is_walkable(start));
        assert!(floor.is_walkable(end));
        // The corridor is an L: total carved tiles equal the two runs minus
        // the shared elbow.
        let carved = floor.walkable_tile_count();
        assert_eq!(carved, 16 + 18 - 1);
    }

    #[test]
    fn test_corridor_writes_are_clipped() {
        let mut floor = Floor::new(1, 20, 20);
        let mut rng = test_rng();

        // An endpoint outside the grid must not panic; writes clip.
        carve_l_corridor(&mut floor, Position::new(5, 5), Position::new(40, 40), &mut rng);
        assert!(floor.is_walkable(Position::new(5, 5)));
    }

    #[test]
    fn test_room_placement_respects_bounds_and_separation() {
        let mut floor = Floor::new(1, 80, 50);
        let gen_config = GenerationConfig::standard();
        let mut rng = test_rng();

        let rooms = place_rooms(&mut floor, &gen_config, &mut rng);
        assert!(rooms.len() >= config::MIN_VIABLE_ROOMS);

        for room in &rooms {
            assert!(room.x >= 1);
            assert!(room.y >= 1);
            assert!(room.x + room.width as i32 <= 79);
            assert!(room.y + room.height as i32 <= 49);
        }
        for (i, a) in rooms.iter().enumerate() {
            for b in rooms.iter().skip(i + 1) {
                assert!(
                    !a.overlaps_with_margin(b, 0),
                    "rooms {} and {} overlap",
                    a.id,
                    b.id
                );
            }
        }
    }

    #[test]
    fn test_first_room_is_entrance() {
        let floor = generate_floor(1, 80, 50, Difficulty::Normal, 7, 10).unwrap();
        assert_eq!(floor.rooms[0].room_type, RoomType::Entrance);
    }

    #[test]
    fn test_stair_placement_policy() {
        let total = 5;
        for level in 1..=total {
            let floor = generate_floor(level, 80, 50, Difficulty::Normal, 99, total).unwrap();
            if level == 1 {
                assert!(floor.up_stairs.is_empty());
            } else {
                assert_eq!(floor.up_stairs.len(), 1);
                assert_eq!(
                    floor.tile_at(floor.up_stairs[0]).unwrap().tile_type,
                    TileType::StairsUp
                );
            }
            if level == total {
                assert!(floor.down_stairs.is_empty());
            } else {
                assert_eq!(floor.down_stairs.len(), 1);
                assert_eq!(
                    floor.tile_at(floor.down_stairs[0]).unwrap().tile_type,
                    TileType::StairsDown
                );
            }
        }
    }

    #[test]
    fn test_stairs_respect_arbitrary_depth() {
        // A 2-floor dungeon and a 40-floor dungeon must both follow the
        // policy; depth is a parameter, never a constant.
        let shallow = generate_floor(2, 80, 50, Difficulty::Normal, 5, 2).unwrap();
        assert_eq!(shallow.up_stairs.len(), 1);
        assert!(shallow.down_stairs.is_empty());

        let deep = generate_floor(20, 80, 50, Difficulty::Normal, 5, 40).unwrap();
        assert_eq!(deep.up_stairs.len(), 1);
        assert_eq!(deep.down_stairs.len(), 1);
    }

    #[test]
    fn test_generated_floor_is_connected() {
        for seed in [1, 42, 999, -7] {
            let floor = generate_floor(3, 80, 50, Difficulty::Normal, seed, 10).unwrap();
            assert!(is_fully_connected(&floor), "seed {seed} disconnected");
        }
    }

    #[test]
    fn test_deepest_floor_tags_boss_room() {
        let floor = generate_floor(10, 80, 50, Difficulty::Normal, 42, 10).unwrap();
        if floor.rooms.len() > 1 {
            assert_eq!(floor.rooms.last().unwrap().room_type, RoomType::Boss);
        }
    }
}
