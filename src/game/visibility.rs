//! # Visibility
//!
//! Fog-of-war recomputation. Runs against an already-built floor on every
//! successful player move; generation never touches these flags.
//!
//! Visibility is a radius heuristic: a tile is visible when its squared
//! Euclidean distance from the viewer is within the squared sight radius.
//! No occlusion or line-of-sight is modeled — a deliberate simplification.

use crate::{Floor, Position};

/// Recomputes the `visible` flag for every tile on the floor.
///
/// All tiles are cleared first, then tiles inside the radius are marked
/// visible and explored. `explored` is monotonic: this function (and
/// everything else) only ever sets it. The room containing the viewer is
/// marked explored as well.
///
/// # Examples
///
/// ```
/// use delve::{generate_floor, recompute_visibility, Difficulty};
///
/// let mut floor = generate_floor(1, 80, 50, Difficulty::Normal, 42, 10).unwrap();
/// let viewer = floor.entrance_position().unwrap();
/// recompute_visibility(&mut floor, viewer, 8);
/// assert!(floor.tile_at(viewer).unwrap().visible);
/// assert!(floor.tile_at(viewer).unwrap().explored);
/// ```
pub fn recompute_visibility(floor: &mut Floor, viewer: Position, radius: u32) {
    for row in &mut floor.tiles {
        for tile in row {
            tile.visible = false;
        }
    }

    let r = radius as i32;
    let r_squared = (radius as i64) * (radius as i64);
    for dy in -r..=r {
        for dx in -r..=r {
            let pos = Position::new(viewer.x + dx, viewer.y + dy);
            if viewer.distance_squared(pos) > r_squared {
                continue;
            }
            if let Some(tile) = floor.tile_at_mut(pos) {
                tile.set_visible();
            }
        }
    }

    for room in &mut floor.rooms {
        if room.contains(viewer) {
            room.explored = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Floor, TileType};
    use std::collections::HashSet;

    fn open_floor() -> Floor {
        let mut floor = Floor::new(1, 30, 30);
        for y in 0..30 {
            for x in 0..30 {
                floor.set_tile_type(Position::new(x, y), TileType::Floor);
            }
        }
        floor
    }

    fn visible_positions(floor: &Floor) -> HashSet<Position> {
        let mut set = HashSet::new();
        for (y, row) in floor.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                if tile.visible {
                    set.insert(Position::new(x as i32, y as i32));
                }
            }
        }
        set
    }

    fn explored_positions(floor: &Floor) -> HashSet<Position> {
        let mut set = HashSet::new();
        for (y, row) in floor.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                if tile.explored {
                    set.insert(Position::new(x as i32, y as i32));
                }
            }
        }
        set
    }

    #[test]
    fn test_radius_test_is_euclidean() {
        let mut floor = open_floor();
        let viewer = Position::new(15, 15);
        recompute_visibility(&mut floor, viewer, 4);

        // On-axis at exactly the radius: visible.
        assert!(floor.tile_at(Position::new(19, 15)).unwrap().visible);
        // One past the radius: not visible.
        assert!(!floor.tile_at(Position::new(20, 15)).unwrap().visible);
        // Bounding-box corner is outside the circle.
        assert!(!floor.tile_at(Position::new(19, 19)).unwrap().visible);
        // (3, 2) has distance sqrt(13) < 4.
        assert!(floor.tile_at(Position::new(18, 17)).unwrap().visible);
    }

    #[test]
    fn test_visibility_is_recomputed_but_explored_accumulates() {
        let mut floor = open_floor();
        recompute_visibility(&mut floor, Position::new(5, 5), 3);
        let first_visible = visible_positions(&floor);
        let first_explored = explored_positions(&floor);
        assert_eq!(first_visible, first_explored);

        recompute_visibility(&mut floor, Position::new(24, 24), 3);
        let second_visible = visible_positions(&floor);
        let second_explored = explored_positions(&floor);

        // The old view is gone from `visible` but retained in `explored`.
        assert!(second_visible.is_disjoint(&first_visible));
        assert!(second_explored.is_superset(&first_explored));
        assert!(second_explored.is_superset(&second_visible));
    }

    #[test]
    fn test_viewer_near_edge_does_not_panic() {
        let mut floor = open_floor();
        recompute_visibility(&mut floor, Position::new(0, 0), 10);
        assert!(floor.tile_at(Position::new(0, 0)).unwrap().visible);
        recompute_visibility(&mut floor, Position::new(29, 29), 10);
        assert!(floor.tile_at(Position::new(29, 29)).unwrap().visible);
    }

    #[test]
    fn test_room_containing_viewer_is_marked_explored() {
        use crate::generation::{Room, RoomType};

        let mut floor = open_floor();
        floor
            .rooms
            .push(Room::new(0, RoomType::Entrance, 2, 2, 8, 8));
        floor
            .rooms
            .push(Room::new(1, RoomType::Standard, 18, 18, 8, 8));

        recompute_visibility(&mut floor, Position::new(5, 5), 4);
        assert!(floor.rooms[0].explored);
        assert!(!floor.rooms[1].explored);
    }
}
