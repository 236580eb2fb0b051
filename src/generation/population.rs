//! # Population Generation
//!
//! Scatters mobs and items into a carved floor, scaled by depth and
//! difficulty tier.
//!
//! Mob counts grow linearly with depth and are multiplied by the difficulty
//! tier; variants come from a depth-banded pool whose hardest entries gain
//! weight on higher tiers. The entrance room never receives mobs. Items are
//! shallower-scaled and may land in any room. Both generators re-roll a
//! bounded number of times on collision and then skip the entity — a
//! slightly under-populated floor is valid, an unterminated loop is not.

use crate::generation::{Difficulty, GenerationConfig, Room};
use crate::{mint_id, Floor, Item, ItemKind, Mob, MobKind};
use log::debug;
use rand::distributions::WeightedIndex;
use rand::prelude::Distribution;
use rand::rngs::StdRng;
use rand::Rng;

/// One weighted entry of a mob pool. Entries flagged `elite` gain weight on
/// harder difficulty tiers.
struct PoolEntry {
    kind: MobKind,
    weight: f64,
    elite: bool,
}

const fn entry(kind: MobKind, weight: f64) -> PoolEntry {
    PoolEntry {
        kind,
        weight,
        elite: false,
    }
}

const fn elite(kind: MobKind, weight: f64) -> PoolEntry {
    PoolEntry {
        kind,
        weight,
        elite: true,
    }
}

/// The depth-appropriate mob pool. Bands overlap at their edges so the
/// transition between depths feels gradual rather than stepped.
fn mob_pool(level: u32) -> &'static [PoolEntry] {
    const SHALLOW: &[PoolEntry] = &[
        entry(MobKind::Rat, 4.0),
        entry(MobKind::Bat, 3.0),
        entry(MobKind::Goblin, 2.0),
        elite(MobKind::Skeleton, 1.0),
    ];
    const MID: &[PoolEntry] = &[
        entry(MobKind::Goblin, 3.0),
        entry(MobKind::Skeleton, 3.0),
        entry(MobKind::Zombie, 2.0),
        elite(MobKind::Orc, 2.0),
        elite(MobKind::Wraith, 1.0),
    ];
    const DEEP: &[PoolEntry] = &[
        entry(MobKind::Orc, 3.0),
        entry(MobKind::Zombie, 2.0),
        entry(MobKind::Wraith, 2.0),
        elite(MobKind::Troll, 2.0),
        elite(MobKind::Ogre, 1.0),
    ];
    const ABYSSAL: &[PoolEntry] = &[
        entry(MobKind::Troll, 3.0),
        entry(MobKind::Ogre, 2.0),
        entry(MobKind::Wraith, 2.0),
        elite(MobKind::Demon, 2.0),
        elite(MobKind::Dragon, 1.0),
    ];

    match level {
        0..=3 => SHALLOW,
        4..=6 => MID,
        7..=9 => DEEP,
        _ => ABYSSAL,
    }
}

const ITEM_POOL: &[(ItemKind, f64)] = &[
    (ItemKind::Gold, 4.0),
    (ItemKind::Potion, 3.0),
    (ItemKind::Food, 2.0),
    (ItemKind::Scroll, 2.0),
    (ItemKind::Weapon, 1.0),
    (ItemKind::Armor, 1.0),
];

/// Number of mobs a floor at `level` targets under `difficulty`.
///
/// Monotonically non-decreasing in `level` for a fixed difficulty, which
/// the test suite relies on.
pub fn mob_count_for(level: u32, difficulty: Difficulty, gen_config: &GenerationConfig) -> u32 {
    let base = (gen_config.base_mob_count + level) as f64;
    (base * difficulty.profile().mob_count_multiplier).round() as u32
}

/// Number of items a floor at `level` targets.
pub fn item_count_for(level: u32, gen_config: &GenerationConfig) -> u32 {
    gen_config.base_item_count + level / 2
}

/// Scatters mobs into rooms, skipping the entrance room.
///
/// Mutates `floor.mobs` and the corresponding tile occupant references.
pub fn populate_mobs(
    floor: &mut Floor,
    level: u32,
    difficulty: Difficulty,
    gen_config: &GenerationConfig,
    rng: &mut StdRng,
) {
    // rooms[0] is the safe entrance room; mobs spawn everywhere else.
    if floor.rooms.len() < 2 {
        debug!("floor {level}: no rooms outside the entrance, skipping mobs");
        return;
    }

    let pool = mob_pool(level);
    let elite_multiplier = difficulty.profile().elite_weight_multiplier;
    let weights: Vec<f64> = pool
        .iter()
        .map(|e| {
            if e.elite {
                e.weight * elite_multiplier
            } else {
                e.weight
            }
        })
        .collect();
    // Weights are static positive constants times a positive multiplier.
    let Ok(dist) = WeightedIndex::new(&weights) else {
        return;
    };

    let target = mob_count_for(level, difficulty, gen_config);
    let mut placed = 0;
    for _ in 0..target {
        let room_index = rng.gen_range(1..floor.rooms.len());
        let room = floor.rooms[room_index].clone();
        let Some(position) = roll_free_tile(floor, &room, gen_config.placement_reroll_limit, rng)
        else {
            debug!("floor {level}: no free tile for mob in room {}", room.id);
            continue;
        };
        let mob = Mob {
            id: mint_id(rng),
            kind: pool[dist.sample(rng)].kind,
            position,
        };
        if floor.add_mob(mob).is_ok() {
            placed += 1;
        }
    }

    debug!("floor {level}: placed {placed}/{target} mobs ({difficulty})");
}

/// Scatters items into rooms; the entrance room is fair game.
pub fn populate_items(floor: &mut Floor, level: u32, gen_config: &GenerationConfig, rng: &mut StdRng) {
    if floor.rooms.is_empty() {
        return;
    }

    let weights: Vec<f64> = ITEM_POOL.iter().map(|(_, w)| *w).collect();
    let Ok(dist) = WeightedIndex::new(&weights) else {
        return;
    };

    let target = item_count_for(level, gen_config);
    let mut placed = 0;
    for _ in 0..target {
        let room_index = rng.gen_range(0..floor.rooms.len());
        let room = floor.rooms[room_index].clone();
        let Some(position) = roll_free_tile(floor, &room, gen_config.placement_reroll_limit, rng)
        else {
            debug!("floor {level}: no free tile for item in room {}", room.id);
            continue;
        };
        let item = Item {
            id: mint_id(rng),
            kind: ITEM_POOL[dist.sample(rng)].0,
            position,
        };
        if floor.add_item(item).is_ok() {
            placed += 1;
        }
    }

    debug!("floor {level}: placed {placed}/{target} items");
}

/// Rolls a random interior tile of `room` that is plain floor with no
/// occupants, re-rolling up to `limit` times.
///
/// Stair and door tiles fail the check, so entities never block a stairway
/// or a corridor mouth.
fn roll_free_tile(floor: &Floor, room: &Room, limit: u32, rng: &mut StdRng) -> Option<crate::Position> {
    let interior = room.interior_positions();
    if interior.is_empty() {
        return None;
    }
    for _ in 0..=limit {
        let pos = interior[rng.gen_range(0..interior.len())];
        if floor
            .tile_at(pos)
            .is_some_and(|tile| tile.is_free_for_placement() && tile.character_id.is_none())
        {
            return Some(pos);
        }
    }
    None
}
