//! Integration tests for the dungeon layer: lazy generation, single-flight
//! caching under concurrency, per-floor mutation, and registry cleanup.

use delve::{Difficulty, Dungeon, DungeonConfig, DungeonRegistry};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn test_config() -> DungeonConfig {
    DungeonConfig {
        width: 60,
        height: 40,
        total_floors: 6,
        difficulty: Difficulty::Normal,
    }
}

#[test]
fn concurrent_requests_observe_one_floor_instance() {
    let dungeon = Arc::new(Dungeon::new(42, test_config()).unwrap());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let dungeon = Arc::clone(&dungeon);
            thread::spawn(move || dungeon.floor(3).unwrap())
        })
        .collect();

    let floors: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for floor in &floors[1..] {
        assert!(Arc::ptr_eq(&floors[0], floor));
    }
    // Exactly one level was generated despite eight racing callers.
    assert_eq!(dungeon.generated_levels(), vec![3]);
}

#[test]
fn unrelated_floors_generate_independently() {
    let dungeon = Arc::new(Dungeon::new(7, test_config()).unwrap());

    let handles: Vec<_> = (1..=6)
        .map(|level| {
            let dungeon = Arc::clone(&dungeon);
            thread::spawn(move || dungeon.floor(level).unwrap())
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut levels = dungeon.generated_levels();
    levels.sort_unstable();
    assert_eq!(levels, vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn cached_floors_match_direct_generation() {
    let dungeon = Dungeon::new(99, test_config()).unwrap();
    let cached = dungeon.floor(2).unwrap();
    let direct = delve::generate_floor(2, 60, 40, Difficulty::Normal, 99, 6).unwrap();
    assert_eq!(*cached.lock().unwrap(), direct);
}

#[test]
fn gameplay_mutations_persist_on_the_cached_floor() {
    let dungeon = Dungeon::new(11, test_config()).unwrap();

    let mob_id = {
        let floor = dungeon.floor(2).unwrap();
        let guard = floor.lock().unwrap();
        *guard.mobs.keys().next().expect("floor has mobs")
    };

    // Kill the mob through the accessor API.
    {
        let floor = dungeon.floor(2).unwrap();
        let mut guard = floor.lock().unwrap();
        let mob = guard.remove_mob(mob_id).unwrap();
        assert_eq!(guard.tile_at(mob.position).unwrap().mob_id, None);
    }

    // A later fetch sees the mutation: the floor was cached, not rebuilt.
    let floor = dungeon.floor(2).unwrap();
    assert!(!floor.lock().unwrap().mobs.contains_key(&mob_id));
}

#[test]
fn registry_creates_on_demand_and_sweeps_idle_dungeons() {
    let registry = DungeonRegistry::new();
    assert!(registry.is_empty());

    let dungeon = registry.get_or_create("expedition", 5, test_config()).unwrap();
    dungeon.floor(1).unwrap();
    assert_eq!(registry.len(), 1);

    // Not yet past the timeout.
    assert_eq!(registry.sweep_expired(Duration::from_secs(3600)), 0);
    // Empty and idle past a zero timeout: reclaimed, floors and all.
    assert_eq!(registry.sweep_expired(Duration::ZERO), 1);
    assert!(registry.get("expedition").is_none());
}
