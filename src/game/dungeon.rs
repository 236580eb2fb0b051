//! # Dungeon Layer
//!
//! A `Dungeon` owns the floors of one dungeon instance and generates them
//! lazily: a floor is built on the first request for its level and cached
//! for the dungeon's lifetime. Concurrent first requests for the same level
//! are single-flighted through a per-level slot, so exactly one generation
//! runs and every caller observes the same `Floor` instance. After
//! generation a floor is read-mostly; gameplay mutation takes the per-floor
//! mutex. Floors are independent — there is no cross-floor locking.
//!
//! The `DungeonRegistry` creates dungeons on demand and reclaims the ones
//! that have sat empty past an inactivity timeout.

use crate::generation::floor::build_floor;
use crate::generation::{Difficulty, GenerationConfig};
use crate::{config, CharacterId, DelveError, DelveResult, Floor};
use log::{debug, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::{Duration, Instant};

/// Locks a mutex, riding through poisoning. A panicked holder cannot leave
/// the floor cache in a state worse than the panic itself.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Static shape of a dungeon: floor dimensions, depth, and difficulty tier.
#[derive(Debug, Clone, Copy)]
pub struct DungeonConfig {
    pub width: u32,
    pub height: u32,
    pub total_floors: u32,
    pub difficulty: Difficulty,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            width: config::DEFAULT_FLOOR_WIDTH,
            height: config::DEFAULT_FLOOR_HEIGHT,
            total_floors: config::DEFAULT_TOTAL_FLOORS,
            difficulty: Difficulty::Normal,
        }
    }
}

/// One dungeon instance: a seed, a stack of lazily-generated floors, and
/// the characters currently inside.
///
/// # Examples
///
/// ```
/// use delve::{Dungeon, DungeonConfig};
///
/// let dungeon = Dungeon::new(42, DungeonConfig::default()).unwrap();
/// let floor = dungeon.floor(1).unwrap();
/// assert_eq!(floor.lock().unwrap().level, 1);
/// ```
#[derive(Debug)]
pub struct Dungeon {
    seed: i64,
    config: DungeonConfig,
    floors: Mutex<HashMap<u32, Arc<OnceLock<Arc<Mutex<Floor>>>>>>,
    characters: Mutex<HashMap<CharacterId, u32>>,
    last_active: Mutex<Instant>,
}

impl Dungeon {
    /// Creates an empty dungeon. No floors are generated until requested.
    pub fn new(seed: i64, dungeon_config: DungeonConfig) -> DelveResult<Self> {
        if dungeon_config.total_floors < 1 {
            return Err(DelveError::InvalidState(
                "dungeon must have at least one floor".to_string(),
            ));
        }
        if dungeon_config.width < crate::generation::floor::MIN_FLOOR_DIMENSION
            || dungeon_config.height < crate::generation::floor::MIN_FLOOR_DIMENSION
        {
            return Err(DelveError::InvalidState(format!(
                "floor dimensions {}x{} too small",
                dungeon_config.width, dungeon_config.height
            )));
        }
        Ok(Self {
            seed,
            config: dungeon_config,
            floors: Mutex::new(HashMap::new()),
            characters: Mutex::new(HashMap::new()),
            last_active: Mutex::new(Instant::now()),
        })
    }

    pub fn seed(&self) -> i64 {
        self.seed
    }

    pub fn total_floors(&self) -> u32 {
        self.config.total_floors
    }

    /// Returns the floor at `level`, generating and caching it on first
    /// access.
    ///
    /// Single-flight per level: the per-level `OnceLock` slot is fetched
    /// under a short-lived map lock and initialized outside it, so two
    /// callers racing on an ungenerated floor block on the slot rather than
    /// on the whole dungeon, and unrelated floors generate concurrently.
    pub fn floor(&self, level: u32) -> DelveResult<Arc<Mutex<Floor>>> {
        if level < 1 || level > self.config.total_floors {
            return Err(DelveError::LevelOutOfRange {
                level,
                total_floors: self.config.total_floors,
            });
        }
        self.touch();

        let slot = {
            let mut floors = lock(&self.floors);
            floors.entry(level).or_default().clone()
        };

        let floor = slot.get_or_init(|| {
            debug!(
                "dungeon {:#x}: generating floor {level} on first access",
                self.seed
            );
            Arc::new(Mutex::new(build_floor(
                level,
                self.config.width,
                self.config.height,
                self.config.difficulty,
                self.seed,
                self.config.total_floors,
                &GenerationConfig::standard(),
            )))
        });

        Ok(Arc::clone(floor))
    }

    /// Levels that have been generated so far, unordered.
    pub fn generated_levels(&self) -> Vec<u32> {
        lock(&self.floors)
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(&level, _)| level)
            .collect()
    }

    /// Records which floor a character currently occupies.
    pub fn set_character_floor(&self, id: CharacterId, level: u32) -> DelveResult<()> {
        if level < 1 || level > self.config.total_floors {
            return Err(DelveError::LevelOutOfRange {
                level,
                total_floors: self.config.total_floors,
            });
        }
        lock(&self.characters).insert(id, level);
        self.touch();
        Ok(())
    }

    /// The floor a character occupies, if they are in this dungeon.
    pub fn character_floor(&self, id: CharacterId) -> Option<u32> {
        lock(&self.characters).get(&id).copied()
    }

    /// Removes a character (left the dungeon, logged out, died).
    pub fn remove_character(&self, id: CharacterId) {
        lock(&self.characters).remove(&id);
        self.touch();
    }

    /// Number of characters currently inside.
    pub fn character_count(&self) -> usize {
        lock(&self.characters).len()
    }

    /// Whether this dungeon is empty and has been idle past `timeout`.
    pub fn is_expired(&self, timeout: Duration) -> bool {
        lock(&self.characters).is_empty() && lock(&self.last_active).elapsed() >= timeout
    }

    fn touch(&self) {
        *lock(&self.last_active) = Instant::now();
    }
}

/// On-demand creation and inactivity cleanup for dungeon instances, keyed
/// by an opaque id chosen by the session layer.
#[derive(Debug, Default)]
pub struct DungeonRegistry {
    dungeons: Mutex<HashMap<String, Arc<Dungeon>>>,
}

impl DungeonRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the dungeon for `key`, creating it when absent.
    ///
    /// The seed and config only apply on creation; an existing dungeon is
    /// returned as-is.
    pub fn get_or_create(
        &self,
        key: &str,
        seed: i64,
        dungeon_config: DungeonConfig,
    ) -> DelveResult<Arc<Dungeon>> {
        let mut dungeons = lock(&self.dungeons);
        if let Some(existing) = dungeons.get(key) {
            return Ok(Arc::clone(existing));
        }
        info!(
            "creating dungeon '{key}' (seed {seed}, {} floors, {})",
            dungeon_config.total_floors, dungeon_config.difficulty
        );
        let dungeon = Arc::new(Dungeon::new(seed, dungeon_config)?);
        dungeons.insert(key.to_string(), Arc::clone(&dungeon));
        Ok(dungeon)
    }

    /// Looks up an existing dungeon without creating one.
    pub fn get(&self, key: &str) -> Option<Arc<Dungeon>> {
        lock(&self.dungeons).get(key).cloned()
    }

    /// Drops every dungeon that is empty and idle past `timeout`; returns
    /// how many were reclaimed.
    pub fn sweep_expired(&self, timeout: Duration) -> usize {
        let mut dungeons = lock(&self.dungeons);
        let before = dungeons.len();
        dungeons.retain(|key, dungeon| {
            let expired = dungeon.is_expired(timeout);
            if expired {
                info!("reclaiming idle dungeon '{key}'");
            }
            !expired
        });
        before - dungeons.len()
    }

    pub fn len(&self) -> usize {
        lock(&self.dungeons).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.dungeons).is_empty()
    }
}
