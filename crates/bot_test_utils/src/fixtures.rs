//! Test fixtures and helpers.
//!
//! Builders for snapshots and the units inside them. Every builder starts
//! from a healthy, finished, idle default so a test only spells out what it
//! is actually about.

use bot_core::action::AbilityId;
use bot_core::math::Vec2Fixed;
use bot_core::snapshot::{
    CombatUnit, EnemyUnit, MapBounds, OwnStructure, Resources, Tag, Vitals, WorldSnapshot,
};
use bot_core::unit_type::UnitType;
use fixed::types::I32F32;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: decision code never uses floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// Integer point.
#[must_use]
pub fn point(x: i32, y: i32) -> Vec2Fixed {
    Vec2Fixed::from_ints(x, y)
}

/// Full-health own unit with a 5-range weapon against both layers.
#[must_use]
pub fn combat_unit(tag: Tag, kind: UnitType, x: i32, y: i32) -> CombatUnit {
    CombatUnit {
        tag,
        kind,
        position: point(x, y),
        vitals: Vitals::health_only(fixed(100), fixed(100)),
        energy: I32F32::ZERO,
        energy_max: I32F32::ZERO,
        ground_range: Some(fixed(5)),
        air_range: Some(fixed(5)),
        is_flying: false,
        is_cloaked: false,
        weapon_ready: true,
        order: None,
    }
}

/// Full-health enemy with a 5-range ground weapon and no anti-air.
#[must_use]
pub fn enemy_unit(tag: Tag, kind: UnitType, x: i32, y: i32) -> EnemyUnit {
    EnemyUnit {
        tag,
        kind,
        position: point(x, y),
        vitals: Vitals::health_only(fixed(100), fixed(100)),
        ground_range: Some(fixed(5)),
        air_range: None,
        is_detector: false,
        is_structure: kind.is_structure(),
        is_flying: false,
    }
}

/// Enemy that shoots air and ground at `range`.
#[must_use]
pub fn anti_air(tag: Tag, x: i32, y: i32, range: i32) -> EnemyUnit {
    EnemyUnit {
        air_range: Some(fixed(range)),
        ground_range: Some(fixed(range)),
        ..enemy_unit(tag, UnitType::Marine, x, y)
    }
}

/// Finished, idle, undamaged own structure.
#[must_use]
pub fn structure(tag: Tag, kind: UnitType, x: i32, y: i32) -> OwnStructure {
    OwnStructure {
        tag,
        kind,
        position: point(x, y),
        health: fixed(1000),
        health_max: fixed(1000),
        previous_health: Some(fixed(1000)),
        build_progress: I32F32::ONE,
        is_idle: true,
        is_flying: false,
        addon: None,
        order: None,
    }
}

/// Fluent builder for [`WorldSnapshot`].
#[derive(Debug, Clone, Default)]
pub struct SnapshotBuilder {
    snapshot: WorldSnapshot,
}

impl SnapshotBuilder {
    /// Empty snapshot on a default map at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the game loop.
    #[must_use]
    pub fn at(mut self, game_loop: u64) -> Self {
        self.snapshot.game_loop = game_loop;
        self
    }

    /// Set the bank.
    #[must_use]
    pub fn resources(mut self, minerals: u32, gas: u32) -> Self {
        self.snapshot.resources = Resources {
            supply_used: self.snapshot.resources.supply_used,
            supply_cap: self.snapshot.resources.supply_cap,
            ..Resources::new(minerals, gas)
        };
        self
    }

    /// Set supply used and cap.
    #[must_use]
    pub fn supply(mut self, used: u32, cap: u32) -> Self {
        self.snapshot.resources.supply_used = used;
        self.snapshot.resources.supply_cap = cap;
        self
    }

    /// Add an own unit.
    #[must_use]
    pub fn unit(mut self, unit: CombatUnit) -> Self {
        self.snapshot.units.push(unit);
        self
    }

    /// Add an own structure.
    #[must_use]
    pub fn structure(mut self, structure: OwnStructure) -> Self {
        self.snapshot.structures.push(structure);
        self
    }

    /// Add an enemy.
    #[must_use]
    pub fn enemy(mut self, enemy: EnemyUnit) -> Self {
        self.snapshot.enemies.push(enemy);
        self
    }

    /// Record `count` queued instances of `kind`.
    #[must_use]
    pub fn pending(mut self, kind: UnitType, count: u32) -> Self {
        *self.snapshot.pending.entry(kind).or_default() += count;
        self
    }

    /// Report `abilities` ready for `tag`.
    #[must_use]
    pub fn ready(mut self, tag: Tag, abilities: &[AbilityId]) -> Self {
        self.snapshot
            .ready_abilities
            .entry(tag)
            .or_default()
            .extend(abilities.iter().copied());
        self
    }

    /// Set the playable map size.
    #[must_use]
    pub fn map(mut self, width: i32, height: i32) -> Self {
        self.snapshot.map = MapBounds::from_size(width, height);
        self
    }

    /// Set the own start location.
    #[must_use]
    pub fn start(mut self, x: i32, y: i32) -> Self {
        self.snapshot.start_location = point(x, y);
        self
    }

    /// Add a precomputed landing site.
    #[must_use]
    pub fn landing_site(mut self, x: i32, y: i32) -> Self {
        self.snapshot.landing_sites.push(point(x, y));
        self
    }

    /// Finish.
    #[must_use]
    pub fn build(self) -> WorldSnapshot {
        self.snapshot
    }
}
