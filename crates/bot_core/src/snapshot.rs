//! Per-tick read-only view of the world.
//!
//! The host fills a [`WorldSnapshot`] at the start of every tick. Nothing in
//! the decision core mutates it; units decided in the same tick therefore
//! only ever see the previous tick's committed state.
//!
//! Each consumer reads through a narrow trait rather than the struct:
//! - [`EconomyView`] - counts, idle producers and resources for the planner
//! - [`BattlefieldView`] - unit, enemy and map lookups for micro and lift control

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::action::{AbilityId, ActionTarget};
use crate::math::{fixed_serde, option_fixed_serde, Fixed, Vec2Fixed};
use crate::unit_type::UnitType;

/// Host-assigned unique identifier for any unit or structure.
pub type Tag = u64;

/// Spendable resources and supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Primary currency.
    pub minerals: u32,
    /// Secondary currency.
    pub gas: u32,
    /// Supply in use.
    pub supply_used: u32,
    /// Supply available.
    pub supply_cap: u32,
}

impl Resources {
    /// Create a resource total with no supply information.
    #[must_use]
    pub const fn new(minerals: u32, gas: u32) -> Self {
        Self {
            minerals,
            gas,
            supply_used: 0,
            supply_cap: 0,
        }
    }

    /// Whether both costs can be paid.
    #[must_use]
    pub const fn can_afford(&self, minerals: u32, gas: u32) -> bool {
        self.minerals >= minerals && self.gas >= gas
    }
}

/// The order a unit is currently executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Ability being executed.
    pub ability: AbilityId,
    /// What it is aimed at.
    pub target: ActionTarget,
}

/// Health and shield pool shared by own and enemy units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Vitals {
    /// Current hit points.
    #[serde(with = "fixed_serde")]
    pub health: Fixed,
    /// Maximum hit points.
    #[serde(with = "fixed_serde")]
    pub health_max: Fixed,
    /// Current shield.
    #[serde(with = "fixed_serde")]
    pub shield: Fixed,
    /// Maximum shield.
    #[serde(with = "fixed_serde")]
    pub shield_max: Fixed,
}

impl Vitals {
    /// Vitals with no shield.
    #[must_use]
    pub fn health_only(health: Fixed, health_max: Fixed) -> Self {
        Self {
            health,
            health_max,
            shield: Fixed::ZERO,
            shield_max: Fixed::ZERO,
        }
    }

    /// Combined health and shield as a fraction of the combined maximum.
    ///
    /// The denominator is floored at one so an empty pool reads as zero
    /// rather than dividing by zero.
    #[must_use]
    pub fn ratio(&self) -> Fixed {
        let max = (self.shield_max + self.health_max).max(Fixed::ONE);
        (self.shield + self.health) / max
    }

    /// Hit points as a fraction of maximum hit points, ignoring shields.
    #[must_use]
    pub fn health_ratio(&self) -> Fixed {
        if self.health_max <= Fixed::ZERO {
            return Fixed::ZERO;
        }
        self.health / self.health_max
    }
}

/// An own combat-capable unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatUnit {
    /// Unique tag.
    pub tag: Tag,
    /// Unit kind.
    pub kind: UnitType,
    /// Current position.
    pub position: Vec2Fixed,
    /// Health and shields.
    pub vitals: Vitals,
    /// Current energy.
    #[serde(with = "fixed_serde")]
    pub energy: Fixed,
    /// Maximum energy (zero for units without energy).
    #[serde(with = "fixed_serde")]
    pub energy_max: Fixed,
    /// Weapon range against ground targets, `None` if it cannot shoot ground.
    #[serde(with = "option_fixed_serde")]
    pub ground_range: Option<Fixed>,
    /// Weapon range against air targets, `None` if it cannot shoot air.
    #[serde(with = "option_fixed_serde")]
    pub air_range: Option<Fixed>,
    /// Whether the unit is airborne.
    pub is_flying: bool,
    /// Whether the unit is currently stealthed.
    pub is_cloaked: bool,
    /// Whether the weapon is off cooldown.
    pub weapon_ready: bool,
    /// Order currently executing.
    pub order: Option<Order>,
}

impl CombatUnit {
    /// Target of the current movement order, if it is a position.
    #[must_use]
    pub fn order_position(&self) -> Option<Vec2Fixed> {
        match self.order {
            Some(Order {
                target: ActionTarget::Position(p),
                ..
            }) => Some(p),
            _ => None,
        }
    }

    /// Range at which this unit can hit a target of the given layer.
    #[must_use]
    pub const fn range_against(&self, target_is_flying: bool) -> Option<Fixed> {
        if target_is_flying {
            self.air_range
        } else {
            self.ground_range
        }
    }

    /// Whether `enemy` is inside this unit's weapon range.
    #[must_use]
    pub fn in_range_of(&self, enemy: &EnemyUnit) -> bool {
        self.range_against(enemy.is_flying).is_some_and(|range| {
            self.position.distance_squared(enemy.position) <= range * range
        })
    }

    /// Energy as a fraction of maximum; units without energy read as full.
    #[must_use]
    pub fn energy_ratio(&self) -> Fixed {
        if self.energy_max <= Fixed::ZERO {
            return Fixed::ONE;
        }
        self.energy / self.energy_max
    }
}

/// An own structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnStructure {
    /// Unique tag.
    pub tag: Tag,
    /// Structure kind.
    pub kind: UnitType,
    /// Current position.
    pub position: Vec2Fixed,
    /// Current hit points.
    #[serde(with = "fixed_serde")]
    pub health: Fixed,
    /// Maximum hit points.
    #[serde(with = "fixed_serde")]
    pub health_max: Fixed,
    /// Hit points on the previous tick, if the structure existed then.
    #[serde(with = "option_fixed_serde")]
    pub previous_health: Option<Fixed>,
    /// Construction progress in `[0, 1]`.
    #[serde(with = "fixed_serde")]
    pub build_progress: Fixed,
    /// Whether no production or order is running.
    pub is_idle: bool,
    /// Whether the structure is airborne.
    pub is_flying: bool,
    /// Attached addon kind, if any.
    pub addon: Option<UnitType>,
    /// Order currently executing.
    pub order: Option<Order>,
}

impl OwnStructure {
    /// Whether construction has finished.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.build_progress >= Fixed::ONE
    }
}

/// A visible enemy unit or structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyUnit {
    /// Unique tag.
    pub tag: Tag,
    /// Unit kind.
    pub kind: UnitType,
    /// Current position.
    pub position: Vec2Fixed,
    /// Health and shields.
    pub vitals: Vitals,
    /// Weapon range against ground targets, `None` if it cannot shoot ground.
    #[serde(with = "option_fixed_serde")]
    pub ground_range: Option<Fixed>,
    /// Weapon range against air targets, `None` if it cannot shoot air.
    #[serde(with = "option_fixed_serde")]
    pub air_range: Option<Fixed>,
    /// Whether it reveals stealthed units.
    pub is_detector: bool,
    /// Whether it is a building.
    pub is_structure: bool,
    /// Whether it is airborne.
    pub is_flying: bool,
}

impl EnemyUnit {
    /// Whether it can shoot airborne targets.
    #[must_use]
    pub const fn can_attack_air(&self) -> bool {
        self.air_range.is_some()
    }

    /// Range at which it can hit a target of the given layer, `None` if it
    /// cannot hit that layer at all.
    #[must_use]
    pub const fn range_against(&self, target_is_flying: bool) -> Option<Fixed> {
        if target_is_flying {
            self.air_range
        } else {
            self.ground_range
        }
    }
}

/// Playable rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBounds {
    /// Lowest corner.
    pub min: Vec2Fixed,
    /// Highest corner.
    pub max: Vec2Fixed,
}

impl MapBounds {
    /// Bounds from the origin to `size`.
    #[must_use]
    pub fn from_size(width: i32, height: i32) -> Self {
        Self {
            min: Vec2Fixed::ZERO,
            max: Vec2Fixed::from_ints(width, height),
        }
    }

    /// Clamp a point into the playable area.
    #[must_use]
    pub fn clamp(&self, point: Vec2Fixed) -> Vec2Fixed {
        point.clamp(self.min, self.max)
    }
}

impl Default for MapBounds {
    fn default() -> Self {
        Self::from_size(200, 176)
    }
}

/// Everything the decision core may know about one tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    /// Game clock in simulation ticks.
    pub game_loop: u64,
    /// Spendable resources.
    pub resources: Resources,
    /// Own combat units.
    pub units: Vec<CombatUnit>,
    /// Own structures and addons.
    pub structures: Vec<OwnStructure>,
    /// Visible enemies.
    pub enemies: Vec<EnemyUnit>,
    /// Ordered-but-unplaced structures and queued units, by kind.
    pub pending: BTreeMap<UnitType, u32>,
    /// Ready abilities per unit tag.
    pub ready_abilities: BTreeMap<Tag, BTreeSet<AbilityId>>,
    /// Playable area.
    pub map: MapBounds,
    /// Own main base location.
    pub start_location: Vec2Fixed,
    /// Precomputed 3x3 building sites, in preference order.
    pub landing_sites: Vec<Vec2Fixed>,
}

/// Read accessors the production planner needs.
pub trait EconomyView {
    /// Spendable resources.
    fn resources(&self) -> Resources;

    /// Own units and structures of a kind, ready or not.
    fn count(&self, kind: UnitType) -> u32;

    /// Own units and structures of a kind that are complete.
    fn ready_count(&self, kind: UnitType) -> u32;

    /// Ordered-but-unplaced structures and queued units of a kind.
    fn pending_count(&self, kind: UnitType) -> u32;

    /// Everything of a kind that exists or is on the way.
    fn total(&self, kind: UnitType) -> u32 {
        self.count(kind) + self.pending_count(kind)
    }

    /// Completed count plus the build progress of unfinished structures.
    ///
    /// Lets a gate wait for "one depot 95% done" rather than a whole one.
    fn progress_total(&self, kind: UnitType) -> Fixed;

    /// Whether a ready, idle, grounded producer of `kind` exists whose
    /// attached addon matches `addon` (any addon state when `None`).
    fn has_idle_producer(&self, kind: UnitType, addon: Option<UnitType>) -> bool;
}

/// Read accessors the micro engine and lift controller need.
pub trait BattlefieldView {
    /// Game clock in simulation ticks.
    fn game_loop(&self) -> u64;

    /// Own combat units.
    fn units(&self) -> &[CombatUnit];

    /// Own structures.
    fn structures(&self) -> &[OwnStructure];

    /// Visible enemies.
    fn enemies(&self) -> &[EnemyUnit];

    /// Whether the host reports `ability` ready for `tag`.
    fn ability_ready(&self, tag: Tag, ability: AbilityId) -> bool;

    /// Playable area.
    fn map_bounds(&self) -> MapBounds;

    /// Own main base location.
    fn start_location(&self) -> Vec2Fixed;

    /// Precomputed building sites.
    fn landing_sites(&self) -> &[Vec2Fixed];

    /// Own unit by tag.
    fn unit(&self, tag: Tag) -> Option<&CombatUnit> {
        self.units().iter().find(|u| u.tag == tag)
    }

    /// Own structure by tag.
    fn structure(&self, tag: Tag) -> Option<&OwnStructure> {
        self.structures().iter().find(|s| s.tag == tag)
    }

    /// Visible enemy by tag.
    fn enemy(&self, tag: Tag) -> Option<&EnemyUnit> {
        self.enemies().iter().find(|e| e.tag == tag)
    }

    /// Visible enemies within `radius` of `position`.
    fn enemies_within(&self, position: Vec2Fixed, radius: Fixed) -> Vec<&EnemyUnit> {
        let radius_sq = radius * radius;
        self.enemies()
            .iter()
            .filter(|e| e.position.distance_squared(position) <= radius_sq)
            .collect()
    }
}

impl EconomyView for WorldSnapshot {
    fn resources(&self) -> Resources {
        self.resources
    }

    fn count(&self, kind: UnitType) -> u32 {
        let units = self.units.iter().filter(|u| u.kind == kind).count();
        let structures = self.structures.iter().filter(|s| s.kind == kind).count();
        (units + structures) as u32
    }

    fn ready_count(&self, kind: UnitType) -> u32 {
        let units = self.units.iter().filter(|u| u.kind == kind).count();
        let structures = self
            .structures
            .iter()
            .filter(|s| s.kind == kind && s.is_ready())
            .count();
        (units + structures) as u32
    }

    fn pending_count(&self, kind: UnitType) -> u32 {
        self.pending.get(&kind).copied().unwrap_or(0)
    }

    fn progress_total(&self, kind: UnitType) -> Fixed {
        let units = Fixed::from_num(self.units.iter().filter(|u| u.kind == kind).count());
        self.structures
            .iter()
            .filter(|s| s.kind == kind)
            .fold(units, |total, s| total + s.build_progress.min(Fixed::ONE))
    }

    fn has_idle_producer(&self, kind: UnitType, addon: Option<UnitType>) -> bool {
        self.structures.iter().any(|s| {
            s.kind == kind
                && s.is_ready()
                && s.is_idle
                && !s.is_flying
                && addon.map_or(true, |required| s.addon == Some(required))
        })
    }
}

impl BattlefieldView for WorldSnapshot {
    fn game_loop(&self) -> u64 {
        self.game_loop
    }

    fn units(&self) -> &[CombatUnit] {
        &self.units
    }

    fn structures(&self) -> &[OwnStructure] {
        &self.structures
    }

    fn enemies(&self) -> &[EnemyUnit] {
        &self.enemies
    }

    fn ability_ready(&self, tag: Tag, ability: AbilityId) -> bool {
        self.ready_abilities
            .get(&tag)
            .is_some_and(|ready| ready.contains(&ability))
    }

    fn map_bounds(&self) -> MapBounds {
        self.map
    }

    fn start_location(&self) -> Vec2Fixed {
        self.start_location
    }

    fn landing_sites(&self) -> &[Vec2Fixed] {
        &self.landing_sites
    }
}
