//! Cloaked raider harassment.
//!
//! The roster claims healthy cloaking raiders, flies them to a target point
//! (usually the enemy main) and hunts workers there. Raiders are handed back
//! to the army when they are hurt or out of energy, when too many raiders
//! have died, or when nothing is left to shoot at the target.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::cloak::CloakPolicy;
use super::commit;
use super::geometry::{escape_direction, nearest};
use crate::action::{AbilityId, Action, UnitAction};
use crate::config::{HarassConfig, MicroConfig};
use crate::cooldown::CooldownTracker;
use crate::error::{BotError, Result};
use crate::math::Vec2Fixed;
use crate::snapshot::{BattlefieldView, CombatUnit, EnemyUnit, Tag};
use crate::unit_type::UnitType;

/// What the roster did this tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarassOutput {
    /// Commands for harassing units.
    pub actions: Vec<UnitAction>,
    /// Units handed back to the army this tick.
    pub released: Vec<Tag>,
}

/// Roster of units on harassment duty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarassRoster {
    config: HarassConfig,
    /// Tag to whether the unit has reached the target.
    harassers: BTreeMap<Tag, bool>,
    seen: BTreeSet<Tag>,
    losses: u32,
    exhausted: bool,
    cloak: CloakPolicy,
}

impl HarassRoster {
    /// Empty roster.
    #[must_use]
    pub fn new(config: &MicroConfig) -> Self {
        Self {
            config: config.harass.clone(),
            harassers: BTreeMap::new(),
            seen: BTreeSet::new(),
            losses: 0,
            exhausted: false,
            cloak: CloakPolicy::new(),
        }
    }

    /// Whether `tag` is on harassment duty.
    #[must_use]
    pub fn is_harassing(&self, tag: Tag) -> bool {
        self.harassers.contains_key(&tag)
    }

    /// Units currently on duty, in tag order.
    pub fn harassers(&self) -> impl Iterator<Item = Tag> + '_ {
        self.harassers.keys().copied()
    }

    /// Raiders lost since the roster was created.
    #[must_use]
    pub const fn losses(&self) -> u32 {
        self.losses
    }

    /// Whether the target ran out of things to shoot.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Number of units on duty.
    #[must_use]
    pub fn len(&self) -> usize {
        self.harassers.len()
    }

    /// Whether no unit is on duty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.harassers.is_empty()
    }

    fn retired(&self) -> bool {
        self.losses >= self.config.max_losses || self.exhausted
    }

    /// Claim new raiders, count losses and release units that should stop.
    ///
    /// Returns the tags released this tick. Units that vanished are dropped
    /// without being reported.
    pub fn update(&mut self, world: &dyn BattlefieldView) -> Vec<Tag> {
        if !self.retired() {
            for unit in world.units() {
                if unit.kind != UnitType::Banshee || self.harassers.contains_key(&unit.tag) {
                    continue;
                }
                self.seen.insert(unit.tag);
                if unit.vitals.health_ratio() < self.config.join_health
                    || unit.energy_ratio() < self.config.min_energy
                {
                    continue;
                }
                tracing::info!(unit = unit.tag, "Raider joined harassment");
                self.harassers.insert(unit.tag, false);
            }
        }

        let alive = self
            .seen
            .iter()
            .filter(|&&tag| world.unit(tag).is_some())
            .count();
        self.losses = u32::try_from(self.seen.len() - alive).unwrap_or(u32::MAX);

        let retired = self.retired();
        let mut released = Vec::new();
        self.harassers.retain(|&tag, _| {
            let Some(unit) = world.unit(tag) else {
                return false;
            };
            let worn = unit.vitals.health_ratio() < self.config.leave_health
                || unit.energy_ratio() < self.config.min_energy;
            if worn || retired {
                tracing::info!(unit = tag, worn, retired, "Raider released from harassment");
                released.push(tag);
                return false;
            }
            true
        });
        self.cloak.evict_missing(world);
        released
    }

    /// Claim, release and command raiders for this tick.
    ///
    /// With no `target` the roster is maintained but nobody is commanded.
    pub fn tick(
        &mut self,
        world: &dyn BattlefieldView,
        target: Option<Vec2Fixed>,
        cooldowns: &mut CooldownTracker,
    ) -> HarassOutput {
        let released = self.update(world);
        let mut actions = Vec::new();
        if let Some(target) = target {
            let tags: Vec<Tag> = self.harassers.keys().copied().collect();
            for tag in tags {
                let Some(unit) = world.unit(tag) else {
                    continue;
                };
                let Some(action) = self.control(unit, target, world, cooldowns) else {
                    continue;
                };
                if let Some(issued) = commit(unit, action, cooldowns, world.game_loop()) {
                    actions.push(issued);
                }
            }
        }
        HarassOutput { actions, released }
    }

    /// Decide what one raider does this tick.
    pub fn control(
        &mut self,
        unit: &CombatUnit,
        target: Vec2Fixed,
        world: &dyn BattlefieldView,
        cooldowns: &CooldownTracker,
    ) -> Option<Action> {
        let config = &self.config;
        let mut reached = self.harassers.get(&unit.tag).copied().unwrap_or(false);
        if !reached && unit.position.distance(target) < config.arrival_radius {
            self.harassers.insert(unit.tag, true);
            reached = true;
        }

        let enemies = world.enemies_within(unit.position, config.engage_radius);
        if enemies.is_empty() && !reached {
            return Some(Action::move_to(target));
        }

        let anti_air = enemies.iter().any(|enemy| enemy.can_attack_air());
        let detected = enemies.iter().any(|enemy| enemy.is_detector);
        if (anti_air && detected) || unit.vitals.health_ratio() < config.backstep_health {
            let dangers: Vec<&EnemyUnit> = enemies
                .iter()
                .copied()
                .filter(|enemy| enemy.can_attack_air() || enemy.is_detector)
                .collect();
            if let Some(danger) = nearest(unit.position, &dangers) {
                let away = escape_direction(unit.position, danger.position, Some(target));
                return Some(Action::move_to(
                    unit.position + away.scale(config.backstep_distance),
                ));
            }
        }

        let cloak_ready = cooldowns.is_ready(world, unit.tag, AbilityId::CloakOn);
        if let Some(toggle) = self.cloak.toggle(unit, &enemies, cloak_ready) {
            return Some(toggle);
        }

        if !reached {
            return Some(Action::move_to(target));
        }

        let victim = weakest(unit, enemies.iter().copied().filter(|e| e.kind.is_worker()))
            .or_else(|| {
                weakest(
                    unit,
                    enemies
                        .iter()
                        .copied()
                        .filter(|e| !e.kind.is_worker() && !e.is_structure),
                )
            });
        if let Some(victim) = victim {
            return Some(Action::attack(victim.tag));
        }

        if !self.exhausted {
            tracing::info!(unit = unit.tag, "Nothing left to harass");
        }
        self.exhausted = true;
        None
    }

    /// Serialized roster state, for determinism checks.
    pub fn encode_state(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| BotError::StateEncoding(e.to_string()))
    }
}

/// Lowest raw health, then nearest.
fn weakest<'a>(
    unit: &CombatUnit,
    candidates: impl Iterator<Item = &'a EnemyUnit>,
) -> Option<&'a EnemyUnit> {
    candidates.min_by_key(|enemy| {
        (
            enemy.vitals.health,
            unit.position.distance_squared(enemy.position),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Fixed;
    use crate::snapshot::{Vitals, WorldSnapshot};

    fn banshee(tag: Tag, x: i32, health: i32, energy: i32) -> CombatUnit {
        CombatUnit {
            tag,
            kind: UnitType::Banshee,
            position: Vec2Fixed::from_ints(x, 0),
            vitals: Vitals::health_only(Fixed::from_num(health), Fixed::from_num(140)),
            energy: Fixed::from_num(energy),
            energy_max: Fixed::from_num(200),
            ground_range: Some(Fixed::from_num(6)),
            air_range: None,
            is_flying: true,
            is_cloaked: false,
            weapon_ready: true,
            order: None,
        }
    }

    fn enemy(tag: Tag, kind: UnitType, x: i32, health: i32) -> EnemyUnit {
        EnemyUnit {
            tag,
            kind,
            position: Vec2Fixed::from_ints(x, 0),
            vitals: Vitals::health_only(Fixed::from_num(health), Fixed::from_num(100)),
            ground_range: Some(Fixed::from_num(1)),
            air_range: None,
            is_detector: false,
            is_structure: kind.is_structure(),
            is_flying: false,
        }
    }

    fn scene(units: Vec<CombatUnit>, enemies: Vec<EnemyUnit>) -> WorldSnapshot {
        WorldSnapshot {
            game_loop: 200,
            units,
            enemies,
            ..WorldSnapshot::default()
        }
    }

    fn roster() -> HarassRoster {
        HarassRoster::new(&MicroConfig::default())
    }

    #[test]
    fn test_only_healthy_raiders_join() {
        let mut roster = roster();
        let world = scene(
            vec![banshee(1, 0, 140, 100), banshee(2, 0, 40, 100), banshee(3, 0, 140, 10)],
            Vec::new(),
        );
        assert!(roster.update(&world).is_empty());
        assert_eq!(roster.harassers().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_losses_retire_roster() {
        let mut roster = roster();
        roster.update(&scene(
            vec![banshee(1, 0, 140, 100), banshee(2, 0, 140, 100), banshee(3, 0, 140, 100)],
            Vec::new(),
        ));
        assert_eq!(roster.len(), 3);

        let released = roster.update(&scene(vec![banshee(3, 0, 140, 100)], Vec::new()));
        assert_eq!(roster.losses(), 2);
        assert_eq!(released, vec![3]);
        assert!(roster.is_empty());

        roster.update(&scene(
            vec![banshee(3, 0, 140, 100), banshee(4, 0, 140, 100)],
            Vec::new(),
        ));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_hurt_raider_released() {
        let mut roster = roster();
        roster.update(&scene(vec![banshee(1, 0, 140, 100)], Vec::new()));
        let released = roster.update(&scene(vec![banshee(1, 0, 30, 100)], Vec::new()));
        assert_eq!(released, vec![1]);
    }

    #[test]
    fn test_travels_to_target_then_hunts_weakest_worker() {
        let mut roster = roster();
        let mut cooldowns = CooldownTracker::new(8);
        let target = Vec2Fixed::from_ints(100, 0);

        let world = scene(vec![banshee(1, 0, 140, 100)], Vec::new());
        let out = roster.tick(&world, Some(target), &mut cooldowns);
        assert_eq!(out.actions, vec![UnitAction::new(1, Action::move_to(target))]);

        let world = scene(
            vec![banshee(1, 99, 140, 100)],
            vec![
                enemy(10, UnitType::Probe, 103, 20),
                enemy(11, UnitType::Probe, 101, 20),
                enemy(12, UnitType::Probe, 100, 40),
                enemy(13, UnitType::Other(73), 100, 5),
            ],
        );
        let out = roster.tick(&world, Some(target), &mut cooldowns);
        assert_eq!(out.actions, vec![UnitAction::new(1, Action::attack(11))]);
    }

    #[test]
    fn test_anti_air_triggers_cloak() {
        let mut roster = roster();
        let mut cooldowns = CooldownTracker::new(8);
        let mut marine = enemy(10, UnitType::Marine, 8, 45);
        marine.air_range = Some(Fixed::from_num(5));
        let mut world = scene(vec![banshee(1, 0, 140, 100)], vec![marine]);
        world
            .ready_abilities
            .insert(1, [AbilityId::CloakOn].into_iter().collect());

        let out = roster.tick(&world, Some(Vec2Fixed::from_ints(100, 0)), &mut cooldowns);
        assert_eq!(
            out.actions,
            vec![UnitAction::new(1, Action::ability(AbilityId::CloakOn))]
        );
        assert!(cooldowns.recently_cast(1, AbilityId::CloakOn, 200));
    }

    #[test]
    fn test_cloak_not_repeated_when_host_never_cloaks() {
        let mut roster = roster();
        let mut cooldowns = CooldownTracker::new(8);
        let target = Vec2Fixed::from_ints(100, 0);
        let mut marine = enemy(10, UnitType::Marine, 8, 45);
        marine.air_range = Some(Fixed::from_num(5));

        let mut toggles = 0;
        for game_loop in 200..240 {
            let mut world = scene(vec![banshee(1, 0, 140, 100)], vec![marine.clone()]);
            world.game_loop = game_loop;
            world
                .ready_abilities
                .insert(1, [AbilityId::CloakOn].into_iter().collect());
            toggles += roster
                .tick(&world, Some(target), &mut cooldowns)
                .actions
                .iter()
                .filter(|a| a.action.ability == Some(AbilityId::CloakOn))
                .count();
        }
        assert_eq!(toggles, 1);
    }

    #[test]
    fn test_detection_with_anti_air_backsteps() {
        let mut roster = roster();
        roster.update(&scene(vec![banshee(1, 0, 140, 100)], Vec::new()));
        let mut turret = enemy(10, UnitType::Other(23), 4, 250);
        turret.air_range = Some(Fixed::from_num(7));
        turret.is_detector = true;
        turret.is_structure = true;
        let world = scene(vec![banshee(1, 0, 140, 100)], vec![turret]);

        let cooldowns = CooldownTracker::new(8);
        let action = roster.control(
            &world.units[0],
            Vec2Fixed::from_ints(100, 0),
            &world,
            &cooldowns,
        );
        assert_eq!(action, Some(Action::move_to(Vec2Fixed::from_ints(-5, 0))));
    }

    #[test]
    fn test_empty_target_exhausts_roster() {
        let mut roster = roster();
        let mut cooldowns = CooldownTracker::new(8);
        let target = Vec2Fixed::from_ints(100, 0);
        let world = scene(
            vec![banshee(1, 100, 140, 100)],
            vec![enemy(10, UnitType::CommandCenter, 104, 100)],
        );

        let out = roster.tick(&world, Some(target), &mut cooldowns);
        assert!(out.actions.is_empty());
        assert!(roster.is_exhausted());

        let out = roster.tick(&world, Some(target), &mut cooldowns);
        assert_eq!(out.released, vec![1]);
    }
}
