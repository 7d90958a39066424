//! Structure self-preservation.
//!
//! Liftable structures that are losing health fast take off, fly away from
//! anti-air, and land again once the sky is clear. Each airborne structure
//! has a [`StructureFlight`] record keyed by tag. The record is removed when
//! the structure lands, disappears from the snapshot, or never leaves the
//! ground after a lift order, and so is its landing reservation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{AbilityId, Action, ActionTarget, UnitAction};
use crate::config::LiftConfig;
use crate::error::{BotError, Result};
use crate::math::{Fixed, Vec2Fixed};
use crate::micro::geometry::escape_direction;
use crate::snapshot::{BattlefieldView, EnemyUnit, OwnStructure, Tag};

/// Whether `structure` should lift off.
///
/// True only for a finished structure whose health dropped since the last
/// tick and is now below `fraction` of its maximum.
#[must_use]
pub fn is_in_danger(structure: &OwnStructure, fraction: Fixed) -> bool {
    structure.is_ready()
        && structure
            .previous_health
            .is_some_and(|previous| structure.health < previous)
        && structure.health < structure.health_max * fraction
}

/// Flight record of a lifted structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructureFlight {
    /// Where it stood before lifting.
    pub origin: Vec2Fixed,
    /// Tick the lift order went out.
    pub lifted_at: u64,
    /// Landing point currently chosen.
    pub landing: Option<Vec2Fixed>,
    /// Whether the land order has gone out for `landing`.
    pub land_issued: bool,
    /// Whether anti-air was in reach on the last tick.
    pub in_danger: bool,
}

/// Lifts structures out of danger and lands them again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiftController {
    config: LiftConfig,
    flights: BTreeMap<Tag, StructureFlight>,
    reservations: BTreeMap<Tag, Vec2Fixed>,
}

impl LiftController {
    /// Controller with nothing in the air.
    #[must_use]
    pub fn new(config: LiftConfig) -> Self {
        Self {
            config,
            flights: BTreeMap::new(),
            reservations: BTreeMap::new(),
        }
    }

    /// Flight record of `tag`, if it has lifted.
    #[must_use]
    pub fn flight(&self, tag: Tag) -> Option<&StructureFlight> {
        self.flights.get(&tag)
    }

    /// Landing point reserved by `tag`.
    #[must_use]
    pub fn reservation(&self, tag: Tag) -> Option<Vec2Fixed> {
        self.reservations.get(&tag).copied()
    }

    /// Number of tracked flights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.flights.len()
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }

    /// Decide lift, flee and landing orders for this tick.
    pub fn tick(&mut self, world: &dyn BattlefieldView) -> Vec<UnitAction> {
        self.evict_missing(world);

        let mut actions = Vec::new();
        for structure in world.structures() {
            if !structure.kind.is_liftable() {
                continue;
            }
            match self.flights.get(&structure.tag).copied() {
                None if !structure.is_flying => {
                    if is_in_danger(structure, self.config.danger_fraction) {
                        self.lift(structure, world.game_loop(), &mut actions);
                    }
                }
                None => {}
                Some(flight) if !structure.is_flying => {
                    if flight.land_issued {
                        tracing::info!(
                            structure = structure.tag,
                            kind = ?structure.kind,
                            "Structure landed"
                        );
                        self.flights.remove(&structure.tag);
                        self.reservations.remove(&structure.tag);
                    } else if self.lift_stalled(structure, &flight, world.game_loop()) {
                        tracing::warn!(
                            structure = structure.tag,
                            kind = ?structure.kind,
                            "Structure never lifted"
                        );
                        self.flights.remove(&structure.tag);
                        self.reservations.remove(&structure.tag);
                        if is_in_danger(structure, self.config.danger_fraction) {
                            self.lift(structure, world.game_loop(), &mut actions);
                        }
                    }
                }
                Some(_) => {
                    if let Some(action) = self.fly(structure, world) {
                        if !action.is_in_effect(structure.order.as_ref()) {
                            actions.push(UnitAction::new(structure.tag, action));
                        }
                    }
                }
            }
        }
        actions
    }

    fn evict_missing(&mut self, world: &dyn BattlefieldView) {
        self.flights.retain(|&tag, _| {
            let present = world.structure(tag).is_some();
            if !present {
                tracing::debug!(structure = tag, "Lifted structure lost");
            }
            present
        });
        let flights = &self.flights;
        self.reservations.retain(|tag, _| flights.contains_key(tag));
    }

    /// Grounded past the timeout and not busy lifting.
    fn lift_stalled(&self, structure: &OwnStructure, flight: &StructureFlight, now: u64) -> bool {
        let lifting = structure
            .order
            .is_some_and(|order| order.ability == AbilityId::Lift);
        !lifting && now.saturating_sub(flight.lifted_at) > self.config.lift_timeout_ticks
    }

    fn lift(&mut self, structure: &OwnStructure, now: u64, actions: &mut Vec<UnitAction>) {
        tracing::info!(
            structure = structure.tag,
            kind = ?structure.kind,
            health = %structure.health,
            "Lifting structure out of danger"
        );
        if !structure.is_idle {
            actions.push(UnitAction::new(
                structure.tag,
                Action::ability(AbilityId::CancelLast),
            ));
            actions.push(UnitAction::new(structure.tag, Action::ability(AbilityId::Stop)));
        }
        actions.push(UnitAction::new(structure.tag, Action::ability(AbilityId::Lift)));
        self.flights.insert(
            structure.tag,
            StructureFlight {
                origin: structure.position,
                lifted_at: now,
                landing: None,
                land_issued: false,
                in_danger: true,
            },
        );
    }

    fn fly(&mut self, structure: &OwnStructure, world: &dyn BattlefieldView) -> Option<Action> {
        let threats: Vec<&EnemyUnit> = world
            .enemies_within(structure.position, self.config.threat_radius)
            .into_iter()
            .filter(|enemy| enemy.can_attack_air())
            .collect();

        let flight = self.flights.get_mut(&structure.tag)?;
        flight.in_danger = !threats.is_empty();

        if let Some(center) = Vec2Fixed::centroid(threats.iter().map(|enemy| enemy.position)) {
            flight.land_issued = false;
            let away = escape_direction(structure.position, center, Some(world.start_location()));
            let flee = structure.position + away.scale(self.config.flee_step);
            return Some(Action::move_to(world.map_bounds().clamp(flee)));
        }

        let origin = flight.origin;
        let Some(site) = self.landing_site(structure, origin, world) else {
            self.reservations.remove(&structure.tag);
            return self.drift_home(structure, world);
        };

        self.reservations.insert(structure.tag, site);
        let flight = self.flights.get_mut(&structure.tag)?;
        if flight.landing != Some(site) {
            flight.landing = Some(site);
            flight.land_issued = false;
        }

        if structure.position.distance(site) > self.config.approach_distance {
            return Some(Action::move_to(site));
        }
        if flight.land_issued {
            return None;
        }
        tracing::debug!(structure = structure.tag, "Landing structure");
        flight.land_issued = true;
        Some(Action::ability_on(
            AbilityId::Land,
            ActionTarget::Position(site),
            false,
        ))
    }

    /// Origin if clear, otherwise the first clear site nobody else holds.
    fn landing_site(
        &self,
        structure: &OwnStructure,
        origin: Vec2Fixed,
        world: &dyn BattlefieldView,
    ) -> Option<Vec2Fixed> {
        if self.is_clear(structure.tag, origin, world) {
            return Some(origin);
        }
        world.landing_sites().iter().copied().find(|&site| {
            let held = self
                .reservations
                .iter()
                .any(|(&other, &reserved)| other != structure.tag && reserved == site);
            !held && self.is_clear(structure.tag, site, world)
        })
    }

    fn is_clear(&self, tag: Tag, site: Vec2Fixed, world: &dyn BattlefieldView) -> bool {
        let clearance_sq = self.config.landing_clearance * self.config.landing_clearance;
        !world.structures().iter().any(|other| {
            other.tag != tag
                && !other.is_flying
                && other.position.distance_squared(site) < clearance_sq
        })
    }

    fn drift_home(&self, structure: &OwnStructure, world: &dyn BattlefieldView) -> Option<Action> {
        let start = world.start_location();
        if structure.health >= structure.health_max * self.config.drift_health
            || structure.position == start
        {
            return None;
        }
        let step = structure.position.towards(start, self.config.drift_step);
        Some(Action::move_to(world.map_bounds().clamp(step)))
    }

    /// Serialized flight and reservation stores, for determinism checks.
    pub fn encode_state(&self) -> Result<Vec<u8>> {
        bincode::serialize(&(&self.flights, &self.reservations))
            .map_err(|e| BotError::StateEncoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Order, Vitals, WorldSnapshot};
    use crate::unit_type::UnitType;

    fn barracks(tag: Tag, x: i32, health: i32, previous: Option<i32>) -> OwnStructure {
        OwnStructure {
            tag,
            kind: UnitType::Barracks,
            position: Vec2Fixed::from_ints(x, 50),
            health: Fixed::from_num(health),
            health_max: Fixed::from_num(1000),
            previous_health: previous.map(Fixed::from_num),
            build_progress: Fixed::ONE,
            is_idle: true,
            is_flying: false,
            addon: None,
            order: None,
        }
    }

    fn flying(mut structure: OwnStructure) -> OwnStructure {
        structure.is_flying = true;
        structure
    }

    fn viking(tag: Tag, x: i32, y: i32) -> EnemyUnit {
        EnemyUnit {
            tag,
            kind: UnitType::VikingFighter,
            position: Vec2Fixed::from_ints(x, y),
            vitals: Vitals::health_only(Fixed::from_num(135), Fixed::from_num(135)),
            ground_range: None,
            air_range: Some(Fixed::from_num(9)),
            is_detector: false,
            is_structure: false,
            is_flying: true,
        }
    }

    fn scene(structures: Vec<OwnStructure>, enemies: Vec<EnemyUnit>) -> WorldSnapshot {
        WorldSnapshot {
            game_loop: 300,
            structures,
            enemies,
            start_location: Vec2Fixed::from_ints(20, 50),
            landing_sites: vec![Vec2Fixed::from_ints(60, 60), Vec2Fixed::from_ints(70, 70)],
            ..WorldSnapshot::default()
        }
    }

    fn controller() -> LiftController {
        LiftController::new(LiftConfig::default())
    }

    #[test]
    fn test_danger_rule() {
        let fraction = Fixed::from_num(0.4);
        assert!(is_in_danger(&barracks(1, 50, 300, Some(500)), fraction));
        assert!(!is_in_danger(&barracks(1, 50, 300, Some(300)), fraction));
        assert!(!is_in_danger(&barracks(1, 50, 600, Some(700)), fraction));
        assert!(!is_in_danger(&barracks(1, 50, 300, None), fraction));

        let mut unfinished = barracks(1, 50, 300, Some(500));
        unfinished.build_progress = Fixed::from_num(0.5);
        assert!(!is_in_danger(&unfinished, fraction));
    }

    #[test]
    fn test_idle_structure_lifts() {
        let mut lift = controller();
        let actions = lift.tick(&scene(vec![barracks(1, 50, 300, Some(500))], Vec::new()));
        assert_eq!(actions, vec![UnitAction::new(1, Action::ability(AbilityId::Lift))]);
        assert_eq!(lift.flight(1).map(|f| f.origin), Some(Vec2Fixed::from_ints(50, 50)));
    }

    #[test]
    fn test_busy_structure_cancels_before_lifting() {
        let mut lift = controller();
        let mut busy = barracks(1, 50, 300, Some(500));
        busy.is_idle = false;
        let abilities: Vec<_> = lift
            .tick(&scene(vec![busy], Vec::new()))
            .into_iter()
            .map(|a| a.action.ability)
            .collect();
        assert_eq!(
            abilities,
            vec![
                Some(AbilityId::CancelLast),
                Some(AbilityId::Stop),
                Some(AbilityId::Lift)
            ]
        );
    }

    #[test]
    fn test_flees_from_anti_air_centroid() {
        let mut lift = controller();
        lift.tick(&scene(vec![barracks(1, 50, 300, Some(500))], Vec::new()));

        let world = scene(
            vec![flying(barracks(1, 50, 290, Some(300)))],
            vec![viking(8, 54, 48), viking(9, 54, 52)],
        );
        let actions = lift.tick(&world);
        assert_eq!(
            actions,
            vec![UnitAction::new(1, Action::move_to(Vec2Fixed::from_ints(42, 50)))]
        );
        assert_eq!(lift.flight(1).map(|f| f.in_danger), Some(true));
    }

    #[test]
    fn test_flee_target_clamped_to_map() {
        let mut lift = controller();
        lift.tick(&scene(vec![barracks(1, 2, 300, Some(500))], Vec::new()));
        let world = scene(vec![flying(barracks(1, 2, 290, Some(300)))], vec![viking(8, 6, 50)]);
        let actions = lift.tick(&world);
        assert_eq!(
            actions,
            vec![UnitAction::new(1, Action::move_to(Vec2Fixed::from_ints(0, 50)))]
        );
    }

    #[test]
    fn test_lands_at_origin_once_then_forgets() {
        let mut lift = controller();
        lift.tick(&scene(vec![barracks(1, 50, 300, Some(500))], Vec::new()));

        let mut airborne = flying(barracks(1, 50, 300, Some(300)));
        airborne.position = Vec2Fixed::from_ints(51, 50);
        let world = scene(vec![airborne.clone()], Vec::new());
        let land = Action::ability_on(
            AbilityId::Land,
            ActionTarget::Position(Vec2Fixed::from_ints(50, 50)),
            false,
        );
        assert_eq!(lift.tick(&world), vec![UnitAction::new(1, land)]);
        assert!(lift.tick(&world).is_empty());
        assert_eq!(lift.reservation(1), Some(Vec2Fixed::from_ints(50, 50)));

        airborne.is_flying = false;
        lift.tick(&scene(vec![airborne], Vec::new()));
        assert!(lift.is_empty());
        assert_eq!(lift.reservation(1), None);
    }

    #[test]
    fn test_far_from_site_approaches_with_move() {
        let mut lift = controller();
        lift.tick(&scene(vec![barracks(1, 50, 300, Some(500))], Vec::new()));
        let mut airborne = flying(barracks(1, 50, 300, Some(300)));
        airborne.position = Vec2Fixed::from_ints(40, 50);
        airborne.order = Some(Order {
            ability: AbilityId::Move,
            target: ActionTarget::Position(Vec2Fixed::from_ints(50, 50)),
        });
        assert!(lift.tick(&scene(vec![airborne.clone()], Vec::new())).is_empty());

        airborne.order = None;
        assert_eq!(
            lift.tick(&scene(vec![airborne], Vec::new())),
            vec![UnitAction::new(1, Action::move_to(Vec2Fixed::from_ints(50, 50)))]
        );
    }

    #[test]
    fn test_blocked_origin_uses_unreserved_site() {
        let mut lift = controller();
        lift.tick(&scene(
            vec![barracks(1, 50, 300, Some(500)), barracks(2, 80, 300, Some(500))],
            Vec::new(),
        ));

        let mut blocker = barracks(3, 50, 1000, Some(1000));
        blocker.kind = UnitType::SupplyDepot;
        let mut second_blocker = barracks(4, 80, 1000, Some(1000));
        second_blocker.kind = UnitType::SupplyDepot;
        let world = scene(
            vec![
                flying(barracks(1, 50, 300, Some(300))),
                flying(barracks(2, 80, 300, Some(300))),
                blocker,
                second_blocker,
            ],
            Vec::new(),
        );
        lift.tick(&world);
        assert_eq!(lift.reservation(1), Some(Vec2Fixed::from_ints(60, 60)));
        assert_eq!(lift.reservation(2), Some(Vec2Fixed::from_ints(70, 70)));
    }

    #[test]
    fn test_destroyed_structure_evicted() {
        let mut lift = controller();
        lift.tick(&scene(vec![barracks(1, 50, 300, Some(500))], Vec::new()));
        assert_eq!(lift.len(), 1);
        assert!(lift.tick(&scene(Vec::new(), Vec::new())).is_empty());
        assert!(lift.is_empty());
    }

    #[test]
    fn test_no_site_and_low_health_drifts_home() {
        let mut lift = controller();
        let world = WorldSnapshot {
            landing_sites: Vec::new(),
            ..scene(vec![barracks(1, 50, 300, Some(500))], Vec::new())
        };
        lift.tick(&world);

        let mut blocker = barracks(3, 50, 1000, Some(1000));
        blocker.kind = UnitType::SupplyDepot;
        let world = WorldSnapshot {
            landing_sites: Vec::new(),
            ..scene(vec![flying(barracks(1, 50, 300, Some(300))), blocker], Vec::new())
        };
        assert_eq!(
            lift.tick(&world),
            vec![UnitAction::new(1, Action::move_to(Vec2Fixed::from_ints(45, 50)))]
        );
    }
}
