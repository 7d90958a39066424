//! Bind-and-kite behaviour for units with a lock-on ability.
//!
//! Each unit moves through `Idle -> Seeking -> Locked -> Idle`. Idle units
//! have no entry in the binding store; the entry is removed as soon as the
//! bound target can no longer be resolved or the active window runs out.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::generic::GenericPolicy;
use super::geometry::{
    closest_threat, kite_position, max_threat_range, nearest, select_opportunistic_target,
    threat_range,
};
use super::{MicroContext, TacticalPolicy};
use crate::action::{AbilityId, Action, ActionTarget};
use crate::config::LockOnConfig;
use crate::error::{BotError, Result};
use crate::math::Fixed;
use crate::snapshot::{BattlefieldView, CombatUnit, EnemyUnit, Tag};

/// Where a unit is in its bind cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LockPhase {
    /// No binding.
    #[default]
    Idle,
    /// Lock-on cast issued, not yet confirmed by the host.
    Seeking {
        /// Enemy being bound.
        target: Tag,
        /// Tick the cast went out.
        cast_at: u64,
    },
    /// Binding active.
    Locked {
        /// Bound enemy.
        target: Tag,
        /// Tick the lock was confirmed.
        locked_at: u64,
    },
}

impl LockPhase {
    /// Bound or sought target, if any.
    #[must_use]
    pub const fn target(self) -> Option<Tag> {
        match self {
            Self::Idle => None,
            Self::Seeking { target, .. } | Self::Locked { target, .. } => Some(target),
        }
    }
}

/// Per-unit lock-on state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockOnPolicy {
    bindings: BTreeMap<Tag, LockPhase>,
}

impl LockOnPolicy {
    /// Policy with no bindings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase of `tag`.
    #[must_use]
    pub fn phase(&self, tag: Tag) -> LockPhase {
        self.bindings.get(&tag).copied().unwrap_or_default()
    }

    /// Number of units with a live binding.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether no unit has a binding.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Apply transitions driven by the snapshot and return the new phase.
    fn advance(&mut self, unit: &CombatUnit, ctx: &MicroContext<'_>) -> LockPhase {
        let now = ctx.now();
        let config = &ctx.config.lock_on;
        let lock_held = ctx.world.ability_ready(unit.tag, AbilityId::CancelLockOn);

        let next = match self.phase(unit.tag) {
            LockPhase::Idle => LockPhase::Idle,
            LockPhase::Seeking { target, .. } if ctx.world.enemy(target).is_none() => {
                tracing::debug!(unit = unit.tag, target, "Lock-on target lost before bind");
                LockPhase::Idle
            }
            LockPhase::Seeking { target, .. } if lock_held => LockPhase::Locked {
                target,
                locked_at: now,
            },
            LockPhase::Seeking { cast_at, .. }
                if now.saturating_sub(cast_at) > ctx.config.cast_grace_ticks =>
            {
                LockPhase::Idle
            }
            LockPhase::Locked { target, .. } if ctx.world.enemy(target).is_none() => {
                tracing::debug!(unit = unit.tag, target, "Bound target lost");
                LockPhase::Idle
            }
            LockPhase::Locked { locked_at, .. }
                if now.saturating_sub(locked_at) >= config.active_window_ticks || !lock_held =>
            {
                LockPhase::Idle
            }
            phase => phase,
        };

        if next == LockPhase::Idle {
            self.bindings.remove(&unit.tag);
        } else {
            self.bindings.insert(unit.tag, next);
        }
        next
    }
}

/// Distance to keep from a bound target.
///
/// The preferred distance shrinks to stay inside the maintenance range, but
/// never below the target's own range against the unit.
#[must_use]
pub fn stand_off_distance(config: &LockOnConfig, target_range: Fixed) -> Fixed {
    config
        .preferred_distance
        .min(config.active_range - config.leash_margin)
        .max(target_range)
}

fn hold_lock(
    unit: &CombatUnit,
    target: &EnemyUnit,
    enemies: &[&EnemyUnit],
    current: Action,
    config: &LockOnConfig,
) -> Action {
    let fallback_target = current.target_position();

    if let Some(close) = nearest(unit.position, enemies) {
        if unit.position.distance(close.position) < config.min_range {
            return Action::move_to(kite_position(
                unit.position,
                close.position,
                config.min_range + Fixed::ONE,
                fallback_target,
            ));
        }
    }

    let distance = unit.position.distance(target.position);
    let stand_off = stand_off_distance(config, threat_range(target, unit));
    if distance < stand_off {
        return Action::move_to(kite_position(
            unit.position,
            target.position,
            stand_off,
            fallback_target,
        ));
    }
    if distance > config.active_range {
        return Action::follow(target.tag);
    }

    if unit.weapon_ready {
        if let Some(victim) = select_opportunistic_target(unit, enemies) {
            return Action::attack(victim.tag);
        }
    }

    let hold = config.fallback_distance.max(config.min_range + Fixed::ONE);
    match nearest(unit.position, enemies) {
        Some(close) if unit.position.distance(close.position) < hold => Action::move_to(
            kite_position(unit.position, close.position, hold, fallback_target),
        ),
        _ => current,
    }
}

impl TacticalPolicy for LockOnPolicy {
    fn resolve(&mut self, unit: &CombatUnit, current: Action, ctx: &MicroContext<'_>) -> Action {
        if ctx.move_type.is_retreat() {
            return current;
        }
        let config = &ctx.config.lock_on;
        let enemies = ctx.enemies_near(unit);

        let phase = self.advance(unit, ctx);
        if let LockPhase::Locked { target, .. } = phase {
            if let Some(bound) = ctx.world.enemy(target) {
                return hold_lock(unit, bound, &enemies, current, config);
            }
        }

        let Some(close) = nearest(unit.position, &enemies) else {
            return current;
        };
        let distance = unit.position.distance(close.position);
        if distance < config.min_range {
            return Action::move_to(kite_position(
                unit.position,
                close.position,
                config.min_range + Fixed::ONE,
                current.target_position(),
            ));
        }

        if let LockPhase::Seeking { target, .. } = phase {
            return Action::ability_on(AbilityId::LockOn, ActionTarget::Unit(target), true);
        }

        if ctx.is_ready(unit.tag, AbilityId::LockOn) {
            if distance <= config.activation_range {
                tracing::debug!(unit = unit.tag, target = close.tag, "Casting lock-on");
                self.bindings.insert(
                    unit.tag,
                    LockPhase::Seeking {
                        target: close.tag,
                        cast_at: ctx.now(),
                    },
                );
                return Action::ability_on(AbilityId::LockOn, ActionTarget::Unit(close.tag), true);
            }
            return Action::follow(close.tag);
        }

        if let Some(threat) = closest_threat(unit, &enemies) {
            let keep_out = max_threat_range(unit, &enemies) + config.safety_margin;
            if unit.position.distance(threat.position) < keep_out {
                return Action::move_to(kite_position(
                    unit.position,
                    threat.position,
                    keep_out,
                    current.target_position(),
                ));
            }
        }

        GenericPolicy::engage(unit, &enemies, current)
    }

    fn should_retreat(&self, unit: &CombatUnit, ctx: &MicroContext<'_>) -> bool {
        let locked = matches!(self.phase(unit.tag), LockPhase::Locked { .. })
            || ctx.world.ability_ready(unit.tag, AbilityId::CancelLockOn);
        let ratio = if locked {
            ctx.config.lock_on.locked_retreat_ratio
        } else {
            ctx.config.retreat_ratio
        };
        unit.vitals.ratio() < ratio
    }

    fn retain_units(&mut self, world: &dyn BattlefieldView) {
        self.bindings.retain(|&tag, phase| {
            world.unit(tag).is_some() && phase.target().is_some_and(|t| world.enemy(t).is_some())
        });
    }

    fn encode_state(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.bindings).map_err(|e| BotError::StateEncoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MicroConfig;
    use crate::cooldown::CooldownTracker;
    use crate::math::Vec2Fixed;
    use crate::micro::MoveType;
    use crate::snapshot::{Vitals, WorldSnapshot};
    use crate::unit_type::UnitType;

    fn cyclone() -> CombatUnit {
        CombatUnit {
            tag: 1,
            kind: UnitType::Cyclone,
            position: Vec2Fixed::ZERO,
            vitals: Vitals::health_only(Fixed::from_num(120), Fixed::from_num(120)),
            energy: Fixed::ZERO,
            energy_max: Fixed::ZERO,
            ground_range: Some(Fixed::from_num(5)),
            air_range: Some(Fixed::from_num(5)),
            is_flying: false,
            is_cloaked: false,
            weapon_ready: false,
            order: None,
        }
    }

    fn stalker(tag: Tag, x: i32) -> EnemyUnit {
        EnemyUnit {
            tag,
            kind: UnitType::Marine,
            position: Vec2Fixed::from_ints(x, 0),
            vitals: Vitals::health_only(Fixed::from_num(160), Fixed::from_num(160)),
            ground_range: Some(Fixed::from_num(5)),
            air_range: Some(Fixed::from_num(5)),
            is_detector: false,
            is_structure: false,
            is_flying: false,
        }
    }

    fn world(game_loop: u64, enemies: Vec<EnemyUnit>, ready: &[AbilityId]) -> WorldSnapshot {
        let mut world = WorldSnapshot {
            game_loop,
            units: vec![cyclone()],
            enemies,
            ..WorldSnapshot::default()
        };
        world
            .ready_abilities
            .insert(1, ready.iter().copied().collect());
        world
    }

    fn resolve(policy: &mut LockOnPolicy, world: &WorldSnapshot) -> Action {
        let config = MicroConfig::default();
        let cooldowns = CooldownTracker::new(config.cast_grace_ticks);
        let ctx = MicroContext {
            world,
            cooldowns: &cooldowns,
            config: &config,
            move_type: MoveType::Assault,
        };
        let current = Action::attack_move(Vec2Fixed::from_ints(50, 0));
        policy.resolve(&world.units[0], current, &ctx)
    }

    #[test]
    fn test_stand_off_shrinks_to_leash_but_not_below_target_range() {
        let mut config = LockOnConfig::default();
        assert_eq!(stand_off_distance(&config, Fixed::from_num(5)), Fixed::from_num(14));

        config.active_range = Fixed::from_num(10);
        assert_eq!(stand_off_distance(&config, Fixed::from_num(5)), Fixed::from_num(9));
        assert_eq!(stand_off_distance(&config, Fixed::from_num(11)), Fixed::from_num(11));
    }

    #[test]
    fn test_bind_lifecycle() {
        let mut policy = LockOnPolicy::new();

        let action = resolve(&mut policy, &world(100, vec![stalker(9, 6)], &[AbilityId::LockOn]));
        assert_eq!(
            action,
            Action::ability_on(AbilityId::LockOn, ActionTarget::Unit(9), true)
        );
        assert_eq!(policy.phase(1), LockPhase::Seeking { target: 9, cast_at: 100 });

        let action = resolve(
            &mut policy,
            &world(101, vec![stalker(9, 6)], &[AbilityId::CancelLockOn]),
        );
        assert_eq!(policy.phase(1), LockPhase::Locked { target: 9, locked_at: 101 });
        assert_eq!(action, Action::move_to(Vec2Fixed::from_ints(-8, 0)));

        let gone = world(102, Vec::new(), &[AbilityId::CancelLockOn]);
        policy.retain_units(&gone);
        resolve(&mut policy, &gone);
        assert_eq!(policy.phase(1), LockPhase::Idle);
        assert!(policy.is_empty());
    }

    #[test]
    fn test_target_lost_between_ticks_without_retain() {
        let mut policy = LockOnPolicy::new();
        resolve(&mut policy, &world(100, vec![stalker(9, 6)], &[AbilityId::LockOn]));
        resolve(&mut policy, &world(101, vec![stalker(9, 6)], &[AbilityId::CancelLockOn]));

        let action = resolve(
            &mut policy,
            &world(102, vec![stalker(4, 30)], &[AbilityId::CancelLockOn]),
        );
        assert_eq!(policy.phase(1), LockPhase::Idle);
        assert_eq!(action, Action::attack_move(Vec2Fixed::from_ints(50, 0)));
    }

    #[test]
    fn test_active_window_expires() {
        let mut policy = LockOnPolicy::new();
        resolve(&mut policy, &world(100, vec![stalker(9, 6)], &[AbilityId::LockOn]));
        resolve(&mut policy, &world(101, vec![stalker(9, 6)], &[AbilityId::CancelLockOn]));
        let window = LockOnConfig::default().active_window_ticks;

        resolve(
            &mut policy,
            &world(101 + window, vec![stalker(9, 6)], &[AbilityId::CancelLockOn]),
        );
        assert_eq!(policy.phase(1), LockPhase::Idle);
    }

    #[test]
    fn test_unconfirmed_cast_times_out() {
        let mut policy = LockOnPolicy::new();
        resolve(&mut policy, &world(100, vec![stalker(9, 6)], &[AbilityId::LockOn]));
        resolve(&mut policy, &world(200, vec![stalker(9, 6)], &[]));
        assert_eq!(policy.phase(1), LockPhase::Idle);
    }

    #[test]
    fn test_out_of_activation_range_approaches() {
        let mut policy = LockOnPolicy::new();
        let action = resolve(&mut policy, &world(100, vec![stalker(9, 10)], &[AbilityId::LockOn]));
        assert_eq!(action, Action::follow(9));
        assert!(policy.is_empty());
    }

    #[test]
    fn test_on_cooldown_stays_outside_threat_range() {
        let mut policy = LockOnPolicy::new();
        let action = resolve(&mut policy, &world(100, vec![stalker(9, 5)], &[]));
        // Marine range 5 plus the safety margin.
        assert_eq!(action, Action::move_to(Vec2Fixed::from_ints(-1, 0)));
    }

    #[test]
    fn test_on_cooldown_at_keep_out_holds_position() {
        let mut policy = LockOnPolicy::new();
        let action = resolve(&mut policy, &world(100, vec![stalker(9, 6)], &[]));
        assert_eq!(action, Action::attack_move(Vec2Fixed::from_ints(50, 0)));
    }

    #[test]
    fn test_too_close_backs_off_to_min_range() {
        let mut policy = LockOnPolicy::new();
        let action = resolve(&mut policy, &world(100, vec![stalker(9, 3)], &[AbilityId::LockOn]));
        assert_eq!(action, Action::move_to(Vec2Fixed::from_ints(-2, 0)));
        assert!(policy.is_empty());
    }

    #[test]
    fn test_locked_units_retreat_later() {
        let config = MicroConfig::default();
        let cooldowns = CooldownTracker::new(8);
        let mut hurt = world(100, Vec::new(), &[AbilityId::CancelLockOn]);
        hurt.units[0].vitals = Vitals::health_only(Fixed::from_num(24), Fixed::from_num(120));
        let ctx = MicroContext {
            world: &hurt,
            cooldowns: &cooldowns,
            config: &config,
            move_type: MoveType::Assault,
        };
        let policy = LockOnPolicy::new();
        assert!(!policy.should_retreat(&hurt.units[0], &ctx));

        hurt.ready_abilities.clear();
        let ctx = MicroContext {
            world: &hurt,
            cooldowns: &cooldowns,
            config: &config,
            move_type: MoveType::Assault,
        };
        assert!(policy.should_retreat(&hurt.units[0], &ctx));
    }
}
