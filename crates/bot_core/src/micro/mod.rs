//! Combat micro engine.
//!
//! Every controlled unit gets one decision per tick. The engine looks up the
//! tactical policy registered for the unit's kind (falling back to
//! [`GenericPolicy`]), applies the retreat gate, lets the policy resolve the
//! commanded action, and drops the result if the unit is already doing
//! exactly that.
//!
//! Policies own their per-unit state keyed by tag and evict it explicitly
//! when a unit or its target leaves the snapshot.

pub mod cloak;
pub mod generic;
pub mod geometry;
pub mod harass;
pub mod hit_and_run;
pub mod lock_on;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{AbilityId, Action, UnitAction};
use crate::config::MicroConfig;
use crate::cooldown::CooldownTracker;
use crate::error::Result;
use crate::snapshot::{BattlefieldView, CombatUnit, EnemyUnit, Tag};
use crate::unit_type::UnitType;

pub use cloak::{CloakMode, CloakPolicy};
pub use generic::GenericPolicy;
pub use harass::{HarassOutput, HarassRoster};
pub use hit_and_run::HitAndRunPolicy;
pub use lock_on::{LockOnPolicy, LockPhase};

/// Why a unit has been given its command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MoveType {
    /// Engage at the target.
    #[default]
    Assault,
    /// Raid economy.
    Harass,
    /// Advance carefully.
    Push,
    /// Fall back in order.
    DefensiveRetreat,
    /// Run.
    PanicRetreat,
}

impl MoveType {
    /// Retreating units pass their command through untouched.
    #[must_use]
    pub const fn is_retreat(self) -> bool {
        matches!(self, Self::DefensiveRetreat | Self::PanicRetreat)
    }
}

/// The command an outer layer (army, squad) has given a unit this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCommand {
    /// Unit being commanded.
    pub tag: Tag,
    /// What it was told to do.
    pub action: Action,
    /// Why.
    pub move_type: MoveType,
}

impl UnitCommand {
    /// Create a command.
    #[must_use]
    pub const fn new(tag: Tag, action: Action, move_type: MoveType) -> Self {
        Self {
            tag,
            action,
            move_type,
        }
    }
}

/// Read-only context handed to a policy for one decision.
#[derive(Clone, Copy)]
pub struct MicroContext<'a> {
    /// Current snapshot.
    pub world: &'a dyn BattlefieldView,
    /// Ability readiness.
    pub cooldowns: &'a CooldownTracker,
    /// Tuning.
    pub config: &'a MicroConfig,
    /// Why the unit is moving.
    pub move_type: MoveType,
}

impl<'a> MicroContext<'a> {
    /// Current game tick.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.world.game_loop()
    }

    /// Enemies within the configured nearby radius of `unit`.
    #[must_use]
    pub fn enemies_near(&self, unit: &CombatUnit) -> Vec<&'a EnemyUnit> {
        self.world
            .enemies_within(unit.position, self.config.nearby_radius)
    }

    /// Whether `tag` may use `ability` now.
    #[must_use]
    pub fn is_ready(&self, tag: Tag, ability: AbilityId) -> bool {
        self.cooldowns.is_ready(self.world, tag, ability)
    }
}

/// Per-unit-kind tactical behaviour.
pub trait TacticalPolicy: std::fmt::Debug {
    /// Turn the commanded action into what the unit should actually do.
    fn resolve(&mut self, unit: &CombatUnit, current: Action, ctx: &MicroContext<'_>) -> Action;

    /// Whether the unit should abandon the fight.
    ///
    /// The default compares combined health and shield against the
    /// configured retreat ratio.
    fn should_retreat(&self, unit: &CombatUnit, ctx: &MicroContext<'_>) -> bool {
        unit.vitals.ratio() < ctx.config.retreat_ratio
    }

    /// Evict state for units or targets no longer in `world`.
    fn retain_units(&mut self, _world: &dyn BattlefieldView) {}

    /// Serialized policy state, for determinism checks.
    fn encode_state(&self) -> Result<Vec<u8>> {
        Ok(Vec::new())
    }
}

/// Strategy table from unit kind to policy.
#[derive(Debug)]
pub struct MicroEngine {
    config: MicroConfig,
    policies: BTreeMap<UnitType, Box<dyn TacticalPolicy>>,
    fallback: GenericPolicy,
}

impl MicroEngine {
    /// Engine with no specialised policies.
    #[must_use]
    pub fn new(config: MicroConfig) -> Self {
        Self {
            config,
            policies: BTreeMap::new(),
            fallback: GenericPolicy,
        }
    }

    /// Engine with the bind, hit-and-run and cloak policies registered.
    #[must_use]
    pub fn with_default_policies(config: MicroConfig) -> Self {
        let mut engine = Self::new(config);
        engine.register(UnitType::Cyclone, Box::new(LockOnPolicy::new()));
        engine.register(UnitType::Hellion, Box::new(HitAndRunPolicy));
        engine.register(UnitType::Banshee, Box::new(CloakPolicy::new()));
        engine
    }

    /// Register `policy` for `kind`, returning any policy it replaces.
    pub fn register(
        &mut self,
        kind: UnitType,
        policy: Box<dyn TacticalPolicy>,
    ) -> Option<Box<dyn TacticalPolicy>> {
        self.policies.insert(kind, policy)
    }

    /// Whether a specialised policy is registered for `kind`.
    #[must_use]
    pub fn has_policy(&self, kind: UnitType) -> bool {
        self.policies.contains_key(&kind)
    }

    /// Tuning in use.
    #[must_use]
    pub fn config(&self) -> &MicroConfig {
        &self.config
    }

    /// Decide one unit's action, before idempotency filtering.
    pub fn decide(
        &mut self,
        unit: &CombatUnit,
        command: &UnitCommand,
        world: &dyn BattlefieldView,
        cooldowns: &CooldownTracker,
    ) -> Action {
        let ctx = MicroContext {
            world,
            cooldowns,
            config: &self.config,
            move_type: command.move_type,
        };
        let policy: &mut dyn TacticalPolicy = match self.policies.get_mut(&unit.kind) {
            Some(policy) => policy.as_mut(),
            None => &mut self.fallback,
        };

        if !command.move_type.is_retreat() && policy.should_retreat(unit, &ctx) {
            tracing::debug!(unit = unit.tag, kind = ?unit.kind, "Retreating");
            return Action::move_to(world.start_location());
        }
        policy.resolve(unit, command.action, &ctx)
    }

    /// Decide every commanded unit's action for this tick.
    ///
    /// Commands for units missing from `world` are dropped. Actions that are
    /// already in effect are suppressed, and casts that survive are
    /// recorded in `cooldowns`.
    pub fn tick(
        &mut self,
        world: &dyn BattlefieldView,
        cooldowns: &mut CooldownTracker,
        commands: &[UnitCommand],
    ) -> Vec<UnitAction> {
        cooldowns.prune(world);
        for policy in self.policies.values_mut() {
            policy.retain_units(world);
        }

        let mut actions = Vec::with_capacity(commands.len());
        for command in commands {
            let Some(unit) = world.unit(command.tag) else {
                tracing::debug!(unit = command.tag, "Command for unknown unit");
                continue;
            };
            let action = self.decide(unit, command, world, cooldowns);
            if let Some(issued) = commit(unit, action, cooldowns, world.game_loop()) {
                actions.push(issued);
            }
        }
        actions
    }

    /// Serialized state of every registered policy, in kind order.
    pub fn encode_state(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        for policy in self.policies.values() {
            bytes.extend(policy.encode_state()?);
        }
        Ok(bytes)
    }
}

/// Drop actions already in effect and remember casts that go out.
pub(crate) fn commit(
    unit: &CombatUnit,
    action: Action,
    cooldowns: &mut CooldownTracker,
    now: u64,
) -> Option<UnitAction> {
    if action.is_in_effect(unit.order.as_ref()) {
        tracing::trace!(unit = unit.tag, "Action already in effect");
        return None;
    }
    if let Some(ability) = action.ability.filter(|ability| ability.is_cast()) {
        cooldowns.record_cast(unit.tag, ability, now);
    }
    Some(UnitAction::new(unit.tag, action))
}
