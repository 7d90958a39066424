//! Cloak toggling for units that can turn invisible.
//!
//! A unit should be cloaked only while something nearby can shoot it and
//! nothing nearby can see through the cloak. Toggle commands are issued once
//! per transition: the requested mode is remembered until the host reports
//! the unit in that mode or the wanted mode changes. Cloaking also waits for
//! the host to report `CloakOn` ready; decloaking is always available.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::geometry::nearest;
use super::{MicroContext, TacticalPolicy};
use crate::action::{AbilityId, Action};
use crate::error::{BotError, Result};
use crate::snapshot::{BattlefieldView, CombatUnit, EnemyUnit, Tag};

/// Visibility mode of a cloaking unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloakMode {
    /// Invisible to non-detectors.
    Cloaked,
    /// Visible.
    Visible,
}

impl CloakMode {
    /// Mode the host currently reports for `unit`.
    #[must_use]
    pub const fn of(unit: &CombatUnit) -> Self {
        if unit.is_cloaked {
            Self::Cloaked
        } else {
            Self::Visible
        }
    }

    /// Ability that switches a unit into this mode.
    #[must_use]
    pub const fn ability(self) -> AbilityId {
        match self {
            Self::Cloaked => AbilityId::CloakOn,
            Self::Visible => AbilityId::CloakOff,
        }
    }
}

/// Mode the unit should be in given the enemies around it.
#[must_use]
pub fn desired_mode(enemies: &[&EnemyUnit]) -> CloakMode {
    let anti_air = enemies.iter().any(|enemy| enemy.can_attack_air());
    let detected = enemies.iter().any(|enemy| enemy.is_detector);
    if anti_air && !detected {
        CloakMode::Cloaked
    } else {
        CloakMode::Visible
    }
}

/// Cloak state machine plus attack/move selection for cloaking raiders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloakPolicy {
    requests: BTreeMap<Tag, CloakMode>,
}

impl CloakPolicy {
    /// Policy with no pending requests.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mode last requested for `tag` and not yet confirmed.
    #[must_use]
    pub fn pending(&self, tag: Tag) -> Option<CloakMode> {
        self.requests.get(&tag).copied()
    }

    /// The toggle `unit` needs, if any.
    ///
    /// Returns `None` when the unit is already in the wanted mode, the same
    /// toggle is still pending, or `cloak_ready` is false and the unit
    /// should cloak. A pending toggle is never repeated while the world
    /// stays the same.
    pub fn toggle(
        &mut self,
        unit: &CombatUnit,
        enemies: &[&EnemyUnit],
        cloak_ready: bool,
    ) -> Option<Action> {
        let desired = desired_mode(enemies);
        if desired == CloakMode::of(unit) {
            self.requests.remove(&unit.tag);
            return None;
        }
        if self.requests.get(&unit.tag) == Some(&desired) {
            return None;
        }
        if desired == CloakMode::Cloaked && !cloak_ready {
            return None;
        }

        tracing::debug!(unit = unit.tag, mode = ?desired, "Toggling cloak");
        self.requests.insert(unit.tag, desired);
        Some(Action::ability(desired.ability()))
    }

    /// Forget requests for units missing from `world`.
    pub fn evict_missing(&mut self, world: &dyn BattlefieldView) {
        self.requests.retain(|&tag, _| world.unit(tag).is_some());
    }
}

impl TacticalPolicy for CloakPolicy {
    fn resolve(&mut self, unit: &CombatUnit, current: Action, ctx: &MicroContext<'_>) -> Action {
        let scanned = ctx
            .world
            .enemies_within(unit.position, ctx.config.cloak.scan_radius);
        let cloak_ready = ctx.is_ready(unit.tag, AbilityId::CloakOn);
        if let Some(toggle) = self.toggle(unit, &scanned, cloak_ready) {
            return toggle;
        }

        if ctx.move_type.is_retreat() {
            return current;
        }

        let is_attack = nearest(unit.position, &ctx.enemies_near(unit))
            .is_some_and(|enemy| !enemy.is_structure);
        Action::new(current.target, is_attack, current.ability)
    }

    fn retain_units(&mut self, world: &dyn BattlefieldView) {
        self.evict_missing(world);
    }

    fn encode_state(&self) -> Result<Vec<u8>> {
        bincode::serialize(&self.requests).map_err(|e| BotError::StateEncoding(e.to_string()))
    }
}
