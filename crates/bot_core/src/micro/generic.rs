//! Fallback policy for kinds without specialised behaviour.

use super::geometry::select_opportunistic_target;
use super::{MicroContext, TacticalPolicy};
use crate::action::Action;
use crate::snapshot::{CombatUnit, EnemyUnit};

/// Shoots the best target in range when the weapon is ready, otherwise
/// follows the command.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenericPolicy;

impl GenericPolicy {
    /// Opportunistic attack against `enemies`, or `current`.
    #[must_use]
    pub fn engage(unit: &CombatUnit, enemies: &[&EnemyUnit], current: Action) -> Action {
        if !unit.weapon_ready {
            return current;
        }
        select_opportunistic_target(unit, enemies)
            .map_or(current, |target| Action::attack(target.tag))
    }
}

impl TacticalPolicy for GenericPolicy {
    fn resolve(&mut self, unit: &CombatUnit, current: Action, ctx: &MicroContext<'_>) -> Action {
        if ctx.move_type.is_retreat() {
            return current;
        }
        Self::engage(unit, &ctx.enemies_near(unit), current)
    }
}
