//! Hit-and-run behaviour for fast, fragile raiders.

use super::geometry::{
    closest_threat, kite_position, nearest, select_opportunistic_target, threat_range,
};
use super::{MicroContext, TacticalPolicy};
use crate::action::Action;
use crate::math::Fixed;
use crate::snapshot::{CombatUnit, EnemyUnit};

/// Stays just outside enemy range, shoots when reloaded, chases workers.
///
/// Never attack-moves on its own: with no enemy army nearby the command is
/// downgraded to a plain move so the unit does not stop to shoot buildings.
#[derive(Debug, Clone, Copy, Default)]
pub struct HitAndRunPolicy;

impl TacticalPolicy for HitAndRunPolicy {
    fn resolve(&mut self, unit: &CombatUnit, current: Action, ctx: &MicroContext<'_>) -> Action {
        if ctx.move_type.is_retreat() {
            return current;
        }
        let config = &ctx.config.hit_and_run;
        let army: Vec<&EnemyUnit> = ctx
            .enemies_near(unit)
            .into_iter()
            .filter(|enemy| !enemy.is_structure)
            .collect();

        let threats: Vec<&EnemyUnit> = army
            .iter()
            .copied()
            .filter(|enemy| {
                let range = threat_range(enemy, unit);
                range > Fixed::ZERO
                    && unit.position.distance(enemy.position) <= range + config.threat_buffer
            })
            .collect();
        if let Some(threat) = closest_threat(unit, &threats) {
            let safe = threat_range(threat, unit) + config.safe_buffer;
            if unit.position.distance(threat.position) <= safe {
                return Action::move_to(kite_position(
                    unit.position,
                    threat.position,
                    safe + Fixed::ONE,
                    current.target_position(),
                ));
            }
        }

        if unit.weapon_ready {
            if let Some(target) = select_opportunistic_target(unit, &army) {
                return Action::attack(target.tag);
            }
        }

        let workers: Vec<&EnemyUnit> = army
            .iter()
            .copied()
            .filter(|enemy| {
                enemy.kind.is_worker()
                    && unit.position.distance(enemy.position) <= config.worker_pursuit_range
            })
            .collect();
        if let Some(worker) = nearest(unit.position, &workers) {
            return Action::follow(worker.tag);
        }

        Action::new(current.target, false, None)
    }
}
