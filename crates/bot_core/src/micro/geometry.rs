//! Shared threat geometry for tactical policies.
//!
//! All of these are pure functions of positions and ranges. Ties are broken
//! by input order, so identical inputs always pick the same enemy.

use crate::math::{Fixed, Vec2Fixed};
use crate::snapshot::{CombatUnit, EnemyUnit};

/// Unit direction pointing from `threat` to `position`.
///
/// When the two points give no direction the result points from `threat`
/// toward `fallback` instead, and when that is degenerate too it is `+x`.
/// The result is never the zero vector.
#[must_use]
pub fn escape_direction(
    position: Vec2Fixed,
    threat: Vec2Fixed,
    fallback: Option<Vec2Fixed>,
) -> Vec2Fixed {
    let away = (position - threat).normalize();
    if !away.is_zero() {
        return away;
    }

    match fallback.map(|target| (target - threat).normalize()) {
        Some(toward) if !toward.is_zero() => toward,
        _ => Vec2Fixed::UNIT_X,
    }
}

/// Point at `distance` from `threat`, on the side of `position`.
///
/// # Arguments
///
/// * `position` - Where the kiting unit stands
/// * `threat` - What it is kiting from
/// * `distance` - Desired stand-off from `threat`
/// * `fallback` - Used for direction when `position == threat`, typically
///   the unit's current movement target
#[must_use]
pub fn kite_position(
    position: Vec2Fixed,
    threat: Vec2Fixed,
    distance: Fixed,
    fallback: Option<Vec2Fixed>,
) -> Vec2Fixed {
    threat + escape_direction(position, threat, fallback).scale(distance)
}

/// Range at which `enemy` can hit `unit`; zero if it cannot.
#[must_use]
pub fn threat_range(enemy: &EnemyUnit, unit: &CombatUnit) -> Fixed {
    enemy.range_against(unit.is_flying).unwrap_or(Fixed::ZERO)
}

/// Distance to `enemy` minus its range against `unit`.
///
/// Negative values mean the unit is already inside the enemy's range.
#[must_use]
pub fn effective_distance(unit: &CombatUnit, enemy: &EnemyUnit) -> Fixed {
    unit.position.distance(enemy.position) - threat_range(enemy, unit)
}

/// The enemy closest to being able to hit `unit`.
#[must_use]
pub fn closest_threat<'a>(unit: &CombatUnit, enemies: &[&'a EnemyUnit]) -> Option<&'a EnemyUnit> {
    enemies
        .iter()
        .copied()
        .min_by_key(|enemy| effective_distance(unit, enemy))
}

/// The enemy nearest to `position` by raw distance.
#[must_use]
pub fn nearest<'a>(position: Vec2Fixed, enemies: &[&'a EnemyUnit]) -> Option<&'a EnemyUnit> {
    enemies
        .iter()
        .copied()
        .min_by_key(|enemy| position.distance_squared(enemy.position))
}

/// Longest range any of `enemies` has against `unit`.
#[must_use]
pub fn max_threat_range(unit: &CombatUnit, enemies: &[&EnemyUnit]) -> Fixed {
    enemies
        .iter()
        .map(|enemy| threat_range(enemy, unit))
        .max()
        .unwrap_or(Fixed::ZERO)
}

/// Best target among `candidates` inside `unit`'s weapon range.
///
/// Workers come first, nearest worker wins. Otherwise the lowest combined
/// health ratio, ties broken by distance.
#[must_use]
pub fn select_opportunistic_target<'a>(
    unit: &CombatUnit,
    candidates: &[&'a EnemyUnit],
) -> Option<&'a EnemyUnit> {
    let in_range: Vec<&'a EnemyUnit> = candidates
        .iter()
        .copied()
        .filter(|enemy| unit.in_range_of(enemy))
        .collect();

    let workers: Vec<&'a EnemyUnit> = in_range
        .iter()
        .copied()
        .filter(|enemy| enemy.kind.is_worker())
        .collect();
    if let Some(worker) = nearest(unit.position, &workers) {
        return Some(worker);
    }

    in_range.into_iter().min_by_key(|enemy| {
        (
            enemy.vitals.ratio(),
            unit.position.distance_squared(enemy.position),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Vitals;
    use crate::unit_type::UnitType;

    fn own(x: i32, y: i32) -> CombatUnit {
        CombatUnit {
            tag: 1,
            kind: UnitType::Hellion,
            position: Vec2Fixed::from_ints(x, y),
            vitals: Vitals::health_only(Fixed::from_num(90), Fixed::from_num(90)),
            energy: Fixed::ZERO,
            energy_max: Fixed::ZERO,
            ground_range: Some(Fixed::from_num(5)),
            air_range: None,
            is_flying: false,
            is_cloaked: false,
            weapon_ready: true,
            order: None,
        }
    }

    fn enemy(tag: u64, kind: UnitType, x: i32, range: i32, health: i32) -> EnemyUnit {
        EnemyUnit {
            tag,
            kind,
            position: Vec2Fixed::from_ints(x, 0),
            vitals: Vitals::health_only(Fixed::from_num(health), Fixed::from_num(100)),
            ground_range: Some(Fixed::from_num(range)),
            air_range: None,
            is_detector: false,
            is_structure: false,
            is_flying: false,
        }
    }

    #[test]
    fn test_kite_position_axis_aligned() {
        let result = kite_position(
            Vec2Fixed::from_ints(0, 0),
            Vec2Fixed::from_ints(5, 0),
            Fixed::from_num(10),
            None,
        );
        // threat + normalize(position - threat) * distance
        assert_eq!(result, Vec2Fixed::from_ints(-5, 0));
        assert_eq!(
            result.distance(Vec2Fixed::from_ints(5, 0)),
            Fixed::from_num(10)
        );
    }

    #[test]
    fn test_kite_position_from_tiny_offset_keeps_distance() {
        let threat = Vec2Fixed::from_ints(50, 50);
        let position = Vec2Fixed::new(Fixed::from_num(50) - Fixed::from_num(0.00001), Fixed::from_num(50));
        let result = kite_position(position, threat, Fixed::from_num(10), None);
        assert_eq!(result, Vec2Fixed::from_ints(40, 50));

        let nudged = Vec2Fixed::new(Fixed::from_num(50), Fixed::from_num(50) + Fixed::DELTA);
        let result = kite_position(nudged, threat, Fixed::from_num(10), None);
        assert_eq!(result, Vec2Fixed::from_ints(50, 60));
    }

    #[test]
    fn test_kite_position_coincident_uses_fallback_target() {
        let spot = Vec2Fixed::from_ints(7, 7);
        let result = kite_position(spot, spot, Fixed::from_num(3), Some(Vec2Fixed::from_ints(7, 20)));
        assert_eq!(result, Vec2Fixed::from_ints(7, 10));
    }

    #[test]
    fn test_kite_position_coincident_without_fallback_is_deterministic() {
        let spot = Vec2Fixed::from_ints(7, 7);
        let first = kite_position(spot, spot, Fixed::from_num(3), None);
        let second = kite_position(spot, spot, Fixed::from_num(3), None);
        assert_eq!(first, Vec2Fixed::from_ints(10, 7));
        assert_eq!(first, second);

        let degenerate_fallback = kite_position(spot, spot, Fixed::from_num(3), Some(spot));
        assert_eq!(degenerate_fallback, first);
    }

    #[test]
    fn test_closest_threat_uses_effective_distance() {
        let unit = own(0, 0);
        let near_short = enemy(1, UnitType::Marine, 4, 1, 100);
        let far_long = enemy(2, UnitType::SiegeTank, 10, 13, 100);
        let enemies = [&near_short, &far_long];

        assert_eq!(nearest(unit.position, &enemies).map(|e| e.tag), Some(1));
        assert_eq!(closest_threat(&unit, &enemies).map(|e| e.tag), Some(2));
        assert_eq!(effective_distance(&unit, &far_long), Fixed::from_num(-3));
        assert_eq!(max_threat_range(&unit, &enemies), Fixed::from_num(13));
    }

    #[test]
    fn test_opportunistic_target_prefers_workers() {
        let unit = own(0, 0);
        let marine = enemy(1, UnitType::Marine, 2, 5, 10);
        let probe = enemy(2, UnitType::Probe, 4, 1, 100);
        let drone = enemy(3, UnitType::Drone, 3, 1, 100);
        let target = select_opportunistic_target(&unit, &[&marine, &probe, &drone]);
        assert_eq!(target.map(|e| e.tag), Some(3));
    }

    #[test]
    fn test_opportunistic_target_lowest_health_then_distance() {
        let unit = own(0, 0);
        let healthy = enemy(1, UnitType::Marine, 1, 5, 100);
        let hurt_far = enemy(2, UnitType::Marine, 4, 5, 20);
        let hurt_near = enemy(3, UnitType::Marine, 2, 5, 20);
        let out_of_range = enemy(4, UnitType::Marine, 9, 5, 1);

        let target =
            select_opportunistic_target(&unit, &[&healthy, &hurt_far, &hurt_near, &out_of_range]);
        assert_eq!(target.map(|e| e.tag), Some(3));
    }

    #[test]
    fn test_opportunistic_target_none_in_range() {
        let unit = own(0, 0);
        let far = enemy(1, UnitType::Marine, 9, 5, 100);
        assert!(select_opportunistic_target(&unit, &[&far]).is_none());
    }
}
