//! Replay-style determinism: the same match fed twice decides the same way.

use bot_core::action::{AbilityId, Action};
use bot_core::brain::BotBrain;
use bot_core::config::BotConfig;
use bot_core::micro::{MoveType, UnitCommand};
use bot_core::registry::CounterRequirement;
use bot_core::snapshot::{OwnStructure, WorldSnapshot};
use bot_core::unit_type::UnitType;
use bot_test_utils::determinism::{
    brain_hash, find_first_divergence, output_hash, verify_brain_determinism,
};
use bot_test_utils::fixtures::{
    anti_air, combat_unit, enemy_unit, fixed, point, structure, SnapshotBuilder,
};

/// A raid on the main: the barracks burns, lifts and the army fights back.
fn raid(game_loop: u64) -> WorldSnapshot {
    let step = i32::try_from(game_loop).unwrap_or(0);
    let health = 1000 - 80 * step.min(10);
    let previous = 1000 - 80 * (step - 1).clamp(0, 10);
    let barracks = OwnStructure {
        health: fixed(health),
        previous_health: Some(fixed(previous)),
        is_flying: step > 8,
        ..structure(10, UnitType::Barracks, 40, 40)
    };

    let mut banshee = combat_unit(4, UnitType::Banshee, 30 + step, 30);
    banshee.is_flying = true;

    SnapshotBuilder::new()
        .at(game_loop)
        .resources(200 + 25 * step.unsigned_abs(), 150)
        .supply(40, 54)
        .start(20, 20)
        .landing_site(60, 60)
        .unit(combat_unit(1, UnitType::Cyclone, 48, 40))
        .unit(combat_unit(2, UnitType::Hellion, 46, 44))
        .unit(combat_unit(3, UnitType::Marine, 44, 40))
        .unit(banshee)
        .structure(barracks)
        .structure(structure(11, UnitType::Factory, 30, 44))
        .enemy(enemy_unit(20, UnitType::Marine, 52 - step / 2, 40))
        .enemy(anti_air(21, 45, 45, 6))
        .enemy(enemy_unit(22, UnitType::Scv, 70, 70))
        .ready(1, &[AbilityId::LockOn])
        .ready(4, &[AbilityId::CloakOn])
        .build()
}

fn commands() -> Vec<UnitCommand> {
    let defend = Action::attack_move(point(40, 40));
    vec![
        UnitCommand::new(1, defend, MoveType::Assault),
        UnitCommand::new(2, defend, MoveType::Harass),
        UnitCommand::new(3, defend, MoveType::Push),
        UnitCommand::new(4, defend, MoveType::Assault),
    ]
}

fn registry() -> CounterRequirement {
    let mut registry = CounterRequirement::new();
    registry.add_unit_requirement(UnitType::Marine, 12);
    registry.add_unit_requirement(UnitType::VikingFighter, 4);
    registry.add_building_requirement(UnitType::Starport, 1);
    registry
}

fn brain() -> BotBrain {
    let mut brain = BotBrain::new(BotConfig::default());
    brain.set_harass_target(Some(point(150, 150)));
    brain
}

#[test]
fn test_raid_replays_identically() {
    let snapshots: Vec<_> = (0..30).map(raid).collect();
    let result = verify_brain_determinism(5, brain, &registry(), &snapshots, &commands());
    result.assert_deterministic();
    assert_eq!(result.unique_hashes().len(), 1);
}

#[test]
fn test_raid_has_no_divergence() {
    let snapshots: Vec<_> = (0..30).map(raid).collect();
    assert_eq!(
        find_first_divergence(brain, &registry(), &snapshots, &commands()),
        None
    );
}

#[test]
fn test_state_hash_tracks_decisions() {
    let registry = registry();
    let commands = commands();
    let mut first = brain();
    let mut second = brain();

    for tick in 0..10 {
        let a = first.tick(&registry, &raid(tick), &commands);
        let b = second.tick(&registry, &raid(tick), &commands);
        assert_eq!(output_hash(&a), output_hash(&b));
    }
    assert_eq!(brain_hash(&first), brain_hash(&second));

    second.tick(&registry, &raid(10), &commands);
    assert_ne!(brain_hash(&first), brain_hash(&second));
}
