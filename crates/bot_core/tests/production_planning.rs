//! End-to-end production planning against realistic snapshots.

use bot_core::config::PlannerConfig;
use bot_core::production::{
    BuildOrder, BuildStep, ProductionAction, ProductionCapacitySpec, ProductionPlanner,
};
use bot_core::registry::CounterRequirement;
use bot_core::snapshot::WorldSnapshot;
use bot_core::unit_type::UnitType;
use bot_test_utils::fixtures::{combat_unit, structure, SnapshotBuilder};

fn planner() -> ProductionPlanner {
    ProductionPlanner::new(
        PlannerConfig::default(),
        ProductionCapacitySpec::default(),
        BuildOrder::default(),
    )
}

/// Five marines, one bare barracks and one bare factory.
fn base(minerals: u32, gas: u32) -> WorldSnapshot {
    let mut builder = SnapshotBuilder::new()
        .resources(minerals, gas)
        .supply(30, 60)
        .structure(structure(100, UnitType::Barracks, 20, 20))
        .structure(structure(101, UnitType::Factory, 26, 20));
    for tag in 1..=5 {
        builder = builder.unit(combat_unit(tag, UnitType::Marine, 30, 30));
    }
    builder.build()
}

fn marines_and_cyclones() -> CounterRequirement {
    let mut registry = CounterRequirement::new();
    registry.add_unit_requirement(UnitType::Marine, 20);
    registry.add_unit_requirement(UnitType::Cyclone, 8);
    registry
}

fn actions(steps: &[BuildStep]) -> Vec<ProductionAction> {
    steps.iter().map(|step| step.action).collect()
}

#[test]
fn test_furthest_behind_type_is_planned_first() {
    let plan = planner().plan_tick(&marines_and_cyclones(), &base(1000, 500));
    let actions = actions(&plan);

    assert_eq!(
        &actions[..4],
        &[
            ProductionAction::BuildStructure {
                kind: UnitType::Factory,
                target: 2,
            },
            ProductionAction::BuildAddon {
                addon: UnitType::FactoryTechLab,
                on: UnitType::Factory,
                target: 2,
            },
            ProductionAction::BuildStructure {
                kind: UnitType::Barracks,
                target: 3,
            },
            ProductionAction::TrainUnit {
                unit: UnitType::Marine,
                producer: UnitType::Barracks,
                target: 20,
            },
        ]
    );
}

#[test]
fn test_no_training_without_required_addon() {
    let plan = planner().plan_tick(&marines_and_cyclones(), &base(1000, 500));
    let actions = actions(&plan);

    let addon_at = actions
        .iter()
        .position(|a| {
            matches!(
                a,
                ProductionAction::BuildAddon {
                    addon: UnitType::FactoryTechLab,
                    ..
                }
            )
        })
        .unwrap();
    let cyclone_at = actions.iter().position(|a| {
        matches!(
            a,
            ProductionAction::TrainUnit {
                unit: UnitType::Cyclone,
                ..
            }
        )
    });

    assert_eq!(addon_at, 1);
    assert!(cyclone_at.is_none(), "factory has no tech lab yet");
}

#[test]
fn test_cyclones_train_once_tech_lab_is_attached() {
    let mut world = base(1000, 500);
    world.structures[1].addon = Some(UnitType::FactoryTechLab);

    let plan = planner().plan_tick(&marines_and_cyclones(), &world);
    assert!(actions(&plan).contains(&ProductionAction::TrainUnit {
        unit: UnitType::Cyclone,
        producer: UnitType::Factory,
        target: 8,
    }));
}

#[test]
fn test_mineral_float_pulls_mineral_only_units_ahead() {
    let plan = planner().plan_tick(&marines_and_cyclones(), &base(500, 20));
    let actions = actions(&plan);

    assert_eq!(
        &actions[..2],
        &[
            ProductionAction::BuildStructure {
                kind: UnitType::Barracks,
                target: 3,
            },
            ProductionAction::TrainUnit {
                unit: UnitType::Marine,
                producer: UnitType::Barracks,
                target: 20,
            },
        ]
    );
    // Everything cyclone-related needs gas the bank does not have.
    assert!(!actions.iter().any(|a| a.produces() == UnitType::FactoryTechLab));
}

#[test]
fn test_empty_registry_is_the_fallback_build() {
    let plan = planner().plan_tick(&CounterRequirement::new(), &base(1000, 500));
    assert_eq!(plan, BuildOrder::default().steps);
}

#[test]
fn test_building_requirement_and_fallback_tail() {
    let mut registry = CounterRequirement::new();
    registry.add_unit_requirement(UnitType::Marine, 5);
    registry.add_building_requirement(UnitType::EngineeringBay, 1);

    let plan = planner().plan_tick(&registry, &base(1000, 500));
    let actions = actions(&plan);

    assert_eq!(
        actions[0],
        ProductionAction::BuildStructure {
            kind: UnitType::EngineeringBay,
            target: 1,
        }
    );
    // The fallback's already-built barracks step is not repeated.
    assert!(!actions.contains(&ProductionAction::BuildStructure {
        kind: UnitType::Barracks,
        target: 1,
    }));
    assert!(actions.contains(&ProductionAction::TrainUnit {
        unit: UnitType::Scv,
        producer: UnitType::CommandCenter,
        target: 22,
    }));
}

#[test]
fn test_plan_is_idempotent_for_the_same_snapshot() {
    let planner = planner();
    let registry = marines_and_cyclones();
    let world = base(1000, 500);
    assert_eq!(
        planner.plan_tick(&registry, &world),
        planner.plan_tick(&registry, &world)
    );
}
