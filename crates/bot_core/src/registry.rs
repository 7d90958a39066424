//! Counter requirement registry.
//!
//! Target counts per unit type and per building type, written by whatever
//! analyses the enemy composition and read by the production planner.
//! Insertion order is preserved because the planner breaks priority ties by
//! it; overwriting an existing entry keeps its original position.

use serde::{Deserialize, Serialize};

use crate::unit_type::UnitType;

/// Required unit and building counts for countering the enemy.
///
/// Counts are unsigned, so the "never negative" invariant is carried by the
/// type. A kind with no entry is required zero times.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterRequirement {
    units: Vec<(UnitType, u32)>,
    buildings: Vec<(UnitType, u32)>,
}

impl CounterRequirement {
    /// Create an empty requirement set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or overwrite a unit requirement.
    pub fn add_unit_requirement(&mut self, unit_type: UnitType, count: u32) {
        upsert(&mut self.units, unit_type, count);
    }

    /// Add or overwrite a building requirement.
    pub fn add_building_requirement(&mut self, building_type: UnitType, count: u32) {
        upsert(&mut self.buildings, building_type, count);
    }

    /// Required count for a unit type (0 when absent).
    #[must_use]
    pub fn unit_requirement(&self, unit_type: UnitType) -> u32 {
        lookup(&self.units, unit_type)
    }

    /// Required count for a building type (0 when absent).
    #[must_use]
    pub fn building_requirement(&self, building_type: UnitType) -> u32 {
        lookup(&self.buildings, building_type)
    }

    /// Whether any requirement has been registered.
    #[must_use]
    pub fn has_requirements(&self) -> bool {
        !self.units.is_empty() || !self.buildings.is_empty()
    }

    /// Unit requirements in insertion order.
    pub fn units(&self) -> impl Iterator<Item = (UnitType, u32)> + '_ {
        self.units.iter().copied()
    }

    /// Building requirements in insertion order.
    pub fn buildings(&self) -> impl Iterator<Item = (UnitType, u32)> + '_ {
        self.buildings.iter().copied()
    }

    /// Drop every requirement ahead of a re-assessment.
    pub fn clear(&mut self) {
        self.units.clear();
        self.buildings.clear();
    }
}

fn upsert(entries: &mut Vec<(UnitType, u32)>, kind: UnitType, count: u32) {
    match entries.iter_mut().find(|(k, _)| *k == kind) {
        Some(entry) => entry.1 = count,
        None => entries.push((kind, count)),
    }
}

fn lookup(entries: &[(UnitType, u32)], kind: UnitType) -> u32 {
    entries
        .iter()
        .find(|(k, _)| *k == kind)
        .map_or(0, |(_, count)| *count)
}
