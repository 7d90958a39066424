//! Counter-driven production planning.
//!
//! Each pass turns the counter requirements into a priority list of unit
//! deficits, re-ranks it against the bank, then emits production steps per
//! unit type in that order: producer structures first, then addons, then
//! the training order itself. Building targets and the unfinished part of
//! the fallback build order follow.
//!
//! Nothing in here fails a tick. Unknown kinds and unaffordable actions are
//! logged and left for a later pass.

use serde::{Deserialize, Serialize};

use super::build_order::{BuildOrder, BuildStep, ProductionAction};
use super::capacity::{Cost, ProductionCapacitySpec, UnitProduction};
use crate::config::PlannerConfig;
use crate::error::{BotError, Result};
use crate::math::Fixed;
use crate::registry::CounterRequirement;
use crate::snapshot::{EconomyView, Resources};
use crate::unit_type::UnitType;

/// One unit deficit, ranked by how far it is from its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitPriority {
    /// `current / max(1, required)`; lower is more urgent.
    #[serde(with = "crate::math::fixed_serde")]
    pub ratio: Fixed,
    /// Unit kind.
    pub unit: UnitType,
    /// `required - current`, always positive here.
    pub deficit: u32,
    /// Addon the producer must carry.
    pub required_addon: Option<UnitType>,
}

/// Plans production from counter requirements.
#[derive(Debug, Clone)]
pub struct ProductionPlanner {
    config: PlannerConfig,
    capacity: ProductionCapacitySpec,
    build_order: BuildOrder,
}

impl ProductionPlanner {
    /// Create a planner.
    #[must_use]
    pub fn new(
        config: PlannerConfig,
        capacity: ProductionCapacitySpec,
        build_order: BuildOrder,
    ) -> Self {
        Self {
            config,
            capacity,
            build_order,
        }
    }

    /// Production tables in use.
    #[must_use]
    pub fn capacity(&self) -> &ProductionCapacitySpec {
        &self.capacity
    }

    /// Fallback build order in use.
    #[must_use]
    pub fn build_order(&self) -> &BuildOrder {
        &self.build_order
    }

    /// Plan one tick of production.
    ///
    /// With no requirements registered this is the fallback build order,
    /// unmodified. Otherwise counter-driven steps come first, building
    /// targets next, and the fallback's unsatisfied steps last.
    pub fn plan_tick(
        &self,
        registry: &CounterRequirement,
        economy: &dyn EconomyView,
    ) -> Vec<BuildStep> {
        if !registry.has_requirements() {
            return self.build_order.steps.clone();
        }

        let mut plan = PlanBuilder::new(economy);

        for priority in self.prioritize(registry, economy) {
            match self.capacity.unit(priority.unit) {
                Ok(production) => self.plan_unit(&mut plan, &priority, production),
                Err(e) => tracing::warn!(unit = ?priority.unit, error = %e, "Skipping unit"),
            }
        }

        for (kind, required) in registry.buildings() {
            if economy.total(kind) >= required {
                continue;
            }
            if let Err(e) = self.afford(economy.resources(), kind) {
                tracing::debug!(building = ?kind, error = %e, "Deferring building requirement");
                continue;
            }
            plan.push_structure(kind, required);
        }

        let mut steps = plan.finish();
        steps.extend(self.build_order.unsatisfied(economy).copied());
        steps
    }

    /// Ranked unit deficits for the current economy.
    ///
    /// Types already at or above their target are left out, as are types
    /// with no production entry. The list is sorted by ratio (stable, so
    /// registry order breaks ties) and then re-ranked by resources.
    pub fn prioritize(
        &self,
        registry: &CounterRequirement,
        economy: &dyn EconomyView,
    ) -> Vec<UnitPriority> {
        let mut priorities: Vec<UnitPriority> = registry
            .units()
            .filter_map(|(unit, required)| {
                let current = economy.count(unit);
                let deficit = required.saturating_sub(current);
                if deficit == 0 {
                    return None;
                }
                let production = match self.capacity.unit(unit) {
                    Ok(production) => production,
                    Err(e) => {
                        tracing::warn!(unit = ?unit, error = %e, "Cannot plan unit");
                        return None;
                    }
                };
                Some(UnitPriority {
                    ratio: Fixed::from_num(current) / Fixed::from_num(required.max(1)),
                    unit,
                    deficit,
                    required_addon: production.addon,
                })
            })
            .collect();

        priorities.sort_by_key(|p| p.ratio);
        self.rerank_by_resources(priorities, economy.resources())
    }

    /// Pull affordable-with-the-current-bank unit types forward.
    ///
    /// Floating minerals with little gas moves mineral-only units ahead;
    /// floating gas with few minerals moves gas-heavy units ahead. Relative
    /// order inside each group is kept.
    fn rerank_by_resources(
        &self,
        priorities: Vec<UnitPriority>,
        resources: Resources,
    ) -> Vec<UnitPriority> {
        let config = &self.config;
        let preferred: fn(Cost) -> bool = if resources.minerals > config.mineral_surplus
            && resources.gas < config.gas_shortage
        {
            Cost::is_mineral_only
        } else if resources.gas > config.gas_surplus
            && resources.minerals < config.mineral_shortage
        {
            Cost::is_gas_heavy
        } else {
            return priorities;
        };

        let (mut first, rest): (Vec<_>, Vec<_>) = priorities.into_iter().partition(|p| {
            self.capacity
                .unit(p.unit)
                .is_ok_and(|production| preferred(production.cost))
        });
        first.extend(rest);
        first
    }

    fn plan_unit(
        &self,
        plan: &mut PlanBuilder<'_>,
        priority: &UnitPriority,
        production: &UnitProduction,
    ) {
        let economy = plan.economy;
        let resources = economy.resources();
        let needed = production.producers_needed(priority.deficit);

        // Capacity counts every producer kind; new capacity uses the first.
        if let Some(&primary) = production.producers.first() {
            let ready: u32 = production
                .producers
                .iter()
                .map(|&p| economy.ready_count(p))
                .sum();
            let total: u32 = production.producers.iter().map(|&p| economy.total(p)).sum();
            if ready < needed && total < needed {
                match self.afford(resources, primary) {
                    Ok(()) => plan.push_structure(primary, needed),
                    Err(e) => tracing::debug!(
                        unit = ?priority.unit,
                        producer = ?primary,
                        error = %e,
                        "Deferring producer"
                    ),
                }
            }

            if let Some(addon) = production.addon {
                if economy.ready_count(addon) < needed && economy.total(addon) < needed {
                    match self.afford(resources, addon) {
                        Ok(()) => plan.push_addon(addon, primary, needed),
                        Err(e) => tracing::debug!(
                            unit = ?priority.unit,
                            addon = ?addon,
                            error = %e,
                            "Deferring addon"
                        ),
                    }
                }
            }
        }

        if let Err(e) = self.afford(resources, priority.unit) {
            tracing::debug!(unit = ?priority.unit, error = %e, "Deferring training");
            return;
        }
        let producer = production
            .producers
            .iter()
            .copied()
            .find(|&producer| economy.has_idle_producer(producer, production.addon));
        match producer {
            Some(producer) => plan.push(ProductionAction::TrainUnit {
                unit: priority.unit,
                producer,
                target: economy.count(priority.unit) + priority.deficit,
            }),
            None => tracing::debug!(unit = ?priority.unit, "No idle producer"),
        }
    }

    fn afford(&self, resources: Resources, kind: UnitType) -> Result<()> {
        let cost = self.capacity.cost_of(kind)?;
        if resources.can_afford(cost.minerals, cost.gas) {
            Ok(())
        } else {
            Err(BotError::Unaffordable {
                kind,
                minerals: cost.minerals,
                gas: cost.gas,
            })
        }
    }
}

/// Accumulates counter-driven steps, dropping duplicates.
struct PlanBuilder<'a> {
    economy: &'a dyn EconomyView,
    steps: Vec<BuildStep>,
}

impl<'a> PlanBuilder<'a> {
    fn new(economy: &'a dyn EconomyView) -> Self {
        Self {
            economy,
            steps: Vec::new(),
        }
    }

    /// Add a structure target, or raise an existing one for the same kind.
    fn push_structure(&mut self, kind: UnitType, target: u32) {
        let existing = self.steps.iter_mut().find_map(|step| match &mut step.action {
            ProductionAction::BuildStructure { kind: k, target: t } if *k == kind => Some(t),
            _ => None,
        });
        match existing {
            Some(current) => *current = (*current).max(target),
            None => self.push(ProductionAction::BuildStructure { kind, target }),
        }
    }

    /// Add an addon target, or raise an existing one for the same addon.
    fn push_addon(&mut self, addon: UnitType, on: UnitType, target: u32) {
        let existing = self.steps.iter_mut().find_map(|step| match &mut step.action {
            ProductionAction::BuildAddon {
                addon: a,
                target: t,
                ..
            } if *a == addon => Some(t),
            _ => None,
        });
        match existing {
            Some(current) => *current = (*current).max(target),
            None => self.push(ProductionAction::BuildAddon { addon, on, target }),
        }
    }

    fn push(&mut self, action: ProductionAction) {
        if !self.steps.iter().any(|step| step.action == action) {
            self.steps.push(BuildStep::now(action));
        }
    }

    fn finish(self) -> Vec<BuildStep> {
        self.steps
    }
}
